//! Videos used by the end-to-end tests

/// A public video and what we expect extraction to manage for it
#[derive(Debug, Clone)]
pub struct TestVideoFixture {
    pub url: &'static str,
    pub video_id: &'static str,
    pub has_captions: bool,
    pub description: &'static str,
}

pub const TEST_VIDEOS: &[TestVideoFixture] = &[
    TestVideoFixture {
        url: "https://www.youtube.com/watch?v=y8OnoxCotHE",
        video_id: "y8OnoxCotHE",
        has_captions: true,
        description: "CNBC interview, ~9 min, auto captions",
    },
    TestVideoFixture {
        url: "https://youtu.be/E7wUGafs0LY",
        video_id: "E7wUGafs0LY",
        has_captions: true,
        description: "Conference keynote, short link form",
    },
    TestVideoFixture {
        url: "https://www.youtube.com/shorts/aqz-KE-bpKQ",
        video_id: "aqz-KE-bpKQ",
        has_captions: false,
        description: "Short without captions, exercises media fallback",
    },
];

/// Pasted transcript for manual-input submissions
pub const MANUAL_TRANSCRIPT: &str = "Thanks for having me. This quarter we grew revenue forty \
percent year over year, and more importantly we did it while improving margins. \
Our customers are telling us the product saves them hours every week, and that is \
what keeps them renewing.";

/// Report sections every completed analysis must contain
pub const REPORT_SECTIONS: &[&str] = &[
    "video_metadata",
    "overall_performance",
    "high_level_metrics",
    "recommendations",
    "summary",
];

pub fn captioned_videos() -> impl Iterator<Item = &'static TestVideoFixture> {
    TEST_VIDEOS.iter().filter(|v| v.has_captions)
}
