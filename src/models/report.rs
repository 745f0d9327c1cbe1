use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Metadata about the source video, gathered on a best-effort basis.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VideoMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publish_date: Option<String>,
    pub duration_seconds: Option<u64>,
    pub channel_url: Option<String>,
}

/// Overwrite the report's `video_metadata` with values we actually know.
///
/// Model-reported values are kept where we have nothing better. A report that is
/// not a JSON object is left untouched.
pub fn inject_metadata(report: &mut Value, metadata: &VideoMetadata, extraction_method: &str) {
    let Some(root) = report.as_object_mut() else {
        return;
    };

    let section = root
        .entry("video_metadata")
        .or_insert_with(|| Value::Object(Default::default()));
    if !section.is_object() {
        *section = Value::Object(Default::default());
    }
    let Some(section) = section.as_object_mut() else {
        return;
    };

    if let Some(author) = &metadata.author {
        section.insert("channel_title".into(), json!(author));
    }
    if let Some(date) = &metadata.publish_date {
        section.insert("published_date".into(), json!(date));
    }
    if let Some(secs) = metadata.duration_seconds {
        section.insert("duration_seconds".into(), json!(secs));
    }
    if let Some(title) = &metadata.title {
        section.insert("title".into(), json!(title));
    }
    section.insert("extraction_method".into(), json!(extraction_method));
}

/// Video used by demo records so the player can seek.
pub const DEMO_VIDEO_URL: &str = "https://www.youtube.com/watch?v=y8OnoxCotHE";

/// Canned report stored for `DEMO_MODE` submissions.
pub fn demo_report() -> Value {
    json!({
        "analysis_reliability": {
            "score": 92,
            "notice": "High confidence analysis based on clear audio and video quality from CNBC."
        },
        "video_metadata": {
            "duration": "08:45",
            "published_date": "2024-03-01",
            "extracted_interviewee_name": "Jon Lin",
            "channel_title": "CNBC Television"
        },
        "overall_performance": {
            "score": 88,
            "level": "Elite",
            "summary": "The speaker demonstrates strong executive presence with clear articulation, steady pacing, and composure under questioning. The analogical breakdown of complex topics was masterful.",
            "badge": "Top Performer"
        },
        "high_level_metrics": {
            "confidence": {"score": 92, "label": "Confidence"},
            "trustworthiness": {"score": 85, "label": "Trustworthiness"},
            "engagement": {"score": 80, "label": "Engagement"},
            "clarity": {"score": 89, "label": "Clarity"}
        },
        "detailed_analysis": {
            "voice_analysis": {
                "speaking_rate": "Optimal Pace",
                "pause_frequency": "Appropriate",
                "volume_variation": "Dynamic",
                "clarity_rating": "Excellent",
                "observation": "Speaker maintained a steady 135wpm pace with strategic pausing before key points."
            },
            "message_analysis": {
                "keyword_density": "High",
                "emotional_tone": "Positive",
                "structure_rating": "Logical",
                "logic_flow": "Well-organized",
                "observation": "Key themes were reinforced using concise market terminology that resonates with the core audience."
            }
        },
        "emotion_radar": {
            "confidence": 92,
            "empathy": 75,
            "authority": 88,
            "composure": 94,
            "enthusiasm": 82,
            "trust": 85
        },
        "timeline_analysis": [
            {
                "timestamp": "00:15",
                "event": "Calm Opening",
                "sentiment": "neutral",
                "emotion_label": "Confident",
                "confidence_score": 90,
                "engagement_score": 85,
                "insight": "Strong opening statement, established credibility early without rushing."
            },
            {
                "timestamp": "01:30",
                "event": "Building Momentum",
                "sentiment": "positive",
                "emotion_label": "Enthusiastic",
                "confidence_score": 92,
                "engagement_score": 88,
                "insight": "Used a clear analogy to explain a complex technical pipeline topic."
            },
            {
                "timestamp": "02:45",
                "event": "Thoughtful Reframing",
                "sentiment": "neutral",
                "emotion_label": "Composed",
                "confidence_score": 85,
                "engagement_score": 80,
                "insight": "Slight hesitation before pivoting a challenging anchor question."
            },
            {
                "timestamp": "04:20",
                "event": "Peak Assertion",
                "sentiment": "positive",
                "emotion_label": "Authoritative",
                "confidence_score": 95,
                "engagement_score": 92,
                "insight": "Steady eye contact and hand gestures during the closing forward guidance."
            }
        ],
        "benchmark_comparison": {
            "your_score": 88,
            "industry_average": 74,
            "top_ceos": 91,
            "metrics": ["Confidence", "Trust", "Clarity", "Composure"],
            "emotion_radar_benchmark": {
                "confidence": 85,
                "empathy": 80,
                "authority": 88,
                "composure": 82,
                "enthusiasm": 75,
                "trust": 85
            }
        },
        "recommendations": [
            {
                "title": "Reduce filler words in transitions",
                "rationale": "Minor hesitation ('um', 'uh') occasionally weakens pivots.",
                "strategy": "Embrace silence instead of vocalizing pauses when formulating responses.",
                "priority": "Low",
                "timeframe": "Ongoing",
                "expected_impact": "5%"
            },
            {
                "title": "Inject more tonal emphasis",
                "rationale": "High consistency can border on monotone during longer explanations.",
                "strategy": "Apply slight volume increases on strategic keywords.",
                "priority": "Medium",
                "timeframe": "1-2 weeks",
                "expected_impact": "10%"
            }
        ],
        "summary": "A strong display of executive composure and clarity. The speaker navigated technical subject matter with ease and translated it into accessible business value. The main opportunity is embracing silence during transitions rather than filler sounds."
    })
}
