//! Test helper utilities for E2E testing

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;
use uuid::Uuid;

use crate::fixtures::REPORT_SECTIONS;

pub type TestError = Box<dyn std::error::Error + Send + Sync>;

/// Response from POST /api/analyze
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub status: String,
    pub analysis_id: Uuid,
}

/// Response from GET /api/analyze/{id}
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub youtube_url: String,
    pub status: String,
    pub analysis_results: Option<Value>,
    pub error_message: Option<String>,
    pub extraction_method: Option<String>,
    pub retry_count: i32,
}

/// Response from POST /api/transcript
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptResponse {
    pub transcript: String,
    pub video_id: String,
    pub video_title: String,
    pub character_count: usize,
    pub source: String,
}

/// Submit a video (or marker) for analysis
pub async fn submit_analysis(
    client: &reqwest::Client,
    base_url: &str,
    youtube_url: &str,
    transcript_text: Option<&str>,
) -> Result<AnalyzeResponse, TestError> {
    let body = json!({
        "youtube_url": youtube_url,
        "company": "E2E Corp",
        "role": "CEO",
        "target_person": "Investors",
        "transcript_text": transcript_text,
    });

    let response = client
        .post(format!("{}/api/analyze", base_url))
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await?;
        return Err(format!("Submit failed with status {}: {}", status, error_text).into());
    }

    Ok(response.json::<AnalyzeResponse>().await?)
}

pub async fn fetch_transcript(
    client: &reqwest::Client,
    base_url: &str,
    url: &str,
) -> Result<TranscriptResponse, TestError> {
    let response = client
        .post(format!("{}/api/transcript", base_url))
        .json(&json!({ "url": url }))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await?;
        return Err(format!("Transcript failed with status {}: {}", status, error_text).into());
    }

    Ok(response.json::<TranscriptResponse>().await?)
}

/// Poll a job until it is completed or failed (with timeout)
pub async fn poll_analysis(
    client: &reqwest::Client,
    base_url: &str,
    analysis_id: Uuid,
    timeout_secs: u64,
) -> Result<AnalysisRecord, TestError> {
    let max_attempts = timeout_secs; // Poll every second

    for attempt in 0..max_attempts {
        let response = client
            .get(format!("{}/api/analyze/{}", base_url, analysis_id))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(format!("Status check failed: {}", error_text).into());
        }

        let record = response.json::<AnalysisRecord>().await?;

        match record.status.as_str() {
            "completed" | "failed" => return Ok(record),
            "pending" | "downloading" | "analyzing" => {
                if attempt % 15 == 0 && attempt > 0 {
                    println!(
                        "  ... still {} (attempt {}/{})",
                        record.status, attempt, max_attempts
                    );
                }
                sleep(Duration::from_secs(1)).await;
            }
            other => return Err(format!("Unknown job status: {}", other).into()),
        }
    }

    Err(format!("Analysis did not finish within {} seconds", timeout_secs).into())
}

/// Wait for the worker to finish a job; media fallback can take minutes
pub async fn wait_for_analysis(
    client: &reqwest::Client,
    base_url: &str,
    analysis_id: Uuid,
) -> Result<AnalysisRecord, TestError> {
    poll_analysis(client, base_url, analysis_id, 600).await
}

/// Assert a completed record carries a usable report
pub fn assert_report_shape(record: &AnalysisRecord) {
    assert_eq!(record.status, "completed", "error: {:?}", record.error_message);

    let report = record
        .analysis_results
        .as_ref()
        .expect("Completed record without results");

    for section in REPORT_SECTIONS {
        assert!(
            report.get(section).is_some(),
            "Report for {} is missing section {}",
            record.youtube_url,
            section
        );
    }

    let score = report["overall_performance"]["score"].as_f64().unwrap_or(-1.0);
    assert!(
        (0.0..=100.0).contains(&score),
        "Overall score out of range: {} for {}",
        score,
        record.youtube_url
    );

    println!(
        "  ✓ {} - score: {}, method: {}",
        record.youtube_url,
        score,
        record.extraction_method.as_deref().unwrap_or("n/a")
    );
}
