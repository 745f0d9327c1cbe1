use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

/// Status string of an analysis job, as stored in `video_analyses.status`.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnalysisStatus {
    Pending,
    Downloading,
    Analyzing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    /// Read a stored status string. Unknown values are treated as pending.
    pub fn from_db(value: &str) -> Self {
        value.parse().unwrap_or(AnalysisStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }
}

/// Caller-supplied context describing the speaker and the audience.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisContext {
    pub video_title: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub target_person: Option<String>,
}

/// Values needed to insert a new job record.
#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub user_id: Option<String>,
    pub youtube_url: String,
    pub context: AnalysisContext,
}

/// One requested analysis and its current status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisJob {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub youtube_url: String,
    pub video_title: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub target_person: Option<String>,
    pub status: AnalysisStatus,
    pub analysis_results: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub extraction_method: Option<String>,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AnalysisJob {
    pub fn context(&self) -> AnalysisContext {
        AnalysisContext {
            video_title: self.video_title.clone(),
            company: self.company.clone(),
            role: self.role.clone(),
            target_person: self.target_person.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        assert_eq!(AnalysisStatus::Downloading.as_str(), "downloading");
        assert_eq!(AnalysisStatus::Analyzing.to_string(), "analyzing");
        assert_eq!(AnalysisStatus::from_db("completed"), AnalysisStatus::Completed);
        assert_eq!(AnalysisStatus::from_db("failed"), AnalysisStatus::Failed);
    }

    #[test]
    fn test_unknown_status_reads_as_pending() {
        assert_eq!(AnalysisStatus::from_db("processing"), AnalysisStatus::Pending);
        assert_eq!(AnalysisStatus::from_db(""), AnalysisStatus::Pending);
    }

    #[test]
    fn test_terminal_states() {
        assert!(AnalysisStatus::Completed.is_terminal());
        assert!(AnalysisStatus::Failed.is_terminal());
        assert!(!AnalysisStatus::Downloading.is_terminal());
        assert!(!AnalysisStatus::Pending.is_terminal());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&AnalysisStatus::Analyzing).unwrap();
        assert_eq!(json, "\"analyzing\"");
    }
}
