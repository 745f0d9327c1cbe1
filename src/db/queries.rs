use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::job::{AnalysisJob, AnalysisStatus, NewAnalysis};

const JOB_COLUMNS: &str = "id, user_id, youtube_url, video_title, company, role, target_person, \
     status, analysis_results, error_message, extraction_method, retry_count, \
     created_at, updated_at";

fn job_from_row(row: &PgRow) -> Result<AnalysisJob, sqlx::Error> {
    let status: String = row.try_get("status")?;

    Ok(AnalysisJob {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        youtube_url: row.try_get("youtube_url")?,
        video_title: row.try_get("video_title")?,
        company: row.try_get("company")?,
        role: row.try_get("role")?,
        target_person: row.try_get("target_person")?,
        status: AnalysisStatus::from_db(&status),
        analysis_results: row.try_get("analysis_results")?,
        error_message: row.try_get("error_message")?,
        extraction_method: row.try_get("extraction_method")?,
        retry_count: row.try_get("retry_count")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

async fn insert_job(
    pool: &PgPool,
    new: &NewAnalysis,
    status: AnalysisStatus,
    report: Option<serde_json::Value>,
) -> Result<AnalysisJob, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO video_analyses
            (user_id, youtube_url, video_title, company, role, target_person, status, analysis_results)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {JOB_COLUMNS}
        "#
    );

    let row = sqlx::query(&sql)
        .bind(new.user_id.as_deref())
        .bind(&new.youtube_url)
        .bind(new.context.video_title.as_deref())
        .bind(new.context.company.as_deref())
        .bind(new.context.role.as_deref())
        .bind(new.context.target_person.as_deref())
        .bind(status.as_str())
        .bind(report)
        .fetch_one(pool)
        .await?;

    job_from_row(&row)
}

/// Insert a new analysis job in the `pending` state
pub async fn create_job(pool: &PgPool, new: &NewAnalysis) -> Result<AnalysisJob, sqlx::Error> {
    insert_job(pool, new, AnalysisStatus::Pending, None).await
}

/// Insert a job that is already completed (demo submissions)
pub async fn insert_completed_job(
    pool: &PgPool,
    new: &NewAnalysis,
    report: serde_json::Value,
) -> Result<AnalysisJob, sqlx::Error> {
    insert_job(pool, new, AnalysisStatus::Completed, Some(report)).await
}

/// Get a job by ID
pub async fn get_job(pool: &PgPool, job_id: Uuid) -> Result<Option<AnalysisJob>, sqlx::Error> {
    let sql = format!("SELECT {JOB_COLUMNS} FROM video_analyses WHERE id = $1");

    let row = sqlx::query(&sql)
        .bind(job_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(job_from_row).transpose()
}

/// Update job status
pub async fn update_job_status(
    pool: &PgPool,
    job_id: Uuid,
    status: AnalysisStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE video_analyses SET status = $1 WHERE id = $2")
        .bind(status.as_str())
        .bind(job_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Record which extraction step produced the analyzed content
pub async fn set_extraction_method(
    pool: &PgPool,
    job_id: Uuid,
    method: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE video_analyses SET extraction_method = $1 WHERE id = $2")
        .bind(method)
        .bind(job_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Store the finished report
pub async fn complete_job(
    pool: &PgPool,
    job_id: Uuid,
    report: serde_json::Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE video_analyses
        SET status = $1,
            analysis_results = $2,
            error_message = NULL
        WHERE id = $3
        "#,
    )
    .bind(AnalysisStatus::Completed.as_str())
    .bind(report)
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Mark the job as failed with a reason
pub async fn fail_job(pool: &PgPool, job_id: Uuid, error: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE video_analyses
        SET status = $1,
            error_message = $2
        WHERE id = $3
        "#,
    )
    .bind(AnalysisStatus::Failed.as_str())
    .bind(error)
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Increment retry count
pub async fn increment_retry_count(pool: &PgPool, job_id: Uuid) -> Result<i32, sqlx::Error> {
    let row = sqlx::query(
        r#"
        UPDATE video_analyses
        SET retry_count = retry_count + 1
        WHERE id = $1
        RETURNING retry_count
        "#,
    )
    .bind(job_id)
    .fetch_one(pool)
    .await?;

    row.try_get("retry_count")
}

/// Non-terminal jobs untouched since `older_than` (orphaned by a crashed worker)
pub async fn get_stale_jobs(
    pool: &PgPool,
    older_than: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<AnalysisJob>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {JOB_COLUMNS}
        FROM video_analyses
        WHERE status NOT IN ('completed', 'failed')
          AND updated_at < $1
        ORDER BY created_at ASC
        LIMIT $2
        "#
    );

    let rows = sqlx::query(&sql)
        .bind(older_than)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    rows.iter().map(job_from_row).collect()
}
