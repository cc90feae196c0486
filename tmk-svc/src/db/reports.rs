//! Mission report persistence

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use tmk_common::{Error, Result};

/// A validated AI-generated feedback report, stored verbatim together
/// with the inputs it was derived from.
#[derive(Debug, Clone, Serialize)]
pub struct MissionReport {
    pub id: Uuid,
    pub mission_id: Uuid,
    /// The validated report JSON, exactly as the model returned it.
    pub ai_output: String,
    pub generated_at: DateTime<Utc>,
    pub source_submission_count: i64,
    pub questions_hash: String,
    pub model: String,
}

fn report_from_row(row: &SqliteRow) -> Result<MissionReport> {
    let id_str: String = row.get("id");
    let mission_id_str: String = row.get("mission_id");

    Ok(MissionReport {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| Error::Internal(format!("Invalid report id {}: {}", id_str, e)))?,
        mission_id: Uuid::parse_str(&mission_id_str)
            .map_err(|e| Error::Internal(format!("Invalid mission id {}: {}", mission_id_str, e)))?,
        ai_output: row.get("ai_output"),
        generated_at: row.get("generated_at"),
        source_submission_count: row.get("source_submission_count"),
        questions_hash: row.get("questions_hash"),
        model: row.get("model"),
    })
}

/// Save a report.
pub async fn create_report(pool: &SqlitePool, report: &MissionReport) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO mission_reports (
            id, mission_id, ai_output, generated_at,
            source_submission_count, questions_hash, model
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(report.id.to_string())
    .bind(report.mission_id.to_string())
    .bind(&report.ai_output)
    .bind(report.generated_at)
    .bind(report.source_submission_count)
    .bind(&report.questions_hash)
    .bind(&report.model)
    .execute(pool)
    .await?;

    Ok(())
}

/// The most recently generated report for a mission, if any.
pub async fn latest_for_mission(pool: &SqlitePool, mission_id: Uuid) -> Result<Option<MissionReport>> {
    let row = sqlx::query(
        r#"
        SELECT id, mission_id, ai_output, generated_at,
               source_submission_count, questions_hash, model
        FROM mission_reports
        WHERE mission_id = ?
        ORDER BY generated_at DESC
        LIMIT 1
        "#,
    )
    .bind(mission_id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(report_from_row(&row)?)),
        None => Ok(None),
    }
}
