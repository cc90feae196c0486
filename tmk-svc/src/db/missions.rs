//! Mission collection operations
//!
//! Holds the monotonic submission counter and the one-way
//! Active -> Completed status transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use tmk_common::{Error, Result};

/// Mission lifecycle status. The transition Active -> Completed happens
/// exactly once and is irreversible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionStatus {
    Active,
    Completed,
}

impl MissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissionStatus::Active => "Active",
            MissionStatus::Completed => "Completed",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "Active" => Ok(MissionStatus::Active),
            "Completed" => Ok(MissionStatus::Completed),
            other => Err(Error::Internal(format!("Unknown mission status: {}", other))),
        }
    }
}

/// A founder-created feedback-collection task.
#[derive(Debug, Clone, Serialize)]
pub struct Mission {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Survey questions in canonical order.
    pub questions: Vec<String>,
    /// Target tester count; reaching it auto-completes the mission.
    pub num_testers: i64,
    pub submission_count: i64,
    pub status: MissionStatus,
    pub owner_uid: String,
    pub owner_email: Option<String>,
    pub payout: i64,
    pub feedback_summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-mission submission count, as returned by the reconciliation op.
#[derive(Debug, Clone, Serialize)]
pub struct MissionCount {
    pub mission_id: Uuid,
    pub submission_count: i64,
}

fn mission_from_row(row: &SqliteRow) -> Result<Mission> {
    let id_str: String = row.get("id");
    let questions_json: String = row.get("questions");
    let status_str: String = row.get("status");

    Ok(Mission {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| Error::Internal(format!("Invalid mission id {}: {}", id_str, e)))?,
        name: row.get("name"),
        description: row.get("description"),
        questions: serde_json::from_str(&questions_json)?,
        num_testers: row.get("num_testers"),
        submission_count: row.get("submission_count"),
        status: MissionStatus::parse(&status_str)?,
        owner_uid: row.get("owner_uid"),
        owner_email: row.get("owner_email"),
        payout: row.get("payout"),
        feedback_summary: row.get("feedback_summary"),
        created_at: row.get("created_at"),
    })
}

const MISSION_COLUMNS: &str = "id, name, description, questions, num_testers, submission_count, \
                               status, owner_uid, owner_email, payout, feedback_summary, created_at";

/// Save a new mission.
pub async fn create_mission(pool: &SqlitePool, mission: &Mission) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO missions (
            id, name, description, questions, num_testers, submission_count,
            status, owner_uid, owner_email, payout, feedback_summary, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(mission.id.to_string())
    .bind(&mission.name)
    .bind(&mission.description)
    .bind(serde_json::to_string(&mission.questions)?)
    .bind(mission.num_testers)
    .bind(mission.submission_count)
    .bind(mission.status.as_str())
    .bind(&mission.owner_uid)
    .bind(&mission.owner_email)
    .bind(mission.payout)
    .bind(&mission.feedback_summary)
    .bind(mission.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a mission by id.
pub async fn get_mission(pool: &SqlitePool, id: Uuid) -> Result<Option<Mission>> {
    let row = sqlx::query(&format!("SELECT {} FROM missions WHERE id = ?", MISSION_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(mission_from_row(&row)?)),
        None => Ok(None),
    }
}

/// All missions still accepting submissions.
pub async fn list_active_missions(pool: &SqlitePool) -> Result<Vec<Mission>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM missions WHERE status = 'Active' ORDER BY created_at ASC",
        MISSION_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(mission_from_row).collect()
}

/// Increment the submission counter and return the new count.
///
/// The counter only ever grows; `recalculate_submission_counts` is the
/// path that corrects drift.
pub async fn increment_submission_count(pool: &SqlitePool, id: Uuid) -> Result<i64> {
    let result = sqlx::query("UPDATE missions SET submission_count = submission_count + 1 WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Mission {} not found", id)));
    }

    let row = sqlx::query("SELECT submission_count FROM missions WHERE id = ?")
        .bind(id.to_string())
        .fetch_one(pool)
        .await?;

    Ok(row.get("submission_count"))
}

/// Flip status Active -> Completed. Returns true only for the caller
/// that actually performed the transition, so completion side effects
/// (the notification) fire exactly once per mission.
pub async fn try_complete(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("UPDATE missions SET status = 'Completed' WHERE id = ? AND status = 'Active'")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Store the feedback summary and force the mission closed, regardless
/// of the tester-count threshold. Used by the summarization sweep.
pub async fn force_complete_with_summary(pool: &SqlitePool, id: Uuid, summary: &str) -> Result<()> {
    sqlx::query("UPDATE missions SET feedback_summary = ?, status = 'Completed' WHERE id = ?")
        .bind(summary)
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

/// Overwrite every mission's submission counter from the authoritative
/// submission set. Status is deliberately left alone.
pub async fn recalculate_submission_counts(pool: &SqlitePool) -> Result<Vec<MissionCount>> {
    sqlx::query(
        r#"
        UPDATE missions
        SET submission_count = (
            SELECT COUNT(*) FROM submissions WHERE submissions.mission_id = missions.id
        )
        "#,
    )
    .execute(pool)
    .await?;

    let rows = sqlx::query("SELECT id, submission_count FROM missions ORDER BY created_at ASC")
        .fetch_all(pool)
        .await?;

    let mut counts = Vec::with_capacity(rows.len());
    for row in rows {
        let id_str: String = row.get("id");
        counts.push(MissionCount {
            mission_id: Uuid::parse_str(&id_str)
                .map_err(|e| Error::Internal(format!("Invalid mission id {}: {}", id_str, e)))?,
            submission_count: row.get("submission_count"),
        });
    }

    Ok(counts)
}
