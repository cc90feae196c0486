//! Submission collection operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use tmk_common::{Error, Result};

/// One question/answer pair as submitted by a tester. Question text is
/// kept alongside the answer so reports can align responses even when
/// testers answered out of order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub question: String,
    pub answer: String,
}

/// One tester's completed run of a mission.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub id: Uuid,
    pub mission_id: Uuid,
    pub tester_id: String,
    pub tester_name: String,
    pub answers: Vec<AnswerEntry>,
    pub created_at: DateTime<Utc>,
}

fn submission_from_row(row: &SqliteRow) -> Result<Submission> {
    let id_str: String = row.get("id");
    let mission_id_str: String = row.get("mission_id");
    let answers_json: String = row.get("answers");

    Ok(Submission {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| Error::Internal(format!("Invalid submission id {}: {}", id_str, e)))?,
        mission_id: Uuid::parse_str(&mission_id_str)
            .map_err(|e| Error::Internal(format!("Invalid mission id {}: {}", mission_id_str, e)))?,
        tester_id: row.get("tester_id"),
        tester_name: row.get("tester_name"),
        answers: serde_json::from_str(&answers_json)?,
        created_at: row.get("created_at"),
    })
}

/// Save a new submission.
pub async fn create_submission(pool: &SqlitePool, submission: &Submission) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO submissions (id, mission_id, tester_id, tester_name, answers, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(submission.id.to_string())
    .bind(submission.mission_id.to_string())
    .bind(&submission.tester_id)
    .bind(&submission.tester_name)
    .bind(serde_json::to_string(&submission.answers)?)
    .bind(submission.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// All submissions for a mission, oldest first.
pub async fn list_for_mission(pool: &SqlitePool, mission_id: Uuid) -> Result<Vec<Submission>> {
    let rows = sqlx::query(
        r#"
        SELECT id, mission_id, tester_id, tester_name, answers, created_at
        FROM submissions
        WHERE mission_id = ?
        ORDER BY created_at ASC
        "#,
    )
    .bind(mission_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(submission_from_row).collect()
}

/// Count submissions for a mission straight from the table.
pub async fn count_for_mission(pool: &SqlitePool, mission_id: Uuid) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM submissions WHERE mission_id = ?")
        .bind(mission_id.to_string())
        .fetch_one(pool)
        .await?;

    Ok(row.get("n"))
}
