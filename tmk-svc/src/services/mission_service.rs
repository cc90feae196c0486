//! Mission lifecycle: creation, submission tracking, auto-completion

use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use tmk_common::{time, Error, Result};

use crate::db::missions::{self, Mission, MissionCount, MissionStatus};
use crate::db::submissions::{self, AnswerEntry, Submission};
use crate::services::notifier::{Notification, Notifier};
use crate::validators::normalize_questions;

/// Caller input for mission creation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMission {
    pub name: String,
    pub description: String,
    pub questions: Vec<String>,
    pub num_testers: i64,
    pub owner_uid: String,
    pub owner_email: Option<String>,
    #[serde(default)]
    pub payout: i64,
}

/// What happened to the mission when a submission landed.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub submission_id: Uuid,
    /// None when the mission vanished between submission and counting.
    pub new_count: Option<i64>,
    pub completed: bool,
}

/// Validate and save a new mission.
pub async fn create_mission(pool: &SqlitePool, input: NewMission) -> Result<Mission> {
    if input.name.trim().is_empty() {
        return Err(Error::Validation("Mission name is required".to_string()));
    }
    if input.owner_uid.trim().is_empty() {
        return Err(Error::Validation("Mission owner uid is required".to_string()));
    }
    if input.num_testers < 1 {
        return Err(Error::Validation(
            "num_testers must be at least 1".to_string(),
        ));
    }

    let questions = normalize_questions(&input.questions);
    if questions.is_empty() {
        return Err(Error::Validation(
            "Mission needs at least one survey question".to_string(),
        ));
    }

    let mission = Mission {
        id: Uuid::new_v4(),
        name: input.name.trim().to_string(),
        description: input.description,
        questions,
        num_testers: input.num_testers,
        submission_count: 0,
        status: MissionStatus::Active,
        owner_uid: input.owner_uid,
        owner_email: input.owner_email,
        payout: input.payout,
        feedback_summary: None,
        created_at: time::now(),
    };
    missions::create_mission(pool, &mission).await?;

    tracing::info!(mission_id = %mission.id, name = %mission.name, "Mission created");

    Ok(mission)
}

/// Record a tester's submission and advance the mission counter.
///
/// The submission write commits first. A mission that has since
/// vanished is logged and treated as a no-op for the counting step.
/// When the counter reaches the tester target, the status flips once
/// and the completion notification fires once; notification failure is
/// logged, never propagated.
pub async fn record_submission(
    pool: &SqlitePool,
    notifier: &dyn Notifier,
    mission_id: Uuid,
    tester_id: &str,
    tester_name: &str,
    answers: Vec<AnswerEntry>,
) -> Result<SubmissionOutcome> {
    if tester_id.trim().is_empty() {
        return Err(Error::Validation("tester_id is required".to_string()));
    }

    let submission = Submission {
        id: Uuid::new_v4(),
        mission_id,
        tester_id: tester_id.to_string(),
        tester_name: tester_name.to_string(),
        answers,
        created_at: time::now(),
    };
    submissions::create_submission(pool, &submission).await?;

    let mission = match missions::get_mission(pool, mission_id).await? {
        Some(mission) => mission,
        None => {
            tracing::warn!(
                mission_id = %mission_id,
                submission_id = %submission.id,
                "Submission references a missing mission; skipping count update"
            );
            return Ok(SubmissionOutcome {
                submission_id: submission.id,
                new_count: None,
                completed: false,
            });
        }
    };

    let new_count = missions::increment_submission_count(pool, mission_id).await?;

    let mut completed = false;
    if new_count >= mission.num_testers && missions::try_complete(pool, mission_id).await? {
        completed = true;
        tracing::info!(mission_id = %mission_id, count = new_count, "Mission completed");
        notify_completion(notifier, &mission).await;
    }

    Ok(SubmissionOutcome {
        submission_id: submission.id,
        new_count: Some(new_count),
        completed,
    })
}

async fn notify_completion(notifier: &dyn Notifier, mission: &Mission) {
    let Some(to_address) = mission.owner_email.as_deref() else {
        tracing::debug!(mission_id = %mission.id, "Mission owner has no email; skipping notification");
        return;
    };

    let notification = Notification {
        to_address: to_address.to_string(),
        subject: format!("Your mission '{}' is complete", mission.name),
        body: format!(
            "All {} testers have submitted feedback for '{}'. Log in to view the results.",
            mission.num_testers, mission.name
        ),
    };

    if let Err(e) = notifier.send(&notification).await {
        tracing::error!(mission_id = %mission.id, error = %e, "Completion notification failed");
    }
}

/// Recompute every mission's submission counter from the submission
/// table, overwriting the incremental counters.
pub async fn recalculate_counts(pool: &SqlitePool) -> Result<Vec<MissionCount>> {
    let counts = missions::recalculate_submission_counts(pool).await?;
    tracing::info!(missions = counts.len(), "Submission counts recalculated");
    Ok(counts)
}
