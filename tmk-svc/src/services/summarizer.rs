//! Scheduled feedback summarization sweep
//!
//! Periodically aggregates each active mission's submitted answers,
//! asks the text-generation collaborator for a founder-facing summary,
//! stores it verbatim, and force-closes the mission. Failures are
//! isolated per mission; the sweep always visits every active mission.

use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use tmk_common::Result;

use crate::db::{missions, submissions};
use crate::services::anthropic_client::{GenerationRequest, TextGenerator};

const SUMMARY_SYSTEM_PROMPT: &str = "You are a product management assistant. Based on user \
feedback from a website test, generate a concise, actionable summary for the website's founder. \
Group insights into \"Positive Feedback\", \"Areas for Improvement\", and \"Bug Reports\". Use \
bullet points.";

const SUMMARY_MAX_TOKENS: u32 = 1024;

/// Outcome counts for one sweep run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Missions summarized and force-closed.
    pub summarized: usize,
    /// Active missions with no submissions yet, left untouched.
    pub skipped: usize,
    /// Missions where generation or the store update failed; left
    /// Active for the next sweep.
    pub failed: usize,
}

fn summary_prompt(feedback: &str) -> String {
    format!("---BEGIN FEEDBACK---\n{}---END FEEDBACK---", feedback)
}

/// Run one summarization pass over all active missions.
pub async fn run_sweep(pool: &SqlitePool, textgen: &dyn TextGenerator) -> Result<SweepStats> {
    let active = missions::list_active_missions(pool).await?;
    tracing::info!(active = active.len(), "Running feedback summarization sweep");

    let mut stats = SweepStats::default();

    for mission in active {
        let subs = match submissions::list_for_mission(pool, mission.id).await {
            Ok(subs) => subs,
            Err(e) => {
                tracing::error!(mission_id = %mission.id, error = %e, "Failed to load submissions");
                stats.failed += 1;
                continue;
            }
        };

        if subs.is_empty() {
            tracing::debug!(mission_id = %mission.id, "No submissions yet, skipping");
            stats.skipped += 1;
            continue;
        }

        let mut feedback = String::new();
        for sub in &subs {
            for entry in &sub.answers {
                feedback.push_str(&format!(
                    "Question: {}\nAnswer: {}\n\n",
                    entry.question, entry.answer
                ));
            }
        }

        let request = GenerationRequest {
            system: SUMMARY_SYSTEM_PROMPT.to_string(),
            user: summary_prompt(&feedback),
            max_tokens: SUMMARY_MAX_TOKENS,
        };

        let summary = match textgen.generate(&request).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(mission_id = %mission.id, error = %e, "Summarization failed; mission stays Active");
                stats.failed += 1;
                continue;
            }
        };

        match missions::force_complete_with_summary(pool, mission.id, &summary).await {
            Ok(()) => {
                tracing::info!(mission_id = %mission.id, "Mission summarized and completed");
                stats.summarized += 1;
            }
            Err(e) => {
                tracing::error!(mission_id = %mission.id, error = %e, "Failed to store summary");
                stats.failed += 1;
            }
        }
    }

    tracing::info!(
        summarized = stats.summarized,
        skipped = stats.skipped,
        failed = stats.failed,
        "Summarization sweep finished"
    );

    Ok(stats)
}

/// Run the sweep on a fixed interval until the process exits. A tick
/// that arrives while a sweep is still running is skipped rather than
/// queued, so runs never overlap within one process.
pub async fn run_interval_loop(
    pool: SqlitePool,
    textgen: Arc<dyn TextGenerator>,
    interval_secs: u64,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick fires immediately; consume it so the first sweep
    // runs one full interval after startup.
    interval.tick().await;

    loop {
        interval.tick().await;
        if let Err(e) = run_sweep(&pool, textgen.as_ref()).await {
            tracing::error!(error = %e, "Summarization sweep aborted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_prompt_wraps_feedback() {
        let prompt = summary_prompt("Question: Q1\nAnswer: fine\n\n");
        assert!(prompt.starts_with("---BEGIN FEEDBACK---\n"));
        assert!(prompt.ends_with("---END FEEDBACK---"));
        assert!(prompt.contains("Answer: fine"));
    }
}
