//! Integration tests for report generation and the summarization sweep

use async_trait::async_trait;
use chrono::Duration;
use serde_json::json;
use sqlx::SqlitePool;
use std::collections::VecDeque;
use std::sync::Mutex;
use uuid::Uuid;

use tmk_common::{time, Error, Result};
use tmk_svc::db::missions::{Mission, MissionStatus};
use tmk_svc::db::submissions::{AnswerEntry, Submission};
use tmk_svc::db::{self, missions, reports, submissions};
use tmk_svc::services::anthropic_client::{GenerationRequest, TextGenerator};
use tmk_svc::services::{report_service, summarizer};

async fn test_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    db::init_tables(&pool).await.expect("Failed to initialize tables");
    pool
}

/// Returns queued responses in order; panics when the script runs dry.
struct ScriptedGenerator {
    responses: Mutex<VecDeque<std::result::Result<String, String>>>,
}

impl ScriptedGenerator {
    fn new(responses: Vec<std::result::Result<String, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        let next = self
            .responses
            .lock()
            .expect("script lock")
            .pop_front()
            .expect("scripted generator ran out of responses");
        next.map_err(Error::ExternalService)
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

async fn seed_mission(pool: &SqlitePool, questions: &[&str], created_offset_mins: i64) -> Mission {
    let mission = Mission {
        id: Uuid::new_v4(),
        name: "Landing page test".to_string(),
        description: "Try the flow".to_string(),
        questions: questions.iter().map(|q| q.to_string()).collect(),
        num_testers: 5,
        submission_count: 0,
        status: MissionStatus::Active,
        owner_uid: "founder-1".to_string(),
        owner_email: None,
        payout: 10,
        feedback_summary: None,
        created_at: time::now() + Duration::minutes(created_offset_mins),
    };
    missions::create_mission(pool, &mission).await.unwrap();
    mission
}

async fn seed_submission(pool: &SqlitePool, mission_id: Uuid, tester_id: &str, answers: Vec<AnswerEntry>) {
    submissions::create_submission(
        pool,
        &Submission {
            id: Uuid::new_v4(),
            mission_id,
            tester_id: tester_id.to_string(),
            tester_name: format!("Tester {}", tester_id),
            answers,
            created_at: time::now(),
        },
    )
    .await
    .unwrap();
}

fn answer(question: &str, text: &str) -> AnswerEntry {
    AnswerEntry {
        question: question.to_string(),
        answer: text.to_string(),
    }
}

/// A payload that satisfies the contract for 2 questions and 2 testers.
fn contract_payload() -> serde_json::Value {
    json!({
        "section_1_sentiment_analysis": {
            "overall": "positive",
            "highlights": ["signup was fast"]
        },
        "section_2_scoring_and_pain_points": {
            "areas": [
                { "area": "Navigation", "score": 8, "pain_points": [] },
                { "area": "Layout clarity", "score": 7, "pain_points": ["crowded footer"] },
                { "area": "Functionality", "score": 9, "pain_points": [] },
                { "area": "Visual appeal", "score": 6, "pain_points": [] }
            ]
        },
        "section_3_actionable_steps_and_ranking": {
            "high": ["fix signup button", "add search", "improve mobile layout"],
            "medium": ["add tooltips", "compress images", "add breadcrumbs"],
            "low": ["dark mode", "animations"]
        },
        "section_4_review_by_questions": {
            "questions": [
                { "question": "Q1", "answers": ["clear", "fine"], "summary": "positive" },
                { "question": "Q2", "answers": ["", "slow load"], "summary": "one complaint" }
            ]
        }
    })
}

#[tokio::test]
async fn test_generate_report_validates_and_persists() {
    let pool = test_pool().await;
    let mission = seed_mission(&pool, &["Q1", "Q2"], 0).await;
    seed_submission(&pool, mission.id, "t1", vec![answer("Q1", "clear")]).await;
    seed_submission(
        &pool,
        mission.id,
        "t2",
        vec![answer("Q2", "slow load"), answer("Q1", "fine")],
    )
    .await;

    let textgen = ScriptedGenerator::new(vec![Ok(contract_payload().to_string())]);
    let generated = report_service::generate_full_report(&pool, &textgen, mission.id)
        .await
        .unwrap();

    assert_eq!(generated.report.source_submission_count, 2);
    assert_eq!(generated.report.model, "scripted-model");
    assert_eq!(generated.sections.section_2_scoring_and_pain_points.areas.len(), 4);

    let stored = reports::latest_for_mission(&pool, mission.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.id, generated.report.id);
    // The persisted payload is the validated JSON, readable as-is.
    let round_trip: serde_json::Value = serde_json::from_str(&stored.ai_output).unwrap();
    assert_eq!(round_trip, contract_payload());
}

#[tokio::test]
async fn test_generate_report_recovers_prose_wrapped_json() {
    let pool = test_pool().await;
    let mission = seed_mission(&pool, &["Q1", "Q2"], 0).await;
    seed_submission(&pool, mission.id, "t1", vec![answer("Q1", "clear")]).await;
    seed_submission(&pool, mission.id, "t2", vec![answer("Q2", "slow")]).await;

    let wrapped = format!("Here is your report:\n{}\nLet me know!", contract_payload());
    let textgen = ScriptedGenerator::new(vec![Ok(wrapped)]);

    let generated = report_service::generate_full_report(&pool, &textgen, mission.id)
        .await
        .unwrap();
    assert_eq!(generated.sections.section_4_review_by_questions.questions.len(), 2);
}

#[tokio::test]
async fn test_generate_report_rejects_contract_violation() {
    let pool = test_pool().await;
    let mission = seed_mission(&pool, &["Q1", "Q2"], 0).await;
    seed_submission(&pool, mission.id, "t1", vec![answer("Q1", "clear")]).await;
    seed_submission(&pool, mission.id, "t2", vec![answer("Q2", "slow")]).await;

    let mut payload = contract_payload();
    payload["section_2_scoring_and_pain_points"]["areas"]
        .as_array_mut()
        .unwrap()
        .pop();
    let textgen = ScriptedGenerator::new(vec![Ok(payload.to_string())]);

    let result = report_service::generate_full_report(&pool, &textgen, mission.id).await;
    assert!(matches!(result, Err(Error::ContractViolation(_))));

    // Rejected reports are never persisted.
    assert!(reports::latest_for_mission(&pool, mission.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_generate_report_flags_non_json_response() {
    let pool = test_pool().await;
    let mission = seed_mission(&pool, &["Q1"], 0).await;
    seed_submission(&pool, mission.id, "t1", vec![answer("Q1", "ok")]).await;

    let textgen = ScriptedGenerator::new(vec![Ok("Sorry, I cannot do that.".to_string())]);
    let result = report_service::generate_full_report(&pool, &textgen, mission.id).await;
    assert!(matches!(result, Err(Error::ExternalService(_))));
}

#[tokio::test]
async fn test_generate_report_for_missing_mission() {
    let pool = test_pool().await;
    let textgen = ScriptedGenerator::new(vec![]);

    let result = report_service::generate_full_report(&pool, &textgen, Uuid::new_v4()).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_summarizer_isolates_per_mission_failures() {
    let pool = test_pool().await;

    // Three active missions, oldest first: one whose generation fails,
    // one that succeeds, one with no submissions at all.
    let failing = seed_mission(&pool, &["Q1"], 0).await;
    seed_submission(&pool, failing.id, "t1", vec![answer("Q1", "meh")]).await;

    let succeeding = seed_mission(&pool, &["Q1"], 1).await;
    seed_submission(&pool, succeeding.id, "t1", vec![answer("Q1", "broken cart")]).await;

    let empty = seed_mission(&pool, &["Q1"], 2).await;

    let textgen = ScriptedGenerator::new(vec![
        Err("model overloaded".to_string()),
        Ok("- Fix the cart".to_string()),
    ]);

    let stats = summarizer::run_sweep(&pool, &textgen).await.unwrap();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.summarized, 1);
    assert_eq!(stats.skipped, 1);

    // Failed mission stays Active for the next sweep.
    let failing = missions::get_mission(&pool, failing.id).await.unwrap().unwrap();
    assert_eq!(failing.status, MissionStatus::Active);
    assert!(failing.feedback_summary.is_none());

    let succeeding = missions::get_mission(&pool, succeeding.id).await.unwrap().unwrap();
    assert_eq!(succeeding.status, MissionStatus::Completed);
    assert_eq!(succeeding.feedback_summary.as_deref(), Some("- Fix the cart"));

    let empty = missions::get_mission(&pool, empty.id).await.unwrap().unwrap();
    assert_eq!(empty.status, MissionStatus::Active);
}

#[tokio::test]
async fn test_summarizer_second_sweep_converges() {
    let pool = test_pool().await;
    let mission = seed_mission(&pool, &["Q1"], 0).await;
    seed_submission(&pool, mission.id, "t1", vec![answer("Q1", "fine")]).await;

    let textgen = ScriptedGenerator::new(vec![Ok("Summary".to_string())]);
    let first = summarizer::run_sweep(&pool, &textgen).await.unwrap();
    assert_eq!(first.summarized, 1);

    // Everything already Completed: nothing to visit.
    let second = summarizer::run_sweep(&pool, &textgen).await.unwrap();
    assert_eq!(second, summarizer::SweepStats::default());
}
