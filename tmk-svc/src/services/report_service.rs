//! Full structured mission report generation
//!
//! Builds the contract body from the mission's questions and a
//! rectangular tester-response matrix, calls the text-generation
//! collaborator once, validates the result against the report
//! contract, and persists the validated payload verbatim.

use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use uuid::Uuid;

use tmk_common::{time, Error, Result};

use crate::db::reports::{self, MissionReport};
use crate::db::{missions, submissions};
use crate::services::anthropic_client::{GenerationRequest, TextGenerator};
use crate::validators::{
    align_responses_to_questions, normalize_questions, parse_report_json, validate_report,
    ReportExpectations, ReportSections,
};

const REPORT_SYSTEM_PROMPT: &str = "You are a strict API that returns ONLY valid JSON matching \
the requested schema. No prose, no markdown.";

const REPORT_MAX_TOKENS: u32 = 4000;

/// Contract body sent as the user message. The two placeholders are
/// replaced with JSON-encoded inputs.
const CONTRACT_TEMPLATE: &str = r#"Analyze the following website-test feedback and produce a full mission report.

Survey questions, in canonical order:
{{SURVEY_QUESTIONS}}

Tester responses. Each tester carries one response per survey question, in the same order; an empty string means the tester skipped that question:
{{TESTER_RESPONSES}}

Return a single JSON object with exactly these four top-level keys:

"section_1_sentiment_analysis": an object summarizing overall tester sentiment, with an "overall" label and a "highlights" array of notable quotes or observations.

"section_2_scoring_and_pain_points": an object with an "areas" array of exactly 4 entries, in exactly this order: "Navigation", "Layout clarity", "Functionality", "Visual appeal". Each entry is an object with "area" (the name above), "score" (integer 1-10), and "pain_points" (array of strings, possibly empty).

"section_3_actionable_steps_and_ranking": an object with three arrays ranked by impact: "high" with exactly 3 entries, "medium" with exactly 3 entries, and "low" with exactly 2 entries. Each entry is a short imperative recommendation string.

"section_4_review_by_questions": an object with a "questions" array containing exactly one entry per survey question, in canonical order. Each entry is an object with "question" (the exact question text), "answers" (one string per tester, in tester order, empty string where skipped), and "summary" (one sentence synthesizing the answers).

Respond with the JSON object only."#;

/// One tester's row in the response matrix sent to the model.
#[derive(Debug, Clone, Serialize)]
pub struct TesterResponses {
    pub tester_id: String,
    pub tester_name: String,
    /// One entry per survey question, in canonical order.
    pub responses: Vec<String>,
}

/// A validated, persisted report plus its typed sections.
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub report: MissionReport,
    pub sections: ReportSections,
}

fn populate_template(template: &str, questions: &[String], responses: &[TesterResponses]) -> Result<String> {
    let questions_json = serde_json::to_string(questions)?;
    let responses_json = serde_json::to_string(responses)?;

    Ok(template
        .replacen("{{SURVEY_QUESTIONS}}", &questions_json, 1)
        .replacen("{{TESTER_RESPONSES}}", &responses_json, 1))
}

/// Short stable hash of the question list, stored with each report so
/// a report can be traced to the question set it was generated from.
fn hash_questions(questions: &[String]) -> Result<String> {
    let serialized = serde_json::to_string(questions)?;
    let digest = Sha256::digest(serialized.as_bytes());
    Ok(format!("{:x}", digest)[..16].to_string())
}

/// Generate, validate, and persist a full report for a mission.
pub async fn generate_full_report(
    pool: &SqlitePool,
    textgen: &dyn TextGenerator,
    mission_id: Uuid,
) -> Result<GeneratedReport> {
    let mission = missions::get_mission(pool, mission_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Mission {} not found", mission_id)))?;

    let questions = normalize_questions(&mission.questions);
    if questions.is_empty() {
        return Err(Error::Validation(
            "Mission has no survey questions to report on".to_string(),
        ));
    }

    let subs = submissions::list_for_mission(pool, mission_id).await?;
    let tester_responses: Vec<TesterResponses> = subs
        .iter()
        .map(|sub| TesterResponses {
            tester_id: sub.tester_id.clone(),
            tester_name: sub.tester_name.clone(),
            responses: align_responses_to_questions(&questions, &sub.answers),
        })
        .collect();

    let request = GenerationRequest {
        system: REPORT_SYSTEM_PROMPT.to_string(),
        user: populate_template(CONTRACT_TEMPLATE, &questions, &tester_responses)?,
        max_tokens: REPORT_MAX_TOKENS,
    };

    tracing::info!(
        mission_id = %mission_id,
        questions = questions.len(),
        testers = tester_responses.len(),
        "Generating full mission report"
    );

    let raw = textgen.generate(&request).await?;
    let payload = parse_report_json(&raw)?;

    let expectations = ReportExpectations {
        question_count: Some(questions.len()),
        tester_count: (!tester_responses.is_empty()).then_some(tester_responses.len()),
    };
    let ai_output = payload.to_string();
    let sections = validate_report(payload, &expectations)?;

    let report = MissionReport {
        id: Uuid::new_v4(),
        mission_id,
        ai_output,
        generated_at: time::now(),
        source_submission_count: subs.len() as i64,
        questions_hash: hash_questions(&questions)?,
        model: textgen.model().to_string(),
    };
    reports::create_report(pool, &report).await?;

    tracing::info!(mission_id = %mission_id, report_id = %report.id, "Mission report stored");

    Ok(GeneratedReport { report, sections })
}
