//! Structural contract for AI-generated mission reports
//!
//! The model is asked for strict JSON with four named sections. The
//! payload is parsed once at this boundary into typed sections and each
//! structural rule is checked explicitly, so a violation message always
//! names the rule that failed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tmk_common::{Error, Result};

/// Required scoring areas, in the order the contract demands.
pub const EXPECTED_AREAS: [&str; 4] = [
    "Navigation",
    "Layout clarity",
    "Functionality",
    "Visual appeal",
];

/// The four report sections as typed structures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSections {
    /// Freeform sentiment breakdown; shape is model-controlled beyond
    /// being a JSON object.
    pub section_1_sentiment_analysis: Value,
    pub section_2_scoring_and_pain_points: ScoringSection,
    pub section_3_actionable_steps_and_ranking: ActionableSteps,
    pub section_4_review_by_questions: ReviewByQuestions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringSection {
    pub areas: Vec<AreaScore>,
}

/// One scored area. Fields beyond the area name (score, pain points,
/// commentary) are model-controlled and carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaScore {
    pub area: String,
    #[serde(flatten)]
    pub details: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionableSteps {
    pub high: Vec<Value>,
    pub medium: Vec<Value>,
    pub low: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewByQuestions {
    pub questions: Vec<QuestionReview>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionReview {
    pub question: String,
    #[serde(default)]
    pub answers: Vec<String>,
    #[serde(flatten)]
    pub details: serde_json::Map<String, Value>,
}

/// What the validator knows about the inputs the report was generated
/// from. When present, the per-question review is held to the exact
/// counts; when absent only the structural minimums apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportExpectations {
    pub question_count: Option<usize>,
    pub tester_count: Option<usize>,
}

/// Parse the raw model response as JSON.
///
/// The model is instructed to return nothing but JSON, but a wrapped
/// response is recovered once by slicing from the first `{` to the last
/// `}`. Anything else is a non-JSON response, which is an external
/// service failure, not a contract violation.
pub fn parse_report_json(raw: &str) -> Result<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return Ok(value);
    }

    let start = raw.find('{');
    let end = raw.rfind('}');
    if let (Some(start), Some(end)) = (start, end) {
        if end > start {
            if let Ok(value) = serde_json::from_str::<Value>(&raw[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(Error::ExternalService(
        "Model response was not valid JSON".to_string(),
    ))
}

fn violation(msg: impl Into<String>) -> Error {
    Error::ContractViolation(msg.into())
}

/// Validate a parsed payload against the report contract, returning the
/// typed sections on success.
pub fn validate_report(payload: Value, expectations: &ReportExpectations) -> Result<ReportSections> {
    let object = payload
        .as_object()
        .ok_or_else(|| violation("Report payload must be a JSON object"))?;

    for key in [
        "section_1_sentiment_analysis",
        "section_2_scoring_and_pain_points",
        "section_3_actionable_steps_and_ranking",
        "section_4_review_by_questions",
    ] {
        if !object.contains_key(key) {
            return Err(violation(format!("Report is missing required section {}", key)));
        }
    }

    let sections: ReportSections = serde_json::from_value(payload)
        .map_err(|e| violation(format!("Report sections have the wrong shape: {}", e)))?;

    if !sections.section_1_sentiment_analysis.is_object() {
        return Err(violation("Sentiment analysis section must be a JSON object"));
    }

    let areas = &sections.section_2_scoring_and_pain_points.areas;
    if areas.len() != EXPECTED_AREAS.len() {
        return Err(violation(format!(
            "Scoring section must contain exactly {} areas, found {}",
            EXPECTED_AREAS.len(),
            areas.len()
        )));
    }
    for (area, expected) in areas.iter().zip(EXPECTED_AREAS) {
        if area.area != expected {
            return Err(violation(format!(
                "Scoring areas must appear in the order {:?}; found '{}' where '{}' was expected",
                EXPECTED_AREAS, area.area, expected
            )));
        }
    }

    let steps = &sections.section_3_actionable_steps_and_ranking;
    if steps.high.len() != 3 || steps.medium.len() != 3 || steps.low.len() != 2 {
        return Err(violation(format!(
            "Actionable steps must contain 3 high, 3 medium, and 2 low entries, found {}/{}/{}",
            steps.high.len(),
            steps.medium.len(),
            steps.low.len()
        )));
    }

    let reviews = &sections.section_4_review_by_questions.questions;
    if reviews.is_empty() {
        return Err(violation("Review by questions must contain at least one entry"));
    }
    if let Some(question_count) = expectations.question_count {
        if reviews.len() != question_count {
            return Err(violation(format!(
                "Review by questions must contain one entry per survey question ({}), found {}",
                question_count,
                reviews.len()
            )));
        }
    }
    if let Some(tester_count) = expectations.tester_count {
        for review in reviews {
            if review.answers.len() != tester_count {
                return Err(violation(format!(
                    "Question review '{}' must carry one answer per tester ({}), found {}",
                    review.question,
                    tester_count,
                    review.answers.len()
                )));
            }
        }
    }

    Ok(sections)
}

/// Trim questions and drop empties, preserving order.
pub fn normalize_questions(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|q| q.trim())
        .filter(|q| !q.is_empty())
        .map(str::to_string)
        .collect()
}

/// Align one submission's answers to the mission's question order.
///
/// For each question in canonical order, take the matching answer by
/// exact question text, or an empty string when the tester skipped it.
/// The result is always the same length as `questions`, so stacking one
/// row per tester yields a rectangular matrix.
pub fn align_responses_to_questions(
    questions: &[String],
    answers: &[crate::db::submissions::AnswerEntry],
) -> Vec<String> {
    questions
        .iter()
        .map(|q| {
            answers
                .iter()
                .find(|entry| entry.question.trim() == q.as_str())
                .map(|entry| entry.answer.clone())
                .unwrap_or_default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::submissions::AnswerEntry;
    use serde_json::json;

    fn well_formed_payload() -> Value {
        json!({
            "section_1_sentiment_analysis": {
                "overall": "positive",
                "highlights": ["fast signup"]
            },
            "section_2_scoring_and_pain_points": {
                "areas": [
                    { "area": "Navigation", "score": 8, "pain_points": [] },
                    { "area": "Layout clarity", "score": 7, "pain_points": ["crowded footer"] },
                    { "area": "Functionality", "score": 9, "pain_points": [] },
                    { "area": "Visual appeal", "score": 6, "pain_points": ["low contrast"] }
                ]
            },
            "section_3_actionable_steps_and_ranking": {
                "high": ["fix signup button", "add search", "mobile layout"],
                "medium": ["tooltips", "faster images", "breadcrumbs"],
                "low": ["dark mode", "animations"]
            },
            "section_4_review_by_questions": {
                "questions": [
                    { "question": "Q1", "answers": ["clear", "fine"], "summary": "mostly positive" },
                    { "question": "Q2", "answers": ["hidden button", ""], "summary": "one blocker" }
                ]
            }
        })
    }

    #[test]
    fn test_accepts_well_formed_payload() {
        let expectations = ReportExpectations {
            question_count: Some(2),
            tester_count: Some(2),
        };
        let sections = validate_report(well_formed_payload(), &expectations).unwrap();
        assert_eq!(sections.section_2_scoring_and_pain_points.areas.len(), 4);
        assert_eq!(sections.section_4_review_by_questions.questions[1].question, "Q2");
    }

    #[test]
    fn test_rejects_three_areas_naming_the_rule() {
        let mut payload = well_formed_payload();
        payload["section_2_scoring_and_pain_points"]["areas"]
            .as_array_mut()
            .unwrap()
            .pop();

        let err = validate_report(payload, &ReportExpectations::default()).unwrap_err();
        match err {
            Error::ContractViolation(msg) => {
                assert!(msg.contains("exactly 4 areas"), "got: {}", msg);
            }
            other => panic!("expected ContractViolation, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_areas_out_of_order() {
        let mut payload = well_formed_payload();
        let areas = payload["section_2_scoring_and_pain_points"]["areas"]
            .as_array_mut()
            .unwrap();
        areas.swap(0, 1);

        let err = validate_report(payload, &ReportExpectations::default()).unwrap_err();
        match err {
            Error::ContractViolation(msg) => assert!(msg.contains("order"), "got: {}", msg),
            other => panic!("expected ContractViolation, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_wrong_step_counts() {
        let mut payload = well_formed_payload();
        payload["section_3_actionable_steps_and_ranking"]["low"] = json!(["only one"]);

        let err = validate_report(payload, &ReportExpectations::default()).unwrap_err();
        match err {
            Error::ContractViolation(msg) => {
                assert!(msg.contains("3 high, 3 medium, and 2 low"), "got: {}", msg);
            }
            other => panic!("expected ContractViolation, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_missing_section() {
        let mut payload = well_formed_payload();
        payload.as_object_mut().unwrap().remove("section_4_review_by_questions");

        let err = validate_report(payload, &ReportExpectations::default()).unwrap_err();
        match err {
            Error::ContractViolation(msg) => {
                assert!(msg.contains("section_4_review_by_questions"), "got: {}", msg);
            }
            other => panic!("expected ContractViolation, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_question_count_mismatch_when_expected() {
        let expectations = ReportExpectations {
            question_count: Some(3),
            tester_count: None,
        };
        let err = validate_report(well_formed_payload(), &expectations).unwrap_err();
        assert!(matches!(err, Error::ContractViolation(_)));
    }

    #[test]
    fn test_rejects_ragged_answer_rows_when_tester_count_known() {
        let expectations = ReportExpectations {
            question_count: Some(2),
            tester_count: Some(3),
        };
        let err = validate_report(well_formed_payload(), &expectations).unwrap_err();
        match err {
            Error::ContractViolation(msg) => {
                assert!(msg.contains("one answer per tester"), "got: {}", msg);
            }
            other => panic!("expected ContractViolation, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_direct_json() {
        let value = parse_report_json(r#"{"a": 1}"#).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_parse_recovers_wrapped_json() {
        let raw = "Here is the report:\n```json\n{\"a\": 1}\n```\nHope that helps!";
        let value = parse_report_json(raw).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_parse_garbage_is_external_service_error() {
        let err = parse_report_json("I could not generate a report.").unwrap_err();
        assert!(matches!(err, Error::ExternalService(_)));

        let err = parse_report_json("{ not json at all }").unwrap_err();
        assert!(matches!(err, Error::ExternalService(_)));
    }

    #[test]
    fn test_normalize_questions_trims_and_drops_empties() {
        let raw = vec![
            "  Q1 ".to_string(),
            "".to_string(),
            "   ".to_string(),
            "Q2".to_string(),
        ];
        assert_eq!(normalize_questions(&raw), vec!["Q1", "Q2"]);
    }

    #[test]
    fn test_align_fills_skipped_questions_with_empty() {
        let questions = vec!["Q1".to_string(), "Q2".to_string()];
        let answers = vec![AnswerEntry {
            question: "Q2".to_string(),
            answer: "yes".to_string(),
        }];

        assert_eq!(align_responses_to_questions(&questions, &answers), vec!["", "yes"]);
    }

    #[test]
    fn test_align_ignores_answer_order() {
        let questions = vec!["Q1".to_string(), "Q2".to_string(), "Q3".to_string()];
        let answers = vec![
            AnswerEntry {
                question: "Q3".to_string(),
                answer: "c".to_string(),
            },
            AnswerEntry {
                question: " Q1 ".to_string(),
                answer: "a".to_string(),
            },
        ];

        assert_eq!(
            align_responses_to_questions(&questions, &answers),
            vec!["a", "", "c"]
        );
    }
}
