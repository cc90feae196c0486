//! Boundary validation for externally generated content
//!
//! Everything a text-generation model returns is untrusted until it has
//! passed through here; downstream code only ever sees the typed forms.

pub mod report_contract;

pub use report_contract::{
    align_responses_to_questions, normalize_questions, parse_report_json, validate_report,
    ActionableSteps, AreaScore, QuestionReview, ReportExpectations, ReportSections,
    ReviewByQuestions, ScoringSection, EXPECTED_AREAS,
};
