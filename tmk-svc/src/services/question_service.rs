//! Survey question generation from a product description

use tmk_common::{Error, Result};

use crate::services::anthropic_client::{GenerationRequest, TextGenerator};

const QUESTIONS_SYSTEM_PROMPT: &str = "You are a business analyst helping a client create a \
feedback form for testers evaluating their website, based on a summary of the website. The form \
should contain only open-ended questions. Return the questions as a single line of text with \
each question separated by the delimiter |||. Your response is parsed mechanically, so include \
nothing besides the delimited questions.";

const QUESTIONS_MAX_TOKENS: u32 = 1000;

/// Literal delimiter the model is instructed to place between questions.
pub const QUESTION_DELIMITER: &str = "|||";

/// Split a delimited model response into trimmed, non-empty questions.
pub fn split_questions(raw: &str) -> Vec<String> {
    raw.split(QUESTION_DELIMITER)
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string)
        .collect()
}

/// Generate an ordered list of survey questions for a description.
pub async fn generate_questions(textgen: &dyn TextGenerator, description: &str) -> Result<Vec<String>> {
    if description.trim().is_empty() {
        return Err(Error::Validation("description is required".to_string()));
    }

    let request = GenerationRequest {
        system: QUESTIONS_SYSTEM_PROMPT.to_string(),
        user: description.to_string(),
        max_tokens: QUESTIONS_MAX_TOKENS,
    };

    let raw = textgen.generate(&request).await?;
    let questions = split_questions(&raw);
    if questions.is_empty() {
        return Err(Error::ExternalService(
            "Question generation returned no questions".to_string(),
        ));
    }

    tracing::info!(count = questions.len(), "Survey questions generated");

    Ok(questions)
}
