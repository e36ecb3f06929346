use crate::models::session::validate_required;
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use validator::Validate;

#[derive(Deserialize, Debug, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionsRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_required"))]
    pub role: String,
    #[serde(default)]
    #[validate(custom(function = "validate_required"))]
    pub experiences: String,
    #[serde(default)]
    #[validate(custom(function = "validate_required"))]
    pub topics_to_focus: String,
    #[serde(default)]
    #[validate(range(min = 1, message = "numberOfQuestions must be at least 1"))]
    pub number_of_questions: u32,
}

#[derive(Deserialize, Debug, Validate, JsonSchema)]
pub struct ExplanationRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_required"))]
    pub question: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct GeneratedQuestion {
    pub question: String,
    pub answer: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct ConceptExplanation {
    pub title: String,
    pub explanation: String,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct GeneratedQuestionsResponse {
    pub success: bool,
    pub message: String,
    pub data: Vec<GeneratedQuestion>,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct ExplanationResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub explanation: ConceptExplanation,
}
