use crate::auth::CurrentUser;
use crate::config::Config;
use crate::error::app_error::AppError;
use crate::middleware::rate_limit::RateLimit;
use crate::models::ai::{ExplanationRequest, ExplanationResponse, GenerateQuestionsRequest, GeneratedQuestionsResponse};
use crate::service::ai::{AiGateway, AiService};
use rocket::serde::json::Json;
use rocket::{State, post};
use rocket_okapi::openapi;
use std::sync::Arc;

/// Generate interview question/answer pairs for a role
#[openapi(tag = "AI")]
#[post("/generate-questions", data = "<payload>")]
pub async fn generate_questions(
    gateway: &State<Arc<dyn AiGateway>>,
    config: &State<Config>,
    _rate_limit: RateLimit,
    _current_user: CurrentUser,
    payload: Json<GenerateQuestionsRequest>,
) -> Result<Json<GeneratedQuestionsResponse>, AppError> {
    let service = AiService::new(gateway.inner().as_ref(), &config.ai);
    let data = service.generate_questions(&payload).await?;

    Ok(Json(GeneratedQuestionsResponse {
        success: true,
        message: "Interview questions generated successfully".to_string(),
        data,
    }))
}

/// Explain the concept behind an interview question
#[openapi(tag = "AI")]
#[post("/generate-explanation", data = "<payload>")]
pub async fn generate_explanation(
    gateway: &State<Arc<dyn AiGateway>>,
    config: &State<Config>,
    _rate_limit: RateLimit,
    _current_user: CurrentUser,
    payload: Json<ExplanationRequest>,
) -> Result<Json<ExplanationResponse>, AppError> {
    let service = AiService::new(gateway.inner().as_ref(), &config.ai);
    let explanation = service.generate_explanation(&payload).await?;

    Ok(Json(ExplanationResponse {
        success: true,
        message: "Concept explanation generated successfully".to_string(),
        explanation,
    }))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![generate_questions, generate_explanation]
}
