use crate::models::question::{Question, QuestionList, QuestionResponse};
use chrono::{DateTime, Utc};
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub experiences: String,
    pub topics_to_focus: String,
    pub description: String,
    pub question_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub role: String,
    pub experiences: String,
    pub topics_to_focus: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct SessionWithQuestions {
    pub session: Session,
    pub questions: Vec<Question>,
}

#[derive(Deserialize, Debug, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
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
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Option<QuestionList>,
}

impl From<&CreateSessionRequest> for NewSession {
    fn from(request: &CreateSessionRequest) -> Self {
        Self {
            role: request.role.trim().to_string(),
            experiences: request.experiences.trim().to_string(),
            topics_to_focus: request.topics_to_focus.trim().to_string(),
            description: request.description.as_deref().map(str::trim).unwrap_or_default().to_string(),
        }
    }
}

#[derive(Serialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub role: String,
    pub experiences: String,
    pub topics_to_focus: String,
    pub description: String,
    pub questions: Vec<QuestionResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&SessionWithQuestions> for SessionResponse {
    fn from(value: &SessionWithQuestions) -> Self {
        let session = &value.session;
        Self {
            id: session.id,
            user_id: session.user_id,
            role: session.role.clone(),
            experiences: session.experiences.clone(),
            topics_to_focus: session.topics_to_focus.clone(),
            description: session.description.clone(),
            questions: value.questions.iter().map(QuestionResponse::from).collect(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

/// An initial question entry that was dropped during session creation.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct RejectedQuestion {
    pub index: usize,
    pub reason: String,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct CreateSessionResponse {
    pub session: SessionResponse,
    pub accepted: usize,
    pub rejected: Vec<RejectedQuestion>,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

pub fn validate_required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("required").with_message("Missing required field".into()))
    } else {
        Ok(())
    }
}
