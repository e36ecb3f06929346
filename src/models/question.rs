use chrono::{DateTime, Utc};
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Question {
    pub id: Uuid,
    pub session_id: Uuid,
    pub position: i32,
    pub question: String,
    pub answer: String,
    pub is_pinned: bool,
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A question joined with the owner of its session.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuestionWithOwner {
    #[sqlx(flatten)]
    pub question: Question,
    pub owner_id: Uuid,
}

/// A validated question/answer pair waiting to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub question: String,
    pub answer: String,
}

/// Question/answer pair as submitted by the client. Both fields are optional on the
/// wire so that malformed entries can be reported instead of failing the whole body.
#[derive(Deserialize, Serialize, Debug, Clone, Default, JsonSchema)]
pub struct QuestionInput {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
}

impl QuestionInput {
    pub fn to_draft(&self) -> Result<QuestionDraft, &'static str> {
        let question = self.question.as_deref().map(str::trim).unwrap_or_default();
        let answer = self.answer.as_deref().map(str::trim).unwrap_or_default();

        match (question.is_empty(), answer.is_empty()) {
            (true, true) => Err("Missing question and answer"),
            (true, false) => Err("Missing question"),
            (false, true) => Err("Missing answer"),
            (false, false) => Ok(QuestionDraft {
                question: question.to_string(),
                answer: answer.to_string(),
            }),
        }
    }
}

/// One submitted entry. Values that do not read as a question/answer object
/// (`null`, a bare string, a non-string field) land in `Malformed`.
#[derive(Deserialize, Debug, Clone, JsonSchema)]
#[serde(untagged)]
pub enum QuestionEntry {
    Input(QuestionInput),
    Malformed(serde_json::Value),
}

impl QuestionEntry {
    pub fn to_draft(&self) -> Result<QuestionDraft, &'static str> {
        match self {
            QuestionEntry::Input(input) => input.to_draft(),
            QuestionEntry::Malformed(_) => Err("Malformed question entry"),
        }
    }
}

/// The `questions` field of a request body, accepted in any JSON shape.
#[derive(Deserialize, Debug, Clone, JsonSchema)]
#[serde(untagged)]
pub enum QuestionList {
    Entries(Vec<QuestionEntry>),
    NotAList(serde_json::Value),
}

impl QuestionList {
    /// The submitted entries, or `None` when `questions` was not a list.
    pub fn entries(&self) -> Option<&[QuestionEntry]> {
        match self {
            QuestionList::Entries(entries) => Some(entries),
            QuestionList::NotAList(_) => None,
        }
    }
}

#[derive(Deserialize, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddQuestionsRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub questions: Option<QuestionList>,
}

#[derive(Deserialize, Debug, Default, JsonSchema)]
pub struct NoteRequest {
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Serialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub id: Uuid,
    #[serde(rename = "session")]
    pub session_id: Uuid,
    pub question: String,
    pub answer: String,
    pub is_pinned: bool,
    pub note: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Question> for QuestionResponse {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id,
            session_id: question.session_id,
            question: question.question.clone(),
            answer: question.answer.clone(),
            is_pinned: question.is_pinned,
            note: question.note.clone(),
            position: question.position,
            created_at: question.created_at,
            updated_at: question.updated_at,
        }
    }
}

#[cfg(test)]
impl QuestionInput {
    pub fn new(question: &str, answer: &str) -> Self {
        Self {
            question: Some(question.to_string()),
            answer: Some(answer.to_string()),
        }
    }
}
