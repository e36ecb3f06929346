use crate::database::question::QuestionRepository;
use crate::database::session::SessionRepository;
use crate::error::app_error::AppError;
use crate::models::question::{AddQuestionsRequest, NoteRequest, Question, QuestionDraft, QuestionEntry};
use uuid::Uuid;

pub struct QuestionService<'a, R> {
    repository: &'a R,
}

impl<'a, R: QuestionRepository + SessionRepository + Sync> QuestionService<'a, R> {
    pub fn new(repository: &'a R) -> Self {
        QuestionService { repository }
    }

    /// Appends a batch to a session the requester owns. Every entry must be complete.
    pub async fn add_questions(&self, requester_id: &Uuid, request: &AddQuestionsRequest) -> Result<Vec<Question>, AppError> {
        let session_id = request
            .session_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::BadRequest("sessionId is required".to_string()))?;
        let session_id = Uuid::parse_str(session_id).map_err(|e| AppError::uuid("Invalid session id", e))?;

        let entries: &[QuestionEntry] = match &request.questions {
            Some(list) => list
                .entries()
                .ok_or_else(|| AppError::BadRequest("questions must be a list".to_string()))?,
            None => &[],
        };

        if entries.is_empty() {
            return Err(AppError::BadRequest("At least one question is required".to_string()));
        }

        let drafts = entries
            .iter()
            .enumerate()
            .map(|(index, input)| input.to_draft().map_err(|reason| AppError::BadRequest(format!("Question {index}: {reason}"))))
            .collect::<Result<Vec<QuestionDraft>, AppError>>()?;

        let owner_id = self
            .repository
            .get_session_owner(&session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

        if owner_id != *requester_id {
            return Err(AppError::Forbidden("Not authorized to modify this session".to_string()));
        }

        self.repository.append_questions(&session_id, &drafts).await
    }

    pub async fn toggle_pin(&self, question_id: &Uuid, requester_id: &Uuid) -> Result<Question, AppError> {
        self.ensure_owner(question_id, requester_id).await?;

        self.repository
            .toggle_pin(question_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Question not found".to_string()))
    }

    pub async fn update_note(&self, question_id: &Uuid, requester_id: &Uuid, request: &NoteRequest) -> Result<Question, AppError> {
        self.ensure_owner(question_id, requester_id).await?;

        let note = request.note.as_deref().unwrap_or_default();
        self.repository
            .update_note(question_id, note)
            .await?
            .ok_or_else(|| AppError::NotFound("Question not found".to_string()))
    }

    async fn ensure_owner(&self, question_id: &Uuid, requester_id: &Uuid) -> Result<(), AppError> {
        let question = self
            .repository
            .get_question_with_owner(question_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

        if question.owner_id != *requester_id {
            return Err(AppError::Forbidden("Not authorized to modify this question".to_string()));
        }

        Ok(())
    }
}
