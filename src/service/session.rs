use crate::database::session::SessionRepository;
use crate::error::app_error::AppError;
use crate::models::question::{Question, QuestionDraft, QuestionEntry};
use crate::models::session::{CreateSessionRequest, NewSession, RejectedQuestion, SessionWithQuestions};
use uuid::Uuid;
use validator::Validate;

/// Result of creating a session: the stored session plus a report on the initial questions.
#[derive(Debug)]
pub struct CreatedSession {
    pub session: SessionWithQuestions,
    pub accepted: usize,
    pub rejected: Vec<RejectedQuestion>,
}

pub struct SessionService<'a, R: SessionRepository> {
    repository: &'a R,
}

impl<'a, R: SessionRepository + Sync> SessionService<'a, R> {
    pub fn new(repository: &'a R) -> Self {
        SessionService { repository }
    }

    pub async fn create_session(&self, owner_id: &Uuid, request: &CreateSessionRequest) -> Result<CreatedSession, AppError> {
        request.validate()?;

        let (drafts, rejected) = partition_initial_questions(request)?;
        let new_session = NewSession::from(request);

        let mut session = self.repository.create_session(owner_id, &new_session, &drafts).await?;
        pinned_first(&mut session.questions);

        if !rejected.is_empty() {
            tracing::info!(
                session_id = %session.session.id,
                rejected = rejected.len(),
                "dropped malformed initial questions"
            );
        }

        Ok(CreatedSession {
            accepted: drafts.len(),
            session,
            rejected,
        })
    }

    pub async fn list_sessions_for_owner(&self, owner_id: &Uuid) -> Result<Vec<SessionWithQuestions>, AppError> {
        let mut sessions = self.repository.list_sessions_for_user(owner_id).await?;
        for session in &mut sessions {
            pinned_first(&mut session.questions);
        }
        Ok(sessions)
    }

    pub async fn get_session(&self, session_id: &Uuid, requester_id: &Uuid) -> Result<SessionWithQuestions, AppError> {
        let mut session = self
            .repository
            .get_session_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

        if session.session.user_id != *requester_id {
            return Err(AppError::Forbidden("Not authorized to view this session".to_string()));
        }

        pinned_first(&mut session.questions);
        Ok(session)
    }

    pub async fn delete_session(&self, session_id: &Uuid, requester_id: &Uuid) -> Result<(), AppError> {
        let owner_id = self
            .repository
            .get_session_owner(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

        if owner_id != *requester_id {
            return Err(AppError::Forbidden("Not authorized to delete this session".to_string()));
        }

        self.repository.delete_session(session_id).await
    }
}

fn partition_initial_questions(request: &CreateSessionRequest) -> Result<(Vec<QuestionDraft>, Vec<RejectedQuestion>), AppError> {
    let entries: &[QuestionEntry] = match &request.questions {
        Some(list) => list
            .entries()
            .ok_or_else(|| AppError::BadRequest("questions must be a list".to_string()))?,
        None => &[],
    };

    let mut drafts = Vec::new();
    let mut rejected = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        match entry.to_draft() {
            Ok(draft) => drafts.push(draft),
            Err(reason) => rejected.push(RejectedQuestion {
                index,
                reason: reason.to_string(),
            }),
        }
    }

    Ok((drafts, rejected))
}

/// Moves pinned questions to the front, keeping position order inside each group.
pub fn pinned_first(questions: &mut [Question]) {
    questions.sort_by_key(|question| (!question.is_pinned, question.position));
}
