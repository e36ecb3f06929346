use crate::database::postgres_repository::PostgresRepository;
use crate::database::question::insert_questions;
use crate::error::app_error::AppError;
use crate::models::question::{Question, QuestionDraft};
use crate::models::session::{NewSession, Session, SessionWithQuestions};
use std::collections::HashMap;
use uuid::Uuid;

#[async_trait::async_trait]
pub trait SessionRepository {
    /// Creates the session and its initial questions as one unit.
    async fn create_session(&self, owner_id: &Uuid, session: &NewSession, questions: &[QuestionDraft]) -> Result<SessionWithQuestions, AppError>;
    /// Sessions of `owner_id`, newest first, questions ordered by position.
    async fn list_sessions_for_user(&self, owner_id: &Uuid) -> Result<Vec<SessionWithQuestions>, AppError>;
    async fn get_session_by_id(&self, id: &Uuid) -> Result<Option<SessionWithQuestions>, AppError>;
    async fn get_session_owner(&self, id: &Uuid) -> Result<Option<Uuid>, AppError>;
    /// Removes the session together with all of its questions.
    async fn delete_session(&self, id: &Uuid) -> Result<(), AppError>;
}

#[async_trait::async_trait]
impl SessionRepository for PostgresRepository {
    async fn create_session(&self, owner_id: &Uuid, session: &NewSession, questions: &[QuestionDraft]) -> Result<SessionWithQuestions, AppError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO interview_session (user_id, role, experiences, topics_to_focus, description, question_count)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, role, experiences, topics_to_focus, description, question_count, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(&session.role)
        .bind(&session.experiences)
        .bind(&session.topics_to_focus)
        .bind(&session.description)
        .bind(questions.len() as i32)
        .fetch_one(&mut *tx)
        .await?;

        let questions = insert_questions(&mut *tx, &created.id, 0, questions).await?;
        tx.commit().await?;

        Ok(SessionWithQuestions { session: created, questions })
    }

    async fn list_sessions_for_user(&self, owner_id: &Uuid) -> Result<Vec<SessionWithQuestions>, AppError> {
        let sessions = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, role, experiences, topics_to_focus, description, question_count, created_at, updated_at
            FROM interview_session
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        if sessions.is_empty() {
            return Ok(Vec::new());
        }

        let session_ids: Vec<Uuid> = sessions.iter().map(|session| session.id).collect();
        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, session_id, position, question, answer, is_pinned, note, created_at, updated_at
            FROM question
            WHERE session_id = ANY($1)
            ORDER BY session_id, position
            "#,
        )
        .bind(&session_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(attach_questions(sessions, questions))
    }

    async fn get_session_by_id(&self, id: &Uuid) -> Result<Option<SessionWithQuestions>, AppError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, role, experiences, topics_to_focus, description, question_count, created_at, updated_at
            FROM interview_session
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(session) = session else {
            return Ok(None);
        };

        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, session_id, position, question, answer, is_pinned, note, created_at, updated_at
            FROM question
            WHERE session_id = $1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(SessionWithQuestions { session, questions }))
    }

    async fn get_session_owner(&self, id: &Uuid) -> Result<Option<Uuid>, AppError> {
        let owner: Option<(Uuid,)> = sqlx::query_as("SELECT user_id FROM interview_session WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(owner.map(|(user_id,)| user_id))
    }

    async fn delete_session(&self, id: &Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        // Appenders reserve positions through this row, so they queue behind the delete
        // and then find no session.
        let locked: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM interview_session WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if locked.is_none() {
            tx.rollback().await?;
            return Err(AppError::NotFound("Session not found".to_string()));
        }

        let deleted_questions = sqlx::query("DELETE FROM question WHERE session_id = $1").bind(id).execute(&mut *tx).await?;
        sqlx::query("DELETE FROM interview_session WHERE id = $1").bind(id).execute(&mut *tx).await?;
        tx.commit().await?;

        tracing::debug!(
            session_id = %id,
            deleted_questions = deleted_questions.rows_affected(),
            "session deleted"
        );

        Ok(())
    }
}

/// Groups position-ordered questions under their sessions, keeping session order.
pub(crate) fn attach_questions(sessions: Vec<Session>, questions: Vec<Question>) -> Vec<SessionWithQuestions> {
    let mut by_session: HashMap<Uuid, Vec<Question>> = HashMap::new();
    for question in questions {
        by_session.entry(question.session_id).or_default().push(question);
    }

    sessions
        .into_iter()
        .map(|session| {
            let mut questions = by_session.remove(&session.id).unwrap_or_default();
            questions.sort_by_key(|question| question.position);
            SessionWithQuestions { session, questions }
        })
        .collect()
}
