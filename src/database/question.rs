use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::question::{Question, QuestionDraft, QuestionWithOwner};
use sqlx::PgConnection;
use uuid::Uuid;

#[async_trait::async_trait]
pub trait QuestionRepository {
    /// Appends `questions` to the end of the session's ordered list.
    ///
    /// Concurrent appends to the same session are serialized by the store, so no
    /// appended question is lost and each batch stays contiguous.
    async fn append_questions(&self, session_id: &Uuid, questions: &[QuestionDraft]) -> Result<Vec<Question>, AppError>;
    async fn get_question_with_owner(&self, id: &Uuid) -> Result<Option<QuestionWithOwner>, AppError>;
    async fn toggle_pin(&self, id: &Uuid) -> Result<Option<Question>, AppError>;
    async fn update_note(&self, id: &Uuid, note: &str) -> Result<Option<Question>, AppError>;
}

#[async_trait::async_trait]
impl QuestionRepository for PostgresRepository {
    async fn append_questions(&self, session_id: &Uuid, questions: &[QuestionDraft]) -> Result<Vec<Question>, AppError> {
        let mut tx = self.pool.begin().await?;

        // The row lock taken here is held until commit and orders concurrent appenders.
        let reserved: Option<(i32,)> = sqlx::query_as(
            r#"
            UPDATE interview_session
            SET question_count = question_count + $2, updated_at = now()
            WHERE id = $1
            RETURNING question_count
            "#,
        )
        .bind(session_id)
        .bind(questions.len() as i32)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((question_count,)) = reserved else {
            tx.rollback().await?;
            return Err(AppError::NotFound("Session not found".to_string()));
        };

        let start = question_count - questions.len() as i32;
        let created = insert_questions(&mut *tx, session_id, start, questions).await?;
        tx.commit().await?;

        Ok(created)
    }

    async fn get_question_with_owner(&self, id: &Uuid) -> Result<Option<QuestionWithOwner>, AppError> {
        let question = sqlx::query_as::<_, QuestionWithOwner>(
            r#"
            SELECT q.id, q.session_id, q.position, q.question, q.answer, q.is_pinned, q.note, q.created_at, q.updated_at,
                   s.user_id AS owner_id
            FROM question q
            JOIN interview_session s ON s.id = q.session_id
            WHERE q.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(question)
    }

    async fn toggle_pin(&self, id: &Uuid) -> Result<Option<Question>, AppError> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            UPDATE question
            SET is_pinned = NOT is_pinned, updated_at = now()
            WHERE id = $1
            RETURNING id, session_id, position, question, answer, is_pinned, note, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(question)
    }

    async fn update_note(&self, id: &Uuid, note: &str) -> Result<Option<Question>, AppError> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            UPDATE question
            SET note = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, session_id, position, question, answer, is_pinned, note, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(note)
        .fetch_optional(&self.pool)
        .await?;

        Ok(question)
    }
}

/// Inserts `drafts` under `session_id` at consecutive positions starting at `start`.
pub(crate) async fn insert_questions(conn: &mut PgConnection, session_id: &Uuid, start: i32, drafts: &[QuestionDraft]) -> Result<Vec<Question>, AppError> {
    let mut created = Vec::with_capacity(drafts.len());

    for (offset, draft) in drafts.iter().enumerate() {
        let question = sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO question (session_id, position, question, answer)
            VALUES ($1, $2, $3, $4)
            RETURNING id, session_id, position, question, answer, is_pinned, note, created_at, updated_at
            "#,
        )
        .bind(session_id)
        .bind(start + offset as i32)
        .bind(&draft.question)
        .bind(&draft.answer)
        .fetch_one(&mut *conn)
        .await?;

        created.push(question);
    }

    Ok(created)
}
