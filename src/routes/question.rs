use crate::auth::CurrentUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::middleware::rate_limit::RateLimit;
use crate::models::question::{AddQuestionsRequest, NoteRequest, QuestionResponse};
use crate::routes::resource_location;
use crate::service::question::QuestionService;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::{Route, State, post};
use rocket_okapi::openapi;
use sqlx::PgPool;
use uuid::Uuid;

fn parse_question_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|e| AppError::uuid("Invalid question id", e))
}

/// Append question/answer pairs to an owned session
#[openapi(tag = "Questions")]
#[post("/add", data = "<payload>")]
pub async fn add_questions(
    pool: &State<PgPool>,
    route: &Route,
    _rate_limit: RateLimit,
    current_user: CurrentUser,
    payload: Json<AddQuestionsRequest>,
) -> Result<Created<Json<Vec<QuestionResponse>>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let created = QuestionService::new(&repo).add_questions(&current_user.id, &payload).await?;

    let location = created.first().map(|q| resource_location(route, "sessions", q.session_id)).unwrap_or_default();
    Ok(Created::new(location).body(Json(created.iter().map(QuestionResponse::from).collect())))
}

/// Flip the pinned flag of a question
#[openapi(tag = "Questions")]
#[post("/<id>/pin")]
pub async fn toggle_pin(pool: &State<PgPool>, _rate_limit: RateLimit, current_user: CurrentUser, id: &str) -> Result<Json<QuestionResponse>, AppError> {
    let question_id = parse_question_id(id)?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let question = QuestionService::new(&repo).toggle_pin(&question_id, &current_user.id).await?;
    Ok(Json(QuestionResponse::from(&question)))
}

/// Replace the note attached to a question
#[openapi(tag = "Questions")]
#[post("/<id>/note", data = "<payload>")]
pub async fn update_note(
    pool: &State<PgPool>,
    _rate_limit: RateLimit,
    current_user: CurrentUser,
    id: &str,
    payload: Json<NoteRequest>,
) -> Result<Json<QuestionResponse>, AppError> {
    let question_id = parse_question_id(id)?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let question = QuestionService::new(&repo).update_note(&question_id, &current_user.id, &payload).await?;
    Ok(Json(QuestionResponse::from(&question)))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![add_questions, toggle_pin, update_note]
}
