use crate::auth::CurrentUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::middleware::rate_limit::RateLimit;
use crate::models::session::{CreateSessionRequest, CreateSessionResponse, MessageResponse, SessionResponse};
use crate::routes::resource_location;
use crate::service::session::SessionService;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::{Route, State, delete, get, post};
use rocket_okapi::openapi;
use sqlx::PgPool;
use uuid::Uuid;

fn parse_session_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|e| AppError::uuid("Invalid session id", e))
}

/// Create a session, optionally seeded with question/answer pairs
#[openapi(tag = "Sessions")]
#[post("/create", data = "<payload>")]
pub async fn create_session(
    pool: &State<PgPool>,
    route: &Route,
    _rate_limit: RateLimit,
    current_user: CurrentUser,
    payload: Json<CreateSessionRequest>,
) -> Result<Created<Json<CreateSessionResponse>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let created = SessionService::new(&repo).create_session(&current_user.id, &payload).await?;

    let location = resource_location(route, "sessions", created.session.session.id);
    Ok(Created::new(location).body(Json(CreateSessionResponse {
        session: SessionResponse::from(&created.session),
        accepted: created.accepted,
        rejected: created.rejected,
    })))
}

/// Sessions owned by the authenticated user, newest first
#[openapi(tag = "Sessions")]
#[get("/my-sessions")]
pub async fn list_my_sessions(pool: &State<PgPool>, _rate_limit: RateLimit, current_user: CurrentUser) -> Result<Json<Vec<SessionResponse>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let sessions = SessionService::new(&repo).list_sessions_for_owner(&current_user.id).await?;
    Ok(Json(sessions.iter().map(SessionResponse::from).collect()))
}

/// Fetch one session with its questions, pinned ones first
#[openapi(tag = "Sessions")]
#[get("/<id>")]
pub async fn get_session(pool: &State<PgPool>, _rate_limit: RateLimit, current_user: CurrentUser, id: &str) -> Result<Json<SessionResponse>, AppError> {
    let session_id = parse_session_id(id)?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let session = SessionService::new(&repo).get_session(&session_id, &current_user.id).await?;
    Ok(Json(SessionResponse::from(&session)))
}

/// Delete a session together with all of its questions
#[openapi(tag = "Sessions")]
#[delete("/<id>")]
pub async fn delete_session(pool: &State<PgPool>, _rate_limit: RateLimit, current_user: CurrentUser, id: &str) -> Result<Json<MessageResponse>, AppError> {
    let session_id = parse_session_id(id)?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    SessionService::new(&repo).delete_session(&session_id, &current_user.id).await?;
    Ok(Json(MessageResponse::ok("Session deleted successfully")))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![create_session, list_my_sessions, get_session, delete_session]
}
