use crate::auth::CurrentUser;
use crate::config::Config;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::middleware::rate_limit::{AuthRateLimit, RateLimit};
use crate::models::user::{AuthResponse, LoginRequest, RegisterRequest, UserResponse};
use crate::routes::resource_location;
use crate::service::auth::AuthService;
use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::{Route, State, get, post};
use rocket_okapi::openapi;
use sqlx::PgPool;

/// Register a new account and receive a bearer token
#[openapi(tag = "Auth")]
#[post("/register", data = "<payload>")]
pub async fn register(
    pool: &State<PgPool>,
    config: &State<Config>,
    route: &Route,
    _rate_limit: AuthRateLimit,
    payload: Json<RegisterRequest>,
) -> Result<Created<Json<AuthResponse>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let service = AuthService::new(&repo, &config.auth);

    let response = service.register(&payload).await?;
    Ok(Created::new(resource_location(route, "auth", "profile")).body(Json(response)))
}

/// Exchange email and password for a bearer token
#[openapi(tag = "Auth")]
#[post("/login", data = "<payload>")]
pub async fn login(pool: &State<PgPool>, config: &State<Config>, _rate_limit: AuthRateLimit, payload: Json<LoginRequest>) -> Result<Json<AuthResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let service = AuthService::new(&repo, &config.auth);

    Ok(Json(service.login(&payload).await?))
}

/// Profile of the authenticated user
#[openapi(tag = "Auth")]
#[get("/profile")]
pub async fn profile(pool: &State<PgPool>, config: &State<Config>, _rate_limit: RateLimit, current_user: CurrentUser) -> Result<Json<UserResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let service = AuthService::new(&repo, &config.auth);

    Ok(Json(service.get_profile(&current_user.id).await?))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![register, login, profile]
}
