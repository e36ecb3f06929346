mod auth;
mod config;
mod database;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod service;

#[cfg(test)]
pub mod test_utils;

pub use config::Config;

use crate::db::stage_db;
use crate::middleware::RequestLogger;
use crate::middleware::rate_limit::RateLimiter;
use crate::routes as app_routes;
use crate::service::ai::{AiGateway, GeminiGateway};
use rocket::fairing::AdHoc;
use rocket::{Build, Catcher, Rocket, catchers, http::Method};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_okapi::swagger_ui::{SwaggerUIConfig, make_swagger_ui};
use rocket_okapi::{get_openapi_route, okapi::merge::marge_spec_list};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(log_level: &str, json_format: bool) {
    // RUST_LOG takes precedence over the configured level, e.g.
    //   RUST_LOG=info,interview_prep::service=debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_line_number(true);

    // A subscriber may already be installed when several instances are built in one process.
    let _ = if json_format { subscriber.json().try_init() } else { subscriber.try_init() };
}

fn ensure_jwt_secret(auth_config: &config::AuthConfig) {
    let profile = std::env::var("ROCKET_PROFILE").unwrap_or_else(|_| "debug".to_string());

    if profile != "debug" && auth_config.uses_development_secret() {
        panic!(
            "JWT_SECRET is required for profile '{}'. Generate one with: openssl rand -base64 32",
            profile
        );
    }
}

fn build_cors(cors_config: &config::CorsConfig) -> CorsOptions {
    let is_wildcard = cors_config.allowed_origins.len() == 1 && cors_config.allowed_origins[0] == "*";

    if is_wildcard && cors_config.allow_credentials {
        panic!(
            "Invalid CORS configuration: Cannot use wildcard origins (*) with credentials enabled. \
            Either set specific origins or disable credentials."
        );
    }

    let allowed_origins = if cors_config.allowed_origins.is_empty() {
        AllowedOrigins::some_exact::<&str>(&[])
    } else if is_wildcard {
        AllowedOrigins::all()
    } else {
        AllowedOrigins::some_exact(&cors_config.allowed_origins.iter().map(String::as_str).collect::<Vec<_>>())
    };

    CorsOptions {
        allowed_origins,
        allowed_methods: [Method::Get, Method::Post, Method::Delete, Method::Options, Method::Head]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: rocket_cors::AllowedHeaders::some(&["Content-Type", "Authorization", "Accept"]),
        allow_credentials: cors_config.allow_credentials,
        expose_headers: ["X-Request-Id", "Retry-After"].iter().map(ToString::to_string).collect(),
        ..Default::default()
    }
}

fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return config::DEFAULT_API_BASE_PATH.to_string();
    }

    let mut normalized = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    };

    while normalized.ends_with('/') && normalized.len() > 1 {
        normalized.pop();
    }

    normalized
}

fn join_base_path(base_path: &str, path: &str) -> String {
    let base = base_path.trim_end_matches('/');
    let suffix = path.trim_start_matches('/');

    if base.is_empty() {
        format!("/{}", suffix)
    } else {
        format!("{}/{}", base, suffix)
    }
}

fn collect_base_paths(api_config: &config::ApiConfig) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    let primary = std::iter::once(&api_config.base_path);

    for path in primary.chain(api_config.additional_base_paths.iter()).map(|raw| normalize_base_path(raw)) {
        if !normalized.contains(&path) {
            normalized.push(path);
        }
    }

    normalized
}

struct RouteSpec {
    path: &'static str,
    routes: Vec<rocket::Route>,
    openapi: rocket_okapi::okapi::openapi3::OpenApi,
}

fn collect_route_specs() -> Vec<RouteSpec> {
    let specs = [
        ("/auth", app_routes::auth::routes()),
        ("/sessions", app_routes::session::routes()),
        ("/questions", app_routes::question::routes()),
        ("/ai", app_routes::ai::routes()),
        ("/health", app_routes::health::routes()),
    ];

    specs.into_iter().map(|(path, (routes, openapi))| RouteSpec { path, routes, openapi }).collect()
}

fn mount_api_routes(mut rocket: Rocket<Build>, base_path: &str, enable_swagger: bool) -> Rocket<Build> {
    let mut openapi_list = Vec::new();
    for spec in collect_route_specs() {
        rocket = rocket.mount(join_base_path(base_path, spec.path), spec.routes);
        openapi_list.push((spec.path, spec.openapi));
    }

    if enable_swagger {
        let openapi_docs = match marge_spec_list(&openapi_list) {
            Ok(docs) => docs,
            Err(err) => panic!("Could not merge OpenAPI spec: {}", err),
        };

        let settings = rocket_okapi::settings::OpenApiSettings::default();
        rocket = rocket.mount(base_path, vec![get_openapi_route(openapi_docs, &settings)]);

        let openapi_url = join_base_path(base_path, "openapi.json");
        rocket = rocket.mount(
            join_base_path(base_path, "docs"),
            make_swagger_ui(&SwaggerUIConfig {
                url: openapi_url,
                ..Default::default()
            }),
        );
    }

    rocket.register(base_path, json_catchers())
}

fn json_catchers() -> Vec<Catcher> {
    catchers![
        app_routes::error::bad_request,
        app_routes::error::unauthorized,
        app_routes::error::forbidden,
        app_routes::error::not_found,
        app_routes::error::conflict,
        app_routes::error::unprocessable_entity,
        app_routes::error::too_many_requests,
        app_routes::error::internal_error,
    ]
}

fn stage_rate_limiter(rate_limit_config: config::RateLimitConfig) -> AdHoc {
    AdHoc::on_ignite("Rate Limiter", move |rocket| {
        let limiter = Arc::new(RateLimiter::new(rate_limit_config));
        limiter.clone().spawn_cleanup_task();

        Box::pin(async move { rocket.manage(limiter) })
    })
}

pub fn build_rocket(config: Config) -> Rocket<Build> {
    init_tracing(&config.logging.level, config.logging.json_format);
    ensure_jwt_secret(&config.auth);

    let cors = build_cors(&config.cors).to_cors().expect("Failed to create CORS fairing");
    let gateway: Arc<dyn AiGateway> = Arc::new(GeminiGateway::new(&config.ai).expect("Failed to create AI gateway"));

    if config.ai.enabled && config.ai.api_key.is_empty() {
        tracing::warn!("GEMINI_API_KEY is not set; AI endpoints will answer 503");
    }

    let figment = rocket::Config::figment()
        .merge(("address", config.server.address.clone()))
        .merge(("port", config.server.port));

    let base_paths = collect_base_paths(&config.api);
    let enable_swagger = config.api.enable_swagger;

    let mut rocket = rocket::custom(figment)
        .attach(stage_rate_limiter(config.rate_limit.clone()))
        .attach(cors)
        .attach(RequestLogger)
        .attach(stage_db(config.database.clone()))
        .manage(gateway)
        .manage(config);

    for base_path in &base_paths {
        rocket = mount_api_routes(rocket, base_path, enable_swagger);
    }

    rocket
}
