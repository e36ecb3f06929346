use crate::auth::AuthFailure;
use crate::error::app_error::ErrorBody;
use crate::middleware::rate_limit::RetryAfter;
use rocket::http::Header;
use rocket::serde::json::Json;
use rocket::{Request, Responder, catch};

fn body(message: &str) -> Json<ErrorBody> {
    Json(ErrorBody::new(message))
}

#[catch(400)]
pub fn bad_request(_: &Request) -> Json<ErrorBody> {
    body("Malformed request")
}

/// Uses the message left behind by the authentication guard when there is one.
#[catch(401)]
pub fn unauthorized(req: &Request) -> Json<ErrorBody> {
    let message = req
        .local_cache(|| None::<AuthFailure>)
        .as_ref()
        .map(|failure| failure.0.clone())
        .unwrap_or_else(|| "Not authorized, no token".to_string());
    Json(ErrorBody::new(message))
}

#[catch(403)]
pub fn forbidden(_: &Request) -> Json<ErrorBody> {
    body("Forbidden")
}

#[catch(404)]
pub fn not_found(_: &Request) -> Json<ErrorBody> {
    body("Not found")
}

#[catch(409)]
pub fn conflict(_: &Request) -> Json<ErrorBody> {
    body("Conflict")
}

// Well-formed JSON whose fields have the wrong types.
#[catch(422)]
pub fn unprocessable_entity(_: &Request) -> Json<ErrorBody> {
    body("Invalid request body")
}

#[derive(Responder)]
pub struct RateLimited {
    inner: Json<ErrorBody>,
    retry_after: Header<'static>,
}

#[catch(429)]
pub fn too_many_requests(req: &Request) -> RateLimited {
    let retry_after = req.local_cache(|| None::<RetryAfter>).map(|r| r.0).unwrap_or(60);
    RateLimited {
        inner: body("Too many requests, please try again later"),
        retry_after: Header::new("Retry-After", retry_after.to_string()),
    }
}

#[catch(500)]
pub fn internal_error(_: &Request) -> Json<ErrorBody> {
    body("Internal server error")
}
