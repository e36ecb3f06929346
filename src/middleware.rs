pub mod rate_limit;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::request::Request;
use rocket::{Data, Response};
use tracing::{info, warn};
use uuid::Uuid;

/// Per-request correlation id, echoed back in `X-Request-Id`.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new() -> Self {
        RequestId(Uuid::new_v4().to_string())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

const RESPONSE_HEADERS: [(&str, &str); 6] = [
    ("X-Content-Type-Options", "nosniff"),
    ("X-Frame-Options", "DENY"),
    ("Cache-Control", "no-store, no-cache, must-revalidate, private"),
    ("Pragma", "no-cache"),
    ("Expires", "0"),
    ("Surrogate-Control", "no-store"),
];

/// Tags every request with a [`RequestId`], logs it, and stamps security and no-cache headers on the response.
pub struct RequestLogger;

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request Logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        let request_id = RequestId::new();
        request.local_cache(|| Some(request_id.clone()));

        info!(
            request_id = %request_id.0,
            method = %request.method(),
            uri = %request.uri(),
            "incoming request"
        );
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let request_id = request
            .local_cache(|| None::<RequestId>)
            .as_ref()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| "unknown".to_string());

        let status = response.status();

        response.set_header(Header::new("X-Request-Id", request_id.clone()));
        for (name, value) in RESPONSE_HEADERS {
            response.set_header(Header::new(name, value));
        }

        if status.class().is_server_error() || status.class().is_client_error() {
            warn!(
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri(),
                status = %status.code,
                "request completed with error"
            );
        } else {
            info!(
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri(),
                status = %status.code,
                "request completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::local::asynchronous::Client;
    use rocket::{get, routes};

    #[get("/ping")]
    fn ping() -> &'static str {
        "pong"
    }

    #[test]
    fn request_ids_are_unique_uuids() {
        let first = RequestId::new();
        let second = RequestId::default();
        assert!(Uuid::parse_str(&first.0).is_ok());
        assert_ne!(first.0, second.0);
    }

    #[rocket::async_test]
    async fn responses_carry_request_id_and_no_cache_headers() {
        let rocket = rocket::build().attach(RequestLogger).mount("/", routes![ping]);
        let client = Client::tracked(rocket).await.expect("valid rocket instance");

        let response = client.get("/ping").dispatch().await;
        let headers = response.headers();

        let request_id = headers.get_one("X-Request-Id").expect("request id header");
        assert!(Uuid::parse_str(request_id).is_ok());
        assert_eq!(headers.get_one("Pragma"), Some("no-cache"));
        assert_eq!(headers.get_one("Expires"), Some("0"));
        assert_eq!(headers.get_one("X-Frame-Options"), Some("DENY"));
    }
}
