use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::auth::{decode_token, parse_bearer_token};
use crate::config::{Config, RateLimitConfig};
use rocket::http::{Method, Status};
use rocket::request::{FromRequest, Outcome, Request};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{RefOr, Response as OpenApiResponse, Responses};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Bucket {
    Read,
    Mutation,
    Auth,
}

impl Bucket {
    fn for_method(method: Method) -> Self {
        match method {
            Method::Get | Method::Head | Method::Options => Bucket::Read,
            _ => Bucket::Mutation,
        }
    }
}

/// Who a request is counted against. A request with a valid bearer token counts against both.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Identity {
    Ip(String),
    Subject(String),
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    hits: u32,
}

#[derive(Debug)]
pub(crate) struct RateLimiter {
    config: RateLimitConfig,
    window: Duration,
    windows: Mutex<HashMap<(Identity, Bucket), Window>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Allow,
    Limited { retry_after: Duration },
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            window: Duration::from_secs(config.window_seconds.max(1)),
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Periodically drops expired windows so idle clients do not accumulate.
    pub fn spawn_cleanup_task(self: Arc<Self>) {
        let every = Duration::from_secs(self.config.cleanup_interval_seconds.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let now = Instant::now();
                self.windows.lock().await.retain(|_, window| now.duration_since(window.started) < self.window);
            }
        });
    }

    /// Fixed-window check; hits are only recorded when every identity is under its limit.
    async fn check(&self, identities: &[Identity], bucket: Bucket) -> Decision {
        let limit = self.limit(bucket);
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        let mut retry_after: Option<Duration> = None;
        for identity in identities {
            let window = windows.entry((identity.clone(), bucket)).or_insert(Window { started: now, hits: 0 });
            if now.duration_since(window.started) >= self.window {
                *window = Window { started: now, hits: 0 };
            }
            if window.hits >= limit {
                let remaining = self.window.saturating_sub(now.duration_since(window.started));
                retry_after = Some(retry_after.map_or(remaining, |longest| longest.max(remaining)));
            }
        }

        if let Some(retry_after) = retry_after {
            return Decision::Limited { retry_after };
        }

        for identity in identities {
            if let Some(window) = windows.get_mut(&(identity.clone(), bucket)) {
                window.hits += 1;
            }
        }

        Decision::Allow
    }

    fn limit(&self, bucket: Bucket) -> u32 {
        match bucket {
            Bucket::Read => self.config.read_limit,
            Bucket::Mutation => self.config.mutation_limit,
            Bucket::Auth => self.config.auth_limit,
        }
    }
}

/// Limits by HTTP method: reads and mutations have separate budgets.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RateLimit;

/// Tighter budget for credential endpoints.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AuthRateLimit;

/// Seconds until the client may retry; read by the 429 catcher.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryAfter(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RateLimitError {
    TooManyRequests,
    MissingClientIp,
}

impl From<RateLimitError> for Status {
    fn from(error: RateLimitError) -> Self {
        match error {
            RateLimitError::TooManyRequests => Status::TooManyRequests,
            RateLimitError::MissingClientIp => Status::BadRequest,
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RateLimit {
    type Error = RateLimitError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        enforce(request, Bucket::for_method(request.method())).await.map(|_| RateLimit)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthRateLimit {
    type Error = RateLimitError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        enforce(request, Bucket::Auth).await.map(|_| AuthRateLimit)
    }
}

impl<'a> OpenApiFromRequest<'a> for RateLimit {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(RequestHeaderInput::None)
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        too_many_requests_response()
    }
}

impl<'a> OpenApiFromRequest<'a> for AuthRateLimit {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(RequestHeaderInput::None)
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        too_many_requests_response()
    }
}

async fn enforce(request: &Request<'_>, bucket: Bucket) -> Outcome<(), RateLimitError> {
    let Some(limiter) = request.rocket().state::<Arc<RateLimiter>>() else {
        return Outcome::Success(());
    };

    let request_id = request
        .local_cache(|| None::<crate::middleware::RequestId>)
        .as_ref()
        .map(|r| r.0.as_str())
        .unwrap_or("unknown");

    let identities = identities_for(request);
    let identities = if identities.is_empty() {
        warn!(request_id = %request_id, uri = %request.uri(), "client ip unavailable for rate limiting");
        if limiter.config.require_client_ip {
            let error = RateLimitError::MissingClientIp;
            return Outcome::Error((error.into(), error));
        }
        vec![Identity::Ip("missing-ip".to_string())]
    } else {
        identities
    };

    match limiter.check(&identities, bucket).await {
        Decision::Allow => Outcome::Success(()),
        Decision::Limited { retry_after } => {
            let retry_after_secs = retry_after.as_secs().max(1);
            request.local_cache(|| Some(RetryAfter(retry_after_secs)));
            warn!(
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri(),
                retry_after_secs,
                "rate limit exceeded"
            );
            let error = RateLimitError::TooManyRequests;
            Outcome::Error((error.into(), error))
        }
    }
}

fn identities_for(request: &Request<'_>) -> Vec<Identity> {
    let mut identities = Vec::with_capacity(2);
    if let Some(ip) = request.client_ip() {
        identities.push(Identity::Ip(ip.to_string()));
    }
    if let Some(subject) = token_subject(request) {
        identities.push(Identity::Subject(subject));
    }
    identities
}

/// User id from a verified bearer token, without touching the database.
fn token_subject(request: &Request<'_>) -> Option<String> {
    let config = request.rocket().state::<Config>()?;
    let token = request.headers().get_one("Authorization").and_then(parse_bearer_token)?;
    decode_token(token, &config.auth).ok().map(|id| id.to_string())
}

fn too_many_requests_response() -> rocket_okapi::Result<Responses> {
    let mut responses = Responses::default();
    responses.responses.insert(
        "429".to_string(),
        RefOr::Object(OpenApiResponse {
            description: "Too Many Requests".to_string(),
            ..Default::default()
        }),
    );
    Ok(responses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::issue_token;
    use crate::routes::error::too_many_requests;
    use rocket::http::{ContentType, Header, Status};
    use rocket::local::asynchronous::Client;
    use rocket::{catchers, get, routes};
    use uuid::Uuid;

    fn limits(read: u32, mutation: u32, auth: u32, window_seconds: u64) -> RateLimitConfig {
        RateLimitConfig {
            read_limit: read,
            mutation_limit: mutation,
            auth_limit: auth,
            window_seconds,
            cleanup_interval_seconds: 60,
            require_client_ip: false,
        }
    }

    #[get("/limited")]
    async fn limited(_rate_limit: RateLimit) -> Status {
        Status::Ok
    }

    #[rocket::async_test]
    async fn blocks_after_limit() {
        let limiter = RateLimiter::new(limits(2, 1, 1, 60));
        let identities = vec![Identity::Ip("127.0.0.1".to_string())];

        assert_eq!(limiter.check(&identities, Bucket::Read).await, Decision::Allow);
        assert_eq!(limiter.check(&identities, Bucket::Read).await, Decision::Allow);
        assert!(matches!(limiter.check(&identities, Bucket::Read).await, Decision::Limited { .. }));
    }

    #[rocket::async_test]
    async fn resets_after_window() {
        let limiter = RateLimiter::new(limits(1, 1, 1, 1));
        let identities = vec![Identity::Ip("127.0.0.1".to_string())];

        assert_eq!(limiter.check(&identities, Bucket::Read).await, Decision::Allow);
        assert!(matches!(limiter.check(&identities, Bucket::Read).await, Decision::Limited { .. }));

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(limiter.check(&identities, Bucket::Read).await, Decision::Allow);
    }

    #[rocket::async_test]
    async fn buckets_are_independent() {
        let limiter = RateLimiter::new(limits(10, 1, 1, 60));
        let identities = vec![Identity::Ip("127.0.0.1".to_string())];

        assert_eq!(limiter.check(&identities, Bucket::Auth).await, Decision::Allow);
        assert!(matches!(limiter.check(&identities, Bucket::Auth).await, Decision::Limited { .. }));
        assert_eq!(limiter.check(&identities, Bucket::Mutation).await, Decision::Allow);
        assert_eq!(limiter.check(&identities, Bucket::Read).await, Decision::Allow);
    }

    #[rocket::async_test]
    async fn limited_requests_are_not_counted() {
        let limiter = RateLimiter::new(limits(1, 1, 1, 60));
        let ip = Identity::Ip("10.0.0.1".to_string());
        let subject = Identity::Subject("user-1".to_string());
        let identities = vec![ip.clone(), subject.clone()];

        assert_eq!(limiter.check(&identities, Bucket::Read).await, Decision::Allow);
        assert!(matches!(limiter.check(&identities, Bucket::Read).await, Decision::Limited { .. }));

        assert_eq!(limiter.hits_for(ip, Bucket::Read).await, 1);
        assert_eq!(limiter.hits_for(subject, Bucket::Read).await, 1);
    }

    #[test]
    fn bucket_for_method() {
        assert_eq!(Bucket::for_method(Method::Get), Bucket::Read);
        assert_eq!(Bucket::for_method(Method::Head), Bucket::Read);
        assert_eq!(Bucket::for_method(Method::Options), Bucket::Read);
        assert_eq!(Bucket::for_method(Method::Post), Bucket::Mutation);
        assert_eq!(Bucket::for_method(Method::Delete), Bucket::Mutation);
    }

    #[rocket::async_test]
    async fn retry_after_header_is_set() {
        let limiter = Arc::new(RateLimiter::new(limits(0, 0, 0, 60)));

        let rocket = rocket::build()
            .manage(limiter)
            .mount("/", routes![limited])
            .register("/", catchers![too_many_requests]);

        let client = Client::tracked(rocket).await.expect("valid rocket instance");
        let response = client.get("/limited").dispatch().await;

        assert_eq!(response.status(), Status::TooManyRequests);
        assert_eq!(response.headers().get_one("Retry-After"), Some("60"));
        assert_eq!(response.content_type(), Some(ContentType::JSON));
    }

    #[rocket::async_test]
    async fn bearer_subject_has_its_own_budget() {
        let config = Config::default();
        let token = issue_token(&Uuid::new_v4(), &config.auth).expect("signable");
        let limiter = Arc::new(RateLimiter::new(limits(1, 1, 1, 60)));

        let rocket = rocket::build()
            .manage(config)
            .manage(limiter.clone())
            .mount("/", routes![limited])
            .register("/", catchers![too_many_requests]);
        let client = Client::tracked(rocket).await.expect("valid rocket instance");

        let response = client.get("/limited").header(Header::new("Authorization", format!("Bearer {token}"))).dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let windows = limiter.windows.lock().await;
        assert!(windows.keys().any(|(identity, _)| matches!(identity, Identity::Subject(_))));
    }

    impl RateLimiter {
        async fn hits_for(&self, identity: Identity, bucket: Bucket) -> u32 {
            self.windows.lock().await.get(&(identity, bucket)).map(|window| window.hits).unwrap_or(0)
        }
    }
}
