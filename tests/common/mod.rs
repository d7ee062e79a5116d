#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use jiff::{SignedDuration, Timestamp};
use reqwest::StatusCode;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use oauth_token_cache::{
    Authorization, Config, Credentials, EndpointResponse, Error, HttpEndpoint, ManualClock,
    RefreshPolicy, TokenEndpoint, types::TokenRequest,
};

pub const TOKEN_PATH: &str = "/oauth/token";

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

pub fn t0() -> Timestamp {
    Timestamp::from_second(1_700_000_000).unwrap()
}

pub fn secs(n: i64) -> SignedDuration {
    SignedDuration::from_secs(n)
}

pub fn token_body(token: &str, expires_in: u64) -> serde_json::Value {
    serde_json::json!({
        "access_token": token,
        "token_type": "Bearer",
        "expires_in": expires_in,
    })
}

pub fn token_response(token: &str, expires_in: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(token_body(token, expires_in))
}

pub async fn mount_token(server: &MockServer, token: &str, expires_in: u64, times: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response(token, expires_in))
        .up_to_n_times(times)
        .mount(server)
        .await;
}

pub fn config(server: &MockServer) -> Config {
    Config::new("user", "secret").with_token_url(format!("{}{}", server.uri(), TOKEN_PATH))
}

pub fn authorization(server: &MockServer, clock: &ManualClock) -> Authorization {
    Authorization::with_clock(
        Credentials::new("user", "secret"),
        HttpEndpoint::new(&config(server)).expect("endpoint"),
        RefreshPolicy::default(),
        Arc::new(clock.clone()),
    )
    .expect("authorization")
}

pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|reqs| reqs.len())
        .unwrap_or(0)
}

pub async fn wait_for_requests(server: &MockServer, expected: usize) {
    for _ in 0..500 {
        if request_count(server).await >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("endpoint never saw {} requests", expected);
}

pub async fn wait_for_background<E: TokenEndpoint + 'static>(auth: &Authorization<E>) {
    for _ in 0..500 {
        if !auth.background_refresh_pending() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("background refresh never settled");
}

pub async fn wait_for_token<E: TokenEndpoint + 'static>(auth: &Authorization<E>, expected: &str) {
    for _ in 0..500 {
        if auth.snapshot().access_token() == Some(expected) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("token {} was never installed", expected);
}

/// Endpoint that never reaches the network.
pub struct UnreachableEndpoint;

impl TokenEndpoint for UnreachableEndpoint {
    async fn request_token(&self, _request: &TokenRequest<'_>) -> Result<EndpointResponse, Error> {
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        )))
    }
}

/// Endpoint whose call takes `elapsed` of clock time before answering.
pub struct SlowClockEndpoint {
    pub clock: ManualClock,
    pub elapsed: SignedDuration,
    pub expires_in: u64,
}

impl TokenEndpoint for SlowClockEndpoint {
    async fn request_token(&self, _request: &TokenRequest<'_>) -> Result<EndpointResponse, Error> {
        self.clock.advance(self.elapsed);
        Ok(EndpointResponse {
            status: StatusCode::OK,
            content_type: Some("application/json".to_string()),
            body: token_body("late", self.expires_in).to_string(),
        })
    }
}

/// Endpoint that issues `abc`, panics on the second call, then issues `def`.
#[derive(Default)]
pub struct PanicOnSecondCallEndpoint {
    calls: AtomicUsize,
}

impl TokenEndpoint for PanicOnSecondCallEndpoint {
    async fn request_token(&self, _request: &TokenRequest<'_>) -> Result<EndpointResponse, Error> {
        let token = match self.calls.fetch_add(1, Ordering::SeqCst) {
            0 => "abc",
            1 => panic!("endpoint blew up"),
            _ => "def",
        };
        Ok(EndpointResponse {
            status: StatusCode::OK,
            content_type: Some("application/json".to_string()),
            body: token_body(token, 600).to_string(),
        })
    }
}
