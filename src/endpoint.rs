use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode, Url, header};
use tracing::debug;

use crate::config::Config;
use crate::errors::Error;
use crate::types::TokenRequest;

const USER_AGENT: &str = concat!("oauth-token-cache/", env!("CARGO_PKG_VERSION"));

/// What the token endpoint answered, before any interpretation.
#[derive(Clone, Debug)]
pub struct EndpointResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

impl EndpointResponse {
    /// True when the media type is `application/json`, ignoring parameters and case.
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .and_then(|value| value.split(';').next())
            .map(|media_type| media_type.trim().eq_ignore_ascii_case("application/json"))
            .unwrap_or(false)
    }
}

/// Transport used to reach the token endpoint.
///
/// Any `Err` is treated as a network failure by the cache; HTTP level
/// failures must come back as an `Ok` response carrying the status.
pub trait TokenEndpoint: Send + Sync {
    fn request_token(
        &self,
        request: &TokenRequest<'_>,
    ) -> impl Future<Output = Result<EndpointResponse, Error>> + Send;
}

/// JSON-over-HTTP token endpoint backed by reqwest.
#[derive(Clone, Debug)]
pub struct HttpEndpoint {
    client: Client,
    url: Url,
}

impl HttpEndpoint {
    pub fn new(config: &Config) -> Result<Self, Error> {
        // Validate the endpoint before any network call is attempted
        let url = Url::parse(&config.token_url).map_err(|e| {
            Error::Config(format!("Invalid token URL '{}': {}", config.token_url, e))
        })?;
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
            url,
        })
    }
}

impl TokenEndpoint for HttpEndpoint {
    async fn request_token(&self, request: &TokenRequest<'_>) -> Result<EndpointResponse, Error> {
        let resp = self
            .client
            .post(self.url.clone())
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        // A rejected request is judged by its status alone.
        let body = match resp.text().await {
            Ok(body) => body,
            Err(err) if status.is_success() => return Err(err.into()),
            Err(_) => String::new(),
        };
        debug!(status = %status, body_len = body.len(), "token endpoint responded");

        Ok(EndpointResponse {
            status,
            content_type,
            body,
        })
    }
}
