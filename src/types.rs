use serde::{Deserialize, Serialize};

/// Body posted to the token endpoint.
#[derive(Serialize)]
pub struct TokenRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Token payload returned by the endpoint on success.
#[derive(Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}
