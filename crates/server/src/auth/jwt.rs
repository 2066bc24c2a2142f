use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Claims carried by access tokens from the college identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Staff or student identifier.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

/// HS256 verification settings shared by the auth middleware.
#[derive(Clone)]
pub struct AuthConfig {
    secret: Arc<str>,
    audience: Option<Arc<str>>,
}

impl AuthConfig {
    pub fn new(secret: impl Into<Arc<str>>) -> Self {
        Self {
            secret: secret.into(),
            audience: None,
        }
    }

    pub fn with_audience(mut self, audience: impl Into<Arc<str>>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Read `JWT_SECRET` and optional `JWT_AUDIENCE` from the environment.
    pub fn from_env() -> Result<Self, std::env::VarError> {
        let _ = dotenvy::dotenv();
        let mut config = Self::new(std::env::var("JWT_SECRET")?);
        if let Ok(aud) = std::env::var("JWT_AUDIENCE") {
            if !aud.is_empty() {
                config = config.with_audience(aud);
            }
        }
        Ok(config)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        match &self.audience {
            Some(aud) => {
                validation.set_audience(&[aud.as_ref()]);
                validation.set_required_spec_claims(&["exp", "aud"]);
            }
            None => validation.validate_aud = false,
        }
        validation
    }
}

/// Decode and verify an access token.
pub fn validate_access_token(
    config: &AuthConfig,
    token: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &config.validation(),
    )?;
    Ok(data.claims)
}

/// Sign a token for `sub` with `role`, valid for `ttl`. The identity
/// provider normally does this; the server uses it for tooling and tests.
pub fn issue_token(
    config: &AuthConfig,
    sub: &str,
    role: &str,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: sub.to_string(),
        email: None,
        role: role.to_string(),
        exp: (now + ttl).timestamp(),
        iat: Some(now.timestamp()),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}
