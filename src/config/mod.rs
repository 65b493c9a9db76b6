//! Session configuration (code > env).

use std::time::Duration;

use reqwest::Url;

use crate::auth::AuthError;

pub const DEFAULT_AUTHORIZATION_URL: &str = "https://id.twitch.tv/oauth2/authorize";
pub const DEFAULT_REVOCATION_URL: &str = "https://id.twitch.tv/oauth2/revoke";
pub const DEFAULT_API_BASE_URL: &str = "https://api.twitch.tv/helix";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8891/oauth/callback";
pub const DEFAULT_SCOPES: &[&str] = &["openid", "user:read:email", "user:read:follows"];
pub const DEFAULT_STATE_LENGTH: usize = 30;
pub const DEFAULT_AUTHORIZATION_TIMEOUT: Duration = Duration::from_secs(300);

const CLIENT_ID_ENV_VARS: &[&str] = &["CLIENT_ID", "TWITCH_CLIENT_ID"];
const REDIRECT_URI_ENV_VAR: &str = "TWITCH_REDIRECT_URI";

/// Twitch application settings for the implicit-grant flow.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use twitch_session::config::SessionConfig;
///
/// let config = SessionConfig::new("my-client-id")
///     .with_authorization_timeout(Duration::from_secs(60));
/// assert_eq!(config.client_id(), "my-client-id");
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    client_id: String,
    authorization_url: Url,
    revocation_url: Url,
    api_base_url: Url,
    redirect_uri: Url,
    scopes: Vec<String>,
    force_verify: bool,
    state_length: usize,
    authorization_timeout: Duration,
}

impl SessionConfig {
    /// Twitch defaults for everything except the client id.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            authorization_url: Url::parse(DEFAULT_AUTHORIZATION_URL)
                .expect("valid default authorization URL"),
            revocation_url: Url::parse(DEFAULT_REVOCATION_URL)
                .expect("valid default revocation URL"),
            api_base_url: Url::parse(DEFAULT_API_BASE_URL).expect("valid default API URL"),
            redirect_uri: Url::parse(DEFAULT_REDIRECT_URI).expect("valid default redirect URI"),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            force_verify: true,
            state_length: DEFAULT_STATE_LENGTH,
            authorization_timeout: DEFAULT_AUTHORIZATION_TIMEOUT,
        }
    }

    /// Load from environment variables (`CLIENT_ID`, `TWITCH_CLIENT_ID`,
    /// `TWITCH_REDIRECT_URI`), reading `.env` first if present.
    pub fn from_env() -> Result<Self, AuthError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Used by [`SessionConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AuthError> {
        let client_id = CLIENT_ID_ENV_VARS
            .iter()
            .filter_map(|key| lookup(key))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .ok_or_else(|| {
                AuthError::Configuration(format!(
                    "missing client id (set one of {})",
                    CLIENT_ID_ENV_VARS.join(", ")
                ))
            })?;

        let mut config = Self::new(client_id);
        if let Some(raw) = lookup(REDIRECT_URI_ENV_VAR) {
            config.redirect_uri = parse_url(REDIRECT_URI_ENV_VAR, &raw)?;
        }
        Ok(config)
    }

    pub fn with_authorization_url(mut self, url: Url) -> Self {
        self.authorization_url = url;
        self
    }

    pub fn with_revocation_url(mut self, url: Url) -> Self {
        self.revocation_url = url;
        self
    }

    pub fn with_api_base_url(mut self, url: Url) -> Self {
        self.api_base_url = url;
        self
    }

    pub fn with_redirect_uri(mut self, url: Url) -> Self {
        self.redirect_uri = url;
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_force_verify(mut self, force_verify: bool) -> Self {
        self.force_verify = force_verify;
        self
    }

    /// Length of the anti-forgery state token (minimum 8).
    pub fn with_state_length(mut self, length: usize) -> Self {
        self.state_length = length.max(8);
        self
    }

    /// Upper bound on the interactive browser step.
    pub fn with_authorization_timeout(mut self, timeout: Duration) -> Self {
        self.authorization_timeout = timeout;
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn authorization_url(&self) -> &Url {
        &self.authorization_url
    }

    pub fn revocation_url(&self) -> &Url {
        &self.revocation_url
    }

    pub fn api_base_url(&self) -> &Url {
        &self.api_base_url
    }

    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn force_verify(&self) -> bool {
        self.force_verify
    }

    pub fn state_length(&self) -> usize {
        self.state_length
    }

    pub fn authorization_timeout(&self) -> Duration {
        self.authorization_timeout
    }
}

fn parse_url(name: &str, raw: &str) -> Result<Url, AuthError> {
    Url::parse(raw.trim())
        .map_err(|e| AuthError::Configuration(format!("{name} is not a valid URL: {e}")))
}
