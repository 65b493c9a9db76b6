use async_trait::async_trait;
use reqwest::Url;
use strum::{AsRefStr, Display};
use url::form_urlencoded;

use super::error::AuthError;

/// Provider error code for a user who declined the consent screen.
pub const ACCESS_DENIED: &str = "access_denied";

/// How the interactive authorization step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ResponseKind {
    /// The provider redirected back to the app.
    Success,
    /// The provider redirected back with an `error` parameter.
    Error,
    /// The user cancelled before a redirect happened.
    Cancel,
    /// The browser was closed before a redirect happened.
    Dismiss,
}

/// Parameters carried by the redirect (query or fragment).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectParams {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl RedirectParams {
    /// Parse `application/x-www-form-urlencoded` pairs, as found in the
    /// query or fragment of an implicit-grant redirect. Unknown keys are
    /// ignored and empty values count as absent.
    pub fn parse(encoded: &str) -> Self {
        let encoded = encoded.trim_start_matches(['?', '#']);
        let mut params = Self::default();
        for (key, value) in form_urlencoded::parse(encoded.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            let value = Some(value.into_owned());
            match key.as_ref() {
                "access_token" => params.access_token = value,
                "token_type" => params.token_type = value,
                "scope" => params.scope = value,
                "state" => params.state = value,
                "error" => params.error = value,
                "error_description" => params.error_description = value,
                _ => {}
            }
        }
        params
    }

    /// Parse the fragment of a redirect URL, falling back to its query.
    pub fn from_redirect_url(url: &Url) -> Self {
        match url.fragment() {
            Some(fragment) if !fragment.is_empty() => Self::parse(fragment),
            _ => Self::parse(url.query().unwrap_or_default()),
        }
    }

    /// Whether this redirect carries anything the session can act on.
    pub fn is_callback(&self) -> bool {
        self.access_token.is_some() || self.error.is_some() || self.state.is_some()
    }

    pub fn is_access_denied(&self) -> bool {
        self.error.as_deref() == Some(ACCESS_DENIED)
    }
}

/// Result of one interactive authorization round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationResponse {
    pub kind: ResponseKind,
    pub params: RedirectParams,
}

impl AuthorizationResponse {
    /// Classify redirect params: an `error` parameter makes it an error
    /// response, anything else a success.
    pub fn from_params(params: RedirectParams) -> Self {
        let kind = if params.error.is_some() {
            ResponseKind::Error
        } else {
            ResponseKind::Success
        };
        Self { kind, params }
    }

    pub fn cancelled() -> Self {
        Self {
            kind: ResponseKind::Cancel,
            params: RedirectParams::default(),
        }
    }

    pub fn dismissed() -> Self {
        Self {
            kind: ResponseKind::Dismiss,
            params: RedirectParams::default(),
        }
    }
}

/// Runs the interactive, user-facing part of the implicit grant.
///
/// Implementations open `auth_url` for the user and resolve once with the
/// parameters of the single redirect to `redirect_uri`. The session manager
/// bounds the call with a timeout and may drop the future to cancel it.
#[async_trait]
pub trait AuthorizationBroker: Send + Sync {
    async fn authorize(
        &self,
        auth_url: &Url,
        redirect_uri: &Url,
    ) -> Result<AuthorizationResponse, AuthError>;
}
