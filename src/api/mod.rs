//! Shared request client for the Twitch API with mutable default headers.

use std::sync::RwLock;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::auth::AuthError;

/// Header carrying the application's client id on every Helix request.
pub const CLIENT_ID_HEADER: &str = "client-id";

/// HTTP client whose default headers are shared by every outbound request.
///
/// The session manager sets `Client-Id` once and swaps `Authorization` as
/// the session changes; other components issue requests through the same
/// instance and inherit them.
///
/// # Example
/// ```no_run
/// use twitch_session::api::ApiClient;
///
/// # async fn example() -> Result<(), twitch_session::auth::AuthError> {
/// let api = ApiClient::new("https://api.twitch.tv/helix".parse().unwrap());
/// api.set_bearer_token("token")?;
/// let body: serde_json::Value = api.get_json("/users").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    default_headers: RwLock<HeaderMap>,
}

impl ApiClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            default_headers: RwLock::new(HeaderMap::new()),
        }
    }

    /// Use a custom HTTP client (connection pool reuse, proxies).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn set_default_header(&self, name: &str, value: &str) -> Result<(), AuthError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| AuthError::Configuration(format!("invalid header name {name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| AuthError::Configuration(format!("invalid value for header {name}: {e}")))?;
        self.headers_mut().insert(name, value);
        Ok(())
    }

    pub fn insert_default_header(&self, name: HeaderName, value: HeaderValue) {
        self.headers_mut().insert(name, value);
    }

    pub fn remove_default_header(&self, name: &str) {
        self.headers_mut().remove(name);
    }

    pub fn default_header(&self, name: &str) -> Option<String> {
        self.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// Copy of the current default headers.
    pub fn default_headers(&self) -> HeaderMap {
        self.headers().clone()
    }

    /// Token from the `Authorization: Bearer` default header, if any.
    pub fn bearer_token(&self) -> Option<String> {
        self.default_header(AUTHORIZATION.as_str())
            .and_then(|v| v.strip_prefix("Bearer ").map(str::to_string))
    }

    pub fn set_bearer_token(&self, token: &str) -> Result<(), AuthError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| AuthError::InvalidResponse("access token is not a valid header value".to_string()))?;
        value.set_sensitive(true);
        self.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }

    pub fn clear_bearer_token(&self) {
        self.headers_mut().remove(AUTHORIZATION);
    }

    /// `GET {base_url}{path}` with the default headers, decoding JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AuthError> {
        let url = self.endpoint(path)?;
        let headers = self.default_headers();
        let resp = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .headers(headers)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body));
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
            .map_err(|e| AuthError::Configuration(format!("invalid API path {path}: {e}")))
    }

    // A poisoned lock only means a writer panicked mid-insert; the map is
    // still usable.
    fn headers(&self) -> std::sync::RwLockReadGuard<'_, HeaderMap> {
        self.default_headers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn headers_mut(&self) -> std::sync::RwLockWriteGuard<'_, HeaderMap> {
        self.default_headers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Map a non-success status to an error.
pub fn status_to_error(status: StatusCode, body: &str) -> AuthError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AuthError::Unauthorized(format!("status {status}: {body}"))
        }
        _ => AuthError::InvalidResponse(format!("status {status}: {body}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new(Url::parse("https://api.twitch.tv/helix").unwrap())
    }

    #[test]
    fn bearer_token_round_trips_through_header() {
        let api = client();
        assert!(api.bearer_token().is_none());
        api.set_bearer_token("T1").unwrap();
        assert_eq!(api.default_header("authorization").as_deref(), Some("Bearer T1"));
        assert_eq!(api.bearer_token().as_deref(), Some("T1"));
        api.clear_bearer_token();
        assert!(api.bearer_token().is_none());
    }

    #[test]
    fn default_headers_are_case_insensitive() {
        let api = client();
        api.set_default_header("Client-Id", "abc").unwrap();
        assert_eq!(api.default_header("client-id").as_deref(), Some("abc"));
        api.remove_default_header("CLIENT-ID");
        assert!(api.default_header("client-id").is_none());
    }

    #[test]
    fn invalid_header_values_are_rejected() {
        let api = client();
        assert!(matches!(
            api.set_default_header("Client-Id", "bad\nvalue"),
            Err(AuthError::Configuration(_))
        ));
        assert!(api.set_bearer_token("line\nbreak").is_err());
        assert!(api.bearer_token().is_none());
    }

    #[test]
    fn endpoint_joins_base_path_and_resource() {
        let api = client();
        assert_eq!(
            api.endpoint("/users").unwrap().as_str(),
            "https://api.twitch.tv/helix/users"
        );
        assert_eq!(
            api.endpoint("users").unwrap().as_str(),
            "https://api.twitch.tv/helix/users"
        );
    }

    #[test]
    fn status_to_error_maps_auth_failures() {
        assert!(matches!(
            status_to_error(StatusCode::UNAUTHORIZED, "nope"),
            AuthError::Unauthorized(_)
        ));
        assert!(matches!(
            status_to_error(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            AuthError::InvalidResponse(msg) if msg.contains("boom")
        ));
    }
}
