use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bearer token obtained from an implicit-grant redirect.
///
/// `Debug` never prints the secret.
///
/// # Example
/// ```no_run
/// use twitch_session::auth::Token;
///
/// let token = Token::new("access")
///     .with_token_type(Some("bearer".to_string()))
///     .with_scope(Some("openid user:read:email"));
/// assert_eq!(token.scopes, vec!["openid", "user:read:email"]);
/// ```
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    pub token_type: Option<String>,
    pub scopes: Vec<String>,
    pub obtained_at: DateTime<Utc>,
}

impl Token {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: None,
            scopes: Vec::new(),
            obtained_at: Utc::now(),
        }
    }

    pub fn with_token_type(mut self, token_type: Option<String>) -> Self {
        self.token_type = token_type;
        self
    }

    /// Set scopes from the space-separated `scope` redirect parameter.
    pub fn with_scope(mut self, scope: Option<&str>) -> Self {
        self.scopes = scope
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        self
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("scopes", &self.scopes)
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_access_token() {
        let token = Token::new("super-secret");
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn scope_param_is_split_on_whitespace() {
        let token = Token::new("t").with_scope(Some("openid  user:read:follows"));
        assert_eq!(token.scopes, vec!["openid", "user:read:follows"]);

        let token = Token::new("t").with_scope(None);
        assert!(token.scopes.is_empty());
    }
}
