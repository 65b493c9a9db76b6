use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::Url;
use subtle::ConstantTimeEq;

use crate::config::SessionConfig;

/// Authorization URL plus the anti-forgery state it embeds.
///
/// One value per sign-in attempt; the state is compared against the
/// redirect and then dropped.
///
/// # Example
/// ```no_run
/// use twitch_session::auth::AuthorizationRequest;
/// use twitch_session::config::SessionConfig;
///
/// let request = AuthorizationRequest::new(&SessionConfig::new("client"));
/// println!("open {}", request.url);
/// ```
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: Url,
    pub state: String,
}

impl AuthorizationRequest {
    pub fn new(config: &SessionConfig) -> Self {
        let state = generate_state(config.state_length());
        let scope = config.scopes().join(" ");

        let mut url = config.authorization_url().clone();
        url.query_pairs_mut()
            .append_pair("client_id", config.client_id())
            .append_pair("redirect_uri", config.redirect_uri().as_str())
            .append_pair("response_type", "token")
            .append_pair("scope", &scope)
            .append_pair(
                "force_verify",
                if config.force_verify() { "true" } else { "false" },
            )
            .append_pair("state", &state);

        Self { url, state }
    }

    /// Constant-time comparison against the state echoed by the provider.
    pub fn state_matches(&self, returned: Option<&str>) -> bool {
        let Some(returned) = returned else {
            return false;
        };
        self.state.as_bytes().ct_eq(returned.as_bytes()).into()
    }
}

/// Random alphanumeric anti-forgery token of `len` characters.
pub fn generate_state(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
