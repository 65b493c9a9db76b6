use std::sync::Arc;

use chrono::Utc;
use reqwest::header::{HeaderName, HeaderValue};
use tokio::sync::watch;

use super::authorize::AuthorizationRequest;
use super::broker::{AuthorizationBroker, ResponseKind};
use super::error::AuthError;
use super::loopback::LoopbackBroker;
use super::notify::{Notifier, TracingNotifier};
use super::state::{SessionPhase, SessionState};
use super::token::Token;
use super::user::{User, UsersResponse};
use crate::api::{status_to_error, ApiClient, CLIENT_ID_HEADER};
use crate::config::SessionConfig;

/// Title of every alert raised by [`SessionManager::sign_in`].
pub const SIGN_IN_FAILED_TITLE: &str = "Sign-in failed";
/// Alert body for a denial that carries no `error_description`.
pub const DENIED_FALLBACK_MESSAGE: &str = "Access to your account was denied.";
/// Alert body when the browser flow is closed before the redirect.
pub const CANCELLED_MESSAGE: &str = "Sign-in was cancelled before it completed.";
/// Alert body when the redirect's state differs from the one sent.
pub const STATE_MISMATCH_MESSAGE: &str =
    "The returned token does not match the one that was sent.";

/// How a sign-in attempt ended when it did not fail outright.
///
/// Everything except [`SignInOutcome::SignedIn`] has already been reported
/// to the user through the [`Notifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    SignedIn(User),
    /// The user declined on the consent screen.
    Denied { message: String },
    /// The browser flow was closed before a redirect.
    Cancelled,
    /// The redirect echoed a different anti-forgery state.
    StateMismatch,
}

/// Owns the in-memory Twitch session and the flows that change it.
///
/// Inject one instance (usually behind an `Arc`) into whatever needs the
/// session. At most one sign-in or sign-out runs at a time; overlapping
/// calls get [`AuthError::Busy`].
///
/// # Example
/// ```no_run
/// use twitch_session::auth::SessionManager;
/// use twitch_session::config::SessionConfig;
///
/// # async fn example() -> Result<(), twitch_session::auth::AuthError> {
/// let session = SessionManager::new(SessionConfig::from_env()?)?;
/// session.sign_in().await?;
/// if let Some(user) = session.user() {
///     println!("hello {}", user.display_name);
/// }
/// session.sign_out().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionManager {
    config: SessionConfig,
    api: Arc<ApiClient>,
    broker: Arc<dyn AuthorizationBroker>,
    notifier: Arc<dyn Notifier>,
    client_id_header: HeaderValue,
    state: watch::Sender<SessionState>,
}

impl SessionManager {
    /// Build a manager with the loopback browser broker, a log-only
    /// notifier and a fresh API client. Sets the `Client-Id` default header.
    pub fn new(config: SessionConfig) -> Result<Self, AuthError> {
        let client_id_header = HeaderValue::from_str(config.client_id())
            .map_err(|_| AuthError::Configuration("client id is not a valid header value".to_string()))?;
        let api = Arc::new(ApiClient::new(config.api_base_url().clone()));
        let manager = Self {
            config,
            api,
            broker: Arc::new(LoopbackBroker::new()),
            notifier: Arc::new(TracingNotifier),
            client_id_header,
            state: watch::Sender::new(SessionState::default()),
        };
        manager.apply_client_id();
        Ok(manager)
    }

    /// Share an existing request client; it receives the `Client-Id` header.
    pub fn with_api_client(mut self, api: Arc<ApiClient>) -> Self {
        self.api = api;
        self.apply_client_id();
        self
    }

    pub fn with_broker(mut self, broker: Arc<dyn AuthorizationBroker>) -> Self {
        self.broker = broker;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The shared request client carrying the session's default headers.
    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    /// Snapshot of the current session.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every session change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.borrow().phase()
    }

    pub fn is_logging_in(&self) -> bool {
        self.state.borrow().is_logging_in()
    }

    pub fn is_logging_out(&self) -> bool {
        self.state.borrow().is_logging_out()
    }

    /// Run the implicit-grant sign-in.
    ///
    /// Denial, cancellation and state mismatch raise an alert and resolve
    /// with the matching [`SignInOutcome`]. Network, provider and parse
    /// failures (and the authorization timeout) are logged and returned as
    /// [`AuthError::SignInFailed`]. `is_logging_in` is cleared on every exit
    /// path, including the future being dropped.
    pub async fn sign_in(&self) -> Result<SignInOutcome, AuthError> {
        let _flow = self.begin(SessionPhase::SigningIn)?;
        self.run_sign_in().await.map_err(|e| {
            tracing::error!(error = %e, "sign-in failed");
            AuthError::SignInFailed(e.to_string())
        })
    }

    /// Revoke the current token and clear the session.
    ///
    /// Local state (user, token, bearer header) is cleared whether or not
    /// revocation succeeds; a failed revocation is then returned as
    /// [`AuthError::SignOutFailed`].
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let _flow = self.begin(SessionPhase::SigningOut)?;
        let token = self
            .state
            .borrow()
            .token()
            .map(|t| t.access_token.clone());

        let revoked = match token {
            Some(token) => self.revoke(&token).await,
            None => {
                tracing::debug!("no token held, skipping revocation");
                Ok(())
            }
        };
        self.clear_session();

        revoked.map_err(|e| {
            tracing::error!(error = %e, "token revocation failed");
            AuthError::SignOutFailed(e.to_string())
        })
    }

    async fn run_sign_in(&self) -> Result<SignInOutcome, AuthError> {
        let request = AuthorizationRequest::new(&self.config);
        tracing::info!(
            authorization_url = %self.config.authorization_url(),
            "waiting for authorization"
        );

        let wait = self.config.authorization_timeout();
        let response = tokio::time::timeout(
            wait,
            self.broker.authorize(&request.url, self.config.redirect_uri()),
        )
        .await
        .map_err(|_| AuthError::Timeout(wait.as_millis() as u64))??;
        let params = response.params;

        if params.is_access_denied() {
            let message = params
                .error_description
                .unwrap_or_else(|| DENIED_FALLBACK_MESSAGE.to_string());
            tracing::info!("authorization denied by user");
            self.notifier.alert(SIGN_IN_FAILED_TITLE, &message);
            return Ok(SignInOutcome::Denied { message });
        }

        if matches!(response.kind, ResponseKind::Cancel | ResponseKind::Dismiss) {
            tracing::info!(kind = %response.kind, "authorization abandoned");
            self.notifier.alert(SIGN_IN_FAILED_TITLE, CANCELLED_MESSAGE);
            return Ok(SignInOutcome::Cancelled);
        }

        if !request.state_matches(params.state.as_deref()) {
            tracing::warn!("authorization state mismatch, discarding redirect");
            self.notifier.alert(SIGN_IN_FAILED_TITLE, STATE_MISMATCH_MESSAGE);
            return Ok(SignInOutcome::StateMismatch);
        }

        if let Some(error) = params.error {
            let description = params.error_description.unwrap_or_default();
            return Err(AuthError::InvalidResponse(format!(
                "provider returned {error}: {description}"
            )));
        }

        let access_token = params.access_token.ok_or_else(|| {
            AuthError::InvalidResponse("redirect is missing access_token".to_string())
        })?;
        let token = Token::new(access_token)
            .with_token_type(params.token_type)
            .with_scope(params.scope.as_deref());

        // Rolled back by the flow guard if the profile call fails.
        self.api.set_bearer_token(&token.access_token)?;
        let users: UsersResponse = self.api.get_json("/users").await?;
        let user = users.data.into_iter().next().ok_or_else(|| {
            AuthError::InvalidResponse("profile response contained no users".to_string())
        })?;

        let committed = user.clone();
        self.state.send_modify(|s| {
            s.user = Some(committed);
            s.token = Some(token);
            s.signed_in_at = Some(Utc::now());
            s.phase = SessionPhase::SignedIn;
        });
        tracing::info!(user_id = user.id, display_name = %user.display_name, "signed in");
        Ok(SignInOutcome::SignedIn(user))
    }

    async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        let resp = self
            .api
            .http()
            .post(self.config.revocation_url().clone())
            .form(&[("client_id", self.config.client_id()), ("token", token)])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body));
        }
        tracing::debug!("token revoked");
        Ok(())
    }

    /// Atomically move from a settled phase into `phase`.
    fn begin(&self, phase: SessionPhase) -> Result<FlowGuard<'_>, AuthError> {
        let mut entered = false;
        self.state.send_if_modified(|s| {
            if s.phase.is_busy() {
                return false;
            }
            s.phase = phase;
            entered = true;
            true
        });
        if !entered {
            tracing::debug!(requested = %phase, "rejecting overlapping session flow");
            return Err(AuthError::Busy);
        }
        Ok(FlowGuard {
            manager: self,
            phase,
        })
    }

    fn apply_client_id(&self) {
        self.api.insert_default_header(
            HeaderName::from_static(CLIENT_ID_HEADER),
            self.client_id_header.clone(),
        );
    }

    fn clear_session(&self) {
        self.api.clear_bearer_token();
        self.state.send_modify(SessionState::clear);
    }

    /// Point the bearer header back at the committed token (or remove it).
    fn restore_bearer_header(&self, state: &SessionState) {
        match state.token() {
            Some(token) => {
                if self.api.set_bearer_token(&token.access_token).is_err() {
                    self.api.clear_bearer_token();
                }
            }
            None => self.api.clear_bearer_token(),
        }
    }
}

/// Settles the phase when a flow ends without committing, including when
/// the flow's future is dropped mid-await.
struct FlowGuard<'a> {
    manager: &'a SessionManager,
    phase: SessionPhase,
}

impl Drop for FlowGuard<'_> {
    fn drop(&mut self) {
        let manager = self.manager;
        match self.phase {
            SessionPhase::SigningIn => {
                manager.state.send_if_modified(|s| {
                    if s.phase != SessionPhase::SigningIn {
                        return false;
                    }
                    manager.restore_bearer_header(s);
                    s.phase = s.settled_phase();
                    true
                });
            }
            SessionPhase::SigningOut => {
                if manager.phase() == SessionPhase::SigningOut {
                    manager.clear_session();
                }
            }
            SessionPhase::SignedIn | SessionPhase::SignedOut => {}
        }
    }
}
