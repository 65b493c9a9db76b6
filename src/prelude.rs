//! Convenience re-exports for common use.

pub use crate::api::ApiClient;
pub use crate::auth::{
    AuthError, AuthorizationBroker, LoopbackBroker, Notifier, SessionManager, SessionPhase,
    SessionState, SignInOutcome, User,
};
pub use crate::config::SessionConfig;
