//! Twitch implicit-grant sign-in and the in-memory session it produces.

pub mod authorize;
pub mod broker;
pub mod error;
pub mod loopback;
pub mod notify;
pub mod session;
pub mod state;
pub mod token;
pub mod user;

pub use authorize::{generate_state, AuthorizationRequest};
pub use broker::{AuthorizationBroker, AuthorizationResponse, RedirectParams, ResponseKind};
pub use error::AuthError;
pub use loopback::{BrowserLauncher, LoopbackBroker};
pub use notify::{Notifier, TracingNotifier};
pub use session::{SessionManager, SignInOutcome};
pub use state::{SessionPhase, SessionState};
pub use token::Token;
pub use user::User;
