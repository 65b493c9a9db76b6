use std::fmt;

use chrono::{DateTime, Utc};
use strum::{AsRefStr, Display};

use super::token::Token;
use super::user::User;

/// Lifecycle of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    SignedOut,
    SigningIn,
    SignedIn,
    SigningOut,
}

impl SessionPhase {
    /// Whether a sign-in or sign-out is in flight.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::SigningIn | Self::SigningOut)
    }
}

/// Snapshot of the in-memory session.
///
/// Only the session manager mutates it; consumers get clones or a watch
/// receiver.
#[derive(Clone, Default)]
pub struct SessionState {
    pub(crate) phase: SessionPhase,
    pub(crate) user: Option<User>,
    pub(crate) token: Option<Token>,
    pub(crate) signed_in_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Signed-in user, `None` before sign-in and after sign-out.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn signed_in_at(&self) -> Option<DateTime<Utc>> {
        self.signed_in_at
    }

    pub fn is_logging_in(&self) -> bool {
        self.phase == SessionPhase::SigningIn
    }

    pub fn is_logging_out(&self) -> bool {
        self.phase == SessionPhase::SigningOut
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }

    pub(crate) fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Phase to fall back to when a flow ends without committing.
    pub(crate) fn settled_phase(&self) -> SessionPhase {
        if self.is_signed_in() {
            SessionPhase::SignedIn
        } else {
            SessionPhase::SignedOut
        }
    }

    pub(crate) fn clear(&mut self) {
        self.user = None;
        self.token = None;
        self.signed_in_at = None;
        self.phase = SessionPhase::SignedOut;
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("phase", &self.phase)
            .field("user", &self.user)
            .field("token", &self.token.as_ref().map(|_| ".."))
            .field("signed_in_at", &self.signed_in_at)
            .finish()
    }
}
