//! twitch-session: Twitch OAuth2 implicit-grant sign-in
//!
//! Opens the Twitch consent page in the browser, receives the single
//! redirect on a loopback listener, checks the anti-forgery state, attaches
//! the bearer token to a shared request client and keeps the signed-in
//! user profile in memory until sign-out.
//!
//! # Quick Start
//!
//! ```no_run
//! use twitch_session::prelude::*;
//!
//! # async fn example() -> Result<(), AuthError> {
//! let session = SessionManager::new(SessionConfig::from_env()?)?;
//! match session.sign_in().await? {
//!     SignInOutcome::SignedIn(user) => println!("signed in as {}", user.display_name),
//!     other => println!("not signed in: {other:?}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod prelude;

#[cfg(feature = "cli")]
pub mod cli;
