//! CLI handlers for the authorization URL and the login round-trip.

use std::sync::Arc;
use std::time::Duration;

use super::LoginArgs;
use crate::auth::{
    AuthError, AuthorizationRequest, LoopbackBroker, Notifier, SessionManager, SignInOutcome,
};
use crate::config::SessionConfig;

/// Prints alerts for the person at the terminal.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn alert(&self, title: &str, message: &str) {
        eprintln!("❌ {title}: {message}");
    }
}

/// Handle `twitch-session authorize-url`.
pub fn handle_authorize_url() -> Result<(), AuthError> {
    let config = SessionConfig::from_env()?;
    let request = AuthorizationRequest::new(&config);
    println!("🔗 {}", request.url);
    println!("🔑 state: {}", request.state);
    Ok(())
}

/// Handle `twitch-session login`.
pub async fn handle_login(args: &LoginArgs) -> Result<(), AuthError> {
    let mut config = SessionConfig::from_env()?;
    if let Some(secs) = args.timeout_secs {
        config = config.with_authorization_timeout(Duration::from_secs(secs));
    }

    let no_browser = args.no_browser;
    let broker = LoopbackBroker::new().with_launcher(move |url| {
        println!("🔗 Visit: {url}");
        if !no_browser {
            if let Err(e) = open::that(url.as_str()) {
                tracing::warn!(error = %e, "could not open browser");
            }
        }
        println!("⏳ Waiting for authorization...");
        Ok(())
    });

    let session = SessionManager::new(config)?
        .with_broker(Arc::new(broker))
        .with_notifier(Arc::new(ConsoleNotifier));

    match session.sign_in().await? {
        SignInOutcome::SignedIn(user) => {
            println!("✅ Signed in as {} (id {})", user.display_name, user.id);
            if !user.email.is_empty() {
                println!("   Email: {}", user.email);
            }
            if !user.profile_image_url.is_empty() {
                println!("   Avatar: {}", user.profile_image_url);
            }
        }
        // The notifier already told the user why.
        SignInOutcome::Denied { .. } | SignInOutcome::Cancelled | SignInOutcome::StateMismatch => {
            return Ok(());
        }
    }

    if args.sign_out {
        session.sign_out().await?;
        println!("✅ Token revoked and session cleared");
    }
    Ok(())
}
