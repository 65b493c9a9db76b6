#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tokio::sync::Notify;
use twitch_session::auth::{
    AuthError, AuthorizationBroker, AuthorizationResponse, Notifier, RedirectParams,
    SessionManager,
};
use twitch_session::config::SessionConfig;
use wiremock::MockServer;

pub const CLIENT_ID: &str = "test-client";

type Script = Box<dyn Fn(&Url) -> AuthorizationResponse + Send + Sync>;

/// Broker that answers from a closure instead of a browser.
pub struct ScriptedBroker {
    script: Script,
    calls: Mutex<Vec<Url>>,
}

impl ScriptedBroker {
    pub fn new(script: impl Fn(&Url) -> AuthorizationResponse + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Echo the generated state back with `access_token`.
    pub fn granting(access_token: &'static str) -> Self {
        Self::new(move |url| {
            let query = format!("access_token={access_token}&token_type=bearer&scope=openid&state={}", state_of(url));
            AuthorizationResponse::from_params(RedirectParams::parse(&query))
        })
    }

    pub fn calls(&self) -> Vec<Url> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }
}

#[async_trait]
impl AuthorizationBroker for ScriptedBroker {
    async fn authorize(
        &self,
        auth_url: &Url,
        _redirect_uri: &Url,
    ) -> Result<AuthorizationResponse, AuthError> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(auth_url.clone());
        Ok((self.script)(auth_url))
    }
}

/// Broker that blocks until released, so tests can observe the in-flight state.
#[derive(Default)]
pub struct GatedBroker {
    pub entered: Notify,
    pub release: Notify,
}

#[async_trait]
impl AuthorizationBroker for GatedBroker {
    async fn authorize(
        &self,
        auth_url: &Url,
        _redirect_uri: &Url,
    ) -> Result<AuthorizationResponse, AuthError> {
        self.entered.notify_one();
        self.release.notified().await;
        let query = format!("access_token=T1&state={}", state_of(auth_url));
        Ok(AuthorizationResponse::from_params(RedirectParams::parse(&query)))
    }
}

/// Broker whose browser step never finishes.
pub struct NeverBroker;

#[async_trait]
impl AuthorizationBroker for NeverBroker {
    async fn authorize(
        &self,
        _auth_url: &Url,
        _redirect_uri: &Url,
    ) -> Result<AuthorizationResponse, AuthError> {
        std::future::pending().await
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn alerts(&self) -> Vec<(String, String)> {
        self.alerts.lock().expect("alerts lock poisoned").clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.alerts().into_iter().map(|(_, message)| message).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, title: &str, message: &str) {
        self.alerts
            .lock()
            .expect("alerts lock poisoned")
            .push((title.to_string(), message.to_string()));
    }
}

pub fn state_of(url: &Url) -> String {
    url.query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .expect("authorization URL carries state")
}

pub fn config_for(server: &MockServer) -> SessionConfig {
    SessionConfig::new(CLIENT_ID)
        .with_api_base_url(Url::parse(&format!("{}/helix", server.uri())).expect("api url"))
        .with_revocation_url(
            Url::parse(&format!("{}/oauth2/revoke", server.uri())).expect("revoke url"),
        )
        .with_authorization_timeout(Duration::from_secs(5))
}

pub fn session_with(
    config: SessionConfig,
    broker: Arc<dyn AuthorizationBroker>,
    notifier: Arc<RecordingNotifier>,
) -> SessionManager {
    SessionManager::new(config)
        .expect("session manager")
        .with_broker(broker)
        .with_notifier(notifier)
}

pub fn alice_json() -> serde_json::Value {
    serde_json::json!({
        "data": [
            {"id": 1, "display_name": "Alice", "email": "a@x.com", "profile_image_url": "u"},
            {"id": 2, "display_name": "Bob", "email": "b@x.com", "profile_image_url": "v"}
        ]
    })
}

/// Pick a loopback port that is free right now.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .expect("bind ephemeral port")
        .local_addr()
        .expect("local addr")
        .port()
}
