//! Loopback redirect broker: opens the system browser and serves the
//! redirect URI on localhost until the provider calls back once.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;

use super::broker::{AuthorizationBroker, AuthorizationResponse, RedirectParams};
use super::error::AuthError;

const MAX_REQUEST_BYTES: usize = 8 * 1024;
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens the authorization URL for the user.
pub type BrowserLauncher = Arc<dyn Fn(&Url) -> Result<(), AuthError> + Send + Sync>;

/// [`AuthorizationBroker`] backed by the system browser and a one-shot
/// HTTP listener on the redirect URI.
///
/// Implicit-grant tokens arrive in the URL fragment, which browsers never
/// send to the server. The first hit on the redirect path is answered with a
/// page that replays the fragment as a query string; the second hit carries
/// the parameters and resolves the broker.
///
/// # Example
/// ```no_run
/// use twitch_session::auth::LoopbackBroker;
///
/// let broker = LoopbackBroker::new().with_launcher(|url| {
///     println!("Open {url} to continue");
///     Ok(())
/// });
/// ```
pub struct LoopbackBroker {
    launcher: BrowserLauncher,
}

impl Default for LoopbackBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackBroker {
    pub fn new() -> Self {
        Self {
            launcher: Arc::new(open_in_browser),
        }
    }

    pub fn with_launcher<F>(mut self, launcher: F) -> Self
    where
        F: Fn(&Url) -> Result<(), AuthError> + Send + Sync + 'static,
    {
        self.launcher = Arc::new(launcher);
        self
    }
}

#[async_trait]
impl AuthorizationBroker for LoopbackBroker {
    async fn authorize(
        &self,
        auth_url: &Url,
        redirect_uri: &Url,
    ) -> Result<AuthorizationResponse, AuthError> {
        let addr = bind_address(redirect_uri)?;
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| AuthError::Io(format!("failed to bind callback listener on {addr}: {e}")))?;
        tracing::debug!(%addr, "authorization callback listener ready");

        (self.launcher)(auth_url)?;

        let callback_path: Arc<str> = Arc::from(redirect_uri.path());
        // Dropped with the broker future, which aborts pending connections.
        let mut connections = JoinSet::new();
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (socket, peer) = accepted?;
                    let callback_path = Arc::clone(&callback_path);
                    connections.spawn(async move {
                        (peer, serve_connection(socket, &callback_path).await)
                    });
                }
                Some(joined) = connections.join_next() => {
                    match joined {
                        Ok((peer, Ok(Some(params)))) => {
                            tracing::debug!(%peer, "authorization callback received");
                            return Ok(AuthorizationResponse::from_params(params));
                        }
                        Ok((_, Ok(None))) => {}
                        Ok((peer, Err(e))) => {
                            tracing::warn!(%peer, error = %e, "dropping callback connection");
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "callback connection task failed");
                        }
                    }
                }
            }
        }
    }
}

fn open_in_browser(url: &Url) -> Result<(), AuthError> {
    open::that(url.as_str()).map_err(|e| AuthError::Io(format!("failed to open browser: {e}")))
}

fn bind_address(redirect_uri: &Url) -> Result<String, AuthError> {
    let port = redirect_uri.port_or_known_default().ok_or_else(|| {
        AuthError::Configuration(format!("redirect URI {redirect_uri} has no port"))
    })?;
    let host = match redirect_uri.host_str() {
        Some("localhost") => "127.0.0.1",
        Some(host) => host,
        None => {
            return Err(AuthError::Configuration(format!(
                "redirect URI {redirect_uri} has no host"
            )))
        }
    };
    Ok(format!("{host}:{port}"))
}

/// Answer one HTTP request. Returns the redirect params once a request on
/// the callback path carries them.
async fn serve_connection(
    mut socket: TcpStream,
    callback_path: &str,
) -> Result<Option<RedirectParams>, AuthError> {
    let request = tokio::time::timeout(READ_TIMEOUT, read_request_head(&mut socket))
        .await
        .map_err(|_| AuthError::Timeout(READ_TIMEOUT.as_millis() as u64))??;

    let Some(target) = request_target(&request) else {
        write_response(&mut socket, "400 Bad Request", &error_page("Malformed request")).await?;
        return Ok(None);
    };
    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    if path != callback_path {
        write_response(&mut socket, "404 Not Found", &error_page("Not found")).await?;
        return Ok(None);
    }

    let params = RedirectParams::parse(query);
    if params.is_callback() {
        write_response(&mut socket, "200 OK", COMPLETE_PAGE).await?;
        return Ok(Some(params));
    }

    write_response(&mut socket, "200 OK", FRAGMENT_RELAY_PAGE).await?;
    Ok(None)
}

async fn read_request_head(socket: &mut TcpStream) -> Result<String, AuthError> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
        if buffer.windows(4).any(|w| w == b"\r\n\r\n") || buffer.len() >= MAX_REQUEST_BYTES {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn request_target(request: &str) -> Option<&str> {
    let mut parts = request.lines().next()?.split_whitespace();
    let method = parts.next()?;
    if method != "GET" {
        return None;
    }
    parts.next()
}

async fn write_response(socket: &mut TcpStream, status: &str, body: &str) -> Result<(), AuthError> {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nCache-Control: no-store\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await?;
    Ok(())
}

fn error_page(message: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>Sign-in</title></head>\
         <body><h1>{message}</h1></body></html>"
    )
}

const FRAGMENT_RELAY_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Signing in...</title></head>
<body>
<p>Completing sign-in, please wait.</p>
<script>
  var hash = window.location.hash.substring(1);
  if (hash) {
    window.location.replace(window.location.pathname + '?' + hash);
  } else {
    window.location.replace(window.location.pathname + '?error=missing_fragment');
  }
</script>
</body>
</html>"#;

const COMPLETE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Signed in</title></head>
<body>
<p>You can close this window and return to the app.</p>
<script>setTimeout(function () { window.close(); }, 2000);</script>
</body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_address_maps_localhost_to_loopback_ip() {
        let url = Url::parse("http://localhost:8891/oauth/callback").unwrap();
        assert_eq!(bind_address(&url).unwrap(), "127.0.0.1:8891");
    }

    #[test]
    fn bind_address_keeps_explicit_ip() {
        let url = Url::parse("http://127.0.0.1:4000/cb").unwrap();
        assert_eq!(bind_address(&url).unwrap(), "127.0.0.1:4000");
    }

    #[test]
    fn bind_address_uses_scheme_default_port() {
        let url = Url::parse("http://localhost/cb").unwrap();
        assert_eq!(bind_address(&url).unwrap(), "127.0.0.1:80");
    }

    #[test]
    fn request_target_reads_get_line() {
        let req = "GET /oauth/callback?state=S HTTP/1.1\r\nHost: localhost\r\n\r\n";
        assert_eq!(request_target(req), Some("/oauth/callback?state=S"));
        assert_eq!(request_target("POST / HTTP/1.1\r\n\r\n"), None);
        assert_eq!(request_target(""), None);
    }

    #[test]
    fn relay_page_replays_fragment_as_query() {
        assert!(FRAGMENT_RELAY_PAGE.contains("window.location.hash"));
        assert!(FRAGMENT_RELAY_PAGE.contains("'?' + hash"));
    }
}
