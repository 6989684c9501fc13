use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use note_archiver_core::config::ArchiverConfig;
use note_archiver_core::dispatch::LOG_TARGET;
use note_archiver_core::error::{AppError, NetworkFailureKind};
use note_archiver_core::traits::ArchiveClient;
use reqwest::Client;
use reqwest::redirect::Policy;

const MAX_REDIRECTS: usize = 10;
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Save-endpoint client using reqwest.
///
/// Sends a plain GET with the configured User-Agent and timeout. Certificate
/// verification is left at reqwest's default (enabled). Classified transport
/// failures are retried up to `max_attempts` times in total; anything that
/// cannot be classified is returned at once as [`AppError::HttpError`].
#[derive(Clone)]
pub struct ReqwestArchiveClient {
    client: Client,
    max_attempts: u32,
}

impl ReqwestArchiveClient {
    pub fn new(config: &ArchiverConfig) -> Result<Self, AppError> {
        config.validate()?;

        let client = Client::builder()
            .user_agent(config.user_agent())
            .timeout(config.request_timeout)
            .connect_timeout(config.request_timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            max_attempts: config.max_attempts,
        })
    }
}

impl ArchiveClient for ReqwestArchiveClient {
    async fn submit(&self, target: &str) -> Result<Option<u16>, AppError> {
        let mut attempt = 1;

        loop {
            let err = match self.client.get(target).send().await {
                Ok(response) => return Ok(Some(response.status().as_u16())),
                Err(e) => e,
            };

            let Some(kind) = classify_error(&err) else {
                return Err(AppError::HttpError(describe(&err)));
            };

            if attempt >= self.max_attempts {
                return Err(AppError::network(kind, describe(&err)));
            }

            tracing::debug!(
                target: LOG_TARGET,
                save_target = %target,
                %kind,
                attempt,
                max_attempts = self.max_attempts,
                "Retrying save request"
            );
            tokio::time::sleep(RETRY_BACKOFF * attempt).await;
            attempt += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Error classification
// ---------------------------------------------------------------------------

/// Map a reqwest error onto the closed set of recoverable network failures.
///
/// Returns `None` for builder, status and other errors that do not describe a
/// failed exchange with the remote host.
pub fn classify_error(err: &reqwest::Error) -> Option<NetworkFailureKind> {
    if err.is_timeout() {
        return Some(NetworkFailureKind::Timeout);
    }
    if err.is_redirect() {
        return Some(NetworkFailureKind::TooManyRedirects);
    }
    if err.is_decode() || err.is_body() {
        return Some(NetworkFailureKind::DecodeFailure);
    }
    if err.is_connect() {
        return Some(classify_connect(err.source()));
    }
    if err.is_request() {
        return Some(NetworkFailureKind::SocketFailure);
    }
    None
}

/// Walk the source chain of a connect error. The top-level reqwest error is
/// skipped on purpose: its message embeds the request URL.
fn classify_connect(mut source: Option<&(dyn StdError + 'static)>) -> NetworkFailureKind {
    while let Some(e) = source {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::ConnectionRefused => return NetworkFailureKind::ConnectionRefused,
                io::ErrorKind::TimedOut => return NetworkFailureKind::Timeout,
                _ => {}
            }
        }

        let message = e.to_string().to_ascii_lowercase();
        if message.contains("dns error") || message.contains("failed to lookup address") {
            return NetworkFailureKind::DnsFailure;
        }
        if message.contains("tls")
            || message.contains("ssl")
            || message.contains("certificate")
            || message.contains("handshake")
        {
            return NetworkFailureKind::TlsFailure;
        }

        source = e.source();
    }

    NetworkFailureKind::SocketFailure
}

/// Render an error with its full source chain.
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(e) = source {
        message.push_str(": ");
        message.push_str(&e.to_string());
        source = e.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const APP_DOMAIN: &str = "notes.example.com";

    fn config_for(server: &MockServer) -> ArchiverConfig {
        ArchiverConfig::new(APP_DOMAIN).with_save_endpoint(format!("{}/save/", server.uri()))
    }

    #[derive(Debug)]
    struct Wrapped {
        message: &'static str,
        inner: Option<io::Error>,
    }

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl StdError for Wrapped {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            self.inner.as_ref().map(|e| e as &(dyn StdError + 'static))
        }
    }

    fn chain(e: &Wrapped) -> Option<&(dyn StdError + 'static)> {
        Some(e)
    }

    #[test]
    fn test_connect_chain_classification() {
        let refused = Wrapped {
            message: "tcp connect error",
            inner: Some(io::Error::from(io::ErrorKind::ConnectionRefused)),
        };
        assert_eq!(
            classify_connect(chain(&refused)),
            NetworkFailureKind::ConnectionRefused
        );

        let dns = Wrapped {
            message: "dns error",
            inner: Some(io::Error::other("failed to lookup address information")),
        };
        assert_eq!(classify_connect(chain(&dns)), NetworkFailureKind::DnsFailure);

        let tls = Wrapped {
            message: "error:0A000086:SSL routines::certificate verify failed",
            inner: None,
        };
        assert_eq!(classify_connect(chain(&tls)), NetworkFailureKind::TlsFailure);

        let reset = Wrapped {
            message: "tcp connect error",
            inner: Some(io::Error::from(io::ErrorKind::AddrNotAvailable)),
        };
        assert_eq!(classify_connect(chain(&reset)), NetworkFailureKind::SocketFailure);
        assert_eq!(classify_connect(None), NetworkFailureKind::SocketFailure);
    }

    #[tokio::test]
    async fn test_sends_user_agent_and_verbatim_target() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/save/https://example.com/page"))
            .and(header("user-agent", "notes.example.com mod-note-archiver"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let config = config_for(&server);
        let client = ReqwestArchiveClient::new(&config).unwrap();
        let status = client
            .submit(&config.save_target("https://example.com/page"))
            .await
            .unwrap();

        assert_eq!(status, Some(200));
    }

    #[tokio::test]
    async fn test_error_status_is_returned_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(523))
            .expect(1)
            .mount(&server)
            .await;

        let config = config_for(&server);
        let client = ReqwestArchiveClient::new(&config).unwrap();
        let status = client
            .submit(&config.save_target("https://example.com/gone"))
            .await
            .unwrap();

        assert_eq!(status, Some(523));
    }

    #[tokio::test]
    async fn test_timeout_is_classified_after_retry_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .expect(3)
            .mount(&server)
            .await;

        let config = config_for(&server).with_request_timeout(Duration::from_millis(100));
        let client = ReqwestArchiveClient::new(&config).unwrap();
        let err = client
            .submit(&config.save_target("https://example.com/slow"))
            .await
            .unwrap_err();

        assert_eq!(err.network_kind(), Some(NetworkFailureKind::Timeout));
    }

    #[tokio::test]
    async fn test_connection_refused_is_classified() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let config = ArchiverConfig::new(APP_DOMAIN)
            .with_save_endpoint(format!("http://127.0.0.1:{port}/save/"))
            .with_max_attempts(1);
        let client = ReqwestArchiveClient::new(&config).unwrap();
        let err = client
            .submit(&config.save_target("https://example.com"))
            .await
            .unwrap_err();

        assert_eq!(
            err.network_kind(),
            Some(NetworkFailureKind::ConnectionRefused)
        );
    }

    #[tokio::test]
    async fn test_invalid_target_is_not_classified() {
        let config = ArchiverConfig::new(APP_DOMAIN);
        let client = ReqwestArchiveClient::new(&config).unwrap();
        let err = client.submit("not a url").await.unwrap_err();

        assert!(matches!(err, AppError::HttpError(_)));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(ReqwestArchiveClient::new(&ArchiverConfig::new("")).is_err());
    }
}
