//! HTTP transport abstraction.
//!
//! [`HttpTransport`] is the one seam between the client and the network:
//! a request in, a status/headers/body out, or a [`TransportError`]. The
//! production implementation is [`ReqwestTransport`]; tests substitute a
//! mock that records what was sent.
//!
//! [`TransportConfig`] is the full recognized configuration surface:
//! timeouts, TLS verification toggles, proxy settings, redirect policy.
//! Unknown option names are rejected, not silently accepted.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::{TransportError, ZenfolioError};

/// HTTP methods the pipeline uses. JSON calls always POST; uploads may PUT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
    Put,
}

/// A fully-built outbound request. Constructed fresh per logical call;
/// nothing here is shared between in-flight requests.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Query pairs with values already percent-encoded by the caller.
    /// Transports append them to the URL verbatim and must not encode again.
    pub query: Vec<(String, String)>,
    pub body: Bytes,
}

/// The raw outcome of a successful (2xx) exchange.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub reason: String,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

/// Issues a single HTTP request and returns its response.
///
/// Implementations must fail with [`TransportError::Status`] on any non-2xx
/// status and must not retry on their own.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// Proxy authentication schemes understood by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyAuthScheme {
    Basic,
}

/// Recognized transport options.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Time allowed to establish a connection
    pub connect_timeout: Duration,
    /// Overall per-request deadline; `None` disables it
    pub timeout: Option<Duration>,
    /// Read buffer size used when loading upload bodies
    pub buffer_size: usize,
    /// Verify the server certificate chain
    pub ssl_verify_peer: bool,
    /// Verify the certificate hostname
    pub ssl_verify_host: bool,
    pub proxy_host: Option<String>,
    pub proxy_port: u16,
    pub proxy_user: Option<String>,
    pub proxy_password: Option<String>,
    pub proxy_auth_scheme: ProxyAuthScheme,
    pub follow_redirects: bool,
    pub max_redirects: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            timeout: Some(Duration::from_secs(30)),
            buffer_size: 16384,
            ssl_verify_peer: true,
            ssl_verify_host: true,
            proxy_host: None,
            proxy_port: 0,
            proxy_user: None,
            proxy_password: None,
            proxy_auth_scheme: ProxyAuthScheme::Basic,
            follow_redirects: true,
            max_redirects: 5,
        }
    }
}

impl TransportConfig {
    /// Apply a string-keyed option, as read from an application's own
    /// configuration file. Unknown names are logged and rejected.
    pub fn apply(&mut self, name: &str, value: &str) -> Result<(), ZenfolioError> {
        let bad_value = || {
            ZenfolioError::InvalidArgument(format!(
                "invalid value {value:?} for transport option {name:?}"
            ))
        };
        match name {
            "connect_timeout" => {
                self.connect_timeout =
                    Duration::from_secs(value.parse().map_err(|_| bad_value())?);
            }
            "timeout" => {
                let secs: u64 = value.parse().map_err(|_| bad_value())?;
                self.timeout = (secs > 0).then(|| Duration::from_secs(secs));
            }
            "buffer_size" => self.buffer_size = value.parse().map_err(|_| bad_value())?,
            "ssl_verify_peer" => self.ssl_verify_peer = value.parse().map_err(|_| bad_value())?,
            "ssl_verify_host" => self.ssl_verify_host = value.parse().map_err(|_| bad_value())?,
            "proxy_host" => self.proxy_host = Some(value.to_string()),
            "proxy_port" => self.proxy_port = value.parse().map_err(|_| bad_value())?,
            "proxy_user" => self.proxy_user = Some(value.to_string()),
            "proxy_password" => self.proxy_password = Some(value.to_string()),
            "proxy_auth_scheme" => match value {
                "basic" => self.proxy_auth_scheme = ProxyAuthScheme::Basic,
                _ => return Err(bad_value()),
            },
            "follow_redirects" => {
                self.follow_redirects = value.parse().map_err(|_| bad_value())?
            }
            "max_redirects" => self.max_redirects = value.parse().map_err(|_| bad_value())?,
            _ => {
                warn!(option = %name, "unknown transport configuration option");
                return Err(ZenfolioError::InvalidArgument(format!(
                    "unknown transport configuration option {name:?}"
                )));
            }
        }
        Ok(())
    }
}

/// Production transport backed by a shared `reqwest::Client`.
#[derive(Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    config: TransportConfig,
}

impl ReqwestTransport {
    /// Build a transport honoring the full [`TransportConfig`] surface.
    pub fn new(config: TransportConfig) -> Result<Self, ZenfolioError> {
        let mut builder = reqwest::Client::builder().connect_timeout(config.connect_timeout);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        builder = if config.follow_redirects {
            builder.redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        } else {
            builder.redirect(reqwest::redirect::Policy::none())
        };

        // rustls has a single verification toggle; disabling either check
        // disables certificate validation entirely.
        if !config.ssl_verify_peer || !config.ssl_verify_host {
            warn!("TLS certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(host) = &config.proxy_host {
            if config.proxy_port == 0 {
                return Err(ZenfolioError::InvalidArgument(format!(
                    "proxy host {host:?} is configured without a proxy_port"
                )));
            }
            let mut proxy = reqwest::Proxy::all(format!("http://{}:{}", host, config.proxy_port))
                .map_err(|e| ZenfolioError::InvalidArgument(format!("invalid proxy: {e}")))?;
            if let (Some(user), Some(password)) = (&config.proxy_user, &config.proxy_password) {
                proxy = match config.proxy_auth_scheme {
                    ProxyAuthScheme::Basic => proxy.basic_auth(user, password),
                };
            }
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|e| {
            ZenfolioError::Transport(TransportError::ConnectFailed(format!(
                "failed to build client: {e}"
            )))
        })?;

        Ok(Self { client, config })
    }

    fn classify(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout
        } else if error.is_redirect() {
            TransportError::TooManyRedirects {
                max: self.config.max_redirects,
            }
        } else {
            TransportError::ConnectFailed(error.to_string())
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = url_with_query(&request.url, &request.query);
        let mut builder = match request.method {
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        debug!(
            url = %request.url,
            bytes = request.body.len(),
            "sending request"
        );

        let response = builder
            .body(request.body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let reason = status
            .canonical_reason()
            .unwrap_or("Unknown")
            .to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect();

        let body = response.bytes().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                reason,
            });
        }

        Ok(TransportResponse {
            status: status.as_u16(),
            reason,
            headers,
            body,
        })
    }
}

/// Append pre-encoded query pairs to a URL. Values go out exactly as the
/// caller encoded them, so a percent-encoded filename is not encoded twice.
fn url_with_query(url: &str, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let pairs: Vec<String> = query
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{}", pairs.join("&"))
}
