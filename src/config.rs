//! Client configuration.
//!
//! An application name is mandatory (Zenfolio asks for it so support can
//! attribute traffic) and becomes part of the `User-Agent` pair sent on
//! every request. The API version selects the endpoint path segment.

use crate::error::ZenfolioError;
use crate::transport::TransportConfig;

/// Default API endpoint.
pub const DEFAULT_BASE_URI: &str = "https://api.zenfolio.com/";

/// Default API version segment.
pub const DEFAULT_API_VERSION: &str = "1.8";

/// Crate version, advertised in the user agent.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Immutable per-client configuration. Session credentials live on the
/// client, not here.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub app_name: String,
    pub api_version: String,
    pub base_uri: String,
    pub transport: TransportConfig,
}

impl ClientConfig {
    /// Create a configuration for the given application name.
    ///
    /// The name should identify the application and version, e.g.
    /// `"My Cool App/1.0 (https://app.example.com)"`.
    pub fn new(app_name: &str) -> Result<Self, ZenfolioError> {
        if app_name.trim().is_empty() {
            return Err(ZenfolioError::InvalidArgument(
                "an application name is required for all Zenfolio interactions".to_string(),
            ));
        }
        Ok(Self {
            app_name: app_name.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            base_uri: DEFAULT_BASE_URI.to_string(),
            transport: TransportConfig::default(),
        })
    }

    /// Select a different API version segment (e.g. `"1.6"`).
    pub fn with_api_version(mut self, api_version: &str) -> Self {
        self.api_version = api_version.to_string();
        self
    }

    /// Point at a different base endpoint. A trailing slash is ensured.
    pub fn with_base_uri(mut self, base_uri: &str) -> Self {
        self.base_uri = if base_uri.ends_with('/') {
            base_uri.to_string()
        } else {
            format!("{base_uri}/")
        };
        self
    }

    /// Replace the transport configuration.
    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    /// `User-Agent` value sent on every request, mirrored into
    /// `X-Zenfolio-User-Agent` as the service requires.
    pub fn user_agent(&self) -> String {
        format!("{} using zenfolio-rs/{}", self.app_name, CLIENT_VERSION)
    }

    /// Full URL of the JSON-RPC endpoint for the configured API version.
    pub fn endpoint(&self) -> String {
        format!("{}api/{}/zfapi.asmx", self.base_uri, self.api_version)
    }
}
