//! Async client for the Zenfolio photo-hosting JSON-RPC API.
//!
//! The crate wraps Zenfolio's envelope protocol (`{"method", "params",
//! "id"}` out, `{"result", "error", "id"}` back) behind a small surface:
//!
//! - [`ZenfolioClient::call`]: invoke any remote method by name; results are
//!   decoded, correlation-verified `serde_json::Value`s
//! - [`ZenfolioClient::login`]: challenge-response authentication (or
//!   [`ZenfolioClient::login_plaintext`] for the single-round-trip variant)
//! - [`ZenfolioClient::upload`]: stream a local file to a photoset's upload
//!   URL, outside the JSON envelope
//!
//! Transport details (timeouts, TLS, proxies, redirects) are confined to
//! [`transport::TransportConfig`]; the [`transport::HttpTransport`] trait is
//! the seam for tests and for composing the optional
//! [`cache::CachingTransport`].
//!
//! ```no_run
//! # async fn demo() -> zenfolio::Result<()> {
//! use serde_json::json;
//! use zenfolio::{UploadOptions, ZenfolioClient};
//!
//! let client = ZenfolioClient::new("My Cool App/1.0 (https://app.example.com)")?;
//! client.login("username", "password").await?;
//!
//! let hierarchy = client.call("LoadGroupHierarchy", vec![json!("username")]).await?;
//! let root_id = hierarchy["Id"].as_i64().unwrap_or_default();
//!
//! client.upload(root_id, "holiday.jpg", UploadOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod transport;
pub mod upload;

pub use cache::{CachingTransport, MemoryCache, ResponseCache};
pub use client::{SessionCredentials, ZenfolioClient};
pub use config::ClientConfig;
pub use error::{Result, TransportError, ZenfolioError};
pub use transport::{
    HttpMethod, HttpTransport, ReqwestTransport, TransportConfig, TransportRequest,
    TransportResponse,
};
pub use upload::{PhotoSet, UploadKind, UploadOptions, UploadTarget};
