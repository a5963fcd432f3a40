//! The Zenfolio client: generic method invocation, login, session state.
//!
//! [`ZenfolioClient::call`] is the single entry point for every remote
//! method; well-known operations are just thin callers of this primitive.
//! Each call builds its request-scoped headers and envelope from scratch, so
//! concurrent calls on a shared client never share mutable per-request
//! state. Session credentials sit behind an `RwLock`: plain reads on every
//! call, a single write on login side effects.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::auth::{compute_proof, ChallengeMaterial};
use crate::config::ClientConfig;
use crate::envelope;
use crate::error::{Result, ZenfolioError};
use crate::transport::{
    HttpMethod, HttpTransport, ReqwestTransport, TransportRequest, TransportResponse,
};

pub(crate) const METHOD_GET_CHALLENGE: &str = "GetChallenge";
pub(crate) const METHOD_AUTHENTICATE: &str = "Authenticate";
pub(crate) const METHOD_AUTHENTICATE_PLAIN: &str = "AuthenticatePlain";
pub(crate) const METHOD_KEYRING_ADD_KEY_PLAIN: &str = "KeyringAddKeyPlain";

/// Methods that negotiate credentials. Their responses must never be cached.
pub const AUTH_METHODS: &[&str] = &[
    METHOD_GET_CHALLENGE,
    METHOD_AUTHENTICATE,
    METHOD_AUTHENTICATE_PLAIN,
    METHOD_KEYRING_ADD_KEY_PLAIN,
];

/// Session-scoped credentials. Unset at construction; written only by the
/// invoker's post-call side effects or the explicit setters.
#[derive(Debug, Clone, Default)]
pub struct SessionCredentials {
    /// Short-lived session token (server-side expiry ~24h)
    pub auth_token: Option<String>,
    /// Longer-lived keyring token for accessing protected content
    pub keyring: Option<String>,
}

/// Status line and headers of the most recent successful exchange.
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    pub status: u16,
    pub reason: String,
    pub headers: HashMap<String, String>,
}

/// Asynchronous Zenfolio API client.
///
/// ```no_run
/// # async fn demo() -> zenfolio::Result<()> {
/// use serde_json::json;
///
/// let client = zenfolio::ZenfolioClient::new("My Cool App/1.0 (https://app.example.com)")?;
/// client.login("username", "password").await?;
/// let hierarchy = client.call("LoadGroupHierarchy", vec![json!("username")]).await?;
/// # let _ = hierarchy;
/// # Ok(())
/// # }
/// ```
pub struct ZenfolioClient {
    pub(crate) config: ClientConfig,
    pub(crate) transport: Arc<dyn HttpTransport>,
    pub(crate) session: RwLock<SessionCredentials>,
    last_response: RwLock<Option<ResponseMeta>>,
}

impl ZenfolioClient {
    /// Create a client with default configuration and the production
    /// transport. The application name is mandatory.
    pub fn new(app_name: &str) -> Result<Self> {
        Self::with_config(ClientConfig::new(app_name)?)
    }

    /// Create a client from an explicit configuration.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.transport.clone())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client over an arbitrary transport. This is the seam tests
    /// and caching decorators plug into.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config,
            transport,
            session: RwLock::new(SessionCredentials::default()),
            last_response: RwLock::new(None),
        }
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Generic method invocation
    // -------------------------------------------------------------------------

    /// Invoke a remote method by name.
    ///
    /// Zenfolio methods take at least one argument by convention, so an
    /// empty `params` is rejected before any network activity. The few
    /// legitimately argument-less methods go through [`Self::call_no_args`].
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        if params.is_empty() {
            return Err(ZenfolioError::InvalidArgument(format!(
                "method {method} requires at least one argument; \
                 use call_no_args for argument-less methods"
            )));
        }
        self.execute(method, params).await
    }

    /// Invoke an argument-less remote method (e.g. `LoadPrivateProfile`).
    pub async fn call_no_args(&self, method: &str) -> Result<Value> {
        self.execute(method, Vec::new()).await
    }

    /// Typed wrapper over [`Self::call`]: deserialize the result into `T`.
    pub async fn call_as<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T> {
        let result = self.call(method, params).await?;
        serde_json::from_value(result).map_err(|e| ZenfolioError::InvalidEnvelope {
            method: method.to_string(),
            detail: format!("unexpected result shape: {e}"),
        })
    }

    async fn execute(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let (body, id) = envelope::encode(method, &params)?;
        let headers = self.request_headers(true).await;

        let request = TransportRequest {
            method: HttpMethod::Post,
            url: self.config.endpoint(),
            headers,
            query: Vec::new(),
            body: Bytes::from(body),
        };

        debug!(method = %method, id = %id, "invoking remote method");

        let response = self.transport.send(request).await?;
        self.record_response(&response).await;

        let result = envelope::decode(&response.body, &id, method).map_err(classify_remote)?;

        self.apply_session_side_effects(method, &result).await;
        Ok(result)
    }

    /// Build the full header set for one request. Called fresh per request;
    /// no header state survives between calls.
    pub(crate) async fn request_headers(&self, json_call: bool) -> Vec<(String, String)> {
        let user_agent = self.config.user_agent();
        let mut headers = vec![
            ("User-Agent".to_string(), user_agent.clone()),
            ("X-Zenfolio-User-Agent".to_string(), user_agent),
            ("Accept".to_string(), "application/json".to_string()),
        ];
        if json_call {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

        let session = self.session.read().await;
        if let Some(token) = &session.auth_token {
            headers.push(("X-Zenfolio-Token".to_string(), token.clone()));
        }
        if let Some(keyring) = &session.keyring {
            headers.push(("X-Zenfolio-Keyring".to_string(), keyring.clone()));
        }
        headers
    }

    pub(crate) async fn record_response(&self, response: &TransportResponse) {
        let mut last = self.last_response.write().await;
        *last = Some(ResponseMeta {
            status: response.status,
            reason: response.reason.clone(),
            headers: response.headers.clone(),
        });
    }

    /// Token results of the authentication and keyring methods become the
    /// new session state. This is the only writer besides the explicit
    /// setters.
    async fn apply_session_side_effects(&self, method: &str, result: &Value) {
        let token = match result {
            Value::String(token) => token.clone(),
            _ => return,
        };
        match method {
            METHOD_AUTHENTICATE | METHOD_AUTHENTICATE_PLAIN => {
                self.session.write().await.auth_token = Some(token);
                info!(method = %method, "session token updated");
            }
            METHOD_KEYRING_ADD_KEY_PLAIN => {
                self.session.write().await.keyring = Some(token);
                info!("keyring token updated");
            }
            _ => {}
        }
    }

    // -------------------------------------------------------------------------
    // Authentication
    // -------------------------------------------------------------------------

    /// Log in with the challenge-response handshake. Preferred over
    /// [`login_plaintext`](Self::login_plaintext) since the password itself
    /// never goes over the wire.
    ///
    /// Stores and returns the session token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let challenge_value = self
            .call(METHOD_GET_CHALLENGE, vec![json!(username)])
            .await?;
        let material: ChallengeMaterial =
            serde_json::from_value(challenge_value).map_err(|e| ZenfolioError::InvalidEnvelope {
                method: METHOD_GET_CHALLENGE.to_string(),
                detail: format!("unexpected challenge payload: {e}"),
            })?;

        let proof = compute_proof(&material.password_salt, &material.challenge, password);

        let token = self
            .call(
                METHOD_AUTHENTICATE,
                vec![json!(material.challenge), json!(proof)],
            )
            .await?;
        token_string(METHOD_AUTHENTICATE, token)
    }

    /// Log in by sending the plaintext password in a single round trip.
    ///
    /// Stores and returns the session token.
    pub async fn login_plaintext(&self, username: &str, password: &str) -> Result<String> {
        let token = self
            .call(
                METHOD_AUTHENTICATE_PLAIN,
                vec![json!(username), json!(password)],
            )
            .await?;
        token_string(METHOD_AUTHENTICATE_PLAIN, token)
    }

    // -------------------------------------------------------------------------
    // Session state
    // -------------------------------------------------------------------------

    /// Current session token, if any.
    pub async fn auth_token(&self) -> Option<String> {
        self.session.read().await.auth_token.clone()
    }

    /// Attach a previously-obtained session token.
    pub async fn set_auth_token(&self, token: impl Into<String>) {
        self.session.write().await.auth_token = Some(token.into());
    }

    /// Current keyring token, if any.
    pub async fn keyring(&self) -> Option<String> {
        self.session.read().await.keyring.clone()
    }

    /// Attach a previously-obtained keyring token.
    pub async fn set_keyring(&self, keyring: impl Into<String>) {
        self.session.write().await.keyring = Some(keyring.into());
    }

    /// Drop all session credentials.
    pub async fn clear_session(&self) {
        let mut session = self.session.write().await;
        *session = SessionCredentials::default();
    }

    // -------------------------------------------------------------------------
    // Last-response introspection
    // -------------------------------------------------------------------------

    /// HTTP status of the most recent successful exchange.
    pub async fn last_status(&self) -> Option<u16> {
        self.last_response.read().await.as_ref().map(|m| m.status)
    }

    /// Reason phrase of the most recent successful exchange.
    pub async fn last_reason_phrase(&self) -> Option<String> {
        self.last_response
            .read()
            .await
            .as_ref()
            .map(|m| m.reason.clone())
    }

    /// Headers of the most recent successful exchange.
    pub async fn last_headers(&self) -> Option<HashMap<String, String>> {
        self.last_response
            .read()
            .await
            .as_ref()
            .map(|m| m.headers.clone())
    }
}

/// Post-decode classification of remote faults: unknown-method markers map
/// to [`ZenfolioError::BadMethodCall`]; all others stay [`ZenfolioError::Remote`]
/// with the generic "contact Support" wording made explicit.
fn classify_remote(err: ZenfolioError) -> ZenfolioError {
    match err {
        ZenfolioError::Remote {
            method,
            code,
            message,
        } => {
            if code == "E_NOSUCHMETHOD" || message.to_ascii_lowercase().contains("no such method") {
                ZenfolioError::BadMethodCall { method }
            } else {
                ZenfolioError::Remote {
                    method,
                    code,
                    message: message.replace("contact Support", "contact Zenfolio Support"),
                }
            }
        }
        other => other,
    }
}

fn token_string(method: &str, value: Value) -> Result<String> {
    match value {
        Value::String(token) => Ok(token),
        other => Err(ZenfolioError::InvalidEnvelope {
            method: method.to_string(),
            detail: format!("expected a token string, got {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_no_such_method_code() {
        let err = classify_remote(ZenfolioError::Remote {
            method: "Bogus".to_string(),
            code: "E_NOSUCHMETHOD".to_string(),
            message: "whatever".to_string(),
        });
        assert!(matches!(err, ZenfolioError::BadMethodCall { method } if method == "Bogus"));
    }

    #[test]
    fn test_classify_no_such_method_message() {
        let err = classify_remote(ZenfolioError::Remote {
            method: "Bogus".to_string(),
            code: "E_UNSPECIFIED".to_string(),
            message: "No such method: Bogus".to_string(),
        });
        assert!(matches!(err, ZenfolioError::BadMethodCall { .. }));
    }

    #[test]
    fn test_classify_rewrites_support_wording() {
        let err = classify_remote(ZenfolioError::Remote {
            method: "LoadPhoto".to_string(),
            code: "E_UNSPECIFIED".to_string(),
            message: "Something broke, contact Support.".to_string(),
        });
        match err {
            ZenfolioError::Remote { message, .. } => {
                assert_eq!(message, "Something broke, contact Zenfolio Support.");
            }
            other => panic!("expected Remote, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_passes_other_errors_through() {
        let err = classify_remote(ZenfolioError::InvalidArgument("nope".to_string()));
        assert!(matches!(err, ZenfolioError::InvalidArgument(_)));
    }

    #[test]
    fn test_token_string_rejects_non_strings() {
        let err = token_string("Authenticate", serde_json::json!(42)).unwrap_err();
        assert!(matches!(err, ZenfolioError::InvalidEnvelope { .. }));
        assert_eq!(
            token_string("Authenticate", serde_json::json!("tok")).unwrap(),
            "tok"
        );
    }
}
