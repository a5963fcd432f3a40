//! Request/response envelope codec.
//!
//! Every JSON-RPC-style call is wrapped in `{"method", "params", "id"}` on
//! the way out and `{"result", "error", "id"}` on the way back. The id is a
//! lowercase hex SHA-1 of the method name, deterministic so retries of the
//! same logical call carry the same correlation token. It is treated as an
//! opaque echo-verification token and nothing else.
//!
//! Uploads bypass this codec entirely; their responses are raw bytes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha1::{Digest, Sha1};

use crate::error::ZenfolioError;

/// Outbound call envelope.
#[derive(Debug, Clone, Serialize)]
pub struct RequestEnvelope {
    pub method: String,
    pub params: Vec<Value>,
    pub id: String,
}

/// Inbound response envelope. Exactly one of `result`/`error` must be
/// non-null; anything else is a protocol violation.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RemoteFault>,
    #[serde(default)]
    pub id: Option<Value>,
}

/// Structured application error as returned by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFault {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Deterministic correlation id for a method: lowercase hex SHA-1 of the
/// method name.
pub fn request_id(method: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(method.as_bytes());
    hex::encode(hasher.finalize())
}

/// Build the serialized request envelope for a call.
///
/// Returns the JSON body and the correlation id to verify the response
/// against.
pub fn encode(method: &str, params: &[Value]) -> Result<(String, String), ZenfolioError> {
    let id = request_id(method);
    let envelope = RequestEnvelope {
        method: method.to_string(),
        params: params.to_vec(),
        id: id.clone(),
    };
    let body = serde_json::to_string(&envelope).map_err(|e| ZenfolioError::InvalidEnvelope {
        method: method.to_string(),
        detail: format!("failed to serialize request: {e}"),
    })?;
    Ok((body, id))
}

/// Decode a response body, verifying id correlation and the
/// result-XOR-error invariant.
///
/// A non-null `error` is returned as [`ZenfolioError::Remote`]; the invoker
/// classifies it further (unknown-method detection, message rewrites).
pub fn decode(body: &[u8], expected_id: &str, method: &str) -> Result<Value, ZenfolioError> {
    let envelope: ResponseEnvelope =
        serde_json::from_slice(body).map_err(|e| ZenfolioError::InvalidEnvelope {
            method: method.to_string(),
            detail: format!("response is not valid JSON: {e}"),
        })?;

    let received = match &envelope.id {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "null".to_string(),
    };
    if received != expected_id {
        return Err(ZenfolioError::IdMismatch {
            method: method.to_string(),
            expected: expected_id.to_string(),
            received,
        });
    }

    match (envelope.result, envelope.error) {
        (Some(_), Some(_)) => Err(ZenfolioError::InvalidEnvelope {
            method: method.to_string(),
            detail: "both result and error are non-null".to_string(),
        }),
        (None, None) => Err(ZenfolioError::InvalidEnvelope {
            method: method.to_string(),
            detail: "both result and error are null".to_string(),
        }),
        (None, Some(fault)) => Err(ZenfolioError::Remote {
            method: method.to_string(),
            code: fault.code,
            message: fault.message,
        }),
        (Some(result), None) => Ok(result),
    }
}
