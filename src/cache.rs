//! Response caching collaborator.
//!
//! Caching is external to the core pipeline: [`crate::ZenfolioClient`]
//! never consults a cache itself and stays correct with caching entirely
//! absent. Applications that want read caching compose [`CachingTransport`]
//! over the real transport at construction time.
//!
//! Cache keys are a SHA-256 fingerprint of the normalized call (method name
//! plus parameters). Credentials travel in headers, never in the envelope,
//! so secrets cannot enter a key; authentication methods are never cached
//! at all.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::client::AUTH_METHODS;
use crate::error::TransportError;
use crate::transport::{HttpMethod, HttpTransport, TransportRequest, TransportResponse};

/// Deterministic fingerprint of a logical call, usable as a cache key.
pub fn request_fingerprint(method: &str, params: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(params.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// A TTL'd body cache keyed by request fingerprint.
pub trait ResponseCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Bytes>;
    fn put(&self, key: &str, body: Bytes, ttl: Duration);
    fn clear(&self);
}

struct CacheEntry {
    body: Bytes,
    expires_at: Instant,
}

/// In-memory [`ResponseCache`] with per-entry TTL and lazy expiry.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (possibly expired, not yet evicted) entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry eagerly.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }
}

impl ResponseCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Bytes> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Some(entry.body.clone());
            }
        }
        // Expired; evict on the way out
        self.entries.remove(key);
        None
    }

    fn put(&self, key: &str, body: Bytes, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                body,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    fn clear(&self) {
        self.entries.clear();
    }
}

/// Transport decorator that short-circuits repeated JSON calls.
///
/// Only plain POSTed call envelopes are cacheable; uploads (raw bodies,
/// query parameters) and authentication methods pass straight through.
pub struct CachingTransport {
    inner: Arc<dyn HttpTransport>,
    cache: Arc<dyn ResponseCache>,
    ttl: Duration,
}

impl CachingTransport {
    pub fn new(inner: Arc<dyn HttpTransport>, cache: Arc<dyn ResponseCache>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }
}

#[async_trait]
impl HttpTransport for CachingTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let key = cacheable_key(&request);

        if let Some(key) = &key {
            if let Some(body) = self.cache.get(key) {
                debug!(key = %key, "serving response from cache");
                return Ok(TransportResponse {
                    status: 200,
                    reason: "OK".to_string(),
                    headers: HashMap::new(),
                    body,
                });
            }
        }

        let response = self.inner.send(request).await?;

        if let Some(key) = key {
            if response.status == 200 {
                self.cache.put(&key, response.body.clone(), self.ttl);
            }
        }

        Ok(response)
    }
}

/// Fingerprint a request if it is a cacheable call envelope.
fn cacheable_key(request: &TransportRequest) -> Option<String> {
    if request.method != HttpMethod::Post || !request.query.is_empty() {
        return None;
    }
    let envelope: Value = serde_json::from_slice(&request.body).ok()?;
    let method = envelope.get("method")?.as_str()?;
    if AUTH_METHODS.contains(&method) {
        return None;
    }
    let params = envelope.get("params").cloned().unwrap_or(Value::Null);
    Some(request_fingerprint(method, &params))
}
