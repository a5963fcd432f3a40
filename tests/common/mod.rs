//! Shared mock transport for integration tests.
//!
//! Scripts a queue of canned responses and records every request it is
//! asked to send, so tests can assert on exactly what went over the wire.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use zenfolio::{HttpTransport, TransportError, TransportRequest, TransportResponse};

pub struct MockTransport {
    responses: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a 200 OK response with the given body.
    pub fn push_json(&self, body: &str) {
        self.push_response(ok_response(body));
    }

    pub fn push_response(&self, response: TransportResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    #[allow(dead_code)]
    pub fn push_error(&self, error: TransportError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn recorded(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::ConnectFailed(
                    "no scripted response".to_string(),
                ))
            })
    }
}

pub fn ok_response(body: &str) -> TransportResponse {
    TransportResponse {
        status: 200,
        reason: "OK".to_string(),
        headers: HashMap::new(),
        body: Bytes::from(body.to_string()),
    }
}

#[allow(dead_code)]
pub fn ok_response_with_headers(body: &str, headers: &[(&str, &str)]) -> TransportResponse {
    let mut response = ok_response(body);
    response.headers = headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    response
}

/// Find a header value in a recorded request.
pub fn header_value<'a>(request: &'a TransportRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
