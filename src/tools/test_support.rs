//! Shared fixtures for the tool family tests.

use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::client::{ApiContext, ApiError, ApiRequest, ApiResult, MockTransport};
use crate::tools::ToolOutput;

pub const LOCATION: &str = "loc-default";

/// Context with the default location configured.
pub fn context(mock: MockTransport) -> Arc<ApiContext<MockTransport>> {
    Arc::new(ApiContext::new(mock).with_location(LOCATION))
}

/// Context without any default location.
pub fn bare_context(mock: MockTransport) -> Arc<ApiContext<MockTransport>> {
    Arc::new(ApiContext::new(mock))
}

pub type Recorded = Arc<Mutex<Vec<ApiRequest>>>;

/// Mock answering each call with the next queued response, recording every
/// request it sees. Panics (via mockall) on more calls than responses.
pub fn recording(responses: Vec<ApiResult<Value>>) -> (MockTransport, Recorded) {
    let seen: Recorded = Arc::new(Mutex::new(Vec::new()));
    let calls = responses.len();
    let queue = Arc::new(Mutex::new(responses));

    let mut mock = MockTransport::new();
    let sink = Arc::clone(&seen);
    mock.expect_send().times(calls).returning(move |request| {
        sink.lock().unwrap().push(request);
        queue.lock().unwrap().remove(0)
    });
    (mock, seen)
}

pub fn status_error(status: u16, message: &str) -> ApiError {
    ApiError::Status {
        status,
        message: message.to_string(),
    }
}

pub fn only_request(seen: &Recorded) -> ApiRequest {
    let requests = seen.lock().unwrap();
    assert_eq!(requests.len(), 1, "expected exactly one outbound call");
    requests[0].clone()
}

pub fn message(output: &ToolOutput) -> &str {
    output.message.as_str()
}
