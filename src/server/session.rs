//! Mutable state shared between the mock server handle and its listener.

use std::collections::VecDeque;

use bytes::Bytes;
use http::StatusCode;

use crate::http::RecordedRequest;

/// A response queued for one future request.
///
/// A body of `None` sends a zero-length response body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptedResponse {
    status: StatusCode,
    body: Option<Bytes>,
}

impl ScriptedResponse {
    /// Response with `status` and an optional body.
    #[must_use]
    pub fn new(status: StatusCode, body: Option<Bytes>) -> Self { Self { status, body } }

    /// Response with `status` and no body.
    #[must_use]
    pub fn empty(status: StatusCode) -> Self { Self::new(status, None) }

    /// Response with `status` and `body`.
    #[must_use]
    pub fn with_body(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self::new(status, Some(body.into()))
    }

    /// Status code to send.
    #[must_use]
    pub fn status(&self) -> StatusCode { self.status }

    /// Body to send, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> { self.body.as_ref() }

    pub(crate) fn into_parts(self) -> (StatusCode, Bytes) {
        (self.status, self.body.unwrap_or_default())
    }
}

/// Pending responses and recorded requests of one server.
///
/// `recorded.len()` never exceeds `registered`: a request is only recorded
/// when it takes a scripted response.
#[derive(Debug, Default)]
pub(crate) struct Session {
    pending: VecDeque<ScriptedResponse>,
    recorded: Vec<RecordedRequest>,
    registered: usize,
    unscripted: usize,
}

impl Session {
    pub(crate) fn enqueue(&mut self, response: ScriptedResponse) {
        self.pending.push_back(response);
        self.registered += 1;
    }

    /// Trade `request` for the next scripted response.
    ///
    /// Returns `None`, recording nothing, when no response is left.
    pub(crate) fn exchange(&mut self, request: RecordedRequest) -> Option<ScriptedResponse> {
        let Some(response) = self.pending.pop_front() else {
            self.unscripted += 1;
            return None;
        };
        self.recorded.push(request);
        Some(response)
    }

    pub(crate) fn recorded(&self, index: usize) -> Option<&RecordedRequest> {
        self.recorded.get(index)
    }

    pub(crate) fn request_count(&self) -> usize { self.recorded.len() }

    pub(crate) fn registered(&self) -> usize { self.registered }

    pub(crate) fn pending(&self) -> usize { self.pending.len() }

    pub(crate) fn unscripted(&self) -> usize { self.unscripted }

    pub(crate) fn clear_pending(&mut self) { self.pending.clear(); }
}
