//! Plain-data values passed between the fetch stages.

use std::time::Duration;

use url::Url;

/// Method of the outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// Fully resolved description of one outbound HTTP call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingCall {
    pub method: HttpMethod,
    pub url: Url,
    /// `None` leaves the call bounded only by the client's own limits.
    pub timeout: Option<Duration>,
    pub body: Option<Vec<u8>>,
    /// Header lines in send order. Names may repeat.
    pub headers: Vec<(String, String)>,
    /// `None` defers to the client's default redirect policy.
    pub follow_redirects: Option<bool>,
}

/// A response as the HTTP client saw it, headers still one entry per line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// A failed call, triaged at the HTTP client boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFailure {
    /// HTTP-level error carrying a status, with the response if one was captured.
    Status {
        status: u16,
        response: Option<RawResponse>,
    },
    /// Name resolution or connection failure with an OS error code.
    Connect { code: i32 },
    /// Anything the client could not put in the two classes above.
    Other { reason: String },
}

/// The single terminal result of an outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success {
        status: u16,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    },
    HttpError {
        status: u16,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    },
    TransportError {
        code: i32,
    },
    Unexpected {
        reason: String,
    },
}

impl FetchOutcome {
    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchOutcome::Success { .. } => "success",
            FetchOutcome::HttpError { .. } => "http_error",
            FetchOutcome::TransportError { .. } => "transport_error",
            FetchOutcome::Unexpected { .. } => "unexpected",
        }
    }
}
