//! Typed request and response values carried over the wire.

use std::fmt;
use std::str::FromStr;

/// Ordered cookie name/value pairs, in the order the caller sent them.
pub type Cookies = Vec<(String, String)>;

/// Ordered header names, each with its values in order.
pub type HeaderMultiMap = Vec<(String, Vec<String>)>;

/// RPC verb a call arrived on. Selects the request schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Post => "post",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Verb::Get),
            "post" => Ok(Verb::Post),
            other => Err(format!("unknown verb: {other}")),
        }
    }
}

/// Optional trailing slots shared by both schemas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub cookies: Option<Cookies>,
    pub headers: Option<HeaderMultiMap>,
    pub follow_redirects: Option<bool>,
}

/// `[url, timeout_ms, cookies?, headers?, follow_redirects?]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRequest {
    pub url: String,
    pub timeout_ms: u64,
    pub options: RequestOptions,
}

/// `[url, body, timeout_ms, cookies?, headers?, follow_redirects?]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRequest {
    pub url: String,
    pub body: Vec<u8>,
    pub timeout_ms: u64,
    pub options: RequestOptions,
}

/// A request decoded with the schema of the verb it arrived on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedRequest {
    Get(GetRequest),
    Post(PostRequest),
}

impl DecodedRequest {
    pub fn verb(&self) -> Verb {
        match self {
            DecodedRequest::Get(_) => Verb::Get,
            DecodedRequest::Post(_) => Verb::Post,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            DecodedRequest::Get(r) => &r.url,
            DecodedRequest::Post(r) => &r.url,
        }
    }

    pub fn timeout_ms(&self) -> u64 {
        match self {
            DecodedRequest::Get(r) => r.timeout_ms,
            DecodedRequest::Post(r) => r.timeout_ms,
        }
    }

    pub fn options(&self) -> &RequestOptions {
        match self {
            DecodedRequest::Get(r) => &r.options,
            DecodedRequest::Post(r) => &r.options,
        }
    }

    /// Request body; `None` for GET.
    pub fn body(&self) -> Option<&[u8]> {
        match self {
            DecodedRequest::Get(_) => None,
            DecodedRequest::Post(r) => Some(&r.body),
        }
    }
}

/// The fixed four-field answer: `(success, body, code, headers)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseTuple {
    pub success: bool,
    pub body: Vec<u8>,
    pub code: i64,
    pub headers: HeaderMultiMap,
}

impl ResponseTuple {
    /// `(false, "", 0, {})`, the answer for anything the worker could not classify.
    pub fn unexpected() -> Self {
        Self::default()
    }
}
