//! Maps a decoded request onto an outbound call.
//!
//! # Responsibilities
//! - Parse and check the target URL
//! - Convert the millisecond timeout
//! - Flatten cookies and headers into ordered header lines
//!
//! # Design Decisions
//! - Cookies become one `Cookie` line, emitted before explicit headers
//! - An explicit `Cookie` header is kept as its own line; HTTP allows repeats
//! - A zero timeout means no per-call timeout

use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue, COOKIE};
use url::Url;

use crate::fetch::types::{HttpMethod, OutgoingCall};
use crate::wire::types::{Cookies, DecodedRequest, HeaderMultiMap};

/// Reasons a decoded request cannot become an outbound call.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid header name: {0:?}")]
    InvalidHeaderName(String),

    #[error("invalid value for header {0:?}")]
    InvalidHeaderValue(String),
}

/// Build the outbound call for `request`.
pub fn build(request: &DecodedRequest) -> Result<OutgoingCall, BuildError> {
    let url = Url::parse(request.url()).map_err(|source| BuildError::InvalidUrl {
        url: request.url().to_string(),
        source,
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(BuildError::UnsupportedScheme(url.scheme().to_string()));
    }

    let options = request.options();
    let headers = flatten_headers(options.cookies.as_ref(), options.headers.as_ref());
    for (name, value) in &headers {
        validate_header(name, value)?;
    }

    let (method, body) = match request {
        DecodedRequest::Get(_) => (HttpMethod::Get, None),
        DecodedRequest::Post(post) => (HttpMethod::Post, Some(post.body.clone())),
    };

    Ok(OutgoingCall {
        method,
        url,
        timeout: timeout_from_millis(request.timeout_ms()),
        body,
        headers,
        follow_redirects: options.follow_redirects,
    })
}

/// Flatten cookies and headers into header lines.
///
/// Non-empty cookies yield a single `Cookie: a=1; b=2` line first, then one
/// line per header value, names in wire order.
pub fn flatten_headers(
    cookies: Option<&Cookies>,
    headers: Option<&HeaderMultiMap>,
) -> Vec<(String, String)> {
    let mut lines = Vec::new();

    if let Some(cookies) = cookies.filter(|c| !c.is_empty()) {
        let joined = cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        lines.push((COOKIE.as_str().to_string(), joined));
    }

    if let Some(headers) = headers {
        for (name, values) in headers {
            for value in values {
                lines.push((name.clone(), value.clone()));
            }
        }
    }

    lines
}

fn timeout_from_millis(timeout_ms: u64) -> Option<Duration> {
    (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms))
}

fn validate_header(name: &str, value: &str) -> Result<(), BuildError> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| BuildError::InvalidHeaderName(name.to_string()))?;
    HeaderValue::from_str(value).map_err(|_| BuildError::InvalidHeaderValue(name.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::types::{GetRequest, PostRequest, RequestOptions};

    fn get(url: &str, options: RequestOptions) -> DecodedRequest {
        DecodedRequest::Get(GetRequest {
            url: url.to_string(),
            timeout_ms: 5000,
            options,
        })
    }

    #[test]
    fn test_plain_get_has_no_extra_headers() {
        let call = build(&get("http://ya.ru", RequestOptions::default())).unwrap();
        assert_eq!(call.method, HttpMethod::Get);
        assert_eq!(call.url.as_str(), "http://ya.ru/");
        assert!(call.headers.is_empty());
        assert!(call.body.is_none());
        assert_eq!(call.timeout, Some(Duration::from_secs(5)));
        assert_eq!(call.follow_redirects, None);
    }

    #[test]
    fn test_single_cookie() {
        let options = RequestOptions {
            cookies: Some(vec![("test".into(), "testvalue".into())]),
            ..Default::default()
        };
        let call = build(&get("http://ya.ru", options)).unwrap();
        assert_eq!(
            call.headers,
            vec![("cookie".to_string(), "test=testvalue".to_string())]
        );
    }

    #[test]
    fn test_empty_cookies_add_nothing() {
        let lines = flatten_headers(Some(&vec![]), None);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_cookies_and_headers_accumulate() {
        let cookies = vec![("test".into(), "testvalue".into()), ("x".into(), "y".into())];
        let headers = vec![
            ("Cookie".into(), vec!["a=1".into(), "b=2".into()]),
            ("Accept-Language".into(), vec!["ru-Ru".into()]),
        ];
        let lines = flatten_headers(Some(&cookies), Some(&headers));
        assert_eq!(
            lines,
            vec![
                ("cookie".to_string(), "test=testvalue; x=y".to_string()),
                ("Cookie".to_string(), "a=1".to_string()),
                ("Cookie".to_string(), "b=2".to_string()),
                ("Accept-Language".to_string(), "ru-Ru".to_string()),
            ]
        );
    }

    #[test]
    fn test_post_carries_body_and_fractional_timeout() {
        let request = DecodedRequest::Post(PostRequest {
            url: "https://example.com/echo".into(),
            body: b"test_data".to_vec(),
            timeout_ms: 1500,
            options: RequestOptions {
                follow_redirects: Some(false),
                ..Default::default()
            },
        });
        let call = build(&request).unwrap();
        assert_eq!(call.method, HttpMethod::Post);
        assert_eq!(call.body.as_deref(), Some(&b"test_data"[..]));
        assert_eq!(call.timeout, Some(Duration::from_millis(1500)));
        assert_eq!(call.follow_redirects, Some(false));
    }

    #[test]
    fn test_zero_timeout_is_unbounded() {
        let request = DecodedRequest::Get(GetRequest {
            url: "http://h".into(),
            timeout_ms: 0,
            options: RequestOptions::default(),
        });
        assert_eq!(build(&request).unwrap().timeout, None);
    }

    #[test]
    fn test_rejects_bad_urls() {
        let err = build(&get("not a url", RequestOptions::default())).unwrap_err();
        assert!(matches!(err, BuildError::InvalidUrl { .. }));

        let err = build(&get("ftp://example.com/file", RequestOptions::default())).unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedScheme(ref s) if s == "ftp"));
    }

    #[test]
    fn test_rejects_bad_headers() {
        let options = RequestOptions {
            headers: Some(vec![("Bad Name".into(), vec!["v".into()])]),
            ..Default::default()
        };
        assert!(matches!(
            build(&get("http://h", options)).unwrap_err(),
            BuildError::InvalidHeaderName(_)
        ));

        let options = RequestOptions {
            headers: Some(vec![("X-Ok".into(), vec!["line\nbreak".into()])]),
            ..Default::default()
        };
        assert!(matches!(
            build(&get("http://h", options)).unwrap_err(),
            BuildError::InvalidHeaderValue(_)
        ));
    }
}
