//! Maps fetch outcomes onto the response tuple.

use crate::fetch::types::FetchOutcome;
use crate::wire::types::{HeaderMultiMap, ResponseTuple};

/// Convert an outcome into `(success, body, code, headers)`.
pub fn classify(outcome: FetchOutcome) -> ResponseTuple {
    match outcome {
        FetchOutcome::Success {
            status,
            headers,
            body,
        } => ResponseTuple {
            success: true,
            body,
            code: i64::from(status),
            headers: group_headers(headers),
        },
        FetchOutcome::HttpError {
            status,
            headers,
            body,
        } => ResponseTuple {
            success: false,
            body,
            code: i64::from(status),
            headers: group_headers(headers),
        },
        FetchOutcome::TransportError { code } => ResponseTuple {
            code: i64::from(code),
            ..ResponseTuple::unexpected()
        },
        FetchOutcome::Unexpected { .. } => ResponseTuple::unexpected(),
    }
}

/// Group header lines by name.
///
/// Names keep the order they were first seen in; values keep line order.
pub fn group_headers<I>(lines: I) -> HeaderMultiMap
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut grouped: HeaderMultiMap = Vec::new();
    for (name, value) in lines {
        match grouped.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, values)) => values.push(value),
            None => grouped.push((name, vec![value])),
        }
    }
    grouped
}
