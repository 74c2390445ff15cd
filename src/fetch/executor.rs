//! Runs one outbound call and settles on exactly one outcome.

use crate::fetch::client::HttpClient;
use crate::fetch::types::{ClientFailure, FetchOutcome, OutgoingCall, RawResponse};

/// Issue `call` once through `client`.
///
/// A response with a 2xx or 3xx status is a success; every other status is
/// an HTTP error carrying whatever the server sent.
pub async fn execute<C: HttpClient>(call: OutgoingCall, client: &C) -> FetchOutcome {
    match client.send(call).await {
        Ok(response) => from_response(response),
        Err(ClientFailure::Status {
            status,
            response: Some(response),
        }) => FetchOutcome::HttpError {
            status,
            headers: response.headers,
            body: response.body,
        },
        Err(ClientFailure::Status {
            status,
            response: None,
        }) => FetchOutcome::HttpError {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        },
        Err(ClientFailure::Connect { code }) => FetchOutcome::TransportError { code },
        Err(ClientFailure::Other { reason }) => FetchOutcome::Unexpected { reason },
    }
}

fn from_response(response: RawResponse) -> FetchOutcome {
    let RawResponse {
        status,
        headers,
        body,
    } = response;

    if (200..400).contains(&status) {
        FetchOutcome::Success {
            status,
            headers,
            body,
        }
    } else {
        FetchOutcome::HttpError {
            status,
            headers,
            body,
        }
    }
}
