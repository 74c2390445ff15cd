//! Per-call orchestration.
//!
//! # Responsibilities
//! - Read the whole inbound payload (AWAITING_BODY)
//! - Decode, build, fetch and classify (PROCESSING)
//! - Answer exactly once and close (DONE)
//!
//! # Design Decisions
//! - Every failure becomes a response tuple; nothing escapes `handle`
//! - Panics inside the pipeline are caught and answered like any other
//!   unclassified failure
//! - Remote failures log at info, worker-side failures at error

use std::any::Any;
use std::fmt::Display;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use bytes::Bytes;
use futures_util::{FutureExt, Stream, StreamExt};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::LimitsConfig;
use crate::fetch::builder::{build, BuildError};
use crate::fetch::classify::classify;
use crate::fetch::client::HttpClient;
use crate::fetch::executor::execute;
use crate::fetch::types::{FetchOutcome, OutgoingCall};
use crate::observability::metrics;
use crate::wire::codec::{decode_request, CodecError};
use crate::wire::types::{ResponseTuple, Verb};
use crate::worker::sink::{ResponseGuard, ResponseSink};

/// Failures that happen before an outbound call exists.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("failed to read request payload: {0}")]
    Read(String),

    #[error("request payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("malformed request: {0}")]
    Malformed(#[from] CodecError),

    #[error("unusable request: {0}")]
    Invalid(#[from] BuildError),
}

/// Handles `get` and `post` calls against a shared HTTP client.
pub struct Worker<C> {
    client: C,
    limits: LimitsConfig,
}

impl<C: HttpClient> Worker<C> {
    pub fn new(client: C, limits: LimitsConfig) -> Self {
        Self { client, limits }
    }

    /// Serve one call: read `inbound`, answer on `sink`.
    ///
    /// The sink receives exactly one write followed by one close on every path.
    pub async fn handle<R, E, S>(&self, verb: Verb, inbound: R, sink: S)
    where
        R: Stream<Item = Result<Bytes, E>> + Send,
        E: Display + Send,
        S: ResponseSink,
    {
        let call_id = Uuid::new_v4();
        let span = tracing::info_span!("call", %call_id, %verb);

        async move {
            let started = Instant::now();
            let guard = ResponseGuard::new(sink);

            let (tuple, outcome) = match AssertUnwindSafe(self.process(verb, inbound))
                .catch_unwind()
                .await
            {
                Ok(result) => result,
                Err(panic) => {
                    tracing::error!(
                        panic = panic_message(panic.as_ref()),
                        "Unhandled failure while serving call, report this problem to the urlfetcher maintainers"
                    );
                    (ResponseTuple::unexpected(), "unexpected")
                }
            };

            metrics::record_call(verb, outcome, started);
            guard.finish(&tuple);
        }
        .instrument(span)
        .await
    }

    async fn process<R, E>(&self, verb: Verb, inbound: R) -> (ResponseTuple, &'static str)
    where
        R: Stream<Item = Result<Bytes, E>> + Send,
        E: Display + Send,
    {
        let call = match self.prepare(verb, inbound).await {
            Ok(call) => call,
            Err(err) => {
                tracing::error!(error = %err, "Rejected malformed request");
                return (ResponseTuple::unexpected(), "malformed");
            }
        };

        let url = call.url.to_string();
        tracing::debug!(url = %url, method = call.method.as_str(), "Fetching");

        let outcome = execute(call, &self.client).await;
        report(&outcome, &url);

        let kind = outcome.kind();
        (classify(outcome), kind)
    }

    async fn prepare<R, E>(&self, verb: Verb, inbound: R) -> Result<OutgoingCall, CallError>
    where
        R: Stream<Item = Result<Bytes, E>> + Send,
        E: Display + Send,
    {
        let payload = read_payload(inbound, self.limits.max_payload_bytes).await?;
        let request = decode_request(&payload, verb)?;
        Ok(build(&request)?)
    }
}

/// Collect the inbound stream, refusing payloads larger than `limit`.
pub async fn read_payload<R, E>(inbound: R, limit: usize) -> Result<Vec<u8>, CallError>
where
    R: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    futures_util::pin_mut!(inbound);

    let mut payload = Vec::new();
    while let Some(chunk) = inbound.next().await {
        let chunk = chunk.map_err(|e| CallError::Read(e.to_string()))?;
        if payload.len() + chunk.len() > limit {
            return Err(CallError::PayloadTooLarge { limit });
        }
        payload.extend_from_slice(&chunk);
    }
    Ok(payload)
}

fn report(outcome: &FetchOutcome, url: &str) {
    match outcome {
        FetchOutcome::Success { status, .. } => {
            tracing::debug!(url, status, "Fetched");
        }
        FetchOutcome::HttpError { status, .. } => {
            tracing::info!(url, status, "HTTP error occurred while downloading");
        }
        FetchOutcome::TransportError { code } => {
            tracing::info!(url, code, "Network error occurred while downloading");
        }
        FetchOutcome::Unexpected { reason } => {
            tracing::error!(
                url,
                reason = %reason,
                "Unhandled error occurred while downloading, report this problem to the urlfetcher maintainers"
            );
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
