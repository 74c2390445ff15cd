//! Response channel and the exactly-once guard around it.

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::wire::codec::{encode_response, UNEXPECTED_RESPONSE};
use crate::wire::types::ResponseTuple;

/// Outbound half of a call, provided by the transport.
pub trait ResponseSink: Send {
    fn write(&mut self, payload: Bytes);
    fn close(&mut self);
}

/// Owns a sink until the call is answered.
///
/// `finish` writes the tuple and closes. If the guard is dropped unfinished
/// (the handler was cancelled or unwound), it answers with the unexpected
/// tuple instead, so the sink always sees one write and one close.
pub struct ResponseGuard<S: ResponseSink> {
    sink: Option<S>,
}

impl<S: ResponseSink> ResponseGuard<S> {
    pub fn new(sink: S) -> Self {
        Self { sink: Some(sink) }
    }

    /// Write `tuple` and close the sink.
    pub fn finish(mut self, tuple: &ResponseTuple) {
        if let Some(mut sink) = self.sink.take() {
            deliver(&mut sink, tuple);
        }
    }
}

impl<S: ResponseSink> Drop for ResponseGuard<S> {
    fn drop(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            tracing::error!("Call ended without a response, answering with an unexpected error");
            deliver(&mut sink, &ResponseTuple::unexpected());
        }
    }
}

fn deliver<S: ResponseSink>(sink: &mut S, tuple: &ResponseTuple) {
    let payload = match encode_response(tuple) {
        Ok(payload) => Bytes::from(payload),
        Err(err) => {
            tracing::error!(error = %err, "Failed to encode response tuple");
            Bytes::from_static(UNEXPECTED_RESPONSE)
        }
    };
    sink.write(payload);
    sink.close();
}

/// Sink backed by an unbounded channel. Closing drops the sender, which
/// ends the receiver's stream.
#[derive(Debug)]
pub struct ChannelSink {
    tx: Option<mpsc::UnboundedSender<Bytes>>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }
}

impl ResponseSink for ChannelSink {
    fn write(&mut self, payload: Bytes) {
        match &self.tx {
            Some(tx) => {
                if tx.send(payload).is_err() {
                    tracing::debug!("Caller went away before the response was written");
                }
            }
            None => tracing::warn!("Write on a closed response channel dropped"),
        }
    }

    fn close(&mut self) {
        self.tx = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::codec::decode_response;

    #[test]
    fn test_finish_writes_once_then_closes() {
        let (sink, mut rx) = ChannelSink::new();
        let guard = ResponseGuard::new(sink);
        let tuple = ResponseTuple {
            success: true,
            body: b"ok".to_vec(),
            code: 200,
            headers: Vec::new(),
        };
        guard.finish(&tuple);

        let payload = rx.try_recv().unwrap();
        assert_eq!(decode_response(&payload).unwrap(), tuple);
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_dropped_guard_answers_unexpected() {
        let (sink, mut rx) = ChannelSink::new();
        drop(ResponseGuard::new(sink));

        let payload = rx.try_recv().unwrap();
        assert_eq!(&payload[..], UNEXPECTED_RESPONSE);
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_write_after_close_is_dropped() {
        let (mut sink, mut rx) = ChannelSink::new();
        sink.close();
        sink.write(Bytes::from_static(b"late"));
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }
}
