//! axum binding for the call handlers.
//!
//! # Responsibilities
//! - Register one route per verb (`POST /get`, `POST /post`)
//! - Feed the request body to the worker as the inbound stream
//! - Stream whatever the worker writes to its sink back as the response body
//! - Serve until the shutdown signal, then drain

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::fetch::client::HttpClient;
use crate::lifecycle::shutdown;
use crate::wire::types::Verb;
use crate::worker::{ChannelSink, Worker};

/// Content type of request and response payloads.
pub const MSGPACK_CONTENT_TYPE: &str = "application/msgpack";

/// Transport server for the worker.
pub struct WorkerServer {
    router: Router,
}

impl WorkerServer {
    /// Create a server dispatching to `worker`.
    pub fn new<C: HttpClient>(worker: Arc<Worker<C>>) -> Self {
        Self {
            router: build_router(worker),
        }
    }

    /// The router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Worker transport starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("Worker transport stopped");
        Ok(())
    }
}

/// Build the router with one route per verb.
pub fn build_router<C: HttpClient>(worker: Arc<Worker<C>>) -> Router {
    Router::new()
        .route("/get", post(get_handler::<C>))
        .route("/post", post(post_handler::<C>))
        .with_state(worker)
        .layer(TraceLayer::new_for_http())
}

async fn get_handler<C: HttpClient>(
    State(worker): State<Arc<Worker<C>>>,
    body: Body,
) -> Response {
    dispatch(worker, Verb::Get, body)
}

async fn post_handler<C: HttpClient>(
    State(worker): State<Arc<Worker<C>>>,
    body: Body,
) -> Response {
    dispatch(worker, Verb::Post, body)
}

/// Run the call on its own task and stream its sink back.
///
/// The task owns the call; a caller hanging up does not cancel the fetch.
fn dispatch<C: HttpClient>(worker: Arc<Worker<C>>, verb: Verb, body: Body) -> Response {
    let (sink, rx) = ChannelSink::new();
    let inbound = body.into_data_stream();

    tokio::spawn(async move {
        worker.handle(verb, inbound, sink).await;
    });

    let outbound = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|chunk| (Ok::<_, Infallible>(chunk), rx))
    });

    ([(CONTENT_TYPE, MSGPACK_CONTENT_TYPE)], Body::from_stream(outbound)).into_response()
}
