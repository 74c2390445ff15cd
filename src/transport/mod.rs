//! Transport binding subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum, one route per verb)
//!     → request body stream → Worker::handle
//!     → ChannelSink → response body stream
//!     → Send to caller
//! ```
//!
//! The RPC framework normally owns this layer; the axum binding keeps the
//! worker runnable on its own.

pub mod server;

pub use server::{build_router, WorkerServer, MSGPACK_CONTENT_TYPE};
