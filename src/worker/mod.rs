//! Request handling subsystem.
//!
//! # Data Flow
//! ```text
//! transport delivers (verb, inbound stream, sink)
//!     → handler.rs (read payload → decode → build → execute → classify)
//!     → sink.rs (ResponseGuard: encode, write once, close once)
//!     → transport streams the written bytes back
//! ```
//!
//! # Design Decisions
//! - One task per call; no state shared between calls except the client
//! - The guard's Drop answers calls that never reached `finish`

pub mod handler;
pub mod sink;

pub use handler::{read_payload, CallError, Worker};
pub use sink::{ChannelSink, ResponseGuard, ResponseSink};
