//! Outbound fetch subsystem.
//!
//! # Data Flow
//! ```text
//! DecodedRequest
//!     → builder.rs (OutgoingCall: url, timeout, body, flattened headers)
//!     → executor.rs (one call through an HttpClient)
//!         → client.rs (reqwest; failures triaged into ClientFailure)
//!     → FetchOutcome (Success | HttpError | TransportError | Unexpected)
//!     → classify.rs (ResponseTuple, headers grouped by name)
//! ```
//!
//! # Design Decisions
//! - Exactly one outbound attempt per call; nothing here retries
//! - Header assembly is a pure function, testable without a network
//! - The HTTP client sits behind a trait so the executor can be driven by
//!   scripted clients in tests

pub mod builder;
pub mod classify;
pub mod client;
pub mod executor;
pub mod types;

pub use builder::{build, flatten_headers, BuildError};
pub use classify::{classify, group_headers};
pub use client::{HttpClient, ReqwestClient};
pub use executor::execute;
pub use types::{ClientFailure, FetchOutcome, HttpMethod, OutgoingCall, RawResponse};
