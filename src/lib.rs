//! URL fetching RPC worker library

pub mod config;
pub mod fetch;
pub mod lifecycle;
pub mod observability;
pub mod transport;
pub mod wire;
pub mod worker;

pub use config::WorkerConfig;
pub use fetch::ReqwestClient;
pub use lifecycle::Shutdown;
pub use transport::WorkerServer;
pub use wire::{ResponseTuple, Verb};
pub use worker::Worker;
