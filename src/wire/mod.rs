//! Wire format subsystem.
//!
//! # Data Flow
//! ```text
//! inbound payload (MessagePack array)
//!     → codec.rs (decode_request, schema picked by verb)
//!     → types.rs (GetRequest / PostRequest)
//!     → [fetch pipeline]
//!     → types.rs (ResponseTuple)
//!     → codec.rs (encode_response)
//!     → outbound sink
//! ```
//!
//! # Design Decisions
//! - Fields are positional; optional slots only ever extend the prefix
//! - One typed struct per verb instead of indexing an untyped array
//! - Maps keep wire order (Vec of pairs), never re-sorted

pub mod codec;
pub mod types;

pub use codec::{
    decode_request, decode_response, encode_request, encode_response, CodecError,
    UNEXPECTED_RESPONSE,
};
pub use types::{
    Cookies, DecodedRequest, GetRequest, HeaderMultiMap, PostRequest, RequestOptions,
    ResponseTuple, Verb,
};
