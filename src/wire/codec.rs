//! MessagePack codec for the positional request schemas and the response tuple.
//!
//! # Responsibilities
//! - Decode `[url, (body,) timeout_ms, cookies?, headers?, follow_redirects?]`
//! - Encode `[success, body, code, headers]`
//! - Report every schema violation as a `CodecError`
//!
//! # Design Decisions
//! - `str` and `bin` are interchangeable for text and body slots; older
//!   callers pack everything as raw strings
//! - `nil` in an optional slot means "absent", so callers can pad to reach a
//!   later slot
//! - Anything past the last known slot is ignored

use rmpv::Value;

use crate::wire::types::{
    Cookies, DecodedRequest, GetRequest, HeaderMultiMap, PostRequest, RequestOptions,
    ResponseTuple, Verb,
};

/// Pre-encoded `(false, "", 0, {})`.
///
/// Written when a tuple cannot be encoded, so a call is always answered.
pub const UNEXPECTED_RESPONSE: &[u8] = &[0x94, 0xc2, 0xc4, 0x00, 0x00, 0x80];

/// Errors raised while decoding or encoding wire payloads.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("payload is not valid MessagePack: {0}")]
    Decode(#[from] rmpv::decode::Error),

    #[error("failed to encode MessagePack: {0}")]
    Encode(#[from] rmpv::encode::Error),

    #[error("{0} unexpected bytes after the payload")]
    TrailingBytes(usize),

    #[error("payload must be an array, got {0}")]
    NotAnArray(&'static str),

    #[error("missing mandatory field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` must be {expected}, got {actual}")]
    WrongShape {
        field: &'static str,
        expected: &'static str,
        actual: &'static str,
    },
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Decode an inbound payload using the schema of `verb`.
pub fn decode_request(payload: &[u8], verb: Verb) -> CodecResult<DecodedRequest> {
    let mut fields = read_array(payload)?.into_iter();

    let url = text(required(&mut fields, "url")?, "url")?;
    let request = match verb {
        Verb::Get => {
            let timeout_ms = unsigned(required(&mut fields, "timeout_ms")?, "timeout_ms")?;
            DecodedRequest::Get(GetRequest {
                url,
                timeout_ms,
                options: decode_options(fields)?,
            })
        }
        Verb::Post => {
            let body = binary(required(&mut fields, "body")?, "body")?;
            let timeout_ms = unsigned(required(&mut fields, "timeout_ms")?, "timeout_ms")?;
            DecodedRequest::Post(PostRequest {
                url,
                body,
                timeout_ms,
                options: decode_options(fields)?,
            })
        }
    };

    Ok(request)
}

/// Encode a request the way a caller would put it on the wire.
///
/// Optional slots form a contiguous prefix; an absent slot that precedes a
/// present one is written as an empty map.
pub fn encode_request(request: &DecodedRequest) -> CodecResult<Vec<u8>> {
    let mut fields = vec![Value::from(request.url())];
    if let Some(body) = request.body() {
        fields.push(Value::Binary(body.to_vec()));
    }
    fields.push(Value::from(request.timeout_ms()));

    let options = request.options();
    let slots = if options.follow_redirects.is_some() {
        3
    } else if options.headers.is_some() {
        2
    } else if options.cookies.is_some() {
        1
    } else {
        0
    };

    if slots >= 1 {
        let cookies = options.cookies.as_deref().unwrap_or_default();
        fields.push(Value::Map(
            cookies
                .iter()
                .map(|(name, value)| (Value::from(name.as_str()), Value::from(value.as_str())))
                .collect(),
        ));
    }
    if slots >= 2 {
        fields.push(header_map(options.headers.as_deref().unwrap_or_default()));
    }
    if let Some(follow) = options.follow_redirects {
        fields.push(Value::Boolean(follow));
    }

    write(&Value::Array(fields))
}

/// Encode the four-field response tuple.
pub fn encode_response(tuple: &ResponseTuple) -> CodecResult<Vec<u8>> {
    write(&Value::Array(vec![
        Value::Boolean(tuple.success),
        Value::Binary(tuple.body.clone()),
        Value::from(tuple.code),
        header_map(&tuple.headers),
    ]))
}

/// Decode a response tuple, as a caller of the worker would.
pub fn decode_response(payload: &[u8]) -> CodecResult<ResponseTuple> {
    let mut fields = read_array(payload)?.into_iter();

    let success = match required(&mut fields, "success")? {
        Value::Boolean(b) => b,
        other => return Err(wrong_shape("success", "a boolean", &other)),
    };
    let body = binary(required(&mut fields, "body")?, "body")?;
    let code = match required(&mut fields, "code")? {
        Value::Integer(i) => i
            .as_i64()
            .ok_or(CodecError::WrongShape {
                field: "code",
                expected: "a 64-bit integer",
                actual: "an out of range integer",
            })?,
        other => return Err(wrong_shape("code", "an integer", &other)),
    };
    let headers = decode_headers(required(&mut fields, "headers")?)?;

    Ok(ResponseTuple {
        success,
        body,
        code,
        headers,
    })
}

fn read_array(payload: &[u8]) -> CodecResult<Vec<Value>> {
    let mut reader = payload;
    let value = rmpv::decode::read_value(&mut reader)?;
    if !reader.is_empty() {
        return Err(CodecError::TrailingBytes(reader.len()));
    }

    match value {
        Value::Array(items) => Ok(items),
        other => Err(CodecError::NotAnArray(kind(&other))),
    }
}

fn write(value: &Value) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::new();
    rmpv::encode::write_value(&mut buf, value)?;
    Ok(buf)
}

fn decode_options(mut rest: impl Iterator<Item = Value>) -> CodecResult<RequestOptions> {
    let cookies = optional(rest.next()).map(decode_cookies).transpose()?;
    let headers = optional(rest.next()).map(decode_headers).transpose()?;
    let follow_redirects = optional(rest.next())
        .map(|value| match value {
            Value::Boolean(b) => Ok(b),
            other => Err(wrong_shape("follow_redirects", "a boolean", &other)),
        })
        .transpose()?;

    Ok(RequestOptions {
        cookies,
        headers,
        follow_redirects,
    })
}

fn decode_cookies(value: Value) -> CodecResult<Cookies> {
    match value {
        Value::Map(entries) => entries
            .into_iter()
            .map(|(name, value)| Ok((text(name, "cookies")?, text(value, "cookies")?)))
            .collect(),
        other => Err(wrong_shape("cookies", "a map", &other)),
    }
}

fn decode_headers(value: Value) -> CodecResult<HeaderMultiMap> {
    match value {
        Value::Map(entries) => entries
            .into_iter()
            .map(|(name, values)| {
                let name = text(name, "headers")?;
                let values = match values {
                    Value::Array(items) => items
                        .into_iter()
                        .map(|item| text(item, "headers"))
                        .collect::<CodecResult<Vec<_>>>()?,
                    other => return Err(wrong_shape("headers", "a list of strings per name", &other)),
                };
                Ok((name, values))
            })
            .collect(),
        other => Err(wrong_shape("headers", "a map", &other)),
    }
}

fn header_map(headers: &[(String, Vec<String>)]) -> Value {
    Value::Map(
        headers
            .iter()
            .map(|(name, values)| {
                (
                    Value::from(name.as_str()),
                    Value::Array(values.iter().map(|v| Value::from(v.as_str())).collect()),
                )
            })
            .collect(),
    )
}

fn required(fields: &mut impl Iterator<Item = Value>, field: &'static str) -> CodecResult<Value> {
    fields.next().ok_or(CodecError::MissingField(field))
}

fn optional(slot: Option<Value>) -> Option<Value> {
    slot.filter(|value| !value.is_nil())
}

fn text(value: Value, field: &'static str) -> CodecResult<String> {
    match value {
        Value::String(s) => s.into_str().ok_or(CodecError::WrongShape {
            field,
            expected: "UTF-8 text",
            actual: "invalid UTF-8",
        }),
        Value::Binary(bytes) => String::from_utf8(bytes).map_err(|_| CodecError::WrongShape {
            field,
            expected: "UTF-8 text",
            actual: "invalid UTF-8",
        }),
        other => Err(wrong_shape(field, "a string", &other)),
    }
}

fn binary(value: Value, field: &'static str) -> CodecResult<Vec<u8>> {
    match value {
        Value::Binary(bytes) => Ok(bytes),
        Value::String(s) => Ok(s.into_bytes()),
        other => Err(wrong_shape(field, "bytes", &other)),
    }
}

fn unsigned(value: Value, field: &'static str) -> CodecResult<u64> {
    match value {
        Value::Integer(i) => i.as_u64().ok_or(CodecError::WrongShape {
            field,
            expected: "a non-negative integer",
            actual: "a negative integer",
        }),
        other => Err(wrong_shape(field, "a non-negative integer", &other)),
    }
}

fn wrong_shape(field: &'static str, expected: &'static str, actual: &Value) -> CodecError {
    CodecError::WrongShape {
        field,
        expected,
        actual: kind(actual),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Nil => "nil",
        Value::Boolean(_) => "a boolean",
        Value::Integer(_) => "an integer",
        Value::F32(_) | Value::F64(_) => "a float",
        Value::String(_) => "a string",
        Value::Binary(_) => "bytes",
        Value::Array(_) => "an array",
        Value::Map(_) => "a map",
        Value::Ext(..) => "an extension value",
    }
}
