//! HTTP client boundary.
//!
//! # Responsibilities
//! - Define the `HttpClient` seam the executor calls through
//! - Issue calls with reqwest, honoring per-call timeout and redirect choice
//! - Triage every reqwest failure into a `ClientFailure`
//!
//! # Design Decisions
//! - Redirect policy is fixed per reqwest client, so two clients are kept:
//!   one following redirects, one returning 3xx responses as they are
//! - Client-side failures report status 599, like curl-based fetchers
//! - Resolver failures carry no OS code; they report `EAI_NONAME`
//! - Response header names are canonicalized to `Title-Case`

use std::error::Error as StdError;
use std::future::Future;
use std::io;
use std::time::Duration;

use reqwest::redirect::Policy;

use crate::config::ClientConfig;
use crate::fetch::types::{ClientFailure, HttpMethod, OutgoingCall, RawResponse};

/// Status reported when the call failed on the client side without a
/// usable response: timeouts, redirect loops, broken transfers.
pub const CLIENT_ERROR_STATUS: u16 = 599;

/// `getaddrinfo` "name or service not known".
pub const EAI_NONAME: i32 = -2;

/// Performs one outbound call. Shared by all in-flight calls.
pub trait HttpClient: Send + Sync + 'static {
    fn send(
        &self,
        call: OutgoingCall,
    ) -> impl Future<Output = Result<RawResponse, ClientFailure>> + Send;
}

/// reqwest-backed `HttpClient`.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    following: reqwest::Client,
    direct: reqwest::Client,
    follow_by_default: bool,
}

impl ReqwestClient {
    /// Build both underlying clients from configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let base = || {
            let mut builder = reqwest::Client::builder();
            if config.connect_timeout_ms > 0 {
                builder = builder.connect_timeout(Duration::from_millis(config.connect_timeout_ms));
            }
            if let Some(user_agent) = &config.user_agent {
                builder = builder.user_agent(user_agent.clone());
            }
            if !config.use_system_proxy {
                builder = builder.no_proxy();
            }
            builder
        };

        Ok(Self {
            following: base().redirect(Policy::limited(config.max_redirects)).build()?,
            direct: base().redirect(Policy::none()).build()?,
            follow_by_default: config.follow_redirects_by_default,
        })
    }

    fn client_for(&self, follow_redirects: Option<bool>) -> &reqwest::Client {
        if follow_redirects.unwrap_or(self.follow_by_default) {
            &self.following
        } else {
            &self.direct
        }
    }
}

impl HttpClient for ReqwestClient {
    async fn send(&self, call: OutgoingCall) -> Result<RawResponse, ClientFailure> {
        let method = match call.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };

        let mut request = self.client_for(call.follow_redirects).request(method, call.url);
        if let Some(timeout) = call.timeout {
            request = request.timeout(timeout);
        }
        for (name, value) in call.headers {
            request = request.header(name, value);
        }
        if let Some(body) = call.body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(triage)?;
        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    canonical_header_name(name.as_str()),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        match response.bytes().await {
            Ok(body) => Ok(RawResponse {
                status,
                headers,
                body: body.to_vec(),
            }),
            Err(err) => {
                tracing::debug!(status, error = %error_chain(&err), "Response body broke off");
                Err(ClientFailure::Status {
                    status: CLIENT_ERROR_STATUS,
                    response: Some(RawResponse {
                        status,
                        headers,
                        body: Vec::new(),
                    }),
                })
            }
        }
    }
}

/// Sort a reqwest failure into one of the three failure classes.
///
/// Failures caused by the remote side that leave no status (timeouts,
/// redirect loops, broken transfers, TLS) report `CLIENT_ERROR_STATUS`.
/// `Other` is left for errors in how the worker used the client.
pub fn triage(err: reqwest::Error) -> ClientFailure {
    if err.is_timeout() {
        return client_error();
    }
    if err.is_connect() {
        return connect_failure(&err);
    }
    if let Some(status) = err.status() {
        return ClientFailure::Status {
            status: status.as_u16(),
            response: None,
        };
    }
    if err.is_redirect() || err.is_body() || err.is_decode() || err.is_request() {
        return client_error();
    }
    ClientFailure::Other {
        reason: error_chain(&err),
    }
}

fn client_error() -> ClientFailure {
    ClientFailure::Status {
        status: CLIENT_ERROR_STATUS,
        response: None,
    }
}

/// A connect-phase failure: an OS code when the socket layer gave one,
/// `EAI_NONAME` when the resolver failed, else a client error.
fn connect_failure(err: &(dyn StdError + 'static)) -> ClientFailure {
    if let Some(code) = os_error_code(err) {
        return ClientFailure::Connect { code };
    }
    if is_resolution_failure(err) {
        return ClientFailure::Connect { code: EAI_NONAME };
    }
    client_error()
}

fn is_resolution_failure(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        let message = err.to_string();
        if message.contains("dns error") || message.contains("failed to lookup address") {
            return true;
        }
        current = err.source();
    }
    false
}

/// `content-type` → `Content-Type`.
pub fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    let mut word = first.to_ascii_uppercase().to_string();
                    word.push_str(&chars.as_str().to_ascii_lowercase());
                    word
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// First OS error code found walking the source chain.
fn os_error_code(err: &(dyn StdError + 'static)) -> Option<i32> {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(code) = err.downcast_ref::<io::Error>().and_then(io::Error::raw_os_error) {
            return Some(code);
        }
        current = err.source();
    }
    None
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        current = cause.source();
    }
    message
}
