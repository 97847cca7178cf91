//! Blocking executor backed by ureq.

use std::io;
use std::time::Duration;

use ureq::Agent;

use super::{Transport, TransportFailure};
use crate::error::TransportErrorKind;
use crate::http::{canonical_reason, HttpMethod, HttpRequest, HttpResponse};

/// Sends requests on the calling thread with a shared ureq [`Agent`].
///
/// Status codes are returned as data; the error mapper decides what a 4xx or
/// 5xx means.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(
        &self,
        request: &HttpRequest,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, TransportFailure> {
        let url = request.url.as_str();
        let body = request.body.as_deref();

        // Header order is preserved, so the encoder's order reaches the wire.
        macro_rules! prepare {
            ($builder:expr) => {{
                let mut builder = $builder;
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.config().timeout_global(timeout).build()
            }};
        }

        let result = match request.method {
            HttpMethod::Get => match body {
                Some(bytes) => prepare!(self.agent.get(url)).force_send_body().send(bytes),
                None => prepare!(self.agent.get(url)).call(),
            },
            HttpMethod::Delete => match body {
                Some(bytes) => prepare!(self.agent.delete(url)).force_send_body().send(bytes),
                None => prepare!(self.agent.delete(url)).call(),
            },
            HttpMethod::Post => send_with_body(prepare!(self.agent.post(url)), body),
            HttpMethod::Put => send_with_body(prepare!(self.agent.put(url)), body),
            HttpMethod::Patch => send_with_body(prepare!(self.agent.patch(url)), body),
        };

        let mut response = result.map_err(|err| map_ureq_error(err, url))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        // ureq caps bodies at 10 MiB by default; reqwest has no cap.
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|err| map_ureq_error(err, url))?;

        Ok(HttpResponse {
            status,
            reason: canonical_reason(status),
            headers,
            body,
        })
    }
}

fn send_with_body(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<&[u8]>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(bytes) => builder.send(bytes),
        None => builder.send_empty(),
    }
}

fn map_ureq_error(err: ureq::Error, url: &str) -> TransportFailure {
    match err {
        ureq::Error::Timeout(_) => TransportFailure::TimedOut,
        ureq::Error::HostNotFound => {
            TransportFailure::failed(TransportErrorKind::Dns, format!("{err}: {url}"))
        }
        ureq::Error::ConnectionFailed => {
            TransportFailure::failed(TransportErrorKind::Connect, format!("{err}: {url}"))
        }
        ureq::Error::Io(io_err) => map_io_error(&io_err),
        ureq::Error::Tls(message) => TransportFailure::failed(TransportErrorKind::Tls, message),
        other => TransportFailure::failed(TransportErrorKind::Other, other.to_string()),
    }
}

fn map_io_error(err: &io::Error) -> TransportFailure {
    let kind = match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => return TransportFailure::TimedOut,
        io::ErrorKind::ConnectionRefused | io::ErrorKind::NotConnected => TransportErrorKind::Connect,
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::UnexpectedEof => TransportErrorKind::Reset,
        _ => TransportErrorKind::Other,
    };
    TransportFailure::failed(kind, err.to_string())
}
