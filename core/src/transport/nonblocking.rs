//! Non-blocking executor backed by reqwest on the tokio runtime.

use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};

use super::{AsyncTransport, TransportFailure};
use crate::error::{ApiError, Result, TransportErrorKind};
use crate::http::{canonical_reason, HttpMethod, HttpRequest, HttpResponse};

/// Sends requests through a shared reqwest [`Client`].
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Use an existing reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn to_reqwest(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Patch => Method::PATCH,
    }
}

#[async_trait]
impl AsyncTransport for ReqwestTransport {
    async fn send(
        &self,
        request: &HttpRequest,
        timeout: Option<Duration>,
    ) -> std::result::Result<HttpResponse, TransportFailure> {
        let mut builder = self
            .client
            .request(to_reqwest(request.method), request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
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
        let body = response.bytes().await.map_err(map_reqwest_error)?.to_vec();

        Ok(HttpResponse {
            status,
            reason: canonical_reason(status),
            headers,
            body,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportFailure {
    if err.is_timeout() {
        return TransportFailure::TimedOut;
    }
    let message = error_chain(&err);
    let kind = if err.is_connect() {
        classify_connect(&message)
    } else if err.is_body() || err.is_request() {
        TransportErrorKind::Reset
    } else {
        TransportErrorKind::Other
    };
    TransportFailure::failed(kind, message)
}

/// reqwest only says "connect"; the source chain says whether it was DNS.
fn classify_connect(message: &str) -> TransportErrorKind {
    let lower = message.to_ascii_lowercase();
    if lower.contains("dns error") || lower.contains("failed to lookup address") {
        TransportErrorKind::Dns
    } else if lower.contains("tls") || lower.contains("certificate") {
        TransportErrorKind::Tls
    } else {
        TransportErrorKind::Connect
    }
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
