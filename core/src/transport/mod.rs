//! Transport executors and the wire encoder they share.
//!
//! # Design
//! [`encode`] is the only code that turns a descriptor into wire content:
//! URL, query string, header list and body bytes. Both executors receive the
//! resulting [`HttpRequest`] and write it out verbatim, which is what keeps
//! the blocking and non-blocking paths wire-identical. The executors only
//! differ in how they wait for the network.
//!
//! Executors return a neutral [`TransportFailure`]; the engine measures
//! elapsed time and turns it into an `ApiError` through the error mapper.

mod blocking;
mod nonblocking;

use std::time::Duration;

use async_trait::async_trait;
use url::form_urlencoded;

use crate::config::ClientConfig;
use crate::descriptor::{render_param, QueryParams, QueryValue, RequestDescriptor};
use crate::error::{ApiError, Result, TransportErrorKind};
use crate::http::{HttpRequest, HttpResponse};

pub use blocking::UreqTransport;
pub use nonblocking::ReqwestTransport;

/// A failure below the HTTP layer: the server did not answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    TimedOut,
    Failed {
        kind: TransportErrorKind,
        message: String,
    },
}

impl TransportFailure {
    pub fn failed(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self::Failed {
            kind,
            message: message.into(),
        }
    }
}

/// Blocking executor. Runs on the calling thread and returns once the whole
/// body has been read.
///
/// Implementations must be safe to share between threads; the engine calls
/// `send` concurrently from as many threads as the caller uses.
pub trait Transport: Send + Sync {
    /// Send `request` and read the whole response.
    ///
    /// `timeout` bounds the entire exchange, connect through the last body
    /// byte. The engine does not enforce it on this path, so an
    /// implementation must honour it itself and report expiry as
    /// [`TransportFailure::TimedOut`]. `None` means no limit.
    fn send(
        &self,
        request: &HttpRequest,
        timeout: Option<Duration>,
    ) -> std::result::Result<HttpResponse, TransportFailure>;
}

/// Non-blocking executor. The returned future is the only suspension point
/// of a call; dropping it aborts the exchange.
#[async_trait]
pub trait AsyncTransport: Send + Sync {
    /// Send `request` and read the whole response.
    ///
    /// The engine also races this future against `timeout`, so an
    /// implementation that ignores it still times out. Reporting expiry as
    /// [`TransportFailure::TimedOut`] keeps the error the same either way.
    async fn send(
        &self,
        request: &HttpRequest,
        timeout: Option<Duration>,
    ) -> std::result::Result<HttpResponse, TransportFailure>;
}

/// Encode a descriptor into the exact request both executors send.
///
/// Header order: `Accept`, `User-Agent`, config defaults, descriptor
/// headers, `Content-Type` (with a body), `Authorization` (when attached).
/// A later header replaces an earlier one of the same name.
pub fn encode<R>(descriptor: &RequestDescriptor<R>, config: &ClientConfig) -> Result<HttpRequest> {
    let mut url = config.base_url.clone();
    if !descriptor.resource_path().starts_with('/') {
        url.push('/');
    }
    url.push_str(descriptor.resource_path());
    let query = encode_query(descriptor.query_params());
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query);
    }

    let mut headers = Vec::new();
    set_header(&mut headers, "Accept", "application/json");
    set_header(&mut headers, "User-Agent", &config.user_agent);
    for (name, value) in config.default_headers.iter().chain(descriptor.header_params()) {
        set_header(&mut headers, name, value);
    }

    let body = match descriptor.body() {
        Some(value) => {
            set_header(&mut headers, "Content-Type", "application/json");
            Some(serde_json::to_vec(value).map_err(|e| ApiError::Serialization(e.to_string()))?)
        }
        None => None,
    };

    if let Some(authorization) = descriptor.authorization() {
        set_header(&mut headers, "Authorization", authorization);
    }

    Ok(HttpRequest {
        method: descriptor.method(),
        url,
        headers,
        body,
    })
}

/// `application/x-www-form-urlencoded` query string, in insertion order.
pub fn encode_query(params: &QueryParams) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params.iter() {
        match value {
            QueryValue::Scalar(value) => {
                serializer.append_pair(key, &render_param(value));
            }
            QueryValue::Flattened(values, format) => match format.separator() {
                None => {
                    for value in values {
                        serializer.append_pair(key, &render_param(value));
                    }
                }
                Some(separator) => {
                    let joined: Vec<String> = values.iter().map(render_param).collect();
                    serializer.append_pair(key, &joined.join(separator));
                }
            },
        }
    }
    serializer.finish()
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
    headers.push((name.to_string(), value.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{self, AuthScheme, Credentials};
    use crate::descriptor::CollectionFormat;
    use crate::http::HttpMethod;
    use serde_json::Value;

    fn config() -> ClientConfig {
        ClientConfig::new("http://localhost:3000/")
    }

    #[test]
    fn none_filtered_query_keeps_only_present_keys() {
        let descriptor: RequestDescriptor<Value> =
            RequestDescriptor::builder(HttpMethod::Get, "/api/v1/entries")
                .query_opt("a", Some(1))
                .query_opt("b", None::<i64>)
                .query_opt("c", Some("x"))
                .build()
                .unwrap();
        let request = encode(&descriptor, &config()).unwrap();
        assert_eq!(request.url, "http://localhost:3000/api/v1/entries?a=1&c=x");
    }

    #[test]
    fn booleans_and_dates_are_rendered_on_the_wire() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let descriptor: RequestDescriptor<Value> =
            RequestDescriptor::builder(HttpMethod::Get, "/api/v1/members")
                .query("showActivityData", true)
                .query("registerDateStart", date)
                .query("name", "Ana Maria")
                .build()
                .unwrap();
        let request = encode(&descriptor, &config()).unwrap();
        assert_eq!(
            request.query(),
            Some("showActivityData=true&registerDateStart=2024-01-31&name=Ana+Maria")
        );
    }

    #[test]
    fn collections_follow_their_format() {
        let descriptor: RequestDescriptor<Value> =
            RequestDescriptor::builder(HttpMethod::Get, "/api/v1/members")
                .query_list("idsMembers", [1, 2, 3], CollectionFormat::Csv)
                .query_list("tag", ["a", "b"], CollectionFormat::Multi)
                .query_list("p", ["x", "y"], CollectionFormat::Pipes)
                .build()
                .unwrap();
        let request = encode(&descriptor, &config()).unwrap();
        assert_eq!(request.query(), Some("idsMembers=1%2C2%2C3&tag=a&tag=b&p=x%7Cy"));
    }

    #[test]
    fn headers_come_out_in_a_fixed_order() {
        let credentials = Credentials::new("gym", "secret");
        let descriptor: RequestDescriptor<bool> =
            RequestDescriptor::builder(HttpMethod::Post, "/api/v1/webhook")
                .header("X-Request-Source", "tests")
                .raw_body(serde_json::json!({"eventType": "NewSale"}))
                .auth(AuthScheme::Basic)
                .build()
                .unwrap();
        let descriptor = auth::apply(descriptor, Some(&credentials)).unwrap();
        let request = encode(&descriptor, &config().default_header("X-Branch", "1")).unwrap();

        let names: Vec<&str> = request.headers.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["Accept", "User-Agent", "X-Branch", "X-Request-Source", "Content-Type", "Authorization"]
        );
        assert_eq!(request.header("authorization"), Some(credentials.basic_header_value().as_str()));
        assert_eq!(request.body.as_deref(), Some(br#"{"eventType":"NewSale"}"#.as_slice()));
    }

    #[test]
    fn descriptor_header_overrides_default() {
        let descriptor: RequestDescriptor<Value> =
            RequestDescriptor::builder(HttpMethod::Get, "/api/v1/members")
                .header("accept", "text/plain")
                .build()
                .unwrap();
        let request = encode(&descriptor, &config()).unwrap();
        assert_eq!(request.header("Accept"), Some("text/plain"));
        assert_eq!(request.headers.iter().filter(|(n, _)| n.eq_ignore_ascii_case("accept")).count(), 1);
    }

    #[test]
    fn no_body_means_no_content_type() {
        let descriptor: RequestDescriptor<()> =
            RequestDescriptor::builder(HttpMethod::Delete, "api/v1/webhook")
                .query("IdWebhook", 4)
                .build()
                .unwrap();
        let request = encode(&descriptor, &config()).unwrap();
        assert_eq!(request.url, "http://localhost:3000/api/v1/webhook?IdWebhook=4");
        assert!(request.body.is_none());
        assert!(request.header("content-type").is_none());
    }
}
