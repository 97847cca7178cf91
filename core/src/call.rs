//! Lifecycle of one API call, shared by both execution modes.
//!
//! # Design
//! A call walks `Building → Authenticating → Dispatching → Decoding → Done`,
//! or drops into `Failed` from any non-terminal state. Everything except the
//! transport exchange is synchronous and identical for both modes; the two
//! `run_*` entry points differ only in how they wait on the transport.
//!
//! `Call` is consumed by `run_blocking`/`run_async`, so a call object cannot
//! be dispatched twice.

use std::time::{Duration, Instant};

use tracing::{debug, trace, warn, Instrument, Span};
use uuid::Uuid;

use crate::auth;
use crate::config::ClientConfig;
use crate::decode::{self, Envelope, ResponseShape};
use crate::descriptor::RequestDescriptor;
use crate::error::{ApiError, ErrorKind, Result};
use crate::http::{HttpRequest, HttpResponse};
use crate::mapper;
use crate::transport::{self, AsyncTransport, Transport, TransportFailure};

/// Where a call currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Building,
    Authenticating,
    Dispatching,
    Decoding,
    Failed,
    Done,
}

impl CallState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: CallState) -> bool {
        use CallState::*;
        match (self, next) {
            (Building, Authenticating)
            | (Authenticating, Dispatching)
            | (Dispatching, Decoding)
            | (Decoding, Done) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

pub(crate) struct Call<'c> {
    config: &'c ClientConfig,
    state: CallState,
    span: Span,
}

impl<'c> Call<'c> {
    pub(crate) fn new<R>(config: &'c ClientConfig, descriptor: &RequestDescriptor<R>) -> Self {
        let id = Uuid::new_v4();
        let span = tracing::debug_span!(
            "api_call",
            call_id = %id,
            method = %descriptor.method(),
            path = %descriptor.resource_path(),
        );
        Self {
            config,
            state: CallState::Building,
            span,
        }
    }

    pub(crate) fn run_blocking<R: ResponseShape>(
        mut self,
        descriptor: RequestDescriptor<R>,
        transport: &dyn Transport,
    ) -> Result<Envelope<R>> {
        let span = self.span.clone();
        let _entered = span.enter();

        let result = match self.prepare(descriptor) {
            Ok((request, timeout)) => {
                let started = Instant::now();
                let outcome = transport.send(&request, timeout);
                self.complete(outcome, started.elapsed())
            }
            Err(err) => Err(err),
        };
        self.conclude(result)
    }

    pub(crate) async fn run_async<R: ResponseShape>(
        mut self,
        descriptor: RequestDescriptor<R>,
        transport: &dyn AsyncTransport,
    ) -> Result<Envelope<R>> {
        let span = self.span.clone();
        async move {
            let result = match self.prepare(descriptor) {
                Ok((request, timeout)) => {
                    let started = Instant::now();
                    let outcome = send_with_deadline(transport, &request, timeout).await;
                    self.complete(outcome, started.elapsed())
                }
                Err(err) => Err(err),
            };
            self.conclude(result)
        }
        .instrument(span)
        .await
    }

    fn advance(&mut self, next: CallState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal call transition {:?} -> {:?}",
            self.state,
            next
        );
        trace!(from = ?self.state, to = ?next, "call state");
        self.state = next;
    }

    /// Building and authenticating: everything up to the wire request.
    fn prepare<R>(
        &mut self,
        descriptor: RequestDescriptor<R>,
    ) -> Result<(HttpRequest, Option<Duration>)> {
        let path = descriptor.resource_path();
        if path.contains('{') || path.contains('}') {
            return Err(ApiError::UnresolvedPlaceholder {
                path: path.to_string(),
            });
        }

        self.advance(CallState::Authenticating);
        let descriptor = auth::apply(descriptor, self.config.credentials.as_ref())?;
        let timeout = descriptor.timeout().or(self.config.timeout);
        let request = transport::encode(&descriptor, self.config)?;

        self.advance(CallState::Dispatching);
        debug!(url = %request.url, timeout = ?timeout, "dispatching request");
        Ok((request, timeout))
    }

    fn complete<R: ResponseShape>(
        &mut self,
        outcome: std::result::Result<HttpResponse, TransportFailure>,
        elapsed: Duration,
    ) -> Result<Envelope<R>> {
        let response = outcome.map_err(|failure| mapper::map_transport_failure(failure, elapsed))?;
        debug!(
            status = response.status,
            latency_ms = elapsed.as_millis() as u64,
            bytes = response.body.len(),
            "response received"
        );

        self.advance(CallState::Decoding);
        let envelope = decode::decode_response::<R>(response)?;
        self.advance(CallState::Done);
        Ok(envelope)
    }

    fn conclude<T>(mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            let failed_in = self.state;
            self.advance(CallState::Failed);
            match err.kind() {
                ErrorKind::Build | ErrorKind::Auth => {
                    debug!(state = ?failed_in, error = %err, "call rejected before dispatch")
                }
                ErrorKind::Status => warn!(status = err.status(), error = %err, "api returned an error"),
                _ => warn!(state = ?failed_in, error = %err, "call failed"),
            }
        }
        result
    }
}

/// The engine enforces the deadline around the future as well, so a custom
/// transport that ignores `timeout` still fails with `TransportTimeout`.
async fn send_with_deadline(
    transport: &dyn AsyncTransport,
    request: &HttpRequest,
    timeout: Option<Duration>,
) -> std::result::Result<HttpResponse, TransportFailure> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, transport.send(request, timeout))
            .await
            .unwrap_or(Err(TransportFailure::TimedOut)),
        None => transport.send(request, None).await,
    }
}
