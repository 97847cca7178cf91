//! The dual-mode request engine.
//!
//! # Design
//! `ApiClient` holds an immutable configuration snapshot and one executor
//! per mode behind an `Arc`, so clones are cheap and may be used from many
//! threads or tasks at once. Every entry point takes a finished
//! [`RequestDescriptor`]; builder, auth injection, wire encoding, decoding
//! and error mapping run the same code in both modes (see `call`).
//!
//! Blocking calls run on the caller's thread and cannot be cancelled.
//! Async calls suspend only inside the transport; [`ApiClient::spawn`]
//! returns a [`PendingCall`] that can be aborted while in flight.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use crate::api::{EntriesApi, MembersApi, ReceivablesApi, SalesApi, WebhooksApi};
use crate::call::Call;
use crate::config::ClientConfig;
use crate::decode::{Envelope, ResponseShape};
use crate::descriptor::RequestDescriptor;
use crate::error::{ApiError, Result};
use crate::transport::{AsyncTransport, ReqwestTransport, Transport, UreqTransport};

struct Inner {
    config: ClientConfig,
    blocking: Box<dyn Transport>,
    nonblocking: Box<dyn AsyncTransport>,
}

/// Client for the gym-management API.
///
/// ```ignore
/// let client = ApiClient::new(
///     ClientConfig::new("https://evo-integracao.w12app.com.br").credentials("gym", "secret"),
/// )?;
/// let member = client.members().get(42)?;
/// let entries = client.entries().list_async(&EntriesQuery::default()).await?;
/// ```
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl ApiClient {
    /// Validate `config` and create a client with the default ureq and
    /// reqwest executors.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let nonblocking = ReqwestTransport::new()?;
        Ok(Self::with_transports(config, UreqTransport::new(), nonblocking))
    }

    /// Create a client from `GYM_API_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Create a client with custom executors. `config` is used as given.
    pub fn with_transports<B, A>(config: ClientConfig, blocking: B, nonblocking: A) -> Self
    where
        B: Transport + 'static,
        A: AsyncTransport + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                config,
                blocking: Box::new(blocking),
                nonblocking: Box::new(nonblocking),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Run a call on the current thread and return the decoded value.
    pub fn execute<R: ResponseShape>(&self, descriptor: RequestDescriptor<R>) -> Result<R> {
        self.execute_envelope(descriptor).map(Envelope::into_value)
    }

    /// Run a call on the current thread and return status, headers, raw
    /// body and decoded value.
    pub fn execute_envelope<R: ResponseShape>(
        &self,
        descriptor: RequestDescriptor<R>,
    ) -> Result<Envelope<R>> {
        let call = Call::new(&self.inner.config, &descriptor);
        call.run_blocking(descriptor, self.inner.blocking.as_ref())
    }

    pub async fn execute_async<R: ResponseShape>(
        &self,
        descriptor: RequestDescriptor<R>,
    ) -> Result<R> {
        self.execute_envelope_async(descriptor)
            .await
            .map(Envelope::into_value)
    }

    pub async fn execute_envelope_async<R: ResponseShape>(
        &self,
        descriptor: RequestDescriptor<R>,
    ) -> Result<Envelope<R>> {
        let call = Call::new(&self.inner.config, &descriptor);
        call.run_async(descriptor, self.inner.nonblocking.as_ref())
            .await
    }

    /// Start an async call on the tokio runtime and return a handle to it.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime, like `tokio::spawn`.
    pub fn spawn<R>(&self, descriptor: RequestDescriptor<R>) -> PendingCall<R>
    where
        R: ResponseShape + Send + 'static,
    {
        let client = self.clone();
        let handle = tokio::spawn(async move { client.execute_async(descriptor).await });
        PendingCall { handle }
    }

    pub fn entries(&self) -> EntriesApi<'_> {
        EntriesApi::new(self)
    }

    pub fn members(&self) -> MembersApi<'_> {
        MembersApi::new(self)
    }

    pub fn sales(&self) -> SalesApi<'_> {
        SalesApi::new(self)
    }

    pub fn receivables(&self) -> ReceivablesApi<'_> {
        ReceivablesApi::new(self)
    }

    pub fn webhooks(&self) -> WebhooksApi<'_> {
        WebhooksApi::new(self)
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// An async call running on the tokio runtime.
///
/// Await it for the result. [`PendingCall::cancel`] aborts the network
/// exchange; the response is then never decoded and the call resolves to
/// [`ApiError::Cancelled`]. Dropping the handle does not cancel the call.
#[must_use = "a PendingCall does nothing useful unless awaited or cancelled"]
pub struct PendingCall<R> {
    handle: JoinHandle<Result<R>>,
}

impl<R> PendingCall<R> {
    /// Abort the call. Has no effect once it has completed.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<R> Future for PendingCall<R> {
    type Output = Result<R>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.handle).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(err)) if err.is_cancelled() => Poll::Ready(Err(ApiError::Cancelled)),
            Poll::Ready(Err(err)) => std::panic::resume_unwind(err.into_panic()),
        }
    }
}

impl<R> fmt::Debug for PendingCall<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCall")
            .field("finished", &self.handle.is_finished())
            .finish()
    }
}
