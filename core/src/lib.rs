//! Dual-mode API client core for the gym-management REST API.
//!
//! # Overview
//! Turns a typed operation call into one HTTP exchange, either blocking on
//! the calling thread or as a future on tokio, with the same
//! authentication, wire encoding, decoding and error mapping in both modes.
//!
//! # Design
//! - An operation builds a [`RequestDescriptor`] whose type parameter is the
//!   declared response shape. Building never touches the network.
//! - [`auth::apply`] attaches basic-auth credentials or fails with
//!   `MissingCredentials` before any I/O.
//! - [`transport::encode`] turns the descriptor into one [`HttpRequest`];
//!   the blocking ([`UreqTransport`]) and async ([`ReqwestTransport`])
//!   executors send that value as-is, so both modes put the same bytes on
//!   the wire.
//! - The response is mapped ([`mapper`]) then decoded ([`decode`]) into the
//!   declared shape through the [`Model`] capability trait.
//! - [`ApiClient`] drives this pipeline; resource handles in [`api`] build
//!   descriptors for the individual endpoints.

pub mod api;
pub mod auth;
mod call;
pub mod client;
pub mod codec;
pub mod config;
pub mod decode;
pub mod descriptor;
pub mod error;
pub mod http;
pub mod mapper;
pub mod models;
pub mod transport;

pub use api::{EntriesQuery, MembersQuery, ReceivablesQuery};
pub use auth::{AuthScheme, Credentials};
pub use call::CallState;
pub use client::{ApiClient, PendingCall};
pub use codec::{FieldSpec, Model, Timestamp, WireDate, WireDateTime};
pub use config::ClientConfig;
pub use decode::{Envelope, ResponseShape, ResponseType};
pub use descriptor::{CollectionFormat, DescriptorBuilder, ParamValue, QueryValue, RequestDescriptor};
pub use error::{ApiError, ErrorKind, Result, StatusError, TransportErrorKind};
pub use crate::http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{AsyncTransport, ReqwestTransport, Transport, TransportFailure, UreqTransport};
