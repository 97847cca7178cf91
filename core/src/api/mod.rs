//! Operation layer: one handle per API resource.
//!
//! Each operation is a `*_descriptor` function that assembles the request
//! plus a blocking and an `_async` method that hand it to the engine. The
//! two methods take the same parameters and return the same types.
//! Handles borrow the [`crate::ApiClient`] they were obtained from.

pub mod entries;
pub mod members;
pub mod receivables;
pub mod sales;
pub mod webhooks;

pub use entries::{EntriesApi, EntriesQuery};
pub use members::{MembersApi, MembersQuery};
pub use receivables::{ReceivablesApi, ReceivablesQuery};
pub use sales::SalesApi;
pub use webhooks::WebhooksApi;
