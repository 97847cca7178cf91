use chrono::NaiveDateTime;

use crate::auth::AuthScheme;
use crate::client::ApiClient;
use crate::descriptor::RequestDescriptor;
use crate::error::Result;
use crate::http::HttpMethod;
use crate::models::Entry;

/// Filters for `GET /api/v1/entries`. Unset filters are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntriesQuery {
    pub take: Option<i64>,
    pub skip: Option<i64>,
    pub entry_id: Option<i64>,
    pub member_id: Option<i64>,
    pub register_date_start: Option<NaiveDateTime>,
    pub register_date_end: Option<NaiveDateTime>,
    pub branch_id: Option<i64>,
}

pub fn list_descriptor(query: &EntriesQuery) -> Result<RequestDescriptor<Vec<Entry>>> {
    RequestDescriptor::builder(HttpMethod::Get, "/api/v1/entries")
        .query_opt("take", query.take)
        .query_opt("skip", query.skip)
        .query_opt("IdEntry", query.entry_id)
        .query_opt("idMember", query.member_id)
        .query_opt("registerDateStart", query.register_date_start)
        .query_opt("registerDateEnd", query.register_date_end)
        .query_opt("idBranch", query.branch_id)
        .auth(AuthScheme::Basic)
        .build()
}

/// Turnstile and front-desk access registrations.
#[derive(Debug, Clone, Copy)]
pub struct EntriesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> EntriesApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub fn list(&self, query: &EntriesQuery) -> Result<Vec<Entry>> {
        self.client.execute(list_descriptor(query)?)
    }

    pub async fn list_async(&self, query: &EntriesQuery) -> Result<Vec<Entry>> {
        self.client.execute_async(list_descriptor(query)?).await
    }
}
