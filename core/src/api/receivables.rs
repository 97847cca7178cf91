use chrono::NaiveDate;

use crate::auth::AuthScheme;
use crate::client::ApiClient;
use crate::descriptor::RequestDescriptor;
use crate::error::Result;
use crate::http::HttpMethod;
use crate::models::Receivable;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceivablesQuery {
    pub member_id: Option<i64>,
    pub sale_id: Option<i64>,
    pub due_date_start: Option<NaiveDate>,
    pub due_date_end: Option<NaiveDate>,
    pub take: Option<i64>,
    pub skip: Option<i64>,
}

pub fn list_descriptor(query: &ReceivablesQuery) -> Result<RequestDescriptor<Vec<Receivable>>> {
    RequestDescriptor::builder(HttpMethod::Get, "/api/v1/receivables")
        .query_opt("memberId", query.member_id)
        .query_opt("saleId", query.sale_id)
        .query_opt("dueDateStart", query.due_date_start)
        .query_opt("dueDateEnd", query.due_date_end)
        .query_opt("take", query.take)
        .query_opt("skip", query.skip)
        .auth(AuthScheme::Basic)
        .build()
}

#[derive(Debug, Clone, Copy)]
pub struct ReceivablesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ReceivablesApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub fn list(&self, query: &ReceivablesQuery) -> Result<Vec<Receivable>> {
        self.client.execute(list_descriptor(query)?)
    }

    pub async fn list_async(&self, query: &ReceivablesQuery) -> Result<Vec<Receivable>> {
        self.client.execute_async(list_descriptor(query)?).await
    }
}
