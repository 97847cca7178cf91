use crate::auth::AuthScheme;
use crate::client::ApiClient;
use crate::descriptor::{CollectionFormat, RequestDescriptor};
use crate::error::Result;
use crate::http::HttpMethod;
use crate::models::Member;

/// Filters for `GET /api/v1/members`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MembersQuery {
    pub name: Option<String>,
    pub email: Option<String>,
    pub document: Option<String>,
    pub show_activity_data: Option<bool>,
    pub take: Option<i64>,
    pub skip: Option<i64>,
    /// Sent comma separated as `idsMembers`; empty means no filter.
    pub member_ids: Vec<i64>,
}

pub fn get_descriptor(id_member: i64) -> Result<RequestDescriptor<Option<Member>>> {
    RequestDescriptor::builder(HttpMethod::Get, "/api/v1/members/{idMember}")
        .path_param("idMember", id_member)
        .auth(AuthScheme::Basic)
        .build()
}

pub fn list_descriptor(query: &MembersQuery) -> Result<RequestDescriptor<Vec<Member>>> {
    RequestDescriptor::builder(HttpMethod::Get, "/api/v1/members")
        .query_opt("name", query.name.as_deref())
        .query_opt("email", query.email.as_deref())
        .query_opt("document", query.document.as_deref())
        .query_opt("showActivityData", query.show_activity_data)
        .query_opt("take", query.take)
        .query_opt("skip", query.skip)
        .query_list("idsMembers", query.member_ids.iter().copied(), CollectionFormat::Csv)
        .auth(AuthScheme::Basic)
        .build()
}

#[derive(Debug, Clone, Copy)]
pub struct MembersApi<'a> {
    client: &'a ApiClient,
}

impl<'a> MembersApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// `None` when the API answers 2xx with an empty body.
    pub fn get(&self, id_member: i64) -> Result<Option<Member>> {
        self.client.execute(get_descriptor(id_member)?)
    }

    pub async fn get_async(&self, id_member: i64) -> Result<Option<Member>> {
        self.client.execute_async(get_descriptor(id_member)?).await
    }

    pub fn list(&self, query: &MembersQuery) -> Result<Vec<Member>> {
        self.client.execute(list_descriptor(query)?)
    }

    pub async fn list_async(&self, query: &MembersQuery) -> Result<Vec<Member>> {
        self.client.execute_async(list_descriptor(query)?).await
    }
}
