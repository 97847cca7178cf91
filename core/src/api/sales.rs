use crate::auth::AuthScheme;
use crate::client::ApiClient;
use crate::descriptor::RequestDescriptor;
use crate::error::Result;
use crate::http::HttpMethod;
use crate::models::Sale;

pub fn get_descriptor(id_sale: i64) -> Result<RequestDescriptor<Option<Sale>>> {
    RequestDescriptor::builder(HttpMethod::Get, "/api/v1/sales/{idSale}")
        .path_param("idSale", id_sale)
        .auth(AuthScheme::Basic)
        .build()
}

#[derive(Debug, Clone, Copy)]
pub struct SalesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> SalesApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub fn get(&self, id_sale: i64) -> Result<Option<Sale>> {
        self.client.execute(get_descriptor(id_sale)?)
    }

    pub async fn get_async(&self, id_sale: i64) -> Result<Option<Sale>> {
        self.client.execute_async(get_descriptor(id_sale)?).await
    }
}
