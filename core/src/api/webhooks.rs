use tracing::warn;

use crate::auth::AuthScheme;
use crate::client::ApiClient;
use crate::descriptor::RequestDescriptor;
use crate::error::{ApiError, Result};
use crate::http::HttpMethod;
use crate::models::{NewWebhook, Webhook};

const PATH: &str = "/api/v1/webhook";

pub fn list_descriptor() -> Result<RequestDescriptor<Vec<Webhook>>> {
    RequestDescriptor::builder(HttpMethod::Get, PATH)
        .auth(AuthScheme::Basic)
        .build()
}

pub fn create_descriptor(webhook: &NewWebhook) -> Result<RequestDescriptor<bool>> {
    RequestDescriptor::builder(HttpMethod::Post, PATH)
        .model_body(webhook)
        .auth(AuthScheme::Basic)
        .build()
}

pub fn delete_descriptor(id_webhook: i64) -> Result<RequestDescriptor<()>> {
    RequestDescriptor::builder(HttpMethod::Delete, PATH)
        .query("IdWebhook", id_webhook)
        .auth(AuthScheme::Basic)
        .build()
}

#[derive(Debug, Clone, Copy)]
pub struct WebhooksApi<'a> {
    client: &'a ApiClient,
}

impl<'a> WebhooksApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub fn list(&self) -> Result<Vec<Webhook>> {
        self.client.execute(list_descriptor()?)
    }

    pub async fn list_async(&self) -> Result<Vec<Webhook>> {
        self.client.execute_async(list_descriptor()?).await
    }

    /// Like [`WebhooksApi::list`], but an error status from the API yields
    /// an empty list. Transport, auth and decode errors still propagate.
    pub fn list_or_empty(&self) -> Result<Vec<Webhook>> {
        empty_on_status(self.list())
    }

    pub async fn list_or_empty_async(&self) -> Result<Vec<Webhook>> {
        empty_on_status(self.list_async().await)
    }

    /// Register a webhook; the API answers with a boolean.
    pub fn create(&self, webhook: &NewWebhook) -> Result<bool> {
        self.client.execute(create_descriptor(webhook)?)
    }

    pub async fn create_async(&self, webhook: &NewWebhook) -> Result<bool> {
        self.client.execute_async(create_descriptor(webhook)?).await
    }

    pub fn delete(&self, id_webhook: i64) -> Result<()> {
        self.client.execute(delete_descriptor(id_webhook)?)
    }

    pub async fn delete_async(&self, id_webhook: i64) -> Result<()> {
        self.client.execute_async(delete_descriptor(id_webhook)?).await
    }
}

fn empty_on_status(result: Result<Vec<Webhook>>) -> Result<Vec<Webhook>> {
    match result {
        Err(ApiError::Status(err)) => {
            warn!(status = err.status(), error = %err, "webhook listing failed, returning no webhooks");
            Ok(Vec::new())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WebhookEvent;
    use serde_json::json;

    #[test]
    fn create_sends_alias_keyed_body() {
        let webhook = NewWebhook::new(WebhookEvent::NewSale, "https://hooks.example.com").branch(2);
        let descriptor = create_descriptor(&webhook).unwrap();
        assert_eq!(
            descriptor.body(),
            Some(&json!({"idBranch": 2, "eventType": "NewSale", "urlCallback": "https://hooks.example.com"}))
        );
    }

    #[test]
    fn delete_passes_id_as_query() {
        let descriptor = delete_descriptor(9).unwrap();
        assert_eq!(descriptor.resource_path(), "/api/v1/webhook");
        assert!(descriptor.query_params().contains_key("IdWebhook"));
    }

    #[test]
    fn only_status_errors_become_empty() {
        let status = crate::mapper::error_for_status(500, "Internal Server Error", b"").unwrap();
        assert!(empty_on_status(Err(status)).unwrap().is_empty());

        let timeout = ApiError::TransportTimeout {
            elapsed: std::time::Duration::from_secs(1),
        };
        assert!(matches!(
            empty_on_status(Err(timeout)),
            Err(ApiError::TransportTimeout { .. })
        ));
    }
}
