use serde::{Deserialize, Serialize};

use crate::codec::{FieldSpec, Model};

wire_enum! {
    /// Event a webhook subscribes to.
    pub enum WebhookEvent {
        NewSale => "NewSale",
        CreateMember => "CreateMember",
        AlterMember => "AlterMember",
        ClearedDebt => "ClearedDebt",
        AlterReceivables => "AlterReceivables",
        EndedSessionActivity => "EndedSessionActivity",
    }
}

/// Restricts a webhook to events matching `filter_type = value`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookFilter {
    #[serde(rename = "filterType", default, skip_serializing_if = "Option::is_none")]
    pub filter_type: Option<String>,
    #[serde(rename = "value", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Model for WebhookFilter {
    const NAME: &'static str = "WebhookFilter";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("filter_type", "filterType"),
        FieldSpec::new("value", "value"),
    ];
}

/// A registered webhook, as listed by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Webhook {
    #[serde(rename = "IdWebhook", default, skip_serializing_if = "Option::is_none")]
    pub id_webhook: Option<i64>,
    #[serde(rename = "IdBranch", default, skip_serializing_if = "Option::is_none")]
    pub id_branch: Option<i64>,
    #[serde(rename = "eventType", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<WebhookEvent>,
    #[serde(rename = "urlCallback", default, skip_serializing_if = "Option::is_none")]
    pub url_callback: Option<String>,
    #[serde(rename = "filters", default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<WebhookFilter>>,
}

impl Model for Webhook {
    const NAME: &'static str = "Webhook";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("id_webhook", "IdWebhook"),
        FieldSpec::new("id_branch", "IdBranch"),
        FieldSpec::new("event_type", "eventType"),
        FieldSpec::new("url_callback", "urlCallback"),
        FieldSpec::new("filters", "filters"),
    ];
}

/// Body of a webhook registration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewWebhook {
    #[serde(rename = "idBranch", default, skip_serializing_if = "Option::is_none")]
    pub id_branch: Option<i64>,
    #[serde(rename = "eventType", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<WebhookEvent>,
    #[serde(rename = "urlCallback", default, skip_serializing_if = "Option::is_none")]
    pub url_callback: Option<String>,
    #[serde(rename = "filters", default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<WebhookFilter>>,
}

impl NewWebhook {
    pub fn new(event_type: WebhookEvent, url_callback: impl Into<String>) -> Self {
        Self {
            event_type: Some(event_type),
            url_callback: Some(url_callback.into()),
            ..Self::default()
        }
    }

    pub fn branch(mut self, id_branch: i64) -> Self {
        self.id_branch = Some(id_branch);
        self
    }

    pub fn filter(mut self, filter_type: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.get_or_insert_with(Vec::new).push(WebhookFilter {
            filter_type: Some(filter_type.into()),
            value: Some(value.into()),
        });
        self
    }
}

impl Model for NewWebhook {
    const NAME: &'static str = "NewWebhook";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("id_branch", "idBranch"),
        FieldSpec::new("event_type", "eventType"),
        FieldSpec::new("url_callback", "urlCallback"),
        FieldSpec::new("filters", "filters"),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing;

    #[test]
    fn fields_and_round_trip() {
        let new = NewWebhook::new(WebhookEvent::NewSale, "https://hooks.example.com/sales")
            .branch(1)
            .filter("idBranch", "1");
        testing::assert_fields_match(&new);
        testing::assert_round_trip(&new);

        let listed = Webhook {
            id_webhook: Some(10),
            id_branch: Some(1),
            event_type: Some(WebhookEvent::Unknown("Custom".to_string())),
            url_callback: Some("https://hooks.example.com".to_string()),
            filters: Some(Vec::new()),
        };
        testing::assert_fields_match(&listed);
        testing::assert_round_trip(&listed);
    }

    #[test]
    fn registration_body_omits_unset_fields() {
        let wire = NewWebhook::new(WebhookEvent::CreateMember, "https://hooks.example.com")
            .to_wire()
            .unwrap();
        assert_eq!(
            serde_json::Value::Object(wire),
            serde_json::json!({"eventType": "CreateMember", "urlCallback": "https://hooks.example.com"})
        );
    }
}
