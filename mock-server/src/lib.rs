//! In-memory stand-in for the gym-management API.
//!
//! # Design
//! One axum router over shared state. Every `/api/v1` route checks HTTP
//! Basic credentials; every request, authorised or not, is recorded
//! (method, path with query, headers, body bytes) so tests can compare what
//! two clients actually put on the wire. Payloads are defined here
//! independently from the client's models, so integration tests catch
//! schema drift.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body},
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const USERNAME: &str = "gym";
pub const PASSWORD: &str = "secret";

/// How long `GET /api/v1/slow` waits before answering.
pub const SLOW_DELAY: Duration = Duration::from_secs(3);

/// Lower bound on the size of the `GET /api/v1/export` body. Larger than
/// the default read cap of common blocking HTTP clients.
pub const EXPORT_BODY_BYTES: usize = 11 * 1024 * 1024;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id_phone: i64,
    pub id_member: i64,
    pub contact_type: String,
    pub description: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id_member: i64,
    pub first_name: String,
    pub last_name: String,
    pub id_branch: i64,
    pub membership_status: String,
    pub register_date: String,
    pub contacts: Vec<Contact>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id_entry: i64,
    pub id_member: i64,
    pub id_branch: i64,
    pub date: String,
    pub entry_action: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id_sale: i64,
    pub id_member: i64,
    pub sale_date: String,
    #[serde(rename = "saleItens")]
    pub items: Vec<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Receivable {
    pub id_receivable: i64,
    pub id_member: i64,
    pub id_sale: i64,
    pub ammount: f64,
    pub due_date: String,
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Webhook {
    #[serde(rename = "IdWebhook")]
    pub id_webhook: i64,
    #[serde(rename = "IdBranch")]
    pub id_branch: i64,
    #[serde(rename = "eventType")]
    pub event_type: String,
    #[serde(rename = "urlCallback")]
    pub url_callback: String,
    pub filters: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWebhook {
    pub id_branch: Option<i64>,
    pub event_type: String,
    pub url_callback: String,
    #[serde(default)]
    pub filters: Vec<Value>,
}

/// One request as the server received it.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    /// Path and query, as sent.
    pub uri: String,
    /// Header names are lower case.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Default)]
struct Store {
    members: BTreeMap<i64, Member>,
    entries: Vec<Entry>,
    sales: BTreeMap<i64, Sale>,
    receivables: Vec<Receivable>,
    webhooks: BTreeMap<i64, Webhook>,
    next_webhook_id: i64,
    recorded: Vec<RecordedRequest>,
}

/// Shared server state; clones refer to the same store.
#[derive(Clone)]
pub struct AppState {
    store: Arc<RwLock<Store>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// State seeded with two members, their entries, one sale and its
    /// receivables. No webhooks are registered.
    pub fn new() -> Self {
        let mut store = Store {
            next_webhook_id: 1,
            ..Store::default()
        };
        for (id, first, last) in [(1, "Ana", "Souza"), (2, "Bruno", "Lima")] {
            store.members.insert(
                id,
                Member {
                    id_member: id,
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    id_branch: 1,
                    membership_status: "Active".to_string(),
                    register_date: "2023-01-02T09:00:00".to_string(),
                    contacts: vec![Contact {
                        id_phone: id * 10,
                        id_member: id,
                        contact_type: "E-mail".to_string(),
                        description: format!("{}@example.com", first.to_lowercase()),
                    }],
                },
            );
        }
        store.entries = (1..=5)
            .map(|n| Entry {
                id_entry: 120 + n,
                id_member: if n % 2 == 0 { 2 } else { 1 },
                id_branch: 1,
                date: format!("2024-05-0{n}T07:30:00"),
                entry_action: "Entry".to_string(),
            })
            .collect();
        store.sales.insert(
            900,
            Sale {
                id_sale: 900,
                id_member: 1,
                sale_date: "2024-02-01T10:00:00".to_string(),
                items: vec![
                    json!({"itemType": "Membership", "idMembership": 3, "description": "Annual plan", "value": 1200.0}),
                    json!({"itemType": "Product", "idProduct": 8, "description": "Water", "quantity": 2, "value": 2.5}),
                ],
            },
        );
        store.receivables = (1..=3)
            .map(|n| Receivable {
                id_receivable: 70 + n,
                id_member: 1,
                id_sale: 900,
                ammount: 100.0,
                due_date: format!("2024-0{n}-10"),
                status: if n == 1 { "Received" } else { "Open" }.to_string(),
            })
            .collect();
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    /// Every request received so far, oldest first.
    pub async fn recorded(&self) -> Vec<RecordedRequest> {
        self.store.read().await.recorded.clone()
    }

    pub async fn clear_recorded(&self) {
        self.store.write().await.recorded.clear();
    }

    pub async fn webhooks(&self) -> Vec<Webhook> {
        self.store.read().await.webhooks.values().cloned().collect()
    }
}

pub fn app() -> Router {
    app_with_state(AppState::new())
}

pub fn app_with_state(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/v1/entries", get(list_entries))
        .route("/api/v1/members", get(list_members))
        .route("/api/v1/members/{id_member}", get(get_member))
        .route("/api/v1/sales/{id_sale}", get(get_sale))
        .route("/api/v1/receivables", get(list_receivables))
        .route(
            "/api/v1/webhook",
            get(list_webhooks).post(create_webhook).delete(delete_webhook),
        )
        .route("/api/v1/slow", get(slow))
        .route("/api/v1/export", get(export))
        .route_layer(middleware::from_fn(require_basic_auth));

    api.layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, AppState::new()).await
}

pub async fn run_with_state(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

pub fn basic_auth_value(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

async fn record(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };
    let recorded = RecordedRequest {
        method: parts.method.to_string(),
        uri: parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string()),
        headers: parts
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body: bytes.to_vec(),
    };
    state.store.write().await.recorded.push(recorded);
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

async fn require_basic_auth(request: Request, next: Next) -> Response {
    let expected = basic_auth_value(USERNAME, PASSWORD);
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == expected);
    if authorized {
        next.run(request).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Authorization has been denied for this request."})),
        )
            .into_response()
    }
}

fn not_found(what: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"message": format!("{what} not found")}))).into_response()
}

fn page<T>(items: impl Iterator<Item = T>, skip: Option<usize>, take: Option<usize>) -> Vec<T> {
    items.skip(skip.unwrap_or(0)).take(take.unwrap_or(50)).collect()
}

#[derive(Deserialize)]
struct EntriesParams {
    take: Option<usize>,
    skip: Option<usize>,
    #[serde(rename = "IdEntry")]
    id_entry: Option<i64>,
    #[serde(rename = "idMember")]
    id_member: Option<i64>,
    #[serde(rename = "idBranch")]
    id_branch: Option<i64>,
}

async fn list_entries(State(state): State<AppState>, Query(params): Query<EntriesParams>) -> Json<Vec<Entry>> {
    let store = state.store.read().await;
    let matching = store.entries.iter().cloned().filter(|entry| {
        params.id_entry.map_or(true, |id| entry.id_entry == id)
            && params.id_member.map_or(true, |id| entry.id_member == id)
            && params.id_branch.map_or(true, |id| entry.id_branch == id)
    });
    Json(page(matching, params.skip, params.take))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MembersParams {
    name: Option<String>,
    email: Option<String>,
    show_activity_data: Option<bool>,
    take: Option<usize>,
    skip: Option<usize>,
    ids_members: Option<String>,
}

async fn list_members(
    State(state): State<AppState>,
    Query(params): Query<MembersParams>,
) -> Result<Json<Vec<Value>>, StatusCode> {
    let ids: Option<Vec<i64>> = match &params.ids_members {
        Some(raw) => Some(
            raw.split(',')
                .map(|id| id.trim().parse())
                .collect::<Result<_, _>>()
                .map_err(|_| StatusCode::BAD_REQUEST)?,
        ),
        None => None,
    };
    let store = state.store.read().await;
    let matching = store.members.values().filter(|member| {
        let full_name = format!("{} {}", member.first_name, member.last_name).to_lowercase();
        params
            .name
            .as_ref()
            .map_or(true, |name| full_name.contains(&name.to_lowercase()))
            && params
                .email
                .as_ref()
                .map_or(true, |email| member.contacts.iter().any(|c| &c.description == email))
            && ids.as_ref().map_or(true, |ids| ids.contains(&member.id_member))
    });
    let with_activity = params.show_activity_data.unwrap_or(false);
    let members = page(matching, params.skip, params.take)
        .into_iter()
        .map(|member| {
            let mut value = serde_json::to_value(member).unwrap_or(Value::Null);
            if with_activity {
                let last = store
                    .entries
                    .iter()
                    .filter(|e| e.id_member == member.id_member)
                    .map(|e| e.date.clone())
                    .max();
                value["lastAccessDate"] = json!(last);
            }
            value
        })
        .collect();
    Ok(Json(members))
}

async fn get_member(State(state): State<AppState>, Path(id_member): Path<i64>) -> Response {
    match state.store.read().await.members.get(&id_member) {
        Some(member) => Json(member.clone()).into_response(),
        None => not_found("Member"),
    }
}

async fn get_sale(State(state): State<AppState>, Path(id_sale): Path<i64>) -> Response {
    match state.store.read().await.sales.get(&id_sale) {
        Some(sale) => Json(sale.clone()).into_response(),
        None => not_found("Sale"),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceivablesParams {
    member_id: Option<i64>,
    sale_id: Option<i64>,
    take: Option<usize>,
    skip: Option<usize>,
}

async fn list_receivables(
    State(state): State<AppState>,
    Query(params): Query<ReceivablesParams>,
) -> Json<Vec<Receivable>> {
    let store = state.store.read().await;
    let matching = store.receivables.iter().cloned().filter(|r| {
        params.member_id.map_or(true, |id| r.id_member == id)
            && params.sale_id.map_or(true, |id| r.id_sale == id)
    });
    Json(page(matching, params.skip, params.take))
}

async fn list_webhooks(State(state): State<AppState>) -> Json<Vec<Webhook>> {
    Json(state.store.read().await.webhooks.values().cloned().collect())
}

async fn create_webhook(State(state): State<AppState>, Json(input): Json<NewWebhook>) -> Json<bool> {
    let mut store = state.store.write().await;
    let id = store.next_webhook_id;
    store.next_webhook_id += 1;
    store.webhooks.insert(
        id,
        Webhook {
            id_webhook: id,
            id_branch: input.id_branch.unwrap_or(1),
            event_type: input.event_type,
            url_callback: input.url_callback,
            filters: input.filters,
        },
    );
    Json(true)
}

#[derive(Deserialize)]
struct DeleteWebhookParams {
    #[serde(rename = "IdWebhook")]
    id_webhook: i64,
}

async fn delete_webhook(
    State(state): State<AppState>,
    Query(params): Query<DeleteWebhookParams>,
) -> Response {
    match state.store.write().await.webhooks.remove(&params.id_webhook) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found("Webhook"),
    }
}

async fn slow() -> Json<Vec<Value>> {
    tokio::time::sleep(SLOW_DELAY).await;
    Json(Vec::new())
}

async fn export() -> Json<Vec<String>> {
    let row = "x".repeat(1024);
    Json(vec![row; EXPORT_BODY_BYTES / 1024 + 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_serializes_with_wire_names() {
        let state = AppState::new();
        let store = state.store.try_read().unwrap();
        let json = serde_json::to_value(&store.members[&1]).unwrap();
        assert_eq!(json["idMember"], 1);
        assert_eq!(json["firstName"], "Ana");
        assert_eq!(json["contacts"][0]["contactType"], "E-mail");
    }

    #[test]
    fn webhook_uses_capitalised_ids() {
        let webhook = Webhook {
            id_webhook: 3,
            id_branch: 1,
            event_type: "NewSale".to_string(),
            url_callback: "https://hooks.example.com".to_string(),
            filters: Vec::new(),
        };
        let json = serde_json::to_value(&webhook).unwrap();
        assert_eq!(json["IdWebhook"], 3);
        assert_eq!(json["IdBranch"], 1);
    }

    #[test]
    fn new_webhook_requires_event_and_callback() {
        let parsed: Result<NewWebhook, _> = serde_json::from_str(r#"{"eventType":"NewSale"}"#);
        assert!(parsed.is_err());
        let parsed: NewWebhook =
            serde_json::from_str(r#"{"eventType":"NewSale","urlCallback":"https://x"}"#).unwrap();
        assert!(parsed.filters.is_empty());
        assert!(parsed.id_branch.is_none());
    }

    #[test]
    fn basic_auth_value_matches_rfc_example() {
        assert_eq!(
            basic_auth_value("Aladdin", "open sesame"),
            "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="
        );
    }

    #[test]
    fn page_applies_skip_then_take() {
        let items = page(1..=10, Some(2), Some(3));
        assert_eq!(items, vec![3, 4, 5]);
    }
}
