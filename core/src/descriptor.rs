//! Request descriptors: the execution-mode-agnostic form of one API call.
//!
//! # Design
//! Operation code assembles a `RequestDescriptor` through
//! `RequestDescriptor::builder`. Building is pure data assembly: path
//! placeholders are resolved, `None` query values are dropped, model bodies
//! are converted to their alias-keyed wire form, header names and values are
//! validated. Nothing here performs I/O, and nothing here renders query
//! values to strings; that is the job of the shared wire encoder in
//! `transport`, so both executors render them identically.
//!
//! The declared response shape is the type parameter `R`, which keeps the
//! value an operation returns tied to the shape it declared.

use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::auth::AuthScheme;
use crate::codec::Model;
use crate::decode::{ResponseShape, ResponseType};
use crate::error::{ApiError, Result};
use crate::http::HttpMethod;

/// A scalar parameter value, kept in its native type until wire encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<NaiveDate> for ParamValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveDateTime> for ParamValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

/// How a collection query value is flattened onto the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionFormat {
    /// One `key=value` pair per element.
    Multi,
    /// Comma separated.
    Csv,
    /// Space separated.
    Ssv,
    /// Tab separated.
    Tsv,
    /// Pipe separated.
    Pipes,
}

impl CollectionFormat {
    /// Separator for the joined formats; `None` for `Multi`.
    pub fn separator(self) -> Option<&'static str> {
        match self {
            Self::Multi => None,
            Self::Csv => Some(","),
            Self::Ssv => Some(" "),
            Self::Tsv => Some("\t"),
            Self::Pipes => Some("|"),
        }
    }
}

/// A query value: a scalar, or a collection with an explicit flattening rule.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Scalar(ParamValue),
    Flattened(Vec<ParamValue>, CollectionFormat),
}

/// Insertion-ordered query map with unique keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams(Vec<(String, QueryValue)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `key`, keeping its original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, value: QueryValue) {
        let key = key.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `Authorization` header value attached by `auth::apply`; never printed.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct Authorization(String);

impl Authorization {
    pub(crate) fn new(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// The canonical description of one API call.
pub struct RequestDescriptor<R> {
    method: HttpMethod,
    resource_path: String,
    path_params: Vec<(String, ParamValue)>,
    query_params: QueryParams,
    header_params: Vec<(String, String)>,
    body: Option<Value>,
    auth_settings: BTreeSet<AuthScheme>,
    timeout: Option<Duration>,
    authorization: Option<Authorization>,
    shape: PhantomData<fn() -> R>,
}

impl RequestDescriptor<()> {
    /// Start a descriptor for `method` on `path_template`.
    ///
    /// Placeholders in the template are written `{name}`.
    pub fn builder(method: HttpMethod, path_template: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder::new(method, path_template.into())
    }
}

impl<R> RequestDescriptor<R> {
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Resource path with every placeholder resolved.
    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    pub fn path_params(&self) -> &[(String, ParamValue)] {
        &self.path_params
    }

    pub fn query_params(&self) -> &QueryParams {
        &self.query_params
    }

    pub fn header_params(&self) -> &[(String, String)] {
        &self.header_params
    }

    /// Alias-keyed JSON body, if any.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn auth_settings(&self) -> &BTreeSet<AuthScheme> {
        &self.auth_settings
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// `Authorization` value attached by the auth injector.
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_ref().map(|auth| auth.0.as_str())
    }

    pub(crate) fn set_authorization(&mut self, authorization: Authorization) {
        self.authorization = Some(authorization);
    }
}

impl<R: ResponseShape> RequestDescriptor<R> {
    pub fn response_type(&self) -> ResponseType {
        R::RESPONSE_TYPE
    }
}

impl<R> fmt::Debug for RequestDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("resource_path", &self.resource_path)
            .field("query_params", &self.query_params)
            .field("header_params", &self.header_params)
            .field("has_body", &self.body.is_some())
            .field("auth_settings", &self.auth_settings)
            .field("timeout", &self.timeout)
            .field("authorization", &self.authorization)
            .finish()
    }
}

/// Builder for [`RequestDescriptor`].
///
/// Errors found while adding parts (an unserializable body, an invalid
/// header) are held back and reported by [`DescriptorBuilder::build`].
#[derive(Debug)]
pub struct DescriptorBuilder {
    method: HttpMethod,
    template: String,
    path_params: Vec<(String, ParamValue)>,
    query_params: QueryParams,
    header_params: Vec<(String, String)>,
    body: Option<Value>,
    auth_settings: BTreeSet<AuthScheme>,
    timeout: Option<Duration>,
    error: Option<ApiError>,
}

impl DescriptorBuilder {
    fn new(method: HttpMethod, template: String) -> Self {
        Self {
            method,
            template,
            path_params: Vec::new(),
            query_params: QueryParams::new(),
            header_params: Vec::new(),
            body: None,
            auth_settings: BTreeSet::new(),
            timeout: None,
            error: None,
        }
    }

    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.path_params.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.path_params.push((name, value)),
        }
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.query_params
            .insert(key, QueryValue::Scalar(value.into()));
        self
    }

    /// Add an optional filter; `None` leaves the key out entirely.
    pub fn query_opt<V: Into<ParamValue>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Add a collection value with an explicit flattening rule.
    ///
    /// An empty collection is treated like `None`.
    pub fn query_list<V, I>(mut self, key: impl Into<String>, values: I, format: CollectionFormat) -> Self
    where
        V: Into<ParamValue>,
        I: IntoIterator<Item = V>,
    {
        let values: Vec<ParamValue> = values.into_iter().map(Into::into).collect();
        if !values.is_empty() {
            self.query_params
                .insert(key, QueryValue::Flattened(values, format));
        }
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if let Err(err) = validate_header(&name, &value) {
            self.error.get_or_insert(err);
            return self;
        }
        self.header_params
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.header_params.push((name, value));
        self
    }

    /// Attach a typed model, converted to its alias-keyed wire mapping.
    pub fn model_body<M: Model>(mut self, model: &M) -> Self {
        match model.to_wire() {
            Ok(map) => self.body = Some(Value::Object(map)),
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
        self
    }

    /// Attach a raw JSON body, passed through unchanged.
    pub fn raw_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn auth(mut self, scheme: AuthScheme) -> Self {
        self.auth_settings.insert(scheme);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Resolve the path and produce the descriptor for response shape `R`.
    pub fn build<R: ResponseShape>(self) -> Result<RequestDescriptor<R>> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let resource_path = resolve_path(&self.template, &self.path_params)?;
        Ok(RequestDescriptor {
            method: self.method,
            resource_path,
            path_params: self.path_params,
            query_params: self.query_params,
            header_params: self.header_params,
            body: self.body,
            auth_settings: self.auth_settings,
            timeout: self.timeout,
            authorization: None,
            shape: PhantomData,
        })
    }
}

/// Substitute `{name}` placeholders, percent-encoding each value.
fn resolve_path(template: &str, params: &[(String, ParamValue)]) -> Result<String> {
    let mut resolved = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        resolved.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            return Err(ApiError::UnresolvedPlaceholder {
                path: template.to_string(),
            });
        };
        let name = &after[..end];
        let value = params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
            .ok_or_else(|| ApiError::MissingPathParameter {
                name: name.to_string(),
                template: template.to_string(),
            })?;
        resolved.push_str(&urlencoding::encode(&render_param(value)));
        rest = &after[end + 1..];
    }
    resolved.push_str(rest);
    if resolved.contains('}') {
        return Err(ApiError::UnresolvedPlaceholder { path: resolved });
    }
    Ok(resolved)
}

/// Canonical string form of a parameter value.
///
/// Booleans render as `true`/`false`, dates as ISO-8601.
pub(crate) fn render_param(value: &ParamValue) -> String {
    match value {
        ParamValue::Str(s) => s.clone(),
        ParamValue::Int(i) => i.to_string(),
        ParamValue::Float(f) => f.to_string(),
        ParamValue::Bool(b) => b.to_string(),
        ParamValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        ParamValue::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
    }
}

fn validate_header(name: &str, value: &str) -> Result<()> {
    ::http::HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ApiError::InvalidRequest(format!("invalid header name `{name}`")))?;
    ::http::HeaderValue::from_str(value)
        .map_err(|_| ApiError::InvalidRequest(format!("invalid value for header `{name}`")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_path_parameters_by_name() {
        let descriptor: RequestDescriptor<Value> =
            RequestDescriptor::builder(HttpMethod::Get, "/api/v1/members/{idMember}/contacts/{kind}")
                .path_param("kind", "email")
                .path_param("idMember", 42)
                .build()
                .unwrap();
        assert_eq!(descriptor.resource_path(), "/api/v1/members/42/contacts/email");
        assert_eq!(descriptor.path_params().len(), 2);
    }

    #[test]
    fn path_values_are_percent_encoded() {
        let descriptor: RequestDescriptor<Value> =
            RequestDescriptor::builder(HttpMethod::Get, "/api/v1/branches/{name}")
                .path_param("name", "north side/2")
                .build()
                .unwrap();
        assert_eq!(descriptor.resource_path(), "/api/v1/branches/north%20side%2F2");
    }

    #[test]
    fn missing_path_parameter_is_a_build_error() {
        let err = RequestDescriptor::builder(HttpMethod::Get, "/api/v1/sales/{idSale}")
            .build::<Value>()
            .unwrap_err();
        match err {
            ApiError::MissingPathParameter { name, template } => {
                assert_eq!(name, "idSale");
                assert_eq!(template, "/api/v1/sales/{idSale}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unterminated_placeholder_is_rejected() {
        let err = RequestDescriptor::builder(HttpMethod::Get, "/api/v1/sales/{idSale")
            .path_param("idSale", 1)
            .build::<Value>()
            .unwrap_err();
        assert!(matches!(err, ApiError::UnresolvedPlaceholder { .. }));
    }

    #[test]
    fn none_query_values_are_dropped() {
        let descriptor: RequestDescriptor<Value> =
            RequestDescriptor::builder(HttpMethod::Get, "/api/v1/entries")
                .query_opt("a", Some(1))
                .query_opt("b", None::<i64>)
                .query_opt("c", Some("x"))
                .build()
                .unwrap();
        let keys: Vec<&str> = descriptor.query_params().iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn booleans_stay_native_in_the_descriptor() {
        let descriptor: RequestDescriptor<Value> =
            RequestDescriptor::builder(HttpMethod::Get, "/api/v1/members")
                .query("showActivityData", true)
                .build()
                .unwrap();
        assert_eq!(
            descriptor.query_params().get("showActivityData"),
            Some(&QueryValue::Scalar(ParamValue::Bool(true)))
        );
    }

    #[test]
    fn duplicate_query_key_replaces_in_place() {
        let mut params = QueryParams::new();
        params.insert("take", QueryValue::Scalar(ParamValue::Int(10)));
        params.insert("skip", QueryValue::Scalar(ParamValue::Int(0)));
        params.insert("take", QueryValue::Scalar(ParamValue::Int(50)));
        let pairs: Vec<(&str, &QueryValue)> = params.iter().collect();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], ("take", &QueryValue::Scalar(ParamValue::Int(50))));
    }

    #[test]
    fn empty_collection_is_omitted() {
        let descriptor: RequestDescriptor<Value> =
            RequestDescriptor::builder(HttpMethod::Get, "/api/v1/members")
                .query_list("idsMembers", Vec::<i64>::new(), CollectionFormat::Csv)
                .build()
                .unwrap();
        assert!(descriptor.query_params().is_empty());
    }

    #[test]
    fn invalid_header_is_reported_at_build() {
        let err = RequestDescriptor::builder(HttpMethod::Get, "/api/v1/members")
            .header("X-Trace", "line\nbreak")
            .build::<Value>()
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[test]
    fn raw_body_passes_through_unchanged() {
        let body = serde_json::json!({"urlCallback": "https://example.com", "extra": [1, 2]});
        let descriptor: RequestDescriptor<bool> =
            RequestDescriptor::builder(HttpMethod::Post, "/api/v1/webhook")
                .raw_body(body.clone())
                .build()
                .unwrap();
        assert_eq!(descriptor.body(), Some(&body));
        assert_eq!(descriptor.response_type(), ResponseType::Boolean);
    }

    #[test]
    fn render_param_formats() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(render_param(&ParamValue::Date(date)), "2024-03-09");
        let dt = date.and_hms_opt(7, 5, 0).unwrap();
        assert_eq!(render_param(&ParamValue::DateTime(dt)), "2024-03-09T07:05:00");
        assert_eq!(render_param(&ParamValue::Bool(false)), "false");
    }
}
