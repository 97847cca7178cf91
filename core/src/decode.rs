//! Response decoding: raw HTTP outcome to the declared response shape.
//!
//! # Design
//! Each declared shape is a type implementing [`ResponseShape`]:
//!
//! | shape            | Rust type            | empty body          |
//! |------------------|----------------------|---------------------|
//! | none             | `()`                 | ignored             |
//! | single model     | `Option<M>`          | `None`              |
//! | list of model    | `Vec<M>`             | `UnexpectedShape`   |
//! | raw mapping      | `serde_json::Value`  | `Value::Null`       |
//! | boolean          | `bool`               | `UnexpectedShape`   |
//!
//! A body that parses but has the wrong top-level shape is
//! `UnexpectedShape`; the decoder never coerces one shape into another.

use serde_json::Value;

use crate::codec::Model;
use crate::error::{ApiError, Result};
use crate::http::HttpResponse;
use crate::mapper;

/// The declared result shape of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    None,
    /// A single model, by model name.
    Model(&'static str),
    /// A list of models, by model name.
    ListOfModel(&'static str),
    Raw,
    Boolean,
}

/// A Rust type that a response body can be decoded into.
pub trait ResponseShape: Sized {
    const RESPONSE_TYPE: ResponseType;

    fn decode(body: &[u8]) -> Result<Self>;
}

impl ResponseShape for () {
    const RESPONSE_TYPE: ResponseType = ResponseType::None;

    fn decode(_body: &[u8]) -> Result<Self> {
        Ok(())
    }
}

impl<M: Model> ResponseShape for Option<M> {
    const RESPONSE_TYPE: ResponseType = ResponseType::Model(M::NAME);

    fn decode(body: &[u8]) -> Result<Self> {
        match parse_json(body)? {
            None | Some(Value::Null) => Ok(None),
            Some(value @ Value::Object(_)) => M::from_wire(value).map(Some),
            Some(other) => Err(ApiError::UnexpectedShape {
                expected: "object",
                found: describe(&other).to_string(),
            }),
        }
    }
}

impl<M: Model> ResponseShape for Vec<M> {
    const RESPONSE_TYPE: ResponseType = ResponseType::ListOfModel(M::NAME);

    fn decode(body: &[u8]) -> Result<Self> {
        match parse_json(body)? {
            Some(Value::Array(items)) => items.into_iter().map(M::from_wire).collect(),
            Some(other) => Err(ApiError::UnexpectedShape {
                expected: "array",
                found: describe(&other).to_string(),
            }),
            None => Err(ApiError::UnexpectedShape {
                expected: "array",
                found: "empty body".to_string(),
            }),
        }
    }
}

impl ResponseShape for Value {
    const RESPONSE_TYPE: ResponseType = ResponseType::Raw;

    fn decode(body: &[u8]) -> Result<Self> {
        Ok(parse_json(body)?.unwrap_or(Value::Null))
    }
}

impl ResponseShape for bool {
    const RESPONSE_TYPE: ResponseType = ResponseType::Boolean;

    fn decode(body: &[u8]) -> Result<Self> {
        match parse_json(body)? {
            Some(Value::Bool(flag)) => Ok(flag),
            Some(other) => Err(ApiError::UnexpectedShape {
                expected: "boolean",
                found: describe(&other).to_string(),
            }),
            None => Err(ApiError::UnexpectedShape {
                expected: "boolean",
                found: "empty body".to_string(),
            }),
        }
    }
}

/// The raw and decoded result of one completed call.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub raw: Vec<u8>,
    pub value: T,
}

impl<T> Envelope<T> {
    pub fn into_value(self) -> T {
        self.value
    }
}

/// Map the status, then decode the body into `R`.
///
/// A non-2xx status never reaches the decoder.
pub fn decode_response<R: ResponseShape>(response: HttpResponse) -> Result<Envelope<R>> {
    if let Some(err) = mapper::error_for_status(response.status, &response.reason, &response.body) {
        return Err(err);
    }
    let value = R::decode(&response.body)?;
    Ok(Envelope {
        status: response.status,
        reason: response.reason,
        headers: response.headers,
        raw: response.body,
        value,
    })
}

/// Short name of a JSON value's top-level shape.
pub fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `None` for an empty (or whitespace-only) body.
fn parse_json(body: &[u8]) -> Result<Option<Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|err| ApiError::Deserialization(err.to_string()))
}
