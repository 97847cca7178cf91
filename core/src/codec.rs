//! Conversion between wire JSON and typed models.
//!
//! # Design
//! Every typed model implements [`Model`], the explicit capability contract
//! the request builder and the response decoder depend on. Field aliasing
//! lives in the serde attributes of each model; `FIELDS` repeats the alias
//! table so `to_wire_with_nulls` can emit explicit nulls for absent fields.
//! Unset fields are `Option::None` and are omitted from `to_wire`.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{ApiError, Result};

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// One declared field of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// In-memory (Rust) field name.
    pub name: &'static str,
    /// Key used on the wire.
    pub alias: &'static str,
    pub nullable: bool,
}

impl FieldSpec {
    pub const fn new(name: &'static str, alias: &'static str) -> Self {
        Self {
            name,
            alias,
            nullable: true,
        }
    }
}

/// A typed record mirroring one API resource's wire schema.
pub trait Model: Serialize + DeserializeOwned {
    const NAME: &'static str;
    const FIELDS: &'static [FieldSpec];

    /// Alias-keyed mapping, omitting unset fields.
    fn to_wire(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(ApiError::Serialization(format!(
                "{} serialized to {} instead of an object",
                Self::NAME,
                crate::decode::describe(&other)
            ))),
            Err(err) => Err(ApiError::Serialization(format!("{}: {err}", Self::NAME))),
        }
    }

    /// Alias-keyed mapping with every declared field present, unset ones as null.
    fn to_wire_with_nulls(&self) -> Result<Map<String, Value>> {
        let mut map = self.to_wire()?;
        for field in Self::FIELDS {
            map.entry(field.alias).or_insert(Value::Null);
        }
        Ok(map)
    }

    /// Construct from alias-keyed data.
    fn from_wire(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|err| ApiError::Deserialization(format!("{}: {err}", Self::NAME)))
    }
}

/// A parsed wire timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timestamp {
    /// No offset on the wire; the API's local time.
    Naive(NaiveDateTime),
    /// RFC 3339 with `Z` or a numeric offset.
    Zoned(DateTime<FixedOffset>),
}

/// A datetime field as the API sent it.
///
/// Accepts RFC 3339 and naive `YYYY-MM-DDTHH:MM:SS[.f]`, with either `T` or
/// a space as separator. The text is kept next to the parsed value and is
/// what gets written back, so a decoded model re-encodes to its input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WireDateTime {
    stamp: Timestamp,
    raw: String,
}

impl WireDateTime {
    pub fn parse(raw: &str) -> Option<Self> {
        let stamp = match DateTime::parse_from_rfc3339(raw) {
            Ok(zoned) => Timestamp::Zoned(zoned),
            Err(_) => NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT)
                .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
                .map(Timestamp::Naive)
                .ok()?,
        };
        Some(Self {
            stamp,
            raw: raw.to_string(),
        })
    }

    pub fn stamp(&self) -> Timestamp {
        self.stamp
    }

    /// Wall-clock time as written, offset dropped.
    pub fn naive_local(&self) -> NaiveDateTime {
        match self.stamp {
            Timestamp::Naive(naive) => naive,
            Timestamp::Zoned(zoned) => zoned.naive_local(),
        }
    }

    pub fn offset(&self) -> Option<FixedOffset> {
        match self.stamp {
            Timestamp::Naive(_) => None,
            Timestamp::Zoned(zoned) => Some(*zoned.offset()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl From<NaiveDateTime> for WireDateTime {
    fn from(naive: NaiveDateTime) -> Self {
        Self {
            stamp: Timestamp::Naive(naive),
            raw: naive.format(NAIVE_FORMAT).to_string(),
        }
    }
}

impl From<DateTime<FixedOffset>> for WireDateTime {
    fn from(zoned: DateTime<FixedOffset>) -> Self {
        Self {
            stamp: Timestamp::Zoned(zoned),
            raw: zoned.to_rfc3339(),
        }
    }
}

impl fmt::Display for WireDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for WireDateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for WireDateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid datetime `{raw}`")))
    }
}

/// A date field as the API sent it: `YYYY-MM-DD`, or a datetime whose date
/// part is used. The text is written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WireDate {
    date: NaiveDate,
    raw: String,
}

impl WireDate {
    pub fn parse(raw: &str) -> Option<Self> {
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| WireDateTime::parse(raw).map(|dt| dt.naive_local().date()))?;
        Some(Self {
            date,
            raw: raw.to_string(),
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl From<NaiveDate> for WireDate {
    fn from(date: NaiveDate) -> Self {
        Self {
            date,
            raw: date.format("%Y-%m-%d").to_string(),
        }
    }
}

impl fmt::Display for WireDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for WireDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for WireDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid date `{raw}`")))
    }
}

/// `with` helper for optional datetime fields: an empty string reads as
/// absent.
pub mod wire_datetime {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::WireDateTime;

    pub fn serialize<S: Serializer>(
        value: &Option<WireDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<WireDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.is_empty() => Ok(None),
            Some(raw) => WireDateTime::parse(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid datetime `{raw}`"))),
        }
    }
}

/// `with` helper for optional date fields: an empty string reads as absent.
pub mod wire_date {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::WireDate;

    pub fn serialize<S: Serializer>(value: &Option<WireDate>, serializer: S) -> Result<S::Ok, S::Error> {
        value.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<WireDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.is_empty() => Ok(None),
            Some(raw) => WireDate::parse(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date `{raw}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Visit {
        #[serde(rename = "idVisit", default, skip_serializing_if = "Option::is_none")]
        id: Option<i64>,
        #[serde(
            rename = "seenAt",
            default,
            skip_serializing_if = "Option::is_none",
            with = "wire_datetime"
        )]
        seen_at: Option<WireDateTime>,
        #[serde(
            rename = "birthDate",
            default,
            skip_serializing_if = "Option::is_none",
            with = "wire_date"
        )]
        birth_date: Option<WireDate>,
    }

    impl Model for Visit {
        const NAME: &'static str = "Visit";
        const FIELDS: &'static [FieldSpec] = &[
            FieldSpec::new("id", "idVisit"),
            FieldSpec::new("seen_at", "seenAt"),
            FieldSpec::new("birth_date", "birthDate"),
        ];
    }

    #[test]
    fn to_wire_omits_unset_fields() {
        let visit = Visit {
            id: Some(7),
            ..Visit::default()
        };
        let wire = visit.to_wire().unwrap();
        assert_eq!(wire.len(), 1);
        assert_eq!(wire["idVisit"], 7);
    }

    #[test]
    fn to_wire_with_nulls_lists_every_alias() {
        let wire = Visit::default().to_wire_with_nulls().unwrap();
        assert_eq!(wire.len(), 3);
        assert!(wire.values().all(Value::is_null));
    }

    #[test]
    fn datetime_forms_are_written_back_as_read() {
        for raw in [
            "2024-05-01T08:30:00",
            "2024-05-01T07:30:00Z",
            "2024-05-01T10:30:00+02:00",
            "2024-05-01T07:30:00.000",
            "2024-05-01 07:30:00",
        ] {
            let wire = json!({"seenAt": raw});
            let visit = Visit::from_wire(wire.clone()).unwrap();
            assert_eq!(Value::Object(visit.to_wire().unwrap()), wire, "{raw}");
        }
    }

    #[test]
    fn zoned_datetimes_keep_their_offset() {
        let visit = Visit::from_wire(json!({"seenAt": "2024-05-01T10:30:00+02:00"})).unwrap();
        let seen_at = visit.seen_at.unwrap();
        assert_eq!(seen_at.offset(), FixedOffset::east_opt(2 * 3600));
        assert_eq!(
            seen_at.naive_local(),
            NaiveDate::from_ymd_opt(2024, 5, 1).and_then(|d| d.and_hms_opt(10, 30, 0)).unwrap()
        );
        assert!(matches!(seen_at.stamp(), Timestamp::Zoned(_)));

        let naive = WireDateTime::parse("2024-05-01T10:30:00").unwrap();
        assert_eq!(naive.offset(), None);
        assert_eq!(naive.naive_local(), seen_at.naive_local());
    }

    #[test]
    fn constructed_datetimes_use_the_canonical_form() {
        let naive = NaiveDate::from_ymd_opt(2024, 5, 1).and_then(|d| d.and_hms_opt(6, 45, 10)).unwrap();
        assert_eq!(WireDateTime::from(naive).as_str(), "2024-05-01T06:45:10");
        assert_eq!(WireDate::from(naive.date()).as_str(), "2024-05-01");
    }

    #[test]
    fn date_accepts_datetime_strings() {
        let visit = Visit::from_wire(json!({"birthDate": "1990-02-03T00:00:00"})).unwrap();
        let birth_date = visit.birth_date.clone().unwrap();
        assert_eq!(Some(birth_date.date()), NaiveDate::from_ymd_opt(1990, 2, 3));
        assert_eq!(visit.to_wire().unwrap()["birthDate"], "1990-02-03T00:00:00");
    }

    #[test]
    fn explicit_null_and_empty_string_decode_as_absent() {
        let visit =
            Visit::from_wire(json!({"idVisit": null, "seenAt": "", "birthDate": null})).unwrap();
        assert_eq!(visit, Visit::default());
    }

    #[test]
    fn malformed_dates_are_deserialization_errors() {
        let err = Visit::from_wire(json!({"seenAt": "yesterday"})).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(msg) if msg.contains("yesterday")));
    }

    #[test]
    fn wrong_field_type_is_a_deserialization_error() {
        let err = Visit::from_wire(json!({"idVisit": "seven"})).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(msg) if msg.starts_with("Visit")));
    }
}
