use serde::{Deserialize, Serialize};

use crate::codec::{wire_datetime, FieldSpec, Model, WireDateTime};

wire_enum! {
    /// Direction of a turnstile or front-desk registration.
    pub enum EntryAction {
        Entry => "Entry",
        Exit => "Exit",
        Blocked => "Blocked",
    }
}

/// One access registration at a branch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "idEntry", default, skip_serializing_if = "Option::is_none")]
    pub id_entry: Option<i64>,
    #[serde(rename = "idMember", default, skip_serializing_if = "Option::is_none")]
    pub id_member: Option<i64>,
    #[serde(rename = "idProspect", default, skip_serializing_if = "Option::is_none")]
    pub id_prospect: Option<i64>,
    #[serde(rename = "idBranch", default, skip_serializing_if = "Option::is_none")]
    pub id_branch: Option<i64>,
    #[serde(
        rename = "date",
        default,
        skip_serializing_if = "Option::is_none",
        with = "wire_datetime"
    )]
    pub date: Option<WireDateTime>,
    #[serde(rename = "entryType", default, skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<String>,
    #[serde(rename = "entryAction", default, skip_serializing_if = "Option::is_none")]
    pub entry_action: Option<EntryAction>,
    #[serde(rename = "device", default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(rename = "blockReason", default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

impl Model for Entry {
    const NAME: &'static str = "Entry";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("id_entry", "idEntry"),
        FieldSpec::new("id_member", "idMember"),
        FieldSpec::new("id_prospect", "idProspect"),
        FieldSpec::new("id_branch", "idBranch"),
        FieldSpec::new("date", "date"),
        FieldSpec::new("entry_type", "entryType"),
        FieldSpec::new("entry_action", "entryAction"),
        FieldSpec::new("device", "device"),
        FieldSpec::new("block_reason", "blockReason"),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing;
    use chrono::NaiveDate;

    fn populated() -> Entry {
        Entry {
            id_entry: Some(123),
            id_member: Some(7),
            id_prospect: Some(0),
            id_branch: Some(1),
            date: NaiveDate::from_ymd_opt(2024, 5, 1)
                .and_then(|d| d.and_hms_opt(6, 45, 10))
                .map(WireDateTime::from),
            entry_type: Some("Member".to_string()),
            entry_action: Some(EntryAction::Entry),
            device: Some("Turnstile 2".to_string()),
            block_reason: Some(String::new()),
        }
    }

    #[test]
    fn fields_and_round_trip() {
        testing::assert_fields_match(&populated());
        testing::assert_round_trip(&populated());
    }

    #[test]
    fn registration_time_is_re_encoded_as_received() {
        for raw in [
            "2024-05-01T07:30:00Z",
            "2024-05-01T10:30:00+02:00",
            "2024-05-01T07:30:00.000",
            "2024-05-01 07:30:00",
        ] {
            testing::assert_wire_round_trip::<Entry>(serde_json::json!({"idEntry": 1, "date": raw}));
        }
    }

    #[test]
    fn unknown_action_is_kept() {
        let entry = Entry::from_wire(serde_json::json!({"entryAction": "Manual"})).unwrap();
        assert_eq!(entry.entry_action, Some(EntryAction::Unknown("Manual".to_string())));
        assert_eq!(entry.to_wire().unwrap()["entryAction"], "Manual");
    }
}
