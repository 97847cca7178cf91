use serde::{Deserialize, Serialize};

use crate::codec::{wire_date, wire_datetime, FieldSpec, Model, WireDate, WireDateTime};

wire_enum! {
    pub enum MembershipStatus {
        Active => "Active",
        Inactive => "Inactive",
        Suspended => "Suspended",
    }
}

/// A phone number or e-mail address attached to a member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberContact {
    #[serde(rename = "idPhone", default, skip_serializing_if = "Option::is_none")]
    pub id_phone: Option<i64>,
    #[serde(rename = "idMember", default, skip_serializing_if = "Option::is_none")]
    pub id_member: Option<i64>,
    #[serde(rename = "contactType", default, skip_serializing_if = "Option::is_none")]
    pub contact_type: Option<String>,
    #[serde(rename = "description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Model for MemberContact {
    const NAME: &'static str = "MemberContact";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("id_phone", "idPhone"),
        FieldSpec::new("id_member", "idMember"),
        FieldSpec::new("contact_type", "contactType"),
        FieldSpec::new("description", "description"),
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "idMember", default, skip_serializing_if = "Option::is_none")]
    pub id_member: Option<i64>,
    #[serde(rename = "firstName", default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName", default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(rename = "document", default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    #[serde(rename = "gender", default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(
        rename = "birthDate",
        default,
        skip_serializing_if = "Option::is_none",
        with = "wire_date"
    )]
    pub birth_date: Option<WireDate>,
    #[serde(
        rename = "registerDate",
        default,
        skip_serializing_if = "Option::is_none",
        with = "wire_datetime"
    )]
    pub register_date: Option<WireDateTime>,
    #[serde(rename = "idBranch", default, skip_serializing_if = "Option::is_none")]
    pub id_branch: Option<i64>,
    #[serde(rename = "membershipStatus", default, skip_serializing_if = "Option::is_none")]
    pub membership_status: Option<MembershipStatus>,
    #[serde(rename = "contacts", default, skip_serializing_if = "Option::is_none")]
    pub contacts: Option<Vec<MemberContact>>,
}

impl Member {
    /// First and last name joined, skipping whichever is missing.
    pub fn full_name(&self) -> Option<String> {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
            (None, None) => None,
        }
    }
}

impl Model for Member {
    const NAME: &'static str = "Member";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("id_member", "idMember"),
        FieldSpec::new("first_name", "firstName"),
        FieldSpec::new("last_name", "lastName"),
        FieldSpec::new("document", "document"),
        FieldSpec::new("gender", "gender"),
        FieldSpec::new("birth_date", "birthDate"),
        FieldSpec::new("register_date", "registerDate"),
        FieldSpec::new("id_branch", "idBranch"),
        FieldSpec::new("membership_status", "membershipStatus"),
        FieldSpec::new("contacts", "contacts"),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing;
    use chrono::NaiveDate;

    fn contact() -> MemberContact {
        MemberContact {
            id_phone: Some(5),
            id_member: Some(42),
            contact_type: Some("Cellphone".to_string()),
            description: Some("+55 11 99999-0000".to_string()),
        }
    }

    fn populated() -> Member {
        Member {
            id_member: Some(42),
            first_name: Some("Ana".to_string()),
            last_name: Some("Souza".to_string()),
            document: Some("123.456.789-00".to_string()),
            gender: Some("F".to_string()),
            birth_date: NaiveDate::from_ymd_opt(1991, 8, 14).map(WireDate::from),
            register_date: NaiveDate::from_ymd_opt(2023, 1, 2)
                .and_then(|d| d.and_hms_opt(9, 0, 0))
                .map(WireDateTime::from),
            id_branch: Some(1),
            membership_status: Some(MembershipStatus::Active),
            contacts: Some(vec![contact()]),
        }
    }

    #[test]
    fn fields_and_round_trip() {
        testing::assert_fields_match(&contact());
        testing::assert_round_trip(&contact());
        testing::assert_fields_match(&populated());
        testing::assert_round_trip(&populated());
    }

    #[test]
    fn nested_contacts_decode_recursively() {
        let member = Member::from_wire(serde_json::json!({
            "idMember": 42,
            "contacts": [{"idPhone": 1, "contactType": "E-mail", "description": "ana@example.com"}]
        }))
        .unwrap();
        let contacts = member.contacts.unwrap();
        assert_eq!(contacts[0].description.as_deref(), Some("ana@example.com"));
        assert_eq!(contacts[0].id_member, None);
    }

    #[test]
    fn with_nulls_emits_every_alias() {
        let wire = Member {
            id_member: Some(1),
            ..Member::default()
        }
        .to_wire_with_nulls()
        .unwrap();
        assert_eq!(wire.len(), Member::FIELDS.len());
        assert!(wire["contacts"].is_null());
        assert_eq!(wire["idMember"], 1);
    }

    #[test]
    fn full_name_handles_missing_parts() {
        assert_eq!(populated().full_name().as_deref(), Some("Ana Souza"));
        assert_eq!(Member::default().full_name(), None);
    }
}
