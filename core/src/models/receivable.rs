use serde::{Deserialize, Serialize};

use crate::codec::{wire_date, FieldSpec, Model, WireDate};

wire_enum! {
    pub enum ReceivableStatus {
        Open => "Open",
        Received => "Received",
        Canceled => "Canceled",
        Overdue => "Overdue",
    }
}

/// An amount a member owes, or has paid, for a sale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Receivable {
    #[serde(rename = "idReceivable", default, skip_serializing_if = "Option::is_none")]
    pub id_receivable: Option<i64>,
    #[serde(rename = "idSale", default, skip_serializing_if = "Option::is_none")]
    pub id_sale: Option<i64>,
    #[serde(rename = "idMember", default, skip_serializing_if = "Option::is_none")]
    pub id_member: Option<i64>,
    #[serde(rename = "description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "ammount", default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(rename = "ammountPaid", default, skip_serializing_if = "Option::is_none")]
    pub amount_paid: Option<f64>,
    #[serde(
        rename = "dueDate",
        default,
        skip_serializing_if = "Option::is_none",
        with = "wire_date"
    )]
    pub due_date: Option<WireDate>,
    #[serde(
        rename = "receivingDate",
        default,
        skip_serializing_if = "Option::is_none",
        with = "wire_date"
    )]
    pub receiving_date: Option<WireDate>,
    #[serde(rename = "status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReceivableStatus>,
}

impl Receivable {
    /// Amount still open, never negative.
    pub fn outstanding(&self) -> f64 {
        (self.amount.unwrap_or(0.0) - self.amount_paid.unwrap_or(0.0)).max(0.0)
    }
}

impl Model for Receivable {
    const NAME: &'static str = "Receivable";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("id_receivable", "idReceivable"),
        FieldSpec::new("id_sale", "idSale"),
        FieldSpec::new("id_member", "idMember"),
        FieldSpec::new("description", "description"),
        FieldSpec::new("amount", "ammount"),
        FieldSpec::new("amount_paid", "ammountPaid"),
        FieldSpec::new("due_date", "dueDate"),
        FieldSpec::new("receiving_date", "receivingDate"),
        FieldSpec::new("status", "status"),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing;
    use chrono::NaiveDate;

    #[test]
    fn fields_and_round_trip() {
        let receivable = Receivable {
            id_receivable: Some(77),
            id_sale: Some(900),
            id_member: Some(42),
            description: Some("Annual plan 1/12".to_string()),
            amount: Some(100.0),
            amount_paid: Some(40.0),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 10).map(WireDate::from),
            receiving_date: NaiveDate::from_ymd_opt(2024, 3, 9).map(WireDate::from),
            status: Some(ReceivableStatus::Open),
        };
        testing::assert_fields_match(&receivable);
        testing::assert_round_trip(&receivable);
        assert_eq!(receivable.outstanding(), 60.0);
    }

    #[test]
    fn due_date_accepts_datetime_strings() {
        let receivable =
            Receivable::from_wire(serde_json::json!({"dueDate": "2024-03-10T00:00:00", "status": "Received"}))
                .unwrap();
        assert_eq!(receivable.due_date.as_ref().map(WireDate::date), NaiveDate::from_ymd_opt(2024, 3, 10));
        assert_eq!(receivable.to_wire().unwrap()["dueDate"], "2024-03-10T00:00:00");
        assert_eq!(receivable.status, Some(ReceivableStatus::Received));
    }
}
