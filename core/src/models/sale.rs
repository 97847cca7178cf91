use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::codec::{wire_datetime, FieldSpec, Model, WireDateTime};

/// Variant tags of [`SaleItem`], as they appear in `itemType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaleItemKind {
    Membership,
    Service,
    Product,
}

impl SaleItemKind {
    pub const ALL: [SaleItemKind; 3] = [Self::Membership, Self::Service, Self::Product];

    pub fn discriminator(self) -> &'static str {
        match self {
            Self::Membership => "Membership",
            Self::Service => "Service",
            Self::Product => "Product",
        }
    }

    /// Resolve an `itemType` value against the declared variants.
    pub fn from_discriminator(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.discriminator() == raw)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MembershipItem {
    #[serde(rename = "idMembership", default, skip_serializing_if = "Option::is_none")]
    pub id_membership: Option<i64>,
    #[serde(rename = "description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "value", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(rename = "discount", default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
    #[serde(
        rename = "membershipStart",
        default,
        skip_serializing_if = "Option::is_none",
        with = "wire_datetime"
    )]
    pub membership_start: Option<WireDateTime>,
}

impl Model for MembershipItem {
    const NAME: &'static str = "MembershipItem";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("id_membership", "idMembership"),
        FieldSpec::new("description", "description"),
        FieldSpec::new("value", "value"),
        FieldSpec::new("discount", "discount"),
        FieldSpec::new("membership_start", "membershipStart"),
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceItem {
    #[serde(rename = "idService", default, skip_serializing_if = "Option::is_none")]
    pub id_service: Option<i64>,
    #[serde(rename = "description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "quantity", default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(rename = "value", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl Model for ServiceItem {
    const NAME: &'static str = "ServiceItem";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("id_service", "idService"),
        FieldSpec::new("description", "description"),
        FieldSpec::new("quantity", "quantity"),
        FieldSpec::new("value", "value"),
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductItem {
    #[serde(rename = "idProduct", default, skip_serializing_if = "Option::is_none")]
    pub id_product: Option<i64>,
    #[serde(rename = "description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "quantity", default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(rename = "value", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl Model for ProductItem {
    const NAME: &'static str = "ProductItem";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("id_product", "idProduct"),
        FieldSpec::new("description", "description"),
        FieldSpec::new("quantity", "quantity"),
        FieldSpec::new("value", "value"),
    ];
}

/// One line of a sale, tagged by `itemType`.
///
/// The set of variants is closed: an `itemType` outside
/// [`SaleItemKind::ALL`] fails decoding instead of guessing a variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "itemType")]
pub enum SaleItem {
    Membership(MembershipItem),
    Service(ServiceItem),
    Product(ProductItem),
}

impl SaleItem {
    pub fn kind(&self) -> SaleItemKind {
        match self {
            Self::Membership(_) => SaleItemKind::Membership,
            Self::Service(_) => SaleItemKind::Service,
            Self::Product(_) => SaleItemKind::Product,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Membership(item) => item.description.as_deref(),
            Self::Service(item) => item.description.as_deref(),
            Self::Product(item) => item.description.as_deref(),
        }
    }
}

impl<'de> Deserialize<'de> for SaleItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let tag = value
            .get("itemType")
            .and_then(Value::as_str)
            .ok_or_else(|| D::Error::missing_field("itemType"))?;
        let kind = SaleItemKind::from_discriminator(tag).ok_or_else(|| {
            D::Error::unknown_variant(tag, &["Membership", "Service", "Product"])
        })?;
        let item = match kind {
            SaleItemKind::Membership => serde_json::from_value(value).map(Self::Membership),
            SaleItemKind::Service => serde_json::from_value(value).map(Self::Service),
            SaleItemKind::Product => serde_json::from_value(value).map(Self::Product),
        };
        item.map_err(D::Error::custom)
    }
}

impl Model for SaleItem {
    const NAME: &'static str = "SaleItem";
    /// Only the tag is shared; variant fields are declared by the item models.
    const FIELDS: &'static [FieldSpec] = &[FieldSpec {
        name: "kind",
        alias: "itemType",
        nullable: false,
    }];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    #[serde(rename = "idSale", default, skip_serializing_if = "Option::is_none")]
    pub id_sale: Option<i64>,
    #[serde(rename = "idMember", default, skip_serializing_if = "Option::is_none")]
    pub id_member: Option<i64>,
    #[serde(rename = "idBranch", default, skip_serializing_if = "Option::is_none")]
    pub id_branch: Option<i64>,
    #[serde(
        rename = "saleDate",
        default,
        skip_serializing_if = "Option::is_none",
        with = "wire_datetime"
    )]
    pub sale_date: Option<WireDateTime>,
    #[serde(rename = "observations", default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<String>,
    #[serde(rename = "removed", default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<bool>,
    #[serde(rename = "saleItens", default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<SaleItem>>,
}

impl Sale {
    /// Sum of item values, ignoring items without one.
    pub fn total(&self) -> f64 {
        self.items
            .iter()
            .flatten()
            .map(|item| match item {
                SaleItem::Membership(m) => m.value.unwrap_or(0.0) - m.discount.unwrap_or(0.0),
                SaleItem::Service(s) => s.value.unwrap_or(0.0) * s.quantity.unwrap_or(1) as f64,
                SaleItem::Product(p) => p.value.unwrap_or(0.0) * p.quantity.unwrap_or(1) as f64,
            })
            .sum()
    }
}

impl Model for Sale {
    const NAME: &'static str = "Sale";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("id_sale", "idSale"),
        FieldSpec::new("id_member", "idMember"),
        FieldSpec::new("id_branch", "idBranch"),
        FieldSpec::new("sale_date", "saleDate"),
        FieldSpec::new("observations", "observations"),
        FieldSpec::new("removed", "removed"),
        FieldSpec::new("items", "saleItens"),
    ];
}
