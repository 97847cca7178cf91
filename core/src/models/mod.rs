//! Typed models for the gym API resources.
//!
//! Every model implements [`crate::Model`]. Fields are all optional: the API
//! omits whatever it has no value for, and an unset field is left out of
//! the wire form again.

/// String-valued wire enum that keeps unrecognised values instead of failing.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            /// A value this client does not know about, kept verbatim.
            Unknown(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Unknown(raw) => raw.as_str(),
                }
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                match raw {
                    $($wire => Self::$variant,)+
                    other => Self::Unknown(other.to_string()),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
                Ok(Self::from(raw.as_str()))
            }
        }
    };
}

mod entry;
mod member;
mod receivable;
mod sale;
mod webhook;

pub use entry::{Entry, EntryAction};
pub use member::{Member, MemberContact, MembershipStatus};
pub use receivable::{Receivable, ReceivableStatus};
pub use sale::{MembershipItem, ProductItem, Sale, SaleItem, SaleItemKind, ServiceItem};
pub use webhook::{NewWebhook, Webhook, WebhookEvent, WebhookFilter};

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::BTreeSet;

    use crate::codec::Model;

    /// Wire keys of a fully populated value must match the declared aliases.
    pub(crate) fn assert_fields_match<M: Model>(populated: &M) {
        let wire: BTreeSet<String> = populated.to_wire().unwrap().keys().cloned().collect();
        let declared: BTreeSet<String> = M::FIELDS.iter().map(|f| f.alias.to_string()).collect();
        assert_eq!(wire, declared, "{} FIELDS out of sync with serde", M::NAME);
    }

    /// `from_wire(to_wire(v)) == v` for a value and for its empty form.
    pub(crate) fn assert_round_trip<M: Model + Default + PartialEq + std::fmt::Debug>(populated: &M) {
        for value in [populated, &M::default()] {
            let wire = serde_json::Value::Object(value.to_wire().unwrap());
            assert_eq!(&M::from_wire(wire).unwrap(), value);
        }
    }

    /// `to_wire(from_wire(w)) == w`: decoding then encoding reproduces the
    /// alias-keyed input.
    pub(crate) fn assert_wire_round_trip<M: Model>(wire: serde_json::Value) {
        let decoded = M::from_wire(wire.clone()).unwrap();
        let encoded = serde_json::Value::Object(decoded.to_wire().unwrap());
        assert_eq!(encoded, wire, "{} did not re-encode to its input", M::NAME);
    }
}
