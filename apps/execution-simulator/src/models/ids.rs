//! Strongly-typed identifiers.
//!
//! Keeps caller order ids, venue-assigned ids, trade ids and instruments from
//! being mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from a string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Generate a unique identifier (UUID v4).
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Borrow the inner string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

define_id!(OrderId, "Caller-supplied identifier for an order.");
define_id!(VenueOrderId, "Identifier a venue assigns to an accepted order.");
define_id!(TradeId, "Identifier for an executed trade.");
define_id!(
    InstrumentId,
    "Instrument identifier (e.g. `NSE:RELIANCE`, `NFO:NIFTY.OPT.24000CE`)."
);

impl VenueOrderId {
    /// Generate a paper venue id of the form `PAPER_XXXXXXXX`.
    #[must_use]
    pub fn paper() -> Self {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("PAPER_{}", uuid[..8].to_uppercase()))
    }
}

impl InstrumentId {
    /// Returns true for derivative instruments (`.OPT.` or `.FUT.` in the id).
    #[must_use]
    pub fn is_derivative(&self) -> bool {
        self.0.contains(".OPT.") || self.0.contains(".FUT.")
    }

    /// Returns true for option instruments.
    #[must_use]
    pub fn is_option(&self) -> bool {
        self.0.contains(".OPT.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_new_and_display() {
        let id = OrderId::new("ord-123");
        assert_eq!(id.as_str(), "ord-123");
        assert_eq!(format!("{id}"), "ord-123");
    }

    #[test]
    fn order_id_generate_is_unique() {
        assert_ne!(OrderId::generate(), OrderId::generate());
    }

    #[test]
    fn ids_from_strings() {
        let id: InstrumentId = "NSE:INFY".into();
        assert_eq!(id.as_str(), "NSE:INFY");
        let id: TradeId = String::from("t-1").into();
        assert_eq!(id.into_inner(), "t-1");
    }

    #[test]
    fn paper_venue_id_format() {
        let id = VenueOrderId::paper();
        let s = id.as_str();
        assert!(s.starts_with("PAPER_"));
        assert_eq!(s.len(), "PAPER_".len() + 8);
        assert!(s[6..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn derivative_detection() {
        assert!(InstrumentId::new("NFO:NIFTY.OPT.24000CE").is_derivative());
        assert!(InstrumentId::new("NFO:BANKNIFTY.FUT.JAN").is_derivative());
        assert!(InstrumentId::new("NFO:NIFTY.OPT.24000CE").is_option());
        assert!(!InstrumentId::new("NSE:RELIANCE").is_derivative());
    }

    #[test]
    fn serde_is_transparent() {
        let id = InstrumentId::new("NSE:TCS");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"NSE:TCS\"");
    }
}
