//! Per-broker results of fan-out queries.

use serde::Serialize;

use crate::error::VenueResult;

/// One broker's answer to an aggregated query.
///
/// Failures are kept as their message so one bad venue never hides the
/// others' data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrokerSlot<T> {
    /// Broker that answered.
    pub broker: String,
    /// Data, or the error message.
    pub result: Result<T, String>,
}

impl<T> BrokerSlot<T> {
    pub(crate) fn from_venue(broker: impl Into<String>, result: VenueResult<T>) -> Self {
        Self {
            broker: broker.into(),
            result: result.map_err(|e| e.to_string()),
        }
    }

    /// Returns true if the broker answered successfully.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// The data, if the query succeeded.
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    /// The error message, if the query failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.result.as_ref().err().map(String::as_str)
    }
}
