//! Events a venue publishes as orders progress.

use serde::{Deserialize, Serialize};

use super::{Order, Position, Trade};

/// Venue event, broadcast to every subscriber of a venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum VenueEvent {
    /// An order was accepted or changed status.
    OrderUpdate(Order),
    /// An order was filled.
    Trade(Trade),
    /// A position changed after a fill.
    PositionUpdate(Position),
}
