//! Order aggregate and its lifecycle.
//!
//! ```text
//! PENDING ──► OPEN ──► COMPLETE
//!    │          └────► CANCELLED
//!    ├──────────────► COMPLETE
//!    └──────────────► REJECTED
//! ```
//!
//! Terminal states never change again.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{InstrumentId, OrderId, VenueOrderId};
use crate::error::{VenueError, VenueResult};

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Fill at the prevailing market price plus slippage.
    Market,
    /// Fill at the limit price once the market crosses it.
    Limit,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Market => write!(f, "MARKET"),
            Self::Limit => write!(f, "LIMIT"),
        }
    }
}

/// Transaction direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Buy.
    Buy,
    /// Sell.
    Sell,
}

impl TransactionType {
    /// Sign applied to quantities: Buy = +1, Sell = -1.
    #[must_use]
    pub fn sign(&self) -> Decimal {
        match self {
            Self::Buy => Decimal::ONE,
            Self::Sell => Decimal::NEGATIVE_ONE,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Accepted by the venue, not yet evaluated.
    Pending,
    /// Resting limit order waiting for the market to cross.
    Open,
    /// Fully filled.
    Complete,
    /// Cancelled by the caller.
    Cancelled,
    /// Rejected by the venue.
    Rejected,
}

impl OrderStatus {
    /// Returns true if the status can never change again.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Cancelled | Self::Rejected)
    }

    /// Returns true if the processing loop still has work to do for this order.
    #[must_use]
    pub const fn is_working(&self) -> bool {
        matches!(self, Self::Pending | Self::Open)
    }

    /// Returns true if the lifecycle allows moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Open | Self::Complete | Self::Rejected)
                | (Self::Open, Self::Complete | Self::Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Open => write!(f, "OPEN"),
            Self::Complete => write!(f, "COMPLETE"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// An order as tracked by a venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Caller-supplied identifier.
    pub id: OrderId,
    /// Instrument to trade.
    pub instrument_id: InstrumentId,
    /// Unsigned quantity; direction comes from `transaction_type`.
    pub quantity: Decimal,
    /// Limit price (None for market orders).
    pub price: Option<Decimal>,
    /// Market or limit.
    pub order_type: OrderType,
    /// Buy or sell.
    pub transaction_type: TransactionType,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Quantity filled so far.
    pub filled_quantity: Decimal,
    /// Average fill price, once filled.
    pub average_price: Option<Decimal>,
    /// Id assigned by the venue on acceptance.
    pub venue_order_id: Option<VenueOrderId>,
    /// Free-form caller tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    fn new(
        instrument_id: InstrumentId,
        transaction_type: TransactionType,
        order_type: OrderType,
        quantity: Decimal,
        price: Option<Decimal>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::generate(),
            instrument_id,
            quantity,
            price,
            order_type,
            transaction_type,
            status: OrderStatus::Pending,
            created_at: now,
            filled_quantity: Decimal::ZERO,
            average_price: None,
            venue_order_id: None,
            tags: Vec::new(),
            updated_at: now,
        }
    }

    /// Create a market order with a generated id.
    #[must_use]
    pub fn market(
        instrument_id: impl Into<InstrumentId>,
        transaction_type: TransactionType,
        quantity: Decimal,
    ) -> Self {
        Self::new(
            instrument_id.into(),
            transaction_type,
            OrderType::Market,
            quantity,
            None,
        )
    }

    /// Create a limit order with a generated id.
    #[must_use]
    pub fn limit(
        instrument_id: impl Into<InstrumentId>,
        transaction_type: TransactionType,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self::new(
            instrument_id.into(),
            transaction_type,
            OrderType::Limit,
            quantity,
            Some(price),
        )
    }

    /// Replace the generated id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<OrderId>) -> Self {
        self.id = id.into();
        self
    }

    /// Attach a caller tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Quantity with the direction applied (negative for sells).
    #[must_use]
    pub fn signed_quantity(&self) -> Decimal {
        self.quantity * self.transaction_type.sign()
    }

    /// Move to `next`, enforcing the lifecycle.
    pub fn transition_to(&mut self, next: OrderStatus) -> VenueResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(VenueError::InvalidOrderState {
                order_id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Mark the order completely filled at `price`.
    pub fn fill(&mut self, price: Decimal) -> VenueResult<()> {
        self.transition_to(OrderStatus::Complete)?;
        self.filled_quantity = self.quantity;
        self.average_price = Some(price);
        Ok(())
    }
}
