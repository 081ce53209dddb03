//! Data model shared by venues and the broker manager.

mod account;
mod event;
mod health;
mod ids;
mod order;
mod position;
mod quote;
mod trade;

pub use account::{AccountBalance, Holding};
pub use event::VenueEvent;
pub use health::{HealthStatus, VenueHealth};
pub use ids::{InstrumentId, OrderId, TradeId, VenueOrderId};
pub use order::{Order, OrderStatus, OrderType, TransactionType};
pub use position::Position;
pub use quote::Quote;
pub use trade::Trade;
