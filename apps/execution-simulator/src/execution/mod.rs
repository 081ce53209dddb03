//! Paper execution: the simulated venue and its fill model.
//!
//! # Module Structure
//!
//! - [`commission`]: brokerage, STT, transaction charge and GST
//! - [`slippage`]: adverse price adjustment for market orders
//! - `book`: order, position, trade and cash tables
//! - `processor`: background order-processing loop
//! - `paper`: the [`PaperVenue`] adapter

pub mod commission;
pub mod slippage;

mod book;
mod paper;
mod processor;

pub use commission::{CommissionBreakdown, CommissionSchedule, calculate_commission};
pub use paper::PaperVenue;
pub use slippage::apply_slippage;
