//! Commission model for simulated fills.
//!
//! A discount-broker schedule: flat brokerage per order, securities
//! transaction tax (sell side for equities, both sides for derivatives), an
//! exchange transaction charge and GST on brokerage plus transaction charge.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::VenueConfig;
use crate::models::{InstrumentId, TransactionType};

/// GST applied to brokerage and transaction charges.
pub const GST_RATE: Decimal = dec!(0.18);

/// Commission rates expressed as fractions of notional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSchedule {
    /// Flat charge per filled order.
    pub brokerage_per_order: Decimal,
    /// STT as a fraction of notional.
    pub stt_rate: Decimal,
    /// Transaction charge as a fraction of notional.
    pub transaction_charge_rate: Decimal,
}

impl CommissionSchedule {
    /// Build from a venue config, whose rates are in percent.
    #[must_use]
    pub fn from_config(config: &VenueConfig) -> Self {
        Self {
            brokerage_per_order: config.brokerage_per_order,
            stt_rate: config.stt_rate / Decimal::ONE_HUNDRED,
            transaction_charge_rate: config.transaction_charge_rate / Decimal::ONE_HUNDRED,
        }
    }
}

impl Default for CommissionSchedule {
    fn default() -> Self {
        Self::from_config(&VenueConfig::default())
    }
}

/// Itemized charges for one fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionBreakdown {
    /// Flat brokerage.
    pub brokerage: Decimal,
    /// Securities transaction tax.
    pub stt: Decimal,
    /// Exchange transaction charge.
    pub transaction_charge: Decimal,
    /// GST on brokerage and transaction charge.
    pub gst: Decimal,
}

impl CommissionBreakdown {
    /// Sum of all components, rounded to 2 decimals (midpoint away from zero).
    #[must_use]
    pub fn total(&self) -> Decimal {
        (self.brokerage + self.stt + self.transaction_charge + self.gst)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// Itemize the charges for a fill.
#[must_use]
pub fn commission_breakdown(
    schedule: &CommissionSchedule,
    instrument_id: &InstrumentId,
    side: TransactionType,
    quantity: Decimal,
    price: Decimal,
) -> CommissionBreakdown {
    let notional = price * quantity;
    let brokerage = schedule.brokerage_per_order;

    let stt = if side == TransactionType::Sell || instrument_id.is_derivative() {
        notional * schedule.stt_rate
    } else {
        Decimal::ZERO
    };

    let transaction_charge = notional * schedule.transaction_charge_rate;
    let gst = (brokerage + transaction_charge) * GST_RATE;

    CommissionBreakdown {
        brokerage,
        stt,
        transaction_charge,
        gst,
    }
}

/// Total commission for a fill, rounded to 2 decimals.
#[must_use]
pub fn calculate_commission(
    schedule: &CommissionSchedule,
    instrument_id: &InstrumentId,
    side: TransactionType,
    quantity: Decimal,
    price: Decimal,
) -> Decimal {
    commission_breakdown(schedule, instrument_id, side, quantity, price).total()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equity() -> InstrumentId {
        InstrumentId::new("NSE:RELIANCE")
    }

    #[test]
    fn equity_buy_has_no_stt() {
        let schedule = CommissionSchedule::default();
        // notional 2000: txn 0.065, gst (20 + 0.065) * 0.18 = 3.6117
        let commission =
            calculate_commission(&schedule, &equity(), TransactionType::Buy, dec!(2), dec!(1000));
        assert_eq!(commission, dec!(23.68));
    }

    #[test]
    fn equity_sell_pays_stt() {
        let schedule = CommissionSchedule::default();
        let breakdown =
            commission_breakdown(&schedule, &equity(), TransactionType::Sell, dec!(2), dec!(1000));
        assert_eq!(breakdown.stt, dec!(0.5));
        // 20 + 0.5 + 0.065 + 3.6117 = 24.1767
        assert_eq!(breakdown.total(), dec!(24.18));
    }

    #[test]
    fn derivatives_pay_stt_on_both_sides() {
        let schedule = CommissionSchedule::default();
        for id in ["NFO:NIFTY.OPT.24000CE", "NFO:NIFTY.FUT.JAN"] {
            let breakdown = commission_breakdown(
                &schedule,
                &InstrumentId::new(id),
                TransactionType::Buy,
                dec!(50),
                dec!(200),
            );
            assert_eq!(breakdown.stt, dec!(2.5));
        }
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        let schedule = CommissionSchedule {
            brokerage_per_order: Decimal::ZERO,
            stt_rate: dec!(0.005),
            transaction_charge_rate: Decimal::ZERO,
        };
        // STT of exactly 0.005 sits on the midpoint; banker's rounding would give 0.00
        let commission =
            calculate_commission(&schedule, &equity(), TransactionType::Sell, dec!(1), dec!(1));
        assert_eq!(commission, dec!(0.01));
    }

    #[test]
    fn schedule_converts_percent_rates() {
        let schedule = CommissionSchedule::default();
        assert_eq!(schedule.stt_rate, dec!(0.00025));
        assert_eq!(schedule.transaction_charge_rate, dec!(0.0000325));
    }
}
