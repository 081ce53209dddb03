//! Property tests for charges, slippage and position averaging.

// Allow unwrap in tests - tests should panic on unexpected errors
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use execution_simulator::execution::{CommissionSchedule, apply_slippage, calculate_commission};
use execution_simulator::{InstrumentId, Position, TransactionType};

/// Prices in paise, 0.01 to 50,000.00.
fn price() -> impl Strategy<Value = Decimal> {
    (1_i64..=5_000_000).prop_map(|paise| Decimal::new(paise, 2))
}

fn quantity() -> impl Strategy<Value = Decimal> {
    (1_i64..=10_000).prop_map(Decimal::from)
}

fn side() -> impl Strategy<Value = TransactionType> {
    prop_oneof![Just(TransactionType::Buy), Just(TransactionType::Sell)]
}

fn instrument() -> impl Strategy<Value = InstrumentId> {
    prop_oneof![
        Just(InstrumentId::new("NSE:INFY")),
        Just(InstrumentId::new("NFO:NIFTY.OPT.24000CE")),
        Just(InstrumentId::new("NFO:BANKNIFTY.FUT")),
    ]
}

proptest! {
    #[test]
    fn commission_never_below_brokerage(
        instrument in instrument(),
        side in side(),
        quantity in quantity(),
        price in price(),
    ) {
        let schedule = CommissionSchedule::default();
        let commission = calculate_commission(&schedule, &instrument, side, quantity, price);
        prop_assert!(commission >= schedule.brokerage_per_order);
    }

    #[test]
    fn commission_grows_with_quantity(
        instrument in instrument(),
        side in side(),
        quantity in quantity(),
        extra in quantity(),
        price in price(),
    ) {
        let schedule = CommissionSchedule::default();
        let smaller = calculate_commission(&schedule, &instrument, side, quantity, price);
        let larger = calculate_commission(&schedule, &instrument, side, quantity + extra, price);
        prop_assert!(larger >= smaller);
    }

    #[test]
    fn slippage_is_always_adverse(
        price in price(),
        slippage in (0_i64..=200).prop_map(|bp| Decimal::new(bp, 2)),
    ) {
        prop_assert!(apply_slippage(price, TransactionType::Buy, slippage) >= price);
        prop_assert!(apply_slippage(price, TransactionType::Sell, slippage) <= price);
    }

    #[test]
    fn average_price_is_quantity_weighted(
        side in side(),
        fills in prop::collection::vec((quantity(), price()), 1..20),
    ) {
        let mut position = Position::flat(InstrumentId::new("NSE:TCS"));
        for (quantity, price) in &fills {
            let realized = position.apply_fill(side, *quantity, *price);
            prop_assert_eq!(realized, Decimal::ZERO);
        }

        let total: Decimal = fills.iter().map(|(quantity, _)| *quantity).sum();
        let notional: Decimal = fills.iter().map(|(quantity, price)| quantity * price).sum();
        let expected = notional / total;

        prop_assert_eq!(position.quantity, total * side.sign());
        prop_assert!((position.average_price - expected).abs() < dec!(0.000001));
    }
}
