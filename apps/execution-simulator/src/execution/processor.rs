//! Order-processing loop of a paper venue.
//!
//! Each pass snapshots the PENDING and OPEN orders and walks them in
//! submission order:
//!
//! 1. PENDING orders wait out a simulated latency, then may be rejected.
//! 2. MARKET orders fill at the market price moved against the taker.
//! 3. LIMIT orders fill at their limit once the market crosses it, otherwise
//!    they rest as OPEN and are looked at again on the next pass.
//!
//! The fill itself happens under the book's write lock after re-checking that
//! the order is unchanged, so a concurrent cancel or modify wins cleanly.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

use super::commission::calculate_commission;
use super::paper::VenueShared;
use super::slippage::apply_slippage;
use crate::error::VenueResult;
use crate::models::{Order, OrderId, OrderStatus, OrderType, TransactionType, VenueEvent};
use crate::observability;

/// Run until `shutdown` is cancelled.
pub(super) async fn run(shared: Arc<VenueShared>, shutdown: CancellationToken) {
    tracing::debug!(venue = %shared.name, "Order processing loop started");
    loop {
        process_pass(&shared, &shutdown).await;
        tokio::select! {
            () = tokio::time::sleep(shared.simulation.scan_interval()) => {}
            () = shutdown.cancelled() => break,
        }
    }
    tracing::debug!(venue = %shared.name, "Order processing loop stopped");
}

async fn process_pass(shared: &VenueShared, shutdown: &CancellationToken) {
    let working = shared.book.read().working_orders();
    for order in working {
        if shutdown.is_cancelled() {
            return;
        }
        if let Err(e) = process_order(shared, &order.id, shutdown).await {
            tracing::warn!(
                venue = %shared.name,
                order_id = %order.id,
                error = %e,
                "Failed to process order"
            );
        }
    }
}

async fn process_order(
    shared: &VenueShared,
    order_id: &OrderId,
    shutdown: &CancellationToken,
) -> VenueResult<()> {
    let Some(order) = current_order(shared, order_id) else {
        return Ok(());
    };

    if order.status == OrderStatus::Pending {
        let latency = shared
            .rng
            .lock()
            .integer(shared.simulation.latency_min_ms, shared.simulation.latency_max_ms);
        if latency > 0 {
            tokio::select! {
                () = tokio::time::sleep(Duration::from_millis(latency)) => {}
                () = shutdown.cancelled() => return Ok(()),
            }
        }

        let rejected = shared.rng.lock().chance(shared.simulation.reject_probability);
        if rejected {
            return reject(shared, order_id, "simulated");
        }
    }

    // Re-read: the order may have been modified while we waited.
    let Some(order) = current_order(shared, order_id) else {
        return Ok(());
    };
    let market_price = shared.market.market_price(&order.instrument_id);

    let fill_price = match order.order_type {
        OrderType::Market => {
            let pct = shared
                .rng
                .lock()
                .uniform(0.0, shared.simulation.max_slippage_pct);
            let pct = Decimal::from_f64_retain(pct).unwrap_or_default();
            apply_slippage(market_price, order.transaction_type, pct)
        }
        OrderType::Limit => {
            let Some(limit) = order.price else {
                return reject(shared, order_id, "missing_limit_price");
            };
            if !limit_crossed(order.transaction_type, market_price, limit) {
                if order.status == OrderStatus::Pending {
                    rest_open(shared, &order)?;
                }
                return Ok(());
            }
            limit
        }
    };

    fill(shared, &order, fill_price)
}

/// BUY fills when the market is at or below the limit, SELL at or above.
pub(crate) fn limit_crossed(side: TransactionType, market_price: Decimal, limit: Decimal) -> bool {
    match side {
        TransactionType::Buy => market_price <= limit,
        TransactionType::Sell => market_price >= limit,
    }
}

fn current_order(shared: &VenueShared, order_id: &OrderId) -> Option<Order> {
    shared
        .book
        .read()
        .order(order_id)
        .filter(|order| order.status.is_working())
        .cloned()
}

fn reject(shared: &VenueShared, order_id: &OrderId, reason: &str) -> VenueResult<()> {
    {
        let mut book = shared.book.write();
        if book.order(order_id).map(|o| o.status) != Some(OrderStatus::Pending) {
            return Ok(());
        }
        let order = book.transition(order_id, OrderStatus::Rejected)?;
        let _ = shared.events.send(VenueEvent::OrderUpdate(order));
    }
    observability::record_order_rejected(&shared.name, reason);
    tracing::info!(venue = %shared.name, order_id = %order_id, reason, "Order rejected");
    Ok(())
}

fn rest_open(shared: &VenueShared, snapshot: &Order) -> VenueResult<()> {
    let mut book = shared.book.write();
    if book.order(&snapshot.id).map(|o| o.status) != Some(OrderStatus::Pending) {
        return Ok(());
    }
    let order = book.transition(&snapshot.id, OrderStatus::Open)?;
    tracing::debug!(
        venue = %shared.name,
        order_id = %order.id,
        limit = ?order.price,
        "Limit order resting"
    );
    let _ = shared.events.send(VenueEvent::OrderUpdate(order));
    Ok(())
}

fn fill(shared: &VenueShared, snapshot: &Order, price: Decimal) -> VenueResult<()> {
    let commission = calculate_commission(
        &shared.schedule,
        &snapshot.instrument_id,
        snapshot.transaction_type,
        snapshot.quantity,
        price,
    );

    let outcome = {
        let mut book = shared.book.write();
        let unchanged = book.order(&snapshot.id).is_some_and(|current| {
            current.status == snapshot.status
                && current.quantity == snapshot.quantity
                && current.price == snapshot.price
        });
        if !unchanged {
            return Ok(());
        }
        let outcome = book.fill(&snapshot.id, price, commission)?;
        let _ = shared.events.send(VenueEvent::OrderUpdate(outcome.order.clone()));
        let _ = shared.events.send(VenueEvent::Trade(outcome.trade.clone()));
        let _ = shared
            .events
            .send(VenueEvent::PositionUpdate(outcome.position.clone()));
        outcome
    };

    observability::record_order_filled(&shared.name, &snapshot.order_type.to_string());
    tracing::info!(
        venue = %shared.name,
        order_id = %outcome.order.id,
        instrument = %outcome.trade.instrument_id,
        side = %outcome.trade.transaction_type,
        quantity = %outcome.trade.quantity,
        price = %outcome.trade.price,
        commission = %outcome.trade.commission,
        "Order executed"
    );
    Ok(())
}
