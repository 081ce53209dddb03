//! In-memory order, position, trade and cash tables for one venue.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::{VenueError, VenueResult};
use crate::models::{
    InstrumentId, Order, OrderId, OrderStatus, Position, Trade, TradeId,
};

/// Everything a fill changed, returned so the caller can publish it.
#[derive(Debug, Clone)]
pub(crate) struct FillOutcome {
    pub order: Order,
    pub trade: Trade,
    pub position: Position,
}

/// The venue's books. Lives behind a single lock so a fill mutates the order,
/// trade log, position and cash together.
#[derive(Debug)]
pub(crate) struct VenueBook {
    orders: HashMap<OrderId, Order>,
    sequence: Vec<OrderId>,
    positions: HashMap<InstrumentId, Position>,
    trades: Vec<Trade>,
    cash: Decimal,
    realized_pnl: Decimal,
}

impl VenueBook {
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            orders: HashMap::new(),
            sequence: Vec::new(),
            positions: HashMap::new(),
            trades: Vec::new(),
            cash: initial_cash,
            realized_pnl: Decimal::ZERO,
        }
    }

    pub fn insert(&mut self, order: Order) -> VenueResult<()> {
        if self.orders.contains_key(&order.id) {
            return Err(VenueError::InvalidOrder(format!(
                "duplicate order id {}",
                order.id
            )));
        }
        self.sequence.push(order.id.clone());
        self.orders.insert(order.id.clone(), order);
        Ok(())
    }

    pub fn order(&self, order_id: &OrderId) -> Option<&Order> {
        self.orders.get(order_id)
    }

    /// All orders in submission order.
    pub fn orders(&self) -> Vec<Order> {
        self.sequence
            .iter()
            .filter_map(|id| self.orders.get(id))
            .cloned()
            .collect()
    }

    /// PENDING and OPEN orders in submission order.
    pub fn working_orders(&self) -> Vec<Order> {
        self.sequence
            .iter()
            .filter_map(|id| self.orders.get(id))
            .filter(|order| order.status.is_working())
            .cloned()
            .collect()
    }

    pub fn positions(&self) -> Vec<Position> {
        let mut positions: Vec<_> = self.positions.values().cloned().collect();
        positions.sort_by(|a, b| a.instrument_id.cmp(&b.instrument_id));
        positions
    }

    pub fn position(&self, instrument_id: &InstrumentId) -> Option<Position> {
        self.positions.get(instrument_id).cloned()
    }

    /// Trades with `start <= timestamp <= end`, either bound optional.
    pub fn trades_between(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Vec<Trade> {
        self.trades
            .iter()
            .filter(|trade| start.is_none_or(|start| trade.timestamp >= start))
            .filter(|trade| end.is_none_or(|end| trade.timestamp <= end))
            .cloned()
            .collect()
    }

    pub const fn cash(&self) -> Decimal {
        self.cash
    }

    pub const fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    /// Move an order to `next`, returning the updated order.
    pub fn transition(&mut self, order_id: &OrderId, next: OrderStatus) -> VenueResult<Order> {
        let order = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| VenueError::OrderNotFound(order_id.to_string()))?;
        order.transition_to(next)?;
        Ok(order.clone())
    }

    /// Cancel an OPEN order. Returns None when the order is unknown or not OPEN.
    pub fn cancel(&mut self, order_id: &OrderId) -> Option<Order> {
        let order = self.orders.get_mut(order_id)?;
        if order.status != OrderStatus::Open {
            return None;
        }
        order.transition_to(OrderStatus::Cancelled).ok()?;
        Some(order.clone())
    }

    /// Replace quantity and/or price of an OPEN order.
    pub fn modify(
        &mut self,
        order_id: &OrderId,
        quantity: Option<Decimal>,
        price: Option<Decimal>,
    ) -> Option<Order> {
        let order = self.orders.get_mut(order_id)?;
        if order.status != OrderStatus::Open {
            return None;
        }
        if let Some(quantity) = quantity {
            order.quantity = quantity;
        }
        if price.is_some() {
            order.price = price;
        }
        order.updated_at = Utc::now();
        Some(order.clone())
    }

    /// Complete an order at `price`, booking the trade, position and cash together.
    pub fn fill(
        &mut self,
        order_id: &OrderId,
        price: Decimal,
        commission: Decimal,
    ) -> VenueResult<FillOutcome> {
        let order = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| VenueError::OrderNotFound(order_id.to_string()))?;
        order.fill(price)?;
        let order = order.clone();

        let trade = Trade {
            id: TradeId::generate(),
            order_id: order.id.clone(),
            instrument_id: order.instrument_id.clone(),
            quantity: order.quantity,
            price,
            transaction_type: order.transaction_type,
            timestamp: Utc::now(),
            commission,
        };

        let position = self
            .positions
            .entry(order.instrument_id.clone())
            .or_insert_with(|| Position::flat(order.instrument_id.clone()));
        let realized = position.apply_fill(order.transaction_type, order.quantity, price);
        let position = position.clone();
        if position.is_flat() {
            self.positions.remove(&position.instrument_id);
        }

        self.realized_pnl += realized;
        self.cash += trade.cash_delta();
        self.trades.push(trade.clone());

        Ok(FillOutcome {
            order,
            trade,
            position,
        })
    }
}
