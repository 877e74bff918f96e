//! Trade execution record
//!
//! A trade is the write-once result of crossing a buy order with a sell
//! order. Buy/sell fields are assigned by side, regardless of which order
//! was the incoming one.

use crate::ids::{OrderId, Symbol, TradeId, UserId};
use crate::numeric::{Price, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An executed trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub symbol: Symbol,

    // Order references
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,

    // Participant references
    pub buy_user: UserId,
    pub sell_user: UserId,

    // Execution details (price is the resting order's limit price)
    pub quantity: Quantity,
    pub price: Price,

    /// Venue-assigned unix milliseconds
    pub executed_at: i64,
}

impl Trade {
    /// Create a new trade record
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        trade_id: TradeId,
        symbol: Symbol,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        buy_user: UserId,
        sell_user: UserId,
        quantity: Quantity,
        price: Price,
        executed_at: i64,
    ) -> Self {
        Self {
            trade_id,
            symbol,
            buy_order_id,
            sell_order_id,
            buy_user,
            sell_user,
            quantity,
            price,
            executed_at,
        }
    }

    /// Trade notional (price × quantity), exact
    pub fn notional(&self) -> Decimal {
        self.quantity.as_decimal() * self.price.as_decimal()
    }

    /// Check whether the same participant is on both sides
    pub fn is_self_trade(&self) -> bool {
        self.buy_user == self.sell_user
    }
}
