//! Trade construction
//!
//! Builds trade records during matching, assigning venue-scoped trade ids
//! and mapping maker/taker onto buy/sell fields by side. Matching itself
//! never fails: a same-user match is booked like any other trade and any
//! prevention policy belongs to the venue.

use types::ids::{IdAllocator, OrderId, Symbol, TradeId, UserId};
use types::numeric::{Price, Quantity};
use types::order::Side;
use types::trade::Trade;

/// Trade factory with a venue-scoped id allocator
#[derive(Debug, Clone)]
pub struct MatchExecutor {
    trade_ids: IdAllocator,
}

impl MatchExecutor {
    /// Create a new executor; the first trade id issued is 1
    pub fn new() -> Self {
        Self {
            trade_ids: IdAllocator::new(),
        }
    }

    /// Build the trade for one execution
    ///
    /// `taker_side` is the incoming order's side; the maker is the resting
    /// order and sets the execution price. Buy/sell fields are assigned by
    /// side regardless of which order was incoming.
    #[allow(clippy::too_many_arguments)]
    pub fn execute_trade(
        &mut self,
        symbol: Symbol,
        taker_side: Side,
        taker_order_id: OrderId,
        taker_user: UserId,
        maker_order_id: OrderId,
        maker_user: UserId,
        price: Price,
        quantity: Quantity,
        executed_at: i64,
    ) -> Trade {
        let trade_id = TradeId::from_u64(self.trade_ids.next_id());

        let (buy_order_id, buy_user, sell_order_id, sell_user) = match taker_side {
            Side::Buy => (taker_order_id, taker_user, maker_order_id, maker_user),
            Side::Sell => (maker_order_id, maker_user, taker_order_id, taker_user),
        };

        Trade::new(
            trade_id,
            symbol,
            buy_order_id,
            sell_order_id,
            buy_user,
            sell_user,
            quantity,
            price,
            executed_at,
        )
    }
}

impl Default for MatchExecutor {
    fn default() -> Self {
        Self::new()
    }
}
