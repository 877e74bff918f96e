//! Match loop
//!
//! Crosses an incoming order against resting liquidity under price-time
//! priority, emitting trades at the resting order's limit price and leaving
//! any unfilled remainder in the book.

use tracing::debug;

use types::order::{Order, Side};
use types::trade::Trade;

use crate::book::OrderBook;
use crate::matching::{crossing, MatchExecutor};

/// Match an incoming order against the book
///
/// The incoming order must not already be in the book. Repeatedly takes the
/// head of the opposing best level while the order still crosses, executing
/// `min(incoming remaining, resting remaining)` at the resting limit price.
/// Fully consumed resting orders are popped; a surviving remainder of the
/// incoming order is added to its own side after the loop, so an order can
/// never match liquidity inserted by the same call.
///
/// Deterministic given the book state and the incoming order.
pub fn match_incoming(
    book: &mut OrderBook,
    mut order: Order,
    executor: &mut MatchExecutor,
    timestamp: i64,
) -> Vec<Trade> {
    let mut trades = Vec::new();

    while !order.remaining_quantity.is_zero() {
        let opposing_best = match order.side {
            Side::Buy => book.best_ask(),
            Side::Sell => book.best_bid(),
        };
        let Some(resting_price) = opposing_best else {
            break;
        };
        if !crossing::incoming_can_match(order.side, order.limit_price, resting_price) {
            break;
        }

        let resting_side = order.side.opposite();
        let (maker_order_id, maker_user, maker_remaining) = {
            let resting = book
                .front_of(resting_side, resting_price)
                .expect("best level must be non-empty");
            (
                resting.order_id,
                resting.user_id.clone(),
                resting.remaining_quantity,
            )
        };

        let fill = order.remaining_quantity.min(maker_remaining);

        let trade = executor.execute_trade(
            book.symbol().clone(),
            order.side,
            order.order_id,
            order.user_id.clone(),
            maker_order_id,
            maker_user,
            resting_price,
            fill,
            timestamp,
        );
        debug!(
            "trade {} on {}: {} @ {} (orders {}/{})",
            trade.trade_id,
            trade.symbol,
            trade.quantity,
            trade.price,
            trade.buy_order_id,
            trade.sell_order_id
        );
        trades.push(trade);

        order.fill(fill);
        if fill == maker_remaining {
            book.pop_front(resting_side, resting_price);
        } else {
            book.fill_front(resting_side, resting_price, fill);
        }
    }

    if !order.remaining_quantity.is_zero() {
        book.add(order)
            .expect("freshly assigned order id cannot collide");
    }

    debug_assert!(book.is_consistent());
    trades
}
