//! Per-symbol order book
//!
//! Ties the bid and ask sides to a single id index. Orders are stored once
//! in the index (single source of truth); the price levels carry ids only,
//! so cancel is an O(1) lookup plus a level-local erase and both views
//! always observe the same mutable state.

use rust_decimal::Decimal;
use std::collections::HashMap;

use types::errors::BookError;
use types::ids::{OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};

use super::ask_book::AskBook;
use super::bid_book::BidBook;
use super::price_level::PriceLevel;

/// Order book for a single symbol
#[derive(Debug, Clone)]
pub struct OrderBook {
    symbol: Symbol,
    bids: BidBook,
    asks: AskBook,
    /// Id index over every resting order, both sides
    orders: HashMap<OrderId, Order>,
}

impl OrderBook {
    /// Create an empty book for a symbol
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            bids: BidBook::new(),
            asks: AskBook::new(),
            orders: HashMap::new(),
        }
    }

    /// The symbol this book trades
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    // -- resting-order management ------------------------------------------

    /// Rest an order at the back of its price level
    pub fn add(&mut self, order: Order) -> Result<(), BookError> {
        if order.symbol != self.symbol {
            return Err(BookError::SymbolMismatch {
                order: order.symbol.to_string(),
                book: self.symbol.to_string(),
            });
        }
        if order.remaining_quantity.is_zero() {
            return Err(BookError::ZeroRemaining {
                order_id: order.order_id,
            });
        }
        if self.orders.contains_key(&order.order_id) {
            return Err(BookError::DuplicateOrderId {
                order_id: order.order_id,
            });
        }

        match order.side {
            Side::Buy => {
                self.bids
                    .insert(order.limit_price, order.order_id, order.remaining_quantity)
            }
            Side::Sell => {
                self.asks
                    .insert(order.limit_price, order.order_id, order.remaining_quantity)
            }
        }
        self.orders.insert(order.order_id, order);
        Ok(())
    }

    /// Cancel a resting order by id
    ///
    /// Returns false when the id is absent (already filled, already
    /// cancelled, or never seen); never panics on unknown ids.
    pub fn cancel(&mut self, order_id: OrderId) -> bool {
        let Some(order) = self.orders.remove(&order_id) else {
            return false;
        };

        let removed = match order.side {
            Side::Buy => {
                self.bids
                    .remove(&order_id, order.limit_price, order.remaining_quantity)
            }
            Side::Sell => {
                self.asks
                    .remove(&order_id, order.limit_price, order.remaining_quantity)
            }
        };
        assert!(removed, "indexed order missing from its price level");
        true
    }

    /// Look up a resting order; absent once fully filled or cancelled
    pub fn get(&self, order_id: &OrderId) -> Option<&Order> {
        self.orders.get(order_id)
    }

    // -- best prices -------------------------------------------------------

    /// Highest resting buy price
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best_price()
    }

    /// Lowest resting sell price
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best_price()
    }

    /// Ask minus bid, when both sides are populated
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.as_decimal() - bid.as_decimal()),
            _ => None,
        }
    }

    // -- level access for the match loop -----------------------------------

    /// Order at the head of the level for `(side, price)`
    pub fn front_of(&self, side: Side, price: Price) -> Option<&Order> {
        let level = match side {
            Side::Buy => self.bids.level(price),
            Side::Sell => self.asks.level(price),
        }?;
        let order_id = level.front()?;
        let order = self.orders.get(&order_id);
        debug_assert!(order.is_some(), "queued id missing from index");
        order
    }

    /// Remove and return the head of the level for `(side, price)`
    ///
    /// The level is dropped once it is empty.
    pub fn pop_front(&mut self, side: Side, price: Price) -> Option<Order> {
        let level = match side {
            Side::Buy => self.bids.level_mut(price),
            Side::Sell => self.asks.level_mut(price),
        }?;
        let order_id = level.front()?;
        let order = self
            .orders
            .remove(&order_id)
            .expect("queued id missing from index");
        level.pop_front(order.remaining_quantity);
        match side {
            Side::Buy => self.bids.remove_level_if_empty(price),
            Side::Sell => self.asks.remove_level_if_empty(price),
        }
        Some(order)
    }

    /// Apply a partial fill to the head of the level for `(side, price)`
    ///
    /// # Panics
    /// Panics if the level is empty or the fill is not smaller than the
    /// head's remaining quantity; full fills go through
    /// [`pop_front`](Self::pop_front).
    pub fn fill_front(&mut self, side: Side, price: Price, fill_quantity: Quantity) {
        let level = match side {
            Side::Buy => self.bids.level_mut(price),
            Side::Sell => self.asks.level_mut(price),
        }
        .expect("no level at fill price");
        let order_id = level.front().expect("fill on empty level");
        let order = self
            .orders
            .get_mut(&order_id)
            .expect("queued id missing from index");
        assert!(
            fill_quantity < order.remaining_quantity,
            "partial fill must leave a remainder"
        );
        order.fill(fill_quantity);
        level.reduce(fill_quantity);
    }

    // -- reporting ---------------------------------------------------------

    /// Top `depth` bid levels, best first
    pub fn bid_depth(&self, depth: usize) -> Vec<(Price, Quantity)> {
        self.bids.depth_snapshot(depth)
    }

    /// Top `depth` ask levels, best first
    pub fn ask_depth(&self, depth: usize) -> Vec<(Price, Quantity)> {
        self.asks.depth_snapshot(depth)
    }

    /// Number of resting buy orders
    pub fn buy_order_count(&self) -> usize {
        self.bids.order_count()
    }

    /// Number of resting sell orders
    pub fn sell_order_count(&self) -> usize {
        self.asks.order_count()
    }

    /// Number of resting orders on both sides
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Check if neither side has resting orders
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Total remaining quantity resting on both sides
    pub fn total_resting_quantity(&self) -> i64 {
        self.orders
            .values()
            .map(|order| order.remaining_quantity.as_i64())
            .sum()
    }

    /// Remove every resting order from both sides
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.orders.clear();
    }

    /// Verify the id index and the price levels describe the same book
    ///
    /// True when every queued id resolves to an indexed order on the right
    /// side at the right price, level totals match the indexed remainders,
    /// and no indexed order is missing from a level.
    pub fn is_consistent(&self) -> bool {
        let mut seen = 0usize;
        self.side_consistent(Side::Buy, self.bids.levels(), &mut seen)
            && self.side_consistent(Side::Sell, self.asks.levels(), &mut seen)
            && seen == self.orders.len()
    }

    fn side_consistent<'a>(
        &self,
        side: Side,
        levels: impl Iterator<Item = (&'a Price, &'a PriceLevel)>,
        seen: &mut usize,
    ) -> bool {
        for (price, level) in levels {
            let mut level_total = 0i64;
            for order_id in level.order_ids() {
                let Some(order) = self.orders.get(order_id) else {
                    return false;
                };
                if order.side != side || order.limit_price != *price {
                    return false;
                }
                level_total += order.remaining_quantity.as_i64();
                *seen += 1;
            }
            if level.is_empty() || level_total != level.total_quantity().as_i64() {
                return false;
            }
        }
        true
    }
}
