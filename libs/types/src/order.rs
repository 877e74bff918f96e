//! Order value type
//!
//! An order's identity (id, symbol, side, user, limit price, submission
//! time) is fixed at creation; only the remaining quantity changes, and it
//! only ever decreases.

use crate::ids::{OrderId, Symbol, UserId};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order type
///
/// Only limit orders are executable; `Market` is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Limit,
    Market,
}

/// A limit order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub limit_price: Price,
    /// Original size, fixed at creation
    pub quantity: Quantity,
    /// Unexecuted remainder; zero once fully filled
    pub remaining_quantity: Quantity,
    /// Venue-assigned unix milliseconds; ties broken by `order_id`
    pub submitted_at: i64,
}

impl Order {
    /// Create a new resting-eligible limit order
    pub fn new(
        order_id: OrderId,
        user_id: UserId,
        symbol: Symbol,
        side: Side,
        limit_price: Price,
        quantity: Quantity,
        submitted_at: i64,
    ) -> Self {
        Self {
            order_id,
            user_id,
            symbol,
            side,
            order_type: OrderType::Limit,
            limit_price,
            quantity,
            remaining_quantity: quantity,
            submitted_at,
        }
    }

    /// Check if the order is completely filled
    pub fn is_filled(&self) -> bool {
        self.remaining_quantity.is_zero()
    }

    /// Executed quantity so far
    pub fn filled_quantity(&self) -> Quantity {
        if self.quantity == self.remaining_quantity {
            Quantity::zero()
        } else {
            self.quantity - self.remaining_quantity
        }
    }

    /// Reduce the remaining quantity by an executed fill
    ///
    /// # Panics
    /// Panics if the fill exceeds the remaining quantity
    pub fn fill(&mut self, fill_quantity: Quantity) {
        assert!(
            fill_quantity <= self.remaining_quantity,
            "Fill would exceed remaining quantity"
        );
        self.remaining_quantity = self.remaining_quantity - fill_quantity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order() -> Order {
        Order::new(
            OrderId::from_u64(1),
            UserId::new("alice"),
            Symbol::new("AAPL"),
            Side::Buy,
            Price::from_str("150.00").unwrap(),
            Quantity::new(100),
            1_722_470_400_000,
        )
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_order_creation() {
        let order = sample_order();
        assert_eq!(order.order_type, OrderType::Limit);
        assert_eq!(order.remaining_quantity, order.quantity);
        assert!(!order.is_filled());
        assert!(order.filled_quantity().is_zero());
    }

    #[test]
    fn test_order_fill() {
        let mut order = sample_order();

        order.fill(Quantity::new(30));
        assert_eq!(order.remaining_quantity, Quantity::new(70));
        assert_eq!(order.filled_quantity(), Quantity::new(30));
        assert!(!order.is_filled());

        order.fill(Quantity::new(70));
        assert!(order.is_filled());
        assert_eq!(order.filled_quantity(), order.quantity);
    }

    #[test]
    #[should_panic(expected = "Fill would exceed remaining quantity")]
    fn test_order_overfill_panics() {
        let mut order = sample_order();
        order.fill(Quantity::new(150));
    }

    #[test]
    fn test_order_serialization() {
        let order = sample_order();
        let json = serde_json::to_string(&order).unwrap();
        let deserialized: Order = serde_json::from_str(&json).unwrap();

        assert_eq!(order, deserialized);
    }
}
