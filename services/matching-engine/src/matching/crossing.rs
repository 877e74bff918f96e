//! Crossing detection logic
//!
//! Determines when a bid and ask can match based on price compatibility.

use types::numeric::Price;
use types::order::Side;

/// Check if a bid and ask can match at given prices
///
/// A buy matches a sell when the buy price is at or above the sell price;
/// equal prices cross.
pub fn can_match(bid_price: Price, ask_price: Price) -> bool {
    bid_price >= ask_price
}

/// Check if an incoming order crosses a resting order's price
pub fn incoming_can_match(incoming_side: Side, incoming_price: Price, resting_price: Price) -> bool {
    match incoming_side {
        Side::Buy => can_match(incoming_price, resting_price),
        Side::Sell => can_match(resting_price, incoming_price),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(value: u64) -> Price {
        Price::from_u64(value)
    }

    #[test]
    fn test_can_match_crossing() {
        assert!(can_match(px(150), px(149)), "bid above ask should match");
    }

    #[test]
    fn test_can_match_exact() {
        assert!(can_match(px(150), px(150)), "equal prices should match");
    }

    #[test]
    fn test_can_match_no_cross() {
        assert!(!can_match(px(149), px(150)), "bid below ask should not match");
    }

    #[test]
    fn test_incoming_buy_crosses_ask() {
        assert!(incoming_can_match(Side::Buy, px(150), px(149)));
        assert!(!incoming_can_match(Side::Buy, px(148), px(149)));
    }

    #[test]
    fn test_incoming_sell_crosses_bid() {
        assert!(incoming_can_match(Side::Sell, px(149), px(150)));
        assert!(!incoming_can_match(Side::Sell, px(151), px(150)));
    }
}
