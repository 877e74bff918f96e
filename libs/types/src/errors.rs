//! Error taxonomy for the venue
//!
//! Validation failures are rejected at the venue boundary before any state
//! is mutated. Internal invariant violations are programming errors and
//! assert instead of surfacing here.

use crate::ids::OrderId;
use thiserror::Error;

/// Errors surfaced by the venue's public operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VenueError {
    /// Non-positive quantity or price, off-tick price, empty symbol or user id
    #[error("invalid order: {reason}")]
    InvalidOrder { reason: String },

    /// Symbol not registered with the venue
    #[error("unknown symbol: {symbol}")]
    UnknownSymbol { symbol: String },

    /// Order id already present in the book (buggy id assignment)
    #[error("duplicate order id: {order_id}")]
    DuplicateOrderId { order_id: OrderId },
}

/// Errors surfaced by `OrderBook::add`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("duplicate order id: {order_id}")]
    DuplicateOrderId { order_id: OrderId },

    /// Order's symbol does not match the book's symbol
    #[error("symbol mismatch: order {order}, book {book}")]
    SymbolMismatch { order: String, book: String },

    /// Order has nothing left to rest
    #[error("order {order_id} has zero remaining quantity")]
    ZeroRemaining { order_id: OrderId },
}

impl From<BookError> for VenueError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::DuplicateOrderId { order_id } => VenueError::DuplicateOrderId { order_id },
            BookError::SymbolMismatch { order, book } => VenueError::InvalidOrder {
                reason: format!("symbol mismatch: order {order}, book {book}"),
            },
            BookError::ZeroRemaining { order_id } => VenueError::InvalidOrder {
                reason: format!("order {order_id} has zero remaining quantity"),
            },
        }
    }
}
