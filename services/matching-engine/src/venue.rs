//! Venue coordinator
//!
//! Owns the per-symbol books, the per-user portfolios, the id allocators,
//! and the market-price store. Routes each accepted order to its book,
//! runs the match loop, and dispatches the resulting trades to the buyer's
//! and seller's portfolios in emission order.
//!
//! Symbols must be registered before use; submits against unregistered
//! symbols are rejected rather than auto-creating a book. Single-threaded:
//! every operation runs to completion before the next begins.

use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use portfolio::Portfolio;
use types::errors::VenueError;
use types::ids::{IdAllocator, OrderId, Symbol, UserId};
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};
use types::trade::Trade;

use crate::book::OrderBook;
use crate::engine::match_incoming;
use crate::matching::MatchExecutor;

/// Single-venue coordinator
pub struct Venue {
    /// Order books, one per registered symbol
    books: HashMap<Symbol, OrderBook>,
    /// Portfolios, created on first accepted order per user
    portfolios: HashMap<UserId, Portfolio>,
    /// Externally supplied prices used only for valuation
    market_prices: BTreeMap<Symbol, Price>,
    order_ids: IdAllocator,
    executor: MatchExecutor,
    /// Clamp so assigned timestamps never go backwards
    last_timestamp: i64,
}

impl Venue {
    /// Create an empty venue with no registered symbols
    pub fn new() -> Self {
        Self {
            books: HashMap::new(),
            portfolios: HashMap::new(),
            market_prices: BTreeMap::new(),
            order_ids: IdAllocator::new(),
            executor: MatchExecutor::new(),
            last_timestamp: 0,
        }
    }

    // -- symbol registry ---------------------------------------------------

    /// Register a symbol, creating its empty book
    ///
    /// Registering an existing symbol is a no-op.
    pub fn add_symbol(&mut self, symbol: &str) -> Result<(), VenueError> {
        let symbol = Symbol::try_new(symbol).ok_or_else(|| VenueError::InvalidOrder {
            reason: "symbol must not be empty".to_string(),
        })?;
        self.books
            .entry(symbol.clone())
            .or_insert_with(|| OrderBook::new(symbol));
        Ok(())
    }

    /// Check whether a symbol is registered
    pub fn is_symbol_available(&self, symbol: &str) -> bool {
        Symbol::try_new(symbol).is_some_and(|s| self.books.contains_key(&s))
    }

    /// Registered symbols in sorted order
    pub fn available_symbols(&self) -> Vec<&Symbol> {
        let mut symbols: Vec<&Symbol> = self.books.keys().collect();
        symbols.sort();
        symbols
    }

    // -- order entry -------------------------------------------------------

    /// Submit a limit order
    ///
    /// Validates every input before any state changes, so a rejected submit
    /// leaves the venue exactly as it was. Returns the trades produced by
    /// crossing the opposing book, in execution order; any unfilled
    /// remainder rests.
    pub fn submit(
        &mut self,
        user: &str,
        symbol: &str,
        side: Side,
        quantity: i64,
        price: Decimal,
    ) -> Result<Vec<Trade>, VenueError> {
        let user = UserId::try_new(user).ok_or_else(|| VenueError::InvalidOrder {
            reason: "user id must not be empty".to_string(),
        })?;
        let symbol = Symbol::try_new(symbol).ok_or_else(|| VenueError::InvalidOrder {
            reason: "symbol must not be empty".to_string(),
        })?;
        let quantity = Quantity::try_new(quantity).ok_or_else(|| VenueError::InvalidOrder {
            reason: format!("quantity must be positive, got {quantity}"),
        })?;
        let price = Price::try_new(price).ok_or_else(|| VenueError::InvalidOrder {
            reason: format!("price must be positive and a multiple of {}", Price::TICK),
        })?;
        if !self.books.contains_key(&symbol) {
            return Err(VenueError::UnknownSymbol {
                symbol: symbol.to_string(),
            });
        }

        // Past this point nothing can fail; state changes are safe.
        let timestamp = self.next_timestamp();
        let order_id = OrderId::from_u64(self.order_ids.next_id());
        self.portfolios
            .entry(user.clone())
            .or_insert_with(|| Portfolio::new(user.clone()));

        let order = Order::new(
            order_id,
            user.clone(),
            symbol.clone(),
            side,
            price,
            quantity,
            timestamp,
        );
        debug!(
            "accepted order {}: {} {:?} {} {} @ {}",
            order_id, user, side, quantity, symbol, price
        );

        let book = self.books.get_mut(&symbol).expect("symbol checked above");
        let trades = match_incoming(book, order, &mut self.executor, timestamp);
        debug_assert!(uncrossed(book));

        for trade in &trades {
            self.portfolios
                .entry(trade.buy_user.clone())
                .or_insert_with(|| Portfolio::new(trade.buy_user.clone()))
                .apply(trade, true);
            self.portfolios
                .entry(trade.sell_user.clone())
                .or_insert_with(|| Portfolio::new(trade.sell_user.clone()))
                .apply(trade, false);
        }

        if !trades.is_empty() {
            info!(
                "order {} matched {} trade(s) on {}",
                order_id,
                trades.len(),
                symbol
            );
        }
        Ok(trades)
    }

    /// Cancel a resting order
    ///
    /// Idempotent in effect: unknown symbols and unknown ids return false.
    pub fn cancel(&mut self, symbol: &str, order_id: OrderId) -> bool {
        let Some(symbol) = Symbol::try_new(symbol) else {
            return false;
        };
        let Some(book) = self.books.get_mut(&symbol) else {
            return false;
        };
        let removed = book.cancel(order_id);
        if removed {
            debug!("cancelled order {} on {}", order_id, symbol);
        }
        removed
    }

    // -- market data -------------------------------------------------------

    /// Record an externally supplied price for a registered symbol
    pub fn update_market_price(&mut self, symbol: &str, price: Decimal) -> Result<(), VenueError> {
        let symbol = Symbol::try_new(symbol).ok_or_else(|| VenueError::InvalidOrder {
            reason: "symbol must not be empty".to_string(),
        })?;
        if !self.books.contains_key(&symbol) {
            return Err(VenueError::UnknownSymbol {
                symbol: symbol.to_string(),
            });
        }
        let price = Price::try_new(price).ok_or_else(|| VenueError::InvalidOrder {
            reason: format!("price must be positive and a multiple of {}", Price::TICK),
        })?;
        self.market_prices.insert(symbol, price);
        Ok(())
    }

    /// Current market price, if one has been supplied
    pub fn current_price(&self, symbol: &str) -> Option<Price> {
        let symbol = Symbol::try_new(symbol)?;
        self.market_prices.get(&symbol).copied()
    }

    // -- read access -------------------------------------------------------

    /// Order book for a registered symbol
    pub fn order_book(&self, symbol: &str) -> Option<&OrderBook> {
        let symbol = Symbol::try_new(symbol)?;
        self.books.get(&symbol)
    }

    /// Portfolio for a user, if the user has ever traded or submitted
    pub fn portfolio(&self, user: &str) -> Option<&Portfolio> {
        let user = UserId::try_new(user)?;
        self.portfolios.get(&user)
    }

    /// Unrealized P&L of a user's open positions against current prices
    pub fn unrealized_pnl(&self, user: &str) -> Option<Decimal> {
        self.portfolio(user)
            .map(|p| p.unrealized_pnl(&self.market_prices))
    }

    /// Cash plus marked value of a user's open positions
    pub fn total_value(&self, user: &str) -> Option<Decimal> {
        self.portfolio(user)
            .map(|p| p.total_value(&self.market_prices))
    }

    // -- maintenance -------------------------------------------------------

    /// Remove every resting order for one symbol
    ///
    /// Returns false if the symbol is not registered.
    pub fn clear_orders_for_symbol(&mut self, symbol: &str) -> bool {
        let Some(symbol) = Symbol::try_new(symbol) else {
            return false;
        };
        let Some(book) = self.books.get_mut(&symbol) else {
            return false;
        };
        book.clear();
        true
    }

    /// Remove every resting order on every book
    pub fn clear_all_orders(&mut self) {
        for book in self.books.values_mut() {
            book.clear();
        }
    }

    // -- internals ---------------------------------------------------------

    /// Wall-clock unix millis, clamped monotone non-decreasing
    fn next_timestamp(&mut self) -> i64 {
        let now = Utc::now().timestamp_millis();
        self.last_timestamp = self.last_timestamp.max(now);
        self.last_timestamp
    }
}

impl Default for Venue {
    fn default() -> Self {
        Self::new()
    }
}

/// No bid at or above any ask
fn uncrossed(book: &OrderBook) -> bool {
    match (book.best_bid(), book.best_ask()) {
        (Some(bid), Some(ask)) => bid < ask,
        _ => true,
    }
}
