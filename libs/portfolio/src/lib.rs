//! Per-user position and cash accounting
//!
//! A portfolio converts trades into a signed position per symbol, a
//! volume-weighted average cost per open position, and an exact cash
//! balance. Positions move freely between long, flat, and short; the
//! average cost resets on a flip and clears at flat.
//!
//! Uses `BTreeMap` so iteration order is deterministic across runs.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use types::ids::{Symbol, UserId};
use types::numeric::Price;
use types::trade::Trade;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Precision for weighted-average cost (HALF_UP at 18 dp).
///
/// Cash arithmetic is exact (integer shares × on-tick prices) and is never
/// rounded; only the average-cost division can produce a non-terminating
/// quotient.
const COST_DP: u32 = 18;

// ---------------------------------------------------------------------------
// Portfolio struct
// ---------------------------------------------------------------------------

/// Per-user accounting aggregate.
///
/// The venue applies every trade exactly once per side; a trade with the
/// same participant on both sides is applied twice to this portfolio, once
/// as buyer and once as seller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    /// Owning participant
    user_id: UserId,

    /// Cash balance, signed; buys debit, sells credit
    cash: Decimal,

    /// Signed position per symbol (positive long, negative short).
    /// Flat symbols carry no entry.
    positions: BTreeMap<Symbol, i64>,

    /// Volume-weighted cost of each open position, stored positive.
    /// Cleared together with the position entry.
    avg_cost: BTreeMap<Symbol, Decimal>,

    /// Append-only trade history, in application order
    trades: Vec<Trade>,
}

impl Portfolio {
    /// Create an empty portfolio with zero cash.
    pub fn new(user_id: UserId) -> Self {
        Self::with_cash(user_id, Decimal::ZERO)
    }

    /// Create a portfolio with an initial cash balance.
    pub fn with_cash(user_id: UserId, initial_cash: Decimal) -> Self {
        Self {
            user_id,
            cash: initial_cash,
            positions: BTreeMap::new(),
            avg_cost: BTreeMap::new(),
            trades: Vec::new(),
        }
    }

    // -- accessors ---------------------------------------------------------

    /// Owning participant.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Current cash balance.
    pub fn cash(&self) -> Decimal {
        self.cash
    }

    /// Signed position for a symbol; flat symbols report zero.
    pub fn position(&self, symbol: &Symbol) -> i64 {
        self.positions.get(symbol).copied().unwrap_or(0)
    }

    /// Weighted-average cost of the open position; zero when flat.
    pub fn avg_cost(&self, symbol: &Symbol) -> Decimal {
        self.avg_cost.get(symbol).copied().unwrap_or(Decimal::ZERO)
    }

    /// Whether a nonzero position is open in the symbol.
    pub fn has_position(&self, symbol: &Symbol) -> bool {
        self.position(symbol) != 0
    }

    /// Symbols with an open position, in sorted order.
    pub fn open_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.positions.keys()
    }

    /// Full trade history, in application order.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    // -- trade application -------------------------------------------------

    /// Apply one side of a trade to this portfolio.
    ///
    /// `is_buyer` selects which side of the trade this user took. The
    /// caller is responsible for invoking this exactly once per side.
    pub fn apply(&mut self, trade: &Trade, is_buyer: bool) {
        self.trades.push(trade.clone());

        if is_buyer {
            self.apply_buy(trade);
        } else {
            self.apply_sell(trade);
        }
    }

    fn apply_buy(&mut self, trade: &Trade) {
        let symbol = &trade.symbol;
        let qty = trade.quantity.as_i64();
        let notional = trade.notional();

        self.cash -= notional;

        let pos = self.position(symbol);
        if pos >= 0 {
            // Adding to or opening a long: re-weight the average
            let open_value = Decimal::from(pos) * self.avg_cost(symbol);
            let new_pos = pos + qty;
            let new_avg = round_cost((open_value + notional) / Decimal::from(new_pos));
            self.set_open(symbol, new_pos, new_avg);
        } else if qty <= -pos {
            // Covering part or all of a short: average unchanged
            self.reduce_to(symbol, pos + qty);
        } else {
            // Covering the whole short and going long at the fill price
            let excess = qty + pos;
            self.set_open(symbol, excess, trade.price.as_decimal());
        }
    }

    fn apply_sell(&mut self, trade: &Trade) {
        let symbol = &trade.symbol;
        let qty = trade.quantity.as_i64();
        let notional = trade.notional();

        self.cash += notional;

        let pos = self.position(symbol);
        if pos <= 0 {
            // Adding to or opening a short: weight by magnitudes
            let open_value = Decimal::from(-pos) * self.avg_cost(symbol);
            let new_pos = pos - qty;
            let new_avg = round_cost((open_value + notional) / Decimal::from(-new_pos));
            self.set_open(symbol, new_pos, new_avg);
        } else if qty <= pos {
            // Selling part or all of a long: average unchanged
            self.reduce_to(symbol, pos - qty);
        } else {
            // Selling the whole long and going short at the fill price
            let excess = qty - pos;
            self.set_open(symbol, -excess, trade.price.as_decimal());
        }
    }

    /// Record an open (nonzero) position and its average cost.
    fn set_open(&mut self, symbol: &Symbol, position: i64, avg: Decimal) {
        debug_assert!(position != 0);
        self.positions.insert(symbol.clone(), position);
        self.avg_cost.insert(symbol.clone(), avg);
    }

    /// Shrink a position toward flat, clearing the entry at zero.
    fn reduce_to(&mut self, symbol: &Symbol, position: i64) {
        if position == 0 {
            self.positions.remove(symbol);
            self.avg_cost.remove(symbol);
        } else {
            self.positions.insert(symbol.clone(), position);
        }
    }

    /// Zero the position and average cost for a symbol, leaving cash and
    /// history untouched.
    ///
    /// Administrative escape hatch only: this breaks cash conservation as a
    /// portfolio-level property and must never run during matching.
    pub fn clear_position(&mut self, symbol: &Symbol) {
        self.positions.remove(symbol);
        self.avg_cost.remove(symbol);
    }

    // -- derived values ----------------------------------------------------

    /// Signed cash flow over the trade history: `−qty·price` for buys,
    /// `+qty·price` for sells.
    ///
    /// This is raw cash flow since inception, not accounting P&L; the two
    /// agree only when the portfolio is flat. A self-trade contributes both
    /// legs and nets to zero.
    pub fn realized_cash_flow(&self) -> Decimal {
        let mut flow = Decimal::ZERO;
        for trade in &self.trades {
            if trade.buy_user == self.user_id {
                flow -= trade.notional();
            }
            if trade.sell_user == self.user_id {
                flow += trade.notional();
            }
        }
        flow
    }

    /// Unrealized P&L of open positions against the supplied prices.
    ///
    /// Longs earn `pos · (price − avg)`, shorts earn `|pos| · (avg − price)`.
    /// Symbols without a price entry are skipped.
    pub fn unrealized_pnl(&self, current_prices: &BTreeMap<Symbol, Price>) -> Decimal {
        let mut pnl = Decimal::ZERO;
        for (symbol, &pos) in &self.positions {
            let Some(price) = current_prices.get(symbol) else {
                continue;
            };
            let price = price.as_decimal();
            let avg = self.avg_cost(symbol);
            pnl += if pos > 0 {
                Decimal::from(pos) * (price - avg)
            } else {
                Decimal::from(-pos) * (avg - price)
            };
        }
        pnl
    }

    /// Cash plus the marked value of open positions.
    ///
    /// Symbols without a price entry are skipped, as in
    /// [`unrealized_pnl`](Self::unrealized_pnl).
    pub fn total_value(&self, current_prices: &BTreeMap<Symbol, Price>) -> Decimal {
        let mut total = self.cash;
        for (symbol, &pos) in &self.positions {
            let Some(price) = current_prices.get(symbol) else {
                continue;
            };
            total += Decimal::from(pos) * price.as_decimal();
        }
        total
    }
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// Round a weighted-average cost to [`COST_DP`] using HALF_UP.
fn round_cost(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(COST_DP, RoundingStrategy::MidpointAwayFromZero)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
