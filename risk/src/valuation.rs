//! Portfolio valuation
//!
//! Values holdings at their current price, falling back to acquisition price
//! for positions that were never priced. Positions sharing a symbol are
//! reported as one holding.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::Position;

/// Valuation of all lots of one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingValuation {
    pub symbol: String,
    pub quantity: f64,
    pub cost_basis: f64,
    pub market_value: f64,
    pub unrealized_pnl: f64,
    /// Share of total market value in percent
    pub share_pct: f64,
    /// True if any lot was valued at its acquisition price
    pub uses_acquisition_price: bool,
}

/// Valuation of the whole portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioValuation {
    pub holdings: Vec<HoldingValuation>,
    pub total_value: f64,
    pub total_cost: f64,
    pub unrealized_pnl: f64,
    pub position_count: usize,
}

impl PortfolioValuation {
    pub fn from_positions(positions: &[Position]) -> Self {
        let mut by_symbol: IndexMap<&str, HoldingValuation> = IndexMap::new();

        for position in positions {
            let holding = by_symbol
                .entry(position.symbol.as_str())
                .or_insert_with(|| HoldingValuation {
                    symbol: position.symbol.clone(),
                    quantity: 0.0,
                    cost_basis: 0.0,
                    market_value: 0.0,
                    unrealized_pnl: 0.0,
                    share_pct: 0.0,
                    uses_acquisition_price: false,
                });
            holding.quantity += position.quantity;
            holding.cost_basis += position.cost_basis();
            holding.market_value += position.market_value();
            holding.uses_acquisition_price |= position.current_price.is_none();
        }

        let total_value: f64 = by_symbol.values().map(|h| h.market_value).sum();
        let total_cost: f64 = by_symbol.values().map(|h| h.cost_basis).sum();

        let holdings = by_symbol
            .into_values()
            .map(|mut h| {
                h.unrealized_pnl = h.market_value - h.cost_basis;
                h.share_pct = if total_value > 0.0 {
                    h.market_value / total_value * 100.0
                } else {
                    0.0
                };
                h
            })
            .collect();

        Self {
            holdings,
            total_value,
            total_cost,
            unrealized_pnl: total_value - total_cost,
            position_count: positions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.position_count == 0
    }
}

/// Σ quantity × (current price, else acquisition price)
pub fn portfolio_value(positions: &[Position]) -> f64 {
    positions.iter().map(Position::market_value).sum()
}
