//! Account state and equity tracking for a single backtest run.

use super::position::Trade;

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub initial_equity: f64,
    pub equity: f64,
    /// Starts at the initial equity and gains one point per closed trade.
    pub equity_curve: Vec<f64>,
    pub trades: Vec<Trade>,
}

impl Account {
    pub fn new(initial_equity: f64) -> Self {
        Account {
            initial_equity,
            equity: initial_equity,
            equity_curve: vec![initial_equity],
            trades: Vec::new(),
        }
    }

    /// Amount at risk on the next trade.
    pub fn risk_amount(&self, risk_pct: f64) -> f64 {
        self.equity * risk_pct / 100.0
    }

    pub fn record_trade(&mut self, trade: Trade) {
        self.equity += trade.pnl;
        self.equity_curve.push(self.equity);
        self.trades.push(trade);
    }

    pub fn wins(&self) -> usize {
        self.trades.iter().filter(|t| t.is_win()).count()
    }

    pub fn net_profit(&self) -> f64 {
        self.equity - self.initial_equity
    }
}
