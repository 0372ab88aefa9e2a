//! Weighted-average cost basis calculation.
//!
//! This is a simplified weighted-average model, not true FIFO lot
//! tracking: buys accumulate into a running total, and a sell reduces the
//! running total at the current average cost. It approximates acquisition
//! cost well enough for unrealized P&L display, but is not a
//! regulatory-grade tax-lot ledger.

use rust_decimal::Decimal;

/// A single fill from an asset's trade history, ordered oldest first.
#[derive(Debug, Clone, Copy)]
pub struct TradeFill {
    pub quantity: Decimal,
    pub price: Decimal,
    pub is_buy: bool,
}

/// Running weighted-average state over a stream of trades.
#[derive(Debug, Default, Clone, Copy)]
pub struct CostBasisTracker {
    total_quantity: Decimal,
    total_cost: Decimal,
}

impl CostBasisTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one trade to the running state.
    ///
    /// A sell can never reduce the tracked quantity below zero: disposals
    /// are clamped to the quantity currently held, so transfers-in sold
    /// later do not corrupt the average.
    pub fn apply(&mut self, trade: &TradeFill) {
        if trade.is_buy {
            self.total_cost += trade.quantity * trade.price;
            self.total_quantity += trade.quantity;
        } else if self.total_quantity > Decimal::ZERO {
            let avg_cost = self.total_cost / self.total_quantity;
            let sell_quantity = trade.quantity.min(self.total_quantity);
            self.total_cost -= sell_quantity * avg_cost;
            self.total_quantity -= sell_quantity;
        }
    }

    /// The current average acquisition cost, or `None` when nothing is held.
    ///
    /// Absent is deliberately distinct from zero: a fully disposed position
    /// has no cost basis rather than a free one.
    pub fn average_cost(&self) -> Option<Decimal> {
        if self.total_quantity > Decimal::ZERO {
            Some(self.total_cost / self.total_quantity)
        } else {
            None
        }
    }

    pub fn total_quantity(&self) -> Decimal {
        self.total_quantity
    }

    pub fn total_cost(&self) -> Decimal {
        self.total_cost
    }
}

/// Convenience over a full, ordered trade list.
pub fn weighted_average_cost(trades: &[TradeFill]) -> Option<Decimal> {
    let mut tracker = CostBasisTracker::new();
    for trade in trades {
        tracker.apply(trade);
    }
    tracker.average_cost()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn buy(quantity: Decimal, price: Decimal) -> TradeFill {
        TradeFill {
            quantity,
            price,
            is_buy: true,
        }
    }

    fn sell(quantity: Decimal, price: Decimal) -> TradeFill {
        TradeFill {
            quantity,
            price,
            is_buy: false,
        }
    }

    #[test]
    fn test_two_buys_then_sell_keeps_average() {
        let mut tracker = CostBasisTracker::new();
        tracker.apply(&buy(dec!(10), dec!(100)));
        tracker.apply(&buy(dec!(10), dec!(200)));
        assert_eq!(tracker.average_cost(), Some(dec!(150)));

        tracker.apply(&sell(dec!(5), dec!(250)));
        assert_eq!(tracker.total_quantity(), dec!(15));
        assert_eq!(tracker.total_cost(), dec!(2250));
        assert_eq!(tracker.average_cost(), Some(dec!(150)));
    }

    #[test]
    fn test_empty_history_has_no_basis() {
        assert_eq!(weighted_average_cost(&[]), None);
    }

    #[test]
    fn test_full_disposal_has_no_basis() {
        let trades = [buy(dec!(2), dec!(50)), sell(dec!(2), dec!(80))];
        assert_eq!(weighted_average_cost(&trades), None);
    }

    #[test]
    fn test_oversell_is_clamped_to_held_quantity() {
        let mut tracker = CostBasisTracker::new();
        tracker.apply(&buy(dec!(3), dec!(10)));
        tracker.apply(&sell(dec!(5), dec!(12)));
        assert_eq!(tracker.total_quantity(), Decimal::ZERO);
        assert_eq!(tracker.total_cost(), Decimal::ZERO);
        assert_eq!(tracker.average_cost(), None);
    }

    #[test]
    fn test_sell_with_nothing_held_is_ignored() {
        let mut tracker = CostBasisTracker::new();
        tracker.apply(&sell(dec!(1), dec!(100)));
        assert_eq!(tracker.average_cost(), None);

        tracker.apply(&buy(dec!(4), dec!(25)));
        assert_eq!(tracker.average_cost(), Some(dec!(25)));
    }
}
