use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LboError;
use crate::types::*;
use crate::LboResult;

/// Entry-date split of the purchase price between equity and debt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitialValues {
    pub purchase_price: Money,
    pub equity: Money,
    pub debt: Money,
    /// Equity as a fraction of the purchase price (0.4 = 40%)
    pub equity_percentage: Rate,
    /// Debt as a fraction of the purchase price
    pub debt_percentage: Rate,
}

/// Derive purchase price, equity and debt from entry assumptions.
pub fn try_initial_values(
    ltm_ebitda: Money,
    entry_multiple: Multiple,
    equity_pct: Percent,
) -> LboResult<InitialValues> {
    let purchase_price = ltm_ebitda
        .checked_mul(entry_multiple)
        .ok_or_else(|| LboError::overflow("purchase price"))?;
    if purchase_price.is_zero() {
        return Err(LboError::DivisionByZero {
            context: "purchase price is zero".into(),
        });
    }

    let equity = purchase_price
        .checked_mul(pct_to_rate(equity_pct))
        .ok_or_else(|| LboError::overflow("entry equity"))?;
    let debt = purchase_price
        .checked_sub(equity)
        .ok_or_else(|| LboError::overflow("entry debt"))?;

    Ok(InitialValues {
        purchase_price,
        equity,
        debt,
        equity_percentage: equity / purchase_price,
        debt_percentage: debt / purchase_price,
    })
}

/// All-or-nothing form of [`try_initial_values`]: any failure yields the
/// all-zero default, never a partially filled result.
pub fn initial_values(
    ltm_ebitda: Money,
    entry_multiple: Multiple,
    equity_pct: Percent,
) -> InitialValues {
    try_initial_values(ltm_ebitda, entry_multiple, equity_pct).unwrap_or_else(|e| {
        log::debug!("Initial values reset to zero: {e}");
        InitialValues::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_known_split() {
        let iv = initial_values(dec!(100), dec!(8), dec!(40));
        assert_eq!(
            iv,
            InitialValues {
                purchase_price: dec!(800),
                equity: dec!(320),
                debt: dec!(480),
                equity_percentage: dec!(0.4),
                debt_percentage: dec!(0.6),
            }
        );
    }

    #[test]
    fn test_zero_ebitda_resets_everything() {
        assert_eq!(initial_values(Decimal::ZERO, dec!(8), dec!(40)), InitialValues::default());
        assert!(matches!(
            try_initial_values(Decimal::ZERO, dec!(8), dec!(40)),
            Err(LboError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_zero_multiple_resets_everything() {
        assert_eq!(initial_values(dec!(10), Decimal::ZERO, dec!(40)), InitialValues::default());
    }

    #[test]
    fn test_all_equity_deal() {
        let iv = initial_values(dec!(10), dec!(6), dec!(100));
        assert_eq!(iv.equity, dec!(60));
        assert_eq!(iv.debt, Decimal::ZERO);
        assert_eq!(iv.equity_percentage, Decimal::ONE);
        assert_eq!(iv.debt_percentage, Decimal::ZERO);
    }

    #[test]
    fn test_equity_plus_debt_is_purchase_price() {
        let iv = initial_values(dec!(12.7), dec!(7.3), dec!(33));
        assert_eq!(iv.equity + iv.debt, iv.purchase_price);
    }

    #[test]
    fn test_overflow_resets_everything() {
        let huge = Decimal::MAX;
        assert_eq!(initial_values(huge, dec!(10), dec!(40)), InitialValues::default());
    }
}
