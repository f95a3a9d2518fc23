use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LboError;
use crate::lbo::amortization::{check_term, AmortizationRow};
use crate::types::*;
use crate::LboResult;

/// Composition of the capital stack at the end of one year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalStructureRow {
    pub year: u32,
    pub debt_balance: Money,
    pub pik_balance: Money,
    /// Held flat; preferred accrual only enters exit economics
    pub preferred_principal: Money,
    /// Residual common equity, clipped at zero
    pub equity: Money,
}

/// Per-year balances of one instrument over the term. An empty schedule
/// contributes zero every year; a short one is rejected.
fn balances_over_term(
    instrument: &str,
    schedule: &[AmortizationRow],
    term_years: u32,
) -> LboResult<Vec<Money>> {
    check_term(term_years)?;
    if schedule.is_empty() {
        return Ok(vec![Decimal::ZERO; term_years as usize]);
    }
    if schedule.len() < term_years as usize {
        return Err(LboError::ScheduleMismatch {
            instrument: instrument.into(),
            rows: schedule.len(),
            term: term_years,
        });
    }
    Ok(schedule
        .iter()
        .take(term_years as usize)
        .map(|row| row.balance)
        .collect())
}

/// Roll the capital stack forward year by year.
///
/// Components may exceed the purchase price (an inconsistent scenario); the
/// residual equity is then reported as zero rather than negative.
pub fn try_capital_structure(
    debt_schedule: &[AmortizationRow],
    pik_schedule: &[AmortizationRow],
    preferred_principal: Money,
    term_years: u32,
    purchase_price: Money,
) -> LboResult<Vec<CapitalStructureRow>> {
    let debt = balances_over_term("debt", debt_schedule, term_years)?;
    let pik = balances_over_term("pik", pik_schedule, term_years)?;

    (1..=term_years)
        .zip(debt.into_iter().zip(pik))
        .map(|(year, (debt_balance, pik_balance))| {
            let claims = debt_balance
                .checked_add(pik_balance)
                .and_then(|c| c.checked_add(preferred_principal))
                .ok_or_else(|| LboError::overflow(format!("capital claims in year {year}")))?;
            let residual = purchase_price
                .checked_sub(claims)
                .ok_or_else(|| LboError::overflow(format!("residual equity in year {year}")))?;

            Ok(CapitalStructureRow {
                year,
                debt_balance,
                pik_balance,
                preferred_principal,
                equity: residual.max(Decimal::ZERO),
            })
        })
        .collect()
}

/// Soft form of [`try_capital_structure`]: a rejected roll-forward yields an
/// empty sequence.
pub fn capital_structure(
    debt_schedule: &[AmortizationRow],
    pik_schedule: &[AmortizationRow],
    preferred_principal: Money,
    term_years: u32,
    purchase_price: Money,
) -> Vec<CapitalStructureRow> {
    try_capital_structure(
        debt_schedule,
        pik_schedule,
        preferred_principal,
        term_years,
        purchase_price,
    )
    .unwrap_or_else(|e| {
        log::warn!("Capital structure not computed: {e}");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lbo::amortization::{amortize_bullet, amortize_pik};
    use rust_decimal_macros::dec;

    #[test]
    fn test_roll_forward() {
        let debt = amortize_bullet(dec!(400), dec!(8), 3);
        let pik = amortize_pik(dec!(100), dec!(10), 3);
        let rows = capital_structure(&debt, &pik, dec!(50), 3, dec!(1000));

        assert_eq!(rows.len(), 3);
        // Year 1: 1000 - (400 + 110 + 50) = 440
        assert_eq!(rows[0].year, 1);
        assert_eq!(rows[0].debt_balance, dec!(400));
        assert_eq!(rows[0].pik_balance, dec!(110));
        assert_eq!(rows[0].preferred_principal, dec!(50));
        assert_eq!(rows[0].equity, dec!(440));

        // Year 3: bullet repaid, PIK at 133.1 => 1000 - 183.1 = 816.9
        assert_eq!(rows[2].debt_balance, Decimal::ZERO);
        assert_eq!(rows[2].pik_balance, dec!(133.1));
        assert_eq!(rows[2].equity, dec!(816.9));
    }

    #[test]
    fn test_missing_instruments_contribute_nothing() {
        let rows = capital_structure(&[], &[], dec!(20), 4, dec!(100));
        assert_eq!(rows.len(), 4);
        for row in &rows {
            assert_eq!(row.debt_balance, Decimal::ZERO);
            assert_eq!(row.pik_balance, Decimal::ZERO);
            assert_eq!(row.equity, dec!(80));
        }
    }

    #[test]
    fn test_equity_clipped_at_zero() {
        let debt = amortize_bullet(dec!(900), dec!(8), 2);
        let rows = capital_structure(&debt, &[], dec!(200), 2, dec!(1000));
        assert_eq!(rows[0].equity, Decimal::ZERO);
        // Year 2: debt repaid, 1000 - 200 = 800
        assert_eq!(rows[1].equity, dec!(800));
    }

    #[test]
    fn test_preferred_constant() {
        let rows = capital_structure(&[], &[], dec!(35), 5, dec!(100));
        assert!(rows.iter().all(|r| r.preferred_principal == dec!(35)));
    }

    #[test]
    fn test_short_schedule_rejected() {
        let debt = amortize_bullet(dec!(100), dec!(8), 3);
        let result = try_capital_structure(&debt, &[], Decimal::ZERO, 5, dec!(1000));
        assert!(matches!(
            result,
            Err(LboError::ScheduleMismatch { rows: 3, term: 5, .. })
        ));
        assert!(capital_structure(&debt, &[], Decimal::ZERO, 5, dec!(1000)).is_empty());
    }

    #[test]
    fn test_longer_schedule_aligned_by_year() {
        let pik = amortize_pik(dec!(100), dec!(10), 5);
        let rows = capital_structure(&[], &pik, Decimal::ZERO, 2, dec!(1000));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].pik_balance, dec!(121));
    }

    #[test]
    fn test_zero_term_is_empty() {
        let debt = amortize_bullet(dec!(100), dec!(8), 3);
        assert!(capital_structure(&debt, &[], Decimal::ZERO, 0, dec!(1000)).is_empty());
    }

    #[test]
    fn test_absurd_term_rejected_before_sizing() {
        let result = try_capital_structure(&[], &[], Decimal::ZERO, u32::MAX, dec!(1000));
        assert!(matches!(result, Err(LboError::InvalidInput { .. })));
        assert!(capital_structure(&[], &[], Decimal::ZERO, u32::MAX, dec!(1000)).is_empty());
    }

    #[test]
    fn test_inputs_not_mutated() {
        let debt = amortize_bullet(dec!(400), dec!(8), 3);
        let before = debt.clone();
        let _ = capital_structure(&debt, &[], dec!(50), 3, dec!(1000));
        assert_eq!(debt, before);
    }
}
