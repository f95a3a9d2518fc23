use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LboError;
use crate::types::*;
use crate::LboResult;

/// Longest term a schedule, roll-forward or exit will be built over.
pub const MAX_TERM_YEARS: u32 = 100;

/// Reject a term beyond [`MAX_TERM_YEARS`] before anything is sized by it.
pub(crate) fn check_term(term_years: u32) -> LboResult<()> {
    if term_years > MAX_TERM_YEARS {
        return Err(LboError::InvalidInput {
            field: "term_years".into(),
            reason: format!("Term of {term_years} years exceeds the {MAX_TERM_YEARS}-year maximum"),
        });
    }
    Ok(())
}

/// How a debt instrument services its interest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentKind {
    /// Unitranche: interest paid in cash, full principal repaid at maturity
    Bullet,
    /// Payment-in-kind: interest capitalised onto the balance every year
    Pik,
}

/// A single debt instrument
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtInstrument {
    pub principal: Money,
    /// Annual rate as a whole-number percentage (8 = 8%)
    pub annual_rate_pct: Percent,
    pub term_years: u32,
    pub kind: InstrumentKind,
}

/// One year of an amortisation schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub year: u32,
    pub interest: Money,
    /// Outstanding balance at the end of the year
    pub balance: Money,
}

/// Schedule with totals, for reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutput {
    pub kind: InstrumentKind,
    pub rows: Vec<AmortizationRow>,
    pub total_interest: Money,
    pub ending_balance: Money,
}

impl DebtInstrument {
    pub fn bullet(principal: Money, annual_rate_pct: Percent, term_years: u32) -> Self {
        Self {
            principal,
            annual_rate_pct,
            term_years,
            kind: InstrumentKind::Bullet,
        }
    }

    pub fn pik(principal: Money, annual_rate_pct: Percent, term_years: u32) -> Self {
        Self {
            principal,
            annual_rate_pct,
            term_years,
            kind: InstrumentKind::Pik,
        }
    }

    pub fn try_schedule(&self) -> LboResult<Vec<AmortizationRow>> {
        match self.kind {
            InstrumentKind::Bullet => {
                try_amortize_bullet(self.principal, self.annual_rate_pct, self.term_years)
            }
            InstrumentKind::Pik => {
                try_amortize_pik(self.principal, self.annual_rate_pct, self.term_years)
            }
        }
    }

    pub fn schedule(&self) -> Vec<AmortizationRow> {
        match self.kind {
            InstrumentKind::Bullet => {
                amortize_bullet(self.principal, self.annual_rate_pct, self.term_years)
            }
            InstrumentKind::Pik => {
                amortize_pik(self.principal, self.annual_rate_pct, self.term_years)
            }
        }
    }
}

/// Interest-only schedule with the whole principal repaid in the final year.
///
/// Negative principal or rate are not rejected; they flow through the
/// arithmetic unchanged.
pub fn try_amortize_bullet(
    principal: Money,
    annual_rate_pct: Percent,
    term_years: u32,
) -> LboResult<Vec<AmortizationRow>> {
    check_term(term_years)?;
    let rate = pct_to_rate(annual_rate_pct);
    let interest = principal
        .checked_mul(rate)
        .ok_or_else(|| LboError::overflow("bullet interest"))?;

    let mut rows: Vec<AmortizationRow> = (1..=term_years)
        .map(|year| AmortizationRow {
            year,
            interest,
            balance: principal,
        })
        .collect();

    if let Some(last) = rows.last_mut() {
        last.balance = Decimal::ZERO;
    }

    Ok(rows)
}

pub fn amortize_bullet(
    principal: Money,
    annual_rate_pct: Percent,
    term_years: u32,
) -> Vec<AmortizationRow> {
    try_amortize_bullet(principal, annual_rate_pct, term_years).unwrap_or_else(|e| {
        log::warn!("Bullet schedule dropped: {e}");
        Vec::new()
    })
}

/// Payment-in-kind schedule: each year's interest accrues on the prior
/// closing balance and is added to it.
pub fn try_amortize_pik(
    principal: Money,
    annual_rate_pct: Percent,
    term_years: u32,
) -> LboResult<Vec<AmortizationRow>> {
    check_term(term_years)?;
    let rate = pct_to_rate(annual_rate_pct);
    let mut balance = principal;
    let mut rows = Vec::with_capacity(term_years as usize);

    for year in 1..=term_years {
        let accrued = balance
            .checked_mul(rate)
            .ok_or_else(|| LboError::overflow(format!("PIK interest in year {year}")))?;
        balance = balance
            .checked_add(accrued)
            .ok_or_else(|| LboError::overflow(format!("PIK balance in year {year}")))?;
        rows.push(AmortizationRow {
            year,
            interest: accrued,
            balance,
        });
    }

    Ok(rows)
}

pub fn amortize_pik(
    principal: Money,
    annual_rate_pct: Percent,
    term_years: u32,
) -> Vec<AmortizationRow> {
    try_amortize_pik(principal, annual_rate_pct, term_years).unwrap_or_else(|e| {
        log::warn!("PIK schedule dropped: {e}");
        Vec::new()
    })
}

/// Closing balance of the last row, or zero for an absent instrument.
pub fn ending_balance(schedule: &[AmortizationRow]) -> Money {
    schedule.last().map_or(Decimal::ZERO, |row| row.balance)
}

/// Build a schedule for a single instrument, with totals.
pub fn build_schedule(
    instrument: &DebtInstrument,
) -> LboResult<ComputationOutput<ScheduleOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if instrument.principal < Decimal::ZERO {
        warnings.push("Negative principal; balances and interest will be negative".into());
    }
    if instrument.annual_rate_pct < Decimal::ZERO {
        warnings.push("Negative interest rate".into());
    }
    if instrument.term_years == 0 {
        warnings.push("Zero term produces an empty schedule".into());
    }

    let rows = instrument.try_schedule()?;
    let total_interest = rows
        .iter()
        .try_fold(Decimal::ZERO, |acc, row| acc.checked_add(row.interest))
        .ok_or_else(|| LboError::overflow("total interest"))?;
    let ending = ending_balance(&rows);

    let methodology = match instrument.kind {
        InstrumentKind::Bullet => "Unitranche Bullet Schedule",
        InstrumentKind::Pik => "Payment-in-Kind Accrual Schedule",
    };

    let output = ScheduleOutput {
        kind: instrument.kind,
        rows,
        total_interest,
        ending_balance: ending,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        methodology,
        &serde_json::json!({
            "principal": instrument.principal.to_string(),
            "annual_rate_pct": instrument.annual_rate_pct.to_string(),
            "term_years": instrument.term_years,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bullet_schedule() {
        let rows = amortize_bullet(dec!(1000), dec!(5), 5);
        assert_eq!(rows.len(), 5);

        for (i, row) in rows[..4].iter().enumerate() {
            assert_eq!(row.year, i as u32 + 1);
            assert_eq!(row.interest, dec!(50));
            assert_eq!(row.balance, dec!(1000));
        }

        let last = &rows[4];
        assert_eq!(last.year, 5);
        assert_eq!(last.interest, dec!(50));
        assert_eq!(last.balance, Decimal::ZERO);
    }

    #[test]
    fn test_bullet_single_year_repays_immediately() {
        let rows = amortize_bullet(dec!(1000), dec!(8), 1);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].interest, dec!(80));
        assert_eq!(rows[0].balance, Decimal::ZERO);
    }

    #[test]
    fn test_bullet_zero_term_is_empty() {
        assert!(amortize_bullet(dec!(1000), dec!(8), 0).is_empty());
    }

    #[test]
    fn test_bullet_negative_inputs_propagate() {
        let rows = amortize_bullet(dec!(-100), dec!(10), 2);
        assert_eq!(rows[0].interest, dec!(-10));
        assert_eq!(rows[0].balance, dec!(-100));
        assert_eq!(rows[1].balance, Decimal::ZERO);

        let rows = amortize_bullet(dec!(100), dec!(-10), 2);
        assert_eq!(rows[0].interest, dec!(-10));
    }

    #[test]
    fn test_pik_compounds() {
        let rows = amortize_pik(dec!(1000), dec!(2), 2);

        // Year 1: 1000 * 0.02 = 20, balance 1020
        assert_eq!(rows[0].interest, dec!(20));
        assert_eq!(rows[0].balance, dec!(1020));

        // Year 2: 1020 * 0.02 = 20.4, balance 1040.4
        assert_eq!(rows[1].interest, dec!(20.40));
        assert_eq!(rows[1].balance, dec!(1040.40));
    }

    #[test]
    fn test_pik_zero_principal_stays_flat() {
        let rows = amortize_pik(Decimal::ZERO, dec!(12), 3);
        assert_eq!(rows.len(), 3);
        assert!(rows
            .iter()
            .all(|r| r.interest.is_zero() && r.balance.is_zero()));
    }

    #[test]
    fn test_pik_zero_term_is_empty() {
        assert!(amortize_pik(dec!(1000), dec!(12), 0).is_empty());
    }

    #[test]
    fn test_pik_overflow_drops_schedule() {
        assert!(try_amortize_pik(dec!(1000000000), dec!(100000), 40).is_err());
        assert!(amortize_pik(dec!(1000000000), dec!(100000), 40).is_empty());
    }

    #[test]
    fn test_absurd_term_is_rejected() {
        assert!(matches!(
            try_amortize_bullet(dec!(1000), dec!(8), 4_000_000_000),
            Err(LboError::InvalidInput { .. })
        ));
        assert!(try_amortize_pik(dec!(1000), dec!(12), MAX_TERM_YEARS + 1).is_err());
        assert!(amortize_bullet(dec!(1000), dec!(8), u32::MAX).is_empty());
        assert!(amortize_pik(dec!(1000), dec!(12), u32::MAX).is_empty());

        assert_eq!(amortize_bullet(dec!(1000), dec!(8), MAX_TERM_YEARS).len(), 100);
    }

    #[test]
    fn test_instrument_dispatch() {
        let bullet = DebtInstrument::bullet(dec!(500), dec!(8), 3);
        assert_eq!(bullet.schedule(), amortize_bullet(dec!(500), dec!(8), 3));

        let pik = DebtInstrument::pik(dec!(500), dec!(12), 3);
        assert_eq!(pik.schedule(), amortize_pik(dec!(500), dec!(12), 3));
    }

    #[test]
    fn test_build_schedule_totals() {
        let result = build_schedule(&DebtInstrument::bullet(dec!(1000), dec!(5), 5)).unwrap();
        let sched = &result.result;

        // 1000 * 0.05 * 5 = 250
        assert_eq!(sched.total_interest, dec!(250));
        assert_eq!(sched.ending_balance, Decimal::ZERO);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_build_schedule_warns_on_negative_principal() {
        let result = build_schedule(&DebtInstrument::pik(dec!(-10), dec!(5), 2)).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert!(result.result.ending_balance < Decimal::ZERO);
    }

    #[test]
    fn test_ending_balance_of_empty_schedule() {
        assert_eq!(ending_balance(&[]), Decimal::ZERO);
    }
}
