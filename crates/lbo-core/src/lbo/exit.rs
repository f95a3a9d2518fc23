use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::LboError;
use crate::lbo::amortization::{check_term, ending_balance, AmortizationRow};
use crate::time_value::{annualised_return, appreciate};
use crate::types::*;
use crate::LboResult;

/// Inputs to the exit calculation. Schedules are borrowed so one schedule
/// can be reused across many exit evaluations.
#[derive(Debug, Clone)]
pub struct ExitInput<'a> {
    pub debt_schedule: &'a [AmortizationRow],
    pub pik_schedule: &'a [AmortizationRow],
    pub preferred_principal: Money,
    /// Compounding preferred return, whole-number percentage
    pub preferred_return_pct: Percent,
    pub term_years: u32,
    /// Annual EBITDA growth, whole-number percentage
    pub growth_pct: Percent,
    pub ltm_ebitda: Money,
    pub entry_multiple: Multiple,
    /// Equity invested at entry (MOIC denominator)
    pub entry_equity: Money,
}

/// Headline exit returns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExitIndicators {
    pub exit_enterprise_value: Money,
    pub moic: Multiple,
    pub irr: Rate,
}

/// Exit returns with the bridge from enterprise value to equity proceeds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExitBreakdown {
    pub exit_ebitda: Money,
    pub exit_enterprise_value: Money,
    pub debt_balance: Money,
    pub pik_balance: Money,
    pub preferred_accrued: Money,
    pub equity_proceeds: Money,
    pub moic: Multiple,
    pub irr: Rate,
}

impl From<ExitBreakdown> for ExitIndicators {
    fn from(b: ExitBreakdown) -> Self {
        ExitIndicators {
            exit_enterprise_value: b.exit_enterprise_value,
            moic: b.moic,
            irr: b.irr,
        }
    }
}

fn validate(input: &ExitInput<'_>) -> LboResult<()> {
    if input.term_years == 0 {
        return Err(LboError::InvalidInput {
            field: "term_years".into(),
            reason: "Holding period must be at least 1 year".into(),
        });
    }
    check_term(input.term_years)?;
    if input.preferred_return_pct < Decimal::ZERO {
        return Err(LboError::InvalidInput {
            field: "preferred_return_pct".into(),
            reason: "Preferred return cannot be negative".into(),
        });
    }
    if input.growth_pct < dec!(-100) {
        return Err(LboError::InvalidInput {
            field: "growth_pct".into(),
            reason: "Growth cannot be below -100%".into(),
        });
    }
    Ok(())
}

/// Preferred principal compounded at its own stated return over the term.
fn preferred_accrued(principal: Money, return_pct: Percent, term_years: u32) -> LboResult<Money> {
    (Decimal::ONE + pct_to_rate(return_pct))
        .checked_powu(u64::from(term_years))
        .and_then(|factor| principal.checked_mul(factor))
        .ok_or_else(|| LboError::overflow("preferred accrual"))
}

/// Exit enterprise value, equity proceeds after senior claims, MOIC and IRR.
///
/// Debt, PIK and accrued preferred are all senior to common equity, so any
/// shortfall is absorbed by equity and proceeds never go below zero.
pub fn try_exit_breakdown(input: &ExitInput<'_>) -> LboResult<ExitBreakdown> {
    validate(input)?;

    let growth = appreciate(pct_to_rate(input.growth_pct), Decimal::from(input.term_years));
    let exit_ebitda = growth
        .checked_mul(input.ltm_ebitda)
        .ok_or_else(|| LboError::overflow("exit EBITDA"))?;
    let exit_enterprise_value = exit_ebitda
        .checked_mul(input.entry_multiple)
        .ok_or_else(|| LboError::overflow("exit enterprise value"))?;

    let debt_balance = ending_balance(input.debt_schedule);
    let pik_balance = ending_balance(input.pik_schedule);
    let preferred_accrued = preferred_accrued(
        input.preferred_principal,
        input.preferred_return_pct,
        input.term_years,
    )?;

    let residual = exit_enterprise_value
        .checked_sub(debt_balance)
        .and_then(|v| v.checked_sub(pik_balance))
        .and_then(|v| v.checked_sub(preferred_accrued))
        .ok_or_else(|| LboError::overflow("equity proceeds"))?;
    let equity_proceeds = residual.max(Decimal::ZERO);

    let moic = if input.entry_equity > Decimal::ZERO {
        equity_proceeds
            .checked_div(input.entry_equity)
            .ok_or_else(|| LboError::overflow("MOIC"))?
    } else {
        Decimal::ZERO
    };
    let irr = annualised_return(moic, input.term_years)?;

    Ok(ExitBreakdown {
        exit_ebitda,
        exit_enterprise_value,
        debt_balance,
        pik_balance,
        preferred_accrued,
        equity_proceeds,
        moic,
        irr,
    })
}

pub fn try_exit_indicators(input: &ExitInput<'_>) -> LboResult<ExitIndicators> {
    try_exit_breakdown(input).map(ExitIndicators::from)
}

/// All-or-nothing exit indicators: any validation or arithmetic failure
/// yields `{0, 0, 0}`.
pub fn exit_indicators(input: &ExitInput<'_>) -> ExitIndicators {
    try_exit_indicators(input).unwrap_or_else(|e| {
        log::warn!("Exit indicators reset to zero: {e}");
        ExitIndicators::default()
    })
}
