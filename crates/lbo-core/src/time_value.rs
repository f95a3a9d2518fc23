use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::LboError;
use crate::types::{Multiple, Rate, Years};
use crate::LboResult;

/// Compound growth factor `(1 + rate)^periods`.
///
/// `rate` is a decimal fraction (0.05 = 5%). Rejects `rate < -1`, where the
/// base would go negative, and negative period counts.
pub fn try_appreciate(rate: Rate, periods: Years) -> LboResult<Decimal> {
    if rate < dec!(-1) {
        return Err(LboError::InvalidInput {
            field: "rate".into(),
            reason: "Growth rate must be at least -100%".into(),
        });
    }
    if periods < Decimal::ZERO {
        return Err(LboError::InvalidInput {
            field: "periods".into(),
            reason: "Number of periods cannot be negative".into(),
        });
    }

    if periods.is_zero() {
        return Ok(Decimal::ONE);
    }
    let base = Decimal::ONE
        .checked_add(rate)
        .ok_or_else(|| LboError::overflow(format!("appreciation base 1 + {rate}")))?;
    if base.is_zero() {
        return Ok(Decimal::ZERO);
    }

    base.checked_powd(periods)
        .ok_or_else(|| LboError::overflow(format!("appreciation ({base})^{periods}")))
}

/// Compound growth factor that never fails.
///
/// Any input `try_appreciate` rejects yields `0` and a `warn` diagnostic, so a
/// live recomputation degrades to a visible zero instead of aborting.
pub fn appreciate(rate: Rate, periods: Years) -> Decimal {
    match try_appreciate(rate, periods) {
        Ok(factor) => factor,
        Err(e) => {
            log::warn!("Invalid inputs to appreciation: rate={rate}, periods={periods} ({e})");
            Decimal::ZERO
        }
    }
}

/// Annualised return implied by a multiple over a whole number of years:
/// `moic^(1/years) - 1`. Zero when the multiple is not positive or the
/// holding period is empty.
pub fn annualised_return(moic: Multiple, years: u32) -> LboResult<Rate> {
    if moic <= Decimal::ZERO || years == 0 {
        return Ok(Decimal::ZERO);
    }

    let exponent = Decimal::ONE
        .checked_div(Decimal::from(years))
        .ok_or_else(|| LboError::DivisionByZero {
            context: "annualised return exponent".into(),
        })?;
    let growth = moic
        .checked_powd(exponent)
        .ok_or_else(|| LboError::overflow(format!("annualised return {moic}^(1/{years})")))?;

    Ok(growth - Decimal::ONE)
}
