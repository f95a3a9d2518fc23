use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::lbo::amortization::{amortize_bullet, amortize_pik, AmortizationRow};
use crate::lbo::capital_structure::{try_capital_structure, CapitalStructureRow};
use crate::lbo::exit::{try_exit_breakdown, ExitBreakdown, ExitIndicators, ExitInput};
use crate::lbo::initial_values::{initial_values, InitialValues};
use crate::types::*;

/// Principal and coupon of one debt instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentInputs {
    pub principal: Money,
    pub rate_pct: Percent,
}

/// Preferred equity contribution and its compounding return
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferredInputs {
    pub principal: Money,
    pub return_pct: Percent,
}

/// How preferred dividends are settled. Both settle identically at exit:
/// the full compounded amount ranks ahead of common equity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferredDividends {
    #[default]
    Accrued,
    Periodic,
}

/// Every assumption the model needs. Missing fields in a config document
/// fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioInputs {
    pub ltm_ebitda: Money,
    pub entry_multiple: Multiple,
    pub equity_pct: Percent,
    pub term_years: u32,
    /// Year-over-year EBITDA growth
    pub growth_pct: Percent,
    pub unitranche: InstrumentInputs,
    pub pik: InstrumentInputs,
    pub preferred: PreferredInputs,
    pub preferred_dividends: PreferredDividends,
    /// Replaces the derived entry equity as the MOIC denominator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_equity_override: Option<Money>,
}

impl Default for ScenarioInputs {
    fn default() -> Self {
        Self {
            ltm_ebitda: dec!(10),
            entry_multiple: dec!(6),
            equity_pct: dec!(40),
            term_years: 5,
            growth_pct: dec!(5),
            unitranche: InstrumentInputs {
                principal: dec!(50000000),
                rate_pct: dec!(8),
            },
            pik: InstrumentInputs {
                principal: dec!(30000000),
                rate_pct: dec!(12),
            },
            preferred: PreferredInputs {
                principal: dec!(20000000),
                return_pct: dec!(10),
            },
            preferred_dividends: PreferredDividends::Accrued,
            entry_equity_override: None,
        }
    }
}

impl ScenarioInputs {
    /// Equity used as the MOIC denominator.
    pub fn entry_equity(&self, initial: &InitialValues) -> Money {
        self.entry_equity_override.unwrap_or(initial.equity)
    }
}

/// Every stage of the pipeline for one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    pub initial_values: InitialValues,
    pub debt_schedule: Vec<AmortizationRow>,
    pub pik_schedule: Vec<AmortizationRow>,
    pub capital_structure: Vec<CapitalStructureRow>,
    pub exit: ExitBreakdown,
    pub exit_indicators: ExitIndicators,
}

/// Run the pipeline: initial values, both schedules, capital structure,
/// exit. Each stage applies its own fallback, so this never fails; problems
/// are reported through `warnings`.
pub(crate) fn project(inputs: &ScenarioInputs, warnings: &mut Vec<String>) -> ModelOutput {
    let iv = initial_values(inputs.ltm_ebitda, inputs.entry_multiple, inputs.equity_pct);
    if iv.purchase_price.is_zero() {
        warnings.push("Purchase price is zero; initial values reset to zero".into());
    }

    let debt_schedule = amortize_bullet(
        inputs.unitranche.principal,
        inputs.unitranche.rate_pct,
        inputs.term_years,
    );
    let pik_schedule = amortize_pik(inputs.pik.principal, inputs.pik.rate_pct, inputs.term_years);

    let capital_structure = match try_capital_structure(
        &debt_schedule,
        &pik_schedule,
        inputs.preferred.principal,
        inputs.term_years,
        iv.purchase_price,
    ) {
        Ok(rows) => rows,
        Err(e) => {
            log::warn!("Capital structure not computed: {e}");
            warnings.push(format!("Capital structure not computed: {e}"));
            Vec::new()
        }
    };
    for row in &capital_structure {
        let claims = row.debt_balance + row.pik_balance + row.preferred_principal;
        if claims > iv.purchase_price {
            warnings.push(format!(
                "Year {}: capital claims {} exceed purchase price {}; residual equity shown as zero",
                row.year, claims, iv.purchase_price
            ));
        }
    }

    let exit_input = ExitInput {
        debt_schedule: &debt_schedule,
        pik_schedule: &pik_schedule,
        preferred_principal: inputs.preferred.principal,
        preferred_return_pct: inputs.preferred.return_pct,
        term_years: inputs.term_years,
        growth_pct: inputs.growth_pct,
        ltm_ebitda: inputs.ltm_ebitda,
        entry_multiple: inputs.entry_multiple,
        entry_equity: inputs.entry_equity(&iv),
    };
    let exit = match try_exit_breakdown(&exit_input) {
        Ok(b) => {
            if b.equity_proceeds.is_zero() && !b.exit_enterprise_value.is_zero() {
                warnings.push(
                    "Senior claims absorb the entire exit value; equity proceeds are zero".into(),
                );
            }
            b
        }
        Err(e) => {
            log::warn!("Exit indicators reset to zero: {e}");
            warnings.push(format!("Exit indicators reset to zero: {e}"));
            ExitBreakdown::default()
        }
    };

    ModelOutput {
        initial_values: iv,
        exit_indicators: ExitIndicators::from(exit.clone()),
        debt_schedule,
        pik_schedule,
        capital_structure,
        exit,
    }
}

/// Full LBO pipeline for one scenario.
pub fn run_model(inputs: &ScenarioInputs) -> ComputationOutput<ModelOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let output = project(inputs, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "LBO: Initial Values, Bullet/PIK Schedules, Capital Structure, Exit Returns",
        inputs,
        warnings,
        elapsed,
        output,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lbo::exit::exit_indicators;
    use rust_decimal::Decimal;
    use pretty_assertions::assert_eq;

    fn balanced() -> ScenarioInputs {
        ScenarioInputs {
            ltm_ebitda: dec!(100),
            entry_multiple: dec!(8),
            equity_pct: dec!(40),
            term_years: 5,
            growth_pct: dec!(5),
            unitranche: InstrumentInputs {
                principal: dec!(300),
                rate_pct: dec!(8),
            },
            pik: InstrumentInputs {
                principal: dec!(100),
                rate_pct: dec!(12),
            },
            preferred: PreferredInputs {
                principal: dec!(80),
                return_pct: dec!(10),
            },
            preferred_dividends: PreferredDividends::Accrued,
            entry_equity_override: None,
        }
    }

    #[test]
    fn test_pipeline_stages_line_up() {
        let out = run_model(&balanced());
        let m = &out.result;

        assert_eq!(m.initial_values.purchase_price, dec!(800));
        assert_eq!(m.debt_schedule.len(), 5);
        assert_eq!(m.pik_schedule.len(), 5);
        assert_eq!(m.capital_structure.len(), 5);

        let direct = exit_indicators(&ExitInput {
            debt_schedule: &m.debt_schedule,
            pik_schedule: &m.pik_schedule,
            preferred_principal: dec!(80),
            preferred_return_pct: dec!(10),
            term_years: 5,
            growth_pct: dec!(5),
            ltm_ebitda: dec!(100),
            entry_multiple: dec!(8),
            entry_equity: dec!(320),
        });
        assert_eq!(m.exit_indicators, direct);
        assert!(m.exit_indicators.moic > Decimal::ZERO);
        assert!(out.warnings.is_empty(), "{:?}", out.warnings);
    }

    #[test]
    fn test_entry_equity_override() {
        let mut inputs = balanced();
        let base = run_model(&inputs).result.exit;
        inputs.entry_equity_override = Some(dec!(640));
        let overridden = run_model(&inputs).result.exit;

        assert_eq!(overridden.equity_proceeds, base.equity_proceeds);
        assert!((overridden.moic * dec!(2) - base.moic).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_default_scenario_flags_oversized_claims() {
        // The default instruments are far larger than the default purchase price.
        let out = run_model(&ScenarioInputs::default());
        assert_eq!(out.result.initial_values.purchase_price, dec!(60));
        assert!(out.result.capital_structure.iter().all(|r| r.equity.is_zero()));
        assert!(out.warnings.iter().any(|w| w.contains("exceed purchase price")));
        assert_eq!(out.result.exit_indicators.moic, Decimal::ZERO);
    }

    #[test]
    fn test_zero_term_collapses_exit() {
        let mut inputs = balanced();
        inputs.term_years = 0;
        let out = run_model(&inputs);
        assert!(out.result.debt_schedule.is_empty());
        assert!(out.result.capital_structure.is_empty());
        assert_eq!(out.result.exit_indicators, ExitIndicators::default());
        assert!(out.warnings.iter().any(|w| w.contains("Exit indicators reset")));
    }

    #[test]
    fn test_absurd_term_degrades_to_zero() {
        let mut inputs = balanced();
        inputs.term_years = 4_000_000_000;
        let out = run_model(&inputs);
        assert!(out.result.debt_schedule.is_empty());
        assert!(out.result.pik_schedule.is_empty());
        assert!(out.result.capital_structure.is_empty());
        assert_eq!(out.result.exit_indicators, ExitIndicators::default());
        assert!(out.warnings.iter().any(|w| w.contains("year maximum")));
    }

    #[test]
    fn test_deterministic() {
        let a = run_model(&balanced()).result;
        let b = run_model(&balanced()).result;
        assert_eq!(a, b);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let inputs: ScenarioInputs =
            serde_json::from_str(r#"{"ltm_ebitda": "100", "term_years": 7}"#).unwrap();
        assert_eq!(inputs.ltm_ebitda, dec!(100));
        assert_eq!(inputs.term_years, 7);
        assert_eq!(inputs.entry_multiple, dec!(6));
        assert_eq!(inputs.preferred_dividends, PreferredDividends::Accrued);
    }
}
