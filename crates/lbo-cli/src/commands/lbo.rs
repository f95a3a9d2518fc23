use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use lbo_core::lbo::amortization::{self, DebtInstrument};
use lbo_core::lbo::capital_structure;
use lbo_core::lbo::exit::{self, ExitInput};
use lbo_core::lbo::initial_values;
use lbo_core::lbo::model::{self, ScenarioInputs};
use lbo_core::time_value;

use crate::input;

/// Scenario assumptions. Flags override whatever `--input` or stdin supplied,
/// which in turn override the built-in defaults.
#[derive(Args, Debug, Default)]
pub struct ScenarioArgs {
    /// Path to a JSON or YAML scenario file
    #[arg(long)]
    pub input: Option<String>,

    /// Last twelve months EBITDA
    #[arg(long)]
    pub ltm_ebitda: Option<Decimal>,

    /// Entry EV/EBITDA multiple
    #[arg(long)]
    pub entry_multiple: Option<Decimal>,

    /// Equity share of the purchase price, percent (e.g. 40)
    #[arg(long)]
    pub equity_pct: Option<Decimal>,

    /// Holding period / loan term in years
    #[arg(long)]
    pub term: Option<u32>,

    /// Year-over-year EBITDA growth, percent
    #[arg(long, allow_hyphen_values = true)]
    pub growth_pct: Option<Decimal>,

    /// Unitranche principal
    #[arg(long)]
    pub unitranche_principal: Option<Decimal>,

    /// Unitranche interest rate, percent
    #[arg(long, allow_hyphen_values = true)]
    pub unitranche_rate_pct: Option<Decimal>,

    /// PIK loan principal
    #[arg(long)]
    pub pik_principal: Option<Decimal>,

    /// PIK loan interest rate, percent
    #[arg(long, allow_hyphen_values = true)]
    pub pik_rate_pct: Option<Decimal>,

    /// Preferred equity contribution
    #[arg(long)]
    pub preferred_principal: Option<Decimal>,

    /// Preferred return, percent
    #[arg(long, allow_hyphen_values = true)]
    pub preferred_return_pct: Option<Decimal>,

    /// Entry equity used for MOIC instead of the derived equity
    #[arg(long)]
    pub entry_equity: Option<Decimal>,
}

impl ScenarioArgs {
    fn apply(&self, s: &mut ScenarioInputs) {
        if let Some(v) = self.ltm_ebitda {
            s.ltm_ebitda = v;
        }
        if let Some(v) = self.entry_multiple {
            s.entry_multiple = v;
        }
        if let Some(v) = self.equity_pct {
            s.equity_pct = v;
        }
        if let Some(v) = self.term {
            s.term_years = v;
        }
        if let Some(v) = self.growth_pct {
            s.growth_pct = v;
        }
        if let Some(v) = self.unitranche_principal {
            s.unitranche.principal = v;
        }
        if let Some(v) = self.unitranche_rate_pct {
            s.unitranche.rate_pct = v;
        }
        if let Some(v) = self.pik_principal {
            s.pik.principal = v;
        }
        if let Some(v) = self.pik_rate_pct {
            s.pik.rate_pct = v;
        }
        if let Some(v) = self.preferred_principal {
            s.preferred.principal = v;
        }
        if let Some(v) = self.preferred_return_pct {
            s.preferred.return_pct = v;
        }
        if self.entry_equity.is_some() {
            s.entry_equity_override = self.entry_equity;
        }
    }

    /// Resolve the scenario: file, then piped stdin, then defaults, with
    /// flags layered on top.
    pub fn load(&self) -> Result<ScenarioInputs, Box<dyn std::error::Error>> {
        let mut scenario: ScenarioInputs = if let Some(ref path) = self.input {
            input::file::read_document(path)?
        } else if let Some(data) = input::stdin::read_stdin()? {
            serde_json::from_value(data)?
        } else {
            ScenarioInputs::default()
        };
        self.apply(&mut scenario);
        log::info!(
            "Scenario: EBITDA {} at {}x, {}% equity, {} years",
            scenario.ltm_ebitda,
            scenario.entry_multiple,
            scenario.equity_pct,
            scenario.term_years
        );
        Ok(scenario)
    }
}

pub fn run_initial_values(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let s = args.load()?;
    let iv = initial_values::try_initial_values(s.ltm_ebitda, s.entry_multiple, s.equity_pct)?;
    Ok(serde_json::to_value(iv)?)
}

pub fn run_bullet(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let s = args.load()?;
    let instrument =
        DebtInstrument::bullet(s.unitranche.principal, s.unitranche.rate_pct, s.term_years);
    let result = amortization::build_schedule(&instrument)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_pik(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let s = args.load()?;
    let instrument = DebtInstrument::pik(s.pik.principal, s.pik.rate_pct, s.term_years);
    let result = amortization::build_schedule(&instrument)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_capital_structure(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let s = args.load()?;
    let iv = initial_values::initial_values(s.ltm_ebitda, s.entry_multiple, s.equity_pct);
    let debt = amortization::try_amortize_bullet(
        s.unitranche.principal,
        s.unitranche.rate_pct,
        s.term_years,
    )?;
    let pik = amortization::try_amortize_pik(s.pik.principal, s.pik.rate_pct, s.term_years)?;
    let rows = capital_structure::try_capital_structure(
        &debt,
        &pik,
        s.preferred.principal,
        s.term_years,
        iv.purchase_price,
    )?;
    Ok(serde_json::to_value(rows)?)
}

pub fn run_exit(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let s = args.load()?;
    let iv = initial_values::initial_values(s.ltm_ebitda, s.entry_multiple, s.equity_pct);
    let debt = amortization::try_amortize_bullet(
        s.unitranche.principal,
        s.unitranche.rate_pct,
        s.term_years,
    )?;
    let pik = amortization::try_amortize_pik(s.pik.principal, s.pik.rate_pct, s.term_years)?;
    let breakdown = exit::try_exit_breakdown(&ExitInput {
        debt_schedule: &debt,
        pik_schedule: &pik,
        preferred_principal: s.preferred.principal,
        preferred_return_pct: s.preferred.return_pct,
        term_years: s.term_years,
        growth_pct: s.growth_pct,
        ltm_ebitda: s.ltm_ebitda,
        entry_multiple: s.entry_multiple,
        entry_equity: s.entry_equity(&iv),
    })?;
    Ok(serde_json::to_value(breakdown)?)
}

pub fn run_model(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let s = args.load()?;
    let result = model::run_model(&s);
    for w in &result.warnings {
        log::warn!("{w}");
    }
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the compound growth factor
#[derive(Args)]
pub struct AppreciateArgs {
    /// Growth rate as a decimal fraction (0.05 = 5%)
    #[arg(long, allow_hyphen_values = true)]
    pub rate: Decimal,

    /// Number of periods
    #[arg(long, allow_hyphen_values = true)]
    pub periods: Decimal,
}

pub fn run_appreciate(args: AppreciateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let factor = time_value::appreciate(args.rate, args.periods);
    Ok(serde_json::json!({
        "rate": args.rate,
        "periods": args.periods,
        "factor": factor,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_flags_override_defaults() {
        let args = ScenarioArgs {
            ltm_ebitda: Some(dec!(100)),
            term: Some(7),
            entry_equity: Some(dec!(250)),
            ..ScenarioArgs::default()
        };
        let mut s = ScenarioInputs::default();
        args.apply(&mut s);

        assert_eq!(s.ltm_ebitda, dec!(100));
        assert_eq!(s.term_years, 7);
        assert_eq!(s.entry_equity_override, Some(dec!(250)));
        assert_eq!(s.entry_multiple, dec!(6));
    }

    #[test]
    fn test_appreciate_command() {
        let value = run_appreciate(AppreciateArgs {
            rate: dec!(-2),
            periods: dec!(3),
        })
        .unwrap();
        assert_eq!(value["factor"], serde_json::json!("0"));
    }
}
