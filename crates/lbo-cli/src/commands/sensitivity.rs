use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use lbo_core::lbo::sensitivity::{
    self, ExitMetric, SensitivityInput, SensitivityVariable, SweepVariable,
};

use crate::commands::lbo::ScenarioArgs;
use crate::input;

/// Arguments for a 2-way sensitivity over the LBO pipeline
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to a JSON/YAML sensitivity document (base, variable_1, variable_2, metric)
    #[arg(long)]
    pub grid_file: Option<String>,

    /// First sweep in format name:min:max:step
    /// (e.g. "growth_pct:0:10:2.5")
    #[arg(long, allow_hyphen_values = true)]
    pub var1: Option<String>,

    /// Second sweep in format name:min:max:step (e.g. "term_years:3:7:1")
    #[arg(long, allow_hyphen_values = true)]
    pub var2: Option<String>,

    /// Metric per cell: irr, moic, exit_enterprise_value
    #[arg(long, default_value = "irr")]
    pub metric: String,

    #[command(flatten)]
    pub scenario: ScenarioArgs,
}

fn parse_named<T: serde::de::DeserializeOwned>(
    kind: &str,
    name: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    serde_json::from_value(Value::String(name.to_string()))
        .map_err(|_| format!("Unknown {kind} '{name}'").into())
}

fn parse_sens_var(spec: &str) -> Result<SensitivityVariable, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 4 {
        return Err(format!(
            "Sensitivity variable must be name:min:max:step, got '{}'",
            spec
        )
        .into());
    }
    let variable: SweepVariable = parse_named("sweep variable", parts[0])?;
    Ok(SensitivityVariable {
        variable,
        min: parts[1].parse::<Decimal>()?,
        max: parts[2].parse::<Decimal>()?,
        step: parts[3].parse::<Decimal>()?,
    })
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sens_input: SensitivityInput = if let Some(ref path) = args.grid_file {
        input::file::read_document(path)?
    } else {
        let var1 = args
            .var1
            .as_deref()
            .ok_or("--var1 is required (or provide --grid-file)")?;
        let var2 = args
            .var2
            .as_deref()
            .ok_or("--var2 is required (or provide --grid-file)")?;
        let metric: ExitMetric = parse_named("metric", &args.metric)?;

        SensitivityInput {
            base: args.scenario.load()?,
            variable_1: parse_sens_var(var1)?,
            variable_2: parse_sens_var(var2)?,
            metric,
        }
    };

    let result = sensitivity::run_sensitivity(&sens_input)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_sens_var() {
        let v = parse_sens_var("growth_pct:-5:10:2.5").unwrap();
        assert_eq!(v.variable, SweepVariable::GrowthPct);
        assert_eq!(v.min, dec!(-5));
        assert_eq!(v.max, dec!(10));
        assert_eq!(v.step, dec!(2.5));
    }

    #[test]
    fn test_parse_sens_var_rejects_unknown_name() {
        assert!(parse_sens_var("revenue:0:1:1").is_err());
        assert!(parse_sens_var("growth_pct:0:1").is_err());
    }

    #[test]
    fn test_parse_metric() {
        let m: ExitMetric = parse_named("metric", "exit_enterprise_value").unwrap();
        assert_eq!(m, ExitMetric::ExitEnterpriseValue);
    }
}
