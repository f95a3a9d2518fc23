use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LboError;
use crate::lbo::exit::ExitIndicators;
use crate::lbo::model::{project, ScenarioInputs};
use crate::types::*;
use crate::LboResult;

const MAX_GRID_CELLS: usize = 10_000;

/// Scenario assumption that can be swept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepVariable {
    EntryMultiple,
    EquityPct,
    GrowthPct,
    TermYears,
    UnitrancheRatePct,
    PikRatePct,
    PreferredReturnPct,
}

/// Exit metric reported in each grid cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitMetric {
    #[default]
    Irr,
    Moic,
    ExitEnterpriseValue,
}

impl ExitMetric {
    fn pick(self, exit: &ExitIndicators) -> Decimal {
        match self {
            ExitMetric::Irr => exit.irr,
            ExitMetric::Moic => exit.moic,
            ExitMetric::ExitEnterpriseValue => exit.exit_enterprise_value,
        }
    }
}

/// Inclusive sweep range for one variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityVariable {
    pub variable: SweepVariable,
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

/// Input for a 2-way sensitivity over the LBO pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityInput {
    #[serde(default)]
    pub base: ScenarioInputs,
    pub variable_1: SensitivityVariable,
    pub variable_2: SensitivityVariable,
    #[serde(default)]
    pub metric: ExitMetric,
}

/// Output of a 2-way sensitivity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub variable_1: SweepVariable,
    pub variable_2: SweepVariable,
    pub variable_1_values: Vec<Decimal>,
    pub variable_2_values: Vec<Decimal>,
    pub metric: ExitMetric,
    /// matrix[i][j] = metric when variable_1 = values_1[i], variable_2 = values_2[j]
    pub matrix: Vec<Vec<Decimal>>,
    pub base_case_value: Decimal,
    /// Position of the base case in the matrix (row, col)
    pub base_case_position: (usize, usize),
}

fn generate_sweep_values(var: &SensitivityVariable) -> LboResult<Vec<Decimal>> {
    let field = || format!("variable:{:?}", var.variable);
    if var.step <= Decimal::ZERO {
        return Err(LboError::InvalidInput {
            field: field(),
            reason: "Step must be positive".into(),
        });
    }
    if var.min > var.max {
        return Err(LboError::InvalidInput {
            field: field(),
            reason: "Min must be <= max".into(),
        });
    }

    let mut values = Vec::new();
    let mut current = var.min;
    while current <= var.max {
        if values.len() >= MAX_GRID_CELLS {
            return Err(LboError::InvalidInput {
                field: field(),
                reason: format!("Sweep exceeds {MAX_GRID_CELLS} values"),
            });
        }
        values.push(current);
        current = match current.checked_add(var.step) {
            Some(next) => next,
            None => break,
        };
    }
    // Ensure max is included if step doesn't land exactly on it
    if let Some(&last) = values.last() {
        if last < var.max {
            values.push(var.max);
        }
    }

    Ok(values)
}

/// Find the closest index to a target value in a sorted list.
fn closest_index(values: &[Decimal], target: Decimal) -> LboResult<usize> {
    let mut best: Option<(usize, Decimal)> = None;
    for (i, v) in values.iter().enumerate() {
        let distance = v
            .checked_sub(target)
            .ok_or_else(|| LboError::overflow("distance to base case"))?
            .abs();
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((i, distance));
        }
    }
    Ok(best.map_or(0, |(i, _)| i))
}

/// Midpoint of a sweep range, halving each bound before adding.
fn midpoint(var: &SensitivityVariable) -> LboResult<Decimal> {
    let half_min = var.min.checked_div(dec!(2));
    let half_max = var.max.checked_div(dec!(2));
    half_min
        .zip(half_max)
        .and_then(|(a, b)| a.checked_add(b))
        .ok_or_else(|| LboError::overflow(format!("midpoint of {:?} sweep", var.variable)))
}

fn apply(inputs: &mut ScenarioInputs, variable: SweepVariable, value: Decimal) -> LboResult<()> {
    match variable {
        SweepVariable::EntryMultiple => inputs.entry_multiple = value,
        SweepVariable::EquityPct => inputs.equity_pct = value,
        SweepVariable::GrowthPct => inputs.growth_pct = value,
        SweepVariable::UnitrancheRatePct => inputs.unitranche.rate_pct = value,
        SweepVariable::PikRatePct => inputs.pik.rate_pct = value,
        SweepVariable::PreferredReturnPct => inputs.preferred.return_pct = value,
        SweepVariable::TermYears => {
            inputs.term_years = value
                .fract()
                .is_zero()
                .then(|| value.to_u32())
                .flatten()
                .ok_or_else(|| LboError::InvalidInput {
                    field: "term_years".into(),
                    reason: format!("Term must be a whole number of years, got {value}"),
                })?;
        }
    }
    Ok(())
}

/// Rerun the pipeline over a 2-way grid of assumptions and collect one exit
/// metric per cell.
pub fn run_sensitivity(
    input: &SensitivityInput,
) -> LboResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let v1_values = generate_sweep_values(&input.variable_1)?;
    let v2_values = generate_sweep_values(&input.variable_2)?;
    if v1_values.len().saturating_mul(v2_values.len()) > MAX_GRID_CELLS {
        return Err(LboError::InvalidInput {
            field: "grid".into(),
            reason: format!("Grid exceeds {MAX_GRID_CELLS} cells"),
        });
    }

    let mut matrix = Vec::with_capacity(v1_values.len());
    for v1 in &v1_values {
        let mut row = Vec::with_capacity(v2_values.len());
        for v2 in &v2_values {
            let mut scenario = input.base.clone();
            apply(&mut scenario, input.variable_1.variable, *v1)?;
            apply(&mut scenario, input.variable_2.variable, *v2)?;

            let mut cell_warnings = Vec::new();
            let model = project(&scenario, &mut cell_warnings);
            if !cell_warnings.is_empty() {
                warnings.push(format!("({v1}, {v2}): {}", cell_warnings.join("; ")));
            }
            row.push(input.metric.pick(&model.exit_indicators));
        }
        matrix.push(row);
    }

    let base_row = closest_index(&v1_values, midpoint(&input.variable_1)?)?;
    let base_col = closest_index(&v2_values, midpoint(&input.variable_2)?)?;
    let base_case_value = matrix[base_row][base_col];

    let output = SensitivityOutput {
        variable_1: input.variable_1.variable,
        variable_2: input.variable_2.variable,
        variable_1_values: v1_values,
        variable_2_values: v2_values,
        metric: input.metric,
        matrix,
        base_case_value,
        base_case_position: (base_row, base_col),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "2-Way LBO Sensitivity",
        &serde_json::json!({
            "variable_1": input.variable_1.variable,
            "variable_2": input.variable_2.variable,
            "metric": input.metric,
        }),
        warnings,
        elapsed,
        output,
    ))
}
