pub mod amortization;
pub mod capital_structure;
pub mod exit;
pub mod initial_values;
pub mod model;

#[cfg(feature = "sensitivity")]
pub mod sensitivity;
