use thiserror::Error;

#[derive(Debug, Error)]
pub enum LboError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Decimal overflow in {context}")]
    Overflow { context: String },

    #[error("Schedule mismatch: {instrument} schedule has {rows} rows but the term is {term} years")]
    ScheduleMismatch {
        instrument: String,
        rows: usize,
        term: u32,
    },
}

impl LboError {
    pub(crate) fn overflow(context: impl Into<String>) -> Self {
        LboError::Overflow {
            context: context.into(),
        }
    }
}
