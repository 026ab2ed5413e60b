use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Which remaining-debt ceiling a payment ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebtScope {
    Loan,
    Installment,
}

impl fmt::Display for DebtScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebtScope::Loan => write!(f, "loan"),
            DebtScope::Installment => write!(f, "installment"),
        }
    }
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("caller does not own this loan")]
    Unauthorized,
    #[error("invalid state: {reason}")]
    InvalidState { reason: String },
    #[error("payment amount {requested} exceeds remaining {scope} debt {remaining}")]
    AmountExceeds {
        scope: DebtScope,
        requested: Decimal,
        remaining: Decimal,
    },
    #[error("installment does not belong to this loan")]
    InstallmentMismatch,
    #[error("validation error: {0}")]
    Validation(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }
}
