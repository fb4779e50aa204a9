use thiserror::Error;

#[derive(Error, Debug)]
pub enum BudgieError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Recurring transaction {id} is invalid: {reason}")]
    Validation { id: i64, reason: String },

    #[error("Recurring transaction {0} was already advanced by another run")]
    Conflict(i64),

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("No recurring transaction with ID {0}")]
    UnknownRecurring(i64),

    #[error("Invalid date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid frequency: {0} (must be weekly, monthly or annually)")]
    InvalidFrequency(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

/// How a failed occurrence is reported by the batch driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    Persistence,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Validation => f.write_str("validation"),
            FailureKind::Persistence => f.write_str("persistence"),
        }
    }
}

impl BudgieError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            BudgieError::Validation { .. } => FailureKind::Validation,
            _ => FailureKind::Persistence,
        }
    }

    /// The recurring transaction this error is about, if it names one.
    pub fn definition_id(&self) -> Option<i64> {
        match self {
            BudgieError::Validation { id, .. } | BudgieError::Conflict(id) => Some(*id),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BudgieError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_is_classified_as_validation() {
        let err = BudgieError::Validation { id: 4, reason: "missing account".into() };
        assert_eq!(err.failure_kind(), FailureKind::Validation);
        assert_eq!(err.to_string(), "Recurring transaction 4 is invalid: missing account");
    }

    #[test]
    fn test_store_errors_are_persistence() {
        assert_eq!(BudgieError::Conflict(1).failure_kind(), FailureKind::Persistence);
        let db = BudgieError::Db(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(db.failure_kind(), FailureKind::Persistence);
    }

    #[test]
    fn test_definition_id() {
        assert_eq!(BudgieError::Conflict(3).definition_id(), Some(3));
        let err = BudgieError::Validation { id: 9, reason: "x".into() };
        assert_eq!(err.definition_id(), Some(9));
        assert_eq!(BudgieError::Other("down".into()).definition_id(), None);
    }
}
