use thiserror::Error;

#[derive(Error, Debug)]
pub enum SQLError {
    #[error("query error: {0}")]
    Query(String),

    #[error("execution error: {0}")]
    Execution(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("transaction error: {0}")]
    Transaction(String),
}

impl SQLError {
    /// Whether the failure was a UNIQUE / PRIMARY KEY violation.
    pub fn is_unique_violation(&self) -> bool {
        self.to_string().contains("UNIQUE constraint")
    }

    /// Whether a row referenced a parent that does not exist.
    pub fn is_foreign_key_violation(&self) -> bool {
        self.to_string().contains("FOREIGN KEY constraint")
    }
}
