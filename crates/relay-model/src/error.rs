use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("unknown region: {0}")]
    UnknownRegion(String),
    #[error("setting record is missing required field {field}")]
    MissingField { field: String },
    #[error("no mapping rules for pattern {pattern}")]
    NotMapped { pattern: String },
    #[error("{0}")]
    Message(String),
}

impl RelayError {
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
