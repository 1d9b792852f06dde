use relay_model::{ObjectId, RelayError, RepositoryError};
use thiserror::Error;

/// Failures reported by a target device model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("object {0} does not exist")]
    UnknownObject(ObjectId),
    #[error("attribute {attribute} of {object} is not {expected}")]
    TypeMismatch {
        object: ObjectId,
        attribute: String,
        expected: &'static str,
    },
    #[error("cannot create {class} named {name}: {reason}")]
    Create {
        class: String,
        name: String,
        reason: String,
    },
    #[error("commit failed: {0}")]
    Commit(String),
}

impl ModelError {
    pub fn type_mismatch(object: ObjectId, attribute: impl Into<String>, expected: &'static str) -> Self {
        Self::TypeMismatch {
            object,
            attribute: attribute.into(),
            expected,
        }
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Relay(#[from] RelayError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("invalid adjustment operand {operand:?} in rule {key}")]
    Operand { key: String, operand: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
