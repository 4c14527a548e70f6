use thiserror::Error;

use crate::form::TransitionError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// A draft failed the console's form validation. The message is shown to the operator as-is.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// A kind prefix or declared type that is not one of the seven backend kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown value kind: {0}")]
pub struct UnknownKind(pub String);

/// A wire value whose `type` tag has no matching payload field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} value is missing its `{field}` payload")]
pub struct MissingPayload {
    pub kind: &'static str,
    pub field: &'static str,
}
