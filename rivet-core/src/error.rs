use crate::Error;

/// Failures detected by the mapping layer itself.
///
/// They travel inside [`Error`] (an `anyhow::Error`), the same way backend
/// failures do. Use [`ErrorKind::of`] to recover the kind:
/// ```rust,ignore
/// match ErrorKind::of(&error) {
///     Some(ErrorKind::MethodNotFound { .. }) => { /* ... */ }
///     _ => return Err(error),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// Malformed entity type, relation target, field definition or condition key.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Unrecognized accessor on an entity or predicate on a query.
    #[error("Call to undefined method {owner}::{method}")]
    MethodNotFound { owner: String, method: String },
    /// Attempt to modify a read-only view.
    #[error("Cannot modify {0}: it is read-only")]
    ReadOnlyViolation(String),
    /// A required field is missing.
    #[error("Field `{field}` of {entity} is required but it is null")]
    Validation { entity: String, field: String },
}

impl ErrorKind {
    pub fn of(error: &Error) -> Option<&ErrorKind> {
        error.downcast_ref::<ErrorKind>()
    }
}

pub(crate) fn invalid_argument(message: impl Into<String>) -> Error {
    let error = Error::new(ErrorKind::InvalidArgument(message.into()));
    log::debug!("{:#}", error);
    error
}

pub(crate) fn method_not_found(owner: impl Into<String>, method: impl Into<String>) -> Error {
    let error = Error::new(ErrorKind::MethodNotFound {
        owner: owner.into(),
        method: method.into(),
    });
    log::debug!("{:#}", error);
    error
}
