//! Failure categories known to the default classification table.
//!
//! Request handlers and infrastructure code raise these instead of
//! picking a status code themselves.

/// No handler or static resource exists for the requested path.
#[derive(Debug, Clone, thiserror::Error)]
#[error("No static resource {path}.")]
pub struct NoResourceFound {
    pub path: String,
}

impl NoResourceFound {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Credentials are missing or were not accepted.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct AuthenticationFailed(pub String);

/// The caller is authenticated but lacks the required authority.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct AccessDenied(pub String);

/// A referenced entity does not exist in the persistence layer.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Unable to find {entity} with id {id}")]
pub struct EntityNotFound {
    pub entity: &'static str,
    pub id: String,
}

/// A uniqueness or referential constraint was violated.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct DataIntegrityViolation {
    pub constraint: Option<String>,
    pub message: String,
}

impl DataIntegrityViolation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            constraint: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }
}

/// An argument value is semantically invalid.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct IllegalArgument(pub String);

/// The operation was invoked in a state that does not permit it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct IllegalState(pub String);

/// The operation is not implemented.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct Unsupported(pub String);

/// A constraint check outside field binding failed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct ValidationFailed(pub String);

/// The HTTP method is not supported for the path.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Request method '{method}' is not supported")]
pub struct MethodNotSupported {
    pub method: String,
}

/// A required request parameter or header is absent.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Required parameter '{name}' is not present.")]
pub struct MissingParameter {
    pub name: String,
}

/// The request was rejected before reaching a handler.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct RequestRejected(pub String);
