//! The failure carrier handed to the classification layer.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::kind::ErrorKind;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A failure that declares its own [`ErrorKind`], bypassing rule-table classification.
pub trait TypedFailure: StdError {
    fn error_kind(&self) -> ErrorKind;
}

/// Application-defined failure with an explicit kind.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl TypedFailure for AppError {
    fn error_kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Owns an arbitrary error together with the simple name of its concrete type.
///
/// The type name is captured at construction because it cannot be recovered
/// from a `dyn Error` later on. Cloning is cheap; clones share the error.
#[derive(Clone)]
pub struct Failure {
    inner: Arc<dyn StdError + Send + Sync + 'static>,
    type_name: &'static str,
}

impl Failure {
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(error),
            type_name: simple_type_name(std::any::type_name::<E>()),
        }
    }

    #[must_use]
    pub fn as_error(&self) -> &(dyn StdError + 'static) {
        &*self.inner
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    #[must_use]
    pub fn is<T: StdError + 'static>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Deepest error in the `source()` chain, or the wrapped error itself.
    #[must_use]
    pub fn root_cause(&self) -> &(dyn StdError + 'static) {
        root_cause(self.as_error())
    }
}

impl<E> From<E> for Failure
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::new(error)
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("type_name", &self.type_name)
            .field("inner", &self.inner)
            .finish()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

/// Axum integration: a handler returning `Err(Failure)` leaves the failure in the
/// response extensions for the error funnel to classify and render.
#[cfg(feature = "axum")]
impl axum::response::IntoResponse for Failure {
    fn into_response(self) -> axum::response::Response {
        let mut resp = http::StatusCode::INTERNAL_SERVER_ERROR.into_response();
        resp.extensions_mut().insert(self);
        resp
    }
}

/// Follow the `source()` chain to its deepest element.
#[must_use]
pub fn root_cause<'a>(error: &'a (dyn StdError + 'static)) -> &'a (dyn StdError + 'static) {
    let mut current = error;
    while let Some(next) = current.source() {
        current = next;
    }
    current
}

/// Render an error and all of its causes as `outer: inner: root`.
#[must_use]
pub fn cause_chain(error: &(dyn StdError + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut current = error.source();
    while let Some(cause) = current {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        current = cause.source();
    }
    rendered
}

/// Last path segment of a type name, without generic parameters.
#[must_use]
pub fn simple_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
