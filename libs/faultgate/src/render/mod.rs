//! Audience-specific rendering of classified failures.

mod problem;
mod view;

pub use problem::{BIND_DETAIL, ProblemRenderer};
pub use view::{ErrorPages, ErrorTemplate, ErrorView, RenderedView, ViewRenderer};

use axum::response::IntoResponse;
use faultgate_errors::Failure;
use http::StatusCode;

use crate::messages::Locale;

/// Request facts a renderer needs; the locale is passed explicitly rather than read
/// from ambient per-request state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub path: String,
    pub locale: Locale,
}

impl RequestContext {
    pub fn new(path: impl Into<String>, locale: Locale) -> Self {
        Self {
            path: path.into(),
            locale,
        }
    }
}

/// Shared two-mode contract of the structured and HTML renderers.
pub trait Renderer: Send + Sync {
    type Output: IntoResponse;

    /// A live failure object is available.
    fn render_failure(&self, failure: &Failure, ctx: &RequestContext) -> Self::Output;

    /// Only the status and message recorded by the framework survived.
    fn render_recorded(
        &self,
        ctx: &RequestContext,
        status: Option<StatusCode>,
        message: &str,
    ) -> Self::Output;
}

/// Recorded status, or 500 when none was recorded.
#[must_use]
pub fn recorded_status(status: Option<StatusCode>) -> StatusCode {
    status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
