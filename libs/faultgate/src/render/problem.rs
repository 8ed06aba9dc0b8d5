//! Structured (RFC 9457) rendering for API clients.

use std::sync::Arc;

use faultgate_errors::{BindError, ErrorKind, Failure, Problem};
use http::StatusCode;

use super::{RequestContext, Renderer, recorded_status};
use crate::classify::{Classifier, ERR_PFX};
use crate::messages::ValidationMessages;

/// Stable `detail` of every binding failure.
pub const BIND_DETAIL: &str = "BindException";

#[derive(Debug, Clone)]
pub struct ProblemRenderer {
    classifier: Arc<Classifier>,
    messages: Arc<ValidationMessages>,
}

impl ProblemRenderer {
    #[must_use]
    pub fn new(classifier: Arc<Classifier>, messages: Arc<ValidationMessages>) -> Self {
        Self {
            classifier,
            messages,
        }
    }

    /// Binding failures are always `BAD_REQUEST`, whatever the rule table says.
    fn render_bind(&self, errors: &BindError, ctx: &RequestContext) -> Problem {
        let invalid_params = self.messages.to_map(errors, &ctx.locale);
        tracing::warn!(
            kind = %ErrorKind::BadRequest,
            path = %ctx.path,
            invalid_params = ?invalid_params,
            "{ERR_PFX}BindException at request {}",
            ctx.path
        );
        problem_for(ErrorKind::BadRequest, BIND_DETAIL, &ctx.path)
            .with_invalid_params(&invalid_params)
    }
}

fn problem_for(kind: ErrorKind, detail: impl Into<String>, path: &str) -> Problem {
    Problem::new(kind.status(), kind.title(), detail).with_instance(path)
}

impl Renderer for ProblemRenderer {
    type Output = Problem;

    fn render_failure(&self, failure: &Failure, ctx: &RequestContext) -> Problem {
        if let Some(errors) = failure.downcast_ref::<BindError>() {
            return self.render_bind(errors, ctx);
        }
        let classification = self.classifier.classify(failure, &ctx.path);
        problem_for(classification.kind, classification.message, &ctx.path)
    }

    fn render_recorded(
        &self,
        ctx: &RequestContext,
        status: Option<StatusCode>,
        message: &str,
    ) -> Problem {
        let status = recorded_status(status);
        Problem::new(status, ErrorKind::by_status(status).title(), message).with_instance(&ctx.path)
    }
}
