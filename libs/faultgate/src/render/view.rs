//! HTML rendering for browser clients.

use std::fmt::Write as _;
use std::sync::Arc;

use axum::response::{Html, IntoResponse, Response};
use faultgate_errors::common::NoResourceFound;
use faultgate_errors::{BindError, ErrorKind, Failure};
use http::StatusCode;

use super::{RequestContext, Renderer, recorded_status};
use crate::classify::{Classifier, ERR_PFX};
use crate::messages::ValidationMessages;

/// Which page a view is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorTemplate {
    /// Generic page showing title, status and message.
    Exception,
    /// Static page for paths with no resource behind them.
    NotFound,
}

impl ErrorTemplate {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Exception => "exception",
            Self::NotFound => "404",
        }
    }
}

/// View model handed to the page templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorView {
    pub template: ErrorTemplate,
    pub status: StatusCode,
    pub title: String,
    /// Plain text; line breaks are kept when rendered.
    pub message: String,
}

impl ErrorView {
    pub fn exception(
        status: StatusCode,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            template: ErrorTemplate::Exception,
            status,
            title: title.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self {
            template: ErrorTemplate::NotFound,
            status: StatusCode::NOT_FOUND,
            title: String::new(),
            message: String::new(),
        }
    }
}

/// The two error pages. HTML-escapes everything it interpolates.
#[derive(Debug, Clone)]
pub struct ErrorPages {
    home_href: String,
}

impl Default for ErrorPages {
    fn default() -> Self {
        Self::new("/")
    }
}

impl ErrorPages {
    pub fn new(home_href: impl Into<String>) -> Self {
        Self {
            home_href: home_href.into(),
        }
    }

    #[must_use]
    pub fn render(&self, view: &ErrorView) -> String {
        match view.template {
            ErrorTemplate::NotFound => self.not_found_page(),
            ErrorTemplate::Exception => self.exception_page(view),
        }
    }

    fn exception_page(&self, view: &ErrorView) -> String {
        let heading = format!("{} {}", view.status.as_u16(), escape_html(&view.title));
        let message = view
            .message
            .lines()
            .map(escape_html)
            .collect::<Vec<_>>()
            .join("<br>");
        let mut page = String::new();
        page.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        let _ = writeln!(page, "<title>{heading}</title>");
        page.push_str("</head>\n<body>\n<div class=\"error\">\n");
        let _ = writeln!(page, "<h2>{heading}</h2>");
        let _ = writeln!(page, "<p class=\"message\">{message}</p>");
        let _ = writeln!(page, "<a href=\"{}\">Home</a>", escape_html(&self.home_href));
        page.push_str("</div>\n</body>\n</html>\n");
        page
    }

    fn not_found_page(&self) -> String {
        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>404 Not Found</title>\n</head>\n<body>\n<div class=\"error\">\n\
             <h2>404 Page not found</h2>\n\
             <p>The page you are looking for does not exist.</p>\n\
             <a href=\"{}\">Home</a>\n</div>\n</body>\n</html>\n",
            escape_html(&self.home_href)
        )
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// A view together with its rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedView {
    pub view: ErrorView,
    pub html: String,
}

impl IntoResponse for RenderedView {
    fn into_response(self) -> Response {
        (self.view.status, Html(self.html)).into_response()
    }
}

#[derive(Debug, Clone)]
pub struct ViewRenderer {
    classifier: Arc<Classifier>,
    messages: Arc<ValidationMessages>,
    pages: ErrorPages,
}

impl ViewRenderer {
    #[must_use]
    pub fn new(
        classifier: Arc<Classifier>,
        messages: Arc<ValidationMessages>,
        pages: ErrorPages,
    ) -> Self {
        Self {
            classifier,
            messages,
            pages,
        }
    }

    fn finish(&self, view: ErrorView) -> RenderedView {
        let html = self.pages.render(&view);
        RenderedView { view, html }
    }

    fn bind_view(&self, errors: &BindError, ctx: &RequestContext) -> ErrorView {
        let lines = self.messages.to_display_list(errors, &ctx.locale);
        tracing::warn!(
            kind = %ErrorKind::BadRequest,
            path = %ctx.path,
            "{ERR_PFX}BindException {} at request {}",
            lines.join("; "),
            ctx.path
        );
        let kind = ErrorKind::BadRequest;
        ErrorView::exception(kind.status(), kind.title(), lines.join("\n"))
    }
}

impl Renderer for ViewRenderer {
    type Output = RenderedView;

    fn render_failure(&self, failure: &Failure, ctx: &RequestContext) -> RenderedView {
        if let Some(errors) = failure.downcast_ref::<BindError>() {
            let view = self.bind_view(errors, ctx);
            return self.finish(view);
        }
        let classification = self.classifier.classify(failure, &ctx.path);
        let view = if classification.is::<NoResourceFound>() {
            ErrorView::not_found()
        } else {
            let kind = classification.kind;
            ErrorView::exception(kind.status(), kind.title(), classification.message)
        };
        self.finish(view)
    }

    fn render_recorded(
        &self,
        _ctx: &RequestContext,
        status: Option<StatusCode>,
        message: &str,
    ) -> RenderedView {
        let status = recorded_status(status);
        let view = if status == StatusCode::NOT_FOUND {
            ErrorView::not_found()
        } else {
            ErrorView::exception(status, ErrorKind::by_status(status).title(), message)
        };
        self.finish(view)
    }
}
