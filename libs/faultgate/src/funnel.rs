//! The single entry point that turns every failed request into a response.
//!
//! Handlers return `Err(Failure)`; the failure travels in the response extensions
//! until [`error_funnel_middleware`] picks it up. Error responses produced without a
//! failure (extractor rejections, unmatched methods, body limits) take the recorded
//! path with whatever status and message the framework left behind.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, Uri, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use faultgate_errors::common::{MethodNotSupported, NoResourceFound};
use faultgate_errors::{APPLICATION_PROBLEM_JSON, Failure};
use http::StatusCode;

use crate::classify::{Classifier, ERR_PFX};
use crate::config::ErrorsConfig;
use crate::messages::{Locale, MessageCatalog, ValidationMessages};
use crate::render::{ErrorPages, ProblemRenderer, Renderer, RequestContext, ViewRenderer};

/// Upper bound on a recorded body read back as the error message.
const RECORDED_BODY_LIMIT: usize = 8 * 1024;

/// Consumer class of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Structured API client; receives problem JSON.
    Api,
    /// Browser; receives an HTML page.
    Browser,
}

impl Audience {
    /// Pure function of the path: anything starting with `api_prefix` is API.
    #[must_use]
    pub fn for_path(api_prefix: &str, path: &str) -> Self {
        if path.starts_with(api_prefix) {
            Self::Api
        } else {
            Self::Browser
        }
    }
}

/// Marks responses the funnel already produced.
#[derive(Debug, Clone, Copy)]
struct Rendered;

/// One failed request as seen by the funnel.
#[derive(Debug)]
pub struct FailedRequest<'a> {
    pub path: &'a str,
    pub status: Option<StatusCode>,
    pub message: &'a str,
    pub failure: Option<&'a Failure>,
    pub locale: Locale,
}

pub struct ErrorFunnel {
    api_prefix: String,
    default_locale: Locale,
    problems: ProblemRenderer,
    views: ViewRenderer,
}

impl ErrorFunnel {
    #[must_use]
    pub fn new(
        api_prefix: impl Into<String>,
        default_locale: Locale,
        problems: ProblemRenderer,
        views: ViewRenderer,
    ) -> Self {
        Self {
            api_prefix: api_prefix.into(),
            default_locale,
            problems,
            views,
        }
    }

    /// Wire the default classifier and both renderers from configuration.
    #[must_use]
    pub fn from_config(config: &ErrorsConfig, classifier: Arc<Classifier>) -> Self {
        let default_locale = Locale::new(&config.default_locale);
        let catalog = config
            .messages
            .iter()
            .fold(MessageCatalog::new(default_locale.clone()), |catalog, (tag, bundle)| {
                catalog.with_bundle(&Locale::new(tag), bundle.clone())
            });
        let messages = Arc::new(ValidationMessages::new(Arc::new(catalog)));
        Self::new(
            config.api_prefix.clone(),
            default_locale,
            ProblemRenderer::new(Arc::clone(&classifier), Arc::clone(&messages)),
            ViewRenderer::new(classifier, messages, ErrorPages::new(&config.home_href)),
        )
    }

    #[must_use]
    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    #[must_use]
    pub fn default_locale(&self) -> &Locale {
        &self.default_locale
    }

    #[must_use]
    pub fn audience(&self, path: &str) -> Audience {
        Audience::for_path(&self.api_prefix, path)
    }

    #[must_use]
    pub fn locale_for(&self, headers: &HeaderMap) -> Locale {
        let header = headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok());
        Locale::from_accept_language(header, &self.default_locale)
    }

    pub fn handle(&self, request: FailedRequest<'_>) -> Response {
        let audience = self.audience(request.path);
        let ctx = RequestContext::new(request.path, request.locale);
        let mut response = if let Some(failure) = request.failure {
            match audience {
                Audience::Api => self.problems.render_failure(failure, &ctx).into_response(),
                Audience::Browser => self.views.render_failure(failure, &ctx).into_response(),
            }
        } else {
            tracing::error!(
                path = %ctx.path,
                status = request.status.map(|s| s.as_u16()),
                "{ERR_PFX}Exception {} at request {}",
                request.message,
                ctx.path
            );
            match audience {
                Audience::Api => self
                    .problems
                    .render_recorded(&ctx, request.status, request.message)
                    .into_response(),
                Audience::Browser => self
                    .views
                    .render_recorded(&ctx, request.status, request.message)
                    .into_response(),
            }
        };
        response.extensions_mut().insert(Rendered);
        response
    }
}

impl std::fmt::Debug for ErrorFunnel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorFunnel")
            .field("api_prefix", &self.api_prefix)
            .field("default_locale", &self.default_locale)
            .finish_non_exhaustive()
    }
}

/// Check if a response is already a Problem+JSON response
fn is_problem_response(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains(APPLICATION_PROBLEM_JSON))
}

fn is_plain_text(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/plain"))
}

/// The text the framework attached to an error response, or the canonical reason.
async fn recorded_message(status: StatusCode, response: Response) -> String {
    let fallback = || status.canonical_reason().unwrap_or("Unknown Error").to_owned();
    if !is_plain_text(&response) {
        return fallback();
    }
    match axum::body::to_bytes(response.into_body(), RECORDED_BODY_LIMIT).await {
        Ok(bytes) if !bytes.is_empty() => String::from_utf8_lossy(&bytes).trim().to_owned(),
        _ => fallback(),
    }
}

/// Middleware routing every failed response through the [`ErrorFunnel`].
pub async fn error_funnel_middleware(
    State(funnel): State<Arc<ErrorFunnel>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let locale = funnel.locale_for(request.headers());

    let mut response = next.run(request).await;

    if let Some(failure) = response.extensions_mut().remove::<Failure>() {
        return funnel.handle(FailedRequest {
            path: &path,
            status: Some(response.status()),
            message: "",
            failure: Some(&failure),
            locale,
        });
    }

    let status = response.status();
    let is_error = status.is_client_error() || status.is_server_error();
    if !is_error
        || is_problem_response(&response)
        || response.extensions().get::<Rendered>().is_some()
    {
        return response;
    }

    let message = recorded_message(status, response).await;
    funnel.handle(FailedRequest {
        path: &path,
        status: Some(status),
        message: &message,
        failure: None,
        locale,
    })
}

/// Router fallback: nothing is mapped at this path.
#[allow(clippy::unused_async)]
pub async fn not_found_fallback(uri: Uri) -> Failure {
    Failure::new(NoResourceFound::new(uri.path()))
}

/// Router fallback: the path exists but not for this method.
#[allow(clippy::unused_async)]
pub async fn method_not_allowed_fallback(method: Method) -> Failure {
    Failure::new(MethodNotSupported {
        method: method.to_string(),
    })
}

/// Install both fallbacks and the funnel middleware as the outermost layer.
pub fn install<S>(router: Router<S>, funnel: Arc<ErrorFunnel>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .fallback(not_found_fallback)
        .method_not_allowed_fallback(method_not_allowed_fallback)
        .layer(middleware::from_fn_with_state(funnel, error_funnel_middleware))
}
