//! Failure classification and audience-aware error rendering for axum services.
//!
//! A handler fails by returning a [`Failure`]. The [`funnel`] middleware classifies it
//! into the closed [`ErrorKind`] taxonomy and renders RFC 9457 problem JSON for API
//! paths or an HTML page for browser paths. Binding failures carry per-field
//! messages resolved through the [`messages`] catalog.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod classify;
pub mod config;
pub mod funnel;
pub mod logging;
pub mod messages;
pub mod render;
pub mod result;

pub use faultgate_errors::{
    AppError, BindError, ErrorKind, Failure, FieldError, ObjectError, Problem, TypedFailure,
};

pub use classify::{ClassificationRule, Classifier, ClassifierBuilder, default_rules};
pub use config::{ConfigError, ErrorsConfig, LoggingConfig, load_layered};
pub use funnel::{Audience, ErrorFunnel, install};
pub use logging::init_logging;
pub use messages::{Locale, MessageCatalog, ValidationMessages};
pub use render::{ProblemRenderer, Renderer, RequestContext, ViewRenderer};
pub use result::WebResult;
