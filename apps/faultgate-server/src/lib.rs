//! Demo host for the faultgate error layer: an admin user API and a few browser pages.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod auth;
pub mod config;
pub mod handlers;
pub mod users;
pub mod views;

use std::sync::Arc;

use axum::{Router, middleware};
use faultgate::{Classifier, ErrorFunnel};

use crate::config::AppConfig;
use crate::users::UserRepository;

/// Assemble the full application with the seeded user store.
#[must_use]
pub fn build_app(config: &AppConfig) -> Router {
    build_app_with(config, Arc::new(UserRepository::seeded()))
}

#[must_use]
pub fn build_app_with(config: &AppConfig, users: Arc<UserRepository>) -> Router {
    let auth = Arc::new(config.auth.clone());
    let admin = handlers::router(users)
        .route_layer(middleware::from_fn_with_state(auth, auth::require_admin));
    let admin_path = format!(
        "{}/admin/users",
        config.errors.api_prefix.trim_end_matches('/')
    );

    let router = Router::new().nest(&admin_path, admin).merge(views::router());
    let funnel = Arc::new(ErrorFunnel::from_config(
        &config.errors,
        Arc::new(Classifier::default()),
    ));
    faultgate::install(router, funnel)
}
