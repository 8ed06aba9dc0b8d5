//! Bearer-token guard for the admin API.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use faultgate::Failure;
use faultgate_errors::common::{AccessDenied, AuthenticationFailed};

use crate::config::AuthConfig;
use crate::users::Role;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Let the request through only for tokens granting [`Role::Admin`].
///
/// # Errors
/// `AuthenticationFailed` for a missing or unknown token, `AccessDenied` for any
/// other role.
pub async fn require_admin(
    State(auth): State<Arc<AuthConfig>>,
    request: Request,
    next: Next,
) -> Result<Response, Failure> {
    let token = bearer_token(request.headers()).ok_or_else(|| {
        AuthenticationFailed("Full authentication is required to access this resource".to_owned())
    })?;
    let role = auth
        .role_of(token)
        .ok_or_else(|| AuthenticationFailed("Bad credentials".to_owned()))?;
    if role != Role::Admin {
        tracing::debug!(?role, "admin role required");
        return Err(AccessDenied("Access Denied".to_owned()).into());
    }
    Ok(next.run(request).await)
}
