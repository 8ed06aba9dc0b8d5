//! Result alias for handlers behind the error funnel.

use faultgate_errors::Failure;

/// Standard result type for handlers.
///
/// ```ignore
/// async fn handler() -> WebResult<Json<User>> {
///     let user = repo.find(id)?;  // any error converts into a Failure
///     Ok(Json(user))
/// }
/// ```
///
/// The failure is not rendered by the handler; the funnel middleware classifies it and
/// picks JSON or HTML for the request path.
pub type WebResult<T = ()> = Result<T, Failure>;
