#![allow(clippy::unwrap_used, clippy::expect_used, clippy::unused_async)]

//! End-to-end tests of the error funnel on a real axum router.
//!
//! These tests verify that:
//! 1. API paths get problem JSON and other paths get HTML
//! 2. Binding failures carry `invalid_params` in field order
//! 3. Unregistered failures degrade to a 500 naming only the type
//! 4. Responses produced without a failure take the recorded path

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::Path,
    http::{Request, StatusCode, header},
    middleware,
    routing::get,
};
use faultgate::{AppError, BindError, Classifier, ErrorFunnel, ErrorsConfig, Failure, WebResult};
use faultgate_errors::common::{IllegalArgument, NoResourceFound};
use serde_json::{Value, json};
use tower::ServiceExt;
use tracing_test::traced_test;

#[derive(Debug, thiserror::Error)]
#[error("connection pool exhausted at 10.0.0.7:5432")]
struct PoolExhausted;

#[derive(Debug, thiserror::Error)]
#[error("import failed")]
struct ImportFailed(#[source] IllegalArgument);

async fn item(Path(id): Path<u64>) -> WebResult<String> {
    match id {
        1 => Ok("one".to_owned()),
        _ => Err(AppError::not_found(format!("Item with id={id} not found")).into()),
    }
}

async fn create_item() -> WebResult<()> {
    Err(BindError::new("item")
        .reject_value("name", Some("NotBlank"), "must not be blank")
        .reject_value("price", None, "must be positive")
        .into())
}

async fn pool() -> WebResult<()> {
    Err(PoolExhausted.into())
}

async fn import() -> WebResult<()> {
    Err(ImportFailed(IllegalArgument("row 3 has no id".to_owned())).into())
}

async fn view(Path(name): Path<String>) -> WebResult<String> {
    match name.as_str() {
        "home" => Ok("home".to_owned()),
        _ => Err(NoResourceFound::new(format!("/view/{name}")).into()),
    }
}

async fn gone() -> StatusCode {
    StatusCode::NOT_FOUND
}

fn app() -> Router {
    let mut config = ErrorsConfig::default();
    config.messages.insert(
        "en".to_owned(),
        [("NotBlank".to_owned(), "should not be blank".to_owned())].into(),
    );
    config.messages.insert(
        "ru".to_owned(),
        [("NotBlank".to_owned(), "не должно быть пустым".to_owned())].into(),
    );
    let funnel = Arc::new(ErrorFunnel::from_config(
        &config,
        Arc::new(Classifier::default()),
    ));

    let router = Router::new()
        .route("/api/items", get(|| async { "[]" }).post(create_item))
        .route("/api/items/{id}", get(item))
        .route("/api/pool", get(pool))
        .route("/api/import", get(import))
        .route("/api/gone", get(gone))
        .route("/items/{id}", get(item))
        .route("/items", get(|| async { "[]" }).post(create_item))
        .route("/view/{name}", get(view))
        .route("/gone", get(gone));
    faultgate::install(router, funnel)
}

async fn send(request: Request<Body>) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_owned());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    (status, content_type, body)
}

async fn get_path(path: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    send(Request::builder().uri(path).body(Body::empty()).unwrap()).await
}

fn as_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

fn as_html(body: &[u8]) -> String {
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn successful_requests_pass_through() {
    let (status, _, body) = get_path("/api/items/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"one");
}

#[tokio::test]
async fn typed_failure_on_api_path_is_problem_json() {
    let (status, content_type, body) = get_path("/api/items/100").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(content_type.as_deref(), Some("application/problem+json"));
    assert_eq!(
        as_json(&body),
        json!({
            "type": "about:blank",
            "title": "Not Found",
            "status": 404,
            "detail": "Item with id=100 not found",
            "instance": "/api/items/100"
        })
    );
}

#[tokio::test]
async fn same_failure_on_browser_path_is_html() {
    let (status, content_type, body) = get_path("/items/100").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(content_type.unwrap().starts_with("text/html"));
    let html = as_html(&body);
    assert!(html.contains("404 Not Found"));
    assert!(html.contains("Item with id=100 not found"));
}

#[tokio::test]
#[traced_test]
async fn bind_failure_lists_invalid_params_in_order() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/items")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json = as_json(&body);
    assert_eq!(json["detail"], "BindException");
    assert_eq!(json["title"], "Bad Request");
    let params = json["invalid_params"].as_object().unwrap();
    let keys: Vec<_> = params.keys().map(String::as_str).collect();
    assert_eq!(keys, ["name", "price"]);
    assert_eq!(params["name"], "should not be blank");
    assert_eq!(params["price"], "must be positive");
    assert!(logs_contain("ERR# BindException"));
}

#[tokio::test]
async fn bind_failure_messages_follow_accept_language() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/items")
        .header(header::ACCEPT_LANGUAGE, "ru-RU,ru;q=0.9,en;q=0.5")
        .body(Body::empty())
        .unwrap();
    let (_, _, body) = send(request).await;
    assert_eq!(
        as_json(&body)["invalid_params"]["name"],
        "не должно быть пустым"
    );
}

#[tokio::test]
async fn bind_failure_on_browser_path_lists_fields() {
    let request = Request::builder()
        .method("POST")
        .uri("/items")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(as_html(&body).contains("name: should not be blank<br>price: must be positive"));
}

#[tokio::test]
#[traced_test]
async fn unregistered_failure_reveals_only_its_type_name() {
    let (status, _, body) = get_path("/api/pool").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json = as_json(&body);
    assert_eq!(json["title"], "Application Error");
    assert_eq!(json["detail"], "PoolExhausted");
    assert!(!body.windows(8).any(|w| w == b"10.0.0.7"));
    assert!(logs_contain("connection pool exhausted at 10.0.0.7:5432"));
}

#[tokio::test]
async fn wrapped_failure_is_classified_by_its_root_cause() {
    let (status, _, body) = get_path("/api/import").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let json = as_json(&body);
    assert_eq!(json["title"], "Bad Data");
    assert_eq!(json["detail"], "row 3 has no id");
}

#[tokio::test]
async fn missing_view_gets_static_not_found_page() {
    let (status, content_type, body) = get_path("/view/123").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(content_type.unwrap().starts_with("text/html"));
    let html = as_html(&body);
    assert!(html.contains("404 Page not found"));
    assert!(!html.contains("/view/123"));
}

#[tokio::test]
async fn unmapped_paths_use_the_fallback() {
    let (status, _, body) = get_path("/api/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(as_json(&body)["detail"], "No static resource /api/nowhere.");

    let (status, _, body) = get_path("/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(as_html(&body).contains("404 Page not found"));
}

#[tokio::test]
async fn unsupported_method_is_bad_request() {
    let request = Request::builder()
        .method("DELETE")
        .uri("/api/items/1")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        as_json(&body)["detail"],
        "Request method 'DELETE' is not supported"
    );
}

#[tokio::test]
#[traced_test]
async fn extractor_rejection_takes_recorded_path() {
    let (status, content_type, body) = get_path("/api/items/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type.as_deref(), Some("application/problem+json"));
    let json = as_json(&body);
    assert_eq!(json["title"], "Bad Request");
    assert_eq!(json["instance"], "/api/items/abc");
    assert!(json["detail"].as_str().unwrap().contains("abc"));
    assert!(logs_contain("ERR# Exception"));
}

#[tokio::test]
async fn bare_status_takes_recorded_path() {
    let (status, _, body) = get_path("/api/gone").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json = as_json(&body);
    assert_eq!(json["title"], "Not Found");
    assert_eq!(json["detail"], "Not Found");

    let (status, _, body) = get_path("/gone").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(as_html(&body).contains("404 Page not found"));
}

#[tokio::test]
async fn rendering_is_idempotent() {
    let first = get_path("/api/items/100").await;
    let second = get_path("/api/items/100").await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn funnel_output_is_not_rendered_twice() {
    let funnel = Arc::new(ErrorFunnel::from_config(
        &ErrorsConfig::default(),
        Arc::new(Classifier::default()),
    ));
    let outer = app().layer(middleware::from_fn_with_state(
        funnel,
        faultgate::funnel::error_funnel_middleware,
    ));
    let response = outer
        .oneshot(Request::builder().uri("/gone").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert_eq!(html.matches("<!DOCTYPE html>").count(), 1);
}

#[test]
fn failure_converts_from_any_error() {
    let failure: Failure = IllegalArgument("bad".to_owned()).into();
    assert_eq!(failure.type_name(), "IllegalArgument");
}
