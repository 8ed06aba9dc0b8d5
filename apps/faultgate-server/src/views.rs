//! Browser pages: the index and the named views under `/view`.

use axum::Router;
use axum::extract::{OriginalUri, Path};
use axum::response::Html;
use axum::routing::get;
use faultgate::WebResult;
use faultgate_errors::common::NoResourceFound;

/// `(name, title, body)` of every page served under `/view/{name}`.
const PAGES: &[(&str, &str, &str)] = &[
    (
        "index",
        "Faultgate",
        "<p>Admin API under <code>/api/admin/users</code>.</p>",
    ),
    (
        "about",
        "About",
        "<p>Failures are answered with problem JSON under <code>/api</code> and HTML elsewhere.</p>",
    ),
];

pub fn router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/view/{name}", get(view))
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n{body}\n</body>\n</html>\n"
    ))
}

#[allow(clippy::unused_async)]
async fn index() -> Html<String> {
    let (_, title, body) = PAGES[0];
    page(title, body)
}

#[allow(clippy::unused_async)]
async fn view(OriginalUri(uri): OriginalUri, Path(name): Path<String>) -> WebResult<Html<String>> {
    PAGES
        .iter()
        .find(|(page_name, _, _)| *page_name == name)
        .map(|(_, title, body)| page(title, body))
        .ok_or_else(|| NoResourceFound::new(uri.path()).into())
}
