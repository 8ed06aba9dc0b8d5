//! `/api/admin/users` endpoints.
#![allow(clippy::unused_async)]

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use faultgate::WebResult;
use faultgate_errors::common::{IllegalArgument, MissingParameter};
use serde::Deserialize;

use crate::users::{User, UserRepository};

type Users = State<Arc<UserRepository>>;

#[derive(Debug, Deserialize)]
pub struct EmailParams {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EnableParams {
    enabled: Option<bool>,
}

pub fn router(users: Arc<UserRepository>) -> Router {
    Router::new()
        .route("/", get(get_all).post(create_with_location))
        .route("/by-email", get(get_by_email))
        .route("/{id}", get(get_one).put(update).delete(delete).patch(enable))
        .with_state(users)
}

fn check_new(user: &User) -> Result<(), IllegalArgument> {
    match user.id {
        None => Ok(()),
        Some(_) => Err(IllegalArgument(format!("{user} must be new (id must be absent)"))),
    }
}

fn assure_id_consistent(user: &mut User, id: u32) -> Result<(), IllegalArgument> {
    match user.id {
        None => {
            user.id = Some(id);
            Ok(())
        }
        Some(own) if own == id => Ok(()),
        Some(_) => Err(IllegalArgument(format!("{user} must have id={id}"))),
    }
}

fn required<T>(value: Option<T>, name: &str) -> Result<T, MissingParameter> {
    value.ok_or_else(|| MissingParameter {
        name: name.to_owned(),
    })
}

pub async fn get_all(State(users): Users) -> Json<Vec<User>> {
    tracing::info!("getAll");
    Json(users.find_all())
}

pub async fn get_one(State(users): Users, Path(id): Path<u32>) -> WebResult<Json<User>> {
    tracing::info!(id, "get");
    Ok(Json(users.get_existed(id)?))
}

pub async fn get_by_email(
    State(users): Users,
    params: Result<Query<EmailParams>, QueryRejection>,
) -> WebResult<Json<User>> {
    let Query(params) = params?;
    let email = required(params.email, "email")?;
    tracing::info!(%email, "getByEmail");
    Ok(Json(users.get_existed_by_email(&email)?))
}

pub async fn create_with_location(
    State(users): Users,
    OriginalUri(uri): OriginalUri,
    payload: Result<Json<User>, JsonRejection>,
) -> WebResult<impl IntoResponse> {
    let Json(user) = payload?;
    tracing::info!(%user, "create");
    user.validate()?;
    check_new(&user)?;
    let created = users.save(user)?;
    let location = format!(
        "{}/{}",
        uri.path().trim_end_matches('/'),
        created.id.unwrap_or_default()
    );
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(created)))
}

pub async fn update(
    State(users): Users,
    Path(id): Path<u32>,
    payload: Result<Json<User>, JsonRejection>,
) -> WebResult<StatusCode> {
    let Json(mut user) = payload?;
    tracing::info!(%user, id, "update");
    user.validate()?;
    assure_id_consistent(&mut user, id)?;
    users.get_existed(id)?;
    users.save(user)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(State(users): Users, Path(id): Path<u32>) -> WebResult<StatusCode> {
    tracing::info!(id, "delete");
    users.delete_existed(id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn enable(
    State(users): Users,
    Path(id): Path<u32>,
    params: Result<Query<EnableParams>, QueryRejection>,
) -> WebResult<StatusCode> {
    let Query(params) = params?;
    let enabled = required(params.enabled, "enabled")?;
    if enabled {
        tracing::info!(id, "enable");
    } else {
        tracing::info!(id, "disable");
    }
    users.set_enabled(id, enabled)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::users::Role;

    #[test]
    fn new_user_must_not_carry_an_id() {
        let mut user = User::new(None, "New", "new@gmail.com", "Last", [Role::User]);
        assert!(check_new(&user).is_ok());
        user.id = Some(7);
        let err = check_new(&user).unwrap_err();
        assert_eq!(err.0, "User:7[new@gmail.com] must be new (id must be absent)");
    }

    #[test]
    fn id_is_taken_from_path_when_absent() {
        let mut user = User::new(None, "User", "user@yandex.ru", "Last", [Role::User]);
        assure_id_consistent(&mut user, 1).unwrap();
        assert_eq!(user.id, Some(1));
        let err = assure_id_consistent(&mut user, 2).unwrap_err();
        assert_eq!(err.0, "User:1[user@yandex.ru] must have id=2");
    }
}
