//! User model, field validation and the in-memory repository behind the admin API.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::LazyLock;

use faultgate::AppError;
use faultgate_errors::common::DataIntegrityViolation;
use faultgate_errors::{BindError, FieldError};
use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const EMAIL_CONSTRAINT: &str = "users_unique_email_idx";
pub const DUPLICATE_EMAIL: &str = "User with this email already exists";

#[allow(clippy::expect_used)] // good regex, it doesn't panic
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*$",
    )
    .expect("static regex should not panic")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub roles: BTreeSet<Role>,
}

const fn enabled_by_default() -> bool {
    true
}

impl User {
    pub fn new(
        id: Option<u32>,
        name: impl Into<String>,
        email: impl Into<String>,
        last_name: impl Into<String>,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            last_name: Some(last_name.into()),
            enabled: true,
            roles: roles.into_iter().collect(),
        }
    }

    /// Check the field constraints, reporting every violation at once.
    ///
    /// # Errors
    /// Returns a `BindError` listing each violated constraint in field order.
    pub fn validate(&self) -> Result<(), BindError> {
        let mut errors = BindError::new("user");
        errors = not_blank(errors, "name", &self.name);
        errors = size(errors, "name", &self.name, 2, 128);
        errors = no_html(errors, "name", &self.name);
        errors = not_blank(errors, "email", &self.email);
        errors = size(errors, "email", &self.email, 0, 64);
        errors = email(errors, "email", &self.email);
        errors = no_html(errors, "email", &self.email);
        if let Some(last_name) = &self.last_name {
            errors = size(errors, "lastName", last_name, 0, 32);
            errors = no_html(errors, "lastName", last_name);
        }
        if errors.has_errors() {
            Err(errors)
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "User:{id}[{}]", self.email),
            None => write!(f, "User:new[{}]", self.email),
        }
    }
}

fn violation(field: &str, value: &str, code: &str, message: String) -> FieldError {
    FieldError {
        object_name: "user".to_owned(),
        field: field.to_owned(),
        rejected_value: None,
        code: Some(code.to_owned()),
        arguments: Vec::new(),
        default_message: Some(message),
    }
    .with_rejected_value(value)
}

fn not_blank(errors: BindError, field: &str, value: &str) -> BindError {
    if value.trim().is_empty() {
        errors.with_field_error(violation(field, value, "NotBlank", "must not be blank".to_owned()))
    } else {
        errors
    }
}

fn size(errors: BindError, field: &str, value: &str, min: usize, max: usize) -> BindError {
    let len = value.chars().count();
    if (min..=max).contains(&len) {
        return errors;
    }
    let message = format!("size must be between {min} and {max}");
    errors.with_field_error(
        violation(field, value, "Size", message).with_arguments([min.to_string(), max.to_string()]),
    )
}

fn email(errors: BindError, field: &str, value: &str) -> BindError {
    if value.is_empty() || is_well_formed_email(value) {
        return errors;
    }
    errors.with_field_error(violation(
        field,
        value,
        "Email",
        "must be a well-formed email address".to_owned(),
    ))
}

fn no_html(errors: BindError, field: &str, value: &str) -> BindError {
    if value.contains('<') || value.contains('>') {
        errors.with_field_error(violation(field, value, "NoHtml", "Unsafe html content".to_owned()))
    } else {
        errors
    }
}

fn is_well_formed_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

struct Store {
    users: BTreeMap<u32, User>,
    next_id: u32,
}

/// Thread-safe in-memory user storage.
pub struct UserRepository {
    store: RwLock<Store>,
}

impl Default for UserRepository {
    fn default() -> Self {
        Self {
            store: RwLock::new(Store {
                users: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl UserRepository {
    /// Repository holding the three stock accounts.
    #[must_use]
    pub fn seeded() -> Self {
        let repo = Self::default();
        {
            let mut store = repo.store.write();
            for user in [
                User::new(Some(1), "User", "user@yandex.ru", "UserLastName", [Role::User]),
                User::new(
                    Some(2),
                    "Admin",
                    "admin@gmail.com",
                    "AdminLastName",
                    [Role::Admin, Role::User],
                ),
                User::new(Some(3), "Guest", "guest@gmail.com", "GuestLastName", []),
            ] {
                if let Some(id) = user.id {
                    store.users.insert(id, user);
                }
            }
            store.next_id = 4;
        }
        repo
    }

    #[must_use]
    pub fn get(&self, id: u32) -> Option<User> {
        self.store.read().users.get(&id).cloned()
    }

    /// # Errors
    /// Returns a `NOT_FOUND` failure if no user has this id.
    pub fn get_existed(&self, id: u32) -> Result<User, AppError> {
        self.get(id)
            .ok_or_else(|| AppError::not_found(format!("Entity with id={id} not found")))
    }

    /// # Errors
    /// Returns a `NOT_FOUND` failure if no user has this email.
    pub fn get_existed_by_email(&self, email: &str) -> Result<User, AppError> {
        let email = email.to_lowercase();
        self.store
            .read()
            .users
            .values()
            .find(|user| user.email == email)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("User with email={email} not found")))
    }

    /// All users ordered by name, then email.
    #[must_use]
    pub fn find_all(&self) -> Vec<User> {
        let mut users: Vec<User> = self.store.read().users.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.email.cmp(&b.email)));
        users
    }

    /// Insert a new user or replace the one with the same id. Emails are stored lower-cased.
    ///
    /// # Errors
    /// Returns `DataIntegrityViolation` if another user already has the email.
    pub fn save(&self, mut user: User) -> Result<User, DataIntegrityViolation> {
        user.email = user.email.to_lowercase();
        let mut store = self.store.write();
        let taken = store
            .users
            .values()
            .any(|other| other.email == user.email && other.id != user.id);
        if taken {
            return Err(
                DataIntegrityViolation::new(DUPLICATE_EMAIL).with_constraint(EMAIL_CONSTRAINT)
            );
        }
        let id = if let Some(id) = user.id {
            id
        } else {
            let id = store.next_id;
            store.next_id += 1;
            id
        };
        store.next_id = store.next_id.max(id + 1);
        user.id = Some(id);
        store.users.insert(id, user.clone());
        Ok(user)
    }

    /// # Errors
    /// Returns a `NOT_FOUND` failure if no user has this id.
    pub fn delete_existed(&self, id: u32) -> Result<(), AppError> {
        self.store
            .write()
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(format!("Entity with id={id} not found")))
    }

    /// # Errors
    /// Returns a `NOT_FOUND` failure if no user has this id.
    pub fn set_enabled(&self, id: u32, enabled: bool) -> Result<(), AppError> {
        let mut store = self.store.write();
        let user = store
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Entity with id={id} not found")))?;
        user.enabled = enabled;
        Ok(())
    }
}
