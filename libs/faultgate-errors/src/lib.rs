//! Core failure types for faultgate
//!
//! This crate provides pure data types for failure handling, with no dependency
//! on an HTTP framework unless the `axum` feature is enabled. It includes:
//! - the closed failure taxonomy (`ErrorKind`)
//! - RFC 9457 Problem Details (`Problem`)
//! - the `Failure` carrier and the `TypedFailure` override capability
//! - binding results produced by request validation (`BindError`)
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod binding;
pub mod common;
pub mod failure;
pub mod kind;
pub mod problem;

// Re-export commonly used types
pub use binding::{BindError, FieldError, ObjectError};
pub use failure::{AppError, Failure, TypedFailure, cause_chain, root_cause, simple_type_name};
pub use kind::ErrorKind;
pub use problem::{APPLICATION_PROBLEM_JSON, INVALID_PARAMS, Problem};
