//! Failure classification
//!
//! Maps an arbitrary failure to an [`ErrorKind`] using, in order:
//! 1. the `TypedFailure` override declared by the failure itself,
//! 2. an ordered rule table (first match wins),
//! 3. one retry of both against the root cause of the failure.
//!
//! Anything still unmatched becomes [`ErrorKind::AppError`], described only by
//! its type name so that no internal message reaches the client.

use std::error::Error as StdError;
use std::io;

use axum::extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection};
use faultgate_errors::common::{
    AccessDenied, AuthenticationFailed, DataIntegrityViolation, EntityNotFound, IllegalArgument,
    IllegalState, MethodNotSupported, MissingParameter, NoResourceFound, RequestRejected,
    Unsupported, ValidationFailed,
};
use faultgate_errors::{AppError, ErrorKind, Failure, TypedFailure, cause_chain};

/// Prefix shared by every log line of the error layer.
pub const ERR_PFX: &str = "ERR# ";

type ErrorPredicate = fn(&(dyn StdError + 'static)) -> bool;
type TypedProbe = fn(&(dyn StdError + 'static)) -> Option<ErrorKind>;

fn is_type<T: StdError + 'static>(error: &(dyn StdError + 'static)) -> bool {
    error.is::<T>()
}

fn typed_kind<T: TypedFailure + 'static>(error: &(dyn StdError + 'static)) -> Option<ErrorKind> {
    error.downcast_ref::<T>().map(TypedFailure::error_kind)
}

fn io_kind_is(error: &(dyn StdError + 'static), kind: io::ErrorKind) -> bool {
    error
        .downcast_ref::<io::Error>()
        .is_some_and(|e| e.kind() == kind)
}

/// One entry of the classification table.
#[derive(Clone, Copy)]
pub struct ClassificationRule {
    name: &'static str,
    matches: ErrorPredicate,
    kind: ErrorKind,
}

impl ClassificationRule {
    /// Match a concrete error type.
    #[must_use]
    pub fn of<T: StdError + 'static>(kind: ErrorKind) -> Self {
        Self {
            name: faultgate_errors::simple_type_name(std::any::type_name::<T>()),
            matches: is_type::<T>,
            kind,
        }
    }

    /// Match an error category that is not expressed by a type of its own,
    /// e.g. a particular `std::io::ErrorKind`.
    #[must_use]
    pub fn when(name: &'static str, matches: ErrorPredicate, kind: ErrorKind) -> Self {
        Self {
            name,
            matches,
            kind,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn matches(&self, error: &(dyn StdError + 'static)) -> bool {
        (self.matches)(error)
    }
}

impl std::fmt::Debug for ClassificationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassificationRule")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// The built-in table. More specific entries come first.
#[must_use]
pub fn default_rules() -> Vec<ClassificationRule> {
    vec![
        ClassificationRule::of::<NoResourceFound>(ErrorKind::NotFound),
        ClassificationRule::of::<AuthenticationFailed>(ErrorKind::Unauthorized),
        ClassificationRule::when(
            "io::NotFound",
            |e| io_kind_is(e, io::ErrorKind::NotFound),
            ErrorKind::NotFound,
        ),
        ClassificationRule::of::<Unsupported>(ErrorKind::AppError),
        ClassificationRule::of::<IllegalState>(ErrorKind::AppError),
        ClassificationRule::of::<EntityNotFound>(ErrorKind::DataConflict),
        ClassificationRule::of::<DataIntegrityViolation>(ErrorKind::DataConflict),
        ClassificationRule::of::<IllegalArgument>(ErrorKind::BadData),
        ClassificationRule::of::<ValidationFailed>(ErrorKind::BadRequest),
        ClassificationRule::of::<MethodNotSupported>(ErrorKind::BadRequest),
        ClassificationRule::of::<MissingParameter>(ErrorKind::BadRequest),
        ClassificationRule::of::<JsonRejection>(ErrorKind::BadRequest),
        ClassificationRule::of::<QueryRejection>(ErrorKind::BadRequest),
        ClassificationRule::of::<PathRejection>(ErrorKind::BadRequest),
        ClassificationRule::of::<FormRejection>(ErrorKind::BadRequest),
        ClassificationRule::of::<serde_json::Error>(ErrorKind::BadRequest),
        ClassificationRule::of::<RequestRejected>(ErrorKind::BadRequest),
        ClassificationRule::of::<AccessDenied>(ErrorKind::Forbidden),
        ClassificationRule::when(
            "io::PermissionDenied",
            |e| io_kind_is(e, io::ErrorKind::PermissionDenied),
            ErrorKind::Forbidden,
        ),
    ]
}

/// Outcome of [`Classifier::classify`].
#[derive(Debug)]
pub struct Classification<'a> {
    pub kind: ErrorKind,
    /// Message safe to show to the client.
    pub message: String,
    /// The error that was actually matched; the root cause when unwrapping was needed.
    pub classified: &'a (dyn StdError + 'static),
}

impl Classification<'_> {
    #[must_use]
    pub fn is<T: StdError + 'static>(&self) -> bool {
        self.classified.is::<T>()
    }
}

/// Immutable classifier shared by every renderer.
#[derive(Debug)]
pub struct Classifier {
    typed: Vec<TypedProbe>,
    rules: Vec<ClassificationRule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::builder().rules(default_rules()).build()
    }
}

impl Classifier {
    #[must_use]
    pub fn builder() -> ClassifierBuilder {
        ClassifierBuilder::new()
    }

    #[must_use]
    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    /// Classify `failure` raised while serving `path`.
    ///
    /// Never fails; unmatched failures degrade to [`ErrorKind::AppError`].
    pub fn classify<'a>(&self, failure: &'a Failure, path: &str) -> Classification<'a> {
        let error = failure.as_error();
        let mut classified = error;
        let mut found = self.find_kind(error);
        if found.is_none() && error.source().is_some() {
            let root = failure.root_cause();
            classified = root;
            found = self.find_kind(root);
        }

        let Some(kind) = found else {
            tracing::error!(
                kind = %ErrorKind::AppError,
                path,
                failure = %cause_chain(error),
                "{ERR_PFX}Exception {} at request {path}",
                failure.type_name()
            );
            return Classification {
                kind: ErrorKind::AppError,
                message: failure.type_name().to_owned(),
                classified,
            };
        };

        if kind.is_client_fault() {
            tracing::warn!(kind = %kind, path, "{ERR_PFX}Exception {classified} at request {path}");
        } else {
            tracing::error!(
                kind = %kind,
                path,
                failure = %cause_chain(error),
                "{ERR_PFX}Exception {classified} at request {path}"
            );
        }
        Classification {
            kind,
            message: classified.to_string(),
            classified,
        }
    }

    fn find_kind(&self, error: &(dyn StdError + 'static)) -> Option<ErrorKind> {
        self.typed
            .iter()
            .find_map(|probe| probe(error))
            .or_else(|| {
                self.rules
                    .iter()
                    .find(|rule| rule.matches(error))
                    .map(ClassificationRule::kind)
            })
    }
}

/// Assembles a [`Classifier`] once at startup.
#[derive(Debug)]
pub struct ClassifierBuilder {
    typed: Vec<TypedProbe>,
    rules: Vec<ClassificationRule>,
}

impl Default for ClassifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifierBuilder {
    /// Starts with the [`AppError`] override registered and an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            typed: vec![typed_kind::<AppError>],
            rules: Vec::new(),
        }
    }

    /// Let failures of type `T` declare their own kind.
    #[must_use]
    pub fn typed<T: TypedFailure + 'static>(mut self) -> Self {
        self.typed.push(typed_kind::<T>);
        self
    }

    #[must_use]
    pub fn rule(mut self, rule: ClassificationRule) -> Self {
        self.rules.push(rule);
        self
    }

    #[must_use]
    pub fn rules(mut self, rules: impl IntoIterator<Item = ClassificationRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    #[must_use]
    pub fn build(self) -> Classifier {
        Classifier {
            typed: self.typed,
            rules: self.rules,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[derive(Debug, thiserror::Error)]
    #[error("wrapped: {0}")]
    struct Wrapper(#[source] Box<dyn StdError + Send + Sync>);

    #[derive(Debug, thiserror::Error)]
    #[error("import failed")]
    struct ImportFailed(#[source] IllegalArgument);

    #[derive(Debug, thiserror::Error)]
    #[error("secret connection string leaked")]
    struct Unregistered;

    #[derive(Debug, thiserror::Error)]
    #[error("quota exhausted")]
    struct QuotaExceeded;

    impl TypedFailure for QuotaExceeded {
        fn error_kind(&self) -> ErrorKind {
            ErrorKind::Forbidden
        }
    }

    fn wrap(inner: impl StdError + Send + Sync + 'static) -> Wrapper {
        Wrapper(Box::new(inner))
    }

    #[test]
    fn every_default_rule_classifies_its_type() {
        let classifier = Classifier::default();
        let cases: Vec<(Failure, ErrorKind)> = vec![
            (NoResourceFound::new("/x").into(), ErrorKind::NotFound),
            (AuthenticationFailed("bad".into()).into(), ErrorKind::Unauthorized),
            (
                io::Error::new(io::ErrorKind::NotFound, "gone").into(),
                ErrorKind::NotFound,
            ),
            (Unsupported("nope".into()).into(), ErrorKind::AppError),
            (IllegalState("state".into()).into(), ErrorKind::AppError),
            (
                EntityNotFound {
                    entity: "User",
                    id: "7".into(),
                }
                .into(),
                ErrorKind::DataConflict,
            ),
            (DataIntegrityViolation::new("dup").into(), ErrorKind::DataConflict),
            (IllegalArgument("arg".into()).into(), ErrorKind::BadData),
            (ValidationFailed("invalid".into()).into(), ErrorKind::BadRequest),
            (
                MethodNotSupported {
                    method: "PUT".into(),
                }
                .into(),
                ErrorKind::BadRequest,
            ),
            (
                MissingParameter {
                    name: "email".into(),
                }
                .into(),
                ErrorKind::BadRequest,
            ),
            (RequestRejected("blocked".into()).into(), ErrorKind::BadRequest),
            (AccessDenied("denied".into()).into(), ErrorKind::Forbidden),
            (
                io::Error::new(io::ErrorKind::PermissionDenied, "ro").into(),
                ErrorKind::Forbidden,
            ),
        ];

        for (failure, expected) in cases {
            let result = classifier.classify(&failure, "/test");
            assert_eq!(result.kind, expected, "failure {failure}");
        }
    }

    #[test]
    fn serde_json_error_is_bad_request() {
        let classifier = Classifier::default();
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let failure = Failure::new(err);
        assert_eq!(
            classifier.classify(&failure, "/api/x").kind,
            ErrorKind::BadRequest
        );
    }

    #[test]
    fn matched_failure_keeps_its_message() {
        let classifier = Classifier::default();
        let failure = Failure::new(IllegalArgument("User must be new (id=null)".into()));
        let result = classifier.classify(&failure, "/api/admin/users");
        assert_eq!(result.kind, ErrorKind::BadData);
        assert_eq!(result.message, "User must be new (id=null)");
        assert!(result.is::<IllegalArgument>());
    }

    #[test]
    fn first_matching_rule_wins() {
        let generic = ClassificationRule::when(
            "any io",
            |e| e.is::<io::Error>(),
            ErrorKind::BadData,
        );
        let specific = ClassificationRule::when(
            "io::NotFound",
            |e| io_kind_is(e, io::ErrorKind::NotFound),
            ErrorKind::NotFound,
        );
        let failure = Failure::new(io::Error::new(io::ErrorKind::NotFound, "gone"));

        let broad_first = Classifier::builder().rule(generic).rule(specific).build();
        assert_eq!(broad_first.classify(&failure, "/").kind, ErrorKind::BadData);

        let narrow_first = Classifier::builder().rule(specific).rule(generic).build();
        assert_eq!(narrow_first.classify(&failure, "/").kind, ErrorKind::NotFound);
    }

    #[test]
    fn typed_failure_overrides_rule_table() {
        let classifier = Classifier::builder()
            .rule(ClassificationRule::of::<AppError>(ErrorKind::BadRequest))
            .build();
        let failure = Failure::new(AppError::not_found("User with id=100 not found"));
        let result = classifier.classify(&failure, "/api/admin/users/100");
        assert_eq!(result.kind, ErrorKind::NotFound);
        assert_eq!(result.message, "User with id=100 not found");
    }

    #[test]
    fn registered_typed_failure_is_honored() {
        let classifier = Classifier::builder().typed::<QuotaExceeded>().build();
        let failure = Failure::new(QuotaExceeded);
        assert_eq!(classifier.classify(&failure, "/").kind, ErrorKind::Forbidden);

        let unregistered = Classifier::builder().build();
        assert_eq!(unregistered.classify(&failure, "/").kind, ErrorKind::AppError);
    }

    #[test]
    fn root_cause_is_tried_once() {
        let classifier = Classifier::default();
        let failure = Failure::new(wrap(DataIntegrityViolation::new("duplicate email")));
        let result = classifier.classify(&failure, "/api/admin/users");
        assert_eq!(result.kind, ErrorKind::DataConflict);
        assert_eq!(result.message, "duplicate email");
        assert!(result.is::<DataIntegrityViolation>());
    }

    #[test]
    fn newtype_wrapper_is_classified_by_its_source() {
        let classifier = Classifier::default();
        let failure = Failure::new(ImportFailed(IllegalArgument("bad row".into())));
        let result = classifier.classify(&failure, "/api/import");
        assert_eq!(result.kind, ErrorKind::BadData);
        assert_eq!(result.message, "bad row");
        assert!(result.is::<IllegalArgument>());
    }

    #[test]
    fn typed_root_cause_is_honored() {
        let classifier = Classifier::default();
        let failure = Failure::new(wrap(AppError::not_found("missing")));
        assert_eq!(
            classifier.classify(&failure, "/").kind,
            ErrorKind::NotFound
        );
    }

    #[test]
    fn matched_inner_failure_behind_two_wrappers() {
        let classifier = Classifier::default();
        let failure = Failure::new(wrap(wrap(NoResourceFound::new("/view/x"))));
        assert_eq!(
            classifier.classify(&failure, "/view/x").kind,
            ErrorKind::NotFound
        );
    }

    #[test]
    fn unwrap_does_not_stop_at_intermediate_layers() {
        // The single retry targets the deepest cause, not the next hop.
        let classifier = Classifier::default();
        let failure = Failure::new(wrap(wrap(Unregistered)));
        let result = classifier.classify(&failure, "/api/x");
        assert_eq!(result.kind, ErrorKind::AppError);
        assert_eq!(result.message, "Wrapper");
    }

    #[test]
    #[traced_test]
    fn unregistered_failure_hides_its_message() {
        let classifier = Classifier::default();
        let failure = Failure::new(Unregistered);
        let result = classifier.classify(&failure, "/api/x");
        assert_eq!(result.kind, ErrorKind::AppError);
        assert_eq!(result.message, "Unregistered");
        assert!(logs_contain("ERR# Exception Unregistered at request /api/x"));
        assert!(logs_contain("secret connection string leaked"));
    }

    #[test]
    #[traced_test]
    fn client_faults_log_at_warn() {
        let classifier = Classifier::default();
        let failure = Failure::new(IllegalArgument("bad value".into()));
        classifier.classify(&failure, "/api/y");
        assert!(logs_contain("WARN"));
        assert!(logs_contain("kind=BAD_DATA"));
        assert!(!logs_contain("ERROR"));
    }

    #[test]
    #[traced_test]
    fn other_kinds_log_at_error_with_cause_chain() {
        let classifier = Classifier::default();
        let failure = Failure::new(
            AppError::new(ErrorKind::DataConflict, "conflict")
                .with_source(io::Error::other("unique index")),
        );
        classifier.classify(&failure, "/api/z");
        assert!(logs_contain("ERROR"));
        assert!(logs_contain("kind=DATA_CONFLICT"));
        assert!(logs_contain("conflict: unique index"));
    }
}
