//! Output of request binding and field validation.
//!
//! The validation engine itself lives elsewhere; this module only models the
//! rejected object- and field-level constraints it reports.

/// A constraint violated by the bound object as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectError {
    pub object_name: String,
    /// Symbolic message code resolved through the message catalog.
    pub code: Option<String>,
    /// Positional arguments substituted into the resolved template.
    pub arguments: Vec<String>,
    pub default_message: Option<String>,
}

/// A constraint violated by a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub object_name: String,
    pub field: String,
    pub rejected_value: Option<String>,
    pub code: Option<String>,
    pub arguments: Vec<String>,
    pub default_message: Option<String>,
}

impl FieldError {
    #[must_use]
    pub fn with_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_rejected_value(mut self, value: impl Into<String>) -> Self {
        self.rejected_value = Some(value.into());
        self
    }
}

/// Binding failure: one or more constraints on the request payload were violated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindError {
    pub object_name: String,
    pub global_errors: Vec<ObjectError>,
    pub field_errors: Vec<FieldError>,
}

impl BindError {
    pub fn new(object_name: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            global_errors: Vec::new(),
            field_errors: Vec::new(),
        }
    }

    /// Register an object-level violation.
    #[must_use]
    pub fn reject(mut self, code: Option<&str>, default_message: impl Into<String>) -> Self {
        self.global_errors.push(ObjectError {
            object_name: self.object_name.clone(),
            code: code.map(str::to_owned),
            arguments: Vec::new(),
            default_message: Some(default_message.into()),
        });
        self
    }

    /// Register a field-level violation.
    #[must_use]
    pub fn reject_value(
        self,
        field: impl Into<String>,
        code: Option<&str>,
        default_message: impl Into<String>,
    ) -> Self {
        let error = FieldError {
            object_name: self.object_name.clone(),
            field: field.into(),
            rejected_value: None,
            code: code.map(str::to_owned),
            arguments: Vec::new(),
            default_message: Some(default_message.into()),
        };
        self.with_field_error(error)
    }

    #[must_use]
    pub fn with_field_error(mut self, error: FieldError) -> Self {
        self.field_errors.push(error);
        self
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.global_errors.len() + self.field_errors.len()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}

impl std::fmt::Display for BindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Validation failed for object='{}'. Error count: {}",
            self.object_name,
            self.error_count()
        )
    }
}

impl std::error::Error for BindError {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_report_order() {
        let err = BindError::new("user")
            .reject_value("name", Some("NotBlank"), "must not be blank")
            .reject(None, "passwords do not match")
            .reject_value("email", None, "must be a well-formed email address");

        assert_eq!(err.error_count(), 3);
        assert_eq!(err.global_errors.len(), 1);
        let fields: Vec<_> = err.field_errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["name", "email"]);
        assert_eq!(err.field_errors[0].object_name, "user");
    }

    #[test]
    fn display_reports_count() {
        let err = BindError::new("user").reject_value("email", None, "must not be blank");
        assert_eq!(
            err.to_string(),
            "Validation failed for object='user'. Error count: 1"
        );
        assert!(err.has_errors());
        assert!(!BindError::new("user").has_errors());
    }
}
