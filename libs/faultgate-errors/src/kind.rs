//! The closed failure taxonomy.

use http::StatusCode;

/// A named failure category carrying its transport status and display title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Requested resource is absent.
    NotFound,
    /// Missing or invalid credentials.
    Unauthorized,
    /// Authenticated but not allowed.
    Forbidden,
    /// Malformed request shape or binding failure.
    BadRequest,
    /// Semantically invalid field value.
    BadData,
    /// Uniqueness or referential violation.
    DataConflict,
    /// Unclassified failure or programming defect.
    AppError,
}

impl ErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::NotFound,
        Self::Unauthorized,
        Self::Forbidden,
        Self::BadRequest,
        Self::BadData,
        Self::DataConflict,
        Self::AppError,
    ];

    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::BadData => StatusCode::UNPROCESSABLE_ENTITY,
            Self::DataConflict => StatusCode::CONFLICT,
            Self::AppError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::NotFound => "Not Found",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::BadRequest => "Bad Request",
            Self::BadData => "Bad Data",
            Self::DataConflict => "Data Conflict",
            Self::AppError => "Application Error",
        }
    }

    /// Symbolic name, stable across releases.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::BadRequest => "BAD_REQUEST",
            Self::BadData => "BAD_DATA",
            Self::DataConflict => "DATA_CONFLICT",
            Self::AppError => "APP_ERROR",
        }
    }

    /// Caller mistakes, as opposed to unexpected or internal conditions.
    #[must_use]
    pub const fn is_client_fault(self) -> bool {
        matches!(self, Self::BadRequest | Self::BadData)
    }

    /// Lookup used when only a bare status code survived.
    ///
    /// Returns the first kind in declaration order with that status,
    /// falling back to [`ErrorKind::AppError`] for unknown codes.
    #[must_use]
    pub fn by_status(status: StatusCode) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| kind.status() == status)
            .unwrap_or(Self::AppError)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn by_status_finds_declared_kind() {
        assert_eq!(ErrorKind::by_status(StatusCode::NOT_FOUND), ErrorKind::NotFound);
        assert_eq!(ErrorKind::by_status(StatusCode::CONFLICT), ErrorKind::DataConflict);
        assert_eq!(
            ErrorKind::by_status(StatusCode::BAD_REQUEST),
            ErrorKind::BadRequest
        );
    }

    #[test]
    fn by_status_falls_back_to_app_error() {
        assert_eq!(
            ErrorKind::by_status(StatusCode::METHOD_NOT_ALLOWED),
            ErrorKind::AppError
        );
        assert_eq!(ErrorKind::by_status(StatusCode::IM_A_TEAPOT), ErrorKind::AppError);
    }

    #[test]
    fn codes_are_unique() {
        let mut codes: Vec<_> = ErrorKind::ALL.iter().map(|k| k.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), ErrorKind::ALL.len());
    }

    #[test]
    fn client_faults() {
        assert!(ErrorKind::BadRequest.is_client_fault());
        assert!(ErrorKind::BadData.is_client_fault());
        assert!(!ErrorKind::NotFound.is_client_fault());
        assert!(!ErrorKind::AppError.is_client_fault());
    }
}
