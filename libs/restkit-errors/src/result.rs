//! Success/failure envelope returned by every REST call.

use std::fmt;

use http::StatusCode;

use crate::problem::{Problem, ValidationViolation};

/// Why a call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FailureKind {
    /// Non-2xx response carrying an `application/problem+json` body
    Problem,
    /// Non-2xx response with any other body; the raw text is the detail
    Unstructured,
    /// The request never produced a usable response (network, timeout,
    /// serialization, decoding)
    Transport,
    /// The caller cancelled the call
    Cancelled,
}

#[derive(Debug, Clone)]
enum Outcome<T> {
    Success(Option<T>),
    Failure { kind: FailureKind, problem: Problem },
}

/// Result of a REST call.
///
/// A success carries the HTTP status and, unless the response was empty
/// (204, empty body, JSON `null`), the decoded value. A failure carries the
/// HTTP status and a [`Problem`] with the details. Faults that happened
/// before a response was available are reported with status 500.
#[derive(Debug, Clone)]
#[must_use]
pub struct ApiResult<T> {
    status: StatusCode,
    outcome: Outcome<T>,
}

impl<T> ApiResult<T> {
    /// Successful response with a decoded value.
    pub fn ok(status: StatusCode, value: T) -> Self {
        Self {
            status,
            outcome: Outcome::Success(Some(value)),
        }
    }

    /// Successful response without a value.
    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            outcome: Outcome::Success(None),
        }
    }

    /// Failure described by a problem document; `status` wins over the
    /// problem's own status member.
    pub fn from_problem(status: StatusCode, problem: Problem) -> Self {
        Self {
            status,
            outcome: Outcome::Failure {
                kind: FailureKind::Problem,
                problem: problem.with_status(status),
            },
        }
    }

    /// Failure with a plain-text body stored verbatim as the detail.
    pub fn unstructured(status: StatusCode, body: impl Into<String>) -> Self {
        Self::failure(FailureKind::Unstructured, status, body.into())
    }

    /// Fault raised before a usable response existed.
    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self::failure(
            FailureKind::Transport,
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
        )
    }

    /// Call cancelled by the caller. Reported with status 500 like any
    /// other fault, but distinguishable via [`ApiResult::is_cancelled`].
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::failure(
            FailureKind::Cancelled,
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
        )
    }

    fn failure(kind: FailureKind, status: StatusCode, detail: String) -> Self {
        let title = status.canonical_reason().unwrap_or_default();
        Self {
            status,
            outcome: Outcome::Failure {
                kind,
                problem: Problem::new(status, title, detail),
            },
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.failure_kind() == Some(FailureKind::Cancelled)
    }

    /// The decoded value, if the call succeeded with one.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match &self.outcome {
            Outcome::Success(value) => value.as_ref(),
            Outcome::Failure { .. } => None,
        }
    }

    #[must_use]
    pub fn into_value(self) -> Option<T> {
        match self.outcome {
            Outcome::Success(value) => value,
            Outcome::Failure { .. } => None,
        }
    }

    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match &self.outcome {
            Outcome::Success(_) => None,
            Outcome::Failure { kind, .. } => Some(*kind),
        }
    }

    #[must_use]
    pub fn problem(&self) -> Option<&Problem> {
        match &self.outcome {
            Outcome::Success(_) => None,
            Outcome::Failure { problem, .. } => Some(problem),
        }
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.problem().map(|p| p.title.as_str())
    }

    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.problem().map(|p| p.detail.as_str())
    }

    /// Field-level validation errors reported by the server, if any.
    #[must_use]
    pub fn validation_errors(&self) -> &[ValidationViolation] {
        self.problem()
            .and_then(|p| p.errors.as_deref())
            .unwrap_or_default()
    }

    /// Transform the success value, keeping status and failure details.
    pub fn map<U, F>(self, f: F) -> ApiResult<U>
    where
        F: FnOnce(T) -> U,
    {
        let outcome = match self.outcome {
            Outcome::Success(value) => Outcome::Success(value.map(f)),
            Outcome::Failure { kind, problem } => Outcome::Failure { kind, problem },
        };
        ApiResult {
            status: self.status,
            outcome,
        }
    }

    /// Convert into a standard `Result` for use with `?`.
    ///
    /// # Errors
    ///
    /// Returns the failure's [`Problem`] if the call did not succeed.
    pub fn into_result(self) -> Result<Option<T>, Problem> {
        match self.outcome {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure { problem, .. } => Err(problem),
        }
    }
}

impl<T> fmt::Display for ApiResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Success(_) => write!(f, "success ({})", self.status),
            Outcome::Failure { problem, .. } if problem.detail.is_empty() => {
                write!(f, "failure ({}): {}", self.status, problem.title)
            }
            Outcome::Failure { problem, .. } => {
                write!(f, "failure ({}): {}", self.status, problem.detail)
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn ok_carries_value_and_status() {
        let r = ApiResult::ok(StatusCode::CREATED, 7);
        assert!(r.is_success());
        assert_eq!(r.status(), StatusCode::CREATED);
        assert_eq!(r.value(), Some(&7));
        assert!(r.problem().is_none());
        assert!(r.failure_kind().is_none());
    }

    #[test]
    fn empty_is_success_without_value() {
        let r: ApiResult<String> = ApiResult::empty(StatusCode::NO_CONTENT);
        assert!(r.is_success());
        assert!(r.value().is_none());
        assert_eq!(r.into_result(), Ok(None));
    }

    #[test]
    fn transport_failure_is_500() {
        let r: ApiResult<()> = ApiResult::transport_failure("connection refused");
        assert!(r.is_failure());
        assert!(!r.is_cancelled());
        assert_eq!(r.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(r.detail(), Some("connection refused"));
        assert_eq!(r.title(), Some("Internal Server Error"));
        assert_eq!(r.failure_kind(), Some(FailureKind::Transport));
    }

    #[test]
    fn cancelled_is_500_and_flagged() {
        let r: ApiResult<()> = ApiResult::cancelled("request cancelled");
        assert_eq!(r.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(r.is_cancelled());
    }

    #[test]
    fn problem_status_follows_response() {
        let problem = Problem::new(StatusCode::OK, "Invalid", "bad").with_errors(vec![
            ValidationViolation {
                field: "name".to_owned(),
                message: "required".to_owned(),
                code: None,
            },
        ]);
        let r: ApiResult<()> = ApiResult::from_problem(StatusCode::BAD_REQUEST, problem);

        assert_eq!(r.status(), StatusCode::BAD_REQUEST);
        assert_eq!(r.problem().map(|p| p.status), Some(StatusCode::BAD_REQUEST));
        assert_eq!(r.validation_errors().len(), 1);
        assert_eq!(r.failure_kind(), Some(FailureKind::Problem));
    }

    #[test]
    fn map_keeps_failure() {
        let r: ApiResult<u32> = ApiResult::unstructured(StatusCode::NOT_FOUND, "missing");
        let mapped = r.map(|v| v * 2);
        assert_eq!(mapped.status(), StatusCode::NOT_FOUND);
        assert_eq!(mapped.detail(), Some("missing"));
        assert!(mapped.validation_errors().is_empty());

        let ok = ApiResult::ok(StatusCode::OK, 21).map(|v| v * 2);
        assert_eq!(ok.into_value(), Some(42));
    }

    #[test]
    fn display_prefers_detail() {
        let r: ApiResult<()> = ApiResult::unstructured(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(r.to_string(), "failure (502 Bad Gateway): upstream down");
    }
}
