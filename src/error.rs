// src/error.rs

use std::{fmt, io, path::PathBuf, process::ExitStatus, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Failures of the file-backed exam store and the document converter.
#[derive(Debug)]
pub enum ExamError {
    /// Reading or writing a file under the exam root failed.
    Io { path: PathBuf, source: io::Error },

    /// Exam or student identifier that would leave the exam root.
    InvalidId(String),

    /// The description file exists but has no start time line.
    EmptyDescription { path: PathBuf },

    /// The first description line is not `DD. MM. YYYY HH:MM`.
    InvalidStartTime {
        line: String,
        source: chrono::ParseError,
    },

    /// The converter could not be spawned or awaited.
    ConverterIo { program: String, source: io::Error },

    /// The converter exited unsuccessfully.
    ConverterFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    ConverterTimeout { program: String, after: Duration },

    /// The converter produced output that is not UTF-8.
    InvalidOutput { source: std::string::FromUtf8Error },
}

impl ExamError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ExamError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the failure is a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ExamError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

impl fmt::Display for ExamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExamError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            ExamError::InvalidId(id) => write!(f, "invalid identifier: {:?}", id),
            ExamError::EmptyDescription { path } => {
                write!(f, "{}: missing start time line", path.display())
            }
            ExamError::InvalidStartTime { line, source } => {
                write!(f, "invalid start time {:?}: {}", line, source)
            }
            ExamError::ConverterIo { program, source } => {
                write!(f, "failed to run converter `{}`: {}", program, source)
            }
            ExamError::ConverterFailed {
                program,
                status,
                stderr,
            } => write!(f, "converter `{}` exited with {}: {}", program, status, stderr),
            ExamError::ConverterTimeout { program, after } => {
                write!(f, "converter `{}` timed out after {:?}", program, after)
            }
            ExamError::InvalidOutput { source } => {
                write!(f, "converter output is not valid UTF-8: {}", source)
            }
        }
    }
}

impl std::error::Error for ExamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExamError::Io { source, .. } | ExamError::ConverterIo { source, .. } => Some(source),
            ExamError::InvalidStartTime { source, .. } => Some(source),
            ExamError::InvalidOutput { source } => Some(source),
            _ => None,
        }
    }
}

/// Failures of a mail transport.
#[derive(Debug)]
pub enum MailError {
    Transport(reqwest::Error),

    /// The relay answered with a non-success status.
    Rejected { status: u16, body: String },
}

impl fmt::Display for MailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MailError::Transport(e) => write!(f, "mail transport error: {}", e),
            MailError::Rejected { status, body } => {
                write!(f, "mail relay rejected message ({}): {}", status, body)
            }
        }
    }
}

impl std::error::Error for MailError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MailError::Transport(e) => Some(e),
            MailError::Rejected { .. } => None,
        }
    }
}

impl From<reqwest::Error> for MailError {
    fn from(err: reqwest::Error) -> Self {
        MailError::Transport(err)
    }
}

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., answering a finished exam)
    Conflict(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Missing files become 404, bad identifiers 400, everything else 500.
impl From<ExamError> for AppError {
    fn from(err: ExamError) -> Self {
        if err.is_not_found() {
            return AppError::NotFound(err.to_string());
        }
        match err {
            ExamError::InvalidId(_) => AppError::BadRequest(err.to_string()),
            _ => AppError::InternalServerError(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_maps_to_not_found() {
        let err = ExamError::io(
            "exams/pa1/test/assignment.md",
            io::Error::from(io::ErrorKind::NotFound),
        );
        assert!(err.is_not_found());
        assert!(matches!(AppError::from(err), AppError::NotFound(_)));
    }

    #[test]
    fn test_invalid_id_maps_to_bad_request() {
        let err = ExamError::InvalidId("../etc".to_string());
        assert!(!err.is_not_found());
        assert!(matches!(AppError::from(err), AppError::BadRequest(_)));
    }

    #[test]
    fn test_permission_denied_maps_to_internal_error() {
        let err = ExamError::io(
            "exams/pa1/test/finished",
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(
            AppError::from(err),
            AppError::InternalServerError(_)
        ));
    }
}
