use crate::metrics::FailureKind;
use crate::pages;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use evaluate::{RemoteError, StoreError};
use ingest::ParseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("No document was uploaded in the `{0}` field")]
    MissingUpload(&'static str),

    #[error("Malformed form data: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Configuration incomplete: {0}")]
    ConfigurationIncomplete(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            // A stored artifact that cannot be read is a configuration problem,
            // not a server fault
            StoreError::Artifact { .. } => AppError::ConfigurationIncomplete(e.to_string()),
            StoreError::Io(_) => AppError::Store(e),
        }
    }
}

impl AppError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AppError::MissingUpload(_) | AppError::Multipart(_) => FailureKind::BadRequest,
            AppError::Parse(_) => FailureKind::Parse,
            AppError::ConfigurationIncomplete(_) => FailureKind::ConfigurationIncomplete,
            AppError::Remote(_) => FailureKind::Remote,
            AppError::Store(_) => FailureKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingUpload(_) | AppError::Multipart(_) => StatusCode::BAD_REQUEST,
            AppError::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ConfigurationIncomplete(_) => StatusCode::CONFLICT,
            AppError::Remote(_) => StatusCode::BAD_GATEWAY,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        match &self {
            AppError::ConfigurationIncomplete(detail) => (
                status,
                format!(
                    "The grader is not fully configured yet ({detail}). \
                     Ask an administrator to upload the missing files at /config."
                ),
            )
                .into_response(),
            AppError::MissingUpload(_) | AppError::Multipart(_) => (
                status,
                Html(pages::error_page(
                    "No document received",
                    "Please choose a Word (.docx) file and submit the form again.",
                )),
            )
                .into_response(),
            AppError::Parse(_) => (
                status,
                Html(pages::error_page(
                    "Could not read document",
                    "The uploaded file could not be read as a Word (.docx) document.",
                )),
            )
                .into_response(),
            AppError::Remote(_) => (
                status,
                Html(pages::error_page(
                    "Evaluation service unavailable",
                    "The evaluation service did not return a result. Please try again in a few minutes.",
                )),
            )
                .into_response(),
            AppError::Store(_) => (
                status,
                Html(pages::error_page(
                    "Something went wrong",
                    "The stored configuration could not be accessed.",
                )),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evaluate::BundleField;

    #[test]
    fn unreadable_artifact_maps_to_configuration_incomplete() {
        let err: AppError = StoreError::Artifact {
            field: BundleField::Rubric,
            source: ParseError::InvalidDocument("bad zip".to_string()),
        }
        .into();

        assert!(matches!(err, AppError::ConfigurationIncomplete(_)));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert!(err.to_string().contains("rubric"));
    }

    #[test]
    fn io_failure_is_internal() {
        let err: AppError = StoreError::Io(std::io::Error::other("disk gone")).into();
        assert_eq!(err.kind(), FailureKind::Internal);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn each_error_has_distinct_status() {
        let errors = [
            AppError::MissingUpload("submission"),
            AppError::Parse(ParseError::InvalidDocument(String::new())),
            AppError::ConfigurationIncomplete(String::new()),
            AppError::Remote(RemoteError::Timeout),
        ];
        let statuses: Vec<_> = errors.iter().map(AppError::status).collect();
        assert_eq!(
            statuses,
            vec![
                StatusCode::BAD_REQUEST,
                StatusCode::UNPROCESSABLE_ENTITY,
                StatusCode::CONFLICT,
                StatusCode::BAD_GATEWAY,
            ]
        );
    }
}
