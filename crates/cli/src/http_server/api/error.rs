use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use img_store::{ErrorKind, ImgError};

/// Request failure rendered as a JSON `{code, message}` body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] ImgError),

    /// Malformed multipart body or missing image part
    #[error("bad upload: {0}")]
    Upload(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Store(err) => match err.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Exists => StatusCode::CONFLICT,
                ErrorKind::BadGroup
                | ErrorKind::BadName
                | ErrorKind::BadType
                | ErrorKind::BadFormat
                | ErrorKind::ConvertFail => StatusCode::BAD_REQUEST,
                ErrorKind::Connection | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Upload(_) => StatusCode::BAD_REQUEST,
            ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Store(err) => err.kind().code(),
            ApiError::Upload(_) => "BAD_UPLOAD",
            ApiError::Io(_) => ErrorKind::Internal.code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let message = match &self {
            ApiError::Store(err) => err.message().to_string(),
            other => other.to_string(),
        };
        let body = serde_json::json!({"code": self.code(), "message": message});
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ErrorKind::NotFound, StatusCode::NOT_FOUND),
            (ErrorKind::Exists, StatusCode::CONFLICT),
            (ErrorKind::BadGroup, StatusCode::BAD_REQUEST),
            (ErrorKind::BadType, StatusCode::BAD_REQUEST),
            (ErrorKind::ConvertFail, StatusCode::BAD_REQUEST),
            (ErrorKind::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (kind, status) in cases {
            assert_eq!(ApiError::from(ImgError::new(kind, "x")).status(), status);
        }
    }

    #[test]
    fn test_upload_errors_are_bad_requests() {
        let err = ApiError::Upload("no image part".to_string());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "BAD_UPLOAD");
    }
}
