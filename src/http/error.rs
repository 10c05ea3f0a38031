use crate::catalog::CatalogConflict;
use crate::sku::SkuError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// API error with HTTP status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub code: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            code: "BAD_REQUEST".to_string(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
            code: "NOT_FOUND".to_string(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            code: "INTERNAL_SERVER_ERROR".to_string(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
            code: "CONFLICT".to_string(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "code": self.code,
            }
        }));

        (self.status, body).into_response()
    }
}

/// Convert anyhow::Error to ApiError
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        // Unique-constraint conflicts from the catalog map to 409
        if err.downcast_ref::<CatalogConflict>().is_some() {
            return ApiError::conflict(err.to_string());
        }
        tracing::error!(error = %err, "Unhandled catalog error");
        ApiError::internal_error(err.to_string())
    }
}

/// Convert SkuError to ApiError
impl From<SkuError> for ApiError {
    fn from(e: SkuError) -> Self {
        let constructor = match e {
            SkuError::Storage(err) => return err.into(),
            SkuError::Validation(_) | SkuError::Resolution(_) | SkuError::InvalidReset(_) => {
                ApiError::bad_request
            }
            SkuError::SequenceNotFound { .. } | SkuError::BrandNotFound(_) => ApiError::not_found,
            SkuError::AllocationExhausted { .. }
            | SkuError::CapacityExceeded { .. }
            | SkuError::DuplicateSku(_) => ApiError::conflict,
        };
        constructor(e.to_string())
    }
}
