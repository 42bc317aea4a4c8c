use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::any::Any;
use std::fmt;

use super::ApiResponse;
use crate::store::StoreError;

pub const ROUTE_NOT_FOUND: &str = "Route not found";
pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    /// Rejected input; `message` names the operation, `detail` the problem.
    /// Answered like any other failed save, with a 500.
    Validation { message: String, detail: String },

    /// The store failed while performing the operation described by `message`.
    Store { message: String, detail: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Validation { message, detail } => {
                write!(f, "Validation error: {}: {}", message, detail)
            }
            ApiError::Store { message, detail } => write!(f, "{}: {}", message, detail),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, ApiResponse::failure(message, None))
            }
            ApiError::Validation { message, detail } => {
                tracing::warn!("Rejected request: {}: {}", message, detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::failure(message, Some(detail)),
                )
            }
            ApiError::Store { message, detail } => {
                tracing::error!("{}: {}", message, detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::failure(message, Some(detail)),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl ApiError {
    pub fn route_not_found() -> Self {
        ApiError::NotFound(ROUTE_NOT_FOUND.to_string())
    }

    pub fn validation(message: impl Into<String>, detail: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            detail: detail.into(),
        }
    }

    /// Map a store failure, labelling database faults with `message`.
    ///
    /// Not-found and validation errors keep the store's own wording.
    pub fn from_store(message: &'static str) -> impl FnOnce(StoreError) -> ApiError {
        move |err| match err {
            StoreError::NotFound(msg) => ApiError::NotFound(msg),
            StoreError::Validation(detail) => ApiError::validation(message, detail),
            other => ApiError::Store {
                message: message.to_string(),
                detail: other.to_string(),
            },
        }
    }
}

/// Response for a handler that panicked. The panic text is only exposed
/// when `expose_detail` is set.
pub fn panic_response(err: Box<dyn Any + Send + 'static>, expose_detail: bool) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "Unknown panic message".to_string()
    };

    tracing::error!("Server error: handler panicked: {}", detail);

    let body = ApiResponse::failure(INTERNAL_SERVER_ERROR, expose_detail.then_some(detail));
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn not_found_has_no_error_field() {
        let response = ApiError::route_not_found().into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({"success": false, "message": "Route not found"})
        );
    }

    #[tokio::test]
    async fn store_errors_keep_their_detail() {
        let err = ApiError::from_store("Error fetching weather data")(StoreError::Database(
            sea_orm::DbErr::Custom("disk I/O error".into()),
        ));
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Error fetching weather data");
        assert!(body["error"].as_str().unwrap().contains("disk I/O error"));
    }

    #[tokio::test]
    async fn store_validation_fails_the_save() {
        let err = ApiError::from_store("Error saving weather data")(StoreError::Validation(
            "Field `city` is required".into(),
        ));
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({
                "success": false,
                "message": "Error saving weather data",
                "error": "Field `city` is required"
            })
        );
    }

    #[tokio::test]
    async fn panic_detail_only_when_exposed() {
        let hidden = panic_response(Box::new("boom"), false);
        assert_eq!(hidden.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(hidden).await,
            json!({"success": false, "message": "Internal server error"})
        );

        let shown = panic_response(Box::new(String::from("boom")), true);
        assert_eq!(body_json(shown).await["error"], "boom");
    }
}
