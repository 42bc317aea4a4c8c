use serde::Serialize;
use weather_core::model::Pagination;

/// The `{success, data|message, ...}` envelope every endpoint answers with.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            pagination: None,
            error: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub const fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

impl ApiResponse<()> {
    /// A successful response that carries only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            pagination: None,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>, error: Option<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            pagination: None,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_fields_are_omitted() {
        let body = serde_json::to_value(ApiResponse::message("done")).unwrap();
        assert_eq!(body, json!({"success": true, "message": "done"}));

        let body = serde_json::to_value(ApiResponse::failure("Route not found", None)).unwrap();
        assert_eq!(body, json!({"success": false, "message": "Route not found"}));
    }

    #[test]
    fn pagination_sits_beside_data() {
        let body = serde_json::to_value(
            ApiResponse::success(vec![1, 2]).with_pagination(Pagination::new(1, 2, 5)),
        )
        .unwrap();

        assert_eq!(body["data"], json!([1, 2]));
        assert_eq!(
            body["pagination"],
            json!({"page": 1, "limit": 2, "total": 5, "pages": 3})
        );
    }
}
