//! The response envelope every endpoint returns.
//!
//! ```json
//! { "success": true, "data": { ... } }
//! { "success": true, "data": [ ... ], "pagination": { "total_count": 40, "skip": 0, "limit": 10 } }
//! { "success": false, "error": "Reservation with ID 9 not found" }
//! ```

use super::pagination::PaginationMeta;
use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            pagination: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            pagination: None,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn paginated(data: Vec<T>, pagination: PaginationMeta) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            pagination: Some(pagination),
        }
    }
}

/// Payload of successful deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Deleted {
    pub id: i64,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_shapes() {
        let ok = serde_json::to_value(ApiResponse::ok(json!({"id": 1}))).unwrap();
        assert_eq!(ok, json!({"success": true, "data": {"id": 1}}));

        let failed = serde_json::to_value(ApiResponse::<()>::failure("nope")).unwrap();
        assert_eq!(failed, json!({"success": false, "error": "nope"}));

        let page = ApiResponse::paginated(
            vec![1, 2],
            PaginationMeta {
                total_count: 7,
                skip: 0,
                limit: 2,
            },
        );
        assert_eq!(
            serde_json::to_value(page).unwrap(),
            json!({"success": true, "data": [1, 2], "pagination": {"total_count": 7, "skip": 0, "limit": 2}})
        );
    }
}
