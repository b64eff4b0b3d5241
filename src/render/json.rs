use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

use super::{BaseContext, DeleteContext, DetailContext, FormContext, IndexContext, ListContext, Renderer};
use crate::error::AdminError;

/// Wrapper for rendered pages that adds the success envelope
#[derive(Debug)]
struct ApiResponse<T: Serialize> {
    data: T,
    status_code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self::with_status(data, StatusCode::OK)
    }

    fn with_status(data: T, status_code: StatusCode) -> Self {
        Self { data, status_code }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        // Convert data to JSON Value for consistent envelope format
        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "error": "Failed to serialize response data"
                    })),
                )
                    .into_response();
            }
        };

        let envelope = json!({
            "success": true,
            "data": data_value
        });

        (self.status_code, Json(envelope)).into_response()
    }
}

/// Renders every page as a JSON envelope. Used when no renderer is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn index(&self, ctx: &IndexContext<'_>) -> Response {
        ApiResponse::success(ctx).into_response()
    }

    fn list(&self, ctx: &ListContext<'_>) -> Response {
        ApiResponse::success(ctx).into_response()
    }

    fn detail(&self, ctx: &DetailContext<'_>) -> Response {
        ApiResponse::success(ctx).into_response()
    }

    fn create(&self, ctx: &FormContext<'_>) -> Response {
        let status = if ctx.saved { StatusCode::CREATED } else { StatusCode::OK };
        ApiResponse::with_status(ctx, status).into_response()
    }

    fn update(&self, ctx: &FormContext<'_>) -> Response {
        ApiResponse::success(ctx).into_response()
    }

    fn delete(&self, ctx: &DeleteContext<'_>) -> Response {
        ApiResponse::success(ctx).into_response()
    }

    fn not_found(&self, _base: &BaseContext) -> Response {
        self.error(&AdminError::NotFound("page".to_string()))
    }

    fn unauthorized(&self, _base: &BaseContext) -> Response {
        self.error(&AdminError::Unauthorized)
    }

    fn error(&self, err: &AdminError) -> Response {
        let status = err.status_code();
        if status.is_server_error() {
            tracing::error!("admin request failed: {}", err);
        }
        (status, Json(err.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CollectionInfo, FieldInfo};

    #[test]
    fn saved_create_is_201() {
        let base = BaseContext {
            prefix: "/admin".to_string(),
            action: None,
            session: None,
        };
        let info = CollectionInfo::new("a.b".parse().unwrap(), vec![FieldInfo::new("id", "text")], 0);
        let ctx = FormContext {
            base: &base,
            collection: &info,
            document: None,
            saved: true,
        };
        assert_eq!(JsonRenderer.create(&ctx).status(), StatusCode::CREATED);
    }

    #[test]
    fn errors_carry_their_status() {
        assert_eq!(
            JsonRenderer.error(&AdminError::SessionMissing).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            JsonRenderer.error(&AdminError::BadRequest("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
