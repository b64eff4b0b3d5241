use async_trait::async_trait;
use axum::{http::Method, response::Response};

use super::{utils::allow, ActionHandler, AdminRequest};
use crate::admin::Admin;
use crate::error::AdminError;
use crate::render::IndexContext;

/// GET / - collections grouped by database
pub struct IndexHandler;

#[async_trait]
impl ActionHandler for IndexHandler {
    async fn handle(&self, admin: &Admin, request: AdminRequest) -> Result<Response, AdminError> {
        // The index route catches every path no other route claims
        if !request.path.is_empty() {
            return Err(AdminError::NotFound(request.path));
        }
        allow(&request, &[Method::GET, Method::HEAD])?;

        let ctx = IndexContext {
            base: &request.base,
            databases: admin.navigation(),
        };
        Ok(admin.renderer().index(&ctx))
    }
}
