use async_trait::async_trait;
use axum::{http::Method, response::Response};

use super::{
    utils::{allow, Target},
    ActionHandler, AdminRequest,
};
use crate::admin::Admin;
use crate::error::AdminError;
use crate::render::DeleteContext;

/// GET /delete/:collection/:id - confirmation
/// POST|DELETE /delete/:collection/:id - remove the record
pub struct DeleteHandler;

#[async_trait]
impl ActionHandler for DeleteHandler {
    async fn handle(&self, admin: &Admin, request: AdminRequest) -> Result<Response, AdminError> {
        allow(&request, &[Method::GET, Method::HEAD, Method::POST, Method::DELETE])?;
        let target = Target::parse(&request.path)?;
        let id = target.require_id()?;
        let info = admin.collection_info(&target.key).await?;
        let database = admin.database()?;

        let not_found = || AdminError::NotFound(format!("{} {}", target.key, id));
        let document = database.find(&info, id).await?.ok_or_else(not_found)?;

        let deleted = !matches!(request.method, Method::GET | Method::HEAD);
        if deleted {
            if !database.delete(&info, id).await? {
                return Err(not_found());
            }
            tracing::info!("deleted {} {}", info.key, id);
        }

        let ctx = DeleteContext {
            base: &request.base,
            collection: &info,
            document: Some(&document),
            deleted,
        };
        Ok(admin.renderer().delete(&ctx))
    }
}
