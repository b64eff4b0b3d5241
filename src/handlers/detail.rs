use async_trait::async_trait;
use axum::{http::Method, response::Response};

use super::{
    utils::{allow, Target},
    ActionHandler, AdminRequest,
};
use crate::admin::Admin;
use crate::error::AdminError;
use crate::render::DetailContext;

/// GET /detail/:collection/:id - a single record
pub struct DetailHandler;

#[async_trait]
impl ActionHandler for DetailHandler {
    async fn handle(&self, admin: &Admin, request: AdminRequest) -> Result<Response, AdminError> {
        allow(&request, &[Method::GET, Method::HEAD])?;
        let target = Target::parse(&request.path)?;
        let id = target.require_id()?;

        let info = admin.collection_info(&target.key).await?;
        let document = admin
            .database()?
            .find(&info, id)
            .await?
            .ok_or_else(|| AdminError::NotFound(format!("{} {}", target.key, id)))?;

        let ctx = DetailContext {
            base: &request.base,
            collection: &info,
            document: &document,
        };
        Ok(admin.renderer().detail(&ctx))
    }
}
