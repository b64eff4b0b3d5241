use async_trait::async_trait;
use axum::{http::Method, response::Response};

use super::{
    utils::{allow, parse_document, Target},
    ActionHandler, AdminRequest,
};
use crate::admin::Admin;
use crate::error::AdminError;
use crate::render::FormContext;

/// GET /update/:collection/:id - form filled with the record
/// POST|PUT|PATCH /update/:collection/:id - apply the JSON object body
pub struct UpdateHandler;

#[async_trait]
impl ActionHandler for UpdateHandler {
    async fn handle(&self, admin: &Admin, request: AdminRequest) -> Result<Response, AdminError> {
        allow(
            &request,
            &[Method::GET, Method::HEAD, Method::POST, Method::PUT, Method::PATCH],
        )?;
        let target = Target::parse(&request.path)?;
        let id = target.require_id()?;
        let info = admin.collection_info(&target.key).await?;
        let database = admin.database()?;

        let saved = !matches!(request.method, Method::GET | Method::HEAD);
        let document = if saved {
            let changes = parse_document(&request.body)?;
            database.update(&info, id, changes).await?
        } else {
            database.find(&info, id).await?
        };
        let document = document.ok_or_else(|| AdminError::NotFound(format!("{} {}", target.key, id)))?;
        if saved {
            tracing::info!("updated {} {}", info.key, id);
        }

        let ctx = FormContext {
            base: &request.base,
            collection: &info,
            document: Some(&document),
            saved,
        };
        Ok(admin.renderer().update(&ctx))
    }
}
