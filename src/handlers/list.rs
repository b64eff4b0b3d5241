use async_trait::async_trait;
use axum::{extract::Query, http::Method, response::Response};

use super::{
    utils::{allow, Target},
    ActionHandler, AdminRequest,
};
use crate::admin::Admin;
use crate::database::Page;
use crate::error::AdminError;
use crate::render::ListContext;

/// GET /list/:collection?page=&limit= - one page of a collection
pub struct ListHandler;

#[async_trait]
impl ActionHandler for ListHandler {
    async fn handle(&self, admin: &Admin, request: AdminRequest) -> Result<Response, AdminError> {
        allow(&request, &[Method::GET, Method::HEAD])?;
        let target = Target::parse(&request.path)?;

        let Query(page) = Query::<Page>::try_from_uri(&request.uri)
            .map_err(|e| AdminError::BadRequest(e.body_text()))?;
        let page = page.clamped();

        let info = admin.collection_info(&target.key).await?;
        let documents = admin.database()?.list(&info, page).await?;

        let ctx = ListContext {
            base: &request.base,
            collection: &info,
            page,
            documents: &documents,
        };
        Ok(admin.renderer().list(&ctx))
    }
}
