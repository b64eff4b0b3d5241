use async_trait::async_trait;
use axum::{http::Method, response::Response};

use super::{
    utils::{allow, parse_document, Target},
    ActionHandler, AdminRequest,
};
use crate::admin::Admin;
use crate::error::AdminError;
use crate::render::FormContext;

/// GET /create/:collection - empty form
/// POST /create/:collection - insert the JSON object body
pub struct CreateHandler;

#[async_trait]
impl ActionHandler for CreateHandler {
    async fn handle(&self, admin: &Admin, request: AdminRequest) -> Result<Response, AdminError> {
        allow(&request, &[Method::GET, Method::HEAD, Method::POST])?;
        let target = Target::parse(&request.path)?;
        let info = admin.collection_info(&target.key).await?;

        if request.method != Method::POST {
            let ctx = FormContext {
                base: &request.base,
                collection: &info,
                document: None,
                saved: false,
            };
            return Ok(admin.renderer().create(&ctx));
        }

        let document = parse_document(&request.body)?;
        let created = admin.database()?.insert(&info, document).await?;
        tracing::info!("created record in {}", info.key);

        let ctx = FormContext {
            base: &request.base,
            collection: &info,
            document: Some(&created),
            saved: true,
        };
        Ok(admin.renderer().create(&ctx))
    }
}
