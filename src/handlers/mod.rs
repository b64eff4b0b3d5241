// handlers/mod.rs - one handler per admin action
//
// Each handler receives the request with both the mount prefix and its own
// route prefix already stripped, so `request.path` is `<db>.<collection>[/<id>]`.

pub mod create;
pub mod delete;
pub mod detail;
pub mod index;
pub mod list;
pub mod update;
pub mod utils;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    http::{HeaderMap, Method, Uri},
    response::Response,
};

use crate::admin::Admin;
use crate::error::AdminError;
use crate::render::BaseContext;
use crate::routes::Action;

pub use create::CreateHandler;
pub use delete::DeleteHandler;
pub use detail::DetailHandler;
pub use index::IndexHandler;
pub use list::ListHandler;
pub use update::UpdateHandler;

/// Request as seen by an action handler
#[derive(Debug)]
pub struct AdminRequest {
    pub action: Action,
    pub method: Method,
    /// Path after the route prefix
    pub path: String,
    /// Original request URI, for the query string
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub base: BaseContext,
}

#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle(&self, admin: &Admin, request: AdminRequest) -> Result<Response, AdminError>;
}

/// The handler serving an action
pub fn handler_for(action: Action) -> &'static dyn ActionHandler {
    match action {
        Action::Index => &IndexHandler,
        Action::List => &ListHandler,
        Action::Create => &CreateHandler,
        Action::Update => &UpdateHandler,
        Action::Detail => &DetailHandler,
        Action::Delete => &DeleteHandler,
    }
}
