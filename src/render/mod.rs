pub mod json;

use axum::response::Response;
use serde::Serialize;

use crate::database::{Document, Page};
use crate::error::AdminError;
use crate::registry::{CollectionInfo, NavigationIndex};
use crate::routes::Action;
use crate::session::AuthSession;

pub use json::JsonRenderer;

/// Shared by every rendering
#[derive(Debug, Clone, Serialize)]
pub struct BaseContext {
    /// Mount prefix, for building links back into the admin
    pub prefix: String,
    pub action: Option<Action>,
    /// Present when the request carried a valid session
    pub session: Option<AuthSession>,
}

#[derive(Debug, Serialize)]
pub struct IndexContext<'a> {
    #[serde(flatten)]
    pub base: &'a BaseContext,
    pub databases: &'a NavigationIndex,
}

#[derive(Debug, Serialize)]
pub struct ListContext<'a> {
    #[serde(flatten)]
    pub base: &'a BaseContext,
    pub collection: &'a CollectionInfo,
    pub page: Page,
    pub documents: &'a [Document],
}

#[derive(Debug, Serialize)]
pub struct DetailContext<'a> {
    #[serde(flatten)]
    pub base: &'a BaseContext,
    pub collection: &'a CollectionInfo,
    pub document: &'a Document,
}

/// Create and update share a form: empty or pre-filled on `GET`, and the
/// stored document once `saved`
#[derive(Debug, Serialize)]
pub struct FormContext<'a> {
    #[serde(flatten)]
    pub base: &'a BaseContext,
    pub collection: &'a CollectionInfo,
    pub document: Option<&'a Document>,
    pub saved: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteContext<'a> {
    #[serde(flatten)]
    pub base: &'a BaseContext,
    pub collection: &'a CollectionInfo,
    pub document: Option<&'a Document>,
    pub deleted: bool,
}

/// Produces the response body for each admin page
pub trait Renderer: Send + Sync {
    fn index(&self, ctx: &IndexContext<'_>) -> Response;
    fn list(&self, ctx: &ListContext<'_>) -> Response;
    fn detail(&self, ctx: &DetailContext<'_>) -> Response;
    fn create(&self, ctx: &FormContext<'_>) -> Response;
    fn update(&self, ctx: &FormContext<'_>) -> Response;
    fn delete(&self, ctx: &DeleteContext<'_>) -> Response;
    fn not_found(&self, base: &BaseContext) -> Response;
    fn unauthorized(&self, base: &BaseContext) -> Response;
    /// Any other failure, including the internal errors raised before routing
    fn error(&self, err: &AdminError) -> Response;
}
