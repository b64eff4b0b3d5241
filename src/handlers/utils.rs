use axum::{body::Bytes, http::Method};
use serde_json::Value;

use super::AdminRequest;
use crate::database::Document;
use crate::error::AdminError;
use crate::registry::CollectionKey;

/// Collection and optional record a request addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub key: CollectionKey,
    pub id: Option<String>,
}

impl Target {
    /// Parse `<db>.<collection>[/<id>]`
    pub fn parse(path: &str) -> Result<Self, AdminError> {
        let path = path.trim_matches('/');
        if path.is_empty() {
            return Err(AdminError::NotFound("no collection given".to_string()));
        }

        let (key, id) = match path.split_once('/') {
            Some((key, id)) => (key, Some(id.trim_end_matches('/'))),
            None => (path, None),
        };

        Ok(Self {
            key: key.parse()?,
            id: id.filter(|id| !id.is_empty()).map(str::to_string),
        })
    }

    pub fn require_id(&self) -> Result<&str, AdminError> {
        self.id
            .as_deref()
            .ok_or_else(|| AdminError::BadRequest(format!("record identifier required for {}", self.key)))
    }
}

/// Reject methods the action does not serve
pub fn allow(request: &AdminRequest, methods: &[Method]) -> Result<(), AdminError> {
    if methods.contains(&request.method) {
        Ok(())
    } else {
        Err(AdminError::MethodNotAllowed(request.method.to_string()))
    }
}

/// Parse a JSON object body into a document
pub fn parse_document(body: &Bytes) -> Result<Document, AdminError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AdminError::BadRequest(format!("invalid JSON body: {}", e)))?;
    match value {
        Value::Object(document) => Ok(document),
        _ => Err(AdminError::BadRequest("request body must be a JSON object".to_string())),
    }
}
