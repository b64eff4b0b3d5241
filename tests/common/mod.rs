#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
};
use serde_json::Value;
use tower::ServiceExt;

use collection_admin::database::MemorySession;
use collection_admin::registry::{CollectionKey, FieldInfo};
use collection_admin::Admin;

pub const PREFIX: &str = "/admin";

pub fn key(name: &str) -> CollectionKey {
    name.parse().expect("valid collection key")
}

/// In-memory database with a couple of collections across two databases
pub fn memory_session() -> MemorySession {
    MemorySession::new()
        .with_collection(
            key("shop.orders"),
            vec![
                FieldInfo::new("id", "text").required(),
                FieldInfo::new("customer", "text"),
                FieldInfo::new("total", "numeric"),
            ],
            0,
        )
        .with_collection(
            key("shop.customers"),
            vec![FieldInfo::new("email", "text").required(), FieldInfo::new("name", "text")],
            0,
        )
        .with_collection(key("crm.contacts"), vec![FieldInfo::new("id", "text")], 0)
}

pub fn admin() -> Arc<Admin> {
    Arc::new(Admin::builder().prefix(PREFIX).database(memory_session()).build())
}

pub struct TestResponse {
    pub status: StatusCode,
    pub cookies: Vec<String>,
    pub body: Value,
}

impl TestResponse {
    async fn from_response(response: Response) -> Result<Self> {
        let status = response.status();
        let cookies = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok(Self { status, cookies, body })
    }

    /// `name=value` part of the auth cookie, as a browser would send it back
    pub fn auth_cookie(&self) -> Option<String> {
        self.cookies
            .iter()
            .find(|c| c.starts_with("auth="))
            .and_then(|c| c.split(';').next())
            .map(str::to_string)
    }
}

pub async fn send(
    admin: &Arc<Admin>,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Result<TestResponse> {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    let body = match body {
        Some(value) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&value)?)
        }
        None => Body::empty(),
    };

    let response = admin.clone().router().oneshot(request.body(body)?).await?;
    TestResponse::from_response(response).await
}

pub async fn get(admin: &Arc<Admin>, uri: &str) -> Result<TestResponse> {
    send(admin, Method::GET, uri, None, None).await
}
