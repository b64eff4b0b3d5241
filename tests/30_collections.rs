mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use collection_admin::registry::AdminRecord;
use collection_admin::{Admin, AdminError};

#[tokio::test]
async fn create_list_update_delete() -> Result<()> {
    let admin = common::admin();

    // Empty form describes the collection
    let res = common::get(&admin, "/admin/create/shop.orders").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["collection"]["fields"][0]["name"], "id");
    assert_eq!(res.body["data"]["saved"], false);

    let order = json!({"id": "o-1", "customer": "alice", "total": 30});
    let res = common::send(&admin, Method::POST, "/admin/create/shop.orders", None, Some(order)).await?;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["data"]["document"]["customer"], "alice");

    let res = common::get(&admin, "/admin/list/shop.orders").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["documents"].as_array().map(Vec::len), Some(1));
    assert_eq!(res.body["data"]["page"], json!({"page": 0, "limit": 20}));

    let res = common::get(&admin, "/admin/detail/shop.orders/o-1").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["document"]["total"], 30);

    let res = common::send(
        &admin,
        Method::PATCH,
        "/admin/update/shop.orders/o-1",
        None,
        Some(json!({"total": 45})),
    )
    .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["saved"], true);
    assert_eq!(res.body["data"]["document"]["total"], 45);

    // Confirmation page leaves the record alone
    let res = common::get(&admin, "/admin/delete/shop.orders/o-1").await?;
    assert_eq!(res.body["data"]["deleted"], false);

    let res = common::send(&admin, Method::DELETE, "/admin/delete/shop.orders/o-1", None, None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["deleted"], true);

    let res = common::get(&admin, "/admin/detail/shop.orders/o-1").await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn generated_identifiers() -> Result<()> {
    let admin = common::admin();
    let res = common::send(
        &admin,
        Method::POST,
        "/admin/create/shop.orders/",
        None,
        Some(json!({"total": 1})),
    )
    .await?;
    assert_eq!(res.status, StatusCode::CREATED);

    let id = res.body["data"]["document"]["id"].as_str().expect("generated id").to_string();
    let res = common::get(&admin, &format!("/admin/detail/shop.orders/{}", id)).await?;
    assert_eq!(res.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn listing_is_paginated() -> Result<()> {
    let admin = common::admin();
    for i in 0..5 {
        let order = json!({"id": format!("o-{i}")});
        common::send(&admin, Method::POST, "/admin/create/shop.orders", None, Some(order)).await?;
    }

    let res = common::get(&admin, "/admin/list/shop.orders?page=2&limit=2").await?;
    assert_eq!(res.body["data"]["documents"], json!([{"id": "o-4"}]));

    // Oversized limits are clamped
    let res = common::get(&admin, "/admin/list/shop.orders?limit=100000").await?;
    assert_eq!(res.body["data"]["page"]["limit"], 100);

    let res = common::get(&admin, "/admin/list/shop.orders?page=minus-one").await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn request_errors() -> Result<()> {
    let admin = common::admin();

    let cases = [
        (Method::GET, "/admin/list/orders", None, StatusCode::BAD_REQUEST),
        (Method::GET, "/admin/list/shop.missing", None, StatusCode::NOT_FOUND),
        (Method::GET, "/admin/list/", None, StatusCode::NOT_FOUND),
        (Method::GET, "/admin/detail/shop.orders", None, StatusCode::BAD_REQUEST),
        (Method::GET, "/admin/detail/shop.orders/nope", None, StatusCode::NOT_FOUND),
        (Method::POST, "/admin/list/shop.orders", None, StatusCode::METHOD_NOT_ALLOWED),
        (Method::PUT, "/admin/create/shop.orders", Some(json!({})), StatusCode::METHOD_NOT_ALLOWED),
        (Method::POST, "/admin/create/shop.orders", Some(json!([1, 2])), StatusCode::BAD_REQUEST),
        (Method::POST, "/admin/update/shop.orders/nope", Some(json!({"total": 1})), StatusCode::NOT_FOUND),
        (Method::DELETE, "/admin/delete/shop.orders/nope", None, StatusCode::NOT_FOUND),
    ];

    for (method, uri, body, expected) in cases {
        let res = common::send(&admin, method.clone(), uri, None, body).await?;
        assert_eq!(res.status, expected, "{method} {uri}: {}", res.body);
        assert_eq!(res.body["success"], false);
    }
    Ok(())
}

#[tokio::test]
async fn oversized_bodies_are_rejected() -> Result<()> {
    let admin = Arc::new(
        Admin::builder()
            .prefix(common::PREFIX)
            .database(common::memory_session())
            .max_body_bytes(16)
            .build(),
    );
    let body = json!({"id": "o-1", "customer": "a name well past sixteen bytes"});
    let res = common::send(&admin, Method::POST, "/admin/create/shop.orders", None, Some(body)).await?;
    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    Ok(())
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Customer {
    email: String,
    name: String,
}

impl AdminRecord for Customer {
    const COLLECTION: &'static str = "shop.customers";
    const ID_FIELD: usize = 0;
}

#[derive(Debug, Deserialize)]
struct Stranger {}

#[tokio::test]
async fn typed_records() -> Result<()> {
    let admin = Arc::new(
        Admin::builder()
            .prefix(common::PREFIX)
            .database(common::memory_session())
            .register::<Customer>()?
            .build(),
    );
    assert_eq!(admin.registry().type_collection::<Customer>(), Some(common::key("shop.customers")));

    let customer = json!({"email": "ann@example.com", "name": "Ann"});
    common::send(&admin, Method::POST, "/admin/create/shop.customers", None, Some(customer)).await?;

    let ann: Option<Customer> = admin.fetch("ann@example.com").await?;
    let ann = ann.expect("customer stored");
    assert_eq!(ann.name, "Ann");
    assert_eq!(admin.identifier_of(&ann).await?, json!("ann@example.com"));
    assert!(admin.fetch::<Customer>("nobody@example.com").await?.is_none());

    let err = admin.fetch::<Stranger>("x").await.unwrap_err();
    assert!(matches!(err, AdminError::UnregisteredType(_)));
    Ok(())
}

#[tokio::test]
async fn typed_records_use_the_bound_identifier_field() -> Result<()> {
    // Bound by name (field #1) while the collection is keyed by email
    let admin = Arc::new(
        Admin::builder()
            .prefix(common::PREFIX)
            .database(common::memory_session())
            .bind_type::<Customer>(1, common::key("shop.customers"))
            .build(),
    );

    let customer = json!({"email": "ann@example.com", "name": "Ann"});
    common::send(&admin, Method::POST, "/admin/create/shop.customers", None, Some(customer)).await?;

    let ann: Customer = admin.fetch("Ann").await?.expect("customer found by name");
    assert_eq!(ann.email, "ann@example.com");

    let id = admin.identifier_of(&ann).await?;
    assert_eq!(id, json!("Ann"));
    let again: Option<Customer> = admin.fetch(id.as_str().unwrap_or_default()).await?;
    assert_eq!(again.map(|c| c.email).as_deref(), Some("ann@example.com"));

    assert!(admin.fetch::<Customer>("ann@example.com").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn rebinding_a_type_replaces_it() -> Result<()> {
    let admin = Admin::builder()
        .database(common::memory_session())
        .bind_type::<Customer>(0, common::key("crm.contacts"))
        .build();
    admin.registry().bind_type::<Customer>(0, common::key("shop.customers"));
    assert_eq!(admin.registry().type_collection::<Customer>(), Some(common::key("shop.customers")));
    Ok(())
}
