mod common;

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use collection_admin::routes::{Action, RouteSpec};
use collection_admin::Admin;

#[tokio::test]
async fn missing_database_is_an_internal_error() -> Result<()> {
    let admin = Arc::new(Admin::builder().prefix(common::PREFIX).build());

    for uri in ["/admin/", "/admin/list/shop.orders", "/elsewhere"] {
        let res = common::get(&admin, uri).await?;
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(res.body["code"], "SESSION_MISSING");
    }

    // Never got as far as routing
    assert!(!admin.is_bound());
    Ok(())
}

#[tokio::test]
async fn paths_outside_the_prefix_are_not_found() -> Result<()> {
    let admin = common::admin();
    let res = common::get(&admin, "/public/list/shop.orders").await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["success"], false);
    Ok(())
}

#[tokio::test]
async fn bare_mount_point_serves_the_index() -> Result<()> {
    let admin = common::admin();
    let res = common::get(&admin, "/admin").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["action"], "index");

    // A sibling path sharing the prefix text is still outside the admin
    let res = common::get(&admin, "/administrator").await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn first_request_binds_routes() -> Result<()> {
    let admin = common::admin();
    assert!(!admin.is_bound());

    let res = common::get(&admin, "/admin/").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert!(admin.is_bound());
    Ok(())
}

#[tokio::test]
async fn index_groups_collections_by_database() -> Result<()> {
    let admin = common::admin();
    for name in ["shop.orders", "shop.customers", "crm.contacts"] {
        admin.collection_info(&common::key(name)).await?;
    }

    let res = common::get(&admin, "/admin/").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["action"], "index");

    let mut shop: Vec<String> = serde_json::from_value(res.body["data"]["databases"]["shop"].clone())?;
    shop.sort();
    assert_eq!(shop, vec!["customers", "orders"]);
    assert_eq!(res.body["data"]["databases"]["crm"], json!(["contacts"]));
    Ok(())
}

#[tokio::test]
async fn navigation_is_built_once() -> Result<()> {
    let admin = common::admin();
    admin.collection_info(&common::key("shop.orders")).await?;
    common::get(&admin, "/admin/").await?;

    // Introspected after the first index render, so not listed
    admin.collection_info(&common::key("crm.contacts")).await?;
    let res = common::get(&admin, "/admin/").await?;
    assert!(res.body["data"]["databases"].get("crm").is_none());
    assert!(admin.navigation().databases().eq(["shop"]));
    Ok(())
}

#[tokio::test]
async fn unknown_paths_under_index_are_not_found() -> Result<()> {
    let admin = common::admin();
    let res = common::get(&admin, "/admin/nothing-here").await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn custom_routes_replace_defaults() -> Result<()> {
    let routes = RouteSpec::default()
        .with_route("list", "/browse/")
        .with_route("detail", "/show/");
    let admin = Arc::new(
        Admin::builder()
            .prefix(common::PREFIX)
            .routes(routes)
            .database(common::memory_session())
            .build(),
    );

    let res = common::get(&admin, "/admin/browse/shop.orders").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["action"], "list");

    // The old list path now falls through to the index route
    let res = common::get(&admin, "/admin/list/shop.orders").await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
#[should_panic(expected = "route missing: delete")]
async fn incomplete_routes_abort_the_request() {
    let admin = Arc::new(
        Admin::builder()
            .prefix(common::PREFIX)
            .routes(RouteSpec::default().without_route("delete"))
            .database(common::memory_session())
            .build(),
    );
    let _ = common::get(&admin, "/admin/").await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_requests_bind_once() -> Result<()> {
    let admin = common::admin();

    let requests = (0..64).map(|i| {
        let admin = admin.clone();
        tokio::spawn(async move {
            let uri = if i % 2 == 0 { "/admin/" } else { "/admin/list/shop.orders" };
            common::send(&admin, Method::GET, uri, None, None).await
        })
    });
    for result in futures::future::join_all(requests).await {
        assert_eq!(result??.status, StatusCode::OK);
    }

    let paths = admin.route_table()?.paths();
    let unique: HashSet<&str> = paths.iter().copied().collect();
    assert_eq!(paths.len(), Action::ALL.len());
    assert_eq!(unique.len(), paths.len());
    Ok(())
}
