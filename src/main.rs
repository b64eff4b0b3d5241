use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use axum::{response::Json, routing::get, Router};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use collection_admin::auth::{AllowUsers, RequireSession};
use collection_admin::config::{self, AppConfig};
use collection_admin::database::PgSession;
use collection_admin::registry::CollectionKey;
use collection_admin::routes::RouteSpec;
use collection_admin::session::{AuthSession, JwtSigner, Signer, COOKIE_NAME};
use collection_admin::{Admin, AdminError};

#[derive(Parser)]
#[command(name = "collection-admin", version, about = "Admin pages over database collections")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the admin server (default)
    Serve {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
        /// Path the admin is mounted under
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Print a signed session cookie for a user
    Session {
        username: String,
        /// Opaque session key as JSON
        #[arg(long, default_value = "null")]
        key: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, ADMIN_SESSION_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = config::config();

    match cli.command.unwrap_or(Command::Serve { port: None, prefix: None }) {
        Command::Serve { port, prefix } => serve(config, port, prefix).await,
        Command::Session { username, key } => {
            let key: Value = serde_json::from_str(&key).context("--key must be JSON")?;
            let token = signer(config)?.sign(&AuthSession::new(username, key))?;
            println!("{}={}", COOKIE_NAME, token);
            Ok(())
        }
    }
}

fn signer(config: &AppConfig) -> Result<JwtSigner> {
    if config.security.session_secret.is_empty() {
        bail!("ADMIN_SESSION_SECRET is not set");
    }
    let Some(ttl) = config.security.session_ttl() else {
        bail!(
            "ADMIN_SESSION_TTL_HOURS is out of range: {}",
            config.security.session_ttl_hours
        );
    };
    Ok(JwtSigner::new(&config.security.session_secret).with_ttl(ttl))
}

async fn serve(config: &AppConfig, port: Option<u16>, prefix: Option<String>) -> Result<()> {
    tracing::info!("Starting collection admin in {:?} mode", config.environment);

    let prefix = prefix.unwrap_or_else(|| config.server.mount_prefix.clone());
    let routes = RouteSpec::default().parse_overrides(config.server.routes.as_deref().unwrap_or(""))?;

    let mut builder = Admin::builder()
        .prefix(prefix.trim_end_matches('/'))
        .routes(routes)
        .max_body_bytes(config.server.max_request_size_bytes);

    match &config.database.url {
        Some(url) => {
            let session = PgSession::connect(
                url,
                config.database.max_connections,
                Duration::from_secs(config.database.connection_timeout),
            )
            .await?;
            builder = builder.database(session);
        }
        // Requests fail with an internal error until a database is configured
        None => tracing::warn!("DATABASE_URL is not set; admin requests will fail"),
    }

    if !config.security.session_secret.is_empty() {
        builder = builder.signer(signer(config)?);
    }
    if !config.security.admin_users.is_empty() {
        builder = builder.authorizer(AllowUsers::new(config.security.admin_users.clone()));
    } else if config.security.require_auth {
        builder = builder.authorizer(RequireSession);
    }
    if config.security.require_auth && config.security.session_secret.is_empty() {
        bail!("ADMIN_REQUIRE_AUTH is set but ADMIN_SESSION_SECRET is empty");
    }

    let admin = Arc::new(builder.build());
    admin.warm_up()?;

    // Introspect configured collections up front so the index lists them
    if admin.database().is_ok() {
        for name in &config.database.collections {
            let key: CollectionKey = name.parse()?;
            admin
                .collection_info(&key)
                .await
                .with_context(|| format!("failed to introspect {}", key))?;
        }
    }

    let health_admin = admin.clone();
    let app = Router::new()
        .route("/health", get(move || health(health_admin.clone())))
        .merge(admin.router());

    let port = port.unwrap_or(config.server.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Admin listening on http://{}{}", bind_addr, prefix);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health(admin: Arc<Admin>) -> Result<Json<Value>, AdminError> {
    admin.database()?.health_check().await?;
    Ok(Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
            "database": "ok"
        }
    })))
}
