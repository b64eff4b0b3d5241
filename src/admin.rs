use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    response::Response,
    Router,
};
use futures::StreamExt;
use once_cell::sync::OnceCell;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::auth::{AuthRequest, Authorizer};
use crate::database::{DatabaseError, DatabaseSession};
use crate::error::AdminError;
use crate::handlers::{handler_for, AdminRequest};
use crate::registry::{AdminRecord, CollectionInfo, CollectionKey, CollectionRegistry, NavigationIndex};
use crate::render::{BaseContext, JsonRenderer, Renderer};
use crate::routes::{RouteSpec, RouteTable};
use crate::session::{AuthSession, Signer};

/// Default cap on buffered request bodies
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

type Binding = Box<dyn FnOnce(&CollectionRegistry) + Send>;

/// Serves the admin pages for a database. Routes, collection metadata and the
/// navigation index are built on first use and never change afterwards.
pub struct Admin {
    database: Option<Arc<dyn DatabaseSession>>,
    renderer: Arc<dyn Renderer>,
    authorizer: Option<Arc<dyn Authorizer>>,
    signer: Option<Arc<dyn Signer>>,
    routes: Option<RouteSpec>,
    prefix: String,
    max_body_bytes: usize,

    // created on demand
    route_table: OnceCell<RouteTable>,
    registry: OnceCell<CollectionRegistry>,
    navigation: OnceCell<NavigationIndex>,
}

impl Admin {
    pub fn builder() -> AdminBuilder {
        AdminBuilder::default()
    }

    /// Collection metadata and type bindings, allocated on first access
    pub fn registry(&self) -> &CollectionRegistry {
        self.registry.get_or_init(CollectionRegistry::new)
    }

    /// Bound route table. The first caller binds it; concurrent callers wait
    /// for that bind instead of binding again.
    pub fn route_table(&self) -> Result<&RouteTable, AdminError> {
        self.route_table.get_or_try_init(|| {
            let default_spec;
            let spec = match &self.routes {
                Some(spec) if !spec.is_empty() => spec,
                _ => {
                    default_spec = RouteSpec::default();
                    &default_spec
                }
            };
            let table = RouteTable::bind(spec)?;
            info!("admin routes bound under '{}': {:?}", self.prefix, table.paths());
            Ok(table)
        })
    }

    /// Bind routes now rather than on the first request
    pub fn warm_up(&self) -> Result<(), AdminError> {
        self.route_table().map(|_| ())
    }

    pub fn is_bound(&self) -> bool {
        self.route_table.get().is_some()
    }

    /// Collections grouped by database. Built once from the collections cached
    /// at the time of the first call; collections introspected later only
    /// appear in a new `Admin`.
    pub fn navigation(&self) -> &NavigationIndex {
        self.navigation
            .get_or_init(|| NavigationIndex::build(&self.registry().keys()))
    }

    pub fn database(&self) -> Result<&dyn DatabaseSession, AdminError> {
        self.database.as_deref().ok_or(AdminError::SessionMissing)
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Cached metadata for a collection, introspecting it on first access
    pub async fn collection_info(&self, key: &CollectionKey) -> Result<Arc<CollectionInfo>, AdminError> {
        if let Some(info) = self.registry().resolve(key) {
            return Ok(info);
        }

        let info = self.database()?.describe(key).await?;
        debug!("introspected {} ({} fields)", key, info.fields.len());
        Ok(self.registry().insert(info))
    }

    /// Load a record of a bound type by the value of its bound identifier field
    pub async fn fetch<T>(&self, id: &str) -> Result<Option<T>, AdminError>
    where
        T: DeserializeOwned + 'static,
    {
        let binding = self
            .registry()
            .type_binding::<T>()
            .ok_or(AdminError::UnregisteredType(std::any::type_name::<T>()))?;
        let info = self.collection_info(&binding.collection).await?;
        let field = info.fields.get(binding.id_field).ok_or_else(|| {
            AdminError::NotFound(format!("field #{} of {}", binding.id_field, binding.collection))
        })?;

        match self.database()?.find_by(&info, &field.name, id).await? {
            Some(document) => Ok(Some(serde_json::from_value(Value::Object(document))?)),
            None => Ok(None),
        }
    }

    /// Value of a bound record's identifier field
    pub async fn identifier_of<T>(&self, record: &T) -> Result<Value, AdminError>
    where
        T: Serialize + 'static,
    {
        let binding = self
            .registry()
            .type_binding::<T>()
            .ok_or(AdminError::UnregisteredType(std::any::type_name::<T>()))?;
        let info = self.collection_info(&binding.collection).await?;
        let field = info.fields.get(binding.id_field).ok_or_else(|| {
            AdminError::NotFound(format!("field #{} of {}", binding.id_field, binding.collection))
        })?;

        let value = serde_json::to_value(record)?;
        value
            .get(&field.name)
            .cloned()
            .ok_or_else(|| AdminError::NotFound(format!("{} on {}", field.name, binding.type_name)))
    }

    /// Serve one request
    pub async fn handle(&self, request: Request) -> Response {
        // ensure a valid database
        if self.database.is_none() {
            return self.renderer.error(&AdminError::SessionMissing);
        }

        let (parts, body) = request.into_parts();
        let mut base = BaseContext {
            prefix: self.prefix.clone(),
            action: None,
            session: None,
        };

        // strip off the prefix
        let Some(path) = parts.uri.path().strip_prefix(self.prefix.as_str()) else {
            debug!("{} is outside the admin prefix '{}'", parts.uri.path(), self.prefix);
            return self.renderer.not_found(&base);
        };
        // the bare mount point is the admin root
        let path = if path.is_empty() { "/" } else { path };

        let table = match self.route_table() {
            Ok(table) => table,
            Err(e) => {
                error!("admin cannot serve with its route configuration: {}", e);
                panic!("admin route configuration is invalid: {}", e);
            }
        };

        let Some((action, rest)) = table.resolve(path) else {
            return self.renderer.not_found(&base);
        };
        let rest = rest.to_string();
        debug!("{} {} -> {} '{}'", parts.method, parts.uri.path(), action, rest);

        base.action = Some(action);
        base.session = self
            .signer
            .as_deref()
            .and_then(|signer| AuthSession::from_request(signer, &parts.headers));

        if let Some(authorizer) = &self.authorizer {
            let auth_request = AuthRequest {
                action,
                method: &parts.method,
                path: &rest,
                session: base.session.as_ref(),
            };
            if !authorizer.authorize(&auth_request) {
                warn!("refused {} {} for {:?}", parts.method, parts.uri.path(), base.session.as_ref().map(|s| &s.username));
                return self.renderer.unauthorized(&base);
            }
        }

        let body = match read_body(body, self.max_body_bytes).await {
            Ok(body) => body,
            Err(e) => return self.renderer.error(&e),
        };

        let session = base.session.clone();
        let request = AdminRequest {
            action,
            method: parts.method,
            path: rest,
            uri: parts.uri,
            headers: parts.headers,
            body,
            base: base.clone(),
        };

        let mut response = match handler_for(action).handle(self, request).await {
            Ok(response) => response,
            Err(AdminError::NotFound(what)) | Err(AdminError::Database(DatabaseError::NotFound(what))) => {
                debug!("not found: {}", what);
                self.renderer.not_found(&base)
            }
            Err(e) => self.renderer.error(&e),
        };

        // Re-sign so the session stays alive while it is in use
        if let (Some(session), Some(signer)) = (&session, &self.signer) {
            if let Err(e) = session.attach(signer.as_ref(), response.headers_mut()) {
                error!("failed to refresh session for {}: {}", session.username, e);
                return self.renderer.error(&AdminError::Session(e));
            }
        }

        response
    }

    /// axum router that sends every request through `handle`
    pub fn router(self: Arc<Self>) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(self)
            .layer(TraceLayer::new_for_http())
    }
}

async fn dispatch(State(admin): State<Arc<Admin>>, request: Request) -> Response {
    admin.handle(request).await
}

/// Buffer a request body, refusing anything over `limit` bytes
async fn read_body(body: Body, limit: usize) -> Result<Bytes, AdminError> {
    let mut stream = body.into_data_stream();
    let mut buffer = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| AdminError::BadRequest(format!("failed to read request body: {}", e)))?;
        if buffer.len() + chunk.len() > limit {
            return Err(AdminError::PayloadTooLarge);
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(Bytes::from(buffer))
}

/// Configures an [`Admin`]
pub struct AdminBuilder {
    database: Option<Arc<dyn DatabaseSession>>,
    renderer: Option<Arc<dyn Renderer>>,
    authorizer: Option<Arc<dyn Authorizer>>,
    signer: Option<Arc<dyn Signer>>,
    routes: Option<RouteSpec>,
    prefix: String,
    max_body_bytes: usize,
    bindings: Vec<Binding>,
}

impl Default for AdminBuilder {
    fn default() -> Self {
        Self {
            database: None,
            renderer: None,
            authorizer: None,
            signer: None,
            routes: None,
            prefix: String::new(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            bindings: Vec::new(),
        }
    }
}

impl AdminBuilder {
    pub fn database(self, database: impl DatabaseSession + 'static) -> Self {
        self.shared_database(Arc::new(database))
    }

    pub fn shared_database(mut self, database: Arc<dyn DatabaseSession>) -> Self {
        self.database = Some(database);
        self
    }

    pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// Require every request to pass `authorizer`
    pub fn authorizer(mut self, authorizer: impl Authorizer + 'static) -> Self {
        self.authorizer = Some(Arc::new(authorizer));
        self
    }

    /// Signer for the `auth` session cookie
    pub fn signer(mut self, signer: impl Signer + 'static) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }

    pub fn routes(mut self, routes: RouteSpec) -> Self {
        self.routes = Some(routes);
        self
    }

    /// Path the admin is mounted under, e.g. `/admin`
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn bind_type<T: 'static>(mut self, id_field: usize, collection: CollectionKey) -> Self {
        self.bindings
            .push(Box::new(move |registry: &CollectionRegistry| registry.bind_type::<T>(id_field, collection)));
        self
    }

    pub fn register<T: AdminRecord>(self) -> Result<Self, AdminError> {
        let collection: CollectionKey = T::COLLECTION.parse()?;
        Ok(self.bind_type::<T>(T::ID_FIELD, collection))
    }

    pub fn build(self) -> Admin {
        let admin = Admin {
            database: self.database,
            renderer: self.renderer.unwrap_or_else(|| Arc::new(JsonRenderer)),
            authorizer: self.authorizer,
            signer: self.signer,
            routes: self.routes,
            prefix: self.prefix,
            max_body_bytes: self.max_body_bytes,
            route_table: OnceCell::new(),
            registry: OnceCell::new(),
            navigation: OnceCell::new(),
        };

        for binding in self.bindings {
            binding(admin.registry());
        }
        admin
    }
}
