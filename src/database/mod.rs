pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::registry::{CollectionInfo, CollectionKey};

pub use memory::MemorySession;
pub use postgres::PgSession;

/// A stored record as a JSON object
pub type Document = Map<String, Value>;

/// Errors from database sessions
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Pagination for collection listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Zero-based page number
    #[serde(default)]
    pub page: u32,
    #[serde(default = "Page::default_limit")]
    pub limit: u32,
}

impl Page {
    pub const MAX_LIMIT: u32 = 100;

    fn default_limit() -> u32 {
        20
    }

    /// Clamp the limit into `1..=MAX_LIMIT`
    pub fn clamped(self) -> Self {
        Self {
            page: self.page,
            limit: self.limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 0,
            limit: Self::default_limit(),
        }
    }
}

/// Live connection to the database the admin manages. Implementations must be
/// safe to query from many requests at once.
#[async_trait]
pub trait DatabaseSession: Send + Sync {
    /// Introspect a collection's fields and identifier
    async fn describe(&self, key: &CollectionKey) -> Result<CollectionInfo, DatabaseError>;

    async fn list(&self, info: &CollectionInfo, page: Page) -> Result<Vec<Document>, DatabaseError>;

    async fn find(&self, info: &CollectionInfo, id: &str) -> Result<Option<Document>, DatabaseError>;

    /// First document whose `field` has the textual value `value`
    async fn find_by(
        &self,
        info: &CollectionInfo,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>, DatabaseError>;

    /// Insert a document and return it as stored
    async fn insert(&self, info: &CollectionInfo, document: Document) -> Result<Document, DatabaseError>;

    /// Apply the given fields to an existing document; `None` if it does not exist
    async fn update(
        &self,
        info: &CollectionInfo,
        id: &str,
        document: Document,
    ) -> Result<Option<Document>, DatabaseError>;

    /// Remove a document; `false` if it did not exist
    async fn delete(&self, info: &CollectionInfo, id: &str) -> Result<bool, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
