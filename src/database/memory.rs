use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DatabaseError, DatabaseSession, Document, Page};
use crate::registry::{CollectionInfo, CollectionKey, FieldInfo};

struct MemoryCollection {
    fields: Vec<FieldInfo>,
    id_field: usize,
    documents: BTreeMap<String, Document>,
}

/// In-process database session, keyed by collection. Documents are kept in
/// identifier order.
#[derive(Default)]
pub struct MemorySession {
    collections: RwLock<HashMap<CollectionKey, MemoryCollection>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a collection before the session is shared
    pub fn with_collection(mut self, key: CollectionKey, fields: Vec<FieldInfo>, id_field: usize) -> Self {
        self.collections.get_mut().insert(
            key,
            MemoryCollection {
                fields,
                id_field,
                documents: BTreeMap::new(),
            },
        );
        self
    }

    fn id_name(info: &CollectionInfo) -> Result<&str, DatabaseError> {
        info.id_name()
            .ok_or_else(|| DatabaseError::QueryError(format!("{} has no identifier field", info.key)))
    }
}

/// Identifier values are compared in their textual form
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl DatabaseSession for MemorySession {
    async fn describe(&self, key: &CollectionKey) -> Result<CollectionInfo, DatabaseError> {
        let collections = self.collections.read().await;
        let collection = collections
            .get(key)
            .ok_or_else(|| DatabaseError::NotFound(format!("collection {}", key)))?;
        Ok(CollectionInfo::new(key.clone(), collection.fields.clone(), collection.id_field))
    }

    async fn list(&self, info: &CollectionInfo, page: Page) -> Result<Vec<Document>, DatabaseError> {
        let collections = self.collections.read().await;
        let collection = collections
            .get(&info.key)
            .ok_or_else(|| DatabaseError::NotFound(format!("collection {}", info.key)))?;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        Ok(collection
            .documents
            .values()
            .skip(offset)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn find(&self, info: &CollectionInfo, id: &str) -> Result<Option<Document>, DatabaseError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&info.key)
            .and_then(|c| c.documents.get(id))
            .cloned())
    }

    async fn find_by(
        &self,
        info: &CollectionInfo,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>, DatabaseError> {
        if !info.has_field(field) {
            return Err(DatabaseError::QueryError(format!("{} has no field {}", info.key, field)));
        }

        let collections = self.collections.read().await;
        Ok(collections.get(&info.key).and_then(|c| {
            c.documents
                .values()
                .find(|doc| doc.get(field).and_then(id_text).as_deref() == Some(value))
                .cloned()
        }))
    }

    async fn insert(&self, info: &CollectionInfo, mut document: Document) -> Result<Document, DatabaseError> {
        let id_name = Self::id_name(info)?.to_string();
        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(&info.key)
            .ok_or_else(|| DatabaseError::NotFound(format!("collection {}", info.key)))?;

        let id = match document.get(&id_name) {
            Some(value) => id_text(value)
                .ok_or_else(|| DatabaseError::QueryError(format!("unusable identifier {}", value)))?,
            None => {
                let id = Uuid::new_v4().to_string();
                document.insert(id_name, Value::String(id.clone()));
                id
            }
        };

        if collection.documents.contains_key(&id) {
            return Err(DatabaseError::QueryError(format!("duplicate identifier {}", id)));
        }
        collection.documents.insert(id, document.clone());
        Ok(document)
    }

    async fn update(
        &self,
        info: &CollectionInfo,
        id: &str,
        document: Document,
    ) -> Result<Option<Document>, DatabaseError> {
        let id_name = Self::id_name(info)?.to_string();
        let mut collections = self.collections.write().await;
        let Some(existing) = collections
            .get_mut(&info.key)
            .and_then(|c| c.documents.get_mut(id))
        else {
            return Ok(None);
        };

        // The identifier itself is not rewritable
        for (field, value) in document.into_iter().filter(|(field, _)| *field != id_name) {
            existing.insert(field, value);
        }
        Ok(Some(existing.clone()))
    }

    async fn delete(&self, info: &CollectionInfo, id: &str) -> Result<bool, DatabaseError> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(&info.key)
            .map(|c| c.documents.remove(id).is_some())
            .unwrap_or(false))
    }
}
