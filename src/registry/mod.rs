pub mod navigation;

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::AdminError;

pub use navigation::NavigationIndex;

/// Qualified `database.collection` name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionKey {
    database: String,
    collection: String,
}

impl CollectionKey {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Result<Self, AdminError> {
        let (database, collection) = (database.into(), collection.into());
        if database.is_empty() || collection.is_empty() || database.contains('.') || collection.contains('.') {
            return Err(AdminError::InvalidCollectionKey(format!("{}.{}", database, collection)));
        }
        Ok(Self { database, collection })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

impl FromStr for CollectionKey {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (database, collection) = s
            .split_once('.')
            .ok_or_else(|| AdminError::InvalidCollectionKey(s.to_string()))?;
        Self::new(database, collection).map_err(|_| AdminError::InvalidCollectionKey(s.to_string()))
    }
}

impl TryFrom<String> for CollectionKey {
    type Error = AdminError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CollectionKey> for String {
    fn from(key: CollectionKey) -> Self {
        key.to_string()
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// A single introspected field of a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
        }
    }

    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Introspected metadata for one collection. Never changes once cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub key: CollectionKey,
    pub fields: Vec<FieldInfo>,
    /// Index into `fields` of the identifier field
    pub id_field: usize,
}

impl CollectionInfo {
    pub fn new(key: CollectionKey, fields: Vec<FieldInfo>, id_field: usize) -> Self {
        Self { key, fields, id_field }
    }

    pub fn id_name(&self) -> Option<&str> {
        self.fields.get(self.id_field).map(|f| f.name.as_str())
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }
}

/// Where a record type lives and which field identifies it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeBinding {
    pub type_name: &'static str,
    pub id_field: usize,
    pub collection: CollectionKey,
}

/// Record types that know their own collection
pub trait AdminRecord: 'static {
    const COLLECTION: &'static str;
    const ID_FIELD: usize;
}

/// Collection metadata and type bindings, shared by every request
#[derive(Debug, Default)]
pub struct CollectionRegistry {
    collections: RwLock<HashMap<CollectionKey, Arc<CollectionInfo>>>,
    types: RwLock<HashMap<TypeId, TypeBinding>>,
}

impl CollectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached metadata for a collection, if it has been introspected
    pub fn resolve(&self, key: &CollectionKey) -> Option<Arc<CollectionInfo>> {
        self.collections
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    /// Cache metadata. The first insert for a key wins and is returned.
    pub fn insert(&self, info: CollectionInfo) -> Arc<CollectionInfo> {
        let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());
        collections
            .entry(info.key.clone())
            .or_insert_with(|| Arc::new(info))
            .clone()
    }

    /// Snapshot of all cached collection keys
    pub fn keys(&self) -> Vec<CollectionKey> {
        self.collections
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    /// Bind a record type to a collection. Rebinding a type replaces the
    /// previous binding.
    pub fn bind_type<T: 'static>(&self, id_field: usize, collection: CollectionKey) {
        let binding = TypeBinding {
            type_name: type_name::<T>(),
            id_field,
            collection,
        };
        tracing::debug!("binding {} to {}", binding.type_name, binding.collection);
        self.types
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(TypeId::of::<T>(), binding);
    }

    /// Bind a record type using its own declared collection
    pub fn register<T: AdminRecord>(&self) -> Result<(), AdminError> {
        let collection: CollectionKey = T::COLLECTION.parse()?;
        self.bind_type::<T>(T::ID_FIELD, collection);
        Ok(())
    }

    pub fn type_binding<T: 'static>(&self) -> Option<TypeBinding> {
        self.types
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&TypeId::of::<T>())
            .cloned()
    }

    /// Collection a record type is bound to; `None` means the type was never
    /// registered, which callers treat as a configuration error
    pub fn type_collection<T: 'static>(&self) -> Option<CollectionKey> {
        self.type_binding::<T>().map(|b| b.collection)
    }
}
