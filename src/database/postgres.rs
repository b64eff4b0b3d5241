use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use tracing::info;

use super::{DatabaseError, DatabaseSession, Document, Page};
use crate::registry::{CollectionInfo, CollectionKey, FieldInfo};

/// PostgreSQL session. A collection key `schema.table` addresses a table
/// inside a Postgres schema.
#[derive(Clone)]
pub struct PgSession {
    pool: PgPool,
}

impl PgSession {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        connection_timeout: Duration,
    ) -> Result<Self, DatabaseError> {
        let url = url::Url::parse(database_url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(connection_timeout)
            .connect(database_url)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        info!(
            "Connected to {}{}",
            url.host_str().unwrap_or("localhost"),
            url.path()
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Quote SQL identifier to prevent injection
    fn quote_identifier(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn table(key: &CollectionKey) -> String {
        format!(
            "{}.{}",
            Self::quote_identifier(key.database()),
            Self::quote_identifier(key.collection())
        )
    }

    fn id_column(info: &CollectionInfo) -> Result<String, DatabaseError> {
        info.id_name()
            .map(Self::quote_identifier)
            .ok_or_else(|| DatabaseError::QueryError(format!("{} has no identifier field", info.key)))
    }

    /// Quoted columns of `document` that exist in the collection. Unknown keys
    /// are dropped rather than interpolated.
    fn writable_columns(info: &CollectionInfo, document: &Document, skip_id: bool) -> Vec<String> {
        let id_name = info.id_name();
        info.fields
            .iter()
            .filter(|f| document.contains_key(&f.name))
            .filter(|f| !(skip_id && Some(f.name.as_str()) == id_name))
            .map(|f| Self::quote_identifier(&f.name))
            .collect()
    }

    fn into_document(value: Value) -> Result<Document, DatabaseError> {
        match value {
            Value::Object(map) => Ok(map),
            other => Err(DatabaseError::QueryError(format!("expected a row object, got {}", other))),
        }
    }
}

#[async_trait]
impl DatabaseSession for PgSession {
    async fn describe(&self, key: &CollectionKey) -> Result<CollectionInfo, DatabaseError> {
        let columns: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT column_name::text, data_type::text, is_nullable::text \
             FROM information_schema.columns \
             WHERE table_schema = $1 AND table_name = $2 \
             ORDER BY ordinal_position",
        )
        .bind(key.database())
        .bind(key.collection())
        .fetch_all(&self.pool)
        .await?;

        if columns.is_empty() {
            return Err(DatabaseError::NotFound(format!("collection {}", key)));
        }

        let primary: Option<String> = sqlx::query_scalar(
            "SELECT a.attname::text FROM pg_index i \
             JOIN pg_attribute a ON a.attrelid = i.indrelid AND a.attnum = ANY(i.indkey) \
             WHERE i.indrelid = $1::regclass AND i.indisprimary \
             LIMIT 1",
        )
        .bind(Self::table(key))
        .fetch_optional(&self.pool)
        .await?;

        let fields: Vec<FieldInfo> = columns
            .into_iter()
            .map(|(name, data_type, nullable)| FieldInfo {
                name,
                data_type,
                nullable: nullable == "YES",
            })
            .collect();

        // Fall back to a column named "id", then to the first column
        let id_field = primary
            .as_deref()
            .or(Some("id"))
            .and_then(|name| fields.iter().position(|f| f.name == name))
            .unwrap_or(0);

        Ok(CollectionInfo::new(key.clone(), fields, id_field))
    }

    async fn list(&self, info: &CollectionInfo, page: Page) -> Result<Vec<Document>, DatabaseError> {
        let sql = format!(
            "SELECT row_to_json(t) FROM {} t ORDER BY t.{} LIMIT $1 OFFSET $2",
            Self::table(&info.key),
            Self::id_column(info)?
        );
        let rows: Vec<Json<Value>> = sqlx::query_scalar(&sql)
            .bind(i64::from(page.limit))
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(|Json(row)| Self::into_document(row)).collect()
    }

    async fn find(&self, info: &CollectionInfo, id: &str) -> Result<Option<Document>, DatabaseError> {
        let sql = format!(
            "SELECT row_to_json(t) FROM {} t WHERE t.{}::text = $1",
            Self::table(&info.key),
            Self::id_column(info)?
        );
        let row: Option<Json<Value>> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|Json(row)| Self::into_document(row)).transpose()
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

        let sql = format!(
            "SELECT row_to_json(t) FROM {} t WHERE t.{}::text = $1 LIMIT 1",
            Self::table(&info.key),
            Self::quote_identifier(field)
        );
        let row: Option<Json<Value>> = sqlx::query_scalar(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|Json(row)| Self::into_document(row)).transpose()
    }

    async fn insert(&self, info: &CollectionInfo, document: Document) -> Result<Document, DatabaseError> {
        let table = Self::table(&info.key);
        let columns = Self::writable_columns(info, &document, false);

        let sql = if columns.is_empty() {
            format!("INSERT INTO {} AS t DEFAULT VALUES RETURNING row_to_json(t)", table)
        } else {
            let list = columns.join(", ");
            format!(
                "INSERT INTO {table} AS t ({list}) \
                 SELECT {list} FROM jsonb_populate_record(NULL::{table}, $1) \
                 RETURNING row_to_json(t)"
            )
        };

        let Json(row): Json<Value> = sqlx::query_scalar(&sql)
            .bind(Json(Value::Object(document)))
            .fetch_one(&self.pool)
            .await?;
        Self::into_document(row)
    }

    async fn update(
        &self,
        info: &CollectionInfo,
        id: &str,
        document: Document,
    ) -> Result<Option<Document>, DatabaseError> {
        let table = Self::table(&info.key);
        let columns = Self::writable_columns(info, &document, true);
        if columns.is_empty() {
            return self.find(info, id).await;
        }

        let list = columns.join(", ");
        let sql = format!(
            "UPDATE {table} AS t SET ({list}) = \
             (SELECT {list} FROM jsonb_populate_record(NULL::{table}, $1)) \
             WHERE t.{id}::text = $2 \
             RETURNING row_to_json(t)",
            id = Self::id_column(info)?
        );

        let row: Option<Json<Value>> = sqlx::query_scalar(&sql)
            .bind(Json(Value::Object(document)))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|Json(row)| Self::into_document(row)).transpose()
    }

    async fn delete(&self, info: &CollectionInfo, id: &str) -> Result<bool, DatabaseError> {
        let sql = format!(
            "DELETE FROM {} t WHERE t.{}::text = $1",
            Self::table(&info.key),
            Self::id_column(info)?
        );
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Pings the pool to ensure connectivity
    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
