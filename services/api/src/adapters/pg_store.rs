//! services/api/src/adapters/pg_store.rs
//!
//! The PostgreSQL implementation of the `KeyValueStore` port. Each logical collection is
//! one JSONB row in `kv_store`, read and written whole.

use async_trait::async_trait;
use lexvault_core::ports::{Collection, KeyValueStore, PortError, PortResult};
use serde_json::Value;
use sqlx::{types::Json, FromRow, PgPool};
use tracing::error;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct PgKeyValueStore {
    pool: PgPool,
}

impl PgKeyValueStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled migrations.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct CollectionRecord {
    value: Json<Value>,
}

fn db_error(collection: Collection, e: sqlx::Error) -> PortError {
    error!(collection = collection.key(), "Database error: {}", e);
    PortError::Unexpected(format!(
        "Database error on collection '{}': {}",
        collection.key(),
        e
    ))
}

//=========================================================================================
// `KeyValueStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl KeyValueStore for PgKeyValueStore {
    async fn read(&self, collection: Collection) -> PortResult<Option<Value>> {
        let record = sqlx::query_as::<_, CollectionRecord>(
            "SELECT value FROM kv_store WHERE collection = $1",
        )
        .bind(collection.key())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error(collection, e))?;

        Ok(record.map(|r| r.value.0))
    }

    async fn write(&self, collection: Collection, value: Value) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO kv_store (collection, value, updated_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT (collection) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()",
        )
        .bind(collection.key())
        .bind(Json(value))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error(collection, e))?;
        Ok(())
    }
}
