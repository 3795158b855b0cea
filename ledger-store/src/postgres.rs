//! PostgreSQL backend
//!
//! Documents live as JSONB rows keyed by UUID, one table per logical
//! collection, with a `seq` column preserving insert order for scans.
//! Every session runs inside one serializable transaction; serialization
//! failures and deadlocks surface as `Error::Conflict` so the caller can
//! retry, everything else as an infrastructure failure.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use common::error::{Error, Result};
use common::model::{ACCOUNTS_COLLECTION, ENTRIES_COLLECTION};

use crate::session::StoreSession;
use crate::store::StoreBackend;
use crate::{Document, Filter};

/// SQLSTATE for a serialization failure under SERIALIZABLE isolation
const SERIALIZATION_FAILURE: &str = "40001";
/// SQLSTATE for a deadlock detected by the server
const DEADLOCK_DETECTED: &str = "40P01";

/// Map a driver error onto the store failure taxonomy
fn classify(err: sqlx::Error) -> Error {
    if let sqlx::Error::Database(ref db_err) = err {
        if let Some(code) = db_err.code() {
            if code == SERIALIZATION_FAILURE || code == DEADLOCK_DETECTED {
                return Error::Conflict(format!("could not serialize transaction: {}", db_err));
            }
        }
    }

    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => Error::Unavailable(err.to_string()),
        other => Error::Database(other),
    }
}

/// Table backing a logical collection
fn table_name(collection: &str) -> Result<&'static str> {
    match collection {
        ACCOUNTS_COLLECTION => Ok("accounts"),
        ENTRIES_COLLECTION => Ok("ledger_entries"),
        other => Err(Error::ValidationError(format!(
            "unknown collection: {}",
            other
        ))),
    }
}

/// Render a filter as a WHERE clause, pushing bind values in order
fn filter_clause(filter: &Filter, binds: &mut Vec<String>) -> String {
    match filter {
        Filter::All => "TRUE".to_string(),
        Filter::Eq(field, value) => {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            binds.push(text);
            format!("doc->>'{}' = ${}", field, binds.len())
        }
        Filter::Or(filters) => {
            let parts: Vec<String> = filters
                .iter()
                .map(|nested| filter_clause(nested, binds))
                .collect();
            format!("({})", parts.join(" OR "))
        }
    }
}

/// PostgreSQL-backed document store
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to the database and bootstrap the schema
    pub async fn connect(database_url: &str, pool_size: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .connect(database_url)
            .await
            .map_err(classify)?;

        info!("Connected to PostgreSQL database");

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Wrap an existing pool, bootstrapping the schema
    pub async fn with_pool(pool: PgPool) -> Result<Self> {
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Create tables and indexes if they do not exist yet
    async fn ensure_schema(&self) -> Result<()> {
        let statements = [
            "CREATE TABLE IF NOT EXISTS accounts (
                seq BIGSERIAL,
                id UUID PRIMARY KEY,
                doc JSONB NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS ledger_entries (
                seq BIGSERIAL,
                id UUID PRIMARY KEY,
                doc JSONB NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_entries_source
                ON ledger_entries ((doc->>'source_account_id'))",
            "CREATE INDEX IF NOT EXISTS idx_entries_destination
                ON ledger_entries ((doc->>'destination_account_id'))",
            "CREATE INDEX IF NOT EXISTS idx_entries_correlation
                ON ledger_entries ((doc->>'correlation_id'))",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(classify)?;
        }

        debug!("Ledger schema is in place");
        Ok(())
    }
}

#[async_trait]
impl StoreBackend for PostgresStore {
    async fn begin(&self) -> Result<StoreSession> {
        let mut tx = self.pool.begin().await.map_err(classify)?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(classify)?;

        Ok(StoreSession::Postgres(PgSession { tx }))
    }

    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Document>> {
        let table = table_name(collection)?;
        let row = sqlx::query(&format!("SELECT doc FROM {} WHERE id = $1", table))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;

        Ok(row.map(|r| r.get("doc")))
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        let table = table_name(collection)?;
        let mut binds = Vec::new();
        let clause = filter_clause(filter, &mut binds);

        let sql = format!(
            "SELECT doc FROM {} WHERE {} ORDER BY seq",
            table, clause
        );
        let mut query = sqlx::query(&sql);
        for bind in &binds {
            query = query.bind(bind);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(classify)?;
        Ok(rows.iter().map(|row| row.get("doc")).collect())
    }
}

/// Session over one serializable PostgreSQL transaction
pub struct PgSession {
    tx: Transaction<'static, Postgres>,
}

impl PgSession {
    pub(crate) async fn find_by_id(
        &mut self,
        collection: &str,
        id: Uuid,
    ) -> Result<Option<Document>> {
        let table = table_name(collection)?;
        let row = sqlx::query(&format!("SELECT doc FROM {} WHERE id = $1", table))
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(classify)?;

        Ok(row.map(|r| r.get("doc")))
    }

    pub(crate) async fn insert_one(
        &mut self,
        collection: &str,
        id: Uuid,
        doc: Document,
    ) -> Result<()> {
        let table = table_name(collection)?;
        sqlx::query(&format!(
            "INSERT INTO {} (id, doc) VALUES ($1, $2)",
            table
        ))
        .bind(id)
        .bind(doc)
        .execute(&mut *self.tx)
        .await
        .map_err(classify)?;

        Ok(())
    }

    pub(crate) async fn replace_one(
        &mut self,
        collection: &str,
        id: Uuid,
        doc: Document,
    ) -> Result<()> {
        let table = table_name(collection)?;
        let result = sqlx::query(&format!("UPDATE {} SET doc = $2 WHERE id = $1", table))
            .bind(id)
            .bind(doc)
            .execute(&mut *self.tx)
            .await
            .map_err(classify)?;

        if result.rows_affected() == 0 {
            return Err(Error::Internal(format!(
                "document {} missing in {}",
                id, table
            )));
        }
        Ok(())
    }

    pub(crate) async fn commit(self) -> Result<()> {
        self.tx.commit().await.map_err(classify)
    }

    pub(crate) async fn rollback(self) -> Result<()> {
        self.tx.rollback().await.map_err(classify)
    }
}
