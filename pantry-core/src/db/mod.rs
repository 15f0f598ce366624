//! Storage collaborator: a single owned SQLite connection shared by the
//! repositories and the unit of work.

mod food_repo;
mod pantry_item_repo;
mod unit_of_work;
mod value;

pub use food_repo::FoodRepository;
pub use pantry_item_repo::PantryItemRepository;
pub use unit_of_work::{TransactionState, UnitOfWork};
pub use value::SqlValue;

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{ConnectOptions, Connection, Executor, FromRow};
use std::path::Path;
use std::str::FromStr;
use tokio::sync::Mutex;

use crate::error::{PantryError, Result};
use value::to_arguments;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Outcome of a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunResult {
    pub last_insert_id: Option<i64>,
    pub rows_affected: u64,
}

#[derive(sqlx::FromRow)]
pub(crate) struct CountRow {
    pub count: i64,
}

/// A page of results plus the size of the unpaged result set.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

struct Connected {
    conn: SqliteConnection,
    in_transaction: bool,
}

pub struct Database {
    inner: Mutex<Option<Connected>>,
}

impl Database {
    /// Open (creating if needed) the database file and apply pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| PantryError::Storage(e.into()))?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .foreign_keys(true)
            .create_if_missing(true);
        let db = Self::connect(options).await?;
        tracing::info!(path = %path.display(), "opened pantry database");
        Ok(db)
    }

    /// A private in-memory database, mostly for tests.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        Self::connect(options).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self> {
        let mut conn = options.connect().await?;
        MIGRATOR.run(&mut conn).await?;
        Ok(Self {
            inner: Mutex::new(Some(Connected {
                conn,
                in_transaction: false,
            })),
        })
    }

    /// Close the connection. Later calls fail with a transaction state error.
    pub async fn close(&self) -> Result<()> {
        let mut guard = self.inner.lock().await;
        if let Some(connected) = guard.take() {
            if connected.in_transaction {
                tracing::warn!("closing database with an open transaction; it will be rolled back");
            }
            connected.conn.close().await?;
        }
        Ok(())
    }

    pub async fn is_open(&self) -> bool {
        self.inner.lock().await.is_some()
    }

    /// Run DDL or PRAGMA statements that return nothing.
    pub async fn execute(&self, sql: &str) -> Result<()> {
        let mut guard = self.inner.lock().await;
        let connected = connected(&mut guard)?;
        tracing::debug!(sql, "execute");
        connected.conn.execute(sql).await?;
        Ok(())
    }

    pub async fn run(&self, sql: &str, params: &[SqlValue]) -> Result<RunResult> {
        let mut guard = self.inner.lock().await;
        let connected = connected(&mut guard)?;
        tracing::debug!(sql, params = params.len(), "run");
        let result = sqlx::query_with(sql, to_arguments(params)?)
            .execute(&mut connected.conn)
            .await?;
        let last_insert_id = match result.last_insert_rowid() {
            0 => None,
            id => Some(id),
        };
        Ok(RunResult {
            last_insert_id,
            rows_affected: result.rows_affected(),
        })
    }

    pub async fn get_one<T>(&self, sql: &str, params: &[SqlValue]) -> Result<Option<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let mut guard = self.inner.lock().await;
        let connected = connected(&mut guard)?;
        tracing::debug!(sql, params = params.len(), "get_one");
        let row = sqlx::query_as_with::<_, T, _>(sql, to_arguments(params)?)
            .fetch_optional(&mut connected.conn)
            .await?;
        Ok(row)
    }

    pub async fn get_all<T>(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let mut guard = self.inner.lock().await;
        let connected = connected(&mut guard)?;
        tracing::debug!(sql, params = params.len(), "get_all");
        let rows = sqlx::query_as_with::<_, T, _>(sql, to_arguments(params)?)
            .fetch_all(&mut connected.conn)
            .await?;
        Ok(rows)
    }

    pub async fn begin_transaction(&self) -> Result<()> {
        let mut guard = self.inner.lock().await;
        let connected = connected(&mut guard)?;
        if connected.in_transaction {
            return Err(PantryError::TransactionState(
                "a transaction is already in progress".to_string(),
            ));
        }
        connected.conn.execute("BEGIN").await?;
        connected.in_transaction = true;
        Ok(())
    }

    pub async fn commit(&self) -> Result<()> {
        self.finish("COMMIT").await
    }

    pub async fn rollback(&self) -> Result<()> {
        self.finish("ROLLBACK").await
    }

    pub async fn in_transaction(&self) -> bool {
        match &*self.inner.lock().await {
            Some(connected) => connected.in_transaction,
            None => false,
        }
    }

    async fn finish(&self, statement: &str) -> Result<()> {
        let mut guard = self.inner.lock().await;
        let connected = connected(&mut guard)?;
        if !connected.in_transaction {
            return Err(PantryError::TransactionState(format!(
                "cannot {} without an active transaction",
                statement.to_lowercase()
            )));
        }
        let result = connected.conn.execute(statement).await;
        // A failed COMMIT can leave SQLite inside the transaction, so the
        // caller still owes a ROLLBACK.
        if result.is_ok() || statement == "ROLLBACK" {
            connected.in_transaction = false;
        }
        result?;
        Ok(())
    }
}

fn connected(guard: &mut Option<Connected>) -> Result<&mut Connected> {
    guard
        .as_mut()
        .ok_or_else(|| PantryError::TransactionState("database is closed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(sqlx::FromRow)]
    struct NameRow {
        name: String,
    }

    #[tokio::test]
    async fn test_open_creates_tables() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("test.db");

        let db = Database::open(&db_path).await.unwrap();

        let tables: Vec<NameRow> = db
            .get_all(
                "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
                &[],
            )
            .await
            .unwrap();

        let table_names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert!(table_names.contains(&"foods"));
        assert!(table_names.contains(&"pantry_items"));
        assert!(table_names.contains(&"_sqlx_migrations"));
    }

    #[tokio::test]
    async fn test_reopen_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db = Database::open(&db_path).await.unwrap();
        db.close().await.unwrap();

        let db = Database::open(&db_path).await.unwrap();
        let applied: Option<CountRow> = db
            .get_one("SELECT COUNT(*) AS count FROM _sqlx_migrations", &[])
            .await
            .unwrap();
        assert_eq!(applied.unwrap().count, MIGRATOR.iter().count() as i64);
    }

    #[tokio::test]
    async fn test_run_reports_rows_affected() {
        let db = Database::open_in_memory().await.unwrap();
        db.execute("CREATE TABLE scratch (id INTEGER PRIMARY KEY, name TEXT)")
            .await
            .unwrap();

        let result = db
            .run(
                "INSERT INTO scratch (name) VALUES (?)",
                &[SqlValue::from("one")],
            )
            .await
            .unwrap();
        assert_eq!(result.rows_affected, 1);
        assert_eq!(result.last_insert_id, Some(1));

        let result = db
            .run("DELETE FROM scratch WHERE name = ?", &[SqlValue::from("missing")])
            .await
            .unwrap();
        assert_eq!(result.rows_affected, 0);
    }

    #[tokio::test]
    async fn test_transaction_sequence_errors() {
        let db = Database::open_in_memory().await.unwrap();

        assert!(matches!(
            db.commit().await,
            Err(PantryError::TransactionState(_))
        ));
        assert!(matches!(
            db.rollback().await,
            Err(PantryError::TransactionState(_))
        ));

        db.begin_transaction().await.unwrap();
        assert!(db.in_transaction().await);
        assert!(matches!(
            db.begin_transaction().await,
            Err(PantryError::TransactionState(_))
        ));
        db.rollback().await.unwrap();
        assert!(!db.in_transaction().await);
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let db = Database::open_in_memory().await.unwrap();
        db.execute("CREATE TABLE scratch (name TEXT)").await.unwrap();

        db.begin_transaction().await.unwrap();
        db.run("INSERT INTO scratch (name) VALUES (?)", &[SqlValue::from("gone")])
            .await
            .unwrap();
        db.rollback().await.unwrap();

        let rows: Vec<NameRow> = db.get_all("SELECT name FROM scratch", &[]).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_closed_database_rejects_calls() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(db.is_open().await);
        db.close().await.unwrap();
        assert!(!db.is_open().await);
        assert!(matches!(
            db.execute("SELECT 1").await,
            Err(PantryError::TransactionState(_))
        ));
        // closing twice is fine
        db.close().await.unwrap();
    }
}
