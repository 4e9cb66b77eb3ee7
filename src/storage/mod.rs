use anyhow::{Context as _, Result};
use sqlx::{sqlite::SqliteConnectOptions, ConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};

/// Default timeout for individual SQLite queries.
/// Prevents hung queries from blocking a request indefinitely.
const QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Execute a future with the standard query timeout.
/// Returns an error if the operation takes longer than `QUERY_TIMEOUT`.
async fn with_timeout<T>(fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "database query timed out after {}s",
            QUERY_TIMEOUT.as_secs()
        )),
    }
}

/// One row of the `tasks` table.
///
/// Rows are produced by the external worker that mirrors the job queue into
/// SQLite; the view layer only reads them. `payload` holds the task input
/// variables as a JSON object. `task_form` is an optional custom form
/// template source; `form_fields` an optional JSON list of field descriptors
/// for the default form.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskRow {
    pub key: i64,
    pub payload: String,
    /// Creation time, epoch milliseconds.
    pub timestamp: i64,
    pub name: String,
    pub description: String,
    pub task_form: Option<String>,
    pub form_fields: Option<String>,
}

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        Self::new_with_slow_query(data_dir, 0).await
    }

    /// Create storage with slow-query logging enabled.
    ///
    /// `slow_query_ms` is the threshold in milliseconds — queries exceeding it
    /// are logged at WARN level. Set to 0 to disable slow-query logging.
    pub async fn new_with_slow_query(data_dir: &Path, slow_query_ms: u64) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("taskboard.db");
        let mut opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .create_if_missing(true);

        if slow_query_ms > 0 {
            opts = opts.log_slow_statements(
                log::LevelFilter::Warn,
                std::time::Duration::from_millis(slow_query_ms),
            );
        }

        let pool = SqlitePool::connect_with(opts).await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// Return a clone of the connection pool (cheap — Arc-backed).
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn migrate(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                key         INTEGER PRIMARY KEY,
                payload     TEXT NOT NULL DEFAULT '{}',
                timestamp   INTEGER NOT NULL,
                name        TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                task_form   TEXT,
                form_fields TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_timestamp ON tasks(timestamp);
            "#,
        )
        .execute(pool)
        .await
        .context("Creating tasks table")?;
        Ok(())
    }

    // ─── Read path (list view) ──────────────────────────────────────────────

    /// One page of tasks in key order (the external worker assigns keys in
    /// creation order).
    pub async fn list_page(&self, page: i64, size: i64) -> Result<Vec<TaskRow>> {
        let page = page.max(0);
        let size = size.max(1);
        let offset = page * size;
        with_timeout(async {
            Ok(
                sqlx::query_as("SELECT * FROM tasks ORDER BY key ASC LIMIT ? OFFSET ?")
                    .bind(size)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?,
            )
        })
        .await
    }

    pub async fn count(&self) -> Result<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 as u64)
    }

    pub async fn find(&self, key: i64) -> Result<Option<TaskRow>> {
        Ok(sqlx::query_as("SELECT * FROM tasks WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?)
    }

    // ─── Write path (external sync worker) ──────────────────────────────────

    /// Insert or refresh a task row. Called by the queue sync worker when a
    /// job is created or its payload changes.
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_task(
        &self,
        key: i64,
        payload: &str,
        timestamp: i64,
        name: &str,
        description: &str,
        task_form: Option<&str>,
        form_fields: Option<&str>,
    ) -> Result<TaskRow> {
        sqlx::query(
            "INSERT INTO tasks (key, payload, timestamp, name, description, task_form, form_fields)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
               payload = excluded.payload,
               timestamp = excluded.timestamp,
               name = excluded.name,
               description = excluded.description,
               task_form = excluded.task_form,
               form_fields = excluded.form_fields",
        )
        .bind(key)
        .bind(payload)
        .bind(timestamp)
        .bind(name)
        .bind(description)
        .bind(task_form)
        .bind(form_fields)
        .execute(&self.pool)
        .await?;
        self.find(key)
            .await?
            .ok_or_else(|| anyhow::anyhow!("task not found after insert"))
    }

    /// Remove a task row (job completed or cancelled upstream).
    pub async fn delete_task(&self, key: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
