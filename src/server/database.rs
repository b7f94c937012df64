use std::sync::Arc;
use tracing::{error, info};

#[cfg(feature = "sqlite")]
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

#[cfg(feature = "postgres")]
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::{get_config, DatabaseConfig};
use crate::errors::{AppError, AppResult};

/// Unified database abstraction over SQLite and Postgres.
///
/// Available variants depend on enabled features:
/// - `sqlite` feature enables `Database::SQLite`
/// - `postgres` feature enables `Database::Postgres`
#[derive(Debug, Clone)]
pub enum Database {
    #[cfg(feature = "sqlite")]
    SQLite(SqlitePool),
    #[cfg(feature = "postgres")]
    Postgres(PgPool),
}

/// Run `$body` once per compiled-in backend with `$pool` bound to the concrete
/// pool and `$backend` aliased to the matching `sqlx::Database`.
///
/// Queries built inside the body with `QueryBuilder::<$backend>` and `push_bind`
/// get the right placeholder syntax for each backend.
macro_rules! with_pool {
    ($db:expr, |$pool:ident: $backend:ident| $body:expr) => {
        match $db {
            #[cfg(feature = "sqlite")]
            $crate::server::database::Database::SQLite($pool) => {
                #[allow(dead_code)]
                type $backend = ::sqlx::Sqlite;
                $body
            }
            #[cfg(feature = "postgres")]
            $crate::server::database::Database::Postgres($pool) => {
                #[allow(dead_code)]
                type $backend = ::sqlx::Postgres;
                $body
            }
        }
    };
}

pub(crate) use with_pool;

#[cfg(feature = "sqlite")]
const SQLITE_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS farms (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        VARCHAR(100) NOT NULL,
        created_at  DATETIME NOT NULL,
        updated_at  DATETIME NOT NULL,
        deleted_at  DATETIME NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ponds (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        VARCHAR(100) NOT NULL,
        farm_id     INTEGER NOT NULL REFERENCES farms(id) ON UPDATE CASCADE ON DELETE CASCADE,
        created_at  DATETIME NOT NULL,
        updated_at  DATETIME NOT NULL,
        deleted_at  DATETIME NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_ponds_farm_id ON ponds (farm_id)",
    r#"
    CREATE TABLE IF NOT EXISTS record_apis (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        request_path  TEXT NOT NULL,
        client_ip     TEXT NOT NULL,
        status        INTEGER NOT NULL,
        referer       TEXT NOT NULL DEFAULT '',
        count         INTEGER NOT NULL DEFAULT 1,
        created_at    DATETIME NOT NULL,
        updated_at    DATETIME NOT NULL
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_record_apis_visit
        ON record_apis (request_path, client_ip, status, referer)
    "#,
];

#[cfg(feature = "postgres")]
const POSTGRES_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS farms (
        id          BIGSERIAL PRIMARY KEY,
        name        VARCHAR(100) NOT NULL,
        created_at  TIMESTAMP NOT NULL,
        updated_at  TIMESTAMP NOT NULL,
        deleted_at  TIMESTAMP NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ponds (
        id          BIGSERIAL PRIMARY KEY,
        name        VARCHAR(100) NOT NULL,
        farm_id     BIGINT NOT NULL REFERENCES farms(id) ON UPDATE CASCADE ON DELETE CASCADE,
        created_at  TIMESTAMP NOT NULL,
        updated_at  TIMESTAMP NOT NULL,
        deleted_at  TIMESTAMP NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_ponds_farm_id ON ponds (farm_id)",
    r#"
    CREATE TABLE IF NOT EXISTS record_apis (
        id            BIGSERIAL PRIMARY KEY,
        request_path  TEXT NOT NULL,
        client_ip     TEXT NOT NULL,
        status        INTEGER NOT NULL,
        referer       TEXT NOT NULL DEFAULT '',
        count         BIGINT NOT NULL DEFAULT 1,
        created_at    TIMESTAMP NOT NULL,
        updated_at    TIMESTAMP NOT NULL
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_record_apis_visit
        ON record_apis (request_path, client_ip, status, referer)
    "#,
];

impl Database {
    /// Initialize the database connection based on configuration.
    ///
    /// Uses the global configuration from `config.toml` and environment variables.
    /// See `crate::config` for configuration options.
    pub async fn new() -> AppResult<Arc<Self>> {
        let config = get_config()?;
        Ok(Arc::new(Self::connect(&config.database).await?))
    }

    /// Open a pool for the backend named by `db_config.db_type`, sized from the config.
    pub async fn connect(db_config: &DatabaseConfig) -> AppResult<Self> {
        match db_config.db_type.as_str() {
            #[cfg(feature = "sqlite")]
            "sqlite" => {
                let pool = SqlitePoolOptions::new()
                    .max_connections(db_config.max_open_conns)
                    .min_connections(db_config.max_idle_conns)
                    .max_lifetime(db_config.max_lifetime())
                    .connect(db_config.url())
                    .await
                    .map_err(|e| {
                        error!("Failed to connect to SQLite: {e}");
                        AppError::Database(format!("failed to connect to SQLite: {e}"))
                    })?;

                Ok(Database::SQLite(pool))
            }
            #[cfg(not(feature = "sqlite"))]
            "sqlite" => Err(AppError::Config(
                "SQLite support not compiled in. Enable the 'sqlite' feature.".to_string(),
            )),
            #[cfg(feature = "postgres")]
            "postgres" => {
                let pool = PgPoolOptions::new()
                    .max_connections(db_config.max_open_conns)
                    .min_connections(db_config.max_idle_conns)
                    .max_lifetime(db_config.max_lifetime())
                    .connect(db_config.url())
                    .await
                    .map_err(|e| {
                        error!("Failed to connect to PostgreSQL: {e}");
                        AppError::Database(format!("failed to connect to PostgreSQL: {e}"))
                    })?;

                Ok(Database::Postgres(pool))
            }
            #[cfg(not(feature = "postgres"))]
            "postgres" => Err(AppError::Config(
                "PostgreSQL support not compiled in. Enable the 'postgres' feature.".to_string(),
            )),
            other => Err(AppError::Config(format!(
                "unsupported database type: {other}"
            ))),
        }
    }

    /// Create the `farms`, `ponds` and `record_apis` tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> AppResult<()> {
        match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => {
                for statement in SQLITE_SCHEMA {
                    sqlx::query(statement).execute(pool).await.map_err(|e| {
                        error!("SQLite schema creation failed: {e}");
                        AppError::Database(format!("schema creation failed: {e}"))
                    })?;
                }
            }
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => {
                for statement in POSTGRES_SCHEMA {
                    sqlx::query(statement).execute(pool).await.map_err(|e| {
                        error!("Postgres schema creation failed: {e}");
                        AppError::Database(format!("schema creation failed: {e}"))
                    })?;
                }
            }
        }

        info!(db_type = self.db_type(), "Database schema ready");
        Ok(())
    }

    /// Round-trip a trivial query; used by the health endpoint.
    pub async fn ping(&self) -> bool {
        let result = with_pool!(self, |pool: _Backend| {
            sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
        });

        result.is_ok()
    }

    pub fn db_type(&self) -> &'static str {
        match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(_) => "sqlite",
            #[cfg(feature = "postgres")]
            Database::Postgres(_) => "postgres",
        }
    }
}
