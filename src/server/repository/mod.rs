//! Data access for farms, ponds and access-log records.
//!
//! Handlers only see the traits in this module (as `Arc<dyn ...>` in
//! [`AppState`](crate::server::handlers::AppState)); the `Sql*` types implement
//! them over the shared [`Database`](crate::server::database::Database).
//!
//! Every read excludes soft-deleted rows. Lookups that match nothing return
//! [`AppError::NotFound`]; listings that match nothing return an empty `Vec`.

use async_trait::async_trait;
use tracing::error;

use crate::errors::{AppError, AppResult};
use crate::server::models::{
    Farm, FarmFilter, NewFarm, NewPond, Pond, PondFilter, RecordApi, RecordApiFilter,
    RecordApiKey,
};

pub mod farm;
pub mod pond;
pub mod record_api;

pub use farm::SqlFarmRepository;
pub use pond::SqlPondRepository;
pub use record_api::SqlRecordApiRepository;

#[async_trait]
pub trait FarmRepository: Send + Sync {
    /// Insert a farm and return it with its assigned id and timestamps.
    async fn create(&self, new: NewFarm) -> AppResult<Farm>;

    /// All live farms ordered by id, each with its live ponds attached.
    async fn get_all(&self) -> AppResult<Vec<Farm>>;

    /// One live farm with its live ponds attached.
    async fn get_by_id(&self, id: i64) -> AppResult<Farm>;

    /// First live farm matching every populated filter field. Ponds are not attached.
    async fn get_by_model(&self, filter: &FarmFilter) -> AppResult<Farm>;

    /// Save every persisted field of `farm`, inserting it if the id is unknown.
    /// `created_at` of an existing row is kept and `updated_at` is refreshed.
    async fn update(&self, farm: &Farm) -> AppResult<()>;

    /// Soft-delete the farm together with its ponds.
    async fn delete(&self, farm: &Farm) -> AppResult<()>;
}

#[async_trait]
pub trait PondRepository: Send + Sync {
    async fn create(&self, new: NewPond) -> AppResult<Pond>;

    /// All live ponds ordered by id, each with its farm attached.
    async fn get_all(&self) -> AppResult<Vec<Pond>>;

    async fn get_by_id(&self, id: i64) -> AppResult<Pond>;

    async fn get_by_model(&self, filter: &PondFilter) -> AppResult<Pond>;

    async fn update(&self, pond: &Pond) -> AppResult<()>;

    async fn delete(&self, pond: &Pond) -> AppResult<()>;
}

#[async_trait]
pub trait RecordApiRepository: Send + Sync {
    /// Insert a counter row with `count = 1`.
    async fn create(&self, key: &RecordApiKey) -> AppResult<RecordApi>;

    /// All rows ordered by request path.
    async fn get_all(&self) -> AppResult<Vec<RecordApi>>;

    async fn get_by_model(&self, filter: &RecordApiFilter) -> AppResult<RecordApi>;

    /// Increment `record.count` and persist it.
    async fn update_count(&self, record: &mut RecordApi) -> AppResult<()>;

    /// Count one visit for `key`: increment the matching row or create it.
    ///
    /// The default is a lookup followed by a create or an increment, which can
    /// race. Implementations backed by a unique index should override it with
    /// a single atomic statement.
    async fn record_visit(&self, key: &RecordApiKey) -> AppResult<RecordApi> {
        match self.get_by_model(&RecordApiFilter::from(key)).await {
            Ok(mut record) => {
                self.update_count(&mut record).await?;
                Ok(record)
            }
            Err(AppError::NotFound) => self.create(key).await,
            Err(e) => Err(e),
        }
    }
}

/// Convert a driver error, logging everything except an empty result.
pub(crate) fn map_db_error(operation: &str, err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::RowNotFound => AppError::NotFound,
        other => {
            error!("{operation} failed: {other}");
            AppError::Database(other.to_string())
        }
    }
}
