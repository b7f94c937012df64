use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::QueryBuilder;

use super::{map_db_error, RecordApiRepository};
use crate::errors::{AppError, AppResult};
use crate::server::database::{with_pool, Database};
use crate::server::models::{RecordApi, RecordApiFilter, RecordApiKey};

const RECORD_COLUMNS: &str =
    "id, request_path, client_ip, status, referer, count, created_at, updated_at";

/// [`RecordApiRepository`] over the `record_apis` table.
#[derive(Debug, Clone)]
pub struct SqlRecordApiRepository {
    db: Arc<Database>,
}

impl SqlRecordApiRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecordApiRepository for SqlRecordApiRepository {
    async fn create(&self, key: &RecordApiKey) -> AppResult<RecordApi> {
        let now = Utc::now().naive_utc();

        with_pool!(self.db.as_ref(), |pool: Backend| {
            let mut qb = QueryBuilder::<Backend>::new(
                "INSERT INTO record_apis \
                 (request_path, client_ip, status, referer, count, created_at, updated_at) \
                 VALUES (",
            );
            qb.push_bind(key.request_path.as_str())
                .push(", ")
                .push_bind(key.client_ip.as_str())
                .push(", ")
                .push_bind(key.status)
                .push(", ")
                .push_bind(key.referer.as_str())
                .push(", 1, ")
                .push_bind(now)
                .push(", ")
                .push_bind(now)
                .push(") RETURNING ")
                .push(RECORD_COLUMNS);

            let row = qb.build_query_as::<RecordApi>().fetch_one(pool).await;
            row
        })
        .map_err(|e| map_db_error("create record", e))
    }

    async fn get_all(&self) -> AppResult<Vec<RecordApi>> {
        with_pool!(self.db.as_ref(), |pool: Backend| {
            let mut qb = QueryBuilder::<Backend>::new("SELECT ");
            qb.push(RECORD_COLUMNS)
                .push(" FROM record_apis ORDER BY request_path ASC, id ASC");

            let rows = qb.build_query_as::<RecordApi>().fetch_all(pool).await;
            rows
        })
        .map_err(|e| map_db_error("list records", e))
    }

    async fn get_by_model(&self, filter: &RecordApiFilter) -> AppResult<RecordApi> {
        let record = with_pool!(self.db.as_ref(), |pool: Backend| {
            let mut qb = QueryBuilder::<Backend>::new("SELECT ");
            qb.push(RECORD_COLUMNS).push(" FROM record_apis WHERE 1 = 1");
            if let Some(path) = &filter.request_path {
                qb.push(" AND request_path = ").push_bind(path.as_str());
            }
            if let Some(client_ip) = &filter.client_ip {
                qb.push(" AND client_ip = ").push_bind(client_ip.as_str());
            }
            if let Some(status) = filter.status {
                qb.push(" AND status = ").push_bind(status);
            }
            if let Some(referer) = &filter.referer {
                qb.push(" AND referer = ").push_bind(referer.as_str());
            }
            qb.push(" ORDER BY id LIMIT 1");

            let row = qb.build_query_as::<RecordApi>().fetch_optional(pool).await;
            row
        })
        .map_err(|e| map_db_error("find record", e))?;

        record.ok_or(AppError::NotFound)
    }

    async fn update_count(&self, record: &mut RecordApi) -> AppResult<()> {
        let now = Utc::now().naive_utc();
        let count = record.count + 1;

        with_pool!(self.db.as_ref(), |pool: Backend| {
            let mut qb = QueryBuilder::<Backend>::new("UPDATE record_apis SET count = ");
            qb.push_bind(count)
                .push(", updated_at = ")
                .push_bind(now)
                .push(" WHERE id = ")
                .push_bind(record.id);

            let result = qb.build().execute(pool).await;
            result.map(|_| ())
        })
        .map_err(|e| map_db_error("update record count", e))?;

        record.count = count;
        record.updated_at = now;
        Ok(())
    }

    /// Single `INSERT ... ON CONFLICT DO UPDATE` against the natural-key index,
    /// so concurrent identical visits land on one row.
    async fn record_visit(&self, key: &RecordApiKey) -> AppResult<RecordApi> {
        let now = Utc::now().naive_utc();

        with_pool!(self.db.as_ref(), |pool: Backend| {
            let mut qb = QueryBuilder::<Backend>::new(
                "INSERT INTO record_apis \
                 (request_path, client_ip, status, referer, count, created_at, updated_at) \
                 VALUES (",
            );
            qb.push_bind(key.request_path.as_str())
                .push(", ")
                .push_bind(key.client_ip.as_str())
                .push(", ")
                .push_bind(key.status)
                .push(", ")
                .push_bind(key.referer.as_str())
                .push(", 1, ")
                .push_bind(now)
                .push(", ")
                .push_bind(now)
                .push(
                    ") ON CONFLICT (request_path, client_ip, status, referer) DO UPDATE SET \
                     count = record_apis.count + 1, \
                     updated_at = excluded.updated_at \
                     RETURNING ",
                )
                .push(RECORD_COLUMNS);

            let row = qb.build_query_as::<RecordApi>().fetch_one(pool).await;
            row
        })
        .map_err(|e| map_db_error("record visit", e))
    }
}
