use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::QueryBuilder;

use super::{map_db_error, PondRepository};
use crate::errors::{AppError, AppResult};
use crate::server::database::{with_pool, Database};
use crate::server::models::{FarmSummary, NewPond, Pond, PondFilter};

const POND_COLUMNS: &str = "id, name, farm_id, created_at, updated_at, deleted_at";

/// [`PondRepository`] over the `ponds` table.
#[derive(Debug, Clone)]
pub struct SqlPondRepository {
    db: Arc<Database>,
}

impl SqlPondRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Fill `farm` on each pond from the `farms` table.
    async fn attach_farms(&self, ponds: &mut [Pond]) -> AppResult<()> {
        if ponds.is_empty() {
            return Ok(());
        }

        let mut farm_ids: Vec<i64> = ponds.iter().map(|p| p.farm_id).collect();
        farm_ids.sort_unstable();
        farm_ids.dedup();

        let farms = with_pool!(self.db.as_ref(), |pool: Backend| {
            let mut qb = QueryBuilder::<Backend>::new(
                "SELECT id, name, created_at, updated_at FROM farms WHERE id IN (",
            );
            let mut ids = qb.separated(", ");
            for id in &farm_ids {
                ids.push_bind(*id);
            }
            ids.push_unseparated(")");

            let rows = qb.build_query_as::<FarmSummary>().fetch_all(pool).await;
            rows
        })
        .map_err(|e| map_db_error("load pond farms", e))?;

        let by_id: HashMap<i64, FarmSummary> = farms.into_iter().map(|f| (f.id, f)).collect();
        for pond in ponds.iter_mut() {
            pond.farm = by_id.get(&pond.farm_id).cloned();
        }

        Ok(())
    }
}

#[async_trait]
impl PondRepository for SqlPondRepository {
    async fn create(&self, new: NewPond) -> AppResult<Pond> {
        let now = Utc::now().naive_utc();

        with_pool!(self.db.as_ref(), |pool: Backend| {
            let mut qb = QueryBuilder::<Backend>::new(
                "INSERT INTO ponds (name, farm_id, created_at, updated_at) VALUES (",
            );
            qb.push_bind(new.name.as_str())
                .push(", ")
                .push_bind(new.farm_id)
                .push(", ")
                .push_bind(now)
                .push(", ")
                .push_bind(now)
                .push(") RETURNING ")
                .push(POND_COLUMNS);

            let row = qb.build_query_as::<Pond>().fetch_one(pool).await;
            row
        })
        .map_err(|e| map_db_error("create pond", e))
    }

    async fn get_all(&self) -> AppResult<Vec<Pond>> {
        let mut ponds = with_pool!(self.db.as_ref(), |pool: Backend| {
            let mut qb = QueryBuilder::<Backend>::new("SELECT ");
            qb.push(POND_COLUMNS)
                .push(" FROM ponds WHERE deleted_at IS NULL ORDER BY id");

            let rows = qb.build_query_as::<Pond>().fetch_all(pool).await;
            rows
        })
        .map_err(|e| map_db_error("list ponds", e))?;

        self.attach_farms(&mut ponds).await?;
        Ok(ponds)
    }

    async fn get_by_id(&self, id: i64) -> AppResult<Pond> {
        let pond = with_pool!(self.db.as_ref(), |pool: Backend| {
            let mut qb = QueryBuilder::<Backend>::new("SELECT ");
            qb.push(POND_COLUMNS)
                .push(" FROM ponds WHERE deleted_at IS NULL AND id = ")
                .push_bind(id);

            let row = qb.build_query_as::<Pond>().fetch_optional(pool).await;
            row
        })
        .map_err(|e| map_db_error("get pond", e))?;

        let mut pond = pond.ok_or(AppError::NotFound)?;
        self.attach_farms(std::slice::from_mut(&mut pond)).await?;
        Ok(pond)
    }

    async fn get_by_model(&self, filter: &PondFilter) -> AppResult<Pond> {
        let pond = with_pool!(self.db.as_ref(), |pool: Backend| {
            let mut qb = QueryBuilder::<Backend>::new("SELECT ");
            qb.push(POND_COLUMNS)
                .push(" FROM ponds WHERE deleted_at IS NULL");
            if let Some(id) = filter.id {
                qb.push(" AND id = ").push_bind(id);
            }
            if let Some(name) = &filter.name {
                qb.push(" AND name = ").push_bind(name.as_str());
            }
            if let Some(farm_id) = filter.farm_id {
                qb.push(" AND farm_id = ").push_bind(farm_id);
            }
            qb.push(" ORDER BY id LIMIT 1");

            let row = qb.build_query_as::<Pond>().fetch_optional(pool).await;
            row
        })
        .map_err(|e| map_db_error("find pond", e))?;

        pond.ok_or(AppError::NotFound)
    }

    async fn update(&self, pond: &Pond) -> AppResult<()> {
        let now = Utc::now().naive_utc();

        with_pool!(self.db.as_ref(), |pool: Backend| {
            let mut qb = QueryBuilder::<Backend>::new(
                "INSERT INTO ponds (id, name, farm_id, created_at, updated_at, deleted_at) VALUES (",
            );
            qb.push_bind(pond.id)
                .push(", ")
                .push_bind(pond.name.as_str())
                .push(", ")
                .push_bind(pond.farm_id)
                .push(", ")
                .push_bind(pond.created_at)
                .push(", ")
                .push_bind(now)
                .push(", ")
                .push_bind(pond.deleted_at)
                .push(
                    ") ON CONFLICT (id) DO UPDATE SET \
                     name = excluded.name, \
                     farm_id = excluded.farm_id, \
                     updated_at = excluded.updated_at, \
                     deleted_at = excluded.deleted_at",
                );

            let result = qb.build().execute(pool).await;
            result.map(|_| ())
        })
        .map_err(|e| map_db_error("update pond", e))
    }

    async fn delete(&self, pond: &Pond) -> AppResult<()> {
        let now = Utc::now().naive_utc();

        with_pool!(self.db.as_ref(), |pool: Backend| {
            let mut qb = QueryBuilder::<Backend>::new("UPDATE ponds SET deleted_at = ");
            qb.push_bind(now)
                .push(" WHERE deleted_at IS NULL AND id = ")
                .push_bind(pond.id);

            let result = qb.build().execute(pool).await;
            result.map(|_| ())
        })
        .map_err(|e| map_db_error("delete pond", e))
    }
}
