use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::QueryBuilder;

use super::{map_db_error, FarmRepository};
use crate::errors::{AppError, AppResult};
use crate::server::database::{with_pool, Database};
use crate::server::models::{Farm, FarmFilter, NewFarm, PondSummary};

const FARM_COLUMNS: &str = "id, name, created_at, updated_at, deleted_at";

/// [`FarmRepository`] over the `farms` and `ponds` tables.
#[derive(Debug, Clone)]
pub struct SqlFarmRepository {
    db: Arc<Database>,
}

impl SqlFarmRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Fill `ponds` on each farm with its live ponds, ordered by id.
    async fn attach_ponds(&self, farms: &mut [Farm]) -> AppResult<()> {
        if farms.is_empty() {
            return Ok(());
        }

        let ponds = with_pool!(self.db.as_ref(), |pool: Backend| {
            let mut qb = QueryBuilder::<Backend>::new(
                "SELECT id, name, farm_id, created_at, updated_at FROM ponds \
                 WHERE deleted_at IS NULL AND farm_id IN (",
            );
            let mut ids = qb.separated(", ");
            for farm in farms.iter() {
                ids.push_bind(farm.id);
            }
            ids.push_unseparated(") ORDER BY id");

            let rows = qb.build_query_as::<PondSummary>().fetch_all(pool).await;
            rows
        })
        .map_err(|e| map_db_error("load farm ponds", e))?;

        let mut by_farm: HashMap<i64, Vec<PondSummary>> = HashMap::new();
        for pond in ponds {
            by_farm.entry(pond.farm_id).or_default().push(pond);
        }
        for farm in farms.iter_mut() {
            farm.ponds = by_farm.remove(&farm.id).unwrap_or_default();
        }

        Ok(())
    }
}

#[async_trait]
impl FarmRepository for SqlFarmRepository {
    async fn create(&self, new: NewFarm) -> AppResult<Farm> {
        let now = Utc::now().naive_utc();

        with_pool!(self.db.as_ref(), |pool: Backend| {
            let mut qb = QueryBuilder::<Backend>::new(
                "INSERT INTO farms (name, created_at, updated_at) VALUES (",
            );
            qb.push_bind(new.name.as_str())
                .push(", ")
                .push_bind(now)
                .push(", ")
                .push_bind(now)
                .push(") RETURNING ")
                .push(FARM_COLUMNS);

            let row = qb.build_query_as::<Farm>().fetch_one(pool).await;
            row
        })
        .map_err(|e| map_db_error("create farm", e))
    }

    async fn get_all(&self) -> AppResult<Vec<Farm>> {
        let mut farms = with_pool!(self.db.as_ref(), |pool: Backend| {
            let mut qb = QueryBuilder::<Backend>::new("SELECT ");
            qb.push(FARM_COLUMNS)
                .push(" FROM farms WHERE deleted_at IS NULL ORDER BY id");

            let rows = qb.build_query_as::<Farm>().fetch_all(pool).await;
            rows
        })
        .map_err(|e| map_db_error("list farms", e))?;

        self.attach_ponds(&mut farms).await?;
        Ok(farms)
    }

    async fn get_by_id(&self, id: i64) -> AppResult<Farm> {
        let farm = with_pool!(self.db.as_ref(), |pool: Backend| {
            let mut qb = QueryBuilder::<Backend>::new("SELECT ");
            qb.push(FARM_COLUMNS)
                .push(" FROM farms WHERE deleted_at IS NULL AND id = ")
                .push_bind(id);

            let row = qb.build_query_as::<Farm>().fetch_optional(pool).await;
            row
        })
        .map_err(|e| map_db_error("get farm", e))?;

        let mut farm = farm.ok_or(AppError::NotFound)?;
        self.attach_ponds(std::slice::from_mut(&mut farm)).await?;
        Ok(farm)
    }

    async fn get_by_model(&self, filter: &FarmFilter) -> AppResult<Farm> {
        let farm = with_pool!(self.db.as_ref(), |pool: Backend| {
            let mut qb = QueryBuilder::<Backend>::new("SELECT ");
            qb.push(FARM_COLUMNS)
                .push(" FROM farms WHERE deleted_at IS NULL");
            if let Some(id) = filter.id {
                qb.push(" AND id = ").push_bind(id);
            }
            if let Some(name) = &filter.name {
                qb.push(" AND name = ").push_bind(name.as_str());
            }
            qb.push(" ORDER BY id LIMIT 1");

            let row = qb.build_query_as::<Farm>().fetch_optional(pool).await;
            row
        })
        .map_err(|e| map_db_error("find farm", e))?;

        farm.ok_or(AppError::NotFound)
    }

    async fn update(&self, farm: &Farm) -> AppResult<()> {
        let now = Utc::now().naive_utc();

        with_pool!(self.db.as_ref(), |pool: Backend| {
            let mut qb = QueryBuilder::<Backend>::new(
                "INSERT INTO farms (id, name, created_at, updated_at, deleted_at) VALUES (",
            );
            qb.push_bind(farm.id)
                .push(", ")
                .push_bind(farm.name.as_str())
                .push(", ")
                .push_bind(farm.created_at)
                .push(", ")
                .push_bind(now)
                .push(", ")
                .push_bind(farm.deleted_at)
                .push(
                    ") ON CONFLICT (id) DO UPDATE SET \
                     name = excluded.name, \
                     updated_at = excluded.updated_at, \
                     deleted_at = excluded.deleted_at",
                );

            let result = qb.build().execute(pool).await;
            result.map(|_| ())
        })
        .map_err(|e| map_db_error("update farm", e))
    }

    async fn delete(&self, farm: &Farm) -> AppResult<()> {
        let now = Utc::now().naive_utc();

        with_pool!(self.db.as_ref(), |pool: Backend| {
            async {
                let mut tx = pool.begin().await?;

                let mut ponds = QueryBuilder::<Backend>::new("UPDATE ponds SET deleted_at = ");
                ponds
                    .push_bind(now)
                    .push(" WHERE deleted_at IS NULL AND farm_id = ")
                    .push_bind(farm.id);
                ponds.build().execute(&mut *tx).await?;

                let mut farms = QueryBuilder::<Backend>::new("UPDATE farms SET deleted_at = ");
                farms
                    .push_bind(now)
                    .push(" WHERE deleted_at IS NULL AND id = ")
                    .push_bind(farm.id);
                farms.build().execute(&mut *tx).await?;

                tx.commit().await
            }
            .await
        })
        .map_err(|e| map_db_error("delete farm", e))
    }
}
