//! PostgreSQL-backed catalog store

use super::bind::{push_bind, BindValue};
use super::filter::FilterExpr;
use super::store::{CatalogStore, FetchOptions};
use crate::models::{CatalogRecord, GeoPoint};
use crate::Result;
use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{Query, QueryScalar};
use sqlx::{PgPool, Postgres, Row};
use std::collections::HashMap;
use uuid::Uuid;

const RECORD_ALIAS: &str = "m";
const RECORD_COLUMNS: &str = "m.id, m.pharmacy_id, m.name, m.description, m.price, m.quantity, \
                              m.is_active, m.created_at, m.updated_at";

#[derive(Clone)]
pub struct PostgresCatalogStore {
    pool: PgPool,
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn build_count_sql(filter: &FilterExpr) -> (String, Vec<BindValue>) {
    let mut binds = Vec::new();
    let where_sql = filter.build_sql(&mut binds, RECORD_ALIAS);
    (
        format!("SELECT COUNT(*) FROM medicines {RECORD_ALIAS} WHERE {where_sql}"),
        binds,
    )
}

pub(crate) fn build_fetch_sql(
    filter: &FilterExpr,
    options: &FetchOptions,
) -> (String, Vec<BindValue>) {
    let mut binds = Vec::new();
    let where_sql = filter.build_sql(&mut binds, RECORD_ALIAS);
    let order_sql = options.effective_sort().order_by_sql(RECORD_ALIAS);

    let mut sql = format!(
        "SELECT {RECORD_COLUMNS} FROM medicines {RECORD_ALIAS} WHERE {where_sql} ORDER BY {order_sql}"
    );

    if let Some(limit) = options.limit {
        let idx = push_bind(&mut binds, BindValue::Int(clamp_i64(limit)));
        sql.push_str(&format!(" LIMIT ${idx}"));
    }
    if let Some(skip) = options.skip.filter(|s| *s > 0) {
        let idx = push_bind(&mut binds, BindValue::Int(clamp_i64(skip)));
        sql.push_str(&format!(" OFFSET ${idx}"));
    }

    (sql, binds)
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn bind_query<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    bind_values: Vec<BindValue>,
) -> Query<'q, Postgres, PgArguments> {
    for value in bind_values {
        query = match value {
            BindValue::Text(v) => query.bind(v),
            BindValue::Bool(v) => query.bind(v),
            BindValue::Uuid(v) => query.bind(v),
            BindValue::Int(v) => query.bind(v),
        };
    }
    query
}

fn bind_scalar<'q, O>(
    mut query: QueryScalar<'q, Postgres, O, PgArguments>,
    bind_values: Vec<BindValue>,
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    for value in bind_values {
        query = match value {
            BindValue::Text(v) => query.bind(v),
            BindValue::Bool(v) => query.bind(v),
            BindValue::Uuid(v) => query.bind(v),
            BindValue::Int(v) => query.bind(v),
        };
    }
    query
}

fn row_to_record(row: &PgRow) -> std::result::Result<CatalogRecord, sqlx::Error> {
    Ok(CatalogRecord {
        id: row.try_get("id")?,
        owner_id: row.try_get("pharmacy_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: row.try_get("price")?,
        quantity: row.try_get("quantity")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    async fn count(&self, filter: &FilterExpr) -> Result<u64> {
        let (sql, bind_values) = build_count_sql(filter);
        let total: i64 = bind_scalar(sqlx::query_scalar::<_, i64>(&sql), bind_values)
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn fetch(
        &self,
        filter: &FilterExpr,
        options: &FetchOptions,
    ) -> Result<Vec<CatalogRecord>> {
        let (sql, bind_values) = build_fetch_sql(filter, options);
        let rows = bind_query(sqlx::query(&sql), bind_values)
            .fetch_all(&self.pool)
            .await?;

        let records = rows
            .iter()
            .map(row_to_record)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    async fn owner_locations(&self, owner_ids: &[Uuid]) -> Result<HashMap<Uuid, GeoPoint>> {
        if owner_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            "SELECT id, latitude, longitude FROM pharmacies \
             WHERE id = ANY($1) AND latitude IS NOT NULL AND longitude IS NOT NULL",
        )
        .bind(owner_ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        let mut locations = HashMap::with_capacity(rows.len());
        for row in rows {
            let id: Uuid = row.try_get("id")?;
            let latitude: f64 = row.try_get("latitude")?;
            let longitude: f64 = row.try_get("longitude")?;
            locations.insert(id, GeoPoint::new(latitude, longitude));
        }
        Ok(locations)
    }

    async fn owner_exists(&self, owner_id: Uuid) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pharmacies WHERE id = $1)")
                .bind(owner_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}
