//! Database backend abstraction for the catalog.
//!
//! This module provides a generic database backend that works with any sqlx-compatible
//! database (currently Postgres and SQLite). It abstracts over database-specific differences
//! like parameter binding syntax while providing a unified API for catalog operations.
//!
//! # Architecture
//!
//! The [`CatalogBackend`] struct is parameterized by a database type that implements
//! [`CatalogDatabase`]. This trait extends sqlx's `Database` trait with additional
//! functionality needed for cross-database compatibility.
//!
//! Sequence counters are only ever changed with single-statement updates
//! (`current_sequence = current_sequence + 1 ... RETURNING`), so every
//! reservation hands out a distinct number and concurrent allocators never
//! read-modify-write a counter in application code.
//!
//! # Example
//!
//! ```ignore
//! use epg_sku::catalog::backend::CatalogBackend;
//! use sqlx::SqlitePool;
//!
//! let pool = SqlitePool::connect("sqlite::memory:").await?;
//! let backend = CatalogBackend::new(pool);
//! let next = backend.get_or_create_sequence("LT", "CHV").await?;
//! ```

use crate::catalog::manager::{BrandInfo, CategoryInfo, EquipmentUnitInfo, SequenceRecord};
use anyhow::{anyhow, Result};
use chrono::Utc;
use sqlx::{
    query, query_as, query_scalar, ColumnIndex, Database, Decode, Encode, Executor, FromRow,
    IntoArguments, Pool, Postgres, Sqlite, Type,
};
use std::borrow::Cow;

/// Extension trait for sqlx databases that provides catalog-specific functionality.
///
/// This trait handles differences in SQL syntax between database backends,
/// particularly parameter binding syntax (e.g., `$1` for Postgres vs `?` for SQLite).
pub trait CatalogDatabase: Database {
    /// Returns the parameter placeholder for the given 1-based index.
    ///
    /// - Postgres uses `$1`, `$2`, etc.
    /// - SQLite uses `?` for all parameters (index is ignored).
    fn bind_param(index: usize) -> Cow<'static, str>;
}

impl CatalogDatabase for Postgres {
    fn bind_param(index: usize) -> Cow<'static, str> {
        Cow::Owned(format!("${}", index))
    }
}

impl CatalogDatabase for Sqlite {
    fn bind_param(_: usize) -> Cow<'static, str> {
        Cow::Borrowed("?")
    }
}

/// Unique-constraint conflicts surfaced to callers as typed errors.
#[derive(Debug, thiserror::Error)]
pub enum CatalogConflict {
    #[error("Brand prefix '{0}' is already used by another active brand")]
    BrandPrefix(String),

    #[error("Category '{0}' or its SKU prefix already exists")]
    Category(String),
}

/// Check for a unique constraint violation using structured error inspection.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => matches!(
            db_err.code().map(|c| c.to_string()).as_deref(),
            // Postgres: 23505 = unique_violation
            // SQLite: 2067 = SQLITE_CONSTRAINT_UNIQUE, 1555 = SQLITE_CONSTRAINT_PRIMARYKEY
            Some("23505") | Some("2067") | Some("1555")
        ),
        _ => false,
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

/// Generic database backend for catalog operations.
///
/// Wraps a sqlx connection pool and provides methods for managing sequence counters,
/// settings and the reference data the allocator reads. Works with any database that
/// implements [`CatalogDatabase`].
pub struct CatalogBackend<DB: CatalogDatabase> {
    pool: Pool<DB>,
}

impl<DB: CatalogDatabase> CatalogBackend<DB> {
    /// Creates a new backend with the given connection pool.
    pub fn new(pool: Pool<DB>) -> Self {
        Self { pool }
    }

    /// Returns a reference to the underlying connection pool.
    pub fn pool(&self) -> &Pool<DB> {
        &self.pool
    }
}

impl<DB> CatalogBackend<DB>
where
    DB: CatalogDatabase,
    SequenceRecord: for<'r> FromRow<'r, DB::Row>,
    CategoryInfo: for<'r> FromRow<'r, DB::Row>,
    BrandInfo: for<'r> FromRow<'r, DB::Row>,
    EquipmentUnitInfo: for<'r> FromRow<'r, DB::Row>,
    for<'q> &'q str: Encode<'q, DB> + Type<DB>,
    for<'q> String: Encode<'q, DB> + Type<DB>,
    for<'r> String: Decode<'r, DB>,
    for<'q> Option<&'q str>: Encode<'q, DB> + Type<DB>,
    for<'q> bool: Encode<'q, DB> + Type<DB>,
    for<'q> i64: Encode<'q, DB> + Type<DB>,
    for<'r> i64: Decode<'r, DB>,
    for<'q> Option<i64>: Encode<'q, DB> + Type<DB>,
    for<'q> <DB as Database>::Arguments<'q>: IntoArguments<'q, DB> + Send,
    for<'c> &'c Pool<DB>: Executor<'c, Database = DB>,
    usize: ColumnIndex<DB::Row>,
{
    /// Create the counter at 1 if the key has none yet.
    async fn ensure_sequence(&self, category_prefix: &str, brand_prefix: &str) -> Result<()> {
        let sql = format!(
            "INSERT INTO sku_sequences (category_prefix, brand_prefix, current_sequence, last_used) \
             VALUES ({}, {}, 1, {}) \
             ON CONFLICT (category_prefix, brand_prefix) DO NOTHING",
            DB::bind_param(1),
            DB::bind_param(2),
            DB::bind_param(3),
        );

        query(&sql)
            .bind(category_prefix)
            .bind(brand_prefix)
            .bind(now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[tracing::instrument(
        name = "catalog_get_or_create_sequence",
        skip(self),
        fields(
            epg.category_prefix = %category_prefix,
            epg.brand_prefix = %brand_prefix,
        )
    )]
    pub async fn get_or_create_sequence(
        &self,
        category_prefix: &str,
        brand_prefix: &str,
    ) -> Result<i64> {
        self.ensure_sequence(category_prefix, brand_prefix).await?;

        let select_sql = format!(
            "SELECT current_sequence FROM sku_sequences \
             WHERE category_prefix = {} AND brand_prefix = {}",
            DB::bind_param(1),
            DB::bind_param(2),
        );

        query_scalar::<DB, i64>(&select_sql)
            .bind(category_prefix)
            .bind(brand_prefix)
            .fetch_one(&self.pool)
            .await
            .map_err(Into::into)
    }

    pub async fn get_sequence(
        &self,
        category_prefix: &str,
        brand_prefix: &str,
    ) -> Result<Option<SequenceRecord>> {
        let sql = format!(
            "SELECT category_prefix, brand_prefix, current_sequence, last_used \
             FROM sku_sequences WHERE category_prefix = {} AND brand_prefix = {}",
            DB::bind_param(1),
            DB::bind_param(2),
        );

        query_as::<DB, SequenceRecord>(&sql)
            .bind(category_prefix)
            .bind(brand_prefix)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    #[tracing::instrument(
        name = "catalog_advance_sequence",
        skip(self),
        fields(
            epg.category_prefix = %category_prefix,
            epg.brand_prefix = %brand_prefix,
        )
    )]
    pub async fn advance_sequence(&self, category_prefix: &str, brand_prefix: &str) -> Result<i64> {
        let sql = format!(
            "UPDATE sku_sequences SET current_sequence = current_sequence + 1, last_used = {} \
             WHERE category_prefix = {} AND brand_prefix = {} \
             RETURNING current_sequence",
            DB::bind_param(1),
            DB::bind_param(2),
            DB::bind_param(3),
        );

        query_scalar::<DB, i64>(&sql)
            .bind(now())
            .bind(category_prefix)
            .bind(brand_prefix)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                anyhow!(
                    "Sequence '{}-{}' not found",
                    category_prefix,
                    brand_prefix
                )
            })
    }

    #[tracing::instrument(
        name = "catalog_reserve_sequence",
        skip(self),
        fields(
            epg.category_prefix = %category_prefix,
            epg.brand_prefix = %brand_prefix,
        )
    )]
    pub async fn reserve_sequence(
        &self,
        category_prefix: &str,
        brand_prefix: &str,
        max_sequence: i64,
    ) -> Result<Option<i64>> {
        self.ensure_sequence(category_prefix, brand_prefix).await?;

        // The counter stops at max_sequence + 1
        let sql = format!(
            "UPDATE sku_sequences SET current_sequence = current_sequence + 1, last_used = {} \
             WHERE category_prefix = {} AND brand_prefix = {} AND current_sequence <= {} \
             RETURNING current_sequence - 1",
            DB::bind_param(1),
            DB::bind_param(2),
            DB::bind_param(3),
            DB::bind_param(4),
        );

        query_scalar::<DB, i64>(&sql)
            .bind(now())
            .bind(category_prefix)
            .bind(brand_prefix)
            .bind(max_sequence)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    #[tracing::instrument(
        name = "catalog_reset_sequence",
        skip(self),
        fields(
            epg.category_prefix = %category_prefix,
            epg.brand_prefix = %brand_prefix,
            epg.new_sequence = new_value,
        )
    )]
    pub async fn reset_sequence(
        &self,
        category_prefix: &str,
        brand_prefix: &str,
        new_value: i64,
    ) -> Result<Option<i64>> {
        let sql = format!(
            "UPDATE sku_sequences SET current_sequence = {}, last_used = {} \
             WHERE category_prefix = {} AND brand_prefix = {} AND current_sequence = {} \
             RETURNING current_sequence",
            DB::bind_param(1),
            DB::bind_param(2),
            DB::bind_param(3),
            DB::bind_param(4),
            DB::bind_param(5),
        );

        // Compare-and-set; retry when an allocation moved the counter after the read
        loop {
            let Some(existing) = self.get_sequence(category_prefix, brand_prefix).await? else {
                return Ok(None);
            };

            let replaced = query_scalar::<DB, i64>(&sql)
                .bind(new_value)
                .bind(now())
                .bind(category_prefix)
                .bind(brand_prefix)
                .bind(existing.current_sequence)
                .fetch_optional(&self.pool)
                .await?;

            if replaced.is_some() {
                return Ok(Some(existing.current_sequence));
            }
        }
    }

    pub async fn list_sequences(&self) -> Result<Vec<SequenceRecord>> {
        query_as::<DB, SequenceRecord>(
            "SELECT category_prefix, brand_prefix, current_sequence, last_used \
             FROM sku_sequences ORDER BY category_prefix, brand_prefix",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let sql = format!(
            "SELECT setting_value FROM system_settings WHERE setting_key = {}",
            DB::bind_param(1)
        );

        let row = query_as::<DB, (String,)>(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    #[tracing::instrument(name = "catalog_put_setting", skip(self), fields(epg.setting = %key))]
    pub async fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        let sql = format!(
            "INSERT INTO system_settings (setting_key, setting_value, updated_at) \
             VALUES ({}, {}, {}) \
             ON CONFLICT (setting_key) \
             DO UPDATE SET setting_value = excluded.setting_value, updated_at = excluded.updated_at",
            DB::bind_param(1),
            DB::bind_param(2),
            DB::bind_param(3),
        );

        query(&sql)
            .bind(key)
            .bind(value)
            .bind(now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    #[tracing::instrument(name = "catalog_add_category", skip(self), fields(epg.category = %name))]
    pub async fn add_category(&self, name: &str, sku_prefix: Option<&str>) -> Result<i64> {
        let sql = format!(
            "INSERT INTO categories (name, sku_prefix, created_at) VALUES ({}, {}, {}) RETURNING id",
            DB::bind_param(1),
            DB::bind_param(2),
            DB::bind_param(3),
        );

        let result = query_scalar::<DB, i64>(&sql)
            .bind(name)
            .bind(sku_prefix)
            .bind(now())
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(id) => Ok(id),
            Err(e) if is_unique_violation(&e) => Err(CatalogConflict::Category(name.to_string()).into()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_category(&self, id: i64) -> Result<Option<CategoryInfo>> {
        let sql = format!(
            "SELECT id, name, sku_prefix FROM categories WHERE id = {}",
            DB::bind_param(1)
        );

        query_as::<DB, CategoryInfo>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryInfo>> {
        query_as::<DB, CategoryInfo>("SELECT id, name, sku_prefix FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(Into::into)
    }

    #[tracing::instrument(
        name = "catalog_upsert_brand",
        skip(self),
        fields(epg.brand = %brand_name, epg.brand_prefix = %prefix)
    )]
    pub async fn upsert_brand(&self, brand_name: &str, prefix: &str) -> Result<i64> {
        let sql = format!(
            "INSERT INTO brands (brand_name, prefix, is_active, updated_at) \
             VALUES ({}, {}, TRUE, {}) \
             ON CONFLICT (brand_name) \
             DO UPDATE SET prefix = excluded.prefix, is_active = TRUE, updated_at = excluded.updated_at \
             RETURNING id",
            DB::bind_param(1),
            DB::bind_param(2),
            DB::bind_param(3),
        );

        let result = query_scalar::<DB, i64>(&sql)
            .bind(brand_name)
            .bind(prefix)
            .bind(now())
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(id) => Ok(id),
            Err(e) if is_unique_violation(&e) => {
                Err(CatalogConflict::BrandPrefix(prefix.to_string()).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_brand(&self, id: i64) -> Result<Option<BrandInfo>> {
        let sql = format!(
            "SELECT id, brand_name, prefix, is_active FROM brands WHERE id = {}",
            DB::bind_param(1)
        );

        query_as::<DB, BrandInfo>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    pub async fn list_brands(&self) -> Result<Vec<BrandInfo>> {
        query_as::<DB, BrandInfo>(
            "SELECT id, brand_name, prefix, is_active FROM brands ORDER BY brand_name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
    }

    #[tracing::instrument(
        name = "catalog_set_brand_active",
        skip(self),
        fields(epg.brand_id = id, epg.active = is_active)
    )]
    pub async fn set_brand_active(&self, id: i64, is_active: bool) -> Result<bool> {
        let sql = format!(
            "UPDATE brands SET is_active = {}, updated_at = {} WHERE id = {} RETURNING prefix",
            DB::bind_param(1),
            DB::bind_param(2),
            DB::bind_param(3),
        );

        let result = query_as::<DB, (String,)>(&sql)
            .bind(is_active)
            .bind(now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await;

        match result {
            Ok(row) => Ok(row.is_some()),
            Err(e) if is_unique_violation(&e) => {
                let prefix = self
                    .get_brand(id)
                    .await?
                    .map(|b| b.prefix)
                    .unwrap_or_default();
                Err(CatalogConflict::BrandPrefix(prefix).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn sku_exists(&self, sku: &str) -> Result<bool> {
        let sql = format!(
            "SELECT COUNT(*) FROM equipment_units WHERE UPPER(sku) = UPPER({})",
            DB::bind_param(1)
        );

        let count = query_scalar::<DB, i64>(&sql)
            .bind(sku)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    #[tracing::instrument(name = "catalog_add_equipment_unit", skip(self), fields(epg.sku = %sku))]
    pub async fn add_equipment_unit(
        &self,
        sku: &str,
        category_id: Option<i64>,
        brand_id: Option<i64>,
    ) -> Result<Option<EquipmentUnitInfo>> {
        let sql = format!(
            "INSERT INTO equipment_units (sku, category_id, brand_id, created_at) \
             VALUES ({}, {}, {}, {}) \
             RETURNING id, sku, category_id, brand_id, created_at",
            DB::bind_param(1),
            DB::bind_param(2),
            DB::bind_param(3),
            DB::bind_param(4),
        );

        let result = query_as::<DB, EquipmentUnitInfo>(&sql)
            .bind(sku)
            .bind(category_id)
            .bind(brand_id)
            .bind(now())
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(unit) => Ok(Some(unit)),
            // The expression index on UPPER(sku) is the last guard against duplicates
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn count_equipment_units(&self) -> Result<i64> {
        query_scalar::<DB, i64>("SELECT COUNT(*) FROM equipment_units")
            .fetch_one(&self.pool)
            .await
            .map_err(Into::into)
    }
}
