use crate::catalog::backend::CatalogBackend;
use crate::catalog::manager::{
    BrandInfo, CatalogManager, CategoryInfo, EquipmentUnitInfo, SequenceRecord,
};
use crate::catalog::migrations::{run_migrations, CatalogMigrations, DEFAULT_BRANDS};
use anyhow::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{Sqlite, SqlitePool};
use std::fmt::{self, Debug, Formatter};
use std::str::FromStr;
use std::time::Duration;

pub struct SqliteCatalogManager {
    backend: CatalogBackend<Sqlite>,
    catalog_path: String,
}

impl Debug for SqliteCatalogManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteCatalogManager")
            .field("catalog_path", &self.catalog_path)
            .finish()
    }
}

struct SqliteMigrationBackend;

impl SqliteCatalogManager {
    pub async fn new(db_path: &str) -> Result<Self> {
        let uri = format!("sqlite:{}?mode=rwc", db_path);
        let options = SqliteConnectOptions::from_str(&uri)?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePool::connect_with(options).await?;
        let backend = CatalogBackend::new(pool);

        Ok(Self {
            backend,
            catalog_path: db_path.to_string(),
        })
    }

    async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sku_sequences (
                category_prefix TEXT NOT NULL,
                brand_prefix TEXT NOT NULL,
                current_sequence INTEGER NOT NULL DEFAULT 1,
                last_used TEXT,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (category_prefix, brand_prefix)
            )
        "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS system_settings (
                setting_key TEXT PRIMARY KEY,
                setting_value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL,
                sku_prefix TEXT UNIQUE,
                created_at TEXT NOT NULL
            )
        "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS brands (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                brand_name TEXT UNIQUE NOT NULL,
                prefix TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                updated_at TEXT NOT NULL
            )
        "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_brands_active_prefix \
             ON brands (prefix) WHERE is_active = TRUE",
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS equipment_units (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sku TEXT NOT NULL,
                category_id INTEGER REFERENCES categories(id),
                brand_id INTEGER REFERENCES brands(id),
                created_at TEXT NOT NULL
            )
        "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_equipment_units_sku \
             ON equipment_units (UPPER(sku))",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn seed_default_brands(pool: &SqlitePool) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        for (brand_name, prefix) in DEFAULT_BRANDS {
            sqlx::query(
                "INSERT INTO brands (brand_name, prefix, is_active, updated_at) \
                 VALUES (?, ?, TRUE, ?) ON CONFLICT (brand_name) DO NOTHING",
            )
            .bind(*brand_name)
            .bind(*prefix)
            .bind(now.as_str())
            .execute(pool)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogManager for SqliteCatalogManager {
    async fn close(&self) -> Result<()> {
        self.backend.pool().close().await;
        Ok(())
    }

    async fn run_migrations(&self) -> Result<()> {
        run_migrations::<SqliteMigrationBackend>(self.backend.pool()).await
    }

    async fn get_or_create_sequence(
        &self,
        category_prefix: &str,
        brand_prefix: &str,
    ) -> Result<i64> {
        self.backend
            .get_or_create_sequence(category_prefix, brand_prefix)
            .await
    }

    async fn get_sequence(
        &self,
        category_prefix: &str,
        brand_prefix: &str,
    ) -> Result<Option<SequenceRecord>> {
        self.backend.get_sequence(category_prefix, brand_prefix).await
    }

    async fn advance_sequence(&self, category_prefix: &str, brand_prefix: &str) -> Result<i64> {
        self.backend
            .advance_sequence(category_prefix, brand_prefix)
            .await
    }

    async fn reserve_sequence(
        &self,
        category_prefix: &str,
        brand_prefix: &str,
        max_sequence: i64,
    ) -> Result<Option<i64>> {
        self.backend
            .reserve_sequence(category_prefix, brand_prefix, max_sequence)
            .await
    }

    async fn reset_sequence(
        &self,
        category_prefix: &str,
        brand_prefix: &str,
        new_value: i64,
    ) -> Result<Option<i64>> {
        self.backend
            .reset_sequence(category_prefix, brand_prefix, new_value)
            .await
    }

    async fn list_sequences(&self) -> Result<Vec<SequenceRecord>> {
        self.backend.list_sequences().await
    }

    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        self.backend.get_setting(key).await
    }

    async fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        self.backend.put_setting(key, value).await
    }

    async fn add_category(&self, name: &str, sku_prefix: Option<&str>) -> Result<i64> {
        self.backend.add_category(name, sku_prefix).await
    }

    async fn get_category(&self, id: i64) -> Result<Option<CategoryInfo>> {
        self.backend.get_category(id).await
    }

    async fn list_categories(&self) -> Result<Vec<CategoryInfo>> {
        self.backend.list_categories().await
    }

    async fn upsert_brand(&self, brand_name: &str, prefix: &str) -> Result<i64> {
        self.backend.upsert_brand(brand_name, prefix).await
    }

    async fn get_brand(&self, id: i64) -> Result<Option<BrandInfo>> {
        self.backend.get_brand(id).await
    }

    async fn list_brands(&self) -> Result<Vec<BrandInfo>> {
        self.backend.list_brands().await
    }

    async fn set_brand_active(&self, id: i64, is_active: bool) -> Result<bool> {
        self.backend.set_brand_active(id, is_active).await
    }

    async fn sku_exists(&self, sku: &str) -> Result<bool> {
        self.backend.sku_exists(sku).await
    }

    async fn add_equipment_unit(
        &self,
        sku: &str,
        category_id: Option<i64>,
        brand_id: Option<i64>,
    ) -> Result<Option<EquipmentUnitInfo>> {
        self.backend
            .add_equipment_unit(sku, category_id, brand_id)
            .await
    }

    async fn count_equipment_units(&self) -> Result<i64> {
        self.backend.count_equipment_units().await
    }
}

impl CatalogMigrations for SqliteMigrationBackend {
    type Pool = SqlitePool;

    fn ensure_migrations_table(pool: &Self::Pool) -> BoxFuture<'_, Result<()>> {
        async move {
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS schema_migrations (
                    version INTEGER PRIMARY KEY,
                    applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                )
                "#,
            )
            .execute(pool)
            .await?;
            Ok(())
        }
        .boxed()
    }

    fn current_version(pool: &Self::Pool) -> BoxFuture<'_, Result<i64>> {
        async move {
            sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
                .fetch_one(pool)
                .await
                .map_err(Into::into)
        }
        .boxed()
    }

    fn record_version(pool: &Self::Pool, version: i64) -> BoxFuture<'_, Result<()>> {
        async move {
            sqlx::query("INSERT INTO schema_migrations (version) VALUES (?)")
                .bind(version)
                .execute(pool)
                .await?;
            Ok(())
        }
        .boxed()
    }

    fn migrate_v1(pool: &Self::Pool) -> BoxFuture<'_, Result<()>> {
        SqliteCatalogManager::initialize_schema(pool).boxed()
    }

    fn migrate_v2(pool: &Self::Pool) -> BoxFuture<'_, Result<()>> {
        SqliteCatalogManager::seed_default_brands(pool).boxed()
    }
}
