use crate::catalog::{
    BrandInfo, CatalogManager, CategoryInfo, EquipmentUnitInfo, PostgresCatalogManager,
    SqliteCatalogManager,
};
use crate::sku::format::{is_valid_brand_prefix, is_valid_category_prefix};
use crate::sku::{KillSwitch, SkuAllocator, SkuError, UnitRequest};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const DEFAULT_BASE_DIR: &str = "data";
const CATALOG_FILE: &str = "sku_catalog.db";

/// Owns the catalog and the allocator; shared by every HTTP handler.
#[derive(Debug)]
pub struct SkuEngine {
    catalog: Arc<dyn CatalogManager>,
    allocator: SkuAllocator,
}

impl SkuEngine {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create an engine with a SQLite catalog at {base_dir}/sku_catalog.db.
    pub async fn defaults(base_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::builder().base_dir(base_dir).build().await
    }

    /// Create a builder for more control over engine configuration.
    pub fn builder() -> SkuEngineBuilder {
        SkuEngineBuilder::new()
    }

    /// Create a new engine from application configuration.
    pub async fn from_config(config: &crate::config::AppConfig) -> Result<Self> {
        let mut builder = SkuEngine::builder().kill_switch_env(&config.sku.kill_switch_env);

        if let Some(base) = &config.paths.base_dir {
            builder = builder.base_dir(PathBuf::from(base));
        }

        // Only create explicit catalog for non-sqlite backends
        if config.catalog.catalog_type == "postgres" {
            let url = config
                .catalog
                .postgres_url()
                .ok_or_else(|| anyhow::anyhow!("Incomplete postgres catalog configuration"))?;
            let catalog: Arc<dyn CatalogManager> = Arc::new(PostgresCatalogManager::new(&url).await?);
            builder = builder.catalog(catalog);
        }

        builder.build().await
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn catalog(&self) -> Arc<dyn CatalogManager> {
        self.catalog.clone()
    }

    pub fn allocator(&self) -> &SkuAllocator {
        &self.allocator
    }

    // =========================================================================
    // Equipment units
    // =========================================================================

    /// Generate (or validate) the SKU and persist the unit.
    #[tracing::instrument(name = "create_equipment_unit", skip(self, request))]
    pub async fn create_equipment_unit(
        &self,
        request: &UnitRequest,
    ) -> Result<EquipmentUnitInfo, SkuError> {
        let generated = self.allocator.generate(request).await?;

        let inserted = self
            .catalog
            .add_equipment_unit(&generated.sku, generated.category_id, generated.brand_id)
            .await?;

        // Lost a race with a concurrent insert of the same manual SKU
        inserted.ok_or(SkuError::DuplicateSku(generated.sku))
    }

    // =========================================================================
    // Reference data
    // =========================================================================

    pub async fn add_category(
        &self,
        name: &str,
        sku_prefix: Option<&str>,
    ) -> Result<CategoryInfo, SkuError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SkuError::validation("Category name cannot be empty"));
        }

        let prefix = sku_prefix
            .map(|p| p.trim().to_ascii_uppercase())
            .filter(|p| !p.is_empty());
        if let Some(p) = &prefix {
            if !is_valid_category_prefix(p) {
                return Err(SkuError::validation(format!(
                    "Invalid category prefix '{}': must be 2-3 letters",
                    p
                )));
            }
        }

        let id = self.catalog.add_category(name, prefix.as_deref()).await?;
        info!(category = %name, prefix = ?prefix, "Category added");

        Ok(CategoryInfo {
            id,
            name: name.to_string(),
            sku_prefix: prefix,
        })
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryInfo>, SkuError> {
        Ok(self.catalog.list_categories().await?)
    }

    /// Add a brand or update an existing brand's prefix (reactivating it).
    pub async fn upsert_brand(&self, brand_name: &str, prefix: &str) -> Result<BrandInfo, SkuError> {
        let brand_name = brand_name.trim();
        if brand_name.is_empty() {
            return Err(SkuError::validation("Brand name cannot be empty"));
        }
        let prefix = prefix.trim().to_ascii_uppercase();
        if !is_valid_brand_prefix(&prefix) {
            return Err(SkuError::validation(format!(
                "Invalid brand prefix '{}': must be 3 letters",
                prefix
            )));
        }

        let id = self.catalog.upsert_brand(brand_name, &prefix).await?;
        info!(brand = %brand_name, %prefix, "Brand saved");

        Ok(BrandInfo {
            id,
            brand_name: brand_name.to_string(),
            prefix,
            is_active: true,
        })
    }

    pub async fn list_brands(&self) -> Result<Vec<BrandInfo>, SkuError> {
        Ok(self.catalog.list_brands().await?)
    }

    pub async fn set_brand_active(&self, id: i64, is_active: bool) -> Result<BrandInfo, SkuError> {
        if !self.catalog.set_brand_active(id, is_active).await? {
            return Err(SkuError::BrandNotFound(id));
        }
        info!(brand_id = id, is_active, "Brand activation changed");

        self.catalog
            .get_brand(id)
            .await?
            .ok_or(SkuError::BrandNotFound(id))
    }

    /// Shutdown the engine and close the catalog connection.
    pub async fn shutdown(&self) -> Result<()> {
        self.catalog.close().await
    }
}

/// Builder for [`SkuEngine`].
///
/// ```no_run
/// # async fn run() -> anyhow::Result<()> {
/// use epg_sku::SkuEngine;
///
/// // SQLite catalog under ./data
/// let engine = SkuEngine::builder().base_dir("data").build().await?;
/// # Ok(())
/// # }
/// ```
pub struct SkuEngineBuilder {
    base_dir: Option<PathBuf>,
    catalog: Option<Arc<dyn CatalogManager>>,
    kill_switch: KillSwitch,
}

impl Default for SkuEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SkuEngineBuilder {
    pub fn new() -> Self {
        Self {
            base_dir: None,
            catalog: None,
            kill_switch: KillSwitch::default(),
        }
    }

    /// Set the directory for the SQLite catalog. Defaults to ./data.
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Use an explicit catalog instead of the default SQLite one.
    pub fn catalog(mut self, catalog: Arc<dyn CatalogManager>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Name of the environment variable acting as the auto-generation kill switch.
    pub fn kill_switch_env(mut self, env_var: impl Into<String>) -> Self {
        self.kill_switch = KillSwitch::new(env_var);
        self
    }

    pub async fn build(self) -> Result<SkuEngine> {
        let catalog: Arc<dyn CatalogManager> = match self.catalog {
            Some(c) => c,
            None => {
                let base_dir = self
                    .base_dir
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_BASE_DIR));
                std::fs::create_dir_all(&base_dir)?;
                let catalog_path = base_dir.join(CATALOG_FILE);
                Arc::new(
                    SqliteCatalogManager::new(
                        catalog_path
                            .to_str()
                            .ok_or_else(|| anyhow::anyhow!("Invalid catalog path"))?,
                    )
                    .await?,
                )
            }
        };

        catalog.run_migrations().await?;
        info!(
            kill_switch = self.kill_switch.env_var(),
            "Catalog ready"
        );

        let allocator = SkuAllocator::new(catalog.clone(), self.kill_switch);
        Ok(SkuEngine { catalog, allocator })
    }
}
