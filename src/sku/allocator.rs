use super::error::SkuError;
use super::format::{
    format_sku, is_valid_brand_prefix, is_valid_category_prefix, MAX_SEQUENCE,
};
use super::resolve::{resolve_brand, BrandResolution};
use super::validation::{normalize_manual_sku, ManualSkuError};
use crate::catalog::CatalogManager;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Retries after the first attempt before allocation gives up.
pub const MAX_COLLISION_RETRIES: u32 = 5;

/// System setting holding the persisted auto-generation toggle.
pub const AUTO_GENERATION_SETTING: &str = "auto_sku_generation_enabled";

/// Default name of the environment kill switch.
pub const DEFAULT_KILL_SWITCH_ENV: &str = "DISABLE_AUTO_SKU_GENERATION";

/// Input for SKU generation: either a manual SKU, or category and brand references.
#[derive(Debug, Clone, Default)]
pub struct UnitRequest {
    pub sku: Option<String>,
    pub category_id: Option<i64>,
    pub brand_id: Option<i64>,
    pub brand_name: Option<String>,
}

impl UnitRequest {
    pub fn auto(category_id: i64, brand_name: impl Into<String>) -> Self {
        Self {
            category_id: Some(category_id),
            brand_name: Some(brand_name.into()),
            ..Default::default()
        }
    }

    pub fn manual(sku: impl Into<String>) -> Self {
        Self {
            sku: Some(sku.into()),
            ..Default::default()
        }
    }

    /// Blank manual SKUs count as not supplied.
    fn manual_sku(&self) -> Option<&str> {
        self.sku.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Prefix pair identifying one sequence counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequenceKey {
    pub category_prefix: String,
    pub brand_prefix: String,
}

impl SequenceKey {
    pub fn new(category_prefix: impl Into<String>, brand_prefix: impl Into<String>) -> Self {
        Self {
            category_prefix: category_prefix.into(),
            brand_prefix: brand_prefix.into(),
        }
    }

    /// Normalize and check both prefixes against the deployment's widths.
    pub fn parse(category_prefix: &str, brand_prefix: &str) -> Result<Self, SkuError> {
        let category_prefix = category_prefix.trim().to_ascii_uppercase();
        let brand_prefix = brand_prefix.trim().to_ascii_uppercase();

        if !is_valid_category_prefix(&category_prefix) {
            return Err(SkuError::validation(format!(
                "Invalid category prefix '{}': must be 2-3 letters",
                category_prefix
            )));
        }
        if !is_valid_brand_prefix(&brand_prefix) {
            return Err(SkuError::validation(format!(
                "Invalid brand prefix '{}': must be 3 letters",
                brand_prefix
            )));
        }
        Ok(Self::new(category_prefix, brand_prefix))
    }

    pub fn format(&self, sequence: i64) -> String {
        format_sku(&self.category_prefix, &self.brand_prefix, sequence)
    }
}

/// Environment flag that disables auto-generation regardless of the stored toggle.
#[derive(Debug, Clone)]
pub struct KillSwitch {
    env_var: String,
}

impl KillSwitch {
    pub fn new(env_var: impl Into<String>) -> Self {
        Self {
            env_var: env_var.into(),
        }
    }

    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    /// Read on every call so the switch can be flipped without a restart.
    pub fn engaged(&self) -> bool {
        std::env::var(&self.env_var)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1"))
            .unwrap_or(false)
    }
}

impl Default for KillSwitch {
    fn default() -> Self {
        Self::new(DEFAULT_KILL_SWITCH_ENV)
    }
}

/// Result of a successful generation, with the references it resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSku {
    pub sku: String,
    pub category_id: Option<i64>,
    pub brand_id: Option<i64>,
}

fn capacity_exceeded(key: &SequenceKey) -> SkuError {
    SkuError::CapacityExceeded {
        category_prefix: key.category_prefix.clone(),
        brand_prefix: key.brand_prefix.clone(),
        max: MAX_SEQUENCE,
    }
}

/// Allocates SKUs against the persisted sequence counters.
///
/// Each attempt reserves a number with the counter's atomic increment, so
/// concurrent callers never share a candidate. A reserved number whose SKU
/// already belongs to a unit is skipped, up to [`MAX_COLLISION_RETRIES`]
/// retries. Skipped numbers are never reused.
#[derive(Debug, Clone)]
pub struct SkuAllocator {
    pub(super) catalog: Arc<dyn CatalogManager>,
    pub(super) kill_switch: KillSwitch,
}

impl SkuAllocator {
    pub fn new(catalog: Arc<dyn CatalogManager>, kill_switch: KillSwitch) -> Self {
        Self {
            catalog,
            kill_switch,
        }
    }

    /// Produce the SKU for a new unit without creating the unit.
    pub async fn generate_sku(&self, request: &UnitRequest) -> Result<String, SkuError> {
        self.generate(request).await.map(|g| g.sku)
    }

    #[tracing::instrument(
        name = "generate_sku",
        skip(self, request),
        fields(
            epg.manual = request.manual_sku().is_some(),
            epg.sku = tracing::field::Empty,
        )
    )]
    pub async fn generate(&self, request: &UnitRequest) -> Result<GeneratedSku, SkuError> {
        if let Some(manual) = request.manual_sku() {
            let sku = self.validate_manual_sku(manual).await?;
            tracing::Span::current().record("epg.sku", sku.as_str());
            return Ok(GeneratedSku {
                sku,
                category_id: request.category_id,
                brand_id: request.brand_id,
            });
        }

        if !self.auto_generation_enabled().await? {
            return Err(SkuError::validation(
                "Automatic SKU generation is disabled; a manual SKU is required",
            ));
        }

        let category_id = request.category_id.ok_or_else(|| {
            SkuError::validation("A category is required to generate a SKU")
        })?;
        let category_prefix = self.resolve_category_prefix(category_id).await?;
        let brand = self.resolve_brand_prefix(request).await?;

        let key = SequenceKey::new(category_prefix, brand.prefix());
        let sku = self.allocate(&key).await?;
        tracing::Span::current().record("epg.sku", sku.as_str());

        Ok(GeneratedSku {
            sku,
            category_id: Some(category_id),
            brand_id: request.brand_id.or(brand.brand_id()),
        })
    }

    /// Next SKU for the key, without reserving anything. Advisory only.
    pub async fn preview_sku(
        &self,
        category_prefix: &str,
        brand_prefix: &str,
    ) -> Result<String, SkuError> {
        let key = SequenceKey::parse(category_prefix, brand_prefix)?;
        let next = self
            .catalog
            .get_sequence(&key.category_prefix, &key.brand_prefix)
            .await?
            .map(|r| r.current_sequence)
            .unwrap_or(1);
        self.check_capacity(&key, next)?;
        Ok(key.format(next))
    }

    /// Validate an operator-supplied SKU and return its normalized form.
    ///
    /// Structural rules are checked before uniqueness, so nothing touches
    /// storage for a malformed SKU.
    pub async fn validate_manual_sku(&self, sku: &str) -> Result<String, SkuError> {
        let normalized = normalize_manual_sku(sku)?;
        if self.catalog.sku_exists(&normalized).await? {
            return Err(ManualSkuError::AlreadyInUse(normalized).into());
        }
        Ok(normalized)
    }

    /// Stored toggle, overridden by the environment kill switch.
    pub async fn auto_generation_enabled(&self) -> Result<bool, SkuError> {
        if self.kill_switch.engaged() {
            return Ok(false);
        }
        self.stored_auto_generation().await
    }

    pub(super) async fn stored_auto_generation(&self) -> Result<bool, SkuError> {
        let stored = self.catalog.get_setting(AUTO_GENERATION_SETTING).await?;
        Ok(stored.map(|v| v == "true").unwrap_or(true))
    }

    async fn resolve_category_prefix(&self, category_id: i64) -> Result<String, SkuError> {
        let category = self
            .catalog
            .get_category(category_id)
            .await?
            .ok_or_else(|| SkuError::resolution(format!("Category {} not found", category_id)))?;

        match category.sku_prefix.as_deref().map(str::trim) {
            Some(prefix) if is_valid_category_prefix(prefix) => Ok(prefix.to_string()),
            Some(prefix) if !prefix.is_empty() => Err(SkuError::resolution(format!(
                "Category '{}' has an invalid SKU prefix '{}'",
                category.name, prefix
            ))),
            _ => Err(SkuError::resolution(format!(
                "Category '{}' has no SKU prefix configured",
                category.name
            ))),
        }
    }

    async fn resolve_brand_prefix(&self, request: &UnitRequest) -> Result<BrandResolution, SkuError> {
        if let Some(brand_id) = request.brand_id {
            let brand = self
                .catalog
                .get_brand(brand_id)
                .await?
                .ok_or(SkuError::BrandNotFound(brand_id))?;
            if brand.is_active {
                return Ok(BrandResolution::Matched {
                    brand_id: brand.id,
                    prefix: brand.prefix,
                    strategy: "id",
                });
            }
            warn!(
                brand = %brand.brand_name,
                "Brand is inactive, using generic prefix"
            );
            return Ok(BrandResolution::Fallback);
        }

        let name = request
            .brand_name
            .as_deref()
            .ok_or_else(|| SkuError::validation("A brand is required to generate a SKU"))?;
        let brands = self.catalog.list_brands().await?;
        let resolution = resolve_brand(name, &brands);
        match &resolution {
            BrandResolution::Matched { prefix, strategy, .. } => {
                debug!(brand = %name, %prefix, strategy, "Resolved brand prefix")
            }
            BrandResolution::Fallback => {
                warn!(brand = %name, "Unknown brand, using generic prefix")
            }
        }
        Ok(resolution)
    }

    fn check_capacity(&self, key: &SequenceKey, sequence: i64) -> Result<(), SkuError> {
        if sequence > MAX_SEQUENCE {
            return Err(capacity_exceeded(key));
        }
        Ok(())
    }

    /// Collision-retry loop over the sequence counter for `key`.
    async fn allocate(&self, key: &SequenceKey) -> Result<String, SkuError> {
        let (category, brand) = (&key.category_prefix, &key.brand_prefix);
        let max_attempts = MAX_COLLISION_RETRIES + 1;
        let mut last_candidate = String::new();

        for attempt in 1..=max_attempts {
            let sequence = self
                .catalog
                .reserve_sequence(category, brand, MAX_SEQUENCE)
                .await?
                .ok_or_else(|| capacity_exceeded(key))?;
            let candidate = key.format(sequence);

            if !self.catalog.sku_exists(&candidate).await? {
                info!(sku = %candidate, attempt, "Allocated SKU");
                return Ok(candidate);
            }

            debug!(%candidate, attempt, "SKU already assigned, trying next number");
            last_candidate = candidate;
        }

        warn!(
            %last_candidate,
            attempts = max_attempts,
            "SKU allocation exhausted retries"
        );
        Err(SkuError::AllocationExhausted {
            attempts: max_attempts,
            last_candidate,
        })
    }
}
