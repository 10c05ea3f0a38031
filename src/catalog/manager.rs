use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt::Debug;

/// One persisted counter per `(category_prefix, brand_prefix)` pair.
///
/// `current_sequence` is the next number to hand out, not the last one issued.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SequenceRecord {
    pub category_prefix: String,
    pub brand_prefix: String,
    pub current_sequence: i64,
    pub last_used: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CategoryInfo {
    pub id: i64,
    pub name: String,
    pub sku_prefix: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BrandInfo {
    pub id: i64,
    pub brand_name: String,
    pub prefix: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EquipmentUnitInfo {
    pub id: i64,
    pub sku: String,
    pub category_id: Option<i64>,
    pub brand_id: Option<i64>,
    pub created_at: String,
}

/// Async interface for catalog operations.
#[async_trait]
pub trait CatalogManager: Debug + Send + Sync {
    /// Close the catalog connection. This is idempotent and can be called multiple times.
    async fn close(&self) -> Result<()> {
        // Default implementation does nothing - sqlx pools handle cleanup automatically
        Ok(())
    }

    /// Apply any pending schema migrations. Should be idempotent.
    async fn run_migrations(&self) -> Result<()>;

    // Sequence counters

    /// Return the counter for the key, creating it at 1 when missing.
    async fn get_or_create_sequence(&self, category_prefix: &str, brand_prefix: &str)
        -> Result<i64>;

    /// Read a counter without creating it.
    async fn get_sequence(
        &self,
        category_prefix: &str,
        brand_prefix: &str,
    ) -> Result<Option<SequenceRecord>>;

    /// Atomically increment the counter and return the new value.
    async fn advance_sequence(&self, category_prefix: &str, brand_prefix: &str) -> Result<i64>;

    /// Atomically take the counter's current value and move it forward by one,
    /// creating the counter at 1 when missing. Every caller receives a distinct
    /// number. Returns None once the counter has passed `max_sequence`.
    async fn reserve_sequence(
        &self,
        category_prefix: &str,
        brand_prefix: &str,
        max_sequence: i64,
    ) -> Result<Option<i64>>;

    /// Overwrite the counter. Returns the previous value, or None if no counter exists.
    async fn reset_sequence(
        &self,
        category_prefix: &str,
        brand_prefix: &str,
        new_value: i64,
    ) -> Result<Option<i64>>;

    async fn list_sequences(&self) -> Result<Vec<SequenceRecord>>;

    // System settings

    async fn get_setting(&self, key: &str) -> Result<Option<String>>;
    async fn put_setting(&self, key: &str, value: &str) -> Result<()>;

    // Categories

    async fn add_category(&self, name: &str, sku_prefix: Option<&str>) -> Result<i64>;
    async fn get_category(&self, id: i64) -> Result<Option<CategoryInfo>>;
    async fn list_categories(&self) -> Result<Vec<CategoryInfo>>;

    // Brands

    /// Insert a brand, or update the prefix and reactivate it if the name exists.
    async fn upsert_brand(&self, brand_name: &str, prefix: &str) -> Result<i64>;
    async fn get_brand(&self, id: i64) -> Result<Option<BrandInfo>>;
    async fn list_brands(&self) -> Result<Vec<BrandInfo>>;

    /// Returns false if the brand does not exist.
    async fn set_brand_active(&self, id: i64, is_active: bool) -> Result<bool>;

    // Equipment units

    /// Case-insensitive existence check against every unit's SKU.
    async fn sku_exists(&self, sku: &str) -> Result<bool>;

    /// Insert a unit. Returns None when the SKU is already taken.
    async fn add_equipment_unit(
        &self,
        sku: &str,
        category_id: Option<i64>,
        brand_id: Option<i64>,
    ) -> Result<Option<EquipmentUnitInfo>>;

    async fn count_equipment_units(&self) -> Result<i64>;
}
