use crate::catalog::{BrandInfo, CategoryInfo, EquipmentUnitInfo};
use crate::sku::{SequenceSummary, SequenceUsage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Query parameters for GET /sku-admin/preview
#[derive(Debug, Deserialize)]
pub struct PreviewParams {
    pub category: Option<String>,
    pub brand: Option<String>,
}

/// Response body for GET /sku-admin/preview
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    #[serde(rename = "nextSKU")]
    pub next_sku: String,
    pub category: String,
    pub brand: String,
    pub timestamp: DateTime<Utc>,
}

/// Response body for GET /sku-admin/statistics
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsResponse {
    pub total_instances: i64,
    pub sequences_by_category: BTreeMap<String, Vec<SequenceUsage>>,
    pub last_updated: DateTime<Utc>,
}

/// Request body for POST /sku-admin/validate
#[derive(Debug, Deserialize)]
pub struct ValidateSkuRequest {
    pub sku: String,
}

/// Response body for POST /sku-admin/validate
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateSkuResponse {
    pub success: bool,
    pub sku: String,
    pub is_available: bool,
}

/// Request body for POST /sku-admin/reset-sequence
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetSequenceRequest {
    pub category: String,
    pub brand: String,
    pub new_sequence: i64,
}

/// Response body for POST /sku-admin/reset-sequence
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetSequenceResponse {
    pub old_sequence: i64,
    pub new_sequence: i64,
    #[serde(rename = "nextSKU")]
    pub next_sku: String,
}

/// Response body for GET /sku-admin/sequences
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSequencesResponse {
    pub sequences: Vec<SequenceSummary>,
    pub total_sequences: usize,
}

/// Request body for POST /sku-admin/toggle-auto-generation
#[derive(Debug, Deserialize)]
pub struct ToggleAutoGenerationRequest {
    pub enabled: bool,
}

/// Response body for POST /sku-admin/toggle-auto-generation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleAutoGenerationResponse {
    pub auto_generation_enabled: bool,
    pub overridden_by_environment: bool,
    pub timestamp: DateTime<Utc>,
}

/// Response body for GET /sku-admin/auto-generation-status
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoGenerationStatusResponse {
    pub auto_generation_enabled: bool,
    pub is_disabled: bool,
    pub overridden_by_environment: bool,
}

/// Request body for POST /equipment-units
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEquipmentUnitRequest {
    pub sku: Option<String>,
    pub category_id: Option<i64>,
    pub brand_id: Option<i64>,
    pub brand_name: Option<String>,
}

/// Single equipment unit for API responses
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentUnitResponse {
    pub id: i64,
    pub sku: String,
    pub category_id: Option<i64>,
    pub brand_id: Option<i64>,
    pub created_at: String,
}

impl From<EquipmentUnitInfo> for EquipmentUnitResponse {
    fn from(unit: EquipmentUnitInfo) -> Self {
        Self {
            id: unit.id,
            sku: unit.sku,
            category_id: unit.category_id,
            brand_id: unit.brand_id,
            created_at: unit.created_at,
        }
    }
}

/// Request body for POST /categories
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: String,
    pub sku_prefix: Option<String>,
}

/// Single category for API responses
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub sku_prefix: Option<String>,
}

impl From<CategoryInfo> for CategoryResponse {
    fn from(category: CategoryInfo) -> Self {
        Self {
            id: category.id,
            name: category.name,
            sku_prefix: category.sku_prefix,
        }
    }
}

/// Response body for GET /categories
#[derive(Debug, Serialize)]
pub struct ListCategoriesResponse {
    pub categories: Vec<CategoryResponse>,
}

/// Request body for POST /brands
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertBrandRequest {
    pub brand_name: String,
    pub prefix: String,
}

/// Request body for PUT /brands/{id}/active
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBrandActiveRequest {
    pub is_active: bool,
}

/// Single brand for API responses
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandResponse {
    pub id: i64,
    pub brand_name: String,
    pub prefix: String,
    pub is_active: bool,
}

impl From<BrandInfo> for BrandResponse {
    fn from(brand: BrandInfo) -> Self {
        Self {
            id: brand.id,
            brand_name: brand.brand_name,
            prefix: brand.prefix,
            is_active: brand.is_active,
        }
    }
}

/// Response body for GET /brands
#[derive(Debug, Serialize)]
pub struct ListBrandsResponse {
    pub brands: Vec<BrandResponse>,
}
