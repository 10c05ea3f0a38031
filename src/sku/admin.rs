//! Reporting and administrative overrides for sequence counters.

use super::allocator::{SequenceKey, SkuAllocator, AUTO_GENERATION_SETTING};
use super::error::SkuError;
use super::format::MAX_SEQUENCE;
use crate::catalog::SequenceRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceUsage {
    pub brand_prefix: String,
    /// Next number the counter will issue, not the last one handed out.
    /// Reads `MAX_SEQUENCE + 1` once the key is exhausted, with
    /// `remaining_capacity` at 0.
    pub current_sequence: i64,
    pub remaining_capacity: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuStatistics {
    pub total_instances: i64,
    /// Keyed by category prefix.
    pub sequences_by_category: BTreeMap<String, Vec<SequenceUsage>>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceSummary {
    pub category_prefix: String,
    pub category_name: Option<String>,
    pub brand_prefix: String,
    pub brand_name: Option<String>,
    /// Next number to issue; see [`SequenceUsage::current_sequence`].
    pub current_sequence: i64,
    pub last_used: Option<String>,
    /// None once the counter has run past capacity.
    #[serde(rename = "nextSKU")]
    pub next_sku: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceReset {
    pub old_sequence: i64,
    pub new_sequence: i64,
    pub next_sku: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoGenerationStatus {
    /// Effective value used by generation.
    pub enabled: bool,
    /// Value persisted in system settings.
    pub stored: bool,
    pub disabled_by_environment: bool,
}

fn remaining_capacity(current_sequence: i64) -> i64 {
    (MAX_SEQUENCE - current_sequence + 1).max(0)
}

impl SkuAllocator {
    pub async fn statistics(&self) -> Result<SkuStatistics, SkuError> {
        let total_instances = self.catalog.count_equipment_units().await?;
        let sequences = self.catalog.list_sequences().await?;

        let mut sequences_by_category: BTreeMap<String, Vec<SequenceUsage>> = BTreeMap::new();
        for record in sequences {
            sequences_by_category
                .entry(record.category_prefix)
                .or_default()
                .push(SequenceUsage {
                    brand_prefix: record.brand_prefix,
                    current_sequence: record.current_sequence,
                    remaining_capacity: remaining_capacity(record.current_sequence),
                });
        }

        Ok(SkuStatistics {
            total_instances,
            sequences_by_category,
            last_updated: Utc::now(),
        })
    }

    /// All counters with display names and the SKU each would issue next.
    pub async fn list_sequences(&self) -> Result<Vec<SequenceSummary>, SkuError> {
        let categories: HashMap<String, String> = self
            .catalog
            .list_categories()
            .await?
            .into_iter()
            .filter_map(|c| c.sku_prefix.map(|p| (p, c.name)))
            .collect();

        // Active brands take precedence over deactivated ones sharing a prefix
        let mut brands: HashMap<String, String> = HashMap::new();
        for brand in self.catalog.list_brands().await? {
            if brand.is_active || !brands.contains_key(&brand.prefix) {
                brands.insert(brand.prefix, brand.brand_name);
            }
        }

        let summaries = self
            .catalog
            .list_sequences()
            .await?
            .into_iter()
            .map(|record: SequenceRecord| {
                let next_sku = (record.current_sequence <= MAX_SEQUENCE).then(|| {
                    SequenceKey::new(record.category_prefix.as_str(), record.brand_prefix.as_str())
                        .format(record.current_sequence.max(1))
                });
                SequenceSummary {
                    category_name: categories.get(&record.category_prefix).cloned(),
                    brand_name: brands.get(&record.brand_prefix).cloned(),
                    category_prefix: record.category_prefix,
                    brand_prefix: record.brand_prefix,
                    current_sequence: record.current_sequence,
                    last_used: record.last_used,
                    next_sku,
                }
            })
            .collect();

        Ok(summaries)
    }

    /// Administrative override of a counter.
    ///
    /// Does not check the new range against already-issued SKUs; the
    /// collision-retry loop skips any that exist when allocation reaches them.
    #[tracing::instrument(
        name = "reset_sequence",
        skip(self),
        fields(epg.category_prefix = %category_prefix, epg.brand_prefix = %brand_prefix)
    )]
    pub async fn reset_sequence(
        &self,
        category_prefix: &str,
        brand_prefix: &str,
        new_sequence: i64,
    ) -> Result<SequenceReset, SkuError> {
        if !(1..=MAX_SEQUENCE).contains(&new_sequence) {
            return Err(SkuError::InvalidReset(format!(
                "Sequence must be between 1 and {}, got {}",
                MAX_SEQUENCE, new_sequence
            )));
        }
        let key = SequenceKey::parse(category_prefix, brand_prefix)?;

        let old_sequence = self
            .catalog
            .reset_sequence(&key.category_prefix, &key.brand_prefix, new_sequence)
            .await?
            .ok_or_else(|| SkuError::SequenceNotFound {
                category_prefix: key.category_prefix.clone(),
                brand_prefix: key.brand_prefix.clone(),
            })?;

        warn!(
            old_sequence,
            new_sequence, "Sequence reset by administrator"
        );

        Ok(SequenceReset {
            old_sequence,
            new_sequence,
            next_sku: key.format(new_sequence),
        })
    }

    pub async fn toggle_auto_generation(
        &self,
        enabled: bool,
    ) -> Result<AutoGenerationStatus, SkuError> {
        self.catalog
            .put_setting(AUTO_GENERATION_SETTING, if enabled { "true" } else { "false" })
            .await?;
        info!(enabled, "Auto SKU generation toggled");

        let status = self.auto_generation_status().await?;
        if enabled && status.disabled_by_environment {
            warn!(
                env = self.kill_switch.env_var(),
                "Auto SKU generation stays disabled by environment override"
            );
        }
        Ok(status)
    }

    pub async fn auto_generation_status(&self) -> Result<AutoGenerationStatus, SkuError> {
        let disabled_by_environment = self.kill_switch.engaged();
        let stored = self.stored_auto_generation().await?;
        Ok(AutoGenerationStatus {
            enabled: stored && !disabled_by_environment,
            stored,
            disabled_by_environment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::remaining_capacity;

    #[test]
    fn test_remaining_capacity() {
        assert_eq!(remaining_capacity(1), 99_999);
        assert_eq!(remaining_capacity(99_999), 1);
        assert_eq!(remaining_capacity(100_000), 0);
        assert_eq!(remaining_capacity(100_001), 0);
    }
}
