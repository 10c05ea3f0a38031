//! SKU generation and sequence allocation.
//!
//! Auto-generated SKUs have the form `EPG-<CATEGORY>-<BRAND>-<00001>`:
//!
//! - `format` builds and parses the canonical string
//! - `validation` checks operator-supplied manual SKUs
//! - `resolve` turns brand names into prefixes
//! - [`SkuAllocator`] runs the collision-retry loop against the catalog's
//!   sequence counters and carries the admin/reporting operations

mod admin;
mod allocator;
mod error;
pub mod format;
pub mod resolve;
pub mod validation;

pub use admin::{
    AutoGenerationStatus, SequenceReset, SequenceSummary, SequenceUsage, SkuStatistics,
};
pub use allocator::{
    GeneratedSku, KillSwitch, SequenceKey, SkuAllocator, UnitRequest, AUTO_GENERATION_SETTING,
    DEFAULT_KILL_SWITCH_ENV, MAX_COLLISION_RETRIES,
};
pub use error::SkuError;
pub use format::{format_sku, parse_sku, validate_format, SkuParts, MAX_SEQUENCE};
pub use validation::{normalize_manual_sku, ManualSkuError};
