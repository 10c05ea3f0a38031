/// Errors from SKU allocation and sequence administration.
#[derive(Debug, thiserror::Error)]
pub enum SkuError {
    /// Malformed manual SKU, missing reference, or auto-generation disabled.
    #[error("{0}")]
    Validation(String),

    /// A category or brand reference could not be turned into a prefix.
    #[error("{0}")]
    Resolution(String),

    #[error(
        "Could not allocate a unique SKU after {attempts} attempts (last candidate '{last_candidate}')"
    )]
    AllocationExhausted {
        attempts: u32,
        last_candidate: String,
    },

    #[error("Sequence {category_prefix}-{brand_prefix} has no capacity left (max {max})")]
    CapacityExceeded {
        category_prefix: String,
        brand_prefix: String,
        max: i64,
    },

    #[error("{0}")]
    InvalidReset(String),

    #[error("No sequence exists for {category_prefix}-{brand_prefix}")]
    SequenceNotFound {
        category_prefix: String,
        brand_prefix: String,
    },

    #[error("Brand {0} not found")]
    BrandNotFound(i64),

    #[error("SKU '{0}' is already assigned to another unit")]
    DuplicateSku(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl SkuError {
    pub fn validation(message: impl Into<String>) -> Self {
        SkuError::Validation(message.into())
    }

    pub fn resolution(message: impl Into<String>) -> Self {
        SkuError::Resolution(message.into())
    }

    /// Whether resubmitting the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SkuError::AllocationExhausted { .. })
    }
}
