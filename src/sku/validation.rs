/// Minimum length of an operator-supplied SKU.
pub const MIN_MANUAL_SKU_LEN: usize = 3;

/// Checks the structural rules for a manual SKU and returns the normalized
/// (trimmed, uppercase) form. Uniqueness is checked by the allocator.
///
/// Valid SKUs: at least 3 characters of A-Z, 0-9 and `-` once uppercased.
pub fn normalize_manual_sku(sku: &str) -> Result<String, ManualSkuError> {
    let trimmed = sku.trim();
    if trimmed.is_empty() {
        return Err(ManualSkuError::Empty);
    }
    if trimmed.chars().count() < MIN_MANUAL_SKU_LEN {
        return Err(ManualSkuError::TooShort);
    }

    let normalized = trimmed.to_ascii_uppercase();
    if !normalized
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ManualSkuError::InvalidCharacters);
    }
    Ok(normalized)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManualSkuError {
    #[error("SKU cannot be empty")]
    Empty,

    #[error("SKU must be at least 3 characters long")]
    TooShort,

    #[error("SKU can only contain letters, numbers, and hyphens")]
    InvalidCharacters,

    #[error("SKU '{0}' is already in use")]
    AlreadyInUse(String),
}

impl From<ManualSkuError> for super::SkuError {
    fn from(e: ManualSkuError) -> Self {
        super::SkuError::Validation(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_skus() {
        assert_eq!(normalize_manual_sku("ABC").unwrap(), "ABC");
        assert_eq!(normalize_manual_sku("lt-chv-7").unwrap(), "LT-CHV-7");
        assert_eq!(normalize_manual_sku("  rig-01  ").unwrap(), "RIG-01");
        assert_eq!(
            normalize_manual_sku("EPG-LT-CHV-00003").unwrap(),
            "EPG-LT-CHV-00003"
        );
    }

    #[test]
    fn test_empty_sku() {
        assert_eq!(normalize_manual_sku(""), Err(ManualSkuError::Empty));
        assert_eq!(normalize_manual_sku("   \t"), Err(ManualSkuError::Empty));
    }

    #[test]
    fn test_short_sku_checked_before_charset() {
        assert_eq!(normalize_manual_sku("ab"), Err(ManualSkuError::TooShort));
        assert_eq!(normalize_manual_sku("a!"), Err(ManualSkuError::TooShort));
    }

    #[test]
    fn test_invalid_characters() {
        assert_eq!(
            normalize_manual_sku("has space"),
            Err(ManualSkuError::InvalidCharacters)
        );
        assert_eq!(
            normalize_manual_sku("EPG_LT_1"),
            Err(ManualSkuError::InvalidCharacters)
        );
        assert_eq!(
            normalize_manual_sku("ÉPG-1"),
            Err(ManualSkuError::InvalidCharacters)
        );
    }

    #[test]
    fn test_messages_are_operator_facing() {
        assert_eq!(
            ManualSkuError::TooShort.to_string(),
            "SKU must be at least 3 characters long"
        );
        assert_eq!(
            ManualSkuError::AlreadyInUse("ABC".into()).to_string(),
            "SKU 'ABC' is already in use"
        );
    }
}
