//! Canonical SKU layout: `EPG-<CATEGORY>-<BRAND>-<SEQUENCE>`.
//!
//! Category prefixes are 2-3 uppercase ASCII letters, brand prefixes exactly
//! [`BRAND_PREFIX_LEN`] letters and the sequence is zero-padded to
//! [`SEQUENCE_DIGITS`] digits.

use std::fmt;

pub const SKU_NAMESPACE: &str = "EPG";

/// Width of the numeric tail.
pub const SEQUENCE_DIGITS: usize = 5;

/// Largest sequence that still fits in [`SEQUENCE_DIGITS`] digits.
pub const MAX_SEQUENCE: i64 = 99_999;

pub const MIN_CATEGORY_PREFIX_LEN: usize = 2;
pub const MAX_CATEGORY_PREFIX_LEN: usize = 3;
pub const BRAND_PREFIX_LEN: usize = 3;

/// Prefix used when a brand cannot be matched to an active brand.
pub const FALLBACK_BRAND_PREFIX: &str = "GEN";

/// Decomposed auto-generated SKU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkuParts {
    pub category_prefix: String,
    pub brand_prefix: String,
    pub sequence: i64,
}

impl fmt::Display for SkuParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{:0width$}",
            SKU_NAMESPACE,
            self.category_prefix,
            self.brand_prefix,
            self.sequence,
            width = SEQUENCE_DIGITS
        )
    }
}

/// Build the canonical SKU string.
///
/// Prefix validity and `1..=MAX_SEQUENCE` are the caller's responsibility.
pub fn format_sku(category_prefix: &str, brand_prefix: &str, sequence: i64) -> String {
    debug_assert!(sequence > 0, "sequence must be positive");
    debug_assert!(!category_prefix.is_empty() && !brand_prefix.is_empty());

    SkuParts {
        category_prefix: category_prefix.to_string(),
        brand_prefix: brand_prefix.to_string(),
        sequence,
    }
    .to_string()
}

/// Split a canonical SKU back into its parts.
///
/// Returns `None` for anything that is not an auto-generated SKU, which is how
/// callers tell auto-generated SKUs apart from manual ones.
pub fn parse_sku(sku: &str) -> Option<SkuParts> {
    let mut segments = sku.split('-');
    let namespace = segments.next()?;
    let category = segments.next()?;
    let brand = segments.next()?;
    let sequence = segments.next()?;
    if segments.next().is_some() || namespace != SKU_NAMESPACE {
        return None;
    }

    if !is_valid_category_prefix(category) || !is_valid_brand_prefix(brand) {
        return None;
    }

    if sequence.len() != SEQUENCE_DIGITS || !sequence.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let sequence: i64 = sequence.parse().ok()?;
    if sequence == 0 {
        return None;
    }

    Some(SkuParts {
        category_prefix: category.to_string(),
        brand_prefix: brand.to_string(),
        sequence,
    })
}

/// Structural check only; does not consult storage.
pub fn validate_format(sku: &str) -> bool {
    parse_sku(sku).is_some()
}

pub fn is_valid_category_prefix(prefix: &str) -> bool {
    (MIN_CATEGORY_PREFIX_LEN..=MAX_CATEGORY_PREFIX_LEN).contains(&prefix.len())
        && prefix.bytes().all(|b| b.is_ascii_uppercase())
}

pub fn is_valid_brand_prefix(prefix: &str) -> bool {
    prefix.len() == BRAND_PREFIX_LEN && prefix.bytes().all(|b| b.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pads_sequence() {
        assert_eq!(format_sku("LT", "CHV", 1), "EPG-LT-CHV-00001");
        assert_eq!(format_sku("AUD", "SHU", 420), "EPG-AUD-SHU-00420");
        assert_eq!(format_sku("LT", "CHV", MAX_SEQUENCE), "EPG-LT-CHV-99999");
    }

    #[test]
    fn test_parse_inverts_format() {
        for (cat, brand, seq) in [("LT", "CHV", 1), ("AUD", "GEN", 12345), ("VD", "ADJ", 99999)] {
            let parsed = parse_sku(&format_sku(cat, brand, seq)).unwrap();
            assert_eq!(parsed.category_prefix, cat);
            assert_eq!(parsed.brand_prefix, brand);
            assert_eq!(parsed.sequence, seq);
        }
    }

    #[test]
    fn test_parse_rejects_manual_skus() {
        assert!(parse_sku("CUSTOM-123").is_none());
        assert!(parse_sku("EPG-LT-CHV-0001").is_none());
        assert!(parse_sku("EPG-LT-CHV-000001").is_none());
        assert!(parse_sku("EPG-LT-CHV-00000").is_none());
        assert!(parse_sku("EPG-lt-CHV-00001").is_none());
        assert!(parse_sku("EPG-L-CHV-00001").is_none());
        assert!(parse_sku("EPG-LT-CH-00001").is_none());
        assert!(parse_sku("ABC-LT-CHV-00001").is_none());
        assert!(parse_sku("EPG-LT-CHV-00001-X").is_none());
        assert!(parse_sku("EPG-LT-CHV-0000A").is_none());
        assert!(parse_sku("").is_none());
    }

    #[test]
    fn test_validate_format() {
        assert!(validate_format("EPG-LT-CHV-00001"));
        assert!(!validate_format("LT-CHV-00001"));
    }

    #[test]
    fn test_prefix_rules() {
        assert!(is_valid_category_prefix("LT"));
        assert!(is_valid_category_prefix("AUD"));
        assert!(!is_valid_category_prefix("L"));
        assert!(!is_valid_category_prefix("LIGH"));
        assert!(!is_valid_category_prefix("L1"));
        assert!(is_valid_brand_prefix("CHV"));
        assert!(!is_valid_brand_prefix("CH"));
        assert!(!is_valid_brand_prefix("chv"));
    }
}
