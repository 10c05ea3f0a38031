use epg_sku::sku::{format_sku, normalize_manual_sku, parse_sku, validate_format, MAX_SEQUENCE};
use proptest::prelude::*;
use proptest::test_runner::Config;

proptest! {
    #![proptest_config(Config::with_cases(256))]
    #[test]
    fn sku_format_parse_roundtrip(
        category in "[A-Z]{2,3}",
        brand in "[A-Z]{3}",
        sequence in 1_i64..=MAX_SEQUENCE
    ) {
        let sku = format_sku(&category, &brand, sequence);
        prop_assert_eq!(sku.len(), 4 + category.len() + 1 + brand.len() + 1 + 5);
        prop_assert!(validate_format(&sku));

        let parts = parse_sku(&sku).expect("formatted SKU parses");
        prop_assert_eq!(&parts.category_prefix, &category);
        prop_assert_eq!(&parts.brand_prefix, &brand);
        prop_assert_eq!(parts.sequence, sequence);
        prop_assert_eq!(parts.to_string(), sku);
    }

    #[test]
    fn lowercase_prefixes_are_not_canonical(
        category in "[a-z]{2,3}",
        brand in "[A-Z]{3}",
        sequence in 1_i64..=MAX_SEQUENCE
    ) {
        let raw = format!("EPG-{category}-{brand}-{sequence:05}");
        prop_assert!(parse_sku(&raw).is_none());
    }

    #[test]
    fn generated_skus_survive_manual_normalization(
        category in "[A-Z]{2,3}",
        brand in "[A-Z]{3}",
        sequence in 1_i64..=MAX_SEQUENCE
    ) {
        let sku = format_sku(&category, &brand, sequence);
        let normalized = normalize_manual_sku(&sku.to_lowercase()).expect("valid manual SKU");
        prop_assert_eq!(normalized, sku);
    }
}
