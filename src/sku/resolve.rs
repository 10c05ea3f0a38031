//! Brand name to prefix resolution.
//!
//! Strategies are tried in order and the first match wins. Inactive brands
//! never match; an unmatched name falls back to [`FALLBACK_BRAND_PREFIX`].

use super::format::FALLBACK_BRAND_PREFIX;
use crate::catalog::BrandInfo;

/// A named matching rule between a requested brand name and a catalog brand.
pub struct BrandStrategy {
    pub name: &'static str,
    pub matches: fn(requested: &str, brand: &BrandInfo) -> bool,
}

fn exact_match(requested: &str, brand: &BrandInfo) -> bool {
    brand.brand_name.eq_ignore_ascii_case(requested)
}

fn substring_match(requested: &str, brand: &BrandInfo) -> bool {
    let requested = requested.to_lowercase();
    let candidate = brand.brand_name.to_lowercase();
    candidate.contains(&requested) || requested.contains(&candidate)
}

pub const BRAND_STRATEGIES: &[BrandStrategy] = &[
    BrandStrategy {
        name: "exact",
        matches: exact_match,
    },
    BrandStrategy {
        name: "substring",
        matches: substring_match,
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrandResolution {
    Matched {
        brand_id: i64,
        prefix: String,
        strategy: &'static str,
    },
    Fallback,
}

impl BrandResolution {
    pub fn prefix(&self) -> &str {
        match self {
            BrandResolution::Matched { prefix, .. } => prefix,
            BrandResolution::Fallback => FALLBACK_BRAND_PREFIX,
        }
    }

    pub fn brand_id(&self) -> Option<i64> {
        match self {
            BrandResolution::Matched { brand_id, .. } => Some(*brand_id),
            BrandResolution::Fallback => None,
        }
    }
}

pub fn resolve_brand(requested: &str, brands: &[BrandInfo]) -> BrandResolution {
    let requested = requested.trim();
    if requested.is_empty() {
        return BrandResolution::Fallback;
    }

    for strategy in BRAND_STRATEGIES {
        if let Some(brand) = brands
            .iter()
            .filter(|b| b.is_active)
            .find(|b| (strategy.matches)(requested, b))
        {
            return BrandResolution::Matched {
                brand_id: brand.id,
                prefix: brand.prefix.clone(),
                strategy: strategy.name,
            };
        }
    }

    BrandResolution::Fallback
}
