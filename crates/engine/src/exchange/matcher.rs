//! Free-text membership request → catalog entry
//!
//! Three tiers, the first with any hit wins:
//! 1. direct match against the catalog (brand, name, or a Chinese alias)
//! 2. built-in list lookup, mapped back onto catalog entries by brand
//! 3. built-in list hits as-is, only when the catalog is empty
//!
//! Hits are ranked direct first, then available today, then by stock
//! (descending) and cost (ascending). Ties keep catalog order.

use miwallet_core::{find_fallback, CatalogEntry};
use std::cmp::Ordering;

/// Request substring → brand tag
const BRAND_ALIASES: &[(&str, &str)] = &[
    ("腾讯", "tencent"),
    ("爱奇艺", "iqiyi"),
    ("优酷", "youku"),
    ("芒果", "mgtv"),
    ("哔哩哔哩", "bilibili"),
    ("b站", "bilibili"),
];

pub fn match_membership(requested: &str, catalog: &[CatalogEntry]) -> Option<CatalogEntry> {
    let wanted = requested.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }

    let mut hits: Vec<&CatalogEntry> = catalog
        .iter()
        .filter(|entry| matches_directly(&wanted, entry))
        .collect();

    if hits.is_empty() {
        hits = find_fallback(&wanted)
            .iter()
            .filter_map(|known| {
                catalog
                    .iter()
                    .find(|entry| entry.brand.eq_ignore_ascii_case(&known.brand))
            })
            .collect();
    }

    if hits.is_empty() && catalog.is_empty() {
        return best(find_fallback(&wanted).iter().collect());
    }

    best(hits)
}

fn matches_directly(wanted: &str, entry: &CatalogEntry) -> bool {
    let brand = entry.brand.to_lowercase();
    let name = entry.name.to_lowercase();

    if !brand.is_empty() && wanted.contains(&brand) {
        return true;
    }
    if name.contains(wanted) {
        return true;
    }
    BRAND_ALIASES
        .iter()
        .any(|(alias, tag)| wanted.contains(alias) && brand == *tag)
}

fn best(mut hits: Vec<&CatalogEntry>) -> Option<CatalogEntry> {
    hits.sort_by(|a, b| rank(a, b));
    hits.first().map(|entry| (*entry).clone())
}

fn rank(a: &CatalogEntry, b: &CatalogEntry) -> Ordering {
    b.is_direct()
        .cmp(&a.is_direct())
        .then(b.is_available_today().cmp(&a.is_available_today()))
        .then(b.stock.cmp(&a.stock))
        .then(a.cost.cmp(&b.cost))
}
