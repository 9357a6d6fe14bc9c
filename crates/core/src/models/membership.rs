//! Membership catalog entries and the built-in fallback catalog

use crate::models::wire::{deserialize_i64_lenient, deserialize_string_lenient};
use crate::types::CurrencyDays;
use serde::{Deserialize, Serialize};

/// Provider prize type for memberships that are redeemed directly
pub const DIRECT_PRIZE_TYPE: i64 = 26;

/// A monthly card costs 31 days
pub const MONTHLY_CARD_COST: CurrencyDays = CurrencyDays::from_points(3100);

const FALLBACK_STOCK: i64 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeKind {
    Direct,
    Privilege,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    Available,
    OutOfStock,
}

/// A redeemable membership
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Prize code, used as the redemption key
    pub id: String,
    pub prize_id: String,
    pub name: String,
    pub description: String,
    pub cost: CurrencyDays,
    pub kind: ExchangeKind,
    /// Today's stock
    pub status: StockStatus,
    /// Base stock flag from the provider (1 = stocked), 999 for fallback entries
    pub stock: i64,
    pub brand: String,
    pub prize_batch_id: String,
    pub prize_type: i64,
}

impl CatalogEntry {
    pub fn is_direct(&self) -> bool {
        self.kind == ExchangeKind::Direct
    }

    pub fn is_available_today(&self) -> bool {
        self.status == StockStatus::Available
    }

    /// Raw provider point cost
    pub fn need_gold_rice(&self) -> i64 {
        self.cost.points()
    }

    fn fallback(id: &str, prize_id: &str, name: &str, brand: &str) -> Self {
        Self {
            id: id.to_string(),
            prize_id: prize_id.to_string(),
            name: name.to_string(),
            description: format!("{} (built-in)", name),
            cost: MONTHLY_CARD_COST,
            kind: ExchangeKind::Direct,
            status: StockStatus::Available,
            stock: FALLBACK_STOCK,
            brand: brand.to_string(),
            prize_batch_id: String::new(),
            prize_type: DIRECT_PRIZE_TYPE,
        }
    }
}

/// Raw prize record from the prize-status endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrizeRecord {
    #[serde(default, deserialize_with = "deserialize_string_lenient")]
    pub prize_id: String,
    #[serde(default)]
    pub prize_name: String,
    #[serde(default)]
    pub prize_brand: String,
    #[serde(default, deserialize_with = "deserialize_i64_lenient")]
    pub need_gold_rice: i64,
    #[serde(default, deserialize_with = "deserialize_string_lenient")]
    pub prize_code: String,
    #[serde(default, deserialize_with = "deserialize_i64_lenient")]
    pub stock_status: i64,
    #[serde(default, deserialize_with = "deserialize_i64_lenient")]
    pub today_stock_status: i64,
    #[serde(default, deserialize_with = "deserialize_i64_lenient")]
    pub prize_type: i64,
    #[serde(default)]
    pub prize_desc: String,
    #[serde(default, deserialize_with = "deserialize_string_lenient")]
    pub prize_batch_id: String,
}

impl PrizeRecord {
    fn is_privilege(&self) -> bool {
        self.prize_name.contains("1分购") || self.prize_name.contains("特权")
    }

    /// Direct monthly card with base stock, not a privilege/low-price offer
    pub fn is_eligible(&self) -> bool {
        !self.prize_id.is_empty()
            && self.stock_status == 1
            && CurrencyDays::from_points(self.need_gold_rice) == MONTHLY_CARD_COST
            && self.prize_type == DIRECT_PRIZE_TYPE
            && !self.is_privilege()
    }

    pub fn into_entry(self) -> Option<CatalogEntry> {
        if !self.is_eligible() {
            return None;
        }

        let status = if self.today_stock_status == 1 {
            StockStatus::Available
        } else {
            StockStatus::OutOfStock
        };

        Some(CatalogEntry {
            id: self.prize_code,
            prize_id: self.prize_id,
            name: self.prize_name,
            description: self.prize_desc,
            cost: CurrencyDays::from_points(self.need_gold_rice),
            kind: ExchangeKind::Direct,
            status,
            stock: self.stock_status,
            brand: self.prize_brand,
            prize_batch_id: self.prize_batch_id,
            prize_type: self.prize_type,
        })
    }
}

/// The five brands redeemable when the live catalog is unavailable
pub fn fallback_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::fallback(
            "tencent_video_month",
            "tencent_month",
            "腾讯视频VIP月卡",
            "tencent",
        ),
        CatalogEntry::fallback("iqiyi_video_month", "iqiyi_month", "爱奇艺黄金VIP月卡", "iqiyi"),
        CatalogEntry::fallback("youku_video_month", "youku_month", "优酷VIP月卡", "youku"),
        CatalogEntry::fallback("mgtv_video_month", "mgtv_month", "芒果TV会员月卡", "mgtv"),
        CatalogEntry::fallback(
            "bilibili_video_month",
            "bilibili_month",
            "哔哩哔哩大会员月卡",
            "bilibili",
        ),
    ]
}

/// Fallback entries whose name contains the request, or whose brand
/// contains or is contained in it (case-insensitive)
pub fn find_fallback(requested: &str) -> Vec<CatalogEntry> {
    let wanted = requested.trim().to_lowercase();
    if wanted.is_empty() {
        return Vec::new();
    }

    fallback_catalog()
        .into_iter()
        .filter(|entry| {
            let name = entry.name.to_lowercase();
            let brand = entry.brand.to_lowercase();
            name.contains(&wanted) || brand.contains(&wanted) || wanted.contains(&brand)
        })
        .collect()
}
