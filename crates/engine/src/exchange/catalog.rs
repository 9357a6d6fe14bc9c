//! Live membership catalog with a built-in fallback

use miwallet_core::{fallback_catalog, CatalogEntry, PrizeRecord, Result};
use miwallet_networking::ActivityApi;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    Live,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    pub entries: Vec<CatalogEntry>,
    pub source: CatalogSource,
}

/// Never fails: any error or an empty eligible set yields the fallback catalog
pub async fn fetch_catalog(api: &dyn ActivityApi) -> Catalog {
    build_catalog(api.prize_status().await)
}

pub fn build_catalog(records: Result<Vec<PrizeRecord>>) -> Catalog {
    let records = match records {
        Ok(records) => records,
        Err(e) => {
            warn!("Prize catalog unavailable, using built-in list: {}", e);
            return fallback();
        }
    };

    let total = records.len();
    let entries: Vec<CatalogEntry> = records
        .into_iter()
        .filter_map(PrizeRecord::into_entry)
        .collect();
    debug!("{} of {} prize records are eligible", entries.len(), total);

    if entries.is_empty() {
        warn!("No eligible memberships in the live catalog, using built-in list");
        return fallback();
    }

    Catalog {
        entries,
        source: CatalogSource::Live,
    }
}

fn fallback() -> Catalog {
    Catalog {
        entries: fallback_catalog(),
        source: CatalogSource::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{prize, FakeApi};
    use miwallet_core::Error;

    #[test]
    fn test_transport_error_falls_back() {
        let catalog = build_catalog(Err(Error::TransportError("timeout".into())));
        assert_eq!(catalog.source, CatalogSource::Fallback);
        assert_eq!(catalog.entries.len(), 5);
        assert_eq!(catalog.entries[0].id, fallback_catalog()[0].id);
    }

    #[test]
    fn test_no_eligible_records_falls_back() {
        let privilege = prize("c1", "腾讯视频1分购", "tencent", 1);
        let catalog = build_catalog(Ok(vec![privilege]));
        assert_eq!(catalog.source, CatalogSource::Fallback);
    }

    #[tokio::test]
    async fn test_live_catalog_keeps_eligible_only() {
        let api = FakeApi::new();
        let mut weekly = prize("c2", "优酷VIP周卡", "youku", 1);
        weekly.need_gold_rice = 700;
        api.state().prizes = Some(vec![prize("c1", "腾讯视频VIP月卡", "tencent", 1), weekly]);

        let catalog = fetch_catalog(&api).await;
        assert_eq!(catalog.source, CatalogSource::Live);
        assert_eq!(catalog.entries.len(), 1);
        assert_eq!(catalog.entries[0].id, "c1");
    }
}
