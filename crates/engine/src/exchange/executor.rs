//! Pre-redemption checks and the redemption call

use miwallet_core::{CatalogEntry, CurrencyDays, Error, ExchangeResult, Result};
use miwallet_networking::ActivityApi;
use tracing::{info, warn};

pub fn ensure_in_stock(entry: &CatalogEntry) -> Result<()> {
    if entry.is_available_today() {
        Ok(())
    } else {
        Err(Error::OutOfStock(entry.name.clone()))
    }
}

pub fn check_balance(entry: &CatalogEntry, balance: CurrencyDays) -> Result<()> {
    if balance < entry.cost {
        return Err(Error::InsufficientBalance {
            required: entry.cost,
            available: balance,
        });
    }
    Ok(())
}

/// Redeem `entry` for `phone_number`.
///
/// Stock is checked first and a sold-out entry never reaches the network.
/// Balance is not re-checked here. Every failure is folded into the result.
pub async fn exchange_membership(
    api: &dyn ActivityApi,
    entry: &CatalogEntry,
    phone_number: &str,
    requested_type: &str,
) -> ExchangeResult {
    if let Err(e) = ensure_in_stock(entry) {
        warn!("{}", e);
        return ExchangeResult::failed(requested_type, phone_number, e.to_string());
    }

    info!("Redeeming {} (prize {})", entry.name, entry.prize_id);
    match api.convert_gold_rich(&entry.id, phone_number).await {
        Ok(_) => {
            let message = format!("Redeemed {}", entry.name);
            info!("{}", message);
            ExchangeResult::succeeded(requested_type, phone_number, message)
        }
        Err(e) => {
            let message = failure_message(e);
            warn!("Redemption of {} failed: {}", entry.name, message);
            ExchangeResult::failed(requested_type, phone_number, message)
        }
    }
}

fn failure_message(err: Error) -> String {
    match err {
        Error::ApplicationError { message, .. } => Error::RedemptionRejected(message).to_string(),
        Error::HttpStatus(status) => format!("Network request failed: HTTP {}", status),
        other => format!("Redemption error: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeApi;
    use miwallet_core::{fallback_catalog, StockStatus, MONTHLY_CARD_COST};

    fn tencent() -> CatalogEntry {
        fallback_catalog().remove(0)
    }

    #[tokio::test]
    async fn test_out_of_stock_makes_no_network_call() {
        let api = FakeApi::new();
        let mut entry = tencent();
        entry.status = StockStatus::OutOfStock;

        let result = exchange_membership(&api, &entry, "13800000000", "腾讯").await;
        assert!(!result.success);
        assert_eq!(result.membership_type, "腾讯");
        assert!(result.message.contains("out of stock"));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_success() {
        let api = FakeApi::new();
        let result = exchange_membership(&api, &tencent(), "13800000000", "tencent").await;

        assert!(result.success);
        assert_eq!(result.message, "Redeemed 腾讯视频VIP月卡");
        assert_eq!(
            api.calls(),
            vec!["convert_gold_rich:tencent_video_month:13800000000".to_string()]
        );
    }

    #[tokio::test]
    async fn test_rejection_and_http_failure_messages() {
        let api = FakeApi::new();
        api.state().redemptions = vec![
            Err(Error::application(10012, Some("手机号格式错误".into()))),
            Err(Error::HttpStatus(502)),
        ]
        .into();

        let rejected = exchange_membership(&api, &tencent(), "1", "tencent").await;
        assert!(!rejected.success);
        assert_eq!(rejected.message, "Redemption rejected: 手机号格式错误");

        let http = exchange_membership(&api, &tencent(), "1", "tencent").await;
        assert_eq!(http.message, "Network request failed: HTTP 502");
    }

    #[test]
    fn test_balance_boundary() {
        let entry = tencent();
        assert!(check_balance(&entry, MONTHLY_CARD_COST).is_ok());
        assert!(matches!(
            check_balance(&entry, CurrencyDays::from_points(3099)),
            Err(Error::InsufficientBalance { .. })
        ));
    }
}
