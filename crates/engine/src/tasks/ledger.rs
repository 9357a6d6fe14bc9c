//! Balance and today's reward events

use crate::context::RunLog;
use chrono::NaiveDate;
use miwallet_core::{events_on, Ledger, Result, DAILY_QUOTA, JOIN_LIST_PAGE_SIZE};
use miwallet_networking::ActivityApi;

/// Read the balance, then today's reward events. Either call failing fails the read.
pub async fn read_ledger(api: &dyn ActivityApi, today: NaiveDate) -> Result<Ledger> {
    let total = api.gold_rich_sum().await?;
    let records = api.user_join_list(1, JOIN_LIST_PAGE_SIZE).await?;

    Ok(Ledger {
        total,
        today_events: events_on(records, today),
    })
}

pub fn log_ledger(log: &mut RunLog, ledger: &Ledger) {
    log.info(format!("Balance: {} days", ledger.total));
    log.info(format!(
        "Rewards today: {}/{} (+{} days)",
        ledger.today_events.len(),
        DAILY_QUOTA,
        ledger.earned_today()
    ));
    for event in &ledger.today_events {
        log.info(format!("  {} +{} days", event.created_at, event.amount));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeApi;
    use miwallet_core::{CurrencyDays, Error, JoinRecord};

    fn record(time: &str, value: i64) -> JoinRecord {
        JoinRecord {
            create_time: time.to_string(),
            value,
        }
    }

    #[tokio::test]
    async fn test_ledger_normalizes_and_filters() {
        let api = FakeApi::new();
        {
            let mut state = api.state();
            state.balance_points = 3155;
            state.join_records = vec![
                record("2024-09-24 09:00:00", 8),
                record("2024-09-23 22:00:00", 10),
                record("2024-09-24 13:15:00", 12),
            ];
        }

        let today = NaiveDate::from_ymd_opt(2024, 9, 24).unwrap();
        let ledger = read_ledger(&api, today).await.unwrap();

        assert_eq!(ledger.total, CurrencyDays::from_points(3155));
        assert_eq!(ledger.total.to_string(), "31.55");
        assert_eq!(ledger.today_events.len(), 2);
        assert!(!ledger.quota_exhausted());

        let mut log = RunLog::default();
        log_ledger(&mut log, &ledger);
        assert_eq!(log.lines()[0], "Balance: 31.55 days");
        assert_eq!(log.lines()[1], "Rewards today: 2/3 (+0.20 days)");
    }

    #[tokio::test]
    async fn test_balance_failure_is_hard() {
        let api = FakeApi::new();
        api.state().balance_fails = true;

        let today = NaiveDate::from_ymd_opt(2024, 9, 24).unwrap();
        assert!(matches!(
            read_ledger(&api, today).await,
            Err(Error::ApplicationError { code: 500, .. })
        ));
        assert_eq!(api.count("user_join_list"), 0);
    }
}
