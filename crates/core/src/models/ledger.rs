//! Balance and today's reward events

use crate::models::wire::{deserialize_i64_lenient, deserialize_string_lenient};
use crate::types::CurrencyDays;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of reward events per day after which the account is done for today
pub const DAILY_QUOTA: usize = 3;

/// Page size used when reading the reward history
pub const JOIN_LIST_PAGE_SIZE: u32 = 20;

/// A single entry of the reward history, as returned by `queryUserJoinList`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRecord {
    #[serde(default, deserialize_with = "deserialize_string_lenient")]
    pub create_time: String,
    #[serde(default, deserialize_with = "deserialize_i64_lenient")]
    pub value: i64,
}

/// `value` of the join list response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JoinListPage {
    #[serde(default)]
    pub data: Vec<JoinRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardEvent {
    pub created_at: String,
    pub amount: CurrencyDays,
}

/// Balance plus the reward events recorded today
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub total: CurrencyDays,
    pub today_events: Vec<RewardEvent>,
}

impl Ledger {
    pub fn quota_exhausted(&self) -> bool {
        is_quota_exhausted(self.today_events.len())
    }

    pub fn earned_today(&self) -> CurrencyDays {
        self.today_events
            .iter()
            .fold(CurrencyDays::ZERO, |acc, e| acc.saturating_add(e.amount))
    }
}

pub fn is_quota_exhausted(event_count: usize) -> bool {
    event_count >= DAILY_QUOTA
}

/// Keep records whose timestamp starts with `YYYY-MM-DD` of the given date.
/// Matching is on the string prefix; timestamps are not parsed.
pub fn events_on<I>(records: I, date: NaiveDate) -> Vec<RewardEvent>
where
    I: IntoIterator<Item = JoinRecord>,
{
    let prefix = date.format("%Y-%m-%d").to_string();
    records
        .into_iter()
        .filter(|r| r.create_time.starts_with(&prefix))
        .map(|r| RewardEvent {
            created_at: r.create_time,
            amount: CurrencyDays::from_points(r.value),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(time: &str, value: i64) -> JoinRecord {
        JoinRecord {
            create_time: time.to_string(),
            value,
        }
    }

    #[test]
    fn test_quota_boundary() {
        assert!(!is_quota_exhausted(2));
        assert!(is_quota_exhausted(3));
        assert!(is_quota_exhausted(4));
    }

    #[test]
    fn test_events_filtered_by_date_prefix() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        let events = events_on(
            vec![
                record("2026-03-07 08:00:01", 10),
                record("2026-03-06 23:59:59", 25),
                record("2026-03-07 12:30:00", 15),
                record("", 99),
            ],
            date,
        );

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].amount, CurrencyDays::from_points(10));

        let ledger = Ledger {
            total: CurrencyDays::from_points(3155),
            today_events: events,
        };
        assert_eq!(ledger.earned_today(), CurrencyDays::from_points(25));
        assert!(!ledger.quota_exhausted());
    }

    #[test]
    fn test_iso_timestamps_match_by_date() {
        let date = NaiveDate::from_ymd_opt(2024, 9, 24).unwrap();
        let events = events_on(
            vec![
                record("2024-09-24T10:00:00", 40),
                record("2024-01-01T10:00:00", 70),
            ],
            date,
        );

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].created_at, "2024-09-24T10:00:00");
        assert_eq!(events[0].amount, CurrencyDays::from_points(40));
    }

    #[test]
    fn test_join_list_tolerates_string_values() {
        let page: JoinListPage = serde_json::from_str(
            r#"{"data":[{"createTime":"2026-03-07 08:00:01","value":"12"},{"value":3}]}"#,
        )
        .unwrap();
        assert_eq!(page.data[0].value, 12);
        assert_eq!(page.data[1].create_time, "");
    }
}
