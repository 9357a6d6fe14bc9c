//! Run outcomes and exchange results

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeResult {
    pub membership_type: String,
    pub phone_number: String,
    pub success: bool,
    pub message: String,
}

impl ExchangeResult {
    pub fn succeeded(
        membership_type: impl Into<String>,
        phone_number: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            membership_type: membership_type.into(),
            phone_number: phone_number.into(),
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(
        membership_type: impl Into<String>,
        phone_number: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            ..Self::succeeded(membership_type, phone_number, message)
        }
    }

    /// One-line summary used in logs and notifications
    pub fn summary_line(&self) -> String {
        let mark = if self.success { "✅" } else { "❌" };
        format!("{} {}: {}", mark, self.membership_type, self.message)
    }
}

/// Recorded result of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub id: String,
    pub account: String,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub exchange_results: Vec<ExchangeResult>,
}

impl RunOutcome {
    pub fn new(account: impl Into<String>, started_at: DateTime<Local>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            account: account.into(),
            started_at,
            finished_at: started_at,
            success: false,
            error_message: None,
            logs: Vec::new(),
            exchange_results: Vec::new(),
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// e.g. `2m 05s`
    pub fn duration_label(&self) -> String {
        let secs = self.duration().num_seconds().max(0);
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_label() {
        let start = Local::now();
        let mut outcome = RunOutcome::new("main", start);
        outcome.finished_at = start + chrono::Duration::seconds(125);
        assert_eq!(outcome.duration_label(), "2m 05s");
    }

    #[test]
    fn test_ids_are_unique() {
        let now = Local::now();
        assert_ne!(RunOutcome::new("a", now).id, RunOutcome::new("a", now).id);
    }

    #[test]
    fn test_summary_line() {
        let ok = ExchangeResult::succeeded("tencent", "138", "redeemed 腾讯视频VIP月卡");
        assert_eq!(ok.summary_line(), "✅ tencent: redeemed 腾讯视频VIP月卡");
        let failed = ExchangeResult::failed("iqiyi", "138", "no match");
        assert!(!failed.success);
        assert!(failed.summary_line().starts_with("❌"));
    }
}
