//! Batch results and their notification text

use chrono::{DateTime, Local};
use miwallet_core::{ExchangeResult, RunOutcome};

/// Detail lines included in a notification before the rest is only counted
const NOTIFICATION_DETAIL_LINES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    DailyTasks,
    MembershipExchange,
}

/// What a run over all accounts produced
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub kind: BatchKind,
    /// Accounts for a task batch, redemptions for an exchange batch
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
    pub exchange_results: Vec<ExchangeResult>,
    /// Outcomes recorded during the batch, in run order
    pub outcomes: Vec<RunOutcome>,
    pub cancelled: bool,
    pub finished_at: DateTime<Local>,
}

impl BatchSummary {
    pub(crate) fn for_tasks(outcomes: Vec<RunOutcome>, total: usize, cancelled: bool) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.success).count();
        Self {
            kind: BatchKind::DailyTasks,
            succeeded,
            failed: outcomes.len() - succeeded,
            total,
            exchange_results: Vec::new(),
            outcomes,
            cancelled,
            finished_at: Local::now(),
        }
    }

    pub(crate) fn for_exchange(outcome: RunOutcome, cancelled: bool) -> Self {
        let exchange_results = outcome.exchange_results.clone();
        let succeeded = exchange_results.iter().filter(|r| r.success).count();
        Self {
            kind: BatchKind::MembershipExchange,
            succeeded,
            failed: exchange_results.len() - succeeded,
            total: exchange_results.len(),
            exchange_results,
            outcomes: vec![outcome],
            cancelled,
            finished_at: Local::now(),
        }
    }

    pub fn notification_title(&self) -> String {
        match self.kind {
            BatchKind::DailyTasks => "Xiaomi wallet daily tasks finished".to_string(),
            BatchKind::MembershipExchange => "Xiaomi wallet membership exchange finished".to_string(),
        }
    }

    pub fn notification_body(&self) -> String {
        let mut lines = Vec::new();

        match self.kind {
            BatchKind::DailyTasks => {
                lines.push("📊 Results:".to_string());
                lines.push(format!("✅ Succeeded accounts: {}", self.succeeded));
                lines.push(format!("❌ Failed accounts: {}", self.failed));
                lines.push(format!("📱 Total accounts: {}", self.total));
            }
            BatchKind::MembershipExchange => {
                lines.push("🎁 Results:".to_string());
                lines.push(format!("✅ Redeemed: {}", self.succeeded));
                lines.push(format!("❌ Failed: {}", self.failed));
                lines.push(format!("📊 Total: {}", self.total));
                lines.push(String::new());
                lines.push("📋 Details:".to_string());
                for result in self.exchange_results.iter().take(NOTIFICATION_DETAIL_LINES) {
                    lines.push(format!("• {}", result.summary_line()));
                }
                if self.exchange_results.len() > NOTIFICATION_DETAIL_LINES {
                    lines.push(format!(
                        "... {} more",
                        self.exchange_results.len() - NOTIFICATION_DETAIL_LINES
                    ));
                }
                lines.push(String::new());
            }
        }

        if self.cancelled {
            lines.push("⚠️ Run was cancelled".to_string());
        }
        lines.push(format!(
            "📅 Finished: {}",
            self.finished_at.format("%Y-%m-%d %H:%M:%S")
        ));
        lines.join("\n")
    }
}
