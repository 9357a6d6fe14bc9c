//! Bounded in-memory record of recent runs

use miwallet_core::RunOutcome;
use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Number of outcomes kept
pub const HISTORY_LIMIT: usize = 50;

/// Thread-safe, append-only record of run outcomes.
/// Once full, recording evicts the oldest entry.
pub struct RunRecorder {
    entries: RwLock<VecDeque<RunOutcome>>,
    max_entries: usize,
}

impl Default for RunRecorder {
    fn default() -> Self {
        Self::with_capacity(HISTORY_LIMIT)
    }
}

impl RunRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(max_entries)),
            max_entries: max_entries.max(1),
        }
    }

    /// Seed from previously persisted outcomes (oldest first)
    pub fn from_outcomes(outcomes: Vec<RunOutcome>) -> Self {
        let recorder = Self::default();
        for outcome in outcomes {
            recorder.record(outcome);
        }
        recorder
    }

    /// A poisoned lock is recovered; the deque is valid after any panic
    /// in another holder, so no outcome is dropped.
    pub fn record(&self, outcome: RunOutcome) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        while entries.len() >= self.max_entries {
            if let Some(evicted) = entries.pop_front() {
                debug!("History full, evicting run {}", evicted.id);
            }
        }
        entries.push_back(outcome);
    }

    /// Newest first
    pub fn list(&self) -> Vec<RunOutcome> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.iter().rev().cloned().collect()
    }

    /// Oldest first, for persistence
    pub fn snapshot(&self) -> Vec<RunOutcome> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.iter().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<RunOutcome> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.iter().find(|o| o.id == id).cloned()
    }

    pub fn delete(&self, id: &str) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|o| o.id != id);
        entries.len() != before
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use miwallet_core::ExchangeResult;
    use std::sync::Arc;

    fn outcome(account: &str) -> RunOutcome {
        RunOutcome::new(account, Local::now())
    }

    #[test]
    fn test_record_and_get() {
        let recorder = RunRecorder::new();
        let run = outcome("main");
        let id = run.id.clone();
        recorder.record(run.clone());

        assert_eq!(recorder.get(&id), Some(run));
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn test_51st_insert_evicts_oldest() {
        let recorder = RunRecorder::new();
        let first = outcome("acct-0");
        let first_id = first.id.clone();
        recorder.record(first);
        for i in 1..=HISTORY_LIMIT {
            recorder.record(outcome(&format!("acct-{}", i)));
        }

        assert_eq!(recorder.len(), HISTORY_LIMIT);
        assert!(recorder.get(&first_id).is_none());
        assert_eq!(recorder.list()[0].account, "acct-50");
        assert_eq!(recorder.snapshot()[0].account, "acct-1");
    }

    #[test]
    fn test_delete_and_clear() {
        let recorder = RunRecorder::new();
        let run = outcome("main");
        let id = run.id.clone();
        recorder.record(run);
        recorder.record(outcome("other"));

        assert!(recorder.delete(&id));
        assert!(!recorder.delete(&id));
        assert_eq!(recorder.len(), 1);

        recorder.clear();
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_from_outcomes_keeps_newest() {
        let outcomes: Vec<_> = (0..60).map(|i| outcome(&format!("a{}", i))).collect();
        let recorder = RunRecorder::from_outcomes(outcomes);
        assert_eq!(recorder.len(), HISTORY_LIMIT);
        assert_eq!(recorder.snapshot()[0].account, "a10");
    }

    #[test]
    fn test_exchange_results_survive_recording() {
        let recorder = RunRecorder::new();
        let mut run = outcome("Membership exchange");
        run.success = true;
        run.exchange_results = vec![
            ExchangeResult::succeeded("腾讯视频", "13800000000", "兑换成功"),
            ExchangeResult::failed("爱奇艺", "13900000000", "余额不足"),
        ];
        let id = run.id.clone();
        recorder.record(run.clone());

        let stored = recorder.get(&id).unwrap();
        assert_eq!(stored.exchange_results, run.exchange_results);
        assert!(!stored.exchange_results[1].success);
        assert_eq!(recorder.snapshot()[0].exchange_results.len(), 2);
    }

    #[test]
    fn test_record_after_poisoned_lock() {
        let recorder = Arc::new(RunRecorder::new());
        recorder.record(outcome("before"));

        let poisoner = recorder.clone();
        let joined = std::thread::spawn(move || {
            let _guard = poisoner.entries.write().unwrap();
            panic!("writer died while holding the lock");
        })
        .join();
        assert!(joined.is_err());
        assert!(recorder.entries.is_poisoned());

        recorder.record(outcome("after"));
        assert_eq!(recorder.len(), 2);
        assert_eq!(recorder.list()[0].account, "after");
    }
}
