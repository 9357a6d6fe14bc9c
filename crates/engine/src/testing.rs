//! In-memory activity API for engine tests

use async_trait::async_trait;
use miwallet_core::{
    Account, ActivityUrlInfo, CurrencyDays, Error, JoinRecord, PrizeRecord, Result, TaskInfo,
};
use miwallet_networking::{ActivityApi, SessionConnector};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
pub struct FakeState {
    pub balance_points: i64,
    pub balance_fails: bool,
    pub join_records: Vec<JoinRecord>,
    pub new_user_task: Option<String>,
    pub new_user_award_fails: bool,
    /// One list per `task_list` call; empty once drained
    pub task_lists: VecDeque<Vec<TaskInfo>>,
    /// One result per `complete_task` call; `None` once drained
    pub completions: VecDeque<Option<String>>,
    pub get_task_ids: VecDeque<Option<String>>,
    pub award_fails: bool,
    /// `None` makes `prize_status` fail
    pub prizes: Option<Vec<PrizeRecord>>,
    /// One result per redemption; success once drained
    pub redemptions: VecDeque<Result<String>>,
    pub calls: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeApi {
    state: Arc<Mutex<FakeState>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: impl Into<String>) -> MutexGuard<'_, FakeState> {
        let mut state = self.state();
        state.calls.push(call.into());
        state
    }
}

pub fn browse_task(id: &str, click_id: Option<&str>) -> TaskInfo {
    TaskInfo {
        task_id: id.to_string(),
        task_code: format!("CODE_{}", id),
        task_name: format!("浏览组浏览任务{}", id),
        general_activity_url_info: Some(ActivityUrlInfo {
            id: click_id.unwrap_or_default().to_string(),
            brows_click_url_id: format!("url-{}", id),
        }),
    }
}

pub fn prize(code: &str, name: &str, brand: &str, today_stock: i64) -> PrizeRecord {
    PrizeRecord {
        prize_id: format!("pid-{}", code),
        prize_name: name.to_string(),
        prize_brand: brand.to_string(),
        need_gold_rice: 3100,
        prize_code: code.to_string(),
        stock_status: 1,
        today_stock_status: today_stock,
        prize_type: 26,
        prize_desc: String::new(),
        prize_batch_id: String::new(),
    }
}

#[async_trait]
impl ActivityApi for FakeApi {
    async fn gold_rich_sum(&self) -> Result<CurrencyDays> {
        let state = self.record("gold_rich_sum");
        if state.balance_fails {
            return Err(Error::application(500, Some("balance unavailable".into())));
        }
        Ok(CurrencyDays::from_points(state.balance_points))
    }

    async fn user_join_list(&self, _page_num: u32, _page_size: u32) -> Result<Vec<JoinRecord>> {
        let state = self.record("user_join_list");
        Ok(state.join_records.clone())
    }

    async fn complete_new_user_task(&self) -> Result<Option<String>> {
        let state = self.record("complete_new_user_task");
        match &state.new_user_task {
            Some(id) => Ok(Some(id.clone())),
            None => Err(Error::application(3001, Some("not a new user".into()))),
        }
    }

    async fn receive_new_user_award(&self, user_task_id: &str) -> Result<()> {
        let state = self.record(format!("receive_new_user_award:{}", user_task_id));
        if state.new_user_award_fails {
            return Err(Error::application(1, Some("already claimed".into())));
        }
        Ok(())
    }

    async fn task_list(&self) -> Result<Vec<TaskInfo>> {
        let mut state = self.record("task_list");
        Ok(state.task_lists.pop_front().unwrap_or_default())
    }

    async fn get_task(&self, task_code: &str) -> Result<Option<String>> {
        let mut state = self.record(format!("get_task:{}", task_code));
        Ok(state.get_task_ids.pop_front().flatten())
    }

    async fn complete_task(
        &self,
        task_id: &str,
        brows_task_id: &str,
        _brows_click_url_id: &str,
    ) -> Result<Option<String>> {
        let mut state = self.record(format!("complete_task:{}:{}", task_id, brows_task_id));
        Ok(state.completions.pop_front().flatten())
    }

    async fn receive_award(&self, user_task_id: &str) -> Result<()> {
        let state = self.record(format!("receive_award:{}", user_task_id));
        if state.award_fails {
            return Err(Error::application(2, Some("award failed".into())));
        }
        Ok(())
    }

    async fn prize_status(&self) -> Result<Vec<PrizeRecord>> {
        let state = self.record("prize_status");
        state
            .prizes
            .clone()
            .ok_or_else(|| Error::TransportError("connection reset".into()))
    }

    async fn convert_gold_rich(&self, prize_code: &str, phone_number: &str) -> Result<String> {
        let mut state = self.record(format!("convert_gold_rich:{}:{}", prize_code, phone_number));
        state
            .redemptions
            .pop_front()
            .unwrap_or_else(|| Ok("兑换成功".to_string()))
    }
}

/// Hands out the same fake for every account, except the aliases in `failing`
#[derive(Clone, Default)]
pub struct FakeConnector {
    pub api: FakeApi,
    pub failing: HashSet<String>,
    pub connected: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl SessionConnector for FakeConnector {
    async fn connect(&self, account: &Account) -> Result<Box<dyn ActivityApi>> {
        self.connected.lock().unwrap().push(account.alias.clone());
        account.credentials()?;
        if self.failing.contains(&account.alias) {
            return Err(Error::SessionExtractionFailed("serviceToken".into()));
        }
        Ok(Box::new(self.api.clone()))
    }
}
