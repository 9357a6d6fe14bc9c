//! Seams between the run engine and the network
//!
//! The engine only talks to `ActivityApi` and `SessionConnector`, so runs can
//! be driven against in-memory fakes.

mod license;
mod notify;

pub use license::*;
pub use notify::*;

use crate::http::{acquire_session, WalletClient};
use async_trait::async_trait;
use miwallet_core::{Account, CurrencyDays, JoinRecord, PrizeRecord, Result, TaskInfo};

/// Calls against the video-welfare activity for one authenticated account
#[async_trait]
pub trait ActivityApi: Send + Sync {
    async fn gold_rich_sum(&self) -> Result<CurrencyDays>;

    async fn user_join_list(&self, page_num: u32, page_size: u32) -> Result<Vec<JoinRecord>>;

    /// `Ok(Some(user_task_id))` when the bonus is still available
    async fn complete_new_user_task(&self) -> Result<Option<String>>;

    async fn receive_new_user_award(&self, user_task_id: &str) -> Result<()>;

    async fn task_list(&self) -> Result<Vec<TaskInfo>>;

    async fn get_task(&self, task_code: &str) -> Result<Option<String>>;

    async fn complete_task(
        &self,
        task_id: &str,
        brows_task_id: &str,
        brows_click_url_id: &str,
    ) -> Result<Option<String>>;

    async fn receive_award(&self, user_task_id: &str) -> Result<()>;

    async fn prize_status(&self) -> Result<Vec<PrizeRecord>>;

    /// Returns the server message on success
    async fn convert_gold_rich(&self, prize_code: &str, phone_number: &str) -> Result<String>;
}

/// Turns a stored account into an authenticated API handle
#[async_trait]
pub trait SessionConnector: Send + Sync {
    async fn connect(&self, account: &Account) -> Result<Box<dyn ActivityApi>>;
}

/// Connects through the real passport handshake
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpConnector;

#[async_trait]
impl SessionConnector for HttpConnector {
    async fn connect(&self, account: &Account) -> Result<Box<dyn ActivityApi>> {
        let credentials = account.credentials()?;
        let session = acquire_session(credentials).await?;
        Ok(Box::new(WalletClient::new(session)?))
    }
}
