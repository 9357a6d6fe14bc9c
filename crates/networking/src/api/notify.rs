//! Push notifications through PushPlus

use async_trait::async_trait;
use miwallet_core::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

const PUSHPLUS_URL: &str = "https://www.pushplus.plus/send";
const PUSHPLUS_OK: i64 = 200;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, content: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct PushPlusMessage<'a> {
    token: &'a str,
    title: &'a str,
    content: &'a str,
    template: &'static str,
}

#[derive(Debug, Deserialize)]
struct PushPlusReply {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl PushPlusReply {
    fn into_message(self) -> Option<String> {
        self.msg
            .filter(|m| !m.trim().is_empty())
            .or(self.message.filter(|m| !m.trim().is_empty()))
    }
}

pub struct PushPlusNotifier {
    http: Client,
    token: String,
}

impl PushPlusNotifier {
    /// `None` when the token is blank, which disables notifications
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .ok()?;

        Some(Self {
            http,
            token: token.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for PushPlusNotifier {
    async fn notify(&self, title: &str, content: &str) -> Result<()> {
        debug!("Sending PushPlus notification '{}'", title);

        let reply: PushPlusReply = self
            .http
            .post(PUSHPLUS_URL)
            .json(&PushPlusMessage {
                token: &self.token,
                title,
                content,
                template: "txt",
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|e| Error::InvalidData(e.to_string()))?;

        if reply.code == PUSHPLUS_OK {
            info!("Notification sent: {}", title);
            Ok(())
        } else {
            warn!("PushPlus refused notification: code {}", reply.code);
            Err(Error::application(reply.code, reply.into_message()))
        }
    }
}
