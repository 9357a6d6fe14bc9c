//! QR-code passport login
//!
//! `request_qr` fetches a QR link plus a long-poll URL; `poll_login` then
//! polls that URL every two seconds until the scan is confirmed, the code
//! expires, or the caller cancels.

use super::DESKTOP_USER_AGENT;
use miwallet_core::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const LOGIN_QR_URL: &str = "https://account.xiaomi.com/longPolling/loginUrl";
const PAYLOAD_MARKER: &str = "&&&START&&&";

pub const POLL_INTERVAL: Duration = Duration::from_secs(2);
const LONG_POLL_TIMEOUT: Duration = Duration::from_secs(60);

const QR_QS: &str = "?callback=https%3A%2F%2Faccount.xiaomi.com%2Fsts%3Fsign%3DZvAtJIzsDsFe60LdaPa76nNNP58%253D%26followup%3Dhttps%253A%252F%252Faccount.xiaomi.com%252Fpass%252Fauth%252Fsecurity%252Fhome%26sid%3Dpassport&sid=passport&_group=DEFAULT";
const QR_CALLBACK: &str = "https://account.xiaomi.com/sts?sign=ZvAtJIzsDsFe60LdaPa76nNNP58=&followup=https://account.xiaomi.com/pass/auth/security/home&sid=passport";
const QR_SERVICE_PARAM: &str = r#"{"checkSafePhone":false,"checkSafeAddress":false,"lsrp_score":0.0}"#;
const QR_SIGN: &str = "2&V1_passport&BUcblfwZ4tX84axhVUaw8t6yi2E=";

/// What the user scans, and where to wait for the result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrTicket {
    pub qr_url: String,
    pub poll_url: String,
}

/// Credentials returned once the scan is confirmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassportLogin {
    pub user_id: String,
    pub pass_token: String,
    pub security_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginStatus {
    Confirmed(PassportLogin),
    /// 700
    WaitingForScan,
    /// 701
    AwaitingConfirmation,
    /// 702
    Expired,
    Unrecognized(i64),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PollPayload {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    user_id: Value,
    #[serde(default)]
    pass_token: Option<String>,
    #[serde(default)]
    ssecurity: Option<String>,
}

/// Passport responses are prefixed with `&&&START&&&`; the JSON follows it
pub fn strip_payload_marker(body: &str) -> Result<&str> {
    body.split_once(PAYLOAD_MARKER)
        .map(|(_, json)| json)
        .ok_or_else(|| Error::InvalidData("passport response has no payload marker".into()))
}

pub fn parse_qr_ticket(body: &str) -> Result<QrTicket> {
    let value: Value = serde_json::from_str(strip_payload_marker(body)?)?;
    let field = |name: &str| {
        value
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidData(format!("QR response missing '{}'", name)))
    };

    Ok(QrTicket {
        qr_url: field("qr")?,
        poll_url: field("lp")?,
    })
}

pub fn parse_login_status(body: &str) -> Result<LoginStatus> {
    let payload: PollPayload = serde_json::from_str(strip_payload_marker(body)?)?;

    Ok(match payload.code.unwrap_or(-1) {
        0 => {
            let user_id = miwallet_core::id_from_value(&payload.user_id)
                .ok_or_else(|| Error::InvalidData("login payload missing userId".into()))?;
            let pass_token = payload
                .pass_token
                .filter(|t| !t.is_empty())
                .ok_or_else(|| Error::InvalidData("login payload missing passToken".into()))?;
            LoginStatus::Confirmed(PassportLogin {
                user_id,
                pass_token,
                security_token: payload.ssecurity,
            })
        }
        700 => LoginStatus::WaitingForScan,
        701 => LoginStatus::AwaitingConfirmation,
        702 => LoginStatus::Expired,
        other => LoginStatus::Unrecognized(other),
    })
}

/// Poll `check_status` until the login settles or `cancel` fires.
/// Status check errors are ignored and polling continues.
pub async fn poll_until_resolved<F, Fut>(
    interval: Duration,
    cancel: &CancellationToken,
    mut check_status: F,
) -> Result<PassportLogin>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<LoginStatus>>,
{
    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let status = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            status = check_status() => status,
        };

        match status {
            Ok(LoginStatus::Confirmed(login)) => return Ok(login),
            Ok(LoginStatus::Expired) => {
                return Err(Error::ApplicationError {
                    code: 702,
                    message: "QR code expired".into(),
                })
            }
            Ok(LoginStatus::WaitingForScan) => debug!("QR login: waiting for scan"),
            Ok(LoginStatus::AwaitingConfirmation) => {
                info!("QR login: scanned, waiting for confirmation on the phone")
            }
            Ok(LoginStatus::Unrecognized(code)) => debug!("QR login: unrecognized code {}", code),
            Err(e) => debug!("QR login poll failed, retrying: {}", e),
        }

        tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

pub struct QrLoginClient {
    http: Client,
}

impl QrLoginClient {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .user_agent(DESKTOP_USER_AGENT)
            .timeout(LONG_POLL_TIMEOUT)
            .build()
            .map_err(|e| Error::TransportError(e.to_string()))?;
        Ok(Self { http })
    }

    pub async fn request_qr(&self) -> Result<QrTicket> {
        let dc = chrono::Utc::now().timestamp_millis().to_string();
        let params: Vec<(&str, &str)> = vec![
            ("_group", "DEFAULT"),
            ("_qrsize", "240"),
            ("qs", QR_QS),
            ("bizDeviceType", ""),
            ("callback", QR_CALLBACK),
            ("_hasLogo", "false"),
            ("theme", ""),
            ("sid", "passport"),
            ("needTheme", "false"),
            ("showActiveX", "false"),
            ("serviceParam", QR_SERVICE_PARAM),
            ("_locale", "zh_CN"),
            ("_sign", QR_SIGN),
            ("_dc", &dc),
        ];

        let body = self
            .http
            .get(LOGIN_QR_URL)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let ticket = parse_qr_ticket(&body)?;
        info!("QR login link issued");
        Ok(ticket)
    }

    pub async fn check(&self, poll_url: &str) -> Result<LoginStatus> {
        let body = self
            .http
            .get(poll_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_login_status(&body)
    }

    pub async fn poll_login(
        &self,
        ticket: &QrTicket,
        cancel: &CancellationToken,
    ) -> Result<PassportLogin> {
        let login = poll_until_resolved(POLL_INTERVAL, cancel, || self.check(&ticket.poll_url))
            .await
            .inspect_err(|e| warn!("QR login ended without credentials: {}", e))?;
        info!("QR login confirmed for user {}", login.user_id);
        Ok(login)
    }
}
