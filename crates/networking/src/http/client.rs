//! Activity API client authenticated with the session cookies

use super::{ACTIVITY_CODE, API_HOST, MOBILE_USER_AGENT};
use crate::api::ActivityApi;
use async_trait::async_trait;
use miwallet_core::{
    id_from_value, ApiEnvelope, CurrencyDays, Error, JoinListPage, JoinRecord, PrizeRecord,
    Result, Session, TaskInfo, TaskListPage, TaskStatePage,
};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, COOKIE, HOST, USER_AGENT},
    Client, RequestBuilder,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

const API_BASE: &str = "https://m.jr.airstarfinance.net/mp/api/generalActivity";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_EXTRA: &str = r#"{"platformType":1,"com.miui.player":"4.27.0.4","com.miui.video":"v2024090290(MiVideo-UN)","com.mipay.wallet":"6.83.0.5175.2256"}"#;

// New-user campaign identifiers, fixed per device profile
const NEW_USER_OAID: &str = "8c45c5802867e923";
const NEW_USER_COMPLETE_REG_ID: &str =
    "KWkK5VsKXiIbAH8Rf6kgU6tpDPyNWgXY8YCM1mQtt5nd7i1/4BqzPq0uY7OlIEOd";
const NEW_USER_AWARD_REG_ID: &str =
    "L522i5qLZR9+s25kEqPBJYbbHqUS4LrpuTsgl9kdsbcyU7tjWmx1BewlRNSSZaOT";
const NEW_USER_VERSION_CODE: &str = "20577622";
const NEW_USER_VERSION_NAME: &str = "6.96.0.5453.2620";
const NEW_USER_CHANNEL: &str = "mipay_indexicon_TVcard2test";
const NEW_USER_EXTRA: &str = r#"{"platformType":1,"com.miui.video":"v2023091090(MiVideo-ROM)","com.mipay.wallet":"6.96.0.5453.2620"}"#;
const NEW_USER_TASK_CODE: &str = "NEW_USER_CAMPAIGN";
const NEW_USER_CLICK_URL_ID: &str = "1306285";
const NEW_USER_APP_LIMIT: &str = r#"{"com.qiyi.video":false,"com.youku.phone":false,"com.tencent.qqlive":false,"com.hunantv.imgo.activity":false,"com.cmcc.cmvideo":false,"com.sankuai.meituan":false,"com.anjuke.android.app":false,"com.tal.abctimelibrary":false,"com.lianjia.beike":false,"com.kmxs.reader":false,"com.jd.jrapp":false,"com.smile.gifmaker":true,"com.kuaishou.nebula":false}"#;

const BROWSE_CHANNEL: &str = "mipay_indexicon_TVcard";
const AWARD_APP_LIMIT: &str = r#"{"com.qiyi.video":false,"com.youku.phone":true,"com.tencent.qqlive":true,"com.hunantv.imgo.activity":true,"com.cmcc.cmvideo":false,"com.sankuai.meituan":true,"com.anjuke.android.app":false,"com.tal.abctimelibrary":false,"com.lianjia.beike":false,"com.kmxs.reader":true,"com.jd.jrapp":false,"com.smile.gifmaker":true,"com.kuaishou.nebula":false}"#;
const GET_TASK_PH: &str = "98lj8puDf9Tu/WwcyMpVyQ==";

type Params = Vec<(&'static str, String)>;

/// HTTP client for the video-welfare activity
///
/// Sends the session cookies explicitly on every request and presents
/// itself as the wallet app's web view.
pub struct WalletClient {
    http: Client,
    session: Session,
}

impl WalletClient {
    pub fn new(session: Session) -> Result<Self> {
        let http = Client::builder()
            .user_agent(MOBILE_USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::TransportError(e.to_string()))?;

        Ok(Self { http, session })
    }

    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(MOBILE_USER_AGENT));
        headers.insert(HOST, HeaderValue::from_static(API_HOST));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9,en-US;q=0.8,en;q=0.7"),
        );
        headers.insert("X-Requested-With", HeaderValue::from_static("com.mipay.wallet"));
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&self.session.cookie_header())
                .map_err(|_| Error::InvalidCredentials("session cookie is not header-safe".into()))?,
        );
        Ok(headers)
    }

    /// `activityCode` plus the app/device parameters every call carries
    fn common_params() -> Params {
        vec![
            ("activityCode", ACTIVITY_CODE.to_string()),
            ("app", "com.mipay.wallet".to_string()),
            ("deviceType", "2".to_string()),
            ("system", "1".to_string()),
            ("visitEnvironment", "2".to_string()),
        ]
    }

    fn get(&self, endpoint: &str, params: &Params) -> Result<RequestBuilder> {
        Ok(self
            .http
            .get(format!("{}/{}", API_BASE, endpoint))
            .headers(self.default_headers()?)
            .query(params))
    }

    fn post_form(&self, endpoint: &str, form: &Params) -> Result<RequestBuilder> {
        Ok(self
            .http
            .post(format!("{}/{}", API_BASE, endpoint))
            .headers(self.default_headers()?)
            .form(form))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, call: &str) -> Result<T> {
        let response = request.send().await.map_err(|e| {
            error!("{} request failed: {}", call, e);
            Error::TransportError(e.to_string())
        })?;

        debug!("{} response status: {}", call, response.status());

        if response.status().as_u16() == 401 {
            return Err(Error::InvalidCredentials("session rejected by activity host".into()));
        }

        let response = response.error_for_status().map_err(|e| {
            error!("{} returned an error status: {}", call, e);
            Error::from(e)
        })?;

        response.json::<T>().await.map_err(|e| {
            error!("Failed to parse {} response: {}", call, e);
            Error::InvalidData(e.to_string())
        })
    }

    async fn send_envelope<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        call: &str,
    ) -> Result<Option<T>> {
        let envelope: ApiEnvelope<T> = self.send(request, call).await?;
        if !envelope.is_success() {
            warn!(
                "{} returned code {}: {}",
                call,
                envelope.code,
                envelope.message().unwrap_or("-")
            );
        }
        envelope.into_result()
    }
}

/// Accept the prize list as a bare array or wrapped in an envelope.
/// Records that do not parse are skipped.
pub fn parse_prize_records(body: Value) -> Result<Vec<PrizeRecord>> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(_) => {
            let envelope: ApiEnvelope<Value> = serde_json::from_value(body)?;
            match envelope.into_result()? {
                Some(Value::Array(items)) => items,
                _ => return Err(Error::InvalidData("prize list is not an array".into())),
            }
        }
        _ => return Err(Error::InvalidData("prize list is not an array".into())),
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<PrizeRecord>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping unparseable prize record: {}", e);
                None
            }
        })
        .collect())
}

/// Balance value arrives as a number or a numeric string; null means nothing earned yet
fn points_from_value(value: &Value) -> Result<i64> {
    if value.is_null() {
        return Ok(0);
    }
    id_from_value(value)
        .and_then(|raw| {
            raw.parse::<i64>()
                .ok()
                .or_else(|| raw.parse::<f64>().ok().map(|f| f.round() as i64))
        })
        .ok_or_else(|| Error::InvalidData(format!("balance is not a number: {}", value)))
}

#[async_trait]
impl ActivityApi for WalletClient {
    #[instrument(skip(self))]
    async fn gold_rich_sum(&self) -> Result<CurrencyDays> {
        let mut params = Self::common_params();
        params.push(("userExtra", USER_EXTRA.to_string()));

        let value: Option<Value> = self
            .send_envelope(self.get("queryUserGoldRichSum", &params)?, "queryUserGoldRichSum")
            .await?;
        let points = points_from_value(&value.unwrap_or(Value::Null))?;
        Ok(CurrencyDays::from_points(points))
    }

    #[instrument(skip(self))]
    async fn user_join_list(&self, page_num: u32, page_size: u32) -> Result<Vec<JoinRecord>> {
        let mut params = Self::common_params();
        params.push(("pageNum", page_num.to_string()));
        params.push(("pageSize", page_size.to_string()));
        params.push(("userExtra", USER_EXTRA.to_string()));

        let page: Option<JoinListPage> = self
            .send_envelope(self.get("queryUserJoinList", &params)?, "queryUserJoinList")
            .await?;
        Ok(page.unwrap_or_default().data)
    }

    #[instrument(skip(self))]
    async fn complete_new_user_task(&self) -> Result<Option<String>> {
        let params: Params = vec![
            ("activityCode", ACTIVITY_CODE.to_string()),
            ("app", "com.mipay.wallet".to_string()),
            ("oaid", NEW_USER_OAID.to_string()),
            ("regId", NEW_USER_COMPLETE_REG_ID.to_string()),
            ("versionCode", NEW_USER_VERSION_CODE.to_string()),
            ("versionName", NEW_USER_VERSION_NAME.to_string()),
            ("isNfcPhone", "true".to_string()),
            ("channel", NEW_USER_CHANNEL.to_string()),
            ("deviceType", "2".to_string()),
            ("system", "1".to_string()),
            ("visitEnvironment", "2".to_string()),
            ("userExtra", NEW_USER_EXTRA.to_string()),
            ("taskCode", NEW_USER_TASK_CODE.to_string()),
            ("browsTaskId", String::new()),
            ("browsClickUrlId", NEW_USER_CLICK_URL_ID.to_string()),
            ("adInfoId", String::new()),
            ("triggerId", String::new()),
        ];

        let value: Option<Value> = self
            .send_envelope(self.get("completeTask", &params)?, "completeTask(new user)")
            .await?;
        Ok(value.as_ref().and_then(id_from_value))
    }

    #[instrument(skip(self))]
    async fn receive_new_user_award(&self, user_task_id: &str) -> Result<()> {
        let params: Params = vec![
            ("imei", String::new()),
            ("device", "alioth".to_string()),
            ("appLimit", NEW_USER_APP_LIMIT.to_string()),
            ("activityCode", ACTIVITY_CODE.to_string()),
            ("userTaskId", user_task_id.to_string()),
            ("app", "com.mipay.wallet".to_string()),
            ("oaid", NEW_USER_OAID.to_string()),
            ("regId", NEW_USER_AWARD_REG_ID.to_string()),
            ("versionCode", NEW_USER_VERSION_CODE.to_string()),
            ("versionName", NEW_USER_VERSION_NAME.to_string()),
            ("isNfcPhone", "true".to_string()),
            ("channel", NEW_USER_CHANNEL.to_string()),
            ("deviceType", "2".to_string()),
            ("system", "1".to_string()),
            ("visitEnvironment", "2".to_string()),
            ("userExtra", NEW_USER_EXTRA.to_string()),
        ];

        self.send_envelope::<Value>(self.get("luckDraw", &params)?, "luckDraw(new user)")
            .await
            .map(|_| ())
    }

    #[instrument(skip(self))]
    async fn task_list(&self) -> Result<Vec<TaskInfo>> {
        let form: Params = vec![("activityCode", ACTIVITY_CODE.to_string())];

        let page: Option<TaskListPage> = self
            .send_envelope(self.post_form("getTaskList", &form)?, "getTaskList")
            .await?;
        Ok(page.unwrap_or_default().task_info_list)
    }

    #[instrument(skip(self))]
    async fn get_task(&self, task_code: &str) -> Result<Option<String>> {
        let form: Params = vec![
            ("activityCode", ACTIVITY_CODE.to_string()),
            ("taskCode", task_code.to_string()),
            ("jrairstar_ph", GET_TASK_PH.to_string()),
        ];

        let page: Option<TaskStatePage> = self
            .send_envelope(self.post_form("getTask", &form)?, "getTask")
            .await?;
        Ok(page.and_then(|p| p.user_task_id()))
    }

    #[instrument(skip(self))]
    async fn complete_task(
        &self,
        task_id: &str,
        brows_task_id: &str,
        brows_click_url_id: &str,
    ) -> Result<Option<String>> {
        let mut params = Self::common_params();
        params.extend([
            ("isNfcPhone", "true".to_string()),
            ("channel", BROWSE_CHANNEL.to_string()),
            ("userExtra", USER_EXTRA.to_string()),
            ("taskId", task_id.to_string()),
            ("browsTaskId", brows_task_id.to_string()),
            ("browsClickUrlId", brows_click_url_id.to_string()),
            ("clickEntryType", "undefined".to_string()),
            ("festivalStatus", "0".to_string()),
        ]);

        let value: Option<Value> = self
            .send_envelope(self.get("completeTask", &params)?, "completeTask")
            .await?;
        Ok(value.as_ref().and_then(id_from_value))
    }

    #[instrument(skip(self))]
    async fn receive_award(&self, user_task_id: &str) -> Result<()> {
        let mut params: Params = vec![
            ("imei", String::new()),
            ("device", "manet".to_string()),
            ("appLimit", AWARD_APP_LIMIT.to_string()),
            ("userTaskId", user_task_id.to_string()),
            ("isNfcPhone", "true".to_string()),
            ("channel", BROWSE_CHANNEL.to_string()),
            ("userExtra", USER_EXTRA.to_string()),
        ];
        params.extend(Self::common_params());

        self.send_envelope::<Value>(self.get("luckDraw", &params)?, "luckDraw")
            .await
            .map(|_| ())
    }

    #[instrument(skip(self))]
    async fn prize_status(&self) -> Result<Vec<PrizeRecord>> {
        let mut params = Self::common_params();
        params.push(("userExtra", USER_EXTRA.to_string()));

        let body: Value = self
            .send(self.get("getPrizeStatusV2", &params)?, "getPrizeStatusV2")
            .await?;
        parse_prize_records(body)
    }

    #[instrument(skip(self, phone_number))]
    async fn convert_gold_rich(&self, prize_code: &str, phone_number: &str) -> Result<String> {
        let mut params = Self::common_params();
        params.extend([
            ("prizeCode", prize_code.to_string()),
            ("phone", phone_number.to_string()),
            ("userExtra", USER_EXTRA.to_string()),
        ]);

        let envelope: ApiEnvelope<Value> = self
            .send(self.get("convertGoldRich", &params)?, "convertGoldRich")
            .await?;
        let message = envelope.message().unwrap_or_default().to_string();
        envelope.into_result()?;
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prize_records_from_bare_array() {
        let records = parse_prize_records(json!([
            {"prizeId": 1, "prizeName": "腾讯视频VIP月卡", "needGoldRice": 3100},
            "garbage",
            {"prizeId": "2", "prizeName": "优酷VIP月卡", "needGoldRice": "3100"}
        ]))
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].prize_id, "1");
        assert_eq!(records[1].need_gold_rice, 3100);
    }

    #[test]
    fn test_prize_records_from_envelope() {
        let records = parse_prize_records(json!({
            "code": 0,
            "value": [{"prizeId": "9", "prizeName": "芒果TV会员月卡"}]
        }))
        .unwrap();
        assert_eq!(records[0].prize_id, "9");
    }

    #[test]
    fn test_prize_records_reject_non_array() {
        assert!(matches!(
            parse_prize_records(json!({"code": 0, "value": {"a": 1}})),
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            parse_prize_records(json!({"code": 500, "message": "down"})),
            Err(Error::ApplicationError { code: 500, .. })
        ));
        assert!(parse_prize_records(json!("nope")).is_err());
    }

    #[test]
    fn test_balance_value_parsing() {
        assert_eq!(points_from_value(&json!(3155)).unwrap(), 3155);
        assert_eq!(points_from_value(&json!("3155")).unwrap(), 3155);
        assert_eq!(points_from_value(&Value::Null).unwrap(), 0);
        assert!(points_from_value(&json!("n/a")).is_err());
    }
}
