//! Passport handshake: trade a pass token for activity session cookies

use super::DESKTOP_USER_AGENT;
use miwallet_core::{redact, Credentials, Error, Result, Session};
use reqwest::{
    cookie::CookieStore,
    header::{HeaderValue, COOKIE, USER_AGENT},
    redirect::Policy,
    Client, Url,
};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Fixed redirect chain: passport login, then the activity host's STS endpoint,
/// which sets the service cookies.
const LOGIN_URL: &str = "https://account.xiaomi.com/pass/serviceLogin?callback=https%3A%2F%2Fapi.jr.airstarfinance.net%2Fsts%3Fsign%3D1dbHuyAmee0NAZ2xsRw5vhdVQQ8%253D%26followup%3Dhttps%253A%252F%252Fm.jr.airstarfinance.net%252Fmp%252Fapi%252Flogin%253Ffrom%253Dmipay_indexicon_TVcard%2526deepLinkEnable%253Dfalse%2526requestUrl%253Dhttps%25253A%25252F%25252Fm.jr.airstarfinance.net%25252Fmp%25252Factivity%25252FvideoActivity%25253Ffrom%25253Dmipay_indexicon_TVcard%252526_noDarkMode%25253Dtrue%252526_transparentNaviBar%25253Dtrue%252526cUserId%25253Dusyxgr5xjumiQLUoAKTOgvi858Q%252526_statusBarHeight%25253D137&sid=jrairstar&_group=DEFAULT&_snsNone=true&_loginType=ticket";

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_REDIRECTS: usize = 10;

pub const C_USER_ID_COOKIE: &str = "cUserId";
pub const SERVICE_TOKEN_COOKIE: &str = "serviceToken";

/// Cookie store that keeps every cookie seen across the redirect chain,
/// keyed by name only, and sends all of them to every host.
#[derive(Debug, Default)]
pub struct SessionJar {
    cookies: RwLock<Vec<(String, String)>>,
}

impl SessionJar {
    pub fn insert(&self, name: &str, value: &str) {
        let mut cookies = match self.cookies.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        cookies.retain(|(n, _)| n != name);
        if !value.is_empty() {
            cookies.push((name.to_string(), value.to_string()));
        }
    }

    /// Record one `Set-Cookie` header value. Attributes are ignored; an empty
    /// value clears the cookie.
    pub fn record_set_cookie(&self, header: &str) {
        let pair = header.split(';').next().unwrap_or_default();
        if let Some((name, value)) = pair.split_once('=') {
            let name = name.trim();
            if !name.is_empty() {
                self.insert(name, value.trim().trim_matches('"'));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        let cookies = match self.cookies.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn header_value(&self) -> String {
        let cookies = match self.cookies.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        cookies
            .iter()
            .map(|(n, v)| format!("{}={}", n, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl CookieStore for SessionJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        for header in cookie_headers {
            if let Ok(raw) = header.to_str() {
                debug!("Set-Cookie from {}: {}", url.host_str().unwrap_or("?"), cookie_name(raw));
                self.record_set_cookie(raw);
            }
        }
    }

    fn cookies(&self, _url: &Url) -> Option<HeaderValue> {
        let header = self.header_value();
        if header.is_empty() {
            return None;
        }
        HeaderValue::from_str(&header).ok()
    }
}

fn cookie_name(raw: &str) -> &str {
    raw.split('=').next().unwrap_or_default()
}

/// Pick the two service cookies out of the jar
pub fn extract_session(jar: &SessionJar, credentials: Credentials) -> Result<Session> {
    let c_user_id = jar
        .get(C_USER_ID_COOKIE)
        .ok_or_else(|| Error::SessionExtractionFailed(C_USER_ID_COOKIE.to_string()))?;
    let service_token = jar
        .get(SERVICE_TOKEN_COOKIE)
        .ok_or_else(|| Error::SessionExtractionFailed(SERVICE_TOKEN_COOKIE.to_string()))?;

    Ok(Session {
        c_user_id,
        service_token,
        credentials,
    })
}

/// Run the passport handshake once. No retry.
#[instrument(skip(credentials), fields(user_id = %credentials.user_id))]
pub async fn acquire_session(credentials: Credentials) -> Result<Session> {
    let jar = Arc::new(SessionJar::default());
    jar.insert("passToken", &credentials.pass_token);
    jar.insert("userId", &credentials.user_id);

    let http = Client::builder()
        .cookie_provider(jar.clone())
        .danger_accept_invalid_certs(true)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .connect_timeout(HANDSHAKE_TIMEOUT)
        .timeout(HANDSHAKE_TIMEOUT)
        .build()
        .map_err(|e| Error::TransportError(e.to_string()))?;

    debug!(
        "Passport handshake with pass token {}",
        redact(&credentials.pass_token)
    );

    let cookie = HeaderValue::from_str(&credentials.cookie_header())
        .map_err(|_| Error::InvalidCredentials("credentials contain invalid characters".into()))?;

    let response = http
        .get(LOGIN_URL)
        .header(USER_AGENT, DESKTOP_USER_AGENT)
        .header(COOKIE, cookie)
        .send()
        .await
        .map_err(|e| {
            error!("Passport handshake failed: {}", e);
            Error::TransportError(e.to_string())
        })?;

    let status = response.status();
    debug!("Handshake ended at {} with {}", response.url(), status);

    if !status.is_success() {
        error!("Passport handshake returned {}", status);
        return Err(Error::HttpStatus(status.as_u16()));
    }

    let session = extract_session(&jar, credentials)?;
    info!(
        "Session acquired (cUserId {}, serviceToken {})",
        session.c_user_id,
        redact(&session.service_token)
    );
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            user_id: "10001".into(),
            pass_token: "V1:pass".into(),
        }
    }

    #[test]
    fn test_jar_accumulates_across_hosts() {
        let jar = SessionJar::default();
        jar.record_set_cookie("userId=10001; Domain=.xiaomi.com; Path=/");
        jar.record_set_cookie("cUserId=cu-abc; Domain=api.jr.airstarfinance.net; HttpOnly");
        jar.record_set_cookie("serviceToken=st-xyz; Path=/; Secure");

        let session = extract_session(&jar, credentials()).unwrap();
        assert_eq!(session.c_user_id, "cu-abc");
        assert_eq!(session.service_token, "st-xyz");
        assert_eq!(session.credentials, credentials());
    }

    #[test]
    fn test_missing_service_token_fails() {
        let jar = SessionJar::default();
        jar.record_set_cookie("cUserId=cu-abc; Path=/");

        match extract_session(&jar, credentials()) {
            Err(Error::SessionExtractionFailed(name)) => assert_eq!(name, "serviceToken"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_later_cookie_replaces_earlier_and_empty_clears() {
        let jar = SessionJar::default();
        jar.record_set_cookie("serviceToken=old");
        jar.record_set_cookie("serviceToken=new; Path=/");
        assert_eq!(jar.get("serviceToken").as_deref(), Some("new"));

        jar.record_set_cookie("serviceToken=; Max-Age=0");
        assert_eq!(jar.get("serviceToken"), None);
    }

    #[test]
    fn test_cookie_store_header() {
        let jar = SessionJar::default();
        jar.insert("passToken", "V1:pass");
        jar.insert("userId", "10001");

        let url: Url = "https://account.xiaomi.com/".parse().unwrap();
        let header = jar.cookies(&url).unwrap();
        assert_eq!(header.to_str().unwrap(), "passToken=V1:pass; userId=10001");
    }
}
