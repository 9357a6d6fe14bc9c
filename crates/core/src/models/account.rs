//! Account and per-account exchange configuration

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};

/// A membership the account wants redeemed, and the phone number to credit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeConfig {
    #[serde(rename = "type")]
    pub membership_type: String,
    pub phone_number: String,
}

impl ExchangeConfig {
    pub fn new(membership_type: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            membership_type: membership_type.into().trim().to_string(),
            phone_number: phone_number.into().trim().to_string(),
        }
    }
}

/// A wallet account as stored locally
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub alias: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub pass_token: Option<String>,
    #[serde(default)]
    pub security_token: Option<String>,
    #[serde(default)]
    pub exchange_configs: Vec<ExchangeConfig>,
}

/// The passport credential pair used for the session handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user_id: String,
    pub pass_token: String,
}

impl Credentials {
    /// Cookie header sent on the passport handshake
    pub fn cookie_header(&self) -> String {
        format!("passToken={}; userId={};", self.pass_token, self.user_id)
    }
}

impl Account {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            ..Default::default()
        }
    }

    pub fn with_credentials(
        alias: impl Into<String>,
        user_id: impl Into<String>,
        pass_token: impl Into<String>,
    ) -> Self {
        Self {
            alias: alias.into(),
            user_id: Some(user_id.into()),
            pass_token: Some(pass_token.into()),
            ..Default::default()
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.credentials().is_ok()
    }

    /// Both the user id and the pass token must be present and non-blank
    pub fn credentials(&self) -> Result<Credentials> {
        let user_id = non_blank(self.user_id.as_deref())
            .ok_or_else(|| Error::InvalidCredentials(format!("{} has no user id", self.alias)))?;
        let pass_token = non_blank(self.pass_token.as_deref()).ok_or_else(|| {
            Error::InvalidCredentials(format!("{} has no pass token", self.alias))
        })?;

        Ok(Credentials {
            user_id: user_id.to_string(),
            pass_token: pass_token.to_string(),
        })
    }

    /// Insert or replace the config for a membership type (one per type)
    pub fn upsert_exchange_config(&mut self, config: ExchangeConfig) {
        match self
            .exchange_configs
            .iter_mut()
            .find(|c| c.membership_type == config.membership_type)
        {
            Some(existing) => existing.phone_number = config.phone_number,
            None => self.exchange_configs.push(config),
        }
    }

    pub fn remove_exchange_config(&mut self, membership_type: &str) -> bool {
        let before = self.exchange_configs.len();
        self.exchange_configs
            .retain(|c| c.membership_type != membership_type);
        self.exchange_configs.len() != before
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_require_both_fields() {
        let account = Account::with_credentials("main", "1234", "V1:token");
        let creds = account.credentials().unwrap();
        assert_eq!(creds.cookie_header(), "passToken=V1:token; userId=1234;");

        let mut missing = account.clone();
        missing.pass_token = Some("   ".into());
        assert!(matches!(
            missing.credentials(),
            Err(Error::InvalidCredentials(_))
        ));

        assert!(!Account::new("empty").is_logged_in());
    }

    #[test]
    fn test_exchange_config_unique_per_type() {
        let mut account = Account::new("main");
        account.upsert_exchange_config(ExchangeConfig::new("tencent", "13800000000"));
        account.upsert_exchange_config(ExchangeConfig::new("tencent", "13900000000"));
        account.upsert_exchange_config(ExchangeConfig::new("iqiyi", "13800000000"));

        assert_eq!(account.exchange_configs.len(), 2);
        assert_eq!(account.exchange_configs[0].phone_number, "13900000000");

        assert!(account.remove_exchange_config("iqiyi"));
        assert!(!account.remove_exchange_config("iqiyi"));
        assert_eq!(account.exchange_configs.len(), 1);
    }

    #[test]
    fn test_exchange_config_serializes_type_key() {
        let json = serde_json::to_value(ExchangeConfig::new("youku", "1")).unwrap();
        assert_eq!(json["type"], "youku");
        assert_eq!(json["phoneNumber"], "1");
    }
}
