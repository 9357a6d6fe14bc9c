//! Application settings read at run start

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default)]
    pub license_key: String,
    /// PushPlus token; blank disables notifications
    #[serde(default)]
    pub notification_token: String,
    #[serde(default)]
    pub auto_run_enabled: bool,
    /// License verification endpoint; when unset only the non-blank check applies
    #[serde(default)]
    pub license_endpoint: Option<String>,
}

impl AppSettings {
    /// A blank license key prevents any run
    pub fn ensure_license_present(&self) -> Result<&str> {
        let key = self.license_key.trim();
        if key.is_empty() {
            return Err(Error::LicenseRejected("no license key configured".into()));
        }
        Ok(key)
    }

    pub fn notifications_enabled(&self) -> bool {
        !self.notification_token.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_license_rejected() {
        let settings = AppSettings {
            license_key: "  ".into(),
            ..Default::default()
        };
        assert!(matches!(
            settings.ensure_license_present(),
            Err(Error::LicenseRejected(_))
        ));
    }

    #[test]
    fn test_settings_tolerate_missing_fields() {
        let settings: AppSettings = serde_json::from_str(r#"{"licenseKey":"K-1"}"#).unwrap();
        assert_eq!(settings.ensure_license_present().unwrap(), "K-1");
        assert!(!settings.notifications_enabled());
        assert!(!settings.auto_run_enabled);
    }
}
