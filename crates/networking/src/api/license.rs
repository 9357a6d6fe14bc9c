//! License key verification

use miwallet_core::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument, warn};

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    key: &'a str,
    device_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    valid: bool,
    #[serde(default)]
    message: Option<String>,
}

/// POST `{key, device_id}` to `endpoint`; only `valid: true` passes
#[instrument(skip(key))]
pub async fn verify_license(endpoint: &str, key: &str, device_id: &str) -> Result<()> {
    let http = Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| Error::TransportError(e.to_string()))?;

    let response: VerifyResponse = http
        .post(endpoint)
        .json(&VerifyRequest { key, device_id })
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
        .map_err(|e| Error::InvalidData(e.to_string()))?;

    check_verdict(response)
}

fn check_verdict(response: VerifyResponse) -> Result<()> {
    if response.valid {
        info!("License verified");
        Ok(())
    } else {
        let message = response
            .message
            .unwrap_or_else(|| "license is not valid for this device".into());
        warn!("License rejected: {}", message);
        Err(Error::LicenseRejected(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict() {
        let ok: VerifyResponse = serde_json::from_str(r#"{"valid":true}"#).unwrap();
        assert!(check_verdict(ok).is_ok());

        let bad: VerifyResponse =
            serde_json::from_str(r#"{"valid":false,"message":"expired"}"#).unwrap();
        match check_verdict(bad) {
            Err(Error::LicenseRejected(msg)) => assert_eq!(msg, "expired"),
            other => panic!("unexpected: {:?}", other),
        }

        let empty: VerifyResponse = serde_json::from_str("{}").unwrap();
        assert!(check_verdict(empty).is_err());
    }

    #[test]
    fn test_request_shape() {
        let json = serde_json::to_value(VerifyRequest {
            key: "K",
            device_id: "abcd",
        })
        .unwrap();
        assert_eq!(json["key"], "K");
        assert_eq!(json["device_id"], "abcd");
    }
}
