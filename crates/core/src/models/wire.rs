//! Response envelope shared by the activity endpoints, plus lenient field decoders

use crate::errors::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// `{ "code": 0, "message": "...", "value": ... }`
///
/// `code == 0` means success; anything else is an application-level failure.
/// Some endpoints send `msg` instead of `message`, and a few send both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default = "missing_code")]
    pub code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default = "Option::default")]
    pub value: Option<T>,
}

fn missing_code() -> i64 {
    -1
}

impl<T> ApiEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// `message` when present and non-blank, otherwise `msg`
    pub fn message(&self) -> Option<&str> {
        non_blank(self.message.as_deref()).or_else(|| non_blank(self.msg.as_deref()))
    }

    /// Turn a non-zero code into `ApplicationError`, otherwise hand back the payload
    pub fn into_result(self) -> Result<Option<T>> {
        if self.is_success() {
            Ok(self.value)
        } else {
            let message = self.message().map(str::to_string);
            Err(Error::application(self.code, message))
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Read an identifier that may arrive as a string or a number.
/// Empty strings and nulls count as absent.
pub fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Deserialize an i64 that may arrive as a number, string, or null
pub fn deserialize_i64_lenient<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de;

    struct I64Lenient;

    impl<'de> de::Visitor<'de> for I64Lenient {
        type Value = i64;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("an integer, string, or null")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<i64, E> {
            i64::try_from(v).map_err(E::custom)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<i64, E> {
            Ok(v.round() as i64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<i64, E> {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                return Ok(0);
            }
            trimmed
                .parse::<i64>()
                .or_else(|_| trimmed.parse::<f64>().map(|f| f.round() as i64))
                .map_err(E::custom)
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<i64, E> {
            Ok(0)
        }

        fn visit_none<E: de::Error>(self) -> std::result::Result<i64, E> {
            Ok(0)
        }
    }

    deserializer.deserialize_any(I64Lenient)
}

/// Deserialize a string that the provider sometimes sends as a number
pub fn deserialize_string_lenient<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}
