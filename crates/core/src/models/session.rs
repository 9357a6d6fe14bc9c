//! Authenticated activity session

use crate::models::Credentials;
use crate::types::redact;
use std::fmt;

/// Cookies obtained from the passport handshake. Only the two service
/// cookies are sent to the activity host.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub c_user_id: String,
    pub service_token: String,
    pub credentials: Credentials,
}

impl Session {
    pub fn cookie_header(&self) -> String {
        format!(
            "cUserId={}; jrairstar_serviceToken={}",
            self.c_user_id, self.service_token
        )
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("c_user_id", &self.c_user_id)
            .field("service_token", &redact(&self.service_token))
            .field("user_id", &self.credentials.user_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            c_user_id: "cu-1".into(),
            service_token: "serviceTokenValue123".into(),
            credentials: Credentials {
                user_id: "42".into(),
                pass_token: "V1:pass".into(),
            },
        }
    }

    #[test]
    fn test_cookie_header_format() {
        assert_eq!(
            session().cookie_header(),
            "cUserId=cu-1; jrairstar_serviceToken=serviceTokenValue123"
        );
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let debug = format!("{:?}", session());
        assert!(!debug.contains("serviceTokenValue123"));
        assert!(!debug.contains("V1:pass"));
    }
}
