//! Credential state for the remote recognition client.

use std::time::{Duration, Instant};

/// Refresh the whole token set when the refresh token is this close to expiry.
const REFRESH_EXPIRY_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Refresh the access token when it is this close to expiry.
const ACCESS_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// The full token set returned by the token endpoint, stamped with the
/// instant it was retrieved. Replaced wholesale on every grant.
#[derive(Debug, Clone)]
pub(crate) struct TokenState {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_in: Duration,
    pub refresh_expires_in: Duration,
    pub retrieved_at: Instant,
}

/// Which grant to perform before an outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Grant {
    /// Full password-grant authentication.
    Password,
    /// Refresh-grant using the current refresh token.
    Refresh,
    /// Current access token is still good.
    Reuse,
}

impl Grant {
    /// Decide which grant is due. Pure so the margins can be tested without
    /// a live token endpoint.
    pub fn decide(tokens: Option<&TokenState>, now: Instant) -> Grant {
        let Some(tokens) = tokens else {
            return Grant::Password;
        };

        let age = now.saturating_duration_since(tokens.retrieved_at);

        if age + REFRESH_EXPIRY_MARGIN >= tokens.refresh_expires_in {
            Grant::Password
        } else if age + ACCESS_EXPIRY_MARGIN >= tokens.access_expires_in {
            Grant::Refresh
        } else {
            Grant::Reuse
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_state(access_secs: u64, refresh_secs: u64) -> TokenState {
        TokenState {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            access_expires_in: Duration::from_secs(access_secs),
            refresh_expires_in: Duration::from_secs(refresh_secs),
            retrieved_at: Instant::now(),
        }
    }

    #[test]
    fn test_no_token_requires_password_grant() {
        assert_eq!(Grant::decide(None, Instant::now()), Grant::Password);
    }

    #[test]
    fn test_fresh_token_is_reused() {
        let tokens = token_state(60, 3600);
        let at = tokens.retrieved_at + Duration::from_secs(5);
        assert_eq!(Grant::decide(Some(&tokens), at), Grant::Reuse);
    }

    #[test]
    fn test_expired_access_token_triggers_refresh() {
        let tokens = token_state(60, 3600);
        let at = tokens.retrieved_at + Duration::from_secs(61);
        assert_eq!(Grant::decide(Some(&tokens), at), Grant::Refresh);
    }

    #[test]
    fn test_access_token_near_expiry_triggers_refresh() {
        // Within the 30 second margin of a 60 second lifetime.
        let tokens = token_state(60, 3600);
        let at = tokens.retrieved_at + Duration::from_secs(35);
        assert_eq!(Grant::decide(Some(&tokens), at), Grant::Refresh);
    }

    #[test]
    fn test_expired_refresh_token_triggers_password_grant() {
        let tokens = token_state(60, 300);
        let at = tokens.retrieved_at + Duration::from_secs(301);
        assert_eq!(Grant::decide(Some(&tokens), at), Grant::Password);
    }

    #[test]
    fn test_refresh_token_near_expiry_triggers_password_grant() {
        // Within the 5 minute margin of a 1 hour lifetime, even though the
        // access token would only need a refresh grant.
        let tokens = token_state(60, 3600);
        let at = tokens.retrieved_at + Duration::from_secs(3600 - 200);
        assert_eq!(Grant::decide(Some(&tokens), at), Grant::Password);
    }
}
