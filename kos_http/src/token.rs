use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Access/refresh pair as the backend hands it out
/// (login, signup and `/auth/driver/refresh` all answer with this shape).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token:  String,
    pub refresh_token: String,
    pub expires_in:    i64,
}

/// Persisted session credentials.
///
/// Stored as a flat camelCase JSON object; `issued_at` is epoch milliseconds
/// stamped locally when the grant was received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSet {
    pub access_token:  String,
    pub refresh_token: String,
    pub expires_in:    i64,
    pub issued_at:     i64,
}

impl TokenSet {
    pub fn from_grant(grant: TokenGrant, issued_at: DateTime<Utc>) -> Self {
        Self {
            access_token:  grant.access_token,
            refresh_token: grant.refresh_token,
            expires_in:    grant.expires_in,
            issued_at:     issued_at.timestamp_millis(),
        }
    }

    /// Bearer credential, if there is one worth sending.
    pub fn access(&self) -> Option<&str> {
        Some(self.access_token.as_str()).filter(|t| !t.is_empty())
    }

    /// Refresh credential; an empty string counts as missing.
    pub fn refresh(&self) -> Option<&str> {
        Some(self.refresh_token.as_str()).filter(|t| !t.is_empty())
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.issued_at)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Saturates at the ends of the representable range, so a nonsensical
    /// `expires_in` from disk or the wire never panics.
    pub fn expires_at(&self) -> DateTime<Utc> {
        Duration::try_seconds(self.expires_in)
            .and_then(|ttl| self.issued_at().checked_add_signed(ttl))
            .unwrap_or(if self.expires_in < 0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            })
    }

    /// `now < expires_at - skew`. Only advisory: the gateway itself learns
    /// about expiry from a 401, not from this check.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        self.expires_at()
            .checked_sub_signed(skew)
            .is_some_and(|deadline| now < deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TokenSet {
        TokenSet::from_grant(
            TokenGrant {
                access_token:  "A1".into(),
                refresh_token: "R1".into(),
                expires_in:    900,
            },
            Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        )
    }

    #[test]
    fn persisted_layout_is_flat_camel_case() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "accessToken":  "A1",
                "refreshToken": "R1",
                "expiresIn":    900,
                "issuedAt":     1_700_000_000_000i64,
            })
        );
    }

    #[test]
    fn freshness_window() {
        let tokens = sample();
        let issued = tokens.issued_at();
        let skew = Duration::seconds(5);

        assert!(tokens.is_fresh_at(issued + Duration::seconds(894), skew));
        assert!(!tokens.is_fresh_at(issued + Duration::seconds(896), skew));
        assert!(!tokens.is_fresh_at(issued + Duration::seconds(901), Duration::zero()));
    }

    #[test]
    fn out_of_range_lifetimes_do_not_panic() {
        let now = Utc::now();
        let skew = Duration::seconds(5);
        let mut tokens = sample();

        tokens.expires_in = i64::MAX / 100;
        assert_eq!(tokens.expires_at(), DateTime::<Utc>::MAX_UTC);
        assert!(tokens.is_fresh_at(now, skew));

        tokens.expires_in = i64::MIN / 100;
        assert_eq!(tokens.expires_at(), DateTime::<Utc>::MIN_UTC);
        assert!(!tokens.is_fresh_at(now, skew));

        // unrepresentable issue time falls back to MIN_UTC
        tokens.issued_at = i64::MIN;
        tokens.expires_in = -900;
        assert!(!tokens.is_fresh_at(now, skew));
    }

    #[test]
    fn empty_credentials_count_as_missing() {
        let mut tokens = sample();
        tokens.refresh_token.clear();
        tokens.access_token.clear();
        assert_eq!(tokens.refresh(), None);
        assert_eq!(tokens.access(), None);
    }
}
