//! Placeholder presigned URLs
//!
//! A generated URL has the shape
//! `<url_base>/<bucket>/<key>?stub-token=<json>` where the token is a JSON
//! object carrying the bucket, key, and an RFC 3339 expiry. Nothing is
//! signed and nothing checks the expiry.

use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base used when a store is not configured with its own
pub const DEFAULT_URL_BASE: &str = "https://example.com/s3";

/// Expiry applied when the caller does not choose one
pub const DEFAULT_EXPIRY_SECS: i64 = 3600;

const TOKEN_PARAM: &str = "?stub-token=";

#[derive(Serialize, Deserialize)]
struct Token {
    bucket: String,
    key: String,
    expires_at: DateTime<Utc>,
}

/// A decoded (or about to be rendered) placeholder URL
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresignedUrl {
    pub url_base: String,
    pub bucket: String,
    pub key: String,
    pub expires_at: DateTime<Utc>,
}

impl PresignedUrl {
    /// Build a URL expiring `expires_in_secs` after `now`.
    ///
    /// Out-of-range offsets saturate instead of failing.
    pub fn new(
        url_base: impl Into<String>,
        bucket: impl Into<String>,
        key: impl Into<String>,
        now: DateTime<Utc>,
        expires_in_secs: i64,
    ) -> Self {
        let expires_at = Duration::try_seconds(expires_in_secs)
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(if expires_in_secs < 0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            });

        PresignedUrl {
            url_base: url_base.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            key: key.into(),
            expires_at,
        }
    }

    /// Decode a string produced by [`PresignedUrl`]'s `Display` impl
    pub fn parse(url: &str) -> Result<Self> {
        let (location, token) = url
            .split_once(TOKEN_PARAM)
            .ok_or_else(|| Error::InvalidUrl(format!("missing token in '{}'", url)))?;
        let token: Token = serde_json::from_str(token)?;

        let suffix = format!("/{}/{}", token.bucket, token.key);
        let url_base = location
            .strip_suffix(&suffix)
            .ok_or_else(|| Error::InvalidUrl(format!("path does not match token in '{}'", url)))?;

        Ok(PresignedUrl {
            url_base: url_base.to_string(),
            bucket: token.bucket,
            key: token.key,
            expires_at: token.expires_at,
        })
    }

    /// Whether the embedded expiry label is at or before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl fmt::Display for PresignedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = Token {
            bucket: self.bucket.clone(),
            key: self.key.clone(),
            expires_at: self.expires_at,
        };
        let token = serde_json::to_string(&token).map_err(|_| fmt::Error)?;
        write!(
            f,
            "{}/{}/{}{}{}",
            self.url_base, self.bucket, self.key, TOKEN_PARAM, token
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_expiry_is_now_plus_seconds() {
        let url = PresignedUrl::new(DEFAULT_URL_BASE, "b", "k", fixed_now(), 60);
        assert_eq!(url.expires_at, Utc.with_ymd_and_hms(2024, 1, 1, 0, 1, 0).unwrap());
    }

    #[test]
    fn test_render_and_parse() {
        let url = PresignedUrl::new(
            "http://localhost:9000/",
            "photos",
            "2024/cat.jpg",
            fixed_now(),
            3600,
        );
        let rendered = url.to_string();

        assert!(rendered.starts_with("http://localhost:9000/photos/2024/cat.jpg?stub-token="));
        assert!(rendered.contains("\"expires_at\":\"2024-01-01T01:00:00Z\""));
        assert_eq!(PresignedUrl::parse(&rendered).unwrap(), url);
    }

    #[test]
    fn test_huge_expiry_saturates() {
        let url = PresignedUrl::new(DEFAULT_URL_BASE, "b", "k", fixed_now(), i64::MAX);
        assert_eq!(url.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(!url.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_negative_expiry_is_already_expired() {
        let url = PresignedUrl::new(DEFAULT_URL_BASE, "b", "k", fixed_now(), -1);
        assert!(url.is_expired_at(fixed_now()));
    }

    #[test]
    fn test_parse_rejects_foreign_url() {
        assert!(matches!(
            PresignedUrl::parse("https://example.com/no-token"),
            Err(Error::InvalidUrl(_))
        ));
    }
}
