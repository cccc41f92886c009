//! Environment-derived configuration.

use chrono::FixedOffset;
use std::env;

#[derive(Clone)]
pub struct Config {
    /// Status HTTP listener port.
    pub port: u16,
    /// SQLite path. `:memory:` is supported for tests.
    pub db_path: String,
    /// Trusted identity for the self-chat guard. Ingestion is disabled when unset.
    pub expected_sender: Option<String>,
    /// Base URL of the external WhatsApp gateway.
    pub gateway_url: String,
    /// Incoming-message poll interval in seconds.
    pub poll_interval_secs: u64,
    /// Fixed UTC offset used for "today" and the midnight fire. Default UTC.
    pub tz: FixedOffset,
}

impl Config {
    pub fn from_env() -> Self {
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8000);

        let db_path =
            env::var("BIRTHDAY_DB_PATH").unwrap_or_else(|_| "./birthdays.db".to_string());

        let expected_sender = env::var("EXPECTED_SENDER").ok().filter(|s| !s.is_empty());

        let gateway_url =
            env::var("WA_GATEWAY_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());

        let poll_interval_secs: u64 = env::var("WA_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        let offset_minutes: i32 = env::var("BIRTHDAY_UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        let tz = offset_from_minutes(offset_minutes);

        Self {
            port,
            db_path,
            expected_sender,
            gateway_url,
            poll_interval_secs,
            tz,
        }
    }
}

/// Fixed offset from a minute count. Out-of-range values (including ones
/// large enough to overflow the seconds conversion) fall back to UTC with a
/// warning.
fn offset_from_minutes(minutes: i32) -> FixedOffset {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| {
            log::warn!(
                "[BIRTHDAY_BOT] Invalid BIRTHDAY_UTC_OFFSET_MINUTES={}, falling back to UTC",
                minutes
            );
            FixedOffset::east_opt(0).expect("zero offset is valid")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_from_minutes_valid() {
        assert_eq!(
            offset_from_minutes(60),
            FixedOffset::east_opt(3600).unwrap()
        );
        assert_eq!(
            offset_from_minutes(-300),
            FixedOffset::east_opt(-18000).unwrap()
        );
        assert_eq!(offset_from_minutes(0), FixedOffset::east_opt(0).unwrap());
    }

    #[test]
    fn test_offset_from_minutes_out_of_range_falls_back_to_utc() {
        let utc = FixedOffset::east_opt(0).unwrap();
        // Beyond the +/-24h range chrono accepts
        assert_eq!(offset_from_minutes(10_000), utc);
        assert_eq!(offset_from_minutes(-10_000), utc);
    }

    #[test]
    fn test_offset_from_minutes_overflow_falls_back_to_utc() {
        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(offset_from_minutes(2_000_000_000), utc);
        assert_eq!(offset_from_minutes(i32::MIN), utc);
    }
}

