//! User-entered timestamps: one wire format, one fixed source offset, always
//! normalized to UTC before anything is persisted.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

use crate::error::{CoreError, Result};

/// The format members type timestamps in: `17.03.2026 09:30`.
pub const INPUT_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Parse a user-entered timestamp and normalize it to UTC.
///
/// The input is interpreted in the configured fixed source offset. A fixed
/// offset has no DST folds, so the local-to-UTC mapping is always unique.
pub fn parse_send_at(input: &str, offset: FixedOffset) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(input.trim(), INPUT_FORMAT)
        .map_err(|_| CoreError::InvalidTimestamp(input.trim().to_string()))?;
    let local = naive
        .and_local_timezone(offset)
        .single()
        .ok_or_else(|| CoreError::InvalidTimestamp(input.trim().to_string()))?;
    Ok(local.with_timezone(&Utc))
}

/// Reject instants that are not strictly in the future.
pub fn ensure_future(at: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
    if at <= now {
        return Err(CoreError::PastTimestamp { at });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn cet() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    #[test]
    fn parse_converts_fixed_offset_to_utc() {
        let at = parse_send_at("01.06.2030 12:00", cet()).unwrap();
        assert_eq!(at, Utc.with_ymd_and_hms(2030, 6, 1, 11, 0, 0).unwrap());
    }

    #[test]
    fn parse_trims_surrounding_whitespace() {
        let at = parse_send_at("  01.06.2030 12:00  ", cet()).unwrap();
        assert_eq!(at, Utc.with_ymd_and_hms(2030, 6, 1, 11, 0, 0).unwrap());
    }

    #[test]
    fn parse_rejects_wrong_format() {
        assert!(matches!(
            parse_send_at("2030-06-01 12:00", cet()),
            Err(CoreError::InvalidTimestamp(_))
        ));
        assert!(matches!(
            parse_send_at("tomorrow", cet()),
            Err(CoreError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn parse_rejects_impossible_dates() {
        assert!(parse_send_at("31.02.2030 12:00", cet()).is_err());
    }

    #[test]
    fn future_check_is_strict() {
        let now = Utc::now();
        assert!(ensure_future(now + Duration::minutes(1), now).is_ok());
        assert!(matches!(
            ensure_future(now, now),
            Err(CoreError::PastTimestamp { .. })
        ));
        assert!(ensure_future(now - Duration::minutes(1), now).is_err());
    }
}
