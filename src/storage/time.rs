use crate::error::PaywallError;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Database column format (UTC, second precision).
pub fn to_utc_string(dt: &DateTime<Utc>) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// API output format: ISO-8601 / RFC3339 (UTC, `Z`).
pub fn to_iso8601_utc_string(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_utc_string(s: &str) -> crate::error::Result<DateTime<Utc>> {
    use chrono::NaiveDateTime;
    let naive = NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .map_err(|e| PaywallError::TimeParse(e.to_string()))?;
    Ok(Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utc_string_roundtrip() {
        let dt = Utc.with_ymd_and_hms(2026, 1, 20, 10, 20, 30).unwrap();
        let s = to_utc_string(&dt);
        assert_eq!(s, "2026-01-20 10:20:30");
        assert_eq!(parse_utc_string(&s).unwrap(), dt);
    }

    #[test]
    fn iso8601_output_uses_z_suffix() {
        let dt = Utc.with_ymd_and_hms(2026, 1, 20, 10, 20, 30).unwrap();
        assert_eq!(to_iso8601_utc_string(&dt), "2026-01-20T10:20:30Z");
    }

    #[test]
    fn garbage_fails_with_time_parse() {
        assert!(matches!(
            parse_utc_string("not a date"),
            Err(PaywallError::TimeParse(_))
        ));
    }
}
