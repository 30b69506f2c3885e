use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Workbook date system (`workbookPr/@date1904`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DateSystem {
    /// Serial 1 is 1900-01-01, with Lotus 1-2-3's fictitious 1900-02-29 at serial 60.
    #[default]
    Excel1900,
    /// Serial 0 is 1904-01-01.
    Excel1904,
}

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Convert a serial date number into a date-time, rounded to the nearest second.
///
/// Returns `None` for negative, non-finite or out-of-range serials.
pub(crate) fn serial_to_datetime(serial: f64, system: DateSystem) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 || serial > 2_958_466.0 {
        return None;
    }

    let total_seconds = (serial * SECONDS_PER_DAY).round() as i64;
    let days = total_seconds.div_euclid(86_400);
    let seconds = total_seconds.rem_euclid(86_400);

    let base = match system {
        // Serials before the phantom leap day are one day "late" relative to 1899-12-30.
        DateSystem::Excel1900 if days < 60 => NaiveDate::from_ymd_opt(1899, 12, 31)?,
        DateSystem::Excel1900 => NaiveDate::from_ymd_opt(1899, 12, 30)?,
        DateSystem::Excel1904 => NaiveDate::from_ymd_opt(1904, 1, 1)?,
    };
    let date = base.checked_add_signed(Duration::days(days))?;
    date.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::seconds(seconds))
}

/// Convert the fractional-day part of a serial into a wall-clock time.
pub(crate) fn serial_to_time(serial: f64) -> Option<NaiveTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let seconds = ((serial.fract() * SECONDS_PER_DAY).round() as u32) % 86_400;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)
}

/// Parse a `t="d"` ISO-8601 cell payload.
pub(crate) fn parse_iso_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim().trim_end_matches('Z');
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn excel_1900_serials_account_for_the_phantom_leap_day() {
        let sys = DateSystem::Excel1900;
        assert_eq!(serial_to_datetime(1.0, sys), Some(ymd_hms(1900, 1, 1, 0, 0, 0)));
        assert_eq!(serial_to_datetime(59.0, sys), Some(ymd_hms(1900, 2, 28, 0, 0, 0)));
        assert_eq!(serial_to_datetime(61.0, sys), Some(ymd_hms(1900, 3, 1, 0, 0, 0)));
        assert_eq!(serial_to_datetime(45292.0, sys), Some(ymd_hms(2024, 1, 1, 0, 0, 0)));
        assert_eq!(serial_to_datetime(45292.5, sys), Some(ymd_hms(2024, 1, 1, 12, 0, 0)));
    }

    #[test]
    fn excel_1904_serials_start_in_1904() {
        let sys = DateSystem::Excel1904;
        assert_eq!(serial_to_datetime(0.0, sys), Some(ymd_hms(1904, 1, 1, 0, 0, 0)));
        assert_eq!(serial_to_datetime(43830.0, sys), Some(ymd_hms(2024, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn rejects_negative_and_non_finite_serials() {
        assert_eq!(serial_to_datetime(-1.0, DateSystem::Excel1900), None);
        assert_eq!(serial_to_datetime(f64::NAN, DateSystem::Excel1900), None);
        assert_eq!(serial_to_time(-0.5), None);
    }

    #[test]
    fn time_fraction_rounds_to_seconds() {
        assert_eq!(
            serial_to_time(0.75),
            Some(NaiveTime::from_hms_opt(18, 0, 0).unwrap())
        );
        assert_eq!(
            serial_to_time(0.999_999_9),
            Some(NaiveTime::from_hms_opt(0, 0, 0).unwrap())
        );
    }

    #[test]
    fn iso_payloads_parse_with_or_without_time() {
        assert_eq!(
            parse_iso_datetime("2024-02-29T08:30:00Z"),
            Some(ymd_hms(2024, 2, 29, 8, 30, 0))
        );
        assert_eq!(
            parse_iso_datetime("2024-02-29"),
            Some(ymd_hms(2024, 2, 29, 0, 0, 0))
        );
        assert_eq!(parse_iso_datetime("yesterday"), None);
    }
}
