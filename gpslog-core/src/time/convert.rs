// UTC -> local time.
//
// All arithmetic is on small signed integers; the zone offset arrives
// as whole minutes so no floating point is involved.  Each direction
// of the day rollover is applied at most once: catalog offsets plus
// DST stay well inside +-24h, so a single day boundary is the most a
// conversion can cross.

use super::{LocalTimestamp, PackedStamp, RawTimestamp, ZoneOffset};

const DAYS_IN_MONTH: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Length of `month` (1..=12).  February is 29 days when `is_leap`.
/// Out-of-range months read as 31 so malformed input cannot panic.
pub const fn days_in_month(month: u8, is_leap: bool) -> u8 {
    match month {
        2 if is_leap => 29,
        1..=12 => DAYS_IN_MONTH[month as usize - 1],
        _ => 31,
    }
}

/// Packed form: `utc_date` is DDMMYY, `utc_time` is HHMMSSCC, result is
/// YYMMDDHHMMSS.
pub fn local_time(
    utc_date: u32,
    utc_time: u32,
    zone: ZoneOffset,
    dst: i8,
    is_leap: bool,
) -> PackedStamp {
    convert(RawTimestamp::from_packed(utc_date, utc_time), zone, dst, is_leap).to_packed()
}

/// Field form of [`local_time`].
pub fn convert(raw: RawTimestamp, zone: ZoneOffset, dst: i8, is_leap: bool) -> LocalTimestamp {
    let mut year = raw.year;
    let mut month = raw.month;
    let mut day = raw.day as i16;
    let mut hour = raw.hour as i16 + zone.hours() as i16;
    let mut minute = raw.minute as i16 + zone.minute_remainder() as i16;

    if minute > 59 {
        hour += 1;
        minute -= 60;
    } else if minute < 0 {
        hour -= 1;
        minute += 60;
    }

    hour += dst as i16;

    if hour < 0 {
        hour += 24;
        day -= 1;
        if day < 1 {
            if month == 1 {
                month = 12;
                year = year.pred();
            } else {
                month = month.wrapping_sub(1);
            }
            day = days_in_month(month, is_leap) as i16;
        }
    }

    if hour >= 24 {
        hour -= 24;
        day += 1;
        if day > days_in_month(month, is_leap) as i16 {
            day = 1;
            month = month.wrapping_add(1);
            if month > 12 {
                month = 1;
                year = year.succ();
            }
        }
    }

    LocalTimestamp {
        year,
        month,
        day: day as u8,
        hour: hour as u8,
        minute: minute as u8,
        second: raw.second,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::zone::ZONES;

    fn zone(label: &str) -> ZoneOffset {
        ZoneOffset::from_label(label).unwrap()
    }

    // DDMMYY / HHMMSSCC helpers so the tests read like calendar dates
    fn date(dd: u32, mm: u32, yy: u32) -> u32 {
        dd * 10_000 + mm * 100 + yy
    }

    fn time(hh: u32, mi: u32, ss: u32) -> u32 {
        hh * 1_000_000 + mi * 10_000 + ss * 100
    }

    #[test]
    fn zero_offset_is_identity() {
        let samples = [
            (date(1, 1, 0), time(0, 0, 0)),
            (date(31, 12, 99), time(23, 59, 59)),
            (date(29, 2, 24), time(12, 30, 15)),
            (date(15, 7, 9), time(6, 5, 4)),
        ];
        for (d, t) in samples {
            let raw = RawTimestamp::from_packed(d, t);
            let out = convert(raw, ZoneOffset::UTC, 0, true);
            assert_eq!(out, LocalTimestamp::from(raw));
        }
        assert_eq!(
            local_time(date(15, 7, 9), time(6, 5, 4) + 37, ZoneOffset::UTC, 0, false).as_str(),
            "090715060504"
        );
    }

    #[test]
    fn minute_stays_in_range_for_every_catalog_entry() {
        for z in ZONES.iter() {
            for minute in [0, 14, 15, 29, 30, 31, 44, 45, 59] {
                for hour in [0, 11, 23] {
                    let out = local_time(date(1, 3, 24), time(hour, minute, 0), z.offset, 1, true);
                    let minute_out = out.minute();
                    assert!(minute_out <= 59, "{} -> {}", z.label, out.as_str());
                    assert!(out.hour() <= 23, "{} -> {}", z.label, out.as_str());
                    assert!((1..=31).contains(&out.day()));
                    assert!((1..=12).contains(&out.month()));
                }
            }
        }
    }

    #[test]
    fn underflow_into_february() {
        let out = local_time(date(1, 3, 24), time(0, 0, 0), zone("UTC-02:00"), 0, false);
        assert_eq!(out.as_str(), "240228220000");

        let out = local_time(date(1, 3, 24), time(0, 0, 0), zone("UTC-02:00"), 0, true);
        assert_eq!(out.as_str(), "240229220000");

        // DST is applied before the day rollover
        let out = local_time(date(1, 3, 24), time(0, 0, 0), zone("UTC-02:00"), 1, true);
        assert_eq!(out.as_str(), "240229230000");
    }

    #[test]
    fn overflow_out_of_february() {
        let out = local_time(date(28, 2, 23), time(23, 10, 0), zone("UTC+01:00"), 0, false);
        assert_eq!(out.as_str(), "230301001000");

        let out = local_time(date(28, 2, 24), time(23, 10, 0), zone("UTC+01:00"), 0, true);
        assert_eq!(out.as_str(), "240229001000");
    }

    #[test]
    fn year_wraps_forward() {
        let out = local_time(date(31, 12, 99), time(23, 0, 0), zone("UTC+01:00"), 0, false);
        assert_eq!(out.as_str(), "000101000000");
    }

    #[test]
    fn year_wraps_backward() {
        let out = local_time(date(1, 1, 0), time(0, 0, 0), zone("UTC-01:00"), 0, true);
        assert_eq!(out.as_str(), "991231230000");
    }

    #[test]
    fn quarter_hour_offset_carries_one_minute_step() {
        let out = local_time(date(10, 6, 24), time(10, 20, 0), zone("UTC+05:45"), 0, true);
        assert_eq!(out.minute(), 5);
        assert_eq!(out.hour(), 16);
        assert_eq!(out.as_str(), "240610160500");
    }

    #[test]
    fn negative_half_hour_offset_borrows() {
        // 10:15 - 9:30 = 00:45
        let out = local_time(date(10, 6, 24), time(10, 15, 0), zone("UTC-09:30"), 0, true);
        assert_eq!(out.as_str(), "240610004500");

        // 00:10 - 3:30 = previous day 20:40
        let out = local_time(date(1, 5, 24), time(0, 10, 0), zone("UTC-03:30"), 0, true);
        assert_eq!(out.as_str(), "240430204000");
    }

    #[test]
    fn month_ends_follow_table() {
        let out = local_time(date(30, 4, 24), time(20, 0, 0), zone("UTC+14:00"), 0, true);
        assert_eq!(out.as_str(), "240501100000");

        let out = local_time(date(1, 8, 24), time(2, 0, 0), zone("UTC-12:00"), 0, true);
        assert_eq!(out.as_str(), "240731140000");
    }

    #[test]
    fn dst_alone_crosses_midnight() {
        let out = local_time(date(30, 6, 24), time(23, 30, 0), ZoneOffset::UTC, 1, true);
        assert_eq!(out.as_str(), "240701003000");
    }

    #[test]
    fn leap_flag_does_not_leak_between_calls() {
        let leap = local_time(date(1, 3, 24), time(0, 0, 0), zone("UTC-01:00"), 0, true);
        let plain = local_time(date(1, 3, 23), time(0, 0, 0), zone("UTC-01:00"), 0, false);
        assert_eq!(leap.as_str(), "240229230000");
        assert_eq!(plain.as_str(), "230228230000");
    }

    #[test]
    fn malformed_input_does_not_panic() {
        let _ = local_time(0, 0, zone("UTC-12:00"), -1, false);
        let _ = local_time(date(0, 13, 99), time(99, 99, 99), zone("UTC+14:00"), 1, true);
        let _ = local_time(u32::MAX, u32::MAX, zone("UTC+13:45"), i8::MAX, true);
    }

    #[test]
    fn days_in_month_table() {
        assert_eq!(days_in_month(2, false), 28);
        assert_eq!(days_in_month(2, true), 29);
        assert_eq!(days_in_month(12, true), 31);
        assert_eq!(days_in_month(11, false), 30);
        assert_eq!(days_in_month(0, false), 31);
    }
}
