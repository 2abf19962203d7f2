// Calendar arithmetic for GPS timestamps.
//
// The receiver reports UTC as two packed integers (DDMMYY, HHMMSSCC).
// convert.rs shifts them by a zone offset and DST and rolls the carry
// through minute -> hour -> day -> month -> year.  Years are two digits
// with modular wraparound; the century is never tracked.
//
// stamp.rs: the 12-digit YYMMDDHHMMSS output
// zone.rs:  fixed-point zone offsets and the 40-entry catalog

mod convert;
mod stamp;
pub mod zone;

pub use convert::{convert, days_in_month, local_time};
pub use stamp::PackedStamp;
pub use zone::ZoneOffset;

/// Gregorian leap-year rule: divisible by 4, except centuries that are
/// not divisible by 400.  Total over all integers.
pub const fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Two-digit year, 0..=99, wrapping at the century boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct TwoDigitYear(u8);

impl TwoDigitYear {
    /// Reduces `yy` modulo 100.
    pub const fn new(yy: u8) -> Self {
        Self(yy % 100)
    }

    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Next year; 99 wraps to 0.
    pub const fn succ(self) -> Self {
        if self.0 >= 99 { Self(0) } else { Self(self.0 + 1) }
    }

    /// Previous year; 0 wraps to 99.
    pub const fn pred(self) -> Self {
        if self.0 == 0 { Self(99) } else { Self(self.0 - 1) }
    }

    /// Four-digit year assuming the given century base (e.g. 2000).
    pub const fn in_century(self, base: u16) -> u16 {
        base + self.0 as u16
    }
}

/// UTC calendar point as decoded from the receiver's packed integers.
/// Fields are trusted; nothing here validates calendar ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTimestamp {
    pub year: TwoDigitYear,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl RawTimestamp {
    /// Decode `DDMMYY` and `HHMMSSCC`.  Centiseconds are dropped.
    pub const fn from_packed(date: u32, time: u32) -> Self {
        Self {
            year: TwoDigitYear::new((date % 100) as u8),
            month: ((date / 100) % 100) as u8,
            day: ((date / 10_000) % 100) as u8,
            hour: ((time / 1_000_000) % 100) as u8,
            minute: ((time / 10_000) % 100) as u8,
            second: ((time / 100) % 100) as u8,
        }
    }

    /// Whether the four-digit year in `century_base` is a leap year.
    pub const fn is_leap_in(&self, century_base: u16) -> bool {
        is_leap_year(self.year.in_century(century_base) as i32)
    }
}

/// Zone- and DST-adjusted calendar point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTimestamp {
    pub year: TwoDigitYear,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl LocalTimestamp {
    pub fn to_packed(&self) -> PackedStamp {
        PackedStamp::from_fields(
            self.year.get(),
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
        )
    }
}

impl From<RawTimestamp> for LocalTimestamp {
    fn from(raw: RawTimestamp) -> Self {
        Self {
            year: raw.year,
            month: raw.month,
            day: raw.day,
            hour: raw.hour,
            minute: raw.minute,
            second: raw.second,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leap_year_rule() {
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(2100));
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(2023));
        assert!(!is_leap_year(1900));
        assert!(is_leap_year(0));
        assert!(is_leap_year(-4));
        assert!(!is_leap_year(-100));
    }

    #[test]
    fn two_digit_year_wraps() {
        assert_eq!(TwoDigitYear::new(99).succ(), TwoDigitYear::new(0));
        assert_eq!(TwoDigitYear::new(0).pred(), TwoDigitYear::new(99));
        assert_eq!(TwoDigitYear::new(24).succ().get(), 25);
        assert_eq!(TwoDigitYear::new(124).get(), 24);
        assert_eq!(TwoDigitYear::new(24).in_century(2000), 2024);
    }

    #[test]
    fn packed_fields_decode() {
        let raw = RawTimestamp::from_packed(10_324, 23_595_812);
        assert_eq!(raw.day, 1);
        assert_eq!(raw.month, 3);
        assert_eq!(raw.year.get(), 24);
        assert_eq!(raw.hour, 23);
        assert_eq!(raw.minute, 59);
        assert_eq!(raw.second, 58);
        assert!(raw.is_leap_in(2000));
    }
}
