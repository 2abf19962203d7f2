// Zone offsets as fixed-point minutes, and the catalog offered by the
// settings page.
//
// Label form:  "UTC", "UTC+05:45", "UTC-09:30"
// Stored form: "+05:45" (six bytes; the label without "UTC", with
//              "UTC" itself stored as "+00:00")

use core::fmt;

/// Signed offset from UTC in whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ZoneOffset(i16);

/// Parse failures for labels and stored offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneError {
    Prefix,
    Sign,
    Digits,
    Range,
}

impl fmt::Display for ZoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ZoneError::Prefix => "zone label must start with UTC",
            ZoneError::Sign => "zone offset needs a + or - sign",
            ZoneError::Digits => "zone offset must be HH:MM",
            ZoneError::Range => "zone offset out of range",
        })
    }
}

// furthest real-world offsets are -12:00 and +14:00; leave headroom
const MAX_MINUTES: i16 = 15 * 60;

impl ZoneOffset {
    pub const UTC: Self = Self(0);

    pub const fn from_minutes(minutes: i16) -> Self {
        Self(minutes)
    }

    /// Real-valued hours (e.g. 5.75), rounded to the nearest minute.
    pub fn from_hours(hours: f32) -> Self {
        let m = hours * 60.0;
        let rounded = if m >= 0.0 { m + 0.5 } else { m - 0.5 };
        Self(rounded as i16)
    }

    #[inline]
    pub const fn minutes(self) -> i16 {
        self.0
    }

    /// Whole-hour part, truncated toward zero.
    #[inline]
    pub const fn hours(self) -> i8 {
        (self.0 / 60) as i8
    }

    /// Minutes left after [`hours`](Self::hours); carries the offset's sign.
    #[inline]
    pub const fn minute_remainder(self) -> i8 {
        (self.0 % 60) as i8
    }

    /// Parse `UTC` or `UTC±HH:MM`.
    pub fn from_label(label: &str) -> Result<Self, ZoneError> {
        let rest = label.strip_prefix("UTC").ok_or(ZoneError::Prefix)?;
        if rest.is_empty() {
            return Ok(Self::UTC);
        }
        Self::parse_signed(rest.as_bytes())
    }

    /// Parse the six-byte `±HH:MM` form kept in the settings image.
    pub fn from_stored(raw: &[u8]) -> Result<Self, ZoneError> {
        Self::parse_signed(raw)
    }

    fn parse_signed(raw: &[u8]) -> Result<Self, ZoneError> {
        let (neg, digits) = match raw.split_first() {
            Some((b'+', d)) => (false, d),
            Some((b'-', d)) => (true, d),
            _ => return Err(ZoneError::Sign),
        };
        let &[h1, h0, b':', m1, m0] = digits else {
            return Err(ZoneError::Digits);
        };
        let digit = |b: u8| {
            if b.is_ascii_digit() {
                Ok((b - b'0') as i16)
            } else {
                Err(ZoneError::Digits)
            }
        };
        let hours = digit(h1)? * 10 + digit(h0)?;
        let minutes = digit(m1)? * 10 + digit(m0)?;
        if minutes > 59 {
            return Err(ZoneError::Range);
        }
        let total = hours * 60 + minutes;
        if total > MAX_MINUTES {
            return Err(ZoneError::Range);
        }
        Ok(Self(if neg { -total } else { total }))
    }

    /// Six-byte `±HH:MM`; zero is `+00:00`.
    pub fn to_stored(self) -> [u8; 6] {
        let abs = self.0.unsigned_abs();
        let h = ((abs / 60) % 100) as u8;
        let m = (abs % 60) as u8;
        [
            if self.0 < 0 { b'-' } else { b'+' },
            b'0' + h / 10,
            b'0' + h % 10,
            b':',
            b'0' + m / 10,
            b'0' + m % 10,
        ]
    }
}

impl fmt::Display for ZoneOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return f.write_str("UTC");
        }
        let stored = self.to_stored();
        f.write_str("UTC")?;
        f.write_str(core::str::from_utf8(&stored).unwrap_or("+00:00"))
    }
}

/// One catalog entry: the label shown in the settings form and its offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zone {
    pub label: &'static str,
    pub offset: ZoneOffset,
}

const fn z(label: &'static str, minutes: i16) -> Zone {
    Zone {
        label,
        offset: ZoneOffset::from_minutes(minutes),
    }
}

pub const ZONES: [Zone; 40] = [
    z("UTC-12:00", -720),
    z("UTC-11:00", -660),
    z("UTC-10:00", -600),
    z("UTC-09:30", -570),
    z("UTC-09:00", -540),
    z("UTC-08:00", -480),
    z("UTC-07:00", -420),
    z("UTC-06:00", -360),
    z("UTC-05:00", -300),
    z("UTC-04:00", -240),
    z("UTC-03:30", -210),
    z("UTC-03:00", -180),
    z("UTC-02:00", -120),
    z("UTC-01:00", -60),
    z("UTC", 0),
    z("UTC+01:00", 60),
    z("UTC+02:00", 120),
    z("UTC+03:00", 180),
    z("UTC+03:30", 210),
    z("UTC+04:00", 240),
    z("UTC+04:30", 270),
    z("UTC+05:00", 300),
    z("UTC+05:30", 330),
    z("UTC+05:45", 345),
    z("UTC+06:00", 360),
    z("UTC+06:30", 390),
    z("UTC+07:00", 420),
    z("UTC+08:00", 480),
    z("UTC+08:30", 510),
    z("UTC+08:45", 525),
    z("UTC+09:00", 540),
    z("UTC+09:30", 570),
    z("UTC+10:00", 600),
    z("UTC+10:30", 630),
    z("UTC+11:00", 660),
    z("UTC+12:00", 720),
    z("UTC+12:45", 765),
    z("UTC+13:00", 780),
    z("UTC+13:45", 825),
    z("UTC+14:00", 840),
];

/// Catalog entry with exactly this label.
pub fn lookup(label: &str) -> Option<&'static Zone> {
    ZONES.iter().find(|z| z.label == label)
}

/// Catalog entry for an offset, if the catalog has one.
pub fn find_offset(offset: ZoneOffset) -> Option<&'static Zone> {
    ZONES.iter().find(|z| z.offset == offset)
}
