// 12-digit packed local timestamp, YYMMDDHHMMSS.

use core::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedStamp([u8; 12]);

impl PackedStamp {
    /// Each field is written as two digits, modulo 100.
    pub fn from_fields(year: u8, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        let mut digits = [b'0'; 12];
        for (i, v) in [year, month, day, hour, minute, second].into_iter().enumerate() {
            let v = v % 100;
            digits[i * 2] = b'0' + v / 10;
            digits[i * 2 + 1] = b'0' + v % 10;
        }
        Self(digits)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        // always ASCII digits
        core::str::from_utf8(&self.0).unwrap_or("000000000000")
    }

    /// `YYMMDD`
    pub fn date_digits(&self) -> &str {
        &self.as_str()[..6]
    }

    /// `HHMMSS`
    pub fn time_digits(&self) -> &str {
        &self.as_str()[6..]
    }

    fn field(&self, idx: usize) -> u8 {
        (self.0[idx * 2] - b'0') * 10 + (self.0[idx * 2 + 1] - b'0')
    }

    pub fn year(&self) -> u8 {
        self.field(0)
    }

    pub fn month(&self) -> u8 {
        self.field(1)
    }

    pub fn day(&self) -> u8 {
        self.field(2)
    }

    pub fn hour(&self) -> u8 {
        self.field(3)
    }

    pub fn minute(&self) -> u8 {
        self.field(4)
    }

    pub fn second(&self) -> u8 {
        self.field(5)
    }
}

impl fmt::Display for PackedStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for PackedStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackedStamp({})", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halves_and_fields() {
        let s = PackedStamp::from_fields(7, 12, 31, 23, 5, 9);
        assert_eq!(s.as_str(), "071231230509");
        assert_eq!(s.date_digits(), "071231");
        assert_eq!(s.time_digits(), "230509");
        assert_eq!(s.month(), 12);
        assert_eq!(s.second(), 9);
        assert_eq!(format!("{s}"), "071231230509");
    }

    #[test]
    fn oversized_fields_keep_two_digits() {
        let s = PackedStamp::from_fields(255, 100, 0, 24, 60, 99);
        assert_eq!(s.as_str(), "550000246099");
    }
}
