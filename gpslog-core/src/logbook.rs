// CSV track logs.
//
// One file per logging session in /GPSLOG, named after the local hour
// the session's first fix arrived in (YYMMDDHH.CSV, an 8.3 name).  A new
// file gets the header line; records are appended one per sample tick.

use core::fmt::{self, Write};

use crate::nmea::RmcFix;
use crate::stack_fmt::StackFmt;
use crate::time::PackedStamp;

pub const LOG_DIR: &str = "GPSLOG";
pub const HEADER: &str = "date,time,latitude,longitude,speed_kn\r\n";

/// Longest record: two 11-char coordinates plus date, time and speed.
pub const MAX_RECORD: usize = 64;

pub type FileName = StackFmt<12>;

/// `YYMMDDHH.CSV`
pub fn file_name(stamp: &PackedStamp) -> FileName {
    let mut name = FileName::new();
    let _ = write!(name, "{}{:02}.CSV", stamp.date_digits(), stamp.hour());
    name
}

/// Signed micro-degrees printed with six decimals.
pub struct Degrees(pub i32);

impl fmt::Display for Degrees {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:06}", sign, abs / 1_000_000, abs % 1_000_000)
    }
}

/// `20YY-MM-DD,HH:MM:SS,lat,lon,speed\r\n`
pub fn write_record(w: &mut impl Write, stamp: &PackedStamp, fix: &RmcFix) -> fmt::Result {
    write!(
        w,
        "20{:02}-{:02}-{:02},{:02}:{:02}:{:02},{},{},{}.{:02}\r\n",
        stamp.year(),
        stamp.month(),
        stamp.day(),
        stamp.hour(),
        stamp.minute(),
        stamp.second(),
        Degrees(fix.latitude_e6),
        Degrees(fix.longitude_e6),
        fix.speed_centiknots / 100,
        fix.speed_centiknots % 100,
    )
}

/// Which file this boot is writing, fixed by the first logged fix.
#[derive(Default)]
pub struct Session {
    file: Option<FileName>,
    records: u32,
}

impl Session {
    pub const fn new() -> Self {
        Self {
            file: None,
            records: 0,
        }
    }

    /// File name for this session; the first call decides it.
    pub fn file_for(&mut self, stamp: &PackedStamp) -> &str {
        self.file.get_or_insert_with(|| file_name(stamp)).as_str()
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_ref().map(|f| f.as_str())
    }

    pub fn record_written(&mut self) {
        self.records = self.records.wrapping_add(1);
    }

    pub fn records(&self) -> u32 {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(lat: i32, lon: i32, speed: u32) -> RmcFix {
        RmcFix {
            valid: true,
            date: 100624,
            time: 12_000_000,
            latitude_e6: lat,
            longitude_e6: lon,
            speed_centiknots: speed,
        }
    }

    #[test]
    fn file_name_is_8_3() {
        let stamp = PackedStamp::from_fields(24, 6, 10, 7, 59, 1);
        assert_eq!(file_name(&stamp).as_str(), "24061007.CSV");
    }

    #[test]
    fn record_layout() {
        let stamp = PackedStamp::from_fields(24, 6, 10, 17, 45, 3);
        let mut out = String::new();
        write_record(&mut out, &stamp, &fix(48_117_300, -11_516_666, 2240)).unwrap();
        assert_eq!(out, "2024-06-10,17:45:03,48.117300,-11.516666,22.40\r\n");
    }

    #[test]
    fn small_negative_coordinates_keep_sign() {
        let stamp = PackedStamp::from_fields(0, 1, 1, 0, 0, 0);
        let mut out = String::new();
        write_record(&mut out, &stamp, &fix(-500_000, 7, 5)).unwrap();
        assert_eq!(out, "2000-01-01,00:00:00,-0.500000,0.000007,0.05\r\n");
    }

    #[test]
    fn widest_record_fits() {
        let stamp = PackedStamp::from_fields(99, 12, 31, 23, 59, 59);
        let mut out = StackFmt::<MAX_RECORD>::new();
        write_record(&mut out, &stamp, &fix(-89_999_999, -179_999_999, 99_999)).unwrap();
        assert!(!out.overflowed());
    }

    #[test]
    fn session_keeps_first_file_name() {
        let mut session = Session::new();
        assert_eq!(session.file(), None);
        let first = PackedStamp::from_fields(24, 6, 10, 23, 59, 59);
        let later = PackedStamp::from_fields(24, 6, 11, 0, 0, 5);
        assert_eq!(session.file_for(&first), "24061023.CSV");
        assert_eq!(session.file_for(&later), "24061023.CSV");
        session.record_written();
        assert_eq!(session.records(), 1);
    }
}
