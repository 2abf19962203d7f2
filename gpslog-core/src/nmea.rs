// NMEA 0183 input from the GPS receiver.
//
// LineAssembler turns the UART byte stream into lines; parse_rmc pulls
// the recommended-minimum sentence apart into the packed DDMMYY and
// HHMMSSCC integers the time converter consumes.  Only RMC is needed:
// it carries date, time, fix status, position and ground speed.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NmeaError {
    /// Not an RMC sentence (or not NMEA at all).
    NotRmc,
    /// `*hh` checksum did not match.
    Checksum,
    /// Sentence ended before a required field.
    MissingField,
    /// A field was present but not parseable.
    BadField,
}

impl fmt::Display for NmeaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NmeaError::NotRmc => "not an RMC sentence",
            NmeaError::Checksum => "checksum mismatch",
            NmeaError::MissingField => "missing field",
            NmeaError::BadField => "malformed field",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RmcFix {
    /// Status `A`; `V` (void) fixes must not be logged.
    pub valid: bool,
    /// Packed DDMMYY, 0 when the receiver has no date yet.
    pub date: u32,
    /// Packed HHMMSSCC, 0 when the receiver has no time yet.
    pub time: u32,
    /// Signed micro-degrees, north positive.
    pub latitude_e6: i32,
    /// Signed micro-degrees, east positive.
    pub longitude_e6: i32,
    /// Ground speed in knots x 100.
    pub speed_centiknots: u32,
}

impl RmcFix {
    /// Receiver has produced both a date and a time.
    pub fn has_timestamp(&self) -> bool {
        self.date != 0
    }
}

/// XOR of every byte between `$` and `*`.
pub fn checksum(body: &[u8]) -> u8 {
    body.iter().fold(0u8, |acc, &b| acc ^ b)
}

pub fn parse_rmc(line: &[u8]) -> Result<RmcFix, NmeaError> {
    let line = trim_line(line);
    let body = match line.split_first() {
        Some((b'$', rest)) => rest,
        _ => return Err(NmeaError::NotRmc),
    };

    let body = match body.iter().position(|&b| b == b'*') {
        Some(star) => {
            let expected = parse_hex_byte(&body[star + 1..]).ok_or(NmeaError::Checksum)?;
            if checksum(&body[..star]) != expected {
                return Err(NmeaError::Checksum);
            }
            &body[..star]
        }
        None => body,
    };

    let mut fields = body.split(|&b| b == b',');
    let tag = fields.next().ok_or(NmeaError::NotRmc)?;
    if tag.len() != 5 || !tag.ends_with(b"RMC") {
        return Err(NmeaError::NotRmc);
    }

    let mut next = || fields.next().ok_or(NmeaError::MissingField);
    let time = next()?;
    let status = next()?;
    let lat = next()?;
    let lat_hemi = next()?;
    let lon = next()?;
    let lon_hemi = next()?;
    let speed = next()?;
    let _course = next()?;
    let date = next()?;

    let valid = match status {
        b"A" => true,
        b"V" | b"" => false,
        _ => return Err(NmeaError::BadField),
    };

    Ok(RmcFix {
        valid,
        date: parse_date(date)?,
        time: parse_time(time)?,
        latitude_e6: parse_coord(lat, lat_hemi, 2, b'N', b'S')?,
        longitude_e6: parse_coord(lon, lon_hemi, 3, b'E', b'W')?,
        speed_centiknots: if speed.is_empty() {
            0
        } else {
            parse_fixed(speed, 2).ok_or(NmeaError::BadField)? as u32
        },
    })
}

fn trim_line(mut line: &[u8]) -> &[u8] {
    while let [rest @ .., b'\r' | b'\n' | b' '] = line {
        line = rest;
    }
    line
}

fn parse_hex_byte(s: &[u8]) -> Option<u8> {
    let hex = |b: u8| match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    };
    match s {
        [hi, lo] => Some(hex(*hi)? << 4 | hex(*lo)?),
        _ => None,
    }
}

fn parse_digits(s: &[u8]) -> Option<u32> {
    if s.is_empty() || s.len() > 9 {
        return None;
    }
    s.iter().try_fold(0u32, |acc, &b| {
        b.is_ascii_digit().then(|| acc * 10 + (b - b'0') as u32)
    })
}

// decimal with `places` fractional digits kept (truncated / zero padded)
fn parse_fixed(s: &[u8], places: u32) -> Option<u64> {
    let (int, frac) = match s.iter().position(|&b| b == b'.') {
        Some(dot) => (&s[..dot], &s[dot + 1..]),
        None => (s, &[][..]),
    };
    let mut value = if int.is_empty() {
        0
    } else {
        parse_digits(int)? as u64
    };
    for i in 0..places as usize {
        let d = match frac.get(i) {
            Some(b) if b.is_ascii_digit() => (b - b'0') as u64,
            Some(_) => return None,
            None => 0,
        };
        value = value * 10 + d;
    }
    if frac.iter().any(|b| !b.is_ascii_digit()) {
        return None;
    }
    Some(value)
}

// hhmmss[.ss] -> HHMMSSCC
fn parse_time(s: &[u8]) -> Result<u32, NmeaError> {
    if s.is_empty() {
        return Ok(0);
    }
    if s.len() < 6 {
        return Err(NmeaError::BadField);
    }
    let hhmmss = parse_digits(&s[..6]).ok_or(NmeaError::BadField)?;
    let centis = match s.get(6) {
        None => 0,
        Some(b'.') => parse_fixed(&s[6..], 2).ok_or(NmeaError::BadField)? as u32,
        Some(_) => return Err(NmeaError::BadField),
    };
    Ok(hhmmss * 100 + centis)
}

// ddmmyy, kept packed
fn parse_date(s: &[u8]) -> Result<u32, NmeaError> {
    match s.len() {
        0 => Ok(0),
        6 => parse_digits(s).ok_or(NmeaError::BadField),
        _ => Err(NmeaError::BadField),
    }
}

// (d)ddmm.mmmm + hemisphere -> signed micro-degrees
fn parse_coord(
    s: &[u8],
    hemi: &[u8],
    deg_digits: usize,
    positive: u8,
    negative: u8,
) -> Result<i32, NmeaError> {
    if s.is_empty() {
        return Ok(0);
    }
    if s.len() < deg_digits + 2 {
        return Err(NmeaError::BadField);
    }
    let degrees = parse_digits(&s[..deg_digits]).ok_or(NmeaError::BadField)? as i64;
    let minutes_e6 = parse_fixed(&s[deg_digits..], 6).ok_or(NmeaError::BadField)? as i64;
    if minutes_e6 >= 60_000_000 {
        return Err(NmeaError::BadField);
    }
    let micro = degrees * 1_000_000 + minutes_e6 / 60;
    match hemi {
        [h] if *h == positive => Ok(micro as i32),
        [h] if *h == negative => Ok(-micro as i32),
        _ => Err(NmeaError::BadField),
    }
}

/// Accumulates bytes into `\n`-terminated lines.  `\r` is dropped and
/// lines longer than `N` are discarded whole.
pub struct LineAssembler<const N: usize> {
    buf: [u8; N],
    len: usize,
    overflow: bool,
}

impl<const N: usize> Default for LineAssembler<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LineAssembler<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0u8; N],
            len: 0,
            overflow: false,
        }
    }

    pub fn push(&mut self, byte: u8) -> Option<&[u8]> {
        match byte {
            b'\n' => {
                let len = core::mem::take(&mut self.len);
                if core::mem::take(&mut self.overflow) || len == 0 {
                    return None;
                }
                Some(&self.buf[..len])
            }
            b'\r' => None,
            _ => {
                if self.len < N {
                    self.buf[self.len] = byte;
                    self.len += 1;
                } else {
                    self.overflow = true;
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(body: &str) -> String {
        format!("${}*{:02X}\r\n", body, checksum(body.as_bytes()))
    }

    #[test]
    fn parses_reference_sentence() {
        let fix = parse_rmc(
            b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n",
        )
        .unwrap();
        assert!(fix.valid);
        assert_eq!(fix.date, 230394);
        assert_eq!(fix.time, 12_351_900);
        assert_eq!(fix.latitude_e6, 48_117_300);
        assert_eq!(fix.longitude_e6, 11_516_666);
        assert_eq!(fix.speed_centiknots, 2240);
    }

    #[test]
    fn parses_gnss_talker_with_centiseconds() {
        let line = sentence("GNRMC,235959.25,A,3351.5000,S,15112.3000,W,0.05,,311299,,,A");
        let fix = parse_rmc(line.as_bytes()).unwrap();
        assert_eq!(fix.time, 23_595_925);
        assert_eq!(fix.date, 311299);
        assert_eq!(fix.latitude_e6, -33_858_333);
        assert_eq!(fix.longitude_e6, -151_205_000);
        assert_eq!(fix.speed_centiknots, 5);
    }

    #[test]
    fn void_fix_without_timestamp() {
        let line = sentence("GPRMC,,V,,,,,,,,,,N");
        let fix = parse_rmc(line.as_bytes()).unwrap();
        assert!(!fix.valid);
        assert!(!fix.has_timestamp());
        assert_eq!(fix.latitude_e6, 0);
    }

    #[test]
    fn rejects_bad_checksum_and_other_sentences() {
        assert_eq!(
            parse_rmc(b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6B"),
            Err(NmeaError::Checksum)
        );
        let gga = sentence("GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,");
        assert_eq!(parse_rmc(gga.as_bytes()), Err(NmeaError::NotRmc));
        assert_eq!(parse_rmc(b"garbage"), Err(NmeaError::NotRmc));
        assert_eq!(
            parse_rmc(b"$GPRMC,123519,A,4807.038"),
            Err(NmeaError::MissingField)
        );
        let bad = sentence("GPRMC,12a519,A,4807.038,N,01131.000,E,022.4,084.4,230394,,");
        assert_eq!(parse_rmc(bad.as_bytes()), Err(NmeaError::BadField));
        let hemi = sentence("GPRMC,123519,A,4807.038,E,01131.000,E,022.4,084.4,230394,,");
        assert_eq!(parse_rmc(hemi.as_bytes()), Err(NmeaError::BadField));
    }

    #[test]
    fn assembler_splits_lines_and_drops_overflow() {
        let mut asm = LineAssembler::<8>::new();
        let mut lines = Vec::new();
        for &b in b"abc\r\n\r\n0123456789\nxyz\n" {
            if let Some(line) = asm.push(b) {
                lines.push(line.to_vec());
            }
        }
        assert_eq!(lines, vec![b"abc".to_vec(), b"xyz".to_vec()]);
    }
}
