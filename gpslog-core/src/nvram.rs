// Persisted settings as a fixed-width byte image.
//
// The image is 128 bytes, NUL padded, and written to the SD card as a
// whole.  Offsets are part of the on-card format and must not move:
//
//   0..32    Wi-Fi SSID
//   32..96   Wi-Fi password
//   96..100  unused
//   100..106 zone offset, "+HH:MM" / "-HH:MM"
//   106      DST, '1' or '0'
//   107..112 GPS sample time, "MM:SS"
//   112..128 unused (112..115 cleared with the logger settings)

use core::fmt;
use core::ops::Range;

use crate::time::ZoneOffset;
use crate::time::zone;

pub const NVRAM_SIZE: usize = 128;

pub const SSID_CAP: usize = 32;
pub const PASS_CAP: usize = 64;

const SSID: Range<usize> = 0..32;
const PASS: Range<usize> = 32..96;
const CREDENTIALS: Range<usize> = 0..96;
const ZONE: Range<usize> = 100..106;
const DST: usize = 106;
const SAMPLE: Range<usize> = 107..112;
const LOGGER: Range<usize> = 100..115;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsError {
    UnknownZone,
    BadDst,
    BadMinutes,
    BadSeconds,
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SettingsError::UnknownZone => "unknown time zone",
            SettingsError::BadDst => "DST must be Yes or No",
            SettingsError::BadMinutes => "minutes must be 0-60",
            SettingsError::BadSeconds => "seconds must be 0-59",
        })
    }
}

/// GPS sample period, minutes 0..=60 and seconds 0..=59.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleInterval {
    minutes: u8,
    seconds: u8,
}

impl Default for SampleInterval {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl SampleInterval {
    pub const DEFAULT: Self = Self {
        minutes: 0,
        seconds: 3,
    };

    pub const MINIMUM: Self = Self {
        minutes: 0,
        seconds: 1,
    };

    /// `None` outside 0..=60 minutes / 0..=59 seconds.  A zero period
    /// is representable here; the settings form raises it to one second.
    pub const fn new(minutes: u8, seconds: u8) -> Option<Self> {
        if minutes > 60 || seconds > 59 {
            None
        } else {
            Some(Self { minutes, seconds })
        }
    }

    pub const fn minutes(&self) -> u8 {
        self.minutes
    }

    pub const fn seconds(&self) -> u8 {
        self.seconds
    }

    pub const fn total_secs(&self) -> u32 {
        self.minutes as u32 * 60 + self.seconds as u32
    }

    fn to_stored(self) -> [u8; 5] {
        [
            b'0' + self.minutes / 10,
            b'0' + self.minutes % 10,
            b':',
            b'0' + self.seconds / 10,
            b'0' + self.seconds % 10,
        ]
    }

    fn from_stored(raw: &[u8]) -> Option<Self> {
        let &[m1, m0, b':', s1, s0] = raw else {
            return None;
        };
        if ![m1, m0, s1, s0].iter().all(u8::is_ascii_digit) {
            return None;
        }
        Self::new((m1 - b'0') * 10 + (m0 - b'0'), (s1 - b'0') * 10 + (s0 - b'0'))
    }
}

impl fmt::Display for SampleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes, self.seconds)
    }
}

/// Zone, DST and sampling used by the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoggerSettings {
    pub zone: ZoneOffset,
    pub dst: bool,
    pub sample: SampleInterval,
}

impl LoggerSettings {
    pub const fn dst_hours(&self) -> i8 {
        if self.dst { 1 } else { 0 }
    }
}

/// Borrowed view of the stored Wi-Fi credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

impl Credentials<'_> {
    pub fn is_provisioned(&self) -> bool {
        !self.ssid.is_empty()
    }

    pub fn is_open_network(&self) -> bool {
        self.password.is_empty()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Nvram {
    bytes: [u8; NVRAM_SIZE],
}

impl Default for Nvram {
    fn default() -> Self {
        Self::blank()
    }
}

impl fmt::Debug for Nvram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // never print the password
        f.debug_struct("Nvram")
            .field("ssid", &self.credentials().ssid)
            .field("logger", &self.logger_settings())
            .finish()
    }
}

impl Nvram {
    pub const fn blank() -> Self {
        Self {
            bytes: [0u8; NVRAM_SIZE],
        }
    }

    /// Short input leaves the tail blank; long input is cut at 128 bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut nv = Self::blank();
        let n = data.len().min(NVRAM_SIZE);
        nv.bytes[..n].copy_from_slice(&data[..n]);
        nv
    }

    pub fn as_bytes(&self) -> &[u8; NVRAM_SIZE] {
        &self.bytes
    }

    fn clear(&mut self, range: Range<usize>) {
        self.bytes[range].fill(0);
    }

    fn text(&self, range: Range<usize>) -> &str {
        let field = &self.bytes[range];
        let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
        core::str::from_utf8(&field[..end]).unwrap_or("")
    }

    fn put_text(&mut self, range: Range<usize>, value: &str) {
        let value = truncate_str(value, range.len());
        self.bytes[range.start..range.start + value.len()].copy_from_slice(value.as_bytes());
    }

    pub fn credentials(&self) -> Credentials<'_> {
        Credentials {
            ssid: self.text(SSID),
            password: self.text(PASS),
        }
    }

    /// Clears the whole credential block, then writes both fields
    /// (cut to 32 / 64 bytes on a char boundary).
    pub fn store_credentials(&mut self, ssid: &str, password: &str) {
        self.clear(CREDENTIALS);
        self.put_text(SSID, ssid);
        self.put_text(PASS, password);
    }

    pub fn clear_credentials(&mut self) {
        self.clear(CREDENTIALS);
    }

    /// Blank or damaged fields fall back to their defaults one by one.
    pub fn logger_settings(&self) -> LoggerSettings {
        LoggerSettings {
            zone: ZoneOffset::from_stored(&self.bytes[ZONE]).unwrap_or(ZoneOffset::UTC),
            dst: self.bytes[DST] == b'1',
            sample: SampleInterval::from_stored(&self.bytes[SAMPLE]).unwrap_or_default(),
        }
    }

    pub fn store_logger_settings(&mut self, settings: &LoggerSettings) {
        self.clear(LOGGER);
        self.bytes[ZONE].copy_from_slice(&settings.zone.to_stored());
        self.bytes[DST] = if settings.dst { b'1' } else { b'0' };
        self.bytes[SAMPLE].copy_from_slice(&settings.sample.to_stored());
    }
}

fn truncate_str(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut n = max;
    while !s.is_char_boundary(n) {
        n -= 1;
    }
    &s[..n]
}

/// Validated submission of the settings page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsForm {
    pub settings: LoggerSettings,
    /// A 00:00 sample time was raised to 00:01.
    pub raised_to_minimum: bool,
}

impl SettingsForm {
    /// `zone` must be a catalog label, `dst` is `Yes`/`No`.
    pub fn parse(
        zone_label: &str,
        dst: &str,
        minutes: &str,
        seconds: &str,
    ) -> Result<Self, SettingsError> {
        let zone = zone::lookup(zone_label.trim()).ok_or(SettingsError::UnknownZone)?;
        let dst = match dst.trim() {
            "Yes" => true,
            "No" => false,
            _ => return Err(SettingsError::BadDst),
        };
        let minutes = parse_small(minutes, 60).ok_or(SettingsError::BadMinutes)?;
        let seconds = parse_small(seconds, 59).ok_or(SettingsError::BadSeconds)?;

        let (sample, raised_to_minimum) = match SampleInterval::new(minutes, seconds) {
            Some(s) if s.total_secs() == 0 => (SampleInterval::MINIMUM, true),
            Some(s) => (s, false),
            None => return Err(SettingsError::BadSeconds),
        };

        Ok(Self {
            settings: LoggerSettings {
                zone: zone.offset,
                dst,
                sample,
            },
            raised_to_minimum,
        })
    }
}

fn parse_small(s: &str, max: u8) -> Option<u8> {
    let s = s.trim();
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let v = s.bytes().fold(0u8, |acc, b| acc * 10 + (b - b'0'));
    (v <= max).then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_image_reads_defaults() {
        let nv = Nvram::blank();
        let creds = nv.credentials();
        assert!(!creds.is_provisioned());
        assert_eq!(nv.logger_settings(), LoggerSettings::default());
        assert_eq!(nv.logger_settings().sample.total_secs(), 3);
    }

    #[test]
    fn credentials_are_fixed_width() {
        let mut nv = Nvram::blank();
        nv.store_credentials("HomeNet", "hunter22");
        assert_eq!(nv.credentials().ssid, "HomeNet");
        assert_eq!(nv.credentials().password, "hunter22");
        assert_eq!(&nv.as_bytes()[..7], b"HomeNet");
        assert_eq!(nv.as_bytes()[7], 0);
        assert_eq!(&nv.as_bytes()[32..40], b"hunter22");

        // a shorter SSID must not leave the tail of the old one behind
        nv.store_credentials("Cafe", "");
        assert_eq!(nv.credentials().ssid, "Cafe");
        assert!(nv.credentials().is_open_network());

        let long = "x".repeat(40);
        nv.store_credentials(&long, &"p".repeat(70));
        assert_eq!(nv.credentials().ssid.len(), SSID_CAP);
        assert_eq!(nv.credentials().password.len(), PASS_CAP);
    }

    #[test]
    fn multibyte_ssid_is_cut_on_char_boundary() {
        let mut nv = Nvram::blank();
        let ssid = format!("{}é", "a".repeat(31));
        nv.store_credentials(&ssid, "pw");
        assert_eq!(nv.credentials().ssid, "a".repeat(31));
    }

    #[test]
    fn clearing_credentials_keeps_logger_settings() {
        let mut nv = Nvram::blank();
        let settings = LoggerSettings {
            zone: ZoneOffset::from_minutes(345),
            dst: true,
            sample: SampleInterval::new(1, 30).unwrap(),
        };
        nv.store_logger_settings(&settings);
        nv.store_credentials("net", "pw");
        nv.clear_credentials();
        assert!(!nv.credentials().is_provisioned());
        assert_eq!(nv.logger_settings(), settings);
        assert_eq!(&nv.as_bytes()[100..112], b"+05:45101:30");
    }

    #[test]
    fn image_survives_a_reload() {
        let mut nv = Nvram::blank();
        nv.store_credentials("net", "pw");
        nv.store_logger_settings(&LoggerSettings {
            zone: ZoneOffset::from_minutes(-570),
            dst: false,
            sample: SampleInterval::new(60, 0).unwrap(),
        });
        let again = Nvram::from_bytes(nv.as_bytes());
        assert_eq!(again, nv);
        assert_eq!(again.logger_settings().zone.minutes(), -570);
        assert_eq!(again.logger_settings().sample.total_secs(), 3600);
    }

    #[test]
    fn settings_form_validation() {
        let form = SettingsForm::parse("UTC+05:45", "Yes", "2", "05").unwrap();
        assert_eq!(form.settings.zone.minutes(), 345);
        assert_eq!(form.settings.dst_hours(), 1);
        assert_eq!(form.settings.sample.total_secs(), 125);
        assert!(!form.raised_to_minimum);

        let form = SettingsForm::parse("UTC", "No", "0", "0").unwrap();
        assert_eq!(form.settings.sample, SampleInterval::MINIMUM);
        assert!(form.raised_to_minimum);

        let form = SettingsForm::parse("UTC", "No", "1", "0").unwrap();
        assert_eq!(form.settings.sample.total_secs(), 60);
        assert!(!form.raised_to_minimum);

        assert_eq!(
            SettingsForm::parse("UTC+02:30", "No", "0", "3"),
            Err(SettingsError::UnknownZone)
        );
        assert_eq!(
            SettingsForm::parse("UTC", "maybe", "0", "3"),
            Err(SettingsError::BadDst)
        );
        assert_eq!(
            SettingsForm::parse("UTC", "No", "61", "3"),
            Err(SettingsError::BadMinutes)
        );
        assert_eq!(
            SettingsForm::parse("UTC", "No", "0", "60"),
            Err(SettingsError::BadSeconds)
        );
        assert_eq!(
            SettingsForm::parse("UTC", "No", "", "3"),
            Err(SettingsError::BadMinutes)
        );
    }

    #[test]
    fn debug_hides_password() {
        let mut nv = Nvram::blank();
        nv.store_credentials("net", "topsecret");
        let dbg = format!("{nv:?}");
        assert!(dbg.contains("net"));
        assert!(!dbg.contains("topsecret"));
    }
}
