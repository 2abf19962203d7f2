// gpslog-core: board-independent half of the gps-logger firmware.
// time:      UTC to local time conversion, leap-year rule, zone catalog
// nmea:      NMEA 0183 line assembly and RMC sentence parsing
// nvram:     fixed-width settings image (Wi-Fi credentials, zone, DST, sample time)
// http:      request-head parsing, argument decoding, multipart upload scanner
// pages:     HTML pages and JSON listings for the configuration web server
// provision: Wi-Fi provisioning state machine (station / access-point fallback)
// logbook:   log file naming and CSV record formatting
// dhcp:      minimal DHCPv4 server for the access-point fallback
// stack_fmt: no-alloc fmt::Write buffers

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod dhcp;
pub mod http;
pub mod logbook;
pub mod nmea;
pub mod nvram;
pub mod pages;
pub mod provision;
pub mod stack_fmt;
pub mod time;

pub use stack_fmt::{BorrowedFmt, StackFmt, stack_fmt};
pub use time::{LocalTimestamp, PackedStamp, RawTimestamp, TwoDigitYear, ZoneOffset};
pub use time::{is_leap_year, local_time};
