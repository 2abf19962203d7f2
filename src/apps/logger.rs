// Logger mode: sample the GPS receiver and append CSV records to /GPSLOG.
//
// UART reads and the sample ticker are multiplexed with `select`; the
// newest valid fix wins and is written once per tick.  Ticks with no
// new valid fix since the previous one write nothing.

use core::fmt::Write;

use embassy_futures::select::{Either, select};
use embassy_time::{Duration, Ticker};
use gpslog_core::logbook::{HEADER, LOG_DIR, MAX_RECORD, Session, write_record};
use gpslog_core::nmea::RmcFix;
use gpslog_core::nvram::LoggerSettings;
use gpslog_core::{RawTimestamp, StackFmt, local_time};
use log::{debug, error, info, warn};

use crate::board::GpsRx;
use crate::drivers::gps::GpsReceiver;
use crate::drivers::sdcard::{SdStorage, set_clock};
use crate::drivers::storage;

/// GPS dates carry two-digit years; they are read as 20YY.
pub const CENTURY: u16 = 2000;

pub async fn run_logger_mode<SPI>(sd: &SdStorage<SPI>, rx: GpsRx) -> !
where
    SPI: embedded_hal::spi::SpiDevice,
{
    let settings = storage::load_nvram(sd).logger_settings();
    info!(
        "logger: zone {} dst {} sample every {}",
        settings.zone, settings.dst, settings.sample
    );

    if let Err(e) = storage::ensure_dir(sd, LOG_DIR) {
        error!("logger: /{}: {}", LOG_DIR, e);
    }

    let mut gps = GpsReceiver::new(rx);
    let mut session = Session::new();
    let mut latest: Option<RmcFix> = None;
    let period = settings.sample.total_secs().max(1) as u64;
    let mut ticker = Ticker::every(Duration::from_secs(period));

    loop {
        match select(gps.next_rmc(), ticker.next()).await {
            Either::First(fix) => {
                if fix.valid && fix.has_timestamp() {
                    latest = Some(fix);
                } else {
                    debug!("gps: no fix yet");
                }
            }
            Either::Second(()) => {
                let Some(fix) = latest.take() else {
                    continue;
                };
                if let Err(e) = log_fix(sd, &mut session, &settings, &fix) {
                    warn!("logger: record dropped: {}", e);
                }
            }
        }
    }
}

fn log_fix<SPI>(
    sd: &SdStorage<SPI>,
    session: &mut Session,
    settings: &LoggerSettings,
    fix: &RmcFix,
) -> Result<(), &'static str>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    let is_leap = RawTimestamp::from_packed(fix.date, fix.time).is_leap_in(CENTURY);
    let stamp = local_time(
        fix.date,
        fix.time,
        settings.zone,
        settings.dst_hours(),
        is_leap,
    );
    set_clock(stamp);

    let mut path = StackFmt::<24>::new();
    let _ = write!(path, "/{}/{}", LOG_DIR, session.file_for(&stamp));

    let mut record = StackFmt::<MAX_RECORD>::new();
    write_record(&mut record, &stamp, fix).map_err(|_| "record format failed")?;

    if session.records() == 0 {
        storage::ensure_dir(sd, LOG_DIR)?;
        match storage::stat(sd, path.as_str())? {
            None => {
                storage::write_file(sd, path.as_str(), HEADER.as_bytes())?;
                info!("logger: new file {}", path.as_str());
            }
            Some(_) => info!("logger: appending to {}", path.as_str()),
        }
    }

    storage::append_file(sd, path.as_str(), record.as_bytes())?;
    session.record_written();
    debug!("logger: {} #{}", stamp, session.records());
    Ok(())
}
