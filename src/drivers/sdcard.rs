// SD card over SPI with FAT volume manager
// No RTC on board; file timestamps come from the last logged GPS fix,
// or 2000-01-01 00:00 until one arrives.

use core::cell::Cell;

use critical_section::Mutex;
use embedded_sdmmc::{SdCard, TimeSource, Timestamp, VolumeManager};
use gpslog_core::PackedStamp;
use log::{info, warn};

static FIX_TIME: Mutex<Cell<Option<PackedStamp>>> = Mutex::new(Cell::new(None));

/// Record the local time of the latest fix for FAT directory entries.
pub fn set_clock(now: PackedStamp) {
    critical_section::with(|cs| FIX_TIME.borrow(cs).set(Some(now)));
}

pub fn clock() -> Option<PackedStamp> {
    critical_section::with(|cs| FIX_TIME.borrow(cs).get())
}

#[derive(Default, Clone, Copy)]
pub struct GpsClock;

impl TimeSource for GpsClock {
    fn get_timestamp(&self) -> Timestamp {
        match clock() {
            // two-digit GPS years are taken to be 20YY
            Some(t) => Timestamp {
                year_since_1970: 30 + t.year(),
                zero_indexed_month: t.month().saturating_sub(1),
                zero_indexed_day: t.day().saturating_sub(1),
                hours: t.hour(),
                minutes: t.minute(),
                seconds: t.second(),
            },
            None => Timestamp {
                year_since_1970: 30,
                zero_indexed_month: 0,
                zero_indexed_day: 0,
                hours: 0,
                minutes: 0,
                seconds: 0,
            },
        }
    }
}

pub struct SdStorage<SPI>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    pub volume_mgr: VolumeManager<SdCard<SPI, esp_hal::delay::Delay>, GpsClock>,
    present: bool,
}

impl<SPI> SdStorage<SPI>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    pub fn new(spi: SPI) -> Self {
        let sdcard = SdCard::new(spi, esp_hal::delay::Delay::new());

        let present = match sdcard.num_bytes() {
            Ok(bytes) => {
                info!("sd: {} bytes ({} MB)", bytes, bytes / 1024 / 1024);
                true
            }
            Err(e) => {
                warn!("sd: probe failed: {:?}", e);
                false
            }
        };

        let volume_mgr = VolumeManager::new(sdcard, GpsClock);
        Self {
            volume_mgr,
            present,
        }
    }

    /// Card answered the size probe at boot.
    pub fn is_present(&self) -> bool {
        self.present
    }
}
