// Serial GPS receiver: NMEA 0183 lines over UART, RMC sentences only.

use esp_hal::Async;
use esp_hal::uart::UartRx;
use gpslog_core::nmea::{LineAssembler, NmeaError, RmcFix, parse_rmc};
use log::{debug, warn};

// NMEA caps sentences at 82 characters
const LINE_CAP: usize = 96;

pub struct GpsReceiver {
    rx: UartRx<'static, Async>,
    line: LineAssembler<LINE_CAP>,
    buf: [u8; 64],
    pending: usize,
    pos: usize,
}

impl GpsReceiver {
    pub fn new(rx: UartRx<'static, Async>) -> Self {
        Self {
            rx,
            line: LineAssembler::new(),
            buf: [0u8; 64],
            pending: 0,
            pos: 0,
        }
    }

    /// Next RMC sentence the receiver sends, valid or void.  Other
    /// sentences and corrupted lines are skipped.
    pub async fn next_rmc(&mut self) -> RmcFix {
        loop {
            while self.pos < self.pending {
                let b = self.buf[self.pos];
                self.pos += 1;
                let Some(line) = self.line.push(b) else {
                    continue;
                };
                match parse_rmc(line) {
                    Ok(fix) => return fix,
                    Err(NmeaError::NotRmc) => {}
                    Err(e) => debug!("gps: dropped line: {}", e),
                }
            }

            self.pos = 0;
            self.pending = match self.rx.read_async(&mut self.buf).await {
                Ok(n) => n,
                Err(e) => {
                    warn!("gps: uart error: {:?}", e);
                    0
                }
            };
        }
    }
}
