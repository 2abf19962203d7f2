//! GPS logger board support package
//!
//! ESP32-C3 with a serial GPS receiver on UART1, an SD card on SPI2 and
//! the BOOT button doubling as the mode switch.  Application code only
//! sees the bundles below, never GPIO numbers.

pub mod pins;

use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::{
    Async, Blocking,
    delay::Delay,
    gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull},
    interrupt::software::{SoftwareInterrupt, SoftwareInterruptControl},
    peripherals::{Peripherals, WIFI},
    spi,
    time::Rate,
    timer::timg::{Timer, TimerGroup},
    uart::{self, UartRx},
};

use crate::drivers::sdcard::SdStorage;

// Type Aliases
pub type SpiBus = spi::master::Spi<'static, Blocking>;
pub type SdSpi = ExclusiveDevice<SpiBus, Output<'static>, Delay>;
pub type Sd = SdStorage<SdSpi>;
pub type GpsRx = UartRx<'static, Async>;

/// SD cards must be initialised at 400 kHz or below; the bus stays there.
pub const SD_SPI_FREQ_KHZ: u32 = 400;

// Hardware Bundles
/// Scheduler hardware handed to `esp_rtos::start`.
pub struct RtosHw {
    pub timer: Timer<'static>,
    pub sw_int: SoftwareInterrupt<'static, 0>,
}

/// Which half of the firmware this boot runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootMode {
    Logger,
    Web,
}

/// Complete board hardware, ready for the apps.
pub struct Board {
    pub rtos: RtosHw,
    pub sd: Sd,
    pub gps: GpsRx,
    pub wifi: WIFI<'static>,
    pub mode: BootMode,
}

impl Board {
    pub fn init(p: Peripherals) -> Self {
        let timg0 = TimerGroup::new(p.TIMG0);
        let sw = SoftwareInterruptControl::new(p.SW_INTERRUPT);
        let rtos = RtosHw {
            timer: timg0.timer0,
            sw_int: sw.software_interrupt0,
        };

        let mode_pin = Input::new(p.GPIO9, InputConfig::default().with_pull(Pull::Up));
        let mode = if mode_pin.is_low() {
            BootMode::Web
        } else {
            BootMode::Logger
        };

        // SPI bus
        let spi_cfg = spi::master::Config::default()
            .with_frequency(Rate::from_khz(SD_SPI_FREQ_KHZ))
            .with_mode(spi::Mode::_0);
        let spi_bus = spi::master::Spi::new(p.SPI2, spi_cfg)
            .unwrap()
            .with_sck(p.GPIO6)
            .with_mosi(p.GPIO7)
            .with_miso(p.GPIO2);
        let cs = Output::new(p.GPIO10, Level::High, OutputConfig::default());
        let spi_dev = ExclusiveDevice::new(spi_bus, cs, Delay::new()).unwrap();
        let sd = SdStorage::new(spi_dev);

        // GPS receiver; its TX line is all we listen to
        let uart_cfg = uart::Config::default().with_baudrate(pins::GPS_BAUD);
        let gps = UartRx::new(p.UART1, uart_cfg)
            .unwrap()
            .with_rx(p.GPIO20)
            .into_async();

        Board {
            rtos,
            sd,
            gps,
            wifi: p.WIFI,
            mode,
        }
    }
}
