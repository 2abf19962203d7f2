//! GPIO |     Function    |      Notes
//! -----+-----------------+----------------------------------
//!  2   | SPI2 MISO       | SD card data out
//!  6   | SPI2 SCK        | SD card clock
//!  7   | SPI2 MOSI       | SD card data in
//!  9   | Mode select     | BOOT button, internal pullup; held LOW at reset = web mode
//! 10   | SD CS           | SD card chip select
//! 20   | UART1 RX        | GPS receiver TX, NMEA 0183 at 9600 baud
//! 21   | UART1 TX        | GPS receiver RX (unused, receiver runs on defaults)

// ----- SD Card -----
pub const SD_CS: u8 = 10;

// ----- SPI Bus -----
pub const SPI_SCK: u8 = 6;
pub const SPI_MOSI: u8 = 7;
pub const SPI_MISO: u8 = 2;

// ----- GPS -----
pub const GPS_RX: u8 = 20;
pub const GPS_TX: u8 = 21;
pub const GPS_BAUD: u32 = 9600;

// ----- Mode Button -----
pub const MODE_SELECT: u8 = 9; // Digital, active LOW
