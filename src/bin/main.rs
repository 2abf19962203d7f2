// gps-logger entry point
//
// Boot sequence: logger -> hardware -> heap -> scheduler -> pick mode
//
// The BOOT button held at reset selects web mode (configuration and
// file server); otherwise the board logs GPS fixes to the SD card.
// Both modes run forever; a reset switches between them.

#![no_std]
#![no_main]

use embassy_executor::Spawner;
use esp_backtrace as _;
use esp_hal::clock::CpuClock;
use log::info;

use gps_logger::apps::logger::run_logger_mode;
use gps_logger::apps::web::run_web_mode;
use gps_logger::board::{Board, BootMode};

extern crate alloc;

esp_bootloader_esp_idf::esp_app_desc!();

#[allow(
    clippy::large_stack_frames,
    reason = "request and upload buffers live on the main task's stack"
)]
#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    esp_println::logger::init_logger_from_env();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // esp-radio requires an allocator; pages and arguments use it too
    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 64 * 1024);
    esp_alloc::heap_allocator!(size: 48 * 1024);

    let board = Board::init(peripherals);
    esp_rtos::start(board.rtos.timer, board.rtos.sw_int);

    info!("boot: {:?} mode", board.mode);

    match board.mode {
        BootMode::Logger => run_logger_mode(&board.sd, board.gps).await,
        BootMode::Web => run_web_mode(&board.sd, board.wifi).await,
    }
}
