// gps-logger firmware for an ESP32-C3 with a serial GPS receiver and an SD card

#![no_std]

extern crate alloc;

pub mod apps;
pub mod board;
pub mod drivers;
