// The two firmware modes.  Exactly one runs per boot.
//
// logger: GPS fixes -> local time -> CSV records on the SD card
// web:    Wi-Fi provisioning, settings form and file manager

pub mod logger;
pub mod web;
