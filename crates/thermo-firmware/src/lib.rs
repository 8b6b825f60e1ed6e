//! ESP32-S3 firmware-specific modules for thermo
//!
//! This crate contains the hardware side of the logger: Wi-Fi bring-up, the
//! `embassy-net` socket adapter for the core HTTP responder, the SHT40
//! driver, the RGB indicator LEDs, the status panel and heap statistics.
//! Everything platform-independent lives in `thermo_core`.

#![no_std]

extern crate alloc;

pub mod config;
pub mod leds;
pub mod link;
pub mod memory;
pub mod net;
pub mod panel;
pub mod sht40;
pub mod wifi;
