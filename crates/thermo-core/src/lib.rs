//! Hardware-independent core library for thermo
//!
//! This crate contains the platform-agnostic part of the temperature/humidity
//! logger: the bucketed ring-buffer history, the per-tick aggregator, the
//! "N buckets ago" lag view, the cooperative single-connection HTTP responder
//! and the payload builders it serves, all sequenced by one tick loop.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets (ESP32-S3) and desktop hosts (for the simulator and tests).

#![no_std]

extern crate alloc;

pub mod app_state;
pub mod config;
pub mod display;
pub mod http;
pub mod indicator;
pub mod memory;
pub mod render;
pub mod scheduler;
pub mod sensors;
pub mod storage;
