//! Sensor trait and error types.
//!
//! Concrete drivers live with the platform (SHT40 in the firmware, a
//! synthetic generator in the simulator); the tick loop only sees
//! [`Sensor::measure`].

use thiserror_no_std::Error;

use crate::storage::Reading;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor}: {operation} failed ({details})")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
        details: &'static str,
    },
    #[error("{sensor}: timed out during {operation}")]
    Timeout {
        sensor: &'static str,
        operation: &'static str,
    },
    #[error("{sensor}: checksum mismatch")]
    Checksum { sensor: &'static str },
    #[error("{sensor}: bus error ({details})")]
    I2cError {
        sensor: &'static str,
        details: &'static str,
    },
    #[error("{sensor}: initialization failed ({details})")]
    InitializationFailed {
        sensor: &'static str,
        details: &'static str,
    },
}

/// A temperature/humidity sensor sampled once per tick.
pub trait Sensor {
    /// Take one measurement.
    fn measure(&mut self) -> impl Future<Output = Result<Reading, SensorError>>;
}
