//! Runtime configuration for the telemetry loop.
//!
//! Every time-base dependent number lives here as an explicit, validated
//! value: how long a tick is, how many ticks make a bucket, and therefore
//! how many buckets "5 minutes ago" is.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Write;
use core::num::{NonZeroU32, NonZeroUsize};

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::indicator::IndicatorThresholds;
use crate::storage::MAX_LAG_OFFSETS;

/// Largest multiple of the tick that one HTTP cycle may take in total
/// (accept window plus read and write timeouts).
pub const MAX_TICK_STRETCH: u32 = 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("ring buffer capacity must be at least 1")]
    ZeroCapacity,
    #[error("tick length must be at least 1 second")]
    ZeroTick,
    #[error("bucket size must be at least 1 tick")]
    ZeroBucket,
    #[error("lag offset {offset} does not fit a ring buffer of {capacity} buckets")]
    LagOutOfRange { offset: u32, capacity: usize },
    #[error("at most {max} lag offsets are supported, got {count}")]
    TooManyLagOffsets { count: usize, max: usize },
    #[error("points bounds must satisfy 1 <= min <= default <= max")]
    InvalidPointsBounds,
    #[error("request head buffer must hold at least {min} bytes")]
    HeadBufferTooSmall { min: usize },
    #[error("indicator band edges must be in ascending order")]
    UnorderedIndicatorBands,
    #[error("HTTP timeouts of {total_ms} ms exceed the {limit_ms} ms tick budget")]
    HttpBudgetExceeded { total_ms: u32, limit_ms: u32 },
    #[error("{secs} s is not a whole number of {bucket_secs} s buckets")]
    NotWholeBuckets { secs: u32, bucket_secs: u32 },
}

/// Mapping between wall-clock time and ring buffer buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBase {
    pub tick_secs: NonZeroU32,
    pub bucket_ticks: NonZeroU32,
}

impl TimeBase {
    /// Seconds covered by one bucket.
    pub fn bucket_secs(&self) -> u32 {
        self.tick_secs.get().saturating_mul(self.bucket_ticks.get())
    }

    /// Exact number of buckets spanning `secs`, or an error if `secs` is not
    /// a whole number of buckets.
    pub fn buckets_for_secs(&self, secs: u32) -> Result<u32, ConfigError> {
        let bucket_secs = self.bucket_secs();
        if secs % bucket_secs != 0 {
            return Err(ConfigError::NotWholeBuckets { secs, bucket_secs });
        }
        Ok(secs / bucket_secs)
    }

    pub fn buckets_for_minutes(&self, minutes: u32) -> Result<u32, ConfigError> {
        self.buckets_for_secs(minutes.saturating_mul(60))
    }

    /// Short human label for a lag of `buckets`, e.g. "5m" or "90s".
    pub fn label_for_buckets(&self, buckets: u32) -> heapless::String<16> {
        let secs = buckets.saturating_mul(self.bucket_secs());
        let mut label = heapless::String::new();
        let _ = if secs != 0 && secs % 3600 == 0 {
            write!(label, "{}h", secs / 3600)
        } else if secs != 0 && secs % 60 == 0 {
            write!(label, "{}m", secs / 60)
        } else {
            write!(label, "{}s", secs)
        };
        label
    }
}

/// Bounds applied to the `points` query parameter of `/data`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsBounds {
    pub min: usize,
    pub default: usize,
    pub max: usize,
}

impl PointsBounds {
    pub fn clamp(&self, points: usize) -> usize {
        points.clamp(self.min, self.max)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub port: u16,
    /// Bytes of request head read per connection; only the first line is used
    pub head_buffer_len: usize,
    /// Time allowed for the whole request head, counted from accept
    pub read_timeout_ms: u32,
    /// Time allowed for the whole response once the read budget is spent
    pub write_timeout_ms: u32,
    /// How long an accept attempt waits for a pending connection
    pub accept_window_ms: u32,
    /// Consecutive zero-byte writes tolerated before a send is abandoned
    pub max_send_stalls: u32,
    pub points: PointsBounds,
    /// How often the dashboard script polls `/data`
    pub dashboard_poll_ms: u32,
}

impl HttpConfig {
    /// Deadlines for one accepted connection, as offsets from the accept.
    ///
    /// Transports enforce these over the whole exchange, so a peer that
    /// trickles bytes cannot keep a connection open past `write_by_ms`.
    pub fn exchange_deadlines(&self) -> ExchangeDeadlines {
        ExchangeDeadlines {
            read_by_ms: self.read_timeout_ms,
            write_by_ms: self.read_timeout_ms.saturating_add(self.write_timeout_ms),
        }
    }
}

/// Offsets from the accept after which reads, then writes, fail with
/// `TimedOut`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeDeadlines {
    pub read_by_ms: u32,
    pub write_by_ms: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 80,
            head_buffer_len: 1024,
            read_timeout_ms: 500,
            write_timeout_ms: 500,
            accept_window_ms: 20,
            max_send_stalls: 64,
            points: PointsBounds {
                min: 10,
                default: 60,
                max: 600,
            },
            dashboard_poll_ms: 5000,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Nominal tick length
    pub tick_secs: u32,
    /// Ticks averaged into one committed bucket
    pub bucket_ticks: u32,
    /// Ring buffer capacity, in buckets
    pub capacity: usize,
    /// Offsets shown as "N ago" values, in buckets
    pub lag_offsets: Vec<u32>,
    /// Ticks between low-water memory reports
    pub memory_report_ticks: u32,
    /// Ticks between moves of the on-screen text
    pub display_shift_ticks: u32,
    /// Keep serving HTTP on ticks whose sensor read failed
    pub serve_on_sensor_fault: bool,
    pub indicator: IndicatorThresholds,
    pub http: HttpConfig,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::per_minute()
    }
}

impl TelemetryConfig {
    /// One bucket per one-second tick; an hour of raw history.
    pub fn per_second() -> Self {
        Self {
            tick_secs: 1,
            bucket_ticks: 1,
            capacity: 3601,
            lag_offsets: vec![300, 600, 1800, 3600],
            memory_report_ticks: 60,
            display_shift_ticks: 30,
            serve_on_sensor_fault: false,
            indicator: IndicatorThresholds::default(),
            http: HttpConfig::default(),
        }
    }

    /// One minute-averaged bucket per 60 one-second ticks; an hour of history.
    pub fn per_minute() -> Self {
        Self {
            bucket_ticks: 60,
            capacity: 61,
            lag_offsets: vec![5, 10, 30, 60],
            http: HttpConfig {
                points: PointsBounds {
                    min: 10,
                    default: 60,
                    max: 61,
                },
                ..HttpConfig::default()
            },
            ..Self::per_second()
        }
    }

    pub fn time_base(&self) -> Result<TimeBase, ConfigError> {
        Ok(TimeBase {
            tick_secs: NonZeroU32::new(self.tick_secs).ok_or(ConfigError::ZeroTick)?,
            bucket_ticks: NonZeroU32::new(self.bucket_ticks).ok_or(ConfigError::ZeroBucket)?,
        })
    }

    pub fn capacity(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.capacity).ok_or(ConfigError::ZeroCapacity)
    }

    /// Check every cross-field rule. The tick loop refuses to start on error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let capacity = self.capacity()?;
        self.time_base()?;

        if self.lag_offsets.len() > MAX_LAG_OFFSETS {
            return Err(ConfigError::TooManyLagOffsets {
                count: self.lag_offsets.len(),
                max: MAX_LAG_OFFSETS,
            });
        }
        if let Some(&offset) = self
            .lag_offsets
            .iter()
            .find(|&&offset| offset as usize >= capacity.get())
        {
            return Err(ConfigError::LagOutOfRange {
                offset,
                capacity: capacity.get(),
            });
        }

        let points = &self.http.points;
        if points.min == 0 || points.min > points.default || points.default > points.max {
            return Err(ConfigError::InvalidPointsBounds);
        }

        if !self.indicator.is_ascending() {
            return Err(ConfigError::UnorderedIndicatorBands);
        }

        // Enough for "GET /data?points=NNNN HTTP/1.1\r\n"
        const MIN_HEAD_BUFFER: usize = 64;
        if self.http.head_buffer_len < MIN_HEAD_BUFFER {
            return Err(ConfigError::HeadBufferTooSmall {
                min: MIN_HEAD_BUFFER,
            });
        }

        let total_ms = self
            .http
            .accept_window_ms
            .saturating_add(self.http.exchange_deadlines().write_by_ms);
        let limit_ms = self
            .tick_secs
            .saturating_mul(1000)
            .saturating_mul(MAX_TICK_STRETCH);
        if total_ms > limit_ms {
            return Err(ConfigError::HttpBudgetExceeded { total_ms, limit_ms });
        }

        Ok(())
    }
}
