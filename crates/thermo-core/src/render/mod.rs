//! Response bodies built from a read-only snapshot of the loop's state.
//!
//! Nothing here touches the network or mutates history; every builder is a
//! plain function of [`Snapshot`].

pub mod html;
pub mod json;
pub mod text;

pub use html::dashboard_body;
pub use json::{DataSeries, data_body};
pub use text::status_body;

use thiserror_no_std::Error;

use crate::config::{PointsBounds, TimeBase};
use crate::memory::MemoryReport;
use crate::storage::{LagSnapshot, Reading, RingBufferStore};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderError {
    #[error("encoding the data series failed")]
    Encode,
}

/// Everything a response body may show, borrowed from the tick loop for the
/// duration of one HTTP cycle.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub store: &'a RingBufferStore,
    pub current: Option<Reading>,
    pub average: Option<Reading>,
    pub lags: &'a LagSnapshot,
    pub memory: Option<MemoryReport>,
    pub time_base: TimeBase,
    pub points: PointsBounds,
    pub dashboard_poll_ms: u32,
}
