//! `/data` body: the most recent history window as two float series.

use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use super::RenderError;
use crate::storage::RingBufferStore;

/// `{"t":[...],"h":[...]}`, oldest first, both series the same length.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DataSeries {
    pub t: Vec<f32>,
    pub h: Vec<f32>,
}

impl DataSeries {
    pub fn from_window(store: &RingBufferStore, points: usize) -> Self {
        let window = store.read_window(points);
        let mut series = Self {
            t: Vec::with_capacity(window.len()),
            h: Vec::with_capacity(window.len()),
        };
        for reading in window {
            series.t.push(reading.temperature_celsius());
            series.h.push(reading.humidity_percent());
        }
        series
    }
}

pub fn data_body(store: &RingBufferStore, points: usize) -> Result<String, RenderError> {
    serde_json::to_string(&DataSeries::from_window(store, points)).map_err(|_| RenderError::Encode)
}
