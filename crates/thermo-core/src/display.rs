//! Status screen layout and the display collaborator boundary.
//!
//! The screen shows the current reading followed by each lag value, one line
//! per channel, and moves the text block to a new spot every few ticks so a
//! static layout does not burn into the panel.

use core::fmt::Write;

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

use crate::app_state::LinkState;
use crate::memory::MemoryReport;
use crate::storage::{LagSnapshot, Reading, Tenths};

/// Shown wherever a value is not available yet.
pub const PLACEHOLDER: &str = "--";

const LINE_HEIGHT: i32 = 12;

pub type StatusLine = heapless::String<64>;

/// Read-only view of one tick's results handed to the display collaborator.
#[derive(Debug, Clone, Copy)]
pub struct StatusView<'a> {
    pub tick: u64,
    pub reading: Option<Reading>,
    pub average: Option<Reading>,
    pub lags: &'a LagSnapshot,
    pub link: LinkState,
    pub memory: Option<MemoryReport>,
}

/// Receives the status view once per successful tick.
pub trait StatusSink {
    fn present(&mut self, view: &StatusView<'_>);
}

impl StatusView<'_> {
    /// `"<temp> <lag> <lag> ..."` for temperature.
    pub fn temperature_line(&self) -> StatusLine {
        self.channel_line(|reading| reading.temperature_milli_celsius)
    }

    /// `"<hum> <lag> <lag> ..."` for humidity.
    pub fn humidity_line(&self) -> StatusLine {
        self.channel_line(|reading| reading.humidity_milli_percent)
    }

    pub fn link_line(&self) -> StatusLine {
        let mut line = StatusLine::new();
        let _ = write!(line, "{}", self.link.label());
        line
    }

    fn channel_line(&self, channel: fn(&Reading) -> i32) -> StatusLine {
        let mut line = StatusLine::new();
        push_value(&mut line, self.reading.as_ref().map(channel));
        for entry in self.lags.entries() {
            let _ = line.push(' ');
            push_value(&mut line, entry.reading.as_ref().map(channel));
        }
        line
    }
}

fn push_value(line: &mut StatusLine, value: Option<i32>) {
    let _ = match value {
        Some(milli) => write!(line, "{}", Tenths(milli)),
        None => line.push_str(PLACEHOLDER).map_err(|_| core::fmt::Error),
    };
}

/// Text block position with periodic burn-in shift.
pub struct StatusScreen {
    origin: Point,
    shift_range: Size,
    shift_every_ticks: u32,
}

impl StatusScreen {
    /// `shift_range` is the largest x/y offset the text block may move to.
    pub fn new(shift_range: Size, shift_every_ticks: u32) -> Self {
        Self {
            origin: Point::zero(),
            shift_range,
            shift_every_ticks: shift_every_ticks.max(1),
        }
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Move the text block when `tick` lands on the shift cadence.
    ///
    /// `entropy` picks the new position; pass a hardware random number on
    /// the device. Returns whether the block moved.
    pub fn advance(&mut self, tick: u64, entropy: u32) -> bool {
        if tick == 0 || tick % self.shift_every_ticks as u64 != 0 {
            return false;
        }
        let x = (entropy & 0xFFFF) % (self.shift_range.width + 1);
        let y = (entropy >> 16) % (self.shift_range.height + 1);
        self.origin = Point::new(x as i32, y as i32);
        true
    }

    pub fn draw<D, C>(
        &self,
        target: &mut D,
        view: &StatusView<'_>,
        foreground: C,
        background: C,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = C>,
        C: PixelColor,
    {
        target.clear(background)?;

        let style = MonoTextStyle::new(&FONT_6X10, foreground);
        let lines = [view.temperature_line(), view.humidity_line(), view.link_line()];
        for (row, line) in lines.iter().enumerate() {
            let position = self.origin + Point::new(0, row as i32 * LINE_HEIGHT);
            Text::with_baseline(line.as_str(), position, style, Baseline::Top).draw(target)?;
        }
        Ok(())
    }
}
