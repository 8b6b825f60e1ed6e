//! Headless stand-ins for the status panel and indicator LEDs.

use std::path::PathBuf;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay};
use log::{debug, info, warn};
use rand::Rng;
use rand::rngs::ThreadRng;

use thermo_core::display::{StatusScreen, StatusSink, StatusView};
use thermo_core::indicator::{Indicator, IndicatorPattern};

/// Same geometry as the 128×64 monochrome OLED the logger was built around.
const PANEL_SIZE: Size = Size::new(128, 64);

/// Largest burn-in shift of the text block.
const SHIFT_RANGE: Size = Size::new(12, 26);

/// Draws each status view into an off-screen panel, optionally saving it as
/// a PNG so the layout can be inspected.
pub struct PanelSink {
    display: SimulatorDisplay<BinaryColor>,
    screen: StatusScreen,
    snapshot_path: Option<PathBuf>,
    rng: ThreadRng,
}

impl PanelSink {
    pub fn new(shift_every_ticks: u32, snapshot_path: Option<PathBuf>) -> Self {
        Self {
            display: SimulatorDisplay::new(PANEL_SIZE),
            screen: StatusScreen::new(SHIFT_RANGE, shift_every_ticks),
            snapshot_path,
            rng: rand::thread_rng(),
        }
    }
}

impl StatusSink for PanelSink {
    fn present(&mut self, view: &StatusView<'_>) {
        let entropy: u32 = self.rng.r#gen();
        if self.screen.advance(view.tick, entropy) {
            debug!("Panel text moved to {:?}", self.screen.origin());
        }

        let _ = self
            .screen
            .draw(&mut self.display, view, BinaryColor::On, BinaryColor::Off);
        debug!(
            "Panel: {} | {} | {}",
            view.temperature_line(),
            view.humidity_line(),
            view.link_line()
        );

        if let Some(path) = &self.snapshot_path {
            let settings = OutputSettingsBuilder::new().scale(2).build();
            if let Err(error) = self.display.to_rgb_output_image(&settings).save_png(path) {
                warn!("Saving panel snapshot to {} failed: {}", path.display(), error);
            }
        }
    }
}

/// Logs the RGB indicator whenever its pattern changes.
#[derive(Default)]
pub struct LogIndicator {
    last: Option<IndicatorPattern>,
}

impl Indicator for LogIndicator {
    fn show(&mut self, pattern: IndicatorPattern) {
        if self.last == Some(pattern) {
            return;
        }
        self.last = Some(pattern);
        info!(
            "LEDs: red {}, green {}, blue {}",
            on_off(pattern.red),
            on_off(pattern.green),
            on_off(pattern.blue)
        );
    }
}

fn on_off(lit: bool) -> &'static str {
    if lit { "on" } else { "off" }
}
