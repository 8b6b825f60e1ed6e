//! Status panel on the ILI9342C LCD.

use core::fmt::Debug;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use esp_hal::rng::Rng;
use log::warn;
use thermo_core::display::{StatusScreen, StatusSink, StatusView};

/// Largest burn-in shift of the text block on a 320×240 panel.
const SHIFT_RANGE: Size = Size::new(160, 180);

pub struct Panel<D> {
    display: D,
    screen: StatusScreen,
    rng: Rng,
}

impl<D> Panel<D>
where
    D: DrawTarget<Color = Rgb565>,
    D::Error: Debug,
{
    pub fn new(display: D, shift_every_ticks: u32) -> Self {
        Self {
            display,
            screen: StatusScreen::new(SHIFT_RANGE, shift_every_ticks),
            rng: Rng::new(),
        }
    }
}

impl<D> StatusSink for Panel<D>
where
    D: DrawTarget<Color = Rgb565>,
    D::Error: Debug,
{
    fn present(&mut self, view: &StatusView<'_>) {
        self.screen.advance(view.tick, self.rng.random());
        if let Err(e) = self
            .screen
            .draw(&mut self.display, view, Rgb565::WHITE, Rgb565::BLACK)
        {
            warn!("Panel draw failed: {:?}", e);
        }
    }
}
