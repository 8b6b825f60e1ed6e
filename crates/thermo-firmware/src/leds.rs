//! Three discrete LEDs showing the temperature band.

use esp_hal::gpio::{Level, Output};
use thermo_core::indicator::{Indicator, IndicatorPattern};

pub struct RgbLeds {
    red: Output<'static>,
    green: Output<'static>,
    blue: Output<'static>,
}

impl RgbLeds {
    pub fn new(red: Output<'static>, green: Output<'static>, blue: Output<'static>) -> Self {
        let mut leds = Self { red, green, blue };
        leds.show(IndicatorPattern::OFF);
        leds
    }
}

impl Indicator for RgbLeds {
    fn show(&mut self, pattern: IndicatorPattern) {
        self.red.set_level(Level::from(pattern.red));
        self.green.set_level(Level::from(pattern.green));
        self.blue.set_level(Level::from(pattern.blue));
    }
}
