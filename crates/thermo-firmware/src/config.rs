//! Build-time device configuration.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct Config<'a> {
    pub internet: InternetConfig<'a>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy)]
pub struct InternetConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

impl Config<'static> {
    /// Credentials baked in by `build.rs` from `.env` / the environment.
    pub fn from_build_env() -> Self {
        Self {
            internet: InternetConfig {
                ssid: option_env!("WIFI_SSID").unwrap_or(""),
                password: option_env!("WIFI_PASSWORD").unwrap_or(""),
            },
        }
    }
}

impl InternetConfig<'_> {
    pub fn is_configured(&self) -> bool {
        !self.ssid.is_empty()
    }
}
