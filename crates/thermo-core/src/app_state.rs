//! Application-wide state and error types for thermo

use thiserror_no_std::Error;

/// Network link state as reported by the platform's connection manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Down,
    Connecting,
    Up,
}

impl LinkState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Down => "offline",
            Self::Connecting => "joining",
            Self::Up => "online",
        }
    }
}

/// Startup and environment failures surfaced by the binaries.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("WiFi connection failed: {0}")]
    Wifi(heapless::String<64>),
    #[error("HTTP listener unavailable: {0}")]
    Listener(heapless::String<64>),
    #[error("Sensor error: {0}")]
    Sensor(heapless::String<64>),
    #[error("Invalid configuration: {0}")]
    Config(crate::config::ConfigError),
    #[error("Settings unreadable: {0}")]
    Settings(heapless::String<64>),
    #[error("Display unavailable: {0}")]
    Display(heapless::String<64>),
    #[error("Unknown error")]
    Unknown,
}

impl From<crate::config::ConfigError> for AppError {
    fn from(error: crate::config::ConfigError) -> Self {
        Self::Config(error)
    }
}

impl AppError {
    /// Build a message-carrying variant, truncating the message to fit.
    pub fn truncated(build: fn(heapless::String<64>) -> Self, message: &str) -> Self {
        let mut text = heapless::String::new();
        for ch in message.chars() {
            if text.push(ch).is_err() {
                break;
            }
        }
        build(text)
    }
}
