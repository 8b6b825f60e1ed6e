//! Link state handed from the Wi-Fi task to the tick loop.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use thermo_core::app_state::LinkState;

/// Latest link state; the tick loop takes it without waiting.
pub static LINK_STATE: Signal<CriticalSectionRawMutex, LinkState> = Signal::new();

pub fn publish(state: LinkState) {
    LINK_STATE.signal(state);
}

/// The state published since the last call, if any.
pub fn take() -> Option<LinkState> {
    LINK_STATE.try_take()
}
