//! Wi-Fi station bring-up and reconnect loop.

use alloc::string::String;

use embassy_executor::Spawner;
use embassy_net::{Config as NetConfig, DhcpConfig, Runner, Stack, StackResources};
use embassy_time::{Duration, Timer};
use esp_hal::peripherals::WIFI;
use esp_hal::rng::Rng;
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController, WifiDevice, WifiEvent};
use log::{info, warn};
use static_cell::StaticCell;
use thermo_core::app_state::{AppError, LinkState};

use crate::config::InternetConfig;
use crate::link;

static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
static NET_RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();

/// Pause before retrying after a failed join or a dropped link.
const RETRY_DELAY: Duration = Duration::from_secs(10);

/// Bring up the radio and network stack and spawn the tasks that keep the
/// station joined. Link changes are published through [`link`].
pub fn start(
    spawner: &Spawner,
    wifi: WIFI<'static>,
    internet: InternetConfig<'static>,
) -> Result<Stack<'static>, AppError> {
    let radio = esp_radio::init().map_err(|_| AppError::truncated(AppError::Wifi, "radio init failed"))?;
    let radio = RADIO.init(radio);

    let (controller, interfaces) = esp_radio::wifi::new(radio, wifi, Default::default())
        .map_err(|_| AppError::truncated(AppError::Wifi, "driver init failed"))?;

    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    let resources = NET_RESOURCES.init(StackResources::<3>::new());
    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        NetConfig::dhcpv4(DhcpConfig::default()),
        resources,
        seed,
    );

    spawner.spawn(
        net_task(runner).map_err(|_| AppError::truncated(AppError::Wifi, "net task spawn failed"))?,
    );
    spawner.spawn(
        wifi_task(controller, stack, internet)
            .map_err(|_| AppError::truncated(AppError::Wifi, "wifi task spawn failed"))?,
    );

    Ok(stack)
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await;
}

#[embassy_executor::task]
async fn wifi_task(
    mut controller: WifiController<'static>,
    stack: Stack<'static>,
    internet: InternetConfig<'static>,
) {
    info!("Wi-Fi task starting (ssid=\"{}\")", internet.ssid);

    loop {
        link::publish(LinkState::Connecting);

        if !matches!(controller.is_started(), Ok(true)) {
            let client = ModeConfig::Client(
                ClientConfig::default()
                    .with_ssid(String::from(internet.ssid))
                    .with_password(String::from(internet.password)),
            );
            if let Err(e) = controller.set_config(&client) {
                warn!("Wi-Fi set_config error: {:?}", e);
                link::publish(LinkState::Down);
                Timer::after(RETRY_DELAY).await;
                continue;
            }
            if let Err(e) = controller.start_async().await {
                warn!("Wi-Fi start error: {:?}", e);
                link::publish(LinkState::Down);
                Timer::after(RETRY_DELAY).await;
                continue;
            }
        }

        if let Err(e) = controller.connect_async().await {
            warn!("Wi-Fi connect error: {:?}", e);
            link::publish(LinkState::Down);
            Timer::after(RETRY_DELAY).await;
            continue;
        }

        stack.wait_config_up().await;
        if let Some(config) = stack.config_v4() {
            info!("Wi-Fi link up: ip={}", config.address.address());
        }
        link::publish(LinkState::Up);

        controller.wait_for_event(WifiEvent::StaDisconnected).await;
        warn!("Wi-Fi disconnected; will retry");
        link::publish(LinkState::Down);
        Timer::after(RETRY_DELAY).await;
    }
}
