// Radio configuration for web mode: join the stored network as a
// station, or open an access point named after the host.
//
// The access point runs as AP+STA so the station half can still scan
// for networks to list on the setup page.

use alloc::string::String;
use alloc::vec::Vec;

use embassy_net::{Ipv4Address, Ipv4Cidr, StaticConfigV4};
use esp_radio::wifi::{
    AccessPointConfig, AuthMethod, ClientConfig, ModeConfig, ScanConfig, WifiController,
    WifiError,
};
use gpslog_core::provision::{AP_ADDRESS, AP_PREFIX_LEN};
use log::{info, warn};

/// One scan result, owned so it outlives the scan buffer.
#[derive(Debug, Clone)]
pub struct ScannedNetwork {
    pub ssid: String,
    pub rssi: i8,
    pub open: bool,
}

pub async fn start_station(
    ctrl: &mut WifiController<'_>,
    ssid: &str,
    password: &str,
) -> Result<(), WifiError> {
    let mut client_cfg = ClientConfig::default().with_ssid(String::from(ssid));
    client_cfg = if password.is_empty() {
        client_cfg.with_auth_method(AuthMethod::None)
    } else {
        client_cfg.with_password(String::from(password))
    };

    ctrl.set_config(&ModeConfig::Client(client_cfg))?;
    ctrl.start_async().await?;
    info!("wifi: started, connecting to '{}'", ssid);
    ctrl.connect_async().await
}

/// Open network named `host`; any station session is torn down first.
pub async fn start_access_point(
    ctrl: &mut WifiController<'_>,
    host: &str,
) -> Result<(), WifiError> {
    if ctrl.is_started().unwrap_or(false) {
        let _ = ctrl.disconnect_async().await;
        let _ = ctrl.stop_async().await;
    }

    let ap_cfg = AccessPointConfig::default()
        .with_ssid(String::from(host))
        .with_auth_method(AuthMethod::None);
    ctrl.set_config(&ModeConfig::ApSta(ClientConfig::default(), ap_cfg))?;
    ctrl.start_async().await?;
    info!("wifi: access point '{}' up", host);
    Ok(())
}

pub async fn scan(ctrl: &mut WifiController<'_>) -> Vec<ScannedNetwork> {
    match ctrl.scan_with_config_async(ScanConfig::default()).await {
        Ok(found) => {
            info!("wifi: {} networks found", found.len());
            found
                .into_iter()
                .map(|ap| ScannedNetwork {
                    open: matches!(ap.auth_method, None | Some(AuthMethod::None)),
                    rssi: ap.signal_strength,
                    ssid: ap.ssid,
                })
                .collect()
        }
        Err(e) => {
            warn!("wifi: scan failed: {:?}", e);
            Vec::new()
        }
    }
}

/// Fixed address of the access-point interface.
pub fn access_point_config() -> embassy_net::Config {
    let [a, b, c, d] = AP_ADDRESS;
    let address = Ipv4Address::new(a, b, c, d);
    embassy_net::Config::ipv4_static(StaticConfigV4 {
        address: Ipv4Cidr::new(address, AP_PREFIX_LEN),
        gateway: Some(address),
        dns_servers: Default::default(),
    })
}
