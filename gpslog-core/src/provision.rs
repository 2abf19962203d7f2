// Wi-Fi provisioning state machine.
//
//   Unprovisioned --begin(creds)--> Connecting{0} --link up--> Connected
//        |                               |
//        +--begin(no creds)--+           +--20 polls, no link--+
//                            v                                 v
//                        ApFallback <--------------------------+
//
// The firmware polls every CONNECT_POLL_MS while connecting; 20 polls
// give the station ten seconds to associate and get a lease before the
// board falls back to serving its own access point.

use core::fmt::{self, Write};

pub const CONNECT_ATTEMPTS: u8 = 20;
pub const CONNECT_POLL_MS: u64 = 500;

pub const AP_ADDRESS: [u8; 4] = [192, 168, 4, 1];
pub const AP_PREFIX_LEN: u8 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionState {
    Unprovisioned,
    Connecting { attempt: u8 },
    Connected,
    ApFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provisioner {
    state: ProvisionState,
}

impl Default for Provisioner {
    fn default() -> Self {
        Self::new()
    }
}

impl Provisioner {
    pub const fn new() -> Self {
        Self {
            state: ProvisionState::Unprovisioned,
        }
    }

    pub const fn state(&self) -> ProvisionState {
        self.state
    }

    pub fn begin(&mut self, has_credentials: bool) -> ProvisionState {
        self.state = if has_credentials {
            log::info!("wifi: stored credentials found, connecting");
            ProvisionState::Connecting { attempt: 0 }
        } else {
            log::info!("wifi: no stored credentials, starting access point");
            ProvisionState::ApFallback
        };
        self.state
    }

    /// One connection check.  Only meaningful while connecting; other
    /// states are terminal for this boot.
    pub fn poll(&mut self, link_up: bool) -> ProvisionState {
        if let ProvisionState::Connecting { attempt } = self.state {
            self.state = if link_up {
                log::info!("wifi: link up after {} polls", attempt);
                ProvisionState::Connected
            } else if attempt + 1 >= CONNECT_ATTEMPTS {
                log::warn!("wifi: no link after {} polls, falling back to AP", CONNECT_ATTEMPTS);
                ProvisionState::ApFallback
            } else {
                ProvisionState::Connecting {
                    attempt: attempt + 1,
                }
            };
        }
        self.state
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self.state, ProvisionState::Connecting { .. })
    }

    /// The network-setup form is offered until the station is connected.
    pub fn serves_network_setup(&self) -> bool {
        self.state != ProvisionState::Connected
    }
}

/// Status shown on the serial console once the web server is up.
pub fn write_status(
    w: &mut impl Write,
    state: ProvisionState,
    host: &str,
    ssid: &str,
    ip: impl fmt::Display,
) -> fmt::Result {
    match state {
        ProvisionState::Connected => write!(
            w,
            "Device connected to:\n{ssid} ({ip})\n Enter in browser:\n{host}.local"
        ),
        _ => write!(
            w,
            "1.Connect to wifi:\n{host}\n2.Enter in browser:\n{}.{}.{}.{}",
            AP_ADDRESS[0], AP_ADDRESS[1], AP_ADDRESS[2], AP_ADDRESS[3]
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_credentials_goes_straight_to_ap() {
        let mut p = Provisioner::new();
        assert!(p.serves_network_setup());
        assert_eq!(p.begin(false), ProvisionState::ApFallback);
        assert_eq!(p.poll(true), ProvisionState::ApFallback);
        assert!(p.serves_network_setup());
    }

    #[test]
    fn link_up_connects() {
        let mut p = Provisioner::new();
        assert_eq!(p.begin(true), ProvisionState::Connecting { attempt: 0 });
        assert_eq!(p.poll(false), ProvisionState::Connecting { attempt: 1 });
        assert_eq!(p.poll(true), ProvisionState::Connected);
        assert!(!p.serves_network_setup());
        assert_eq!(p.poll(false), ProvisionState::Connected);
    }

    #[test]
    fn twenty_failed_polls_fall_back() {
        let mut p = Provisioner::new();
        p.begin(true);
        for _ in 0..CONNECT_ATTEMPTS - 1 {
            p.poll(false);
            assert!(p.is_connecting());
        }
        assert_eq!(p.poll(false), ProvisionState::ApFallback);
        assert_eq!(CONNECT_ATTEMPTS as u64 * CONNECT_POLL_MS, 10_000);
    }

    #[test]
    fn status_texts() {
        let mut s = String::new();
        write_status(&mut s, ProvisionState::Connected, "gpslogger", "HomeNet", "10.0.0.7").unwrap();
        assert_eq!(
            s,
            "Device connected to:\nHomeNet (10.0.0.7)\n Enter in browser:\ngpslogger.local"
        );

        let mut s = String::new();
        write_status(&mut s, ProvisionState::ApFallback, "gpslogger", "", "").unwrap();
        assert_eq!(s, "1.Connect to wifi:\ngpslogger\n2.Enter in browser:\n192.168.4.1");
    }
}
