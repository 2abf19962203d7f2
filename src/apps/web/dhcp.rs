// DHCP server task for the access point, one UDP socket on port 67.
// Replies are broadcast: clients have no address to unicast to yet.

use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_net::{IpAddress, IpEndpoint, Ipv4Address, Stack};
use embassy_time::Timer;
use gpslog_core::dhcp::{self, CLIENT_PORT, LeasePool, SERVER_PORT};
use gpslog_core::provision::AP_ADDRESS;
use log::{debug, error, info, warn};

pub async fn serve(stack: Stack<'_>) -> ! {
    let mut rx_meta = [PacketMetadata::EMPTY; 4];
    let mut rx_buffer = [0u8; 1024];
    let mut tx_meta = [PacketMetadata::EMPTY; 4];
    let mut tx_buffer = [0u8; 1024];
    let mut socket = UdpSocket::new(
        stack,
        &mut rx_meta,
        &mut rx_buffer,
        &mut tx_meta,
        &mut tx_buffer,
    );

    if let Err(e) = socket.bind(SERVER_PORT) {
        error!("dhcp: bind port {} failed: {:?}", SERVER_PORT, e);
        loop {
            Timer::after_secs(1).await;
        }
    }
    info!("dhcp: serving {}.{}.{}.0/24", AP_ADDRESS[0], AP_ADDRESS[1], AP_ADDRESS[2]);

    let broadcast = IpEndpoint::new(IpAddress::Ipv4(Ipv4Address::BROADCAST), CLIENT_PORT);
    let mut pool = LeasePool::new(AP_ADDRESS);
    let mut packet = [0u8; 576];

    loop {
        let n = match socket.recv_from(&mut packet).await {
            Ok((n, _)) => n,
            Err(e) => {
                warn!("dhcp: recv failed: {:?}", e);
                continue;
            }
        };
        let request = match dhcp::parse(&packet[..n]) {
            Ok(r) => r,
            Err(e) => {
                debug!("dhcp: ignored packet: {}", e);
                continue;
            }
        };
        let Some(reply) = dhcp::handle(&request, &mut pool, AP_ADDRESS) else {
            continue;
        };
        if let Err(e) = socket.send_to(reply.as_bytes(), broadcast).await {
            warn!("dhcp: send failed: {:?}", e);
        }
    }
}
