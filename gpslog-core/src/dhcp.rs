// Minimal DHCPv4 server for the access-point fallback.
//
// Phones and laptops joining the board's open AP need an address
// before they can reach 192.168.4.1.  This handles exactly what they
// send: DISCOVER -> OFFER, REQUEST -> ACK/NAK, RELEASE.  Eight leases
// (.2 - .9) keyed by client MAC; nothing is persisted.
//
// Packet layout (RFC 2131):
//   0   op htype hlen hops
//   4   xid
//   8   secs flags
//   12  ciaddr  16 yiaddr  20 siaddr  24 giaddr
//   28  chaddr[16]
//   44  sname[64]  108 file[128]
//   236 magic cookie 99.130.83.99
//   240 options

use core::fmt;

pub const SERVER_PORT: u16 = 67;
pub const CLIENT_PORT: u16 = 68;

pub const LEASE_SECS: u32 = 2 * 60 * 60;
pub const POOL_SIZE: usize = 8;
const POOL_FIRST_HOST: u8 = 2;

const OP_REQUEST: u8 = 1;
const OP_REPLY: u8 = 2;
const HTYPE_ETHERNET: u8 = 1;
const MAGIC: [u8; 4] = [99, 130, 83, 99];
const OPTIONS_AT: usize = 240;

const OPT_PAD: u8 = 0;
const OPT_SUBNET_MASK: u8 = 1;
const OPT_ROUTER: u8 = 3;
const OPT_DNS: u8 = 6;
const OPT_REQUESTED_IP: u8 = 50;
const OPT_LEASE_TIME: u8 = 51;
const OPT_MESSAGE_TYPE: u8 = 53;
const OPT_SERVER_ID: u8 = 54;
const OPT_END: u8 = 255;

/// BOOTP minimum message size; replies are padded up to it.
pub const REPLY_LEN: usize = 300;

pub type Ipv4 = [u8; 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Discover,
    Offer,
    Request,
    Decline,
    Ack,
    Nak,
    Release,
    Inform,
}

impl MessageType {
    fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            1 => MessageType::Discover,
            2 => MessageType::Offer,
            3 => MessageType::Request,
            4 => MessageType::Decline,
            5 => MessageType::Ack,
            6 => MessageType::Nak,
            7 => MessageType::Release,
            8 => MessageType::Inform,
            _ => return None,
        })
    }

    const fn code(self) -> u8 {
        match self {
            MessageType::Discover => 1,
            MessageType::Offer => 2,
            MessageType::Request => 3,
            MessageType::Decline => 4,
            MessageType::Ack => 5,
            MessageType::Nak => 6,
            MessageType::Release => 7,
            MessageType::Inform => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpError {
    TooShort,
    NotRequest,
    BadMagic,
    BadOption,
    NoMessageType,
}

impl fmt::Display for DhcpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DhcpError::TooShort => "packet too short",
            DhcpError::NotRequest => "not a client request",
            DhcpError::BadMagic => "missing DHCP magic cookie",
            DhcpError::BadOption => "truncated option",
            DhcpError::NoMessageType => "no message type option",
        })
    }
}

/// The fields of a client message the server acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub msg_type: MessageType,
    pub xid: u32,
    pub flags: u16,
    pub ciaddr: Ipv4,
    pub chaddr: [u8; 6],
    pub requested_ip: Option<Ipv4>,
    pub server_id: Option<Ipv4>,
}

fn ip_at(p: &[u8], at: usize) -> Ipv4 {
    [p[at], p[at + 1], p[at + 2], p[at + 3]]
}

pub fn parse(packet: &[u8]) -> Result<Request, DhcpError> {
    if packet.len() < OPTIONS_AT {
        return Err(DhcpError::TooShort);
    }
    if packet[0] != OP_REQUEST || packet[1] != HTYPE_ETHERNET || packet[2] != 6 {
        return Err(DhcpError::NotRequest);
    }
    if packet[236..240] != MAGIC {
        return Err(DhcpError::BadMagic);
    }

    let mut msg_type = None;
    let mut requested_ip = None;
    let mut server_id = None;

    let mut opts = &packet[OPTIONS_AT..];
    while let Some((&code, rest)) = opts.split_first() {
        match code {
            OPT_END => break,
            OPT_PAD => {
                opts = rest;
                continue;
            }
            _ => {}
        }
        let (&len, rest) = rest.split_first().ok_or(DhcpError::BadOption)?;
        let len = len as usize;
        if rest.len() < len {
            return Err(DhcpError::BadOption);
        }
        let value = &rest[..len];
        match (code, len) {
            (OPT_MESSAGE_TYPE, 1) => msg_type = MessageType::from_code(value[0]),
            (OPT_REQUESTED_IP, 4) => requested_ip = Some(ip_at(value, 0)),
            (OPT_SERVER_ID, 4) => server_id = Some(ip_at(value, 0)),
            _ => {}
        }
        opts = &rest[len..];
    }

    let mut chaddr = [0u8; 6];
    chaddr.copy_from_slice(&packet[28..34]);

    Ok(Request {
        msg_type: msg_type.ok_or(DhcpError::NoMessageType)?,
        xid: u32::from_be_bytes([packet[4], packet[5], packet[6], packet[7]]),
        flags: u16::from_be_bytes([packet[10], packet[11]]),
        ciaddr: ip_at(packet, 12),
        chaddr,
        requested_ip,
        server_id,
    })
}

// ── Leases ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Lease {
    mac: [u8; 6],
}

/// Fixed pool of `POOL_SIZE` addresses following the server's own.
#[derive(Debug, Clone)]
pub struct LeasePool {
    network: [u8; 3],
    slots: [Option<Lease>; POOL_SIZE],
}

impl LeasePool {
    /// Pool inside the /24 of `server_ip`.
    pub const fn new(server_ip: Ipv4) -> Self {
        Self {
            network: [server_ip[0], server_ip[1], server_ip[2]],
            slots: [None; POOL_SIZE],
        }
    }

    fn ip_of(&self, slot: usize) -> Ipv4 {
        [
            self.network[0],
            self.network[1],
            self.network[2],
            POOL_FIRST_HOST + slot as u8,
        ]
    }

    fn slot_of_ip(&self, ip: Ipv4) -> Option<usize> {
        if ip[..3] != self.network {
            return None;
        }
        let host = ip[3].checked_sub(POOL_FIRST_HOST)? as usize;
        (host < POOL_SIZE).then_some(host)
    }

    fn slot_of_mac(&self, mac: &[u8; 6]) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| matches!(s, Some(l) if &l.mac == mac))
    }

    pub fn lease_of(&self, mac: &[u8; 6]) -> Option<Ipv4> {
        self.slot_of_mac(mac).map(|i| self.ip_of(i))
    }

    /// Existing lease for `mac`, else the first free address.
    pub fn offer(&mut self, mac: &[u8; 6]) -> Option<Ipv4> {
        if let Some(ip) = self.lease_of(mac) {
            return Some(ip);
        }
        let free = self.slots.iter().position(Option::is_none)?;
        self.slots[free] = Some(Lease { mac: *mac });
        Some(self.ip_of(free))
    }

    /// Bind `ip` to `mac` if it is in the pool and not someone else's.
    fn claim(&mut self, mac: &[u8; 6], ip: Ipv4) -> bool {
        let Some(slot) = self.slot_of_ip(ip) else {
            return false;
        };
        match self.slots[slot] {
            Some(l) if &l.mac != mac => false,
            _ => {
                if let Some(old) = self.slot_of_mac(mac) {
                    self.slots[old] = None;
                }
                self.slots[slot] = Some(Lease { mac: *mac });
                true
            }
        }
    }

    pub fn release(&mut self, mac: &[u8; 6]) {
        if let Some(i) = self.slot_of_mac(mac) {
            self.slots[i] = None;
        }
    }

    pub fn in_use(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

// ── Replies ─────────────────────────────────────────────────────────

pub struct Reply {
    pub msg_type: MessageType,
    pub yiaddr: Ipv4,
    buf: [u8; REPLY_LEN],
}

impl Reply {
    fn new(req: &Request, msg_type: MessageType, yiaddr: Ipv4, server_ip: Ipv4) -> Self {
        let mut buf = [0u8; REPLY_LEN];
        buf[0] = OP_REPLY;
        buf[1] = HTYPE_ETHERNET;
        buf[2] = 6;
        buf[4..8].copy_from_slice(&req.xid.to_be_bytes());
        buf[10..12].copy_from_slice(&req.flags.to_be_bytes());
        buf[16..20].copy_from_slice(&yiaddr);
        buf[20..24].copy_from_slice(&server_ip);
        buf[28..34].copy_from_slice(&req.chaddr);
        buf[236..240].copy_from_slice(&MAGIC);

        let mut at = OPTIONS_AT;
        let mut put = |code: u8, value: &[u8]| {
            buf[at] = code;
            buf[at + 1] = value.len() as u8;
            buf[at + 2..at + 2 + value.len()].copy_from_slice(value);
            at += 2 + value.len();
        };
        put(OPT_MESSAGE_TYPE, &[msg_type.code()]);
        put(OPT_SERVER_ID, &server_ip);
        if msg_type != MessageType::Nak {
            put(OPT_LEASE_TIME, &LEASE_SECS.to_be_bytes());
            put(OPT_SUBNET_MASK, &[255, 255, 255, 0]);
            put(OPT_ROUTER, &server_ip);
            put(OPT_DNS, &server_ip);
        }
        buf[at] = OPT_END;

        Self {
            msg_type,
            yiaddr,
            buf,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

/// Answer one client message.  `None` means stay silent.
pub fn handle(req: &Request, pool: &mut LeasePool, server_ip: Ipv4) -> Option<Reply> {
    match req.msg_type {
        MessageType::Discover => {
            let Some(ip) = pool.offer(&req.chaddr) else {
                log::warn!("dhcp: pool exhausted");
                return None;
            };
            Some(Reply::new(req, MessageType::Offer, ip, server_ip))
        }
        MessageType::Request => {
            if req.server_id.is_some_and(|id| id != server_ip) {
                // client picked another server
                return None;
            }
            let wanted = req.requested_ip.unwrap_or(req.ciaddr);
            if pool.claim(&req.chaddr, wanted) {
                log::info!(
                    "dhcp: lease {}.{}.{}.{}",
                    wanted[0],
                    wanted[1],
                    wanted[2],
                    wanted[3]
                );
                Some(Reply::new(req, MessageType::Ack, wanted, server_ip))
            } else {
                Some(Reply::new(req, MessageType::Nak, [0; 4], server_ip))
            }
        }
        MessageType::Release | MessageType::Decline => {
            pool.release(&req.chaddr);
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER: Ipv4 = [192, 168, 4, 1];

    fn client_packet(mac: [u8; 6], msg: u8, options: &[u8]) -> Vec<u8> {
        let mut p = vec![0u8; OPTIONS_AT];
        p[0] = OP_REQUEST;
        p[1] = HTYPE_ETHERNET;
        p[2] = 6;
        p[4..8].copy_from_slice(&0xdead_beef_u32.to_be_bytes());
        p[10] = 0x80;
        p[28..34].copy_from_slice(&mac);
        p[236..240].copy_from_slice(&MAGIC);
        p.extend_from_slice(&[OPT_MESSAGE_TYPE, 1, msg]);
        p.extend_from_slice(options);
        p.push(OPT_END);
        p
    }

    fn option(reply: &[u8], code: u8) -> Option<&[u8]> {
        let mut at = OPTIONS_AT;
        while reply[at] != OPT_END {
            let len = reply[at + 1] as usize;
            if reply[at] == code {
                return Some(&reply[at + 2..at + 2 + len]);
            }
            at += 2 + len;
        }
        None
    }

    const MAC_A: [u8; 6] = [0x02, 0, 0, 0, 0, 0xaa];
    const MAC_B: [u8; 6] = [0x02, 0, 0, 0, 0, 0xbb];

    #[test]
    fn discover_then_request() {
        let mut pool = LeasePool::new(SERVER);

        let discover = parse(&client_packet(MAC_A, 1, &[OPT_PAD, OPT_PAD])).unwrap();
        assert_eq!(discover.msg_type, MessageType::Discover);
        assert_eq!(discover.xid, 0xdead_beef);
        let offer = handle(&discover, &mut pool, SERVER).unwrap();
        assert_eq!(offer.msg_type, MessageType::Offer);
        assert_eq!(offer.yiaddr, [192, 168, 4, 2]);

        let bytes = offer.as_bytes();
        assert_eq!(bytes.len(), REPLY_LEN);
        assert_eq!(bytes[0], OP_REPLY);
        assert_eq!(&bytes[4..8], &0xdead_beef_u32.to_be_bytes());
        assert_eq!(bytes[10], 0x80);
        assert_eq!(&bytes[16..20], &[192, 168, 4, 2]);
        assert_eq!(&bytes[28..34], &MAC_A);
        assert_eq!(option(bytes, OPT_MESSAGE_TYPE), Some(&[2u8][..]));
        assert_eq!(option(bytes, OPT_SERVER_ID), Some(&SERVER[..]));
        assert_eq!(option(bytes, OPT_LEASE_TIME), Some(&7200u32.to_be_bytes()[..]));
        assert_eq!(option(bytes, OPT_SUBNET_MASK), Some(&[255u8, 255, 255, 0][..]));

        let request = parse(&client_packet(
            MAC_A,
            3,
            &[OPT_REQUESTED_IP, 4, 192, 168, 4, 2, OPT_SERVER_ID, 4, 192, 168, 4, 1],
        ))
        .unwrap();
        let ack = handle(&request, &mut pool, SERVER).unwrap();
        assert_eq!(ack.msg_type, MessageType::Ack);
        assert_eq!(ack.yiaddr, [192, 168, 4, 2]);
        assert_eq!(pool.lease_of(&MAC_A), Some([192, 168, 4, 2]));
    }

    #[test]
    fn request_for_someone_elses_address_is_nakked() {
        let mut pool = LeasePool::new(SERVER);
        assert_eq!(pool.offer(&MAC_A), Some([192, 168, 4, 2]));
        assert_eq!(pool.offer(&MAC_B), Some([192, 168, 4, 3]));

        let steal = parse(&client_packet(MAC_B, 3, &[OPT_REQUESTED_IP, 4, 192, 168, 4, 2])).unwrap();
        let nak = handle(&steal, &mut pool, SERVER).unwrap();
        assert_eq!(nak.msg_type, MessageType::Nak);
        assert_eq!(nak.yiaddr, [0; 4]);
        assert_eq!(option(nak.as_bytes(), OPT_LEASE_TIME), None);

        let outside = parse(&client_packet(MAC_B, 3, &[OPT_REQUESTED_IP, 4, 10, 0, 0, 5])).unwrap();
        assert_eq!(handle(&outside, &mut pool, SERVER).map(|r| r.msg_type), Some(MessageType::Nak));
    }

    #[test]
    fn reboot_request_claims_free_address() {
        let mut pool = LeasePool::new(SERVER);
        let req = parse(&client_packet(MAC_A, 3, &[OPT_REQUESTED_IP, 4, 192, 168, 4, 7])).unwrap();
        let ack = handle(&req, &mut pool, SERVER).unwrap();
        assert_eq!(ack.msg_type, MessageType::Ack);
        assert_eq!(pool.lease_of(&MAC_A), Some([192, 168, 4, 7]));
        assert_eq!(pool.in_use(), 1);
    }

    #[test]
    fn request_to_other_server_is_ignored() {
        let mut pool = LeasePool::new(SERVER);
        let req = parse(&client_packet(
            MAC_A,
            3,
            &[OPT_REQUESTED_IP, 4, 192, 168, 4, 2, OPT_SERVER_ID, 4, 192, 168, 4, 99],
        ))
        .unwrap();
        assert!(handle(&req, &mut pool, SERVER).is_none());
    }

    #[test]
    fn release_frees_and_pool_exhausts() {
        let mut pool = LeasePool::new(SERVER);
        for i in 0..POOL_SIZE as u8 {
            assert!(pool.offer(&[2, 0, 0, 0, 1, i]).is_some());
        }
        assert_eq!(pool.offer(&MAC_A), None);
        let discover = parse(&client_packet(MAC_A, 1, &[])).unwrap();
        assert!(handle(&discover, &mut pool, SERVER).is_none());

        let release = parse(&client_packet([2, 0, 0, 0, 1, 0], 7, &[])).unwrap();
        assert!(handle(&release, &mut pool, SERVER).is_none());
        assert_eq!(pool.in_use(), POOL_SIZE - 1);
        assert_eq!(pool.offer(&MAC_A), Some([192, 168, 4, 2]));
    }

    #[test]
    fn malformed_packets() {
        assert_eq!(parse(&[0u8; 100]), Err(DhcpError::TooShort));

        let mut p = client_packet(MAC_A, 1, &[]);
        p[0] = OP_REPLY;
        assert_eq!(parse(&p), Err(DhcpError::NotRequest));

        let mut p = client_packet(MAC_A, 1, &[]);
        p[236] = 0;
        assert_eq!(parse(&p), Err(DhcpError::BadMagic));

        let mut p = client_packet(MAC_A, 1, &[]);
        p.truncate(p.len() - 2);
        p.extend_from_slice(&[OPT_REQUESTED_IP, 4, 1]);
        assert_eq!(parse(&p), Err(DhcpError::BadOption));

        let mut p = client_packet(MAC_A, 1, &[]);
        p[OPTIONS_AT] = OPT_PAD;
        p[OPTIONS_AT + 1] = OPT_PAD;
        p[OPTIONS_AT + 2] = OPT_PAD;
        assert_eq!(parse(&p), Err(DhcpError::NoMessageType));
    }
}
