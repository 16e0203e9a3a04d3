//! Ethernet frame representation.

use core::fmt;

use super::{arp, ipv4};

enum_with_unknown! {
    /// Ethernet protocol type.
    pub enum EtherType(u16) {
        /// An IPv4 datagram.
        Ipv4 = 0x0800,
        /// An ARP message.
        Arp = 0x0806,
    }
}

/// A six-octet Ethernet address.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; 6]);

impl Address {
    /// The broadcast address.
    pub const BROADCAST: Address = Address([0xff; 6]);

    /// Construct an Ethernet address from a sequence of octets, in big-endian.
    ///
    /// # Panics
    /// The function panics if `data` is not six octets long.
    pub fn from_bytes(data: &[u8]) -> Address {
        let mut bytes = [0; 6];
        bytes.copy_from_slice(data);
        Address(bytes)
    }

    /// Return the address as a sequence of octets, in big-endian.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Query whether this address is the broadcast address.
    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    /// Query whether the "multicast" bit in the OUI is unset.
    pub fn is_unicast(&self) -> bool {
        !self.is_broadcast() && self.0[0] & 0x01 == 0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let bytes = self.0;
        write!(f, "{:02x}-{:02x}-{:02x}-{:02x}-{:02x}-{:02x}",
               bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5])
    }
}

/// A parsed Ethernet frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repr {
    /// Source link address.
    pub src_addr: Address,
    /// Destination link address.
    pub dst_addr: Address,
    /// The protocol carried in the frame body.
    pub ethertype: EtherType,
}

/// The already-parsed body of a link frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// An IPv4 datagram.
    Ipv4(ipv4::Datagram),
    /// An ARP message.
    Arp(arp::Repr),
}

impl Payload {
    /// The ethertype a frame carrying this payload must declare.
    pub fn ethertype(&self) -> EtherType {
        match self {
            Payload::Ipv4(_) => EtherType::Ipv4,
            Payload::Arp(_) => EtherType::Arp,
        }
    }
}

/// A link frame: parsed header plus typed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// The frame header.
    pub header: Repr,
    /// The frame body.
    pub payload: Payload,
}

impl Frame {
    /// Assemble a frame, deriving the ethertype from the payload.
    pub fn new(src_addr: Address, dst_addr: Address, payload: Payload) -> Frame {
        Frame {
            header: Repr { src_addr, dst_addr, ethertype: payload.ethertype() },
            payload,
        }
    }
}
