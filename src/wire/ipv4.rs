//! IPv4 datagram representation.

use byteorder::{ByteOrder, NetworkEndian};
use core::fmt;

enum_with_unknown! {
    /// IP payload protocol.
    pub enum Protocol(u8) {
        /// Transmission Control Protocol.
        Tcp = 6,
        /// User Datagram Protocol.
        Udp = 17,
    }
}

/// A four-octet IPv4 address.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; 4]);

impl Address {
    /// An unspecified address.
    pub const UNSPECIFIED: Address = Address([0x00; 4]);

    /// The broadcast address.
    pub const BROADCAST: Address = Address([0xff; 4]);

    /// Construct an IPv4 address from parts.
    pub const fn new(a0: u8, a1: u8, a2: u8, a3: u8) -> Address {
        Address([a0, a1, a2, a3])
    }

    /// Return the address as a sequence of octets, in big-endian.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Encode the address into a `u32` in network endian byte order.
    pub fn to_network_integer(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    /// Decode a network endian `u32` into an address.
    pub fn from_network_integer(num: u32) -> Self {
        Address(num.to_be_bytes())
    }

    /// Query whether the address is the broadcast address.
    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    /// Query whether the address falls into the "unspecified" range.
    pub fn is_unspecified(&self) -> bool {
        self.0[0] == 0
    }

    /// Query whether the address is a multicast address.
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0xf0 == 224
    }

    /// Query whether the address is a unicast address.
    pub fn is_unicast(&self) -> bool {
        !(self.is_broadcast() || self.is_multicast() || self.is_unspecified())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let bytes = self.0;
        write!(f, "{}.{}.{}.{}", bytes[0], bytes[1], bytes[2], bytes[3])
    }
}

/// A parsed IPv4 header.
///
/// Options are not modelled; the header length is always twenty octets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repr {
    /// Source address.
    pub src_addr: Address,
    /// Destination address.
    pub dst_addr: Address,
    /// Payload protocol.
    pub protocol: Protocol,
    /// Time to live, decremented on every forwarding hop.
    pub ttl: u8,
    /// Identification field.
    pub ident: u16,
    /// Header checksum as carried on the wire.
    pub checksum: u16,
}

impl Repr {
    /// Length of the serialized header.
    pub const HEADER_LEN: usize = 20;

    /// Emit the header in wire format.
    ///
    /// Used for checksum computation; full serialization lives outside the
    /// core.
    fn emit(&self, payload_len: usize) -> [u8; Repr::HEADER_LEN] {
        let mut bytes = [0u8; Repr::HEADER_LEN];
        // Version 4, header length of five 32-bit words.
        bytes[0] = 0x45;
        NetworkEndian::write_u16(&mut bytes[2..4], (Repr::HEADER_LEN + payload_len) as u16);
        NetworkEndian::write_u16(&mut bytes[4..6], self.ident);
        bytes[8] = self.ttl;
        bytes[9] = self.protocol.into();
        NetworkEndian::write_u16(&mut bytes[10..12], self.checksum);
        bytes[12..16].copy_from_slice(self.src_addr.as_bytes());
        bytes[16..20].copy_from_slice(self.dst_addr.as_bytes());
        bytes
    }

    /// Compute the checksum this header should carry for `payload_len`
    /// octets of payload.
    pub fn compute_checksum(&self, payload_len: usize) -> u16 {
        let mut zeroed = *self;
        zeroed.checksum = 0;
        !checksum::data(&zeroed.emit(payload_len))
    }

    /// Validate the carried header checksum.
    pub fn verify_checksum(&self, payload_len: usize) -> bool {
        checksum::data(&self.emit(payload_len)) == !0
    }
}

/// An IPv4 datagram with its payload still attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Datagram {
    /// The parsed header.
    pub header: Repr,
    /// The payload octets.
    pub payload: Vec<u8>,
}

impl Datagram {
    /// Recompute and store the header checksum.
    pub fn fill_checksum(&mut self) {
        self.header.checksum = self.header.compute_checksum(self.payload.len());
    }

    /// Validate the carried header checksum.
    pub fn verify_checksum(&self) -> bool {
        self.header.verify_checksum(self.payload.len())
    }
}

pub(crate) mod checksum {
    use byteorder::{ByteOrder, NetworkEndian};

    fn propagate_carries(word: u32) -> u16 {
        let sum = (word >> 16) + (word & 0xffff);
        ((sum >> 16) as u16) + (sum as u16)
    }

    /// Compute an RFC 1071 compliant checksum (without the final complement).
    pub(crate) fn data(mut data: &[u8]) -> u16 {
        let mut accum = 0u32;
        while data.len() >= 2 {
            accum += NetworkEndian::read_u16(data) as u32;
            data = &data[2..];
        }
        // The last remaining odd byte, if any.
        if let Some(&value) = data.first() {
            accum += (value as u32) << 8;
        }
        propagate_carries(accum)
    }
}
