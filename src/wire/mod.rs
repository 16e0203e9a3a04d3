//! Parsed wire representations.
//!
//! Serialization to and from raw octets happens outside this crate; the
//! types here are the high-level representations the core inspects and
//! produces. A link frame therefore carries its payload already structured
//! ([`ethernet::Payload`]) instead of as an opaque byte run, and a mismatch
//! between a frame's ethertype and its payload variant is a contract breach
//! by the surrounding driver, not a runtime condition.

pub mod arp;
pub mod ethernet;
pub mod ipv4;
pub mod tcp;

pub use self::arp::{Operation as ArpOperation, Repr as ArpRepr};
pub use self::ethernet::{
    Address as EthernetAddress, EtherType, Frame as EthernetFrame, Payload as FramePayload,
    Repr as EthernetRepr,
};
pub use self::ipv4::{
    Address as Ipv4Address, Datagram as Ipv4Datagram, Protocol as IpProtocol, Repr as Ipv4Repr,
};
pub use self::tcp::{Ack as TcpAck, Segment as TcpSegment, SeqNumber};
