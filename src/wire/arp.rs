//! Address Resolution Protocol message representation.
//!
//! Only the Ethernet/IPv4 combination is modelled; it is the sole flavor the
//! simulated link delivers.

use super::{ethernet, ipv4};

enum_with_unknown! {
    /// ARP operation type.
    pub enum Operation(u16) {
        /// Who-has query for a protocol address.
        Request = 1,
        /// Answer carrying the requested mapping.
        Reply = 2,
    }
}

/// A parsed Ethernet/IPv4 ARP message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repr {
    /// Request or reply.
    pub operation: Operation,
    /// Link address of the message originator.
    pub source_hardware_addr: ethernet::Address,
    /// Protocol address of the message originator.
    pub source_protocol_addr: ipv4::Address,
    /// Link address of the message target, all-zero in requests.
    pub target_hardware_addr: ethernet::Address,
    /// Protocol address the originator asks about or answers for.
    pub target_protocol_addr: ipv4::Address,
}
