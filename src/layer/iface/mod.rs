//! Link-layer address resolution and frame dispatch.
//!
//! An [`Interface`] owns one link attachment: its Ethernet and IPv4
//! addresses, a timed neighbor cache, a pool of outstanding resolution
//! requests, and the queues that decouple it from the driver. Datagrams for
//! unresolved next hops wait in a FIFO retry queue until the matching reply
//! arrives; there is no timeout-driven drop, a datagram waits as long as the
//! interface lives.

use std::collections::VecDeque;

use crate::storage::RecencyMap;
use crate::time::{Duration, Instant};
use crate::wire::arp::{Operation, Repr as ArpRepr};
use crate::wire::ethernet::{Address as EthernetAddress, EtherType, Frame, Payload};
use crate::wire::ipv4::{Address as Ipv4Address, Datagram};


/// Tunable resolution parameters.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// How long a learned neighbor mapping stays valid.
    pub neighbor_ttl: Duration,
    /// How long an unanswered resolution request suppresses duplicates.
    pub request_ttl: Duration,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            neighbor_ttl: Duration::from_millis(30_000),
            request_ttl: Duration::from_millis(5_000),
        }
    }
}

/// A network interface: the boundary between datagrams and link frames.
#[derive(Debug)]
pub struct Interface {
    name: String,
    ethernet_addr: EthernetAddress,
    ipv4_addr: Ipv4Address,
    config: Config,
    clock: Instant,
    neighbors: RecencyMap<EthernetAddress>,
    requests: RecencyMap<()>,
    waiting: VecDeque<(Ipv4Address, Datagram)>,
    inbound: VecDeque<Datagram>,
    outbound: VecDeque<Frame>,
}

impl Interface {
    /// Create an interface with the given link and protocol addresses.
    pub fn new<N: Into<String>>(
        name: N,
        ethernet_addr: EthernetAddress,
        ipv4_addr: Ipv4Address,
        config: Config,
    ) -> Interface {
        let name = name.into();
        net_debug!("interface {} has link address {} and address {}",
            name, ethernet_addr, ipv4_addr);
        Interface {
            name,
            ethernet_addr,
            ipv4_addr,
            config,
            clock: Instant::default(),
            neighbors: RecencyMap::new(),
            requests: RecencyMap::new(),
            waiting: VecDeque::new(),
            inbound: VecDeque::new(),
            outbound: VecDeque::new(),
        }
    }

    /// The interface name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The interface's link address.
    pub fn ethernet_addr(&self) -> EthernetAddress {
        self.ethernet_addr
    }

    /// The interface's protocol address.
    pub fn ipv4_addr(&self) -> Ipv4Address {
        self.ipv4_addr
    }

    /// Send `datagram` towards `next_hop`.
    ///
    /// A cached next-hop mapping lets the frame out immediately. Otherwise
    /// the datagram joins the retry queue and, unless one is already
    /// outstanding, a resolution request goes out on the broadcast address.
    pub fn send_datagram(&mut self, datagram: Datagram, next_hop: Ipv4Address) {
        let key = next_hop.to_network_integer();
        if let Some(&link_addr) = self.neighbors.get(key) {
            let frame = self.frame(link_addr, Payload::Ipv4(datagram));
            self.transmit(frame);
            return;
        }
        if !self.requests.contains(key) {
            net_trace!("{}: who has {}", self.name, next_hop);
            let request = ArpRepr {
                operation: Operation::Request,
                source_hardware_addr: self.ethernet_addr,
                source_protocol_addr: self.ipv4_addr,
                target_hardware_addr: EthernetAddress([0x00; 6]),
                target_protocol_addr: next_hop,
            };
            let frame = self.frame(EthernetAddress::BROADCAST, Payload::Arp(request));
            self.transmit(frame);
            self.requests.insert(key, self.clock, ());
        }
        self.waiting.push_back((next_hop, datagram));
    }

    /// Accept one link frame.
    ///
    /// IPv4 frames pass a destination filter and land on the inbound
    /// datagram queue. ARP frames refresh the sender's cache mapping and
    /// flush newly resolvable queued datagrams before the destination filter
    /// applies; requests for this interface's own address are answered.
    pub fn recv_frame(&mut self, frame: Frame) {
        let for_us = frame.header.dst_addr == self.ethernet_addr
            || frame.header.dst_addr.is_broadcast();
        match frame.payload {
            Payload::Ipv4(datagram) => {
                // The simulated link delivers well-formed frames only.
                debug_assert_eq!(frame.header.ethertype, EtherType::Ipv4);
                if !for_us {
                    return;
                }
                self.inbound.push_back(datagram);
            }
            Payload::Arp(message) => {
                debug_assert_eq!(frame.header.ethertype, EtherType::Arp);
                // Learn from every ARP message on the wire, addressed to us
                // or not.
                net_trace!("{}: {} is at {}", self.name,
                    message.source_protocol_addr, message.source_hardware_addr);
                self.neighbors.insert(
                    message.source_protocol_addr.to_network_integer(),
                    self.clock,
                    message.source_hardware_addr,
                );
                self.flush_waiting();
                if !for_us {
                    return;
                }
                if message.operation == Operation::Request
                    && message.target_protocol_addr == self.ipv4_addr
                {
                    let reply = ArpRepr {
                        operation: Operation::Reply,
                        source_hardware_addr: self.ethernet_addr,
                        source_protocol_addr: self.ipv4_addr,
                        target_hardware_addr: message.source_hardware_addr,
                        target_protocol_addr: message.source_protocol_addr,
                    };
                    let frame = self.frame(frame.header.src_addr, Payload::Arp(reply));
                    self.transmit(frame);
                }
            }
        }
    }

    /// Account for `elapsed_ms` milliseconds of virtual time and expire
    /// stale cache entries and request markers.
    pub fn tick(&mut self, elapsed_ms: u64) {
        self.clock += Duration::from_millis(elapsed_ms);
        self.neighbors.expire(self.clock, self.config.neighbor_ttl);
        self.requests.expire(self.clock, self.config.request_ttl);
    }

    /// Take the next received datagram, if any.
    pub fn poll_inbound(&mut self) -> Option<Datagram> {
        self.inbound.pop_front()
    }

    /// Take the next frame awaiting transmission, if any.
    pub fn poll_frame(&mut self) -> Option<Frame> {
        self.outbound.pop_front()
    }

    /// Transmit queued datagrams that have become resolvable, in enqueue
    /// order, stopping at the first next hop that is still unresolved.
    fn flush_waiting(&mut self) {
        loop {
            let link_addr = match self.waiting.front() {
                Some((next_hop, _)) => {
                    match self.neighbors.get(next_hop.to_network_integer()) {
                        Some(&link_addr) => link_addr,
                        None => break,
                    }
                }
                None => break,
            };
            let (_, datagram) = self.waiting.pop_front()
                .expect("entry just found at the front");
            let frame = self.frame(link_addr, Payload::Ipv4(datagram));
            self.transmit(frame);
        }
    }

    fn frame(&self, dst_addr: EthernetAddress, payload: Payload) -> Frame {
        Frame::new(self.ethernet_addr, dst_addr, payload)
    }

    fn transmit(&mut self, frame: Frame) {
        self.outbound.push_back(frame);
    }
}
