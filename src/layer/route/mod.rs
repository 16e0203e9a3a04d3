//! Longest-prefix-match forwarding between interfaces.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::layer::iface::Interface;
use crate::wire::ipv4::{Address as Ipv4Address, Datagram};


/// One forwarding rule.
#[derive(Debug, Clone, Copy)]
struct Rule {
    /// Where to send matching datagrams next; `None` means the destination
    /// network is directly attached and the datagram's own destination is
    /// the next hop.
    next_hop: Option<Ipv4Address>,
    /// Index of the egress interface.
    interface: usize,
}

/// A router: a set of interfaces plus the forwarding table between them.
///
/// Interfaces are shared, not owned: the router dispatches into them while
/// the surrounding harness drives their frame queues independently.
///
/// The table is keyed by `(prefix bits, prefix length)`, so a lookup probes
/// at most 33 exact-length keys from the most to the least specific. Rules
/// with the same key replace each other, last write wins.
#[derive(Debug, Default)]
pub struct Router {
    interfaces: Vec<Rc<RefCell<Interface>>>,
    rules: HashMap<(u32, u8), Rule>,
}

impl Router {
    /// Create a router with no interfaces and no routes.
    pub fn new() -> Router {
        Router::default()
    }

    /// Attach an interface, returning its index for use in routes.
    pub fn add_interface(&mut self, interface: Rc<RefCell<Interface>>) -> usize {
        self.interfaces.push(interface);
        self.interfaces.len() - 1
    }

    /// Access an attached interface by index.
    ///
    /// # Panics
    /// Panics if no interface with this index was added.
    pub fn interface(&self, index: usize) -> &Rc<RefCell<Interface>> {
        &self.interfaces[index]
    }

    /// Register a forwarding rule.
    ///
    /// Datagrams whose destination matches the top `prefix_len` bits of
    /// `prefix` leave through interface `interface`, towards `next_hop` or,
    /// absent one, directly towards their destination.
    pub fn add_route(
        &mut self,
        prefix: Ipv4Address,
        prefix_len: u8,
        next_hop: Option<Ipv4Address>,
        interface: usize,
    ) {
        net_debug!("adding route {}/{} => {} on interface {}",
            prefix, prefix_len,
            next_hop.map(|hop| hop.to_string()).unwrap_or_else(|| "(direct)".into()),
            interface);
        let key = (prefix_bits(prefix.to_network_integer(), prefix_len), prefix_len);
        self.rules.insert(key, Rule { next_hop, interface });
    }

    /// Drain every interface's inbound queue and forward each datagram
    /// toward its longest-prefix match.
    ///
    /// Datagrams without a matching rule, and datagrams that would expire in
    /// transit, are dropped silently.
    pub fn route(&mut self) {
        for index in 0..self.interfaces.len() {
            loop {
                let datagram = match self.interfaces[index].borrow_mut().poll_inbound() {
                    Some(datagram) => datagram,
                    None => break,
                };
                self.forward(datagram);
            }
        }
    }

    fn forward(&self, mut datagram: Datagram) {
        let dst_addr = datagram.header.dst_addr;
        let rule = match self.lookup(dst_addr.to_network_integer()) {
            Some(rule) => *rule,
            None => {
                net_trace!("no route to {}, dropping", dst_addr);
                return;
            }
        };
        if datagram.header.ttl <= 1 {
            net_trace!("ttl expired in transit to {}, dropping", dst_addr);
            return;
        }
        datagram.header.ttl -= 1;
        datagram.fill_checksum();
        let next_hop = rule.next_hop.unwrap_or(dst_addr);
        self.interfaces[rule.interface]
            .borrow_mut()
            .send_datagram(datagram, next_hop);
    }

    fn lookup(&self, dst_addr: u32) -> Option<&Rule> {
        (0..=32u8)
            .rev()
            .find_map(|len| self.rules.get(&(prefix_bits(dst_addr, len), len)))
    }
}

fn prefix_bits(addr: u32, len: u8) -> u32 {
    if len == 0 { 0 } else { addr >> (32 - len) }
}
