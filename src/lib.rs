//! A minimal user-space implementation of the mechanisms that move bytes
//! reliably across an unreliable packet network.
//!
//! The crate covers the pieces that together form an end-to-end reliable
//! byte path over a simulated link and network layer:
//!
//! * modular sequence-number arithmetic ([`wire::SeqNumber`]),
//! * out-of-order segment reassembly ([`storage::Reassembler`]),
//! * the transport receiver and sender halves ([`layer::tcp`]),
//! * link-layer address resolution with a timed cache ([`layer::iface`]),
//! * longest-prefix-match forwarding between interfaces ([`layer::route`]).
//!
//! ## Design
//!
//! Everything is single-threaded and cooperative. No component blocks and no
//! component spawns work of its own; all processing happens synchronously
//! inside `push`/`receive`/`recv_frame`/`route`/`tick` calls issued by an
//! external driver loop. Time is virtual: it advances only through explicit
//! `tick(elapsed_ms)` calls, which makes every timeout and expiry decision
//! deterministic and replayable ([`time`]).
//!
//! Back-pressure is expressed solely through the bounded byte stream
//! ([`storage::ByteStream`]): every producer consults its free capacity and
//! never writes more than reported. Wire headers are handled as parsed
//! representations ([`wire`]); serialization to and from raw octets happens
//! outside this crate.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

#[macro_use]
mod macros;

pub mod layer;
pub mod storage;
pub mod time;
pub mod wire;
