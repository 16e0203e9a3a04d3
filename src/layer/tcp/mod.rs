//! The transport layer: a receiver and a sender half.
//!
//! The two halves share nothing but the wire messages in
//! [`crate::wire::tcp`]. The [`Receiver`] consumes inbound segments, drives
//! a [`crate::storage::Reassembler`] and derives acknowledgment feedback;
//! the [`Sender`] slices its outbound stream into segments sized to the
//! peer's advertised window and retransmits under an adaptive timeout.

use crate::time::Duration;

mod receiver;
mod sender;
#[cfg(test)]
mod tests;

pub use self::receiver::Receiver;
pub use self::sender::Sender;

/// Largest window a receiver will advertise: the 16-bit wire field ceiling.
pub const MAX_WINDOW: usize = 65_535;

/// Tunable transport parameters.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Most payload octets a single segment may carry.
    pub max_payload_size: usize,
    /// Retransmission timeout before any backoff has been applied.
    pub initial_rto: Duration,
    /// Consecutive retransmissions after which the sender stops actively
    /// retransmitting (the timer keeps firing).
    pub max_retransmit_attempts: u32,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            max_payload_size: 1000,
            initial_rto: Duration::from_millis(1000),
            max_retransmit_attempts: 8,
        }
    }
}
