//! Stream storage and bookkeeping structures.
//!
//! [`ByteStream`] is the bounded FIFO byte buffer every producer in the
//! crate writes through; its reported free capacity is the only
//! back-pressure signal. [`Reassembler`] turns arbitrarily ordered byte
//! ranges back into that stream. [`RecencyMap`] keeps timed mappings in
//! most-recently-used order for cheap expiry.

pub mod reassembler;
pub mod recency;
pub mod stream;

pub use self::reassembler::Reassembler;
pub use self::recency::RecencyMap;
pub use self::stream::ByteStream;
