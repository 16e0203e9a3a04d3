//! Transport segment representations and sequence-number arithmetic.

use core::{fmt, ops};

/// A 32-bit wrapping sequence number.
///
/// The transport numbers every octet of a stream with a 64-bit absolute
/// offset but only ever puts the low 32 bits, shifted by a per-connection
/// zero point, on the wire. [`wrap`] performs that projection; [`unwrap`]
/// inverts it by picking the unique absolute offset within 2<sup>31</sup> of
/// a caller-supplied checkpoint.
///
/// [`wrap`]: #method.wrap
/// [`unwrap`]: #method.unwrap
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeqNumber(pub u32);

impl SeqNumber {
    /// Project an absolute stream offset onto the wire around `zero_point`.
    pub fn wrap(offset: u64, zero_point: SeqNumber) -> SeqNumber {
        zero_point + offset
    }

    /// Recover the absolute offset this sequence number stands for.
    ///
    /// Of the candidate offsets that project onto this number, returns the
    /// one closest to `checkpoint`. The caller guarantees the checkpoint is
    /// within 2<sup>31</sup> of the true offset, typically by passing the
    /// last known absolute position of the stream.
    pub fn unwrap(self, zero_point: SeqNumber, checkpoint: u64) -> u64 {
        const MOD: u64 = 1 << 32;
        let raw = self.0.wrapping_sub(zero_point.0) as u64;
        let distance = |offset: u64| {
            if offset > checkpoint { offset - checkpoint } else { checkpoint - offset }
        };
        // Start from the multiple of 2^32 at the checkpoint and test both
        // neighbors. Wrapping arithmetic keeps the comparison honest at the
        // ends of the offset space: a wrapped-around candidate lands far from
        // any reachable checkpoint and loses the distance comparison.
        let mut t = checkpoint / MOD;
        let here = distance(t.wrapping_mul(MOD).wrapping_add(raw));
        if distance(t.wrapping_sub(1).wrapping_mul(MOD).wrapping_add(raw)) < here {
            t = t.wrapping_sub(1);
        } else if distance(t.wrapping_add(1).wrapping_mul(MOD).wrapping_add(raw)) < here {
            t = t.wrapping_add(1);
        }
        t.wrapping_mul(MOD).wrapping_add(raw)
    }
}

impl ops::Add<u64> for SeqNumber {
    type Output = SeqNumber;

    fn add(self, rhs: u64) -> SeqNumber {
        SeqNumber(self.0.wrapping_add(rhs as u32))
    }
}

impl fmt::Display for SeqNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One sender-to-receiver transport message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Sequence number of the first octet (or of the SYN flag, if set).
    pub seqno: SeqNumber,
    /// Stream synchronization marker, occupies one sequence number.
    pub syn: bool,
    /// The carried octets.
    pub payload: Vec<u8>,
    /// End-of-stream marker, occupies one sequence number.
    pub fin: bool,
    /// Connection reset.
    pub rst: bool,
}

impl Segment {
    /// How many sequence numbers this segment occupies.
    pub fn sequence_length(&self) -> u64 {
        self.payload.len() as u64 + self.syn as u64 + self.fin as u64
    }
}

/// Receiver-to-sender feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// The next sequence number the receiver expects, once known.
    pub ackno: Option<SeqNumber>,
    /// Free receive capacity, clamped to the 16-bit wire field.
    pub window_size: u16,
    /// Connection reset.
    pub rst: bool,
}
