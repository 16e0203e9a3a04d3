use crate::storage::Reassembler;
use crate::wire::tcp::{Ack, Segment, SeqNumber};

use super::MAX_WINDOW;

/// The receiving half of a connection.
///
/// Maps wire sequence numbers to absolute stream offsets, drives the
/// reassembler, and derives the acknowledgment and window feedback the peer
/// sender needs.
#[derive(Debug)]
pub struct Receiver {
    reassembler: Reassembler,
    zero_point: Option<SeqNumber>,
}

impl Receiver {
    /// Create a receiver delivering into `reassembler`.
    pub fn new(reassembler: Reassembler) -> Receiver {
        Receiver { reassembler, zero_point: None }
    }

    /// Process one inbound segment.
    ///
    /// The first SYN establishes the zero point; until then every other
    /// segment is ignored. A reset flags the stream in error but does not
    /// tear the receiver down.
    pub fn receive(&mut self, segment: &Segment) {
        if segment.syn {
            // Sequence numbers start one past the SYN.
            self.zero_point = Some(segment.seqno + 1);
        }
        if segment.rst {
            self.reassembler.stream_mut().set_error();
        }
        let zero_point = match self.zero_point {
            Some(zero_point) => zero_point,
            None => return,
        };
        let index = if segment.syn {
            0
        } else {
            let checkpoint = self.reassembler.stream().bytes_pushed();
            segment.seqno.unwrap(zero_point, checkpoint)
        };
        self.reassembler.insert(index, &segment.payload, segment.fin);
    }

    /// Derive the feedback message for the peer sender.
    ///
    /// The acknowledgment is present only once a zero point exists and
    /// covers one extra sequence number after the stream closed, accounting
    /// for the FIN.
    pub fn ack(&self) -> Ack {
        let stream = self.reassembler.stream();
        let ackno = self.zero_point.map(|zero_point| {
            zero_point + stream.bytes_pushed() + stream.is_closed() as u64
        });
        Ack {
            ackno,
            window_size: stream.available_capacity().min(MAX_WINDOW) as u16,
            rst: stream.has_error(),
        }
    }

    /// The reassembler feeding the inbound stream.
    pub fn reassembler(&self) -> &Reassembler {
        &self.reassembler
    }

    /// The inbound stream; the application reads from it here.
    pub fn stream_mut(&mut self) -> &mut crate::storage::ByteStream {
        self.reassembler.stream_mut()
    }
}
