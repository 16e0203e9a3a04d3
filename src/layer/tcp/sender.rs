use std::collections::BTreeMap;

use crate::storage::ByteStream;
use crate::time::Duration;
use crate::wire::tcp::{Ack, Segment, SeqNumber};

use super::Config;

/// The retransmission timer.
///
/// Accumulates virtual time and latches a fired bit whenever a full timeout
/// has elapsed; [`take_fired`] samples and clears the latch. A closed timer
/// neither accumulates nor fires until it is restarted.
///
/// [`take_fired`]: #method.take_fired
#[derive(Debug)]
struct RetransmitTimer {
    elapsed: Duration,
    rto: Duration,
    fired: bool,
    closed: bool,
}

impl RetransmitTimer {
    fn new(rto: Duration) -> RetransmitTimer {
        RetransmitTimer { elapsed: Duration::from_millis(0), rto, fired: false, closed: false }
    }

    fn advance(&mut self, elapsed: Duration) {
        if self.closed {
            return;
        }
        self.elapsed += elapsed;
        if self.elapsed >= self.rto {
            self.elapsed -= self.rto;
            self.fired = true;
        }
    }

    fn take_fired(&mut self) -> bool {
        if self.fired && !self.closed {
            self.fired = false;
            return true;
        }
        false
    }

    fn set_rto(&mut self, rto: Duration) {
        self.rto = rto;
    }

    fn double_rto(&mut self) {
        self.rto *= 2;
    }

    fn restart(&mut self) {
        self.elapsed = Duration::from_millis(0);
        self.fired = false;
        self.closed = false;
    }

    fn close(&mut self) {
        self.closed = true;
        self.fired = false;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// The sending half of a connection.
///
/// Reads from its outbound stream, slices the bytes into segments sized to
/// the peer's advertised window, keeps every unacknowledged segment in an
/// ordered map, and retransmits the oldest one under an exponentially
/// backed-off timeout.
#[derive(Debug)]
pub struct Sender {
    stream: ByteStream,
    isn: SeqNumber,
    config: Config,
    timer: RetransmitTimer,
    /// Absolute sequence offset confirmed by the peer.
    confirmed: u64,
    /// Absolute sequence offset of the next octet to send.
    cursor: u64,
    /// Peer-advertised window; a fresh connection probes with one.
    window: u64,
    retransmissions: u32,
    outstanding: BTreeMap<u64, Segment>,
    initialized: bool,
    fin_sent: bool,
}

impl Sender {
    /// Create a sender draining `stream`, numbering from `isn`.
    pub fn new(stream: ByteStream, isn: SeqNumber, config: Config) -> Sender {
        Sender {
            stream,
            isn,
            config,
            timer: RetransmitTimer::new(config.initial_rto),
            confirmed: 0,
            cursor: 0,
            window: 1,
            retransmissions: 0,
            outstanding: BTreeMap::new(),
            initialized: false,
            fin_sent: false,
        }
    }

    /// Sequence numbers sent but not yet confirmed.
    pub fn sequence_numbers_in_flight(&self) -> u64 {
        self.cursor - self.confirmed
    }

    /// Retransmissions since the last forward-progress acknowledgment.
    pub fn consecutive_retransmissions(&self) -> u32 {
        self.retransmissions
    }

    /// A segment at the current cursor carrying no sequence numbers.
    ///
    /// Used as the base of every transmission and on its own to answer the
    /// peer without occupying window space. Its reset flag mirrors the
    /// outbound stream's error state.
    pub fn empty_segment(&self) -> Segment {
        Segment {
            seqno: self.isn + self.cursor,
            syn: false,
            payload: Vec::new(),
            fin: false,
            rst: self.stream.has_error(),
        }
    }

    /// Fill the peer's window from the outbound stream.
    ///
    /// Transmits segments until the window is full or there is nothing left
    /// to say. A zero window is probed as if it were one. The SYN rides the
    /// first segment ever sent, the FIN the first segment after the stream
    /// finished that still has window room for it.
    pub fn push<F: FnMut(&Segment)>(&mut self, mut transmit: F) {
        let window = self.window.max(1);
        while self.sequence_numbers_in_flight() < window {
            let mut segment = self.empty_segment();
            if !self.initialized {
                segment.syn = true;
                self.initialized = true;
            }
            let payload_len = {
                let room = (window - self.sequence_numbers_in_flight())
                    .min(self.config.max_payload_size as u64);
                let room = room - segment.sequence_length();
                room.min(self.stream.bytes_buffered() as u64) as usize
            };
            segment.payload = self.stream.peek()[..payload_len].to_vec();
            self.stream.pop(payload_len);
            if !self.fin_sent
                && self.stream.is_finished()
                && window > self.sequence_numbers_in_flight() + segment.sequence_length()
            {
                segment.fin = true;
                self.fin_sent = true;
            }
            if segment.sequence_length() == 0 {
                break;
            }
            net_trace!("tx seqno={} len={}", segment.seqno, segment.sequence_length());
            transmit(&segment);
            let start = self.cursor;
            self.cursor += segment.sequence_length();
            self.outstanding.insert(start, segment);
            if self.timer.is_closed() {
                self.timer.set_rto(self.config.initial_rto);
                self.timer.restart();
            }
        }
    }

    /// Process feedback from the peer receiver.
    ///
    /// Adopts the advertised window, absorbs resets into the stream error
    /// flag, and confirms outstanding segments fully covered by the
    /// acknowledgment. An acknowledgment without a sequence number
    /// de-initializes the sender so the next push repeats the SYN. Stale and
    /// out-of-range acknowledgments are ignored.
    pub fn receive(&mut self, ack: &Ack) {
        self.window = ack.window_size as u64;
        if ack.rst {
            self.stream.set_error();
        }
        let ackno = match ack.ackno {
            Some(ackno) => ackno,
            None => {
                self.initialized = false;
                return;
            }
        };
        let ackno = ackno.unwrap(self.isn, self.confirmed);
        if ackno <= self.confirmed || ackno > self.cursor {
            return;
        }
        loop {
            let (start, len) = match self.outstanding.iter().next() {
                Some((&start, segment)) => (start, segment.sequence_length()),
                None => break,
            };
            if start + len > ackno {
                break;
            }
            self.outstanding.remove(&start);
        }
        self.confirmed = ackno;
        self.retransmissions = 0;
        if self.sequence_numbers_in_flight() == 0 {
            self.timer.close();
        } else {
            self.timer.set_rto(self.config.initial_rto);
            self.timer.restart();
        }
    }

    /// Account for `elapsed_ms` milliseconds of virtual time.
    ///
    /// When the timer fires with data outstanding, the oldest unacknowledged
    /// segment is retransmitted until the consecutive-retransmission ceiling
    /// is reached. The timeout doubles on every retransmission into a
    /// non-zero window; a zero-window probe keeps the timeout steady.
    pub fn tick<F: FnMut(&Segment)>(&mut self, elapsed_ms: u64, mut transmit: F) {
        self.timer.advance(Duration::from_millis(elapsed_ms));
        if !self.timer.take_fired() {
            return;
        }
        if let Some((_, oldest)) = self.outstanding.iter().next() {
            if self.retransmissions < self.config.max_retransmit_attempts {
                net_trace!("rto expired, retransmitting seqno={}", oldest.seqno);
                transmit(oldest);
                if self.window != 0 {
                    self.timer.double_rto();
                }
                self.retransmissions += 1;
            }
        }
    }

    /// The outbound stream; the application writes into it here.
    pub fn stream_mut(&mut self) -> &mut ByteStream {
        &mut self.stream
    }

    /// The outbound stream.
    pub fn stream(&self) -> &ByteStream {
        &self.stream
    }
}
