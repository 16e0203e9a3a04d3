//! Out-of-order byte-range reassembly.

use std::collections::BTreeMap;

use super::stream::ByteStream;

/// Reassembles arbitrarily ordered, possibly overlapping byte ranges into a
/// contiguous stream.
///
/// Ranges that begin at the next expected offset flow straight into the
/// output stream; everything else is parked in an ordered map of pending
/// runs keyed by start offset. Runs are merged eagerly on insert, so at rest
/// the map always holds a maximal set of disjoint, non-touching runs. Only
/// bytes that fit the output stream's current free capacity are ever
/// buffered; the admissible window slides forward as the application drains
/// the stream.
#[derive(Debug)]
pub struct Reassembler {
    output: ByteStream,
    pending: BTreeMap<u64, Vec<u8>>,
    pending_bytes: u64,
    end_index: Option<u64>,
}

impl Reassembler {
    /// Create a reassembler feeding `output`.
    pub fn new(output: ByteStream) -> Reassembler {
        Reassembler {
            output,
            pending: BTreeMap::new(),
            pending_bytes: 0,
            end_index: None,
        }
    }

    /// Accept the range `data` beginning at absolute offset `first_index`.
    ///
    /// `is_last` marks the range as the final one of the stream; the end
    /// offset it implies is recorded once and never changes. Data beyond the
    /// admissible window is clipped or dropped, duplicates are absorbed, and
    /// once the stream has received every byte up to the end offset the
    /// output is closed.
    pub fn insert(&mut self, first_index: u64, data: &[u8], is_last: bool) {
        if self.output.is_closed() {
            return;
        }

        let out_index = self.output.bytes_pushed();

        if is_last && self.end_index.is_none() {
            self.end_index = Some(first_index + data.len() as u64);
            if self.end_index == Some(out_index) {
                self.output.close();
                return;
            }
        }

        if data.is_empty() {
            return;
        }

        let width = {
            let mut width = self.output.available_capacity() as u64;
            if let Some(end) = self.end_index {
                width = width.min(end - out_index);
            }
            width
        };
        if width == 0 {
            return;
        }

        // Clip to [out_index, out_index + width); discard ranges entirely
        // outside of it.
        let data_end = first_index + data.len() as u64;
        if first_index >= out_index + width || data_end <= out_index {
            return;
        }
        let lo = first_index.max(out_index);
        let hi = data_end.min(out_index + width);
        let mut start = lo;
        let mut run = data[(lo - first_index) as usize..(hi - first_index) as usize].to_vec();

        // Merge backwards: a predecessor that overlaps or touches the new
        // run absorbs it.
        let prev = self.pending.range(..=start).next_back()
            .map(|(&prev_start, prev)| (prev_start, prev.len() as u64));
        if let Some((prev_start, prev_len)) = prev {
            let prev_end = prev_start + prev_len;
            if prev_end >= start + run.len() as u64 {
                // Nothing new in this range.
                return;
            }
            if prev_end >= start {
                let mut merged = self.pending.remove(&prev_start)
                    .expect("entry just found by range lookup");
                self.pending_bytes -= merged.len() as u64;
                merged.extend_from_slice(&run[(prev_end - start) as usize..]);
                start = prev_start;
                run = merged;
            }
        }

        // Merge forwards: successors covered by or touching the run are
        // drained into it.
        loop {
            let run_end = start + run.len() as u64;
            let next = match self.pending.range(start..).next() {
                Some((&next_start, next)) if next_start <= run_end => {
                    (next_start, next.len() as u64)
                }
                _ => break,
            };
            let (next_start, next_len) = next;
            let absorbed = self.pending.remove(&next_start)
                .expect("entry just found by range lookup");
            self.pending_bytes -= next_len;
            if next_start + next_len > run_end {
                run.extend_from_slice(&absorbed[(run_end - next_start) as usize..]);
            }
        }

        self.pending_bytes += run.len() as u64;
        self.pending.insert(start, run);

        // At most one pending run can have become deliverable.
        let front = self.pending.iter().next().map(|(&start, _)| start);
        if front == Some(out_index) {
            let run = self.pending.remove(&out_index)
                .expect("entry just found at the front");
            self.pending_bytes -= run.len() as u64;
            self.output.push(&run);
        }

        if self.end_index == Some(self.output.bytes_pushed()) {
            self.output.close();
        }
    }

    /// Total length of all buffered, not yet delivered runs.
    pub fn bytes_pending(&self) -> u64 {
        self.pending_bytes
    }

    /// The output stream.
    pub fn stream(&self) -> &ByteStream {
        &self.output
    }

    /// The output stream, mutably. The reading application drains it here.
    pub fn stream_mut(&mut self) -> &mut ByteStream {
        &mut self.output
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn reassembler(capacity: usize) -> Reassembler {
        Reassembler::new(ByteStream::new(capacity))
    }

    fn drain(r: &mut Reassembler) -> Vec<u8> {
        let bytes = r.stream().peek().to_vec();
        let len = bytes.len();
        r.stream_mut().pop(len);
        bytes
    }

    #[test]
    fn in_order_delivery() {
        let mut r = reassembler(16);
        r.insert(0, b"ab", false);
        assert_eq!(r.stream().peek(), b"ab");
        r.insert(2, b"cd", false);
        assert_eq!(r.stream().peek(), b"abcd");
        assert_eq!(r.bytes_pending(), 0);
        assert!(!r.stream().is_closed());
    }

    #[test]
    fn holes_are_held_back() {
        let mut r = reassembler(16);
        r.insert(1, b"b", false);
        assert_eq!(r.stream().bytes_pushed(), 0);
        assert_eq!(r.bytes_pending(), 1);
        r.insert(0, b"a", false);
        assert_eq!(r.stream().peek(), b"ab");
        assert_eq!(r.bytes_pending(), 0);
    }

    #[test]
    fn overlapping_ranges_merge() {
        let mut r = reassembler(16);
        r.insert(1, b"bc", false);
        r.insert(2, b"cde", false);
        assert_eq!(r.bytes_pending(), 4);
        r.insert(4, b"ef", false);
        assert_eq!(r.bytes_pending(), 5);
        r.insert(0, b"a", false);
        assert_eq!(r.stream().peek(), b"abcdef");
        assert_eq!(r.bytes_pending(), 0);
    }

    #[test]
    fn touching_ranges_merge() {
        let mut r = reassembler(16);
        r.insert(1, b"b", false);
        r.insert(2, b"c", false);
        r.insert(5, b"f", false);
        // "b" and "c" collapse into one run; "f" stays separate.
        assert_eq!(r.bytes_pending(), 3);
        r.insert(0, b"a", false);
        assert_eq!(r.stream().peek(), b"abc");
        assert_eq!(r.bytes_pending(), 1);
    }

    #[test]
    fn duplicates_are_absorbed() {
        let mut r = reassembler(16);
        r.insert(0, b"abcd", false);
        r.insert(0, b"abcd", false);
        r.insert(1, b"bc", false);
        assert_eq!(r.stream().peek(), b"abcd");
        assert_eq!(r.bytes_pending(), 0);
        assert_eq!(r.stream().bytes_pushed(), 4);
    }

    #[test]
    fn longer_run_wins_at_same_start() {
        let mut r = reassembler(16);
        r.insert(3, b"de", false);
        r.insert(3, b"defg", false);
        assert_eq!(r.bytes_pending(), 4);
        r.insert(3, b"d", false);
        assert_eq!(r.bytes_pending(), 4);
    }

    #[test]
    fn clipped_to_capacity() {
        let mut r = reassembler(2);
        r.insert(0, b"abc", false);
        // Only the first two bytes fit; the rest was never buffered.
        assert_eq!(r.stream().peek(), b"ab");
        assert_eq!(r.bytes_pending(), 0);
        r.insert(2, b"cd", false);
        assert_eq!(r.bytes_pending(), 0);

        // Draining slides the window open again.
        r.stream_mut().pop(2);
        r.insert(2, b"cd", false);
        assert_eq!(r.stream().peek(), b"cd");
    }

    #[test]
    fn pending_beyond_window_is_dropped() {
        let mut r = reassembler(4);
        r.insert(6, b"x", false);
        assert_eq!(r.bytes_pending(), 0);
        r.insert(2, b"cdef", false);
        // [2, 4) fits the window, the tail does not.
        assert_eq!(r.bytes_pending(), 2);
    }

    #[test]
    fn last_range_closes_stream() {
        let mut r = reassembler(16);
        r.insert(0, b"abc", true);
        assert_eq!(r.stream().peek(), b"abc");
        assert!(r.stream().is_closed());

        // Late data after completion is dropped silently.
        r.insert(3, b"d", false);
        assert_eq!(r.bytes_pending(), 0);
    }

    #[test]
    fn empty_last_range_closes_flushed_stream() {
        let mut r = reassembler(16);
        r.insert(0, b"ab", false);
        assert!(!r.stream().is_closed());
        r.insert(2, b"", true);
        assert!(r.stream().is_closed());
        assert_eq!(drain(&mut r), b"ab");
        assert!(r.stream().is_finished());
    }

    #[test]
    fn close_waits_for_missing_bytes() {
        let mut r = reassembler(16);
        r.insert(2, b"c", true);
        assert!(!r.stream().is_closed());
        r.insert(0, b"ab", false);
        assert_eq!(r.stream().peek(), b"abc");
        assert!(r.stream().is_closed());
    }

    #[test]
    fn all_permutations_of_three_chunks() {
        let chunks: [(u64, &[u8]); 3] = [(0, b"ab"), (2, b"cd"), (4, b"ef")];
        let orders: [[usize; 3]; 6] =
            [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        for order in orders.iter() {
            let mut r = reassembler(16);
            for &i in order {
                let (index, data) = chunks[i];
                r.insert(index, data, index == 4);
            }
            assert_eq!(r.stream().peek(), b"abcdef", "order {:?}", order);
            assert!(r.stream().is_closed());
            assert_eq!(r.bytes_pending(), 0);
        }
    }
}
