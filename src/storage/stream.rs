//! A bounded FIFO byte stream.

/// An in-order byte stream with a fixed capacity.
///
/// The writing side pushes bytes subject to the remaining capacity and
/// eventually closes the stream; the reading side peeks and pops. Capacity
/// counts bytes currently buffered, not bytes pushed over the stream's
/// lifetime: popping frees capacity for further pushes.
///
/// A stream can additionally carry an error flag, set when the peer signals
/// a connection reset. The flag is durable; it never clears.
#[derive(Debug)]
pub struct ByteStream {
    capacity: usize,
    buffer: Vec<u8>,
    pushed: u64,
    popped: u64,
    closed: bool,
    error: bool,
}

impl ByteStream {
    /// Create a stream buffering at most `capacity` bytes.
    pub fn new(capacity: usize) -> ByteStream {
        ByteStream {
            capacity,
            buffer: Vec::new(),
            pushed: 0,
            popped: 0,
            closed: false,
            error: false,
        }
    }

    /// Append bytes, silently truncating to the available capacity.
    ///
    /// Returns how many bytes were actually written.
    pub fn push(&mut self, data: &[u8]) -> usize {
        let len = data.len().min(self.available_capacity());
        self.buffer.extend_from_slice(&data[..len]);
        self.pushed += len as u64;
        len
    }

    /// Mark the writing side finished. Idempotent.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Whether the writing side has finished.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// How many further bytes `push` would accept.
    pub fn available_capacity(&self) -> usize {
        self.capacity - self.buffer.len()
    }

    /// Total bytes accepted over the stream's lifetime.
    pub fn bytes_pushed(&self) -> u64 {
        self.pushed
    }

    /// Total bytes handed out over the stream's lifetime.
    pub fn bytes_popped(&self) -> u64 {
        self.popped
    }

    /// Bytes currently buffered.
    pub fn bytes_buffered(&self) -> usize {
        self.buffer.len()
    }

    /// View the buffered bytes without consuming them.
    pub fn peek(&self) -> &[u8] {
        &self.buffer
    }

    /// Discard up to `len` buffered bytes from the front.
    pub fn pop(&mut self, len: usize) {
        let len = len.min(self.buffer.len());
        self.buffer.drain(..len);
        self.popped += len as u64;
    }

    /// Flag the stream as errored.
    pub fn set_error(&mut self) {
        self.error = true;
    }

    /// Whether the stream carries the durable error flag.
    pub fn has_error(&self) -> bool {
        self.error
    }

    /// Whether the stream is closed and fully drained.
    pub fn is_finished(&self) -> bool {
        self.closed && self.buffer.is_empty()
    }
}
