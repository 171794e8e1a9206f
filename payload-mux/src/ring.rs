//! The Fabric overflow ring buffer (spec §4.6.5): a lazily-allocated
//! byte queue sized `max_stripe + cipher_output_buffer_size`, used to
//! absorb a final stripe's cipher-finalization expansion and feed it
//! out over however many subsequent operations it takes to drain.
//!
//! None of this workspace's C1 stream-cipher engines expand their
//! output on finalization (`cipher_output_buffer_size` is always `0`
//! here), so in practice this buffer never holds more than one stripe's
//! worth of bytes at a time; it is kept for structural fidelity with
//! the spec and because a future expanding AEAD-style engine would need
//! it.

use alloc::vec::Vec;

/// A FIFO byte buffer over a fixed-capacity backing `Vec`, constructed
/// only when a Fabric item reaches its final stripe.
pub struct RingBuffer {
    buf: Vec<u8>,
    head: usize,
}

impl RingBuffer {
    /// Allocates an empty buffer with `capacity` bytes of headroom.
    pub fn with_capacity(capacity: usize) -> Self {
        RingBuffer {
            buf: Vec::with_capacity(capacity),
            head: 0,
        }
    }

    /// Appends `bytes` to the tail of the queue.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes currently queued and not yet drained.
    pub fn len(&self) -> usize {
        self.buf.len() - self.head
    }

    /// `true` when nothing remains to drain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drains up to `out.len()` bytes into `out`, returning how many
    /// were written. Compacts the backing `Vec` once fully drained.
    pub fn drain_into(&mut self, out: &mut [u8]) -> usize {
        let available = self.len();
        let n = available.min(out.len());
        out[..n].copy_from_slice(&self.buf[self.head..self.head + n]);
        self.head += n;
        if self.head == self.buf.len() {
            self.buf.clear();
            self.head = 0;
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_drain_in_pieces() {
        let mut ring = RingBuffer::with_capacity(16);
        ring.push(&[1, 2, 3, 4, 5]);
        assert_eq!(ring.len(), 5);

        let mut out = [0u8; 3];
        let n = ring.drain_into(&mut out);
        assert_eq!(n, 3);
        assert_eq!(out, [1, 2, 3]);
        assert_eq!(ring.len(), 2);

        let mut out2 = [0u8; 3];
        let n2 = ring.drain_into(&mut out2);
        assert_eq!(n2, 2);
        assert_eq!(&out2[..2], &[4, 5]);
        assert!(ring.is_empty());
    }

    #[test]
    fn drain_on_empty_is_a_no_op() {
        let mut ring = RingBuffer::with_capacity(4);
        let mut out = [0u8; 4];
        assert_eq!(ring.drain_into(&mut out), 0);
    }
}
