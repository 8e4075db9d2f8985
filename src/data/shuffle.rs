// ============================================================
// Layer 4 — Windowed Shuffle
// ============================================================
// Approximate shuffle through a bounded buffer:
//
//   1. Fill the buffer with up to `buffer_size` elements
//   2. Pick a uniformly random slot and emit its element
//   3. Refill that slot with the next input element
//
// Elements further apart than the window are not guaranteed to
// mix, and an element at input position p is never emitted before
// output position p - (buffer_size - 1). With buffer_size = 1 the
// output order equals the input order.
//
// Reference: rand crate documentation (Rng::gen_range)

use rand::Rng;

pub struct WindowedShuffle<I: Iterator, R> {
    source: I,
    buffer: Vec<I::Item>,
    capacity: usize,
    rng: R,
}

impl<I: Iterator, R: Rng> WindowedShuffle<I, R> {
    /// # Panics
    /// Panics if `buffer_size` is 0.
    pub fn new(source: I, buffer_size: usize, rng: R) -> Self {
        assert!(buffer_size > 0, "buffer_size must be at least 1");
        Self {
            source,
            buffer: Vec::with_capacity(buffer_size),
            capacity: buffer_size,
            rng,
        }
    }
}

impl<I: Iterator, R: Rng> Iterator for WindowedShuffle<I, R> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        while self.buffer.len() < self.capacity {
            match self.source.next() {
                Some(item) => self.buffer.push(item),
                None => break,
            }
        }

        if self.buffer.is_empty() {
            return None;
        }

        let slot = self.rng.gen_range(0..self.buffer.len());
        match self.source.next() {
            Some(incoming) => Some(std::mem::replace(&mut self.buffer[slot], incoming)),
            // Input drained: shrink the buffer
            None => Some(self.buffer.swap_remove(slot)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lo, hi) = self.source.size_hint();
        let buffered = self.buffer.len();
        (lo + buffered, hi.map(|h| h + buffered))
    }
}
