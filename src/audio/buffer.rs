//! Fixed-capacity circular (ring) buffer for `f32` audio samples.
//!
//! Used as the playback queue between the processing thread (the cpal input
//! callback, producer) and the output stream (the cpal output callback,
//! consumer).  When the buffer is full, new samples **overwrite** the oldest
//! data; if the consumer stalls, the freshest audio wins — stale protected
//! audio is worthless to the wearer.
//!
//! # Example
//!
//! ```rust
//! use sitesync::audio::RingBuffer;
//!
//! let mut buf = RingBuffer::new(4);
//! buf.push_slice(&[1.0, 2.0, 3.0]);
//!
//! let mut out = [0.0_f32; 4];
//! let popped = buf.pop_into(&mut out);
//! assert_eq!(popped, 3);
//! assert_eq!(out, [1.0, 2.0, 3.0, 0.0]); // shortfall zero-filled
//! ```

// ---------------------------------------------------------------------------
// RingBuffer
// ---------------------------------------------------------------------------

/// A fixed-capacity circular buffer.
///
/// Generic over `T: Copy + Default` so it can store any `Copy` scalar, though
/// the audio pipeline uses `RingBuffer<f32>` exclusively.
///
/// ## Overflow behaviour
///
/// When [`push_slice`](Self::push_slice) would exceed `capacity`, the oldest
/// samples are silently overwritten.  The buffer never allocates beyond its
/// initial capacity.
pub struct RingBuffer<T> {
    buf: Vec<T>,
    capacity: usize,
    /// Index of the *next* write position (wraps around `capacity`).
    write_pos: usize,
    /// Number of valid samples currently stored (≤ `capacity`).
    len: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Create a new ring buffer with the given `capacity`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be > 0");
        Self {
            buf: vec![T::default(); capacity],
            capacity,
            write_pos: 0,
            len: 0,
        }
    }

    /// Append `data` to the buffer.
    ///
    /// If the total number of samples exceeds `capacity`, the oldest samples
    /// are overwritten (circular behaviour).
    pub fn push_slice(&mut self, data: &[T]) {
        for &item in data {
            self.buf[self.write_pos] = item;
            self.write_pos = (self.write_pos + 1) % self.capacity;
            if self.len < self.capacity {
                self.len += 1;
            }
        }
    }

    /// Pop up to `out.len()` samples in chronological order into `out`.
    ///
    /// Returns the number of real samples written; any shortfall at the tail
    /// of `out` is filled with `T::default()` (silence for `f32`), so the
    /// output callback can hand `out` straight to the device on underrun.
    pub fn pop_into(&mut self, out: &mut [T]) -> usize {
        let available = self.len.min(out.len());

        // Oldest valid sample: `write_pos` walks forward as data is pushed,
        // so the read position trails it by `len`, modulo capacity.
        let read_pos = (self.write_pos + self.capacity - self.len) % self.capacity;

        for (i, slot) in out.iter_mut().enumerate().take(available) {
            *slot = self.buf[(read_pos + i) % self.capacity];
        }
        for slot in out.iter_mut().skip(available) {
            *slot = T::default();
        }

        self.len -= available;
        available
    }

    /// Discard all samples and reset the write position.
    pub fn clear(&mut self) {
        self.write_pos = 0;
        self.len = 0;
    }

    /// Number of samples currently stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when no samples are stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of samples the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
