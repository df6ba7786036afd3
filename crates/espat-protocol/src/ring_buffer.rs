//! Fixed-capacity byte ring used to accumulate module replies.
//!
//! The ring holds `capacity - 1` bytes: one slot always stays empty so that
//! `head == tail` means empty and `tail + 1 == head` means full. Indices wrap
//! with a bitmask, which is why the capacity must be a power of two.
//!
//! # Wraparound
//!
//! Every bulk operation works on at most two contiguous segments of the
//! backing storage:
//!
//! ```text
//!  capacity = 8, head = 6, tail = 3, used = 5
//!
//!  index:  0   1   2   3   4   5   6   7
//!        [ c | d | e |   |   |   | a | b ]
//!          └─ second ─┘  tail      └first┘
//!                                  head
//! ```
//!
//! A span that does not cross the physical end is one copy; otherwise it is
//! the run up to the end followed by the run from index zero.
//!
//! # Example
//!
//! ```
//! use espat_protocol::RingBuffer;
//!
//! let mut ring = RingBuffer::new(8).unwrap();
//! ring.put_slice(b"\r\nOK\r\n").unwrap();
//!
//! assert!(ring.ends_with(b"OK\r\n"));
//! assert_eq!(ring.peek_from_end(2).unwrap(), b"\r\n");
//! assert_eq!(ring.used(), 6);
//! ```

use espat_core::{AtError, Result};
use std::fmt;

/// Power-of-two byte ring with wraparound-aware bulk copies.
#[derive(Clone)]
pub struct RingBuffer {
    data: Box<[u8]>,
    head: usize,
    tail: usize,
    mask: usize,
}

impl RingBuffer {
    /// Create a ring with `capacity` slots.
    ///
    /// # Errors
    ///
    /// Returns `AtError::InvalidCapacity` unless `capacity` is a power of two
    /// and at least 2.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity < 2 || !capacity.is_power_of_two() {
            return Err(AtError::invalid_capacity(capacity));
        }
        Ok(Self {
            data: vec![0; capacity].into_boxed_slice(),
            head: 0,
            tail: 0,
            mask: capacity - 1,
        })
    }

    /// Number of slots, including the one kept empty.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Reset both indices. Storage is left as is.
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        ((self.tail + 1) & self.mask) == self.head
    }

    /// Bytes currently stored.
    #[must_use]
    pub fn used(&self) -> usize {
        if self.head > self.tail {
            self.capacity() - self.head + self.tail
        } else {
            self.tail - self.head
        }
    }

    /// Bytes that can still be stored.
    #[must_use]
    pub fn free(&self) -> usize {
        self.capacity() - 1 - self.used()
    }

    /// Append one byte.
    ///
    /// # Errors
    ///
    /// Returns `AtError::BufferFull` if no slot is free.
    pub fn put(&mut self, byte: u8) -> Result<()> {
        if self.is_full() {
            return Err(AtError::BufferFull {
                capacity: self.capacity(),
            });
        }
        self.data[self.tail] = byte;
        self.tail = (self.tail + 1) & self.mask;
        Ok(())
    }

    /// Append one byte, dropping the oldest byte first if the ring is full.
    ///
    /// Returns `true` if a byte was dropped.
    pub fn put_evicting(&mut self, byte: u8) -> bool {
        let evicted = self.is_full();
        if evicted {
            self.head = (self.head + 1) & self.mask;
        }
        self.data[self.tail] = byte;
        self.tail = (self.tail + 1) & self.mask;
        evicted
    }

    /// Remove and return the oldest byte.
    ///
    /// # Errors
    ///
    /// Returns `AtError::BufferEmpty` if nothing is stored.
    pub fn get(&mut self) -> Result<u8> {
        if self.is_empty() {
            return Err(AtError::BufferEmpty);
        }
        let byte = self.data[self.head];
        self.head = (self.head + 1) & self.mask;
        Ok(byte)
    }

    /// Append all of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns `AtError::InsufficientData` if `bytes` does not fit; nothing
    /// is written in that case.
    pub fn put_slice(&mut self, bytes: &[u8]) -> Result<()> {
        let n = bytes.len();
        if n > self.free() {
            return Err(AtError::insufficient(n, self.free()));
        }
        let cap = self.capacity();
        if self.tail + n <= cap {
            self.data[self.tail..self.tail + n].copy_from_slice(bytes);
        } else {
            let to_end = cap - self.tail;
            self.data[self.tail..].copy_from_slice(&bytes[..to_end]);
            self.data[..n - to_end].copy_from_slice(&bytes[to_end..]);
        }
        self.tail = (self.tail + n) & self.mask;
        Ok(())
    }

    /// Copy the oldest `dest.len()` bytes into `dest` without removing them.
    ///
    /// # Errors
    ///
    /// Returns `AtError::InsufficientData` if fewer bytes are stored.
    pub fn peek_into(&self, dest: &mut [u8]) -> Result<()> {
        let (first, second) = self.head_segments(dest.len())?;
        dest[..first.len()].copy_from_slice(first);
        dest[first.len()..].copy_from_slice(second);
        Ok(())
    }

    /// Remove the oldest `dest.len()` bytes into `dest`.
    ///
    /// # Errors
    ///
    /// Returns `AtError::InsufficientData` if fewer bytes are stored.
    pub fn get_into(&mut self, dest: &mut [u8]) -> Result<()> {
        self.peek_into(dest)?;
        self.head = (self.head + dest.len()) & self.mask;
        Ok(())
    }

    /// Copy the newest `dest.len()` bytes into `dest` without removing them.
    ///
    /// # Errors
    ///
    /// Returns `AtError::InsufficientData` if fewer bytes are stored.
    pub fn peek_from_end_into(&self, dest: &mut [u8]) -> Result<()> {
        let (first, second) = self.tail_segments(dest.len())?;
        dest[..first.len()].copy_from_slice(first);
        dest[first.len()..].copy_from_slice(second);
        Ok(())
    }

    /// The oldest `count` bytes, leaving them stored.
    pub fn peek_many(&self, count: usize) -> Result<Vec<u8>> {
        let mut out = vec![0; count];
        self.peek_into(&mut out)?;
        Ok(out)
    }

    /// Remove and return the oldest `count` bytes.
    pub fn get_many(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut out = vec![0; count];
        self.get_into(&mut out)?;
        Ok(out)
    }

    /// The newest `count` bytes, leaving them stored.
    pub fn peek_from_end(&self, count: usize) -> Result<Vec<u8>> {
        let mut out = vec![0; count];
        self.peek_from_end_into(&mut out)?;
        Ok(out)
    }

    /// Drop the oldest `count` bytes without copying them.
    ///
    /// # Errors
    ///
    /// Returns `AtError::InsufficientData` if fewer bytes are stored.
    pub fn discard(&mut self, count: usize) -> Result<()> {
        let used = self.used();
        if count > used {
            return Err(AtError::insufficient(count, used));
        }
        self.head = (self.head + count) & self.mask;
        Ok(())
    }

    /// True iff the newest bytes equal `candidate` exactly.
    ///
    /// A ring holding fewer bytes than `candidate` never matches.
    #[must_use]
    pub fn ends_with(&self, candidate: &[u8]) -> bool {
        match self.tail_segments(candidate.len()) {
            Ok((first, second)) => {
                let (a, b) = candidate.split_at(first.len());
                first == a && second == b
            }
            Err(_) => false,
        }
    }

    /// Append the oldest `count` bytes of `self` to `dest`, leaving `self`
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns `AtError::InsufficientData` if `self` holds fewer than `count`
    /// bytes or `dest` has less than `count` free; nothing is copied then.
    pub fn copy_to(&self, dest: &mut RingBuffer, count: usize) -> Result<()> {
        let (first, second) = self.head_segments(count)?;
        if count > dest.free() {
            return Err(AtError::insufficient(count, dest.free()));
        }
        dest.put_slice(first)?;
        dest.put_slice(second)
    }

    /// The whole content as up to two slices, oldest first.
    #[must_use]
    pub fn as_slices(&self) -> (&[u8], &[u8]) {
        self.head_segments(self.used()).unwrap_or((&[], &[]))
    }

    /// `count` bytes starting at `head`, split at the physical end.
    fn head_segments(&self, count: usize) -> Result<(&[u8], &[u8])> {
        let used = self.used();
        if count > used {
            return Err(AtError::insufficient(count, used));
        }
        let cap = self.capacity();
        if self.head + count <= cap {
            Ok((&self.data[self.head..self.head + count], &[]))
        } else {
            let to_end = cap - self.head;
            Ok((&self.data[self.head..], &self.data[..count - to_end]))
        }
    }

    /// `count` bytes ending at `tail`, split at the physical end.
    fn tail_segments(&self, count: usize) -> Result<(&[u8], &[u8])> {
        let used = self.used();
        if count > used {
            return Err(AtError::insufficient(count, used));
        }
        if count <= self.tail {
            Ok((&self.data[self.tail - count..self.tail], &[]))
        } else {
            let wrapped = count - self.tail;
            let cap = self.capacity();
            Ok((&self.data[cap - wrapped..], &self.data[..self.tail]))
        }
    }
}

impl fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("head", &self.head)
            .field("tail", &self.tail)
            .field("used", &self.used())
            .finish()
    }
}
