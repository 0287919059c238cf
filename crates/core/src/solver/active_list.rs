//! Fixed-capacity queue of ignited pixels
//!
//! The list stores pixel coordinates in two pre-allocated parallel vectors
//! and tracks a half-open active window `[start, end)`:
//!
//! ```text
//!  0 ........ start ........ end ........ capacity
//!  | processed  |  pending    |   unused    |
//! ```
//!
//! Entries are only ever appended and the list is never compacted. A pixel
//! enters the list at most once per run (pixels with a non-zero generation
//! stamp are always skipped), so a capacity of `height * width` is an upper
//! bound and the hot burn loop never reallocates.

use crate::error::{FireSpreadError, Result};
use crate::grid::Pixel;
use tracing::error;

/// Append-only coordinate queue with an active window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveFireList {
    ys: Vec<usize>,
    xs: Vec<usize>,
    start: usize,
    end: usize,
}

impl ActiveFireList {
    /// Create an empty list with a fixed capacity
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            ys: vec![0; capacity],
            xs: vec![0; capacity],
            start: 0,
            end: 0,
        }
    }

    /// Create a list able to hold every pixel of a `height x width` grid
    #[must_use]
    pub fn with_shape(height: usize, width: usize) -> Self {
        Self::new(height * width)
    }

    /// Append a pixel at `end`.
    ///
    /// The caller is responsible for flammability and burn-state checks.
    ///
    /// # Errors
    ///
    /// Returns [`FireSpreadError::CapacityExhausted`] if the list is full.
    pub fn enqueue(&mut self, pixel: Pixel) -> Result<()> {
        if self.end >= self.capacity() {
            error!(
                "Active fire list full ({} entries) while enqueueing ({}, {})",
                self.capacity(),
                pixel.y,
                pixel.x
            );
            return Err(FireSpreadError::CapacityExhausted {
                capacity: self.capacity(),
            });
        }
        self.ys[self.end] = pixel.y;
        self.xs[self.end] = pixel.x;
        self.end += 1;
        Ok(())
    }

    /// Mark the pixel at `start` as fully processed.
    ///
    /// # Errors
    ///
    /// Returns [`FireSpreadError::EmptyActiveList`] if nothing is pending.
    pub fn advance(&mut self) -> Result<()> {
        if self.is_empty() {
            return Err(FireSpreadError::EmptyActiveList);
        }
        self.start += 1;
        Ok(())
    }

    /// True when no pixel is pending
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Pixel at the head of the active window
    #[must_use]
    pub fn current(&self) -> Option<Pixel> {
        (!self.is_empty()).then(|| Pixel::new(self.ys[self.start], self.xs[self.start]))
    }

    /// Entry at index `i` of the list, if it has been written
    #[must_use]
    pub fn get(&self, i: usize) -> Option<Pixel> {
        (i < self.end).then(|| Pixel::new(self.ys[i], self.xs[i]))
    }

    /// Index of the first pending entry
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// One past the last written entry
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Fixed capacity
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.ys.len()
    }

    /// Number of pending entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Pending pixels, `[start, end)`
    pub fn pending(&self) -> impl Iterator<Item = Pixel> + '_ {
        (self.start..self.end).map(|i| Pixel::new(self.ys[i], self.xs[i]))
    }

    /// Every pixel ever enqueued since the last clear, `[0, end)`
    pub fn ignited(&self) -> impl Iterator<Item = Pixel> + '_ {
        (0..self.end).map(|i| Pixel::new(self.ys[i], self.xs[i]))
    }

    /// Reset both cursors to zero
    pub fn clear(&mut self) {
        self.start = 0;
        self.end = 0;
        self.ys.fill(0);
        self.xs.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_and_advance() {
        let mut list = ActiveFireList::new(3);
        assert!(list.is_empty());
        assert_eq!(list.current(), None);

        list.enqueue(Pixel::new(1, 2)).unwrap();
        list.enqueue(Pixel::new(0, 4)).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.current(), Some(Pixel::new(1, 2)));

        list.advance().unwrap();
        assert_eq!(list.start(), 1);
        assert_eq!(list.end(), 2);
        assert_eq!(list.current(), Some(Pixel::new(0, 4)));

        list.advance().unwrap();
        assert!(list.is_empty());
        assert_eq!(list.ignited().count(), 2);
    }

    #[test]
    fn test_advance_on_empty_fails() {
        let mut list = ActiveFireList::new(2);
        assert_eq!(list.advance(), Err(FireSpreadError::EmptyActiveList));
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut list = ActiveFireList::with_shape(1, 2);
        list.enqueue(Pixel::new(0, 0)).unwrap();
        list.enqueue(Pixel::new(0, 1)).unwrap();
        assert_eq!(
            list.enqueue(Pixel::new(0, 0)),
            Err(FireSpreadError::CapacityExhausted { capacity: 2 })
        );
        // Advancing never frees capacity
        list.advance().unwrap();
        assert!(list.enqueue(Pixel::new(0, 1)).is_err());
    }

    #[test]
    fn test_pending_window() {
        let mut list = ActiveFireList::new(4);
        for x in 0..4 {
            list.enqueue(Pixel::new(0, x)).unwrap();
        }
        list.advance().unwrap();
        let pending: Vec<_> = list.pending().collect();
        assert_eq!(
            pending,
            vec![Pixel::new(0, 1), Pixel::new(0, 2), Pixel::new(0, 3)]
        );
        assert_eq!(list.get(0), Some(Pixel::new(0, 0)));
        assert_eq!(list.get(4), None);
    }

    #[test]
    fn test_clear() {
        let mut list = ActiveFireList::new(2);
        list.enqueue(Pixel::new(1, 1)).unwrap();
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.end(), 0);
        assert_eq!(list.capacity(), 2);
    }
}
