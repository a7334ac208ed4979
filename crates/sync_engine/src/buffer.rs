//! Per-topic chunk buffer.
//!
//! Frames accumulate in arrival order between flushes. There is no
//! capacity bound, a synchronization window is emptied wholesale when a
//! gap is detected or the stream ends.

/// Timestamped frames collected within the current synchronization window.
#[derive(Debug)]
pub struct ChunkBuffer<T> {
    entries: Vec<(f64, T)>,
}

impl<T> Default for ChunkBuffer<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> ChunkBuffer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, timestamp: f64, item: T) {
        self.entries.push((timestamp, item));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Arrival-order view of the buffered frames.
    pub fn iter(&self) -> impl Iterator<Item = &(f64, T)> {
        self.entries.iter()
    }

    /// Empty the buffer, yielding the frames in arrival order.
    pub fn drain(&mut self) -> Vec<(f64, T)> {
        std::mem::take(&mut self.entries)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
