//! Bounded transform interpolation cache.
//!
//! Keeps a FIFO-bounded history of `{timestamp, matrix}` samples per
//! frame pair and answers point-in-time queries by interpolating between
//! the closest surrounding samples. The cache outlives synchronization
//! windows; transform history is never flushed.

use std::collections::{BTreeMap, HashMap, VecDeque};

use codec::{interpolate_matrix, transform_to_matrix};
use contracts::{Matrix4, Transform};

/// One cached transform sample.
#[derive(Debug, Clone, Copy)]
struct TransformSample {
    timestamp: f64,
    matrix: Matrix4,
}

/// Per-frame-pair bounded transform history.
#[derive(Debug)]
pub struct TransformCache {
    capacity: usize,
    entries: HashMap<String, VecDeque<TransformSample>>,
}

impl TransformCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
        }
    }

    /// Record a transform, evicting the oldest sample for its frame pair
    /// when the per-key history is full.
    pub fn ingest(&mut self, transform: &Transform) {
        self.insert(
            transform.key(),
            transform.timestamp,
            transform_to_matrix(transform),
        );
    }

    /// Record an already-converted matrix under an explicit key.
    pub fn insert(&mut self, key: String, timestamp: f64, matrix: Matrix4) {
        let history = self.entries.entry(key).or_default();
        if history.len() == self.capacity {
            history.pop_front();
        }
        history.push_back(TransformSample { timestamp, matrix });
    }

    /// Interpolated matrix for `key` at time `t`.
    ///
    /// Exact timestamp hits return the stored matrix. Queries between two
    /// samples interpolate; queries outside the history clamp to the
    /// nearest sample. Unknown keys and empty histories return None.
    pub fn query(&self, key: &str, t: f64) -> Option<Matrix4> {
        let history = self.entries.get(key)?;
        if history.is_empty() {
            return None;
        }

        let mut before: Option<&TransformSample> = None;
        let mut after: Option<&TransformSample> = None;
        for sample in history {
            if sample.timestamp == t {
                return Some(sample.matrix);
            }
            if sample.timestamp < t {
                if before.map_or(true, |b| sample.timestamp > b.timestamp) {
                    before = Some(sample);
                }
            } else if after.map_or(true, |a| sample.timestamp < a.timestamp) {
                after = Some(sample);
            }
        }

        match (before, after) {
            (Some(b), Some(a)) => {
                let alpha = (t - b.timestamp) / (a.timestamp - b.timestamp);
                Some(interpolate_matrix(&b.matrix, &a.matrix, alpha))
            }
            (Some(b), None) => Some(b.matrix),
            (None, Some(a)) => Some(a.matrix),
            (None, None) => None,
        }
    }

    /// Interpolated matrices for every known frame pair at time `t`.
    pub fn query_all(&self, t: f64) -> BTreeMap<String, Matrix4> {
        let mut out = BTreeMap::new();
        for key in self.entries.keys() {
            if let Some(matrix) = self.query(key, t) {
                out.insert(key.clone(), matrix);
            }
        }
        out
    }

    pub fn len(&self, key: &str) -> usize {
        self.entries.get(key).map(|h| h.len()).unwrap_or(0)
    }

    pub fn key_count(&self) -> usize {
        self.entries.len()
    }
}
