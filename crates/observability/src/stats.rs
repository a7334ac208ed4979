//! Conversion run statistics.
//!
//! In-memory aggregation for the end-of-run summary, complementing the
//! `metrics` counters the pipeline crates emit.

use std::fmt;

/// Aggregated statistics for one conversion run.
#[derive(Debug, Clone, Default)]
pub struct ConversionStats {
    /// Fused samples written
    pub samples_written: u64,

    /// Synchronization windows closed (gap-triggered plus final)
    pub windows_flushed: u64,

    /// Lidar frames dropped for lack of a camera partner
    pub unpaired_dropped: u64,

    /// Total lidar points persisted
    pub total_points: u64,

    /// Per-sample point count statistics
    pub points_per_sample: RunningStats,

    /// Messages read from the recording
    pub messages_read: u64,

    /// Messages skipped on unconfigured topics
    pub messages_skipped: u64,
}

impl ConversionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sample(&mut self, point_count: u64) {
        self.samples_written += 1;
        self.total_points += point_count;
        self.points_per_sample.push(point_count as f64);
    }

    pub fn record_window(&mut self) {
        self.windows_flushed += 1;
    }

    pub fn summary(&self) -> RunStatsSummary {
        RunStatsSummary {
            samples_written: self.samples_written,
            windows_flushed: self.windows_flushed,
            unpaired_dropped: self.unpaired_dropped,
            total_points: self.total_points,
            points_per_sample: StatsSummary::from(&self.points_per_sample),
            messages_read: self.messages_read,
            messages_skipped: self.messages_skipped,
        }
    }
}

/// Printable run summary.
#[derive(Debug, Clone, Default)]
pub struct RunStatsSummary {
    pub samples_written: u64,
    pub windows_flushed: u64,
    pub unpaired_dropped: u64,
    pub total_points: u64,
    pub points_per_sample: StatsSummary,
    pub messages_read: u64,
    pub messages_skipped: u64,
}

impl fmt::Display for RunStatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Conversion Summary ===")?;
        writeln!(f, "Samples written: {}", self.samples_written)?;
        writeln!(f, "Windows flushed: {}", self.windows_flushed)?;
        writeln!(f, "Unpaired lidar frames dropped: {}", self.unpaired_dropped)?;
        writeln!(f, "Total lidar points: {}", self.total_points)?;
        writeln!(f, "Points per sample: {}", self.points_per_sample)?;
        writeln!(
            f,
            "Messages read: {} (skipped: {})",
            self.messages_read, self.messages_skipped
        )?;
        Ok(())
    }
}

/// Condensed view of a [`RunningStats`].
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford's algorithm).
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
