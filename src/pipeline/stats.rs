//! Per-request latency statistics.

use indexmap::IndexMap;
use std::fmt;
use std::time::Duration;

/// Latency samples for one request, in seconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    samples: Vec<f64>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, elapsed: Duration) {
        self.samples.push(elapsed.as_secs_f64());
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    /// Median sample; the mean of the two middle samples for an even count.
    pub fn median(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted = self.samples.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        } else {
            Some(sorted[mid])
        }
    }

    pub fn min(&self) -> Option<f64> {
        self.samples.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.samples.iter().copied().reduce(f64::max)
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.mean(), self.median(), self.min(), self.max()) {
            (Some(mean), Some(median), Some(min), Some(max)) => write!(
                f,
                "Average: {:.3}s  Median: {:.3}s  Min: {:.3}s  Max: {:.3}s  ({} samples)",
                mean,
                median,
                min,
                max,
                self.count()
            ),
            _ => write!(f, "no samples"),
        }
    }
}

/// Collects [`Stats`] per request name across runs.
///
/// Owned by the reporter that feeds it; there is no process-wide recorder.
#[derive(Debug, Clone, Default)]
pub struct StatsRecorder {
    stats: IndexMap<String, Stats>,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &str, elapsed: Duration) {
        self.stats.entry(name.to_string()).or_default().add(elapsed);
    }

    pub fn get(&self, name: &str) -> Option<&Stats> {
        self.stats.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Stats)> {
        self.stats.iter().map(|(name, stats)| (name.as_str(), stats))
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

impl fmt::Display for StatsRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, stats) in &self.stats {
            writeln!(f, "  {}: {}", name, stats)?;
        }
        Ok(())
    }
}
