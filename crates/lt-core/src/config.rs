use std::path::Path;
use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TransferError};

/// Unit used when reporting the elapsed time of a timed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
    Minutes,
}

impl Default for TimeUnit {
    fn default() -> Self {
        Self::Minutes
    }
}

impl TimeUnit {
    pub fn convert(&self, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        match self {
            Self::Milliseconds => secs * 1000.0,
            Self::Seconds => secs,
            Self::Minutes => secs / 60.0,
        }
    }
}

/// Options for one label-transfer run.
///
/// `distance_metric` and `label_consensus` are kept as names so a config file
/// can carry values this build does not know; they are parsed when the run
/// starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Neighbors considered per query point.
    pub k: usize,
    /// Fan query rows out over all cores. Never changes the output.
    pub use_accelerator: bool,
    /// Query rows per batch; `None` processes the whole query set at once.
    pub batch_size: Option<usize>,
    pub distance_metric: String,
    pub label_consensus: String,
    /// Reject unrecognized consensus names instead of falling back to
    /// nearest-only.
    pub strict_consensus: bool,
    pub timed: bool,
    pub time_unit: TimeUnit,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            k: 1,
            use_accelerator: false,
            batch_size: None,
            distance_metric: "l2".into(),
            label_consensus: "majority_voting".into(),
            strict_consensus: false,
            timed: false,
            time_unit: TimeUnit::Minutes,
        }
    }
}

impl TransferConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let cfg = Self::from_json_str(&raw)?;
        tracing::debug!(path = %path.display(), k = cfg.k, "loaded transfer config");
        Ok(cfg)
    }

    /// Check the values that can be judged without seeing any data.
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(TransferError::InvalidK { k: 0, available: 0 });
        }
        if let Some(0) = self.batch_size {
            return Err(TransferError::InvalidBatchSize(0));
        }
        if self.distance_metric.trim().is_empty() {
            return Err(TransferError::Config("distance_metric must not be empty".into()));
        }
        Ok(())
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn with_metric(mut self, metric: &str) -> Self {
        self.distance_metric = metric.to_string();
        self
    }

    pub fn with_consensus(mut self, consensus: &str) -> Self {
        self.label_consensus = consensus.to_string();
        self
    }

    pub fn with_accelerator(mut self, enabled: bool) -> Self {
        self.use_accelerator = enabled;
        self
    }

    pub fn strict(mut self) -> Self {
        self.strict_consensus = true;
        self
    }

    pub fn timed(mut self, unit: TimeUnit) -> Self {
        self.timed = true;
        self.time_unit = unit;
        self
    }
}
