//! Distance metrics for nearest-neighbor search.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use lt_core::{Result, TransferError};

/// Supported distance metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Squared Euclidean distance. Smaller is closer.
    L2,
    /// Inner product. Larger is closer.
    Ip,
}

impl Default for DistanceMetric {
    fn default() -> Self {
        Self::L2
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::L2 => write!(f, "l2"),
            Self::Ip => write!(f, "ip"),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl DistanceMetric {
    /// Parse a metric name. Unknown names are an error, never a default.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "l2" | "euclidean" | "squared_euclidean" => Ok(Self::L2),
            "ip" | "dot" | "inner_product" => Ok(Self::Ip),
            _ => Err(TransferError::UnknownMetric(s.to_string())),
        }
    }

    /// Raw metric value between two vectors, as reported in a `NeighborResult`.
    #[inline]
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::L2 => l2_squared(a, b),
            Self::Ip => inner_product(a, b),
        }
    }

    /// Map a raw value onto a key where smaller always means closer.
    #[inline]
    pub fn rank_key(&self, value: f32) -> f32 {
        match self {
            Self::L2 => value,
            Self::Ip => -value,
        }
    }

    /// Order two raw values closest-first.
    pub fn closer(&self, a: f32, b: f32) -> Ordering {
        self.rank_key(a).total_cmp(&self.rank_key(b))
    }
}

/// Compute inner product (dot product) of two vectors.
#[inline]
pub fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Compute L2 squared distance.
#[inline]
pub fn l2_squared(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| {
        let d = x - y;
        d * d
    }).sum()
}

/// Euclidean (L2) distance.
#[inline]
pub fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    l2_squared(a, b).sqrt()
}
