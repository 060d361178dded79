//! Consensus rules that reduce a row of neighbors to a single label.
//!
//! Tie-breaks are deterministic: among labels sharing the best count (or
//! weight) the one whose first neighbor is closest to the query wins.

use std::collections::HashMap;
use std::fmt;
use std::ops::AddAssign;

use lt_core::{Label, Result, TransferError};
use lt_vectordb::NeighborResult;

/// Added to every distance before inverting it into a vote weight.
pub const WEIGHT_EPSILON: f64 = 1e-6;

/// How neighbor labels are combined into one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusStrategy {
    /// Label of the single closest neighbor.
    NearestOnly,
    /// Most frequent label among the k neighbors.
    MajorityVoting,
    /// Label with the largest sum of `1 / (distance + WEIGHT_EPSILON)`.
    WeightedVoting,
    /// Label of the nearest per-label centroid; ignores neighbors entirely.
    CentroidBased,
}

impl Default for ConsensusStrategy {
    fn default() -> Self {
        Self::MajorityVoting
    }
}

impl fmt::Display for ConsensusStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NearestOnly => write!(f, "nearest_only"),
            Self::MajorityVoting => write!(f, "majority_voting"),
            Self::WeightedVoting => write!(f, "weighted_voting"),
            Self::CentroidBased => write!(f, "centroid_based"),
        }
    }
}

impl ConsensusStrategy {
    fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "nearest_only" | "nearest" => Some(Self::NearestOnly),
            "majority_voting" | "majority" => Some(Self::MajorityVoting),
            "weighted_voting" | "weighted" => Some(Self::WeightedVoting),
            "centroid_based" | "centroid" => Some(Self::CentroidBased),
            _ => None,
        }
    }

    /// Parse a strategy name.
    ///
    /// Unrecognized names fall back to `NearestOnly` unless `strict` is set,
    /// in which case they are rejected with `UnknownConsensusStrategy`.
    pub fn parse(name: &str, strict: bool) -> Result<Self> {
        match Self::from_name(name) {
            Some(strategy) => Ok(strategy),
            None if strict => Err(TransferError::UnknownConsensusStrategy(name.to_string())),
            None => {
                tracing::warn!(strategy = name, "unrecognized consensus strategy, using nearest_only");
                Ok(Self::NearestOnly)
            }
        }
    }

    /// Strategy actually applied for a given `k`. Voting over one neighbor
    /// is the nearest neighbor; centroid resolution does not depend on `k`.
    pub fn for_k(self, k: usize) -> Self {
        match self {
            Self::MajorityVoting | Self::WeightedVoting if k <= 1 => Self::NearestOnly,
            other => other,
        }
    }

    pub fn needs_neighbors(&self) -> bool {
        !matches!(self, Self::CentroidBased)
    }
}

/// Per-row accumulator that remembers the order labels were first seen in.
struct Tally<'a, W> {
    slots: HashMap<&'a Label, usize>,
    entries: Vec<(&'a Label, W)>,
}

impl<'a, W: Copy + Default + PartialOrd + AddAssign> Tally<'a, W> {
    fn with_capacity(k: usize) -> Self {
        Self { slots: HashMap::with_capacity(k), entries: Vec::with_capacity(k) }
    }

    fn add(&mut self, label: &'a Label, weight: W) {
        let slot = *self.slots.entry(label).or_insert_with(|| {
            self.entries.push((label, W::default()));
            self.entries.len() - 1
        });
        self.entries[slot].1 += weight;
    }

    /// Highest total; the earliest-seen label wins ties.
    fn leader(&self) -> Option<&'a Label> {
        let mut best: Option<(&'a Label, W)> = None;
        for &(label, total) in &self.entries {
            let better = match best {
                Some((_, top)) => total > top,
                None => true,
            };
            if better {
                best = Some((label, total));
            }
        }
        best.map(|(label, _)| label)
    }
}

fn label_at(labels: &[Label], pos: usize) -> Result<&Label> {
    labels.get(pos).ok_or_else(|| {
        TransferError::Config(format!(
            "neighbor position {pos} out of range for {} reference labels",
            labels.len()
        ))
    })
}

fn require_neighbors(neighbors: &NeighborResult, labels: &[Label]) -> Result<()> {
    if neighbors.k() == 0 {
        return Err(TransferError::InvalidK { k: 0, available: labels.len() });
    }
    Ok(())
}

/// Label of the closest neighbor of every query row.
pub fn nearest_only(neighbors: &NeighborResult, labels: &[Label]) -> Result<Vec<Label>> {
    require_neighbors(neighbors, labels)?;
    (0..neighbors.len())
        .map(|q| label_at(labels, neighbors.indices(q)[0]).cloned())
        .collect()
}

/// Most frequent neighbor label per query row.
pub fn majority_vote(neighbors: &NeighborResult, labels: &[Label]) -> Result<Vec<Label>> {
    require_neighbors(neighbors, labels)?;
    let mut out = Vec::with_capacity(neighbors.len());
    for q in 0..neighbors.len() {
        let mut tally: Tally<'_, usize> = Tally::with_capacity(neighbors.k());
        for &pos in neighbors.indices(q) {
            tally.add(label_at(labels, pos)?, 1);
        }
        if let Some(label) = tally.leader() {
            out.push(label.clone());
        }
    }
    Ok(out)
}

/// Inverse-distance weighted vote per query row.
pub fn weighted_vote(neighbors: &NeighborResult, labels: &[Label]) -> Result<Vec<Label>> {
    require_neighbors(neighbors, labels)?;
    let mut out = Vec::with_capacity(neighbors.len());
    for q in 0..neighbors.len() {
        let mut tally: Tally<'_, f64> = Tally::with_capacity(neighbors.k());
        for (pos, dist) in neighbors.row(q) {
            tally.add(label_at(labels, pos)?, 1.0 / (dist as f64 + WEIGHT_EPSILON));
        }
        if let Some(label) = tally.leader() {
            out.push(label.clone());
        }
    }
    Ok(out)
}

/// Resolve a neighbor table with one of the neighbor-based strategies.
/// `CentroidBased` needs the raw query rows and is rejected here.
pub fn resolve(strategy: ConsensusStrategy, neighbors: &NeighborResult, labels: &[Label]) -> Result<Vec<Label>> {
    match strategy {
        ConsensusStrategy::NearestOnly => nearest_only(neighbors, labels),
        ConsensusStrategy::MajorityVoting => majority_vote(neighbors, labels),
        ConsensusStrategy::WeightedVoting => weighted_vote(neighbors, labels),
        ConsensusStrategy::CentroidBased => Err(TransferError::Config(
            "centroid_based resolution needs query embeddings, not neighbors".into(),
        )),
    }
}
