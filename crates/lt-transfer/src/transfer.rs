//! Batch label-transfer orchestration.

use std::time::Instant;

use lt_core::{EmbeddingMatrix, Label, Result, TransferConfig, TransferError};
use lt_vectordb::{DistanceMetric, ExecutionBackend, FlatIndex, VectorIndex};

use crate::centroid::LazyCentroids;
use crate::consensus::{self, ConsensusStrategy};

/// Labels for every query row, in query order.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferOutcome {
    pub labels: Vec<Label>,
    /// Wall-clock time for index build plus all batches, in the configured
    /// unit. Only set for timed runs.
    pub elapsed: Option<f64>,
}

impl TransferOutcome {
    pub fn into_labels(self) -> Vec<Label> {
        self.labels
    }
}

/// Runs label transfer with a fixed configuration.
///
/// Holds no state between runs; every `run` builds its own index and
/// centroid cache and either returns the full label sequence or an error.
#[derive(Debug, Clone)]
pub struct LabelTransfer {
    config: TransferConfig,
    metric: DistanceMetric,
    strategy: ConsensusStrategy,
}

impl LabelTransfer {
    pub fn new(config: TransferConfig) -> Result<Self> {
        config.validate()?;
        let metric = DistanceMetric::parse(&config.distance_metric)?;
        let strategy = ConsensusStrategy::parse(&config.label_consensus, config.strict_consensus)?;
        Ok(Self { config, metric, strategy })
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Strategy applied to each batch once `k` is taken into account.
    pub fn strategy(&self) -> ConsensusStrategy {
        self.strategy.for_k(self.config.k)
    }

    fn backend(&self) -> ExecutionBackend {
        ExecutionBackend::from_accelerator_flag(self.config.use_accelerator)
    }

    /// Build an exact index over `reference` and label every row of `query`.
    pub fn run(
        &self,
        reference: &EmbeddingMatrix,
        labels: &[Label],
        query: &EmbeddingMatrix,
    ) -> Result<TransferOutcome> {
        let started = Instant::now();
        check_labels(reference.len(), labels)?;
        let index = FlatIndex::build_with_backend(reference.clone(), self.metric, self.backend())?;
        self.execute(&index, reference, labels, query, started)
    }

    /// Label `query` against a caller-built index over `reference`.
    pub fn run_with_index(
        &self,
        index: &dyn VectorIndex,
        reference: &EmbeddingMatrix,
        labels: &[Label],
        query: &EmbeddingMatrix,
    ) -> Result<TransferOutcome> {
        let started = Instant::now();
        check_labels(reference.len(), labels)?;
        if index.len() != reference.len() {
            return Err(TransferError::LengthMismatch {
                embeddings: index.len(),
                labels: labels.len(),
            });
        }
        self.execute(index, reference, labels, query, started)
    }

    fn execute(
        &self,
        index: &dyn VectorIndex,
        reference: &EmbeddingMatrix,
        labels: &[Label],
        query: &EmbeddingMatrix,
        started: Instant,
    ) -> Result<TransferOutcome> {
        let k = self.config.k;
        let strategy = self.strategy();
        index.check_query(query.view(), k)?;

        let batch_size = self.config.batch_size.unwrap_or(query.len());
        let centroids = LazyCentroids::new(reference, labels);
        let mut out = Vec::with_capacity(query.len());
        let mut batches = 0usize;

        for batch in query.batches(batch_size) {
            let batch_labels = match strategy {
                ConsensusStrategy::CentroidBased => centroids.get()?.assign(batch)?,
                neighbor_based => {
                    let neighbors = index.search(batch, k)?;
                    consensus::resolve(neighbor_based, &neighbors, labels)?
                }
            };
            out.extend(batch_labels);
            batches += 1;
        }

        let elapsed = self.config.timed.then(|| self.config.time_unit.convert(started.elapsed()));
        tracing::info!(
            queries = out.len(),
            batches,
            k,
            %strategy,
            metric = %self.metric,
            ?elapsed,
            "label transfer complete"
        );
        Ok(TransferOutcome { labels: out, elapsed })
    }
}

fn check_labels(embeddings: usize, labels: &[Label]) -> Result<()> {
    if embeddings != labels.len() {
        return Err(TransferError::LengthMismatch { embeddings, labels: labels.len() });
    }
    Ok(())
}

/// One-shot label transfer with `config`.
pub fn transfer_labels(
    reference: &EmbeddingMatrix,
    labels: &[Label],
    query: &EmbeddingMatrix,
    config: &TransferConfig,
) -> Result<TransferOutcome> {
    LabelTransfer::new(config.clone())?.run(reference, labels, query)
}
