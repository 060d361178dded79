use std::sync::Arc;

use lt_core::types::labels;
use lt_core::{EmbeddingMatrix, Label, TransferError};
use lt_vectordb::NeighborResult;
use serde_json::json;

use crate::centroid::{CentroidMap, LazyCentroids};
use crate::consensus::{self, ConsensusStrategy};
use crate::harmonize::{CategoryMap, UNKNOWN_CATEGORY};

fn neighbors(indices: Vec<Vec<usize>>) -> NeighborResult {
    let distances = indices.iter().map(|r| r.iter().map(|&i| i as f32).collect()).collect();
    NeighborResult::from_rows(indices, distances).unwrap()
}

fn matrix(rows: &[&[f32]]) -> EmbeddingMatrix {
    EmbeddingMatrix::from_rows(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
}

// ========== Strategy selection ==========

#[test]
fn test_parse_known_names() {
    assert_eq!(ConsensusStrategy::parse("majority_voting", false).unwrap(), ConsensusStrategy::MajorityVoting);
    assert_eq!(ConsensusStrategy::parse("weighted_voting", true).unwrap(), ConsensusStrategy::WeightedVoting);
    assert_eq!(ConsensusStrategy::parse("centroid_based", true).unwrap(), ConsensusStrategy::CentroidBased);
    assert_eq!(ConsensusStrategy::parse("Majority", true).unwrap(), ConsensusStrategy::MajorityVoting);
    assert_eq!(ConsensusStrategy::parse("nearest", true).unwrap(), ConsensusStrategy::NearestOnly);
}

#[test]
fn test_parse_unknown_falls_back() {
    assert_eq!(ConsensusStrategy::parse("plurality", false).unwrap(), ConsensusStrategy::NearestOnly);
}

#[test]
fn test_parse_unknown_strict() {
    let err = ConsensusStrategy::parse("plurality", true).unwrap_err();
    assert!(matches!(err, TransferError::UnknownConsensusStrategy(ref s) if s == "plurality"));
}

#[test]
fn test_for_k() {
    assert_eq!(ConsensusStrategy::MajorityVoting.for_k(1), ConsensusStrategy::NearestOnly);
    assert_eq!(ConsensusStrategy::WeightedVoting.for_k(1), ConsensusStrategy::NearestOnly);
    assert_eq!(ConsensusStrategy::MajorityVoting.for_k(5), ConsensusStrategy::MajorityVoting);
    assert_eq!(ConsensusStrategy::CentroidBased.for_k(1), ConsensusStrategy::CentroidBased);
    assert!(!ConsensusStrategy::CentroidBased.needs_neighbors());
}

#[test]
fn test_strategy_display_roundtrips_through_parse() {
    for s in [
        ConsensusStrategy::NearestOnly,
        ConsensusStrategy::MajorityVoting,
        ConsensusStrategy::WeightedVoting,
        ConsensusStrategy::CentroidBased,
    ] {
        assert_eq!(ConsensusStrategy::parse(&s.to_string(), true).unwrap(), s);
    }
}

// ========== Nearest only ==========

#[test]
fn test_nearest_only() {
    let refs = labels(&["A", "B", "C"]);
    let out = consensus::nearest_only(&neighbors(vec![vec![2, 0], vec![1, 2]]), &refs).unwrap();
    assert_eq!(out, labels(&["C", "B"]));
}

#[test]
fn test_zero_neighbors_rejected() {
    let refs = labels(&["A"]);
    let empty = NeighborResult::from_rows(vec![vec![]], vec![vec![]]).unwrap();
    for f in [consensus::nearest_only, consensus::majority_vote, consensus::weighted_vote] {
        assert!(matches!(f(&empty, &refs).unwrap_err(), TransferError::InvalidK { k: 0, .. }));
    }
}

#[test]
fn test_index_beyond_labels() {
    let refs = labels(&["A"]);
    let err = consensus::majority_vote(&neighbors(vec![vec![0, 3]]), &refs).unwrap_err();
    assert!(matches!(err, TransferError::Config(ref msg) if msg.contains("position 3")));
}

// ========== Majority voting ==========

#[test]
fn test_majority_basic() {
    let refs = labels(&["A", "A", "B"]);
    let out = consensus::majority_vote(&neighbors(vec![vec![0, 1, 2]]), &refs).unwrap();
    assert_eq!(out, labels(&["A"]));
}

#[test]
fn test_majority_minority_nearest_loses() {
    let refs = labels(&["A", "B", "B"]);
    let out = consensus::majority_vote(&neighbors(vec![vec![0, 1, 2]]), &refs).unwrap();
    assert_eq!(out, labels(&["B"]));
}

#[test]
fn test_majority_tie_prefers_earliest_seen() {
    // A and B both get two votes; A's first neighbor is closer.
    let refs = labels(&["A", "B", "B", "A"]);
    let out = consensus::majority_vote(&neighbors(vec![vec![0, 1, 2, 3]]), &refs).unwrap();
    assert_eq!(out, labels(&["A"]));
    let out = consensus::majority_vote(&neighbors(vec![vec![1, 0, 3, 2]]), &refs).unwrap();
    assert_eq!(out, labels(&["B"]));
}

#[test]
fn test_majority_multiple_rows() {
    let refs = labels(&["A", "B", "B", "C", "C"]);
    let out = consensus::majority_vote(&neighbors(vec![vec![0, 1, 2], vec![3, 4, 0], vec![0, 1, 3]]), &refs)
        .unwrap();
    assert_eq!(out, labels(&["B", "C", "A"]));
}

// ========== Weighted voting ==========

#[test]
fn test_weighted_closer_neighbor_wins() {
    let refs = labels(&["A", "B"]);
    let nb = NeighborResult::from_rows(vec![vec![0, 1]], vec![vec![1.0, 0.5]]).unwrap();
    assert_eq!(consensus::weighted_vote(&nb, &refs).unwrap(), labels(&["B"]));
}

#[test]
fn test_weighted_many_far_beat_one_near() {
    let refs = labels(&["A", "B", "B", "B"]);
    let nb = NeighborResult::from_rows(vec![vec![0, 1, 2, 3]], vec![vec![1.0, 2.0, 2.0, 2.0]]).unwrap();
    // A: 1.0, B: 1.5
    assert_eq!(consensus::weighted_vote(&nb, &refs).unwrap(), labels(&["B"]));
}

#[test]
fn test_weighted_zero_distance() {
    let refs = labels(&["A", "B", "B"]);
    let nb = NeighborResult::from_rows(vec![vec![0, 1, 2]], vec![vec![0.0, 0.1, 0.1]]).unwrap();
    assert_eq!(consensus::weighted_vote(&nb, &refs).unwrap(), labels(&["A"]));
}

#[test]
fn test_weighted_tie_prefers_earliest_seen() {
    let refs = labels(&["A", "B"]);
    let nb = NeighborResult::from_rows(vec![vec![1, 0]], vec![vec![1.0, 1.0]]).unwrap();
    assert_eq!(consensus::weighted_vote(&nb, &refs).unwrap(), labels(&["B"]));
}

#[test]
fn test_resolve_dispatch() {
    let refs = labels(&["A", "B", "B"]);
    let nb = neighbors(vec![vec![0, 1, 2]]);
    assert_eq!(consensus::resolve(ConsensusStrategy::NearestOnly, &nb, &refs).unwrap(), labels(&["A"]));
    assert_eq!(consensus::resolve(ConsensusStrategy::MajorityVoting, &nb, &refs).unwrap(), labels(&["B"]));
    assert!(consensus::resolve(ConsensusStrategy::CentroidBased, &nb, &refs).is_err());
}

// ========== Centroids ==========

#[test]
fn test_centroid_means() {
    let reference = matrix(&[&[0.0, 0.0], &[0.0, 2.0], &[10.0, 10.0]]);
    let map = CentroidMap::compute(&reference, &labels(&["A", "A", "B"])).unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map.dim(), 2);
    assert_eq!(map.get(&Label::from("A")).unwrap(), &[0.0, 1.0]);
    assert_eq!(map.get(&Label::from("B")).unwrap(), &[10.0, 10.0]);
    assert_eq!(map.nearest(&[0.0, 0.9]).unwrap(), &Label::from("A"));
}

#[test]
fn test_centroid_assign_batch() {
    let reference = matrix(&[&[0.0, 0.0], &[0.0, 2.0], &[10.0, 10.0]]);
    let map = CentroidMap::compute(&reference, &labels(&["A", "A", "B"])).unwrap();
    let out = map.assign(matrix(&[&[9.0, 9.0], &[1.0, 1.0]]).view()).unwrap();
    assert_eq!(out, labels(&["B", "A"]));
}

#[test]
fn test_centroid_tie_uses_label_order() {
    let reference = matrix(&[&[1.0], &[-1.0]]);
    let map = CentroidMap::compute(&reference, &labels(&["zeta", "alpha"])).unwrap();
    assert_eq!(map.nearest(&[0.0]).unwrap(), &Label::from("alpha"));
    let order: Vec<&str> = map.iter().map(|(l, _)| l.as_str()).collect();
    assert_eq!(order, vec!["alpha", "zeta"]);
}

#[test]
fn test_centroid_errors() {
    let reference = matrix(&[&[0.0, 0.0]]);
    assert!(matches!(
        CentroidMap::compute(&reference, &labels(&["A", "B"])).unwrap_err(),
        TransferError::LengthMismatch { embeddings: 1, labels: 2 }
    ));
    let empty = EmbeddingMatrix::from_rows(vec![]).unwrap();
    assert!(matches!(CentroidMap::compute(&empty, &[]).unwrap_err(), TransferError::EmptyReference));
    let map = CentroidMap::compute(&reference, &labels(&["A"])).unwrap();
    assert!(matches!(
        map.nearest(&[0.0]).unwrap_err(),
        TransferError::InvalidDimension { expected: 2, got: 1 }
    ));
}

#[test]
fn test_lazy_centroids_built_once() {
    let reference = matrix(&[&[0.0], &[2.0], &[10.0]]);
    let refs = labels(&["A", "A", "B"]);
    let lazy = LazyCentroids::new(&reference, &refs);
    assert!(!lazy.is_built());
    let first = lazy.get().unwrap();
    assert!(lazy.is_built());
    let second = lazy.get().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_lazy_centroids_concurrent_callers_share_one_map() {
    let reference = matrix(&[&[0.0], &[2.0], &[10.0]]);
    let refs = labels(&["A", "A", "B"]);
    let lazy = LazyCentroids::new(&reference, &refs);
    let maps: Vec<Arc<CentroidMap>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8).map(|_| s.spawn(|| lazy.get().unwrap())).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(maps.iter().all(|m| Arc::ptr_eq(m, &maps[0])));
}

#[test]
fn test_lazy_centroids_propagates_error() {
    let reference = matrix(&[&[0.0]]);
    let refs = labels(&["A", "B"]);
    let lazy = LazyCentroids::new(&reference, &refs);
    assert!(lazy.get().is_err());
    assert!(!lazy.is_built());
}

// ========== Harmonisation ==========

#[test]
fn test_category_map_from_json() {
    let map = CategoryMap::from_json_value(json!({
        "T cell": ["CD4 T cell", "CD8 T cell"],
        "B cell": "naive B cell"
    }))
    .unwrap();
    assert_eq!(map.len(), 3);
    let out = map.map_labels(&labels(&["CD8 T cell", "naive B cell", "platelet"]));
    assert_eq!(out, labels(&["T cell", "B cell", UNKNOWN_CATEGORY]));
}

#[test]
fn test_category_map_duplicate_label_last_in_document_wins() {
    let map = CategoryMap::from_json_str(r#"{"alpha": ["x"], "beta": ["x"]}"#).unwrap();
    assert_eq!(map.category_of(&Label::from("x")), Some(&Label::from("beta")));
    let map = CategoryMap::from_json_str(r#"{"zeta": ["x"], "alpha": ["x"]}"#).unwrap();
    assert_eq!(map.category_of(&Label::from("x")), Some(&Label::from("alpha")));
}

#[test]
fn test_category_map_scalar_members() {
    let map = CategoryMap::from_json_str(r#"{"cluster": [7, "7b"], "flag": true}"#).unwrap();
    assert_eq!(map.category_of(&Label::from("7")), Some(&Label::from("cluster")));
    assert_eq!(map.category_of(&Label::from("7b")), Some(&Label::from("cluster")));
    assert_eq!(map.category_of(&Label::from("true")), Some(&Label::from("flag")));
}

#[test]
fn test_category_map_rejects_non_object() {
    assert!(matches!(
        CategoryMap::from_json_value(json!(["a", "b"])).unwrap_err(),
        TransferError::Serialization(_)
    ));
    assert!(matches!(
        CategoryMap::from_json_str(r#"{"a": {"b": "c"}}"#).unwrap_err(),
        TransferError::Config(_)
    ));
    assert!(CategoryMap::from_json_str(r#"{"a": [null]}"#).is_err());
}

#[test]
fn test_category_map_empty() {
    let map = CategoryMap::new();
    assert!(map.is_empty());
    assert_eq!(map.map_labels(&labels(&["a"])), labels(&[UNKNOWN_CATEGORY]));
}
