//! Analytical records emitted by the analysis layer
//!
//! Patterns are produced fresh per analysis call and never updated in
//! place. The uuid instance id is not stable across runs; the fingerprint
//! is, for identical snapshots.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::graph::TimeFrame;

/// Classification of a detected interaction cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Organic,
    Coordinated,
    Automated,
}

/// A classified cluster of interactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    /// Unique instance id; callers must not use it for cross-run equality
    pub id: Uuid,
    /// Content-derived hash, stable for identical snapshots
    pub fingerprint: String,
    pub kind: PatternKind,
    /// Confidence in [0, 1]
    pub confidence: f64,
    pub node_ids: BTreeSet<String>,
    pub edge_ids: BTreeSet<String>,
    pub timeframe: TimeFrame,
}

impl Pattern {
    pub fn new(
        kind: PatternKind,
        confidence: f64,
        node_ids: BTreeSet<String>,
        edge_ids: BTreeSet<String>,
        timeframe: TimeFrame,
    ) -> Self {
        let fingerprint = Self::compute_fingerprint(kind, &edge_ids);
        Self {
            id: Uuid::new_v4(),
            fingerprint,
            kind,
            confidence: confidence.clamp(0.0, 1.0),
            node_ids,
            edge_ids,
            timeframe,
        }
    }

    fn compute_fingerprint(kind: PatternKind, edge_ids: &BTreeSet<String>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{kind:?}").as_bytes());
        for id in edge_ids {
            hasher.update(id.as_bytes());
        }
        format!("{:x}", hasher.finalize())[..16].to_string()
    }
}

/// Reality-deviation profile for one content item.
///
/// `baseline_score`, `cross_reference_score`, `source_credibility`, and
/// `impact_score` are bounded to [0, 1] by construction;
/// `deviation_magnitude` and `propagation_velocity` are non-negative and
/// unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviationMetrics {
    pub baseline_score: f64,
    pub deviation_magnitude: f64,
    pub propagation_velocity: f64,
    pub cross_reference_score: f64,
    pub source_credibility: f64,
    pub impact_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn frame() -> TimeFrame {
        TimeFrame::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, 13, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fingerprint_stable_across_instances() {
        let a = Pattern::new(PatternKind::Automated, 0.9, ids(&["n1"]), ids(&["e1", "e2"]), frame());
        let b = Pattern::new(PatternKind::Automated, 0.9, ids(&["n1"]), ids(&["e2", "e1"]), frame());
        assert_ne!(a.id, b.id);
        assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn test_fingerprint_discriminates_kind() {
        let a = Pattern::new(PatternKind::Automated, 0.9, ids(&["n1"]), ids(&["e1"]), frame());
        let b = Pattern::new(PatternKind::Coordinated, 0.9, ids(&["n1"]), ids(&["e1"]), frame());
        assert_ne!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn test_confidence_clamped() {
        let p = Pattern::new(PatternKind::Organic, 1.3, ids(&[]), ids(&[]), frame());
        assert_eq!(p.confidence, 1.0);
    }
}
