//! Deviation analyzer
//!
//! Top-level entry point for per-content analysis: resolves source
//! credibility, aggregates cross-references and propagation metrics, scores
//! the temporal patterns in the content's neighborhood, and combines
//! everything into one [`DeviationMetrics`] record.

use tracing::debug;

use echotrace_core::{
    AnalysisError, DeviationMetrics, GraphSnapshot, PatternKind, ReferenceStance, TimeFrame,
    NO_CONTENT_CREDIBILITY, ZERO_DIVISION_DEFAULT,
};

use crate::classifier::PatternClassifier;
use crate::credibility::CredibilityScorer;

/// Cross-reference blend weights
const XREF_VERIFIED_WEIGHT: f64 = 0.4;
const XREF_UNCONTRADICTED_WEIGHT: f64 = 0.4;
const XREF_SUPPORT_WEIGHT: f64 = 0.2;

/// Baseline blend weights (with cross-references present)
const BASE_CREDIBILITY_WEIGHT: f64 = 0.4;
const BASE_VERIFIED_WEIGHT: f64 = 0.3;
const BASE_UNCONTRADICTED_WEIGHT: f64 = 0.2;
const BASE_SUPPORT_WEIGHT: f64 = 0.1;

/// Impact blend weights
const IMPACT_VELOCITY_WEIGHT: f64 = 0.3;
const IMPACT_REACH_WEIGHT: f64 = 0.2;
const IMPACT_ENGAGEMENT_WEIGHT: f64 = 0.2;
const IMPACT_PLATFORM_WEIGHT: f64 = 0.1;
const IMPACT_TEMPORAL_WEIGHT: f64 = 0.2;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Normalization caps for the impact blend
#[derive(Debug, Clone)]
pub struct DeviationConfig {
    /// Shares per hour mapping to a full velocity sub-score
    pub velocity_cap: f64,
    /// Total reach mapping to a full reach sub-score
    pub reach_cap: f64,
    /// Total engagement mapping to a full engagement sub-score
    pub engagement_cap: f64,
    /// Distinct platforms mapping to a full spread sub-score
    pub platform_cap: f64,
    /// Divisor in the propagation factor `min(1, velocity * platforms / norm)`
    pub propagation_norm: f64,
}

impl Default for DeviationConfig {
    fn default() -> Self {
        Self {
            velocity_cap: 50.0,
            reach_cap: 100_000.0,
            engagement_cap: 10_000.0,
            platform_cap: 5.0,
            propagation_norm: 100.0,
        }
    }
}

#[derive(Debug, Default)]
struct CrossReferences {
    total: usize,
    verified: usize,
    supporting: usize,
    contradicting: usize,
}

impl CrossReferences {
    fn verified_ratio(&self) -> f64 {
        self.ratio(self.verified)
    }

    fn support_ratio(&self) -> f64 {
        self.ratio(self.supporting)
    }

    fn contradiction_ratio(&self) -> f64 {
        self.ratio(self.contradicting)
    }

    fn ratio(&self, count: usize) -> f64 {
        if self.total == 0 {
            ZERO_DIVISION_DEFAULT
        } else {
            count as f64 / self.total as f64
        }
    }

    fn score(&self) -> f64 {
        if self.total == 0 {
            return ZERO_DIVISION_DEFAULT;
        }
        self.verified_ratio() * XREF_VERIFIED_WEIGHT
            + (1.0 - self.contradiction_ratio()) * XREF_UNCONTRADICTED_WEIGHT
            + self.support_ratio() * XREF_SUPPORT_WEIGHT
    }
}

#[derive(Debug, Default)]
struct Propagation {
    total_reach: u64,
    total_engagement: u64,
    platform_count: usize,
    /// Shares per hour over the observed share span; 0 when the span is 0
    velocity: f64,
}

/// Computes the reality-deviation profile of one content item
#[derive(Debug, Clone, Default)]
pub struct DeviationAnalyzer {
    scorer: CredibilityScorer,
    classifier: PatternClassifier,
    config: DeviationConfig,
}

impl DeviationAnalyzer {
    pub fn new(
        scorer: CredibilityScorer,
        classifier: PatternClassifier,
        config: DeviationConfig,
    ) -> Self {
        Self {
            scorer,
            classifier,
            config,
        }
    }

    /// Produce a fresh [`DeviationMetrics`] record for one content id.
    /// Deterministic: identical snapshot and id yield identical metrics.
    pub fn measure_reality_deviation(
        &self,
        content_id: &str,
        frame: &TimeFrame,
        snapshot: &GraphSnapshot,
    ) -> Result<DeviationMetrics, AnalysisError> {
        if snapshot.content_attrs(content_id).is_none() {
            return Err(AnalysisError::content_not_found(content_id));
        }

        let source_credibility = match snapshot.publisher_of(content_id) {
            Some((source_id, _)) => self.scorer.source_credibility(source_id, snapshot)?,
            None => NO_CONTENT_CREDIBILITY,
        };

        let refs = self.cross_references(content_id, snapshot);
        let cross_reference_score = refs.score();
        let propagation = self.propagation(content_id, snapshot);

        let baseline_score = if refs.total > 0 {
            source_credibility * BASE_CREDIBILITY_WEIGHT
                + refs.verified_ratio() * BASE_VERIFIED_WEIGHT
                + (1.0 - refs.contradiction_ratio()) * BASE_UNCONTRADICTED_WEIGHT
                + refs.support_ratio() * BASE_SUPPORT_WEIGHT
        } else {
            source_credibility
        };

        let propagation_factor = (propagation.velocity * propagation.platform_count as f64
            / self.config.propagation_norm)
            .min(1.0);
        let contradiction_impact = refs.contradiction_ratio();
        let deviation_magnitude =
            (1.0 - baseline_score).abs() * (propagation_factor + contradiction_impact) / 2.0;

        let temporal = self.temporal_score(content_id, frame, snapshot);
        let blend = (propagation.velocity / self.config.velocity_cap).min(1.0)
            * IMPACT_VELOCITY_WEIGHT
            + (propagation.total_reach as f64 / self.config.reach_cap).min(1.0)
                * IMPACT_REACH_WEIGHT
            + (propagation.total_engagement as f64 / self.config.engagement_cap).min(1.0)
                * IMPACT_ENGAGEMENT_WEIGHT
            + (propagation.platform_count as f64 / self.config.platform_cap).min(1.0)
                * IMPACT_PLATFORM_WEIGHT
            + temporal * IMPACT_TEMPORAL_WEIGHT;
        let impact_score = (blend * deviation_magnitude).clamp(0.0, 1.0);

        debug!(
            content = content_id,
            baseline_score, deviation_magnitude, impact_score, "measured deviation"
        );

        Ok(DeviationMetrics {
            baseline_score,
            deviation_magnitude,
            propagation_velocity: propagation.velocity,
            cross_reference_score,
            source_credibility,
            impact_score,
        })
    }

    /// Aggregate Referenced edges touching the content, in either direction.
    /// A reference counts as verified when the other endpoint's publisher is
    /// a verified source.
    fn cross_references(&self, content_id: &str, snapshot: &GraphSnapshot) -> CrossReferences {
        let mut refs = CrossReferences::default();
        for edge in snapshot.references_of(content_id) {
            refs.total += 1;
            let other = if edge.source_id == content_id {
                &edge.target_id
            } else {
                &edge.source_id
            };
            if snapshot
                .publisher_of(other)
                .map(|(_, source)| source.is_verified())
                .unwrap_or(false)
            {
                refs.verified += 1;
            }
            match edge.properties.stance {
                Some(ReferenceStance::Support) => refs.supporting += 1,
                Some(ReferenceStance::Contradiction) => refs.contradicting += 1,
                None => {}
            }
        }
        refs
    }

    fn propagation(&self, content_id: &str, snapshot: &GraphSnapshot) -> Propagation {
        let shares = snapshot.shares_of(content_id);
        if shares.is_empty() {
            return Propagation::default();
        }

        let total_reach = shares.iter().map(|e| e.properties.reach).sum();
        let total_engagement = shares.iter().map(|e| e.properties.engagement).sum();
        let platforms: std::collections::BTreeSet<&str> = shares
            .iter()
            .filter_map(|e| e.properties.platform.as_deref())
            .collect();

        let first = shares.iter().map(|e| e.timestamp).min().expect("non-empty");
        let last = shares.iter().map(|e| e.timestamp).max().expect("non-empty");
        let span_hours = (last - first).num_milliseconds() as f64 / MS_PER_HOUR;
        let velocity = if span_hours == 0.0 {
            ZERO_DIVISION_DEFAULT
        } else {
            shares.len() as f64 / span_hours
        };

        Propagation {
            total_reach,
            total_engagement,
            platform_count: platforms.len(),
            velocity,
        }
    }

    /// Mean confidence of the non-organic patterns in the content's
    /// neighborhood; 0 when the neighborhood is purely organic
    fn temporal_score(
        &self,
        content_id: &str,
        frame: &TimeFrame,
        snapshot: &GraphSnapshot,
    ) -> f64 {
        let patterns = self
            .classifier
            .classify_content_neighborhood(content_id, frame, snapshot);
        let anomalous: Vec<f64> = patterns
            .iter()
            .filter(|p| p.kind != PatternKind::Organic)
            .map(|p| p.confidence)
            .collect();
        if anomalous.is_empty() {
            return ZERO_DIVISION_DEFAULT;
        }
        anomalous.iter().sum::<f64>() / anomalous.len() as f64
    }
}
