//! Analysis engine
//!
//! Owns the analytical components and the provider handle. Every operation
//! is one snapshot fetch followed by pure computation; per-account and
//! per-window classification units are independent, so the pattern pass
//! fans out over tokio tasks sharing the snapshot read-only and fans back
//! in with no ordering requirement.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::info;

use echotrace_analysis::{CredibilityScorer, DeviationAnalyzer, PatternClassifier};
use echotrace_core::{AnalysisError, DeviationMetrics, GraphSnapshot, Pattern, TimeFrame};

use crate::provider::{ProviderError, SnapshotProvider};

/// Engine failures surfaced to callers.
///
/// A time frame with inverted bounds cannot be constructed, so
/// `InvalidTimeFrame` reaches callers through [`AnalysisError`] at frame
/// construction, before any operation runs.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// Provider failure, propagated unchanged; retry policy belongs to the
    /// caller
    #[error("snapshot provider failed")]
    Upstream(#[source] ProviderError),
}

/// Engine tuning
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum classification units evaluated concurrently
    pub max_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_concurrency: 8 }
    }
}

/// One classification unit of work for the fan-out
enum Unit {
    Account(String),
    Window(TimeFrame),
}

/// Top-level entry point over a snapshot provider
pub struct AnalysisEngine<P> {
    provider: P,
    classifier: Arc<PatternClassifier>,
    scorer: CredibilityScorer,
    analyzer: DeviationAnalyzer,
    config: EngineConfig,
}

impl<P: SnapshotProvider> AnalysisEngine<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            classifier: Arc::new(PatternClassifier::default()),
            scorer: CredibilityScorer::default(),
            analyzer: DeviationAnalyzer::default(),
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_classifier(mut self, classifier: PatternClassifier) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Detect spread patterns across the frame. Deterministic for identical
    /// snapshots modulo pattern instance ids; result order is not
    /// significant.
    pub async fn detect_patterns(&self, frame: &TimeFrame) -> Result<Vec<Pattern>, EngineError> {
        let snapshot = Arc::new(self.fetch(frame).await?);
        if snapshot.edges.is_empty() {
            return Ok(Vec::new());
        }

        let accounts = self.classifier.interacting_accounts(frame, &snapshot);
        let windows = frame.windows(self.classifier.config().coordination_window);
        let units = accounts
            .into_iter()
            .map(Unit::Account)
            .chain(windows.into_iter().map(Unit::Window));

        let results: Vec<Option<Pattern>> = stream::iter(units.map(|unit| {
            let classifier = Arc::clone(&self.classifier);
            let snapshot = Arc::clone(&snapshot);
            let frame = *frame;
            tokio::spawn(async move {
                match unit {
                    Unit::Account(account_id) => {
                        classifier.classify_account(&account_id, &frame, &snapshot)
                    }
                    Unit::Window(window) => classifier.classify_window(&window, &snapshot),
                }
            })
        }))
        .buffer_unordered(self.config.max_concurrency)
        .map(|joined| joined.expect("classification worker panicked"))
        .collect()
        .await;

        let patterns: Vec<Pattern> = results.into_iter().flatten().collect();
        info!(
            patterns = patterns.len(),
            edges = snapshot.edges.len(),
            "pattern detection complete"
        );
        Ok(patterns)
    }

    /// Reality-deviation profile for one content id within the frame
    pub async fn measure_reality_deviation(
        &self,
        content_id: &str,
        frame: &TimeFrame,
    ) -> Result<DeviationMetrics, EngineError> {
        let snapshot = self.fetch(frame).await?;
        let metrics = self
            .analyzer
            .measure_reality_deviation(content_id, frame, &snapshot)?;
        Ok(metrics)
    }

    /// Aggregate credibility of one source within the frame
    pub async fn calculate_source_credibility(
        &self,
        source_id: &str,
        frame: &TimeFrame,
    ) -> Result<f64, EngineError> {
        let snapshot = self.fetch(frame).await?;
        let credibility = self.scorer.source_credibility(source_id, &snapshot)?;
        Ok(credibility)
    }

    /// Single synchronous snapshot fetch, no internal retry
    async fn fetch(&self, frame: &TimeFrame) -> Result<GraphSnapshot, EngineError> {
        self.provider
            .snapshot(frame)
            .await
            .map_err(EngineError::Upstream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::InMemoryProvider;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use echotrace_core::{
        AccountAttrs, ContentAttrs, Edge, EdgeKind, Node, PatternKind, Sentiment, SourceAttrs,
        VerificationStatus,
    };

    struct FailingProvider;

    #[async_trait]
    impl SnapshotProvider for FailingProvider {
        async fn snapshot(&self, _frame: &TimeFrame) -> Result<GraphSnapshot, ProviderError> {
            Err(ProviderError::Unavailable("store offline".into()))
        }
    }

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + Duration::minutes(minute as i64)
    }

    fn hour_frame() -> TimeFrame {
        TimeFrame::new(ts(0), ts(60)).unwrap()
    }

    fn busy_snapshot() -> GraphSnapshot {
        let mut nodes = vec![
            Node::source(
                "src-1",
                SourceAttrs {
                    credibility_score: 0.9,
                    verification: VerificationStatus::Verified,
                },
            ),
            Node::content(
                "post-1",
                ContentAttrs {
                    text_length: 1200,
                    toxicity: 0.0,
                    sentiment: Some(Sentiment::Neutral),
                    published_at: ts(0),
                    topics: vec![],
                    engagement_count: 0,
                    has_links: false,
                    has_media: false,
                },
            ),
        ];
        let mut edges = vec![Edge::new("pub-1", "src-1", "post-1", EdgeKind::Published, ts(0))];
        // a metronomic account and a diverse window
        nodes.push(Node::account("bot-1", AccountAttrs::default()));
        nodes.push(Node::account("acct-1", AccountAttrs::default()));
        for i in 0..4u32 {
            edges.push(Edge::new(
                &format!("b{i}"),
                "bot-1",
                "post-1",
                EdgeKind::Interacted,
                ts(i * 5),
            ));
        }
        edges.push(Edge::new("a1", "acct-1", "post-1", EdgeKind::Interacted, ts(7)));
        GraphSnapshot::new(nodes, edges)
    }

    #[tokio::test]
    async fn test_empty_snapshot_detects_nothing() {
        let engine = AnalysisEngine::new(InMemoryProvider::default());
        let patterns = engine.detect_patterns(&hour_frame()).await.unwrap();
        assert!(patterns.is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_propagates_unchanged() {
        let engine = AnalysisEngine::new(FailingProvider);
        let err = engine.detect_patterns(&hour_frame()).await.unwrap_err();
        assert!(matches!(err, EngineError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_fan_out_matches_sequential_classification() {
        let snapshot = busy_snapshot();
        let frame = hour_frame();

        let classifier = PatternClassifier::default();
        let mut sequential: Vec<String> = classifier
            .detect_patterns(&frame, &snapshot)
            .into_iter()
            .map(|p| p.fingerprint)
            .collect();
        sequential.sort();

        let engine = AnalysisEngine::new(InMemoryProvider::new(snapshot));
        let mut parallel: Vec<String> = engine
            .detect_patterns(&frame)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.fingerprint)
            .collect();
        parallel.sort();

        assert_eq!(sequential, parallel);
        assert!(!parallel.is_empty());
    }

    #[tokio::test]
    async fn test_detects_automated_and_coordinated_through_engine() {
        let engine = AnalysisEngine::new(InMemoryProvider::new(busy_snapshot()));
        let patterns = engine.detect_patterns(&hour_frame()).await.unwrap();
        assert!(patterns.iter().any(|p| p.kind == PatternKind::Automated));
        assert!(patterns.iter().any(|p| p.kind == PatternKind::Coordinated));
    }

    #[tokio::test]
    async fn test_source_credibility_through_engine() {
        let engine = AnalysisEngine::new(InMemoryProvider::new(busy_snapshot()));
        let credibility = engine
            .calculate_source_credibility("src-1", &hour_frame())
            .await
            .unwrap();
        assert!((0.0..=1.0).contains(&credibility));
        assert!(credibility > 0.0);

        let err = engine
            .calculate_source_credibility("missing", &hour_frame())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Analysis(AnalysisError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_deviation_through_engine() {
        let engine = AnalysisEngine::new(InMemoryProvider::new(busy_snapshot()));
        let metrics = engine
            .measure_reality_deviation("post-1", &hour_frame())
            .await
            .unwrap();
        assert!((0.0..=1.0).contains(&metrics.baseline_score));

        let err = engine
            .measure_reality_deviation("missing", &hour_frame())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Analysis(AnalysisError::NotFound { .. })
        ));
    }

    #[test]
    fn test_inverted_frame_rejected_at_construction() {
        let err = TimeFrame::new(ts(60), ts(0)).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidTimeFrame { .. }));
    }
}
