//! Pattern classifier
//!
//! Groups interaction edges by originating account and by fixed time window,
//! applies the statistics kernel, and emits typed [`Pattern`] records.
//! An account or window may appear in multiple emitted patterns; automated
//! and coordinated passes are not mutually exclusive and nothing is
//! deduplicated across them. Emission order carries no meaning.

use std::collections::BTreeSet;

use chrono::Duration;
use tracing::debug;

use echotrace_core::{stats, Edge, GraphSnapshot, Pattern, PatternKind, TimeFrame};

/// Confidence weights for the automated pass
const REGULARITY_WEIGHT: f64 = 0.4;
const VELOCITY_WEIGHT: f64 = 0.3;
const FREQUENCY_WEIGHT: f64 = 0.3;
const COUNT_BONUS: f64 = 0.1;

/// Thresholds for the classification passes
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Minimum interactions before an account is evaluated for automation
    pub min_automated_interactions: usize,
    /// Mean interaction interval above which an account is not automated
    pub max_mean_interval: Duration,
    /// Frequency-score reference interval: a mean interval at or below this
    /// scores the maximal 1.0
    pub frequency_reference: Duration,
    /// Width of the coordinated-pass windows
    pub coordination_window: Duration,
    /// Minimum interactions inside a window
    pub min_window_interactions: usize,
    /// Minimum distinct accounts inside a window
    pub min_window_accounts: usize,
    /// Flat confidence once the coordination thresholds are met
    pub coordinated_confidence: f64,
    /// Confidence of the organic fallback pattern
    pub organic_confidence: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_automated_interactions: 4,
            max_mean_interval: Duration::minutes(15),
            frequency_reference: Duration::minutes(5),
            coordination_window: Duration::minutes(30),
            min_window_interactions: 3,
            min_window_accounts: 2,
            coordinated_confidence: 0.9,
            organic_confidence: 0.9,
        }
    }
}

impl ClassifierConfig {
    pub fn with_coordination_window(mut self, window: Duration) -> Self {
        self.coordination_window = window;
        self
    }

    pub fn with_min_automated_interactions(mut self, min: usize) -> Self {
        self.min_automated_interactions = min;
        self
    }
}

/// Classifies interaction clusters within one snapshot
#[derive(Debug, Clone, Default)]
pub struct PatternClassifier {
    config: ClassifierConfig,
}

impl PatternClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Run both passes over the full snapshot
    pub fn detect_patterns(&self, frame: &TimeFrame, snapshot: &GraphSnapshot) -> Vec<Pattern> {
        let mut patterns = Vec::new();

        for account_id in self.interacting_accounts(frame, snapshot) {
            if let Some(pattern) = self.classify_account(&account_id, frame, snapshot) {
                patterns.push(pattern);
            }
        }

        for window in frame.windows(self.config.coordination_window) {
            if let Some(pattern) = self.classify_window(&window, snapshot) {
                patterns.push(pattern);
            }
        }

        debug!(patterns = patterns.len(), "classified snapshot");
        patterns
    }

    /// Accounts with at least one in-frame interaction. Each is an
    /// independent unit of work for the automated pass.
    pub fn interacting_accounts(
        &self,
        frame: &TimeFrame,
        snapshot: &GraphSnapshot,
    ) -> BTreeSet<String> {
        snapshot
            .interaction_edges()
            .filter(|e| frame.contains(e.timestamp))
            .map(|e| e.source_id.clone())
            .collect()
    }

    /// Automated pass for one account: interval regularity, velocity, and
    /// frequency blended into a clamped confidence.
    pub fn classify_account(
        &self,
        account_id: &str,
        frame: &TimeFrame,
        snapshot: &GraphSnapshot,
    ) -> Option<Pattern> {
        let edges: Vec<&Edge> = snapshot
            .interaction_edges()
            .filter(|e| e.source_id == account_id && frame.contains(e.timestamp))
            .collect();
        if edges.len() < self.config.min_automated_interactions {
            return None;
        }

        let timestamps: Vec<_> = edges.iter().map(|e| e.timestamp).collect();
        let gaps: Vec<f64> = stats::intervals(&timestamps)
            .iter()
            .map(|&g| g as f64)
            .collect();
        let mean_interval_ms = stats::mean(&gaps);
        if mean_interval_ms > self.config.max_mean_interval.num_milliseconds() as f64 {
            return None;
        }

        let regularity = stats::regularity(&timestamps);
        let velocity = stats::velocity(&timestamps);
        // Simultaneous interactions are maximal frequency, not a
        // zero-division fallback.
        let frequency = if mean_interval_ms == 0.0 {
            1.0
        } else {
            (self.config.frequency_reference.num_milliseconds() as f64 / mean_interval_ms).min(1.0)
        };
        let count_bonus = if edges.len() >= self.config.min_automated_interactions {
            COUNT_BONUS
        } else {
            0.0
        };

        let confidence = (regularity * REGULARITY_WEIGHT
            + velocity * VELOCITY_WEIGHT
            + frequency * FREQUENCY_WEIGHT
            + count_bonus)
            .min(1.0);

        debug!(
            account = account_id,
            interactions = edges.len(),
            confidence,
            "automated pattern"
        );

        let node_ids = BTreeSet::from([account_id.to_string()]);
        let edge_ids = edges.iter().map(|e| e.id.clone()).collect();
        Some(Pattern::new(
            PatternKind::Automated,
            confidence,
            node_ids,
            edge_ids,
            *frame,
        ))
    }

    /// Coordinated pass for one window: count and account-diversity
    /// thresholds, flat confidence once met.
    pub fn classify_window(&self, window: &TimeFrame, snapshot: &GraphSnapshot) -> Option<Pattern> {
        let edges: Vec<&Edge> = snapshot
            .interaction_edges()
            .filter(|e| window.start() <= e.timestamp && e.timestamp < window.end())
            .collect();
        if edges.len() < self.config.min_window_interactions {
            return None;
        }

        let accounts: BTreeSet<String> = edges.iter().map(|e| e.source_id.clone()).collect();
        if accounts.len() < self.config.min_window_accounts {
            return None;
        }

        debug!(
            window_start = %window.start(),
            interactions = edges.len(),
            accounts = accounts.len(),
            "coordinated pattern"
        );

        let edge_ids = edges.iter().map(|e| e.id.clone()).collect();
        Some(Pattern::new(
            PatternKind::Coordinated,
            self.config.coordinated_confidence,
            accounts,
            edge_ids,
            *window,
        ))
    }

    /// Content-scoped variant: classify only the edges touching one content
    /// item. When neither pass fires, the neighborhood is labeled organic.
    pub fn classify_content_neighborhood(
        &self,
        content_id: &str,
        frame: &TimeFrame,
        snapshot: &GraphSnapshot,
    ) -> Vec<Pattern> {
        let (node_ids, edges) = snapshot.neighborhood_of(content_id);
        let scoped = GraphSnapshot::new(
            snapshot.nodes.clone(),
            edges.into_iter().cloned().collect(),
        );

        let patterns = self.detect_patterns(frame, &scoped);
        if !patterns.is_empty() {
            return patterns;
        }

        let edge_ids = scoped.edges.iter().map(|e| e.id.clone()).collect();
        vec![Pattern::new(
            PatternKind::Organic,
            self.config.organic_confidence,
            node_ids,
            edge_ids,
            *frame,
        )]
    }
}
