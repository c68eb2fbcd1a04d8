//! Credibility scorer
//!
//! Aggregates a source's credibility from the intrinsic quality of its
//! published content, the diversity of interactions with it, and its
//! verification metadata. Zero-division cases resolve to the documented
//! policy default rather than raising, keeping the pipeline total.

use std::collections::BTreeSet;

use tracing::debug;

use echotrace_core::{
    AnalysisError, ContentAttrs, GraphSnapshot, Sentiment, SourceAttrs, NO_CONTENT_CREDIBILITY,
    ZERO_DIVISION_DEFAULT,
};

/// Per-content blend weights
const CONTENT_WEIGHT: f64 = 0.4;
const INTERACTION_WEIGHT: f64 = 0.3;
const VERIFICATION_WEIGHT: f64 = 0.3;

/// Content-quality sub-weights
const TOXICITY_WEIGHT: f64 = 0.4;
const SENTIMENT_WEIGHT: f64 = 0.3;
const LENGTH_WEIGHT: f64 = 0.3;
const LENGTH_NORM_CHARS: f64 = 1000.0;

/// Neutral content is treated as most credible
const SENTIMENT_NEUTRAL: f64 = 1.0;
const SENTIMENT_POLAR: f64 = 0.7;
const SENTIMENT_UNKNOWN: f64 = 0.5;

/// Interaction-diversity sub-weights
const ENGAGEMENT_WEIGHT: f64 = 0.4;
const RATE_WEIGHT: f64 = 0.3;
const UNIQUE_RATIO_WEIGHT: f64 = 0.3;

/// Verification bonuses, additive and not separately clamped
const LINKS_BONUS: f64 = 0.3;
const MEDIA_BONUS: f64 = 0.2;
const VERIFIED_BONUS: f64 = 0.5;

const MS_PER_DAY: f64 = 86_400_000.0;

/// Normalization caps for the interaction sub-scores
#[derive(Debug, Clone)]
pub struct ScorerConfig {
    /// Engagement per unique user mapping to a full sub-score
    pub engagement_per_user_cap: f64,
    /// Interactions per day mapping to a full sub-score
    pub interactions_per_day_cap: f64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            engagement_per_user_cap: 10.0,
            interactions_per_day_cap: 48.0,
        }
    }
}

/// Computes aggregate source credibility from one snapshot
#[derive(Debug, Clone, Default)]
pub struct CredibilityScorer {
    config: ScorerConfig,
}

impl CredibilityScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    /// Average per-content weighted score across all of the source's
    /// published content, clamped to [0, 1]. A source with no content
    /// scores [`NO_CONTENT_CREDIBILITY`] without error; an id that does not
    /// resolve to a source node is `NotFound`.
    pub fn source_credibility(
        &self,
        source_id: &str,
        snapshot: &GraphSnapshot,
    ) -> Result<f64, AnalysisError> {
        let source = snapshot
            .source_attrs(source_id)
            .ok_or_else(|| AnalysisError::source_not_found(source_id))?;

        let published = snapshot.published_by(source_id);
        if published.is_empty() {
            return Ok(NO_CONTENT_CREDIBILITY);
        }

        let total: f64 = published
            .iter()
            .map(|(content_id, attrs)| {
                CONTENT_WEIGHT * content_score(attrs)
                    + INTERACTION_WEIGHT * self.interaction_score(content_id, attrs, snapshot)
                    + VERIFICATION_WEIGHT * verification_score(attrs, source)
            })
            .sum();

        let credibility = (total / published.len() as f64).clamp(0.0, 1.0);
        debug!(
            source = source_id,
            content_items = published.len(),
            credibility,
            "scored source"
        );
        Ok(credibility)
    }

    /// Interaction diversity for one content item. Resolves to the
    /// zero-division default when there are no interactions or no unique
    /// users.
    fn interaction_score(
        &self,
        content_id: &str,
        attrs: &ContentAttrs,
        snapshot: &GraphSnapshot,
    ) -> f64 {
        let interactions = snapshot.interactions_with(content_id);
        if interactions.is_empty() {
            return ZERO_DIVISION_DEFAULT;
        }
        let unique_users: BTreeSet<&str> =
            interactions.iter().map(|e| e.source_id.as_str()).collect();
        if unique_users.is_empty() {
            return ZERO_DIVISION_DEFAULT;
        }

        let engagement: u64 = interactions.iter().map(|e| e.properties.engagement).sum();
        let per_user = (engagement as f64
            / unique_users.len() as f64
            / self.config.engagement_per_user_cap)
            .min(1.0);

        let last = interactions
            .iter()
            .map(|e| e.timestamp)
            .max()
            .expect("non-empty");
        let days = (last - attrs.published_at).num_milliseconds() as f64 / MS_PER_DAY;
        let per_day = if days <= 0.0 {
            ZERO_DIVISION_DEFAULT
        } else {
            (interactions.len() as f64 / days / self.config.interactions_per_day_cap).min(1.0)
        };

        let unique_ratio = unique_users.len() as f64 / interactions.len() as f64;

        per_user * ENGAGEMENT_WEIGHT + per_day * RATE_WEIGHT + unique_ratio * UNIQUE_RATIO_WEIGHT
    }
}

/// Intrinsic content quality
fn content_score(attrs: &ContentAttrs) -> f64 {
    let sentiment = match attrs.sentiment {
        Some(Sentiment::Neutral) => SENTIMENT_NEUTRAL,
        Some(Sentiment::Positive) | Some(Sentiment::Negative) => SENTIMENT_POLAR,
        None => SENTIMENT_UNKNOWN,
    };
    let length = (attrs.text_length as f64 / LENGTH_NORM_CHARS).min(1.0);
    (1.0 - attrs.toxicity) * TOXICITY_WEIGHT + sentiment * SENTIMENT_WEIGHT + length * LENGTH_WEIGHT
}

/// Sum of independent verification bonuses; can reach 1.0
fn verification_score(attrs: &ContentAttrs, source: &SourceAttrs) -> f64 {
    let mut score = 0.0;
    if attrs.has_links {
        score += LINKS_BONUS;
    }
    if attrs.has_media {
        score += MEDIA_BONUS;
    }
    if source.is_verified() {
        score += VERIFIED_BONUS;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use echotrace_core::{AccountAttrs, Edge, EdgeKind, Node, VerificationStatus};

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + Duration::minutes(minute as i64)
    }

    fn source(id: &str, verification: VerificationStatus) -> Node {
        Node::source(
            id,
            SourceAttrs {
                credibility_score: 0.9,
                verification,
            },
        )
    }

    fn clean_content(id: &str) -> Node {
        Node::content(
            id,
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
        )
    }

    #[test]
    fn test_source_without_content_scores_zero() {
        let snapshot = GraphSnapshot::new(
            vec![source("src-1", VerificationStatus::Verified)],
            vec![],
        );
        let scorer = CredibilityScorer::default();
        assert_eq!(scorer.source_credibility("src-1", &snapshot).unwrap(), 0.0);
    }

    #[test]
    fn test_unknown_source_is_not_found() {
        let scorer = CredibilityScorer::default();
        let err = scorer
            .source_credibility("missing", &GraphSnapshot::default())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::NotFound { .. }));
    }

    #[test]
    fn test_clean_uninteracted_content_scores_content_term_only() {
        // toxicity 0, neutral sentiment, 1200 chars: content score is 1.0;
        // no interactions, no links/media, unverified source
        let snapshot = GraphSnapshot::new(
            vec![
                source("src-1", VerificationStatus::Unverified),
                clean_content("post-1"),
            ],
            vec![Edge::new("e1", "src-1", "post-1", EdgeKind::Published, ts(0))],
        );

        let scorer = CredibilityScorer::default();
        let credibility = scorer.source_credibility("src-1", &snapshot).unwrap();
        assert!((credibility - CONTENT_WEIGHT).abs() < 1e-12);
    }

    #[test]
    fn test_verified_source_with_links_and_media_scores_higher() {
        let rich = Node::content(
            "post-1",
            ContentAttrs {
                text_length: 1200,
                toxicity: 0.0,
                sentiment: Some(Sentiment::Neutral),
                published_at: ts(0),
                topics: vec![],
                engagement_count: 0,
                has_links: true,
                has_media: true,
            },
        );
        let snapshot = GraphSnapshot::new(
            vec![source("src-1", VerificationStatus::Verified), rich],
            vec![Edge::new("e1", "src-1", "post-1", EdgeKind::Published, ts(0))],
        );

        let scorer = CredibilityScorer::default();
        let credibility = scorer.source_credibility("src-1", &snapshot).unwrap();
        // content 1.0 * 0.4 + verification (0.3 + 0.2 + 0.5) * 0.3
        assert!((credibility - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_diverse_interactions_raise_the_score() {
        let mut nodes = vec![
            source("src-1", VerificationStatus::Unverified),
            clean_content("post-1"),
        ];
        let mut edges = vec![Edge::new("e0", "src-1", "post-1", EdgeKind::Published, ts(0))];
        for i in 0..4 {
            let account = format!("acct-{i}");
            nodes.push(Node::account(&account, AccountAttrs::default()));
            edges.push(Edge::new(
                &format!("e{}", i + 1),
                &account,
                "post-1",
                EdgeKind::Interacted,
                ts(30 + i * 10),
            ));
        }
        let snapshot = GraphSnapshot::new(nodes, edges);

        let scorer = CredibilityScorer::default();
        let with_interactions = scorer.source_credibility("src-1", &snapshot).unwrap();
        assert!(with_interactions > CONTENT_WEIGHT);
        assert!(with_interactions <= 1.0);
    }

    #[test]
    fn test_result_is_clamped() {
        // everything maximal: verified, links, media, perfect content
        let rich = Node::content(
            "post-1",
            ContentAttrs {
                text_length: 5000,
                toxicity: 0.0,
                sentiment: Some(Sentiment::Neutral),
                published_at: ts(0),
                topics: vec![],
                engagement_count: 0,
                has_links: true,
                has_media: true,
            },
        );
        let snapshot = GraphSnapshot::new(
            vec![source("src-1", VerificationStatus::Verified), rich],
            vec![Edge::new("e1", "src-1", "post-1", EdgeKind::Published, ts(0))],
        );

        let scorer = CredibilityScorer::default();
        let credibility = scorer.source_credibility("src-1", &snapshot).unwrap();
        assert!((0.0..=1.0).contains(&credibility));
    }
}
