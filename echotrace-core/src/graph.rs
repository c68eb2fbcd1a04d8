//! Graph snapshot data model
//!
//! A snapshot is an immutable set of nodes and timestamped directed edges
//! scoped to one analysis call. Node shapes are resolved once at ingestion
//! into a tagged union; the analysis layer never type-sniffs per access.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Sentiment label attached to content by the upstream classifier.
/// Absent means the upstream produced no label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Verification state of a publishing source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Verified,
    Unverified,
    Disputed,
}

/// Attributes of a published content item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAttrs {
    /// Character count of the content body
    pub text_length: usize,
    /// Toxicity score from the upstream classifier (0.0 - 1.0)
    pub toxicity: f64,
    /// Sentiment label, if the upstream produced one
    #[serde(default)]
    pub sentiment: Option<Sentiment>,
    /// Publication instant
    pub published_at: DateTime<Utc>,
    /// Topic tags
    #[serde(default)]
    pub topics: Vec<String>,
    /// Aggregate engagement count reported at ingestion
    #[serde(default)]
    pub engagement_count: u64,
    /// Content body carries outbound links
    #[serde(default)]
    pub has_links: bool,
    /// Content body carries media attachments
    #[serde(default)]
    pub has_media: bool,
}

/// Attributes of a source (publisher)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAttrs {
    /// Stored credibility prior (0.0 - 1.0)
    pub credibility_score: f64,
    /// Verification state
    pub verification: VerificationStatus,
}

impl SourceAttrs {
    pub fn is_verified(&self) -> bool {
        self.verification == VerificationStatus::Verified
    }
}

/// Attributes of an interacting account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountAttrs {
    /// Activity signal reported at ingestion
    #[serde(default)]
    pub activity_score: f64,
    /// Influence signal reported at ingestion
    #[serde(default)]
    pub influence_score: f64,
}

/// Kind-specific node payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Content(ContentAttrs),
    Source(SourceAttrs),
    Account(AccountAttrs),
}

/// A node in the interaction graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    pub fn content(id: &str, attrs: ContentAttrs) -> Self {
        Self {
            id: id.to_string(),
            kind: NodeKind::Content(attrs),
        }
    }

    pub fn source(id: &str, attrs: SourceAttrs) -> Self {
        Self {
            id: id.to_string(),
            kind: NodeKind::Source(attrs),
        }
    }

    pub fn account(id: &str, attrs: AccountAttrs) -> Self {
        Self {
            id: id.to_string(),
            kind: NodeKind::Account(attrs),
        }
    }

    pub fn is_account(&self) -> bool {
        matches!(self.kind, NodeKind::Account(_))
    }
}

/// Typed edge categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Published,
    Shared,
    Interacted,
    Referenced,
}

/// Stance of a cross-reference toward its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceStance {
    Support,
    Contradiction,
}

/// Free-form edge attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeProperties {
    /// Edge weight reported at ingestion
    #[serde(default)]
    pub weight: f64,
    /// Engagement attributed to this edge
    #[serde(default)]
    pub engagement: u64,
    /// Audience reach attributed to this edge
    #[serde(default)]
    pub reach: u64,
    /// Platform the edge was observed on
    #[serde(default)]
    pub platform: Option<String>,
    /// Reference stance, for Referenced edges
    #[serde(default)]
    pub stance: Option<ReferenceStance>,
}

/// A timestamped directed edge; the unit of temporal analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub kind: EdgeKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub properties: EdgeProperties,
}

impl Edge {
    pub fn new(
        id: &str,
        source_id: &str,
        target_id: &str,
        kind: EdgeKind,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.to_string(),
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            kind,
            timestamp,
            properties: EdgeProperties::default(),
        }
    }

    pub fn with_properties(mut self, properties: EdgeProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Shared and Interacted edges are the units the classifier counts
    pub fn is_interaction(&self) -> bool {
        matches!(self.kind, EdgeKind::Shared | EdgeKind::Interacted)
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source_id == node_id || self.target_id == node_id
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RawTimeFrame {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// A closed analysis window; `start <= end` holds by construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeFrame")]
pub struct TimeFrame {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawTimeFrame> for TimeFrame {
    type Error = AnalysisError;

    fn try_from(raw: RawTimeFrame) -> Result<Self, Self::Error> {
        TimeFrame::new(raw.start, raw.end)
    }
}

impl TimeFrame {
    /// Build a frame, rejecting `start > end` before any computation can
    /// observe it.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, AnalysisError> {
        if start > end {
            return Err(AnalysisError::InvalidTimeFrame { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Inclusive containment check
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Fixed-width windows stepping from the frame start. Windows are
    /// half-open `[start, start + width)` buckets; the last one may extend
    /// past the frame end. A degenerate frame yields a single window.
    pub fn windows(&self, width: Duration) -> Vec<TimeFrame> {
        if width <= Duration::zero() {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut cursor = self.start;
        while cursor < self.end {
            out.push(Self {
                start: cursor,
                end: cursor + width,
            });
            cursor += width;
        }
        if out.is_empty() {
            out.push(Self {
                start: self.start,
                end: self.start + width,
            });
        }
        out
    }
}

/// Immutable node/edge set for one analysis call.
///
/// An empty snapshot is a valid value, never an error; the provider contract
/// returns one when nothing matches a frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn content_attrs(&self, id: &str) -> Option<&ContentAttrs> {
        match self.node(id).map(|n| &n.kind) {
            Some(NodeKind::Content(attrs)) => Some(attrs),
            _ => None,
        }
    }

    pub fn source_attrs(&self, id: &str) -> Option<&SourceAttrs> {
        match self.node(id).map(|n| &n.kind) {
            Some(NodeKind::Source(attrs)) => Some(attrs),
            _ => None,
        }
    }

    pub fn is_account(&self, id: &str) -> bool {
        self.node(id).map(Node::is_account).unwrap_or(false)
    }

    /// The source that published a content item, if present
    pub fn publisher_of(&self, content_id: &str) -> Option<(&str, &SourceAttrs)> {
        self.edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Published && e.target_id == content_id)
            .find_map(|e| {
                self.source_attrs(&e.source_id)
                    .map(|attrs| (e.source_id.as_str(), attrs))
            })
    }

    /// Content items published by a source
    pub fn published_by(&self, source_id: &str) -> Vec<(&str, &ContentAttrs)> {
        self.edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Published && e.source_id == source_id)
            .filter_map(|e| {
                self.content_attrs(&e.target_id)
                    .map(|attrs| (e.target_id.as_str(), attrs))
            })
            .collect()
    }

    /// Interaction edges originating from account nodes
    pub fn interaction_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges
            .iter()
            .filter(|e| e.is_interaction() && self.is_account(&e.source_id))
    }

    /// Interaction edges targeting a content item
    pub fn interactions_with(&self, content_id: &str) -> Vec<&Edge> {
        self.interaction_edges()
            .filter(|e| e.target_id == content_id)
            .collect()
    }

    /// Referenced edges touching a content item, in either direction
    pub fn references_of(&self, content_id: &str) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Referenced && e.touches(content_id))
            .collect()
    }

    /// Shared edges targeting a content item
    pub fn shares_of(&self, content_id: &str) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Shared && e.target_id == content_id)
            .collect()
    }

    /// All edges touching a content item plus the node ids involved
    pub fn neighborhood_of(&self, content_id: &str) -> (BTreeSet<String>, Vec<&Edge>) {
        let edges: Vec<&Edge> = self.edges.iter().filter(|e| e.touches(content_id)).collect();
        let mut node_ids: BTreeSet<String> = BTreeSet::new();
        node_ids.insert(content_id.to_string());
        for edge in &edges {
            node_ids.insert(edge.source_id.clone());
            node_ids.insert(edge.target_id.clone());
        }
        (node_ids, edges)
    }

    /// Observed extent of the snapshot's edge timestamps
    pub fn observed_extent(&self) -> Option<TimeFrame> {
        let first = self.edges.iter().map(|e| e.timestamp).min()?;
        let last = self.edges.iter().map(|e| e.timestamp).max()?;
        TimeFrame::new(first, last).ok()
    }
}
