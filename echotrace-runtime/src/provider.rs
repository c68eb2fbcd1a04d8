//! Snapshot provider contract
//!
//! The graph store is an external collaborator. The engine depends only on
//! the shape of its output: a node/edge set for a time frame. An empty
//! snapshot is a value, not an error; storage failures surface as a distinct
//! error kind the engine propagates unchanged, without retrying.

use async_trait::async_trait;
use thiserror::Error;

use echotrace_core::{GraphSnapshot, TimeFrame};

/// Failures from the external graph store
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("graph store unavailable: {0}")]
    Unavailable(String),

    #[error("graph store query failed: {0}")]
    Storage(String),
}

/// Supplies the node/edge set touching a time frame
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    async fn snapshot(&self, frame: &TimeFrame) -> Result<GraphSnapshot, ProviderError>;
}

/// Provider backed by a snapshot held in memory; filters edges to the
/// requested frame. Used by the CLI and in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    snapshot: GraphSnapshot,
}

impl InMemoryProvider {
    pub fn new(snapshot: GraphSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl SnapshotProvider for InMemoryProvider {
    async fn snapshot(&self, frame: &TimeFrame) -> Result<GraphSnapshot, ProviderError> {
        let edges = self
            .snapshot
            .edges
            .iter()
            .filter(|e| frame.contains(e.timestamp))
            .cloned()
            .collect();
        Ok(GraphSnapshot::new(self.snapshot.nodes.clone(), edges))
    }
}
