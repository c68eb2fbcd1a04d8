//! echotrace runtime - snapshot provider contract and analysis engine
//!
//! The engine owns no state between calls: every operation pulls one
//! immutable snapshot from the provider, fans the pure analysis out over
//! tokio tasks, and fans back in. Retry, backoff, and timeout policy belong
//! to the caller.

pub mod engine;
pub mod provider;

pub use engine::{AnalysisEngine, EngineConfig, EngineError};
pub use provider::{InMemoryProvider, ProviderError, SnapshotProvider};
