//! echotrace analysis - the analytical core
//!
//! Three read-only, side-effect-free transformations of a graph snapshot:
//! - [`PatternClassifier`]: clusters interactions into organic, coordinated,
//!   or automated spread patterns
//! - [`CredibilityScorer`]: aggregates a source's credibility from its
//!   published content
//! - [`DeviationAnalyzer`]: computes a per-content reality-deviation profile

pub mod classifier;
pub mod credibility;
pub mod deviation;

pub use classifier::{ClassifierConfig, PatternClassifier};
pub use credibility::{CredibilityScorer, ScorerConfig};
pub use deviation::{DeviationAnalyzer, DeviationConfig};
