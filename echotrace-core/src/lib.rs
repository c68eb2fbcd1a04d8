//! echotrace core - snapshot data model and statistics kernel
//!
//! This crate provides the foundational primitives:
//! - Immutable graph snapshots (accounts, content, sources, typed edges)
//! - Pure interval/regularity/velocity statistics over timestamp sequences
//! - Pattern and DeviationMetrics records produced by the analysis layer
//! - Error kinds shared across the workspace

pub mod error;
pub mod graph;
pub mod patterns;
pub mod stats;

pub use error::*;
pub use graph::*;
pub use patterns::*;

/// Bonus applied to regularity/velocity scores above [`SUSTAINED_THRESHOLD`].
///
/// Applied without a final clamp, so a kernel score may reach 1.1; the
/// classifier clamps the combined confidence before it becomes visible.
pub const SUSTAINED_BONUS: f64 = 0.1;

/// Raw score above which the sustained bonus applies
pub const SUSTAINED_THRESHOLD: f64 = 0.8;

/// Velocity normalization cap, in actions per minute
pub const MAX_ACTIONS_PER_MINUTE: f64 = 2.0;

/// Policy default for guarded zero-division cases
pub const ZERO_DIVISION_DEFAULT: f64 = 0.0;

/// Credibility of a source with no published content
pub const NO_CONTENT_CREDIBILITY: f64 = 0.0;
