//! Derived planning views computed from the stored collections.
//!
//! Nothing here is persisted: every view is recomputed from a fresh read.

pub mod backlog;
pub mod builder;
pub mod progress;
pub mod readiness;

pub use backlog::{BacklogQuery, BacklogStats, SortKey};
pub use builder::{DraftError, StoryDraft};
pub use progress::{Dashboard, MvpProgress, PortfolioSummary};
pub use readiness::{Criterion, ReadinessContext, ReadinessFilter, ReadinessReport, StoryReadiness};
