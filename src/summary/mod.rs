pub mod aggregator;
pub mod format;
pub mod models;

pub use aggregator::Aggregator;
pub use models::{normalize_handle, BoxBreakdown, BuyerSummary, MatchedRow, SummaryOutcome};
