use serde::Serialize;

/// One unpaid ledger row attributed to the buyer.
#[derive(Debug, Clone, Serialize)]
pub struct MatchedRow {
    pub lot_number: String,
    pub item_name: String,
    pub price_minor_a: i64,
    pub price_minor_b: i64,
}

/// Everything the buyer still owes inside one box.
#[derive(Debug, Clone, Serialize)]
pub struct BoxBreakdown {
    pub box_name: String,
    pub deadline_text: Option<String>,
    pub rows: Vec<MatchedRow>,
    pub subtotal_minor_a: i64,
    pub subtotal_minor_b: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuyerSummary {
    /// Canonical form of the queried handle
    pub handle: String,
    /// Per-box breakdowns in registry order; boxes with no matches are absent
    pub boxes: Vec<BoxBreakdown>,
    pub total_minor_a: i64,
    pub total_minor_b: i64,
    /// First non-empty payment instructions among boxes with matches,
    /// by registry order
    pub payment_instructions: Option<String>,
    /// Boxes whose ledger could not be fetched this time
    pub skipped_boxes: Vec<String>,
}

/// Outcome of one aggregation pass. NothingFound is deliberately distinct
/// from a summary whose totals happen to be zero; callers render the two
/// differently.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SummaryOutcome {
    NothingFound {
        handle: String,
        /// Boxes whose ledger could not be fetched; non-empty means the
        /// absence of matches may be degradation, not truth
        skipped_boxes: Vec<String>,
    },
    Summary(BuyerSummary),
}

/// Canonical form of a buyer handle typed by a user: trimmed, lowercased,
/// `@`-prefixed. Supplies the `@` the user forgot; handles stored in sheets
/// are expected to already carry it.
pub fn normalize_handle(input: &str) -> String {
    let trimmed = input.trim().trim_start_matches('@');
    format!("@{}", trimmed.to_lowercase())
}
