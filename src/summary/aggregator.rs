// Ledger aggregation - the per-buyer unpaid summary across all active boxes.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::registry::models::{LedgerRow, RegistryEntry};
use crate::sources::LedgerSource;
use crate::summary::models::{
    normalize_handle, BoxBreakdown, BuyerSummary, MatchedRow, SummaryOutcome,
};

pub struct Aggregator {
    ledgers: Arc<dyn LedgerSource>,
    /// Lowercased payment-status value that suppresses a row
    paid_sentinel: String,
    fetch_concurrency: usize,
}

impl Aggregator {
    pub fn new(ledgers: Arc<dyn LedgerSource>, paid_sentinel: &str, fetch_concurrency: usize) -> Self {
        Self {
            ledgers,
            paid_sentinel: paid_sentinel.trim().to_lowercase(),
            fetch_concurrency: fetch_concurrency.max(1),
        }
    }

    /// Visit every box in registry order and collect the buyer's unpaid rows.
    ///
    /// Ledger fetches fan out concurrently up to the configured cap;
    /// `buffered` joins them back in registry order so the breakdown is
    /// deterministic. A box whose fetch fails is skipped, not fatal: one
    /// broken sheet must not blank the whole summary.
    pub async fn summarize(&self, handle: &str, entries: &[RegistryEntry]) -> SummaryOutcome {
        let who = normalize_handle(handle);

        // Each future owns its entry; borrowing from `entries` here would
        // leave the collected futures tied to the surrounding stack frame.
        let fetches = stream::iter(entries.iter().cloned().map(|entry| {
            let ledgers = Arc::clone(&self.ledgers);
            async move {
                let result = ledgers.fetch(&entry.location).await;
                (entry, result)
            }
        }))
        .buffered(self.fetch_concurrency)
        .collect::<Vec<_>>()
        .await;

        let mut boxes: Vec<BoxBreakdown> = Vec::new();
        let mut skipped_boxes: Vec<String> = Vec::new();
        let mut total_a = 0i64;
        let mut total_b = 0i64;
        let mut payment_instructions: Option<String> = None;

        for (entry, result) in fetches {
            let raw_rows = match result {
                Ok(rows) => rows,
                Err(e) => {
                    warn!("Skipping box '{}': {}", entry.name, e);
                    skipped_boxes.push(entry.name.clone());
                    continue;
                }
            };

            let mut rows: Vec<MatchedRow> = Vec::new();
            let mut subtotal_a = 0i64;
            let mut subtotal_b = 0i64;

            for raw in &raw_rows {
                let row = LedgerRow::from_raw(raw);
                // Stored handles must already carry their '@'; only the
                // user-typed side gets normalized.
                if row.buyer_handle.to_lowercase() != who {
                    continue;
                }
                if self.is_paid(&row.payment_status) {
                    continue;
                }

                subtotal_a += row.price_minor_a;
                subtotal_b += row.price_minor_b;
                rows.push(MatchedRow {
                    lot_number: row.lot_number,
                    item_name: row.item_name,
                    price_minor_a: row.price_minor_a,
                    price_minor_b: row.price_minor_b,
                });
            }

            // Boxes with no matches stay out of the breakdown entirely and
            // contribute neither totals nor payment instructions.
            if rows.is_empty() {
                continue;
            }

            total_a += subtotal_a;
            total_b += subtotal_b;
            if payment_instructions.is_none() {
                payment_instructions = entry.payment_instructions.clone();
            }
            boxes.push(BoxBreakdown {
                box_name: entry.name.clone(),
                deadline_text: entry.deadline_text.clone(),
                rows,
                subtotal_minor_a: subtotal_a,
                subtotal_minor_b: subtotal_b,
            });
        }

        if boxes.is_empty() {
            debug!("No unpaid rows for {}", who);
            return SummaryOutcome::NothingFound {
                handle: who,
                skipped_boxes,
            };
        }

        SummaryOutcome::Summary(BuyerSummary {
            handle: who,
            boxes,
            total_minor_a: total_a,
            total_minor_b: total_b,
            payment_instructions,
            skipped_boxes,
        })
    }

    fn is_paid(&self, status: &str) -> bool {
        status.trim().to_lowercase() == self.paid_sentinel
    }
}
