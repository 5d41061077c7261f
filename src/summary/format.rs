// Plain-text rendering of a summary, shared by the API response and the
// outbound notifier.

use crate::summary::models::SummaryOutcome;

/// Minor units to a "major.minor" display string (two decimal places).
pub fn format_minor(amount: i64) -> String {
    format!("{}.{:02}", amount / 100, amount % 100)
}

pub fn render_summary(outcome: &SummaryOutcome) -> String {
    let summary = match outcome {
        SummaryOutcome::NothingFound {
            handle,
            skipped_boxes,
        } => {
            let mut out = format!("No unpaid lots found for {handle} in any active box.");
            if !skipped_boxes.is_empty() {
                out.push_str(&format!(
                    "\n⚠ Could not check: {}",
                    skipped_boxes.join(", ")
                ));
            }
            return out;
        }
        SummaryOutcome::Summary(summary) => summary,
    };

    let mut out = format!("Unpaid lots for {}:\n", summary.handle);

    for b in &summary.boxes {
        out.push_str(&format!("\n📦 {}\n", b.box_name));
        for row in &b.rows {
            out.push_str(&format!(
                "  lot {} — {} — {} / {}\n",
                row.lot_number,
                row.item_name,
                format_minor(row.price_minor_a),
                format_minor(row.price_minor_b),
            ));
        }
        out.push_str(&format!(
            "  subtotal: {} / {}\n",
            format_minor(b.subtotal_minor_a),
            format_minor(b.subtotal_minor_b),
        ));
        if let Some(deadline) = &b.deadline_text {
            out.push_str(&format!("  deadline: {deadline}\n"));
        }
    }

    out.push_str(&format!(
        "\nTotal: {} / {}\n",
        format_minor(summary.total_minor_a),
        format_minor(summary.total_minor_b),
    ));

    if let Some(instructions) = &summary.payment_instructions {
        out.push_str(&format!("Pay to: {instructions}\n"));
    }

    if !summary.skipped_boxes.is_empty() {
        out.push_str(&format!(
            "⚠ Could not check: {}\n",
            summary.skipped_boxes.join(", ")
        ));
    }

    out
}
