// Typed records for the two sheet shapes the system reads. All coercion of
// messy cell text happens here, once, at the boundary; downstream code never
// touches raw cells.

use serde::Serialize;

use crate::sources::RawRow;

// Registry sheet columns
pub const COL_ACTIVE: &str = "Active";
pub const COL_BOX_NAME: &str = "Box name";
pub const COL_SHEET_REFERENCE: &str = "Sheet reference";
pub const COL_PAYMENT_DEADLINE: &str = "Payment deadline";
pub const COL_PAYMENT_INSTRUCTIONS: &str = "Payment instructions";

// Ledger sheet columns
pub const COL_LOT_NUMBER: &str = "Lot number";
pub const COL_ITEM_NAME: &str = "Item name";
pub const COL_BUYER_HANDLE: &str = "Buyer handle";
pub const COL_PRICE_A: &str = "Price currency A";
pub const COL_PRICE_B: &str = "Price currency B";
pub const COL_PAYMENT_STATUS: &str = "Payment status";

/// One row of the registry sheet.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryEntry {
    pub name: String,
    /// Opaque reference resolved by the ledger source
    pub location: String,
    pub active: bool,
    pub deadline_text: Option<String>,
    pub payment_instructions: Option<String>,
}

impl RegistryEntry {
    /// Coerce a raw registry row. Returns None for rows missing the name or
    /// location, which have no identity and cannot be tracked.
    pub fn from_raw(row: &RawRow) -> Option<Self> {
        let name = row.get(COL_BOX_NAME)?.trim();
        let location = row.get(COL_SHEET_REFERENCE)?.trim();
        if name.is_empty() || location.is_empty() {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            location: location.to_string(),
            active: parse_active(row.get(COL_ACTIVE).unwrap_or("")),
            deadline_text: non_empty(row.get(COL_PAYMENT_DEADLINE)),
            payment_instructions: non_empty(row.get(COL_PAYMENT_INSTRUCTIONS)),
        })
    }

    /// Stable identity key; survives edits to every other field.
    pub fn key(&self) -> String {
        format!("{}|{}", self.name, self.location)
    }

    /// Dedup key for the deadline-reminder notification class. Separate from
    /// `key` so one box can produce both a "new" and a "reminder" exactly once.
    pub fn reminder_key(&self) -> String {
        format!("{}|{}|reminder", self.name, self.location)
    }
}

/// One row of a box's ledger sheet. Never fails: missing columns and
/// unparseable numbers collapse to defaults so a single sloppy cell cannot
/// blank a buyer's summary.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerRow {
    /// Free-form label, displayed verbatim, never renumbered
    pub lot_number: String,
    pub item_name: String,
    pub buyer_handle: String,
    pub price_minor_a: i64,
    pub price_minor_b: i64,
    pub payment_status: String,
}

impl LedgerRow {
    pub fn from_raw(row: &RawRow) -> Self {
        Self {
            lot_number: row.get(COL_LOT_NUMBER).unwrap_or("").trim().to_string(),
            item_name: row.get(COL_ITEM_NAME).unwrap_or("").trim().to_string(),
            buyer_handle: row.get(COL_BUYER_HANDLE).unwrap_or("").trim().to_string(),
            price_minor_a: parse_minor_amount(row.get(COL_PRICE_A).unwrap_or("")),
            price_minor_b: parse_minor_amount(row.get(COL_PRICE_B).unwrap_or("")),
            payment_status: row.get(COL_PAYMENT_STATUS).unwrap_or("").trim().to_string(),
        }
    }
}

fn non_empty(cell: Option<&str>) -> Option<String> {
    let text = cell?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Truthy values seen across real registry sheets; anything else is inactive.
fn parse_active(cell: &str) -> bool {
    matches!(
        cell.trim().to_lowercase().as_str(),
        "true" | "yes" | "1" | "да" | "+"
    )
}

/// Best-effort integer minor-unit amount. Takes the leading digit run after
/// stripping spaces, so "1 000" and "1000 rub" both read as 1000; anything
/// without a leading digit reads as 0.
pub fn parse_minor_amount(cell: &str) -> i64 {
    let compact: String = cell.chars().filter(|c| !c.is_whitespace()).collect();
    let digits: String = compact.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}
