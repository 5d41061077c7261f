pub mod http_sheet;

use async_trait::async_trait;

use crate::error::SourceError;

/// One sheet row: column header to cell text, in sheet column order.
///
/// Sources hand rows over untyped; the registry module coerces them into
/// typed records exactly once at the boundary.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    cells: Vec<(String, String)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self { cells: Vec::new() }
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            cells: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn push(&mut self, column: String, value: String) {
        self.cells.push((column, value));
    }

    /// Cell text under `column`, or None when the sheet has no such column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|(_, value)| value.trim().is_empty())
    }
}

/// The registry sheet listing every box and its metadata.
#[async_trait]
pub trait RegistrySource: Send + Sync {
    async fn list_all(&self) -> Result<Vec<RawRow>, SourceError>;
}

/// One box's ledger sheet, resolved by its location reference.
#[async_trait]
pub trait LedgerSource: Send + Sync {
    async fn fetch(&self, location: &str) -> Result<Vec<RawRow>, SourceError>;
}
