pub mod models;
pub mod reader;

pub use models::{LedgerRow, RegistryEntry};
pub use reader::RegistryReader;
