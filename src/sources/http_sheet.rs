// HTTP sheet source - fetches a sheet's CSV export and hands rows over
// as RawRow records. Location references are the export URLs themselves.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::SourceError;
use crate::sources::{LedgerSource, RawRow, RegistrySource};

pub struct HttpSheetSource {
    client: Client,
    registry_location: String,
    timeout_secs: u64,
}

impl HttpSheetSource {
    pub fn new(registry_location: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            registry_location,
            timeout_secs,
        }
    }

    async fn fetch_csv(&self, location: &str) -> Result<Vec<RawRow>, SourceError> {
        let response = self
            .client
            .get(location)
            .send()
            .await
            .map_err(|e| annotate_timeout(e, self.timeout_secs))?;

        if !response.status().is_success() {
            return Err(SourceError::Unavailable(format!(
                "{} returned HTTP {}",
                location,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| annotate_timeout(e, self.timeout_secs))?;

        let rows = parse_csv(&body)?;
        debug!("Fetched {} rows from {}", rows.len(), location);
        Ok(rows)
    }
}

fn annotate_timeout(error: reqwest::Error, timeout_secs: u64) -> SourceError {
    if error.is_timeout() {
        SourceError::Timeout(timeout_secs)
    } else {
        SourceError::Unavailable(error.to_string())
    }
}

/// Parse CSV text into raw rows keyed by the header line. Rows shorter than
/// the header are padded by the flexible reader; fully blank rows are
/// dropped (sheets often export trailing empties).
pub fn parse_csv(body: &str) -> Result<Vec<RawRow>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(SourceError::from)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(SourceError::from)?;
        let mut row = RawRow::new();
        for (i, header) in headers.iter().enumerate() {
            let value = record.get(i).unwrap_or("").to_string();
            row.push(header.clone(), value);
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }

    Ok(rows)
}

#[async_trait]
impl RegistrySource for HttpSheetSource {
    async fn list_all(&self) -> Result<Vec<RawRow>, SourceError> {
        self.fetch_csv(&self.registry_location).await
    }
}

#[async_trait]
impl LedgerSource for HttpSheetSource {
    async fn fetch(&self, location: &str) -> Result<Vec<RawRow>, SourceError> {
        self.fetch_csv(location).await
    }
}
