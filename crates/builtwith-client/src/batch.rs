//! Keyword lookups for arbitrarily long domain lists.

use crate::executor::BuiltWithClient;
use crate::page::KeywordRecord;
use builtwith_core::{BuiltWithError, OutputFormat, Result, MAX_DOMAINS_PER_REQUEST};

/// Result of one chunk.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Position of the chunk, starting at 0
    pub index: usize,
    /// Domains sent in this chunk, in input order
    pub domains: Vec<String>,
    /// Keyword records, or the error that ended this chunk
    pub result: std::result::Result<Vec<KeywordRecord>, BuiltWithError>,
}

impl BatchOutcome {
    /// Whether the chunk succeeded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

impl BuiltWithClient {
    /// Look up keywords for `domains` in consecutive chunks of `batch_size`.
    ///
    /// Chunks run one after another. A failed chunk is recorded in its slot
    /// and the remaining chunks still run.
    ///
    /// # Errors
    /// Returns a validation error if `batch_size` is 0 or above 16. Nothing is
    /// sent in that case.
    pub async fn process_batches(
        &self,
        domains: &[String],
        batch_size: usize,
    ) -> Result<Vec<BatchOutcome>> {
        if batch_size == 0 || batch_size > MAX_DOMAINS_PER_REQUEST {
            return Err(BuiltWithError::Validation(format!(
                "batch size must be between 1 and {MAX_DOMAINS_PER_REQUEST}, got {batch_size}"
            )));
        }

        let mut outcomes = Vec::with_capacity(domains.len().div_ceil(batch_size));
        for (index, chunk) in domains.chunks(batch_size).enumerate() {
            let result = self
                .keywords(chunk.iter().cloned(), OutputFormat::Json)
                .await
                .map(|page| page.keywords);

            match &result {
                Ok(records) => tracing::debug!(
                    chunk = index,
                    domains = chunk.len(),
                    records = records.len(),
                    "keyword chunk done"
                ),
                Err(e) => tracing::warn!(
                    chunk = index,
                    domains = chunk.len(),
                    kind = ?e.kind(),
                    "keyword chunk failed: {e}"
                ),
            }

            outcomes.push(BatchOutcome {
                index,
                domains: chunk.to_vec(),
                result,
            });
        }

        Ok(outcomes)
    }
}
