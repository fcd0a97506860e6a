//! Batched elevation lookups against a remote service.
//!
//! Samples are fetched in batches bounded by the remote API's request limit.
//! Every failure mode below the top level degrades instead of aborting: a
//! non-success status, a transport error or a malformed/short payload leaves
//! the affected batch at zero elevation with a logged warning, and the grid
//! as a whole stays usable.

use instant::Duration;
use serde::{Deserialize, Serialize};

use crate::terrain::grid::GridCell;

/// Upper bound on locations per request, matching the remote API limit.
pub const MAX_BATCH_SIZE: usize = 20_000;

const DEFAULT_ENDPOINT: &str = "https://api.open-elevation.com/api/v1/lookup";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct LookupRequest {
    locations: Vec<Location>,
}

#[derive(Debug, Serialize)]
struct Location {
    latitude: f64,
    longitude: f64,
}

/// Response payload. Every field is optional so a sparse or sloppy payload
/// degrades per sample instead of failing deserialization.
#[derive(Debug, Deserialize)]
pub(crate) struct LookupResponse {
    #[serde(default)]
    pub(crate) results: Vec<LookupResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LookupResult {
    #[serde(default)]
    pub(crate) elevation: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ElevationClient {
    http: reqwest::Client,
    endpoint: String,
}

impl Default for ElevationClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl ElevationClient {
    pub fn new(endpoint: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("HTTP client construction cannot fail with these options");
        Self {
            http,
            endpoint: endpoint.to_string(),
        }
    }

    /// Fill in elevations for all samples, one request per batch.
    pub async fn fetch_elevations(&self, cells: &mut [GridCell]) {
        for (batch_index, batch) in cells.chunks_mut(MAX_BATCH_SIZE).enumerate() {
            match self.fetch_batch(batch).await {
                Ok(response) => apply_batch(batch, &response),
                Err(e) => {
                    log::warn!(
                        "elevation batch {} ({} samples) failed, keeping zero elevation: {}",
                        batch_index,
                        batch.len(),
                        e
                    );
                }
            }
        }
    }

    async fn fetch_batch(&self, batch: &[GridCell]) -> anyhow::Result<LookupResponse> {
        let request = LookupRequest {
            locations: batch
                .iter()
                .map(|cell| Location {
                    latitude: cell.lat,
                    longitude: cell.lon,
                })
                .collect(),
        };
        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;
        anyhow::ensure!(
            response.status().is_success(),
            "elevation service returned {}",
            response.status()
        );
        Ok(response.json::<LookupResponse>().await?)
    }
}

/// Assign returned elevations to their samples. The response array is
/// parallel to the batch; missing entries or missing elevation fields leave
/// the sample at zero.
pub(crate) fn apply_batch(batch: &mut [GridCell], response: &LookupResponse) {
    if response.results.len() < batch.len() {
        log::warn!(
            "elevation response has {} results for {} samples, padding with zero",
            response.results.len(),
            batch.len()
        );
    }
    for (cell, result) in batch.iter_mut().zip(&response.results) {
        cell.elevation = result.elevation.unwrap_or(0.0);
    }
}
