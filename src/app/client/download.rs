//! The unit of work: fetch one location and persist its body
//!
//! Every strategy runs the same contract: derive the output path, issue one
//! GET, write the body on a success status, and turn whatever happened into a
//! [`FetchResult`] timed against the batch clock. Nothing in here returns an
//! error to the caller; failures become outcomes.
//!
//! Files are created only after a success status is seen. A body that fails
//! mid-transfer leaves a partial file behind; it is not cleaned up.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

use crate::app::clock::BatchClock;
use crate::app::models::{FetchOutcome, FetchResult};
use crate::app::naming::ResourceNamer;
use crate::constants::files;
use crate::errors::{FetchError, UnitResult};

/// Blocking fetcher used by thread and process workers
#[derive(Debug, Clone)]
pub struct BlockingFetcher {
    client: reqwest::blocking::Client,
}

impl BlockingFetcher {
    /// Creates a fetcher around a blocking client
    pub fn new(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }

    /// Runs one complete unit: naming, retrieval, persistence, timing
    pub fn fetch_unit(
        &self,
        namer: &ResourceNamer,
        location: &str,
        clock: &BatchClock,
    ) -> FetchResult {
        match namer.name_for(location) {
            Ok(output_path) => self.fetch(location, &output_path, clock),
            Err(e) => invalid_location(location, e, clock),
        }
    }

    /// Fetches `location` into `output_path`
    pub fn fetch(&self, location: &str, output_path: &Path, clock: &BatchClock) -> FetchResult {
        let outcome = FetchOutcome::from(self.transfer(location, output_path));
        finish(location, output_path, outcome, clock)
    }

    fn transfer(&self, location: &str, output_path: &Path) -> UnitResult<u64> {
        let mut response = self.client.get(parse_location(location)?).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        // Closed on every return path when `file` drops
        let mut file = File::create(output_path).map_err(|e| FetchError::io(output_path, &e))?;

        let mut buffer = vec![0u8; files::DOWNLOAD_CHUNK_SIZE];
        let mut written = 0u64;
        loop {
            let read = response.read(&mut buffer).map_err(|e| FetchError::Transport {
                message: format!("Body read failed: {}", e),
            })?;
            if read == 0 {
                break;
            }
            file.write_all(&buffer[..read])
                .map_err(|e| FetchError::io(output_path, &e))?;
            written += read as u64;
        }
        file.flush().map_err(|e| FetchError::io(output_path, &e))?;

        Ok(written)
    }
}

/// Async fetcher shared by every cooperative task
///
/// The body is streamed chunk by chunk into an open file so peak memory per
/// task stays bounded by one chunk.
#[derive(Debug, Clone)]
pub struct AsyncFetcher {
    client: reqwest::Client,
}

impl AsyncFetcher {
    /// Creates a fetcher around a shared async client
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Runs one complete unit: naming, retrieval, persistence, timing
    pub async fn fetch_unit(
        &self,
        namer: &ResourceNamer,
        location: &str,
        clock: &BatchClock,
    ) -> FetchResult {
        match namer.name_for(location) {
            Ok(output_path) => self.fetch(location, &output_path, clock).await,
            Err(e) => invalid_location(location, e, clock),
        }
    }

    /// Fetches `location` into `output_path`
    pub async fn fetch(
        &self,
        location: &str,
        output_path: &Path,
        clock: &BatchClock,
    ) -> FetchResult {
        let outcome = FetchOutcome::from(self.transfer(location, output_path).await);
        finish(location, output_path, outcome, clock)
    }

    async fn transfer(&self, location: &str, output_path: &Path) -> UnitResult<u64> {
        let mut response = self.client.get(parse_location(location)?).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let mut file = tokio::fs::File::create(output_path)
            .await
            .map_err(|e| FetchError::io(output_path, &e))?;

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk)
                .await
                .map_err(|e| FetchError::io(output_path, &e))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| FetchError::io(output_path, &e))?;

        Ok(written)
    }
}

fn parse_location(location: &str) -> UnitResult<Url> {
    Url::parse(location).map_err(|e| FetchError::Transport {
        message: format!("Invalid URL '{}': {}", location, e),
    })
}

fn finish(
    location: &str,
    output_path: &Path,
    outcome: FetchOutcome,
    clock: &BatchClock,
) -> FetchResult {
    let elapsed = clock.elapsed();
    debug!(location, ?outcome, ?elapsed, "Unit finished");
    FetchResult {
        location: location.to_string(),
        output_path: Some(output_path.to_path_buf()),
        elapsed,
        outcome,
    }
}

fn invalid_location(location: &str, error: FetchError, clock: &BatchClock) -> FetchResult {
    FetchResult {
        location: location.to_string(),
        output_path: None,
        elapsed: clock.elapsed(),
        outcome: error.into(),
    }
}
