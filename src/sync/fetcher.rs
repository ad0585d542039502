//! Paginated GraphQL fetcher
//!
//! Page 1 is fetched on its own because it carries the total page count.
//! Pages 2..N are then polled concurrently on the calling task and joined
//! at a single barrier; each page converts its own failure into an empty
//! contribution so one bad page never affects the others.

use crate::config::SourceConfig;
use crate::storage::NewCharacter;
use crate::sync::query::{parse_page_response, CharactersPage, GraphQlRequest};
use crate::{FetchError, FetchResult, SyncError};
use futures::future::join_all;
use futures::FutureExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use url::Url;

/// Builds an HTTP client from the source configuration
///
/// Timeouts are only applied when configured; otherwise the transport
/// defaults stand.
pub fn build_http_client(config: &SourceConfig) -> Result<Client, reqwest::Error> {
    let user_agent = config
        .user_agent
        .clone()
        .unwrap_or_else(|| format!("character-sync/{}", env!("CARGO_PKG_VERSION")));

    let mut builder = Client::builder().user_agent(user_agent).gzip(true).brotli(true);

    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = config.connect_timeout_secs {
        builder = builder.connect_timeout(Duration::from_secs(secs));
    }

    builder.build()
}

/// Fetches every character page from one GraphQL endpoint
///
/// The pooled client lives as long as the fetcher, so a fetcher should be
/// scoped to a single sync run.
#[derive(Debug)]
pub struct CharacterFetcher {
    client: Client,
    endpoint: Url,
}

impl CharacterFetcher {
    /// Creates a fetcher for the configured endpoint
    pub fn new(config: &SourceConfig) -> Result<Self, SyncError> {
        let endpoint = Url::parse(&config.endpoint)?;
        let client = build_http_client(config)?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetches and parses a single page
    ///
    /// # Errors
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | Connection, TLS or body read failure | `Transport` |
    /// | Non-2xx status, whether or not the body could be read | `Status` |
    /// | `errors` key in body | `GraphQl` |
    /// | `data` key absent or null | `MissingData` |
    /// | Anything else not matching the query shape | `Malformed` |
    pub async fn fetch_page(&self, page: u32) -> FetchResult<CharactersPage> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .json(&GraphQlRequest::characters(page))
            .send()
            .await
            .map_err(|source| FetchError::Transport { page, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|e| {
                tracing::debug!(page, error = %e, "Failed to read error response body");
                String::new()
            });
            return Err(FetchError::Status {
                page,
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Transport { page, source })?;

        parse_page_response(page, &body)
    }

    /// Fetches one of pages 2..N, logging and swallowing any failure
    async fn fetch_page_or_empty(&self, page: u32) -> Vec<NewCharacter> {
        match self.fetch_page(page).await {
            Ok(fetched) => fetched.results,
            Err(e) => {
                tracing::warn!(page = e.page(), error = %e, "Page request failed, skipping");
                Vec::new()
            }
        }
    }

    /// Fetches all characters currently available from the source
    ///
    /// Returns an empty list when page 1 fails for any reason. Failures of
    /// later pages only drop those pages. The result order is unspecified.
    pub async fn fetch_all(&self) -> Vec<NewCharacter> {
        let start = Instant::now();

        let first = match self.fetch_page(1).await {
            Ok(first) => first,
            Err(e) => {
                tracing::error!(error = %e, "First page request failed, aborting fetch");
                return Vec::new();
            }
        };

        let total_pages = first.info.pages;
        let mut characters = first.results;
        tracing::debug!(total_pages, "Discovered page count");

        if total_pages > 1 {
            let rest = collect_pages(
                (2..=total_pages).map(|page| (page, self.fetch_page_or_empty(page))),
            )
            .await;
            characters.extend(rest);
        }

        tracing::info!(
            "Took {} characters from {} pages in {:.3}s",
            characters.len(),
            total_pages,
            start.elapsed().as_secs_f64()
        );

        characters
    }
}

/// Polls every page future concurrently and joins them at one barrier
///
/// A future that panics is logged and contributes nothing; the others are
/// unaffected.
async fn collect_pages<I, F>(pages: I) -> Vec<NewCharacter>
where
    I: IntoIterator<Item = (u32, F)>,
    F: Future<Output = Vec<NewCharacter>>,
{
    let (numbers, tasks): (Vec<u32>, Vec<_>) = pages
        .into_iter()
        .map(|(page, task)| (page, AssertUnwindSafe(task).catch_unwind()))
        .unzip();

    let mut characters = Vec::new();
    for (page, outcome) in numbers.into_iter().zip(join_all(tasks).await) {
        match outcome {
            Ok(results) => characters.extend(results),
            Err(_) => tracing::error!(page, "Page task panicked, skipping"),
        }
    }
    characters
}
