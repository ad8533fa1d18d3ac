use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::cache::Cache;
use crate::catalog::{CatalogEntry, CatalogProvider};
use crate::html;

/// Path of the constituents page on the wiki host. The base URL is
/// configurable so tests can point at a mock server.
pub const CONSTITUENTS_PAGE: &str = "/wiki/List_of_S%26P_500_companies";

const SYMBOL_COLUMN: &str = "Symbol";
const SECURITY_COLUMN: &str = "Security";
const SECTOR_COLUMN: &str = "GICS Sector";

// WikiCatalogProvider implementation for CatalogProvider
pub struct WikiCatalogProvider {
    base_url: String,
    cache: Arc<Cache<String, Vec<CatalogEntry>>>,
}

impl WikiCatalogProvider {
    pub fn new(base_url: &str, cache: Arc<Cache<String, Vec<CatalogEntry>>>) -> Self {
        WikiCatalogProvider {
            base_url: base_url.to_string(),
            cache,
        }
    }
}

/// Parses the constituent list out of the page's first HTML table. The
/// expected columns are located by header name; anything else about the
/// table shape is trusted.
pub fn parse_catalog(page: &str) -> Result<Vec<CatalogEntry>> {
    let table = html::first_table(page).ok_or_else(|| anyhow!("No table found in document"))?;

    let rows = html::rows(table);
    let header = rows
        .first()
        .map(|row| html::cells(row))
        .ok_or_else(|| anyhow!("Table has no rows"))?;

    let column = |name: &str| -> Result<usize> {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow!("Expected column '{}' not found in table header", name))
    };

    let symbol_idx = column(SYMBOL_COLUMN)?;
    let security_idx = column(SECURITY_COLUMN)?;
    let sector_idx = column(SECTOR_COLUMN)?;
    let width = symbol_idx.max(security_idx).max(sector_idx) + 1;

    let mut entries = Vec::with_capacity(rows.len().saturating_sub(1));
    for row in &rows[1..] {
        let cells = html::cells(row);
        if cells.len() < width {
            // Spacer/edit rows on the page carry no constituent data
            continue;
        }
        entries.push(CatalogEntry {
            symbol: cells[symbol_idx].clone(),
            name: cells[security_idx].clone(),
            sector: cells[sector_idx].clone(),
        });
    }

    if entries.is_empty() {
        bail!("Table matched the expected header but contains no entries");
    }

    Ok(entries)
}

#[async_trait]
impl CatalogProvider for WikiCatalogProvider {
    #[instrument(name = "WikiCatalogFetch", skip(self))]
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>> {
        let url = format!("{}{}", self.base_url, CONSTITUENTS_PAGE);
        if let Some(cached) = self.cache.get(&url).await {
            return Ok(cached);
        }

        debug!("Requesting constituent list from {}", url);

        let client = reqwest::Client::builder().user_agent("spdash/0.1").build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for URL: {}", e, url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for constituents page: {}",
                response.status(),
                url
            ));
        }

        let page = response.text().await?;
        let entries = parse_catalog(&page)?;
        debug!("Parsed {} constituents", entries.len());

        // Only successful fetches are memoized; a failed pass may retry
        self.cache.put(url, entries.clone()).await;

        Ok(entries)
    }
}
