//! Constituent catalog abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One index constituent as listed on the source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub symbol: String,
    pub name: String,
    pub sector: String,
}

#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetches the full constituent list. Symbols are unique; order follows
    /// the source document. Errors abort the current render pass.
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>>;
}
