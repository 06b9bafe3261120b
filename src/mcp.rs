//! MCP tool surface for the catalog.
//!
//! [`CatalogTools`] registers the catalog operations as MCP tools. Results are
//! returned as pretty-printed JSON text; failures become tool errors carrying
//! the error message.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use mcp_directory::cache::CatalogCache;
//! use mcp_directory::catalog::CatalogService;
//! use mcp_directory::fetcher::{fetcher_for, DEFAULT_SOURCE};
//! use mcp_directory::mcp::CatalogTools;
//!
//! let cache = CatalogCache::new(fetcher_for(DEFAULT_SOURCE), DEFAULT_SOURCE);
//! let tools = CatalogTools::new(Arc::new(CatalogService::new(cache)));
//! ```

use rmcp::model::{Content, Implementation, IntoContents, ProtocolVersion, ServerCapabilities};
use rmcp::{ServerHandler, model::ServerInfo, tool};
use serde::Serialize;
use std::sync::Arc;

use crate::catalog::{CatalogError, CatalogService};
use crate::entry::Entry;
use crate::query::{
    DetailsParams, FeatureParams, FeatureResult, ListParams, ListResult, RandomParams,
    RandomResult, RefreshResult,
};

fn json_contents<T: Serialize>(value: &T) -> Vec<Content> {
    match serde_json::to_string_pretty(value) {
        Ok(text) => vec![Content::text(text)],
        Err(e) => vec![Content::text(format!("Failed to encode result: {e}"))],
    }
}

macro_rules! json_into_contents {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoContents for $ty {
                fn into_contents(self) -> Vec<Content> {
                    json_contents(&self)
                }
            }
        )*
    };
}

json_into_contents!(ListResult, FeatureResult, RandomResult, RefreshResult, Entry);

impl IntoContents for CatalogError {
    fn into_contents(self) -> Vec<Content> {
        vec![Content::text(self.to_string())]
    }
}

/// MCP handler exposing catalog queries as tools.
#[derive(Clone)]
pub struct CatalogTools {
    service: Arc<CatalogService>,
}

#[tool(tool_box)]
impl CatalogTools {
    /// Creates a handler answering from the given catalog service.
    pub fn new(service: Arc<CatalogService>) -> Self {
        Self { service }
    }

    /// Lists catalog entries, filtered by category and optional search text.
    ///
    /// # Arguments
    /// * `params` - Category (`all` by default), search text and result limit
    ///
    /// # Returns
    /// * `Ok(ListResult)` - Matching entries with the pre-truncation total
    /// * `Err(CatalogError)` - If the catalog could not be loaded
    #[tool(description = "List catalog entries, optionally filtered by category and search text")]
    async fn list_entries(
        &self,
        #[tool(aggr)] params: ListParams,
    ) -> Result<ListResult, CatalogError> {
        self.service.list(&params).await
    }

    /// Looks up one entry by name, ignoring case.
    ///
    /// # Returns
    /// * `Ok(Entry)` - The first entry with that name
    /// * `Err(CatalogError::NotFound)` - If no entry has that name
    #[tool(description = "Get the full record of one catalog entry by its exact name")]
    async fn get_entry_details(
        &self,
        #[tool(aggr)] params: DetailsParams,
    ) -> Result<Entry, CatalogError> {
        self.service.get_details(&params.name).await
    }

    /// Searches entry names and descriptions for a feature keyword.
    #[tool(description = "Find catalog entries whose name or description mentions a feature")]
    async fn search_by_feature(
        &self,
        #[tool(aggr)] params: FeatureParams,
    ) -> Result<FeatureResult, CatalogError> {
        self.service.search_by_feature(&params).await
    }

    /// Samples distinct entries uniformly at random from one category or all.
    ///
    /// # Arguments
    /// * `params` - Number of entries wanted and the category to draw from
    #[tool(description = "Pick a random selection of catalog entries")]
    async fn get_random_entries(
        &self,
        #[tool(aggr)] params: RandomParams,
    ) -> Result<RandomResult, CatalogError> {
        self.service.get_random(&params).await
    }

    /// Reloads the catalog from its source, bypassing the TTL.
    ///
    /// # Returns
    /// * `Ok(RefreshResult)` - Entry count and fetch time of the new snapshot
    /// * `Err(CatalogError)` - If fetching failed; the previous snapshot is kept
    #[tool(description = "Refetch and reparse the catalog document, ignoring the cache")]
    async fn refresh_catalog(&self) -> Result<RefreshResult, CatalogError> {
        self.service.refresh().await
    }
}

#[tool(tool_box)]
impl ServerHandler for CatalogTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "This server provides a searchable directory of MCP servers. \
                Use 'list_entries' to browse by category (reference, official, community), \
                'search_by_feature' to find servers for a task, 'get_entry_details' for one server, \
                and 'get_random_entries' for a sample. The directory is cached for an hour; \
                'refresh_catalog' reloads it immediately."
                    .to_string(),
            ),
        }
    }
}
