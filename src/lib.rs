//! MCP Server Directory Service
//!
//! This crate exposes a directory of MCP servers, parsed from a community
//! maintained markdown catalog, through a small set of read-only queries. The
//! parsed catalog is cached and reloaded once it is older than its TTL.
//!
//! # Features
//!
//! - Parse the catalog document into structured entries
//! - List, search, look up and randomly sample entries
//! - Time-bounded caching with explicit refresh
//! - MCP server implementation over stdio or SSE
//!
//! # Modules
//!
//! - [`entry`]: Catalog entry record and categories
//! - [`parser`]: Markdown catalog parser
//! - [`fetcher`]: Retrieval of the raw catalog document
//! - [`cache`]: Snapshot cache and freshness control
//! - [`query`]: Query operations over a snapshot
//! - [`catalog`]: Service tying cache and queries together
//! - [`mcp`]: MCP tool handler
//! - [`server`]: Transport startup and logging setup

pub mod cache;
pub mod catalog;
pub mod entry;
pub mod fetcher;
pub mod mcp;
pub mod parser;
pub mod query;
pub mod server;
