//! # MyShows MCP
//!
//! A Model Context Protocol (MCP) server that exposes a myshows.me account as a
//! fixed catalog of typed tools: catalog search, watch-status management,
//! profile listings, recommendations and the airing calendar.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`api`]: JSON-RPC client for the myshows.me API and the [`api::TrackerApi`] seam
//! - [`mcp`]: MCP protocol implementation and server
//! - [`config`]: Credentials and settings loading
//! - [`utils`]: HTTP client construction and retry utilities

pub mod api;
pub mod config;
pub mod mcp;
pub mod utils;

// Re-export commonly used types
pub use api::{ApiError, MyShowsClient, TrackerApi};
pub use config::{Credentials, Settings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
