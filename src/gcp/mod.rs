//! GCP API interaction module
//!
//! This module provides the core functionality for interacting with Google
//! Cloud Platform REST APIs: authentication, the HTTP client, the shared
//! pagination loop, and operation polling.
//!
//! # Module Structure
//!
//! - [`auth`] - GCP authentication using Application Default Credentials
//! - [`client`] - Main GCP client and per-service URL builders
//! - [`http`] - HTTP utilities for REST API calls
//! - [`error`] - Typed error taxonomy for API failures
//! - [`pager`] - Paginated listing loop (nextPageToken contract)
//! - [`poll`] - Poll-until-complete for long-running operations
//!
//! # Example
//!
//! ```ignore
//! use crate::gcp::client::GcpClient;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = GcpClient::new("my-project").await?;
//!     let datasets = client.get(&client.bigquery_url("datasets")).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod pager;
pub mod poll;
