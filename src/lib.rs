//! Thin command-line wrappers over Google Cloud REST APIs (BigQuery v2,
//! Pub/Sub v1, Cloud Logging v2, Cloud Storage v1).
//!
//! The library surface exists for the `gcpctl` binary and for integration
//! tests; the reusable pieces are the [`gcp::pager`] listing loop,
//! [`gcp::poll`] operation polling, and the per-service wrappers in
//! [`services`].

pub mod commands;
pub mod config;
pub mod gcp;
pub mod output;
pub mod prompt;
pub mod services;
