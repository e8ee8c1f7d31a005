//! Integration tests for dump-feed.
//!
//! These tests run the HTTP sources against a local mock server:
//! - Request shape (paths, query, auth header)
//! - Partial and total batch failure
//! - Response matching

pub mod common;
