//! Network utilities for HTTP operations, retries, and resilience.
//!
//! This module provides:
//! - Retry logic with exponential backoff and jitter
//! - A fetch client that classifies failures and enforces per-attempt deadlines

mod client;
mod retry;

pub use client::{
    extract_domain, is_retryable_transport_message, ByteStream, FetchOptions, HttpClient,
};
pub use retry::{retry_async, RetryConfig, RetryStats};
