//! Shared helpers for integration tests.
//!
//! [`spawn`] starts an Axum router on a random local port; [`fast_client`]
//! shrinks the backoff so retry tests finish quickly.

#![allow(dead_code)]

use axum::Router;
use romart_core::network::{FetchOptions, HttpClient, RetryConfig};
use romart_core::AdapterContext;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Start `router` on `127.0.0.1:0` and return the bound address.
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind random port");
    let addr = listener.local_addr().expect("failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    addr
}

pub fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{}{}", addr, path)
}

/// Client with millisecond backoff.
pub fn fast_client() -> HttpClient {
    let retry = RetryConfig::new()
        .with_base_delay(Duration::from_millis(5))
        .with_max_delay(Duration::from_millis(50))
        .with_max_jitter(Duration::ZERO);
    HttpClient::with_retry_config(retry).expect("failed to build client")
}

pub fn fetch_options(retries: u32) -> FetchOptions {
    FetchOptions::default()
        .with_retries(retries)
        .with_timeout(Duration::from_secs(2))
}

pub fn context() -> AdapterContext {
    AdapterContext::new(Arc::new(fast_client()), fetch_options(1))
}

/// Request counter shared with handlers.
#[derive(Clone, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
    pub fn bump(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
