//! Artwork source adapters.
//!
//! Every source implements [`ArtworkAdapter`]. The trait carries the
//! mandatory operations; the optional hooks (`prefetch`, `dispose`) have
//! default bodies and are advertised through [`AdapterCapabilities::hooks`],
//! which callers consult instead of probing behaviour.

mod libretro;
mod libretro_github;
mod screenscraper;
mod thumbnails;
mod url_template;

pub use libretro::LibretroAdapter;
pub use libretro_github::LibretroGithubAdapter;
pub use screenscraper::ScreenScraperAdapter;
pub use url_template::UrlTemplateAdapter;

use crate::models::{ArtworkLookupResult, LookupParams, MediaType, PlatformId};
use crate::network::{FetchOptions, HttpClient};
use crate::{ArtworkError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Platforms an adapter can serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformSupport {
    All,
    Only(BTreeSet<PlatformId>),
}

impl PlatformSupport {
    pub fn only<I: IntoIterator<Item = u32>>(ids: I) -> Self {
        PlatformSupport::Only(ids.into_iter().map(PlatformId).collect())
    }

    pub fn contains(&self, platform: PlatformId) -> bool {
        match self {
            PlatformSupport::All => true,
            PlatformSupport::Only(set) => set.contains(&platform),
        }
    }
}

/// Optional lifecycle hooks an adapter implements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdapterHooks {
    pub prefetch: bool,
    pub dispose: bool,
}

/// What a source can do. Fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterCapabilities {
    pub hash_lookup: bool,
    pub filename_lookup: bool,
    pub media_types: Vec<MediaType>,
    pub platforms: PlatformSupport,
    pub hooks: AdapterHooks,
}

impl AdapterCapabilities {
    pub fn supports_media(&self, media: MediaType) -> bool {
        self.media_types.contains(&media)
    }
}

/// Lifecycle stage of an adapter instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    Uninitialized = 0,
    Initialized = 1,
    Prefetched = 2,
    Disposed = 3,
}

/// Atomic holder for [`LifecycleState`].
#[derive(Debug)]
pub struct AdapterLifecycle(AtomicU8);

impl AdapterLifecycle {
    pub fn new() -> Self {
        Self(AtomicU8::new(LifecycleState::Uninitialized as u8))
    }

    pub fn load(&self) -> LifecycleState {
        match self.0.load(Ordering::SeqCst) {
            1 => LifecycleState::Initialized,
            2 => LifecycleState::Prefetched,
            3 => LifecycleState::Disposed,
            _ => LifecycleState::Uninitialized,
        }
    }

    pub fn store(&self, state: LifecycleState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }

    /// True once initialized and not disposed.
    pub fn is_ready(&self) -> bool {
        matches!(
            self.load(),
            LifecycleState::Initialized | LifecycleState::Prefetched
        )
    }

    /// Record a successful prefetch. Ignored unless the adapter is ready.
    pub fn mark_prefetched(&self) {
        let _ = self.0.compare_exchange(
            LifecycleState::Initialized as u8,
            LifecycleState::Prefetched as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }
}

impl Default for AdapterLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared resources handed to adapter factories.
#[derive(Debug, Clone)]
pub struct AdapterContext {
    pub http: Arc<HttpClient>,
    pub fetch: FetchOptions,
}

impl AdapterContext {
    pub fn new(http: Arc<HttpClient>, fetch: FetchOptions) -> Self {
        Self { http, fetch }
    }
}

/// A remote artwork source.
#[async_trait]
pub trait ArtworkAdapter: Send + Sync {
    /// Stable identifier used in configuration (e.g. `"libretro"`).
    fn id(&self) -> &str;

    fn capabilities(&self) -> &AdapterCapabilities;

    /// One-time setup such as credential validation. Idempotent.
    async fn initialize(&self) -> Result<()>;

    /// Resolve artwork for one ROM.
    ///
    /// Returns "not found" before initialization and after disposal. Source
    /// failures are reported as "not found" by the built-in adapters.
    async fn lookup(&self, params: &LookupParams) -> Result<ArtworkLookupResult>;

    /// Cheap, offline check whether this adapter serves `platform`.
    fn supports_system(&self, platform: PlatformId) -> bool {
        self.capabilities().platforms.contains(platform)
    }

    /// Minimum spacing between successive lookups against this source.
    fn rate_limit_delay(&self) -> Duration;

    /// Warm the manifest for (platform, media). Fails on any fetch error.
    ///
    /// Only called when `capabilities().hooks.prefetch` is set.
    async fn prefetch(&self, _platform: PlatformId, _media: MediaType) -> Result<()> {
        Ok(())
    }

    /// Drop cached state. Only called when `capabilities().hooks.dispose` is set.
    async fn dispose(&self) {}
}

/// Parse a source's free-form options into its typed option struct.
///
/// `null` yields the defaults.
pub fn parse_options<T>(adapter: &str, options: &serde_json::Value) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if options.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(options.clone()).map_err(|e| ArtworkError::InvalidOptions {
        adapter: adapter.to_string(),
        message: e.to_string(),
    })
}

/// Validate an absolute http(s) URL option and strip its trailing slash.
pub(crate) fn parse_base_url(adapter: &str, field: &str, value: &str) -> Result<String> {
    let parsed = url::Url::parse(value).map_err(|e| ArtworkError::InvalidOptions {
        adapter: adapter.to_string(),
        message: format!("{} '{}' is not a valid URL: {}", field, value, e),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ArtworkError::InvalidOptions {
            adapter: adapter.to_string(),
            message: format!("{} must use http or https", field),
        });
    }
    Ok(value.trim_end_matches('/').to_string())
}
