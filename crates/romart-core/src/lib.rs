//! romart core - headless engine for resolving ROM artwork.
//!
//! Given a ROM file, the engine queries remote artwork sources in priority
//! order and returns a directly fetchable media URL. Filename-based sources
//! download one listing per (platform, media type) and match ROM names
//! locally, tolerating region tags, revisions and other naming noise.
//!
//! # Example
//!
//! ```rust,ignore
//! use romart_core::{
//!     AdapterContext, AdapterRegistry, FetchOptions, HttpClient, LookupParams, MediaType,
//!     PlatformId, ResolverSettings, RomFile,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> romart_core::Result<()> {
//!     let settings = ResolverSettings::default();
//!     let ctx = AdapterContext::new(
//!         Arc::new(HttpClient::new()?),
//!         FetchOptions::from_settings(&settings),
//!     );
//!     let registry = AdapterRegistry::with_builtin_adapters(ctx);
//!     registry.initialize_all(&settings.sources).await;
//!
//!     let rom = RomFile::from_path("roms/Tetris (World).gb".as_ref())?;
//!     let params = LookupParams::new(rom, PlatformId(9), MediaType::BoxFront)
//!         .with_regions(["USA", "World"]);
//!
//!     if let Some(hit) = registry.lookup_with_fallback(&params, &settings.sources).await {
//!         println!("{} -> {:?}", hit.adapter_id, hit.result.media_url);
//!     }
//!
//!     registry.dispose_all().await;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod batch;
pub mod cancel;
pub mod config;
pub mod error;
pub mod manifest;
pub mod models;
pub mod network;
pub mod registry;
pub mod systems;

// Re-export commonly used types
pub use adapters::{
    AdapterCapabilities, AdapterContext, AdapterHooks, AdapterLifecycle, ArtworkAdapter,
    LifecycleState, PlatformSupport,
};
pub use batch::{BatchItem, BatchOptions, BatchReport, BatchResolver, OutcomeStatus, RomOutcome};
pub use cancel::{CancellationToken, CancelledError};
pub use config::{AdapterSourceConfig, NetworkConfig, ResolverSettings};
pub use error::{ArtworkError, HttpError, HttpErrorKind, Result};
pub use manifest::{ManifestCache, ManifestIndex, ManifestMatch, MatchTier};
pub use models::{
    ArtworkLookupResult, HashAlgorithm, LookupParams, MediaType, PlatformId, RomFile, RomHash,
};
pub use network::{FetchOptions, HttpClient};
pub use registry::{AdapterRegistry, FallbackHit, InitReport};
pub use systems::SystemInfo;
