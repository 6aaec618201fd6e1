//! libretro thumbnail server (HTML directory listings).

use super::thumbnails::{self, encode_segment};
use super::{
    parse_base_url, parse_options, AdapterCapabilities, AdapterContext, AdapterHooks,
    AdapterLifecycle, ArtworkAdapter, LifecycleState,
};
use crate::config::AdapterConfig;
use crate::manifest::{parse_html_listing, ManifestCache, ManifestIndex, ManifestKey};
use crate::models::{ArtworkLookupResult, LookupParams, MediaType, PlatformId};
use crate::network::{FetchOptions, HttpClient};
use crate::systems::SystemInfo;
use crate::{ArtworkError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LibretroOptions {
    base_url: Option<String>,
}

/// Resolves artwork against `thumbnails.libretro.com`.
pub struct LibretroAdapter {
    http: Arc<HttpClient>,
    fetch: FetchOptions,
    base_url: String,
    capabilities: AdapterCapabilities,
    lifecycle: AdapterLifecycle,
    manifests: ManifestCache,
}

impl LibretroAdapter {
    pub const ID: &'static str = "libretro";

    pub fn new(ctx: &AdapterContext, options: &serde_json::Value) -> Result<Self> {
        let options: LibretroOptions = parse_options(Self::ID, options)?;
        let base_url = parse_base_url(
            Self::ID,
            "base_url",
            options
                .base_url
                .as_deref()
                .unwrap_or(AdapterConfig::LIBRETRO_BASE_URL),
        )?;

        Ok(Self {
            http: ctx.http.clone(),
            fetch: ctx.fetch.clone(),
            base_url,
            capabilities: AdapterCapabilities {
                hash_lookup: false,
                filename_lookup: true,
                media_types: thumbnails::MEDIA_TYPES.to_vec(),
                platforms: thumbnails::supported_platforms(),
                hooks: AdapterHooks {
                    prefetch: true,
                    dispose: true,
                },
            },
            lifecycle: AdapterLifecycle::new(),
            manifests: ManifestCache::new(),
        })
    }

    fn listing_url(&self, system: &SystemInfo, dir: &str) -> String {
        format!(
            "{}/{}/{}/",
            self.base_url,
            encode_segment(system.libretro_dir),
            dir
        )
    }

    fn media_url(&self, system: &SystemInfo, dir: &str, name: &str) -> String {
        format!(
            "{}/{}/{}/{}.png",
            self.base_url,
            encode_segment(system.libretro_dir),
            dir,
            encode_segment(name)
        )
    }

    async fn manifest(&self, platform: PlatformId, media: MediaType) -> Result<Arc<ManifestIndex>> {
        let (system, dir) = thumbnails::target(platform, media).ok_or_else(|| {
            ArtworkError::UnsupportedPlatform {
                adapter: Self::ID.to_string(),
                platform: platform.get(),
            }
        })?;
        let url = self.listing_url(system, dir);

        self.manifests
            .get_or_fetch(ManifestKey::new(platform, media), move || async move {
                let html = self.http.fetch_text(&url, &self.fetch).await?;
                let names = parse_html_listing(&html);
                info!(
                    "Loaded {} {} entries for {}",
                    names.len(),
                    dir,
                    system.name
                );
                Ok::<_, ArtworkError>(ManifestIndex::from_names(names))
            })
            .await
            .map_err(|e| thumbnails::manifest_error(platform, media, e))
    }
}

#[async_trait]
impl ArtworkAdapter for LibretroAdapter {
    fn id(&self) -> &str {
        Self::ID
    }

    fn capabilities(&self) -> &AdapterCapabilities {
        &self.capabilities
    }

    async fn initialize(&self) -> Result<()> {
        if !self.lifecycle.is_ready() {
            self.lifecycle.store(LifecycleState::Initialized);
            debug!("libretro adapter ready ({})", self.base_url);
        }
        Ok(())
    }

    async fn lookup(&self, params: &LookupParams) -> Result<ArtworkLookupResult> {
        if !self.lifecycle.is_ready() || !self.capabilities.supports_media(params.media_type) {
            return Ok(ArtworkLookupResult::not_found());
        }
        let Some((system, dir)) = thumbnails::target(params.platform, params.media_type) else {
            return Ok(ArtworkLookupResult::not_found());
        };

        let index = match self.manifest(params.platform, params.media_type).await {
            Ok(index) => index,
            Err(e) => {
                warn!("libretro lookup for {} skipped: {}", params.rom.filename, e);
                return Ok(ArtworkLookupResult::not_found());
            }
        };

        Ok(match thumbnails::resolve(&index, params) {
            Some(matched) => {
                let url = self.media_url(system, dir, &matched.name);
                thumbnails::to_result(matched, url, Self::ID)
            }
            None => ArtworkLookupResult::not_found(),
        })
    }

    fn rate_limit_delay(&self) -> Duration {
        AdapterConfig::LIBRETRO_DELAY
    }

    async fn prefetch(&self, platform: PlatformId, media: MediaType) -> Result<()> {
        if !self.lifecycle.is_ready() {
            return Err(ArtworkError::Initialization {
                adapter: Self::ID.to_string(),
                message: "prefetch called before initialize".to_string(),
            });
        }
        self.manifest(platform, media).await?;
        self.lifecycle.mark_prefetched();
        Ok(())
    }

    async fn dispose(&self) {
        self.manifests.clear().await;
        self.lifecycle.store(LifecycleState::Disposed);
    }
}
