//! libretro-thumbnails repositories on GitHub.
//!
//! Listings come from the git-trees API; media is served from the raw
//! content host so no API quota is spent per image.

use super::thumbnails::{self, encode_segment};
use super::{
    parse_base_url, parse_options, AdapterCapabilities, AdapterContext, AdapterHooks,
    AdapterLifecycle, ArtworkAdapter, LifecycleState,
};
use crate::config::AdapterConfig;
use crate::manifest::{parse_git_tree, ManifestCache, ManifestIndex, ManifestKey};
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
struct GithubOptions {
    api_base: Option<String>,
    raw_base: Option<String>,
    branch: Option<String>,
}

pub struct LibretroGithubAdapter {
    http: Arc<HttpClient>,
    fetch: FetchOptions,
    api_base: String,
    raw_base: String,
    branch: String,
    capabilities: AdapterCapabilities,
    lifecycle: AdapterLifecycle,
    manifests: ManifestCache,
}

impl LibretroGithubAdapter {
    pub const ID: &'static str = "libretro-github";

    pub fn new(ctx: &AdapterContext, options: &serde_json::Value) -> Result<Self> {
        let options: GithubOptions = parse_options(Self::ID, options)?;
        let api_base = parse_base_url(
            Self::ID,
            "api_base",
            options.api_base.as_deref().unwrap_or(AdapterConfig::GITHUB_API_BASE),
        )?;
        let raw_base = parse_base_url(
            Self::ID,
            "raw_base",
            options.raw_base.as_deref().unwrap_or(AdapterConfig::GITHUB_RAW_BASE),
        )?;
        let branch = options
            .branch
            .unwrap_or_else(|| AdapterConfig::GITHUB_DEFAULT_BRANCH.to_string());
        if branch.trim().is_empty() {
            return Err(ArtworkError::InvalidOptions {
                adapter: Self::ID.to_string(),
                message: "branch must not be empty".to_string(),
            });
        }

        Ok(Self {
            http: ctx.http.clone(),
            fetch: ctx.fetch.clone(),
            api_base,
            raw_base,
            branch,
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

    fn tree_url(&self, system: &SystemInfo) -> String {
        format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.api_base,
            AdapterConfig::GITHUB_THUMBNAILS_ORG,
            system.github_repo(),
            encode_segment(&self.branch)
        )
    }

    fn media_url(&self, system: &SystemInfo, dir: &str, name: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}/{}.png",
            self.raw_base,
            AdapterConfig::GITHUB_THUMBNAILS_ORG,
            system.github_repo(),
            encode_segment(&self.branch),
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
        let url = self.tree_url(system);

        self.manifests
            .get_or_fetch(ManifestKey::new(platform, media), move || async move {
                let body = self.http.fetch_text(&url, &self.fetch).await?;
                let listing = parse_git_tree(&body, dir)?;
                if listing.truncated {
                    warn!(
                        "Git tree for {} was truncated; some {} entries may be missing",
                        system.github_repo(),
                        dir
                    );
                }
                info!(
                    "Loaded {} {} entries from {}",
                    listing.names.len(),
                    dir,
                    system.github_repo()
                );
                Ok::<_, ArtworkError>(ManifestIndex::from_names(listing.names))
            })
            .await
            .map_err(|e| thumbnails::manifest_error(platform, media, e))
    }
}

#[async_trait]
impl ArtworkAdapter for LibretroGithubAdapter {
    fn id(&self) -> &str {
        Self::ID
    }

    fn capabilities(&self) -> &AdapterCapabilities {
        &self.capabilities
    }

    async fn initialize(&self) -> Result<()> {
        if !self.lifecycle.is_ready() {
            self.lifecycle.store(LifecycleState::Initialized);
            debug!("libretro-github adapter ready (branch {})", self.branch);
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
                warn!("GitHub lookup for {} skipped: {}", params.rom.filename, e);
                return Ok(ArtworkLookupResult::not_found());
            }
        };

        let Some(matched) = thumbnails::resolve(&index, params) else {
            return Ok(ArtworkLookupResult::not_found());
        };
        let url = self.media_url(system, dir, &matched.name);
        Ok(thumbnails::to_result(matched, url, Self::ID)
            .with_metadata("repository", system.github_repo()))
    }

    fn rate_limit_delay(&self) -> Duration {
        AdapterConfig::GITHUB_DELAY
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn adapter(options: serde_json::Value) -> Result<LibretroGithubAdapter> {
        let ctx = AdapterContext::new(Arc::new(HttpClient::new().unwrap()), FetchOptions::default());
        LibretroGithubAdapter::new(&ctx, &options)
    }

    #[test]
    fn test_urls() {
        let adapter = adapter(json!({"branch": "main"})).unwrap();
        let system = crate::systems::by_id(PlatformId(9)).unwrap();
        assert_eq!(
            adapter.tree_url(system),
            "https://api.github.com/repos/libretro-thumbnails/Nintendo_-_Game_Boy/git/trees/main?recursive=1"
        );
        assert_eq!(
            adapter.media_url(system, "Named_Titles", "Tetris (World)"),
            "https://raw.githubusercontent.com/libretro-thumbnails/Nintendo_-_Game_Boy/main/Named_Titles/Tetris%20%28World%29.png"
        );
    }

    #[test]
    fn test_invalid_options() {
        assert!(adapter(json!({"branch": " "})).is_err());
        assert!(adapter(json!({"api_base": "::"})).is_err());
    }
}
