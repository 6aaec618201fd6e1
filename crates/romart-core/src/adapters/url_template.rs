//! Direct probes against a URL pattern.
//!
//! Useful for self-hosted artwork mirrors laid out by system and name. Each
//! lookup issues one HEAD request, so there is no manifest to prefetch.

use super::thumbnails::{self, encode_segment};
use super::{
    parse_options, AdapterCapabilities, AdapterContext, AdapterHooks, AdapterLifecycle,
    ArtworkAdapter, LifecycleState, PlatformSupport,
};
use crate::config::AdapterConfig;
use crate::models::{ArtworkLookupResult, LookupParams, MediaType};
use crate::network::{FetchOptions, HttpClient};
use crate::systems;
use crate::{ArtworkError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct UrlTemplateOptions {
    template: String,
    platforms: Option<Vec<u32>>,
    media_types: Option<Vec<String>>,
    delay_ms: Option<u64>,
}

pub struct UrlTemplateAdapter {
    http: Arc<HttpClient>,
    fetch: FetchOptions,
    template: String,
    delay: Duration,
    capabilities: AdapterCapabilities,
    lifecycle: AdapterLifecycle,
}

impl UrlTemplateAdapter {
    pub const ID: &'static str = "url-template";

    pub fn new(ctx: &AdapterContext, options: &serde_json::Value) -> Result<Self> {
        let options: UrlTemplateOptions = parse_options(Self::ID, options)?;
        let invalid = |message: String| ArtworkError::InvalidOptions {
            adapter: Self::ID.to_string(),
            message,
        };

        if !options.template.contains("{name}") {
            return Err(invalid("template must contain a {name} placeholder".into()));
        }
        let scheme_ok = options.template.starts_with("http://")
            || options.template.starts_with("https://");
        if !scheme_ok {
            return Err(invalid("template must be an http or https URL".into()));
        }

        let media_types = match &options.media_types {
            Some(names) => names
                .iter()
                .map(|name| MediaType::from_str(name))
                .collect::<Result<Vec<_>>>()
                .map_err(|e| invalid(e.to_string()))?,
            None => MediaType::ALL.to_vec(),
        };
        let platforms = match options.platforms {
            Some(ids) => PlatformSupport::only(ids),
            None => PlatformSupport::All,
        };
        let delay = options
            .delay_ms
            .map(Duration::from_millis)
            .unwrap_or(AdapterConfig::URL_TEMPLATE_DELAY);

        Ok(Self {
            http: ctx.http.clone(),
            fetch: ctx.fetch.clone(),
            template: options.template,
            delay,
            capabilities: AdapterCapabilities {
                hash_lookup: false,
                filename_lookup: true,
                media_types,
                platforms,
                hooks: AdapterHooks::default(),
            },
            lifecycle: AdapterLifecycle::new(),
        })
    }

    /// Expand the template for one lookup. `None` when `{system}` is used for
    /// a platform without a known folder name.
    fn expand(&self, params: &LookupParams) -> Option<String> {
        let mut url = self
            .template
            .replace("{platform}", &params.platform.to_string())
            .replace("{media}", params.media_type.as_str());
        if url.contains("{system}") {
            let system = systems::by_id(params.platform)?;
            url = url.replace("{system}", &encode_segment(system.libretro_dir));
        }
        let name = thumbnails::sanitize_name(&params.rom.stem);
        Some(url.replace("{name}", &encode_segment(&name)))
    }
}

#[async_trait]
impl ArtworkAdapter for UrlTemplateAdapter {
    fn id(&self) -> &str {
        Self::ID
    }

    fn capabilities(&self) -> &AdapterCapabilities {
        &self.capabilities
    }

    async fn initialize(&self) -> Result<()> {
        self.lifecycle.store(LifecycleState::Initialized);
        Ok(())
    }

    async fn lookup(&self, params: &LookupParams) -> Result<ArtworkLookupResult> {
        if !self.lifecycle.is_ready() || !self.capabilities.supports_media(params.media_type) {
            return Ok(ArtworkLookupResult::not_found());
        }
        let Some(url) = self.expand(params) else {
            return Ok(ArtworkLookupResult::not_found());
        };

        match self.http.head(&url, &self.fetch).await {
            Ok(status) if status.is_success() => Ok(ArtworkLookupResult::found(
                params.rom.stem.as_str(),
                url,
            )
            .with_metadata("source", Self::ID)),
            Ok(status) => {
                debug!("Probe {} returned {}", url, status);
                Ok(ArtworkLookupResult::not_found())
            }
            Err(e) => {
                warn!("Probe {} failed: {}", url, e);
                Ok(ArtworkLookupResult::not_found())
            }
        }
    }

    fn rate_limit_delay(&self) -> Duration {
        self.delay
    }
}
