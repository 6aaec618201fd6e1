//! Adapter registry and priority-ordered fallback.

use super::pacer::AdapterPacer;
use crate::adapters::{
    AdapterContext, ArtworkAdapter, LibretroAdapter, LibretroGithubAdapter, ScreenScraperAdapter,
    UrlTemplateAdapter,
};
use crate::config::AdapterSourceConfig;
use crate::models::{ArtworkLookupResult, LookupParams, MediaType, PlatformId};
use crate::{ArtworkError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock as StdRwLock};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Construction recipe for an adapter. Receives the shared context and the
/// source's free-form options.
pub type AdapterFactory = Arc<
    dyn Fn(&AdapterContext, &serde_json::Value) -> Result<Arc<dyn ArtworkAdapter>> + Send + Sync,
>;

/// The winning result of a fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackHit {
    pub result: ArtworkLookupResult,
    pub adapter_id: String,
}

/// Per-adapter outcome of [`AdapterRegistry::initialize_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    pub initialized: Vec<String>,
    /// `(adapter id, error message)`
    pub failed: Vec<(String, String)>,
}

impl InitReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Owns adapter factories and the instances built from them.
///
/// Instances are created lazily on first use, one per id, and live until
/// [`dispose_all`](Self::dispose_all).
pub struct AdapterRegistry {
    context: AdapterContext,
    factories: StdRwLock<HashMap<String, AdapterFactory>>,
    instances: RwLock<HashMap<String, Arc<dyn ArtworkAdapter>>>,
    pacer: AdapterPacer,
}

impl AdapterRegistry {
    /// Create an empty registry.
    pub fn new(context: AdapterContext) -> Self {
        Self {
            context,
            factories: StdRwLock::new(HashMap::new()),
            instances: RwLock::new(HashMap::new()),
            pacer: AdapterPacer::new(),
        }
    }

    /// Create a registry with the built-in sources registered.
    pub fn with_builtin_adapters(context: AdapterContext) -> Self {
        let registry = Self::new(context);
        registry.register(LibretroAdapter::ID, |ctx, options| {
            Ok(Arc::new(LibretroAdapter::new(ctx, options)?))
        });
        registry.register(LibretroGithubAdapter::ID, |ctx, options| {
            Ok(Arc::new(LibretroGithubAdapter::new(ctx, options)?))
        });
        registry.register(ScreenScraperAdapter::ID, |ctx, options| {
            Ok(Arc::new(ScreenScraperAdapter::new(ctx, options)?))
        });
        registry.register(UrlTemplateAdapter::ID, |ctx, options| {
            Ok(Arc::new(UrlTemplateAdapter::new(ctx, options)?))
        });
        registry
    }

    /// Store a factory for `id`. Nothing is constructed until first use.
    ///
    /// Re-registering an id replaces the factory; an already built instance
    /// is kept until `dispose_all`.
    pub fn register<F>(&self, id: impl Into<String>, factory: F)
    where
        F: Fn(&AdapterContext, &serde_json::Value) -> Result<Arc<dyn ArtworkAdapter>>
            + Send
            + Sync
            + 'static,
    {
        let id = id.into();
        debug!("Registering adapter factory {}", id);
        self.factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(factory));
    }

    /// Ids with a registered factory, sorted.
    pub fn registered_ids(&self) -> Vec<String> {
        let factories = self.factories.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = factories.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Return the instance for `id`, building it on first request.
    ///
    /// `options` only matter for that first construction.
    pub async fn get(
        &self,
        id: &str,
        options: &serde_json::Value,
    ) -> Result<Arc<dyn ArtworkAdapter>> {
        if let Some(adapter) = self.instances.read().await.get(id) {
            return Ok(adapter.clone());
        }

        let factory = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| ArtworkError::AdapterNotRegistered { id: id.to_string() })?;

        let mut instances = self.instances.write().await;
        if let Some(adapter) = instances.get(id) {
            return Ok(adapter.clone());
        }
        let adapter = factory(&self.context, options)?;
        debug!("Created adapter {}", id);
        instances.insert(id.to_string(), adapter.clone());
        Ok(adapter)
    }

    /// Enabled sources in ascending priority order, materialized.
    ///
    /// Unregistered ids and failing factories are skipped.
    pub async fn enabled_adapters(
        &self,
        configs: &[AdapterSourceConfig],
    ) -> Vec<Arc<dyn ArtworkAdapter>> {
        let mut enabled: Vec<&AdapterSourceConfig> = configs.iter().filter(|c| c.enabled).collect();
        enabled.sort_by_key(|c| c.priority);

        let mut adapters = Vec::with_capacity(enabled.len());
        for config in enabled {
            match self.get(&config.id, &config.options).await {
                Ok(adapter) => adapters.push(adapter),
                Err(ArtworkError::AdapterNotRegistered { id }) => {
                    debug!("Skipping unregistered source {}", id);
                }
                Err(e) => warn!("Skipping source {}: {}", config.id, e),
            }
        }
        adapters
    }

    /// Query enabled sources in priority order; the first usable result wins.
    pub async fn lookup_with_fallback(
        &self,
        params: &LookupParams,
        configs: &[AdapterSourceConfig],
    ) -> Option<FallbackHit> {
        self.fallback(params, configs, false).await
    }

    /// Like [`lookup_with_fallback`](Self::lookup_with_fallback), waiting out
    /// each adapter's `rate_limit_delay` before querying it.
    pub async fn lookup_with_fallback_paced(
        &self,
        params: &LookupParams,
        configs: &[AdapterSourceConfig],
    ) -> Option<FallbackHit> {
        self.fallback(params, configs, true).await
    }

    async fn fallback(
        &self,
        params: &LookupParams,
        configs: &[AdapterSourceConfig],
        paced: bool,
    ) -> Option<FallbackHit> {
        for adapter in self.enabled_adapters(configs).await {
            let id = adapter.id().to_string();
            if !adapter.supports_system(params.platform) {
                debug!("{} does not support platform {}", id, params.platform);
                continue;
            }
            if paced {
                self.pacer.wait(&id, adapter.rate_limit_delay()).await;
            }

            match adapter.lookup(params).await {
                Ok(result) if result.is_usable() => {
                    debug!("{} resolved {}", id, params.rom.filename);
                    return Some(FallbackHit {
                        result,
                        adapter_id: id,
                    });
                }
                Ok(_) => debug!("{} has no artwork for {}", id, params.rom.filename),
                Err(e) => warn!("{} lookup for {} failed: {}", id, params.rom.filename, e),
            }
        }
        None
    }

    /// Initialize every enabled source, recording failures without stopping.
    pub async fn initialize_all(&self, configs: &[AdapterSourceConfig]) -> InitReport {
        let mut report = InitReport::default();
        for adapter in self.enabled_adapters(configs).await {
            let id = adapter.id().to_string();
            match adapter.initialize().await {
                Ok(()) => {
                    info!("Initialized source {}", id);
                    report.initialized.push(id);
                }
                Err(e) => {
                    warn!("Source {} failed to initialize: {}", id, e);
                    report.failed.push((id, e.to_string()));
                }
            }
        }
        report
    }

    /// Warm manifests on every enabled source that declares the prefetch hook
    /// and serves the platform and media. The first failure aborts.
    pub async fn prefetch_all(
        &self,
        configs: &[AdapterSourceConfig],
        platform: PlatformId,
        media: MediaType,
    ) -> Result<()> {
        for adapter in self.enabled_adapters(configs).await {
            let capabilities = adapter.capabilities();
            if !capabilities.hooks.prefetch
                || !capabilities.supports_media(media)
                || !adapter.supports_system(platform)
            {
                continue;
            }
            info!("Prefetching {} manifest for platform {}", adapter.id(), platform);
            adapter.prefetch(platform, media).await?;
        }
        Ok(())
    }

    /// Dispose every built instance and forget it. Idempotent.
    pub async fn dispose_all(&self) {
        let instances: Vec<_> = self.instances.write().await.drain().collect();
        for (id, adapter) in instances {
            if adapter.capabilities().hooks.dispose {
                debug!("Disposing adapter {}", id);
                adapter.dispose().await;
            }
        }
        self.pacer.reset();
    }

    /// Number of built instances.
    pub async fn instance_count(&self) -> usize {
        self.instances.read().await.len()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("registered", &self.registered_ids())
            .finish_non_exhaustive()
    }
}
