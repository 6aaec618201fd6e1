//! Registry fallback, pacing and batch runs end to end.

mod common;

use async_trait::async_trait;
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::Router;
use common::{context, spawn, url};
use romart_core::adapters::{AdapterCapabilities, AdapterHooks, PlatformSupport};
use romart_core::{
    AdapterRegistry, AdapterSourceConfig, ArtworkAdapter, ArtworkLookupResult, BatchItem,
    BatchOptions, BatchResolver, LookupParams, MediaType, OutcomeStatus, PlatformId, RomFile,
};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Serves a libretro-style listing for NES box art and answers probes for
/// `/probe/*.png` only when the name contains "Zelda".
async fn mirror(uri: Uri) -> Response {
    let path = uri.path();
    if path.ends_with("/Named_Boxarts/") && path.contains("Nintendo%20Entertainment%20System") {
        return Html(r#"<a href="Tetris%20%28USA%29.png">Tetris (USA).png</a>"#).into_response();
    }
    if path.starts_with("/probe/") && path.contains("Zelda") {
        return StatusCode::OK.into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}

fn sources(base: &str) -> Vec<AdapterSourceConfig> {
    vec![
        AdapterSourceConfig::new("url-template", 2).with_options(json!({
            "template": format!("{}/probe/{{name}}.png", base),
            "delay_ms": 0
        })),
        AdapterSourceConfig::new("libretro", 1).with_options(json!({ "base_url": base })),
        AdapterSourceConfig::new("screenscraper", 3).disabled(),
    ]
}

fn nes(file: &str) -> LookupParams {
    LookupParams::new(RomFile::new(file, 1), PlatformId(3), MediaType::BoxFront)
}

#[tokio::test]
async fn test_builtin_fallback_chain() {
    let addr = spawn(Router::new().fallback(mirror)).await;
    let base = url(addr, "");
    let configs = sources(&base);
    let registry = AdapterRegistry::with_builtin_adapters(context());

    let report = registry.initialize_all(&configs).await;
    assert!(report.all_succeeded());
    assert_eq!(report.initialized, vec!["libretro", "url-template"]);

    let tetris = registry
        .lookup_with_fallback(&nes("Tetris (USA).nes"), &configs)
        .await
        .unwrap();
    assert_eq!(tetris.adapter_id, "libretro");

    let zelda = registry
        .lookup_with_fallback(&nes("Zelda (USA).nes"), &configs)
        .await
        .unwrap();
    assert_eq!(zelda.adapter_id, "url-template");

    assert!(registry
        .lookup_with_fallback(&nes("Metroid (USA).nes"), &configs)
        .await
        .is_none());

    registry.dispose_all().await;
    assert!(registry
        .lookup_with_fallback(&nes("Tetris (USA).nes"), &configs)
        .await
        .is_none());
}

/// Always misses, with a configurable id and spacing.
struct PacedMiss {
    id: &'static str,
    delay: Duration,
    capabilities: AdapterCapabilities,
}

impl PacedMiss {
    fn new(id: &'static str, delay: Duration) -> Self {
        Self {
            id,
            delay,
            capabilities: AdapterCapabilities {
                hash_lookup: false,
                filename_lookup: true,
                media_types: MediaType::ALL.to_vec(),
                platforms: PlatformSupport::All,
                hooks: AdapterHooks::default(),
            },
        }
    }
}

#[async_trait]
impl ArtworkAdapter for PacedMiss {
    fn id(&self) -> &str {
        self.id
    }

    fn capabilities(&self) -> &AdapterCapabilities {
        &self.capabilities
    }

    async fn initialize(&self) -> romart_core::Result<()> {
        Ok(())
    }

    async fn lookup(&self, _params: &LookupParams) -> romart_core::Result<ArtworkLookupResult> {
        Ok(ArtworkLookupResult::not_found())
    }

    fn rate_limit_delay(&self) -> Duration {
        self.delay
    }
}

fn paced_registry() -> Arc<AdapterRegistry> {
    let registry = AdapterRegistry::new(context());
    registry.register("slow", |_ctx, _options| {
        Ok(Arc::new(PacedMiss::new("slow", Duration::from_millis(80))))
    });
    registry.register("fast", |_ctx, _options| {
        Ok(Arc::new(PacedMiss::new("fast", Duration::ZERO)))
    });
    Arc::new(registry)
}

#[tokio::test]
async fn test_rate_limits_are_per_adapter() {
    let registry = paced_registry();
    let params = nes("Anything.nes");

    let fast_only = vec![AdapterSourceConfig::new("fast", 1)];
    let started = Instant::now();
    for _ in 0..4 {
        registry.lookup_with_fallback_paced(&params, &fast_only).await;
    }
    assert!(started.elapsed() < Duration::from_millis(80));

    let both = vec![
        AdapterSourceConfig::new("fast", 1),
        AdapterSourceConfig::new("slow", 2),
    ];
    let started = Instant::now();
    for _ in 0..4 {
        registry.lookup_with_fallback_paced(&params, &both).await;
    }
    // First slow lookup is free, the next three wait 80 ms each.
    assert!(started.elapsed() >= Duration::from_millis(230));
}

#[tokio::test]
async fn test_batch_over_builtin_sources() {
    let addr = spawn(Router::new().fallback(mirror)).await;
    let base = url(addr, "");
    let registry = Arc::new(AdapterRegistry::with_builtin_adapters(context()));
    let resolver = BatchResolver::new(registry, sources(&base));
    resolver.initialize().await;

    let items: Vec<BatchItem> = ["Tetris (USA).nes", "Tetris (Beta).nes", "Zelda (USA).nes", "Metroid (USA).nes"]
        .into_iter()
        .map(|name| BatchItem::from(RomFile::new(name, 1)))
        .collect();
    let options = BatchOptions {
        prefetch: true,
        concurrency: 2,
        ..BatchOptions::new(PlatformId(3), MediaType::BoxFront)
    };

    let report = resolver.run(items, &options).await.unwrap();
    let statuses: Vec<OutcomeStatus> = report.outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![
            OutcomeStatus::Found,
            OutcomeStatus::BestEffort,
            OutcomeStatus::Found,
            OutcomeStatus::Missing,
        ]
    );
    assert_eq!((report.found, report.best_effort, report.missing), (2, 1, 1));
}

#[tokio::test]
async fn test_batch_prefetch_failure_aborts() {
    // No listings at all: the libretro warmup fails.
    let addr = spawn(Router::new().fallback(|| async { StatusCode::NOT_FOUND })).await;
    let base = url(addr, "");
    let registry = Arc::new(AdapterRegistry::with_builtin_adapters(context()));
    let resolver = BatchResolver::new(registry, sources(&base));
    resolver.initialize().await;

    let options = BatchOptions {
        prefetch: true,
        ..BatchOptions::new(PlatformId(3), MediaType::BoxFront)
    };
    let items = vec![BatchItem::from(RomFile::new("Tetris (USA).nes", 1))];
    assert!(resolver.run(items, &options).await.is_err());
}
