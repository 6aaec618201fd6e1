//! Built-in adapters against local mock servers.

mod common;

use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use common::{context, spawn, url, Hits};
use romart_core::adapters::{
    LibretroAdapter, LibretroGithubAdapter, ScreenScraperAdapter, UrlTemplateAdapter,
};
use romart_core::{ArtworkAdapter, LookupParams, MediaType, PlatformId, RomFile, RomHash};
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

const NES_BOXARTS: &str = "/Nintendo%20-%20Nintendo%20Entertainment%20System/Named_Boxarts/";

const NES_LISTING: &str = r#"<html><body><pre>
<a href="../">Parent Directory</a>
<a href="Ren%20_%20Stimpy%20Show%2C%20The%20%28USA%29.png">Ren _ Stimpy Show, The (USA).png</a>
<a href="Super%20Mario%20Bros.%20%28World%29.png">Super Mario Bros. (World).png</a>
<a href="Tetris%20%28USA%29.png">Tetris (USA).png</a>
<a href="Tetris%20%28Japan%29.png">Tetris (Japan).png</a>
</pre></body></html>"#;

fn nes(file: &str) -> LookupParams {
    LookupParams::new(RomFile::new(file, 40_976), PlatformId(3), MediaType::BoxFront)
}

async fn libretro_server(hits: Hits) -> SocketAddr {
    async fn listing(State(hits): State<Hits>, uri: Uri) -> Response {
        if uri.path() == NES_BOXARTS {
            hits.bump();
            Html(NES_LISTING).into_response()
        } else {
            StatusCode::NOT_FOUND.into_response()
        }
    }
    spawn(Router::new().fallback(listing).with_state(hits)).await
}

#[tokio::test]
async fn test_libretro_three_tier_lookup() {
    let hits = Hits::default();
    let addr = libretro_server(hits.clone()).await;
    let adapter =
        LibretroAdapter::new(&context(), &json!({ "base_url": url(addr, "") })).unwrap();
    adapter.initialize().await.unwrap();

    let exact = adapter.lookup(&nes("Ren & Stimpy Show, The (USA).nes")).await.unwrap();
    assert!(exact.found);
    assert!(!exact.best_effort);
    assert_eq!(
        exact.media_url.unwrap(),
        url(
            addr,
            &format!("{}Ren%20_%20Stimpy%20Show%2C%20The%20%28USA%29.png", NES_BOXARTS)
        )
    );

    let revision = adapter
        .lookup(&nes("Super Mario Bros. (World) (Rev 1).nes"))
        .await
        .unwrap();
    assert_eq!(revision.game_name.as_deref(), Some("Super Mario Bros. (World)"));
    assert!(!revision.best_effort);

    let approximate = adapter
        .lookup(&nes("Tetris (Beta).nes").with_regions(["Japan"]))
        .await
        .unwrap();
    assert_eq!(approximate.game_name.as_deref(), Some("Tetris (Japan)"));
    assert!(approximate.best_effort);
    assert_eq!(approximate.original_name.as_deref(), Some("Tetris (Beta)"));

    assert!(!adapter.lookup(&nes("Zelda (USA).nes")).await.unwrap().found);

    let mut logo = nes("Tetris (USA).nes");
    logo.media_type = MediaType::Logo;
    assert!(!adapter.lookup(&logo).await.unwrap().found);

    // One listing download served every lookup.
    assert_eq!(hits.get(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_libretro_concurrent_lookups_fetch_listing_once() {
    let hits = Hits::default();
    let addr = libretro_server(hits.clone()).await;
    let adapter = Arc::new(
        LibretroAdapter::new(&context(), &json!({ "base_url": url(addr, "") })).unwrap(),
    );
    adapter.initialize().await.unwrap();

    let lookups = (0..8).map(|_| {
        let adapter = adapter.clone();
        tokio::spawn(async move { adapter.lookup(&nes("Tetris (USA).nes")).await })
    });
    for result in futures::future::join_all(lookups).await {
        assert!(result.unwrap().unwrap().found);
    }
    assert_eq!(hits.get(), 1);
}

#[tokio::test]
async fn test_libretro_listing_failure() {
    let hits = Hits::default();
    let addr = libretro_server(hits.clone()).await;
    let adapter =
        LibretroAdapter::new(&context(), &json!({ "base_url": url(addr, "") })).unwrap();
    adapter.initialize().await.unwrap();

    // Game Boy has no listing on this server.
    let gb = LookupParams::new(RomFile::new("Tetris (World).gb", 1), PlatformId(9), MediaType::BoxFront);
    assert!(!adapter.lookup(&gb).await.unwrap().found);
    assert!(adapter.prefetch(PlatformId(9), MediaType::BoxFront).await.is_err());

    adapter.prefetch(PlatformId(3), MediaType::BoxFront).await.unwrap();
    assert!(adapter.lookup(&nes("Tetris (USA).nes")).await.unwrap().found);
    assert_eq!(hits.get(), 1);

    // Disposed adapters answer "not found" and forget their listings.
    adapter.dispose().await;
    assert!(!adapter.lookup(&nes("Tetris (USA).nes")).await.unwrap().found);
    adapter.initialize().await.unwrap();
    assert!(adapter.lookup(&nes("Tetris (USA).nes")).await.unwrap().found);
    assert_eq!(hits.get(), 2);
}

#[tokio::test]
async fn test_libretro_github_tree_listing() {
    let hits = Hits::default();
    let router = Router::new()
        .route(
            "/repos/libretro-thumbnails/Nintendo_-_Game_Boy/git/trees/master",
            get(|State(hits): State<Hits>| async move {
                hits.bump();
                Json(json!({
                    "sha": "abc",
                    "truncated": false,
                    "tree": [
                        {"path": "Named_Boxarts", "type": "tree"},
                        {"path": "Named_Boxarts/Tetris (World) (Rev 1).png", "type": "blob"},
                        {"path": "Named_Snaps/Tetris (World) (Rev 1).png", "type": "blob"}
                    ]
                }))
            }),
        )
        .with_state(hits.clone());
    let addr = spawn(router).await;

    let adapter = LibretroGithubAdapter::new(
        &context(),
        &json!({ "api_base": url(addr, ""), "raw_base": "https://raw.example" }),
    )
    .unwrap();
    adapter.initialize().await.unwrap();

    let params = LookupParams::new(
        RomFile::new("Tetris (World) (Rev 1).gb", 1),
        PlatformId(9),
        MediaType::BoxFront,
    );
    let result = adapter.lookup(&params).await.unwrap();
    assert!(result.found);
    assert_eq!(
        result.media_url.as_deref(),
        Some("https://raw.example/libretro-thumbnails/Nintendo_-_Game_Boy/master/Named_Boxarts/Tetris%20%28World%29%20%28Rev%201%29.png")
    );
    assert_eq!(
        result.metadata.get("repository").map(String::as_str),
        Some("Nintendo_-_Game_Boy")
    );
    assert_eq!(hits.get(), 1);
}

#[derive(Clone, Default)]
struct ScraperState {
    user_checks: Hits,
    game_queries: Hits,
}

async fn screenscraper_server(state: ScraperState) -> SocketAddr {
    async fn user_info(Query(q): Query<HashMap<String, String>>) -> Response {
        if q.get("devid").map(String::as_str) == Some("dev") {
            Json(json!({"response": {"ssuser": {"id": "player"}}})).into_response()
        } else {
            (StatusCode::FORBIDDEN, "Erreur de login").into_response()
        }
    }

    async fn game_info(
        State(state): State<ScraperState>,
        Query(q): Query<HashMap<String, String>>,
    ) -> Response {
        state.game_queries.bump();
        if q.get("crc").map(String::as_str) != Some("3337ec46") {
            return (StatusCode::NOT_FOUND, "Erreur : Rom/Iso/Dossier non trouvée !").into_response();
        }
        Json(json!({"response": {"jeu": {
            "id": 1234,
            "noms": [
                {"region": "wor", "text": "Super Mario Bros."},
                {"region": "jp", "text": "Super Mario Brothers"}
            ],
            "medias": [
                {"type": "box-2D", "region": "jp", "url": "https://media/box-jp.png", "format": "png"},
                {"type": "box-2D", "region": "eu", "url": "https://media/box-eu.png", "format": "png"},
                {"type": "sstitle", "region": "wor", "url": "https://media/title.png", "format": "png"}
            ]
        }}}))
        .into_response()
    }

    async fn user_info_counted(
        State(state): State<ScraperState>,
        query: Query<HashMap<String, String>>,
    ) -> Response {
        state.user_checks.bump();
        user_info(query).await
    }

    let router = Router::new()
        .route("/api2/ssuserInfos.php", get(user_info_counted))
        .route("/api2/jeuInfos.php", get(game_info))
        .with_state(state);
    spawn(router).await
}

#[tokio::test]
async fn test_screenscraper_hash_lookup_and_cache() {
    let state = ScraperState::default();
    let addr = screenscraper_server(state.clone()).await;
    let adapter = ScreenScraperAdapter::new(
        &context(),
        &json!({
            "dev_id": "dev",
            "dev_password": "pw",
            "base_url": url(addr, "/api2")
        }),
    )
    .unwrap();

    adapter.initialize().await.unwrap();
    adapter.initialize().await.unwrap();
    assert_eq!(state.user_checks.get(), 1);

    let params = nes("Super Mario Bros. (World).nes")
        .with_hash(RomHash::crc32("3337EC46"))
        .with_regions(["Europe", "Japan"]);
    let boxart = adapter.lookup(&params).await.unwrap();
    assert!(boxart.found);
    assert_eq!(boxart.media_url.as_deref(), Some("https://media/box-eu.png"));
    assert_eq!(boxart.game_id.as_deref(), Some("1234"));
    assert_eq!(boxart.game_name.as_deref(), Some("Super Mario Brothers"));

    let mut title = params.clone();
    title.media_type = MediaType::TitleScreen;
    let title = adapter.lookup(&title).await.unwrap();
    assert_eq!(title.media_url.as_deref(), Some("https://media/title.png"));

    let mut snap = params.clone();
    snap.media_type = MediaType::Screenshot;
    assert!(!adapter.lookup(&snap).await.unwrap().found);

    // All three media types came from one API call.
    assert_eq!(state.game_queries.get(), 1);

    let unknown = nes("Homebrew.nes").with_hash(RomHash::crc32("00000000"));
    assert!(!adapter.lookup(&unknown).await.unwrap().found);
    assert!(!adapter.lookup(&unknown).await.unwrap().found);
    assert_eq!(state.game_queries.get(), 2);
}

#[tokio::test]
async fn test_screenscraper_rejected_credentials() {
    let state = ScraperState::default();
    let addr = screenscraper_server(state.clone()).await;
    let adapter = ScreenScraperAdapter::new(
        &context(),
        &json!({
            "dev_id": "intruder",
            "dev_password": "pw",
            "base_url": url(addr, "/api2")
        }),
    )
    .unwrap();

    assert!(adapter.initialize().await.is_err());
    let params = nes("Super Mario Bros. (World).nes").with_hash(RomHash::crc32("3337EC46"));
    assert!(!adapter.lookup(&params).await.unwrap().found);
    assert_eq!(state.game_queries.get(), 0);
}

#[tokio::test]
async fn test_url_template_head_probe() {
    let hits = Hits::default();
    async fn probe(State(hits): State<Hits>, uri: Uri) -> StatusCode {
        hits.bump();
        if uri.path() == "/art/3/box-front/Tetris%20%28USA%29.png" {
            StatusCode::OK
        } else {
            StatusCode::NOT_FOUND
        }
    }
    let addr = spawn(Router::new().fallback(probe).with_state(hits.clone())).await;

    let adapter = UrlTemplateAdapter::new(
        &context(),
        &json!({ "template": url(addr, "/art/{platform}/{media}/{name}.png"), "delay_ms": 0 }),
    )
    .unwrap();
    adapter.initialize().await.unwrap();

    let hit = adapter.lookup(&nes("Tetris (USA).nes")).await.unwrap();
    assert!(hit.found);
    assert_eq!(hit.game_name.as_deref(), Some("Tetris (USA)"));
    assert!(hit.media_url.unwrap().ends_with("/art/3/box-front/Tetris%20%28USA%29.png"));

    assert!(!adapter.lookup(&nes("Tetris (Japan).nes")).await.unwrap().found);
    assert_eq!(hits.get(), 2);
}
