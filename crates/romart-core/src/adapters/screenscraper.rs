//! ScreenScraper `jeuInfos` API.
//!
//! Identifies games by content hash when one is supplied, falling back to
//! file name and size. Game records are cached per run so the several media
//! types of one ROM cost a single API call.

use super::{
    parse_base_url, parse_options, AdapterCapabilities, AdapterContext, AdapterHooks,
    AdapterLifecycle, ArtworkAdapter, LifecycleState, PlatformSupport,
};
use crate::config::AdapterConfig;
use crate::models::{ArtworkLookupResult, LookupParams, MediaType};
use crate::network::{FetchOptions, HttpClient};
use crate::{ArtworkError, Result};
use async_trait::async_trait;
use mini_moka::sync::Cache;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const DEFAULT_SOFT_NAME: &str = "romart";

/// Regions tried after the caller's preferences.
const FALLBACK_REGIONS: &[&str] = &["wor", "ss"];

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ScreenScraperOptions {
    dev_id: Option<String>,
    dev_password: Option<String>,
    soft_name: Option<String>,
    user: Option<String>,
    password: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Clone)]
struct Credentials {
    dev_id: String,
    dev_password: String,
    soft_name: String,
    user: Option<String>,
    password: Option<String>,
}

impl Credentials {
    fn from_options(options: &ScreenScraperOptions) -> Option<Self> {
        let dev_id = options.dev_id.clone().filter(|v| !v.is_empty())?;
        let dev_password = options.dev_password.clone().filter(|v| !v.is_empty())?;
        Some(Self {
            dev_id,
            dev_password,
            soft_name: options
                .soft_name
                .clone()
                .unwrap_or_else(|| DEFAULT_SOFT_NAME.to_string()),
            user: options.user.clone().filter(|v| !v.is_empty()),
            password: options.password.clone(),
        })
    }

    fn apply(&self, url: &mut Url) {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("devid", &self.dev_id)
            .append_pair("devpassword", &self.dev_password)
            .append_pair("softname", &self.soft_name)
            .append_pair("output", "json");
        if let Some(user) = &self.user {
            query.append_pair("ssid", user);
            query.append_pair("sspassword", self.password.as_deref().unwrap_or(""));
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: T,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    ssuser: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GameResponse {
    jeu: Option<Game>,
}

#[derive(Debug, Clone, Deserialize)]
struct Game {
    #[serde(default)]
    id: serde_json::Value,
    #[serde(default)]
    noms: Vec<RegionalText>,
    #[serde(default)]
    medias: Vec<Media>,
}

#[derive(Debug, Clone, Deserialize)]
struct RegionalText {
    #[serde(default)]
    region: String,
    text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Media {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    region: String,
    url: String,
    #[serde(default)]
    format: String,
}

impl Game {
    fn id_string(&self) -> Option<String> {
        match &self.id {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn name(&self, regions: &[&str]) -> Option<&str> {
        regions
            .iter()
            .find_map(|r| self.noms.iter().find(|n| n.region == *r))
            .or_else(|| self.noms.first())
            .map(|n| n.text.as_str())
    }

    fn media(&self, kind: &str, regions: &[&str]) -> Option<&Media> {
        let of_kind = || self.medias.iter().filter(move |m| m.kind == kind);
        regions
            .iter()
            .find_map(|r| of_kind().find(|m| m.region == *r))
            .or_else(|| of_kind().next())
    }
}

/// ScreenScraper media type for a [`MediaType`].
fn media_kind(media: MediaType) -> &'static str {
    match media {
        MediaType::BoxFront => "box-2D",
        MediaType::Screenshot => "ss",
        MediaType::TitleScreen => "sstitle",
        MediaType::Logo => "wheel",
    }
}

/// Map a region name from the caller's preference list to a ScreenScraper code.
fn region_code(region: &str) -> Option<&'static str> {
    Some(match region.trim().to_lowercase().as_str() {
        "usa" | "us" => "us",
        "europe" | "eu" => "eu",
        "japan" | "jp" => "jp",
        "world" | "wor" => "wor",
        "australia" | "au" => "au",
        "korea" | "kr" => "kr",
        "china" | "cn" => "cn",
        "taiwan" | "tw" => "tw",
        "brazil" | "br" => "br",
        "france" | "fr" => "fr",
        "germany" | "de" => "de",
        "spain" | "sp" => "sp",
        "italy" | "it" => "it",
        "uk" => "uk",
        _ => return None,
    })
}

fn region_order(preference: &[String]) -> Vec<&'static str> {
    let mut order: Vec<&'static str> = Vec::new();
    for code in preference
        .iter()
        .filter_map(|r| region_code(r))
        .chain(FALLBACK_REGIONS.iter().copied())
    {
        if !order.contains(&code) {
            order.push(code);
        }
    }
    order
}

/// Hash- and name-based lookups against ScreenScraper.
pub struct ScreenScraperAdapter {
    http: Arc<HttpClient>,
    fetch: FetchOptions,
    base_url: String,
    credentials: Option<Credentials>,
    capabilities: AdapterCapabilities,
    lifecycle: AdapterLifecycle,
    /// Game records by query key; `None` records a confirmed miss.
    games: Cache<String, Option<Arc<Game>>>,
}

impl ScreenScraperAdapter {
    pub const ID: &'static str = "screenscraper";

    pub fn new(ctx: &AdapterContext, options: &serde_json::Value) -> Result<Self> {
        let options: ScreenScraperOptions = parse_options(Self::ID, options)?;
        let base_url = parse_base_url(
            Self::ID,
            "base_url",
            options
                .base_url
                .as_deref()
                .unwrap_or(AdapterConfig::SCREENSCRAPER_BASE_URL),
        )?;

        Ok(Self {
            http: ctx.http.clone(),
            fetch: ctx.fetch.clone(),
            base_url,
            credentials: Credentials::from_options(&options),
            capabilities: AdapterCapabilities {
                hash_lookup: true,
                filename_lookup: true,
                media_types: MediaType::ALL.to_vec(),
                platforms: PlatformSupport::All,
                hooks: AdapterHooks {
                    prefetch: false,
                    dispose: true,
                },
            },
            lifecycle: AdapterLifecycle::new(),
            games: Cache::builder()
                .time_to_live(AdapterConfig::SCREENSCRAPER_CACHE_TTL)
                .max_capacity(AdapterConfig::SCREENSCRAPER_CACHE_CAPACITY)
                .build(),
        })
    }

    fn endpoint(&self, name: &str, credentials: &Credentials) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, name)).map_err(|e| {
            ArtworkError::Config {
                message: format!("Invalid ScreenScraper URL: {}", e),
            }
        })?;
        credentials.apply(&mut url);
        Ok(url)
    }

    fn game_url(&self, params: &LookupParams, credentials: &Credentials) -> Result<Url> {
        let mut url = self.endpoint("jeuInfos.php", credentials)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("systemeid", &params.platform.to_string())
                .append_pair("romtype", "rom")
                .append_pair("romnom", &params.rom.filename)
                .append_pair("romtaille", &params.rom.size.to_string());
            if let Some(hash) = &params.hash {
                query.append_pair(hash.algorithm.as_str(), &hash.hex);
            }
        }
        Ok(url)
    }

    fn cache_key(params: &LookupParams) -> String {
        match &params.hash {
            Some(hash) => format!("{}:{}:{}", params.platform, hash.algorithm.as_str(), hash.hex),
            None => format!(
                "{}:name:{}:{}",
                params.platform, params.rom.filename, params.rom.size
            ),
        }
    }

    async fn game(&self, params: &LookupParams, credentials: &Credentials) -> Result<Option<Arc<Game>>> {
        let key = Self::cache_key(params);
        if let Some(cached) = self.games.get(&key) {
            debug!("ScreenScraper cache hit for {}", key);
            return Ok(cached);
        }

        let url = self.game_url(params, credentials)?;
        let game = match self
            .http
            .fetch_json::<Envelope<GameResponse>>(url.as_str(), &self.fetch)
            .await
        {
            Ok(envelope) => envelope.response.jeu.map(Arc::new),
            Err(ArtworkError::Http(e)) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };

        self.games.insert(key, game.clone());
        Ok(game)
    }
}

#[async_trait]
impl ArtworkAdapter for ScreenScraperAdapter {
    fn id(&self) -> &str {
        Self::ID
    }

    fn capabilities(&self) -> &AdapterCapabilities {
        &self.capabilities
    }

    async fn initialize(&self) -> Result<()> {
        if self.lifecycle.is_ready() {
            return Ok(());
        }
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| ArtworkError::Initialization {
                adapter: Self::ID.to_string(),
                message: "dev_id and dev_password are required".to_string(),
            })?;

        let url = self.endpoint("ssuserInfos.php", credentials)?;
        let envelope: Envelope<UserInfoResponse> = self
            .http
            .fetch_json(url.as_str(), &self.fetch)
            .await
            .map_err(|e| ArtworkError::Initialization {
                adapter: Self::ID.to_string(),
                message: format!("credential check failed: {}", e),
            })?;
        if envelope.response.ssuser.is_none() {
            return Err(ArtworkError::Initialization {
                adapter: Self::ID.to_string(),
                message: "credentials were not accepted".to_string(),
            });
        }

        self.lifecycle.store(LifecycleState::Initialized);
        info!("ScreenScraper credentials accepted");
        Ok(())
    }

    async fn lookup(&self, params: &LookupParams) -> Result<ArtworkLookupResult> {
        if !self.lifecycle.is_ready() {
            return Ok(ArtworkLookupResult::not_found());
        }
        let Some(credentials) = &self.credentials else {
            return Ok(ArtworkLookupResult::not_found());
        };

        let game = match self.game(params, credentials).await {
            Ok(Some(game)) => game,
            Ok(None) => return Ok(ArtworkLookupResult::not_found()),
            Err(e) => {
                warn!("ScreenScraper lookup for {} failed: {}", params.rom.filename, e);
                return Ok(ArtworkLookupResult::not_found());
            }
        };

        let regions = region_order(&params.region_preference);
        let Some(media) = game.media(media_kind(params.media_type), &regions) else {
            return Ok(ArtworkLookupResult::not_found());
        };
        let name = game.name(&regions).unwrap_or(&params.rom.stem);

        let mut result = ArtworkLookupResult::found(name, media.url.as_str())
            .with_metadata("source", Self::ID)
            .with_metadata("region", media.region.as_str());
        if !media.format.is_empty() {
            result = result.with_metadata("format", media.format.as_str());
        }
        if let Some(id) = game.id_string() {
            result = result.with_game_id(id);
        }
        Ok(result)
    }

    fn rate_limit_delay(&self) -> Duration {
        AdapterConfig::SCREENSCRAPER_DELAY
    }

    async fn dispose(&self) {
        self.games.invalidate_all();
        self.lifecycle.store(LifecycleState::Disposed);
    }
}
