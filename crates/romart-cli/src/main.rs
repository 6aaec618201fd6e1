//! romart - resolve artwork URLs for ROM files from the command line.
//!
//! Scans the given files and directories, queries the configured artwork
//! sources in priority order and prints one result per ROM.

mod report;
mod scan;

use anyhow::{bail, Context, Result};
use clap::Parser;
use romart_core::{
    systems, AdapterContext, AdapterRegistry, BatchOptions, BatchResolver, CancellationToken,
    FetchOptions, HttpClient, MediaType, PlatformId, ResolverSettings,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "romart")]
#[command(about = "Find box art, screenshots and title screens for ROM files")]
#[command(version)]
struct Args {
    /// ROM files or directories to scan
    #[arg(required_unless_present = "list_platforms")]
    paths: Vec<PathBuf>,

    /// Settings file (JSON). Defaults to <config dir>/romart/config.json when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Platform id or alias, e.g. 3 or "nes"
    #[arg(short, long, value_parser = parse_platform, required_unless_present = "list_platforms")]
    platform: Option<PlatformId>,

    /// Media type: box-front, screenshot, title-screen or logo
    #[arg(short, long, default_value = "box-front")]
    media: MediaType,

    /// Preferred region, repeatable, most preferred first
    #[arg(short, long = "region")]
    regions: Vec<String>,

    /// Lookups in flight at once
    #[arg(long, default_value_t = romart_core::config::BatchConfig::DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Download listings before the first lookup; abort if that fails
    #[arg(long)]
    prefetch: bool,

    /// Hash each ROM (MD5) for sources that match by content
    #[arg(long)]
    hash: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Print the known platforms and exit
    #[arg(long)]
    list_platforms: bool,
}

fn parse_platform(value: &str) -> std::result::Result<PlatformId, String> {
    systems::resolve(value).map_err(|e| e.to_string())
}

/// Explicit path, then the per-user default, then built-in defaults.
fn load_settings(explicit: Option<&Path>) -> Result<ResolverSettings> {
    if let Some(path) = explicit {
        return ResolverSettings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()));
    }
    if let Some(path) = dirs::config_dir().map(|d| d.join("romart").join("config.json")) {
        if path.is_file() {
            info!("Using settings from {}", path.display());
            return ResolverSettings::load(&path)
                .with_context(|| format!("Failed to load settings from {}", path.display()));
        }
    }
    Ok(ResolverSettings::default())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so --json output stays clean
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.debug { "debug" } else { "info" }));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    if args.list_platforms {
        print!("{}", report::render_platforms(args.json)?);
        return Ok(());
    }
    let Some(platform) = args.platform else {
        bail!("--platform is required");
    };

    let settings = load_settings(args.config.as_deref())?;
    let roms = scan::collect_roms(&args.paths)?;
    if roms.is_empty() {
        warn!("No ROM files found");
        return Ok(());
    }
    let items = scan::to_items(roms, args.hash)?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, finishing in-flight lookups");
                cancel.cancel();
            }
        });
    }

    let context = AdapterContext::new(
        Arc::new(HttpClient::new()?),
        FetchOptions::from_settings(&settings).with_cancel(cancel.clone()),
    );
    let registry = Arc::new(AdapterRegistry::with_builtin_adapters(context));
    let resolver = BatchResolver::new(registry.clone(), settings.sources.clone());

    let init = resolver.initialize().await;
    for (id, reason) in &init.failed {
        warn!("Source {} unavailable: {}", id, reason);
    }
    if init.initialized.is_empty() {
        registry.dispose_all().await;
        bail!("No artwork source could be initialized");
    }

    let options = BatchOptions {
        region_preference: args.regions,
        concurrency: args.concurrency,
        prefetch: args.prefetch,
        cancel: Some(cancel),
        ..BatchOptions::new(platform, args.media)
    };
    let outcome = resolver.run(items, &options).await;
    registry.dispose_all().await;
    let report = outcome?;

    if args.json {
        println!("{}", report::render_json(&report)?);
    } else {
        println!("{}", report::render_text(&report));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parses_flags() {
        let args = Args::try_parse_from([
            "romart", "-p", "snes", "--media", "title", "-r", "Europe", "-r", "USA", "--hash",
            "--json", "roms/",
        ])
        .unwrap();
        assert_eq!(args.platform, Some(PlatformId(4)));
        assert_eq!(args.media, MediaType::TitleScreen);
        assert_eq!(args.regions, vec!["Europe", "USA"]);
        assert!(args.hash && args.json && !args.prefetch);
        assert_eq!(args.paths, vec![PathBuf::from("roms/")]);
    }

    #[test]
    fn test_platform_required_for_scans() {
        assert!(Args::try_parse_from(["romart", "roms/"]).is_err());
        assert!(Args::try_parse_from(["romart", "-p", "nope", "roms/"]).is_err());
        assert!(Args::try_parse_from(["romart", "--list-platforms"]).is_ok());
    }

    #[test]
    fn test_explicit_settings_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("romart.json");
        std::fs::write(&path, r#"{"retries": 1, "sources": [{"id": "libretro"}]}"#).unwrap();

        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.retries, 1);
        assert_eq!(settings.sources.len(), 1);

        assert!(load_settings(Some(&dir.path().join("missing.json"))).is_err());
    }
}
