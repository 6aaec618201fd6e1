//! Human and JSON rendering of batch results.

use romart_core::systems::SYSTEMS;
use romart_core::{BatchReport, OutcomeStatus, RomOutcome};
use serde::Serialize;
use std::fmt::Write;

/// One line per ROM followed by a totals line.
pub fn render_text(report: &BatchReport) -> String {
    let mut out = String::new();
    for outcome in &report.outcomes {
        let _ = writeln!(out, "{}", outcome_line(outcome));
    }
    let _ = write!(
        out,
        "{} ROMs: {} found, {} best-effort, {} missing",
        report.total(),
        report.found,
        report.best_effort,
        report.missing
    );
    if report.skipped > 0 {
        let _ = write!(out, ", {} skipped", report.skipped);
    }
    out
}

fn outcome_line(outcome: &RomOutcome) -> String {
    let name = &outcome.rom.filename;
    match (&outcome.status, &outcome.hit) {
        (OutcomeStatus::Found, Some(hit)) => format!(
            "[found]    {} -> {} ({})",
            name,
            hit.result.media_url.as_deref().unwrap_or_default(),
            hit.adapter_id
        ),
        (OutcomeStatus::BestEffort, Some(hit)) => format!(
            "[approx]   {} -> {} ({}, matched {})",
            name,
            hit.result.media_url.as_deref().unwrap_or_default(),
            hit.adapter_id,
            hit.result.game_name.as_deref().unwrap_or("?")
        ),
        (OutcomeStatus::Skipped, _) => format!("[skipped]  {}", name),
        _ => format!("[missing]  {}", name),
    }
}

pub fn render_json(report: &BatchReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

#[derive(Debug, Serialize)]
struct PlatformRow {
    id: u32,
    name: &'static str,
    aliases: &'static [&'static str],
}

/// The platform table, as aligned text or JSON.
pub fn render_platforms(json: bool) -> serde_json::Result<String> {
    if json {
        let rows: Vec<PlatformRow> = SYSTEMS
            .iter()
            .map(|s| PlatformRow {
                id: s.id.get(),
                name: s.name,
                aliases: s.aliases,
            })
            .collect();
        return serde_json::to_string_pretty(&rows);
    }

    let mut out = String::new();
    for system in SYSTEMS {
        let _ = writeln!(
            out,
            "{:>4}  {:<32} {}",
            system.id.get(),
            system.name,
            system.aliases.join(", ")
        );
    }
    Ok(out)
}
