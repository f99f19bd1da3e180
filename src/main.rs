//! fphook CLI - inspect the capability catalog and probe a stub page
//!
//! Commands:
//!   fphook catalog          - List the normalized catalog entries
//!   fphook probe            - Instrument a stub page, run a probe, print events

use anyhow::Context;
use clap::{Parser, Subcommand};
use fphook::{inject, run_probe, Catalog, Event, InitReport, RecordingSink, Settings, StubPage};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fphook")]
#[command(about = "Fingerprinting API instrumentation engine", long_about = None)]
struct Cli {
    /// Log engine decisions at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the normalized catalog entries
    Catalog {
        /// Catalog document to load instead of the built-in one
        #[arg(long)]
        file: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Instrument a stub page, run a fingerprinting probe and print the events
    Probe {
        /// Injection settings (JSON)
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Report each (api, method) pair at most once
        #[arg(long)]
        optimize_events: bool,

        /// Catalog document to load instead of the built-in one
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Catalog { file, json } => catalog_command(file.as_deref(), json),
        Commands::Probe {
            settings,
            optimize_events,
            catalog,
            json,
        } => probe_command(settings.as_deref(), optimize_events, catalog.as_deref(), json),
    }
}

fn load_catalog(file: Option<&Path>) -> anyhow::Result<Catalog> {
    match file {
        Some(path) => Catalog::from_file(path)
            .with_context(|| format!("Failed to load catalog {}", path.display())),
        None => Catalog::builtin().context("Built-in catalog is invalid"),
    }
}

fn catalog_command(file: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let catalog = load_catalog(file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    for run in catalog.entries().chunk_by(|a, b| a.group == b.group) {
        println!("{}:", run[0].group);
        for entry in run {
            let targets = if entry.targets.is_empty() {
                "<global>".to_string()
            } else {
                entry.targets.join(", ")
            };
            println!(
                "  {} [{}] {} -> {}",
                entry.kind,
                entry.api,
                targets,
                entry.names.join(", ")
            );
        }
    }
    println!(
        "{} entries, {} hook points",
        catalog.len(),
        catalog.pair_count()
    );
    Ok(())
}

fn probe_command(
    settings_file: Option<&Path>,
    optimize_events: bool,
    catalog_file: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let mut settings = match settings_file {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("Failed to load settings {}", path.display()))?,
        None => Settings::default(),
    };
    if optimize_events {
        settings = settings.with_optimize_events(true);
    }
    let catalog = load_catalog(catalog_file)?;

    let page = StubPage::new();
    let realm = page.realm();
    let sink = RecordingSink::install(realm, &settings.binding)
        .map_err(|e| anyhow::anyhow!("Failed to bind sink: {}", e))?;
    let (_engine, report) = inject(realm, &settings, &catalog);

    let steps = run_probe(realm).map_err(|e| anyhow::anyhow!("Probe failed: {}", e))?;
    let events = sink.events();

    if json {
        let output = serde_json::json!({
            "report": report,
            "steps": steps,
            "events": events,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_report(&report);
        print_events(&events);
    }
    Ok(())
}

fn print_report(report: &InitReport) {
    println!("instrumentation: {}", report);
}

fn print_events(events: &[Event]) {
    println!("events ({}):", events.len());
    for event in events {
        let frame = event
            .stacktrace
            .lines()
            .nth(1)
            .map(str::trim)
            .unwrap_or("");
        println!("  {}.{}  {}", event.api, event.method, frame);
    }
}
