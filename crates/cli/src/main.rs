//! RoomPick CLI: drive the searchable dropdown from the terminal.
//!
//! Runs one lookup cycle against a static candidate file or the booking REST API and prints
//! what the widget would show: a list, an auto-resolved selection, or nothing.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Duration;

use roompick_core::config::{default_config_path, load_dropdown_config, HostConfig};
use roompick_core::rest::{Endpoint, RestLookup};
use roompick_core::types::RowContent;
use roompick_core::{
    normalize_query, Autocomplete, DropdownConfig, DropdownState, LookupSource, MemoryInput,
    Placement,
};
use tracing::debug;

/// RoomPick CLI: searchable dropdown lookups from the terminal.
#[derive(Parser)]
#[command(name = "roompick", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    /// Widget tuning file (default: ./.roompick.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Secrets-store directory consulted before the environment
    #[arg(long, global = true, env = "ROOMPICK_SECRETS_DIR")]
    secrets_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PlacementArg {
    Overlay,
    InsertAfter,
}

impl From<PlacementArg> for Placement {
    fn from(p: PlacementArg) -> Self {
        match p {
            PlacementArg::Overlay => Placement::Overlay,
            PlacementArg::InsertAfter => Placement::InsertAfter,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run one lookup cycle and print the outcome
    Search {
        /// Search query (trimmed and lower-cased before lookup)
        query: String,

        /// JSON file holding a static candidate list
        #[arg(long, conflicts_with = "endpoint")]
        source: Option<PathBuf>,

        /// Backend collection to search (hotels or visitors)
        #[arg(long)]
        endpoint: Option<String>,

        /// Base URL of the booking API (overrides API_BASEURL)
        #[arg(long)]
        api_base: Option<String>,

        /// Maximum number of candidates kept
        #[arg(long)]
        limit: Option<usize>,

        /// Popup placement used for geometry
        #[arg(long, value_enum, default_value = "overlay")]
        placement: PlacementArg,

        /// Commit the row at this index, as if clicked
        #[arg(long)]
        pick: Option<usize>,
    },
    /// Show the resolved host configuration and widget tuning
    Config,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => fail(format!("Could not encode output: {e}")),
    }
}

fn tuning(config: Option<PathBuf>) -> DropdownConfig {
    let path = config.unwrap_or_else(|| {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        default_config_path(&cwd)
    });
    load_dropdown_config(&path)
}

fn build_source(
    source: Option<PathBuf>,
    endpoint: Option<String>,
    api_base: Option<String>,
    secrets_dir: Option<&Path>,
) -> LookupSource {
    if let Some(path) = source {
        let content = std::fs::read_to_string(&path)
            .unwrap_or_else(|e| fail(format!("Could not read {}: {e}", path.display())));
        let value: serde_json::Value = serde_json::from_str(&content)
            .unwrap_or_else(|e| fail(format!("{} is not valid JSON: {e}", path.display())));
        return LookupSource::from_json(value).unwrap_or_else(|e| fail(e));
    }

    let endpoint: Endpoint = endpoint
        .as_deref()
        .unwrap_or("hotels")
        .parse()
        .unwrap_or_else(|e| fail(e));
    let base = match api_base {
        Some(base) => base,
        None => {
            let host = HostConfig::load(secrets_dir);
            if !host.has_api() {
                fail("No API base URL: pass --api-base, set API_BASEURL, or use --source");
            }
            host.api_baseurl().to_string()
        }
    };
    let lookup = RestLookup::for_endpoint(&base, endpoint).unwrap_or_else(|e| fail(e));
    debug!(url = %lookup.url(), "Using REST lookup");
    LookupSource::from_lookup(lookup)
}

/// The widget never looks up an empty query, so say so up front.
fn check_query(query: &str) -> Result<(), &'static str> {
    if normalize_query(query).is_empty() {
        return Err("Empty query: nothing to search");
    }
    Ok(())
}

/// Why a search left the widget without a list or a selection.
fn incomplete_message(query: &str, state: DropdownState) -> String {
    match state {
        // A rejected reply leaves a fresh widget idle; the lookup's own warning says why.
        DropdownState::Idle => format!("Lookup for '{query}' failed"),
        other => format!("Lookup for '{query}' did not complete ({other:?})"),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("roompick=warn".parse().expect("static directive")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search { query, source, endpoint, api_base, limit, placement, pick } => {
            check_query(&query).unwrap_or_else(|e| fail(e));
            let mut config = tuning(cli.config);
            if let Some(limit) = limit {
                config.limit = limit;
            }
            let source = build_source(source, endpoint, api_base, cli.secrets_dir.as_deref());
            let widget = Autocomplete::with_config(
                MemoryInput::with_text(&query),
                source,
                placement.into(),
                config,
            );

            widget.search(&query, Duration::ZERO);
            widget.settle().await;

            let picked = pick.map(|index| {
                widget
                    .select(index)
                    .unwrap_or_else(|| fail(format!("No selectable row at index {index}")))
            });

            let candidates = widget.candidates();
            let popup = widget.popup();
            let state = widget.state();
            let selection = widget.value();

            if cli.json {
                let rows: Vec<serde_json::Value> = popup
                    .rows
                    .iter()
                    .map(|row| {
                        let (kind, content) = match &row.content {
                            RowContent::Text(t) => ("text", t),
                            RowContent::Html(h) => ("html", h),
                        };
                        let mut item = serde_json::json!({
                            "index": row.index,
                            "value": row.value,
                        });
                        item[kind] = serde_json::Value::String(content.clone());
                        item
                    })
                    .collect();
                print_json(&serde_json::json!({
                    "query": query,
                    "state": format!("{state:?}"),
                    "visible": popup.visible,
                    "style": popup.style,
                    "rows": rows,
                    "selection": selection,
                }));
                return;
            }

            match state {
                DropdownState::Empty => fail(format!("No matches for '{query}'")),
                DropdownState::AutoResolved | DropdownState::Committed => {
                    println!("{}  (value {})", selection.display_text, selection.value);
                    if picked.is_none() {
                        eprintln!("\nauto-resolved from a single match");
                    }
                }
                DropdownState::Listed => {
                    for row in &popup.rows {
                        let text = candidates[row.index].display_text.as_deref().unwrap_or("");
                        println!("{:>4}  {:<48} {}", row.index, text, row.value);
                    }
                    eprintln!("\n{} candidates", popup.rows.len());
                }
                other => fail(incomplete_message(&query, other)),
            }
        }
        Commands::Config => {
            let host = HostConfig::load(cli.secrets_dir.as_deref());
            let config = tuning(cli.config);
            if cli.json {
                print_json(&serde_json::json!({
                    "api_baseurl": host.api_baseurl(),
                    "limit": config.limit,
                    "search_delay_ms": config.search_delay.as_millis() as u64,
                    "blur_grace_ms": config.blur_grace.as_millis() as u64,
                    "viewport_margin": config.viewport_margin,
                    "min_max_height": config.min_max_height,
                    "inline_max_height": config.inline_max_height,
                    "discard_stale_responses": config.discard_stale_responses,
                }));
            } else {
                let api = if host.has_api() { host.api_baseurl() } else { "(not set)" };
                println!("API base URL:      {api}");
                println!("Limit:             {}", config.limit);
                println!("Search delay:      {}ms", config.search_delay.as_millis());
                println!("Blur grace:        {}ms", config.blur_grace.as_millis());
                println!("Viewport margin:   {}px", config.viewport_margin);
                println!("Min max-height:    {}px", config.min_max_height);
                println!("Inline max-height: {}px", config.inline_max_height);
                println!("Discard stale:     {}", config.discard_stale_responses);
            }
        }
    }
}
