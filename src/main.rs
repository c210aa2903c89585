//! Featscope CLI - feature discovery over a parsed code graph

use clap::{Parser, Subcommand};
use featscope::config::{self, FeatscopeConfig};
use featscope::discovery::{DiscoveryOptions, DiscoveryRequest, DiscoveryStats};
use featscope::store::{GraphStore, SqliteGraphStore};
use featscope::{DiscoveryEngine, Symbol, SymbolId};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::PathBuf;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "featscope")]
#[command(version = "0.1.0")]
#[command(about = "Feature discovery - scored symbol discovery over a polyglot code graph")]
#[command(long_about = r#"
Featscope walks a pre-built code graph (symbols, dependencies, api_calls)
to find every symbol participating in a feature, starting from one entry
point. Frontend and backend halves are bridged through recorded HTTP calls.

Example usage:
  featscope discover --name fetchUsers --feature user-listing
  featscope discover --entry-point 4211 --max-depth 4
  featscope stats
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output (stable schema)
    #[arg(long, global = true)]
    json: bool,

    /// Path to config file (default: ./featscope.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

const SCHEMA_VERSION: &str = "1";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    fn is_machine(self) -> bool {
        matches!(self, Self::Json)
    }

    fn is_human(self) -> bool {
        matches!(self, Self::Human)
    }
}

#[derive(Serialize)]
struct ErrorOut {
    message: String,
}

#[derive(Serialize)]
struct Envelope<T: Serialize> {
    schema_version: &'static str,
    command: &'static str,
    ok: bool,
    data: Option<T>,
    error: Option<ErrorOut>,
}

fn emit_success<T: Serialize>(mode: OutputMode, command: &'static str, data: T) -> anyhow::Result<()> {
    if mode.is_machine() {
        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            ok: true,
            data: Some(data),
            error: None,
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
    }
    Ok(())
}

fn emit_error(mode: OutputMode, command: &'static str, err: &anyhow::Error) -> anyhow::Result<()> {
    match mode {
        OutputMode::Human => Err(anyhow::anyhow!(err.to_string())),
        OutputMode::Json => {
            let payload = Envelope::<serde_json::Value> {
                schema_version: SCHEMA_VERSION,
                command,
                ok: false,
                data: None,
                error: Some(ErrorOut {
                    message: err.to_string(),
                }),
            };
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Discover the symbols belonging to a feature
    Discover {
        /// Entry-point symbol id
        #[arg(short, long)]
        entry_point: Option<SymbolId>,

        /// Entry-point symbol name (must resolve uniquely)
        #[arg(short, long)]
        name: Option<String>,

        /// Feature name for the manifest (defaults to the entry name)
        #[arg(short, long)]
        feature: Option<String>,

        /// Path to the graph database
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Repository id (defaults to the entry symbol's repository)
        #[arg(short, long)]
        repo: Option<i64>,

        /// Maximum traversal depth
        #[arg(long)]
        max_depth: Option<u32>,

        /// Cap on discovered symbols
        #[arg(long)]
        max_symbols: Option<usize>,

        /// Drop symbols scored below this
        #[arg(long)]
        min_score: Option<f64>,

        /// Exclude component symbols from the result
        #[arg(long)]
        no_components: bool,

        /// Exclude model symbols from the result
        #[arg(long)]
        no_models: bool,
    },

    /// Show statistics about the graph database
    Stats {
        /// Path to the graph database
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Show a single symbol
    Symbol {
        /// Symbol id
        #[arg(short, long)]
        id: SymbolId,

        /// Path to the graph database
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Discover { .. } => "discover",
        Commands::Stats { .. } => "stats",
        Commands::Symbol { .. } => "symbol",
    }
}

fn resolve_database(cli: Option<PathBuf>, config: &Option<FeatscopeConfig>) -> PathBuf {
    if let Some(path) = cli {
        return path;
    }
    if let Some(cfg) = config {
        if let Some(db) = &cfg.database {
            return PathBuf::from(db);
        }
    }
    let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    config::default_database_path_in(&base)
}

/// Resolve the entry point from an explicit id or a unique name.
fn resolve_entry(
    store: &SqliteGraphStore,
    entry_point: Option<SymbolId>,
    name: Option<&str>,
) -> anyhow::Result<Symbol> {
    if let Some(id) = entry_point {
        return store
            .get_symbol(id)?
            .ok_or_else(|| anyhow::anyhow!("no symbol with id {}", id));
    }
    let Some(name) = name else {
        anyhow::bail!("pass --entry-point <id> or --name <symbol>");
    };
    let mut matches = store.find_symbols_by_name(name)?;
    match matches.len() {
        0 => anyhow::bail!("no symbol named '{}'", name),
        1 => Ok(matches.remove(0)),
        _ => {
            let listing: Vec<String> = matches
                .iter()
                .map(|s| format!("  {} — {}", s.id, s.short_description()))
                .collect();
            anyhow::bail!(
                "'{}' is ambiguous; pass --entry-point with one of:\n{}",
                name,
                listing.join("\n")
            )
        }
    }
}

#[derive(Tabled)]
struct ManifestRow {
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Symbol")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Entity")]
    entity: String,
}

#[derive(Serialize)]
struct DiscoverItem {
    id: SymbolId,
    name: String,
    symbol_type: String,
    entity_type: Option<String>,
    file_id: Option<i64>,
    score: f64,
}

#[derive(Serialize)]
struct DiscoverOutput {
    feature: String,
    entry_point: SymbolId,
    repo_id: i64,
    symbols: Vec<DiscoverItem>,
    stats: DiscoveryStats,
}

#[derive(Serialize)]
struct SymbolOutput {
    id: SymbolId,
    repo_id: i64,
    name: String,
    symbol_type: String,
    entity_type: Option<String>,
    file_id: Option<i64>,
}

fn print_manifest(feature: &str, items: &[DiscoverItem], stats: &DiscoveryStats) {
    println!("🔍 Feature manifest: {}", feature.bold());
    if items.is_empty() {
        println!("∅ Nothing discovered.");
    } else {
        let rows: Vec<ManifestRow> = items
            .iter()
            .map(|item| ManifestRow {
                score: format!("{:.2}", item.score),
                name: item.name.clone(),
                kind: item.symbol_type.clone(),
                entity: item.entity_type.clone().unwrap_or_else(|| "-".into()),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::sharp());
        println!("{}", table);
    }

    let convergence = if stats.converged {
        "converged".green().to_string()
    } else {
        "iteration cap".yellow().to_string()
    };
    println!(
        "   {} symbols in {} iterations ({}) in {}ms",
        items.len(),
        stats.iterations,
        convergence,
        stats.total_time_ms
    );
    for failure in &stats.failed_strategies {
        println!(
            "   {} strategy '{}' failed on iteration {}: {}",
            "⚠️".yellow(),
            failure.strategy,
            failure.iteration,
            failure.error
        );
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let output_mode = if cli.json { OutputMode::Json } else { OutputMode::Human };
    let cmd_name = command_name(&cli.command);

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else if output_mode.is_machine() {
        EnvFilter::new("error")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match run(cli, output_mode) {
        Ok(()) => Ok(()),
        Err(err) => {
            if output_mode.is_machine() {
                emit_error(output_mode, cmd_name, &err)?;
                Ok(())
            } else {
                Err(err)
            }
        }
    }
}

fn run(cli: Cli, output_mode: OutputMode) -> anyhow::Result<()> {
    let cfg_opt = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Discover {
            entry_point,
            name,
            feature,
            database,
            repo,
            max_depth,
            max_symbols,
            min_score,
            no_components,
            no_models,
        } => {
            let database = resolve_database(database, &cfg_opt);
            let store = SqliteGraphStore::open(&database)?;
            let entry = resolve_entry(&store, entry_point, name.as_deref())?;

            let mut options = DiscoveryOptions::default();
            if let Some(cfg) = &cfg_opt {
                cfg.apply_to(&mut options);
            }
            if let Some(max_depth) = max_depth {
                options.max_depth = max_depth;
            }
            if let Some(max_symbols) = max_symbols {
                options.max_symbols = max_symbols;
            }
            if let Some(min_score) = min_score {
                options.min_relevance_score = min_score;
            }
            options.include_components = !no_components;
            options.include_models = !no_models;

            let repo_id = repo
                .or(cfg_opt.as_ref().and_then(|c| c.repo_id))
                .unwrap_or(entry.repo_id);
            let feature_name = feature.unwrap_or_else(|| entry.name.clone());

            let mut request = DiscoveryRequest::new(entry.id, repo_id, feature_name.clone());
            request.options = options;

            let mut engine = DiscoveryEngine::new();
            let result = engine.discover(&store, &request)?;

            // Resolve names for rendering, sorted by descending score
            let ids: Vec<SymbolId> = result.symbols.keys().copied().collect();
            let resolved = store.get_symbols_batch(&ids)?;
            let mut items: Vec<DiscoverItem> = result
                .symbols
                .iter()
                .map(|(id, score)| {
                    let symbol = resolved.get(id);
                    DiscoverItem {
                        id: *id,
                        name: symbol.map(|s| s.name.clone()).unwrap_or_else(|| format!("#{}", id)),
                        symbol_type: symbol
                            .map(|s| s.symbol_type.to_string())
                            .unwrap_or_else(|| "?".into()),
                        entity_type: symbol.and_then(|s| s.entity_type).map(|e| e.to_string()),
                        file_id: symbol.and_then(|s| s.file_id),
                        score: *score,
                    }
                })
                .collect();
            items.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.id.cmp(&b.id))
            });

            if output_mode.is_human() {
                print_manifest(&feature_name, &items, &result.stats);
            } else {
                let data = DiscoverOutput {
                    feature: feature_name,
                    entry_point: entry.id,
                    repo_id,
                    symbols: items,
                    stats: result.stats,
                };
                emit_success(output_mode, "discover", data)?;
            }
        }

        Commands::Stats { database } => {
            let database = resolve_database(database, &cfg_opt);
            let store = SqliteGraphStore::open(&database)?;
            let stats = store.stats()?;

            if output_mode.is_human() {
                println!("📊 Featscope Statistics ({:?})", database);
                println!("{}", stats);
            } else {
                let data = serde_json::json!({
                    "database": database.display().to_string(),
                    "stats": stats,
                });
                emit_success(output_mode, "stats", data)?;
            }
        }

        Commands::Symbol { id, database } => {
            let database = resolve_database(database, &cfg_opt);
            let store = SqliteGraphStore::open(&database)?;
            let symbol = store
                .get_symbol(id)?
                .ok_or_else(|| anyhow::anyhow!("no symbol with id {}", id))?;

            if output_mode.is_human() {
                println!("{}", symbol.short_description().bold());
                println!("   id:      {}", symbol.id);
                println!("   repo:    {}", symbol.repo_id);
                if let Some(file_id) = symbol.file_id {
                    println!("   file id: {}", file_id);
                }
            } else {
                let data = SymbolOutput {
                    id: symbol.id,
                    repo_id: symbol.repo_id,
                    name: symbol.name,
                    symbol_type: symbol.symbol_type.to_string(),
                    entity_type: symbol.entity_type.map(|e| e.to_string()),
                    file_id: symbol.file_id,
                };
                emit_success(output_mode, "symbol", data)?;
            }
        }
    }

    Ok(())
}
