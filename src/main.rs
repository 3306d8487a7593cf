//! Binary entry point for siterepo.
//!
//! A small operator CLI over the site repository.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use siterepo::config::SiteRepoConfig;
use siterepo::observability;
use siterepo::{Board, Filter, SiteId, SiteRepository, VariantId, VariantRegistry};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Siterepo - site registry for a multi-backend imageboard browser.
#[derive(Parser)]
#[command(name = "siterepo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// List the built-in site variants.
    Variants,

    /// List configured sites.
    List {
        /// Show sites in display order.
        #[arg(long)]
        ordered: bool,
    },

    /// Add a site of the given variant.
    Add {
        /// Variant ID (see `variants`).
        variant_id: u32,
    },

    /// Remove a site and everything that references it.
    Remove {
        /// Site ID.
        site_id: u32,
    },

    /// Set the display order. Unlisted sites sort last.
    Reorder {
        /// Site IDs, first to last.
        site_ids: Vec<u32>,
    },

    /// Set one user setting on a site.
    Settings {
        /// Site ID.
        site_id: u32,
        /// Setting key.
        key: String,
        /// JSON value; anything that is not valid JSON is stored as a string.
        value: String,
    },

    /// Manage boards.
    Board {
        #[command(subcommand)]
        command: BoardCommand,
    },

    /// Manage post filters.
    Filter {
        #[command(subcommand)]
        command: FilterCommand,
    },
}

/// Board subcommands.
#[derive(Subcommand)]
enum BoardCommand {
    /// Add a board to a site.
    Add {
        /// Site ID.
        site_id: u32,
        /// Board code, e.g. "g".
        code: String,
        /// Board name.
        name: String,
    },
}

/// Filter subcommands.
#[derive(Subcommand)]
enum FilterCommand {
    /// Add a filter.
    Add {
        /// Pattern to match.
        pattern: String,
        /// Board scope as `siteId:boardCode` tokens, comma-separated.
        #[arg(long, default_value = "")]
        boards: String,
        /// Apply to every board.
        #[arg(long)]
        all_boards: bool,
    },
    /// List filters.
    List,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match SiteRepoConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_from_settings(&config.logging, cli.verbose) {
        eprintln!("Failed to initialize observability: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
async fn run_command(command: Commands, config: SiteRepoConfig) -> anyhow::Result<()> {
    if let Commands::Variants = command {
        cmd_variants();
        return Ok(());
    }

    let repo = open_repository(&config).await?;
    match command {
        Commands::Variants => Ok(()),
        Commands::List { ordered } => cmd_list(&repo, ordered),
        Commands::Add { variant_id } => cmd_add(&repo, variant_id),
        Commands::Remove { site_id } => cmd_remove(&repo, site_id),
        Commands::Reorder { site_ids } => cmd_reorder(&repo, &site_ids),
        Commands::Settings {
            site_id,
            key,
            value,
        } => cmd_settings(&repo, site_id, key, &value).await,
        Commands::Board {
            command: BoardCommand::Add {
                site_id,
                code,
                name,
            },
        } => cmd_board_add(&repo, site_id, code, name),
        Commands::Filter { command } => cmd_filter(&repo, command),
    }
}

/// Opens the configured database and waits for the initial load.
async fn open_repository(config: &SiteRepoConfig) -> anyhow::Result<Arc<SiteRepository>> {
    let repo = Arc::new(
        SiteRepository::from_config(config)
            .with_context(|| format!("opening {}", config.database_path.display()))?,
    );
    repo.spawn_load().await.context("load task failed")??;
    repo.wait_ready().await.context("loading sites")?;
    Ok(repo)
}

fn cmd_variants() {
    let registry = VariantRegistry::new();
    for variant in registry.variants() {
        match registry.instantiate(variant.id()) {
            Ok(kind) => {
                let backend = kind.backend();
                println!(
                    "{:>3}  {:<12} {:<8} {}",
                    variant.id(),
                    backend.name(),
                    backend.boards_type().as_str(),
                    backend.root_url()
                );
            },
            Err(e) => println!("{:>3}  <unavailable: {e}>", variant.id()),
        }
    }
}

fn cmd_list(repo: &SiteRepository, ordered: bool) -> anyhow::Result<()> {
    let sites = if ordered {
        repo.all_in_order()?
    } else {
        repo.get_all()
    };
    if sites.is_empty() {
        println!("No sites configured.");
        return Ok(());
    }

    let ordering = repo.ordering()?;
    for site in sites {
        let rank = ordering
            .get(&site.id())
            .map_or_else(|| "-".to_string(), ToString::to_string);
        println!(
            "{:>4}  {:<12} rank {:<3} {}{}",
            site.id(),
            site.name(),
            rank,
            site.root_url(),
            if site.enabled() { "" } else { "  (disabled)" }
        );
    }
    Ok(())
}

fn cmd_add(repo: &SiteRepository, variant_id: u32) -> anyhow::Result<()> {
    let site = repo.create_from_variant(VariantId::new(variant_id))?;
    println!("Added {} as site {}", site.descriptor(), site.id());
    Ok(())
}

fn cmd_remove(repo: &SiteRepository, site_id: u32) -> anyhow::Result<()> {
    let site = repo.for_id(SiteId::new(site_id))?;
    let summary = repo.remove_site(&site)?;
    println!(
        "Removed site {} ({} filters, {} boards, {} saved replies, {} thread hides)",
        site.id(),
        summary.filters,
        summary.boards,
        summary.saved_replies,
        summary.thread_hides
    );
    Ok(())
}

fn cmd_reorder(repo: &SiteRepository, site_ids: &[u32]) -> anyhow::Result<()> {
    let sites = site_ids
        .iter()
        .map(|&id| repo.for_id(SiteId::new(id)))
        .collect::<siterepo::Result<Vec<_>>>()?;
    repo.update_ordering(&sites)?;
    println!("Ordered {} sites", sites.len());
    Ok(())
}

async fn cmd_settings(
    repo: &Arc<SiteRepository>,
    site_id: u32,
    key: String,
    value: &str,
) -> anyhow::Result<()> {
    let site = repo.for_id(SiteId::new(site_id))?;
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));

    let mut settings = site.settings();
    settings.set(key.clone(), value);
    repo.update_settings_async(Arc::clone(&site), settings)
        .await?;
    println!("Updated {key} on site {}", site.id());
    Ok(())
}

fn cmd_board_add(
    repo: &SiteRepository,
    site_id: u32,
    code: String,
    name: String,
) -> anyhow::Result<()> {
    let site = repo.for_id(SiteId::new(site_id))?;
    repo.gateway().add_board(&Board {
        site_id: site.id(),
        code,
        name,
    })?;
    println!("Added board to {}", site.descriptor());
    Ok(())
}

fn cmd_filter(repo: &SiteRepository, command: FilterCommand) -> anyhow::Result<()> {
    match command {
        FilterCommand::Add {
            pattern,
            boards,
            all_boards,
        } => {
            if !all_boards && boards.is_empty() {
                bail!("a filter needs --boards or --all-boards");
            }
            let filter = if all_boards {
                Filter::global(pattern)
            } else {
                Filter::scoped(pattern, boards)
            };
            let filter = repo.gateway().add_filter(&filter)?;
            println!("Added filter {}", filter.id);
        },
        FilterCommand::List => {
            for filter in repo.gateway().list_filters()? {
                let scope = if filter.all_boards {
                    "all boards"
                } else {
                    filter.boards.as_str()
                };
                println!("{:>4}  {:<24} {}", filter.id, filter.pattern, scope);
            }
        },
    }
    Ok(())
}
