mod app;
mod config;
mod error;
mod logging;
mod purge;
mod scanner;
mod selection;
mod tui;
mod units;

use clap::Parser;
use colored::Colorize;
use console::{Alignment, measure_text_width, pad_str};
use config::{Config, RunMode};
use error::Result;
use indicatif::{ProgressBar, ProgressStyle};
use scanner::CacheEntry;
use selection::SelectionStore;
use std::path::PathBuf;
use std::time::Duration;
use units::format_size;

#[derive(Parser)]
#[command(name = "cachesweep")]
#[command(about = "Inspect a cache directory and delete the entries you pick")]
#[command(version)]
pub struct Cli {
    /// Cache directory to inspect
    #[arg(default_value = "~/.cache")]
    root: PathBuf,

    /// Hide directories that contain no data
    #[arg(short = 'e', long)]
    skip_empty: bool,

    /// Start with every entry selected
    #[arg(short = 'a', long)]
    select_all: bool,

    /// Show what would be deleted without deleting
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Delete every entry without the interactive selector
    #[arg(short = 'y', long)]
    yes: bool,

    /// Write logs to this file
    #[arg(long, env = "CACHESWEEP_LOG")]
    log_file: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `cachesweep=trace`
    #[arg(long, env = "CACHESWEEP_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn build_display_item(entry: &CacheEntry, name_width: usize) -> String {
    let kind = if entry.is_dir { "dir" } else { "file" };
    format!(
        "{}  {:>10}  {}",
        pad_str(&entry.name, name_width, Alignment::Left, None),
        format_size(entry.size_bytes),
        format!("[{}]", kind).dimmed()
    )
}

/// Scan, list and optionally purge everything without interaction.
fn run_batch(config: &Config) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Scanning {}...", config.root.display()));
    spinner.enable_steady_tick(Duration::from_millis(100));
    let scanned = scanner::scan(&config.root, &config.scan);
    spinner.finish_and_clear();

    let mut store = SelectionStore::new(true);
    store.replace_inventory(scanned?);

    if store.is_empty() {
        println!("{}", "Empty cache.".yellow());
        return Ok(());
    }

    println!(
        "Found {} entries ({})\n",
        store.len().to_string().green().bold(),
        format_size(store.grand_total()).green().bold()
    );

    let name_width = store
        .entries()
        .iter()
        .map(|e| measure_text_width(&e.name))
        .max()
        .unwrap_or(20);
    for entry in store.entries() {
        println!("  {}", build_display_item(entry, name_width));
    }

    if config.mode == RunMode::DryRun {
        println!(
            "\n{} nothing deleted, {} would be freed",
            "Dry run:".yellow(),
            format_size(store.selected_total()).green().bold()
        );
        return Ok(());
    }

    let selected = store.snapshot_selected();
    println!("\n{} {} entries...", "Deleting".red().bold(), selected.len());
    let report = purge::purge(&config.root, &selected);
    store.remove_entries(&report.attempted);

    if !report.is_clean() {
        println!("\n{}", "Failed to delete:".red());
        for failure in &report.failures {
            println!("  {} - {}", failure.name, failure.reason);
        }
    }

    if report.removed_count() > 0 {
        println!(
            "\n{} Freed {} in {} entries",
            "Done!".green().bold(),
            format_size(report.freed_bytes).green().bold(),
            report.removed_count().to_string().green()
        );
    }
    Ok(())
}

fn run(config: &Config) -> Result<()> {
    let _guard = logging::init(
        config.log_file.as_deref(),
        &config.log_level,
        config.mode == RunMode::Interactive,
    )?;

    match config.mode {
        RunMode::Interactive => {
            let freed = tui::run(config)?;
            if freed > 0 {
                println!("{} Freed {}", "Done!".green().bold(), format_size(freed).green().bold());
            }
            Ok(())
        }
        RunMode::DryRun | RunMode::Unattended => run_batch(config),
    }
}

fn main() {
    let config = Config::from_cli(Cli::parse());

    if let Err(err) = run(&config) {
        eprintln!("{} {}", "error:".red().bold(), err);
        std::process::exit(1);
    }
}
