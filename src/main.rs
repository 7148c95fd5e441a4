//! agemap - box-plot file age statistics per directory.
//!
//! Usage:
//!   agemap scan [PATH]             Scan and print an age summary tree
//!   agemap chart [PATH]            Print the age chart for a directory
//!   agemap search PATH PATTERN     Search directory names in parallel
//!   agemap export [PATH]           Export a full recursive report as JSON
//!   agemap --help                  Show help

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tokio_util::sync::CancellationToken;

use agemap_analyze::{generate_report, ChartCalculator};
use agemap_core::{AgeChart, DirTree, NodeId, ScanConfig};
use agemap_model::{fuzzy_age, Column, Role, RowRef, TreeModel};
use agemap_scan::Scanner;
use agemap_search::{SearchEngine, SearchEvent, SearchMode};

#[derive(Parser)]
#[command(
    name = "agemap",
    version,
    about = "Box-plot file age statistics per directory",
    long_about = "agemap shows how old the data under a directory really is.\n\n\
                  It scans a tree once, then computes byte-weighted age \
                  percentiles for any directory, searches directory names in \
                  parallel, and exports a full recursive report."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a tree and print a per-directory age summary
    Scan {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Maximum depth to display
        #[arg(short, long, default_value = "2")]
        depth: usize,

        /// Number of entries to show per directory
        #[arg(short = 'n', long, default_value = "10")]
        top: usize,
    },

    /// Print the seven-number age chart for one directory
    Chart {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Summarise only the directory's direct files
        #[arg(long)]
        files_only: bool,
    },

    /// Search directory names beneath a path
    Search {
        /// Path to scan
        path: PathBuf,

        /// Pattern to look for
        pattern: String,

        /// Pattern interpretation
        #[arg(short, long, value_enum, default_value_t = ModeArg::Literal)]
        mode: ModeArg,

        /// Number of search workers (0 = one per hardware thread)
        #[arg(long, default_value = "0")]
        threads: usize,
    },

    /// Export the full recursive report as JSON
    Export {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Literal,
    Wildcard,
    Regex,
}

impl From<ModeArg> for SearchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Literal => SearchMode::Literal,
            ModeArg::Wildcard => SearchMode::Wildcard,
            ModeArg::Regex => SearchMode::Regex,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Scan { path, depth, top } => run_scan(&path, depth, top).await,
        Command::Chart { path, files_only } => run_chart(&path, files_only).await,
        Command::Search {
            path,
            pattern,
            mode,
            threads,
        } => run_search(&path, &pattern, mode.into(), threads).await,
        Command::Export { path, output } => run_export(&path, output).await,
    }
}

/// Scan `config.root`, reporting progress on stderr once a second.
async fn scan_tree(config: &ScanConfig) -> Result<Arc<DirTree>> {
    eprintln!("Scanning {}...", config.root.display());

    let mut scanner = Scanner::new();
    let handle = scanner.start(config).await;
    let progress = handle.progress_cell();

    let join = handle.join();
    tokio::pin!(join);
    let mut ticker = tokio::time::interval_at(
        tokio::time::Instant::now() + Duration::from_secs(1),
        Duration::from_secs(1),
    );

    let tree = loop {
        tokio::select! {
            result = &mut join => break result.context("Scan failed")?,
            _ = ticker.tick() => {
                let p = progress.snapshot();
                eprintln!(
                    "  {} files, {} dirs, {} skipped, {} errors",
                    p.num_files, p.num_dirs, p.num_skipped, p.num_errors
                );
            }
        }
    };

    let p = progress.snapshot();
    eprintln!(
        "Scanned {} files in {} directories ({} skipped, {} errors)",
        p.num_files, p.num_dirs, p.num_skipped, p.num_errors
    );
    Ok(Arc::new(tree))
}

fn canonical(path: &Path) -> Result<PathBuf> {
    path.canonicalize().context("Invalid path")
}

/// Run a scan and display the age summary tree.
async fn run_scan(path: &Path, max_depth: usize, top: usize) -> Result<()> {
    let config = ScanConfig::new(canonical(path)?);
    let tree = scan_tree(&config).await?;
    let calculator = ChartCalculator::new();
    let mut model = TreeModel::new();
    model.reset(Some(Arc::clone(&tree)));

    println!();
    println!("{}", "─".repeat(78));
    println!(
        " {} - {}",
        tree.name(tree.root()),
        model.display(RowRef::Dir(tree.root()), Column::Size)
    );
    println!("{}", "─".repeat(78));
    println!(" {:<44} {:>12} {:>12}", "Name", "Size", "Median Age");

    enum Item {
        Row(RowRef, usize),
        Elided(usize, usize),
    }

    // Depth-first listing; charts are computed on demand and cached in the
    // model, the way an interactive view fills in lazily.
    let mut stack: Vec<Item> = vec![Item::Row(RowRef::Dir(tree.root()), 0)];
    while let Some(item) = stack.pop() {
        let (row, depth) = match item {
            Item::Row(row, depth) => (row, depth),
            Item::Elided(count, depth) => {
                println!(" {}... and {count} more", "  ".repeat(depth));
                continue;
            }
        };
        if !model.is_chart_cached(row) {
            let chart = match row {
                RowRef::Dir(node) => {
                    calculator
                        .calculate_subtree(Arc::clone(&tree), node)
                        .join()
                        .await?
                }
                RowRef::Files(node) => {
                    calculator
                        .calculate_files(Arc::clone(&tree), node)
                        .join()
                        .await?
                }
            };
            model.insert_chart(row, chart);
        }

        let indent = "  ".repeat(depth);
        let name = format!("{indent}{}", model.display(row, Column::Name));
        println!(
            " {:<44} {:>12} {:>12}",
            truncate(&name, 44),
            model.display(row, Column::Size),
            model.display(row, Column::MedianAge),
        );

        if let RowRef::Dir(node) = row {
            if depth < max_depth {
                let mut rows: Vec<RowRef> = (0..model.row_count(node))
                    .filter_map(|index| model.row_at(node, index))
                    .collect();
                // Largest entries first; the listing truncates per level.
                rows.sort_by_key(|&r| std::cmp::Reverse(model.role_value(r, Role::EntrySize)));
                let remaining = rows.len().saturating_sub(top);
                if remaining > 0 {
                    stack.push(Item::Elided(remaining, depth + 1));
                }
                // Push in reverse so rows print largest-first.
                for child_row in rows.into_iter().take(top).rev() {
                    stack.push(Item::Row(child_row, depth + 1));
                }
            }
        }
    }

    println!();
    println!(
        " Age axis spans {} .. {}",
        describe_time(model.role_value(RowRef::Dir(tree.root()), Role::MinAge)),
        describe_time(model.role_value(RowRef::Dir(tree.root()), Role::MaxAge)),
    );
    Ok(())
}

/// Compute and print a single chart.
async fn run_chart(path: &Path, files_only: bool) -> Result<()> {
    let config = ScanConfig::new(canonical(path)?);
    let tree = scan_tree(&config).await?;
    let calculator = ChartCalculator::new();

    let task = if files_only {
        calculator.calculate_files(Arc::clone(&tree), tree.root())
    } else {
        calculator.calculate_subtree(Arc::clone(&tree), tree.root())
    };
    let chart = task.join().await?;

    if !chart.valid() {
        println!("No data: the directory holds no files.");
        return Ok(());
    }

    print_chart(&chart);
    if chart.singleton() {
        println!(" (single modification time)");
    }
    Ok(())
}

fn print_chart(chart: &AgeChart) {
    let now = now_secs();
    let rows = [
        ("min", chart.min),
        ("p5", chart.lower_whisker),
        ("p25", chart.lower_quartile),
        ("median", chart.median),
        ("p75", chart.upper_quartile),
        ("p95", chart.upper_whisker),
        ("max", chart.max),
    ];
    println!();
    for (label, time) in rows {
        println!(" {:<8} {:>12}   {} ago", label, time, fuzzy_age(time, now));
    }
}

/// Scan, then stream search results as they arrive.
async fn run_search(path: &Path, pattern: &str, mode: SearchMode, threads: usize) -> Result<()> {
    let config = ScanConfig::builder()
        .root(canonical(path)?)
        .threads(threads)
        .build()
        .map_err(|err| color_eyre::eyre::eyre!("{err}"))?;
    let tree = scan_tree(&config).await?;
    let mut engine = SearchEngine::with_threads(config.threads);
    let rx = engine.start(pattern, mode, Arc::clone(&tree))?;

    let stream_tree = Arc::clone(&tree);
    let (paths, hits) = tokio::task::spawn_blocking(move || {
        let mut paths = Vec::new();
        let mut total = 0;
        for event in rx.iter() {
            match event {
                SearchEvent::Match(node) => paths.push(full_path(&stream_tree, node)),
                SearchEvent::Done { hits } => {
                    total = hits;
                    break;
                }
            }
        }
        (paths, total)
    })
    .await
    .context("Search stream failed")?;

    for path in &paths {
        println!("{path}");
    }
    eprintln!("{hits} match(es)");
    Ok(())
}

/// Reconstruct the absolute path of a node from its parent chain. The root
/// carries the user-supplied path, so joining the components restores the
/// full path.
fn full_path(tree: &DirTree, node: NodeId) -> String {
    let mut parts = Vec::new();
    let mut current = Some(node);
    while let Some(id) = current {
        parts.push(tree.name(id).to_string());
        current = tree.parent(id);
    }
    parts.reverse();
    parts.join(std::path::MAIN_SEPARATOR_STR)
}

/// Export the recursive report as JSON.
async fn run_export(path: &Path, output: Option<PathBuf>) -> Result<()> {
    let config = ScanConfig::new(canonical(path)?);
    let tree = scan_tree(&config).await?;
    let calculator = ChartCalculator::new();
    let cancel = CancellationToken::new();

    eprintln!("Generating report...");
    let report = generate_report(&calculator, &tree, &cancel)
        .await
        .context("Report generation failed")?;
    let json = serde_json::to_string_pretty(&report)?;

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, json)
                .with_context(|| format!("Cannot write {}", output_path.display()))?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            println!("{json}");
        }
    }
    Ok(())
}

fn now_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn describe_time(time: i64) -> String {
    if time == i64::MAX || time == i64::MIN {
        "-".to_string()
    } else {
        format!("{} ago", fuzzy_age(time, now_secs()))
    }
}

/// Truncate a string to at most `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_len.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
