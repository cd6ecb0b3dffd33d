//! Sliding mill solver.
//!
//! Builds the full tablebase by retrograde analysis and answers simple
//! queries about positions in it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use morris_core::{PositionIndex, Side};
use morris_solver::{Checkpoint, SolverConfig, Tablebase};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Retrograde solver for the three-stone sliding mill game
#[derive(Parser, Debug)]
#[command(name = "solver")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "morris.toml")]
    config: PathBuf,

    /// Tablebase file (overrides the config)
    #[arg(long)]
    tablebase: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build and solve the tablebase, then save it
    Solve,

    /// Show every move from a position, grouped by outcome
    Moves {
        /// Catalog index
        index: PositionIndex,
        /// Side to move (red or black)
        side: Side,
    },

    /// Show the positions that lead to a position in one move
    Sources {
        /// Catalog index
        index: PositionIndex,
    },

    /// Show move outcomes from the starting position for both sides
    Start,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = SolverConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(path) = cli.tablebase {
        config.tablebase = path;
    }

    match cli.command {
        Command::Solve => solve(&config),
        Command::Moves { index, side } => {
            let tb = open(&config)?;
            print_moves(&tb, index, side);
            Ok(())
        }
        Command::Sources { index } => {
            let tb = open(&config)?;
            print_sources(&tb, index);
            Ok(())
        }
        Command::Start => {
            let tb = open(&config)?;
            let start = tb
                .start_index()
                .context("starting position is not in the catalog")?;
            for side in Side::ALL {
                print_moves(&tb, start, side);
            }
            Ok(())
        }
    }
}

fn solve(config: &SolverConfig) -> Result<()> {
    let board = config.board.build()?;
    let (tb, stats) = Tablebase::build_with_stats(board, config.rules);

    let summary = tb.summary();
    println!("Positions: {}", tb.len());
    for side in Side::ALL {
        let s = summary.side(side);
        println!(
            "  {} to move: win {}, loss {}, unknown {}",
            side, s.wins, s.losses, s.unknown
        );
    }
    println!(
        "Seeded {}, propagated {}",
        stats.seeded(),
        stats.propagated()
    );

    let count = tb
        .save(&config.tablebase)
        .with_context(|| format!("saving {}", config.tablebase.display()))?;
    info!(entries = count, path = %config.tablebase.display(), "Tablebase written");
    Ok(())
}

/// Load the tablebase file if present, otherwise build it in memory.
fn open(config: &SolverConfig) -> Result<Tablebase> {
    let path: &Path = &config.tablebase;
    if path.exists() {
        match Checkpoint::load(path).and_then(Tablebase::from_checkpoint) {
            Ok(tb) => return Ok(tb),
            Err(e) => warn!(error = %e, "Failed to load tablebase, rebuilding"),
        }
    }
    Ok(Tablebase::build(config.board.build()?, config.rules))
}

fn print_moves(tb: &Tablebase, index: PositionIndex, side: Side) {
    let Some(position) = tb.position(index) else {
        println!("Position #{} not found", index);
        return;
    };
    println!("\nPosition #{} ({} to move): {}", index, side, position);
    if let Some(status) = tb.status_of(index, side) {
        println!("  Status: {}", status);
    }

    let Some(outcomes) = tb.moves_of(index, side) else {
        return;
    };
    if outcomes.is_empty() {
        println!("  No moves.");
        return;
    }
    for (label, targets) in [
        ("Forced win by moving to", &outcomes.winning),
        ("Losing moves", &outcomes.losing),
        ("Undecided", &outcomes.undecided),
    ] {
        if targets.is_empty() {
            continue;
        }
        println!("  {}:", label);
        for &target in targets {
            if let Some(pos) = tb.position(target) {
                println!("    -> #{}: {}", target, pos);
            }
        }
    }
}

fn print_sources(tb: &Tablebase, index: PositionIndex) {
    let Some(position) = tb.position(index) else {
        println!("Position #{} not found", index);
        return;
    };
    println!("\nPosition #{}: {}", index, position);

    let mut any = false;
    for side in Side::ALL {
        let sources = tb.predecessors_of(index, side);
        if sources.is_empty() {
            continue;
        }
        any = true;
        println!("  <- {} ({}):", side, sources.len());
        for &src in sources {
            if let Some(pos) = tb.position(src) {
                println!("    #{}: {}", src, pos);
            }
        }
    }
    if !any {
        println!("  Not reachable in one move");
    }
}
