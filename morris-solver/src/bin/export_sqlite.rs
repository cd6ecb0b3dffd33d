//! Export a binary tablebase to SQLite.
//!
//! Usage: export_sqlite [input.bin] [output.db]
//!
//! Writes two tables:
//! - `positions`: one row per catalog index with both statuses
//! - `safe_moves`: every slide that does not hand the opponent a forced win,
//!   the machine-readable form of the move-safety rules

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use morris_core::{Position, PositionIndex, Side};
use morris_solver::{Checkpoint, Tablebase};
use rusqlite::{params, Connection};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn ban_label(position: &Position, side: Side) -> Option<String> {
    position.ban(side).map(|step| step.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let input_path = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/tablebase.bin"));
    let output_path = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/tablebase.db"));

    info!(input = %input_path.display(), output = %output_path.display(), "Exporting tablebase");

    let start = Instant::now();
    let checkpoint = Checkpoint::load(&input_path)
        .with_context(|| format!("loading {}", input_path.display()))?;
    let tb = Tablebase::from_checkpoint(checkpoint)?;
    info!(
        positions = tb.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Loaded tablebase"
    );

    // Remove existing output file if present
    if output_path.exists() {
        std::fs::remove_file(&output_path).ok();
    }

    let conn = Connection::open(&output_path)
        .with_context(|| format!("creating {}", output_path.display()))?;
    conn.execute_batch(
        "CREATE TABLE positions (
            idx INTEGER PRIMARY KEY,
            red TEXT NOT NULL,
            black TEXT NOT NULL,
            red_ban TEXT,
            black_ban TEXT,
            red_status INTEGER NOT NULL,
            black_status INTEGER NOT NULL
        );
        CREATE TABLE safe_moves (
            idx INTEGER NOT NULL,
            side TEXT NOT NULL,
            src TEXT NOT NULL,
            dst TEXT NOT NULL,
            target INTEGER NOT NULL
        );",
    )?;

    let start = Instant::now();
    let mut safe_rows = 0usize;

    // One transaction for all inserts
    let tx = conn.unchecked_transaction()?;
    {
        let mut insert_position = tx.prepare(
            "INSERT INTO positions (idx, red, black, red_ban, black_ban, red_status, black_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        let mut insert_move = tx.prepare(
            "INSERT INTO safe_moves (idx, side, src, dst, target) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;

        for (i, position) in tb.catalog().positions().iter().enumerate() {
            let idx = i as PositionIndex;
            let red_status = tb.status_of(idx, Side::Red).unwrap_or_default();
            let black_status = tb.status_of(idx, Side::Black).unwrap_or_default();
            insert_position.execute(params![
                idx,
                position.red.to_string(),
                position.black.to_string(),
                ban_label(position, Side::Red),
                ban_label(position, Side::Black),
                red_status.to_i8(),
                black_status.to_i8(),
            ])?;

            for side in Side::ALL {
                for (step, target) in tb.safe_steps(idx, side) {
                    insert_move.execute(params![
                        idx,
                        side.to_string(),
                        step.from.label(),
                        step.to.label(),
                        target,
                    ])?;
                    safe_rows += 1;
                }
            }
        }
    }
    tx.commit()?;

    info!(
        positions = tb.len(),
        safe_moves = safe_rows,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Inserted rows"
    );

    // Spot-check a few rows against the tablebase
    let step = (tb.len() / 5).max(1);
    for idx in (0..tb.len()).step_by(step).take(5) {
        let idx = idx as PositionIndex;
        let stored: i8 = conn.query_row(
            "SELECT red_status FROM positions WHERE idx = ?1",
            params![idx],
            |row| row.get(0),
        )?;
        let expected = tb.status_of(idx, Side::Red).unwrap_or_default().to_i8();
        anyhow::ensure!(stored == expected, "status mismatch for position {}", idx);
    }
    info!("Verification passed");

    let output_size = std::fs::metadata(&output_path).map(|m| m.len()).unwrap_or(0);
    println!(
        "Done! {} positions, {} safe moves, {:.1} KB at {}",
        tb.len(),
        safe_rows,
        output_size as f64 / 1024.0,
        output_path.display()
    );
    Ok(())
}
