//! Solver statistics tracking.

use std::time::{Duration, Instant};

use tracing::info;

/// Statistics collected during retrograde solving.
#[derive(Debug, Default, Clone)]
pub struct SolverStats {
    /// Positions seeded as wins because the mover already holds a mill
    pub mill_wins: u64,

    /// Positions seeded as losses because the opponent holds a mill
    pub mill_losses: u64,

    /// Positions seeded as losses because the mover has no slide
    pub stalemates: u64,

    /// Worklist entries processed
    pub pops: u64,

    /// Predecessors resolved as wins by propagation
    pub propagated_wins: u64,

    /// Predecessors resolved as losses once every option was exhausted
    pub propagated_losses: u64,

    /// Longest the worklist got
    pub max_queue: usize,

    /// Time spent seeding
    pub seed_time: Duration,

    /// Time spent propagating
    pub propagate_time: Duration,

    start_time: Option<Instant>,
}

impl SolverStats {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// Total positions resolved during seeding.
    pub fn seeded(&self) -> u64 {
        self.mill_wins + self.mill_losses + self.stalemates
    }

    /// Total positions resolved during propagation.
    pub fn propagated(&self) -> u64 {
        self.propagated_wins + self.propagated_losses
    }

    /// Worklist entries processed per second of propagation.
    pub fn pops_per_sec(&self) -> f64 {
        let elapsed = self.propagate_time.as_secs_f64();
        if elapsed > 0.0 {
            self.pops as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Log final summary.
    pub fn log_summary(&self) {
        let total = self
            .start_time
            .map(|s| s.elapsed())
            .unwrap_or_default();
        info!(
            mill_wins = self.mill_wins,
            mill_losses = self.mill_losses,
            stalemates = self.stalemates,
            "Seeded terminal positions"
        );
        info!(
            pops = self.pops,
            wins = self.propagated_wins,
            losses = self.propagated_losses,
            max_queue = self.max_queue,
            pops_per_sec = self.pops_per_sec() as u64,
            "Propagation finished"
        );
        info!(
            seed_ms = self.seed_time.as_millis() as u64,
            propagate_ms = self.propagate_time.as_millis() as u64,
            total_ms = total.as_millis() as u64,
            "Solver timing"
        );
    }
}
