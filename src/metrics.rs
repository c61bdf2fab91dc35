//! Wager metrics collection and Prometheus export

use crate::games::types::GameKind;
use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub struct WagerMetrics {
    start_time: Instant,
    pub rounds_started: AtomicU64,
    pub rounds_settled: AtomicU64,
    pub steps_total: AtomicU64,
    pub cashouts_total: AtomicU64,
    pub tickets_sold: AtomicU64,
    pub draws_total: AtomicU64,
    /// Sum of stakes in minor units
    pub wagered_total: AtomicU64,
    pub paid_total: AtomicU64,
    rounds_by_game: DashMap<GameKind, AtomicU64>,
    rejections: DashMap<&'static str, AtomicU64>,
}

impl Default for WagerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl WagerMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            rounds_started: AtomicU64::new(0),
            rounds_settled: AtomicU64::new(0),
            steps_total: AtomicU64::new(0),
            cashouts_total: AtomicU64::new(0),
            tickets_sold: AtomicU64::new(0),
            draws_total: AtomicU64::new(0),
            wagered_total: AtomicU64::new(0),
            paid_total: AtomicU64::new(0),
            rounds_by_game: DashMap::new(),
            rejections: DashMap::new(),
        }
    }

    pub fn record_round_started(&self, game: GameKind, stake: u64) {
        self.rounds_started.fetch_add(1, Ordering::Relaxed);
        self.wagered_total.fetch_add(stake, Ordering::Relaxed);
        self.rounds_by_game
            .entry(game)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_step(&self) {
        self.steps_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cashout(&self) {
        self.cashouts_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_settled(&self, payout: u64) {
        self.rounds_settled.fetch_add(1, Ordering::Relaxed);
        self.paid_total.fetch_add(payout, Ordering::Relaxed);
    }

    pub fn record_ticket(&self, price: u64) {
        self.tickets_sold.fetch_add(1, Ordering::Relaxed);
        self.wagered_total.fetch_add(price, Ordering::Relaxed);
    }

    pub fn record_draw(&self, prize: u64) {
        self.draws_total.fetch_add(1, Ordering::Relaxed);
        self.paid_total.fetch_add(prize, Ordering::Relaxed);
    }

    pub fn record_rejection(&self, code: &'static str) {
        self.rejections
            .entry(code)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn rounds_for(&self, game: GameKind) -> u64 {
        self.rounds_by_game
            .get(&game)
            .map(|count| count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn rejections_for(&self, code: &str) -> u64 {
        self.rejections
            .get(code)
            .map(|count| count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Generate Prometheus metrics format
    pub fn to_prometheus_format(&self) -> String {
        let mut output = String::new();

        let counters = [
            ("wager_rounds_started_total", "Rounds opened", &self.rounds_started),
            ("wager_rounds_settled_total", "Rounds that reached a terminal state", &self.rounds_settled),
            ("wager_steps_total", "Steps applied to multi-step rounds", &self.steps_total),
            ("wager_cashouts_total", "Voluntary cashouts", &self.cashouts_total),
            ("wager_tickets_sold_total", "Lucky draw tickets sold", &self.tickets_sold),
            ("wager_draws_total", "Lucky draw pools drawn", &self.draws_total),
            ("wager_wagered_minor_units_total", "Stakes debited", &self.wagered_total),
            ("wager_paid_minor_units_total", "Payouts credited", &self.paid_total),
        ];
        for (name, help, value) in counters {
            let _ = write!(
                output,
                "# HELP {name} {help}\n# TYPE {name} counter\n{name} {}\n\n",
                value.load(Ordering::Relaxed)
            );
        }

        output.push_str("# HELP wager_rounds_by_game_total Rounds opened per game\n");
        output.push_str("# TYPE wager_rounds_by_game_total counter\n");
        for game in GameKind::ALL {
            let _ = writeln!(output, "wager_rounds_by_game_total{{game=\"{}\"}} {}", game, self.rounds_for(game));
        }
        output.push('\n');

        output.push_str("# HELP wager_rejections_total Rejected operations by error code\n");
        output.push_str("# TYPE wager_rejections_total counter\n");
        let mut codes: Vec<(&'static str, u64)> = self
            .rejections
            .iter()
            .map(|entry| (*entry.key(), entry.value().load(Ordering::Relaxed)))
            .collect();
        codes.sort_unstable();
        for (code, count) in codes {
            let _ = writeln!(output, "wager_rejections_total{{code=\"{}\"}} {}", code, count);
        }
        output.push('\n');

        let _ = write!(
            output,
            "# HELP wager_uptime_seconds Process uptime\n# TYPE wager_uptime_seconds gauge\nwager_uptime_seconds {}\n",
            self.start_time.elapsed().as_secs()
        );

        output
    }
}
