//! Wager engine
//!
//! Orchestrates one wager operation at a time: resolve the configuration
//! snapshot, run the pure game step, then hand the ledger a single
//! [`UnitOfWork`] so balance, transactions and session state move together.
//! Nothing is written when any check fails.

use crate::clock::{Clock, SystemClock};
use crate::config::EngineSettings;
use crate::config_store::ConfigStore;
use crate::errors::{WagerError, WagerResult};
use crate::games::dragon_tower::{TowerDifficulty, TowerRound};
use crate::games::lucky_draw::{LuckyDrawConfig, Ticket, TicketStatus};
use crate::games::mines::MinesRound;
use crate::games::odds;
use crate::games::plinko::{self, PlinkoRisk};
use crate::games::roulette;
use crate::games::shuffle::ShuffleRound;
use crate::games::slots;
use crate::games::spin::{self, SpinStatus};
use crate::games::{
    CasinoSettings, GameConfiguration, GameKind, GameRng, GameState, SessionId, SessionStatus, SessionView,
    StepInput, StepResult, UserId, Variant, WagerSession,
};
use crate::ledger::{LedgerGateway, LedgerTransaction, SessionStore, TransactionKind, UnitOfWork, WagerStore};
use crate::metrics::WagerMetrics;
use crate::notifications::{LogNotifier, Notification, NotificationKind, NotificationSink};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Game-specific parameters of a multi-step round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum RoundParams {
    Mines { mines: u8 },
    DragonTower { difficulty: TowerDifficulty },
    Shuffle,
}

impl RoundParams {
    fn variant(&self) -> (GameKind, Variant) {
        match *self {
            RoundParams::Mines { mines } => (GameKind::Mines, Variant::Mines { mines }),
            RoundParams::DragonTower { difficulty } => (GameKind::DragonTower, Variant::DragonTower { difficulty }),
            RoundParams::Shuffle => (GameKind::Shuffle, Variant::Standard),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRound {
    pub bet_amount: u64,
    pub params: RoundParams,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundStarted {
    pub session: SessionView,
    pub balance: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub session: SessionView,
    /// Set once the step ended the round
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout: Option<u64>,
    pub balance: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashoutOutcome {
    pub session: SessionView,
    pub payout: u64,
    pub balance: u64,
}

/// A bet on a game that settles in one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum SingleShotBet {
    Plinko { bet_amount: u64, rows: u8, risk: PlinkoRisk },
    /// Position key to stake, e.g. `{"red": 1000, "17": 500}`
    Roulette { bets: BTreeMap<String, u64> },
    Spin { bet_amount: u64 },
    Slots { bet_amount: u64 },
}

impl SingleShotBet {
    pub fn kind(&self) -> GameKind {
        match self {
            SingleShotBet::Plinko { .. } => GameKind::Plinko,
            SingleShotBet::Roulette { .. } => GameKind::Roulette,
            SingleShotBet::Spin { .. } => GameKind::Spin,
            SingleShotBet::Slots { .. } => GameKind::Slots,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayOutcome {
    pub session: SessionView,
    pub payout: u64,
    /// Payout minus stake
    pub net: i64,
    pub balance: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spins_remaining: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketReceipt {
    pub ticket: Ticket,
    pub balance: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawResult {
    pub price: u64,
    pub winner: Ticket,
    pub prize: u64,
    pub participants: usize,
}

/// Active tickets of one price pool
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    pub price: u64,
    pub prize: u64,
    pub tickets: Vec<Ticket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LuckyDrawStats {
    pub pools: Vec<PoolStats>,
    pub recent_winners: Vec<Ticket>,
}

pub const RECENT_WINNERS: usize = 10;

/// Public shape of one Dragon Tower difficulty
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TowerLevel {
    pub difficulty: TowerDifficulty,
    pub rows: u8,
    pub columns: u8,
    pub hazards: u8,
    pub min_bet: u64,
    pub multipliers: Vec<f64>,
}

/// The wager engine. Cheap to share behind an `Arc`.
pub struct WagerEngine {
    store: Arc<dyn WagerStore>,
    configs: Arc<dyn ConfigStore>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    rng: Mutex<GameRng>,
    metrics: Arc<WagerMetrics>,
    settings: EngineSettings,
}

/// Builder for [`WagerEngine`] with overridable collaborators
pub struct EngineBuilder {
    store: Arc<dyn WagerStore>,
    configs: Arc<dyn ConfigStore>,
    notifier: Option<Arc<dyn NotificationSink>>,
    clock: Option<Arc<dyn Clock>>,
    metrics: Option<Arc<WagerMetrics>>,
    rng: Option<GameRng>,
    settings: EngineSettings,
}

impl EngineBuilder {
    pub fn notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn metrics(mut self, metrics: Arc<WagerMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Use this generator instead of one derived from the settings
    pub fn rng(mut self, rng: GameRng) -> Self {
        self.rng = Some(rng);
        self
    }

    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> WagerEngine {
        let rng = match (self.rng, self.settings.rng_seed) {
            (Some(rng), _) => rng,
            (None, Some(seed)) => {
                warn!(seed, "using a fixed RNG seed; outcomes are reproducible");
                GameRng::from_seed(seed)
            }
            (None, None) => GameRng::from_entropy(),
        };
        WagerEngine {
            store: self.store,
            configs: self.configs,
            notifier: self.notifier.unwrap_or_else(|| Arc::new(LogNotifier)),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            rng: Mutex::new(rng),
            metrics: self.metrics.unwrap_or_default(),
            settings: self.settings,
        }
    }
}

macro_rules! expect_config {
    ($config:expr, $variant:path) => {
        match $config {
            $variant(config) => config,
            other => {
                return Err(WagerError::ConfigurationUnavailable(format!(
                    "store returned {} configuration",
                    other.kind()
                )))
            }
        }
    };
}

impl WagerEngine {
    pub fn builder(store: Arc<dyn WagerStore>, configs: Arc<dyn ConfigStore>) -> EngineBuilder {
        EngineBuilder {
            store,
            configs,
            notifier: None,
            clock: None,
            metrics: None,
            rng: None,
            settings: EngineSettings::default(),
        }
    }

    pub fn metrics(&self) -> Arc<WagerMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Debit the bet, commit the secret outcome and open an `Active` session
    pub async fn start_round(&self, user_id: UserId, request: StartRound) -> WagerResult<RoundStarted> {
        self.open_round(user_id, request)
            .await
            .inspect_err(|e| self.metrics.record_rejection(e.code()))
    }

    async fn open_round(&self, user_id: UserId, request: StartRound) -> WagerResult<RoundStarted> {
        let (kind, variant) = request.params.variant();
        let bet = request.bet_amount;
        let state = match self.config_for(kind, &variant).await? {
            GameConfiguration::Mines(config) => {
                config.limits.check(bet)?;
                GameState::Mines(self.with_rng(|rng| MinesRound::deal(config, rng))?)
            }
            GameConfiguration::DragonTower(config) => {
                config.limits.check(bet)?;
                GameState::DragonTower(self.with_rng(|rng| TowerRound::deal(config, rng))?)
            }
            GameConfiguration::Shuffle(config) => {
                config.limits.check(bet)?;
                GameState::Shuffle(self.with_rng(|rng| ShuffleRound::deal(config, rng))?)
            }
            other => {
                return Err(WagerError::InvalidConfiguration(format!(
                    "{} is not a multi-step game",
                    other.kind()
                )))
            }
        };

        let now = self.clock.now();
        let session = WagerSession::open(user_id, bet, state, now);
        let unit = UnitOfWork::new(now)
            .debit(user_id, bet, TransactionKind::BetDebit, kind, Some(session.id))?
            .insert_session(session.clone());
        let receipt = self.store.commit(unit).await?;

        self.metrics.record_round_started(kind, bet);
        info!(session_id = %session.id, user_id, game = %kind, bet, "round started");

        Ok(RoundStarted {
            session: session.view(),
            balance: receipt.balance_of(user_id),
        })
    }

    /// Apply one player input to an active round
    pub async fn step(&self, session_id: SessionId, user_id: UserId, input: StepInput) -> WagerResult<StepOutcome> {
        self.apply_step(session_id, user_id, input)
            .await
            .inspect_err(|e| self.metrics.record_rejection(e.code()))
    }

    async fn apply_step(&self, session_id: SessionId, user_id: UserId, input: StepInput) -> WagerResult<StepOutcome> {
        let mut session = self.load_active(session_id, user_id).await?;
        let expected_version = session.version;
        let result = session.state.step(input)?;

        let now = self.clock.now();
        session.updated_at = now;
        let mut unit = UnitOfWork::new(now);
        let payout = match result {
            StepResult::Continue { multiplier } => {
                session.multiplier = multiplier;
                None
            }
            StepResult::Won { multiplier } => {
                let payout = odds::payout(session.bet_amount, multiplier);
                session.status = SessionStatus::Won;
                session.multiplier = multiplier;
                session.payout = payout;
                unit = unit.credit(user_id, payout, TransactionKind::WinCredit, session.game, Some(session.id))?;
                Some(payout)
            }
            StepResult::Lost => {
                session.status = SessionStatus::Lost;
                session.multiplier = 0.0;
                session.payout = 0;
                Some(0)
            }
        };

        let receipt = self
            .store
            .commit(unit.update_session(session.clone(), expected_version))
            .await?;
        session.version = expected_version + 1;

        self.metrics.record_step();
        debug!(session_id = %session.id, ?input, status = ?session.status, multiplier = session.multiplier, "step applied");
        if let Some(payout) = payout {
            self.settled(&session, payout).await;
        }

        Ok(StepOutcome {
            session: session.view(),
            payout,
            balance: receipt.balance_of(user_id),
        })
    }

    /// Settle an active round at its current multiplier
    pub async fn cashout(&self, session_id: SessionId, user_id: UserId) -> WagerResult<CashoutOutcome> {
        self.apply_cashout(session_id, user_id, None)
            .await
            .inspect_err(|e| self.metrics.record_rejection(e.code()))
    }

    /// Cash out only if the session belongs to `game`
    pub async fn cashout_game(&self, game: GameKind, session_id: SessionId, user_id: UserId) -> WagerResult<CashoutOutcome> {
        self.apply_cashout(session_id, user_id, Some(game))
            .await
            .inspect_err(|e| self.metrics.record_rejection(e.code()))
    }

    async fn apply_cashout(
        &self,
        session_id: SessionId,
        user_id: UserId,
        game: Option<GameKind>,
    ) -> WagerResult<CashoutOutcome> {
        let mut session = self.load_active(session_id, user_id).await?;
        if let Some(game) = game.filter(|game| *game != session.game) {
            return Err(WagerError::InvalidSessionState(format!(
                "session {} is not a {} round",
                session_id, game
            )));
        }
        let expected_version = session.version;
        let multiplier = session.state.cashout_multiplier()?;
        let payout = odds::payout(session.bet_amount, multiplier);

        let now = self.clock.now();
        session.status = SessionStatus::CashedOut;
        session.multiplier = multiplier;
        session.payout = payout;
        session.updated_at = now;

        let unit = UnitOfWork::new(now)
            .credit(user_id, payout, TransactionKind::WinCredit, session.game, Some(session.id))?
            .update_session(session.clone(), expected_version);
        let receipt = self.store.commit(unit).await?;
        session.version = expected_version + 1;

        self.metrics.record_cashout();
        self.settled(&session, payout).await;

        Ok(CashoutOutcome {
            session: session.view(),
            payout,
            balance: receipt.balance_of(user_id),
        })
    }

    /// Debit, draw and settle a single-shot game in one unit of work
    pub async fn play(&self, user_id: UserId, bet: SingleShotBet) -> WagerResult<PlayOutcome> {
        self.play_single_shot(user_id, bet)
            .await
            .inspect_err(|e| self.metrics.record_rejection(e.code()))
    }

    async fn play_single_shot(&self, user_id: UserId, bet: SingleShotBet) -> WagerResult<PlayOutcome> {
        let kind = bet.kind();
        let mut daily_limit = None;

        let (stake, payout, multiplier, state) = match bet {
            SingleShotBet::Plinko { bet_amount, rows, risk } => {
                let config = expect_config!(
                    self.config_for(kind, &Variant::Plinko { rows, risk }).await?,
                    GameConfiguration::Plinko
                );
                config.limits.check(bet_amount)?;
                let outcome = self.with_rng(|rng| plinko::drop_ball(&config, rng))?;
                let multiplier = outcome.multiplier;
                (bet_amount, odds::payout(bet_amount, multiplier), multiplier, GameState::Plinko(outcome))
            }
            SingleShotBet::Roulette { bets } => {
                let config = expect_config!(
                    self.config_for(kind, &Variant::Standard).await?,
                    GameConfiguration::Roulette
                );
                let wagers = roulette::parse_bets(&bets)?;
                let stake = roulette::total_stake(&wagers)?;
                config.limits.check(stake)?;
                let pocket = self.with_rng(|rng| rng.spin_roulette())?;
                let outcome = roulette::settle(&config, &wagers, pocket)?;
                let payout = outcome.total_payout;
                let multiplier = odds::round2(payout as f64 / stake as f64);
                (stake, payout, multiplier, GameState::Roulette(outcome))
            }
            SingleShotBet::Spin { bet_amount } => {
                let config = expect_config!(self.config_for(kind, &Variant::Standard).await?, GameConfiguration::Spin);
                config.limits.check(bet_amount)?;
                daily_limit = Some(config.max_spins_per_day);
                let outcome = self.with_rng(|rng| spin::spin_wheel(&config, rng))?;
                let multiplier = outcome.multiplier;
                (bet_amount, odds::payout(bet_amount, multiplier), multiplier, GameState::Spin(outcome))
            }
            SingleShotBet::Slots { bet_amount } => {
                let config = expect_config!(self.config_for(kind, &Variant::Standard).await?, GameConfiguration::Slots);
                config.limits.check(bet_amount)?;
                let reels = self.with_rng(|rng| slots::spin_reels(&config, rng))?;
                let outcome = slots::evaluate(&config, reels);
                let multiplier = outcome.multiplier;
                (bet_amount, odds::payout(bet_amount, multiplier), multiplier, GameState::Slots(outcome))
            }
        };

        let now = self.clock.now();
        let mut session = WagerSession::open(user_id, stake, state, now);
        if payout > 0 {
            session.status = SessionStatus::Won;
            session.multiplier = multiplier;
        } else {
            session.status = SessionStatus::Lost;
            session.multiplier = 0.0;
        }
        session.payout = payout;

        let mut unit = UnitOfWork::new(now)
            .debit(user_id, stake, TransactionKind::BetDebit, kind, Some(session.id))?
            .credit(user_id, payout, TransactionKind::WinCredit, kind, Some(session.id))?
            .insert_session(session.clone());
        if let Some(max_per_day) = daily_limit {
            unit = unit.consume_spin(user_id, max_per_day);
        }
        let receipt = self.store.commit(unit).await?;

        self.metrics.record_round_started(kind, stake);
        self.settled(&session, payout).await;

        let spins_remaining = daily_limit
            .zip(receipt.spins_used)
            .map(|(max, used)| max.saturating_sub(used));

        Ok(PlayOutcome {
            session: session.view(),
            payout,
            net: payout as i64 - stake as i64,
            balance: receipt.balance_of(user_id),
            spins_remaining,
        })
    }

    /// Daily spin allowance of a user
    pub async fn spin_status(&self, user_id: UserId) -> WagerResult<SpinStatus> {
        let config = expect_config!(
            self.config_for(GameKind::Spin, &Variant::Standard).await?,
            GameConfiguration::Spin
        );
        let account = self.store.account(user_id).await?;
        Ok(SpinStatus::at(
            account.daily_spin_count,
            account.last_spin_at,
            config.max_spins_per_day,
            self.clock.now(),
        ))
    }

    /// Buy a lucky draw ticket in the pool of `price`
    pub async fn purchase_ticket(&self, user_id: UserId, price: u64) -> WagerResult<TicketReceipt> {
        self.issue_ticket(user_id, price)
            .await
            .inspect_err(|e| self.metrics.record_rejection(e.code()))
    }

    async fn issue_ticket(&self, user_id: UserId, price: u64) -> WagerResult<TicketReceipt> {
        let config = self.lucky_draw_config().await?;
        config.ensure_price(price)?;

        let mut last_conflict = String::new();
        for attempt in 1..=self.settings.ticket_token_attempts {
            let now = self.clock.now();
            let ticket = self.with_rng(|rng| Ticket::issue(user_id, price, rng, now))?;
            let unit = UnitOfWork::new(now)
                .debit(user_id, price, TransactionKind::TicketPurchase, GameKind::LuckyDraw, None)?
                .insert_ticket(ticket.clone());

            match self.store.commit(unit).await {
                Ok(receipt) => {
                    self.metrics.record_ticket(price);
                    info!(user_id, token = %ticket.token, price, "lucky draw ticket issued");
                    self.announce(Notification::new(
                        user_id,
                        NotificationKind::Info,
                        "Ticket purchased",
                        format!("Ticket {} entered in the {} pool", ticket.token, format_amount(price)),
                    ))
                    .await;
                    return Ok(TicketReceipt {
                        ticket,
                        balance: receipt.balance_of(user_id),
                    });
                }
                Err(WagerError::Conflict(reason)) => {
                    debug!(attempt, %reason, "ticket token collision, retrying");
                    last_conflict = reason;
                }
                Err(e) => return Err(e),
            }
        }
        Err(WagerError::Conflict(last_conflict))
    }

    /// Pick one winner among the active tickets of a pool and settle the pool
    pub async fn draw_lucky_pool(&self, price: u64) -> WagerResult<DrawResult> {
        let config = self.lucky_draw_config().await?;
        config.ensure_price(price)?;

        let tickets = self.store.active_tickets(price).await?;
        if tickets.is_empty() {
            return Err(WagerError::InvalidSessionState(format!(
                "no active tickets in the {} pool",
                format_amount(price)
            )));
        }
        let bound = u32::try_from(tickets.len()).unwrap_or(u32::MAX);
        let index = self.with_rng(|rng| rng.next_below(bound) as usize)?;
        let mut winner = tickets[index].clone();
        let prize = config.prize_for(price);

        let now = self.clock.now();
        let mut unit = UnitOfWork::new(now).credit(
            winner.user_id,
            prize,
            TransactionKind::WinCredit,
            GameKind::LuckyDraw,
            None,
        )?;
        for ticket in &tickets {
            let status = if ticket.id == winner.id {
                TicketStatus::Won
            } else {
                TicketStatus::Lost
            };
            unit = unit.settle_ticket(ticket.id, status);
        }
        self.store.commit(unit).await?;
        winner.status = TicketStatus::Won;
        winner.settled_at = Some(now);

        self.metrics.record_draw(prize);
        info!(price, winner = %winner.token, prize, participants = tickets.len(), "lucky draw settled");

        for ticket in &tickets {
            let notification = if ticket.id == winner.id {
                Notification::new(
                    ticket.user_id,
                    NotificationKind::Success,
                    "Lucky draw win",
                    format!("Ticket {} won {}", ticket.token, format_amount(prize)),
                )
            } else {
                Notification::new(
                    ticket.user_id,
                    NotificationKind::Info,
                    "Lucky draw result",
                    format!("Ticket {} did not win this draw", ticket.token),
                )
            };
            self.announce(notification).await;
        }

        Ok(DrawResult {
            price,
            winner,
            prize,
            participants: tickets.len(),
        })
    }

    /// Active tickets per configured pool and the latest winners
    pub async fn lucky_draw_stats(&self) -> WagerResult<LuckyDrawStats> {
        let config = self.lucky_draw_config().await?;
        let mut pools = Vec::with_capacity(config.ticket_prices.len());
        for &price in &config.ticket_prices {
            pools.push(PoolStats {
                price,
                prize: config.prize_for(price),
                tickets: self.store.active_tickets(price).await?,
            });
        }
        Ok(LuckyDrawStats {
            pools,
            recent_winners: self.store.recent_winners(RECENT_WINNERS).await?,
        })
    }

    pub async fn tickets(&self, user_id: UserId) -> WagerResult<Vec<Ticket>> {
        self.store.tickets_for_user(user_id).await
    }

    pub async fn transactions(&self, user_id: UserId) -> WagerResult<Vec<LedgerTransaction>> {
        self.store.transactions(user_id).await
    }

    pub async fn balance(&self, user_id: UserId) -> WagerResult<u64> {
        self.store.balance(user_id).await
    }

    /// A user's own session, secrets withheld while it is active
    pub async fn session(&self, session_id: SessionId, user_id: UserId) -> WagerResult<SessionView> {
        match self.store.load(session_id).await? {
            Some(session) if session.user_id == user_id => Ok(session.view()),
            _ => Err(WagerError::InvalidSessionState(format!("session {} not found", session_id))),
        }
    }

    /// Ladders and stake limits of every offered tower difficulty
    pub async fn tower_config(&self) -> WagerResult<Vec<TowerLevel>> {
        let settings = self.settings().await?;
        let tower = settings.dragon_tower;
        Ok(tower
            .difficulties
            .into_iter()
            .map(|(difficulty, level)| TowerLevel {
                difficulty,
                rows: tower.rows,
                columns: level.columns,
                hazards: level.hazards,
                min_bet: level.limits.min_bet,
                multipliers: level.multipliers,
            })
            .collect())
    }

    pub async fn settings(&self) -> WagerResult<CasinoSettings> {
        self.configs.settings().await.inspect_err(|e| self.log_config_failure(e))
    }

    /// Replace the game settings. Sessions already started keep their snapshot.
    pub async fn update_settings(&self, settings: CasinoSettings) -> WagerResult<()> {
        self.configs
            .update_settings(settings)
            .await
            .inspect_err(|e| self.log_config_failure(e))
    }

    async fn config_for(&self, kind: GameKind, variant: &Variant) -> WagerResult<GameConfiguration> {
        self.configs
            .get_config(kind, variant)
            .await
            .inspect_err(|e| self.log_config_failure(e))
    }

    async fn lucky_draw_config(&self) -> WagerResult<LuckyDrawConfig> {
        Ok(expect_config!(
            self.config_for(GameKind::LuckyDraw, &Variant::Standard).await?,
            GameConfiguration::LuckyDraw
        ))
    }

    fn log_config_failure(&self, e: &WagerError) {
        if let WagerError::ConfigurationUnavailable(reason) = e {
            error!(%reason, "configuration store unavailable");
        }
    }

    async fn load_active(&self, session_id: SessionId, user_id: UserId) -> WagerResult<WagerSession> {
        let session = self
            .store
            .load(session_id)
            .await?
            .ok_or_else(|| WagerError::InvalidSessionState(format!("session {} not found", session_id)))?;
        session.ensure_active_for(user_id)?;
        Ok(session)
    }

    fn with_rng<T>(&self, draw: impl FnOnce(&mut GameRng) -> T) -> WagerResult<T> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| WagerError::Unavailable("random source lock poisoned".into()))?;
        Ok(draw(&mut rng))
    }

    /// Book-keeping shared by every path that ends a round
    async fn settled(&self, session: &WagerSession, payout: u64) {
        self.metrics.record_settled(payout);
        info!(
            session_id = %session.id,
            user_id = session.user_id,
            game = %session.game,
            bet = session.bet_amount,
            status = ?session.status,
            multiplier = session.multiplier,
            payout,
            "round settled"
        );

        if payout > 0 && session.multiplier >= self.settings.big_win_multiplier {
            self.announce(Notification::new(
                session.user_id,
                NotificationKind::Success,
                "Big win",
                format!(
                    "{} paid {:.2}x: {}",
                    session.game,
                    session.multiplier,
                    format_amount(payout)
                ),
            ))
            .await;
        } else if payout == 0 && session.bet_amount >= self.settings.notable_loss_amount {
            self.announce(Notification::new(
                session.user_id,
                NotificationKind::Warning,
                "Round lost",
                format!("{} round lost {}", session.game, format_amount(session.bet_amount)),
            ))
            .await;
        }
    }

    async fn announce(&self, notification: Notification) {
        let user_id = notification.user_id;
        if let Err(e) = self.notifier.notify(notification).await {
            warn!(user_id, error = %e, "notification not delivered");
        }
    }
}

/// Minor units as a two-decimal amount
fn format_amount(minor: u64) -> String {
    format!("{}.{:02}", minor / 100, minor % 100)
}
