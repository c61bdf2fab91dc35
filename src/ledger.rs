//! Ledger Gateway and Session Store
//!
//! The wager engine never touches balances directly. Every money movement,
//! session write, spin-allowance update and ticket write of one operation is
//! bundled into a [`UnitOfWork`] and committed atomically: either everything
//! applies or nothing does.

use crate::errors::{WagerError, WagerResult};
use crate::games::lucky_draw::{Ticket, TicketStatus};
use crate::games::spin::spins_used_today;
use crate::games::types::{GameKind, SessionId, UserId, WagerSession};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    BetDebit,
    WinCredit,
    TicketPurchase,
    Bonus,
    Deposit,
    Withdrawal,
}

/// Immutable, append-only ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTransaction {
    pub id: u64,
    pub user_id: UserId,
    pub amount: i64,
    pub kind: TransactionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<GameKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub user_id: UserId,
    pub balance: u64,
    pub initial_balance: u64,
    pub daily_spin_count: u32,
    pub last_spin_at: Option<DateTime<Utc>>,
}

/// One signed balance change and the transaction recording it
#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    pub user_id: UserId,
    pub amount: i64,
    pub kind: TransactionKind,
    pub game: Option<GameKind>,
    pub session_id: Option<SessionId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionWrite {
    Insert(WagerSession),
    /// Applied only if the stored session is still at `expected_version`
    Update { session: WagerSession, expected_version: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TicketWrite {
    Insert(Ticket),
    Settle { ticket_id: Uuid, status: TicketStatus },
}

/// Consume one spin of the user's daily allowance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinQuota {
    pub user_id: UserId,
    pub max_per_day: u32,
}

/// Everything one wager operation writes, committed all-or-nothing
#[derive(Debug, Clone)]
pub struct UnitOfWork {
    pub at: DateTime<Utc>,
    pub postings: Vec<Posting>,
    pub session: Option<SessionWrite>,
    pub spin_quota: Option<SpinQuota>,
    pub tickets: Vec<TicketWrite>,
}

fn signed_amount(amount: u64) -> WagerResult<i64> {
    i64::try_from(amount)
        .map_err(|_| WagerError::InvalidBet(format!("amount {} exceeds the ledger range", amount)))
}

impl UnitOfWork {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            at,
            postings: Vec::new(),
            session: None,
            spin_quota: None,
            tickets: Vec::new(),
        }
    }

    /// Fails with `InvalidBet` when `amount` does not fit a signed posting
    pub fn debit(self, user_id: UserId, amount: u64, kind: TransactionKind, game: GameKind, session_id: Option<SessionId>) -> WagerResult<Self> {
        let amount = signed_amount(amount)?;
        Ok(self.post(user_id, -amount, kind, game, session_id))
    }

    pub fn credit(self, user_id: UserId, amount: u64, kind: TransactionKind, game: GameKind, session_id: Option<SessionId>) -> WagerResult<Self> {
        let amount = signed_amount(amount)?;
        Ok(self.post(user_id, amount, kind, game, session_id))
    }

    fn post(mut self, user_id: UserId, amount: i64, kind: TransactionKind, game: GameKind, session_id: Option<SessionId>) -> Self {
        if amount != 0 {
            self.postings.push(Posting {
                user_id,
                amount,
                kind,
                game: Some(game),
                session_id,
            });
        }
        self
    }

    pub fn insert_session(mut self, session: WagerSession) -> Self {
        self.session = Some(SessionWrite::Insert(session));
        self
    }

    pub fn update_session(mut self, session: WagerSession, expected_version: u64) -> Self {
        self.session = Some(SessionWrite::Update { session, expected_version });
        self
    }

    pub fn consume_spin(mut self, user_id: UserId, max_per_day: u32) -> Self {
        self.spin_quota = Some(SpinQuota { user_id, max_per_day });
        self
    }

    pub fn insert_ticket(mut self, ticket: Ticket) -> Self {
        self.tickets.push(TicketWrite::Insert(ticket));
        self
    }

    pub fn settle_ticket(mut self, ticket_id: Uuid, status: TicketStatus) -> Self {
        self.tickets.push(TicketWrite::Settle { ticket_id, status });
        self
    }

    /// Users whose balance this unit reports back
    fn touched_users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.postings.iter().map(|p| p.user_id).collect();
        if let Some(SessionWrite::Insert(session) | SessionWrite::Update { session, .. }) = &self.session {
            users.push(session.user_id);
        }
        if let Some(quota) = &self.spin_quota {
            users.push(quota.user_id);
        }
        users.sort_unstable();
        users.dedup();
        users
    }
}

/// What a successful commit produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitReceipt {
    pub balances: HashMap<UserId, u64>,
    pub transaction_ids: Vec<u64>,
    /// Spins used today after this commit, when the unit consumed one
    pub spins_used: Option<u32>,
}

impl CommitReceipt {
    pub fn balance_of(&self, user_id: UserId) -> u64 {
        self.balances.get(&user_id).copied().unwrap_or_default()
    }
}

/// Balance ledger collaborator
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    async fn account(&self, user_id: UserId) -> WagerResult<UserAccount>;

    async fn balance(&self, user_id: UserId) -> WagerResult<u64> {
        Ok(self.account(user_id).await?.balance)
    }

    async fn transactions(&self, user_id: UserId) -> WagerResult<Vec<LedgerTransaction>>;

    /// Validate and apply a unit of work atomically
    async fn commit(&self, unit: UnitOfWork) -> WagerResult<CommitReceipt>;

    async fn tickets_for_user(&self, user_id: UserId) -> WagerResult<Vec<Ticket>>;

    async fn active_tickets(&self, price: u64) -> WagerResult<Vec<Ticket>>;

    /// Winning tickets, most recently drawn first
    async fn recent_winners(&self, limit: usize) -> WagerResult<Vec<Ticket>>;
}

/// Durable keyed storage for sessions. Writes go through [`LedgerGateway::commit`].
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: SessionId) -> WagerResult<Option<WagerSession>>;

    async fn sessions_for_user(&self, user_id: UserId) -> WagerResult<Vec<WagerSession>>;
}

/// Backend that owns balances and sessions together
pub trait WagerStore: LedgerGateway + SessionStore {}

impl<T: LedgerGateway + SessionStore> WagerStore for T {}

#[derive(Debug, Default)]
struct LedgerState {
    accounts: HashMap<UserId, UserAccount>,
    transactions: Vec<LedgerTransaction>,
    sessions: HashMap<SessionId, WagerSession>,
    tickets: HashMap<Uuid, Ticket>,
    next_transaction_id: u64,
}

/// In-memory ledger and session store behind a single lock
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
    unavailable: AtomicBool,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user with an opening balance. No transaction is recorded.
    pub fn open_account(&self, user_id: UserId, initial_balance: u64) -> WagerResult<()> {
        let mut state = self.write()?;
        if state.accounts.contains_key(&user_id) {
            return Err(WagerError::Conflict(format!("account {} already exists", user_id)));
        }
        state.accounts.insert(
            user_id,
            UserAccount {
                user_id,
                balance: initial_balance,
                initial_balance,
                daily_spin_count: 0,
                last_spin_at: None,
            },
        );
        Ok(())
    }

    /// Simulate a backend outage; every call fails with a retryable error
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> WagerResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(WagerError::Unavailable("ledger is unavailable".into()));
        }
        Ok(())
    }

    fn read(&self) -> WagerResult<std::sync::RwLockReadGuard<'_, LedgerState>> {
        self.check_available()?;
        self.state
            .read()
            .map_err(|_| WagerError::Unavailable("ledger lock poisoned".into()))
    }

    fn write(&self) -> WagerResult<std::sync::RwLockWriteGuard<'_, LedgerState>> {
        self.check_available()?;
        self.state
            .write()
            .map_err(|_| WagerError::Unavailable("ledger lock poisoned".into()))
    }
}

impl LedgerState {
    /// Check every part of the unit against current state without mutating
    fn validate(&self, unit: &UnitOfWork) -> WagerResult<HashMap<UserId, u64>> {
        let mut balances: HashMap<UserId, u64> = HashMap::new();
        for posting in &unit.postings {
            let current = match balances.get(&posting.user_id) {
                Some(balance) => *balance,
                None => {
                    self.accounts
                        .get(&posting.user_id)
                        .ok_or(WagerError::UnknownUser(posting.user_id))?
                        .balance
                }
            };
            let next = current as i128 + i128::from(posting.amount);
            if next < 0 {
                return Err(WagerError::InsufficientFunds {
                    balance: current,
                    required: posting.amount.unsigned_abs(),
                });
            }
            let next = u64::try_from(next).map_err(|_| {
                WagerError::InvalidBet(format!("balance of user {} would overflow", posting.user_id))
            })?;
            balances.insert(posting.user_id, next);
        }

        if let Some(quota) = &unit.spin_quota {
            let account = self
                .accounts
                .get(&quota.user_id)
                .ok_or(WagerError::UnknownUser(quota.user_id))?;
            let used = spins_used_today(account.daily_spin_count, account.last_spin_at, unit.at);
            if used >= quota.max_per_day {
                return Err(WagerError::DailyLimitReached { limit: quota.max_per_day });
            }
        }

        match &unit.session {
            Some(SessionWrite::Insert(session)) => {
                if !self.accounts.contains_key(&session.user_id) {
                    return Err(WagerError::UnknownUser(session.user_id));
                }
                if self.sessions.contains_key(&session.id) {
                    return Err(WagerError::Conflict(format!("session {} already exists", session.id)));
                }
            }
            Some(SessionWrite::Update { session, expected_version }) => {
                let stored = self.sessions.get(&session.id).ok_or_else(|| {
                    WagerError::InvalidSessionState(format!("session {} not found", session.id))
                })?;
                if stored.version != *expected_version {
                    return Err(WagerError::InvalidSessionState(format!(
                        "session {} was modified concurrently",
                        session.id
                    )));
                }
                if stored.status.is_terminal() {
                    return Err(WagerError::InvalidSessionState(format!(
                        "session {} is already {:?}",
                        session.id, stored.status
                    )));
                }
            }
            None => {}
        }

        for write in &unit.tickets {
            match write {
                TicketWrite::Insert(ticket) => {
                    if self.tickets.values().any(|t| t.token == ticket.token) {
                        return Err(WagerError::Conflict(format!("ticket token {} already issued", ticket.token)));
                    }
                }
                TicketWrite::Settle { ticket_id, .. } => {
                    let ticket = self.tickets.get(ticket_id).ok_or_else(|| {
                        WagerError::InvalidSessionState(format!("ticket {} not found", ticket_id))
                    })?;
                    if ticket.status != TicketStatus::Active {
                        return Err(WagerError::InvalidSessionState(format!(
                            "ticket {} was already drawn",
                            ticket.token
                        )));
                    }
                }
            }
        }

        Ok(balances)
    }

    fn apply(&mut self, unit: UnitOfWork, balances: HashMap<UserId, u64>) -> CommitReceipt {
        let mut receipt = CommitReceipt::default();
        let touched = unit.touched_users();

        for (user_id, balance) in balances {
            if let Some(account) = self.accounts.get_mut(&user_id) {
                account.balance = balance;
            }
        }
        for posting in unit.postings {
            self.next_transaction_id += 1;
            receipt.transaction_ids.push(self.next_transaction_id);
            self.transactions.push(LedgerTransaction {
                id: self.next_transaction_id,
                user_id: posting.user_id,
                amount: posting.amount,
                kind: posting.kind,
                game: posting.game,
                session_id: posting.session_id,
                created_at: unit.at,
            });
        }

        if let Some(quota) = unit.spin_quota {
            if let Some(account) = self.accounts.get_mut(&quota.user_id) {
                let used = spins_used_today(account.daily_spin_count, account.last_spin_at, unit.at) + 1;
                account.daily_spin_count = used;
                account.last_spin_at = Some(unit.at);
                receipt.spins_used = Some(used);
            }
        }

        match unit.session {
            Some(SessionWrite::Insert(session)) => {
                self.sessions.insert(session.id, session);
            }
            Some(SessionWrite::Update { mut session, expected_version }) => {
                session.version = expected_version + 1;
                self.sessions.insert(session.id, session);
            }
            None => {}
        }

        for write in unit.tickets {
            match write {
                TicketWrite::Insert(ticket) => {
                    self.tickets.insert(ticket.id, ticket);
                }
                TicketWrite::Settle { ticket_id, status } => {
                    if let Some(ticket) = self.tickets.get_mut(&ticket_id) {
                        ticket.status = status;
                        ticket.settled_at = Some(unit.at);
                    }
                }
            }
        }

        for user_id in touched {
            if let Some(account) = self.accounts.get(&user_id) {
                receipt.balances.insert(user_id, account.balance);
            }
        }
        receipt
    }
}

#[async_trait]
impl LedgerGateway for MemoryLedger {
    async fn account(&self, user_id: UserId) -> WagerResult<UserAccount> {
        self.read()?
            .accounts
            .get(&user_id)
            .cloned()
            .ok_or(WagerError::UnknownUser(user_id))
    }

    async fn transactions(&self, user_id: UserId) -> WagerResult<Vec<LedgerTransaction>> {
        let state = self.read()?;
        if !state.accounts.contains_key(&user_id) {
            return Err(WagerError::UnknownUser(user_id));
        }
        Ok(state
            .transactions
            .iter()
            .filter(|tx| tx.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn commit(&self, unit: UnitOfWork) -> WagerResult<CommitReceipt> {
        let mut state = self.write()?;
        let balances = state.validate(&unit)?;
        let postings = unit.postings.len();
        let receipt = state.apply(unit, balances);
        debug!(postings, transactions = ?receipt.transaction_ids, "ledger unit committed");
        Ok(receipt)
    }

    async fn tickets_for_user(&self, user_id: UserId) -> WagerResult<Vec<Ticket>> {
        let mut tickets: Vec<Ticket> = self
            .read()?
            .tickets
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tickets)
    }

    async fn active_tickets(&self, price: u64) -> WagerResult<Vec<Ticket>> {
        let mut tickets: Vec<Ticket> = self
            .read()?
            .tickets
            .values()
            .filter(|t| t.price == price && t.status == TicketStatus::Active)
            .cloned()
            .collect();
        tickets.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.token.cmp(&b.token)));
        Ok(tickets)
    }

    async fn recent_winners(&self, limit: usize) -> WagerResult<Vec<Ticket>> {
        let mut winners: Vec<Ticket> = self
            .read()?
            .tickets
            .values()
            .filter(|t| t.status == TicketStatus::Won)
            .cloned()
            .collect();
        winners.sort_by(|a, b| b.settled_at.cmp(&a.settled_at).then(a.token.cmp(&b.token)));
        winners.truncate(limit);
        Ok(winners)
    }
}

#[async_trait]
impl SessionStore for MemoryLedger {
    async fn load(&self, session_id: SessionId) -> WagerResult<Option<WagerSession>> {
        Ok(self.read()?.sessions.get(&session_id).cloned())
    }

    async fn sessions_for_user(&self, user_id: UserId) -> WagerResult<Vec<WagerSession>> {
        let mut sessions: Vec<WagerSession> = self
            .read()?
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }
}
