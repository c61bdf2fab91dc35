//! End-to-end wager flows against the in-memory ledger

use chrono::{Duration, TimeZone, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use wager_engine::clock::ManualClock;
use wager_engine::engine::{RoundParams, SingleShotBet, StartRound};
use wager_engine::games::dragon_tower::TowerDifficulty;
use wager_engine::games::lucky_draw::TicketStatus;
use wager_engine::games::plinko::PlinkoRisk;
use wager_engine::games::roulette::{self, RouletteConfig};
use wager_engine::games::{
    BetLimits, CasinoSettings, GameState, GameView, GameRng, SessionId, SessionStatus, StepInput, UserId,
};
use wager_engine::ledger::TransactionKind;
use wager_engine::{LedgerGateway, MemoryConfigStore, MemoryLedger, SessionStore, WagerEngine, WagerError};

const ALICE: UserId = 1;
const BOB: UserId = 2;

struct Harness {
    engine: Arc<WagerEngine>,
    ledger: Arc<MemoryLedger>,
}

fn harness(settings: CasinoSettings, seed: u64, accounts: &[(UserId, u64)]) -> Harness {
    let ledger = Arc::new(MemoryLedger::new());
    for (user, balance) in accounts {
        ledger.open_account(*user, *balance).unwrap();
    }
    let engine = WagerEngine::builder(ledger.clone(), Arc::new(MemoryConfigStore::new(settings).unwrap()))
        .rng(GameRng::from_seed(seed))
        .build();
    Harness {
        engine: Arc::new(engine),
        ledger,
    }
}

async fn stored_state(ledger: &MemoryLedger, id: SessionId) -> GameState {
    ledger.load(id).await.unwrap().unwrap().state
}

async fn safe_tiles(ledger: &MemoryLedger, id: SessionId) -> Vec<u32> {
    match stored_state(ledger, id).await {
        GameState::Mines(round) => (0..25u8)
            .filter(|t| !round.mine_positions.contains(t))
            .map(u32::from)
            .collect(),
        other => panic!("not a mines round: {:?}", other),
    }
}

async fn assert_reconciles(h: &Harness, user: UserId, initial: u64) {
    let net: i64 = h
        .ledger
        .transactions(user)
        .await
        .unwrap()
        .iter()
        .map(|tx| tx.amount)
        .sum();
    assert_eq!(h.ledger.balance(user).await.unwrap() as i64, initial as i64 + net);
}

#[tokio::test]
async fn mines_cashout_after_two_reveals_pays_second_rung() {
    let mut settings = CasinoSettings::default();
    settings
        .mines
        .ladders
        .insert(3, vec![1.08, 1.17, 1.29, 1.41, 1.56, 1.74]);
    let h = harness(settings, 11, &[(ALICE, 100_000)]);

    let started = h
        .engine
        .start_round(ALICE, StartRound { bet_amount: 1_000, params: RoundParams::Mines { mines: 3 } })
        .await
        .unwrap();
    assert_eq!(started.balance, 99_000);

    let id = started.session.id;
    let safe = safe_tiles(&h.ledger, id).await;
    let first = h.engine.step(id, ALICE, StepInput::Reveal { tile: safe[0] }).await.unwrap();
    assert_eq!(first.session.multiplier, 1.08);
    assert_eq!(first.payout, None);
    let second = h.engine.step(id, ALICE, StepInput::Reveal { tile: safe[1] }).await.unwrap();
    assert_eq!(second.session.multiplier, 1.17);

    let cashed = h.engine.cashout(id, ALICE).await.unwrap();
    assert_eq!(cashed.payout, 1_170);
    assert_eq!(cashed.balance, 100_000 - 1_000 + 1_170);
    assert_eq!(cashed.session.status, SessionStatus::CashedOut);
    match cashed.session.state {
        GameView::Mines(view) => assert_eq!(view.mines.map(|m| m.len()), Some(3)),
        other => panic!("unexpected view {:?}", other),
    }
    assert_reconciles(&h, ALICE, 100_000).await;
}

#[tokio::test]
async fn plinko_lands_on_configured_slot() {
    let mut settings = CasinoSettings::default();
    let table = settings
        .plinko
        .tables
        .iter_mut()
        .find(|t| t.rows == 16 && t.risk == PlinkoRisk::Medium)
        .unwrap();
    for slot in table.slots.iter_mut() {
        slot.weight = if slot.index == 8 { 1000.0 } else { 0.0 };
    }
    let expected = table.slots[8].multiplier;
    let h = harness(settings, 21, &[(ALICE, 10_000)]);

    let outcome = h
        .engine
        .play(ALICE, SingleShotBet::Plinko { bet_amount: 1_000, rows: 16, risk: PlinkoRisk::Medium })
        .await
        .unwrap();
    match outcome.session.state {
        GameView::Plinko(result) => {
            assert_eq!(result.slot_index, 8);
            assert_eq!(result.multiplier, expected);
            assert_eq!(result.path.len(), 16);
            assert_eq!(result.path.iter().filter(|&&step| step == 1).count(), 8);
        }
        other => panic!("unexpected view {:?}", other),
    }
    assert_eq!(outcome.payout, 300);
    assert_eq!(outcome.balance, 10_000 - 1_000 + 300);
}

#[tokio::test]
async fn roulette_pays_every_winning_position() {
    let mut red: Vec<u8> = roulette::STANDARD_RED.to_vec();
    red.push(17);
    let mut settings = CasinoSettings::default();
    settings.roulette.red_numbers = red.clone();
    let h = harness(settings, 31, &[(ALICE, 10_000_000)]);
    let bets = BTreeMap::from([("red".to_string(), 10), ("17".to_string(), 5)]);

    // keep spinning until the ball lands on 17
    for _ in 0..5_000 {
        let outcome = h
            .engine
            .play(ALICE, SingleShotBet::Roulette { bets: bets.clone() })
            .await
            .unwrap();
        let GameView::Roulette(result) = outcome.session.state else {
            panic!("not a roulette outcome");
        };
        let config = RouletteConfig {
            limits: BetLimits::with_min(1),
            red_numbers: red.clone(),
        };
        let wagers = roulette::parse_bets(&bets).unwrap();
        assert_eq!(outcome.payout, roulette::settle(&config, &wagers, result.result).unwrap().total_payout);

        if result.result == 17 {
            assert_eq!(outcome.payout, 200);
            assert_eq!(outcome.net, 185);
            assert_eq!(outcome.session.status, SessionStatus::Won);
            assert_reconciles(&h, ALICE, 10_000_000).await;
            return;
        }
    }
    panic!("ball never landed on 17");
}

#[tokio::test]
async fn dragon_tower_hazard_on_first_row_loses_the_bet() {
    let h = harness(CasinoSettings::default(), 41, &[(ALICE, 50_000)]);
    let started = h
        .engine
        .start_round(
            ALICE,
            StartRound {
                bet_amount: 2_000,
                params: RoundParams::DragonTower { difficulty: TowerDifficulty::Easy },
            },
        )
        .await
        .unwrap();
    let id = started.session.id;
    let hazard = match stored_state(&h.ledger, id).await {
        GameState::DragonTower(round) => round.layout[0][0],
        other => panic!("not a tower round: {:?}", other),
    };
    match &started.session.state {
        GameView::DragonTower(view) => assert!(view.cleared_rows.is_empty()),
        other => panic!("unexpected view {:?}", other),
    }

    let outcome = h
        .engine
        .step(id, ALICE, StepInput::Climb { column: u32::from(hazard) })
        .await
        .unwrap();
    assert_eq!(outcome.session.status, SessionStatus::Lost);
    assert_eq!(outcome.payout, Some(0));
    assert_eq!(outcome.balance, 48_000);
    match outcome.session.state {
        GameView::DragonTower(view) => {
            assert_eq!(view.fallen_at, Some((0, hazard)));
            assert_eq!(view.cleared_rows.len(), 9);
            assert_eq!(view.cleared_rows[0], vec![hazard]);
        }
        other => panic!("unexpected view {:?}", other),
    }

    assert!(matches!(
        h.engine.step(id, ALICE, StepInput::Climb { column: 0 }).await,
        Err(WagerError::InvalidSessionState(_))
    ));
    assert_eq!(h.ledger.balance(ALICE).await.unwrap(), 48_000);
}

#[tokio::test]
async fn shuffle_reveal_settles_once() {
    let h = harness(CasinoSettings::default(), 51, &[(ALICE, 50_000)]);

    for pick_winner in [true, false] {
        let before = h.ledger.balance(ALICE).await.unwrap();
        let started = h
            .engine
            .start_round(ALICE, StartRound { bet_amount: 1_000, params: RoundParams::Shuffle })
            .await
            .unwrap();
        let id = started.session.id;
        let commitment = match &started.session.state {
            GameView::Shuffle(view) => {
                assert!(view.winning_cup.is_none());
                assert!(view.salt.is_none());
                view.commitment.clone()
            }
            other => panic!("unexpected view {:?}", other),
        };
        let winning_cup = match stored_state(&h.ledger, id).await {
            GameState::Shuffle(round) => round.winning_cup,
            other => panic!("not a shuffle round: {:?}", other),
        };
        assert!(winning_cup < 3);
        let cup = if pick_winner { winning_cup } else { (winning_cup + 1) % 3 };

        let outcome = h
            .engine
            .step(id, ALICE, StepInput::PickCup { cup: u32::from(cup) })
            .await
            .unwrap();
        let expected = if pick_winner { 2_900 } else { 0 };
        assert_eq!(outcome.payout, Some(expected));
        assert_eq!(outcome.balance, before - 1_000 + expected);
        match outcome.session.state {
            GameView::Shuffle(view) => {
                assert_eq!(view.winning_cup, Some(winning_cup));
                let salt = view.salt.unwrap();
                assert!(wager_engine::games::shuffle::verify_commitment(&commitment, &salt, winning_cup));
            }
            other => panic!("unexpected view {:?}", other),
        }

        assert!(matches!(
            h.engine.step(id, ALICE, StepInput::PickCup { cup: u32::from(cup) }).await,
            Err(WagerError::InvalidSessionState(_))
        ));
    }
    assert_reconciles(&h, ALICE, 50_000).await;
}

#[tokio::test]
async fn repeated_reveal_changes_nothing() {
    let h = harness(CasinoSettings::default(), 61, &[(ALICE, 20_000)]);
    let started = h
        .engine
        .start_round(ALICE, StartRound { bet_amount: 1_000, params: RoundParams::Mines { mines: 5 } })
        .await
        .unwrap();
    let id = started.session.id;
    let tile = safe_tiles(&h.ledger, id).await[0];
    h.engine.step(id, ALICE, StepInput::Reveal { tile }).await.unwrap();

    let version = h.ledger.load(id).await.unwrap().unwrap().version;
    let balance = h.ledger.balance(ALICE).await.unwrap();
    assert_eq!(
        h.engine.step(id, ALICE, StepInput::Reveal { tile }).await,
        Err(WagerError::AlreadyRevealed(tile))
    );
    assert_eq!(
        h.engine.step(id, ALICE, StepInput::Reveal { tile: 25 }).await,
        Err(WagerError::OutOfRange { position: 25, limit: 25 })
    );
    assert_eq!(h.ledger.load(id).await.unwrap().unwrap().version, version);
    assert_eq!(h.ledger.balance(ALICE).await.unwrap(), balance);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_steps_are_serialized() {
    let h = harness(CasinoSettings::default(), 71, &[(ALICE, 20_000)]);
    let started = h
        .engine
        .start_round(ALICE, StartRound { bet_amount: 1_000, params: RoundParams::Mines { mines: 2 } })
        .await
        .unwrap();
    let id = started.session.id;
    let safe = safe_tiles(&h.ledger, id).await;

    let tasks: Vec<_> = safe
        .iter()
        .take(8)
        .map(|&tile| {
            let engine = Arc::clone(&h.engine);
            tokio::spawn(async move { engine.step(id, ALICE, StepInput::Reveal { tile }).await })
        })
        .collect();

    let mut applied = 0u64;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => applied += 1,
            Err(WagerError::InvalidSessionState(_)) => {}
            Err(other) => panic!("unexpected error {:?}", other),
        }
    }

    let session = h.ledger.load(id).await.unwrap().unwrap();
    assert!(applied >= 1);
    assert_eq!(session.version, applied);
    match session.state {
        GameState::Mines(round) => assert_eq!(round.revealed.len() as u64, applied),
        other => panic!("not a mines round: {:?}", other),
    }
    assert_reconciles(&h, ALICE, 20_000).await;
}

#[tokio::test]
async fn insufficient_funds_leaves_no_trace() {
    let h = harness(CasinoSettings::default(), 81, &[(ALICE, 500)]);
    let result = h
        .engine
        .start_round(ALICE, StartRound { bet_amount: 1_000, params: RoundParams::Mines { mines: 3 } })
        .await;
    assert_eq!(result, Err(WagerError::InsufficientFunds { balance: 500, required: 1_000 }));
    assert!(h.ledger.sessions_for_user(ALICE).await.unwrap().is_empty());
    assert!(h.ledger.transactions(ALICE).await.unwrap().is_empty());
    assert_eq!(h.ledger.balance(ALICE).await.unwrap(), 500);
}

#[tokio::test]
async fn oversized_stakes_never_reach_the_ledger() {
    let h = harness(CasinoSettings::default(), 95, &[(ALICE, 1_000)]);

    for bet_amount in [(1u64 << 63) + 1, 1u64 << 63, u64::MAX] {
        let result = h
            .engine
            .start_round(ALICE, StartRound { bet_amount, params: RoundParams::Mines { mines: 3 } })
            .await;
        assert!(matches!(result, Err(WagerError::InvalidBet(_))), "bet {} accepted", bet_amount);
    }

    let bets = BTreeMap::from([("red".to_string(), u64::MAX), ("black".to_string(), 2)]);
    assert!(matches!(
        h.engine.play(ALICE, SingleShotBet::Roulette { bets }).await,
        Err(WagerError::InvalidBet(_))
    ));

    assert_eq!(h.ledger.balance(ALICE).await.unwrap(), 1_000);
    assert!(h.ledger.transactions(ALICE).await.unwrap().is_empty());
    assert!(h.ledger.sessions_for_user(ALICE).await.unwrap().is_empty());
}

#[tokio::test]
async fn unavailable_ledger_is_retryable() {
    let h = harness(CasinoSettings::default(), 91, &[(ALICE, 5_000)]);
    h.ledger.set_unavailable(true);
    let err = h
        .engine
        .play(ALICE, SingleShotBet::Slots { bet_amount: 100 })
        .await
        .unwrap_err();
    assert!(err.is_retryable());

    h.ledger.set_unavailable(false);
    assert_eq!(h.ledger.balance(ALICE).await.unwrap(), 5_000);
    assert!(h.engine.play(ALICE, SingleShotBet::Slots { bet_amount: 100 }).await.is_ok());
}

#[tokio::test]
async fn spin_allowance_resets_at_utc_midnight() {
    let ledger = Arc::new(MemoryLedger::new());
    ledger.open_account(ALICE, 100_000).unwrap();
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 9, 23, 0, 0).unwrap()));
    let engine = WagerEngine::builder(ledger.clone(), Arc::new(MemoryConfigStore::default()))
        .clock(clock.clone())
        .rng(GameRng::from_seed(101))
        .build();

    for remaining in [2, 1, 0] {
        let outcome = engine.play(ALICE, SingleShotBet::Spin { bet_amount: 1_000 }).await.unwrap();
        assert_eq!(outcome.spins_remaining, Some(remaining));
    }
    let balance = ledger.balance(ALICE).await.unwrap();
    assert_eq!(
        engine.play(ALICE, SingleShotBet::Spin { bet_amount: 1_000 }).await,
        Err(WagerError::DailyLimitReached { limit: 3 })
    );
    assert_eq!(ledger.balance(ALICE).await.unwrap(), balance);

    let status = engine.spin_status(ALICE).await.unwrap();
    assert_eq!(status.remaining_spins, 0);
    assert_eq!(status.time_until_reset_ms, Duration::hours(1).num_milliseconds());

    clock.advance(Duration::hours(1));
    assert_eq!(engine.spin_status(ALICE).await.unwrap().remaining_spins, 3);
    let outcome = engine.play(ALICE, SingleShotBet::Spin { bet_amount: 1_000 }).await.unwrap();
    assert_eq!(outcome.spins_remaining, Some(2));
}

#[tokio::test]
async fn lucky_draw_pays_one_ticket_and_closes_the_pool() {
    let h = harness(CasinoSettings::default(), 111, &[(ALICE, 50_000), (BOB, 50_000)]);
    let a = h.engine.purchase_ticket(ALICE, 10_000).await.unwrap();
    let b = h.engine.purchase_ticket(BOB, 10_000).await.unwrap();
    assert!(a.ticket.token.starts_with("#LD-"));
    assert_ne!(a.ticket.token, b.ticket.token);
    assert_eq!(a.balance, 40_000);

    assert!(matches!(
        h.engine.purchase_ticket(ALICE, 7_500).await,
        Err(WagerError::InvalidBet(_))
    ));

    let draw = h.engine.draw_lucky_pool(10_000).await.unwrap();
    assert_eq!(draw.participants, 2);
    assert_eq!(draw.prize, 20_000);
    assert_eq!(draw.winner.status, TicketStatus::Won);

    let (winner, loser) = if draw.winner.user_id == ALICE { (ALICE, BOB) } else { (BOB, ALICE) };
    assert_eq!(h.ledger.balance(winner).await.unwrap(), 60_000);
    assert_eq!(h.ledger.balance(loser).await.unwrap(), 40_000);
    assert_eq!(h.engine.tickets(loser).await.unwrap()[0].status, TicketStatus::Lost);

    let kinds: Vec<TransactionKind> = h
        .ledger
        .transactions(winner)
        .await
        .unwrap()
        .iter()
        .map(|tx| tx.kind)
        .collect();
    assert_eq!(kinds, vec![TransactionKind::TicketPurchase, TransactionKind::WinCredit]);

    assert!(matches!(
        h.engine.draw_lucky_pool(10_000).await,
        Err(WagerError::InvalidSessionState(_))
    ));
}

#[tokio::test]
async fn settings_change_does_not_touch_running_rounds() {
    let mut settings = CasinoSettings::default();
    settings.mines.ladders.insert(3, vec![1.08, 1.17, 1.29]);
    let h = harness(settings.clone(), 121, &[(ALICE, 50_000)]);

    let started = h
        .engine
        .start_round(ALICE, StartRound { bet_amount: 1_000, params: RoundParams::Mines { mines: 3 } })
        .await
        .unwrap();
    let id = started.session.id;

    settings.mines.ladders.insert(3, vec![5.0, 10.0, 20.0]);
    h.engine.update_settings(settings).await.unwrap();

    let tile = safe_tiles(&h.ledger, id).await[0];
    let step = h.engine.step(id, ALICE, StepInput::Reveal { tile }).await.unwrap();
    assert_eq!(step.session.multiplier, 1.08);

    let fresh = h
        .engine
        .start_round(ALICE, StartRound { bet_amount: 1_000, params: RoundParams::Mines { mines: 3 } })
        .await
        .unwrap();
    let fresh_tile = safe_tiles(&h.ledger, fresh.session.id).await[0];
    let fresh_step = h
        .engine
        .step(fresh.session.id, ALICE, StepInput::Reveal { tile: fresh_tile })
        .await
        .unwrap();
    assert_eq!(fresh_step.session.multiplier, 5.0);
}

#[tokio::test]
async fn mixed_play_reconciles_with_ledger() {
    let h = harness(CasinoSettings::default(), 131, &[(ALICE, 1_000_000)]);
    for _ in 0..20 {
        h.engine.play(ALICE, SingleShotBet::Slots { bet_amount: 500 }).await.unwrap();
        h.engine
            .play(ALICE, SingleShotBet::Plinko { bet_amount: 700, rows: 12, risk: PlinkoRisk::High })
            .await
            .unwrap();
        let started = h
            .engine
            .start_round(ALICE, StartRound { bet_amount: 1_000, params: RoundParams::Mines { mines: 1 } })
            .await
            .unwrap();
        let tile = safe_tiles(&h.ledger, started.session.id).await[0];
        h.engine
            .step(started.session.id, ALICE, StepInput::Reveal { tile })
            .await
            .unwrap();
        h.engine.cashout(started.session.id, ALICE).await.unwrap();
    }

    assert_reconciles(&h, ALICE, 1_000_000).await;
    for session in h.ledger.sessions_for_user(ALICE).await.unwrap() {
        assert!(session.status.is_terminal());
        let credited: i64 = h
            .ledger
            .transactions(ALICE)
            .await
            .unwrap()
            .iter()
            .filter(|tx| tx.session_id == Some(session.id) && tx.kind == TransactionKind::WinCredit)
            .map(|tx| tx.amount)
            .sum();
        assert_eq!(credited, session.payout as i64);
    }
}
