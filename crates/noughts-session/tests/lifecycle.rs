//! End-to-end session lifecycle through the public `Store` API.

use std::time::{Duration, Instant};

use noughts_board::{Mark, Outcome};
use noughts_protocol::{MoveTarget, PlayerId, SessionStatus};
use noughts_session::{MatchOutcome, Player, SessionConfig, SessionError, Store};

const ALICE: PlayerId = PlayerId(1);
const BOB: PlayerId = PlayerId(2);

/// X and O alternate through these cells and fill the board without a line.
const DRAW_MOVES: [usize; 9] = [4, 0, 2, 6, 3, 5, 1, 7, 8];

#[test]
fn test_alice_and_bob_play_to_a_draw() {
    let mut store = Store::default();
    let now = Instant::now();

    let created = store.create_session(Player::new(ALICE, "Alice"), now);
    assert_eq!(created.status, SessionStatus::Waiting);
    let id = created.session_id;

    let joined = store.join_session(&id, Player::new(BOB, "Bob"), now).unwrap();
    assert!(joined.started);
    let names: Vec<_> = joined.snapshot.players.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Alice", "Bob"]);

    let snap = store
        .make_move(&id, ALICE, MoveTarget::Index(4), now)
        .unwrap();
    assert_eq!(snap.board.cells()[4], Some(Mark::X));
    assert_eq!(snap.current_mark, Mark::O);

    let snap = store.make_move(&id, BOB, MoveTarget::Index(0), now).unwrap();
    assert_eq!(snap.current_mark, Mark::X);

    let mut last = snap;
    for (i, &cell) in DRAW_MOVES.iter().enumerate().skip(2) {
        let who = if i % 2 == 0 { ALICE } else { BOB };
        last = store.make_move(&id, who, MoveTarget::Index(cell), now).unwrap();
    }

    assert_eq!(last.status, SessionStatus::Finished);
    assert_eq!(last.outcome, Outcome::Draw);
    assert!(last.board.is_full());
    assert_eq!(last.winning_line, None);

    // Nothing more goes in until someone resets.
    let err = store
        .make_move(&id, BOB, MoveTarget::Index(0), now)
        .unwrap_err();
    assert_eq!(err, SessionError::AlreadyFinished);

    let fresh = store.reset(&id, BOB, now).unwrap();
    assert_eq!(fresh.status, SessionStatus::Active);
    assert!(fresh.board.is_empty());
    assert_eq!(fresh.current_mark, Mark::X);
    assert_eq!(fresh.outcome, Outcome::None);
}

#[test]
fn test_rejected_moves_leave_board_untouched() {
    let mut store = Store::default();
    let now = Instant::now();
    let id = store.create_session(Player::new(ALICE, "Alice"), now).session_id;

    // Not started yet.
    let err = store
        .make_move(&id, ALICE, MoveTarget::Index(0), now)
        .unwrap_err();
    assert_eq!(err, SessionError::NotStarted);

    store.join_session(&id, Player::new(BOB, "Bob"), now).unwrap();
    store.make_move(&id, ALICE, MoveTarget::Index(0), now).unwrap();
    let before = store.snapshot(&id).unwrap();

    // Occupied, out of turn, out of range.
    assert!(store.make_move(&id, BOB, MoveTarget::Index(0), now).is_err());
    assert!(store.make_move(&id, ALICE, MoveTarget::Index(1), now).is_err());
    assert!(store.make_move(&id, BOB, MoveTarget::Index(42), now).is_err());

    assert_eq!(store.snapshot(&id).unwrap(), before);
}

#[test]
fn test_random_match_pairs_two_and_queues_the_third() {
    let mut store = Store::default();
    let now = Instant::now();

    let first = store.request_match(Player::new(PlayerId(10), "A"), now);
    let second = store.request_match(Player::new(PlayerId(11), "B"), now);
    let third = store.request_match(Player::new(PlayerId(12), "C"), now);

    assert!(matches!(first, MatchOutcome::Waiting(_)));
    assert!(matches!(second, MatchOutcome::Paired(_)));
    assert_eq!(first.session_id(), second.session_id());
    assert!(matches!(third, MatchOutcome::Waiting(_)));

    let paired = store.snapshot(second.session_id()).unwrap();
    assert_eq!(paired.status, SessionStatus::Active);
    assert!(paired.players.iter().all(|p| p.id != PlayerId(12)));
}

#[test]
fn test_abandoned_session_expires_after_ttl() {
    let mut store = Store::new(SessionConfig {
        ttl: Duration::from_secs(60),
        ..SessionConfig::default()
    });
    let start = Instant::now();
    let id = store.create_session(Player::new(ALICE, "Alice"), start).session_id;
    store
        .join_session(&id, Player::new(BOB, "Bob"), start + Duration::from_secs(30))
        .unwrap();

    assert!(store.sweep_expired(start + Duration::from_secs(80)).is_empty());
    assert_eq!(store.sweep_expired(start + Duration::from_secs(91)), vec![id.clone()]);
    assert!(store.snapshot(&id).is_none());
}
