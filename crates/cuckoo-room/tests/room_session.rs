//! Integration tests for room sessions and the registry.
//!
//! Time is paused (`start_paused`), so the resolution sequence's fixed
//! delays resolve deterministically via tokio's auto-advance.

use std::time::Duration;

use cuckoo_engine::{OutcomeKind, PlayerId, TurnAction};
use cuckoo_protocol::{RoomCode, RoomPhase, ServerEvent};
use cuckoo_room::{PlayerSender, RoomConfig, RoomError, RoomRegistry};
use cuckoo_sequence::SequenceConfig;
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

type EventRx = mpsc::UnboundedReceiver<ServerEvent>;

fn pid(id: u64) -> PlayerId {
    PlayerId(id)
}

fn registry() -> RoomRegistry {
    RoomRegistry::new(RoomConfig {
        sequence: SequenceConfig::uniform(Duration::from_secs(2)),
        ..RoomConfig::default()
    })
}

fn channel() -> (PlayerSender, EventRx) {
    mpsc::unbounded_channel()
}

async fn next_event(rx: &mut EventRx) -> ServerEvent {
    tokio::time::timeout(Duration::from_secs(30), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

fn current_player(event: &ServerEvent) -> PlayerId {
    match event {
        ServerEvent::GameStateUpdate { players, current_turn_index, .. } => {
            players[current_turn_index.expect("no current turn")].id
        }
        other => panic!("expected GameStateUpdate, got {other:?}"),
    }
}

/// Sets up a two-player room and drains the lobby broadcasts.
async fn lobby_of_two(
    reg: &mut RoomRegistry,
) -> (RoomCode, EventRx, EventRx) {
    let (s1, mut rx1) = channel();
    let (s2, mut rx2) = channel();
    let code = reg.create_room(pid(1), "Gavin", s1).await.unwrap();
    let _ = next_event(&mut rx1).await; // LobbyUpdate (creator alone)
    reg.join_room(pid(2), &code, "Matthew", s2).await.unwrap();
    let _ = next_event(&mut rx1).await; // LobbyUpdate (both)
    let _ = next_event(&mut rx2).await;
    (code, rx1, rx2)
}

// =========================================================================
// Lobby lifecycle
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_create_room_broadcasts_lobby_to_creator() {
    let mut reg = registry();
    let (s1, mut rx1) = channel();
    let code = reg.create_room(pid(1), "Gavin", s1).await.unwrap();

    match next_event(&mut rx1).await {
        ServerEvent::LobbyUpdate { room_code, host, roster, phase } => {
            assert_eq!(room_code, code);
            assert_eq!(host, pid(1));
            assert_eq!(roster.len(), 1);
            assert_eq!(roster[0].name, "Gavin");
            assert_eq!(phase, RoomPhase::Lobby);
        }
        other => panic!("expected LobbyUpdate, got {other:?}"),
    }
    assert_eq!(reg.room_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_join_broadcasts_updated_roster_to_everyone() {
    let mut reg = registry();
    let (s1, mut rx1) = channel();
    let (s2, mut rx2) = channel();
    let code = reg.create_room(pid(1), "Gavin", s1).await.unwrap();
    let _ = next_event(&mut rx1).await;

    reg.join_room(pid(2), &code, "Matthew", s2).await.unwrap();

    for rx in [&mut rx1, &mut rx2] {
        match next_event(rx).await {
            ServerEvent::LobbyUpdate { roster, host, .. } => {
                assert_eq!(roster.len(), 2);
                assert_eq!(host, pid(1));
            }
            other => panic!("expected LobbyUpdate, got {other:?}"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_join_unknown_code_is_not_found() {
    let mut reg = registry();
    let (s1, _rx1) = channel();
    let err = reg
        .join_room(pid(1), &RoomCode::new("ZZZZ9"), "Gavin", s1)
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::NotFound(_)));
    assert_eq!(err.to_string(), "Room not found.");
}

#[tokio::test(start_paused = true)]
async fn test_one_room_at_a_time() {
    let mut reg = registry();
    let (s1, _rx1) = channel();
    let code = reg.create_room(pid(1), "Gavin", s1).await.unwrap();

    let (s1b, _rx1b) = channel();
    let err = reg.create_room(pid(1), "Gavin", s1b).await.unwrap_err();
    assert!(matches!(err, RoomError::AlreadyInOtherRoom(p, c) if p == pid(1) && c == code));
}

#[tokio::test(start_paused = true)]
async fn test_room_full_rejects_joiner() {
    let mut reg = RoomRegistry::new(RoomConfig {
        max_players: 2,
        sequence: SequenceConfig::uniform(Duration::from_secs(2)),
        ..RoomConfig::default()
    });
    let (s1, _rx1) = channel();
    let (s2, _rx2) = channel();
    let (s3, _rx3) = channel();
    let code = reg.create_room(pid(1), "Gavin", s1).await.unwrap();
    reg.join_room(pid(2), &code, "Matthew", s2).await.unwrap();

    let err = reg.join_room(pid(3), &code, "Harrison", s3).await.unwrap_err();
    assert!(matches!(err, RoomError::RoomFull(_)));
    // The failed joiner holds no membership.
    assert!(reg.player_room(&pid(3)).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_leave_passes_host_and_broadcasts() {
    let mut reg = registry();
    let (_code, _rx1, mut rx2) = lobby_of_two(&mut reg).await;

    reg.leave_room(pid(1)).await.unwrap();

    match next_event(&mut rx2).await {
        ServerEvent::LobbyUpdate { host, roster, .. } => {
            assert_eq!(host, pid(2));
            assert_eq!(roster.len(), 1);
        }
        other => panic!("expected LobbyUpdate, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_remove_tears_the_room_down() {
    let mut reg = registry();
    let (code, _rx1, _rx2) = lobby_of_two(&mut reg).await;

    reg.remove(&code).await.unwrap();
    assert_eq!(reg.room_count(), 0);

    let (s3, _rx3) = channel();
    let err = reg.join_room(pid(3), &code, "Colin", s3).await.unwrap_err();
    assert!(matches!(err, RoomError::NotFound(_)));
}

#[tokio::test(start_paused = true)]
async fn test_last_leave_removes_the_room() {
    let mut reg = registry();
    let (code, _rx1, _rx2) = lobby_of_two(&mut reg).await;

    reg.leave_room(pid(1)).await.unwrap();
    reg.leave_room(pid(2)).await.unwrap();
    assert_eq!(reg.room_count(), 0);

    // The code is gone; a join against it is an ordinary not-found.
    let (s3, _rx3) = channel();
    let err = reg.join_room(pid(3), &code, "Colin", s3).await.unwrap_err();
    assert!(matches!(err, RoomError::NotFound(_)));
}

// =========================================================================
// Starting a game
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_only_the_host_can_start() {
    let mut reg = registry();
    let (code, _rx1, mut rx2) = lobby_of_two(&mut reg).await;
    let room = reg.get(&code).unwrap();

    room.start_game(pid(2), 3).await.unwrap();

    match next_event(&mut rx2).await {
        ServerEvent::ActionError { message } => assert!(message.contains("host")),
        other => panic!("expected ActionError, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_start_needs_minimum_players() {
    let mut reg = registry();
    let (s1, mut rx1) = channel();
    let code = reg.create_room(pid(1), "Gavin", s1).await.unwrap();
    let _ = next_event(&mut rx1).await;
    let room = reg.get(&code).unwrap();

    room.start_game(pid(1), 3).await.unwrap();

    match next_event(&mut rx1).await {
        ServerEvent::ActionError { message } => assert!(message.contains("at least")),
        other => panic!("expected ActionError, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_start_deals_and_broadcasts_game_state() {
    let mut reg = registry();
    let (code, mut rx1, mut rx2) = lobby_of_two(&mut reg).await;
    let room = reg.get(&code).unwrap();

    room.start_game(pid(1), 3).await.unwrap();

    for rx in [&mut rx1, &mut rx2] {
        match next_event(rx).await {
            ServerEvent::GameStateUpdate {
                phase,
                players,
                dealer_index,
                current_turn_index,
                last_turn_index,
                ..
            } => {
                assert_eq!(phase, RoomPhase::InProgress);
                assert_eq!(players.len(), 2);
                assert!(players.iter().all(|p| p.card.is_some() && p.lives == 3));
                let dealer = dealer_index.unwrap();
                assert_eq!(current_turn_index.unwrap(), dealer);
                assert_eq!(last_turn_index.unwrap(), (dealer + 1) % 2);
            }
            other => panic!("expected GameStateUpdate, got {other:?}"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_join_rejected_while_game_in_progress() {
    let mut reg = registry();
    let (code, mut rx1, _rx2) = lobby_of_two(&mut reg).await;
    let room = reg.get(&code).unwrap();
    room.start_game(pid(1), 3).await.unwrap();
    let _ = next_event(&mut rx1).await; // GameStateUpdate

    let (s3, _rx3) = channel();
    let err = reg.join_room(pid(3), &code, "Harrison", s3).await.unwrap_err();
    assert!(matches!(err, RoomError::GameInProgress(_)));
}

// =========================================================================
// Turn actions and the resolution sequence
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_wrong_actor_gets_an_error_and_state_is_unchanged() {
    let mut reg = registry();
    let (code, mut rx1, mut rx2) = lobby_of_two(&mut reg).await;
    let room = reg.get(&code).unwrap();
    room.start_game(pid(1), 3).await.unwrap();

    let state = next_event(&mut rx1).await;
    let _ = next_event(&mut rx2).await;
    let current = current_player(&state);
    let wrong = if current == pid(1) { pid(2) } else { pid(1) };

    room.action(wrong, TurnAction::Skip).await.unwrap();

    let wrong_rx = if wrong == pid(1) { &mut rx1 } else { &mut rx2 };
    match next_event(wrong_rx).await {
        ServerEvent::ActionError { message } => assert!(message.contains("turn")),
        other => panic!("expected ActionError, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_round_resolves_then_deals_the_next_round() {
    let mut reg = registry();
    let (code, mut rx1, _rx2) = lobby_of_two(&mut reg).await;
    let room = reg.get(&code).unwrap();
    room.start_game(pid(1), 3).await.unwrap();

    let state = next_event(&mut rx1).await;
    let first = current_player(&state);
    let second = if first == pid(1) { pid(2) } else { pid(1) };

    // Non-final turn: ordinary state broadcast.
    room.action(first, TurnAction::Skip).await.unwrap();
    let state = next_event(&mut rx1).await;
    assert_eq!(current_player(&state), second);

    // Final turn: reveal broadcast, then the timed sequence.
    room.action(second, TurnAction::Skip).await.unwrap();
    let reveal = next_event(&mut rx1).await;
    assert!(matches!(reveal, ServerEvent::GameStateUpdate { .. }));

    match next_event(&mut rx1).await {
        ServerEvent::RoundOutcome { kind, losers, .. } => match kind {
            // Two players: either one unpaired lowest card or a pair.
            OutcomeKind::LowestCard => assert_eq!(losers.len(), 1),
            OutcomeKind::Draw => assert!(losers.is_empty()),
            other => panic!("impossible two-player outcome {other:?}"),
        },
        other => panic!("expected RoundOutcome, got {other:?}"),
    }

    // With 3 starting lives nobody is eliminated yet: next round deals.
    match next_event(&mut rx1).await {
        ServerEvent::GameStateUpdate { players, .. } => {
            assert!(players.iter().all(|p| p.card.is_some()));
        }
        other => panic!("expected GameStateUpdate, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_actions_rejected_while_resolution_runs() {
    let mut reg = registry();
    let (code, mut rx1, mut rx2) = lobby_of_two(&mut reg).await;
    let room = reg.get(&code).unwrap();
    room.start_game(pid(1), 3).await.unwrap();

    let state = next_event(&mut rx1).await;
    let first = current_player(&state);
    let second = if first == pid(1) { pid(2) } else { pid(1) };

    room.action(first, TurnAction::Skip).await.unwrap();
    let _ = next_event(&mut rx1).await;
    room.action(second, TurnAction::Skip).await.unwrap();
    let _ = next_event(&mut rx1).await; // reveal

    // The sequence is now in flight; any action must bounce.
    room.action(first, TurnAction::Swap).await.unwrap();
    let first_rx = if first == pid(1) { &mut rx1 } else { &mut rx2 };
    match next_event(first_rx).await {
        ServerEvent::ActionError { message } => assert!(message.contains("resolved")),
        other => panic!("expected ActionError, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_game_over_returns_the_room_to_the_lobby() {
    let mut reg = registry();
    let (code, mut rx1, _rx2) = lobby_of_two(&mut reg).await;
    let room = reg.get(&code).unwrap();

    // One life each: the first non-draw round ends the game.
    room.start_game(pid(1), 1).await.unwrap();
    let mut state = next_event(&mut rx1).await;

    let mut finished = false;
    for _ in 0..30 {
        let first = current_player(&state);
        let second = if first == pid(1) { pid(2) } else { pid(1) };
        room.action(first, TurnAction::Skip).await.unwrap();
        let _ = next_event(&mut rx1).await;
        room.action(second, TurnAction::Skip).await.unwrap();
        let _ = next_event(&mut rx1).await; // reveal

        let outcome = next_event(&mut rx1).await;
        let ServerEvent::RoundOutcome { kind, .. } = outcome else {
            panic!("expected RoundOutcome, got {outcome:?}");
        };

        if kind == OutcomeKind::Draw {
            // Dead round: the next deal arrives and the game goes on.
            state = next_event(&mut rx1).await;
            continue;
        }

        match next_event(&mut rx1).await {
            ServerEvent::GameOver { winner_name } => {
                assert!(winner_name.is_some());
            }
            other => panic!("expected GameOver, got {other:?}"),
        }
        match next_event(&mut rx1).await {
            ServerEvent::LobbyUpdate { phase, roster, .. } => {
                assert_eq!(phase, RoomPhase::Lobby);
                assert_eq!(roster.len(), 2);
            }
            other => panic!("expected LobbyUpdate, got {other:?}"),
        }
        finished = true;
        break;
    }
    assert!(finished, "no decisive round in 30 deals");

    // The lobby is re-joinable and a fresh game can start.
    room.start_game(pid(1), 3).await.unwrap();
    match next_event(&mut rx1).await {
        ServerEvent::GameStateUpdate { phase, players, .. } => {
            assert_eq!(phase, RoomPhase::InProgress);
            assert!(players.iter().all(|p| p.lives == 3 && !p.is_out));
        }
        other => panic!("expected GameStateUpdate, got {other:?}"),
    }
}
