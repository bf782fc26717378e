//! End-to-end round flow over the public engine API.

use szkic_backend::game::engine::{Effect, GameConfig, GameEngine, GamePhase, Outcome, Player};

fn duo(max_rounds: u32, words: &[&str]) -> GameEngine {
    let players = vec![Player::human("p1", "P1"), Player::human("p2", "P2")];
    let config = GameConfig {
        max_rounds,
        round_seconds: 60,
        words: words.iter().map(|w| w.to_string()).collect(),
    };
    GameEngine::new(players, config).unwrap()
}

#[test]
fn two_player_game_plays_out_to_the_expected_standings() {
    let mut engine = duo(2, &["kot", "pies"]);

    // round 1: P1 draws "kot", P2 guesses with 50 s on the clock
    engine.start_round().unwrap();
    assert_eq!(engine.phase(), GamePhase::WordSelection);
    assert!(engine.is_drawer("p1"));
    assert!(engine.offered_words().contains(&"kot".to_string()));
    engine.select_word("kot");
    assert_eq!(engine.phase(), GamePhase::PlayerDrawing);
    let seq = engine.round_seq();
    for _ in 0..10 {
        engine.tick(seq);
    }
    assert_eq!(engine.time_left(), 50);
    let effects = engine.submit_guess("p2", "kot");
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::RoundOver { .. })));
    assert_eq!(engine.score_of("p2"), Some(100));
    assert_eq!(engine.score_of("p1"), Some(5));

    // round 2: P2 draws "pies" and the clock runs out unguessed
    engine.advance().unwrap();
    assert_eq!(engine.round(), 2);
    assert!(engine.is_drawer("p2"));
    engine.select_word("pies");
    let seq = engine.round_seq();
    for _ in 0..60 {
        engine.tick(seq);
    }
    assert_eq!(engine.phase(), GamePhase::EndOfRound);
    assert_eq!(engine.score_of("p2"), Some(110));
    assert_eq!(engine.score_of("p1"), Some(5));

    // the game ends after the final round and stays ended
    let effects = engine.advance().unwrap();
    assert_eq!(engine.phase(), GamePhase::GameEnded);
    assert!(effects.iter().any(|e| matches!(e, Effect::GameOver { .. })));
    assert!(effects.contains(&Effect::Stat {
        player_id: "p2".to_string(),
        outcome: Outcome::Win,
    }));
    assert!(effects.contains(&Effect::Stat {
        player_id: "p1".to_string(),
        outcome: Outcome::Loss,
    }));
    assert!(engine.advance().unwrap().is_empty());
    assert_eq!(engine.phase(), GamePhase::GameEnded);
}

#[test]
fn desertion_mid_round_ends_a_two_player_game() {
    let mut engine = duo(5, &["kot", "pies"]);
    engine.start_round().unwrap();
    let word = engine.offered_words()[0].clone();
    engine.select_word(&word);

    let effects = engine.handle_departure("p1");
    assert_eq!(engine.phase(), GamePhase::GameEnded);
    assert!(effects.contains(&Effect::Stat {
        player_id: "p2".to_string(),
        outcome: Outcome::Win,
    }));
    assert!(effects.contains(&Effect::Stat {
        player_id: "p1".to_string(),
        outcome: Outcome::Desertion,
    }));
    // the abandoned round scored nothing
    assert_eq!(engine.score_of("p2"), Some(0));
}
