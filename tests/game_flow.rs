//! End-to-end engine flows against the in-memory store: lobby to results,
//! answer idempotency, standings, and snapshot-driven session recovery.

use std::{sync::Arc, time::Duration};

use time::OffsetDateTime;
use uuid::Uuid;

use quiz_live_back::{
    config::AppConfig,
    dao::{
        game_store::{GameStore, memory::MemoryStore},
        models::{ChoiceEntity, QuestionEntity},
    },
    dto::game::{CreateGameRequest, JoinGameRequest},
    error::ServiceError,
    services::{
        answer_service::AnswerOutcome,
        game_service, leaderboard_service,
        play_service,
        player_session::{PlayerSession, Screen},
    },
    state::{AppState, state_machine::GamePhase},
};

fn new_store() -> Arc<dyn GameStore> {
    Arc::new(MemoryStore::new())
}

/// Seed a quiz set of `count` questions worth 1000 points each; the first
/// choice of every question is the correct one.
async fn seed_quiz(store: &Arc<dyn GameStore>, count: u32) -> (Uuid, Vec<QuestionEntity>) {
    let quiz_set_id = Uuid::new_v4();
    let questions: Vec<QuestionEntity> = (0..count)
        .map(|order| QuestionEntity {
            id: Uuid::new_v4(),
            quiz_set_id,
            body: format!("question {order}"),
            order,
            time_limit_secs: 20,
            points: 1000,
            choices: (0..4)
                .map(|i| ChoiceEntity {
                    id: Uuid::new_v4(),
                    body: format!("choice {i}"),
                    is_correct: i == 0,
                })
                .collect(),
        })
        .collect();
    store
        .insert_question_set(questions.clone())
        .await
        .expect("seed quiz set");
    (quiz_set_id, questions)
}

fn join_request(nickname: &str) -> JoinGameRequest {
    JoinGameRequest {
        user_id: Uuid::new_v4(),
        nickname: nickname.to_string(),
        avatar_id: None,
    }
}

async fn create_game(store: &Arc<dyn GameStore>, quiz_set_id: Uuid, team_mode: bool) -> Uuid {
    let game = game_service::create_game(
        store,
        CreateGameRequest {
            quiz_set_id,
            team_mode,
            max_teams: team_mode.then_some(2),
        },
    )
    .await
    .expect("create game");
    game.id
}

fn correct_choice(question: &QuestionEntity) -> Uuid {
    question.correct_choice().expect("correct choice").id
}

fn wrong_choice(question: &QuestionEntity) -> Uuid {
    question
        .choices
        .iter()
        .find(|c| !c.is_correct)
        .expect("wrong choice")
        .id
}

#[tokio::test]
async fn full_game_scores_and_ranks_three_participants() {
    let store = new_store();
    let config = AppConfig::default();
    let (quiz_set_id, questions) = seed_quiz(&store, 2).await;
    let game_id = create_game(&store, quiz_set_id, false).await;

    let mut ada = PlayerSession::join(store.clone(), &config, game_id, join_request("ada"))
        .await
        .expect("ada joins");
    let mut ben = PlayerSession::join(store.clone(), &config, game_id, join_request("ben"))
        .await
        .expect("ben joins");
    let mut cyd = PlayerSession::join(store.clone(), &config, game_id, join_request("cyd"))
        .await
        .expect("cyd joins");
    assert_eq!(*ada.screen(), Screen::Lobby);

    assert!(
        game_service::start_game(&store, game_id)
            .await
            .expect("start")
            .is_applied()
    );

    for session in [&mut ada, &mut ben, &mut cyd] {
        let screen = session.refresh().await.expect("refresh");
        assert!(matches!(screen, Screen::Question { sequence: 0, .. }));
    }

    // Same correct choice, answered 2s / 10s / 20s into the 20s window.
    let choice = correct_choice(&questions[0]);
    let outcomes = [
        ada.submit_with_elapsed(choice, 2_000).await.expect("ada"),
        ben.submit_with_elapsed(choice, 10_000).await.expect("ben"),
        cyd.submit_with_elapsed(choice, 20_000).await.expect("cyd"),
    ];
    for (outcome, expected) in outcomes.into_iter().zip([900, 500, 0]) {
        match outcome {
            AnswerOutcome::Recorded { score } => assert_eq!(score, expected),
            AnswerOutcome::AlreadyAnswered => panic!("first submission rejected"),
        }
    }

    game_service::reveal_answer(&store, game_id)
        .await
        .expect("reveal");
    game_service::advance_question(&store, game_id)
        .await
        .expect("advance");

    // Second question: only ada answers, instantly and correctly.
    let screen = ada.refresh().await.expect("refresh");
    assert!(matches!(screen, Screen::Question { sequence: 1, .. }));
    ada.submit_with_elapsed(correct_choice(&questions[1]), 0)
        .await
        .expect("ada q2");

    game_service::reveal_answer(&store, game_id)
        .await
        .expect("reveal");
    game_service::advance_question(&store, game_id)
        .await
        .expect("advance past last");
    assert_eq!(ada.refresh().await.expect("refresh"), Screen::Results);

    let standings = leaderboard_service::compute_standings(&store, game_id)
        .await
        .expect("standings");
    assert_eq!(standings.len(), 3);
    assert_eq!(standings[0].nickname, "ada");
    assert_eq!(standings[0].total_score, 1900);
    assert_eq!(standings[0].correct_count, 2);
    assert_eq!(standings[1].nickname, "ben");
    assert_eq!(standings[1].total_score, 500);
    assert_eq!(standings[2].nickname, "cyd");
    assert_eq!(standings[2].total_score, 0);
    // A zero-score correct answer still counts as correct.
    assert_eq!(standings[2].correct_count, 1);
    assert_eq!(
        standings.iter().map(|r| r.rank).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[tokio::test]
async fn duplicate_answer_keeps_the_first_score() {
    let store = new_store();
    let config = AppConfig::default();
    let (quiz_set_id, questions) = seed_quiz(&store, 1).await;
    let game_id = create_game(&store, quiz_set_id, false).await;

    let mut session = PlayerSession::join(store.clone(), &config, game_id, join_request("ada"))
        .await
        .expect("join");
    game_service::start_game(&store, game_id).await.expect("start");
    session.refresh().await.expect("refresh");

    let first = session
        .submit_with_elapsed(correct_choice(&questions[0]), 0)
        .await
        .expect("first submit");
    assert!(matches!(first, AnswerOutcome::Recorded { score: 1000 }));

    // Retry with a different, wrong choice: acknowledged, not overwritten.
    let second = session
        .submit_with_elapsed(wrong_choice(&questions[0]), 5_000)
        .await
        .expect("second submit");
    assert!(matches!(second, AnswerOutcome::AlreadyAnswered));

    let standings = leaderboard_service::compute_standings(&store, game_id)
        .await
        .expect("standings");
    assert_eq!(standings[0].total_score, 1000);
    assert_eq!(standings[0].correct_count, 1);
}

#[tokio::test]
async fn double_advance_is_an_idempotent_noop() {
    let store = new_store();
    let config = AppConfig::default();
    let (quiz_set_id, _) = seed_quiz(&store, 3).await;
    let game_id = create_game(&store, quiz_set_id, false).await;

    PlayerSession::join(store.clone(), &config, game_id, join_request("ada"))
        .await
        .expect("join");
    game_service::start_game(&store, game_id).await.expect("start");
    game_service::reveal_answer(&store, game_id).await.expect("reveal");

    let first = game_service::advance_question(&store, game_id)
        .await
        .expect("first advance");
    assert!(first.is_applied());
    assert_eq!(
        first.phase(),
        GamePhase::Quiz {
            sequence: 1,
            revealed: false
        }
    );

    // The double click: precondition no longer holds, nothing moves.
    let second = game_service::advance_question(&store, game_id)
        .await
        .expect("second advance");
    assert!(!second.is_applied());
    assert_eq!(second.phase(), first.phase());
}

#[tokio::test]
async fn session_that_missed_every_event_recovers_from_one_snapshot() {
    let store = new_store();
    let config = AppConfig::default();
    let (quiz_set_id, _) = seed_quiz(&store, 3).await;
    let game_id = create_game(&store, quiz_set_id, false).await;

    let mut attentive = PlayerSession::join(store.clone(), &config, game_id, join_request("ada"))
        .await
        .expect("ada joins");
    let mut absent = PlayerSession::join(store.clone(), &config, game_id, join_request("ben"))
        .await
        .expect("ben joins");

    // Five phase writes; the attentive session consumes each one.
    game_service::start_game(&store, game_id).await.expect("start");
    attentive.next_screen().await.expect("event 1");
    game_service::reveal_answer(&store, game_id).await.expect("reveal");
    attentive.next_screen().await.expect("event 2");
    game_service::advance_question(&store, game_id).await.expect("advance");
    attentive.next_screen().await.expect("event 3");
    game_service::reveal_answer(&store, game_id).await.expect("reveal");
    attentive.next_screen().await.expect("event 4");
    game_service::advance_question(&store, game_id).await.expect("advance");
    let stepped = attentive.next_screen().await.expect("event 5");

    // The absent session saw nothing and re-reads the snapshot once.
    let jumped = absent.refresh().await.expect("refresh");
    assert_eq!(stepped, jumped);
    assert!(matches!(stepped, Screen::Question { sequence: 2, revealed: false, .. }));
}

#[tokio::test]
async fn duplicate_join_resolves_to_the_same_participant() {
    let store = new_store();
    let (quiz_set_id, _) = seed_quiz(&store, 1).await;
    let game_id = create_game(&store, quiz_set_id, false).await;

    let request = join_request("ada");
    let user_id = request.user_id;
    let first = play_service::join_game(&store, game_id, request)
        .await
        .expect("first join");

    let retry = JoinGameRequest {
        user_id,
        nickname: "ada-again".to_string(),
        avatar_id: None,
    };
    let second = play_service::join_game(&store, game_id, retry)
        .await
        .expect("retried join");

    assert_eq!(first.id, second.id);
    assert_eq!(second.nickname, "ada");

    let participants = store.list_participants(game_id).await.expect("list");
    assert_eq!(participants.len(), 1);
}

#[tokio::test]
async fn stale_auto_advance_timer_does_not_move_the_game() {
    let store = new_store();
    let config = AppConfig::default();
    let (quiz_set_id, _) = seed_quiz(&store, 3).await;
    let game_id = create_game(&store, quiz_set_id, false).await;
    let state = AppState::new(store.clone(), config.clone());

    PlayerSession::join(store.clone(), &config, game_id, join_request("ada"))
        .await
        .expect("join");
    game_service::start_game(&store, game_id).await.expect("start");
    game_service::reveal_answer(&store, game_id).await.expect("reveal");

    // Arm the timer for question 0, then beat it manually: the host clicked
    // first.
    game_service::schedule_auto_advance(state, game_id, 0, Duration::from_millis(50));
    game_service::advance_question(&store, game_id)
        .await
        .expect("manual advance");

    tokio::time::sleep(Duration::from_millis(150)).await;

    let game = store
        .find_game(game_id)
        .await
        .expect("find")
        .expect("game exists");
    // Still on question 1, unrevealed: the stale timer fired as a no-op.
    assert_eq!(
        game.phase,
        GamePhase::Quiz {
            sequence: 1,
            revealed: false
        }
    );
}

#[tokio::test]
async fn timer_armed_for_an_earlier_question_never_advances_the_next() {
    let store = new_store();
    let config = AppConfig::default();
    let (quiz_set_id, _) = seed_quiz(&store, 3).await;
    let game_id = create_game(&store, quiz_set_id, false).await;
    let state = AppState::new(store.clone(), config.clone());

    PlayerSession::join(store.clone(), &config, game_id, join_request("ada"))
        .await
        .expect("join");
    game_service::start_game(&store, game_id).await.expect("start");
    game_service::reveal_answer(&store, game_id).await.expect("reveal q0");

    // Arm the timer for question 0, then race ahead: the host advances by
    // hand and reveals question 1 before the timer fires. When it does, the
    // game is again on a revealed question, but not the one the timer was
    // armed for.
    game_service::schedule_auto_advance(state, game_id, 0, Duration::from_millis(50));
    game_service::advance_question(&store, game_id)
        .await
        .expect("manual advance");
    game_service::reveal_answer(&store, game_id).await.expect("reveal q1");

    tokio::time::sleep(Duration::from_millis(150)).await;

    let game = store
        .find_game(game_id)
        .await
        .expect("find")
        .expect("game exists");
    // Question 1 stays on screen, revealed; the stale timer changed nothing.
    assert_eq!(
        game.phase,
        GamePhase::Quiz {
            sequence: 1,
            revealed: true
        }
    );
}

#[tokio::test]
async fn starting_a_missing_game_reports_not_found() {
    let store = new_store();

    let err = game_service::start_game(&store, Uuid::new_v4())
        .await
        .expect_err("start of an unknown game");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn team_standings_sum_member_scores() {
    let store = new_store();
    let config = AppConfig::default();
    let (quiz_set_id, questions) = seed_quiz(&store, 1).await;
    let game_id = create_game(&store, quiz_set_id, true).await;

    let mut sessions = Vec::new();
    for (nickname, team) in [("ada", 1), ("ben", 1), ("cyd", 2)] {
        let session = PlayerSession::join(store.clone(), &config, game_id, join_request(nickname))
            .await
            .expect("join");
        play_service::select_team(&store, game_id, session.participant().id, Some(team))
            .await
            .expect("pick team");
        sessions.push(session);
    }

    game_service::start_game(&store, game_id).await.expect("start");
    let choice = correct_choice(&questions[0]);
    for (session, elapsed) in sessions.iter_mut().zip([0, 10_000, 0]) {
        session.refresh().await.expect("refresh");
        session
            .submit_with_elapsed(choice, elapsed)
            .await
            .expect("submit");
    }

    let teams = leaderboard_service::compute_team_standings(&store, game_id)
        .await
        .expect("team standings");
    assert_eq!(teams.len(), 2);
    // Team 1: 1000 + 500; team 2: 1000.
    assert_eq!(teams[0].team_id, 1);
    assert_eq!(teams[0].total_score, 1500);
    assert_eq!(teams[0].member_count, 2);
    assert_eq!(teams[1].team_id, 2);
    assert_eq!(teams[1].total_score, 1000);
}

#[tokio::test]
async fn equal_scores_rank_by_join_order() {
    let store = new_store();
    let config = AppConfig::default();
    let (quiz_set_id, questions) = seed_quiz(&store, 1).await;
    let game_id = create_game(&store, quiz_set_id, false).await;

    let mut late = None;
    let mut early = None;
    for nickname in ["first", "second"] {
        let session = PlayerSession::join(store.clone(), &config, game_id, join_request(nickname))
            .await
            .expect("join");
        if nickname == "first" {
            early = Some(session);
        } else {
            late = Some(session);
        }
        // Keep created_at strictly ordered even on a coarse clock.
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let (mut early, mut late) = (early.unwrap(), late.unwrap());

    game_service::start_game(&store, game_id).await.expect("start");
    let choice = correct_choice(&questions[0]);
    for session in [&mut late, &mut early] {
        session.refresh().await.expect("refresh");
        session
            .submit_with_elapsed(choice, 10_000)
            .await
            .expect("submit");
    }

    let standings = leaderboard_service::compute_standings(&store, game_id)
        .await
        .expect("standings");
    assert_eq!(standings[0].total_score, standings[1].total_score);
    // Tie broken by registration time, deterministically.
    assert_eq!(standings[0].nickname, "first");
    assert_eq!(standings[1].nickname, "second");
}

#[tokio::test]
async fn joining_a_finished_game_is_rejected() {
    let store = new_store();
    let (quiz_set_id, _) = seed_quiz(&store, 1).await;
    let game_id = create_game(&store, quiz_set_id, false).await;

    // Push the game straight to results through the store.
    let game = store
        .find_game(game_id)
        .await
        .expect("find")
        .expect("game exists");
    store
        .update_game_phase(game_id, game.version, GamePhase::Results)
        .await
        .expect("force results");

    let err = play_service::join_game(&store, game_id, join_request("late"))
        .await
        .expect_err("join after results");
    assert!(err.to_string().contains("finished"));
}

#[tokio::test]
async fn answers_survive_session_restarts() {
    let store = new_store();
    let config = AppConfig::default();
    let (quiz_set_id, questions) = seed_quiz(&store, 1).await;
    let game_id = create_game(&store, quiz_set_id, false).await;

    let request = join_request("ada");
    let user_id = request.user_id;
    let mut session = PlayerSession::join(store.clone(), &config, game_id, request)
        .await
        .expect("join");
    game_service::start_game(&store, game_id).await.expect("start");
    session.refresh().await.expect("refresh");
    session
        .submit_with_elapsed(correct_choice(&questions[0]), 0)
        .await
        .expect("submit");
    drop(session);

    // Same device reconnects mid-question.
    let rejoined = PlayerSession::join(
        store.clone(),
        &config,
        game_id,
        JoinGameRequest {
            user_id,
            nickname: "ada".to_string(),
            avatar_id: None,
        },
    )
    .await
    .expect("rejoin");

    let answers = store.list_answers(game_id).await.expect("answers");
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].participant_id, rejoined.participant().id);
    assert!(answers[0].created_at <= OffsetDateTime::now_utc());

    // The rejoined session recovered its answer history.
    assert!(matches!(
        rejoined.screen(),
        Screen::Question { answered: true, .. }
    ));
}
