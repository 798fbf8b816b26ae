use proptest::prelude::*;

use scroll_shooter::state_machine::{CountdownStep, LevelState, LevelStateMachine};

fn playing() -> LevelStateMachine {
    let mut m = LevelStateMachine::new();
    assert!(m.begin_countdown(1));
    assert_eq!(m.countdown_step(), CountdownStep::Finished);
    m
}

// ── Countdown ─────────────────────────────────────────────────────────────────

#[test]
fn starts_in_none_and_allows_gameplay() {
    let m = LevelStateMachine::new();
    assert_eq!(m.state(), LevelState::None);
    assert!(m.allows_gameplay());
}

#[test]
fn countdown_steps_down_to_none() {
    let mut m = LevelStateMachine::new();
    assert!(m.begin_countdown(3));
    assert_eq!(m.state(), LevelState::Countdown);
    assert!(!m.allows_gameplay());
    assert_eq!(m.countdown_remaining(), 3);

    assert_eq!(m.countdown_step(), CountdownStep::Remaining(2));
    assert_eq!(m.countdown_step(), CountdownStep::Remaining(1));
    assert_eq!(m.countdown_step(), CountdownStep::Finished);
    assert_eq!(m.state(), LevelState::None);
    assert_eq!(m.countdown_step(), CountdownStep::Inactive);
}

#[test]
fn zero_second_countdown_finishes_on_first_step() {
    let mut m = LevelStateMachine::new();
    assert!(m.begin_countdown(0));
    assert_eq!(m.countdown_step(), CountdownStep::Finished);
}

#[test]
fn countdown_cannot_restart_itself() {
    let mut m = LevelStateMachine::new();
    assert!(m.begin_countdown(3));
    assert!(!m.begin_countdown(3));
}

#[test]
fn pause_is_rejected_during_countdown() {
    let mut m = LevelStateMachine::new();
    m.begin_countdown(3);
    assert!(!m.request_pause());
    assert!(!m.request_exit());
    assert_eq!(m.state(), LevelState::Countdown);
}

// ── Pause and exit ────────────────────────────────────────────────────────────

#[test]
fn pause_and_resume_round_trip() {
    let mut m = playing();
    assert!(m.request_pause());
    assert_eq!(m.state(), LevelState::Pause);
    assert!(!m.request_pause());
    assert!(m.request_resume());
    assert_eq!(m.state(), LevelState::None);
    assert!(!m.request_resume());
}

#[test]
fn exit_confirm_can_be_cancelled() {
    let mut m = playing();
    assert!(m.request_exit());
    assert_eq!(m.state(), LevelState::ExitConfirm);
    assert!(!m.request_pause());
    assert!(m.cancel_exit());
    assert_eq!(m.state(), LevelState::None);
}

// ── Terminal states ───────────────────────────────────────────────────────────

#[test]
fn win_and_game_over_are_terminal() {
    let mut m = playing();
    assert!(m.declare_win());
    assert!(m.state().is_terminal());
    assert!(!m.declare_win());
    assert!(!m.declare_game_over());
    assert!(!m.request_pause());
    assert!(!m.begin_countdown(3));
    assert_eq!(m.state(), LevelState::Win);

    m.reset();
    assert!(m.declare_game_over());
    assert_eq!(m.state(), LevelState::GameOver);
    assert!(!m.declare_win());
}

#[test]
fn outcomes_are_not_declared_from_overlays() {
    let mut m = playing();
    m.request_pause();
    assert!(!m.declare_win());
    assert!(!m.declare_game_over());
    assert_eq!(m.state(), LevelState::Pause);
}

#[test]
fn reset_returns_to_none_from_anywhere() {
    let mut m = LevelStateMachine::new();
    m.begin_countdown(5);
    m.reset();
    assert_eq!(m.state(), LevelState::None);
    assert_eq!(m.countdown_remaining(), 0);
}

#[test]
fn display_names() {
    assert_eq!(LevelState::GameOver.to_string(), "game-over");
    assert_eq!(LevelState::ExitConfirm.to_string(), "exit-confirm");
    assert!(LevelState::Pause.is_blocking());
    assert!(!LevelState::None.is_blocking());
}

// ── Random request sequences ──────────────────────────────────────────────────

#[derive(Clone, Copy, Debug)]
enum Request {
    Countdown,
    Step,
    Pause,
    Resume,
    Exit,
    CancelExit,
    Win,
    GameOver,
}

fn request() -> impl Strategy<Value = Request> {
    prop_oneof![
        Just(Request::Countdown),
        Just(Request::Step),
        Just(Request::Pause),
        Just(Request::Resume),
        Just(Request::Exit),
        Just(Request::CancelExit),
        Just(Request::Win),
        Just(Request::GameOver),
    ]
}

fn apply(m: &mut LevelStateMachine, r: Request) -> bool {
    match r {
        Request::Countdown => m.begin_countdown(2),
        Request::Step => m.countdown_step() != CountdownStep::Inactive,
        Request::Pause => m.request_pause(),
        Request::Resume => m.request_resume(),
        Request::Exit => m.request_exit(),
        Request::CancelExit => m.cancel_exit(),
        Request::Win => m.declare_win(),
        Request::GameOver => m.declare_game_over(),
    }
}

proptest! {
    #[test]
    fn terminal_states_are_only_left_by_reset(requests in prop::collection::vec(request(), 0..60)) {
        let mut m = LevelStateMachine::new();
        let mut terminal: Option<LevelState> = None;
        for r in requests {
            let before = m.state();
            let accepted = apply(&mut m, r);
            if !accepted {
                prop_assert_eq!(m.state(), before);
            }
            if let Some(t) = terminal {
                prop_assert!(!accepted);
                prop_assert_eq!(m.state(), t);
            } else if m.state().is_terminal() {
                terminal = Some(m.state());
            }
            prop_assert_eq!(m.allows_gameplay(), m.state() == LevelState::None);
        }
    }
}
