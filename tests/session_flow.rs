//! End-to-end flows through `Session` with an in-memory store and scripted
//! prompt answers.

use chrono::NaiveDate;

use habit_quest::battle::TurnOutcome;
use habit_quest::ports::{Answer, KeyValueStore, MemoryStore, ScriptedPrompt};
use habit_quest::save::{KEY_CHECKPOINT, KEY_LAST_PERIOD, KEY_WEEKLY_MISSIONS};
use habit_quest::state::{BattlePhase, MissionStatus};
use habit_quest::{Notice, Session, StatName, TrackerError};

type TestSession = Session<MemoryStore, ScriptedPrompt>;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_session(answers: Vec<Answer>) -> TestSession {
    Session::new(MemoryStore::new(), ScriptedPrompt::new(answers))
}

fn reopen(session: &TestSession, answers: Vec<Answer>) -> TestSession {
    Session::new(session.store().clone(), ScriptedPrompt::new(answers))
}

#[test]
fn bound_scores_drive_level_by_minimum() {
    let today = date(2024, 3, 4);
    let mut s = new_session(vec![]);
    s.start(today);
    s.add_category("Exercise").unwrap();
    s.add_category("Study").unwrap();
    s.assign_stat(StatName::Atk, Some("Exercise")).unwrap();
    s.assign_stat(StatName::Def, Some("Study")).unwrap();
    s.set_target("Exercise", 10.0).unwrap();
    s.set_target("Study", 10.0).unwrap();

    for _ in 0..5 {
        s.adjust_score("Exercise", 3, today).unwrap();
    }
    assert_eq!(s.state.category("Exercise").unwrap().score, 15);
    assert_eq!(s.state.level, 0);
    assert!(!s
        .notices()
        .iter()
        .any(|n| matches!(n, Notice::LevelUp { .. })));

    s.adjust_score("Study", 2, today).unwrap();
    assert_eq!(s.state.level, 2);
}

#[test]
fn score_never_negative_and_log_records_applied_delta() {
    let today = date(2024, 3, 4);
    let mut s = new_session(vec![]);
    s.add_category("Exercise").unwrap();
    s.adjust_score("Exercise", 2, today).unwrap();
    assert_eq!(s.adjust_score("Exercise", -5, today).unwrap(), 0);
    assert_eq!(s.state.category("Exercise").unwrap().score, 0);
    assert_eq!(s.state.daily_log["2024-03-04"]["Exercise"], 0);
}

#[test]
fn rename_carries_every_field() {
    let today = date(2024, 3, 4);
    let mut s = new_session(vec![]);
    s.add_category("Exercise").unwrap();
    s.add_category("Study").unwrap();
    s.add_category("Sleep").unwrap();
    s.adjust_score("Study", 4, today).unwrap();
    s.set_mission_target("Study", "read a book").unwrap();
    s.assign_stat(StatName::Mp, Some("Study")).unwrap();
    s.set_target("Study", 25.0).unwrap();
    s.state.categories[1].mission_points = 6;
    s.state.categories[1].past_score = 2;
    let before = s.state.category("Study").unwrap().clone();

    s.rename_category("Study", "Reading").unwrap();
    assert!(s.state.category("Study").is_none());
    let after = s.state.category("Reading").unwrap();
    assert_eq!(after.score, before.score);
    assert_eq!(after.past_score, before.past_score);
    assert_eq!(after.mission_points, before.mission_points);
    assert_eq!(after.mission, before.mission);
    assert_eq!(after.stat, Some(StatName::Mp));
    assert_eq!(after.target, 25);
    assert_eq!(s.state.position("Reading"), Some(1));

    let reloaded = reopen(&s, vec![]);
    assert_eq!(reloaded.state.category("Reading").unwrap().stat, Some(StatName::Mp));
    assert_eq!(reloaded.state.category("Reading").unwrap().mission_points, 6);
}

#[test]
fn weekly_rollover_scores_missions_once() {
    let week1 = date(2024, 3, 4);
    let week2 = date(2024, 3, 11);
    let mut s = new_session(vec![]);
    assert!(s.start(week1).is_none());
    assert_eq!(s.store().get(KEY_LAST_PERIOD).as_deref(), Some("202410"));

    s.add_category("Exercise").unwrap();
    s.add_category("Study").unwrap();
    s.add_category("Sleep").unwrap();
    s.adjust_score("Exercise", 7, week1).unwrap();
    s.state.categories[1].mission_points = 2;
    s.set_mission_target("Exercise", "run 3x").unwrap();
    s.set_mission_target("Study", "read").unwrap();

    // Next page load in a new week: Exercise cleared, Study cancelled.
    let mut s = reopen(&s, vec![Answer::YesNo(true), Answer::Cancel]);
    let summary = s.start(week2).unwrap();
    assert_eq!(summary.missions_cleared, 1);
    assert_eq!(summary.missions_failed, 1);

    let ex = s.state.category("Exercise").unwrap();
    assert_eq!(ex.past_score, 7);
    assert_eq!(ex.mission_points, 3);
    assert_eq!(ex.mission.status, MissionStatus::Unanswered);
    // Not answered by rollover: counted as a miss, floored at 0.
    assert_eq!(s.state.category("Study").unwrap().mission_points, 0);
    assert_eq!(s.state.category("Sleep").unwrap().mission_points, 0);

    // Same week again: nothing happens.
    let mut s = reopen(&s, vec![Answer::YesNo(true)]);
    assert!(s.start(week2).is_none());
    assert_eq!(s.state.category("Exercise").unwrap().mission_points, 3);
    assert!(s.prompt_mut().asked.is_empty());

    let raw = s.store().get(KEY_WEEKLY_MISSIONS).unwrap();
    assert!(raw.contains("\"targetText\":\"run 3x\""));
    assert!(raw.contains("\"cleared\":null"));
}

#[test]
fn mission_answered_mid_week_is_not_asked_again() {
    let week1 = date(2024, 3, 4);
    let mut s = new_session(vec![Answer::YesNo(false)]);
    s.start(week1);
    s.add_category("Exercise").unwrap();
    s.set_mission_target("Exercise", "run").unwrap();
    s.state.categories[0].mission_points = 8;
    assert_eq!(s.record_mission_outcome("Exercise").unwrap(), Some(false));

    let mut s = reopen(&s, vec![Answer::YesNo(true)]);
    s.start(date(2024, 3, 12)).unwrap();
    assert!(s.prompt_mut().asked.is_empty());
    assert_eq!(s.state.category("Exercise").unwrap().mission_points, 3);
}

#[test]
fn run_needs_a_stat_binding() {
    let mut s = new_session(vec![]);
    s.add_category("Exercise").unwrap();
    assert_eq!(s.start_run(), Err(TrackerError::NotConfigured));
    assert_eq!(s.attack(), Err(TrackerError::NoActiveBattle));
}

#[test]
fn checkpoint_survives_reload_and_resumes_run() {
    let today = date(2024, 3, 4);
    let mut s = new_session(vec![]);
    s.add_category("Exercise").unwrap();
    s.adjust_score("Exercise", 100, today).unwrap();
    s.assign_stat(StatName::Atk, Some("Exercise")).unwrap();
    s.start_run().unwrap();

    let mut saved = None;
    for _ in 0..5 {
        if let TurnOutcome::Victory { checkpoint, .. } = s.attack().unwrap() {
            saved = checkpoint.or(saved);
        }
    }
    assert_eq!(saved, Some(5));
    assert!(s.store().get(KEY_CHECKPOINT).is_some());

    let mut s = reopen(&s, vec![]);
    assert_eq!(s.state.battle.phase, BattlePhase::Idle);
    s.start_run().unwrap();
    assert_eq!(s.state.battle.stage, 5);
    assert_eq!(s.state.battle.currency, 90.0);
    assert!(s.notices().contains(&Notice::RunStarted {
        stage: 5,
        resumed: true
    }));
}

#[test]
fn defeat_halves_gold_then_returns_to_idle() {
    let today = date(2024, 3, 4);
    let mut s = new_session(vec![]);
    s.add_category("Sleep").unwrap();
    s.adjust_score("Sleep", 1, today).unwrap();
    s.assign_stat(StatName::Hp, Some("Sleep")).unwrap();
    s.start_run().unwrap();
    s.state.battle.currency = 100.0;
    s.state.battle.enemy.as_mut().unwrap().hp = 50;

    assert_eq!(s.attack().unwrap(), TurnOutcome::Defeat);
    assert_eq!(s.state.battle.currency, 50.0);
    assert_eq!(s.state.battle.player_hp, 1);
    assert_eq!(s.attack(), Err(TrackerError::NoActiveBattle));

    assert!(!s.tick_defeat_timer(500.0));
    assert!(s.tick_defeat_timer(1000.0));
    assert_eq!(s.state.battle.phase, BattlePhase::Idle);

    let reloaded = reopen(&s, vec![]);
    assert_eq!(reloaded.state.battle.currency, 50.0);
}

#[test]
fn upgrades_and_reset() {
    let mut s = new_session(vec![]);
    s.state.battle.currency = 100.0;
    assert_eq!(s.upgrade_stat(StatName::Atk).unwrap(), 1.1);
    assert_eq!(s.upgrade_stat(StatName::Atk).unwrap(), 1.2);
    assert!(matches!(
        s.upgrade_stat(StatName::Atk),
        Err(TrackerError::InsufficientFunds { .. })
    ));

    let reloaded = reopen(&s, vec![]);
    assert_eq!(reloaded.state.multipliers.get(StatName::Atk), 1.2);
    assert_eq!(reloaded.state.battle.currency, 40.0);

    s.reset_progress();
    let reloaded = reopen(&s, vec![]);
    assert_eq!(reloaded.state.multipliers.get(StatName::Atk), 1.0);
    assert_eq!(reloaded.state.battle.currency, 0.0);
    assert!(reloaded.store().get(KEY_CHECKPOINT).is_none());
}

#[test]
fn delete_drops_binding_and_recalculates_level() {
    let today = date(2024, 3, 4);
    let mut s = new_session(vec![Answer::Text("Study".into()), Answer::YesNo(true)]);
    s.add_category("Exercise").unwrap();
    s.add_category("Study").unwrap();
    s.adjust_score("Exercise", 6, today).unwrap();
    s.adjust_score("Study", 2, today).unwrap();
    s.assign_stat(StatName::Atk, Some("Exercise")).unwrap();
    s.assign_stat(StatName::Def, Some("Study")).unwrap();
    assert_eq!(s.state.level, 2);

    assert_eq!(s.delete_categories_prompted(), vec!["Study".to_string()]);
    assert!(s.state.bound_category(StatName::Def).is_none());
    assert_eq!(s.state.level, 6);
}
