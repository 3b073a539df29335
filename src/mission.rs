//! Weekly missions: one optional free-text goal per category, answered
//! once per period and scored at rollover.

use crate::error::{Result, TrackerError};
use crate::ports::Prompt;
use crate::state::{AppState, MissionStatus, Notice, MISSION_CLEAR_BONUS, MISSION_FAIL_PENALTY};

/// Store the goal text. An earlier answer for this period is kept.
pub fn set_mission_target(state: &mut AppState, category: &str, text: &str) -> Result<()> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TrackerError::EmptyInput("ミッション"));
    }
    let c = state
        .category_mut(category)
        .ok_or_else(|| TrackerError::unknown(category))?;
    c.mission.target = text.to_string();
    Ok(())
}

/// Remove the goal; the category drops out of answering and scoring.
pub fn clear_mission_target(state: &mut AppState, category: &str) -> Result<()> {
    let c = state
        .category_mut(category)
        .ok_or_else(|| TrackerError::unknown(category))?;
    c.mission.target.clear();
    c.mission.status = MissionStatus::Unanswered;
    Ok(())
}

/// Categories with a goal that still wait for this period's answer.
pub fn pending_missions(state: &AppState) -> Vec<String> {
    state
        .categories
        .iter()
        .filter(|c| c.mission.is_set() && c.mission.status == MissionStatus::Unanswered)
        .map(|c| c.name.clone())
        .collect()
}

/// Ask whether the category's goal was met, once per period.
///
/// Returns the recorded answer, or `None` when nothing was asked (no goal,
/// already answered) or the prompt was cancelled.
pub fn record_mission_outcome<P: Prompt + ?Sized>(
    state: &mut AppState,
    category: &str,
    prompt: &mut P,
) -> Result<Option<bool>> {
    let c = state
        .category(category)
        .ok_or_else(|| TrackerError::unknown(category))?;
    if !c.mission.is_set() || c.mission.status != MissionStatus::Unanswered {
        return Ok(None);
    }

    let question = format!(
        "【{}】今週のミッション「{}」は達成できましたか？",
        c.name, c.mission.target
    );
    let cleared = match prompt.ask_yes_no(&question) {
        Some(b) => b,
        None => return Ok(None),
    };

    if let Some(c) = state.category_mut(category) {
        c.mission.status = if cleared {
            MissionStatus::Cleared
        } else {
            MissionStatus::NotCleared
        };
    }
    state.push_notice(Notice::MissionAnswered {
        category: category.to_string(),
        cleared,
    });
    Ok(Some(cleared))
}

/// Walk every pending mission through the prompt. Returns how many got answered.
pub fn collect_outcomes<P: Prompt + ?Sized>(state: &mut AppState, prompt: &mut P) -> usize {
    let mut answered = 0;
    for name in pending_missions(state) {
        if let Ok(Some(_)) = record_mission_outcome(state, &name, prompt) {
            answered += 1;
        }
    }
    answered
}

/// Rollover scoring: +3 for a cleared goal, -5 (floored at 0) for anything
/// else, then every answer is reset. Returns (cleared, failed).
pub fn score_missions(state: &mut AppState) -> (usize, usize) {
    let mut cleared = 0;
    let mut failed = 0;
    for c in state.categories.iter_mut() {
        if c.mission.is_set() {
            if c.mission.status == MissionStatus::Cleared {
                c.mission_points = c.mission_points.saturating_add(MISSION_CLEAR_BONUS);
                cleared += 1;
            } else {
                c.mission_points = c.mission_points.saturating_sub(MISSION_FAIL_PENALTY);
                failed += 1;
            }
        }
        c.mission.status = MissionStatus::Unanswered;
    }
    (cleared, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::add_category;
    use crate::ports::{Answer, ScriptedPrompt};

    fn setup() -> AppState {
        let mut s = AppState::new();
        add_category(&mut s, "Exercise").unwrap();
        add_category(&mut s, "Study").unwrap();
        s
    }

    #[test]
    fn set_target_keeps_answer() {
        let mut s = setup();
        set_mission_target(&mut s, "Exercise", "run 3x").unwrap();
        s.categories[0].mission.status = MissionStatus::Cleared;
        set_mission_target(&mut s, "Exercise", "run 4x").unwrap();
        assert_eq!(s.categories[0].mission.target, "run 4x");
        assert_eq!(s.categories[0].mission.status, MissionStatus::Cleared);
    }

    #[test]
    fn set_target_rejects_blank_and_unknown() {
        let mut s = setup();
        assert_eq!(
            set_mission_target(&mut s, "Exercise", "  "),
            Err(TrackerError::EmptyInput("ミッション"))
        );
        assert_eq!(
            set_mission_target(&mut s, "Nope", "x"),
            Err(TrackerError::unknown("Nope"))
        );
    }

    #[test]
    fn outcome_asked_once() {
        let mut s = setup();
        set_mission_target(&mut s, "Exercise", "run 3x").unwrap();
        let mut p = ScriptedPrompt::new([Answer::YesNo(true), Answer::YesNo(false)]);
        assert_eq!(
            record_mission_outcome(&mut s, "Exercise", &mut p).unwrap(),
            Some(true)
        );
        assert_eq!(
            record_mission_outcome(&mut s, "Exercise", &mut p).unwrap(),
            None
        );
        assert_eq!(p.asked.len(), 1);
        assert_eq!(s.categories[0].mission.status, MissionStatus::Cleared);
    }

    #[test]
    fn no_target_is_never_asked() {
        let mut s = setup();
        let mut p = ScriptedPrompt::new([Answer::YesNo(true)]);
        assert_eq!(record_mission_outcome(&mut s, "Study", &mut p).unwrap(), None);
        assert!(p.asked.is_empty());
    }

    #[test]
    fn cancelled_prompt_stays_unanswered() {
        let mut s = setup();
        set_mission_target(&mut s, "Exercise", "run").unwrap();
        let mut p = ScriptedPrompt::new([Answer::Cancel]);
        assert_eq!(
            record_mission_outcome(&mut s, "Exercise", &mut p).unwrap(),
            None
        );
        assert_eq!(pending_missions(&s), vec!["Exercise".to_string()]);
    }

    #[test]
    fn collect_walks_pending_only() {
        let mut s = setup();
        set_mission_target(&mut s, "Exercise", "run").unwrap();
        set_mission_target(&mut s, "Study", "read").unwrap();
        s.categories[1].mission.status = MissionStatus::NotCleared;
        let mut p = ScriptedPrompt::new([Answer::YesNo(true)]);
        assert_eq!(collect_outcomes(&mut s, &mut p), 1);
        assert_eq!(p.asked.len(), 1);
        assert!(pending_missions(&s).is_empty());
    }

    #[test]
    fn scoring_bonus_penalty_and_floor() {
        let mut s = setup();
        add_category(&mut s, "Sleep").unwrap();
        set_mission_target(&mut s, "Exercise", "run").unwrap();
        set_mission_target(&mut s, "Study", "read").unwrap();
        s.categories[0].mission.status = MissionStatus::Cleared;
        s.categories[1].mission.status = MissionStatus::NotCleared;
        s.categories[1].mission_points = 2;
        s.categories[2].mission_points = 4; // no goal: untouched

        assert_eq!(score_missions(&mut s), (1, 1));
        assert_eq!(s.categories[0].mission_points, 3);
        assert_eq!(s.categories[1].mission_points, 0);
        assert_eq!(s.categories[2].mission_points, 4);
        for c in &s.categories {
            assert_eq!(c.mission.status, MissionStatus::Unanswered);
        }
    }

    #[test]
    fn unanswered_at_rollover_is_a_failure() {
        let mut s = setup();
        set_mission_target(&mut s, "Exercise", "run").unwrap();
        s.categories[0].mission_points = 8;
        assert_eq!(score_missions(&mut s), (0, 1));
        assert_eq!(s.categories[0].mission_points, 3);
    }

    #[test]
    fn clear_target_drops_mission() {
        let mut s = setup();
        set_mission_target(&mut s, "Exercise", "run").unwrap();
        clear_mission_target(&mut s, "Exercise").unwrap();
        assert!(pending_missions(&s).is_empty());
        assert_eq!(score_missions(&mut s), (0, 0));
    }
}
