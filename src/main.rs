//! Habit Quest composition root.
//!
//! Native builds run a line-based console backed by a JSON file; the wasm
//! build wires `localStorage` and the browser dialogs and leaves drawing to
//! the page.

#[cfg(not(target_arch = "wasm32"))]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "habit_quest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    #[cfg(target_arch = "wasm32")]
    tracing_wasm::set_as_global_default();

    tracing::info!("Starting Habit Quest");

    #[cfg(not(target_arch = "wasm32"))]
    console::run();

    #[cfg(target_arch = "wasm32")]
    browser::run();
}

#[cfg(target_arch = "wasm32")]
mod browser {
    use habit_quest::ports::{KeyValueStore, MemoryStore};
    use habit_quest::web::{self, BrowserPrompt, LocalStore};
    use habit_quest::Session;

    pub fn run() {
        match LocalStore::open() {
            Some(store) => start(store),
            None => {
                tracing::warn!("localStorage unavailable, progress will not be kept");
                start(MemoryStore::new());
            }
        }
    }

    fn start<S: KeyValueStore>(store: S) {
        let Some(today) = web::today() else {
            tracing::warn!("could not read the local date");
            return;
        };
        let mut session = Session::new(store, BrowserPrompt);
        if let Some(summary) = session.start(today) {
            tracing::info!(?summary, "rollover applied");
        }
        tracing::info!(
            categories = session.state.categories.len(),
            level = session.state.level,
            "session ready"
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod console {
    use std::io::{self, BufRead, Write};
    use std::time::Instant;

    use chrono::{Local, NaiveDate};
    use habit_quest::battle::{max_hp, TurnOutcome};
    use habit_quest::ledger::{radar_series, trend, Trend};
    use habit_quest::ports::{JsonFileStore, Prompt};
    use habit_quest::progression::{assignments, compute_stats, upgrade_cost};
    use habit_quest::state::BattlePhase;
    use habit_quest::{Session, StatName};

    const DATA_ENV: &str = "HABIT_QUEST_DATA";
    const DEFAULT_DATA_FILE: &str = "habit-quest.json";

    const HELP: &str = "\
コマンド:
  ls                    一覧表示
  add [名前]            カテゴリ追加
  rename <名前>         名前変更
  del                   カテゴリ削除 (空白区切りで複数可)
  sort                  名前順に並べ替え
  move <名前> <位置の名前>  並べ替え
  + <名前> / - <名前>   スコア±1
  target <名前>         目標値を設定
  mission <名前>        今週のミッションを設定
  answer <名前>         ミッションの達成報告
  assign <STAT> <名前|->  ステータス割り当て
  upgrade <STAT>        ステータス強化
  run / a / potion / heal / reset   バトル
  quit";

    /// Reads answers from stdin. EOF or an empty line counts as cancel.
    pub struct StdinPrompt;

    /// One raw line without its terminator; `None` at end of input.
    fn read_raw(prompt: &str) -> Option<String> {
        print!("{} ", prompt);
        let _ = io::stdout().flush();
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    fn read_line(prompt: &str) -> Option<String> {
        read_raw(prompt).filter(|l| !l.trim().is_empty())
    }

    impl Prompt for StdinPrompt {
        fn ask_yes_no(&mut self, question: &str) -> Option<bool> {
            let answer = read_line(&format!("{} [y/n]", question))?;
            match answer.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" | "はい" => Some(true),
                "n" | "no" | "いいえ" => Some(false),
                _ => None,
            }
        }

        fn ask_text(&mut self, prompt: &str) -> Option<String> {
            read_line(prompt)
        }

        fn ask_number(&mut self, prompt: &str) -> Option<f64> {
            read_line(prompt)?.trim().parse().ok()
        }
    }

    type ConsoleSession = Session<JsonFileStore, StdinPrompt>;

    pub fn run() {
        let path = std::env::var(DATA_ENV).unwrap_or_else(|_| DEFAULT_DATA_FILE.to_string());
        tracing::info!(path = %path, "using data file");
        let mut session = Session::new(JsonFileStore::open(path), StdinPrompt);

        if let Some(summary) = session.start(today()) {
            println!(
                "週が変わりました！ ミッション達成 {} / 未達成 {}",
                summary.missions_cleared, summary.missions_failed
            );
        }
        print_status(&session);
        println!("{}", HELP);

        let mut last_tick = Instant::now();
        while let Some(line) = read_raw(">") {
            let elapsed = last_tick.elapsed().as_secs_f64() * 1000.0;
            last_tick = Instant::now();
            if session.tick_defeat_timer(elapsed) {
                println!("(待機画面に戻りました)");
            }

            let words: Vec<&str> = line.split_whitespace().collect();
            if words.first() == Some(&"quit") {
                break;
            }
            if let Err(e) = dispatch(&mut session, &words) {
                println!("エラー: {}", e);
            }

            for notice in session.notices() {
                println!("  {}", notice);
            }
            session.state.log.clear();
        }
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    fn stat_arg(word: Option<&&str>) -> Option<StatName> {
        word.and_then(|w| StatName::from_label(&w.to_ascii_uppercase()))
    }

    fn dispatch(session: &mut ConsoleSession, words: &[&str]) -> habit_quest::Result<()> {
        let arg = words.get(1).copied();
        match words.first().copied() {
            Some("ls") => print_status(session),
            Some("help") => println!("{}", HELP),
            Some("add") => match arg {
                Some(_) => session.add_category(&words[1..].join(" "))?,
                None => {
                    session.add_category_prompted()?;
                }
            },
            Some("rename") => {
                if let Some(name) = arg {
                    session.rename_category_prompted(name)?;
                }
            }
            Some("del") => {
                let removed = session.delete_categories_prompted();
                if !removed.is_empty() {
                    println!("削除: {}", removed.join(", "));
                }
            }
            Some("sort") => session.sort_categories(),
            Some("move") => {
                if let (Some(moved), Some(target)) = (arg, words.get(2)) {
                    session.reorder_category(moved, target);
                }
            }
            Some(sign @ ("+" | "-")) => {
                if let Some(name) = arg {
                    let delta = if sign == "+" { 1 } else { -1 };
                    let score = session.adjust_score(name, delta, today())?;
                    println!("{}: {} pt", name, score);
                }
            }
            Some("target") => {
                if let Some(name) = arg {
                    session.set_target_prompted(name)?;
                }
            }
            Some("mission") => {
                if let Some(name) = arg {
                    session.set_mission_prompted(name)?;
                }
            }
            Some("answer") => {
                if let Some(name) = arg {
                    session.record_mission_outcome(name)?;
                }
            }
            Some("assign") => {
                if let Some(stat) = stat_arg(words.get(1)) {
                    let target = words.get(2).copied().filter(|w| *w != "-");
                    session.assign_stat(stat, target)?;
                }
            }
            Some("upgrade") => {
                if let Some(stat) = stat_arg(words.get(1)) {
                    session.upgrade_stat(stat)?;
                }
            }
            Some("run") => session.start_run()?,
            Some("a") | Some("attack") => match session.attack()? {
                TurnOutcome::Continue | TurnOutcome::Victory { .. } => print_battle(session),
                TurnOutcome::Defeat => {}
            },
            Some("potion") => {
                session.buy_potion()?;
            }
            Some("heal") => {
                session.heal_with_mp()?;
            }
            Some("reset") => session.reset_progress(),
            Some(other) => println!("不明なコマンド: {}", other),
            None => {}
        }
        Ok(())
    }

    fn print_status(session: &ConsoleSession) {
        let state = &session.state;
        let series = radar_series(state);
        println!("── カテゴリ ──");
        for (i, label) in series.labels.iter().enumerate() {
            let mark = match trend(state, label) {
                Some(Trend::Up) => "↑",
                Some(Trend::Down) => "↓",
                _ => "→",
            };
            println!(
                "  {}: {} pt (先週 {}) {}",
                label, series.current[i], series.past[i], mark
            );
        }
        println!("── ステータス (Lv.{}) ──", state.level);
        let stats = compute_stats(state);
        for (stat, bound) in assignments(state) {
            let m = state.multipliers.get(stat);
            println!(
                "  {:<3} {:>4}  x{:.1} (次 {}G)  {}",
                stat,
                stats.get(stat),
                m,
                upgrade_cost(m),
                bound.as_deref().unwrap_or("-")
            );
        }
        println!("  所持金 {}G", state.battle.currency);
        if let Some(cp) = &state.battle.checkpoint {
            println!("  セーブポイント: ステージ{}", cp.stage + 1);
        }
    }

    fn print_battle(session: &ConsoleSession) {
        let state = &session.state;
        if state.battle.phase != BattlePhase::InBattle {
            return;
        }
        let stats = compute_stats(state);
        if let Some(enemy) = &state.battle.enemy {
            println!(
                "  [ステージ{}] {} HP {}/{}  |  あなた HP {}/{} MP {}",
                state.battle.stage + 1,
                enemy.name,
                enemy.hp,
                enemy.max_hp,
                state.battle.player_hp,
                max_hp(&stats),
                state.battle.player_mp
            );
        }
    }
}
