/// Session update: turns player commands into board steps and mode changes.
///
/// Processing order for one directional input while playing:
///   1. Reset the last-step flags
///   2. Movement resolution (`movement::step`)
///   3. Rule re-parse
///   4. Flag storage, move count, events
///   5. Camera
///
/// Mode transitions:
///
/// ┌──────────┬────────────────┬────────────────────────────┐
/// │ Mode     │ Command        │ Effect                     │
/// ├──────────┼────────────────┼────────────────────────────┤
/// │ Title    │ Confirm        │ load start level → Playing │
/// │ Playing  │ Move(dir)      │ update; win → Win,         │
/// │          │                │ death → Dead               │
/// │ Playing  │ Restart        │ reload level               │
/// │ Playing  │ Cancel / Menu  │ → Menu                     │
/// │ Win      │ Confirm        │ next level (wraps)         │
/// │ Dead     │ Confirm        │ → Title                    │
/// │ Dead     │ Restart        │ reload level → Playing     │
/// │ Menu     │ Move(up/down)  │ cursor                     │
/// │ Menu     │ Move(lt/rt)    │ volume ±8                  │
/// │ Menu     │ Confirm        │ toggle sound (Sound item)  │
/// │ Menu     │ Cancel / Menu  │ → Playing                  │
/// └──────────┴────────────────┴────────────────────────────┘

use log::{debug, info};

use crate::domain::movement::{self, Direction};
use crate::domain::rules;
use crate::error::{Error, Result};
use super::event::GameEvent;
use super::level::{build_board, LevelCatalogue};
use super::world::{GameState, MenuItem, Mode, VOLUME_STEP};

/// Ticks the level name stays on screen after loading.
const LEVEL_MESSAGE_TICKS: u32 = 80;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Move(Direction),
    Confirm,
    Cancel,
    Restart,
    Menu,
}

// ══════════════════════════════════════════════════════════════
// Main entry points
// ══════════════════════════════════════════════════════════════

/// One step of play in `dir`. `Direction::None` only clears the flags.
pub fn update(state: &mut GameState, dir: Direction) -> Vec<GameEvent> {
    state.has_won = false;
    state.has_died = false;
    if dir == Direction::None { return vec![]; }

    let mut events = Vec::new();
    let result = movement::step(&mut state.board, &state.props, dir);
    rules::parse(&state.board, &mut state.props);

    if result.moved {
        state.moves += 1;
        events.push(GameEvent::Moved);
    }
    if result.pushed {
        events.push(GameEvent::Pushed);
    }
    if result.absorbed > 0 {
        events.push(GameEvent::Absorbed { count: result.absorbed });
    }

    let now = rules::active_rules(&state.board);
    if now != state.rules {
        debug!(
            "[Rules] {}",
            now.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", ")
        );
        state.rules = now;
        events.push(GameEvent::RulesChanged);
    }

    state.has_won = result.has_won;
    state.has_died = result.has_died;
    if state.has_won {
        info!("[Session] level {} won in {} moves", state.level_index, state.moves);
        events.push(GameEvent::Won);
    }
    if state.has_died {
        info!("[Session] died on level {}", state.level_index);
        events.push(GameEvent::Died);
    }

    state.update_camera();
    events
}

/// Feed one command through the mode machine.
pub fn apply(
    state: &mut GameState,
    catalogue: &LevelCatalogue,
    cmd: Command,
) -> Result<Vec<GameEvent>> {
    let mut events = Vec::new();
    match (state.mode, cmd) {
        (Mode::Title, Command::Confirm) => {
            let start = state.start_level;
            events.extend(load_level(state, catalogue, start)?);
        }
        (Mode::Playing, Command::Move(dir)) => {
            events = update(state, dir);
            if state.has_won {
                state.mode = Mode::Win;
            } else if state.has_died {
                state.mode = Mode::Dead;
            }
        }
        (Mode::Playing, Command::Restart) | (Mode::Dead, Command::Restart) => {
            events.extend(restart(state, catalogue)?);
        }
        (Mode::Playing, Command::Cancel) | (Mode::Playing, Command::Menu) => {
            state.mode = Mode::Menu;
        }
        (Mode::Win, Command::Confirm) => {
            events.extend(win_continue(state, catalogue)?);
        }
        (Mode::Dead, Command::Confirm) => {
            state.mode = Mode::Title;
        }
        (Mode::Menu, Command::Move(dir)) => menu_move(state, dir),
        (Mode::Menu, Command::Confirm) => {
            if state.menu_item() == MenuItem::Sound {
                state.audio.adjust(MenuItem::Sound, 0);
            }
        }
        (Mode::Menu, Command::Cancel) | (Mode::Menu, Command::Menu) => {
            state.mode = Mode::Playing;
        }
        _ => {}
    }
    Ok(events)
}

/// Advance to the next level, wrapping to the first after the last.
pub fn win_continue(state: &mut GameState, catalogue: &LevelCatalogue) -> Result<Vec<GameEvent>> {
    let next = catalogue.next_index(state.level_index);
    load_level(state, catalogue, next)
}

/// Reload the current level from its definition.
pub fn restart(state: &mut GameState, catalogue: &LevelCatalogue) -> Result<Vec<GameEvent>> {
    let current = state.level_index;
    load_level(state, catalogue, current)
}

/// Build the board for `index` (wrapped into range) and start playing it.
pub fn load_level(
    state: &mut GameState,
    catalogue: &LevelCatalogue,
    index: usize,
) -> Result<Vec<GameEvent>> {
    if catalogue.is_empty() {
        return Err(Error::NoLevels);
    }
    let index = index % catalogue.len();
    let def = catalogue.get(index).ok_or(Error::NoLevels)?;

    state.board = build_board(def, state.grid)?;
    rules::parse(&state.board, &mut state.props);
    state.rules = rules::active_rules(&state.board);
    state.level_index = index;
    state.level_name = def.name.clone();
    state.moves = 0;
    state.has_won = false;
    state.has_died = false;
    state.mode = Mode::Playing;
    state.set_message(&def.name, LEVEL_MESSAGE_TICKS);
    state.pan_camera(0, 0);
    state.update_camera();

    info!(
        "[Session] level {} \"{}\" loaded ({}x{}, {} rule(s))",
        index, def.name, def.width, def.height, state.rules.len()
    );
    Ok(vec![GameEvent::LevelLoaded { index }])
}

// ══════════════════════════════════════════════════════════════
// Menu
// ══════════════════════════════════════════════════════════════

fn menu_move(state: &mut GameState, dir: Direction) {
    match dir {
        Direction::Up => state.move_menu_cursor(-1),
        Direction::Down => state.move_menu_cursor(1),
        Direction::Left | Direction::Right => {
            let item = state.menu_item();
            if item != MenuItem::Sound {
                let delta = if dir == Direction::Left { -VOLUME_STEP } else { VOLUME_STEP };
                state.audio.adjust(item, delta);
            }
        }
        Direction::None => {}
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::object::ObjectClass;
    use crate::sim::level::{LevelDef, LevelSource};

    fn level(name: &str, rows: &[&str]) -> LevelDef {
        LevelDef::from_rows(name, rows).unwrap()
    }

    fn catalogue(defs: Vec<LevelDef>) -> LevelCatalogue {
        LevelCatalogue::new(defs, LevelSource::Embedded).unwrap()
    }

    fn win_and_lose() -> LevelCatalogue {
        catalogue(vec![
            level("Win", &["B=Y", "F=!", "bf."]),
            level("Lose", &["B=Y", "L=K", "bl."]),
        ])
    }

    fn playing(cat: &LevelCatalogue, index: usize) -> GameState {
        let mut state = GameState::new(&GameConfig::default());
        load_level(&mut state, cat, index).unwrap();
        state
    }

    #[test]
    fn load_sets_up_the_level() {
        let cat = win_and_lose();
        let state = playing(&cat, 1);
        assert_eq!(state.mode, Mode::Playing);
        assert_eq!(state.level_index, 1);
        assert_eq!(state.level_name, "Lose");
        assert_eq!(state.message, "Lose");
        assert!(state.props[ObjectClass::Baba].you);
        assert!(state.props[ObjectClass::Lava].kill);
        assert_eq!(state.rules.len(), 2);
    }

    #[test]
    fn restart_clears_camera_pan() {
        let cat = win_and_lose();
        let mut state = playing(&cat, 0);
        state.pan_camera(2, 1);
        assert_eq!((state.camera.pan_x, state.camera.pan_y), (2, 1));
        restart(&mut state, &cat).unwrap();
        assert_eq!((state.camera.pan_x, state.camera.pan_y), (0, 0));
    }

    #[test]
    fn load_wraps_out_of_range_index() {
        let cat = win_and_lose();
        let state = playing(&cat, 5);
        assert_eq!(state.level_index, 1);
    }

    #[test]
    fn no_direction_only_clears_flags() {
        let cat = win_and_lose();
        let mut state = playing(&cat, 0);
        state.has_won = true;
        let board = state.board.clone();
        let events = update(&mut state, Direction::None);
        assert!(events.is_empty());
        assert!(!state.has_won);
        assert_eq!(state.board, board);
        assert_eq!(state.moves, 0);
    }

    #[test]
    fn reaching_flag_wins() {
        let cat = win_and_lose();
        let mut state = playing(&cat, 0);
        let events = apply(&mut state, &cat, Command::Move(Direction::Right)).unwrap();
        assert!(events.contains(&GameEvent::Moved));
        assert!(events.contains(&GameEvent::Won));
        assert!(state.has_won);
        assert_eq!(state.mode, Mode::Win);
        assert_eq!(state.moves, 1);
    }

    #[test]
    fn win_continue_wraps_to_first_level() {
        let cat = win_and_lose();
        let mut state = playing(&cat, 0);
        win_continue(&mut state, &cat).unwrap();
        assert_eq!(state.level_index, 1);
        win_continue(&mut state, &cat).unwrap();
        assert_eq!(state.level_index, 0);
        assert_eq!(state.mode, Mode::Playing);
    }

    #[test]
    fn confirm_after_win_loads_next_level() {
        let cat = win_and_lose();
        let mut state = playing(&cat, 0);
        apply(&mut state, &cat, Command::Move(Direction::Right)).unwrap();
        let events = apply(&mut state, &cat, Command::Confirm).unwrap();
        assert_eq!(events, vec![GameEvent::LevelLoaded { index: 1 }]);
        assert_eq!(state.mode, Mode::Playing);
        assert!(!state.has_won);
    }

    #[test]
    fn touching_kill_dies_and_restart_restores() {
        let cat = win_and_lose();
        let mut state = playing(&cat, 1);
        let fresh = state.board.clone();

        let events = apply(&mut state, &cat, Command::Move(Direction::Right)).unwrap();
        assert!(events.contains(&GameEvent::Died));
        assert_eq!(state.mode, Mode::Dead);

        // Moves are ignored while dead.
        let board = state.board.clone();
        apply(&mut state, &cat, Command::Move(Direction::Right)).unwrap();
        assert_eq!(state.board, board);

        apply(&mut state, &cat, Command::Restart).unwrap();
        assert_eq!(state.mode, Mode::Playing);
        assert_eq!(state.board, fresh);
        assert_eq!(state.moves, 0);
    }

    #[test]
    fn confirm_while_dead_returns_to_title() {
        let cat = win_and_lose();
        let mut state = playing(&cat, 1);
        apply(&mut state, &cat, Command::Move(Direction::Right)).unwrap();
        apply(&mut state, &cat, Command::Confirm).unwrap();
        assert_eq!(state.mode, Mode::Title);
    }

    #[test]
    fn title_confirm_starts_configured_level() {
        let cat = win_and_lose();
        let mut state = GameState::new(&GameConfig::default());
        state.start_level = 1;
        assert_eq!(state.mode, Mode::Title);
        apply(&mut state, &cat, Command::Move(Direction::Right)).unwrap();
        assert_eq!(state.mode, Mode::Title);
        apply(&mut state, &cat, Command::Confirm).unwrap();
        assert_eq!(state.mode, Mode::Playing);
        assert_eq!(state.level_index, 1);
    }

    #[test]
    fn pushing_a_word_reports_rule_change() {
        let cat = catalogue(vec![level("Push", &["...", "B=Y", "..b"])]);
        let mut state = playing(&cat, 0);
        let events = update(&mut state, Direction::Up);
        assert!(events.contains(&GameEvent::Pushed));
        assert!(events.contains(&GameEvent::RulesChanged));
        assert!(state.rules.is_empty());
        assert!(!state.props[ObjectClass::Baba].you);
    }

    #[test]
    fn absorbed_count_is_reported() {
        let cat = catalogue(vec![level("Sink", &["B=Y.", "R=P.", "G=N.", "brg."])]);
        let mut state = playing(&cat, 0);
        let events = update(&mut state, Direction::Right);
        assert!(events.contains(&GameEvent::Absorbed { count: 1 }));
        assert_eq!(state.board.count(ObjectClass::Goop), 0);
    }

    #[test]
    fn blocked_step_does_not_count() {
        let cat = catalogue(vec![level("Wall", &["B=Y", "W=S", "bw."])]);
        let mut state = playing(&cat, 0);
        let events = update(&mut state, Direction::Right);
        assert!(events.is_empty());
        assert_eq!(state.moves, 0);
    }

    #[test]
    fn menu_adjusts_audio() {
        let cat = win_and_lose();
        let mut state = playing(&cat, 0);
        let sfx = state.audio.sfx_volume;

        apply(&mut state, &cat, Command::Menu).unwrap();
        assert_eq!(state.mode, Mode::Menu);

        apply(&mut state, &cat, Command::Confirm).unwrap();
        assert!(!state.audio.enabled);

        apply(&mut state, &cat, Command::Move(Direction::Down)).unwrap();
        apply(&mut state, &cat, Command::Move(Direction::Right)).unwrap();
        assert_eq!(state.audio.sfx_volume, sfx + 8);
        apply(&mut state, &cat, Command::Move(Direction::Left)).unwrap();
        apply(&mut state, &cat, Command::Move(Direction::Left)).unwrap();
        assert_eq!(state.audio.sfx_volume, sfx - 8);

        // The board does not move while the menu is open.
        assert_eq!(state.moves, 0);

        apply(&mut state, &cat, Command::Cancel).unwrap();
        assert_eq!(state.mode, Mode::Playing);
    }
}
