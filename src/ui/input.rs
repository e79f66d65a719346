/// Input state tracker.
///
/// Tracks which keys are currently held down, enabling:
///   - Edge-triggered commands (confirm, restart, menu)
///   - One step per direction press, with auto-repeat while held
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use babagrid::domain::movement::Direction;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// ── Key Constants ──

pub const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
pub const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
pub const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
pub const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
pub const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
pub const KEYS_CANCEL: &[KeyCode] = &[KeyCode::Esc];
pub const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
pub const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];
pub const KEYS_PAN_LEFT: &[KeyCode] = &[KeyCode::Char('j'), KeyCode::Char('J')];
pub const KEYS_PAN_RIGHT: &[KeyCode] = &[KeyCode::Char('l'), KeyCode::Char('L')];
pub const KEYS_PAN_UP: &[KeyCode] = &[KeyCode::Char('i'), KeyCode::Char('I')];
pub const KEYS_PAN_DOWN: &[KeyCode] = &[KeyCode::Char('k'), KeyCode::Char('K')];

/// Direction keys in priority order.
const DIRECTION_KEYS: [(&[KeyCode], Direction); 4] = [
    (KEYS_UP, Direction::Up),
    (KEYS_DOWN, Direction::Down),
    (KEYS_LEFT, Direction::Left),
    (KEYS_RIGHT, Direction::Right),
];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.handle_key(key);
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn handle_key(&mut self, key: KeyEvent) {
        self.raw_events.push(key);

        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {
                // Not trusted without enhancement; expiry handles it
            }
            _ => {
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, Instant::now());
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .is_some_and(|t| t.elapsed() < HOLD_TIMEOUT)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Direction whose key was freshly pressed this frame.
    pub fn pressed_direction(&self) -> Direction {
        DIRECTION_KEYS
            .iter()
            .find(|(keys, _)| self.any_pressed(keys))
            .map_or(Direction::None, |&(_, d)| d)
    }

    /// Direction whose key is currently held.
    pub fn held_direction(&self) -> Direction {
        DIRECTION_KEYS
            .iter()
            .find(|(keys, _)| self.any_held(keys))
            .map_or(Direction::None, |&(_, d)| d)
    }

    /// Camera pan step from the held IJKL keys.
    pub fn held_pan(&self) -> (i32, i32) {
        let axis = |neg: &[KeyCode], pos: &[KeyCode]| {
            self.any_held(pos) as i32 - self.any_held(neg) as i32
        };
        (axis(KEYS_PAN_LEFT, KEYS_PAN_RIGHT), axis(KEYS_PAN_UP, KEYS_PAN_DOWN))
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

/// Turns "pressed" and "held" directions into discrete steps: one on the
/// press, then one every `period` while the same direction stays held.
///
/// The first repeat waits at least `HOLD_TIMEOUT`: without Release events a
/// tapped key still reads as held until then, and must not step twice.
pub struct DirectionRepeat {
    period: Duration,
    delay: Duration,
    current: Direction,
    next_fire: Option<Instant>,
}

impl DirectionRepeat {
    pub fn new(period: Duration) -> Self {
        DirectionRepeat {
            period,
            delay: period.max(HOLD_TIMEOUT),
            current: Direction::None,
            next_fire: None,
        }
    }

    pub fn poll(&mut self, pressed: Direction, held: Direction, now: Instant) -> Direction {
        if pressed != Direction::None {
            return self.fire(pressed, now + self.delay);
        }
        if held == Direction::None {
            self.current = Direction::None;
            self.next_fire = None;
            return Direction::None;
        }
        if held != self.current {
            return self.fire(held, now + self.delay);
        }
        match self.next_fire {
            Some(t) if now >= t => self.fire(held, now + self.period),
            _ => Direction::None,
        }
    }

    fn fire(&mut self, dir: Direction, next: Instant) -> Direction {
        self.current = dir;
        self.next_fire = Some(next);
        dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn press_fires_once_then_repeats_after_hold_timeout() {
        let t0 = Instant::now();
        let mut rep = DirectionRepeat::new(140 * MS);
        assert_eq!(rep.poll(Direction::Left, Direction::Left, t0), Direction::Left);
        assert_eq!(rep.poll(Direction::None, Direction::Left, t0 + 25 * MS), Direction::None);
        assert_eq!(rep.poll(Direction::None, Direction::Left, t0 + 150 * MS), Direction::None);
        assert_eq!(rep.poll(Direction::None, Direction::Left, t0 + 160 * MS), Direction::Left);
        assert_eq!(rep.poll(Direction::None, Direction::Left, t0 + 250 * MS), Direction::None);
        assert_eq!(rep.poll(Direction::None, Direction::Left, t0 + 300 * MS), Direction::Left);
    }

    #[test]
    fn long_period_is_kept_for_first_repeat() {
        let t0 = Instant::now();
        let mut rep = DirectionRepeat::new(400 * MS);
        rep.poll(Direction::Up, Direction::Up, t0);
        assert_eq!(rep.poll(Direction::None, Direction::Up, t0 + 399 * MS), Direction::None);
        assert_eq!(rep.poll(Direction::None, Direction::Up, t0 + 400 * MS), Direction::Up);
    }

    #[test]
    fn single_tap_steps_once() {
        // No Release events: the tapped key reads as held until HOLD_TIMEOUT
        // after the press. Ticks every 25 ms, first one 5 ms after the press.
        let t0 = Instant::now();
        let mut rep = DirectionRepeat::new(140 * MS);
        let mut steps = 0;
        let mut ms = 5;
        while ms < 400 {
            let since = Duration::from_millis(ms);
            let pressed = if ms == 5 { Direction::Right } else { Direction::None };
            let held = if since < HOLD_TIMEOUT { Direction::Right } else { Direction::None };
            if rep.poll(pressed, held, t0 + since) != Direction::None {
                steps += 1;
            }
            ms += 25;
        }
        assert_eq!(steps, 1);
    }

    #[test]
    fn release_stops_repeat() {
        let t0 = Instant::now();
        let mut rep = DirectionRepeat::new(100 * MS);
        rep.poll(Direction::Up, Direction::Up, t0);
        assert_eq!(rep.poll(Direction::None, Direction::None, t0 + 50 * MS), Direction::None);
        assert_eq!(rep.poll(Direction::None, Direction::None, t0 + 200 * MS), Direction::None);
    }

    #[test]
    fn new_press_fires_immediately() {
        let t0 = Instant::now();
        let mut rep = DirectionRepeat::new(100 * MS);
        rep.poll(Direction::Up, Direction::Up, t0);
        assert_eq!(rep.poll(Direction::Up, Direction::Up, t0 + 10 * MS), Direction::Up);
        assert_eq!(rep.poll(Direction::Right, Direction::Right, t0 + 20 * MS), Direction::Right);
    }

    #[test]
    fn change_of_held_direction_fires() {
        let t0 = Instant::now();
        let mut rep = DirectionRepeat::new(100 * MS);
        rep.poll(Direction::Up, Direction::Up, t0);
        assert_eq!(rep.poll(Direction::None, Direction::Down, t0 + 10 * MS), Direction::Down);
    }

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, kind)
    }

    #[test]
    fn release_ends_hold_when_honored() {
        let mut kb = InputState::new();
        kb.honor_release = true;
        kb.handle_key(key(KeyCode::Left, KeyEventKind::Press));
        assert_eq!(kb.pressed_direction(), Direction::Left);
        assert_eq!(kb.held_direction(), Direction::Left);
        kb.handle_key(key(KeyCode::Left, KeyEventKind::Release));
        assert_eq!(kb.held_direction(), Direction::None);
    }

    #[test]
    fn release_ignored_without_enhancement() {
        let mut kb = InputState::new();
        kb.handle_key(key(KeyCode::Char('w'), KeyEventKind::Press));
        kb.handle_key(key(KeyCode::Char('w'), KeyEventKind::Release));
        assert_eq!(kb.held_direction(), Direction::Up);
    }

    #[test]
    fn repeat_event_is_not_a_fresh_press() {
        let mut kb = InputState::new();
        kb.handle_key(key(KeyCode::Right, KeyEventKind::Press));
        kb.fresh_presses.clear();
        kb.handle_key(key(KeyCode::Right, KeyEventKind::Repeat));
        assert_eq!(kb.pressed_direction(), Direction::None);
        assert_eq!(kb.held_direction(), Direction::Right);
    }

    #[test]
    fn held_pan_keys_give_offset_step() {
        let mut kb = InputState::new();
        kb.honor_release = true;
        assert_eq!(kb.held_pan(), (0, 0));
        kb.handle_key(key(KeyCode::Char('l'), KeyEventKind::Press));
        kb.handle_key(key(KeyCode::Char('i'), KeyEventKind::Press));
        assert_eq!(kb.held_pan(), (1, -1));
        kb.handle_key(key(KeyCode::Char('l'), KeyEventKind::Release));
        kb.handle_key(key(KeyCode::Char('J'), KeyEventKind::Press));
        assert_eq!(kb.held_pan(), (-1, -1));
    }

    #[test]
    fn fresh_input_state_reports_nothing() {
        let kb = InputState::new();
        assert_eq!(kb.pressed_direction(), Direction::None);
        assert_eq!(kb.held_direction(), Direction::None);
        assert!(!kb.any_pressed(KEYS_CONFIRM));
        assert!(!kb.ctrl_c_pressed());
    }
}
