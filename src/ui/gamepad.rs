/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Movement
///   A / Start             →  Confirm
///   B                     →  Cancel
///   Y                     →  Restart
///   Select                →  Settings menu

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use log::warn;

use babagrid::config::GamepadConfig;
use babagrid::domain::movement::Direction;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    L2,      // LeftTrigger2
    R2,      // RightTrigger2
    Start,
    Select,
}

impl Btn {
    pub fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "L2" | "LT" | "LEFTTRIGGER2"  => Some(Btn::L2),
            "R2" | "RT" | "RIGHTTRIGGER2" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2  => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

/// Action-to-button mapping (loaded from config).
#[derive(Debug, PartialEq, Eq)]
struct ActionMap {
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
    restart: Vec<Btn>,
    menu: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            confirm: vec![Btn::A, Btn::Start],
            cancel:  vec![Btn::B],
            restart: vec![Btn::Y],
            menu:    vec![Btn::Select],
        }
    }
}

impl ActionMap {
    /// Overlay configured names onto the defaults. A list with no
    /// recognised names keeps the default binding.
    fn from_config(cfg: &GamepadConfig) -> Self {
        fn parse_list(action: &str, names: &[String], fallback: Vec<Btn>) -> Vec<Btn> {
            let btns: Vec<Btn> = names
                .iter()
                .filter_map(|s| {
                    let btn = Btn::from_name(s);
                    if btn.is_none() {
                        warn!("[Gamepad] unknown button {s:?} for {action}");
                    }
                    btn
                })
                .collect();
            if btns.is_empty() { fallback } else { btns }
        }
        let d = ActionMap::default();
        ActionMap {
            confirm: parse_list("confirm", &cfg.confirm, d.confirm),
            cancel: parse_list("cancel", &cfg.cancel, d.cancel),
            restart: parse_list("restart", &cfg.restart, d.restart),
            menu: parse_list("menu", &cfg.menu, d.menu),
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    // All tracked buttons (indexed by Btn)
    buttons: [BtnState; 10],

    // D-pad
    dpad_up: BtnState,
    dpad_down: BtnState,
    dpad_left: BtnState,
    dpad_right: BtnState,

    // Stick
    stick_up: BtnState,
    stick_down: BtnState,
    stick_left: BtnState,
    stick_right: BtnState,
    stick_x: f32,
    stick_y: f32,

    // Right stick pans the camera
    pan_x: f32,
    pan_y: f32,

    // Action mapping
    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    if has_pad { log::info!("[Gamepad] controller detected"); }
                    (Some(g), has_pad)
                }
                Err(e) => {
                    warn!("[Gamepad] init failed: {e}");
                    (None, false)
                }
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); 10],
            dpad_up: BtnState::default(),
            dpad_down: BtnState::default(),
            dpad_left: BtnState::default(),
            dpad_right: BtnState::default(),
            stick_up: BtnState::default(),
            stick_down: BtnState::default(),
            stick_left: BtnState::default(),
            stick_right: BtnState::default(),
            stick_x: 0.0,
            stick_y: 0.0,
            pan_x: 0.0,
            pan_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        self.action_map = ActionMap::from_config(cfg);
    }

    pub fn update(&mut self) {
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    self.update_axis(axis, value);
                }
                EventType::Connected => { self.connected = true; }
                EventType::Disconnected => {
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }

        // Derive stick digital states
        let prev_left = self.stick_left.held;
        let prev_right = self.stick_right.held;
        let prev_up = self.stick_up.held;
        let prev_down = self.stick_down.held;

        self.stick_left.held = self.stick_x < -STICK_DEADZONE;
        self.stick_right.held = self.stick_x > STICK_DEADZONE;
        self.stick_up.held = self.stick_y > STICK_DEADZONE;
        self.stick_down.held = self.stick_y < -STICK_DEADZONE;

        if self.stick_left.held && !prev_left { self.stick_left.just_pressed = true; }
        if self.stick_right.held && !prev_right { self.stick_right.just_pressed = true; }
        if self.stick_up.held && !prev_up { self.stick_up.just_pressed = true; }
        if self.stick_down.held && !prev_down { self.stick_down.just_pressed = true; }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool, just_pressed: bool) {
        // D-pad handled separately (not in Btn enum)
        match gilrs_btn {
            Button::DPadUp    => { self.dpad_up.held = held; if just_pressed { self.dpad_up.just_pressed = true; } return; }
            Button::DPadDown  => { self.dpad_down.held = held; if just_pressed { self.dpad_down.just_pressed = true; } return; }
            Button::DPadLeft  => { self.dpad_left.held = held; if just_pressed { self.dpad_left.just_pressed = true; } return; }
            Button::DPadRight => { self.dpad_right.held = held; if just_pressed { self.dpad_right.just_pressed = true; } return; }
            _ => {}
        }

        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            let idx = btn_index(btn);
            self.buttons[idx].held = held;
            if just_pressed {
                self.buttons[idx].just_pressed = true;
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn update_axis(&mut self, axis: Axis, value: f32) {
        match axis {
            Axis::LeftStickX => self.stick_x = value,
            Axis::LeftStickY => self.stick_y = value,
            Axis::RightStickX => self.pan_x = value,
            Axis::RightStickY => self.pan_y = value,
            _ => {}
        }
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].just_pressed)
    }

    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.cancel)
    }
    pub fn restart_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.restart)
    }
    pub fn menu_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.menu)
    }

    // Movement (continuous, held)
    pub fn up_held(&self) -> bool {
        self.dpad_up.held || self.stick_up.held
    }
    pub fn down_held(&self) -> bool {
        self.dpad_down.held || self.stick_down.held
    }
    pub fn left_held(&self) -> bool {
        self.dpad_left.held || self.stick_left.held
    }
    pub fn right_held(&self) -> bool {
        self.dpad_right.held || self.stick_right.held
    }

    /// Direction held on the D-pad or stick; vertical wins over horizontal.
    pub fn held_direction(&self) -> Direction {
        if self.up_held() { Direction::Up }
        else if self.down_held() { Direction::Down }
        else if self.left_held() { Direction::Left }
        else if self.right_held() { Direction::Right }
        else { Direction::None }
    }

    /// Direction that went down this frame.
    pub fn pressed_direction(&self) -> Direction {
        let edge = |a: &BtnState, b: &BtnState| a.just_pressed || b.just_pressed;
        if edge(&self.dpad_up, &self.stick_up) { Direction::Up }
        else if edge(&self.dpad_down, &self.stick_down) { Direction::Down }
        else if edge(&self.dpad_left, &self.stick_left) { Direction::Left }
        else if edge(&self.dpad_right, &self.stick_right) { Direction::Right }
        else { Direction::None }
    }

    /// Camera pan step from the right stick, one cell per axis past the
    /// deadzone. Stick up pans toward row 0.
    pub fn pan_direction(&self) -> (i32, i32) {
        let axis = |v: f32| {
            if v < -STICK_DEADZONE { -1 } else if v > STICK_DEADZONE { 1 } else { 0 }
        };
        (axis(self.pan_x), -axis(self.pan_y))
    }

    // ── Internal ──

    fn clear_just_pressed(&mut self) {
        for b in &mut self.buttons { b.just_pressed = false; }
        self.dpad_up.just_pressed = false;
        self.dpad_down.just_pressed = false;
        self.dpad_left.just_pressed = false;
        self.dpad_right.just_pressed = false;
        self.stick_up.just_pressed = false;
        self.stick_down.just_pressed = false;
        self.stick_left.just_pressed = false;
        self.stick_right.just_pressed = false;
    }

    fn release_all(&mut self) {
        for b in &mut self.buttons { *b = BtnState::default(); }
        self.dpad_up = BtnState::default();
        self.dpad_down = BtnState::default();
        self.dpad_left = BtnState::default();
        self.dpad_right = BtnState::default();
        self.stick_up = BtnState::default();
        self.stick_down = BtnState::default();
        self.stick_left = BtnState::default();
        self.stick_right = BtnState::default();
        self.stick_x = 0.0;
        self.stick_y = 0.0;
        self.pan_x = 0.0;
        self.pan_y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn button_names_accept_aliases() {
        assert_eq!(Btn::from_name("south"), Some(Btn::A));
        assert_eq!(Btn::from_name("LB"), Some(Btn::L1));
        assert_eq!(Btn::from_name("rt"), Some(Btn::R2));
        assert_eq!(Btn::from_name("Back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("turbo"), None);
    }

    #[test]
    fn config_overrides_and_falls_back() {
        let cfg = GamepadConfig {
            confirm: names(&["X", "start"]),
            cancel: names(&["nonsense"]),
            restart: vec![],
            menu: names(&["start"]),
        };
        let map = ActionMap::from_config(&cfg);
        assert_eq!(map.confirm, vec![Btn::X, Btn::Start]);
        assert_eq!(map.cancel, ActionMap::default().cancel);
        assert_eq!(map.restart, vec![Btn::Y]);
        assert_eq!(map.menu, vec![Btn::Start]);
    }

    #[test]
    fn idle_pad_reports_no_direction() {
        let mut pad = GamepadState::new();
        pad.release_all();
        assert_eq!(pad.held_direction(), Direction::None);
        assert_eq!(pad.pressed_direction(), Direction::None);
        assert!(!pad.confirm_pressed());
    }

    #[test]
    fn right_stick_pans_past_deadzone() {
        let mut pad = GamepadState::new();
        pad.release_all();
        pad.pan_x = 0.1;
        pad.pan_y = -0.1;
        assert_eq!(pad.pan_direction(), (0, 0));
        pad.pan_x = -0.8;
        pad.pan_y = 0.9;
        assert_eq!(pad.pan_direction(), (-1, -1));
        pad.release_all();
        assert_eq!(pad.pan_direction(), (0, 0));
    }

    #[test]
    fn dpad_edge_and_hold() {
        let mut pad = GamepadState::new();
        pad.release_all();
        pad.dpad_left = BtnState { held: true, just_pressed: true };
        assert_eq!(pad.pressed_direction(), Direction::Left);
        pad.clear_just_pressed();
        assert_eq!(pad.pressed_direction(), Direction::None);
        assert_eq!(pad.held_direction(), Direction::Left);
    }
}
