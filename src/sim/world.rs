/// GameState: the complete context of a running session.
///
/// Everything the update functions and the renderer need is reachable from
/// here; nothing is kept in globals.
///
/// ## Camera / Viewport
///
/// World coordinates and screen coordinates are separate:
///   - `camera`: viewport into the board (top-left corner + size)
///   - Renderer maps: `screen(sx, sy) = world(camera.x + sx, camera.y + sy)`
///   - Camera centres on the first YOU object, shifted by the pan offset
///   - Pan accumulates while a pan input is held and snaps back on release
///   - Boards smaller than the viewport are centred

use crate::config::{AudioConfig, GameConfig, GridConfig};
use crate::domain::board::Board;
use crate::domain::properties::PropertyTable;
use crate::domain::rules::Rule;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    Title,
    Playing,
    Win,
    Dead,
    Menu,
}

/// Entries of the in-game settings menu, top to bottom.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MenuItem {
    Sound,
    SfxVolume,
    MasterVolume,
}

impl MenuItem {
    pub const ALL: [MenuItem; 3] = [MenuItem::Sound, MenuItem::SfxVolume, MenuItem::MasterVolume];

    pub fn label(self) -> &'static str {
        match self {
            MenuItem::Sound => "Sound",
            MenuItem::SfxVolume => "SFX volume",
            MenuItem::MasterVolume => "Master volume",
        }
    }
}

/// Volume step for one left/right press in the menu.
pub const VOLUME_STEP: i32 = 8;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AudioSettings {
    pub enabled: bool,
    pub sfx_volume: u8,
    pub master_volume: u8,
}

impl AudioSettings {
    /// Linear gain for effects: sfx/255 × master/255, 0 when muted.
    pub fn gain(&self) -> f32 {
        if !self.enabled {
            return 0.0;
        }
        (self.sfx_volume as f32 / 255.0) * (self.master_volume as f32 / 255.0)
    }

    /// Apply a menu adjustment. Volumes clamp to 0..=255; `Sound` toggles.
    pub fn adjust(&mut self, item: MenuItem, delta: i32) {
        let bump = |v: u8| (v as i32 + delta).clamp(0, 255) as u8;
        match item {
            MenuItem::Sound => self.enabled = !self.enabled,
            MenuItem::SfxVolume => self.sfx_volume = bump(self.sfx_volume),
            MenuItem::MasterVolume => self.master_volume = bump(self.master_volume),
        }
    }
}

impl From<AudioConfig> for AudioSettings {
    fn from(cfg: AudioConfig) -> Self {
        AudioSettings {
            enabled: cfg.enabled,
            sfx_volume: cfg.sfx_volume,
            master_volume: cfg.master_volume,
        }
    }
}

/// Camera: a viewport into the board.
///
/// `(x, y)` is the board coordinate of the top-left visible cell.
/// `(view_w, view_h)` is how many cells fit in the viewport; the renderer
/// sets these from the terminal size.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Camera {
    /// Board X of the top-left visible cell (negative when centring)
    pub x: i32,
    /// Board Y of the top-left visible cell
    pub y: i32,
    pub view_w: usize,
    pub view_h: usize,
    /// Offset added to the follow target, in cells
    pub pan_x: i32,
    pub pan_y: i32,
}

impl Camera {
    pub fn new() -> Self {
        Camera::default()
    }

    /// Snap to centre on a position, clamped so no space beyond the board
    /// shows unless the board is smaller than the view.
    pub fn center_on(&mut self, target_x: i32, target_y: i32, world_w: usize, world_h: usize) {
        if self.view_w == 0 || self.view_h == 0 { return; }
        self.x = center_axis(target_x, self.view_w, world_w);
        self.y = center_axis(target_y, self.view_h, world_h);
    }

    /// Accumulate a pan step while (dx, dy) is non-zero; reset otherwise.
    /// The offset never exceeds the world size on either axis.
    pub fn pan(&mut self, dx: i32, dy: i32, world_w: usize, world_h: usize) {
        if dx == 0 && dy == 0 {
            self.pan_x = 0;
            self.pan_y = 0;
            return;
        }
        let (w, h) = (world_w as i32, world_h as i32);
        self.pan_x = (self.pan_x + dx).clamp(-w, w);
        self.pan_y = (self.pan_y + dy).clamp(-h, h);
    }
}

fn center_axis(target: i32, view: usize, world: usize) -> i32 {
    let (view, world) = (view as i32, world as i32);
    if world <= view {
        -((view - world) / 2)
    } else {
        (target - view / 2).clamp(0, world - view)
    }
}

pub struct GameState {
    // ── Board ──
    pub board: Board,
    pub props: PropertyTable,
    /// Rules standing on the board after the last parse, for the HUD.
    pub rules: Vec<Rule>,
    pub grid: GridConfig,

    // ── Level ──
    pub level_index: usize,
    pub level_name: String,
    pub moves: u32,

    // ── Last step ──
    pub has_won: bool,
    pub has_died: bool,

    // ── Meta ──
    pub mode: Mode,
    pub start_level: usize,
    pub audio: AudioSettings,
    pub menu_cursor: usize,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
    pub camera: Camera,
}

impl GameState {
    pub fn new(config: &GameConfig) -> Self {
        GameState {
            board: Board::new(config.grid.width, config.grid.height),
            props: PropertyTable::new(),
            rules: vec![],
            grid: config.grid,
            level_index: 0,
            level_name: String::new(),
            moves: 0,
            has_won: false,
            has_died: false,
            mode: Mode::Title,
            start_level: config.start_level,
            audio: AudioSettings::from(config.audio),
            menu_cursor: 0,
            message: String::new(),
            message_timer: 0,
            camera: Camera::new(),
        }
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    /// Count down the message timer; clears the message at zero.
    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 { self.message.clear(); }
        }
    }

    /// First cell (row-major) holding a YOU object.
    pub fn first_you(&self) -> Option<(i32, i32)> {
        self.board
            .cells()
            .find(|(_, _, c)| c.objects.iter().any(|o| self.props[o.class].you))
            .map(|(x, y, _)| (x, y))
    }

    /// Centre the camera on the first YOU object (or the board centre)
    /// plus the pan offset.
    pub fn update_camera(&mut self) {
        let (w, h) = (self.board.width(), self.board.height());
        let (tx, ty) = self.first_you().unwrap_or((w / 2, h / 2));
        let (px, py) = (self.camera.pan_x, self.camera.pan_y);
        self.camera.center_on(tx + px, ty + py, w as usize, h as usize);
    }

    /// One tick of pan input; (0, 0) snaps back to following.
    pub fn pan_camera(&mut self, dx: i32, dy: i32) {
        let (w, h) = (self.board.width() as usize, self.board.height() as usize);
        self.camera.pan(dx, dy, w, h);
    }

    pub fn menu_item(&self) -> MenuItem {
        MenuItem::ALL[self.menu_cursor.min(MenuItem::ALL.len() - 1)]
    }

    /// Move the menu cursor by `delta`, wrapping.
    pub fn move_menu_cursor(&mut self, delta: i32) {
        let n = MenuItem::ALL.len() as i32;
        self.menu_cursor = (self.menu_cursor as i32 + delta).rem_euclid(n) as usize;
    }
}
