/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD or
/// `~/.local/share/babagrid`. Falls back to defaults if the file is missing
/// or incomplete.

use log::warn;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub levels_dir: PathBuf,
    pub log_file: PathBuf,
    pub start_level: usize,
    pub grid: GridConfig,
    pub input: InputConfig,
    pub audio: AudioConfig,
    pub gamepad: GamepadConfig,
}

/// Logical grid every level is centred on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputConfig {
    pub repeat_ms: u64,
    pub tick_rate_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioConfig {
    pub enabled: bool,
    pub sfx_volume: u8,
    pub master_volume: u8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub restart: Vec<String>,
    pub menu: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    grid: TomlGrid,
    #[serde(default)]
    input: TomlInput,
    #[serde(default)]
    audio: TomlAudio,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default)]
    start_level: usize,
}

#[derive(Deserialize, Debug)]
struct TomlGrid {
    #[serde(default = "default_grid_width")]
    width: usize,
    #[serde(default = "default_grid_height")]
    height: usize,
}

#[derive(Deserialize, Debug)]
struct TomlInput {
    #[serde(default = "default_repeat")]
    repeat_ms: u64,
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlAudio {
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_sfx_volume")]
    sfx_volume: u32,
    #[serde(default = "default_master_volume")]
    master_volume: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
    #[serde(default = "default_menu")]
    menu: Vec<String>,
}

// ── Defaults ──

fn default_levels_dir() -> String { "levels".into() }
fn default_log_file() -> String { "babagrid.log".into() }
fn default_grid_width() -> usize { 32 }
fn default_grid_height() -> usize { 24 }
fn default_repeat() -> u64 { 140 }
fn default_tick_rate() -> u64 { 25 }    // ~40 FPS
fn default_true() -> bool { true }
fn default_sfx_volume() -> u32 { 120 }
fn default_master_volume() -> u32 { 140 }

fn default_confirm() -> Vec<String> { vec!["A".into(), "Start".into()] }
fn default_cancel() -> Vec<String> { vec!["B".into()] }
fn default_restart() -> Vec<String> { vec!["Y".into()] }
fn default_menu() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            log_file: default_log_file(),
            start_level: 0,
        }
    }
}

impl Default for TomlGrid {
    fn default() -> Self {
        TomlGrid { width: default_grid_width(), height: default_grid_height() }
    }
}

impl Default for TomlInput {
    fn default() -> Self {
        TomlInput { repeat_ms: default_repeat(), tick_rate_ms: default_tick_rate() }
    }
}

impl Default for TomlAudio {
    fn default() -> Self {
        TomlAudio {
            enabled: true,
            sfx_volume: default_sfx_volume(),
            master_volume: default_master_volume(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            restart: default_restart(),
            menu: default_menu(),
        }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse config text directly. A parse error yields the defaults.
    pub fn from_toml_str(text: &str) -> Self {
        GameConfig::from_toml(parse_toml(text, Path::new("config.toml")), &[])
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let levels_dir = resolve_dir(&cfg.general.levels_dir, search_dirs);

        let mut grid = GridConfig { width: cfg.grid.width, height: cfg.grid.height };
        if grid.width == 0 || grid.height == 0 {
            warn!("[Config] grid {}x{} is empty, using defaults", grid.width, grid.height);
            grid = GridConfig { width: default_grid_width(), height: default_grid_height() };
        }

        GameConfig {
            levels_dir,
            log_file: PathBuf::from(&cfg.general.log_file),
            start_level: cfg.general.start_level,
            grid,
            input: InputConfig {
                repeat_ms: cfg.input.repeat_ms,
                tick_rate_ms: cfg.input.tick_rate_ms.max(1),
            },
            audio: AudioConfig {
                enabled: cfg.audio.enabled,
                sfx_volume: clamp_volume("sfx_volume", cfg.audio.sfx_volume),
                master_volume: clamp_volume("master_volume", cfg.audio.master_volume),
            },
            gamepad: GamepadConfig {
                confirm: cfg.gamepad.confirm,
                cancel: cfg.gamepad.cancel,
                restart: cfg.gamepad.restart,
                menu: cfg.gamepad.menu,
            },
        }
    }
}

fn clamp_volume(key: &str, value: u32) -> u8 {
    if value > u8::MAX as u32 {
        warn!("[Config] audio.{key} = {value} out of range, clamped to 255");
    }
    value.min(u8::MAX as u32) as u8
}

/// Absolute paths are used as-is; relative ones are looked up in the
/// candidate dirs, falling back to the CWD.
fn resolve_dir(dir: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(dir);
    if path.is_absolute() {
        return path;
    }
    search_dirs
        .iter()
        .map(|d| d.join(dir))
        .find(|p| p.is_dir())
        .unwrap_or(path)
}

/// Candidate directories to search: exe dir + CWD + XDG data (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so data next to the real binary is still found.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/babagrid");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => return parse_toml(&text, &path),
                Err(e) => warn!("[Config] could not read {}: {e}", path.display()),
            }
        }
    }
    TomlConfig::default()
}

fn parse_toml(text: &str, path: &Path) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("[Config] {} parse error, using defaults: {e}", path.display());
            TomlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GameConfig::from_toml_str("");
        assert_eq!(cfg.levels_dir, PathBuf::from("levels"));
        assert_eq!(cfg.log_file, PathBuf::from("babagrid.log"));
        assert_eq!(cfg.start_level, 0);
        assert_eq!(cfg.grid, GridConfig { width: 32, height: 24 });
        assert_eq!(cfg.input, InputConfig { repeat_ms: 140, tick_rate_ms: 25 });
        assert_eq!(
            cfg.audio,
            AudioConfig { enabled: true, sfx_volume: 120, master_volume: 140 }
        );
        assert_eq!(cfg.gamepad.confirm, vec!["A", "Start"]);
        assert_eq!(cfg.gamepad.menu, vec!["Select"]);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            r#"
            [grid]
            width = 40

            [audio]
            enabled = false

            [gamepad]
            restart = ["X"]
            "#,
        );
        assert_eq!(cfg.grid, GridConfig { width: 40, height: 24 });
        assert!(!cfg.audio.enabled);
        assert_eq!(cfg.audio.sfx_volume, 120);
        assert_eq!(cfg.gamepad.restart, vec!["X"]);
        assert_eq!(cfg.gamepad.cancel, vec!["B"]);
    }

    #[test]
    fn parse_error_falls_back_to_defaults() {
        let cfg = GameConfig::from_toml_str("[grid\nwidth = ");
        assert_eq!(cfg.grid, GridConfig { width: 32, height: 24 });
    }

    #[test]
    fn out_of_range_values_are_corrected() {
        let cfg = GameConfig::from_toml_str(
            r#"
            [grid]
            width = 0
            [input]
            tick_rate_ms = 0
            [audio]
            master_volume = 999
            "#,
        );
        assert_eq!(cfg.grid, GridConfig { width: 32, height: 24 });
        assert_eq!(cfg.input.tick_rate_ms, 1);
        assert_eq!(cfg.audio.master_volume, 255);
    }

    #[test]
    fn absolute_levels_dir_is_kept() {
        let cfg = GameConfig::from_toml_str("[general]\nlevels_dir = \"/opt/baba/levels\"\nstart_level = 3");
        assert_eq!(cfg.levels_dir, PathBuf::from("/opt/baba/levels"));
        assert_eq!(cfg.start_level, 3);
    }
}
