/// Entry point and game loop.

mod ui;

use std::fs::File;
use std::path::Path;
use std::time::{Duration, Instant};

use log::{info, warn};

use babagrid::config::GameConfig;
use babagrid::domain::movement::Direction;
use babagrid::sim::event::GameEvent;
use babagrid::sim::level::LevelCatalogue;
use babagrid::sim::step::{self, Command};
use babagrid::sim::world::GameState;
use ui::gamepad::GamepadState;
use ui::input::{DirectionRepeat, InputState, KEYS_CANCEL, KEYS_CONFIRM, KEYS_QUIT, KEYS_RESTART};
use ui::renderer::Renderer;
use ui::sound::{Sfx, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Ticks an error message stays on the message bar.
const ERROR_MESSAGE_TICKS: u32 = 120;

fn main() {
    let config = GameConfig::load();
    init_logging(&config.log_file);
    info!("[Main] babagrid {} starting", env!("CARGO_PKG_VERSION"));

    let catalogue = match LevelCatalogue::discover(&config.levels_dir) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("No levels: {e}");
            return;
        }
    };

    let mut state = GameState::new(&config);
    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut state, &catalogue, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    info!("[Main] exit");
    println!();
    println!("Thanks for playing babagrid!");
}

/// Route `log` output to the configured file; the terminal belongs to the
/// renderer. `RUST_LOG` overrides the default `info` filter. If the file
/// cannot be created, logging stays off.
fn init_logging(path: &Path) {
    let file = match File::create(path) {
        Ok(f) => f,
        Err(_) => return,
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
}

fn game_loop(
    state: &mut GameState,
    catalogue: &LevelCatalogue,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.keyboard_enhanced();
    info!("[Input] key release events: {}", kb.honor_release);
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut repeat = DirectionRepeat::new(Duration::from_millis(config.input.repeat_ms));
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.input.tick_rate_ms);

    // Edge-triggered input seen between ticks
    let mut pending: Vec<Command> = Vec::new();
    let mut pending_dir = Direction::None;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) {
            break;
        }

        collect_commands(&kb, &gp, &mut pending);
        let fresh = detect_pressed_direction(&kb, &gp);
        if fresh != Direction::None {
            pending_dir = fresh;
        }

        if last_tick.elapsed() >= tick_rate {
            let now = Instant::now();
            let dir = repeat.poll(pending_dir, detect_held_direction(&kb, &gp), now);
            pending_dir = Direction::None;

            for cmd in pending.drain(..) {
                run_command(state, catalogue, sound, cmd);
            }
            if dir != Direction::None {
                run_command(state, catalogue, sound, Command::Move(dir));
            }
            let (px, py) = detect_pan(&kb, &gp);
            state.pan_camera(px, py);

            state.tick_message();
            last_tick = now;
        }

        renderer.render(state, catalogue)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Apply one command; a level that fails to load is reported on the
/// message bar instead of ending the session.
fn run_command(
    state: &mut GameState,
    catalogue: &LevelCatalogue,
    sound: Option<&SoundEngine>,
    cmd: Command,
) {
    match step::apply(state, catalogue, cmd) {
        Ok(events) => process_sound_events(sound, state.audio.gain(), &events),
        Err(e) => {
            warn!("[Main] {e}");
            state.set_message(&e.to_string(), ERROR_MESSAGE_TICKS);
        }
    }
}

fn process_sound_events(sound: Option<&SoundEngine>, gain: f32, events: &[GameEvent]) {
    let engine = match sound {
        Some(s) => s,
        None => return,
    };
    if let Some(sfx) = Sfx::for_events(events) {
        engine.play(sfx, gain);
    }
}

// ── Input mapping ──

fn collect_commands(kb: &InputState, gp: &GamepadState, out: &mut Vec<Command>) {
    if kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed() {
        out.push(Command::Confirm);
    }
    if kb.any_pressed(KEYS_CANCEL) || gp.cancel_pressed() {
        out.push(Command::Cancel);
    }
    if kb.any_pressed(KEYS_RESTART) || gp.restart_pressed() {
        out.push(Command::Restart);
    }
    if gp.menu_pressed() {
        out.push(Command::Menu);
    }
}

fn detect_pressed_direction(kb: &InputState, gp: &GamepadState) -> Direction {
    match kb.pressed_direction() {
        Direction::None => gp.pressed_direction(),
        d => d,
    }
}

/// Keyboard pan wins; the right stick is used when no pan key is held.
fn detect_pan(kb: &InputState, gp: &GamepadState) -> (i32, i32) {
    match kb.held_pan() {
        (0, 0) => gp.pan_direction(),
        p => p,
    }
}

fn detect_held_direction(kb: &InputState, gp: &GamepadState) -> Direction {
    match kb.held_direction() {
        Direction::None => gp.held_direction(),
        d => d,
    }
}
