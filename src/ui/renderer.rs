/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Screen layout while a level is up:
///
/// ```text
///   row 0      HUD: level, name, moves
///   row 1      standing rules
///   row 2..    board viewport, 2 columns per board cell
///   below      message bar, help bar
/// ```

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use babagrid::domain::object::ObjectClass;
use babagrid::domain::rules::Rule;
use babagrid::sim::level::{LevelCatalogue, LevelSource};
use babagrid::sim::world::{GameState, MenuItem, Mode};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    ///
    /// Using the same RGB for `Clear(ClearType::All)` and every cell's
    /// background keeps inter-row gaps on VTE terminals the same colour.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg: Self::norm_bg(bg) }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column; clipped at the edge.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    /// Paint a whole row with `bg`, then write `s` from column 0.
    fn put_bar(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', fg, bg));
        }
        self.put_str(0, y, s, fg, bg);
    }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, bg: Color) {
        for yy in y..y + h {
            for xx in x..x + w {
                self.set(xx, yy, Cell::new(' ', Color::White, bg));
            }
        }
    }
}

// ── Renderer ──

/// Each board cell = 2 terminal columns.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const RULES_ROW: usize = 1;
const MAP_ROW: usize = 2;

/// HUD + rules + gap + message + help
const RESERVED_ROWS: usize = MAP_ROW + 4;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const BACKDROP_BG: Color = Color::Rgb { r: 48, g: 48, b: 52 };

/// Second-column tint for a stacked cell whose glyph fills both columns.
const STACK_BG: Color = Color::Rgb { r: 70, g: 60, b: 30 };
const OVERLAY_BG: Color = Color::Rgb { r: 40, g: 40, b: 40 };
const ACCENT: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const HILITE: Color = Color::Rgb { r: 80, g: 255, b: 80 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_mode: Option<Mode>,
    /// Terminal reports key Release events.
    keyboard_enhanced: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_mode: None,
            keyboard_enhanced: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.keyboard_enhanced = true;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn keyboard_enhanced(&self) -> bool {
        self.keyboard_enhanced
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.keyboard_enhanced {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
            self.keyboard_enhanced = false;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, state: &mut GameState, catalogue: &LevelCatalogue) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Detect mode change → clear for clean transition
        if self.last_mode != Some(state.mode) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_mode = Some(state.mode);
        }

        fit_camera(state, self.term_w, self.term_h);

        self.front.clear();
        match state.mode {
            Mode::Title => self.compose_title(state, catalogue),
            Mode::Playing => self.compose_game(state),
            Mode::Win => {
                self.compose_game(state);
                self.compose_win_overlay(state, catalogue);
            }
            Mode::Dead => {
                self.compose_game(state);
                self.compose_dead_overlay(state);
            }
            Mode::Menu => {
                self.compose_game(state);
                self.compose_menu_overlay(state);
            }
        }

        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Do NOT use ResetColor here: the terminal default may differ from BASE_BG.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) { continue; }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, s: &GameState) {
        self.front.put_bar(HUD_ROW, &hud_text(s), Color::White, HUD_BG);
        self.front.put_str(0, RULES_ROW, &rules_text(&s.rules), Color::Rgb { r: 170, g: 170, b: 200 }, Color::Reset);

        // ── Board (camera viewport) ──
        let cam = &s.camera;
        for vy in 0..cam.view_h {
            let row = MAP_ROW + vy;
            if row >= self.front.height { break; }
            for vx in 0..cam.view_w {
                let col = vx * CELL_W;
                if col + 1 >= self.front.width { break; }
                self.compose_cell(s, cam.x + vx as i32, cam.y + vy as i32, col, row);
            }
        }

        // ── Message bar ──
        let msg_row = MAP_ROW + cam.view_h + 1;
        if msg_row < self.front.height && !s.message.is_empty() {
            self.front.put_bar(msg_row, &format!(" ◈ {} ", s.message), Color::Black, MSG_BG);
        }

        // ── Help bar ──
        let help_row = MAP_ROW + cam.view_h + 2;
        if help_row < self.front.height {
            let help = " ←→↑↓/WASD Move  IJKL Pan  R Restart  Esc Menu  Q Quit  │  Pad: A Confirm  Y Restart  R-Stick Pan";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    /// Write the visual for board cell (x, y) at terminal (col, row).
    /// A cell holding more than one object shows the top glyph plus a
    /// stack mark in the second column.
    fn compose_cell(&mut self, s: &GameState, x: i32, y: i32, col: usize, row: usize) {
        let mut stacked = false;
        let (text, fg, bg) = if !s.board.in_bounds(x, y) {
            ("  ", Color::White, Cell::BASE_BG)
        } else if !s.board.in_play_area(x, y) {
            ("  ", Color::White, BACKDROP_BG)
        } else {
            let cell = s.board.cell(x, y);
            stacked = cell.objects.len() > 1;
            match cell.top() {
                Some(class) => glyph(class),
                None => ("· ", Color::Rgb { r: 50, g: 50, b: 70 }, Cell::BASE_BG),
            }
        };
        let mut chars = text.chars();
        let a = chars.next().unwrap_or(' ');
        let b = chars.next().unwrap_or(' ');
        self.front.set(col, row, Cell::new(a, fg, bg));
        let second = match (stacked, b) {
            (false, _) => Cell::new(b, fg, bg),
            (true, ' ') => Cell::new('+', fg, bg),
            (true, _) => Cell::new(b, fg, STACK_BG),
        };
        self.front.set(col + 1, row, second);
    }

    // ── Static screens and overlays ──

    fn compose_title(&mut self, s: &GameState, catalogue: &LevelCatalogue) {
        let title = [
            r" ___   _   ___   _   ___ ___ ___ ___  ",
            r"| _ ) /_\ | _ ) /_\ / __| _ \_ _|   \ ",
            r"| _ \/ _ \| _ \/ _ \ (_ |   /| || |) |",
            r"|___/_/ \_\___/_/ \_\___|_|_\___|___/ ",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(4, 2 + i, line, ACCENT, Color::Reset);
        }
        self.front.put_str(6, 7, "━━━ the rules are on the board ━━━", Color::Rgb { r: 180, g: 140, b: 50 }, Color::Reset);

        self.front.put_str(8, 10, "ENTER   Start", HILITE, Color::Reset);
        self.front.put_str(8, 11, "  Q     Quit", Color::White, Color::Reset);

        let source = match catalogue.source() {
            LevelSource::Directory => "level files",
            LevelSource::Embedded => "built-in levels",
        };
        let info = format!("{} levels ({source})", catalogue.len());
        self.front.put_str(8, 13, &info, Color::DarkGrey, Color::Reset);

        let start = s.start_level % catalogue.len().max(1);
        for (i, name) in catalogue.names().enumerate() {
            let row = 15 + i;
            if row + 1 >= self.front.height { break; }
            let (mark, fg) = if i == start { ("▸", HILITE) } else { (" ", Color::White) };
            self.front.put_str(8, row, &format!("{mark} {:>2}. {name}", i + 1), fg, Color::Reset);
        }
    }

    /// Dark box centred on the board viewport. Returns its top-left corner.
    fn overlay_box(&mut self, s: &GameState, w: usize, h: usize) -> (usize, usize) {
        let view_cols = (s.camera.view_w * CELL_W).min(self.front.width);
        let view_rows = s.camera.view_h;
        let w = w.min(view_cols);
        let h = h.min(view_rows);
        let x = view_cols.saturating_sub(w) / 2;
        let y = MAP_ROW + view_rows.saturating_sub(h) / 2;
        self.front.fill_rect(x, y, w, h, OVERLAY_BG);
        (x, y)
    }

    fn compose_win_overlay(&mut self, s: &GameState, catalogue: &LevelCatalogue) {
        let (x, y) = self.overlay_box(s, 34, 7);
        self.front.put_str(x + 2, y + 1, "★ LEVEL COMPLETE ★", ACCENT, OVERLAY_BG);
        self.front.put_str(x + 2, y + 3, &format!("Moves: {}", s.moves), Color::White, OVERLAY_BG);
        let next = catalogue.next_index(s.level_index);
        let label = if next == 0 { "▸ ENTER: Back to level 1" } else { "▸ ENTER: Next level" };
        self.front.put_str(x + 2, y + 5, label, HILITE, OVERLAY_BG);
    }

    fn compose_dead_overlay(&mut self, s: &GameState) {
        let (x, y) = self.overlay_box(s, 34, 7);
        self.front.put_str(x + 2, y + 1, "✕ DESTROYED ✕", Color::Rgb { r: 255, g: 60, b: 60 }, OVERLAY_BG);
        self.front.put_str(x + 2, y + 3, "▸ R:     Retry level", HILITE, OVERLAY_BG);
        self.front.put_str(x + 2, y + 4, "▸ ENTER: Back to title", Color::Rgb { r: 180, g: 180, b: 180 }, OVERLAY_BG);
    }

    fn compose_menu_overlay(&mut self, s: &GameState) {
        let (x, y) = self.overlay_box(s, 36, 10);
        self.front.put_str(x + 2, y + 1, "SETTINGS", ACCENT, OVERLAY_BG);

        for (i, item) in MenuItem::ALL.iter().enumerate() {
            let selected = i == s.menu_cursor;
            let value = match item {
                MenuItem::Sound => if s.audio.enabled { "ON".to_string() } else { "OFF".to_string() },
                MenuItem::SfxVolume => volume_bar(s.audio.sfx_volume),
                MenuItem::MasterVolume => volume_bar(s.audio.master_volume),
            };
            let line = format!("{} {:<14}{value}", if selected { "▸" } else { " " }, item.label());
            let fg = if selected { HILITE } else { Color::White };
            self.front.put_str(x + 2, y + 3 + i, &line, fg, OVERLAY_BG);
        }

        let key_c = Color::Rgb { r: 100, g: 200, b: 255 };
        self.front.put_str(x + 2, y + 7, "↑↓ Select  ←→ Adjust", key_c, OVERLAY_BG);
        self.front.put_str(x + 2, y + 8, "ENTER Toggle  ESC Back", key_c, OVERLAY_BG);
    }
}

/// Size the camera viewport from the terminal and re-centre it.
fn fit_camera(state: &mut GameState, term_w: usize, term_h: usize) {
    state.camera.view_w = (term_w / CELL_W).max(1);
    state.camera.view_h = term_h.saturating_sub(RESERVED_ROWS).max(1);
    if state.mode != Mode::Title {
        state.update_camera();
    }
}

fn hud_text(s: &GameState) -> String {
    format!(" Level {}: {}   Moves: {} ", s.level_index + 1, s.level_name, s.moves)
}

fn rules_text(rules: &[Rule]) -> String {
    if rules.is_empty() {
        return " (no rules)".to_string();
    }
    let list: Vec<String> = rules.iter().map(|r| r.to_string()).collect();
    format!(" {}", list.join(" · "))
}

/// Ten-segment bar for a 0..=255 volume.
fn volume_bar(v: u8) -> String {
    let filled = (v as usize * 10 + 127) / 255;
    format!("{}{} {v:>3}", "█".repeat(filled), "░".repeat(10 - filled))
}

/// Two-column abbreviation for a word tile.
fn word_abbrev(class: ObjectClass) -> &'static str {
    match class {
        ObjectClass::TextFloat => "FT",
        ObjectClass::TextMove => "MV",
        ObjectClass::TextEmpty => "EM",
        other => {
            let name = other.word_name();
            name.get(..2).unwrap_or(name)
        }
    }
}

/// Two-column text plus colours for the object drawn on top of a cell.
fn glyph(class: ObjectClass) -> (&'static str, Color, Color) {
    let word_bg = Color::Rgb { r: 45, g: 30, b: 45 };
    match class {
        ObjectClass::Empty => ("  ", Color::White, Cell::BASE_BG),
        ObjectClass::Baba => ("ö ", Color::Rgb { r: 240, g: 240, b: 240 }, Cell::BASE_BG),
        ObjectClass::Wall => ("▓▓", Color::Rgb { r: 90, g: 90, b: 110 }, Cell::BASE_BG),
        ObjectClass::Rock => ("()", Color::Rgb { r: 170, g: 120, b: 60 }, Cell::BASE_BG),
        ObjectClass::Flag => ("|>", Color::Rgb { r: 240, g: 220, b: 60 }, Cell::BASE_BG),
        ObjectClass::Lava => ("≈≈", Color::Rgb { r: 255, g: 110, b: 40 }, Cell::BASE_BG),
        ObjectClass::Goop => ("~~", Color::Rgb { r: 90, g: 190, b: 90 }, Cell::BASE_BG),
        ObjectClass::Love => ("<3", Color::Rgb { r: 255, g: 120, b: 180 }, Cell::BASE_BG),
        c if c.is_subject_word() => (word_abbrev(c), Color::White, Color::Rgb { r: 120, g: 40, b: 90 }),
        ObjectClass::TextIs => ("IS", Color::Black, Color::Rgb { r: 220, g: 220, b: 220 }),
        c => (word_abbrev(c), status_color(c), word_bg),
    }
}

fn status_color(class: ObjectClass) -> Color {
    match class {
        ObjectClass::TextYou => Color::Rgb { r: 255, g: 120, b: 180 },
        ObjectClass::TextWin => Color::Rgb { r: 240, g: 220, b: 60 },
        ObjectClass::TextStop => Color::Rgb { r: 80, g: 170, b: 80 },
        ObjectClass::TextPush => Color::Rgb { r: 170, g: 120, b: 60 },
        ObjectClass::TextSink => Color::Rgb { r: 70, g: 120, b: 220 },
        ObjectClass::TextKill => Color::Rgb { r: 220, g: 60, b: 60 },
        ObjectClass::TextHot => Color::Rgb { r: 255, g: 140, b: 40 },
        ObjectClass::TextMelt => Color::Rgb { r: 100, g: 200, b: 255 },
        _ => Color::Rgb { r: 180, g: 180, b: 180 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use babagrid::config::GameConfig;
    use babagrid::domain::board::PlayArea;

    #[test]
    fn every_glyph_is_two_columns() {
        for class in ObjectClass::ALL {
            let (text, _, _) = glyph(class);
            assert_eq!(text.chars().count(), 2, "{class:?} -> {text:?}");
        }
    }

    #[test]
    fn word_abbreviations_are_unique() {
        let words: Vec<ObjectClass> = ObjectClass::ALL.iter().copied().filter(|c| c.is_word()).collect();
        let abbrevs: HashSet<&str> = words.iter().map(|&c| word_abbrev(c)).collect();
        assert_eq!(abbrevs.len(), words.len());
        assert_eq!(word_abbrev(ObjectClass::TextBaba), "BA");
        assert_eq!(word_abbrev(ObjectClass::TextIs), "IS");
    }

    #[test]
    fn volume_bar_ends() {
        assert!(volume_bar(0).starts_with("░░░░░░░░░░"));
        assert!(volume_bar(255).starts_with("██████████"));
        assert!(volume_bar(255).ends_with("255"));
    }

    #[test]
    fn rules_line() {
        assert_eq!(rules_text(&[]), " (no rules)");
        let rules = [
            Rule { subject: ObjectClass::Baba, status: ObjectClass::TextYou },
            Rule { subject: ObjectClass::Flag, status: ObjectClass::TextWin },
        ];
        assert_eq!(rules_text(&rules), " BABA IS YOU · FLAG IS WIN");
    }

    #[test]
    fn fit_camera_leaves_room_for_bars() {
        let mut state = GameState::new(&GameConfig::default());
        fit_camera(&mut state, 100, 40);
        assert_eq!(state.camera.view_w, 50);
        assert_eq!(state.camera.view_h, 40 - RESERVED_ROWS);
        fit_camera(&mut state, 1, 2);
        assert_eq!((state.camera.view_w, state.camera.view_h), (1, 1));
    }

    #[test]
    fn board_cells_draw_top_object_stack_mark_and_backdrop() {
        let mut state = GameState::new(&GameConfig::default());
        state.mode = Mode::Playing;
        state.board.set_play_area(PlayArea { min_x: 2, min_y: 2, max_x: 5, max_y: 5 });
        state.board.place(3, 3, ObjectClass::Flag);
        state.board.place(3, 3, ObjectClass::Baba);
        state.board.place(4, 3, ObjectClass::Rock);
        state.board.place(4, 3, ObjectClass::Wall);
        state.board.place(5, 3, ObjectClass::Wall);
        state.camera.view_w = 8;
        state.camera.view_h = 8;

        let mut r = Renderer::new();
        r.front.resize(20, 14);
        r.compose_game(&state);

        let top = r.front.get(3 * CELL_W, MAP_ROW + 3);
        assert_eq!(top.ch, 'ö');
        assert_eq!(r.front.get(3 * CELL_W + 1, MAP_ROW + 3).ch, '+');
        let wall_stack = r.front.get(4 * CELL_W + 1, MAP_ROW + 3);
        assert_eq!((wall_stack.ch, wall_stack.bg), ('▓', STACK_BG));
        let wall_alone = r.front.get(5 * CELL_W + 1, MAP_ROW + 3);
        assert_eq!((wall_alone.ch, wall_alone.bg), ('▓', Cell::BASE_BG));
        let backdrop = r.front.get(0, MAP_ROW);
        assert_eq!(backdrop.bg, BACKDROP_BG);
        let floor = r.front.get(2 * CELL_W, MAP_ROW + 2);
        assert_eq!(floor.ch, '·');
        assert_eq!(r.front.get(1, HUD_ROW).ch, 'L');
    }
}
