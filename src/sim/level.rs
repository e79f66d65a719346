/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, sorted by filename)
///   2. Built-in embedded levels
///
/// ## Level file format (`.txt`):
///   Line 1: `# Level Name`
///   Lines: map rows, one legend character per cell
///
/// Short rows are padded with empty cells. The legend is the one in
/// `ObjectClass::legend` ('b' = Baba, 'B' = the word BABA, '=' = IS, ...).
///
/// ## Placement
///
/// A level is centred on the logical grid with offset
/// `((W - w) / 2, (H - h) / 2)` and the board's play area is set to the
/// level's footprint. Code 0 is skipped. Codes with no class are skipped
/// with a warning.

use std::path::Path;

use log::{debug, info, warn};

use crate::config::GridConfig;
use crate::domain::board::{Board, PlayArea};
use crate::domain::object::ObjectClass;
use crate::error::{Error, Result};

/// One level: dimensions plus one code per cell, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelDef {
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub codes: Vec<u8>,
}

impl LevelDef {
    pub fn from_codes(name: &str, width: usize, height: usize, codes: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyLevel { name: name.to_string() });
        }
        if codes.len() != width * height {
            return Err(Error::LevelDataLength {
                name: name.to_string(),
                expected: width * height,
                actual: codes.len(),
            });
        }
        Ok(LevelDef { name: name.to_string(), width, height, codes })
    }

    /// Build from legend rows. Unknown characters become empty cells.
    pub fn from_rows<S: AsRef<str>>(name: &str, rows: &[S]) -> Result<Self> {
        let height = rows.len();
        let width = rows.iter().map(|r| r.as_ref().chars().count()).max().unwrap_or(0);

        let mut codes = Vec::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            let mut n = 0;
            for (x, ch) in row.as_ref().chars().enumerate() {
                let class = ObjectClass::from_legend(ch).unwrap_or_else(|| {
                    warn!("[Level] \"{name}\": unknown character {ch:?} at ({x}, {y}), left empty");
                    ObjectClass::Empty
                });
                codes.push(class.code());
                n += 1;
            }
            codes.extend(std::iter::repeat(ObjectClass::Empty.code()).take(width - n));
        }

        LevelDef::from_codes(name, width, height, codes)
    }

    /// Render back to the level file format.
    #[cfg(test)]
    pub fn to_text(&self) -> String {
        let mut out = format!("# {}\n", self.name);
        for row in self.codes.chunks(self.width) {
            out.extend(
                row.iter()
                    .map(|&c| ObjectClass::from_code(c).unwrap_or_default().legend()),
            );
            out.push('\n');
        }
        out
    }

}

// ══════════════════════════════════════════════════════════════
// Board construction
// ══════════════════════════════════════════════════════════════

/// Centre `def` on a fresh logical grid.
pub fn build_board(def: &LevelDef, grid: GridConfig) -> Result<Board> {
    if def.width > grid.width || def.height > grid.height {
        return Err(Error::LevelTooLarge {
            name: def.name.clone(),
            width: def.width,
            height: def.height,
            grid_width: grid.width,
            grid_height: grid.height,
        });
    }

    let mut board = Board::new(grid.width, grid.height);
    let off_x = ((grid.width - def.width) / 2) as i32;
    let off_y = ((grid.height - def.height) / 2) as i32;
    board.set_play_area(PlayArea {
        min_x: off_x,
        min_y: off_y,
        max_x: off_x + def.width as i32 - 1,
        max_y: off_y + def.height as i32 - 1,
    });

    for (i, &code) in def.codes.iter().enumerate() {
        if code == ObjectClass::Empty.code() {
            continue;
        }
        let (x, y) = ((i % def.width) as i32, (i / def.width) as i32);
        match ObjectClass::from_code(code) {
            Some(class) => board.place(off_x + x, off_y + y, class),
            None => warn!("[Level] \"{}\": unknown code {code} at ({x}, {y}), skipped", def.name),
        }
    }

    Ok(board)
}

// ══════════════════════════════════════════════════════════════
// Catalogue
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelSource {
    Directory,
    Embedded,
}

/// The ordered list of playable levels.
#[derive(Clone, Debug)]
pub struct LevelCatalogue {
    levels: Vec<LevelDef>,
    source: LevelSource,
}

impl LevelCatalogue {
    /// Levels from `dir` if it holds at least one usable `.txt`, else the
    /// embedded set.
    pub fn discover(dir: &Path) -> Result<Self> {
        if dir.is_dir() {
            match load_from_directory(dir) {
                Ok(levels) if !levels.is_empty() => {
                    info!("[Level] {} level(s) from {}", levels.len(), dir.display());
                    return LevelCatalogue::new(levels, LevelSource::Directory);
                }
                Ok(_) => debug!("[Level] no .txt levels in {}", dir.display()),
                Err(e) => warn!("[Level] {e}"),
            }
        }
        Ok(LevelCatalogue::embedded())
    }

    pub fn embedded() -> Self {
        LevelCatalogue { levels: embedded_levels(), source: LevelSource::Embedded }
    }

    pub fn new(levels: Vec<LevelDef>, source: LevelSource) -> Result<Self> {
        if levels.is_empty() {
            return Err(Error::NoLevels);
        }
        Ok(LevelCatalogue { levels, source })
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn source(&self) -> LevelSource {
        self.source
    }

    pub fn get(&self, index: usize) -> Option<&LevelDef> {
        self.levels.get(index)
    }

    /// Index after `index`, wrapping to 0 after the last level.
    pub fn next_index(&self, index: usize) -> usize {
        if self.levels.is_empty() { 0 } else { (index + 1) % self.levels.len() }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.levels.iter().map(|l| l.name.as_str())
    }
}

// ══════════════════════════════════════════════════════════════
// Level file parsing
// ══════════════════════════════════════════════════════════════

/// Parse a single level from text content.
pub fn parse_level_file(content: &str) -> Result<LevelDef> {
    let mut name = String::new();
    let mut rows: Vec<&str> = vec![];

    for line in content.lines() {
        if name.is_empty() && rows.is_empty() && is_name_line(line) {
            name = line[1..].trim().to_string();
        } else {
            rows.push(line.trim_end_matches('\r'));
        }
    }

    while rows.last().is_some_and(|r| r.trim().is_empty()) {
        rows.pop();
    }

    if name.is_empty() {
        name = "Untitled".to_string();
    }

    LevelDef::from_rows(&name, &rows)
}

/// A name line starts with `#` and contains at least one letter.
fn is_name_line(line: &str) -> bool {
    line.strip_prefix('#')
        .is_some_and(|rest| rest.chars().any(|c| c.is_alphabetic()))
}

fn load_from_directory(dir: &Path) -> Result<Vec<LevelDef>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|source| Error::Io { path: dir.to_path_buf(), source })?;

    let mut found = vec![];
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.extension().is_some_and(|e| e == "txt") {
            continue;
        }
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(source) => {
                warn!("[Level] {}", Error::Io { path: path.clone(), source });
                continue;
            }
        };
        match parse_level_file(&content) {
            Ok(def) => {
                let filename = path.file_name().unwrap_or_default().to_string_lossy().to_string();
                found.push((filename, def));
            }
            Err(e) => warn!("[Level] {}: {e}", path.display()),
        }
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found.into_iter().map(|(_, def)| def).collect())
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

fn embedded_levels() -> Vec<LevelDef> {
    [
        ("First Steps", &[
            "B=Y.......F=!",
            ".............",
            "..b.......f..",
            ".............",
            "R=P..........",
            ".....rrr.....",
        ][..]),
        ("Break the Wall", &[
            ".............",
            ".wwwwwwwww...",
            ".w.......w...",
            ".w.W=S...w.f.",
            ".w.......w...",
            ".w..b....w...",
            ".wwwwwwwww...",
            "B=Y.....F=!..",
        ][..]),
        ("Sink or Swim", &[
            "B=Y....R=P",
            "..........",
            "..r...g...",
            ".b.r..g.f.",
            "..r...g...",
            "..........",
            "G=N....F=!",
        ][..]),
        ("Hot Floor", &[
            "B=Y.......",
            "....l.....",
            ".b..l..f..",
            "....l.....",
            "....l.....",
            "L=K....F=!",
        ][..]),
        ("Word Play", &[
            "B=Y......",
            ".........",
            "..b..=...",
            "....F...!",
            ".........",
            "wwwwwwwww",
            "W=S....f.",
        ][..]),
    ]
    .into_iter()
    .filter_map(|(name, rows)| match LevelDef::from_rows(name, rows) {
        Ok(def) => Some(def),
        Err(e) => {
            warn!("[Level] built-in {e}");
            None
        }
    })
    .collect()
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
