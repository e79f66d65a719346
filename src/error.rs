/// Errors raised while building boards from level data.
///
/// The rule scanner and movement resolver never fail; everything here comes
/// from level construction and level discovery.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    /// A level file or directory could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The level does not fit on the logical grid.
    LevelTooLarge {
        name: String,
        width: usize,
        height: usize,
        grid_width: usize,
        grid_height: usize,
    },
    /// `width * height` does not match the number of codes supplied.
    LevelDataLength {
        name: String,
        expected: usize,
        actual: usize,
    },
    /// A level with no rows or no columns.
    EmptyLevel { name: String },
    /// Neither the levels directory nor the built-in set produced a level.
    NoLevels,
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::LevelTooLarge { name, width, height, grid_width, grid_height } => write!(
                f,
                "level \"{name}\" is {width}x{height}, larger than the {grid_width}x{grid_height} grid"
            ),
            Self::LevelDataLength { name, expected, actual } => {
                write!(f, "level \"{name}\" expects {expected} cells, got {actual}")
            }
            Self::EmptyLevel { name } => write!(f, "level \"{name}\" has no cells"),
            Self::NoLevels => write!(f, "no levels available"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
