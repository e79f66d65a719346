/// babagrid: a push-block puzzle core whose rules are written on the board.
///
/// `domain` holds the board, rule parser and movement resolution;
/// `sim` wraps them into a playable session with levels and modes.
/// The terminal front end lives in the binary.

pub mod config;
pub mod domain;
pub mod error;
pub mod sim;
