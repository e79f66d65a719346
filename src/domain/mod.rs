pub mod board;
pub mod movement;
pub mod object;
pub mod properties;
pub mod rules;

/// Test helper: build a board from a legend diagram, one object per cell.
/// Legend: see `ObjectClass::legend` ('.' = empty, 'b' = Baba, 'B' = BABA...).
#[cfg(test)]
pub(crate) fn board_from(rows: &[&str]) -> board::Board {
    let height = rows.len();
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    let mut board = board::Board::new(width, height);
    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            let class = object::ObjectClass::from_legend(ch)
                .unwrap_or_else(|| panic!("unknown legend char {ch:?}"));
            if class != object::ObjectClass::Empty {
                board.place(x as i32, y as i32, class);
            }
        }
    }
    board
}
