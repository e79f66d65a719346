/// The board: a rectangle of cells, each an ordered stack of objects.
///
/// ## Coordinates
///
/// `(x, y)` with `x` growing right and `y` growing down. Coordinates are
/// `i32` so that a lookup one step past an edge (`x = -1`) is a valid
/// question for `in_bounds` rather than an underflow.
///
/// ## Play area
///
/// The logical grid is usually larger than the level that occupies it.
/// `play_area` is the inclusive rectangle the level actually covers;
/// nothing may move or be placed outside it, even though those cells
/// exist for backdrop purposes.
///
/// ## Stack order
///
/// Objects are kept in insertion order. Only the *front* object of a cell
/// is read by the rule scanner; a word buried under another object does
/// not take part in any sentence.

use super::object::{Object, ObjectClass};

/// Inclusive rectangle `[min_x..=max_x] × [min_y..=max_y]`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PlayArea {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl PlayArea {
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn width(&self) -> i32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y + 1
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    pub objects: Vec<Object>,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The object the rule scanner reads.
    pub fn front(&self) -> Option<ObjectClass> {
        self.objects.first().map(|o| o.class)
    }

    /// The object drawn on top.
    pub fn top(&self) -> Option<ObjectClass> {
        self.objects.last().map(|o| o.class)
    }

    pub fn push(&mut self, class: ObjectClass) {
        self.objects.push(Object::new(class));
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
    play_area: PlayArea,
}

impl Board {
    /// Empty board; the play area covers the whole grid.
    pub fn new(width: usize, height: usize) -> Self {
        let (w, h) = (width as i32, height as i32);
        Board {
            width: w,
            height: h,
            cells: vec![Cell::default(); width * height],
            play_area: PlayArea { min_x: 0, min_y: 0, max_x: w - 1, max_y: h - 1 },
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn play_area(&self) -> PlayArea {
        self.play_area
    }

    pub fn set_play_area(&mut self, area: PlayArea) {
        self.play_area = area;
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    #[inline]
    pub fn in_play_area(&self, x: i32, y: i32) -> bool {
        self.play_area.contains(x, y)
    }

    /// Row-major index. Panics on out-of-bounds: callers must check
    /// `in_bounds` first.
    #[inline]
    pub fn index(&self, x: i32, y: i32) -> usize {
        assert!(
            self.in_bounds(x, y),
            "cell ({x}, {y}) outside {}x{} board",
            self.width,
            self.height
        );
        (y * self.width + x) as usize
    }

    pub fn cell(&self, x: i32, y: i32) -> &Cell {
        &self.cells[self.index(x, y)]
    }

    pub fn cell_mut(&mut self, x: i32, y: i32) -> &mut Cell {
        let idx = self.index(x, y);
        &mut self.cells[idx]
    }

    /// Append an object to the cell stack.
    pub fn place(&mut self, x: i32, y: i32, class: ObjectClass) {
        self.cell_mut(x, y).push(class);
    }

    /// All cells with their coordinates, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32, &Cell)> + '_ {
        let w = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, c)| (i as i32 % w, i as i32 / w, c))
    }

    /// Number of objects of a class anywhere on the board.
    pub fn count(&self, class: ObjectClass) -> usize {
        self.cells
            .iter()
            .map(|c| c.objects.iter().filter(|o| o.class == class).count())
            .sum()
    }

    /// Coordinates (row-major) of every cell holding an object that
    /// satisfies `pred`.
    pub fn positions_of<F>(&self, pred: F) -> Vec<(i32, i32)>
    where
        F: Fn(ObjectClass) -> bool,
    {
        self.cells()
            .filter(|(_, _, c)| c.objects.iter().any(|o| pred(o.class)))
            .map(|(x, y, _)| (x, y))
            .collect()
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_half_open() {
        let b = Board::new(4, 3);
        assert!(b.in_bounds(0, 0));
        assert!(b.in_bounds(3, 2));
        assert!(!b.in_bounds(4, 0));
        assert!(!b.in_bounds(0, 3));
        assert!(!b.in_bounds(-1, 0));
        assert!(!b.in_bounds(0, -1));
    }

    #[test]
    fn default_play_area_is_whole_board() {
        let b = Board::new(4, 3);
        assert_eq!(b.play_area(), PlayArea { min_x: 0, min_y: 0, max_x: 3, max_y: 2 });
        assert!(b.in_play_area(3, 2));
        assert!(!b.in_play_area(4, 2));
    }

    #[test]
    fn play_area_is_inclusive_subset() {
        let mut b = Board::new(10, 10);
        b.set_play_area(PlayArea { min_x: 2, min_y: 3, max_x: 5, max_y: 6 });
        assert!(b.in_play_area(2, 3));
        assert!(b.in_play_area(5, 6));
        assert!(!b.in_play_area(1, 3));
        assert!(!b.in_play_area(6, 6));
        assert!(b.in_bounds(1, 3));
        assert_eq!(b.play_area().width(), 4);
        assert_eq!(b.play_area().height(), 4);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn out_of_bounds_access_fails_loudly() {
        let b = Board::new(2, 2);
        let _ = b.cell(2, 0);
    }

    #[test]
    fn stack_keeps_insertion_order() {
        let mut b = Board::new(2, 1);
        b.place(1, 0, ObjectClass::TextIs);
        b.place(1, 0, ObjectClass::Baba);
        let c = b.cell(1, 0);
        assert_eq!(c.front(), Some(ObjectClass::TextIs));
        assert_eq!(c.top(), Some(ObjectClass::Baba));
        assert!(b.cell(0, 0).is_empty());
        assert_eq!(b.cell(0, 0).front(), None);
    }

    #[test]
    fn cells_iterate_row_major() {
        let b = Board::new(3, 2);
        let coords: Vec<_> = b.cells().map(|(x, y, _)| (x, y)).collect();
        assert_eq!(coords, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
    }

    #[test]
    fn count_and_positions() {
        let mut b = Board::new(3, 3);
        b.place(0, 0, ObjectClass::Rock);
        b.place(2, 1, ObjectClass::Rock);
        b.place(2, 1, ObjectClass::Rock);
        b.place(1, 2, ObjectClass::Flag);
        assert_eq!(b.count(ObjectClass::Rock), 3);
        assert_eq!(b.positions_of(|c| c == ObjectClass::Rock), vec![(0, 0), (2, 1)]);
        assert!(b.positions_of(|c| c.is_word()).is_empty());
    }
}
