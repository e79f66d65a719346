/// Movement resolver: one grid-aligned step for every YOU object.
///
/// ## Processing order
///
///   1. Snapshot every cell holding a YOU object (row-major).
///   2. For each snapshot cell, *inspect* the move and build a `Plan`
///      without touching the board.
///   3. Commit the plan: absorb SINK objects at the chain terminus, shift
///      the chain tail-to-head, then move the cell's YOU objects.
///   4. After all movers: scan every cell for WIN / KILL / SINK overlap.
///
/// A failed plan is a silent no-op for that mover only.
///
/// ## Plan truth table
///
/// ┌────────────────────────────────────────────┬─────────────┐
/// │ Condition (in order)                        │ Plan        │
/// ├────────────────────────────────────────────┼─────────────┤
/// │ target off the grid or outside play area    │ Blocked     │
/// │ any cell walked holds STOP without PUSH     │ Blocked     │
/// │ chain empty, target holds a STOP object     │ Blocked     │
/// │ chain empty                                 │ Walk        │
/// │ terminus off the grid or outside play area  │ Blocked     │
/// │ terminus empty                              │ Push        │
/// │ terminus holds only SINK objects            │ Push+absorb │
/// │ otherwise                                   │ Blocked     │
/// └────────────────────────────────────────────┴─────────────┘
///
/// "Chain" = the run of cells ahead of the mover in which *every* object
/// is PUSH. A target that is only partly pushable gives an empty chain,
/// so the mover overlaps it instead of pushing.
///
/// ## Double-step guard
///
/// A YOU object that has already moved this step (walked, or was pushed
/// as part of a chain) must not move again when its new cell comes up in
/// the snapshot. Objects have no identity, so `Ledger` counts, per cell,
/// how many of its YOU objects already moved. Arrivals are always
/// appended, so those are the last `n` YOU objects of the stack.

use log::debug;

use super::board::Board;
use super::object::Object;
use super::properties::{Capabilities, PropertyTable};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Direction {
    #[default]
    None,
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::None => (0, 0),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
        }
    }
}

/// Outcome of one step. Valid for that step only.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct MoveResult {
    /// A YOU object shares a cell with a WIN object.
    pub has_won: bool,
    /// A YOU object shares a cell with a KILL or SINK object.
    pub has_died: bool,
    /// At least one YOU object changed cell.
    pub moved: bool,
    /// At least one chain was shifted.
    pub pushed: bool,
    /// SINK objects removed at chain termini.
    pub absorbed: usize,
}

/// Inspection result for one mover.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Plan {
    Blocked,
    Walk,
    Push { chain: Vec<(i32, i32)>, absorb: bool },
}

/// Per-cell count of YOU objects that already moved during this step.
struct Ledger {
    moved_you: Vec<usize>,
}

impl Ledger {
    fn new(board: &Board) -> Self {
        Ledger { moved_you: vec![0; (board.width() * board.height()) as usize] }
    }
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Apply one step in `dir` to every YOU object, then scan for effects.
pub fn step(board: &mut Board, table: &PropertyTable, dir: Direction) -> MoveResult {
    let (dx, dy) = dir.delta();
    step_delta(board, table, dx, dy)
}

/// Raw-delta form of `step`. Only unit moves along one axis do anything;
/// `(0, 0)`, diagonals and longer deltas leave the board untouched (the
/// effect scan still runs).
pub fn step_delta(board: &mut Board, table: &PropertyTable, dx: i32, dy: i32) -> MoveResult {
    let mut result = MoveResult::default();

    if dx.abs() + dy.abs() == 1 {
        let snapshot = board.positions_of(|c| table[c].you);
        let mut ledger = Ledger::new(board);
        for (x, y) in snapshot {
            resolve_mover(board, table, &mut ledger, x, y, dx, dy, &mut result);
        }
    }

    scan_effects(board, table, &mut result);
    result
}

// ══════════════════════════════════════════════════════════════
// Inspection
// ══════════════════════════════════════════════════════════════

#[allow(clippy::too_many_arguments)]
fn resolve_mover(
    board: &mut Board,
    table: &PropertyTable,
    ledger: &mut Ledger,
    x: i32,
    y: i32,
    dx: i32,
    dy: i32,
    result: &mut MoveResult,
) {
    if fresh_you_count(board, table, ledger, x, y) == 0 {
        return;
    }

    match plan_move(board, table, x, y, dx, dy) {
        Plan::Blocked => {
            debug!("mover at ({x}, {y}) blocked going ({dx}, {dy})");
        }
        Plan::Walk => {
            move_fresh_you(board, table, ledger, (x, y), (x + dx, y + dy));
            result.moved = true;
        }
        Plan::Push { chain, absorb } => {
            commit_chain(board, table, ledger, &chain, absorb, dx, dy, result);
            move_fresh_you(board, table, ledger, (x, y), (x + dx, y + dy));
            result.moved = true;
            result.pushed = true;
        }
    }
}

/// Decide what a mover at `(x, y)` can do. Reads the board only.
fn plan_move(board: &Board, table: &PropertyTable, x: i32, y: i32, dx: i32, dy: i32) -> Plan {
    let (nx, ny) = (x + dx, y + dy);
    if !walkable(board, nx, ny) {
        return Plan::Blocked;
    }

    let mut chain = Vec::new();
    let (mut cx, mut cy) = (nx, ny);
    while walkable(board, cx, cy) {
        let objects = &board.cell(cx, cy).objects;
        if objects.is_empty() {
            break;
        }
        if any(table, objects, Capabilities::blocks) {
            return Plan::Blocked;
        }
        if !all(table, objects, |c| c.push) {
            break;
        }
        chain.push((cx, cy));
        cx += dx;
        cy += dy;
    }

    if chain.is_empty() {
        // Overlap: allowed onto anything that does not STOP.
        let target = &board.cell(nx, ny).objects;
        return if any(table, target, |c| c.stop) { Plan::Blocked } else { Plan::Walk };
    }

    if !walkable(board, cx, cy) {
        return Plan::Blocked;
    }
    let terminus = &board.cell(cx, cy).objects;
    if terminus.is_empty() {
        Plan::Push { chain, absorb: false }
    } else if all(table, terminus, |c| c.sink) {
        Plan::Push { chain, absorb: true }
    } else {
        Plan::Blocked
    }
}

#[inline]
fn walkable(board: &Board, x: i32, y: i32) -> bool {
    board.in_bounds(x, y) && board.in_play_area(x, y)
}

fn any(table: &PropertyTable, objects: &[Object], pred: impl Fn(&Capabilities) -> bool) -> bool {
    objects.iter().any(|o| pred(&table[o.class]))
}

fn all(table: &PropertyTable, objects: &[Object], pred: impl Fn(&Capabilities) -> bool) -> bool {
    objects.iter().all(|o| pred(&table[o.class]))
}

fn fresh_you_count(board: &Board, table: &PropertyTable, ledger: &Ledger, x: i32, y: i32) -> usize {
    let you = board.cell(x, y).objects.iter().filter(|o| table[o.class].you).count();
    you.saturating_sub(ledger.moved_you[board.index(x, y)])
}

// ══════════════════════════════════════════════════════════════
// Commit (never fails once a plan exists)
// ══════════════════════════════════════════════════════════════

#[allow(clippy::too_many_arguments)]
fn commit_chain(
    board: &mut Board,
    table: &PropertyTable,
    ledger: &mut Ledger,
    chain: &[(i32, i32)],
    absorb: bool,
    dx: i32,
    dy: i32,
    result: &mut MoveResult,
) {
    let Some(&(lx, ly)) = chain.last() else { return };
    let (fx, fy) = (lx + dx, ly + dy);

    if absorb {
        let sunk = std::mem::take(&mut board.cell_mut(fx, fy).objects);
        debug!("absorbed {} object(s) at ({fx}, {fy})", sunk.len());
        result.absorbed += sunk.len();
        let idx = board.index(fx, fy);
        ledger.moved_you[idx] = 0;
    }

    // Furthest cell first so nothing lands on a cell that has yet to move.
    for &(cx, cy) in chain.iter().rev() {
        shift_pushables(board, table, ledger, (cx, cy), (cx + dx, cy + dy));
    }
}

/// Move every PUSH object of `from` onto `to`, leaving the rest behind.
fn shift_pushables(
    board: &mut Board,
    table: &PropertyTable,
    ledger: &mut Ledger,
    from: (i32, i32),
    to: (i32, i32),
) {
    let from_idx = board.index(from.0, from.1);
    let to_idx = board.index(to.0, to.1);

    let objects = std::mem::take(&mut board.cell_mut(from.0, from.1).objects);
    let you_total = objects.iter().filter(|o| table[o.class].you).count();
    let first_moved = you_total.saturating_sub(ledger.moved_you[from_idx]);

    let mut stay = Vec::with_capacity(objects.len());
    let mut go = Vec::with_capacity(objects.len());
    let mut you_seen = 0;
    let mut go_you = 0;
    let mut stay_moved_you = 0;
    for obj in objects {
        let caps = &table[obj.class];
        if caps.you {
            let already_moved = you_seen >= first_moved;
            you_seen += 1;
            if caps.push {
                go_you += 1;
            } else if already_moved {
                stay_moved_you += 1;
            }
        }
        if caps.push { go.push(obj) } else { stay.push(obj) }
    }

    board.cell_mut(from.0, from.1).objects = stay;
    board.cell_mut(to.0, to.1).objects.extend(go);
    ledger.moved_you[from_idx] = stay_moved_you;
    ledger.moved_you[to_idx] += go_you;
}

/// Move the YOU objects of `from` that have not moved yet onto `to`.
/// Everything else (flags, already-moved movers) stays put.
fn move_fresh_you(
    board: &mut Board,
    table: &PropertyTable,
    ledger: &mut Ledger,
    from: (i32, i32),
    to: (i32, i32),
) {
    let from_idx = board.index(from.0, from.1);
    let to_idx = board.index(to.0, to.1);

    let objects = std::mem::take(&mut board.cell_mut(from.0, from.1).objects);
    let you_total = objects.iter().filter(|o| table[o.class].you).count();
    let fresh = you_total.saturating_sub(ledger.moved_you[from_idx]);

    let mut stay = Vec::with_capacity(objects.len());
    let mut go = Vec::with_capacity(fresh);
    for obj in objects {
        if table[obj.class].you && go.len() < fresh {
            go.push(obj);
        } else {
            stay.push(obj);
        }
    }

    let moved = go.len();
    board.cell_mut(from.0, from.1).objects = stay;
    board.cell_mut(to.0, to.1).objects.extend(go);
    ledger.moved_you[to_idx] += moved;
}

// ══════════════════════════════════════════════════════════════
// Effects
// ══════════════════════════════════════════════════════════════

fn scan_effects(board: &Board, table: &PropertyTable, result: &mut MoveResult) {
    for (_, _, cell) in board.cells() {
        let objects = &cell.objects;
        if !any(table, objects, |c| c.you) {
            continue;
        }
        if any(table, objects, |c| c.win) {
            result.has_won = true;
        }
        if any(table, objects, |c| c.kill || c.sink) {
            result.has_died = true;
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
