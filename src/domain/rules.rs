/// Rule scanner: SUBJECT IS STATUS sentences → property table.
///
/// ## Scan
///
/// Every window of three consecutive cells is inspected, first along rows
/// (`(x,y) (x+1,y) (x+2,y)`), then along columns (`(x,y) (x,y+1) (x,y+2)`).
/// Only the front object of each cell is read.
///
/// ┌──────────────────────────────────────┬──────────────┐
/// │ Condition                             │ Result       │
/// ├──────────────────────────────────────┼──────────────┤
/// │ any of the three cells empty          │ skip         │
/// │ middle token is not IS                │ skip         │
/// │ first token is not a subject word     │ skip         │
/// │ third token is not a status word      │ skip         │
/// │ otherwise                             │ set bit      │
/// └──────────────────────────────────────┴──────────────┘
///
/// Bits are only ever set during a parse, so the order in which windows
/// are visited cannot change the outcome. `reset` is the only way a bit
/// goes back to false.

use std::fmt;

use super::board::Board;
use super::object::ObjectClass;
use super::properties::{Capability, PropertyTable};

/// Three cells in a line, in reading order.
pub type Window = [(i32, i32); 3];

/// A sentence currently standing on the board.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Rule {
    /// Physical class the rule applies to.
    pub subject: ObjectClass,
    /// Status word granting the capability.
    pub status: ObjectClass,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} IS {}", self.subject.word_name(), self.status.word_name())
    }
}

/// Clear every entry, then make all words pushable.
pub fn reset(table: &mut PropertyTable) {
    table.clear();
    for class in ObjectClass::ALL {
        if class.is_word() {
            table[class].push = true;
        }
    }
}

/// Re-derive the whole table from the board.
pub fn parse(board: &Board, table: &mut PropertyTable) {
    reset(table);
    for window in windows(board) {
        if let Some(rule) = read_window(board, &window) {
            apply(table, rule);
        }
    }
}

/// Every rule on the board, in scan order, without duplicates.
pub fn active_rules(board: &Board) -> Vec<Rule> {
    let mut rules: Vec<Rule> = Vec::new();
    for window in windows(board) {
        if let Some(rule) = read_window(board, &window) {
            if !rules.contains(&rule) {
                rules.push(rule);
            }
        }
    }
    rules
}

/// All three-cell windows: horizontal (row-major) then vertical
/// (column by column).
pub fn windows(board: &Board) -> Vec<Window> {
    let (w, h) = (board.width(), board.height());
    let mut out = Vec::new();
    for y in 0..h {
        for x in 0..w - 2 {
            out.push([(x, y), (x + 1, y), (x + 2, y)]);
        }
    }
    for x in 0..w {
        for y in 0..h - 2 {
            out.push([(x, y), (x, y + 1), (x, y + 2)]);
        }
    }
    out
}

/// Read the front tokens of a window as a rule, if they form one.
pub fn read_window(board: &Board, window: &Window) -> Option<Rule> {
    let [a, b, c] = window.map(|(x, y)| board.cell(x, y).front());
    let (a, b, c) = (a?, b?, c?);

    if b != ObjectClass::TextIs {
        return None;
    }
    if !a.is_subject_word() || !c.is_status_word() {
        return None;
    }
    let subject = a.referent()?;
    Some(Rule { subject, status: c })
}

/// OR a rule into the table.
pub fn apply(table: &mut PropertyTable, rule: Rule) {
    if let Some(cap) = Capability::from_status_word(rule.status) {
        table[rule.subject].set(cap);
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::board_from;
    use proptest::prelude::*;

    fn parsed(rows: &[&str]) -> PropertyTable {
        let board = board_from(rows);
        let mut t = PropertyTable::new();
        parse(&board, &mut t);
        t
    }

    // ── Reset ──

    #[test]
    fn reset_makes_only_words_pushable() {
        let mut t = PropertyTable::new();
        t[ObjectClass::Baba].you = true;
        t[ObjectClass::Rock].stop = true;
        reset(&mut t);
        for (class, caps) in t.iter() {
            let mut expected = crate::domain::properties::Capabilities::default();
            expected.push = class.is_word();
            assert_eq!(*caps, expected, "{class:?}");
        }
    }

    // ── Horizontal / vertical ──

    #[test]
    fn horizontal_rule() {
        let t = parsed(&["BBB", "B=Y", "..."]);
        assert!(t[ObjectClass::Baba].you);
        assert!(!t[ObjectClass::Baba].push);
    }

    #[test]
    fn vertical_rule() {
        let t = parsed(&[
            "R.",
            "=.",
            "P.",
        ]);
        assert!(t[ObjectClass::Rock].push);
    }

    #[test]
    fn rule_at_far_edge_is_read() {
        let t = parsed(&["....F=!"]);
        assert!(t[ObjectClass::Flag].win);
    }

    #[test]
    fn reversed_sentence_is_ignored() {
        let t = parsed(&["Y=B"]);
        assert!(!t[ObjectClass::Baba].you);
    }

    #[test]
    fn gap_breaks_sentence() {
        let t = parsed(&["B.=Y", "B=.Y"]);
        assert!(!t[ObjectClass::Baba].you);
    }

    #[test]
    fn grammar_word_in_subject_slot_is_skipped() {
        let t = parsed(&["==Y", "Y=P"]);
        for (_, caps) in t.iter() {
            assert!(!caps.you);
        }
    }

    #[test]
    fn object_in_subject_slot_is_skipped() {
        // A physical Baba is not the word BABA.
        let t = parsed(&["b=Y"]);
        assert!(!t[ObjectClass::Baba].you);
    }

    #[test]
    fn non_status_third_word_is_skipped() {
        // BABA IS ROCK is a transformation rule: recognised as nothing here.
        let t = parsed(&["B=R"]);
        assert_eq!(t[ObjectClass::Baba], Default::default());
    }

    #[test]
    fn swap_is_recognised_but_sets_no_bit() {
        let board = board_from(&["B=X"]);
        assert_eq!(
            active_rules(&board),
            vec![Rule { subject: ObjectClass::Baba, status: ObjectClass::TextSwap }]
        );
        let mut t = PropertyTable::new();
        parse(&board, &mut t);
        assert_eq!(t[ObjectClass::Baba], Default::default());
    }

    #[test]
    fn advanced_properties_are_stored() {
        let t = parsed(&[
            "L=H",
            "G=M",
            "W=>",
            "R=O",
            "F=C",
            "V=^",
        ]);
        assert!(t[ObjectClass::Lava].hot);
        assert!(t[ObjectClass::Goop].melt);
        assert!(t[ObjectClass::Wall].moves);
        assert!(t[ObjectClass::Rock].open);
        assert!(t[ObjectClass::Flag].shut);
        assert!(t[ObjectClass::Love].float);
    }

    #[test]
    fn empty_subject_writes_empty_entry() {
        let t = parsed(&["E=S"]);
        assert!(t[ObjectClass::Empty].stop);
    }

    #[test]
    fn shared_is_reads_both_axes() {
        // BABA IS YOU across, ROCK IS PUSH down through the same IS.
        let t = parsed(&[
            ".R.",
            "B=Y",
            ".P.",
        ]);
        assert!(t[ObjectClass::Baba].you);
        assert!(t[ObjectClass::Rock].push);
    }

    #[test]
    fn multiple_rules_accumulate() {
        let t = parsed(&["B=Y", "B=!", "W=S"]);
        assert!(t[ObjectClass::Baba].you);
        assert!(t[ObjectClass::Baba].win);
        assert!(t[ObjectClass::Wall].stop);
    }

    // ── Front-of-stack only ──

    #[test]
    fn buried_word_is_invisible() {
        let mut board = board_from(&["B.Y"]);
        board.place(1, 0, ObjectClass::Rock);
        board.place(1, 0, ObjectClass::TextIs);
        let mut t = PropertyTable::new();
        parse(&board, &mut t);
        assert!(!t[ObjectClass::Baba].you);
    }

    #[test]
    fn word_on_front_with_object_behind_is_read() {
        let mut board = board_from(&["B=Y"]);
        board.place(1, 0, ObjectClass::Rock);
        let mut t = PropertyTable::new();
        parse(&board, &mut t);
        assert!(t[ObjectClass::Baba].you);
    }

    // ── Rebuild semantics ──

    #[test]
    fn parse_forgets_broken_rules() {
        let mut board = board_from(&["B=Y"]);
        let mut t = PropertyTable::new();
        parse(&board, &mut t);
        assert!(t[ObjectClass::Baba].you);

        board.cell_mut(1, 0).objects.clear();
        parse(&board, &mut t);
        assert!(!t[ObjectClass::Baba].you);
    }

    #[test]
    fn tiny_boards_do_not_scan() {
        let t = parsed(&["B=", "=Y"]);
        assert!(!t[ObjectClass::Baba].you);
    }

    #[test]
    fn active_rules_deduplicates_and_displays() {
        let board = board_from(&["B=Y", "...", "B=Y"]);
        let rules = active_rules(&board);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].to_string(), "BABA IS YOU");
    }

    // ── Properties ──

    const ALPHABET: &str = ".bwrfBWRF=PSY!NKX";

    fn arb_board() -> impl Strategy<Value = Board> {
        (1usize..7, 1usize..7).prop_flat_map(|(w, h)| {
            proptest::collection::vec(0..ALPHABET.len(), w * h).prop_map(move |picks| {
                let mut board = Board::new(w, h);
                for (i, p) in picks.into_iter().enumerate() {
                    let ch = ALPHABET.as_bytes()[p] as char;
                    let class = ObjectClass::from_legend(ch).unwrap_or_default();
                    if class != ObjectClass::Empty {
                        board.place((i % w) as i32, (i / w) as i32, class);
                    }
                }
                board
            })
        })
    }

    proptest! {
        #[test]
        fn parse_is_idempotent(board in arb_board()) {
            let mut once = PropertyTable::new();
            parse(&board, &mut once);
            let mut twice = once;
            parse(&board, &mut twice);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn scan_order_does_not_matter(
            (board, order) in arb_board().prop_flat_map(|board| {
                let order = Just(windows(&board)).prop_shuffle();
                (Just(board), order)
            }),
        ) {
            let mut expected = PropertyTable::new();
            parse(&board, &mut expected);

            let mut actual = PropertyTable::new();
            reset(&mut actual);
            for window in &order {
                if let Some(rule) = read_window(&board, window) {
                    apply(&mut actual, rule);
                }
            }
            prop_assert_eq!(expected, actual);
        }
    }
}
