/// Object classes and their word vocabulary.
///
/// Physical kinds and text tokens share one closed enum. Classification
/// (word / subject / status) is centralized here so the rule scanner and
/// the movement resolver never test raw codes.
///
/// Byte codes are stable: level data is stored as flat `u8` sequences.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum ObjectClass {
    #[default]
    Empty = 0,

    // Physical objects
    Baba,
    Wall,
    Rock,
    Flag,
    Lava,
    Goop,
    Love,

    // Nouns
    TextBaba,
    TextWall,
    TextRock,
    TextFlag,
    TextLava,
    TextGoop,
    TextLove,
    TextEmpty,

    // Verb + statuses
    TextIs,
    TextPush,
    TextStop,
    TextWin,
    TextYou,
    TextSink,
    TextKill,
    TextSwap,
    TextHot,
    TextMelt,
    TextMove,
    TextOpen,
    TextShut,
    TextFloat,
}

impl ObjectClass {
    /// Number of classes; size of every per-class table.
    pub const COUNT: usize = 30;

    /// Every class in code order.
    pub const ALL: [ObjectClass; ObjectClass::COUNT] = [
        ObjectClass::Empty,
        ObjectClass::Baba,
        ObjectClass::Wall,
        ObjectClass::Rock,
        ObjectClass::Flag,
        ObjectClass::Lava,
        ObjectClass::Goop,
        ObjectClass::Love,
        ObjectClass::TextBaba,
        ObjectClass::TextWall,
        ObjectClass::TextRock,
        ObjectClass::TextFlag,
        ObjectClass::TextLava,
        ObjectClass::TextGoop,
        ObjectClass::TextLove,
        ObjectClass::TextEmpty,
        ObjectClass::TextIs,
        ObjectClass::TextPush,
        ObjectClass::TextStop,
        ObjectClass::TextWin,
        ObjectClass::TextYou,
        ObjectClass::TextSink,
        ObjectClass::TextKill,
        ObjectClass::TextSwap,
        ObjectClass::TextHot,
        ObjectClass::TextMelt,
        ObjectClass::TextMove,
        ObjectClass::TextOpen,
        ObjectClass::TextShut,
        ObjectClass::TextFloat,
    ];

    /// Decode a level byte. Unknown codes yield `None`; the loader treats
    /// that as an empty placement.
    pub fn from_code(code: u8) -> Option<ObjectClass> {
        Self::ALL.get(code as usize).copied()
    }

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Is this a floating text token? Words are always pushable.
    pub fn is_word(self) -> bool {
        self >= ObjectClass::TextBaba
    }

    /// Can this word stand in the SUBJECT slot of a rule?
    pub fn is_subject_word(self) -> bool {
        matches!(
            self,
            ObjectClass::TextBaba
                | ObjectClass::TextWall
                | ObjectClass::TextRock
                | ObjectClass::TextFlag
                | ObjectClass::TextLava
                | ObjectClass::TextGoop
                | ObjectClass::TextLove
                | ObjectClass::TextEmpty
        )
    }

    /// Can this word stand in the STATUS slot of a rule?
    pub fn is_status_word(self) -> bool {
        matches!(
            self,
            ObjectClass::TextPush
                | ObjectClass::TextStop
                | ObjectClass::TextWin
                | ObjectClass::TextYou
                | ObjectClass::TextSink
                | ObjectClass::TextKill
                | ObjectClass::TextSwap
                | ObjectClass::TextHot
                | ObjectClass::TextMelt
                | ObjectClass::TextMove
                | ObjectClass::TextOpen
                | ObjectClass::TextShut
                | ObjectClass::TextFloat
        )
    }

    /// Physical class a subject word refers to (TEXT_ROCK → ROCK).
    /// Non-subjects map to `None`.
    pub fn referent(self) -> Option<ObjectClass> {
        match self {
            ObjectClass::TextBaba => Some(ObjectClass::Baba),
            ObjectClass::TextWall => Some(ObjectClass::Wall),
            ObjectClass::TextRock => Some(ObjectClass::Rock),
            ObjectClass::TextFlag => Some(ObjectClass::Flag),
            ObjectClass::TextLava => Some(ObjectClass::Lava),
            ObjectClass::TextGoop => Some(ObjectClass::Goop),
            ObjectClass::TextLove => Some(ObjectClass::Love),
            ObjectClass::TextEmpty => Some(ObjectClass::Empty),
            _ => None,
        }
    }

    /// Level-file legend character.
    pub fn legend(self) -> char {
        match self {
            ObjectClass::Empty => '.',
            ObjectClass::Baba => 'b',
            ObjectClass::Wall => 'w',
            ObjectClass::Rock => 'r',
            ObjectClass::Flag => 'f',
            ObjectClass::Lava => 'l',
            ObjectClass::Goop => 'g',
            ObjectClass::Love => 'v',
            ObjectClass::TextBaba => 'B',
            ObjectClass::TextWall => 'W',
            ObjectClass::TextRock => 'R',
            ObjectClass::TextFlag => 'F',
            ObjectClass::TextLava => 'L',
            ObjectClass::TextGoop => 'G',
            ObjectClass::TextLove => 'V',
            ObjectClass::TextEmpty => 'E',
            ObjectClass::TextIs => '=',
            ObjectClass::TextPush => 'P',
            ObjectClass::TextStop => 'S',
            ObjectClass::TextWin => '!',
            ObjectClass::TextYou => 'Y',
            ObjectClass::TextSink => 'N',
            ObjectClass::TextKill => 'K',
            ObjectClass::TextSwap => 'X',
            ObjectClass::TextHot => 'H',
            ObjectClass::TextMelt => 'M',
            ObjectClass::TextMove => '>',
            ObjectClass::TextOpen => 'O',
            ObjectClass::TextShut => 'C',
            ObjectClass::TextFloat => '^',
        }
    }

    /// Inverse of `legend()`. A space reads as empty; anything else
    /// unknown is `None`.
    pub fn from_legend(ch: char) -> Option<ObjectClass> {
        if ch == ' ' {
            return Some(ObjectClass::Empty);
        }
        Self::ALL.iter().copied().find(|c| c.legend() == ch)
    }

    /// Upper-case name as it reads inside a rule ("BABA", "IS", "YOU").
    pub fn word_name(self) -> &'static str {
        match self {
            ObjectClass::Empty | ObjectClass::TextEmpty => "EMPTY",
            ObjectClass::Baba | ObjectClass::TextBaba => "BABA",
            ObjectClass::Wall | ObjectClass::TextWall => "WALL",
            ObjectClass::Rock | ObjectClass::TextRock => "ROCK",
            ObjectClass::Flag | ObjectClass::TextFlag => "FLAG",
            ObjectClass::Lava | ObjectClass::TextLava => "LAVA",
            ObjectClass::Goop | ObjectClass::TextGoop => "GOOP",
            ObjectClass::Love | ObjectClass::TextLove => "LOVE",
            ObjectClass::TextIs => "IS",
            ObjectClass::TextPush => "PUSH",
            ObjectClass::TextStop => "STOP",
            ObjectClass::TextWin => "WIN",
            ObjectClass::TextYou => "YOU",
            ObjectClass::TextSink => "SINK",
            ObjectClass::TextKill => "KILL",
            ObjectClass::TextSwap => "SWAP",
            ObjectClass::TextHot => "HOT",
            ObjectClass::TextMelt => "MELT",
            ObjectClass::TextMove => "MOVE",
            ObjectClass::TextOpen => "OPEN",
            ObjectClass::TextShut => "SHUT",
            ObjectClass::TextFloat => "FLOAT",
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.word_name())
    }
}

/// One thing standing on the board. Carries nothing but its class.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Object {
    pub class: ObjectClass,
}

impl Object {
    pub fn new(class: ObjectClass) -> Self {
        Object { class }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_table_order() {
        for (i, class) in ObjectClass::ALL.iter().enumerate() {
            assert_eq!(class.index(), i);
            assert_eq!(ObjectClass::from_code(i as u8), Some(*class));
        }
        assert_eq!(ObjectClass::from_code(ObjectClass::COUNT as u8), None);
        assert_eq!(ObjectClass::from_code(255), None);
    }

    #[test]
    fn default_class_is_empty() {
        assert_eq!(ObjectClass::default(), ObjectClass::Empty);
        assert_eq!(ObjectClass::default().code(), 0);
    }

    #[test]
    fn words_start_at_text_baba() {
        assert!(!ObjectClass::Love.is_word());
        assert!(!ObjectClass::Empty.is_word());
        assert!(ObjectClass::TextBaba.is_word());
        assert!(ObjectClass::TextIs.is_word());
        assert!(ObjectClass::TextFloat.is_word());
    }

    #[test]
    fn grammar_words_are_never_subjects() {
        assert!(!ObjectClass::TextIs.is_subject_word());
        assert!(!ObjectClass::TextYou.is_subject_word());
        assert!(!ObjectClass::Baba.is_subject_word());
        assert!(ObjectClass::TextEmpty.is_subject_word());
    }

    #[test]
    fn status_set_is_closed() {
        let statuses: Vec<_> = ObjectClass::ALL
            .iter()
            .filter(|c| c.is_status_word())
            .collect();
        assert_eq!(statuses.len(), 13);
        assert!(!ObjectClass::TextIs.is_status_word());
        assert!(!ObjectClass::TextRock.is_status_word());
        assert!(ObjectClass::TextSwap.is_status_word());
    }

    #[test]
    fn referents_are_physical() {
        for class in ObjectClass::ALL {
            match class.referent() {
                Some(target) => {
                    assert!(class.is_subject_word());
                    assert!(!target.is_word());
                }
                None => assert!(!class.is_subject_word()),
            }
        }
    }

    #[test]
    fn legend_is_a_bijection() {
        for class in ObjectClass::ALL {
            assert_eq!(ObjectClass::from_legend(class.legend()), Some(class));
        }
        assert_eq!(ObjectClass::from_legend(' '), Some(ObjectClass::Empty));
        assert_eq!(ObjectClass::from_legend('?'), None);
    }
}
