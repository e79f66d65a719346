/// Capabilities granted to object classes by the active rules.
///
/// A `PropertyTable` answers "what is class X right now?". It is rebuilt
/// from scratch by the rule scanner after every step and never updated
/// incrementally.

use std::ops::{Index, IndexMut};

use super::object::ObjectClass;

/// One status a rule can grant.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Capability {
    You,
    Push,
    Stop,
    Win,
    Sink,
    Kill,
    Hot,
    Melt,
    Move,
    Open,
    Shut,
    Float,
}

impl Capability {
    /// Capability named by a status word. SWAP is a status word with no
    /// capability bit.
    pub fn from_status_word(word: ObjectClass) -> Option<Capability> {
        match word {
            ObjectClass::TextYou => Some(Capability::You),
            ObjectClass::TextPush => Some(Capability::Push),
            ObjectClass::TextStop => Some(Capability::Stop),
            ObjectClass::TextWin => Some(Capability::Win),
            ObjectClass::TextSink => Some(Capability::Sink),
            ObjectClass::TextKill => Some(Capability::Kill),
            ObjectClass::TextHot => Some(Capability::Hot),
            ObjectClass::TextMelt => Some(Capability::Melt),
            ObjectClass::TextMove => Some(Capability::Move),
            ObjectClass::TextOpen => Some(Capability::Open),
            ObjectClass::TextShut => Some(Capability::Shut),
            ObjectClass::TextFloat => Some(Capability::Float),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Capabilities {
    pub you: bool,
    pub push: bool,
    pub stop: bool,
    pub win: bool,
    pub sink: bool,
    pub kill: bool,
    pub hot: bool,
    pub melt: bool,
    pub moves: bool,
    pub open: bool,
    pub shut: bool,
    pub float: bool,
}

impl Capabilities {
    pub fn set(&mut self, cap: Capability) {
        *self.slot(cap) = true;
    }

    /// Stops movers and cannot be pushed out of the way.
    #[inline]
    pub fn blocks(&self) -> bool {
        self.stop && !self.push
    }

    fn slot(&mut self, cap: Capability) -> &mut bool {
        match cap {
            Capability::You => &mut self.you,
            Capability::Push => &mut self.push,
            Capability::Stop => &mut self.stop,
            Capability::Win => &mut self.win,
            Capability::Sink => &mut self.sink,
            Capability::Kill => &mut self.kill,
            Capability::Hot => &mut self.hot,
            Capability::Melt => &mut self.melt,
            Capability::Move => &mut self.moves,
            Capability::Open => &mut self.open,
            Capability::Shut => &mut self.shut,
            Capability::Float => &mut self.float,
        }
    }
}

/// One `Capabilities` entry per `ObjectClass`, indexed by class.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PropertyTable {
    entries: [Capabilities; ObjectClass::COUNT],
}

impl PropertyTable {
    /// All-false table. Run the rule scanner before using it for movement.
    pub fn new() -> Self {
        PropertyTable { entries: [Capabilities::default(); ObjectClass::COUNT] }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectClass, &Capabilities)> + '_ {
        ObjectClass::ALL.iter().copied().zip(self.entries.iter())
    }

    /// Clear every entry to all-false.
    pub(crate) fn clear(&mut self) {
        self.entries = [Capabilities::default(); ObjectClass::COUNT];
    }
}

impl Default for PropertyTable {
    fn default() -> Self {
        PropertyTable::new()
    }
}

impl Index<ObjectClass> for PropertyTable {
    type Output = Capabilities;

    fn index(&self, class: ObjectClass) -> &Capabilities {
        &self.entries[class.index()]
    }
}

impl IndexMut<ObjectClass> for PropertyTable {
    fn index_mut(&mut self, class: ObjectClass) -> &mut Capabilities {
        &mut self.entries[class.index()]
    }
}
