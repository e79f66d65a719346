/// Events emitted during a session update.
/// The presentation layer consumes these for sound and messages.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// At least one YOU object changed cell.
    Moved,
    /// A chain of pushable objects was shifted.
    Pushed,
    /// SINK objects were removed at a chain terminus.
    Absorbed { count: usize },
    /// The set of standing rules differs from before the step.
    RulesChanged,
    Won,
    Died,
    LevelLoaded { index: usize },
}
