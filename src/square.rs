use serde::{Deserialize, Serialize};

/// Player-visible state of a single square.
///
/// `Covered`, `Flagged` and `Questioned` are the covered states a square
/// cycles through before it is opened; `Uncovered` carries the adjacent-mine
/// count in `[0, 8]`. The remaining variants only appear in the endgame
/// display: `Mine` marks an unflagged mine after a loss, `WrongFlag` a flag
/// that had no mine under it, and `ExplodedMine` the square that lost the
/// game.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SquareState {
    Covered,
    Flagged,
    Questioned,
    Uncovered(u8),
    Mine,
    WrongFlag,
    ExplodedMine,
}

impl SquareState {
    /// Whether the square has been opened, endgame markings included.
    pub const fn is_uncovered(self) -> bool {
        use SquareState::*;
        match self {
            Covered | Flagged | Questioned => false,
            Uncovered(_) | Mine | WrongFlag | ExplodedMine => true,
        }
    }

    pub const fn is_covered(self) -> bool {
        !self.is_uncovered()
    }
}

impl Default for SquareState {
    fn default() -> Self {
        Self::Covered
    }
}
