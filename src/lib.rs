#![no_std]

extern crate alloc;

use core::ops::{Index, IndexMut};
use ndarray::Array2;
use rand::{Rng, RngExt};
use serde::{Deserialize, Serialize};

pub use error::*;
pub use reveal::*;
pub use square::*;
pub use types::*;

mod error;
mod reveal;
mod square;
mod types;

/// Game-mode selection: grid dimensions plus the target mine count.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Coord2,
    pub mines: CellCount,
}

impl GameConfig {
    pub const fn new(size: Coord2, mines: CellCount) -> Self {
        Self { size, mines }
    }

    /// Checks the construction contract: both dimensions positive and the
    /// mine count strictly below one third of the cell count. The density
    /// cap keeps rejection sampling in [`MineLayout::populate`] cheap.
    pub fn validate(self) -> Result<Self> {
        let (rows, cols) = self.size;
        if rows == 0 || cols == 0 {
            return Err(GameError::InvalidConfig);
        }
        if u32::from(self.mines) * 3 >= u32::from(self.total_cells()) {
            return Err(GameError::InvalidConfig);
        }
        Ok(self)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }
}

/// Ground-truth grid of mine positions for one game session.
///
/// The layout is mutable because a session reuses it across replays:
/// [`reset_empty`](Self::reset_empty) clears the grid and
/// [`populate`](Self::populate) lays a fresh set of mines. Between those two
/// calls `mine_count()` keeps reporting the configured target even though the
/// grid holds no mines; that divergence is part of the contract and is never
/// auto-corrected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MineLayout {
    mine_mask: Array2<bool>,
    mine_count: CellCount,
}

impl MineLayout {
    /// Builds a layout from explicit mine data, with `mine_count()` taken
    /// from the number of `true` cells. The mask is moved in, so no aliasing
    /// with the caller remains.
    pub fn from_mine_mask(mine_mask: Array2<bool>) -> Result<Self> {
        let (rows, cols) = mine_mask.dim();
        if rows == 0 || cols == 0 {
            return Err(GameError::InvalidConfig);
        }
        if rows > usize::from(Coord::MAX) || cols > usize::from(Coord::MAX) {
            return Err(GameError::InvalidConfig);
        }
        let mine_count = mine_mask
            .iter()
            .filter(|&&is_mine| is_mine)
            .count()
            .try_into()
            .unwrap();
        Ok(Self {
            mine_mask,
            mine_count,
        })
    }

    /// Builds a layout of `size` with mines at the listed coordinates.
    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let (rows, cols) = size;
        if rows == 0 || cols == 0 {
            return Err(GameError::InvalidConfig);
        }

        let mut mine_mask: Array2<bool> = Array2::default(size.to_grid_index());
        for &coords in mine_coords {
            if coords.0 >= rows || coords.1 >= cols {
                return Err(GameError::OutOfRange);
            }
            mine_mask[coords.to_grid_index()] = true;
        }

        Self::from_mine_mask(mine_mask)
    }

    /// Creates an all-empty layout whose mines are placed later by
    /// [`populate`](Self::populate). Until then `mine_count()` reports the
    /// target from `config` rather than the (zero) mines on the grid.
    pub fn empty(config: GameConfig) -> Result<Self> {
        let config = config.validate()?;
        Ok(Self {
            mine_mask: Array2::default(config.size.to_grid_index()),
            mine_count: config.mines,
        })
    }

    /// Removes any current mines, then places exactly `mine_count()` mines
    /// at distinct uniformly random cells, never at `avoid`.
    ///
    /// Placement is rejection sampling: draw a uniform cell and redraw when
    /// it is the avoided cell or already mined. The sub-third density cap
    /// keeps the expected number of redraws low.
    pub fn populate<R: Rng>(&mut self, avoid: Coord2, rng: &mut R) -> Result<()> {
        let avoid = self.validate_coords(avoid)?;
        self.mine_mask.fill(false);

        let (rows, cols) = self.size();
        let mut placed: CellCount = 0;
        while placed < self.mine_count {
            let coords = (rng.random_range(0..rows), rng.random_range(0..cols));
            if coords == avoid || self[coords] {
                continue;
            }
            self[coords] = true;
            placed += 1;
        }
        log::debug!("placed {} mines, avoiding {:?}", placed, avoid);
        Ok(())
    }

    /// Clears every mine. Dimensions and `mine_count()` are untouched, so
    /// the reported count diverges from the grid until the next
    /// [`populate`](Self::populate). This is the state a layout is in at the
    /// start of a game.
    pub fn reset_empty(&mut self) {
        self.mine_mask.fill(false);
    }

    pub fn in_range(&self, coords: Coord2) -> bool {
        let (rows, cols) = self.size();
        coords.0 < rows && coords.1 < cols
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if self.in_range(coords) {
            Ok(coords)
        } else {
            Err(GameError::OutOfRange)
        }
    }

    pub fn size(&self) -> Coord2 {
        let dim = self.mine_mask.dim();
        (dim.0.try_into().unwrap(), dim.1.try_into().unwrap())
    }

    pub fn total_cells(&self) -> CellCount {
        self.mine_mask.len().try_into().unwrap()
    }

    /// The configured number of mines. After [`empty`](Self::empty) or
    /// [`reset_empty`](Self::reset_empty) this differs from the mines
    /// actually on the grid; see the type docs.
    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    /// Number of squares a player has to open to win.
    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    /// Whether there is a mine at `coords`. Coordinates must be in range.
    pub fn contains_mine(&self, coords: Coord2) -> bool {
        self[coords]
    }

    /// Number of mines among the up-to-8 Moore neighbors of `coords`,
    /// excluding the square itself; in `[0, 8]`. Coordinates must be in
    /// range.
    pub fn adjacent_mine_count(&self, coords: Coord2) -> u8 {
        self.mine_mask
            .iter_neighbors(coords)
            .filter(|&pos| self[pos])
            .count()
            .try_into()
            .unwrap()
    }
}

impl Index<Coord2> for MineLayout {
    type Output = bool;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.mine_mask[coords.to_grid_index()]
    }
}

impl IndexMut<Coord2> for MineLayout {
    fn index_mut(&mut self, coords: Coord2) -> &mut Self::Output {
        &mut self.mine_mask[coords.to_grid_index()]
    }
}

/// Result of a flag-cycling action.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
}

impl MarkOutcome {
    /// Whether the action changed anything a view would redraw.
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Changed => true,
        }
    }
}
