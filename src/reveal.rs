use alloc::collections::{BTreeSet, VecDeque};
use core::num::Saturating;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Player-visible side of a game: one [`SquareState`] per square, layered
/// over the [`MineLayout`] it covers.
///
/// Together with its layout this is the whole model of a game in play; the
/// view polls [`status`](Self::status), [`mines_left`](Self::mines_left) and
/// [`is_game_over`](Self::is_game_over), the controller routes player input
/// to [`cycle_flag`](Self::cycle_flag) and [`reveal`](Self::reveal).
///
/// The layout stays reachable through [`layout`](Self::layout) and
/// [`layout_mut`](Self::layout_mut), so a caller replays on the same wrapper
/// by clearing and repopulating the layout between games, paired with
/// [`reset_display`](Self::reset_display).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevealState {
    layout: MineLayout,
    squares: Array2<SquareState>,
    uncovered_count: Saturating<CellCount>,
    flag_count: Saturating<CellCount>,
}

impl RevealState {
    /// Wraps `layout` with every square covered, nothing flagged, and the
    /// game not over.
    pub fn new(layout: MineLayout) -> Self {
        let size = layout.size();
        Self {
            layout,
            squares: Array2::default(size.to_grid_index()),
            uncovered_count: Saturating(0),
            flag_count: Saturating(0),
        }
    }

    pub fn layout(&self) -> &MineLayout {
        &self.layout
    }

    /// Mutable access to the covered layout, for repopulating it between
    /// games. The status grid is left alone; call
    /// [`reset_display`](Self::reset_display) alongside.
    pub fn layout_mut(&mut self) -> &mut MineLayout {
        &mut self.layout
    }

    pub fn size(&self) -> Coord2 {
        self.layout.size()
    }

    /// Visible status of the square at `coords`. Coordinates must be in
    /// range.
    pub fn status(&self, coords: Coord2) -> SquareState {
        self.squares[coords.to_grid_index()]
    }

    /// Whether the square at `coords` is in any uncovered state, endgame
    /// markings included. Coordinates must be in range.
    pub fn is_uncovered(&self, coords: Coord2) -> bool {
        self.status(coords).is_uncovered()
    }

    /// How many mines remain unflagged going by the player's own count;
    /// negative once more flags are placed than mines exist.
    pub fn mines_left(&self) -> isize {
        (self.layout.mine_count() as isize) - (self.flag_count.0 as isize)
    }

    /// Whether the game has ended: a mine exploded, or every safe square is
    /// open.
    pub fn is_game_over(&self) -> bool {
        self.squares
            .iter()
            .any(|&square| square == SquareState::ExplodedMine)
            || self.uncovered_count == Saturating(self.layout.safe_cell_count())
    }

    /// Cycles the covered marking of the square at `coords`:
    /// covered -> flagged -> questioned -> covered. Uncovered squares do not
    /// respond.
    pub fn cycle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        use MarkOutcome::*;
        use SquareState::*;

        let coords = self.layout.validate_coords(coords)?;

        Ok(match self.squares[coords.to_grid_index()] {
            Covered => {
                self.squares[coords.to_grid_index()] = Flagged;
                self.flag_count += 1;
                Changed
            }
            Flagged => {
                self.squares[coords.to_grid_index()] = Questioned;
                self.flag_count -= 1;
                Changed
            }
            Questioned => {
                self.squares[coords.to_grid_index()] = Covered;
                Changed
            }
            _ => NoChange,
        })
    }

    /// Opens the square at `coords`, returning `Ok(false)` iff it held a
    /// mine.
    ///
    /// Flagged squares and squares that are already open are refused (the
    /// call is a no-op returning `Ok(true)`); questioned squares open
    /// normally. Opening a zero-adjacency square flood-fills its whole
    /// region. A mine hit rewrites the board with the loss display; opening
    /// the last safe square rewrites it with the win display.
    pub fn reveal(&mut self, coords: Coord2) -> Result<bool> {
        use SquareState::*;

        let coords = self.layout.validate_coords(coords)?;

        match self.status(coords) {
            Covered | Questioned => {}
            // Flags are never opened by a reveal, and open squares stay as
            // they are.
            _ => return Ok(true),
        }

        if self.layout.contains_mine(coords) {
            log::debug!("mine hit at {:?}", coords);
            self.show_loss();
            self.squares[coords.to_grid_index()] = ExplodedMine;
            return Ok(false);
        }

        let adjacent = self.layout.adjacent_mine_count(coords);
        if adjacent == 0 {
            self.flood_fill(coords);
        } else {
            self.open_square(coords, adjacent);
        }
        self.show_win();
        Ok(true)
    }

    /// Returns every square to covered and zeroes both counters. The layout
    /// is untouched; repopulating it between games is the caller's move.
    pub fn reset_display(&mut self) {
        self.squares.fill(SquareState::Covered);
        self.uncovered_count = Saturating(0);
        self.flag_count = Saturating(0);
    }

    fn open_square(&mut self, coords: Coord2, adjacent: u8) {
        self.squares[coords.to_grid_index()] = SquareState::Uncovered(adjacent);
        self.uncovered_count += 1;
    }

    /// Opens the connected zero-adjacency region around `seed` plus its
    /// border of numbered squares. Flagged squares block the fill and stay
    /// covered even when they sit inside the region; questioned squares open
    /// like covered ones.
    fn flood_fill(&mut self, seed: Coord2) {
        use SquareState::*;

        self.open_square(seed, 0);

        let mut visited = BTreeSet::from([seed]);
        let mut to_visit: VecDeque<_> = self
            .neighbors_of(seed)
            .filter(|&pos| {
                matches!(self.squares[pos.to_grid_index()], Covered | Questioned)
            })
            .collect();

        while let Some(coords) = to_visit.pop_front() {
            if !visited.insert(coords) {
                continue;
            }

            match self.squares[coords.to_grid_index()] {
                Covered | Questioned => {}
                // Flags block the fill; anything open was handled already.
                _ => continue,
            }

            let adjacent = self.layout.adjacent_mine_count(coords);
            self.open_square(coords, adjacent);
            log::trace!("flood opened {:?}, adjacent mines {}", coords, adjacent);

            // Numbered squares form the region border; only zero squares
            // carry the fill outward.
            if adjacent == 0 {
                to_visit.extend(
                    self.neighbors_of(coords)
                        .filter(|&pos| {
                            matches!(
                                self.squares[pos.to_grid_index()],
                                Covered | Questioned
                            )
                        })
                        .filter(|pos| !visited.contains(pos)),
                );
            }
        }
    }

    /// Marks the endgame board after a mine hit: wrong guesses become
    /// [`SquareState::WrongFlag`], unflagged mines become
    /// [`SquareState::Mine`]. A correctly flagged mine stays flagged. The
    /// exploded square itself is overwritten by the caller afterwards.
    fn show_loss(&mut self) {
        use SquareState::*;

        let (rows, cols) = self.size();
        for row in 0..rows {
            for col in 0..cols {
                let coords = (row, col);
                let flagged = self.squares[coords.to_grid_index()] == Flagged;
                match (flagged, self.layout.contains_mine(coords)) {
                    (true, false) => self.squares[coords.to_grid_index()] = WrongFlag,
                    (false, true) => self.squares[coords.to_grid_index()] = Mine,
                    _ => {}
                }
            }
        }
    }

    /// Flags every mine once all safe squares are open; a no-op until the
    /// win condition holds. Runs once per player-initiated reveal.
    fn show_win(&mut self) {
        if self.uncovered_count != Saturating(self.layout.safe_cell_count()) {
            return;
        }

        log::debug!("all safe squares open, flagging mines");
        let (rows, cols) = self.size();
        for row in 0..rows {
            for col in 0..cols {
                if self.layout.contains_mine((row, col)) {
                    self.squares[(row, col).to_grid_index()] = SquareState::Flagged;
                }
            }
        }
    }

    fn neighbors_of(&self, coords: Coord2) -> NeighborIter {
        self.squares.iter_neighbors(coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    // Hand-checked 4x5 reference grid, shared with the layout tests.
    const SMALL_FIELD_MINES: [Coord2; 10] = [
        (0, 4),
        (1, 0),
        (1, 3),
        (2, 1),
        (2, 2),
        (2, 4),
        (3, 0),
        (3, 1),
        (3, 3),
        (3, 4),
    ];

    fn state(size: Coord2, mines: &[Coord2]) -> RevealState {
        RevealState::new(MineLayout::from_mine_coords(size, mines).unwrap())
    }

    #[test]
    fn new_state_is_fully_covered() {
        let state = state((4, 5), &SMALL_FIELD_MINES);
        let (rows, cols) = state.size();
        for row in 0..rows {
            for col in 0..cols {
                assert_eq!(state.status((row, col)), SquareState::Covered);
                assert!(!state.is_uncovered((row, col)));
            }
        }
        assert!(!state.is_game_over());
        assert_eq!(state.mines_left(), 10);
    }

    #[test]
    fn flag_cycle_returns_to_covered_after_three_steps() {
        let mut state = state((2, 2), &[(0, 0)]);

        assert_eq!(state.cycle_flag((1, 1)).unwrap(), MarkOutcome::Changed);
        assert_eq!(state.status((1, 1)), SquareState::Flagged);
        assert_eq!(state.mines_left(), 0);

        assert_eq!(state.cycle_flag((1, 1)).unwrap(), MarkOutcome::Changed);
        assert_eq!(state.status((1, 1)), SquareState::Questioned);
        assert_eq!(state.mines_left(), 1);

        assert_eq!(state.cycle_flag((1, 1)).unwrap(), MarkOutcome::Changed);
        assert_eq!(state.status((1, 1)), SquareState::Covered);
        assert_eq!(state.mines_left(), 1);
    }

    #[test]
    fn mines_left_goes_negative_when_overflagged() {
        let mut state = state((2, 2), &[(0, 0)]);
        state.cycle_flag((0, 0)).unwrap();
        state.cycle_flag((0, 1)).unwrap();
        assert_eq!(state.mines_left(), -1);
    }

    #[test]
    fn flag_cycle_ignores_open_squares() {
        let mut state = state((2, 2), &[(0, 0)]);
        assert!(state.reveal((1, 1)).unwrap());
        assert_eq!(state.status((1, 1)), SquareState::Uncovered(1));

        assert_eq!(state.cycle_flag((1, 1)).unwrap(), MarkOutcome::NoChange);
        assert_eq!(state.status((1, 1)), SquareState::Uncovered(1));
        assert_eq!(state.mines_left(), 1);
    }

    #[test]
    fn mine_hit_paints_the_loss_display() {
        let mut state = state((2, 3), &[(0, 0), (0, 2), (1, 0)]);
        state.cycle_flag((0, 0)).unwrap(); // correct guess
        state.cycle_flag((1, 1)).unwrap(); // wrong guess
        state.cycle_flag((1, 0)).unwrap();
        state.cycle_flag((1, 0)).unwrap(); // questioned mine

        assert!(!state.reveal((0, 2)).unwrap());

        assert_eq!(state.status((0, 2)), SquareState::ExplodedMine);
        assert_eq!(state.status((0, 0)), SquareState::Flagged);
        assert_eq!(state.status((1, 1)), SquareState::WrongFlag);
        assert_eq!(state.status((1, 0)), SquareState::Mine);
        assert_eq!(state.status((1, 2)), SquareState::Covered);
        assert!(state.is_game_over());
    }

    #[test]
    fn reveal_refuses_flagged_squares() {
        let mut state = state((2, 2), &[(0, 0)]);
        state.cycle_flag((0, 0)).unwrap();

        assert!(state.reveal((0, 0)).unwrap());
        assert_eq!(state.status((0, 0)), SquareState::Flagged);
        assert!(!state.is_game_over());
    }

    #[test]
    fn reveal_on_an_open_square_changes_nothing() {
        let mut state = state((2, 2), &[(0, 0)]);
        assert!(state.reveal((1, 1)).unwrap());
        assert!(state.reveal((1, 1)).unwrap());
        assert!(state.reveal((0, 1)).unwrap());
        // Re-opening (1, 1) must not have double-counted it towards the win.
        assert!(!state.is_game_over());

        assert!(state.reveal((1, 0)).unwrap());
        assert!(state.is_game_over());
    }

    #[test]
    fn questioned_squares_can_be_opened() {
        let mut state = state((2, 2), &[(0, 0)]);
        state.cycle_flag((1, 1)).unwrap();
        state.cycle_flag((1, 1)).unwrap();
        assert_eq!(state.status((1, 1)), SquareState::Questioned);

        assert!(state.reveal((1, 1)).unwrap());
        assert_eq!(state.status((1, 1)), SquareState::Uncovered(1));
    }

    #[test]
    fn flood_fill_skips_flags_and_stops_at_numbered_border() {
        let mut state = state((4, 4), &[(3, 3)]);
        state.cycle_flag((1, 1)).unwrap();

        assert!(state.reveal((0, 0)).unwrap());

        assert_eq!(state.status((1, 1)), SquareState::Flagged);
        assert_eq!(state.status((3, 3)), SquareState::Covered);
        assert_eq!(state.status((0, 0)), SquareState::Uncovered(0));
        assert_eq!(state.status((2, 2)), SquareState::Uncovered(1));
        assert_eq!(state.status((2, 3)), SquareState::Uncovered(1));
        assert_eq!(state.status((3, 2)), SquareState::Uncovered(1));

        let (rows, cols) = state.size();
        for row in 0..rows {
            for col in 0..cols {
                let coords = (row, col);
                if coords == (1, 1) || coords == (3, 3) {
                    continue;
                }
                assert!(state.is_uncovered(coords), "{:?} should be open", coords);
            }
        }
        // The flagged square kept one safe square closed, so this is no win.
        assert!(!state.is_game_over());
    }

    #[test]
    fn flood_fill_opens_questioned_squares() {
        let mut state = state((4, 4), &[(3, 3)]);
        state.cycle_flag((1, 1)).unwrap();
        state.cycle_flag((1, 1)).unwrap();

        assert!(state.reveal((0, 0)).unwrap());

        assert_eq!(state.status((1, 1)), SquareState::Uncovered(0));
        assert!(state.is_game_over());
        assert_eq!(state.status((3, 3)), SquareState::Flagged);
    }

    #[test]
    fn winning_auto_flags_every_mine() {
        let mut state = state((2, 1), &[(0, 0)]);
        assert!(state.reveal((1, 0)).unwrap());
        assert!(state.is_game_over());
        assert_eq!(state.status((0, 0)), SquareState::Flagged);
    }

    #[test]
    fn game_is_won_exactly_when_all_safe_squares_open() {
        let safe: [Coord2; 10] = [
            (0, 0),
            (0, 1),
            (0, 2),
            (0, 3),
            (1, 1),
            (1, 2),
            (1, 4),
            (2, 0),
            (2, 3),
            (3, 2),
        ];
        let mut state = state((4, 5), &SMALL_FIELD_MINES);

        for (opened, &coords) in safe.iter().enumerate() {
            assert!(!state.is_game_over());
            assert!(state.reveal(coords).unwrap());
            assert_eq!(state.is_game_over(), opened + 1 == safe.len());
        }

        assert_eq!(state.status((2, 3)), SquareState::Uncovered(5));
        for &coords in &SMALL_FIELD_MINES {
            assert_eq!(state.status(coords), SquareState::Flagged);
        }
    }

    #[test]
    fn reset_display_restores_a_fresh_board() {
        let mut state = state((2, 3), &[(0, 0), (0, 2), (1, 0)]);
        state.cycle_flag((1, 1)).unwrap();
        state.reveal((0, 2)).unwrap();
        assert!(state.is_game_over());

        state.reset_display();
        state.reset_display(); // a second reset is a no-op

        let (rows, cols) = state.size();
        for row in 0..rows {
            for col in 0..cols {
                assert_eq!(state.status((row, col)), SquareState::Covered);
            }
        }
        assert!(!state.is_game_over());
        assert_eq!(state.mines_left(), 3);
    }

    #[test]
    fn layout_can_be_repopulated_between_games() {
        let mut state = RevealState::new(MineLayout::empty(GameConfig::new((5, 6), 9)).unwrap());

        let mut rng = SmallRng::seed_from_u64(42);
        state.layout_mut().populate((2, 2), &mut rng).unwrap();
        assert!(state.reveal((2, 2)).unwrap());

        state.layout_mut().reset_empty();
        state.reset_display();
        let mut rng = SmallRng::seed_from_u64(43);
        state.layout_mut().populate((0, 0), &mut rng).unwrap();

        assert!(!state.is_game_over());
        assert!(state.reveal((0, 0)).unwrap());
        assert!(state.is_uncovered((0, 0)));
    }

    #[test]
    fn out_of_range_coordinates_are_contract_errors() {
        let mut state = state((2, 2), &[(0, 0)]);
        assert_eq!(state.reveal((2, 0)), Err(GameError::OutOfRange));
        assert_eq!(state.cycle_flag((0, 2)), Err(GameError::OutOfRange));
    }

    #[test]
    fn mid_game_state_survives_a_serde_round_trip() {
        let mut state = state((4, 4), &[(3, 3)]);
        state.cycle_flag((1, 1)).unwrap();
        state.reveal((0, 0)).unwrap();

        let json = serde_json::to_string(&state).unwrap();
        let restored: RevealState = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, state);
        assert_eq!(restored.status((2, 2)), SquareState::Uncovered(1));
    }
}
