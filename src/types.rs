use ndarray::Array2;

/// Single coordinate axis used for row/column indices and grid dimensions.
pub type Coord = u8;

/// Count type used for mine totals and cell totals.
pub type CellCount = u16;

/// Grid position as `(row, col)`, with row 0 at the top.
pub type Coord2 = (Coord, Coord);

pub trait ToGridIndex {
    type Output;
    fn to_grid_index(self) -> Self::Output;
}

impl ToGridIndex for Coord2 {
    type Output = [usize; 2];

    fn to_grid_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

pub trait NeighborIterExt {
    fn iter_neighbors(&self, center: Coord2) -> NeighborIter;
}

impl<T> NeighborIterExt for Array2<T> {
    fn iter_neighbors(&self, center: Coord2) -> NeighborIter {
        let dim = self.dim();
        let bounds = (dim.0.try_into().unwrap(), dim.1.try_into().unwrap());
        NeighborIter::new(center, bounds)
    }
}

/// Iterator over the in-range Moore neighbors of a cell, excluding the cell
/// itself. Neighbors falling outside the grid are clipped.
///
/// Walks the 3x3 window around `center`, clamped to the grid, in row-major
/// order.
#[derive(Debug)]
pub struct NeighborIter {
    center: Coord2,
    cursor: Option<Coord2>,
    col_start: Coord,
    last: Coord2,
}

impl NeighborIter {
    /// `center` must lie inside `bounds`.
    fn new(center: Coord2, bounds: Coord2) -> Self {
        let (row, col) = center;
        let (rows, cols) = bounds;
        debug_assert!(row < rows && col < cols);

        let first = (row.saturating_sub(1), col.saturating_sub(1));
        let last = (
            row.saturating_add(1).min(rows - 1),
            col.saturating_add(1).min(cols - 1),
        );
        Self {
            center,
            cursor: Some(first),
            col_start: first.1,
            last,
        }
    }

    fn step(&self, (row, col): Coord2) -> Option<Coord2> {
        if col < self.last.1 {
            Some((row, col + 1))
        } else if row < self.last.0 {
            Some((row + 1, self.col_start))
        } else {
            None
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(coords) = self.cursor {
            self.cursor = self.step(coords);
            if coords != self.center {
                return Some(coords);
            }
        }
        None
    }
}
