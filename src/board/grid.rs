use super::cell::Cell;
use super::neighbors::Neighbors;
use crate::geometry::{Point, Rect};

/// a 2-D, row-major array of [`Cell`], with precomputed per-cell neighbor
/// counts so boundary arithmetic isn't repeated on every action.
#[derive(Debug, Clone)]
pub struct Board {
    dims: Point<i32>,
    cells: Vec<Cell>,
}

impl Board {
    /// a board of `dims.x * dims.y` cells, every cell's `neighbors` count
    /// precomputed from its position.
    pub fn new(dims: Point<i32>) -> Self {
        debug_assert!(dims.x > 0 && dims.y > 0);
        let mut cells = vec![Cell::default(); (dims.x as usize) * (dims.y as usize)];
        for y in 0..dims.y {
            for x in 0..dims.x {
                let p = Point::new(x, y);
                let count = Neighbors::new(p, dims, false).len() as u8;
                cells[Self::index_of(dims, p)] = Cell::new(count);
            }
        }
        Self { dims, cells }
    }

    fn index_of(dims: Point<i32>, p: Point<i32>) -> usize {
        (p.y as usize) * (dims.x as usize) + (p.x as usize)
    }

    pub fn dims(&self) -> Point<i32> {
        self.dims
    }

    pub fn rect(&self) -> Rect<i32> {
        Rect::new(Point::new(0, 0), self.dims)
    }

    pub fn contains(&self, p: Point<i32>) -> bool {
        self.rect().contains(p)
    }

    pub fn get(&self, p: Point<i32>) -> &Cell {
        debug_assert!(self.contains(p), "point out of bounds: {p}");
        &self.cells[Self::index_of(self.dims, p)]
    }

    pub fn get_mut(&mut self, p: Point<i32>) -> &mut Cell {
        debug_assert!(self.contains(p), "point out of bounds: {p}");
        &mut self.cells[Self::index_of(self.dims, p)]
    }

    pub fn neighbors(&self, p: Point<i32>, include_center: bool) -> Neighbors {
        Neighbors::new(p, self.dims, include_center)
    }

    /// iterate every `(point, cell)` pair in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Point<i32>, &Cell)> {
        let dims = self.dims;
        self.cells.iter().enumerate().map(move |(i, cell)| {
            let x = (i % dims.x as usize) as i32;
            let y = (i / dims.x as usize) as i32;
            (Point::new(x, y), cell)
        })
    }

    /// iterate every `(point, cell)` pair in row-major order, mutably. the
    /// order matches [`Board::iter`] and the flat index `y * dims.x + x`, so
    /// a caller filling in per-index derived data (e.g. bomb layout) can zip
    /// this against a precomputed index-keyed sequence.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Point<i32>, &mut Cell)> {
        let dims = self.dims;
        self.cells.iter_mut().enumerate().map(move |(i, cell)| {
            let x = (i % dims.x as usize) as i32;
            let y = (i / dims.x as usize) as i32;
            (Point::new(x, y), cell)
        })
    }

    pub fn iter_rect(&self, rect: Rect<i32>) -> impl Iterator<Item = (Point<i32>, &Cell)> {
        let clamped = rect.intersection(&self.rect()).unwrap_or(Rect::default());
        (clamped.tl.y..clamped.br.y).flat_map(move |y| {
            (clamped.tl.x..clamped.br.x).map(move |x| {
                let p = Point::new(x, y);
                (p, self.get(p))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_and_interior_neighbor_counts_are_precomputed_correctly() {
        let board = Board::new(Point::new(5, 5));
        assert_eq!(board.get(Point::new(0, 0)).neighbors, 3);
        assert_eq!(board.get(Point::new(2, 2)).neighbors, 8);
        assert_eq!(board.get(Point::new(4, 4)).neighbors, 3);
        assert_eq!(board.get(Point::new(0, 2)).neighbors, 5);
    }

    #[test]
    fn iter_visits_every_cell_exactly_once() {
        let board = Board::new(Point::new(4, 3));
        let visited: Vec<_> = board.iter().map(|(p, _)| p).collect();
        assert_eq!(visited.len(), 12);
        assert_eq!(
            visited.iter().collect::<std::collections::HashSet<_>>().len(),
            12
        );
    }

    #[test]
    fn iter_rect_clamps_to_board_bounds() {
        let board = Board::new(Point::new(4, 4));
        let out_of_range = Rect::from_coords(-5, -5, 100, 100);
        assert_eq!(board.iter_rect(out_of_range).count(), 16);
    }
}
