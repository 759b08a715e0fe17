mod cell;
mod grid;
mod neighbors;
mod state;

pub use cell::Cell;
pub use grid::Board;
pub use neighbors::Neighbors;
pub use state::CellState;
