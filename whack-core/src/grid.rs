//! Grid - the board of gophers
//!
//! Owns every actor, the board geometry and the cancellation root shared by
//! all actor tasks. Cell `i` sits at column `i % cols`, row `i / cols`.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::actor::{Actor, ActorError};
use crate::state::{ActorSnapshot, Timing};

/// Board coordinate in pixels, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("board and cell dimensions must be non-zero")]
    ZeroSized,
    #[error("board of {board}px does not split into cells of {cell}px")]
    Uneven { board: u32, cell: u32 },
}

/// Board and cell dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    board_width: u32,
    board_height: u32,
    cell_width: u32,
    cell_height: u32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            board_width: 600,
            board_height: 600,
            cell_width: 200,
            cell_height: 200,
        }
    }
}

impl Layout {
    pub fn new(
        board_width: u32,
        board_height: u32,
        cell_width: u32,
        cell_height: u32,
    ) -> Result<Self, LayoutError> {
        if board_width == 0 || board_height == 0 || cell_width == 0 || cell_height == 0 {
            return Err(LayoutError::ZeroSized);
        }
        if board_width % cell_width != 0 {
            return Err(LayoutError::Uneven {
                board: board_width,
                cell: cell_width,
            });
        }
        if board_height % cell_height != 0 {
            return Err(LayoutError::Uneven {
                board: board_height,
                cell: cell_height,
            });
        }
        Ok(Self {
            board_width,
            board_height,
            cell_width,
            cell_height,
        })
    }

    pub fn cols(&self) -> usize {
        (self.board_width / self.cell_width) as usize
    }

    pub fn rows(&self) -> usize {
        (self.board_height / self.cell_height) as usize
    }

    pub fn len(&self) -> usize {
        self.cols() * self.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the cell under `point`, if it is on the board.
    pub fn index_at(&self, point: Point) -> Option<usize> {
        if point.x >= self.board_width || point.y >= self.board_height {
            return None;
        }
        let col = (point.x / self.cell_width) as usize;
        let row = (point.y / self.cell_height) as usize;
        Some(col + row * self.cols())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("actor index {index} out of bounds for a grid of {len}")]
    OutOfBounds { index: usize, len: usize },
    #[error("point ({x}, {y}) is off the board")]
    OffBoard { x: u32, y: u32 },
    #[error(transparent)]
    Actor(#[from] ActorError),
}

/// Phase and gaze of every cell, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub cols: usize,
    pub rows: usize,
    pub cells: Vec<ActorSnapshot>,
}

impl GridSnapshot {
    pub fn row(&self, row: usize) -> &[ActorSnapshot] {
        let start = (row * self.cols).min(self.cells.len());
        let end = (start + self.cols).min(self.cells.len());
        &self.cells[start..end]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[ActorSnapshot]> {
        self.cells.chunks(self.cols.max(1))
    }
}

pub struct Grid {
    layout: Layout,
    actors: Vec<Actor>,
    cancel: CancellationToken,
}

impl Grid {
    pub fn new(layout: Layout, timing: Timing) -> Self {
        let actors = (0..layout.len()).map(|id| Actor::new(id, timing)).collect();
        Self {
            layout,
            actors,
            cancel: CancellationToken::new(),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn actor(&self, index: usize) -> Option<&Actor> {
        self.actors.get(index)
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    /// Root token every actor task hangs off.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Start every actor's tasks.
    pub fn start(&self) -> Result<(), GridError> {
        for actor in &self.actors {
            actor.start(&self.cancel)?;
        }
        info!(
            cols = self.layout.cols(),
            rows = self.layout.rows(),
            "grid started"
        );
        Ok(())
    }

    fn get(&self, index: usize) -> Result<&Actor, GridError> {
        self.actors.get(index).ok_or(GridError::OutOfBounds {
            index,
            len: self.actors.len(),
        })
    }

    pub async fn poke(&self, index: usize) -> Result<(), GridError> {
        debug!(index, "poke");
        self.get(index)?.poke().await?;
        Ok(())
    }

    pub async fn strike(&self, index: usize) -> Result<(), GridError> {
        debug!(index, "strike");
        self.get(index)?.strike().await?;
        Ok(())
    }

    pub fn index_at(&self, point: Point) -> Option<usize> {
        self.layout.index_at(point)
    }

    /// Strike whatever gopher sits under `point`; returns its index.
    pub async fn hammer(&self, point: Point) -> Result<usize, GridError> {
        let index = self.index_at(point).ok_or(GridError::OffBoard {
            x: point.x,
            y: point.y,
        })?;
        info!(x = point.x, y = point.y, index, "hammer");
        self.strike(index).await?;
        Ok(index)
    }

    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            cols: self.layout.cols(),
            rows: self.layout.rows(),
            cells: self.actors.iter().map(Actor::snapshot).collect(),
        }
    }

    /// Cancel every actor and wait for all their tasks to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        for actor in &self.actors {
            actor.await_termination().await;
        }
        info!(actors = self.actors.len(), "grid stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_is_three_by_three() {
        let layout = Layout::default();
        assert_eq!(layout.cols(), 3);
        assert_eq!(layout.rows(), 3);
        assert_eq!(layout.len(), 9);
    }

    #[test]
    fn test_index_at_maps_row_major() {
        let layout = Layout::default();
        assert_eq!(layout.index_at(Point::new(0, 0)), Some(0));
        assert_eq!(layout.index_at(Point::new(199, 199)), Some(0));
        assert_eq!(layout.index_at(Point::new(200, 0)), Some(1));
        assert_eq!(layout.index_at(Point::new(599, 0)), Some(2));
        assert_eq!(layout.index_at(Point::new(0, 200)), Some(3));
        assert_eq!(layout.index_at(Point::new(450, 450)), Some(8));
    }

    #[test]
    fn test_index_at_rejects_off_board_points() {
        let layout = Layout::default();
        assert_eq!(layout.index_at(Point::new(600, 10)), None);
        assert_eq!(layout.index_at(Point::new(10, 600)), None);
    }

    #[test]
    fn test_non_square_layout() {
        let layout = Layout::new(400, 100, 100, 50).unwrap();
        assert_eq!(layout.cols(), 4);
        assert_eq!(layout.rows(), 2);
        assert_eq!(layout.index_at(Point::new(399, 99)), Some(7));
    }

    #[test]
    fn test_layout_validation() {
        assert_eq!(Layout::new(0, 600, 200, 200), Err(LayoutError::ZeroSized));
        assert_eq!(
            Layout::new(600, 600, 250, 200),
            Err(LayoutError::Uneven {
                board: 600,
                cell: 250
            })
        );
        assert_eq!(
            Layout::new(600, 500, 200, 200),
            Err(LayoutError::Uneven {
                board: 500,
                cell: 200
            })
        );
    }

    #[test]
    fn test_snapshot_rows() {
        let grid = Grid::new(Layout::new(300, 200, 100, 100).unwrap(), Timing::default());
        let snapshot = grid.snapshot();
        assert_eq!(snapshot.cells.len(), 6);
        assert_eq!(snapshot.row(1).len(), 3);
        assert_eq!(snapshot.iter_rows().count(), 2);
        assert!(snapshot
            .cells
            .iter()
            .all(|cell| *cell == ActorSnapshot::default()));
    }
}
