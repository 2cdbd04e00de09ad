//! The shared pixel canvas.
//!
//! A square grid of `i32` colours. `0` means "empty". Cells are stored
//! x-major (`cells[x * size + y]`), which is also the order snapshots go
//! out on the wire.
//!
//! The canvas does not know who is allowed to paint. Callers pass the
//! authorization decision in, and an unauthorized batch is a silent
//! no-op.

use kidpaint_protocol::{Point, Sketch};

use crate::StudioError;
use crate::config::MAX_CANVAS_SIZE;

/// An N×N colour grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasState {
    size: usize,
    cells: Vec<i32>,
}

impl CanvasState {
    /// Creates a blank canvas.
    ///
    /// # Errors
    /// [`StudioError::InvalidConfig`] if `size` is 0 or above
    /// [`MAX_CANVAS_SIZE`].
    pub fn new(size: usize) -> Result<Self, StudioError> {
        if !(1..=MAX_CANVAS_SIZE).contains(&size) {
            return Err(StudioError::InvalidConfig(format!(
                "canvas size must be between 1 and {MAX_CANVAS_SIZE}, got {size}"
            )));
        }
        Ok(Self {
            size,
            cells: vec![0; size * size],
        })
    }

    /// Edge length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The colour at `(x, y)`, or `None` if out of bounds.
    pub fn get(&self, x: i32, y: i32) -> Option<i32> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Returns `true` if every cell is 0.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|&c| c == 0)
    }

    /// Paints a batch of points.
    ///
    /// Returns the points that were actually written, in input order.
    /// Out-of-bounds points are skipped one by one; an unauthorized batch
    /// writes nothing and returns an empty list.
    pub fn apply_batch(
        &mut self,
        authorized: bool,
        color: i32,
        points: &[Point],
    ) -> Vec<Point> {
        if !authorized {
            return Vec::new();
        }

        let mut applied = Vec::with_capacity(points.len());
        for &point in points {
            if let Some(i) = self.index(point.x, point.y) {
                self.cells[i] = color;
                applied.push(point);
            }
        }
        applied
    }

    /// Resets every cell to 0.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Copies the whole grid out for a FullSketch message.
    pub fn snapshot(&self) -> Sketch {
        Sketch {
            size: self.size,
            cells: self.cells.clone(),
        }
    }

    /// Loads a snapshot taken from a canvas of the same size.
    ///
    /// # Errors
    /// [`StudioError::SketchSizeMismatch`] if the sizes differ (or the
    /// sketch's cell count doesn't match its size). The canvas is left
    /// untouched on error.
    pub fn restore(&mut self, sketch: &Sketch) -> Result<(), StudioError> {
        if sketch.size != self.size
            || sketch.cells.len() != sketch.size * sketch.size
        {
            return Err(StudioError::SketchSizeMismatch {
                expected: self.size,
                actual: sketch.size,
            });
        }
        self.cells.copy_from_slice(&sketch.cells);
        Ok(())
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.size && y < self.size).then(|| x * self.size + y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(size: usize) -> CanvasState {
        CanvasState::new(size).unwrap()
    }

    #[test]
    fn test_new_canvas_is_blank() {
        let c = canvas(4);
        assert_eq!(c.size(), 4);
        assert!(c.is_blank());
        assert_eq!(c.get(3, 3), Some(0));
    }

    #[test]
    fn test_new_rejects_zero_and_oversized() {
        assert!(CanvasState::new(0).is_err());
        assert!(CanvasState::new(MAX_CANVAS_SIZE + 1).is_err());
    }

    #[test]
    fn test_apply_batch_unauthorized_leaves_canvas_unchanged() {
        let mut c = canvas(4);
        c.apply_batch(true, 9, &[Point::new(0, 0)]);
        let before = c.snapshot();

        let applied =
            c.apply_batch(false, 7, &[Point::new(1, 1), Point::new(0, 0)]);

        assert!(applied.is_empty());
        assert_eq!(c.snapshot(), before);
    }

    #[test]
    fn test_apply_batch_discards_out_of_range_points() {
        let mut c = canvas(3);
        let points = [
            Point::new(0, 0),
            Point::new(-1, 0),
            Point::new(2, 2),
            Point::new(3, 0),
            Point::new(0, i32::MAX),
        ];

        let applied = c.apply_batch(true, 5, &points);

        assert_eq!(applied, vec![Point::new(0, 0), Point::new(2, 2)]);
        assert_eq!(c.get(0, 0), Some(5));
        assert_eq!(c.get(2, 2), Some(5));
        assert_eq!(c.get(3, 0), None);
    }

    #[test]
    fn test_apply_batch_all_out_of_range_returns_empty() {
        let mut c = canvas(2);
        assert!(c.apply_batch(true, 1, &[Point::new(5, 5)]).is_empty());
        assert!(c.is_blank());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut c = canvas(3);
        c.apply_batch(true, 4, &[Point::new(1, 2)]);
        c.clear();
        let once = c.snapshot();
        c.clear();
        assert_eq!(c.snapshot(), once);
        assert!(c.is_blank());
    }

    #[test]
    fn test_snapshot_is_x_major() {
        let mut c = canvas(2);
        c.apply_batch(true, 1, &[Point::new(0, 1)]);
        c.apply_batch(true, 2, &[Point::new(1, 0)]);
        // x=0: (0,0) (0,1), then x=1: (1,0) (1,1)
        assert_eq!(c.snapshot().cells, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut original = canvas(5);
        original.apply_batch(
            true,
            0x00FF_00FF,
            &[Point::new(0, 4), Point::new(3, 1), Point::new(4, 4)],
        );

        let mut copy = canvas(5);
        copy.restore(&original.snapshot()).unwrap();

        assert_eq!(copy, original);
    }

    #[test]
    fn test_restore_size_mismatch_leaves_canvas_unchanged() {
        let mut c = canvas(3);
        c.apply_batch(true, 8, &[Point::new(1, 1)]);
        let before = c.snapshot();

        let err = c.restore(&canvas(4).snapshot()).unwrap_err();

        assert!(matches!(
            err,
            StudioError::SketchSizeMismatch {
                expected: 3,
                actual: 4
            }
        ));
        assert_eq!(c.snapshot(), before);
    }

    #[test]
    fn test_restore_rejects_short_cell_list() {
        let mut c = canvas(2);
        let bad = Sketch {
            size: 2,
            cells: vec![1, 2, 3],
        };
        assert!(c.restore(&bad).is_err());
        assert!(c.is_blank());
    }
}
