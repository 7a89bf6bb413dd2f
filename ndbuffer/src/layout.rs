//! Flat position arithmetic for dense arrays.
//!
//! A [`Layout`] resolves, once, the linear offset contributed by every
//! coordinate of every axis of a shape. Walking the array then only
//! adds table entries, with no per-element dispatch on the dimension
//! variants.

use crate::shape::Shape;
use crate::shape::ShapeError;

/// Per-axis offset tables for a shape anchored at `base`.
#[derive(Debug, Clone)]
pub(crate) struct Layout {
    base: usize,
    axes: Vec<Vec<usize>>,
}

impl Layout {
    pub(crate) fn new(shape: &Shape, base: usize) -> Result<Self, ShapeError> {
        let axes = shape
            .dimensions()
            .iter()
            .map(|dimension| {
                let size = dimension
                    .num_elements()
                    .ok_or(ShapeError::UnknownDimension)?;
                (0..size)
                    .map(|coordinate| dimension.position_of(coordinate))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { base, axes })
    }

    pub(crate) fn base(&self) -> usize {
        self.base
    }

    /// The offset of the element at `coordinates`, which fix the
    /// leading axes; the remaining axes contribute nothing.
    pub(crate) fn position(&self, coordinates: &[usize]) -> Result<usize, ShapeError> {
        let mut position = self.base;
        for (&coordinate, axis) in coordinates.iter().zip(&self.axes) {
            position += axis
                .get(coordinate)
                .ok_or(ShapeError::IndexOutOfRange {
                    index: coordinate as i64,
                    size: axis.len(),
                })?;
        }
        Ok(position)
    }

    /// Iterates, in row-major order, over the offsets of every
    /// combination of coordinates of the first `depth` axes.
    pub(crate) fn positions(&self, depth: usize) -> Positions<'_> {
        let depth = depth.min(self.axes.len());
        let exhausted = self.axes[..depth].iter().any(Vec::is_empty);
        Positions {
            layout: self,
            coordinates: vec![0; depth],
            exhausted,
        }
    }
}

/// Row-major odometer over the linear offsets of an array.
#[derive(Debug, Clone)]
pub struct Positions<'a> {
    layout: &'a Layout,
    coordinates: Vec<usize>,
    exhausted: bool,
}

impl Iterator for Positions<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let position = self.layout.base
            + self
                .coordinates
                .iter()
                .zip(&self.layout.axes)
                .map(|(&coordinate, axis)| axis[coordinate])
                .sum::<usize>();

        // Advance the innermost coordinate, carrying outward.
        self.exhausted = true;
        for dim in (0..self.coordinates.len()).rev() {
            self.coordinates[dim] += 1;
            if self.coordinates[dim] < self.layout.axes[dim].len() {
                self.exhausted = false;
                break;
            }
            self.coordinates[dim] = 0;
        }
        Some(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::dsl::*;
    use crate::shape;

    #[test]
    fn test_row_major() {
        let layout = Layout::new(&shape!(2, 3), 0).unwrap();
        let positions: Vec<_> = layout.positions(2).collect();
        assert_eq!(positions, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_base_and_depth() {
        let layout = Layout::new(&shape!(2, 3), 10).unwrap();
        assert_eq!(layout.positions(1).collect::<Vec<_>>(), vec![10, 13]);
    }

    #[test]
    fn test_scalar_has_one_position() {
        let layout = Layout::new(&shape!(), 7).unwrap();
        assert_eq!(layout.positions(0).collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_empty_axis() {
        let layout = Layout::new(&shape!(2, 0, 3), 0).unwrap();
        assert_eq!(layout.positions(3).count(), 0);
        // Depth stops before the empty axis.
        assert_eq!(layout.positions(1).collect::<Vec<_>>(), vec![0, 0]);
    }

    #[test]
    fn test_indexed_axes() {
        let s = shape!(3, 4).map_to(&[flip(), odd()]).unwrap();
        let layout = Layout::new(&s, 0).unwrap();
        assert_eq!(
            layout.positions(2).collect::<Vec<_>>(),
            vec![9, 11, 5, 7, 1, 3]
        );
    }

    #[test]
    fn test_position() {
        let layout = Layout::new(&shape!(3, 4), 2).unwrap();
        assert_eq!(layout.position(&[]).unwrap(), 2);
        assert_eq!(layout.position(&[1]).unwrap(), 6);
        assert_eq!(layout.position(&[2, 3]).unwrap(), 13);
        assert!(matches!(
            layout.position(&[3, 0]).unwrap_err(),
            ShapeError::IndexOutOfRange { index: 3, size: 3 }
        ));
    }

    #[test]
    fn test_unknown_dimension() {
        let s = Shape::make(&[crate::shape::UNKNOWN_SIZE]).unwrap();
        assert!(matches!(
            Layout::new(&s, 0).unwrap_err(),
            ShapeError::UnknownDimension
        ));
    }
}
