use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::index::Index;
use crate::shape::ShapeError;

/// One axis of a [`crate::Shape`].
///
/// A dimension knows how many elements it spans and how a coordinate
/// on that axis maps to a linear offset in the backing buffer. The
/// variant encodes whether consecutive coordinates are contiguous:
/// only [`Dimension::Axis`] is, every [`Dimension::Indexed`] axis is
/// segmented.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    /// A plain row-major axis: coordinate `c` lives at `c * stride`.
    Axis { num_elements: usize, stride: usize },

    /// An axis whose size is not known.
    Unknown,

    /// An axis collapsed to a single coordinate of the original
    /// dimension. It no longer takes a coordinate; it only
    /// contributes `position` to every offset.
    Coordinate { coordinate: usize, position: usize },

    /// An original dimension viewed through an [`Index`].
    Indexed {
        original: Box<Dimension>,
        index: Index,
        num_elements: usize,
    },
}

impl Dimension {
    /// A plain axis of `num_elements` elements, `stride` elements apart.
    pub fn axis(num_elements: usize, stride: usize) -> Self {
        Dimension::Axis {
            num_elements,
            stride,
        }
    }

    /// An axis of unknown size.
    pub fn unknown() -> Self {
        Dimension::Unknown
    }

    /// Collapse `original` to the given coordinate.
    pub fn coordinate(coordinate: usize, original: &Dimension) -> Result<Self, ShapeError> {
        let position = original.position_of(coordinate)?;
        Ok(Dimension::Coordinate {
            coordinate,
            position,
        })
    }

    /// View `original` through `index`. The index must already have
    /// been validated against `original`.
    pub(crate) fn indexed(original: Dimension, index: Index, num_elements: usize) -> Self {
        Dimension::Indexed {
            original: Box::new(original),
            index,
            num_elements,
        }
    }

    /// Number of elements on this axis, or `None` if unknown.
    ///
    /// A collapsed ([`Dimension::Coordinate`]) axis has no free
    /// coordinate and reports zero elements.
    pub fn num_elements(&self) -> Option<usize> {
        match self {
            Dimension::Axis { num_elements, .. } => Some(*num_elements),
            Dimension::Unknown => None,
            Dimension::Coordinate { .. } => Some(0),
            Dimension::Indexed { num_elements, .. } => Some(*num_elements),
        }
    }

    /// True if consecutive coordinates on this axis are not guaranteed
    /// to map to consecutive linear offsets.
    pub fn is_segmented(&self) -> bool {
        match self {
            Dimension::Axis { .. } => false,
            Dimension::Unknown | Dimension::Coordinate { .. } | Dimension::Indexed { .. } => true,
        }
    }

    /// True if this axis has been fixed to a single coordinate.
    pub fn is_collapsed(&self) -> bool {
        matches!(self, Dimension::Coordinate { .. })
    }

    /// True if the size of this axis is unknown.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Dimension::Unknown)
    }

    /// The linear-offset contribution of this axis at its first
    /// coordinate. For a collapsed axis, this is the offset of the
    /// fixed coordinate. Fails for an indexed axis with no elements.
    pub fn position(&self) -> Result<usize, ShapeError> {
        match self {
            Dimension::Axis { .. } | Dimension::Unknown => Ok(0),
            Dimension::Coordinate { position, .. } => Ok(*position),
            Dimension::Indexed { .. } => self.position_of(0),
        }
    }

    /// The linear-offset contribution of `coordinate` on this axis.
    pub fn position_of(&self, coordinate: usize) -> Result<usize, ShapeError> {
        match self {
            Dimension::Axis {
                num_elements,
                stride,
            } => {
                check_coordinate(coordinate, *num_elements)?;
                coordinate
                    .checked_mul(*stride)
                    .ok_or(ShapeError::SizeOverflow)
            }
            Dimension::Unknown => Err(ShapeError::UnknownDimension),
            Dimension::Coordinate { .. } => Err(ShapeError::IndexOutOfRange {
                index: coordinate as i64,
                size: 0,
            }),
            Dimension::Indexed {
                original,
                index,
                num_elements,
            } => {
                check_coordinate(coordinate, *num_elements)?;
                let mapped = index.map_coordinate(coordinate, original)?;
                original.position_of(mapped)
            }
        }
    }

    /// The largest offset reachable on this axis, or `None` if it has
    /// no reachable coordinate.
    pub(crate) fn max_position(&self) -> Result<Option<usize>, ShapeError> {
        match self {
            Dimension::Axis {
                num_elements,
                stride,
            } => match num_elements.checked_sub(1) {
                Some(last) => last
                    .checked_mul(*stride)
                    .map(Some)
                    .ok_or(ShapeError::SizeOverflow),
                None => Ok(None),
            },
            Dimension::Unknown => Err(ShapeError::UnknownDimension),
            Dimension::Coordinate { position, .. } => Ok(Some(*position)),
            Dimension::Indexed { num_elements, .. } => {
                let mut max = None;
                for coordinate in 0..*num_elements {
                    let position = self.position_of(coordinate)?;
                    max = Some(max.map_or(position, |m: usize| m.max(position)));
                }
                Ok(max)
            }
        }
    }
}

fn check_coordinate(coordinate: usize, size: usize) -> Result<(), ShapeError> {
    if coordinate >= size {
        return Err(ShapeError::IndexOutOfRange {
            index: coordinate as i64,
            size,
        });
    }
    Ok(())
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Axis { num_elements, .. } => write!(f, "{}", num_elements),
            Dimension::Unknown => write!(f, "?"),
            Dimension::Coordinate { coordinate, .. } => write!(f, "@{}", coordinate),
            Dimension::Indexed {
                original,
                index,
                num_elements,
            } => write!(f, "{}<{}({})>", num_elements, index, original),
        }
    }
}
