//! An algebra of per-axis transforms.
//!
//! An [`Index`] maps a [`Dimension`] to a new dimension, without
//! moving any data: the new dimension's coordinate `c` addresses the
//! same element as coordinate `index.map_coordinate(c)` of the
//! original one. Indices are applied to a shape one axis at a time
//! (see [`crate::Shape::map_to`]) and to arrays through
//! [`crate::DenseNdArray::slice`].
//!
//! ```
//! use ndbuffer::dsl::*;
//! use ndbuffer::Dimension;
//!
//! let dim = Dimension::axis(6, 1);
//! let evens = even().apply(&dim).unwrap();
//! assert_eq!(evens.num_elements(), Some(3));
//! assert_eq!(evens.position_of(2).unwrap(), 4);
//! ```

use std::fmt;

use itertools::Itertools;
use serde::Deserialize;
use serde::Serialize;

use crate::buffer::DataBuffer;
use crate::dense::DenseNdArray;
use crate::dense::NdArrayError;
use crate::dimension::Dimension;
use crate::dtype::Element;
use crate::shape::ShapeError;

/// A transform applied to a single axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Index {
    /// Fixes the axis to one coordinate, removing it from the view.
    At(usize),
    /// Keeps every coordinate.
    All,
    /// Keeps coordinates `start..end`.
    Range(usize, usize),
    /// Keeps coordinates from `start` to the end of the axis.
    From(usize),
    /// Keeps coordinates `0..end`.
    To(usize),
    /// Reverses the axis.
    Flip,
    /// Keeps even coordinates.
    Even,
    /// Keeps odd coordinates.
    Odd,
    /// Gathers the listed coordinates, in order. Values are only
    /// checked when the index is applied.
    Seq(Vec<i64>),
}

/// DSL-style constructors for [`Index`] values.
pub mod dsl {
    use super::Index;

    pub fn at(coordinate: usize) -> Index {
        Index::At(coordinate)
    }
    pub fn all() -> Index {
        Index::All
    }
    pub fn range(start: usize, end: usize) -> Index {
        Index::Range(start, end)
    }
    pub fn from(start: usize) -> Index {
        Index::From(start)
    }
    pub fn to(end: usize) -> Index {
        Index::To(end)
    }
    pub fn flip() -> Index {
        Index::Flip
    }
    pub fn even() -> Index {
        Index::Even
    }
    pub fn odd() -> Index {
        Index::Odd
    }
    pub fn seq<I: IntoIterator<Item = i64>>(coordinates: I) -> Index {
        Index::Seq(coordinates.into_iter().collect())
    }
}

impl Index {
    /// The number of elements of `dim` viewed through this index.
    pub fn num_elements(&self, dim: &Dimension) -> Result<usize, ShapeError> {
        if let Index::Seq(values) = self {
            return Ok(values.len());
        }
        let size = known_size(dim)?;
        Ok(match self {
            Index::At(_) => 0,
            Index::All | Index::Flip => size,
            Index::Range(start, end) => end.saturating_sub(*start),
            Index::From(start) => size.saturating_sub(*start),
            Index::To(end) => *end,
            Index::Even | Index::Odd => size / 2,
            Index::Seq(values) => values.len(),
        })
    }

    /// Maps `coordinate` in the indexed space to a coordinate of `dim`.
    pub fn map_coordinate(&self, coordinate: usize, dim: &Dimension) -> Result<usize, ShapeError> {
        Ok(match self {
            Index::At(fixed) => *fixed,
            Index::All | Index::To(_) => coordinate,
            Index::Range(start, _) | Index::From(start) => start + coordinate,
            Index::Flip => {
                let size = known_size(dim)?;
                size.checked_sub(coordinate + 1).ok_or(ShapeError::IndexOutOfRange {
                    index: coordinate as i64,
                    size,
                })?
            }
            Index::Even => coordinate << 1,
            Index::Odd => (coordinate << 1) + 1,
            Index::Seq(values) => {
                let value = *values.get(coordinate).ok_or(ShapeError::IndexOutOfRange {
                    index: coordinate as i64,
                    size: values.len(),
                })?;
                usize::try_from(value).map_err(|_| ShapeError::IndexOutOfRange {
                    index: value,
                    size: dim.num_elements().unwrap_or(0),
                })?
            }
        })
    }

    /// Applies this index to `dim`.
    ///
    /// Identity transforms return `dim` itself, keeping it
    /// contiguous; every other transform yields a segmented
    /// [`Dimension::Indexed`] axis, or a collapsed
    /// [`Dimension::Coordinate`] for [`Index::At`].
    pub fn apply(&self, dim: &Dimension) -> Result<Dimension, ShapeError> {
        if let Index::All = self {
            return Ok(dim.clone());
        }
        let size = known_size(dim)?;
        match self {
            Index::At(coordinate) => return Dimension::coordinate(*coordinate, dim),
            Index::Range(start, end) => {
                if *end > size || start > end {
                    return Err(self.out_of_bounds(size));
                }
                if *start == 0 && *end == size {
                    return Ok(dim.clone());
                }
            }
            Index::From(start) => {
                if *start == 0 {
                    return Ok(dim.clone());
                }
                if *start >= size {
                    return Err(self.out_of_bounds(size));
                }
            }
            Index::To(end) => {
                if *end > size {
                    return Err(self.out_of_bounds(size));
                }
                if *end == size {
                    return Ok(dim.clone());
                }
            }
            Index::Seq(values) => {
                if let Some(&bad) = values
                    .iter()
                    .find(|&&v| usize::try_from(v).map_or(true, |v| v >= size))
                {
                    return Err(ShapeError::IndexOutOfRange {
                        index: bad,
                        size,
                    });
                }
            }
            Index::All | Index::Flip | Index::Even | Index::Odd => {}
        }
        let num_elements = self.num_elements(dim)?;
        Ok(Dimension::indexed(dim.clone(), self.clone(), num_elements))
    }

    /// An [`Index::At`] taken from the value of a scalar array.
    pub fn at_value<T, B>(scalar: &DenseNdArray<T, B>) -> Result<Self, NdArrayError>
    where
        T: Element + ToCoordinate,
        B: DataBuffer<T>,
    {
        let value = scalar.get(&[])?.to_coordinate();
        let coordinate = usize::try_from(value).map_err(|_| ShapeError::IndexOutOfRange {
            index: value,
            size: 0,
        })?;
        Ok(Index::At(coordinate))
    }

    /// An [`Index::Seq`] gathering the coordinates held by a vector.
    /// Floating-point values are truncated.
    pub fn seq_of<T, B>(vector: &DenseNdArray<T, B>) -> Result<Self, NdArrayError>
    where
        T: Element + ToCoordinate,
        B: DataBuffer<T>,
    {
        if vector.rank() != 1 {
            return Err(NdArrayError::IllegalRank {
                expected: 1,
                actual: vector.rank(),
            });
        }
        let coordinates = vector
            .values()
            .map(|value| value.map(|v| v.to_coordinate()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Index::Seq(coordinates))
    }

    fn out_of_bounds(&self, size: usize) -> ShapeError {
        ShapeError::RangeOutOfBounds {
            index: self.clone(),
            size,
        }
    }
}

fn known_size(dim: &Dimension) -> Result<usize, ShapeError> {
    dim.num_elements().ok_or(ShapeError::UnknownDimension)
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Index::At(coordinate) => write!(f, "at({})", coordinate),
            Index::All => write!(f, "all()"),
            Index::Range(start, end) => write!(f, "range({}, {})", start, end),
            Index::From(start) => write!(f, "from({})", start),
            Index::To(end) => write!(f, "to({})", end),
            Index::Flip => write!(f, "flip()"),
            Index::Even => write!(f, "even()"),
            Index::Odd => write!(f, "odd()"),
            Index::Seq(values) => write!(f, "seq({})", values.iter().join(", ")),
        }
    }
}

impl From<usize> for Index {
    fn from(coordinate: usize) -> Self {
        Index::At(coordinate)
    }
}

impl From<std::ops::Range<usize>> for Index {
    fn from(r: std::ops::Range<usize>) -> Self {
        Index::Range(r.start, r.end)
    }
}

impl From<std::ops::RangeFrom<usize>> for Index {
    fn from(r: std::ops::RangeFrom<usize>) -> Self {
        Index::From(r.start)
    }
}

impl From<std::ops::RangeTo<usize>> for Index {
    fn from(r: std::ops::RangeTo<usize>) -> Self {
        Index::To(r.end)
    }
}

impl From<std::ops::RangeFull> for Index {
    fn from(_: std::ops::RangeFull) -> Self {
        Index::All
    }
}

/// Numeric values usable as coordinates. Floating-point values are
/// truncated toward zero.
pub trait ToCoordinate {
    fn to_coordinate(&self) -> i64;
}

macro_rules! impl_to_coordinate {
    ($($ty:ty),*) => {
        $(
            impl ToCoordinate for $ty {
                fn to_coordinate(&self) -> i64 {
                    *self as i64
                }
            }
        )*
    };
}

impl_to_coordinate!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

#[cfg(test)]
mod tests {
    use super::dsl::*;
    use super::*;

    fn mapped(index: &Index, dim: &Dimension) -> Vec<usize> {
        let n = index.num_elements(dim).unwrap();
        (0..n)
            .map(|c| index.map_coordinate(c, dim).unwrap())
            .collect()
    }

    #[test]
    fn test_identity_indices_pass_through() {
        let dim = Dimension::axis(5, 3);
        for index in [all(), from(0), to(5), range(0, 5)] {
            let applied = index.apply(&dim).unwrap();
            assert_eq!(applied, dim, "{} should be the identity", index);
            assert!(!applied.is_segmented());
        }
    }

    #[test]
    fn test_range() {
        let dim = Dimension::axis(6, 1);
        let d = range(2, 5).apply(&dim).unwrap();
        assert_eq!(d.num_elements(), Some(3));
        assert!(d.is_segmented());
        assert_eq!(mapped(&range(2, 5), &dim), vec![2, 3, 4]);

        assert!(matches!(
            range(2, 7).apply(&dim).unwrap_err(),
            ShapeError::RangeOutOfBounds { size: 6, .. }
        ));
        assert!(range(4, 2).apply(&dim).is_err());
        assert_eq!(range(3, 3).apply(&dim).unwrap().num_elements(), Some(0));
    }

    #[test]
    fn test_from_and_to() {
        let dim = Dimension::axis(4, 2);
        let d = from(1).apply(&dim).unwrap();
        assert_eq!(d.num_elements(), Some(3));
        assert_eq!(d.position_of(0).unwrap(), 2);
        assert!(from(4).apply(&dim).is_err());

        let d = to(2).apply(&dim).unwrap();
        assert_eq!(d.num_elements(), Some(2));
        assert_eq!(d.position_of(1).unwrap(), 2);
        assert!(to(5).apply(&dim).is_err());
    }

    #[test]
    fn test_even_odd() {
        let dim = Dimension::axis(6, 1);
        assert_eq!(even().num_elements(&dim).unwrap(), 3);
        assert_eq!(odd().num_elements(&dim).unwrap(), 3);
        assert_eq!(mapped(&even(), &dim), vec![0, 2, 4]);
        assert_eq!(mapped(&odd(), &dim), vec![1, 3, 5]);

        let dim = Dimension::axis(5, 1);
        assert_eq!(mapped(&even(), &dim), vec![0, 2]);
        assert_eq!(mapped(&odd(), &dim), vec![1, 3]);
    }

    #[test]
    fn test_flip() {
        let dim = Dimension::axis(4, 10);
        let d = flip().apply(&dim).unwrap();
        assert!(d.is_segmented());
        let positions: Vec<_> = (0..4).map(|c| d.position_of(c).unwrap()).collect();
        assert_eq!(positions, vec![30, 20, 10, 0]);
    }

    #[test]
    fn test_seq_checked_on_apply() {
        let index = seq([3, 0, 3]);
        let dim = Dimension::axis(4, 1);
        let d = index.apply(&dim).unwrap();
        assert_eq!(d.num_elements(), Some(3));
        assert_eq!(mapped(&index, &dim), vec![3, 0, 3]);

        // Construction never fails; application does.
        let bad = seq([1, 9]);
        assert!(matches!(
            bad.apply(&dim).unwrap_err(),
            ShapeError::IndexOutOfRange { index: 9, size: 4 }
        ));
        assert!(matches!(
            seq([-1]).apply(&dim).unwrap_err(),
            ShapeError::IndexOutOfRange { index: -1, size: 4 }
        ));
    }

    #[test]
    fn test_at() {
        let dim = Dimension::axis(3, 4);
        let d = at(2).apply(&dim).unwrap();
        assert!(d.is_collapsed());
        assert_eq!(d.position().unwrap(), 8);
        assert!(at(3).apply(&dim).is_err());
    }

    #[test]
    fn test_unknown_dimension() {
        let dim = Dimension::unknown();
        assert_eq!(all().apply(&dim).unwrap(), Dimension::Unknown);
        assert!(matches!(
            range(0, 1).apply(&dim).unwrap_err(),
            ShapeError::UnknownDimension
        ));
    }

    #[test]
    fn test_composition() {
        // odd() of flip() of [0..8): 6, 4, 2, 0
        let dim = Dimension::axis(8, 1);
        let flipped = flip().apply(&dim).unwrap();
        let d = odd().apply(&flipped).unwrap();
        let positions: Vec<_> = (0..4).map(|c| d.position_of(c).unwrap()).collect();
        assert_eq!(positions, vec![6, 4, 2, 0]);
    }

    #[test]
    fn test_conversions_and_display() {
        assert_eq!(Index::from(3), at(3));
        assert_eq!(Index::from(1..4), range(1, 4));
        assert_eq!(Index::from(2..), from(2));
        assert_eq!(Index::from(..2), to(2));
        assert_eq!(Index::from(..), all());

        assert_eq!(range(1, 3).to_string(), "range(1, 3)");
        assert_eq!(seq([8, 0, 3]).to_string(), "seq(8, 0, 3)");
    }

    #[test]
    fn test_serde() {
        let index = seq([2, 1]);
        let json = serde_json::to_string(&index).unwrap();
        let back: Index = serde_json::from_str(&json).unwrap();
        assert_eq!(back, index);
    }

    #[test]
    fn test_to_coordinate() {
        assert_eq!(2.9f64.to_coordinate(), 2);
        assert_eq!((-1.5f32).to_coordinate(), -1);
        assert_eq!(7u8.to_coordinate(), 7);
    }
}
