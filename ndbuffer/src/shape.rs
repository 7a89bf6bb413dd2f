use std::fmt;

use itertools::Itertools;
use serde::Deserialize;
use serde::Serialize;

use crate::dimension::Dimension;
use crate::index::Index;

/// Size sentinel marking a dimension of unknown size in [`Shape::make`]
/// and [`Shape::to_vec`].
pub const UNKNOWN_SIZE: i64 = -1;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    #[error("index {index} out of range for dimension of size {size}")]
    IndexOutOfRange { index: i64, size: usize },

    #[error("{index} out of bounds for dimension of size {size}")]
    RangeOutOfBounds { index: Index, size: usize },

    #[error("{num_indices} indices exceed dimensionality {num_dim}")]
    TooManyIndices { num_indices: usize, num_dim: usize },

    #[error("subshape {index} out of range for dimensionality {num_dim}")]
    SubshapeOutOfRange { index: usize, num_dim: usize },

    #[error("dimension has unknown size")]
    UnknownDimension,

    #[error("invalid dimension size {size}")]
    InvalidSize { size: i64 },

    #[error("shape element count overflow")]
    SizeOverflow,
}

/// The shape of an n-dimensional array: an ordered sequence of
/// [`Dimension`]s.
///
/// Shapes are immutable; their total size is computed once, when they
/// are built. Equality is structural over the dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Dimension>", into = "Vec<Dimension>")]
pub struct Shape {
    dimensions: Vec<Dimension>,
    size: Option<usize>,
}

impl Shape {
    /// Creates a row-major shape from signed dimension sizes, where
    /// [`UNKNOWN_SIZE`] marks a dimension of unknown size.
    ///
    /// Strides are computed from the last axis backward: each axis
    /// steps over the product of the sizes to its right. Axes to the
    /// left of an unknown axis have no usable stride; they are given a
    /// stride of zero.
    pub fn make(sizes: &[i64]) -> Result<Self, ShapeError> {
        let mut dimensions = Vec::with_capacity(sizes.len());
        let mut stride = Some(1usize);
        for &size in sizes.iter().rev() {
            if size == UNKNOWN_SIZE {
                dimensions.push(Dimension::unknown());
                stride = None;
                continue;
            }
            let num_elements = usize::try_from(size).map_err(|_| ShapeError::InvalidSize { size })?;
            dimensions.push(Dimension::axis(num_elements, stride.unwrap_or(0)));
            stride = match stride {
                Some(stride) => Some(
                    stride
                        .checked_mul(num_elements)
                        .ok_or(ShapeError::SizeOverflow)?,
                ),
                None => None,
            };
        }
        dimensions.reverse();
        Self::from_dimensions(dimensions)
    }

    /// Creates a row-major shape from known dimension sizes.
    pub fn of(sizes: &[usize]) -> Result<Self, ShapeError> {
        let sizes = sizes
            .iter()
            .map(|&size| i64::try_from(size).map_err(|_| ShapeError::SizeOverflow))
            .collect::<Result<Vec<_>, _>>()?;
        Self::make(&sizes)
    }

    /// The shape of a scalar: no dimensions, one element.
    pub fn scalar() -> Self {
        Self {
            dimensions: Vec::new(),
            size: Some(1),
        }
    }

    /// Builds a shape from explicit dimensions.
    pub fn from_dimensions(dimensions: Vec<Dimension>) -> Result<Self, ShapeError> {
        let size = compute_size(&dimensions)?;
        Ok(Self { dimensions, size })
    }

    /// Returns the shape obtained by applying `indices[i]` to the
    /// `i`th dimension. Dimensions past the last index are kept as is.
    pub fn map_to(&self, indices: &[Index]) -> Result<Self, ShapeError> {
        if indices.len() > self.dimensions.len() {
            return Err(ShapeError::TooManyIndices {
                num_indices: indices.len(),
                num_dim: self.dimensions.len(),
            });
        }
        let mut dimensions = self.dimensions.clone();
        for (dimension, index) in dimensions.iter_mut().zip(indices) {
            *dimension = index.apply(dimension)?;
        }
        Self::from_dimensions(dimensions)
    }

    /// Returns the shape made of the dimensions of this shape starting
    /// at the `i`th one.
    pub fn subshape(&self, i: usize) -> Result<Self, ShapeError> {
        if i > self.dimensions.len() {
            return Err(ShapeError::SubshapeOutOfRange {
                index: i,
                num_dim: self.dimensions.len(),
            });
        }
        Self::from_dimensions(self.dimensions[i..].to_vec())
    }

    /// Number of dimensions; zero for a scalar.
    pub fn num_dimensions(&self) -> usize {
        self.dimensions.len()
    }

    /// Number of elements on the `i`th dimension, `None` if unknown.
    pub fn num_elements(&self, i: usize) -> Option<usize> {
        self.dimensions.get(i).and_then(Dimension::num_elements)
    }

    /// The `i`th dimension.
    pub fn dimension(&self, i: usize) -> Option<&Dimension> {
        self.dimensions.get(i)
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn has_unknown_dimension(&self) -> bool {
        self.dimensions.iter().any(Dimension::is_unknown)
    }

    /// Total number of elements, `None` if any dimension is unknown.
    pub fn size(&self) -> Option<usize> {
        self.size
    }

    /// The size of each dimension, with [`UNKNOWN_SIZE`] for unknown
    /// dimensions. Collapsed dimensions take no coordinate and are
    /// left out.
    pub fn to_vec(&self) -> Vec<i64> {
        self.dimensions
            .iter()
            .filter(|d| !d.is_collapsed())
            .map(|d| d.num_elements().map_or(UNKNOWN_SIZE, |n| n as i64))
            .collect()
    }

    /// Splits off collapsed dimensions: returns the sum of their
    /// positions together with the shape of the remaining dimensions.
    pub(crate) fn fold_collapsed(&self) -> Result<(usize, Shape), ShapeError> {
        if !self.dimensions.iter().any(Dimension::is_collapsed) {
            return Ok((0, self.clone()));
        }
        let (collapsed, free): (Vec<_>, Vec<_>) = self
            .dimensions
            .iter()
            .cloned()
            .partition(Dimension::is_collapsed);
        let mut position = 0usize;
        for dimension in &collapsed {
            position = position
                .checked_add(dimension.position()?)
                .ok_or(ShapeError::SizeOverflow)?;
        }
        Ok((position, Self::from_dimensions(free)?))
    }
}

fn compute_size(dimensions: &[Dimension]) -> Result<Option<usize>, ShapeError> {
    let mut size = 1usize;
    for dimension in dimensions {
        if dimension.is_collapsed() {
            continue;
        }
        match dimension.num_elements() {
            Some(n) => size = size.checked_mul(n).ok_or(ShapeError::SizeOverflow)?,
            None => return Ok(None),
        }
    }
    Ok(Some(size))
}

impl TryFrom<Vec<Dimension>> for Shape {
    type Error = ShapeError;

    fn try_from(dimensions: Vec<Dimension>) -> Result<Self, Self::Error> {
        Self::from_dimensions(dimensions)
    }
}

impl From<Shape> for Vec<Dimension> {
    fn from(shape: Shape) -> Self {
        shape.dimensions
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sizes = self.dimensions.iter().map(|d| match d {
            Dimension::Coordinate { .. } => d.to_string(),
            _ => d.num_elements().map_or_else(|| "?".to_string(), |n| n.to_string()),
        });
        write!(f, "[{}]", sizes.format(", "))
    }
}

/// Construct a row-major shape from dimension sizes.
///
/// ```
/// let s = ndbuffer::shape!(3, 4);
/// assert_eq!(s.size(), Some(12));
/// assert_eq!(s.to_string(), "[3, 4]");
/// ```
#[macro_export]
macro_rules! shape {
    () => {
        $crate::Shape::scalar()
    };
    ( $( $size:expr ),+ $(,)? ) => {
        $crate::Shape::of(&[$( $size ),+]).unwrap()
    };
}
