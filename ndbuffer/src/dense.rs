//! Dense n-dimensional arrays over a [`DataBuffer`].
//!
//! A [`DenseNdArray`] is a view: a buffer handle, a [`Shape`], and the
//! buffer offset of the view's first element. Views derived with
//! [`DenseNdArray::at`] or [`DenseNdArray::slice`] share the buffer of
//! the array they come from, so stores through one view are visible
//! through all of them.
//!
//! ```
//! use ndbuffer::dsl::*;
//! use ndbuffer::ArrayDataBuffer;
//! use ndbuffer::DenseNdArray;
//!
//! let buffer = ArrayDataBuffer::wrap((0..12).collect::<Vec<i32>>());
//! let array = DenseNdArray::wrap(buffer, ndbuffer::shape!(3, 4)).unwrap();
//! assert_eq!(array.get(&[1, 2]).unwrap(), 6);
//!
//! let column = array.slice(&[flip(), at(1)]).unwrap();
//! assert_eq!(column.to_vec().unwrap(), vec![9, 5, 1]);
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::ops::Range;

use itertools::izip;

use crate::buffer::ArrayDataBuffer;
use crate::buffer::BufferError;
use crate::buffer::DataBuffer;
use crate::bulk::TransferStrategy;
use crate::config;
use crate::dtype::Element;
use crate::index::Index;
use crate::layout::Layout;
use crate::layout::Positions;
use crate::shape::Shape;
use crate::shape::ShapeError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NdArrayError {
    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error("expected rank {expected}, got {actual}")]
    IllegalRank { expected: usize, actual: usize },

    #[error("{num_coordinates} coordinates exceed rank {rank}")]
    TooManyCoordinates { num_coordinates: usize, rank: usize },

    #[error("shape {actual} does not match {expected}")]
    ShapeMismatch { expected: Shape, actual: Shape },

    #[error("buffer overflow: {required} values required, {remaining} remaining")]
    BufferOverflow { required: usize, remaining: usize },

    #[error("buffer underflow: {required} values required, {remaining} remaining")]
    BufferUnderflow { required: usize, remaining: usize },

    #[error("offset {offset} out of range for length {len}")]
    InvalidOffset { offset: usize, len: usize },

    #[error("shape {shape} has a dimension of unknown size")]
    UnknownSize { shape: Shape },

    #[error("buffer of size {size} cannot hold the {required} slots spanned by the array")]
    BufferTooSmall { required: usize, size: usize },

    #[error("array of shape {shape} has no contiguous runs")]
    BulkTransferUnavailable { shape: Shape },
}

/// A region of an array's buffer, paired with the matching region of
/// a flat sequence.
enum Chunk {
    /// `range.len()` consecutive slots starting at `position`.
    Run { position: usize, range: Range<usize> },
    /// The slot at `position`.
    Element { position: usize, index: usize },
}

/// An n-dimensional view over a [`DataBuffer`].
pub struct DenseNdArray<T: Element, B: DataBuffer<T> = ArrayDataBuffer<T>> {
    buffer: B,
    shape: Shape,
    layout: Layout,
    size: usize,
    _element: PhantomData<T>,
}

impl<T: Element, B: DataBuffer<T>> DenseNdArray<T, B> {
    /// Wraps `buffer` as an array of the given shape.
    ///
    /// Collapsed dimensions of `shape` are folded into the array's
    /// offset. Fails if any dimension has an unknown size, or if the
    /// buffer does not cover every position the shape addresses.
    pub fn wrap(buffer: B, shape: Shape) -> Result<Self, NdArrayError> {
        if shape.has_unknown_dimension() {
            return Err(NdArrayError::UnknownSize { shape });
        }
        let (offset, shape) = shape.fold_collapsed()?;
        let required = span(&shape, offset)?;
        if required > buffer.size() {
            return Err(NdArrayError::BufferTooSmall {
                required,
                size: buffer.size(),
            });
        }
        tracing::debug!(%shape, offset, buffer_size = buffer.size(), "wrapping buffer");
        Self::view(buffer, shape, offset)
    }

    fn view(buffer: B, shape: Shape, offset: usize) -> Result<Self, NdArrayError> {
        let size = shape
            .size()
            .ok_or_else(|| NdArrayError::UnknownSize {
                shape: shape.clone(),
            })?;
        let layout = Layout::new(&shape, offset)?;
        Ok(Self {
            buffer,
            shape,
            layout,
            size,
            _element: PhantomData,
        })
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Total number of elements.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of dimensions; zero for a scalar.
    pub fn rank(&self) -> usize {
        self.shape.num_dimensions()
    }

    /// The buffer backing this view.
    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    /// Buffer position of the first element of this view.
    pub fn offset(&self) -> usize {
        self.layout.base()
    }

    /// The sub-array obtained by fixing the leading
    /// `coordinates.len()` axes. It shares this array's buffer.
    pub fn at(&self, coordinates: &[usize]) -> Result<Self, NdArrayError> {
        let position = self.position(coordinates, false)?;
        let shape = self.shape.subshape(coordinates.len())?;
        Self::view(self.buffer.clone(), shape, position)
    }

    /// The view obtained by applying `indices[i]` to the `i`th axis.
    /// Axes fixed with [`Index::At`] are removed from the view.
    pub fn slice(&self, indices: &[Index]) -> Result<Self, NdArrayError> {
        let (position, shape) = self.shape.map_to(indices)?.fold_collapsed()?;
        Self::view(self.buffer.clone(), shape, self.offset() + position)
    }

    /// The value at `coordinates`, which must address a single element.
    pub fn get(&self, coordinates: &[usize]) -> Result<T, NdArrayError> {
        let position = self.position(coordinates, true)?;
        Ok(self.buffer.get(position)?)
    }

    /// Stores `value` at `coordinates`, which must address a single
    /// element.
    pub fn set(&self, value: T, coordinates: &[usize]) -> Result<(), NdArrayError> {
        let position = self.position(coordinates, true)?;
        Ok(self.buffer.set(position, value)?)
    }

    fn position(&self, coordinates: &[usize], scalar: bool) -> Result<usize, NdArrayError> {
        let rank = self.rank();
        if coordinates.len() > rank {
            return Err(NdArrayError::TooManyCoordinates {
                num_coordinates: coordinates.len(),
                rank,
            });
        }
        if scalar && coordinates.len() < rank {
            return Err(NdArrayError::IllegalRank {
                expected: rank,
                actual: coordinates.len(),
            });
        }
        Ok(self.layout.position(coordinates)?)
    }

    /// Copies every element of this array into `dst`, which must have
    /// an identical shape.
    pub fn copy_to<D: DataBuffer<T>>(&self, dst: &DenseNdArray<T, D>) -> Result<(), NdArrayError> {
        if self.shape != dst.shape {
            return Err(NdArrayError::ShapeMismatch {
                expected: self.shape.clone(),
                actual: dst.shape.clone(),
            });
        }
        for (src, dst_position) in izip!(self.positions(), dst.positions()) {
            dst.buffer.set(dst_position, self.buffer.get(src)?)?;
        }
        Ok(())
    }

    /// Copies every element of `src`, which must have an identical
    /// shape, into this array.
    pub fn copy_from<S: DataBuffer<T>>(&self, src: &DenseNdArray<T, S>) -> Result<(), NdArrayError> {
        src.copy_to(self)
    }

    /// Copies the elements of this array, in row-major order, into the
    /// first [`Self::size`] slots of `dst`.
    pub fn read(&self, dst: &mut [T]) -> Result<(), NdArrayError> {
        if dst.len() < self.size {
            return Err(NdArrayError::BufferOverflow {
                required: self.size,
                remaining: dst.len(),
            });
        }
        self.transfer(|chunk| match chunk {
            Chunk::Run { position, range } => self.buffer.read(position, &mut dst[range]),
            Chunk::Element { position, index } => {
                dst[index] = self.buffer.get(position)?;
                Ok(())
            }
        })
    }

    /// Like [`Self::read`], starting at `dst[offset]`.
    pub fn read_at(&self, dst: &mut [T], offset: usize) -> Result<(), NdArrayError> {
        check_offset(offset, dst.len())?;
        self.read(&mut dst[offset..])
    }

    /// Copies the elements of this array, in row-major order, into the
    /// first [`Self::size`] slots of `dst`.
    pub fn read_to_buffer<D: DataBuffer<T>>(&self, dst: &D) -> Result<(), NdArrayError> {
        if dst.size() < self.size {
            return Err(NdArrayError::BufferOverflow {
                required: self.size,
                remaining: dst.size(),
            });
        }
        let mut scratch = Vec::new();
        self.transfer(|chunk| match chunk {
            Chunk::Run { position, range } => {
                scratch.resize(range.len(), T::default());
                self.buffer.read(position, &mut scratch)?;
                dst.write(range.start, &scratch)
            }
            Chunk::Element { position, index } => dst.set(index, self.buffer.get(position)?),
        })
    }

    /// Stores the first [`Self::size`] values of `src` into this array,
    /// in row-major order.
    pub fn write(&self, src: &[T]) -> Result<(), NdArrayError> {
        if src.len() < self.size {
            return Err(NdArrayError::BufferUnderflow {
                required: self.size,
                remaining: src.len(),
            });
        }
        self.transfer(|chunk| match chunk {
            Chunk::Run { position, range } => self.buffer.write(position, &src[range]),
            Chunk::Element { position, index } => self.buffer.set(position, src[index].clone()),
        })
    }

    /// Like [`Self::write`], starting at `src[offset]`.
    pub fn write_at(&self, src: &[T], offset: usize) -> Result<(), NdArrayError> {
        check_offset(offset, src.len())?;
        self.write(&src[offset..])
    }

    /// Stores the first [`Self::size`] values of `src` into this array,
    /// in row-major order.
    pub fn write_from_buffer<S: DataBuffer<T>>(&self, src: &S) -> Result<(), NdArrayError> {
        if src.size() < self.size {
            return Err(NdArrayError::BufferUnderflow {
                required: self.size,
                remaining: src.size(),
            });
        }
        let mut scratch = Vec::new();
        self.transfer(|chunk| match chunk {
            Chunk::Run { position, range } => {
                scratch.resize(range.len(), T::default());
                src.read(range.start, &mut scratch)?;
                self.buffer.write(position, &scratch)
            }
            Chunk::Element { position, index } => self.buffer.set(position, src.get(index)?),
        })
    }

    /// The elements of this array in row-major order.
    pub fn to_vec(&self) -> Result<Vec<T>, NdArrayError> {
        let mut values = vec![T::default(); self.size];
        self.read(&mut values)?;
        Ok(values)
    }

    /// Stores `values` into this array in row-major order, stopping at
    /// whichever runs out first. Returns the number of values stored.
    pub fn assign<I: IntoIterator<Item = T>>(&self, values: I) -> Result<usize, NdArrayError> {
        let mut count = 0;
        for (position, value) in self.positions().zip(values) {
            self.buffer.set(position, value)?;
            count += 1;
        }
        Ok(count)
    }

    /// How [`Self::read`] and [`Self::write`] move values for this array
    /// under the current global configuration.
    pub fn transfer_strategy(&self) -> Result<TransferStrategy, NdArrayError> {
        TransferStrategy::select(&self.shape, T::TYPE, &config::global::get())
    }

    fn transfer<F>(&self, mut f: F) -> Result<(), NdArrayError>
    where
        F: FnMut(Chunk) -> Result<(), BufferError>,
    {
        if self.size == 0 {
            return Ok(());
        }
        match self.transfer_strategy()? {
            TransferStrategy::Bulk(plan) => {
                tracing::trace!(
                    run_size = plan.run_size,
                    run_dimension = plan.dimension,
                    runs = plan.num_runs(self.size),
                    "bulk transfer"
                );
                for (i, position) in plan.runs(&self.layout).enumerate() {
                    let start = i * plan.run_size;
                    f(Chunk::Run {
                        position,
                        range: start..start + plan.run_size,
                    })?;
                }
            }
            TransferStrategy::ElementWise => {
                for (index, position) in self.positions().enumerate() {
                    f(Chunk::Element { position, index })?;
                }
            }
        }
        Ok(())
    }

    /// Buffer positions of the elements of this array, in row-major
    /// order.
    pub fn positions(&self) -> Positions<'_> {
        self.layout.positions(self.rank())
    }

    /// The values of this array in row-major order.
    pub fn values(&self) -> Values<'_, T, B> {
        Values {
            buffer: &self.buffer,
            positions: self.positions(),
            _element: PhantomData,
        }
    }

    /// The sub-arrays along the first axis; empty for a scalar.
    pub fn elements(&self) -> Elements<'_, T, B> {
        Elements {
            array: self,
            next: 0,
            len: self.shape.num_elements(0).unwrap_or(0),
        }
    }
}

/// Number of buffer slots, from the start of the buffer, that an array
/// of `shape` at `offset` reaches.
fn span(shape: &Shape, offset: usize) -> Result<usize, NdArrayError> {
    if shape.size() == Some(0) {
        return Ok(0);
    }
    let mut last = offset;
    for dimension in shape.dimensions() {
        last = last
            .checked_add(dimension.max_position()?.unwrap_or(0))
            .ok_or(ShapeError::SizeOverflow)?;
    }
    Ok(last.checked_add(1).ok_or(ShapeError::SizeOverflow)?)
}

fn check_offset(offset: usize, len: usize) -> Result<(), NdArrayError> {
    if offset > len {
        return Err(NdArrayError::InvalidOffset { offset, len });
    }
    Ok(())
}

impl<T: Element, B: DataBuffer<T>> Clone for DenseNdArray<T, B> {
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
            shape: self.shape.clone(),
            layout: self.layout.clone(),
            size: self.size,
            _element: PhantomData,
        }
    }
}

impl<T: Element, B: DataBuffer<T>> fmt::Debug for DenseNdArray<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DenseNdArray")
            .field("type", &T::TYPE)
            .field("shape", &self.shape.to_string())
            .field("offset", &self.offset())
            .finish()
    }
}

/// Iterator over the values of a [`DenseNdArray`].
pub struct Values<'a, T: Element, B: DataBuffer<T>> {
    buffer: &'a B,
    positions: Positions<'a>,
    _element: PhantomData<T>,
}

impl<T: Element, B: DataBuffer<T>> Iterator for Values<'_, T, B> {
    type Item = Result<T, NdArrayError>;

    fn next(&mut self) -> Option<Self::Item> {
        let position = self.positions.next()?;
        Some(self.buffer.get(position).map_err(NdArrayError::from))
    }
}

/// Iterator over the sub-arrays of a [`DenseNdArray`] along its first
/// axis.
pub struct Elements<'a, T: Element, B: DataBuffer<T>> {
    array: &'a DenseNdArray<T, B>,
    next: usize,
    len: usize,
}

impl<T: Element, B: DataBuffer<T>> Iterator for Elements<'_, T, B> {
    type Item = Result<DenseNdArray<T, B>, NdArrayError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len {
            return None;
        }
        let element = self.array.at(&[self.next]);
        self.next += 1;
        Some(element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.next;
        (remaining, Some(remaining))
    }
}
