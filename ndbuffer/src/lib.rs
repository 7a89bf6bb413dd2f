//! N-dimensional array views over linear buffers.
//!
//! Provides [`DenseNdArray`], a view that interprets a one-dimensional
//! [`DataBuffer`] as an n-dimensional array of a given [`Shape`].
//!
//! Shapes are sequences of [`Dimension`]s, each mapping the
//! coordinates of one axis to offsets in the buffer. The [`Index`]
//! algebra (see [`dsl`]) transforms dimensions to derive new views,
//! such as sub-ranges, reversals, strided and gathered axes, without
//! copying any data. Values move between arrays and flat storage
//! through bulk transfers of contiguous runs where the layout allows,
//! and one element at a time otherwise.
//!
//! ```
//! use ndbuffer::arrays;
//! use ndbuffer::dsl::*;
//! use ndbuffer::shape;
//!
//! let matrix = arrays::wrap((0..12).collect::<Vec<i64>>(), shape!(3, 4)).unwrap();
//! let view = matrix.slice(&[flip(), even()]).unwrap();
//! assert_eq!(view.shape().to_vec(), vec![3, 2]);
//! assert_eq!(view.to_vec().unwrap(), vec![8, 10, 4, 6, 0, 2]);
//! ```

mod buffer;
mod bulk;
mod dense;
mod dimension;
mod dtype;
mod index;
mod layout;
mod shape;

/// Constructors for common dense array types.
pub mod arrays;

/// Process-wide configuration, loaded from the environment.
pub mod config;

pub use arrays::BoolNdArray;
pub use arrays::ByteNdArray;
pub use arrays::DoubleNdArray;
pub use arrays::FloatNdArray;
pub use arrays::IntNdArray;
pub use arrays::LongNdArray;
pub use arrays::StringNdArray;
/// Linear storage backing arrays.
pub use buffer::ArrayDataBuffer;
pub use buffer::BufferError;
pub use buffer::DataBuffer;
/// Contiguous run planning for bulk transfers.
pub use bulk::BulkTransfer;
pub use bulk::TransferStrategy;
/// Dense arrays and their errors.
pub use dense::DenseNdArray;
pub use dense::Elements;
pub use dense::NdArrayError;
pub use dense::Values;
/// Per-axis coordinate-to-offset mappings.
pub use dimension::Dimension;
/// Element types and their logical datatypes.
pub use dtype::DataType;
pub use dtype::Element;
/// DSL-style constructors for [`Index`] values.
pub use index::dsl;
/// Per-axis transforms used to derive views.
pub use index::Index;
pub use index::ToCoordinate;
pub use layout::Positions;
/// Describes the dimensions of an array.
pub use shape::Shape;
/// Errors that can occur during shape construction or indexing.
pub use shape::ShapeError;
pub use shape::UNKNOWN_SIZE;
