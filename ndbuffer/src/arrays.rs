//! Convenience constructors for dense arrays.
//!
//! ```
//! use ndbuffer::arrays;
//! use ndbuffer::shape;
//!
//! let matrix = arrays::of_floats(shape!(2, 3)).unwrap();
//! matrix.set(1.5, &[1, 2]).unwrap();
//! assert_eq!(matrix.get(&[1, 2]).unwrap(), 1.5);
//! ```

use crate::buffer::ArrayDataBuffer;
use crate::buffer::DataBuffer;
use crate::dense::DenseNdArray;
use crate::dense::NdArrayError;
use crate::dtype::Element;
use crate::shape::Shape;

pub type ByteNdArray = DenseNdArray<i8>;
pub type IntNdArray = DenseNdArray<i32>;
pub type LongNdArray = DenseNdArray<i64>;
pub type FloatNdArray = DenseNdArray<f32>;
pub type DoubleNdArray = DenseNdArray<f64>;
pub type BoolNdArray = DenseNdArray<bool>;
pub type StringNdArray = DenseNdArray<String>;

/// Allocates a default-initialized array of the given shape.
pub fn of<T: Element>(shape: Shape) -> Result<DenseNdArray<T>, NdArrayError> {
    let size = shape
        .size()
        .ok_or_else(|| NdArrayError::UnknownSize {
            shape: shape.clone(),
        })?;
    DenseNdArray::wrap(ArrayDataBuffer::allocate(size), shape)
}

/// An array of the given shape over `values`, in row-major order.
pub fn wrap<T: Element>(values: Vec<T>, shape: Shape) -> Result<DenseNdArray<T>, NdArrayError> {
    DenseNdArray::wrap(ArrayDataBuffer::wrap(values), shape)
}

/// An array of the given shape over an existing buffer.
pub fn wrap_buffer<T: Element, B: DataBuffer<T>>(
    buffer: B,
    shape: Shape,
) -> Result<DenseNdArray<T, B>, NdArrayError> {
    DenseNdArray::wrap(buffer, shape)
}

pub fn of_bytes(shape: Shape) -> Result<ByteNdArray, NdArrayError> {
    of(shape)
}

pub fn of_ints(shape: Shape) -> Result<IntNdArray, NdArrayError> {
    of(shape)
}

pub fn of_longs(shape: Shape) -> Result<LongNdArray, NdArrayError> {
    of(shape)
}

pub fn of_floats(shape: Shape) -> Result<FloatNdArray, NdArrayError> {
    of(shape)
}

pub fn of_doubles(shape: Shape) -> Result<DoubleNdArray, NdArrayError> {
    of(shape)
}

pub fn of_bools(shape: Shape) -> Result<BoolNdArray, NdArrayError> {
    of(shape)
}

pub fn of_strings(shape: Shape) -> Result<StringNdArray, NdArrayError> {
    of(shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape;

    #[test]
    fn test_of() {
        let array = of_longs(shape!(2, 2)).unwrap();
        assert_eq!(array.to_vec().unwrap(), vec![0; 4]);
        let flags = of_bools(shape!(3)).unwrap();
        assert_eq!(flags.to_vec().unwrap(), vec![false; 3]);
        let names = of_strings(shape!(1)).unwrap();
        assert_eq!(names.get(&[0]).unwrap(), "");

        let unknown = Shape::make(&[crate::shape::UNKNOWN_SIZE]).unwrap();
        assert!(matches!(
            of_bytes(unknown).unwrap_err(),
            NdArrayError::UnknownSize { .. }
        ));
    }

    #[test]
    fn test_wrap() {
        let array = wrap(vec![1.0f64, 2.0, 3.0, 4.0], shape!(2, 2)).unwrap();
        assert_eq!(array.get(&[1, 0]).unwrap(), 3.0);
        assert!(wrap(vec![1u16, 2, 3], shape!(2, 2)).is_err());

        let buffer = ArrayDataBuffer::wrap(vec![0i32; 8]).slice(4, 4).unwrap();
        let tail = wrap_buffer(buffer.clone(), shape!(4)).unwrap();
        tail.set(9, &[0]).unwrap();
        assert_eq!(buffer.get(0).unwrap(), 9);
    }
}
