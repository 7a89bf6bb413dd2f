//! Linear storage backing n-dimensional arrays.
//!
//! A [`DataBuffer`] is a handle to a bounded window of typed storage.
//! Handles are cheap to clone, and clones (as well as
//! [`DataBuffer::duplicate`] and [`DataBuffer::slice`]) share the
//! same storage: a value stored through one handle is visible through
//! every other handle whose window covers it.
//!
//! Buffers are not thread-safe. [`ArrayDataBuffer`] is `!Send`, so
//! sharing its storage across threads is rejected at compile time.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::dtype::Element;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BufferError {
    #[error("index {index} out of bounds for buffer of size {size}")]
    OutOfBounds { index: usize, size: usize },

    #[error("{len} values at index {index} out of bounds for buffer of size {size}")]
    RangeOutOfBounds {
        index: usize,
        len: usize,
        size: usize,
    },

    #[error("buffer is read-only")]
    ReadOnly,
}

/// Bounded random-access storage of `T` values.
///
/// Mutation goes through `&self`: handles alias their storage, so
/// exclusive access cannot be expressed through the borrow checker.
pub trait DataBuffer<T: Element>: Clone {
    /// Number of values in this window.
    fn size(&self) -> usize;

    /// Whether stores through this handle are rejected.
    fn is_read_only(&self) -> bool {
        false
    }

    /// Loads the value at `index`.
    fn get(&self, index: usize) -> Result<T, BufferError>;

    /// Stores `value` at `index`.
    fn set(&self, index: usize, value: T) -> Result<(), BufferError>;

    /// Loads `dst.len()` consecutive values starting at `index`.
    fn read(&self, index: usize, dst: &mut [T]) -> Result<(), BufferError> {
        check_range(index, dst.len(), self.size())?;
        for (i, slot) in dst.iter_mut().enumerate() {
            *slot = self.get(index + i)?;
        }
        Ok(())
    }

    /// Stores `src` in consecutive slots starting at `index`.
    fn write(&self, index: usize, src: &[T]) -> Result<(), BufferError> {
        check_range(index, src.len(), self.size())?;
        for (i, value) in src.iter().enumerate() {
            self.set(index + i, value.clone())?;
        }
        Ok(())
    }

    /// A new handle over the same window and storage.
    fn duplicate(&self) -> Self {
        self.clone()
    }

    /// A handle over `len` values starting at `index`, sharing this
    /// buffer's storage.
    fn slice(&self, index: usize, len: usize) -> Result<Self, BufferError>;
}

pub(crate) fn check_range(index: usize, len: usize, size: usize) -> Result<(), BufferError> {
    match index.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(BufferError::RangeOutOfBounds { index, len, size }),
    }
}

/// A heap-allocated [`DataBuffer`].
pub struct ArrayDataBuffer<T> {
    storage: Rc<RefCell<Vec<T>>>,
    offset: usize,
    size: usize,
    read_only: bool,
}

impl<T: Element> ArrayDataBuffer<T> {
    /// Allocates `capacity` default-valued slots.
    pub fn allocate(capacity: usize) -> Self {
        Self::wrap(vec![T::default(); capacity])
    }

    /// Takes ownership of `values` as the buffer's storage.
    pub fn wrap(values: Vec<T>) -> Self {
        let size = values.len();
        Self {
            storage: Rc::new(RefCell::new(values)),
            offset: 0,
            size,
            read_only: false,
        }
    }

    /// Like [`Self::wrap`], but every store fails with
    /// [`BufferError::ReadOnly`].
    pub fn wrap_read_only(values: Vec<T>) -> Self {
        Self {
            read_only: true,
            ..Self::wrap(values)
        }
    }

    /// Copies the values of this window out of the buffer.
    pub fn to_vec(&self) -> Vec<T> {
        self.storage.borrow()[self.offset..self.offset + self.size].to_vec()
    }

    /// True if both handles share the same storage.
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.storage, &other.storage)
    }

    fn check_writable(&self) -> Result<(), BufferError> {
        if self.read_only {
            return Err(BufferError::ReadOnly);
        }
        Ok(())
    }
}

impl<T: Element> DataBuffer<T> for ArrayDataBuffer<T> {
    fn size(&self) -> usize {
        self.size
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn get(&self, index: usize) -> Result<T, BufferError> {
        if index >= self.size {
            return Err(BufferError::OutOfBounds {
                index,
                size: self.size,
            });
        }
        Ok(self.storage.borrow()[self.offset + index].clone())
    }

    fn set(&self, index: usize, value: T) -> Result<(), BufferError> {
        self.check_writable()?;
        if index >= self.size {
            return Err(BufferError::OutOfBounds {
                index,
                size: self.size,
            });
        }
        self.storage.borrow_mut()[self.offset + index] = value;
        Ok(())
    }

    fn read(&self, index: usize, dst: &mut [T]) -> Result<(), BufferError> {
        check_range(index, dst.len(), self.size)?;
        let start = self.offset + index;
        dst.clone_from_slice(&self.storage.borrow()[start..start + dst.len()]);
        Ok(())
    }

    fn write(&self, index: usize, src: &[T]) -> Result<(), BufferError> {
        self.check_writable()?;
        check_range(index, src.len(), self.size)?;
        let start = self.offset + index;
        self.storage.borrow_mut()[start..start + src.len()].clone_from_slice(src);
        Ok(())
    }

    fn slice(&self, index: usize, len: usize) -> Result<Self, BufferError> {
        check_range(index, len, self.size)?;
        Ok(Self {
            storage: Rc::clone(&self.storage),
            offset: self.offset + index,
            size: len,
            read_only: self.read_only,
        })
    }
}

impl<T> Clone for ArrayDataBuffer<T> {
    fn clone(&self) -> Self {
        Self {
            storage: Rc::clone(&self.storage),
            offset: self.offset,
            size: self.size,
            read_only: self.read_only,
        }
    }
}

impl<T> fmt::Debug for ArrayDataBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayDataBuffer")
            .field("offset", &self.offset)
            .field("size", &self.size)
            .field("read_only", &self.read_only)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let buffer = ArrayDataBuffer::<i32>::allocate(4);
        assert_eq!(buffer.size(), 4);
        assert_eq!(buffer.get(3).unwrap(), 0);
        buffer.set(3, 7).unwrap();
        assert_eq!(buffer.get(3).unwrap(), 7);
        assert_eq!(
            buffer.get(4).unwrap_err(),
            BufferError::OutOfBounds { index: 4, size: 4 }
        );
        assert!(buffer.set(4, 1).is_err());
    }

    #[test]
    fn test_bulk_read_write() {
        let buffer = ArrayDataBuffer::wrap(vec![0i64; 6]);
        buffer.write(2, &[1, 2, 3]).unwrap();
        let mut dst = [0i64; 4];
        buffer.read(1, &mut dst).unwrap();
        assert_eq!(dst, [0, 1, 2, 3]);
        assert_eq!(
            buffer.write(4, &[1, 2, 3]).unwrap_err(),
            BufferError::RangeOutOfBounds {
                index: 4,
                len: 3,
                size: 6
            }
        );
        assert!(buffer.read(usize::MAX, &mut dst).is_err());
    }

    #[test]
    fn test_slice_shares_storage() {
        let buffer = ArrayDataBuffer::wrap((0..10).collect::<Vec<u32>>());
        let slice = buffer.slice(4, 3).unwrap();
        assert_eq!(slice.size(), 3);
        assert_eq!(slice.to_vec(), vec![4, 5, 6]);
        assert!(slice.shares_storage_with(&buffer));

        slice.set(0, 40).unwrap();
        assert_eq!(buffer.get(4).unwrap(), 40);
        assert!(slice.get(3).is_err());

        let nested = slice.slice(1, 2).unwrap();
        assert_eq!(nested.to_vec(), vec![5, 6]);
        assert!(slice.slice(2, 2).is_err());
    }

    #[test]
    fn test_duplicate_shares_storage() {
        let buffer = ArrayDataBuffer::<f32>::allocate(2);
        let dup = buffer.duplicate();
        dup.set(1, 1.5).unwrap();
        assert_eq!(buffer.get(1).unwrap(), 1.5);
    }

    #[test]
    fn test_read_only() {
        let buffer = ArrayDataBuffer::wrap_read_only(vec![1u8, 2, 3]);
        assert!(buffer.is_read_only());
        assert_eq!(buffer.get(1).unwrap(), 2);
        assert_eq!(buffer.set(0, 9).unwrap_err(), BufferError::ReadOnly);
        assert_eq!(buffer.write(0, &[9]).unwrap_err(), BufferError::ReadOnly);
        assert!(buffer.slice(1, 1).unwrap().is_read_only());
    }

    #[test]
    fn test_strings() {
        let buffer = ArrayDataBuffer::<String>::allocate(2);
        buffer.write(0, &["a".to_string(), "bc".to_string()]).unwrap();
        assert_eq!(buffer.to_vec(), vec!["a".to_string(), "bc".to_string()]);
    }
}
