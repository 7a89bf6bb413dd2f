//! Element types that can be stored in a [`crate::DataBuffer`].
//!
//! Every element type carries a [`DataType`] tag. Fixed-width types may
//! be moved between buffers in contiguous runs; variable-width types
//! ([`DataType::Utf8`]) are always transferred one value at a time.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// The logical type of the values held by an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
    Utf8,
}

impl DataType {
    /// Whether values of this type have a variable encoded width.
    pub const fn is_variable_sized(&self) -> bool {
        matches!(self, DataType::Utf8)
    }

    /// Whether contiguous runs of this type may be copied with a single
    /// buffer operation.
    pub const fn supports_bulk_transfer(&self) -> bool {
        !self.is_variable_sized()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::I8 => "i8",
            DataType::I16 => "i16",
            DataType::I32 => "i32",
            DataType::I64 => "i64",
            DataType::U8 => "u8",
            DataType::U16 => "u16",
            DataType::U32 => "u32",
            DataType::U64 => "u64",
            DataType::F32 => "f32",
            DataType::F64 => "f64",
            DataType::Bool => "bool",
            DataType::Utf8 => "utf8",
        };
        f.write_str(name)
    }
}

/// A value that can be stored in an n-dimensional array.
///
/// `Default` provides the initial value of freshly allocated buffers.
pub trait Element: Clone + Default + PartialEq + fmt::Debug + 'static {
    /// The logical datatype for this element.
    const TYPE: DataType;
}

macro_rules! impl_element {
    ($ty:ty, $dtype:ident) => {
        impl Element for $ty {
            const TYPE: DataType = DataType::$dtype;
        }
    };
}

impl_element!(i8, I8);
impl_element!(i16, I16);
impl_element!(i32, I32);
impl_element!(i64, I64);
impl_element!(u8, U8);
impl_element!(u16, U16);
impl_element!(u32, U32);
impl_element!(u64, U64);
impl_element!(f32, F32);
impl_element!(f64, F64);
impl_element!(bool, Bool);
impl_element!(String, Utf8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_eligibility() {
        assert!(<f32 as Element>::TYPE.supports_bulk_transfer());
        assert!(<bool as Element>::TYPE.supports_bulk_transfer());
        assert!(!<String as Element>::TYPE.supports_bulk_transfer());
        assert!(DataType::Utf8.is_variable_sized());
    }

    #[test]
    fn test_display() {
        assert_eq!(<u16 as Element>::TYPE.to_string(), "u16");
        assert_eq!(DataType::F64.to_string(), "f64");
    }
}
