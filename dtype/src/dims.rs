use std::fmt;

use snafu::ensure;
use tinyvec::ArrayVec;

use crate::error::{NegativeDimSnafu, Result, TooManyDimsSnafu};

/// Maximum rank a [`Dims`] can hold.
pub const MAX_DIMS_SIZE: usize = 6;

/// Tensor shape with inline storage for up to [`MAX_DIMS_SIZE`] axes.
///
/// An empty `Dims` is the "unset" shape: its element count is 0, not 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Dims {
    values: ArrayVec<[usize; MAX_DIMS_SIZE]>,
}

impl Dims {
    /// The empty (unset) shape.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a shape, failing when `values` has more than [`MAX_DIMS_SIZE`] axes.
    pub fn new(values: &[usize]) -> Result<Self> {
        ensure!(values.len() <= MAX_DIMS_SIZE, TooManyDimsSnafu { len: values.len(), max: MAX_DIMS_SIZE });
        Ok(Self { values: values.iter().copied().collect() })
    }

    /// Build a shape from signed C-style values, rejecting negative axes.
    pub fn from_i32(values: &[i32]) -> Result<Self> {
        ensure!(values.len() <= MAX_DIMS_SIZE, TooManyDimsSnafu { len: values.len(), max: MAX_DIMS_SIZE });
        let mut dims = Self::empty();
        for (axis, &value) in values.iter().enumerate() {
            let value = usize::try_from(value).map_err(|_| NegativeDimSnafu { axis, value: i64::from(value) }.build())?;
            dims.values.push(value);
        }
        Ok(dims)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.values
    }

    /// Number of axes.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, axis: usize) -> Option<usize> {
        self.values.get(axis).copied()
    }

    /// Product of all axes; 0 for the empty shape, `None` on overflow.
    pub fn checked_element_count(&self) -> Option<usize> {
        if self.values.is_empty() {
            return Some(0);
        }
        self.values.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
    }

    /// Product of all axes; 0 for the empty shape, saturating on overflow.
    pub fn element_count(&self) -> usize {
        self.checked_element_count().unwrap_or(usize::MAX)
    }
}

impl TryFrom<&[usize]> for Dims {
    type Error = crate::Error;

    fn try_from(values: &[usize]) -> Result<Self> {
        Self::new(values)
    }
}

impl<const N: usize> TryFrom<[usize; N]> for Dims {
    type Error = crate::Error;

    fn try_from(values: [usize; N]) -> Result<Self> {
        Self::new(&values)
    }
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, dim) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{dim}")?;
        }
        f.write_str("]")
    }
}
