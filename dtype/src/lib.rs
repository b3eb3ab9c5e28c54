//! Type, layout and device catalog shared by every tessel crate.
//!
//! Nothing in here allocates or talks to hardware: these are the tags a
//! [`Blob`](../tessel_device/struct.Blob.html) carries and the tables the
//! copy engine consults when it routes a transfer.

pub mod device;
pub mod dims;
pub mod error;


pub use device::{DeviceType, MemoryType};
pub use dims::{Dims, MAX_DIMS_SIZE};
pub use error::{Error, Result};

/// Element type of a tensor.
///
/// Discriminants match the values exchanged with backend adapters over the C ABI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::EnumCount, strum::EnumIter, strum::VariantArray, strum::FromRepr)]
#[repr(i32)]
pub enum DataType {
    /// Unset or unsupported.
    #[default]
    None = -2,
    /// Resolved later by the backend.
    Auto = -1,

    Float32 = 0,
    Float16 = 1,
    Int8 = 2,
    UInt8 = 3,
    Int32 = 4,
    Int64 = 5,
    UInt32 = 6,
}

impl DataType {
    /// Width of one element in bytes, `0` for the sentinels.
    pub const fn bytes(&self) -> usize {
        match self {
            Self::None | Self::Auto => 0,
            Self::Float32 => 4,
            Self::Float16 => 2,
            Self::Int8 => 1,
            Self::UInt8 => 1,
            Self::Int32 => 4,
            Self::Int64 => 8,
            Self::UInt32 => 4,
        }
    }

    /// Whether this is a real element type (non-zero width).
    pub const fn is_concrete(&self) -> bool {
        self.bytes() != 0
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Auto => "AUTO",
            Self::Float32 => "FLOAT32",
            Self::Float16 => "FLOAT16",
            Self::Int8 => "INT8",
            Self::UInt8 => "UINT8",
            Self::Int32 => "INT32",
            Self::Int64 => "INT64",
            Self::UInt32 => "UINT32",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical memory layout of a tensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::EnumCount, strum::EnumIter, strum::VariantArray, strum::FromRepr)]
#[repr(i32)]
pub enum DataFormat {
    #[default]
    Auto = -1,
    Nc = 0,
    Nchw = 1,
    Nhwc = 2,
    Nhwc4 = 3,
    Ncdhw = 4,
}

impl DataFormat {
    /// Guess a layout from the rank and the relative size of the channel axis.
    ///
    /// Rank 4 picks between NCHW, NHWC and NHWC4 by comparing `dims[1]` with
    /// `dims[3]`: a trailing 4 with a wider second axis is read as NHWC4.
    /// Ranks without an obvious layout map to [`DataFormat::Auto`].
    ///
    /// NHWC4 is tested before NHWC. Backend adapters whose layout strings
    /// only know NCHW and NHWC report `[1, 224, 224, 4]` as NHWC, where this
    /// returns NHWC4; retag with [`DataFormat::Nhwc`] when talking to them.
    pub fn infer(dims: &Dims) -> Self {
        match dims.as_slice() {
            &[_, d1, _, d3] if d3 == 4 && d1 >= d3 => Self::Nhwc4,
            &[_, d1, _, d3] if d1 < d3 => Self::Nchw,
            &[_, _, _, _] => Self::Nhwc,
            &[_, _] => Self::Nc,
            &[_, _, _, _, _] => Self::Ncdhw,
            _ => Self::Auto,
        }
    }

    /// Expected rank for this layout, if it has one.
    pub const fn rank(&self) -> Option<usize> {
        match self {
            Self::Auto => None,
            Self::Nc => Some(2),
            Self::Nchw | Self::Nhwc | Self::Nhwc4 => Some(4),
            Self::Ncdhw => Some(5),
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "AUTO",
            Self::Nc => "NC",
            Self::Nchw => "NCHW",
            Self::Nhwc => "NHWC",
            Self::Nhwc4 => "NHWC4",
            Self::Ncdhw => "NCDHW",
        }
    }
}

impl std::fmt::Display for DataFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
