use snafu::Snafu;
use tessel_dtype::{DataFormat, DataType, DeviceType, MemoryType};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Status codes exchanged with backend adapters.
///
/// Values are part of the C ABI and must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    InvalidParam = 0x1000,
    InvalidParamValue = 0x1001,
    NullParam = 0x1004,

    /// Reserved for backend adapters.
    InvalidModel = 0x2000,

    OutOfMemory = 0x3002,
    NotImplement = 0x3003,

    DeviceNotSupport = 0x4000,
    DeviceInvalid = 0x4001,

    CudaMemcpyError = 0x5001,

    Unknown = 0x7fff,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// A required argument was absent.
    #[snafu(display("missing required parameter: {what}"))]
    NullParam { what: &'static str },

    #[snafu(display("invalid dims: {source}"))]
    Dims { source: tessel_dtype::Error },

    #[snafu(display("data type mismatch: src {src}, dst {dst}"))]
    DataTypeMismatch { src: DataType, dst: DataType },

    #[snafu(display("data format mismatch: src {src}, dst {dst}"))]
    DataFormatMismatch { src: DataFormat, dst: DataFormat },

    #[snafu(display("memory type mismatch: expected {expected}, got {actual}"))]
    MemoryTypeMismatch { expected: MemoryType, actual: MemoryType },

    /// Source and destination resolve to the same storage.
    #[snafu(display("source and destination share storage"))]
    AliasedStorage,

    #[snafu(display("size mismatch: expected {expected}, got {actual}"))]
    SizeMismatch { expected: usize, actual: usize },

    #[snafu(display("data type {data_type} has no element width"))]
    UnsupportedDataType { data_type: DataType },

    /// The device type has no memory space.
    #[snafu(display("device {device} has no supported memory type"))]
    UnsupportedMemory { device: DeviceType },

    #[snafu(display("out of memory allocating {bytes} bytes on {device}"))]
    OutOfMemory { bytes: usize, device: DeviceType },

    /// A device handed back a region of the wrong length.
    #[snafu(display("{device} allocated {actual} bytes, {expected} requested"))]
    AllocationSize { device: DeviceType, expected: usize, actual: usize },

    #[snafu(display("device {device} is not registered"))]
    DeviceNotFound { device: DeviceType },

    #[snafu(display("{memory} memory is not accessible from the host"))]
    NotHostAccessible { memory: MemoryType },

    #[snafu(display("{op} is not implemented for {device}"))]
    NotImplemented { device: DeviceType, op: &'static str },

    #[snafu(display("staged copy {src} -> {dst} is disabled"))]
    StagingDisabled { src: DeviceType, dst: DeviceType },

    /// Failure reported by a device implementation.
    #[snafu(display("{device} device error ({code:?}): {reason}"))]
    Device { device: DeviceType, code: ErrorCode, reason: String },
}

impl Error {
    /// Status code reported across the C ABI.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NullParam { .. }
            | Self::DataTypeMismatch { .. }
            | Self::DataFormatMismatch { .. }
            | Self::MemoryTypeMismatch { .. }
            | Self::AliasedStorage
            | Self::NotHostAccessible { .. } => ErrorCode::InvalidParam,
            Self::Dims { .. } | Self::SizeMismatch { .. } | Self::UnsupportedDataType { .. } => {
                ErrorCode::InvalidParamValue
            }
            Self::UnsupportedMemory { .. } => ErrorCode::NullParam,
            Self::OutOfMemory { .. } | Self::AllocationSize { .. } => ErrorCode::OutOfMemory,
            Self::DeviceNotFound { .. } => ErrorCode::DeviceInvalid,
            Self::NotImplemented { .. } => ErrorCode::NotImplement,
            Self::StagingDisabled { .. } => ErrorCode::DeviceNotSupport,
            Self::Device { code, .. } => *code,
        }
    }
}

impl From<&Error> for ErrorCode {
    fn from(error: &Error) -> Self {
        error.code()
    }
}

impl<T> From<&Result<T>> for ErrorCode {
    fn from(result: &Result<T>) -> Self {
        match result {
            Ok(_) => ErrorCode::Success,
            Err(error) => error.code(),
        }
    }
}
