//! Blob memory model and cross-device copy engine.
//!
//! A [`Blob`] is a named, typed, shaped tensor that owns (or borrows) a
//! [`Buffer`] in one device's memory space. Devices are resolved through a
//! [`DeviceRegistry`]; [`blob_copy`] routes a transfer between any two
//! registered devices, staging through host memory when two accelerators
//! have no direct path.
//!
//! The [`ffi`] module exposes the same operations over the C ABI.

pub mod blob;
pub mod buffer;
pub mod config;
pub mod copy;
pub mod device;
pub mod error;
pub mod ffi;
pub mod registry;


pub use blob::{Blob, BlobName, MAX_BLOB_NAME, find_blob};
pub use buffer::{Buffer, MemoryDesc};
pub use config::CopyOptions;
pub use copy::{CopyRoute, blob_copy, blob_copy_with};
pub use device::{Device, HostDevice, RawMemory, Stream, check_transfer};
pub use error::{Error, ErrorCode, Result};
pub use registry::{DeviceLookup, DeviceRegistry, get_device, registry};

pub use tessel_dtype::{DataFormat, DataType, DeviceType, Dims, MemoryType};
