use std::fmt;
use std::ptr::NonNull;

use snafu::{ResultExt, ensure};
use tessel_dtype::{DataFormat, DataType, DeviceType, Dims};
use tinyvec::ArrayVec;

use crate::buffer::{Buffer, MemoryDesc};
use crate::error::{DimsSnafu, OutOfMemorySnafu, Result, SizeMismatchSnafu, UnsupportedMemorySnafu};
use crate::registry::{DeviceLookup, registry};

/// Maximum length of a blob name in bytes.
pub const MAX_BLOB_NAME: usize = 64;

/// Inline, length-bounded blob name.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BlobName {
    bytes: ArrayVec<[u8; MAX_BLOB_NAME]>,
}

impl BlobName {
    /// Store `name`, cutting it at the last char boundary within [`MAX_BLOB_NAME`] bytes.
    ///
    /// The second element reports whether anything was cut.
    pub fn truncated(name: &str) -> (Self, bool) {
        let mut end = name.len().min(MAX_BLOB_NAME);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        let bytes = name.as_bytes()[..end].iter().copied().collect();
        (Self { bytes }, end < name.len())
    }

    pub fn as_str(&self) -> &str {
        // Only ever filled from a `&str` cut at a char boundary.
        std::str::from_utf8(&self.bytes).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for BlobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for BlobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named tensor: shape, element type, layout, device, and the buffer holding its data.
///
/// The blob exclusively owns its [`Buffer`]. Whether that buffer owns its
/// memory depends on the constructor: [`Blob::alloc`] allocates,
/// [`Blob::make`] aliases memory owned by a backend.
#[derive(Debug)]
pub struct Blob {
    device_type: DeviceType,
    data_type: DataType,
    data_format: DataFormat,
    dims: Dims,
    name: BlobName,
    buffer: Buffer,
}

impl Blob {
    /// Allocate a blob through the global device registry.
    pub fn alloc(
        device_type: DeviceType,
        data_type: DataType,
        data_format: DataFormat,
        name: &str,
        dims: &Dims,
    ) -> Result<Self> {
        Self::alloc_in(registry(), device_type, data_type, data_format, name, dims)
    }

    /// Allocate a blob on the device `lookup` resolves for `device_type`.
    ///
    /// The element count is the product of `dims` (0 for empty dims, which
    /// yields a valid zero-byte blob). Names longer than [`MAX_BLOB_NAME`]
    /// bytes are truncated with a warning.
    pub fn alloc_in(
        lookup: &dyn DeviceLookup,
        device_type: DeviceType,
        data_type: DataType,
        data_format: DataFormat,
        name: &str,
        dims: &Dims,
    ) -> Result<Self> {
        let name = Self::store_name(name);
        let desc = Self::describe(device_type, data_type, dims)?;
        let device = lookup.require(device_type)?;
        let buffer = Buffer::alloc(&device, desc)?;

        Ok(Self { device_type, data_type, data_format, dims: *dims, name, buffer })
    }

    /// Build a blob aliasing memory owned elsewhere. Nothing is allocated.
    ///
    /// # Safety
    ///
    /// `data` must address at least `dims.element_count() * data_type.bytes()`
    /// bytes in the memory space of `device_type`, and must outlive the blob.
    pub unsafe fn make(
        device_type: DeviceType,
        data_type: DataType,
        data_format: DataFormat,
        name: &str,
        dims: &Dims,
        data: NonNull<u8>,
    ) -> Result<Self> {
        let name = Self::store_name(name);
        let desc = Self::describe(device_type, data_type, dims)?;
        // SAFETY: forwarded from this function's contract.
        let buffer = unsafe { Buffer::create(data, desc)? };

        Ok(Self { device_type, data_type, data_format, dims: *dims, name, buffer })
    }

    fn store_name(name: &str) -> BlobName {
        let (stored, truncated) = BlobName::truncated(name);
        if truncated {
            tracing::warn!(name, max = MAX_BLOB_NAME, stored = stored.as_str(), "blob name truncated");
        }
        stored
    }

    fn describe(device_type: DeviceType, data_type: DataType, dims: &Dims) -> Result<MemoryDesc> {
        let memory_type = device_type.memory_type();
        ensure!(memory_type.is_supported(), UnsupportedMemorySnafu { device: device_type });
        let count = dims
            .checked_element_count()
            .ok_or_else(|| OutOfMemorySnafu { bytes: usize::MAX, device: device_type }.build())?;
        Ok(MemoryDesc::new(memory_type, data_type, count))
    }

    pub fn device_type(&self) -> DeviceType {
        self.device_type
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn data_format(&self) -> DataFormat {
        self.data_format
    }

    pub fn dims(&self) -> &Dims {
        &self.dims
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// The buffer is never replaced from outside, so `dims`, `data_type` and
    /// the buffer's element count stay in agreement.
    pub(crate) fn buffer_mut(&mut self) -> &mut Buffer {
        &mut self.buffer
    }

    /// Raw pointer to the data, in the blob's memory space.
    pub fn as_ptr(&self) -> *const u8 {
        self.buffer.as_ptr()
    }

    /// Mutable raw pointer to the data, in the blob's memory space.
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.buffer.as_mut_ptr()
    }

    /// Number of elements recorded in the buffer.
    pub fn size(&self) -> usize {
        self.buffer.element_count()
    }

    /// Retag the layout, e.g. after a backend reports its native format.
    pub fn set_data_format(&mut self, data_format: DataFormat) {
        self.data_format = data_format;
    }

    /// Change the shape without touching the data. The element count must not change.
    pub fn reshape(&mut self, dims: &Dims) -> Result<()> {
        let count = dims.checked_element_count().unwrap_or(usize::MAX);
        ensure!(count == self.size(), SizeMismatchSnafu { expected: self.size(), actual: count });
        self.dims = *dims;
        Ok(())
    }

    /// Like [`Blob::reshape`], from raw axis values.
    pub fn reshape_from(&mut self, values: &[usize]) -> Result<()> {
        let dims = Dims::new(values).context(DimsSnafu)?;
        self.reshape(&dims)
    }

    pub fn host_bytes(&self) -> Result<&[u8]> {
        self.buffer.host_bytes()
    }

    pub fn host_bytes_mut(&mut self) -> Result<&mut [u8]> {
        self.buffer.host_bytes_mut()
    }

    /// Release the buffer and the descriptor.
    ///
    /// Dropping a blob has the same effect; `free` also reports a failure of
    /// the owning device to release memory.
    pub fn free(self) -> Result<()> {
        let Self { buffer, .. } = self;
        buffer.release()
    }
}

/// Find a blob by name, returning its index and the blob.
pub fn find_blob<'a>(blobs: &'a [Blob], name: &str) -> Option<(usize, &'a Blob)> {
    blobs.iter().enumerate().find(|(_, blob)| blob.name() == name)
}
