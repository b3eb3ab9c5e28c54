use std::ptr::NonNull;
use std::sync::Arc;

use snafu::ensure;
use tessel_dtype::{DataType, MemoryType};

use crate::device::{Device, RawMemory};
use crate::error::{
    AllocationSizeSnafu, MemoryTypeMismatchSnafu, NotHostAccessibleSnafu, OutOfMemorySnafu, Result, UnsupportedDataTypeSnafu,
    UnsupportedMemorySnafu,
};

/// What a buffer holds: memory space, element type and element count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryDesc {
    pub memory_type: MemoryType,
    pub data_type: DataType,
    /// Number of elements (not bytes).
    pub count: usize,
}

impl MemoryDesc {
    pub fn new(memory_type: MemoryType, data_type: DataType, count: usize) -> Self {
        Self { memory_type, data_type, count }
    }

    /// Size in bytes, `None` on overflow.
    pub fn byte_size(&self) -> Option<usize> {
        self.count.checked_mul(self.data_type.bytes())
    }
}

#[derive(Debug)]
enum Memory {
    /// Allocated by `device`, returned to it on drop.
    Owned { raw: RawMemory, device: Arc<dyn Device> },
    /// External memory; never freed here.
    Borrowed { ptr: NonNull<u8> },
    /// Already handed back by `Buffer::release`.
    Released,
}

/// A contiguous memory region tagged with its memory space and element type.
///
/// A buffer either owns its region (allocated through a [`Device`]) or
/// borrows memory owned by someone else, typically a backend tensor. Owned
/// memory is freed exactly once, when the buffer is dropped or released;
/// borrowed memory is never freed.
///
/// Buffers are neither `Send` nor `Sync`: any sharing across threads is the
/// caller's business.
#[derive(Debug)]
pub struct Buffer {
    memory: Memory,
    desc: MemoryDesc,
    bytes: usize,
}

impl Buffer {
    /// Allocate `desc.count` elements on `device`.
    pub fn alloc(device: &Arc<dyn Device>, desc: MemoryDesc) -> Result<Self> {
        let bytes = Self::validate(&desc, device.device_type())?;
        ensure!(
            device.memory_type() == desc.memory_type,
            MemoryTypeMismatchSnafu { expected: desc.memory_type, actual: device.memory_type() }
        );

        let raw = device.allocate(bytes)?;
        if raw.len() != bytes {
            let actual = raw.len();
            // SAFETY: `raw` was just returned by `allocate` on this device.
            if let Err(error) = unsafe { device.free(raw) } {
                tracing::error!(device = %device.device_type(), %error, "failed to free mis-sized allocation");
            }
            return AllocationSizeSnafu { device: device.device_type(), expected: bytes, actual }.fail();
        }
        Ok(Self { memory: Memory::Owned { raw, device: Arc::clone(device) }, desc, bytes })
    }

    /// Wrap externally owned memory without allocating.
    ///
    /// # Safety
    ///
    /// `ptr` must address at least `desc.count * desc.data_type.bytes()` bytes
    /// in `desc.memory_type` and stay valid, and not be freed, for as long as
    /// the returned buffer lives.
    pub unsafe fn create(ptr: NonNull<u8>, desc: MemoryDesc) -> Result<Self> {
        let bytes = Self::validate(&desc, desc.memory_type.device_type())?;
        Ok(Self { memory: Memory::Borrowed { ptr }, desc, bytes })
    }

    fn validate(desc: &MemoryDesc, device: tessel_dtype::DeviceType) -> Result<usize> {
        ensure!(desc.memory_type.is_supported(), UnsupportedMemorySnafu { device });
        ensure!(desc.data_type.is_concrete(), UnsupportedDataTypeSnafu { data_type: desc.data_type });
        desc.byte_size().ok_or_else(|| OutOfMemorySnafu { bytes: usize::MAX, device }.build())
    }

    pub fn as_ptr(&self) -> *const u8 {
        match &self.memory {
            Memory::Owned { raw, .. } => raw.as_ptr(),
            Memory::Borrowed { ptr } => ptr.as_ptr(),
            Memory::Released => std::ptr::null(),
        }
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        match &self.memory {
            Memory::Owned { raw, .. } => raw.as_ptr(),
            Memory::Borrowed { ptr } => ptr.as_ptr(),
            Memory::Released => std::ptr::null_mut(),
        }
    }

    pub fn desc(&self) -> MemoryDesc {
        self.desc
    }

    pub fn memory_type(&self) -> MemoryType {
        self.desc.memory_type
    }

    pub fn data_type(&self) -> DataType {
        self.desc.data_type
    }

    /// Number of elements.
    pub fn element_count(&self) -> usize {
        self.desc.count
    }

    /// Size in bytes.
    pub fn byte_size(&self) -> usize {
        self.bytes
    }

    /// Whether the memory is borrowed rather than owned.
    pub fn is_external(&self) -> bool {
        matches!(self.memory, Memory::Borrowed { .. })
    }

    /// Whether both buffers address the same non-empty region.
    pub fn shares_storage(&self, other: &Buffer) -> bool {
        self.bytes != 0
            && other.bytes != 0
            && self.memory_type() == other.memory_type()
            && std::ptr::eq(self.as_ptr(), other.as_ptr())
    }

    /// View host memory as bytes.
    pub fn host_bytes(&self) -> Result<&[u8]> {
        ensure!(self.memory_type() == MemoryType::Host, NotHostAccessibleSnafu { memory: self.memory_type() });
        if self.bytes == 0 {
            return Ok(&[]);
        }
        // SAFETY: host memory of `bytes` bytes, valid per the alloc/create contracts.
        Ok(unsafe { std::slice::from_raw_parts(self.as_ptr(), self.bytes) })
    }

    /// Mutable view of host memory as bytes.
    pub fn host_bytes_mut(&mut self) -> Result<&mut [u8]> {
        ensure!(self.memory_type() == MemoryType::Host, NotHostAccessibleSnafu { memory: self.memory_type() });
        if self.bytes == 0 {
            return Ok(&mut []);
        }
        let bytes = self.bytes;
        // SAFETY: as in `host_bytes`, and `self` is uniquely borrowed.
        Ok(unsafe { std::slice::from_raw_parts_mut(self.as_mut_ptr(), bytes) })
    }

    /// Free owned memory now, reporting the device's answer.
    ///
    /// Dropping a buffer does the same but can only log a failure.
    pub fn release(mut self) -> Result<()> {
        match std::mem::replace(&mut self.memory, Memory::Released) {
            // SAFETY: owned memory was allocated by `device` and is taken out exactly once.
            Memory::Owned { raw, device } => unsafe { device.free(raw) },
            Memory::Borrowed { .. } | Memory::Released => Ok(()),
        }
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        // SAFETY: as in `release`.
        if let Memory::Owned { raw, device } = std::mem::replace(&mut self.memory, Memory::Released)
            && let Err(error) = unsafe { device.free(raw) }
        {
            tracing::error!(device = %device.device_type(), %error, "failed to free buffer");
        }
    }
}
