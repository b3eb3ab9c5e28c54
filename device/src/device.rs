//! Device abstraction consumed by the blob layer.
//!
//! A [`Device`] owns two concerns for one execution domain:
//! - **Allocation**: hands out and reclaims [`RawMemory`] in its memory space
//! - **Transfer**: the three copy primitives the copy engine routes to
//!
//! Accelerator backends implement this trait out of tree; the crate ships
//! [`HostDevice`] for CPU, X86 and ARM.

use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;

use snafu::ensure;
use tessel_dtype::{DeviceType, MemoryType};

use crate::buffer::Buffer;
use crate::error::{
    DataTypeMismatchSnafu, MemoryTypeMismatchSnafu, NotImplementedSnafu, OutOfMemorySnafu, Result,
    SizeMismatchSnafu,
};

/// Opaque command queue handle (CUDA stream, OpenCL queue, ...).
///
/// Passed through untouched to device copy primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stream {
    handle: NonNull<c_void>,
}

impl Stream {
    /// Wrap a backend queue handle.
    ///
    /// # Safety
    ///
    /// The handle must stay valid for every copy it is passed to.
    pub unsafe fn from_raw(handle: NonNull<c_void>) -> Self {
        Self { handle }
    }

    pub fn as_raw(&self) -> *mut c_void {
        self.handle.as_ptr()
    }
}

/// A region handed out by [`Device::allocate`] and returned to [`Device::free`].
#[derive(Debug, PartialEq, Eq)]
pub struct RawMemory {
    ptr: NonNull<u8>,
    len: usize,
}

impl RawMemory {
    /// # Safety
    ///
    /// `ptr` must address `len` bytes owned by the allocating device.
    pub unsafe fn from_raw_parts(ptr: NonNull<u8>, len: usize) -> Self {
        Self { ptr, len }
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Memory and transfer capabilities of one device type.
///
/// Implementations are registered once at startup and looked up concurrently
/// afterwards, hence `Send + Sync`.
///
/// # Safety
///
/// [`Device::allocate`] must return memory of exactly the requested length
/// that stays valid in [`Device::memory_type`] until handed to
/// [`Device::free`] of the same device. [`Buffer`] builds host slices over
/// that region and relies on both.
pub unsafe trait Device: Send + Sync + fmt::Debug {
    fn device_type(&self) -> DeviceType;

    /// Memory space this device allocates in.
    fn memory_type(&self) -> MemoryType {
        self.device_type().memory_type()
    }

    /// Allocate `bytes` zero-initialized bytes.
    fn allocate(&self, bytes: usize) -> Result<RawMemory>;

    /// Release memory previously returned by [`Device::allocate`].
    ///
    /// # Safety
    ///
    /// `memory` must come from `allocate` on this same device and must not
    /// have been freed already.
    unsafe fn free(&self, memory: RawMemory) -> Result<()>;

    /// Copy within this device's memory space.
    fn copy(&self, src: &Buffer, dst: &mut Buffer, stream: Option<&Stream>) -> Result<()>;

    /// Copy host memory into this device.
    fn copy_to_device(&self, src: &Buffer, dst: &mut Buffer, stream: Option<&Stream>) -> Result<()>;

    /// Copy this device's memory out to the host.
    fn copy_from_device(&self, src: &Buffer, dst: &mut Buffer, stream: Option<&Stream>) -> Result<()>;

    fn name(&self) -> &str {
        self.device_type().as_str()
    }
}

/// Validate a buffer pair for a transfer and return the byte count to move.
///
/// Device implementations call this before touching raw pointers.
pub fn check_transfer(src: &Buffer, dst: &mut Buffer, src_memory: MemoryType, dst_memory: MemoryType) -> Result<usize> {
    ensure!(src.data_type() == dst.data_type(), DataTypeMismatchSnafu { src: src.data_type(), dst: dst.data_type() });
    ensure!(
        src.memory_type() == src_memory,
        MemoryTypeMismatchSnafu { expected: src_memory, actual: src.memory_type() }
    );
    ensure!(
        dst.memory_type() == dst_memory,
        MemoryTypeMismatchSnafu { expected: dst_memory, actual: dst.memory_type() }
    );
    ensure!(
        src.byte_size() == dst.byte_size(),
        SizeMismatchSnafu { expected: dst.byte_size(), actual: src.byte_size() }
    );
    Ok(src.byte_size())
}

/// Host memory for CPU, X86 and ARM.
#[derive(Debug, Clone)]
pub struct HostDevice {
    device_type: DeviceType,
}

impl HostDevice {
    /// Create a host device under the given architecture tag.
    ///
    /// Returns `None` for non-host device types.
    pub fn new(device_type: DeviceType) -> Option<Self> {
        device_type.is_host().then_some(Self { device_type })
    }

    pub fn cpu() -> Self {
        Self { device_type: DeviceType::Cpu }
    }
}

// SAFETY: `allocate` leaks a boxed slice of exactly `bytes` bytes and `free`
// reclaims only such slices.
unsafe impl Device for HostDevice {
    fn device_type(&self) -> DeviceType {
        self.device_type
    }

    fn allocate(&self, bytes: usize) -> Result<RawMemory> {
        let mut data: Vec<u8> = Vec::new();
        data.try_reserve_exact(bytes).map_err(|_| OutOfMemorySnafu { bytes, device: self.device_type }.build())?;
        data.resize(bytes, 0);

        let data = Box::into_raw(data.into_boxed_slice());
        // SAFETY: `Box::into_raw` never returns null.
        let ptr = unsafe { NonNull::new_unchecked(data.cast::<u8>()) };
        Ok(RawMemory { ptr, len: bytes })
    }

    unsafe fn free(&self, memory: RawMemory) -> Result<()> {
        let slice = std::ptr::slice_from_raw_parts_mut(memory.ptr.as_ptr(), memory.len);
        // SAFETY: per the caller contract `memory` came from `allocate`, which leaked a `Box<[u8]>` of `len` bytes.
        drop(unsafe { Box::from_raw(slice) });
        Ok(())
    }

    fn copy(&self, src: &Buffer, dst: &mut Buffer, _stream: Option<&Stream>) -> Result<()> {
        let bytes = check_transfer(src, dst, MemoryType::Host, MemoryType::Host)?;
        if bytes == 0 {
            return Ok(());
        }
        // SAFETY: both regions are host memory of `bytes` bytes and `dst` is uniquely borrowed.
        // The copy engine rejects aliased storage before getting here.
        unsafe { std::ptr::copy(src.as_ptr(), dst.as_mut_ptr(), bytes) };
        Ok(())
    }

    fn copy_to_device(&self, _src: &Buffer, _dst: &mut Buffer, _stream: Option<&Stream>) -> Result<()> {
        NotImplementedSnafu { device: self.device_type, op: "copy_to_device" }.fail()
    }

    fn copy_from_device(&self, _src: &Buffer, _dst: &mut Buffer, _stream: Option<&Stream>) -> Result<()> {
        NotImplementedSnafu { device: self.device_type, op: "copy_from_device" }.fail()
    }
}
