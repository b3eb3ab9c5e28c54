//! C ABI used by the backend adapters.
//!
//! Every function tolerates null arguments: allocation entry points return
//! null, status entry points return [`ErrorCode::InvalidParam`].
//! Enum arguments travel as their integer discriminants and are validated
//! before use.

#![allow(non_camel_case_types, improper_ctypes_definitions)]

use std::ffi::{CStr, c_char, c_void};
use std::ptr::NonNull;

use snafu::ResultExt;
use tessel_dtype::{DataFormat, DataType, DeviceType, Dims, MAX_DIMS_SIZE};

use crate::blob::Blob;
use crate::copy::blob_copy;
use crate::error::{DimsSnafu, ErrorCode, NullParamSnafu, Result};

/// C layout of a shape: `size` leading entries of `value` are used.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct tessel_dims_t {
    pub size: i32,
    pub value: [i32; MAX_DIMS_SIZE],
}

impl tessel_dims_t {
    pub fn to_dims(&self) -> Result<Dims> {
        let len = usize::try_from(self.size).unwrap_or(usize::MAX);
        match self.value.get(..len) {
            Some(values) => Dims::from_i32(values).context(DimsSnafu),
            None => Err(tessel_dtype::Error::TooManyDims { len, max: MAX_DIMS_SIZE }).context(DimsSnafu),
        }
    }
}

impl From<&Dims> for tessel_dims_t {
    fn from(dims: &Dims) -> Self {
        let mut out = Self { size: dims.len() as i32, value: [0; MAX_DIMS_SIZE] };
        for (slot, &dim) in out.value.iter_mut().zip(dims.as_slice()) {
            *slot = i32::try_from(dim).unwrap_or(i32::MAX);
        }
        out
    }
}

/// Opaque blob handle owned by the C caller.
#[repr(C)]
#[derive(Debug)]
pub struct tessel_blob_t {
    blob: Blob,
}

impl tessel_blob_t {
    pub fn blob(&self) -> &Blob {
        &self.blob
    }

    pub fn blob_mut(&mut self) -> &mut Blob {
        &mut self.blob
    }
}

struct BlobArgs {
    device_type: DeviceType,
    data_type: DataType,
    data_format: DataFormat,
    name: String,
    dims: Dims,
}

/// Decode the arguments shared by alloc and make; `None` after logging on any invalid one.
unsafe fn blob_args(
    device_type: i32,
    data_type: i32,
    data_format: i32,
    name: *const c_char,
    dims: Option<&tessel_dims_t>,
) -> Option<BlobArgs> {
    if name.is_null() {
        tracing::error!("blob name is null");
        return None;
    }
    let Some(dims) = dims else {
        tracing::error!("blob dims are null");
        return None;
    };
    let (Some(device_type), Some(data_type), Some(data_format)) =
        (DeviceType::from_repr(device_type), DataType::from_repr(data_type), DataFormat::from_repr(data_format))
    else {
        tracing::error!(device_type, data_type, data_format, "unknown enum value");
        return None;
    };
    let dims = match dims.to_dims() {
        Ok(dims) => dims,
        Err(error) => {
            tracing::error!(%error, "invalid blob dims");
            return None;
        }
    };
    // SAFETY: non-null and NUL-terminated per the caller's contract.
    let name = unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned();

    Some(BlobArgs { device_type, data_type, data_format, name, dims })
}

/// Allocate a blob. Returns null on any failure.
///
/// # Safety
///
/// `name` must be null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tessel_blob_alloc(
    device_type: i32,
    data_type: i32,
    data_format: i32,
    name: *const c_char,
    dims: Option<&tessel_dims_t>,
) -> Option<Box<tessel_blob_t>> {
    // SAFETY: forwarded from this function's contract.
    let args = unsafe { blob_args(device_type, data_type, data_format, name, dims) }?;
    match Blob::alloc(args.device_type, args.data_type, args.data_format, &args.name, &args.dims) {
        Ok(blob) => Some(Box::new(tessel_blob_t { blob })),
        Err(error) => {
            tracing::error!(%error, code = ?error.code(), "blob alloc failed");
            None
        }
    }
}

/// Wrap caller-owned memory in a blob. Returns null on any failure.
///
/// # Safety
///
/// `name` must be null or a valid NUL-terminated string. `data` must be null
/// or address enough memory for `dims` elements of `data_type` on
/// `device_type`, and must outlive the returned blob.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tessel_blob_make(
    device_type: i32,
    data_type: i32,
    data_format: i32,
    name: *const c_char,
    dims: Option<&tessel_dims_t>,
    data: *mut c_void,
) -> Option<Box<tessel_blob_t>> {
    let Some(data) = NonNull::new(data.cast::<u8>()) else {
        tracing::error!("blob data is null");
        return None;
    };
    // SAFETY: forwarded from this function's contract.
    let args = unsafe { blob_args(device_type, data_type, data_format, name, dims) }?;
    // SAFETY: forwarded from this function's contract.
    let made = unsafe { Blob::make(args.device_type, args.data_type, args.data_format, &args.name, &args.dims, data) };
    match made {
        Ok(blob) => Some(Box::new(tessel_blob_t { blob })),
        Err(error) => {
            tracing::error!(%error, code = ?error.code(), "blob make failed");
            None
        }
    }
}

/// Element count of a blob, 0 for null.
#[unsafe(no_mangle)]
pub extern "C" fn tessel_blob_size_get(blob: Option<&tessel_blob_t>) -> usize {
    match blob {
        Some(blob) => blob.blob.size(),
        None => {
            tracing::warn!("size requested for null blob");
            0
        }
    }
}

/// Raw data pointer of a blob, null for null.
#[unsafe(no_mangle)]
pub extern "C" fn tessel_blob_data_get(blob: Option<&mut tessel_blob_t>) -> *mut c_void {
    blob.map_or(std::ptr::null_mut(), |blob| blob.blob.as_mut_ptr().cast())
}

/// Copy `src` into `dst` through the global registry.
///
/// # Safety
///
/// Each pointer must be null or point to a live blob from this library.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tessel_blob_copy(src: *const tessel_blob_t, dst: *mut tessel_blob_t) -> ErrorCode {
    if src.is_null() || dst.is_null() {
        let error = NullParamSnafu { what: if src.is_null() { "src" } else { "dst" } }.build();
        tracing::error!(%error, "blob copy rejected");
        return error.code();
    }
    if std::ptr::eq(src, dst) {
        tracing::error!("blob copy onto itself");
        return ErrorCode::InvalidParam;
    }
    // SAFETY: non-null, distinct, and live per the caller's contract.
    let (src, dst) = unsafe { (&*src, &mut *dst) };
    match blob_copy(&src.blob, &mut dst.blob) {
        Ok(()) => ErrorCode::Success,
        Err(error) => {
            tracing::error!(%error, "blob copy failed");
            error.code()
        }
    }
}

/// Free a blob and its buffer. Null is an error, not a no-op.
#[unsafe(no_mangle)]
pub extern "C" fn tessel_blob_free(blob: Option<Box<tessel_blob_t>>) -> ErrorCode {
    let Some(blob) = blob else {
        let error = NullParamSnafu { what: "blob" }.build();
        tracing::error!(%error, "blob free rejected");
        return error.code();
    };
    let tessel_blob_t { blob } = *blob;
    match blob.free() {
        Ok(()) => ErrorCode::Success,
        Err(error) => {
            tracing::error!(%error, "blob free failed");
            error.code()
        }
    }
}
