//! Cross-device blob copy.
//!
//! A copy is routed by the device pair of the two blobs:
//!
//! | src \ dst   | same device | host        | accelerator      |
//! |-------------|-------------|-------------|------------------|
//! | host        | `copy`      | `copy` (src)| `copy_to_device` (dst) |
//! | accelerator | `copy`      | `copy_from_device` (src) | staged through host |
//!
//! Staging allocates one temporary host blob, copies the source out to it,
//! copies it into the destination, and frees it on every exit path.

use snafu::ensure;
use tessel_dtype::{DeviceType, MemoryType};

use crate::blob::Blob;
use crate::config::CopyOptions;
use crate::device::Device;
use crate::error::{
    AliasedStorageSnafu, DataFormatMismatchSnafu, DataTypeMismatchSnafu, MemoryTypeMismatchSnafu, Result,
    SizeMismatchSnafu, StagingDisabledSnafu,
};
use crate::registry::{DeviceLookup, registry};

/// Name given to the temporary host blob of a staged copy.
const STAGING_BLOB_NAME: &str = "__tessel_staging";

/// Which copy primitive a device pair resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CopyRoute {
    /// Both blobs on the same device type: that device's `copy`.
    SameDevice,
    /// Different host architecture tags: the source device's `copy`.
    HostToHost,
    /// Host source, accelerator destination: the destination's `copy_to_device`.
    HostToDevice,
    /// Accelerator source, host destination: the source's `copy_from_device`.
    DeviceToHost,
    /// Two accelerators: out to a host blob, then in to the destination.
    Staged,
}

impl CopyRoute {
    pub fn classify(src: DeviceType, dst: DeviceType) -> Self {
        if src == dst {
            return Self::SameDevice;
        }
        match (src.is_host(), dst.is_host()) {
            (true, true) => Self::HostToHost,
            (true, false) => Self::HostToDevice,
            (false, true) => Self::DeviceToHost,
            (false, false) => Self::Staged,
        }
    }
}

/// Copy `src` into `dst` using the global registry and default options.
pub fn blob_copy(src: &Blob, dst: &mut Blob) -> Result<()> {
    blob_copy_with(registry(), src, dst, &CopyOptions::default()).map(|_| ())
}

/// Copy `src` into `dst`, resolving devices through `lookup`.
///
/// Both blobs must agree on data type, data format and element count, and
/// must not share storage; no conversion or partial copy ever happens.
/// Returns the route taken.
#[tracing::instrument(
    skip_all,
    fields(src = src.name(), dst = dst.name(), src.device = %src.device_type(), dst.device = %dst.device_type())
)]
pub fn blob_copy_with(
    lookup: &dyn DeviceLookup,
    src: &Blob,
    dst: &mut Blob,
    options: &CopyOptions,
) -> Result<CopyRoute> {
    check_compatible(src, dst)?;

    let src_device = lookup.require(src.device_type())?;
    let dst_device = lookup.require(dst.device_type())?;

    let route = CopyRoute::classify(src.device_type(), dst.device_type());
    tracing::debug!(?route, elements = src.size(), "copying blob");

    match route {
        CopyRoute::SameDevice | CopyRoute::HostToHost => src_device.copy(src.buffer(), dst.buffer_mut(), None)?,
        CopyRoute::HostToDevice => dst_device.copy_to_device(src.buffer(), dst.buffer_mut(), None)?,
        CopyRoute::DeviceToHost => src_device.copy_from_device(src.buffer(), dst.buffer_mut(), None)?,
        CopyRoute::Staged => staged_copy(lookup, src_device.as_ref(), dst_device.as_ref(), src, dst, options)?,
    }

    Ok(route)
}

fn check_compatible(src: &Blob, dst: &Blob) -> Result<()> {
    ensure!(src.data_type() == dst.data_type(), DataTypeMismatchSnafu { src: src.data_type(), dst: dst.data_type() });
    ensure!(
        src.data_format() == dst.data_format(),
        DataFormatMismatchSnafu { src: src.data_format(), dst: dst.data_format() }
    );
    ensure!(!src.buffer().shares_storage(dst.buffer()), AliasedStorageSnafu);
    ensure!(src.size() == dst.size(), SizeMismatchSnafu { expected: dst.size(), actual: src.size() });
    Ok(())
}

fn staged_copy(
    lookup: &dyn DeviceLookup,
    src_device: &dyn Device,
    dst_device: &dyn Device,
    src: &Blob,
    dst: &mut Blob,
    options: &CopyOptions,
) -> Result<()> {
    ensure!(options.allow_staging, StagingDisabledSnafu { src: src.device_type(), dst: dst.device_type() });
    let staging_memory = options.staging_device.memory_type();
    ensure!(
        staging_memory == MemoryType::Host,
        MemoryTypeMismatchSnafu { expected: MemoryType::Host, actual: staging_memory }
    );

    // Dropped on every early return below, which frees the host memory.
    let mut staging = Blob::alloc_in(
        lookup,
        options.staging_device,
        src.data_type(),
        src.data_format(),
        STAGING_BLOB_NAME,
        src.dims(),
    )?;

    src_device.copy_from_device(src.buffer(), staging.buffer_mut(), None)?;
    dst_device.copy_to_device(staging.buffer(), dst.buffer_mut(), None)?;

    staging.free()
}
