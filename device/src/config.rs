//! Copy engine configuration.
//!
//! Provides typed configuration with a bon builder and environment variable
//! fallbacks.

use bon::Builder;
use tessel_dtype::DeviceType;

/// Options for [`blob_copy_with`](crate::copy::blob_copy_with).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct CopyOptions {
    /// Bridge accelerator pairs without a direct path through host memory.
    #[builder(default = true)]
    pub allow_staging: bool,

    /// Host device that allocates the staging blob.
    #[builder(default = DeviceType::Cpu)]
    pub staging_device: DeviceType,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self { allow_staging: true, staging_device: DeviceType::Cpu }
    }
}

impl CopyOptions {
    /// Read options from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `TESSEL_NO_STAGING=1` - Fail accelerator-to-accelerator copies instead of staging
    /// * `TESSEL_STAGING_DEVICE=x86` - Host device used for staging (CPU, X86 or ARM)
    pub fn from_env() -> Self {
        let no_staging = std::env::var("TESSEL_NO_STAGING").ok();
        let staging_device = std::env::var("TESSEL_STAGING_DEVICE").ok();
        Self::from_vars(no_staging.as_deref(), staging_device.as_deref())
    }

    pub(crate) fn from_vars(no_staging: Option<&str>, staging_device: Option<&str>) -> Self {
        let mut options = Self::default();

        if let Some(value) = no_staging
            && !matches!(value.trim(), "" | "0")
        {
            options.allow_staging = false;
        }

        if let Some(name) = staging_device {
            match name.parse::<DeviceType>() {
                Ok(device) if device.is_host() => options.staging_device = device,
                Ok(device) => {
                    tracing::warn!(%device, "TESSEL_STAGING_DEVICE is not a host device, keeping default");
                }
                Err(error) => {
                    tracing::warn!(%error, "ignoring TESSEL_STAGING_DEVICE");
                }
            }
        }

        options
    }
}
