use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tessel_dtype::DeviceType;

use crate::device::{Device, HostDevice};
use crate::error::{DeviceNotFoundSnafu, Result};

/// Resolves a [`DeviceType`] to the device object that allocates and copies for it.
///
/// The copy engine and blob constructors take this as a parameter so tests can
/// substitute simulated devices for real accelerators.
pub trait DeviceLookup {
    fn get(&self, device_type: DeviceType) -> Option<Arc<dyn Device>>;

    /// Like [`DeviceLookup::get`], but an unregistered device is an error.
    fn require(&self, device_type: DeviceType) -> Result<Arc<dyn Device>> {
        self.get(device_type).ok_or_else(|| DeviceNotFoundSnafu { device: device_type }.build())
    }
}

/// Map from device type to device object.
///
/// Devices are registered during start-up; afterwards the registry is only
/// read, and lookups from any thread share the read lock.
pub struct DeviceRegistry {
    devices: RwLock<HashMap<DeviceType, Arc<dyn Device>>>,
}

impl DeviceRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self { devices: RwLock::new(HashMap::new()) }
    }

    /// A registry with [`HostDevice`] registered for CPU, X86 and ARM.
    pub fn with_host_devices() -> Self {
        let registry = Self::new();
        for device_type in [DeviceType::Cpu, DeviceType::X86, DeviceType::Arm] {
            if let Some(device) = HostDevice::new(device_type) {
                registry.register(Arc::new(device));
            }
        }
        registry
    }

    /// Register `device` under its own device type, replacing any previous entry.
    pub fn register(&self, device: Arc<dyn Device>) -> Option<Arc<dyn Device>> {
        let device_type = device.device_type();
        tracing::debug!(device = %device_type, name = device.name(), "registering device");
        self.devices.write().insert(device_type, device)
    }

    pub fn contains(&self, device_type: DeviceType) -> bool {
        self.devices.read().contains_key(&device_type)
    }

    /// Registered device types, sorted.
    pub fn device_types(&self) -> Vec<DeviceType> {
        let mut types: Vec<_> = self.devices.read().keys().copied().collect();
        types.sort();
        types
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::with_host_devices()
    }
}

impl DeviceLookup for DeviceRegistry {
    fn get(&self, device_type: DeviceType) -> Option<Arc<dyn Device>> {
        self.devices.read().get(&device_type).map(Arc::clone)
    }
}

impl std::fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistry").field("devices", &self.device_types()).finish()
    }
}

/// Global device registry instance.
static REGISTRY: Lazy<DeviceRegistry> = Lazy::new(DeviceRegistry::with_host_devices);

/// Get the global device registry.
pub fn registry() -> &'static DeviceRegistry {
    &REGISTRY
}

/// Convenience function to look a device up in the global registry.
pub fn get_device(device_type: DeviceType) -> Result<Arc<dyn Device>> {
    registry().require(device_type)
}
