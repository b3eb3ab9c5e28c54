//! Execution domains and the memory spaces they collapse to.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, UnknownDeviceSnafu};

/// Physical execution domain of a tensor.
///
/// X86 and ARM are architecture tags: for memory purposes they are the same
/// host space as [`DeviceType::Cpu`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::EnumCount, strum::EnumIter, strum::VariantArray, strum::FromRepr)]
#[repr(i32)]
pub enum DeviceType {
    #[default]
    None = 0x0000,
    Cpu = 0x0010,
    X86 = 0x0020,
    Arm = 0x0030,
    OpenCl = 0x1010,
    Cuda = 0x1020,
    IntelNpu = 0x1030,
    IntelGpu = 0x1040,
}

impl DeviceType {
    /// Memory space used for copy routing.
    ///
    /// Integrated Intel devices have no memory space of their own and map to
    /// [`MemoryType::None`].
    pub const fn memory_type(&self) -> MemoryType {
        match self {
            Self::Cpu | Self::X86 | Self::Arm => MemoryType::Host,
            Self::Cuda => MemoryType::Cuda,
            Self::OpenCl => MemoryType::OpenCl,
            Self::IntelNpu | Self::IntelGpu | Self::None => MemoryType::None,
        }
    }

    pub const fn is_host(&self) -> bool {
        matches!(self.memory_type(), MemoryType::Host)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Cpu => "CPU",
            Self::X86 => "X86",
            Self::Arm => "ARM",
            Self::OpenCl => "OPENCL",
            Self::Cuda => "CUDA",
            Self::IntelNpu => "INTEL_NPU",
            Self::IntelGpu => "INTEL_GPU",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses device names case-insensitively.
///
/// Examples:
/// - "cpu" -> DeviceType::Cpu
/// - "aarch64" -> DeviceType::Arm
/// - "gpu" -> DeviceType::Cuda
impl FromStr for DeviceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        match upper.as_str() {
            "CPU" | "HOST" => Ok(Self::Cpu),
            "X86" | "X86_64" => Ok(Self::X86),
            "ARM" | "AARCH64" => Ok(Self::Arm),
            "OPENCL" | "OCL" => Ok(Self::OpenCl),
            "CUDA" | "GPU" => Ok(Self::Cuda),
            "INTEL_NPU" | "NPU" => Ok(Self::IntelNpu),
            "INTEL_GPU" | "IGPU" => Ok(Self::IntelGpu),
            "NONE" => Ok(Self::None),
            _ => UnknownDeviceSnafu { device: s }.fail(),
        }
    }
}

/// Memory space classification used when routing copies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::EnumCount, strum::EnumIter, strum::VariantArray, strum::FromRepr)]
#[repr(i32)]
pub enum MemoryType {
    /// No memory space is known for the device.
    #[default]
    None = -1,
    Host = 0,
    Cuda = 1,
    OpenCl = 2,
}

impl MemoryType {
    /// Canonical device owning this memory space.
    pub const fn device_type(&self) -> DeviceType {
        match self {
            Self::None => DeviceType::None,
            Self::Host => DeviceType::Cpu,
            Self::Cuda => DeviceType::Cuda,
            Self::OpenCl => DeviceType::OpenCl,
        }
    }

    pub const fn is_supported(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Host => "HOST",
            Self::Cuda => "CUDA",
            Self::OpenCl => "OPENCL",
        }
    }
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
