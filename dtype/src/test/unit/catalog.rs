use test_case::test_case;

use crate::{DataFormat, DataType, DeviceType, Dims, MemoryType};

#[test_case(DataType::Float32, 4; "float32")]
#[test_case(DataType::Float16, 2; "float16")]
#[test_case(DataType::Int8, 1; "int8")]
#[test_case(DataType::UInt8, 1; "uint8")]
#[test_case(DataType::Int32, 4; "int32")]
#[test_case(DataType::Int64, 8; "int64")]
#[test_case(DataType::UInt32, 4; "uint32")]
#[test_case(DataType::Auto, 0; "auto")]
#[test_case(DataType::None, 0; "none")]
fn test_data_type_bytes(data_type: DataType, expected: usize) {
    assert_eq!(data_type.bytes(), expected);
    assert_eq!(data_type.is_concrete(), expected != 0);
}

#[test_case(DeviceType::Cpu, MemoryType::Host; "cpu")]
#[test_case(DeviceType::X86, MemoryType::Host; "x86")]
#[test_case(DeviceType::Arm, MemoryType::Host; "arm")]
#[test_case(DeviceType::Cuda, MemoryType::Cuda; "cuda")]
#[test_case(DeviceType::OpenCl, MemoryType::OpenCl; "opencl")]
#[test_case(DeviceType::IntelGpu, MemoryType::None; "intel_gpu")]
#[test_case(DeviceType::IntelNpu, MemoryType::None; "intel_npu")]
#[test_case(DeviceType::None, MemoryType::None; "none")]
fn test_device_memory_type(device: DeviceType, expected: MemoryType) {
    assert_eq!(device.memory_type(), expected);
    assert_eq!(device.is_host(), expected == MemoryType::Host);
}

#[test]
fn test_memory_type_reverse_mapping() {
    assert_eq!(MemoryType::Host.device_type(), DeviceType::Cpu);
    assert_eq!(MemoryType::Cuda.device_type(), DeviceType::Cuda);
    assert_eq!(MemoryType::OpenCl.device_type(), DeviceType::OpenCl);
    assert_eq!(MemoryType::None.device_type(), DeviceType::None);
}

#[test_case("cpu", DeviceType::Cpu; "cpu_lower")]
#[test_case("CPU", DeviceType::Cpu; "cpu_upper")]
#[test_case("x86_64", DeviceType::X86; "x86_64")]
#[test_case("aarch64", DeviceType::Arm; "aarch64")]
#[test_case("gpu", DeviceType::Cuda; "gpu_alias")]
#[test_case("OpenCL", DeviceType::OpenCl; "opencl_mixed")]
#[test_case(" intel_gpu ", DeviceType::IntelGpu; "intel_gpu_padded")]
fn test_device_parse(name: &str, expected: DeviceType) {
    assert_eq!(name.parse::<DeviceType>().unwrap(), expected);
}

#[test]
fn test_device_parse_unknown() {
    assert!(matches!("tpu".parse::<DeviceType>(), Err(crate::Error::UnknownDevice { .. })));
}

#[test]
fn test_repr_values() {
    assert_eq!(DeviceType::from_repr(0x1020), Some(DeviceType::Cuda));
    assert_eq!(DeviceType::from_repr(0x9999), None);
    assert_eq!(DataType::from_repr(-2), Some(DataType::None));
    assert_eq!(DataType::from_repr(0), Some(DataType::Float32));
    assert_eq!(DataFormat::from_repr(1), Some(DataFormat::Nchw));
}

#[test_case(&[1, 3, 224, 224], DataFormat::Nchw; "nchw")]
#[test_case(&[1, 224, 224, 3], DataFormat::Nhwc; "nhwc")]
#[test_case(&[1, 224, 224, 4], DataFormat::Nhwc4; "nhwc4")]
#[test_case(&[1, 4, 8, 4], DataFormat::Nhwc4; "nhwc4_square")]
#[test_case(&[1, 2, 8, 4], DataFormat::Nchw; "trailing_four_narrow_channels")]
#[test_case(&[8, 1000], DataFormat::Nc; "nc")]
#[test_case(&[1, 3, 16, 112, 112], DataFormat::Ncdhw; "ncdhw")]
#[test_case(&[10], DataFormat::Auto; "rank1")]
#[test_case(&[], DataFormat::Auto; "empty")]
fn test_format_inference(values: &[usize], expected: DataFormat) {
    let dims = Dims::new(values).unwrap();
    assert_eq!(DataFormat::infer(&dims), expected);
}
