use std::ptr::NonNull;

use test_case::test_case;
use tessel_dtype::{DataFormat, DataType, DeviceType, Dims, MemoryType};
use tracing_test::traced_test;

use crate::test::mock::{Fixture, fill_f32, read_f32, sequence};
use crate::{Blob, BlobName, DeviceRegistry, Error, ErrorCode, MAX_BLOB_NAME, find_blob};

fn dims(values: &[usize]) -> Dims {
    Dims::new(values).unwrap()
}

#[test]
fn test_alloc_then_free() {
    let blob = Blob::alloc(DeviceType::Cpu, DataType::Float32, DataFormat::Nchw, "input", &dims(&[1, 3, 224, 224]))
        .unwrap();

    assert_eq!(blob.size(), 150_528);
    assert_eq!(blob.buffer().byte_size(), 602_112);
    assert_eq!(blob.name(), "input");
    assert_eq!(blob.buffer().memory_type(), MemoryType::Host);
    assert!(blob.host_bytes().unwrap().iter().all(|&b| b == 0));
    blob.free().unwrap();
}

#[test_case(DeviceType::Cpu, MemoryType::Host)]
#[test_case(DeviceType::X86, MemoryType::Host)]
#[test_case(DeviceType::Arm, MemoryType::Host)]
#[test_case(DeviceType::Cuda, MemoryType::Cuda)]
#[test_case(DeviceType::OpenCl, MemoryType::OpenCl)]
fn test_alloc_memory_type(device_type: DeviceType, memory_type: MemoryType) {
    let registry = DeviceRegistry::with_host_devices();
    let fixture = Fixture::new();
    registry.register(fixture.cuda.clone());
    registry.register(fixture.opencl.clone());

    let blob =
        Blob::alloc_in(&registry, device_type, DataType::Int8, DataFormat::Nc, "x", &dims(&[2, 8])).unwrap();
    assert_eq!(blob.buffer().memory_type(), memory_type);
    assert_eq!(blob.device_type(), device_type);
}

#[test_case(DeviceType::IntelGpu ; "intel gpu")]
#[test_case(DeviceType::IntelNpu ; "intel npu")]
#[test_case(DeviceType::None ; "none")]
fn test_alloc_without_memory_space(device_type: DeviceType) {
    let err = Blob::alloc(device_type, DataType::Float32, DataFormat::Nchw, "x", &dims(&[4])).unwrap_err();
    assert!(matches!(err, Error::UnsupportedMemory { .. }));
    assert_eq!(err.code(), ErrorCode::NullParam);
}

#[test]
fn test_alloc_unregistered_device() {
    let registry = DeviceRegistry::with_host_devices();
    let err = Blob::alloc_in(&registry, DeviceType::Cuda, DataType::Float32, DataFormat::Nchw, "x", &dims(&[4]))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::DeviceInvalid);
}

#[test]
fn test_zero_element_blob() {
    let fixture = Fixture::new();
    let empty =
        Blob::alloc_in(&fixture.registry, DeviceType::Cpu, DataType::Float32, DataFormat::Auto, "e", &Dims::empty())
            .unwrap();
    assert_eq!(empty.size(), 0);
    assert!(empty.dims().is_empty());

    let zero_axis = fixture.alloc(DeviceType::Cuda, "z", &[4, 0, 2]);
    assert_eq!(zero_axis.size(), 0);
    assert_eq!(zero_axis.buffer().byte_size(), 0);

    drop(empty);
    drop(zero_axis);
    assert_eq!(fixture.cpu.live(), 0);
    assert_eq!(fixture.cuda.live(), 0);
}

#[traced_test]
#[test]
fn test_long_name_truncated() {
    let long = "n".repeat(MAX_BLOB_NAME + 16);
    let blob = Blob::alloc(DeviceType::Cpu, DataType::UInt8, DataFormat::Nc, &long, &dims(&[1, 1])).unwrap();

    assert_eq!(blob.name().len(), MAX_BLOB_NAME);
    assert_eq!(blob.name(), &long[..MAX_BLOB_NAME]);
    assert!(logs_contain("blob name truncated"));
}

#[test]
fn test_name_truncated_at_char_boundary() {
    let name = format!("{}é", "a".repeat(MAX_BLOB_NAME - 1));
    let (stored, truncated) = BlobName::truncated(&name);

    assert!(truncated);
    assert_eq!(stored.as_str(), "a".repeat(MAX_BLOB_NAME - 1));

    let (short, truncated) = BlobName::truncated("conv1");
    assert!(!truncated);
    assert_eq!(short.to_string(), "conv1");
}

#[test]
fn test_make_aliases_memory() {
    let mut storage = sequence(6);
    let ptr = NonNull::new(storage.as_mut_ptr().cast::<u8>()).unwrap();
    let blob = unsafe { Blob::make(DeviceType::Cpu, DataType::Float32, DataFormat::Nc, "ext", &dims(&[2, 3]), ptr) }
        .unwrap();

    assert!(blob.buffer().is_external());
    assert_eq!(read_f32(&blob), sequence(6));
    blob.free().unwrap();
    assert_eq!(storage, sequence(6));
}

#[test]
fn test_make_rejects_sentinel_type() {
    let mut storage = [0u8; 4];
    let ptr = NonNull::new(storage.as_mut_ptr()).unwrap();
    let err = unsafe { Blob::make(DeviceType::Cpu, DataType::Auto, DataFormat::Nc, "x", &dims(&[1, 1]), ptr) }
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidParamValue);
}

#[test]
fn test_reshape() {
    let fixture = Fixture::new();
    let mut blob = fixture.alloc(DeviceType::Cpu, "r", &[1, 3, 4, 4]);
    fill_f32(&mut blob, &sequence(48));

    blob.reshape_from(&[3, 16]).unwrap();
    blob.set_data_format(DataFormat::Nc);
    assert_eq!(blob.dims().as_slice(), &[3, 16]);
    assert_eq!(blob.data_format(), DataFormat::Nc);
    assert_eq!(read_f32(&blob), sequence(48));

    let err = blob.reshape_from(&[5, 10]).unwrap_err();
    assert!(matches!(err, Error::SizeMismatch { expected: 48, actual: 50 }));
    assert_eq!(blob.dims().as_slice(), &[3, 16]);

    let err = blob.reshape_from(&[1; 7]).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidParamValue);
    assert_eq!(blob.size(), blob.dims().element_count());
}

#[test]
fn test_data_pointer_matches_buffer() {
    let fixture = Fixture::new();
    let mut blob = fixture.alloc(DeviceType::Cuda, "p", &[2, 2]);

    assert_eq!(blob.as_ptr(), blob.buffer().as_ptr());
    let ptr = blob.as_mut_ptr();
    assert_eq!(ptr.cast_const(), blob.buffer().as_ptr());
    assert_eq!(blob.size(), blob.dims().element_count());
}

#[test]
fn test_find_blob() {
    let fixture = Fixture::new();
    let blobs = vec![
        fixture.alloc(DeviceType::Cpu, "data", &[1]),
        fixture.alloc(DeviceType::Cpu, "prob", &[2]),
        fixture.alloc(DeviceType::Cuda, "prob", &[3]),
    ];

    let (index, blob) = find_blob(&blobs, "prob").unwrap();
    assert_eq!(index, 1);
    assert_eq!(blob.size(), 2);
    assert!(find_blob(&blobs, "missing").is_none());
}
