//! Läuft gegen echte Hardware. Die Geräte-Tests sind `#[ignore]`d und laufen
//! mit `cargo test -- --ignored` auf einem Rechner mit OpenCL-GPU.

use cl_addarrays::platform::enumerate_platforms;
use cl_addarrays::{
    execute, AccessMode, AddArraysProgram, ClError, ClSession, DeviceBuffer, InputPattern,
    RunConfig,
};

const KERNEL: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/AddArraysKernel.cl");
const KERNEL_SRC: &str = include_str!("../AddArraysKernel.cl");

fn session() -> ClSession {
    ClSession::open_default().expect("no OpenCL GPU available")
}

fn config(pattern: InputPattern) -> RunConfig {
    RunConfig {
        kernel_path: KERNEL.into(),
        pattern,
        ..RunConfig::default()
    }
}

#[test]
#[ignore = "requires an OpenCL GPU"]
fn ascending_inputs_sum_to_1024() {
    let session = session();
    let report = execute(&session, &config(InputPattern::Ascending)).unwrap();
    assert_eq!(report.len(), 1024);
    assert!(report.output.iter().all(|&c| c == 1024));
    report.verify().unwrap();
}

#[test]
#[ignore = "requires an OpenCL GPU"]
fn mirrored_inputs_sum_to_1023() {
    let session = session();
    let cfg = RunConfig { page_aligned: true, ..config(InputPattern::Mirrored) };
    let report = execute(&session, &cfg).unwrap();
    assert!(report.input_a.is_page_aligned());
    assert!(report.output.iter().all(|&c| c == 1023));
}

#[test]
#[ignore = "requires an OpenCL GPU"]
fn write_then_read_returns_original_data() {
    let session = session();
    let data: Vec<i32> = (0..256).map(|i| i * 7 - 100).collect();

    let buf = DeviceBuffer::<i32>::new(session.context(), data.len(), AccessMode::ReadWrite).unwrap();
    let buf = buf.write_blocking(session.queue(), &data).unwrap();
    let mut back = vec![0; data.len()];
    buf.read_blocking(session.queue(), &mut back).unwrap();
    assert_eq!(back, data);
}

#[test]
#[ignore = "requires an OpenCL GPU"]
fn transfers_beyond_capacity_are_rejected() {
    let session = session();
    let buf = DeviceBuffer::<i32>::new(session.context(), 4, AccessMode::ReadOnly).unwrap();
    let err = buf.write_blocking(session.queue(), &[1, 2, 3, 4, 5]).unwrap_err();
    assert!(matches!(err, ClError::Capacity { requested: 5, capacity: 4 }));
}

#[test]
fn platform_enumeration_is_stable() {
    match (enumerate_platforms(), enumerate_platforms()) {
        (Ok(first), Ok(second)) => {
            let names: Vec<_> = first.iter().map(|p| &p.name).collect();
            assert_eq!(names, second.iter().map(|p| &p.name).collect::<Vec<_>>());
        }
        (first, second) => {
            assert!(matches!(first, Err(ClError::NoPlatforms)), "{first:?}");
            assert!(matches!(second, Err(ClError::NoPlatforms)), "{second:?}");
        }
    }
}

#[test]
fn missing_driver_is_reported_as_no_platforms() {
    if let Err(e) = enumerate_platforms() {
        assert!(matches!(e, ClError::NoPlatforms), "unexpected error: {e}");
    }
}

#[test]
#[ignore = "requires an OpenCL GPU"]
fn broken_kernel_source_reports_build_log() {
    let session = session();
    let err = AddArraysProgram::build(session.context(), "__kernel void addArrays(", "addArrays").unwrap_err();
    assert!(matches!(err, ClError::Build { .. }));
}

#[test]
#[ignore = "requires an OpenCL GPU"]
fn unknown_entry_point_is_a_driver_error() {
    let session = session();
    let err = AddArraysProgram::build(session.context(), KERNEL_SRC, "subArrays").unwrap_err();
    assert!(matches!(err, ClError::Step { step: "create kernel", .. }));
}

#[test]
#[ignore = "requires an OpenCL GPU"]
fn missing_kernel_file_fails_the_run() {
    let session = session();
    let cfg = RunConfig { kernel_path: "nope/AddArraysKernel.cl".into(), ..RunConfig::default() };
    assert!(matches!(execute(&session, &cfg), Err(ClError::KernelSource { .. })));
}

#[test]
#[ignore = "requires an OpenCL GPU"]
fn indivisible_dispatch_is_rejected() {
    let session = session();
    let ctx = session.context();
    let q = session.queue();
    let a = DeviceBuffer::<i32>::new(ctx, 100, AccessMode::ReadOnly).unwrap();
    let b = DeviceBuffer::<i32>::new(ctx, 100, AccessMode::ReadOnly).unwrap();
    let c = DeviceBuffer::<i32>::new(ctx, 100, AccessMode::WriteOnly).unwrap();
    let a = a.write_blocking(q, &[0; 100]).unwrap();
    let b = b.write_blocking(q, &[0; 100]).unwrap();

    let program = AddArraysProgram::build(ctx, KERNEL_SRC, "addArrays").unwrap();
    let bound = program.bind(&a, &b, &c).unwrap();
    assert_eq!(bound.global_size(), 100);
    assert!(matches!(
        bound.dispatch(q, 64),
        Err(ClError::WorkSize { global: 100, local: 64 })
    ));
}

#[test]
#[ignore = "requires an OpenCL GPU"]
fn undersized_inputs_cannot_be_bound() {
    let session = session();
    let ctx = session.context();
    let q = session.queue();
    let a = DeviceBuffer::<i32>::new(ctx, 32, AccessMode::ReadOnly).unwrap();
    let b = DeviceBuffer::<i32>::new(ctx, 64, AccessMode::ReadOnly).unwrap();
    let c = DeviceBuffer::<i32>::new(ctx, 64, AccessMode::WriteOnly).unwrap();
    let a = a.write_blocking(q, &[0; 32]).unwrap();
    let b = b.write_blocking(q, &[0; 64]).unwrap();

    let program = AddArraysProgram::build(ctx, KERNEL_SRC, "addArrays").unwrap();
    assert!(matches!(
        program.bind(&a, &b, &c),
        Err(ClError::Capacity { requested: 64, capacity: 32 })
    ));
}
