// SPDX-License-Identifier: MPL-2.0

//! Integration tests for resource provisioning

use friedcamera::backends::camera::{
    BackendResult, CameraSpec, FormatSource, Framerate, PixelFormat,
};
use friedcamera::errors::{AppError, CameraError, GpuError};
use friedcamera::gpu::{GpuDevice, GpuResource, ResourceSet, provision};
use friedcamera::shaders::FrameParams;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Allocation bookkeeping shared by the mock device and its resources
#[derive(Default)]
struct Ledger {
    next_id: u64,
    live: HashMap<&'static str, i64>,
    released: Vec<u64>,
    sizes: HashMap<&'static str, u64>,
    fail_on: Option<&'static str>,
}

struct MockResource {
    id: u64,
    kind: &'static str,
    ledger: Rc<RefCell<Ledger>>,
}

impl GpuResource for MockResource {
    fn release(&self) {
        let mut ledger = self.ledger.borrow_mut();
        *ledger.live.entry(self.kind).or_default() -= 1;
        ledger.released.push(self.id);
    }
}

#[derive(Default)]
struct MockDevice {
    ledger: Rc<RefCell<Ledger>>,
}

impl MockDevice {
    fn allocate(
        &self,
        kind: &'static str,
        label: &'static str,
        size: u64,
    ) -> Result<MockResource, GpuError> {
        let mut ledger = self.ledger.borrow_mut();
        if ledger.fail_on == Some(kind) {
            return Err(GpuError::AllocationFailed {
                resource: label,
                reason: "out of memory".to_string(),
            });
        }
        ledger.next_id += 1;
        *ledger.live.entry(kind).or_default() += 1;
        ledger.sizes.insert(kind, size);
        Ok(MockResource {
            id: ledger.next_id,
            kind,
            ledger: Rc::clone(&self.ledger),
        })
    }

    fn live(&self, kind: &str) -> i64 {
        self.ledger.borrow().live.get(kind).copied().unwrap_or(0)
    }

    fn size(&self, kind: &str) -> u64 {
        self.ledger.borrow().sizes.get(kind).copied().unwrap_or(0)
    }
}

impl GpuDevice for MockDevice {
    type Buffer = MockResource;
    type Texture = MockResource;

    fn create_upload_buffer(
        &self,
        label: &'static str,
        size: u64,
    ) -> Result<MockResource, GpuError> {
        self.allocate("upload", label, size)
    }

    fn create_download_buffer(
        &self,
        label: &'static str,
        size: u64,
    ) -> Result<MockResource, GpuError> {
        self.allocate("download", label, size)
    }

    fn create_storage_buffer(
        &self,
        label: &'static str,
        size: u64,
    ) -> Result<MockResource, GpuError> {
        self.allocate("storage", label, size)
    }

    fn create_output_texture(
        &self,
        label: &'static str,
        width: u32,
        height: u32,
    ) -> Result<MockResource, GpuError> {
        self.allocate("texture", label, width as u64 * height as u64 * 4)
    }
}

const KINDS: [&str; 4] = ["upload", "download", "storage", "texture"];

fn spec(width: u32, height: u32, format: &str) -> CameraSpec {
    CameraSpec {
        format_name: format.to_string(),
        pixel_format: PixelFormat::from_gst_format(format),
        colorimetry: "bt601".to_string(),
        width,
        height,
        framerate: Framerate::new(30, 1),
    }
}

struct BrokenCamera;

impl FormatSource for BrokenCamera {
    fn format(&self) -> BackendResult<CameraSpec> {
        Err(CameraError::FormatUnavailable("caps not negotiated".to_string()))
    }
}

#[test]
fn test_provision_hd_sizes() {
    let device = MockDevice::default();
    let mut slot: Option<ResourceSet<MockDevice>> = None;
    let mut params = FrameParams::default();

    let outcome = provision(&spec(1280, 720, "NV12"), &device, &mut slot, &mut params)
        .expect("provisioning succeeds");

    assert_eq!(outcome.spec, spec(1280, 720, "NV12"));
    assert_eq!(device.size("upload"), 1_382_400);
    assert_eq!(device.size("storage"), 1_382_400);
    assert_eq!(device.size("download"), 3_686_400);
    assert_eq!(params.frame_width, 1280);
    assert_eq!(params.frame_height, 720);
    assert_eq!(params.uv_byte_offset, 921_600);
    assert_eq!(slot.as_ref().map(|set| set.sizes()), Some(outcome.sizes));
}

#[test]
fn test_reprovision_twice_leaves_one_of_each() {
    let device = MockDevice::default();
    let mut slot = None;
    let mut params = FrameParams::default();

    provision(&spec(640, 480, "NV12"), &device, &mut slot, &mut params).expect("first");
    provision(&spec(1280, 720, "NV12"), &device, &mut slot, &mut params).expect("second");
    provision(&spec(1920, 1080, "NV12"), &device, &mut slot, &mut params).expect("third");

    for kind in KINDS {
        assert_eq!(device.live(kind), 1, "{kind} should have one live resource");
    }

    // Two replaced sets, each released exactly once
    let ledger = device.ledger.borrow();
    assert_eq!(ledger.released.len(), 8);
    let unique: HashSet<u64> = ledger.released.iter().copied().collect();
    assert_eq!(unique.len(), 8);
    assert_eq!(params.frame_width, 1920);
}

#[test]
fn test_dropping_the_slot_releases_everything() {
    let device = MockDevice::default();
    let mut slot = None;
    let mut params = FrameParams::default();

    provision(&spec(320, 240, "NV12"), &device, &mut slot, &mut params).expect("provisioned");
    drop(slot);

    for kind in KINDS {
        assert_eq!(device.live(kind), 0);
    }
}

#[test]
fn test_allocation_failure_is_reported_and_cleaned_up() {
    let device = MockDevice::default();
    device.ledger.borrow_mut().fail_on = Some("texture");
    let mut slot = None;
    let mut params = FrameParams::default();

    let err = provision(&spec(1280, 720, "NV12"), &device, &mut slot, &mut params)
        .expect_err("texture allocation fails");

    assert!(matches!(
        err,
        AppError::Gpu(GpuError::AllocationFailed {
            resource: "Output RGB (fried) Texture",
            ..
        })
    ));
    assert!(slot.is_none());
    for kind in KINDS {
        assert_eq!(device.live(kind), 0, "{kind} leaked");
    }
}

#[test]
fn test_format_error_keeps_existing_resources() {
    let device = MockDevice::default();
    let mut slot = None;
    let mut params = FrameParams::default();
    provision(&spec(640, 480, "NV12"), &device, &mut slot, &mut params).expect("provisioned");

    let err = provision(&BrokenCamera, &device, &mut slot, &mut params)
        .expect_err("format unavailable");

    assert!(matches!(
        err,
        AppError::Camera(CameraError::FormatUnavailable(_))
    ));
    assert!(slot.is_some());
    assert_eq!(params.frame_width, 640);
    for kind in KINDS {
        assert_eq!(device.live(kind), 1);
    }
}

#[test]
fn test_non_nv12_format_still_provisions() {
    let device = MockDevice::default();
    let mut slot = None;
    let mut params = FrameParams::default();

    let outcome = provision(&spec(640, 480, "YUY2"), &device, &mut slot, &mut params)
        .expect("mismatch only warns");

    assert!(!outcome.spec.is_nv12());
    assert_eq!(device.size("upload"), 640 * 480 * 3 / 2);
}
