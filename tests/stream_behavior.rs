//! Stream behavior against the software device, which lets each test choose when GPU work
//! finishes.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::{Duration, Instant};
use texture_streams::bindings::bind_style::TextureUnit;
use texture_streams::bindings::coordinates::Extent;
use texture_streams::imp::software::{FenceMode, SoftwareDevice};
use texture_streams::pixel_formats::{TexelFormat, TexelLayout, TexelType, Unorm4};
use texture_streams::{Error, StreamConfig, TextureStream, Upload};

fn rgba_stream(device: &Arc<SoftwareDevice>, slots: usize) -> TextureStream<SoftwareDevice> {
    let config = StreamConfig::new(4, 4, TexelLayout::rgba8())
        .with_slots(slots)
        .with_debug_name("stream_behavior");
    TextureStream::new(device, config).expect("stream")
}

/// Texel at (x, y) of a tightly packed 4-wide RGBA8 image.
fn texel(bytes: &[u8], x: usize, y: usize) -> [u8; 4] {
    let offset = (y * 4 + x) * 4;
    bytes[offset..offset + 4].try_into().unwrap()
}

fn solid(color: Unorm4) -> Vec<u8> {
    color.to_bytes().repeat(16)
}

#[test]
fn readiness_follows_first_completed_upload() {
    for slots in 1..=3 {
        for device in [SoftwareDevice::new(), SoftwareDevice::without_fences()] {
            let device = Arc::new(device);
            let mut stream = rgba_stream(&device, slots);
            assert!(!stream.is_ready(), "{slots} slots ready before any upload");
            let upload = stream.upload_region(&[Unorm4::RED; 16], 4, 4).unwrap();
            assert!(!upload.is_dropped());
            assert!(stream.is_ready(), "{slots} slots not ready after upload");
            assert!(stream.is_ready());
        }
    }
}

#[test]
fn readiness_is_sticky() {
    let device = Arc::new(SoftwareDevice::with_fence_mode(FenceMode::Immediate));
    let mut stream = rgba_stream(&device, 2);
    let _ = stream.upload_region(&[Unorm4::RED; 16], 4, 4).unwrap();
    assert!(stream.is_ready());
    device.set_fence_mode(FenceMode::Never);
    let _ = stream.upload_region(&[Unorm4::GREEN; 16], 4, 4).unwrap();
    assert!(stream.is_ready());
}

#[test]
fn region_upload_preserves_outside_texels() {
    let device = Arc::new(SoftwareDevice::new());
    let mut stream = rgba_stream(&device, 1);
    let unit = stream.texture_unit();
    assert_eq!(
        stream.upload_region(&[Unorm4::RED; 16], 4, 4).unwrap(),
        Upload::Submitted { slot: 0 }
    );
    let _ = stream.upload_region(&[Unorm4::GREEN; 4], 2, 2).unwrap();
    stream.bind();
    let bound = device.read_bound(unit).expect("bound");
    for y in 0..4 {
        for x in 0..4 {
            let expected = if x < 2 && y < 2 { Unorm4::GREEN } else { Unorm4::RED };
            assert_eq!(texel(&bound, x, y), expected.to_bytes(), "texel ({x},{y})");
        }
    }
    assert_eq!(stream.last_uploaded_shape(), Extent::new(4, 4));
}

#[test]
fn clearing_upload_zeroes_outside_texels() {
    let device = Arc::new(SoftwareDevice::new());
    let mut stream = rgba_stream(&device, 1);
    let unit = stream.texture_unit();
    let _ = stream.upload_region(&[Unorm4::RED; 16], 4, 4).unwrap();
    let _ = stream
        .upload_region_with_clear(&[Unorm4::GREEN; 6], 3, 2)
        .unwrap();
    stream.bind();
    let bound = device.read_bound(unit).expect("bound");
    for y in 0..4 {
        for x in 0..4 {
            let expected = if x < 3 && y < 2 {
                Unorm4::GREEN.to_bytes()
            } else {
                [0; 4]
            };
            assert_eq!(texel(&bound, x, y), expected, "texel ({x},{y})");
        }
    }
    assert_eq!(stream.last_uploaded_shape(), Extent::new(3, 2));
}

#[test]
fn clearing_upload_of_growing_region_skips_clear() {
    let device = Arc::new(SoftwareDevice::new());
    let mut stream = rgba_stream(&device, 1);
    let _ = stream.upload_region(&[Unorm4::RED; 4], 2, 2).unwrap();
    let _ = stream
        .upload_region_with_clear(&[Unorm4::BLUE; 12], 4, 3)
        .unwrap();
    let contents = stream.slot_texture(0).contents();
    assert_eq!(texel(&contents, 3, 2), Unorm4::BLUE.to_bytes());
    assert_eq!(texel(&contents, 0, 3), [0; 4]);
    assert_eq!(stream.last_uploaded_shape(), Extent::new(4, 3));
}

#[test]
fn red_then_cleared_blue() {
    let device = Arc::new(SoftwareDevice::new());
    let mut stream = rgba_stream(&device, 2);
    let unit = stream.texture_unit();

    let _ = stream.upload_region(&[Unorm4::RED; 16], 4, 4).unwrap();
    {
        let _bound = stream.bound();
        assert_eq!(device.read_bound(unit).unwrap(), solid(Unorm4::RED));
    }

    let _ = stream
        .upload_region_with_clear(&[Unorm4::BLUE; 4], 2, 2)
        .unwrap();
    let bound = stream.bound();
    let contents = device.read_bound(unit).unwrap();
    for y in 0..4 {
        for x in 0..4 {
            let expected = if x < 2 && y < 2 {
                Unorm4::BLUE.to_bytes()
            } else {
                [0; 4]
            };
            assert_eq!(texel(&contents, x, y), expected, "texel ({x},{y})");
        }
    }
    drop(bound);
    assert!(device.read_bound(unit).is_none());
}

#[test]
fn backpressure_drops_instead_of_overwriting() {
    let device = Arc::new(SoftwareDevice::new());
    let mut stream = rgba_stream(&device, 2);
    device.set_fence_mode(FenceMode::Manual);

    assert_eq!(
        stream.upload_region(&[Unorm4::RED; 16], 4, 4).unwrap(),
        Upload::Submitted { slot: 1 }
    );
    assert_eq!(
        stream.upload_region(&[Unorm4::GREEN; 16], 4, 4).unwrap(),
        Upload::Dropped
    );
    assert_eq!(
        stream.upload_region(&[Unorm4::BLUE; 16], 4, 4).unwrap(),
        Upload::Dropped
    );
    assert_eq!(stream.slot_texture(1).contents(), solid(Unorm4::RED));
    assert_eq!((stream.write_index(), stream.read_index()), (1, 0));
    assert!(!stream.is_ready());

    device.complete_submitted_work();
    assert_eq!(
        stream.upload_region(&[Unorm4::GREEN; 16], 4, 4).unwrap(),
        Upload::Submitted { slot: 0 }
    );
    assert_eq!(stream.read_index(), 1);
    assert!(stream.is_ready());
}

#[test]
fn bind_prefers_freshest_completed_slot() {
    let device = Arc::new(SoftwareDevice::new());
    let mut stream = rgba_stream(&device, 3);
    let unit = stream.texture_unit();
    device.set_fence_mode(FenceMode::Manual);

    assert_eq!(
        stream.upload_region(&[Unorm4::RED; 16], 4, 4).unwrap().slot(),
        Some(1)
    );
    device.complete_submitted_work();
    assert_eq!(
        stream.upload_region(&[Unorm4::GREEN; 16], 4, 4).unwrap().slot(),
        Some(2)
    );
    assert_eq!(stream.read_index(), 1);
    assert_eq!(
        stream.upload_region(&[Unorm4::BLUE; 16], 4, 4).unwrap().slot(),
        Some(0)
    );
    assert!(
        stream
            .upload_region(&[Unorm4::TRANSPARENT; 16], 4, 4)
            .unwrap()
            .is_dropped()
    );

    // slots 2 and 0 both finish; 0 was written last
    device.complete_submitted_work();
    stream.bind();
    assert_eq!(stream.read_index(), 0);
    assert_eq!(device.read_bound(unit).unwrap(), solid(Unorm4::BLUE));
}

#[test]
fn bind_never_returns_to_an_older_upload() {
    let device = Arc::new(SoftwareDevice::new());
    let mut stream = rgba_stream(&device, 3);
    let unit = stream.texture_unit();

    assert_eq!(
        stream.upload_region(&[Unorm4::RED; 16], 4, 4).unwrap().slot(),
        Some(1)
    );
    stream.bind();
    assert_eq!(stream.read_index(), 1);

    device.set_fence_mode(FenceMode::Manual);
    assert_eq!(
        stream.upload_region(&[Unorm4::GREEN; 16], 4, 4).unwrap().slot(),
        Some(2)
    );
    assert_eq!(
        stream.upload_region(&[Unorm4::BLUE; 16], 4, 4).unwrap().slot(),
        Some(0)
    );
    device.complete_submitted_work();

    // picks up blue in slot 0; green in slot 2 finished too but is older
    assert_eq!(
        stream.upload_region(&[Unorm4::TRANSPARENT; 16], 4, 4).unwrap().slot(),
        Some(1)
    );
    assert_eq!(stream.read_index(), 0);

    stream.bind();
    assert_eq!(stream.read_index(), 0);
    assert_eq!(device.read_bound(unit).unwrap(), solid(Unorm4::BLUE));
}

#[test]
fn bind_before_completion_shows_cleared_texture() {
    let device = Arc::new(SoftwareDevice::new());
    let mut stream = rgba_stream(&device, 2);
    let unit = stream.texture_unit();
    device.set_fence_mode(FenceMode::Never);
    let _ = stream.upload_region(&[Unorm4::RED; 16], 4, 4).unwrap();
    stream.bind();
    assert_eq!(stream.read_index(), 0);
    assert_eq!(device.read_bound(unit).unwrap(), vec![0_u8; 64]);
}

#[test]
fn unbind_is_idempotent() {
    let device = Arc::new(SoftwareDevice::new());
    let config = StreamConfig::new(4, 4, TexelLayout::rgba8()).with_texture_unit(TextureUnit::new(5));
    let mut stream = TextureStream::new(&device, config).unwrap();
    stream.bind();
    assert!(device.bound_texture(TextureUnit::new(5)).is_some());
    stream.unbind();
    stream.unbind();
    assert!(device.bound_texture(TextureUnit::new(5)).is_none());
    assert!(device.bound_texture(TextureUnit::new(0)).is_none());
}

#[test]
fn guard_unbinds_when_render_panics() {
    let device = Arc::new(SoftwareDevice::new());
    let mut stream = rgba_stream(&device, 2);
    let unit = stream.texture_unit();
    let result = catch_unwind(AssertUnwindSafe(|| {
        let _bound = stream.bound();
        panic!("render failed");
    }));
    assert!(result.is_err());
    assert!(device.bound_texture(unit).is_none());
}

#[test]
fn initialization_times_out_when_device_never_finishes() {
    let device = Arc::new(SoftwareDevice::with_fence_mode(FenceMode::Never));
    let timeout = Duration::from_millis(50);
    let config = StreamConfig::new(4, 4, TexelLayout::rgba8()).with_init_timeout(timeout);
    let started = Instant::now();
    let result = TextureStream::new(&device, config);
    let elapsed = started.elapsed();
    assert_eq!(result.err(), Some(Error::InitializationTimeout(timeout)));
    assert!(elapsed >= timeout);
    assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
    assert_eq!(device.live_fences(), 0);
}

#[test]
fn initialization_fails_when_waits_fail() {
    let device = Arc::new(SoftwareDevice::with_fence_mode(FenceMode::Fail));
    let config = StreamConfig::new(4, 4, TexelLayout::rgba8()).with_slots(3);
    let started = Instant::now();
    let result = TextureStream::new(&device, config);
    assert_eq!(result.err(), Some(Error::InitializationFailed));
    assert!(started.elapsed() < StreamConfig::DEFAULT_INIT_TIMEOUT);
    assert_eq!(device.live_fences(), 0);
}

#[test]
fn degraded_device_never_drops() {
    let device = Arc::new(SoftwareDevice::without_fences());
    let mut stream = rgba_stream(&device, 2);
    assert!(!stream.fences_available());
    assert!(!stream.is_ready());
    for color in [Unorm4::RED, Unorm4::GREEN, Unorm4::BLUE, Unorm4::RED, Unorm4::GREEN] {
        let upload = stream.upload_region(&[color; 16], 4, 4).unwrap();
        assert!(!upload.is_dropped());
        stream.bind();
        assert_eq!(device.read_bound(stream.texture_unit()).unwrap(), solid(color));
    }
    assert_eq!(device.live_fences(), 0);
}

#[test]
fn typed_and_raw_surfaces_agree() {
    let device = Arc::new(SoftwareDevice::new());
    let mut stream = rgba_stream(&device, 1);
    let _ = stream.upload_region(&[[1_u8, 2, 3, 4]; 16], 4, 4).unwrap();
    let typed = stream.slot_texture(0).contents();
    let _ = stream
        .upload_region_bytes(&[1, 2, 3, 4].repeat(16), 4, 4, 4)
        .unwrap();
    assert_eq!(stream.slot_texture(0).contents(), typed);
    let _ = stream
        .upload_region(&[u32::from_ne_bytes([1, 2, 3, 4]); 16], 4, 4)
        .unwrap();
    assert_eq!(stream.slot_texture(0).contents(), typed);
}

#[test]
fn errors_leave_stream_usable() {
    let device = Arc::new(SoftwareDevice::new());
    let mut stream = rgba_stream(&device, 2);
    assert_eq!(
        stream.upload_region_bytes(&[0; 48], 3, 4, 4),
        Err(Error::TexelSizeMismatch {
            expected: 4,
            found: 3
        })
    );
    assert!(matches!(
        stream.upload_region_bytes_with_clear(&[0; 80], 4, 5, 4),
        Err(Error::DataTooLarge { .. })
    ));
    assert!(matches!(
        stream.upload_region_bytes(&[0; 60], 4, 4, 4),
        Err(Error::RegionMismatch { .. })
    ));
    assert_eq!((stream.write_index(), stream.read_index()), (0, 0));
    assert_eq!(
        stream.upload_region(&[Unorm4::RED; 16], 4, 4).unwrap(),
        Upload::Submitted { slot: 1 }
    );
}

#[test]
fn invalid_layouts_are_rejected() {
    assert_eq!(
        TexelLayout::new(TexelFormat::Rgb, TexelType::U16_4444),
        Err(Error::InvalidFormat {
            format: TexelFormat::Rgb,
            ty: TexelType::U16_4444
        })
    );
    let layout = TexelLayout::new(TexelFormat::Rg, TexelType::F32).unwrap();
    assert_eq!(layout.bytes_per_texel(), 8);
}

#[test]
fn configuration_reaches_the_device() {
    use texture_streams::bindings::sampler::FilterMode;
    let device = Arc::new(SoftwareDevice::new());
    let config = StreamConfig::new(3, 2, TexelLayout::rgba8())
        .with_slots(3)
        .with_filters(FilterMode::Linear, FilterMode::Nearest)
        .with_debug_name("video");
    let stream = TextureStream::new(&device, config).unwrap();
    assert_eq!((stream.width(), stream.height(), stream.slot_count()), (3, 2, 3));
    let texture = stream.slot_texture(2);
    assert_eq!(texture.debug_name(), "video[2]");
    assert_eq!(texture.extent(), Extent::new(3, 2));
    assert_eq!(texture.filters(), (FilterMode::Linear, FilterMode::Nearest));
}

#[test]
fn staging_usage_reaches_the_device() {
    use texture_streams::bindings::visible_to::StagingUsage;
    let device = Arc::new(SoftwareDevice::new());
    let stream = rgba_stream(&device, 2);
    for slot in 0..2 {
        assert_eq!(stream.slot_staging(slot).usage(), StagingUsage::Stream);
    }

    let config = StreamConfig::new(4, 4, TexelLayout::rgba8())
        .with_slots(3)
        .with_staging_usage(StagingUsage::Dynamic);
    let stream = TextureStream::new(&device, config).unwrap();
    for slot in 0..3 {
        let staging = stream.slot_staging(slot);
        assert_eq!(staging.usage(), StagingUsage::Dynamic);
        assert_eq!(staging.as_slice().len(), 4 * 4 * 4);
    }
}
