//! End-to-end tests for the perspective node.

use std::io::Write;
use std::sync::{Mutex, MutexGuard};

use persp_compute::kernels::warp;
use persp_compute::{
    Backend, ComputeImage, acceleration_enabled, acceleration_holders, gpu_available,
};
use persp_ops::camera::Camera;
use persp_ops::project::Projector;
use persp_ops::warp::WarpPlan;
use persp_ops::{BackendChoice, EngineConfig, NodeParams, Outcome, PerspectiveNode, Quality};

// Tests that hold or count acceleration guards take turns; plain runs don't.
static FLAG_LOCK: Mutex<()> = Mutex::new(());

fn flag_lock() -> MutexGuard<'static, ()> {
    FLAG_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

fn tilted() -> NodeParams {
    NodeParams {
        pitch: -10.0,
        yaw: 20.0,
        roll: 15.0,
        tx: 20.0,
        ty: -10.0,
        distance: 1200.0,
        scale: 80.0,
        ..Default::default()
    }
}

fn gradient(w: u32, h: u32, channels: u32) -> ComputeImage {
    let mut img = ComputeImage::new(w, h, channels);
    for y in 0..h {
        for x in 0..w {
            let px = img.pixel_mut(x, y);
            for (c, v) in px.iter_mut().enumerate() {
                *v = match c {
                    0 => x as f32 / w as f32,
                    1 => y as f32 / h as f32,
                    2 => 0.5,
                    _ => if (x / 10 + y / 10) % 2 == 0 { 1.0 } else { 0.4 },
                };
            }
        }
    }
    img
}

fn projected_quad(params: &NodeParams, src: &ComputeImage, canvas: &ComputeImage) -> [[f64; 2]; 4] {
    let cfg = EngineConfig::default();
    let cam = Camera::from_params(params);
    let proj = Projector::new(cam.focal_length(&cfg), canvas.width, canvas.height, &cfg);
    proj.project(&cam.corners(src.width, src.height))
}

#[test]
fn test_identity_white_square() {
    let white = ComputeImage::filled(100, 100, &[1.0, 1.0, 1.0]);
    let black = ComputeImage::filled(200, 200, &[0.0, 0.0, 0.0]);
    let out = PerspectiveNode::new().process(Some(&white), Some(&black), &NodeParams::default());

    assert_eq!(out.report.outcome, Outcome::IdentityFastPath);
    for y in 0..200 {
        for x in 0..200 {
            let inside = (50..150).contains(&x) && (50..150).contains(&y);
            let v: f32 = if inside { 1.0 } else { 0.0 };
            assert_eq!(out.image.pixel(x, y), &[v, v, v], "pixel ({x}, {y})");
        }
    }
}

#[test]
fn test_identity_through_warp_matches_fast_path() {
    // Nudged distance disables the fast path but keeps magnification ~1.
    let white = ComputeImage::filled(100, 100, &[1.0, 1.0, 1.0]);
    let black = ComputeImage::filled(200, 200, &[0.0, 0.0, 0.0]);
    let params = NodeParams {
        quality: Quality::Speed,
        distance: 1000.0 + 1e-9,
        ..Default::default()
    };
    let out = PerspectiveNode::new().process(Some(&white), Some(&black), &params);
    assert_eq!(out.report.outcome, Outcome::Composited);
    assert_eq!(out.image.pixel(50, 50), &[1.0, 1.0, 1.0]);
    assert_eq!(out.image.pixel(149, 149), &[1.0, 1.0, 1.0]);
    assert_eq!(out.image.pixel(49, 100), &[0.0, 0.0, 0.0]);
    assert_eq!(out.image.pixel(150, 100), &[0.0, 0.0, 0.0]);
}

#[test]
fn test_black_source_pixels_agree_between_paths() {
    // Black band across an RGB source: neither path paints it.
    let mut src = ComputeImage::filled(100, 100, &[0.9, 0.6, 0.3]);
    for y in 40..60 {
        for x in 0..100 {
            src.pixel_mut(x, y).fill(0.0);
        }
    }
    let canvas = ComputeImage::filled(200, 200, &[0.25, 0.25, 0.25]);
    let node = PerspectiveNode::new();

    let fast = node.process(Some(&src), Some(&canvas), &NodeParams::default());
    assert_eq!(fast.report.outcome, Outcome::IdentityFastPath);
    assert_eq!(fast.image.pixel(100, 100), &[0.25, 0.25, 0.25]);
    assert_eq!(fast.image.pixel(100, 60), &[0.9, 0.6, 0.3]);

    let nudged = NodeParams {
        quality: Quality::Speed,
        distance: 1000.0 + 1e-9,
        ..Default::default()
    };
    let warped = node.process(Some(&src), Some(&canvas), &nudged);
    assert_eq!(warped.report.outcome, Outcome::Composited);
    assert_eq!(warped.image, fast.image);
}

#[test]
fn test_corners_land_on_projection() {
    let src = ComputeImage::filled(100, 80, &[1.0, 1.0, 1.0, 1.0]);
    let canvas = ComputeImage::filled(320, 240, &[0.0, 0.0, 0.0, 1.0]);
    let params = tilted();
    let quad = projected_quad(&params, &src, &canvas);

    let plan = WarpPlan::solve(src.width, src.height, &quad).unwrap();
    for (s, d) in [[0.0, 0.0], [100.0, 0.0], [100.0, 80.0], [0.0, 80.0]].iter().zip(quad.iter()) {
        let (x, y) = plan.forward.map(s[0], s[1]).unwrap();
        assert!((x - d[0]).abs() < 1e-6 && (y - d[1]).abs() < 1e-6);
    }

    let out = PerspectiveNode::new().process(Some(&src), Some(&canvas), &params);
    assert_eq!(out.report.outcome, Outcome::Composited);

    // Covered pixels span the quad's bounding box.
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (u32::MAX, u32::MAX, 0, 0);
    for y in 0..canvas.height {
        for x in 0..canvas.width {
            if out.image.pixel(x, y)[0] > 0.5 {
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }
    }
    let qx: Vec<f64> = quad.iter().map(|p| p[0]).collect();
    let qy: Vec<f64> = quad.iter().map(|p| p[1]).collect();
    let fmin = |v: &[f64]| v.iter().cloned().fold(f64::INFINITY, f64::min);
    let fmax = |v: &[f64]| v.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    assert!((min_x as f64 - fmin(&qx)).abs() <= 3.0);
    assert!((min_y as f64 - fmin(&qy)).abs() <= 3.0);
    assert!((max_x as f64 - fmax(&qx)).abs() <= 3.0);
    assert!((max_y as f64 - fmax(&qy)).abs() <= 3.0);
}

#[test]
fn test_alpha_zero_leaves_reference_untouched() {
    let mut src = gradient(120, 90, 4);
    // Clear alpha on the left half.
    for y in 0..90 {
        for x in 0..60 {
            src.pixel_mut(x, y)[3] = 0.0;
        }
    }
    let canvas = gradient(300, 220, 3);
    let params = tilted();

    let quad = projected_quad(&params, &src, &canvas);
    let plan = WarpPlan::solve(src.width, src.height, &quad).unwrap();
    let warped = warp(&src, &plan.kernel_matrix(), params.quality.filter(), canvas.width, canvas.height);

    let out = PerspectiveNode::new().process(Some(&src), Some(&canvas), &params);
    assert_eq!(out.report.outcome, Outcome::Composited);

    let mut untouched = 0;
    for y in 0..canvas.height {
        for x in 0..canvas.width {
            if warped.pixel(x, y)[3] == 0.0 {
                assert_eq!(out.image.pixel(x, y), canvas.pixel(x, y), "pixel ({x}, {y})");
                untouched += 1;
            }
        }
    }
    assert!(untouched > 0);
}

#[test]
fn test_fully_transparent_source_is_noop() {
    let src = ComputeImage::filled(80, 80, &[1.0, 1.0, 1.0, 0.0]);
    let canvas = gradient(200, 200, 4);
    let out = PerspectiveNode::new().process(Some(&src), Some(&canvas), &tilted());
    assert_eq!(out.image, canvas);
}

#[test]
fn test_yaw_90_rejected() {
    let src = ComputeImage::filled(100, 100, &[1.0, 1.0, 1.0]);
    let canvas = gradient(200, 200, 3);
    let params = NodeParams {
        yaw: 90.0,
        ..Default::default()
    };
    let out = PerspectiveNode::new().process(Some(&src), Some(&canvas), &params);
    assert_eq!(out.report.outcome, Outcome::Degenerate);
    assert!(out.report.message.is_some());
    assert_eq!(out.image, canvas);
}

#[test]
fn test_behind_camera_rejected() {
    let src = ComputeImage::filled(400, 400, &[1.0, 1.0, 1.0]);
    let canvas = ComputeImage::filled(200, 200, &[0.0, 0.0, 0.0]);
    let params = NodeParams {
        pitch: 80.0,
        distance: 100.0,
        ..Default::default()
    };
    let out = PerspectiveNode::new().process(Some(&src), Some(&canvas), &params);
    assert_eq!(out.report.outcome, Outcome::Degenerate);
    assert_eq!(out.image, canvas);
}

#[test]
fn test_threaded_partition_matches_serial() {
    let src = gradient(160, 120, 4);
    let canvas = gradient(240, 500, 3);
    let serial = PerspectiveNode::new().process(Some(&src), Some(&canvas), &tilted());
    let threaded_params = NodeParams {
        backend: BackendChoice::Threaded,
        threads: 4,
        ..tilted()
    };
    let threaded = PerspectiveNode::new().process(Some(&src), Some(&canvas), &threaded_params);

    assert_eq!(threaded.report.used, Some(Backend::Threaded));
    assert!(!threaded.report.fell_back);
    assert_eq!(serial.image, threaded.image);
}

#[test]
fn test_gpu_matches_serial_within_tolerance() {
    let _g = flag_lock();
    if !gpu_available() {
        println!("No GPU adapter, skipping");
        return;
    }
    let src = gradient(160, 120, 4);
    let canvas = gradient(240, 180, 4);
    let serial = PerspectiveNode::new().process(Some(&src), Some(&canvas), &tilted());
    let gpu_params = NodeParams {
        backend: BackendChoice::Gpu,
        ..tilted()
    };
    let gpu = PerspectiveNode::new().process(Some(&src), Some(&canvas), &gpu_params);
    assert_eq!(gpu.report.used, Some(Backend::Gpu));

    let over = serial
        .image
        .data()
        .iter()
        .zip(gpu.image.data())
        .filter(|(a, b)| (*a - *b).abs() > 2.0 / 255.0)
        .count();
    assert!(over * 200 < serial.image.data().len(), "{over} samples differ");
}

#[test]
fn test_unavailable_gpu_falls_back_to_serial() {
    let _g = flag_lock();
    if gpu_available() {
        return;
    }
    let before = acceleration_enabled();
    let src = gradient(100, 100, 3);
    let canvas = gradient(200, 200, 3);
    let serial = PerspectiveNode::new().process(Some(&src), Some(&canvas), &tilted());
    let params = NodeParams {
        use_gpu: true,
        ..tilted()
    };
    let out = PerspectiveNode::new().process(Some(&src), Some(&canvas), &params);

    assert_eq!(out.report.requested, Backend::Gpu);
    assert_eq!(out.report.used, Some(Backend::Serial));
    assert!(out.report.fell_back);
    assert_eq!(out.report.outcome, Outcome::Composited);
    assert_eq!(out.image, serial.image);
    assert_eq!(acceleration_enabled(), before);
}

#[test]
fn test_missing_input_returns_error_image() {
    let canvas = ComputeImage::filled(50, 50, &[0.0, 0.0, 0.0]);
    let node = PerspectiveNode::new();
    for out in [
        node.process(None, Some(&canvas), &NodeParams::default()),
        node.process(Some(&canvas), None, &NodeParams::default()),
        node.process(None, None, &NodeParams::default()),
    ] {
        assert_eq!(out.report.outcome, Outcome::InvalidInput);
        assert_eq!(out.image.dimensions(), (100, 100, 4));
        assert!(out.image.data().chunks(4).all(|p| p == [1.0f32, 0.0, 0.0, 1.0]));
    }
}

#[test]
fn test_unreadable_input_returns_error_image() {
    let empty = ComputeImage::new(0, 0, 3);
    let canvas = ComputeImage::filled(50, 50, &[0.0, 0.0, 0.0]);
    let out = PerspectiveNode::new().process(Some(&empty), Some(&canvas), &NodeParams::default());
    assert_eq!(out.report.outcome, Outcome::InvalidInput);
    assert_eq!(out.image.dimensions(), (100, 100, 4));
}

#[test]
fn test_channel_adaptation_keeps_reference_layout() {
    let gray_src = gradient(80, 60, 1);
    let rgb_canvas = ComputeImage::new(160, 120, 3);
    let out = PerspectiveNode::new().process(Some(&gray_src), Some(&rgb_canvas), &tilted());
    assert_eq!(out.image.dimensions(), (160, 120, 3));

    let rgb_src = gradient(80, 60, 3);
    let gray_canvas = ComputeImage::new(160, 120, 1);
    let out = PerspectiveNode::new().process(Some(&rgb_src), Some(&gray_canvas), &tilted());
    assert_eq!(out.image.dimensions(), (160, 120, 1));
    assert_eq!(out.report.outcome, Outcome::Composited);
}

#[test]
fn test_params_from_yaml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "pitch: 5\nyaw: -12.5\ndistance: 1500\nscale: 75\nbackend: threaded\nthreads: 2\nquality: quality").unwrap();

    let params = NodeParams::from_file(file.path()).unwrap();
    assert_eq!(params.pitch, 5.0);
    assert_eq!(params.yaw, -12.5);
    assert_eq!(params.distance, 1500.0);
    assert_eq!(params.scale, 75.0);
    assert_eq!(params.backend(), Backend::Threaded);
    assert_eq!(params.quality, Quality::Quality);
    assert_eq!(params.roll, 0.0);
}

#[test]
fn test_params_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    assert!(NodeParams::from_file(dir.path().join("nope.yaml")).is_err());
}

#[test]
fn test_report_timing() {
    let src = gradient(64, 64, 3);
    let canvas = gradient(128, 128, 3);
    let out = PerspectiveNode::new().process(Some(&src), Some(&canvas), &tilted());
    assert!(out.report.elapsed_ms() >= 0.0);
    assert_eq!(out.report.requested, Backend::Serial);
}

#[test]
fn test_concurrent_backends_do_not_interfere() {
    let _g = flag_lock();
    let before = acceleration_holders();
    let src = gradient(100, 100, 4);
    let canvas = gradient(240, 320, 3);
    let node = PerspectiveNode::new();
    let expected = node.process(Some(&src), Some(&canvas), &tilted());

    let requests = [
        BackendChoice::Gpu,
        BackendChoice::Serial,
        BackendChoice::Threaded,
        BackendChoice::Gpu,
        BackendChoice::Serial,
    ];
    let outputs: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = requests
            .iter()
            .map(|&backend| {
                let (node, src, canvas) = (&node, &src, &canvas);
                s.spawn(move || {
                    let params = NodeParams {
                        backend,
                        threads: 4,
                        ..tilted()
                    };
                    node.process(Some(src), Some(canvas), &params)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (backend, out) in requests.iter().zip(&outputs) {
        assert_eq!(out.report.outcome, Outcome::Composited);
        match backend {
            BackendChoice::Gpu if gpu_available() => {
                assert_eq!(out.report.used, Some(Backend::Gpu), "{:?}", out.report.message);
                assert!(!out.report.fell_back);
            }
            BackendChoice::Threaded => {
                assert_eq!(out.report.used, Some(Backend::Threaded));
                assert_eq!(out.image, expected.image);
            }
            _ => {
                assert_eq!(out.report.used, Some(Backend::Serial));
                assert_eq!(out.image, expected.image);
            }
        }
    }
    assert_eq!(acceleration_holders(), before);
    assert_eq!(acceleration_enabled(), before > 0);
}
