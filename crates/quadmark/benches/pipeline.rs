use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::Vector3;
use quadmark::synth::render_view;
use quadmark::{BitMatrix, CameraIntrinsics, DetectorParams, MarkerDetector, Pose};

const SIZES: [(usize, usize); 3] = [(320, 240), (640, 480), (1280, 720)];

fn camera_for(width: usize, height: usize) -> CameraIntrinsics {
    CameraIntrinsics {
        fx: 800.0 * width as f64 / 640.0,
        fy: 800.0 * width as f64 / 640.0,
        cx: width as f64 / 2.0,
        cy: height as f64 / 2.0,
        ..CameraIntrinsics::default_uncalibrated()
    }
}

fn bench_detect(c: &mut Criterion) {
    let detector = MarkerDetector::new(DetectorParams::default()).expect("default params");
    let pose = Pose::new(Vector3::new(0.25, -0.15, 0.1), Vector3::new(-0.5, -0.5, 4.0));

    let mut group = c.benchmark_group("detect");
    for &(width, height) in SIZES.iter() {
        let camera = camera_for(width, height);
        let frame = render_view(&BitMatrix::reference(), &pose, &camera, width, height);
        let size_str = format!("{width}x{height}");

        group.bench_with_input(BenchmarkId::new("marker", &size_str), &frame, |b, frame| {
            b.iter(|| detector.detect(black_box(&frame.view()), black_box(&camera)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_detect);
criterion_main!(benches);
