//! End-to-end runs writing real GIF/PNG output into a temporary directory.

use approx::assert_relative_eq;
use image::codecs::gif::GifDecoder;
use image::AnimationDecoder;
use standing_wave::{Config, Simulation};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tempfile::TempDir;

/// Small enough to render quickly; text is off so no system font is needed.
fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.domain.nx = 16;
    config.domain.ny = 12;
    config.time.nt = 12;
    config.time.tmax = 1.1;
    config.time.snapshot_time = 0.52;
    config.render.image_width = 120;
    config.render.image_height = 90;
    config.render.snapshot_dpi = 200.0;
    config.render.annotate = false;
    config.output.directory = dir.to_path_buf();
    config.output.delay_time = 0.08;
    config
}

fn gif_frames(path: &Path) -> Vec<image::Frame> {
    let decoder = GifDecoder::new(BufReader::new(File::open(path).unwrap())).unwrap();
    decoder.into_frames().collect_frames().unwrap()
}

#[test]
fn animation_holds_every_frame_but_one() {
    let dir = TempDir::new().unwrap();
    let sim = Simulation::new(test_config(dir.path())).unwrap();
    let summary = sim.run_with_visualisation().unwrap();

    let frames = gif_frames(&summary.animation_path);
    assert_eq!(frames.len(), 11);
    assert_eq!(summary.frames_written, 11);
    for frame in &frames {
        assert_eq!(frame.buffer().dimensions(), (120, 90));
        let (numer, denom) = frame.delay().numer_denom_ms();
        assert_relative_eq!(numer as f64 / denom as f64, 80.0);
    }

    // Looping animation
    let bytes = std::fs::read(&summary.animation_path).unwrap();
    assert!(bytes.windows(11).any(|w| w == b"NETSCAPE2.0"));
}

#[test]
fn snapshot_uses_first_sample_at_or_after_requested_time() {
    let dir = TempDir::new().unwrap();
    let sim = Simulation::new(test_config(dir.path())).unwrap();
    let summary = sim.run_with_visualisation().unwrap();

    // Samples are 0.1 apart; 0.5 is nearest and skipped, 0.6 triggers the still
    assert_eq!(summary.skipped_index, Some(5));
    let snapshot = summary.snapshot.unwrap();
    assert_eq!(snapshot.index, 6);
    assert_relative_eq!(snapshot.time, 0.6, epsilon = 1e-12);
    assert_eq!(
        snapshot.path,
        dir.path().join("standing_wave_snapshot_t0.60.png")
    );
    assert_eq!(image::image_dimensions(&snapshot.path).unwrap(), (240, 180));

    let pngs = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == "png"))
        .count();
    assert_eq!(pngs, 1);
}

#[test]
fn reruns_are_reproducible() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let a = Simulation::new(test_config(first.path())).unwrap();
    let b = Simulation::new(test_config(second.path())).unwrap();

    assert!(a
        .field
        .data
        .iter()
        .zip(b.field.data.iter())
        .all(|(x, y)| x.to_bits() == y.to_bits()));
    assert_eq!(a.range, b.range);

    let snap_a = a.run_with_visualisation().unwrap().snapshot.unwrap();
    let snap_b = b.run_with_visualisation().unwrap().snapshot.unwrap();
    let pixels_a = image::open(&snap_a.path).unwrap().to_rgb8();
    let pixels_b = image::open(&snap_b.path).unwrap().to_rgb8();
    assert_eq!(pixels_a.as_raw(), pixels_b.as_raw());
}

#[test]
fn config_file_drives_the_run() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wave.toml");
    let toml = format!(
        r#"
        [domain]
        nx = 10
        ny = 10

        [time]
        nt = 5
        tmax = 2.0
        snapshot_time = 1.0

        [render]
        image_width = 64
        image_height = 48
        snapshot_dpi = 100.0
        annotate = false
        z_min = -1.5
        z_max = 1.5

        [output]
        directory = "{}"
        gif_filename = "custom.gif"
        "#,
        dir.path().display()
    );
    std::fs::write(&path, toml).unwrap();

    let config = Config::from_file(&path).unwrap();
    let sim = Simulation::new(config).unwrap();
    assert_eq!(sim.range.min, -1.5);
    assert_eq!(sim.range.max, 1.5);

    let summary = sim.run_with_visualisation().unwrap();
    assert_eq!(summary.animation_path, dir.path().join("custom.gif"));
    assert_eq!(gif_frames(&summary.animation_path).len(), 4);
    let snapshot = summary.snapshot.unwrap();
    assert_eq!(snapshot.index, 2);
    assert_eq!(image::image_dimensions(&snapshot.path).unwrap(), (64, 48));
}
