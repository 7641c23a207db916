use crate::config::OutputConfig;
use crate::timeline::Timeline;
use crate::visualisation::{FrameRenderer, RasterFrame};
use anyhow::{anyhow, Context, Result};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};
use ndarray::{Array2, ArrayView2};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, info};

// NeuQuant sampling factor, 1 (best) to 30 (fastest); each frame gets its own palette
const GIF_QUANTIZER_SPEED: i32 = 10;

/// Where the still was written and which sample it shows.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub index: usize,
    pub time: f64,
    pub path: PathBuf,
}

/// Mutable state of one export pass.
///
/// The animation stream is opened by the first appended frame and writes into
/// a sink owned by the caller; the snapshot marker flips once and never resets.
pub struct ExportState<'a> {
    sink: Option<&'a mut Option<BufWriter<File>>>,
    animation: Option<GifEncoder<&'a mut BufWriter<File>>>,
    frames_written: usize,
    snapshot: Option<Snapshot>,
}

impl<'a> ExportState<'a> {
    pub fn new(sink: &'a mut Option<BufWriter<File>>) -> Self {
        Self {
            sink: Some(sink),
            animation: None,
            frames_written: 0,
            snapshot: None,
        }
    }

    pub fn snapshot_taken(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Drop the encoder, which writes the GIF trailer into the sink, and
    /// release the sink for flushing.
    pub fn close(self) -> (usize, Option<Snapshot>) {
        drop(self.animation);
        (self.frames_written, self.snapshot)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub animation_path: PathBuf,
    pub frames_written: usize,
    pub skipped_index: Option<usize>,
    pub snapshot: Option<Snapshot>,
}

/// Drives the renderer over every time sample and writes both outputs.
pub struct Exporter {
    output: OutputConfig,
    snapshot_scale: f64,
    skipped_index: Option<usize>,
    snapshot_index: Option<usize>,
}

impl Exporter {
    pub fn new(
        output: OutputConfig,
        timeline: &Timeline,
        snapshot_time: f64,
        snapshot_scale: f64,
    ) -> Self {
        // The sample nearest the snapshot time stays out of the animation. It
        // is not necessarily the sample that triggers the snapshot.
        let skipped_index = timeline.nearest(snapshot_time);
        Self {
            output,
            snapshot_scale,
            skipped_index,
            snapshot_index: timeline.first_at_or_after(snapshot_time),
        }
    }

    pub fn skipped_index(&self) -> Option<usize> {
        self.skipped_index
    }

    pub fn snapshot_index(&self) -> Option<usize> {
        self.snapshot_index
    }

    /// Visit every sample in time order. `heights(n)` supplies frame n.
    pub fn run<R, F, H>(
        &self,
        renderer: &mut R,
        timeline: &Timeline,
        mut heights: F,
    ) -> Result<ExportSummary>
    where
        R: FrameRenderer,
        F: FnMut(usize) -> H,
        H: AsHeights,
    {
        fs::create_dir_all(&self.output.directory).with_context(|| {
            format!(
                "Failed to create output directory '{}'",
                self.output.directory.display()
            )
        })?;

        let mut sink = None;
        let mut state = ExportState::new(&mut sink);
        let total = timeline.len();
        let report_every = (total / 10).max(1);
        let pause = self.output.pause();

        for n in 0..total {
            let field = heights(n);
            renderer.update(field.as_heights())?;
            self.export_frame(&mut state, renderer, n, timeline.time(n))?;

            if (n + 1) % report_every == 0 {
                info!("Rendered frame {}/{}", n + 1, total);
            }
            if let Some(pause) = pause {
                std::thread::sleep(pause);
            }
        }

        let (frames_written, snapshot) = state.close();
        if let Some(mut writer) = sink {
            writer.flush().context("Failed to finish animation")?;
        }
        let animation_path = self.output.gif_path();
        info!(
            frames = frames_written,
            "Animation saved to {}",
            animation_path.display()
        );

        Ok(ExportSummary {
            animation_path,
            frames_written,
            skipped_index: self.skipped_index,
            snapshot,
        })
    }

    /// Capture the frame already shown by `renderer` and route it to the
    /// animation, the snapshot, or both.
    pub fn export_frame<R: FrameRenderer>(
        &self,
        state: &mut ExportState<'_>,
        renderer: &R,
        n: usize,
        t: f64,
    ) -> Result<()> {
        let frame = renderer.capture(1.0)?;

        if self.skipped_index != Some(n) {
            self.append_frame(state, &frame)?;
            debug!(frame = n, t, "Appended animation frame");
        } else {
            debug!(frame = n, t, "Frame held out of the animation");
        }

        if !state.snapshot_taken() && self.snapshot_index == Some(n) {
            let path = self.output.snapshot_path(t);
            let still = renderer.capture(self.snapshot_scale)?;
            let (w, h) = (still.width, still.height);
            still
                .into_rgb_image()?
                .save(&path)
                .with_context(|| format!("Failed to write snapshot '{}'", path.display()))?;
            info!("Snapshot ({}x{}, t={:.2}) saved to {}", w, h, t, path.display());
            state.snapshot = Some(Snapshot { index: n, time: t, path });
        }

        Ok(())
    }

    fn append_frame(&self, state: &mut ExportState<'_>, frame: &RasterFrame) -> Result<()> {
        if state.animation.is_none() {
            let path = self.output.gif_path();
            let file = File::create(&path)
                .with_context(|| format!("Failed to create animation '{}'", path.display()))?;
            let writer = match state.sink.take() {
                Some(slot) => slot.insert(BufWriter::new(file)),
                None => return Err(anyhow!("Animation stream was already closed")),
            };
            let mut encoder = GifEncoder::new_with_speed(writer, GIF_QUANTIZER_SPEED);
            encoder.set_repeat(Repeat::Infinite)?;
            state.animation = Some(encoder);
        }
        if let Some(encoder) = state.animation.as_mut() {
            let delay = Delay::from_numer_denom_ms(self.output.delay_ms(), 1);
            encoder
                .encode_frame(Frame::from_parts(frame.to_rgba_image()?, 0, 0, delay))
                .context("Failed to append animation frame")?;
            state.frames_written += 1;
        }
        Ok(())
    }
}

/// Borrowed view of a frame's heights, owned or not.
pub trait AsHeights {
    fn as_heights(&self) -> ArrayView2<'_, f64>;
}

impl AsHeights for ArrayView2<'_, f64> {
    fn as_heights(&self) -> ArrayView2<'_, f64> {
        self.view()
    }
}

impl AsHeights for Array2<f64> {
    fn as_heights(&self) -> ArrayView2<'_, f64> {
        self.view()
    }
}
