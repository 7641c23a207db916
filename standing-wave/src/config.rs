use crate::grid::Grid;
use crate::timeline::Timeline;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Spatial domain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainConfig {
    pub lx: f64, // Physical width (x)
    pub ly: f64, // Physical depth (y)
    pub nx: usize,
    pub ny: usize,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            lx: 4.0,
            ly: 4.0,
            nx: 80,
            ny: 80,
        }
    }
}

impl DomainConfig {
    fn validate(&self) -> Result<()> {
        Grid::check(self.nx, self.ny, self.lx, self.ly)
    }
}

/// Standing wave parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    pub c: f64,         // Wave speed scaling inside the cosine term
    pub k: f64,         // Spatial wavenumber
    pub amplitude: f64, // Field scale factor
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            k: 2.0 * PI * 1.5,
            amplitude: 1.0,
        }
    }
}

impl WaveConfig {
    fn validate(&self) -> Result<()> {
        if !self.c.is_finite() || !self.k.is_finite() || !self.amplitude.is_finite() {
            return Err(anyhow!(
                "Wave parameters must be finite (c={}, k={}, amplitude={})",
                self.c,
                self.k,
                self.amplitude
            ));
        }
        Ok(())
    }

    /// Angular frequency of the cosine term, `c * k`.
    pub fn omega(&self) -> f64 {
        self.c * self.k
    }
}

/// Time sampling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    pub nt: usize,
    pub tmax: f64,
    pub snapshot_time: f64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            nt: 100,
            tmax: 4.0,
            snapshot_time: 2.0,
        }
    }
}

impl TimeConfig {
    fn validate(&self) -> Result<()> {
        Timeline::check(self.nt, self.tmax)?;
        if !self.snapshot_time.is_finite() {
            return Err(anyhow!("snapshot_time must be finite, got {}", self.snapshot_time));
        }
        if self.snapshot_time < 0.0 || self.snapshot_time > self.tmax {
            warn!(
                snapshot_time = self.snapshot_time,
                tmax = self.tmax,
                "snapshot_time lies outside [0, tmax]; the snapshot may never be taken"
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Colormap {
    Viridis,
    Turbo,
    Plasma,
    RdYlBu,
}

impl Colormap {
    pub fn gradient(self) -> Box<dyn colorgrad::Gradient> {
        match self {
            Colormap::Viridis => Box::new(colorgrad::preset::viridis()),
            Colormap::Turbo => Box::new(colorgrad::preset::turbo()),
            Colormap::Plasma => Box::new(colorgrad::preset::plasma()),
            Colormap::RdYlBu => Box::new(colorgrad::preset::rd_yl_bu()),
        }
    }
}

/// Surface rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_min: Option<f64>, // Manual height/colour range, both or neither
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_max: Option<f64>,
    pub image_width: u32,
    pub image_height: u32,
    pub snapshot_dpi: f64, // Animation frames are 100 DPI-equivalent
    pub colormap: Colormap,
    pub yaw: f64,
    pub pitch: f64,
    pub annotate: bool, // Caption and axis labels; needs a system font
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            z_min: None,
            z_max: None,
            image_width: 800,
            image_height: 600,
            snapshot_dpi: 300.0,
            colormap: Colormap::Viridis,
            yaw: 0.6,
            pitch: 0.45,
            annotate: true,
        }
    }
}

impl RenderConfig {
    /// Pixel density of animation frames.
    pub const FRAME_DPI: f64 = 100.0;

    fn validate(&self) -> Result<()> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(anyhow!(
                "Image dimensions must be positive (width={}, height={})",
                self.image_width,
                self.image_height
            ));
        }
        if !(self.snapshot_dpi > 0.0) || !self.snapshot_dpi.is_finite() {
            return Err(anyhow!("snapshot_dpi must be positive, got {}", self.snapshot_dpi));
        }
        match (self.z_min, self.z_max) {
            (None, None) => {}
            (Some(lo), Some(hi)) => {
                if !(lo < hi) || !lo.is_finite() || !hi.is_finite() {
                    return Err(anyhow!(
                        "z_min must be finite and below z_max (z_min={}, z_max={})",
                        lo,
                        hi
                    ));
                }
            }
            _ => return Err(anyhow!("z_min and z_max must be given together")),
        }
        Ok(())
    }

    pub fn manual_range(&self) -> Option<(f64, f64)> {
        self.z_min.zip(self.z_max)
    }

    /// Upscale factor applied when rendering the snapshot.
    pub fn snapshot_scale(&self) -> f64 {
        self.snapshot_dpi / Self::FRAME_DPI
    }
}

/// Output files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub gif_filename: String,
    pub snapshot_prefix: String,
    pub delay_time: f64,  // Seconds each animation frame is shown
    pub frame_pause: f64, // Seconds to sleep between frames, pacing only
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            gif_filename: "standing_wave.gif".to_string(),
            snapshot_prefix: "standing_wave_snapshot".to_string(),
            delay_time: 0.05,
            frame_pause: 0.0,
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        if self.gif_filename.trim().is_empty() || self.snapshot_prefix.trim().is_empty() {
            return Err(anyhow!("Output file names must not be empty"));
        }
        // GIF stores delays as u16 centiseconds
        if !(0.0..=655.35).contains(&self.delay_time) {
            return Err(anyhow!(
                "delay_time must be within [0, 655.35] s, got {}",
                self.delay_time
            ));
        }
        if self.delay_time > 0.0 && self.delay_centis() == 0 {
            return Err(anyhow!(
                "delay_time below 0.005 s rounds to zero centiseconds, got {}",
                self.delay_time
            ));
        }
        if !(self.frame_pause >= 0.0) || !self.frame_pause.is_finite() {
            return Err(anyhow!("frame_pause must be non-negative, got {}", self.frame_pause));
        }
        Ok(())
    }

    pub fn gif_path(&self) -> PathBuf {
        self.directory.join(&self.gif_filename)
    }

    /// Snapshot file named after the time actually rendered.
    pub fn snapshot_path(&self, t: f64) -> PathBuf {
        self.directory
            .join(format!("{}_t{:.2}.png", self.snapshot_prefix, t))
    }

    fn delay_centis(&self) -> u32 {
        (self.delay_time * 100.0).round() as u32
    }

    /// Frame delay as stored in the GIF, rounded to whole centiseconds.
    pub fn delay_ms(&self) -> u32 {
        self.delay_centis() * 10
    }

    pub fn pause(&self) -> Option<Duration> {
        (self.frame_pause > 0.0).then(|| Duration::from_secs_f64(self.frame_pause))
    }
}

/// Complete run configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub domain: DomainConfig,
    pub wave: WaveConfig,
    pub time: TimeConfig,
    pub render: RenderConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| anyhow!("Failed to parse TOML config: {}", e))?;

        // Validate before returning
        config.validate()?;

        Ok(config)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.domain.validate()?;
        self.wave.validate()?;
        self.time.validate()?;
        self.render.validate()?;
        self.output.validate()?;
        Ok(())
    }

    /// Log configuration summary
    pub fn log_summary(&self) {
        info!(
            "Grid: {}x{} over {} x {} m",
            self.domain.nx, self.domain.ny, self.domain.lx, self.domain.ly
        );
        info!(
            "Wave: c={}, k={:.4}, amplitude={}, omega={:.4}",
            self.wave.c,
            self.wave.k,
            self.wave.amplitude,
            self.wave.omega()
        );
        info!(
            "Time: nt={}, tmax={} s, snapshot at {} s",
            self.time.nt, self.time.tmax, self.time.snapshot_time
        );
        match self.render.manual_range() {
            Some((lo, hi)) => info!("Height range: manual [{}, {}]", lo, hi),
            None => info!("Height range: auto (1.1 x field extent)"),
        }
        info!(
            "Output: {} ({}x{}, {} ms/frame), snapshot at {} DPI",
            self.output.gif_path().display(),
            self.render.image_width,
            self.render.image_height,
            self.output.delay_ms(),
            self.render.snapshot_dpi
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.time.nt, 100);
        assert_relative_eq!(config.wave.k, 3.0 * PI);
        assert_eq!(config.output.delay_ms(), 50);
        assert_relative_eq!(config.render.snapshot_scale(), 3.0);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config = Config::from_toml(
            r#"
            [domain]
            nx = 40

            [time]
            snapshot_time = 1.5

            [render]
            z_min = -2.0
            z_max = 2.0
            colormap = "rd_yl_bu"

            [output]
            gif_filename = "bessel.gif"
            "#,
        )
        .unwrap();
        assert_eq!(config.domain.nx, 40);
        assert_eq!(config.domain.ny, 80);
        assert_eq!(config.time.snapshot_time, 1.5);
        assert_eq!(config.time.tmax, 4.0);
        assert_eq!(config.render.manual_range(), Some((-2.0, 2.0)));
        assert_eq!(config.render.colormap, Colormap::RdYlBu);
        assert_eq!(config.output.gif_path(), PathBuf::from("output/bessel.gif"));
    }

    #[test]
    fn rejects_non_positive_resolution() {
        let err = Config::from_toml("[domain]\nnx = 0").unwrap_err();
        assert!(err.to_string().contains("nx=0"));
        assert!(Config::from_toml("[time]\nnt = 1").is_err());
        assert!(Config::from_toml("[time]\ntmax = -1.0").is_err());
        // Same checks, and messages, as building the grid directly
        let direct = Grid::new(0, 80, 4.0, 4.0).err().unwrap();
        assert_eq!(err.to_string(), direct.to_string());
    }

    #[test]
    fn rejects_half_specified_range() {
        assert!(Config::from_toml("[render]\nz_min = -1.0").is_err());
        assert!(Config::from_toml("[render]\nz_min = 1.0\nz_max = -1.0").is_err());
    }

    #[test]
    fn rejects_bad_output_settings() {
        assert!(Config::from_toml("[output]\ngif_filename = \"\"").is_err());
        assert!(Config::from_toml("[output]\ndelay_time = -0.1").is_err());
        assert!(Config::from_toml("[render]\nimage_width = 0").is_err());
        assert!(Config::from_toml("[render]\ncolormap = \"rainbow\"").is_err());
    }

    #[test]
    fn delay_rounds_to_whole_centiseconds() {
        let err = Config::from_toml("[output]\ndelay_time = 0.004").unwrap_err();
        assert!(err.to_string().contains("centiseconds"));

        let still = Config::from_toml("[output]\ndelay_time = 0.0").unwrap();
        assert_eq!(still.output.delay_ms(), 0);

        let odd = Config::from_toml("[output]\ndelay_time = 0.123").unwrap();
        assert_eq!(odd.output.delay_ms(), 120);
    }

    #[test]
    fn snapshot_name_encodes_sampled_time() {
        let output = OutputConfig::default();
        assert_eq!(
            output.snapshot_path(200.0 / 99.0),
            PathBuf::from("output/standing_wave_snapshot_t2.02.png")
        );
        assert!(output.pause().is_none());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Config::from_file("/nonexistent/wave.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/wave.toml"));
    }
}
