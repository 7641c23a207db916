use crate::config::Config;
use crate::export::{ExportSummary, Exporter};
use crate::grid::Grid;
use crate::timeline::Timeline;
use crate::visualisation::SurfaceVisualiser;
use crate::wavefield::{ColorRange, FieldTensor, StandingWave};
use anyhow::Result;
use tracing::{info, warn};

/// Everything computed up front: grid, time samples, the wave and its tensor.
pub struct Simulation {
    pub config: Config,
    pub grid: Grid,
    pub timeline: Timeline,
    pub wave: StandingWave,
    pub field: FieldTensor,
    pub range: ColorRange,
}

impl Simulation {
    /// Validate the configuration and evaluate the full field tensor.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let domain = &config.domain;
        let grid = Grid::new(domain.nx, domain.ny, domain.lx, domain.ly)?;
        let timeline = Timeline::new(config.time.nt, config.time.tmax)?;
        let wave = StandingWave::new(&grid, config.wave.c, config.wave.k, config.wave.amplitude);

        info!(
            "Evaluating field on {}x{} grid for {} time samples",
            grid.nx,
            grid.ny,
            timeline.len()
        );
        let field = FieldTensor::compute(&wave, &timeline);
        let bad = field.non_finite_count();
        if bad > 0 {
            warn!(count = bad, "Field contains non-finite values");
        }

        let range = ColorRange::resolve(&field, config.render.manual_range())?;
        info!("Height/colour range [{:.4}, {:.4}]", range.min, range.max);

        Ok(Self {
            config,
            grid,
            timeline,
            wave,
            field,
            range,
        })
    }

    /// Render every time sample and write the animation and snapshot.
    pub fn run_with_visualisation(&self) -> Result<ExportSummary> {
        let mut visualiser = SurfaceVisualiser::new(&self.grid, self.range, &self.config.render);
        visualiser.set_title(format!(
            "J0 standing wave, k = {:.3}, c = {}",
            self.wave.k, self.wave.c
        ));

        let exporter = Exporter::new(
            self.config.output.clone(),
            &self.timeline,
            self.config.time.snapshot_time,
            self.config.render.snapshot_scale(),
        );
        info!(
            "Rendering {} frames (nominal step {:.4} s, spacing {:.4} s)",
            self.timeline.len(),
            self.timeline.nominal_step(),
            self.timeline.spacing()
        );

        exporter.run(&mut visualiser, &self.timeline, |n| self.field.slice(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> Config {
        let mut config = Config::default();
        config.domain.nx = 9;
        config.domain.ny = 7;
        config.time.nt = 6;
        config
    }

    #[test]
    fn new_builds_consistent_shapes() {
        let sim = Simulation::new(small_config()).unwrap();
        assert_eq!(sim.field.dim(), (7, 9, 6));
        assert_eq!(sim.wave.radius().dim(), (7, 9));
        assert_eq!(sim.timeline.len(), 6);
    }

    #[test]
    fn manual_range_overrides_field_extent() {
        let mut config = small_config();
        config.render.z_min = Some(-5.0);
        config.render.z_max = Some(0.5);
        let sim = Simulation::new(config).unwrap();
        assert_eq!(sim.range, ColorRange { min: -5.0, max: 0.5 });
    }

    #[test]
    fn invalid_parameters_fail_before_computation() {
        let mut config = small_config();
        config.time.nt = 0;
        let err = Simulation::new(config).err().unwrap();
        assert!(err.to_string().contains("nt"));
    }
}
