//! Bessel-mode standing wave rendered as an animated 3D surface.
//!
//! The field `amplitude * J0(k r) * cos(c k t)` is evaluated over a 2D grid for
//! every time sample, drawn as a shaded surface with fixed axes and colour
//! scale, and written out as a looping GIF plus one high-resolution PNG still.

pub mod bessel;
pub mod config;
pub mod export;
pub mod grid;
pub mod simulation;
pub mod timeline;
pub mod visualisation;
pub mod wavefield;

pub use config::Config;
pub use export::{ExportSummary, Exporter};
pub use simulation::Simulation;
