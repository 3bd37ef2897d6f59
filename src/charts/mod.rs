//! Charts module - Chart rendering

pub mod palette;
mod plotter;
mod renderer;

pub use plotter::{ChartKind, ChartPlotter, CHART_HEIGHT};
pub use renderer::{RenderError, StaticChartRenderer, DEFAULT_HEIGHT, DEFAULT_WIDTH};
