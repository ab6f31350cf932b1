mod aggregate;
mod chart;
mod order;

pub use aggregate::{Aggregation, Panel, PlotMode, Series, SCALING_LABEL};
pub use chart::{
    ideal_curve, render_svg_file, render_svg_string, ChartLayout, ChartOptions, DEFAULT_HEIGHT,
    DEFAULT_WIDTH,
};
pub use order::{ordered, ordered_by, CANONICAL_BACKENDS, CANONICAL_MODELS, CANONICAL_SCALING_MODELS};
