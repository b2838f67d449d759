//! Charts module - Figure model and PNG rendering

pub mod colormap;
mod figure;
mod renderer;

pub use figure::{
    ColorBar, Figure, GridMode, Layer, LayerKind, LegendPosition, LineStyle, Marker, Panel, Shape,
};
pub use renderer::{ChartError, StaticChartRenderer};
