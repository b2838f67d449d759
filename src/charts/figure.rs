//! Figure model: what a chart contains, independent of how it is drawn.
//!
//! A [`Figure`] is a grid of [`Panel`]s; each panel is a stack of [`Layer`]s
//! drawn in order onto shared axes. Axis ranges left unset are derived from
//! the layers with a small margin.

use plotters::style::RGBColor;

use super::colormap::{palette, BLACK};
use crate::data::min_max;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Square,
    Triangle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridMode {
    Both,
    YOnly,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendPosition {
    UpperLeft,
    UpperRight,
    LowerLeft,
    LowerRight,
}

/// Filled outline in data coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle { center: (f64, f64), radius: f64 },
    Rect { corner: (f64, f64), width: f64, height: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    Scatter {
        points: Vec<(f64, f64)>,
        marker: Marker,
        size: u32,
    },
    Line {
        points: Vec<(f64, f64)>,
        style: LineStyle,
        width: u32,
        markers: bool,
    },
    HLine {
        y: f64,
        style: LineStyle,
        width: u32,
    },
    Bars {
        centers: Vec<f64>,
        heights: Vec<f64>,
        width: f64,
        colors: Option<Vec<RGBColor>>,
        errors: Option<Vec<f64>>,
        value_labels: Option<Vec<String>>,
    },
    ErrorBars {
        points: Vec<(f64, f64)>,
        errors: Vec<f64>,
        marker: Marker,
        size: u32,
    },
    BoxPlot {
        groups: Vec<(f64, Vec<f64>)>,
        width: f64,
    },
    ColorScatter {
        points: Vec<(f64, f64)>,
        values: Vec<f64>,
        size: u32,
    },
    Shape(Shape),
    Text {
        at: (f64, f64),
        text: String,
        offset: (i32, i32),
        size: f64,
    },
}

/// One drawable element of a panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub kind: LayerKind,
    pub color: RGBColor,
    pub alpha: f64,
    pub label: Option<String>,
}

impl Layer {
    fn of(kind: LayerKind, color: RGBColor) -> Self {
        Self {
            kind,
            color,
            alpha: 1.0,
            label: None,
        }
    }

    pub fn scatter(points: Vec<(f64, f64)>, color: RGBColor) -> Self {
        Self::of(
            LayerKind::Scatter {
                points,
                marker: Marker::Circle,
                size: 5,
            },
            color,
        )
    }

    pub fn line(points: Vec<(f64, f64)>, color: RGBColor, style: LineStyle) -> Self {
        Self::of(
            LayerKind::Line {
                points,
                style,
                width: 2,
                markers: false,
            },
            color,
        )
    }

    /// Horizontal reference line spanning the whole x range.
    pub fn hline(y: f64, color: RGBColor, style: LineStyle) -> Self {
        Self::of(
            LayerKind::HLine {
                y,
                style,
                width: 2,
            },
            color,
        )
    }

    pub fn bars(centers: Vec<f64>, heights: Vec<f64>, width: f64, color: RGBColor) -> Self {
        Self::of(
            LayerKind::Bars {
                centers,
                heights,
                width,
                colors: None,
                errors: None,
                value_labels: None,
            },
            color,
        )
    }

    /// Points with symmetric vertical error bars.
    pub fn error_bars(points: Vec<(f64, f64)>, errors: Vec<f64>, color: RGBColor) -> Self {
        Self::of(
            LayerKind::ErrorBars {
                points,
                errors,
                marker: Marker::Circle,
                size: 5,
            },
            color,
        )
    }

    pub fn boxplot(groups: Vec<(f64, Vec<f64>)>, width: f64, color: RGBColor) -> Self {
        Self::of(LayerKind::BoxPlot { groups, width }, color)
    }

    /// Points coloured by `values` through the panel's colour bar range.
    pub fn color_scatter(points: Vec<(f64, f64)>, values: Vec<f64>) -> Self {
        Self::of(
            LayerKind::ColorScatter {
                points,
                values,
                size: 7,
            },
            BLACK,
        )
    }

    pub fn shape(shape: Shape, color: RGBColor) -> Self {
        Self::of(LayerKind::Shape(shape), color)
    }

    pub fn text(at: (f64, f64), text: impl Into<String>) -> Self {
        Self::of(
            LayerKind::Text {
                at,
                text: text.into(),
                offset: (0, 0),
                size: 9.0,
            },
            BLACK,
        )
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    pub fn color(mut self, color: RGBColor) -> Self {
        self.color = color;
        self
    }

    /// Marker size in pixels for point layers, font size in points for text.
    pub fn size(mut self, value: u32) -> Self {
        match &mut self.kind {
            LayerKind::Scatter { size, .. }
            | LayerKind::ErrorBars { size, .. }
            | LayerKind::ColorScatter { size, .. } => *size = value,
            LayerKind::Text { size, .. } => *size = value as f64,
            _ => {}
        }
        self
    }

    pub fn marker(mut self, value: Marker) -> Self {
        match &mut self.kind {
            LayerKind::Scatter { marker, .. } | LayerKind::ErrorBars { marker, .. } => {
                *marker = value
            }
            _ => {}
        }
        self
    }

    /// Stroke width for line layers.
    pub fn width(mut self, value: u32) -> Self {
        match &mut self.kind {
            LayerKind::Line { width, .. } | LayerKind::HLine { width, .. } => *width = value,
            _ => {}
        }
        self
    }

    /// Draw a marker at every vertex of a line.
    pub fn with_markers(mut self) -> Self {
        if let LayerKind::Line { markers, .. } = &mut self.kind {
            *markers = true;
        }
        self
    }

    /// Per-bar colours; missing entries fall back to the layer colour.
    pub fn with_colors(mut self, values: Vec<RGBColor>) -> Self {
        if let LayerKind::Bars { colors, .. } = &mut self.kind {
            *colors = Some(values);
        }
        self
    }

    pub fn with_errors(mut self, values: Vec<f64>) -> Self {
        if let LayerKind::Bars { errors, .. } = &mut self.kind {
            *errors = Some(values);
        }
        self
    }

    /// Text printed above each bar.
    pub fn with_value_labels(mut self, values: Vec<String>) -> Self {
        if let LayerKind::Bars { value_labels, .. } = &mut self.kind {
            *value_labels = Some(values);
        }
        self
    }

    /// Offset of a text annotation from its anchor, in points (y grows downward).
    pub fn offset(mut self, dx: i32, dy: i32) -> Self {
        if let LayerKind::Text { offset, .. } = &mut self.kind {
            *offset = (dx, dy);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        match &self.kind {
            LayerKind::Scatter { points, .. }
            | LayerKind::Line { points, .. }
            | LayerKind::ErrorBars { points, .. }
            | LayerKind::ColorScatter { points, .. } => points.is_empty(),
            LayerKind::Bars { centers, .. } => centers.is_empty(),
            LayerKind::BoxPlot { groups, .. } => groups.is_empty(),
            LayerKind::HLine { .. } | LayerKind::Shape(_) | LayerKind::Text { .. } => false,
        }
    }

    /// Data extents this layer needs to be visible: `(xs, ys)`.
    fn extents(&self) -> (Vec<f64>, Vec<f64>) {
        let split = |points: &[(f64, f64)]| -> (Vec<f64>, Vec<f64>) { points.iter().copied().unzip() };
        match &self.kind {
            LayerKind::Scatter { points, .. }
            | LayerKind::Line { points, .. }
            | LayerKind::ColorScatter { points, .. } => split(points),
            LayerKind::HLine { y, .. } => (Vec::new(), vec![*y]),
            LayerKind::Bars {
                centers,
                heights,
                width,
                errors,
                ..
            } => {
                let mut xs = Vec::with_capacity(centers.len() * 2);
                for c in centers {
                    xs.push(c - width / 2.0);
                    xs.push(c + width / 2.0);
                }
                let mut ys = vec![0.0];
                for (i, h) in heights.iter().enumerate() {
                    let e = errors
                        .as_ref()
                        .and_then(|e| e.get(i))
                        .copied()
                        .unwrap_or(0.0);
                    ys.push(h + e);
                    ys.push(h - e);
                }
                (xs, ys)
            }
            LayerKind::ErrorBars { points, errors, .. } => {
                let xs = points.iter().map(|p| p.0).collect();
                let mut ys = Vec::with_capacity(points.len() * 2);
                for (i, (_, y)) in points.iter().enumerate() {
                    let e = errors.get(i).copied().unwrap_or(0.0);
                    ys.push(y - e);
                    ys.push(y + e);
                }
                (xs, ys)
            }
            LayerKind::BoxPlot { groups, width } => {
                let mut xs = Vec::new();
                let mut ys = Vec::new();
                for (pos, values) in groups {
                    xs.push(pos - width / 2.0);
                    xs.push(pos + width / 2.0);
                    ys.extend(values.iter().copied());
                }
                (xs, ys)
            }
            LayerKind::Shape(Shape::Circle { center, radius }) => (
                vec![center.0 - radius, center.0 + radius],
                vec![center.1 - radius, center.1 + radius],
            ),
            LayerKind::Shape(Shape::Rect {
                corner,
                width,
                height,
            }) => (
                vec![corner.0, corner.0 + width],
                vec![corner.1, corner.1 + height],
            ),
            LayerKind::Text { at, .. } => (vec![at.0], vec![at.1]),
        }
    }
}

/// Colour bar attached to a panel, mapping values onto the diverging map.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorBar {
    pub label: String,
    pub range: Option<(f64, f64)>,
}

/// One set of axes.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_range: Option<(f64, f64)>,
    pub y_range: Option<(f64, f64)>,
    pub grid: GridMode,
    pub categories: Option<Vec<String>>,
    pub legend: Option<LegendPosition>,
    pub colorbar: Option<ColorBar>,
    pub layers: Vec<Layer>,
}

impl Panel {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: String::new(),
            y_label: String::new(),
            x_range: None,
            y_range: None,
            grid: GridMode::Both,
            categories: None,
            legend: Some(LegendPosition::UpperLeft),
            colorbar: None,
            layers: Vec::new(),
        }
    }

    pub fn x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = label.into();
        self
    }

    pub fn y_label(mut self, label: impl Into<String>) -> Self {
        self.y_label = label.into();
        self
    }

    pub fn x_range(mut self, lo: f64, hi: f64) -> Self {
        self.x_range = Some((lo, hi));
        self
    }

    pub fn y_range(mut self, lo: f64, hi: f64) -> Self {
        self.y_range = Some((lo, hi));
        self
    }

    pub fn grid(mut self, grid: GridMode) -> Self {
        self.grid = grid;
        self
    }

    /// Label integer x positions `0..n` with these names.
    pub fn categories<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.categories = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn legend(mut self, position: LegendPosition) -> Self {
        self.legend = Some(position);
        self
    }

    pub fn no_legend(mut self) -> Self {
        self.legend = None;
        self
    }

    pub fn colorbar(mut self, label: impl Into<String>, range: Option<(f64, f64)>) -> Self {
        self.colorbar = Some(ColorBar {
            label: label.into(),
            range,
        });
        self
    }

    pub fn layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn push(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// Scatter with the next default colour.
    pub fn series(self, points: Vec<(f64, f64)>, label: impl Into<String>) -> Self {
        let color = palette(self.layers.len());
        self.layer(Layer::scatter(points, color).label(label))
    }

    pub fn has_legend_entries(&self) -> bool {
        self.layers.iter().any(|l| l.label.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(Layer::is_empty)
    }

    /// Value range of colour-mapped layers, or the colour bar's fixed range.
    pub fn color_range(&self) -> Option<(f64, f64)> {
        if let Some(range) = self.colorbar.as_ref().and_then(|c| c.range) {
            return Some(range);
        }
        let values: Vec<f64> = self
            .layers
            .iter()
            .filter_map(|l| match &l.kind {
                LayerKind::ColorScatter { values, .. } => Some(values.iter().copied()),
                _ => None,
            })
            .flatten()
            .collect();
        min_max(&values)
    }

    /// Axis ranges to draw: fixed ones as given, the rest fitted to the layers
    /// with a 5% margin.
    pub fn bounds(&self) -> ((f64, f64), (f64, f64)) {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for layer in &self.layers {
            let (lx, ly) = layer.extents();
            xs.extend(lx);
            ys.extend(ly);
        }

        let x = self.x_range.unwrap_or_else(|| match &self.categories {
            Some(names) if !names.is_empty() => (-0.5, names.len() as f64 - 0.5),
            _ => padded(min_max(&xs)),
        });
        let y = self.y_range.unwrap_or_else(|| {
            let (lo, hi) = padded(min_max(&ys));
            if self.has_value_labels() {
                (lo, hi + (hi - lo) * 0.08)
            } else {
                (lo, hi)
            }
        });
        (x, y)
    }

    fn has_value_labels(&self) -> bool {
        self.layers.iter().any(|l| {
            matches!(
                l.kind,
                LayerKind::Bars {
                    value_labels: Some(_),
                    ..
                }
            )
        })
    }
}

fn padded(range: Option<(f64, f64)>) -> (f64, f64) {
    match range {
        None => (0.0, 1.0),
        Some((lo, hi)) if hi <= lo => {
            let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.05 };
            (lo - pad, hi + pad)
        }
        Some((lo, hi)) => {
            let pad = (hi - lo) * 0.05;
            (lo - pad, hi + pad)
        }
    }
}

/// A whole image: optional title over a `rows × cols` grid of panels.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: Option<String>,
    /// Width and height in inches.
    pub size: (f64, f64),
    pub rows: usize,
    pub cols: usize,
    pub panels: Vec<Panel>,
}

impl Figure {
    pub fn single(size: (f64, f64), panel: Panel) -> Self {
        Self {
            title: None,
            size,
            rows: 1,
            cols: 1,
            panels: vec![panel],
        }
    }

    pub fn grid(size: (f64, f64), rows: usize, cols: usize, panels: Vec<Panel>) -> Self {
        Self {
            title: None,
            size,
            rows,
            cols,
            panels,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Pixel dimensions at the given resolution.
    pub fn pixel_size(&self, dpi: f64) -> (u32, u32) {
        let px = |inches: f64| ((inches * dpi).round() as u32).max(1);
        (px(self.size.0), px(self.size.1))
    }

    /// No panels, or some panel with nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.panels.is_empty() || self.panels.iter().any(Panel::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_pad_data_extent() {
        let panel = Panel::new("t").layer(Layer::scatter(vec![(0.0, 0.0), (10.0, 20.0)], BLACK));
        let ((x0, x1), (y0, y1)) = panel.bounds();
        assert!((x0 + 0.5).abs() < 1e-12 && (x1 - 10.5).abs() < 1e-12);
        assert!((y0 + 1.0).abs() < 1e-12 && (y1 - 21.0).abs() < 1e-12);
    }

    #[test]
    fn fixed_ranges_win() {
        let panel = Panel::new("t")
            .x_range(0.0, 25.0)
            .y_range(1.8, 2.1)
            .layer(Layer::scatter(vec![(5.0, 1.9)], BLACK));
        assert_eq!(panel.bounds(), ((0.0, 25.0), (1.8, 2.1)));
    }

    #[test]
    fn categorical_axis_centres_bars() {
        let panel = Panel::new("t")
            .categories(["R1", "R2", "R3"])
            .layer(Layer::bars(vec![0.0, 1.0, 2.0], vec![1.0, 2.0, 3.0], 0.8, BLACK));
        let ((x0, x1), (y0, _)) = panel.bounds();
        assert_eq!((x0, x1), (-0.5, 2.5));
        assert!(y0 < 0.0);
    }

    #[test]
    fn constant_data_still_has_extent() {
        let panel = Panel::new("t").layer(Layer::hline(0.05, BLACK, LineStyle::Dashed));
        let (_, (y0, y1)) = panel.bounds();
        assert!(y1 > y0);
    }

    #[test]
    fn empty_layers_make_empty_figure() {
        let fig = Figure::single((8.0, 6.0), Panel::new("t"));
        assert!(fig.is_empty());
        let fig = Figure::single(
            (8.0, 6.0),
            Panel::new("t").layer(Layer::scatter(Vec::new(), BLACK)),
        );
        assert!(fig.is_empty());
        let fig = Figure::grid((8.0, 6.0), 1, 1, Vec::new());
        assert!(fig.is_empty());
    }

    #[test]
    fn pixel_size_scales_with_dpi() {
        let fig = Figure::single((10.0, 6.0), Panel::new("t"));
        assert_eq!(fig.pixel_size(150.0), (1500, 900));
        assert_eq!(fig.pixel_size(100.0), (1000, 600));
    }

    #[test]
    fn builders_only_touch_matching_kinds() {
        let l = Layer::line(vec![(0.0, 0.0)], BLACK, LineStyle::Solid).size(12);
        assert_eq!(l.kind, Layer::line(vec![(0.0, 0.0)], BLACK, LineStyle::Solid).kind);
        let b = Layer::bars(vec![0.0], vec![1.0], 0.5, BLACK).with_errors(vec![0.1]);
        assert!(matches!(b.kind, LayerKind::Bars { errors: Some(_), .. }));
    }

    #[test]
    fn color_range_from_values() {
        let panel = Panel::new("t")
            .colorbar("Potencial (V)", None)
            .layer(Layer::color_scatter(vec![(0.0, 0.0), (1.0, 1.0)], vec![-0.2, 0.5]));
        assert_eq!(panel.color_range(), Some((-0.2, 0.5)));
    }
}
