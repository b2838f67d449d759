//! Static Chart Renderer
//! Draws a [`Figure`] into an RGB buffer with plotters and writes it as PNG.
//!
//! Layout:
//! 1. Optional figure title centred on top
//! 2. Panels split evenly over the `rows × cols` grid
//! 3. Per panel: caption, mesh, layers in order, legend, optional colour bar

use std::error::Error;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageBuffer, ImageError, ImageFormat, Rgb};
use plotters::chart::SeriesAnno;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use thiserror::Error;

use super::colormap::{self, rdbu_r_between};
use super::figure::{
    ColorBar, Figure, GridMode, Layer, LayerKind, LegendPosition, LineStyle, Marker, Panel, Shape,
};
use crate::stats::StatsCalculator;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Nothing to draw for {0}")]
    EmptyFigure(PathBuf),
    #[error("Plot error: {0}")]
    Plot(String),
    #[error("Image encoding error: {0}")]
    Image(#[from] ImageError),
}

impl<E: Error + Send + Sync + 'static> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        ChartError::Plot(err.to_string())
    }
}

type Area<'b> = DrawingArea<BitMapBackend<'b>, Shift>;
type Chart<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

// Sizes in points, converted with the renderer's DPI
const FIGURE_TITLE_PT: f64 = 15.0;
const PANEL_TITLE_PT: f64 = 12.0;
const AXIS_DESC_PT: f64 = 10.5;
const TICK_PT: f64 = 9.0;
const LEGEND_PT: f64 = 8.5;
const LEFT_AREA_PT: f64 = 52.0;
const BOTTOM_AREA_PT: f64 = 38.0;
const COLORBAR_PT: f64 = 70.0;

/// Renders figures at a fixed resolution and font.
#[derive(Debug, Clone)]
pub struct StaticChartRenderer {
    dpi: f64,
    font: String,
}

impl Default for StaticChartRenderer {
    fn default() -> Self {
        Self::new(150.0, "sans-serif")
    }
}

impl StaticChartRenderer {
    pub fn new(dpi: f64, font: impl Into<String>) -> Self {
        Self {
            dpi: if dpi > 0.0 { dpi } else { 150.0 },
            font: font.into(),
        }
    }

    pub fn dpi(&self) -> f64 {
        self.dpi
    }

    /// Render `figure` and write it to `path`, creating parent directories.
    /// Prints the confirmation line on success.
    pub fn save(&self, figure: &Figure, path: &Path) -> Result<PathBuf, ChartError> {
        if figure.is_empty() {
            return Err(ChartError::EmptyFigure(path.to_path_buf()));
        }
        let png = self.render_png(figure)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ChartError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, &png).map_err(|source| ChartError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        println!("[OK] Grafica guardada: {}", path.display());
        log::debug!("wrote {} byte chart to {}", png.len(), path.display());
        Ok(path.to_path_buf())
    }

    /// Render `figure` to PNG bytes in memory.
    pub fn render_png(&self, figure: &Figure) -> Result<Vec<u8>, ChartError> {
        if figure.is_empty() {
            return Err(ChartError::EmptyFigure(PathBuf::new()));
        }
        let (width, height) = figure.pixel_size(self.dpi);
        let buffer = self.render_rgb(figure, width, height)?;
        encode_png(buffer, width, height)
    }

    fn render_rgb(&self, figure: &Figure, width: u32, height: u32) -> Result<Vec<u8>, ChartError> {
        let mut buffer = vec![0u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE)?;

            let body = match &figure.title {
                Some(title) => root.titled(
                    &single_line(title),
                    (self.font.as_str(), self.px_f(FIGURE_TITLE_PT), FontStyle::Bold)
                        .into_font()
                        .color(&BLACK),
                )?,
                None => root.clone(),
            };

            let cells = body.split_evenly((figure.rows.max(1), figure.cols.max(1)));
            if figure.panels.len() > cells.len() {
                log::warn!(
                    "figure grid {}x{} holds {} of {} panels",
                    figure.rows,
                    figure.cols,
                    cells.len(),
                    figure.panels.len()
                );
            }
            for (panel, cell) in figure.panels.iter().zip(cells.iter()) {
                self.draw_panel(cell, panel)?;
            }
            root.present()?;
        }
        Ok(buffer)
    }

    fn draw_panel(&self, area: &Area<'_>, panel: &Panel) -> Result<(), ChartError> {
        let area = area.margin(self.px(4.0), self.px(4.0), self.px(4.0), self.px(4.0));
        let color_range = panel.color_range().unwrap_or((0.0, 1.0));

        let (plot_area, bar_area) = match &panel.colorbar {
            Some(bar) => {
                let width = area.dim_in_pixel().0;
                let split = width.saturating_sub(self.px(COLORBAR_PT));
                let (left, right) = area.split_horizontally(split);
                (left, Some((right, bar)))
            }
            None => (area, None),
        };

        let ((x0, x1), (y0, y1)) = panel.bounds();
        let mut builder = ChartBuilder::on(&plot_area);
        builder
            .margin(self.px(6.0))
            .set_label_area_size(LabelAreaPosition::Left, self.px(LEFT_AREA_PT))
            .set_label_area_size(LabelAreaPosition::Bottom, self.px(BOTTOM_AREA_PT));
        if !panel.title.is_empty() {
            builder.caption(
                single_line(&panel.title),
                (self.font.as_str(), self.px_f(PANEL_TITLE_PT), FontStyle::Bold)
                    .into_font()
                    .color(&BLACK),
            );
        }
        let mut chart = builder.build_cartesian_2d(x0..x1, y0..y1)?;

        self.draw_mesh(&mut chart, panel)?;
        for layer in &panel.layers {
            self.draw_layer(&mut chart, layer, (x0, x1), color_range)?;
        }

        if let Some(position) = panel.legend.filter(|_| panel.has_legend_entries()) {
            chart
                .configure_series_labels()
                .position(legend_position(position))
                .margin(self.px(5.0))
                .label_font(self.text_style(LEGEND_PT))
                .background_style(&WHITE.mix(0.85))
                .border_style(&BLACK.mix(0.3))
                .draw()?;
        }

        if let Some((bar_area, bar)) = bar_area {
            self.draw_colorbar(&bar_area, bar, color_range)?;
        }
        Ok(())
    }

    fn draw_mesh(&self, chart: &mut Chart<'_, '_>, panel: &Panel) -> Result<(), ChartError> {
        let categories = panel.categories.clone().unwrap_or_default();
        let category_label = |v: &f64| {
            let idx = v.round();
            if (v - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            categories
                .get(idx as usize)
                .map(|s| single_line(s))
                .unwrap_or_default()
        };

        let mut mesh = chart.configure_mesh();
        mesh.x_desc(panel.x_label.as_str())
            .y_desc(panel.y_label.as_str())
            .label_style(self.text_style(TICK_PT))
            .axis_desc_style(self.text_style(AXIS_DESC_PT))
            .bold_line_style(&colormap::LIGHT_GRAY.mix(0.7))
            .light_line_style(&TRANSPARENT);

        match panel.grid {
            GridMode::Both => {}
            GridMode::YOnly => {
                mesh.disable_x_mesh();
            }
            GridMode::Off => {
                mesh.disable_x_mesh().disable_y_mesh();
            }
        }
        if !categories.is_empty() {
            mesh.x_labels(categories.len() + 1)
                .x_label_formatter(&category_label);
        }
        mesh.draw()?;
        Ok(())
    }

    fn draw_layer<'a, 'b: 'a>(
        &self,
        chart: &mut Chart<'a, 'b>,
        layer: &Layer,
        x_span: (f64, f64),
        color_range: (f64, f64),
    ) -> Result<(), ChartError> {
        let style = ShapeStyle {
            color: layer.color.mix(layer.alpha),
            filled: false,
            stroke_width: 1,
        };

        match &layer.kind {
            LayerKind::Scatter {
                points,
                marker,
                size,
            } => {
                let anno = self.draw_markers(chart, points, *marker, *size, style.filled())?;
                annotate(anno, &layer.label, Glyph::Marker, style);
            }
            LayerKind::Line {
                points,
                style: line_style,
                width,
                markers,
            } => {
                let stroke = style.stroke_width(self.px(*width as f64 * 0.75));
                let anno = self.draw_path(chart, points.clone(), *line_style, stroke)?;
                annotate(anno, &layer.label, Glyph::Line(*line_style), stroke);
                if *markers {
                    self.draw_markers(chart, points, Marker::Circle, 4, style.filled())?;
                }
            }
            LayerKind::HLine {
                y,
                style: line_style,
                width,
            } => {
                let stroke = style.stroke_width(self.px(*width as f64 * 0.75));
                let points = vec![(x_span.0, *y), (x_span.1, *y)];
                let anno = self.draw_path(chart, points, *line_style, stroke)?;
                annotate(anno, &layer.label, Glyph::Line(*line_style), stroke);
            }
            LayerKind::Bars {
                centers,
                heights,
                width,
                colors,
                errors,
                value_labels,
            } => {
                let fill_of = |i: usize| {
                    let c = colors
                        .as_ref()
                        .and_then(|c| c.get(i))
                        .copied()
                        .unwrap_or(layer.color);
                    c.mix(layer.alpha).filled()
                };
                let bars: Vec<_> = centers
                    .iter()
                    .zip(heights)
                    .enumerate()
                    .map(|(i, (c, h))| {
                        Rectangle::new([(c - width / 2.0, 0.0), (c + width / 2.0, *h)], fill_of(i))
                    })
                    .collect();
                let anno = chart.draw_series(bars)?;
                annotate(anno, &layer.label, Glyph::Block, style.filled());
                chart.draw_series(centers.iter().zip(heights).map(|(c, h)| {
                    Rectangle::new(
                        [(c - width / 2.0, 0.0), (c + width / 2.0, *h)],
                        BLACK.mix(0.8).stroke_width(1),
                    )
                }))?;

                if let Some(errors) = errors {
                    let cap = self.px(4.0);
                    let stroke = BLACK.stroke_width(self.px(1.0));
                    chart.draw_series(centers.iter().zip(heights).zip(errors).map(
                        |((c, h), e)| ErrorBar::new_vertical(*c, h - e, *h, h + e, stroke, cap),
                    ))?;
                }

                if let Some(labels) = value_labels {
                    let text = self
                        .text_style(TICK_PT * 0.9)
                        .pos(Pos::new(HPos::Center, VPos::Bottom));
                    let top = |i: usize, h: f64| {
                        let e = errors.as_ref().and_then(|e| e.get(i)).copied().unwrap_or(0.0);
                        if h >= 0.0 {
                            h + e
                        } else {
                            h
                        }
                    };
                    let gap = -(self.px(2.0) as i32);
                    chart.draw_series(centers.iter().zip(heights).zip(labels).enumerate().map(
                        |(i, ((c, h), label))| {
                            EmptyElement::at((*c, top(i, *h)))
                                + Text::new(label.clone(), (0, gap), text.clone())
                        },
                    ))?;
                }
            }
            LayerKind::ErrorBars {
                points,
                errors,
                marker,
                size,
            } => {
                let cap = self.px(5.0);
                let stroke = style.stroke_width(self.px(1.2));
                chart.draw_series(points.iter().zip(errors).map(|((x, y), e)| {
                    ErrorBar::new_vertical(*x, y - e, *y, y + e, stroke, cap)
                }))?;
                let anno = self.draw_markers(chart, points, *marker, *size, style.filled())?;
                annotate(anno, &layer.label, Glyph::Marker, style);
            }
            LayerKind::BoxPlot { groups, width } => {
                self.draw_boxes(chart, groups, *width, layer)?;
            }
            LayerKind::ColorScatter {
                points,
                values,
                size,
            } => {
                let (lo, hi) = color_range;
                let radius = self.px(*size as f64 * 0.75);
                chart.draw_series(points.iter().zip(values).map(|(p, v)| {
                    Circle::new(*p, radius, rdbu_r_between(*v, lo, hi).filled())
                }))?;
                let anno = chart.draw_series(
                    points
                        .iter()
                        .map(|p| Circle::new(*p, radius, BLACK.stroke_width(1))),
                )?;
                annotate(anno, &layer.label, Glyph::Marker, BLACK.stroke_width(1));
            }
            LayerKind::Shape(shape) => {
                let fill = layer.color.mix(layer.alpha).filled();
                let anno = match shape {
                    Shape::Circle { center, radius } => {
                        chart.draw_series(std::iter::once(Polygon::new(
                            circle_outline(*center, *radius),
                            fill,
                        )))?
                    }
                    Shape::Rect {
                        corner,
                        width,
                        height,
                    } => chart.draw_series(std::iter::once(Rectangle::new(
                        [*corner, (corner.0 + width, corner.1 + height)],
                        fill,
                    )))?,
                };
                annotate(anno, &layer.label, Glyph::Block, fill);
            }
            LayerKind::Text {
                at,
                text,
                offset,
                size,
            } => {
                let font = self
                    .text_style(*size)
                    .pos(Pos::new(HPos::Left, VPos::Center));
                let offset = (
                    (offset.0 as f64 * self.dpi / 72.0).round() as i32,
                    (offset.1 as f64 * self.dpi / 72.0).round() as i32,
                );
                chart.draw_series(std::iter::once(
                    EmptyElement::at(*at) + Text::new(single_line(text), offset, font),
                ))?;
            }
        }
        Ok(())
    }

    fn draw_markers<'a, 'b, 'c>(
        &self,
        chart: &'c mut Chart<'a, 'b>,
        points: &[(f64, f64)],
        marker: Marker,
        size: u32,
        style: ShapeStyle,
    ) -> Result<&'c mut SeriesAnno<'a, BitMapBackend<'b>>, ChartError> {
        let r = self.px(size as f64 * 0.75) as i32;
        let anno = match marker {
            Marker::Circle => {
                chart.draw_series(points.iter().map(|p| Circle::new(*p, r as u32, style)))?
            }
            Marker::Square => chart.draw_series(
                points
                    .iter()
                    .map(|p| EmptyElement::at(*p) + Rectangle::new([(-r, -r), (r, r)], style)),
            )?,
            Marker::Triangle => chart.draw_series(
                points
                    .iter()
                    .map(|p| TriangleMarker::new(*p, r + r / 3, style)),
            )?,
        };
        Ok(anno)
    }

    fn draw_path<'a, 'b, 'c>(
        &self,
        chart: &'c mut Chart<'a, 'b>,
        points: Vec<(f64, f64)>,
        line_style: LineStyle,
        stroke: ShapeStyle,
    ) -> Result<&'c mut SeriesAnno<'a, BitMapBackend<'b>>, ChartError> {
        let anno = match line_style {
            LineStyle::Solid => chart.draw_series(LineSeries::new(points, stroke))?,
            LineStyle::Dashed => chart.draw_series(DashedLineSeries::new(
                points,
                self.px(6.0),
                self.px(3.5),
                stroke,
            ))?,
            LineStyle::Dotted => chart.draw_series(DashedLineSeries::new(
                points,
                self.px(1.5),
                self.px(3.0),
                stroke,
            ))?,
        };
        Ok(anno)
    }

    fn draw_boxes(
        &self,
        chart: &mut Chart<'_, '_>,
        groups: &[(f64, Vec<f64>)],
        width: f64,
        layer: &Layer,
    ) -> Result<(), ChartError> {
        let fill = layer.color.mix(layer.alpha.min(0.7)).filled();
        let edge = BLACK.stroke_width(self.px(1.0));
        let median_style = colormap::DARK_RED.stroke_width(self.px(1.5));
        let half = width / 2.0;

        for (pos, values) in groups {
            let Some(spread) = BoxSpread::of(values) else {
                continue;
            };
            let (left, right) = (pos - half, pos + half);
            chart.draw_series(std::iter::once(Rectangle::new(
                [(left, spread.q1), (right, spread.q3)],
                fill,
            )))?;
            chart.draw_series(std::iter::once(Rectangle::new(
                [(left, spread.q1), (right, spread.q3)],
                edge,
            )))?;
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(left, spread.median), (right, spread.median)],
                median_style,
            )))?;

            let cap = half / 2.0;
            let whiskers = [
                vec![(*pos, spread.q1), (*pos, spread.low)],
                vec![(*pos, spread.q3), (*pos, spread.high)],
                vec![(pos - cap, spread.low), (pos + cap, spread.low)],
                vec![(pos - cap, spread.high), (pos + cap, spread.high)],
            ];
            chart.draw_series(whiskers.into_iter().map(|w| PathElement::new(w, edge)))?;

            let r = self.px(3.0);
            chart.draw_series(
                spread
                    .outliers
                    .iter()
                    .map(|y| Circle::new((*pos, *y), r, edge)),
            )?;
        }
        Ok(())
    }

    fn draw_colorbar(
        &self,
        area: &Area<'_>,
        bar: &ColorBar,
        (lo, hi): (f64, f64),
    ) -> Result<(), ChartError> {
        let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, lo + 0.5) };
        let mut chart = ChartBuilder::on(area)
            .margin_top(self.px(30.0))
            .margin_bottom(self.px(BOTTOM_AREA_PT + 6.0))
            .margin_left(self.px(4.0))
            .margin_right(self.px(4.0))
            .set_label_area_size(LabelAreaPosition::Right, self.px(44.0))
            .build_cartesian_2d(0.0..1.0, lo..hi)?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .disable_x_axis()
            .y_desc(bar.label.as_str())
            .label_style(self.text_style(TICK_PT))
            .axis_desc_style(self.text_style(AXIS_DESC_PT))
            .draw()?;

        const STEPS: usize = 64;
        let step = (hi - lo) / STEPS as f64;
        chart.draw_series((0..STEPS).map(|i| {
            let y0 = lo + step * i as f64;
            let color = rdbu_r_between(y0 + step / 2.0, lo, hi);
            Rectangle::new([(0.0, y0), (1.0, y0 + step)], color.filled())
        }))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(0.0, lo), (1.0, hi)],
            BLACK.stroke_width(1),
        )))?;
        Ok(())
    }

    fn text_style(&self, pt: f64) -> TextStyle<'_> {
        (self.font.as_str(), self.px_f(pt)).into_font().color(&BLACK)
    }

    fn px_f(&self, pt: f64) -> f64 {
        pt * self.dpi / 72.0
    }

    fn px(&self, pt: f64) -> u32 {
        (self.px_f(pt).round() as u32).max(1)
    }
}

/// Legend glyph drawn next to a series label.
#[derive(Clone, Copy)]
enum Glyph {
    Line(LineStyle),
    Marker,
    Block,
}

fn annotate<'a, 'b: 'a>(
    anno: &mut SeriesAnno<'a, BitMapBackend<'b>>,
    label: &Option<String>,
    glyph: Glyph,
    style: ShapeStyle,
) {
    let Some(label) = label else {
        return;
    };
    let anno = anno.label(label.as_str());
    match glyph {
        Glyph::Line(LineStyle::Solid) => {
            anno.legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }
        Glyph::Line(_) => {
            anno.legend(move |(x, y)| {
                EmptyElement::at((x, y))
                    + PathElement::new(vec![(0, 0), (7, 0)], style)
                    + PathElement::new(vec![(13, 0), (20, 0)], style)
            });
        }
        Glyph::Marker => {
            anno.legend(move |(x, y)| Circle::new((x + 10, y), 4, style.filled()));
        }
        Glyph::Block => {
            anno.legend(move |(x, y)| Rectangle::new([(x + 2, y - 5), (x + 18, y + 5)], style.filled()));
        }
    }
}

fn legend_position(position: LegendPosition) -> SeriesLabelPosition {
    match position {
        LegendPosition::UpperLeft => SeriesLabelPosition::UpperLeft,
        LegendPosition::UpperRight => SeriesLabelPosition::UpperRight,
        LegendPosition::LowerLeft => SeriesLabelPosition::LowerLeft,
        LegendPosition::LowerRight => SeriesLabelPosition::LowerRight,
    }
}

/// Box-and-whisker figures with whiskers at the last point within 1.5 IQR.
struct BoxSpread {
    q1: f64,
    median: f64,
    q3: f64,
    low: f64,
    high: f64,
    outliers: Vec<f64>,
}

impl BoxSpread {
    fn of(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        let q1 = StatsCalculator::percentile(&sorted, 25.0);
        let median = StatsCalculator::percentile(&sorted, 50.0);
        let q3 = StatsCalculator::percentile(&sorted, 75.0);
        let iqr = q3 - q1;
        let (fence_lo, fence_hi) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

        let inside = sorted.iter().copied().filter(|v| *v >= fence_lo && *v <= fence_hi);
        let low = inside.clone().fold(f64::INFINITY, f64::min);
        let high = inside.fold(f64::NEG_INFINITY, f64::max);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < fence_lo || *v > fence_hi)
            .collect();

        Some(Self {
            q1,
            median,
            q3,
            low,
            high,
            outliers,
        })
    }
}

fn circle_outline(center: (f64, f64), radius: f64) -> Vec<(f64, f64)> {
    const SEGMENTS: usize = 72;
    (0..SEGMENTS)
        .map(|i| {
            let t = i as f64 / SEGMENTS as f64 * std::f64::consts::TAU;
            (center.0 + radius * t.cos(), center.1 + radius * t.sin())
        })
        .collect()
}

/// Tick and caption text is drawn on one line.
fn single_line(text: &str) -> String {
    text.replace('\n', " ")
}

fn encode_png(buffer: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>, ChartError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer)
        .ok_or_else(|| ChartError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    DynamicImage::ImageRgb8(image).write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
