//! i9: vacuum permeability from the field of a wire, a loop and two solenoids.
//!
//! Each configuration is a B(I) sweep; the fitted slope (in T/A) is turned into
//! μ₀ through the geometry of the source.

use anyhow::Result;
use plotters::style::RGBColor;

use super::{fit_or_warn, positions, LabContext};
use crate::charts::colormap::{BLUE, GREEN, LIGHT_CORAL, RED, SKY_BLUE};
use crate::charts::{Figure, GridMode, Layer, LineStyle, Panel};
use crate::data::MeasurementSet;
use crate::physics::{mu0_circular_loop, mu0_solenoid, mu0_straight_wire, percent_error, MU0};
use crate::report::Report;
use crate::stats::{mean, LinearFit};

#[derive(Debug, Clone, Copy)]
enum Geometry {
    /// Distance from the wire, m.
    StraightWire { distance: f64 },
    /// Loop radius, m.
    Loop { radius: f64 },
    Solenoid { turns: f64, length: f64 },
}

impl Geometry {
    fn mu0(self, slope: f64) -> Option<f64> {
        match self {
            Geometry::StraightWire { distance } => Some(mu0_straight_wire(slope, distance)),
            Geometry::Loop { radius } => Some(mu0_circular_loop(slope, radius)),
            Geometry::Solenoid { turns, length } => mu0_solenoid(slope, turns, length),
        }
    }
}

struct Source {
    key: &'static str,
    title: &'static str,
    category: &'static str,
    geometry: Geometry,
    current: [f64; 10],
    /// Field in mT.
    field: [f64; 10],
    fit_span: (f64, f64),
    color: RGBColor,
}

const WIRE: Source = Source {
    key: "conductor",
    title: "Conductor rectilíneo",
    category: "Conductor rectilíneo",
    geometry: Geometry::StraightWire { distance: 0.001 },
    current: [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 9.5],
    field: [0.040, 0.083, 0.125, 0.170, 0.220, 0.260, 0.295, 0.350, 0.380, 0.400],
    fit_span: (0.0, 10.0),
    color: BLUE,
};

const LOOP: Source = Source {
    key: "espira",
    title: "Espira circular (R=20 mm)",
    category: "Espira circular",
    geometry: Geometry::Loop { radius: 0.02 },
    current: [1.2, 1.5, 1.8, 2.1, 2.4, 2.7, 3.0, 3.3, 3.6, 3.9],
    field: [0.038, 0.060, 0.080, 0.090, 0.095, 0.120, 0.125, 0.130, 0.143, 0.148],
    fit_span: (1.0, 4.0),
    color: GREEN,
};

// The coil "length" is the 9 mH and 36 mH label read as metres, as in the lab notes.
const SOLENOID_500: Source = Source {
    key: "solenoide_500",
    title: "Solenoide (N=500, L=9 mH)",
    category: "Solenoide (N=500)",
    geometry: Geometry::Solenoid {
        turns: 500.0,
        length: 9e-3,
    },
    current: [0.2, 0.4, 0.6, 0.8, 1.0, 1.2, 1.4, 1.6, 1.8, 2.0],
    field: [1.333, 2.805, 3.735, 4.445, 5.863, 7.205, 8.165, 9.110, 10.420, 11.490],
    fit_span: (0.0, 2.2),
    color: BLUE,
};

const SOLENOID_1000: Source = Source {
    key: "solenoide_1000",
    title: "Solenoide (N=1000, L=36 mH)",
    category: "Solenoide (N=1000)",
    geometry: Geometry::Solenoid {
        turns: 1000.0,
        length: 36e-3,
    },
    current: [0.2, 0.4, 0.6, 0.8, 1.0, 1.2, 1.4, 1.6, 1.8, 2.0],
    field: [2.978, 4.515, 6.365, 8.488, 11.095, 12.520, 15.070, 17.290, 18.950, 21.120],
    fit_span: (0.0, 2.2),
    color: GREEN,
};

const SOURCES: [Source; 4] = [WIRE, LOOP, SOLENOID_500, SOLENOID_1000];

struct Mu0 {
    fit: LinearFit,
    value: f64,
}

impl Source {
    /// B in tesla against I.
    fn readings(&self) -> MeasurementSet {
        MeasurementSet::new(&self.current, &self.field).scale_y(1e-3)
    }

    fn panel(&self, mu0: Option<&Mu0>) -> Panel {
        let title = match mu0 {
            Some(m) => format!(
                "{}\nmu0 experimental = {:.2}x10^-6 T·m/A",
                self.title,
                m.value * 1e6
            ),
            None => self.title.to_string(),
        };
        let mut panel = Panel::new(title)
            .x_label("Corriente I [A]")
            .y_label("Campo magnético B [mT]")
            .layer(
                Layer::scatter(
                    self.current.iter().copied().zip(self.field).collect(),
                    self.color,
                )
                .size(6)
                .label("Datos experimentales"),
            );
        if let Some(m) = mu0 {
            let line = m
                .fit
                .line(self.fit_span.0, self.fit_span.1, 100)
                .into_iter()
                .map(|(i, b)| (i, b * 1e3))
                .collect();
            panel.push(
                Layer::line(line, RED, LineStyle::Solid)
                    .width(2)
                    .label(format!("Ajuste lineal (R²={:.4})", m.fit.r_squared)),
            );
        }
        panel
    }
}

pub fn run(ctx: &LabContext) -> Result<Report> {
    let mut report = Report::new("magnetic", "RESUMEN ESTADISTICO - VALORES DE mu0");
    report
        .section("")
        .line(format!("Valor teorico: mu0 = {:.2}x10^-6 T·m/A", MU0 * 1e6));

    let mut results: Vec<Option<Mu0>> = Vec::with_capacity(SOURCES.len());
    for source in &SOURCES {
        let fit = fit_or_warn(&mut report, source.title, source.readings().fit());
        let mu0 = fit.and_then(|fit| source.geometry.mu0(fit.slope).map(|value| Mu0 { fit, value }));
        if let Some(m) = &mu0 {
            log::debug!("{}: mu0 = {:.3e}", source.key, m.value);
        }
        results.push(mu0);
    }

    ctx.save(
        &mut report,
        "conductor_rectilineo",
        &Figure::single((10.0, 6.0), WIRE.panel(results[0].as_ref())),
    )?;
    ctx.save(
        &mut report,
        "espiras_circulares",
        &Figure::single((10.0, 6.0), LOOP.panel(results[1].as_ref())),
    )?;
    ctx.save(
        &mut report,
        "solenoides",
        &Figure::grid(
            (14.0, 6.0),
            1,
            2,
            vec![
                SOLENOID_500.panel(results[2].as_ref()),
                SOLENOID_1000.panel(results[3].as_ref()),
            ],
        ),
    )?;

    let measured: Vec<Option<f64>> = results.iter().map(|r| r.as_ref().map(|m| m.value * 1e6)).collect();
    let x = positions(SOURCES.len());
    let width = 0.35;
    let comparison = Panel::new("Comparacion de valores de mu0 obtenidos experimentalmente")
        .x_label("Configuracion")
        .y_label("mu0 [x10^-6 T·m/A]")
        .grid(GridMode::YOnly)
        .categories(SOURCES.iter().map(|s| s.category))
        .layer(
            Layer::bars(
                x.iter().map(|p| p - width / 2.0).collect(),
                measured.iter().map(|v| v.unwrap_or(0.0)).collect(),
                width,
                SKY_BLUE,
            )
            .alpha(0.8)
            .label("mu0 experimental")
            .with_value_labels(
                measured
                    .iter()
                    .map(|v| v.map(|v| format!("{v:.2}")).unwrap_or_default())
                    .collect(),
            ),
        )
        .layer(
            Layer::bars(
                x.iter().map(|p| p + width / 2.0).collect(),
                vec![MU0 * 1e6; SOURCES.len()],
                width,
                LIGHT_CORAL,
            )
            .alpha(0.8)
            .label("mu0 teorico"),
        );
    ctx.save(
        &mut report,
        "comparacion_mu0",
        &Figure::single((10.0, 6.0), comparison),
    )?;

    let mut values = Vec::with_capacity(SOURCES.len());
    for (source, result) in SOURCES.iter().zip(&results) {
        let Some(m) = result else { continue };
        let error = percent_error(m.value, MU0).unwrap_or(f64::NAN);
        report
            .section(source.title)
            .line(format!("mu0 experimental: {:.2}x10^-6 T·m/A", m.value * 1e6))
            .line(format!("Error relativo: {error:.2}%"))
            .line(format!("R² del ajuste: {:.4}", m.fit.r_squared));
        report.metric(format!("mu0_{}", source.key), m.value);
        report.metric(format!("error_{}", source.key), error);
        values.push(m.value);
    }

    if !values.is_empty() {
        let avg = mean(&values);
        let error = percent_error(avg, MU0).unwrap_or(f64::NAN);
        report
            .section("Promedio de todas las configuraciones")
            .line(format!("mu0 promedio: {:.2}x10^-6 T·m/A", avg * 1e6))
            .line(format!("Error relativo: {error:.2}%"));
        report.metric("mu0_promedio", avg);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_wire_mu0_has_the_right_magnitude() {
        let fit = WIRE.readings().fit().unwrap();
        let mu0 = WIRE.geometry.mu0(fit.slope).unwrap();
        assert!(mu0 > 1e-7 && mu0 < 1e-6, "{mu0}");
        assert!(fit.r_squared > 0.99);
    }

    #[test]
    fn readings_are_converted_to_tesla() {
        let set = SOLENOID_500.readings();
        assert!((set.y()[0] - 1.333e-3).abs() < 1e-12);
    }

    #[test]
    fn lab_records_every_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = LabContext::new(
            super::super::LabId::Magnetic,
            dir.path(),
            crate::charts::StaticChartRenderer::new(30.0, "sans-serif"),
        );
        let report = run(&ctx).unwrap();
        assert_eq!(report.charts.len(), 4);
        for key in ["conductor", "espira", "solenoide_500", "solenoide_1000"] {
            assert!(report.get(&format!("mu0_{key}")).is_some(), "{key}");
        }
        assert!(report.get("mu0_promedio").is_some());
    }
}
