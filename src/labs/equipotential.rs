//! Taller 1: equipotential surfaces between two electrodes.
//!
//! Three electrode pairs (disc-disc, bar-bar, disc-bar). On each side a few
//! equipotential curves were traced with five voltmeter readings apiece.

use anyhow::Result;

use super::{positions, LabContext};
use crate::charts::colormap::{palette, AMBER, BLUE, MAGENTA, RED, STEEL_BLUE};
use crate::charts::{Figure, Layer, LegendPosition, LineStyle, Panel, Shape};
use crate::report::{pm, Report, Table};
use crate::stats::{mean, StatsCalculator, Summary};

/// Standard deviation below which a curve counts as precise, V.
const PRECISION_LIMIT: f64 = 0.05;
const HISTOGRAM_BINS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Electrode {
    Disc,
    Bar,
}

impl Electrode {
    fn name(self) -> &'static str {
        match self {
            Electrode::Disc => "Disco",
            Electrode::Bar => "Barra",
        }
    }

    /// Outline centred on (x, 0): 1 cm radius disc or a 1×2 cm bar.
    fn shape(self, x: f64) -> Shape {
        match self {
            Electrode::Disc => Shape::Circle {
                center: (x, 0.0),
                radius: 1.0,
            },
            Electrode::Bar => Shape::Rect {
                corner: (x - 0.5, -1.0),
                width: 1.0,
                height: 2.0,
            },
        }
    }
}

/// One traced equipotential: voltmeter tip positions (cm) and readings (V).
struct Curve {
    name: &'static str,
    coords: &'static [(f64, f64)],
    volts: &'static [f64],
}

struct Setup {
    left: Electrode,
    right: Electrode,
    /// Prefix for per-curve labels, e.g. `DD-Izq-arco1`.
    short: &'static str,
    stem: &'static str,
    left_curves: &'static [Curve],
    right_curves: &'static [Curve],
    /// Fields computed from the curve spacing, V/m.
    left_fields: &'static [f64],
    right_fields: &'static [f64],
}

impl Setup {
    fn name(&self) -> String {
        format!("{}-{}", self.left.name(), self.right.name())
    }

    fn sides(&self) -> [(&'static str, &'static [Curve]); 2] {
        [("Izq", self.left_curves), ("Der", self.right_curves)]
    }

    /// Electrode legend labels; mixed pairs name the electrode kind.
    fn electrode_labels(&self) -> (String, String) {
        if self.left == self.right {
            ("Electrodo Izquierdo".into(), "Electrodo Derecho".into())
        } else {
            (
                format!("Electrodo {} (izq)", self.left.name()),
                format!("Electrodo {} (der)", self.right.name()),
            )
        }
    }
}

const SETUPS: [Setup; 3] = [
    Setup {
        left: Electrode::Disc,
        right: Electrode::Disc,
        short: "DD",
        stem: "mapeo_disco_disco",
        left_curves: &[
            Curve {
                name: "arco1",
                coords: &[(-5.0, 0.0), (-7.0, 3.0), (-8.0, 4.0), (-5.0, 2.0), (-8.0, -4.0)],
                volts: &[-0.17, -0.24, -0.19, -0.18, -0.22],
            },
            Curve {
                name: "arco2",
                coords: &[(-4.0, 0.0), (-4.0, 2.0), (-6.0, 5.0), (-6.0, -3.0), (-8.0, -5.0)],
                volts: &[-0.17, -0.16, -0.15, -0.17, -0.16],
            },
            Curve {
                name: "arco3",
                coords: &[(-3.0, 0.0), (-4.0, 3.0), (-6.0, 6.0), (-8.0, 7.0), (-4.0, -4.0)],
                volts: &[-0.14, -0.17, -0.15, -0.13, -0.19],
            },
        ],
        right_curves: &[
            Curve {
                name: "arco1",
                coords: &[(8.0, -4.0), (7.0, -3.0), (6.0, -2.0), (5.0, -1.0), (5.0, 0.0)],
                volts: &[0.5, 0.53, 0.52, 0.426, 0.44],
            },
            Curve {
                name: "arco2",
                coords: &[(4.0, 0.0), (5.0, 2.0), (6.0, 3.0), (7.0, 4.0), (5.0, -2.0)],
                volts: &[0.28, 0.39, 0.43, 0.43, 0.534],
            },
            Curve {
                name: "arco3",
                coords: &[(3.0, 0.0), (3.0, 2.0), (4.0, 3.0), (5.0, 4.0), (6.0, 5.0)],
                volts: &[0.48, 0.43, 0.25, 0.31, 0.32],
            },
        ],
        left_fields: &[-2.5, -2.025, -1.95],
        right_fields: &[6.03, 5.17, 4.47],
    },
    Setup {
        left: Electrode::Bar,
        right: Electrode::Bar,
        short: "BB",
        stem: "mapeo_barra_barra",
        left_curves: &[
            Curve {
                name: "recta1",
                coords: &[(-3.0, 0.0), (-3.0, 2.0), (-3.0, 4.0), (-3.0, -3.0), (-3.0, -4.0)],
                volts: &[-0.36, -0.36, -0.38, -0.35, -0.34],
            },
            Curve {
                name: "recta2",
                coords: &[(-4.0, 0.0), (-4.0, 4.0), (-4.0, -2.0), (-4.0, -4.0), (-4.0, -5.0)],
                volts: &[-0.42, -0.40, -0.40, -0.40, -0.38],
            },
        ],
        right_curves: &[
            Curve {
                name: "recta1",
                coords: &[(3.0, 0.0), (3.0, 4.0), (3.0, -2.0), (3.0, -3.0), (3.0, -5.0)],
                volts: &[0.3, 0.19, 0.22, 0.26, 0.18],
            },
            Curve {
                name: "recta2",
                coords: &[(4.0, 0.0), (4.0, 2.0), (4.0, 4.0), (4.0, -2.0), (4.0, -4.0)],
                volts: &[0.32, 0.44, 0.48, 0.62, 0.63],
            },
        ],
        left_fields: &[-4.475, -5.0],
        right_fields: &[2.87, 6.22],
    },
    Setup {
        left: Electrode::Disc,
        right: Electrode::Bar,
        short: "DB",
        stem: "mapeo_disco_barra",
        left_curves: &[
            Curve {
                name: "arco1",
                coords: &[(-5.0, 0.0), (-6.0, 0.0), (-7.0, 3.0), (-8.0, 4.0), (-6.0, -2.0)],
                volts: &[-0.8, -0.9, -0.91, -0.92, -0.95],
            },
            Curve {
                name: "arco2",
                coords: &[(-3.0, 0.0), (-4.0, -2.0), (-6.0, -4.0), (-8.0, -5.0), (-6.0, -4.0)],
                volts: &[-0.51, -0.62, -0.71, -0.74, -0.6],
            },
        ],
        right_curves: &[
            Curve {
                name: "recta1",
                coords: &[(4.0, 0.0), (4.0, 2.0), (4.0, 4.0), (4.0, -3.0), (4.0, -4.0)],
                volts: &[0.29, 0.25, 0.22, 0.13, 0.18],
            },
            Curve {
                name: "recta2",
                coords: &[(2.0, 0.0), (2.0, 2.0), (2.0, 4.0), (2.0, -2.0), (2.0, -4.0)],
                volts: &[0.11, 0.29, 0.35, 0.35, 0.38],
            },
        ],
        left_fields: &[-11.2, -7.95],
        right_fields: &[2.67, 3.69],
    },
];

/// Setup colours for the per-curve bar charts.
const SETUP_COLORS: [plotters::style::RGBColor; 3] = [STEEL_BLUE, MAGENTA, AMBER];

/// Statistics of one traced curve.
struct CurveStats {
    setup: usize,
    label: String,
    side: &'static str,
    summary: Summary,
}

fn curve_stats() -> Vec<CurveStats> {
    let mut out = Vec::new();
    for (i, setup) in SETUPS.iter().enumerate() {
        for (side, curves) in setup.sides() {
            for curve in curves {
                out.push(CurveStats {
                    setup: i,
                    label: format!("{}-{side}-{}", setup.short, curve.name),
                    side,
                    summary: Summary::of(curve.volts),
                });
            }
        }
    }
    out
}

/// Mean of the per-curve means on one side of a setup.
fn side_mean(stats: &[CurveStats], setup: usize, side: &str) -> f64 {
    let means: Vec<f64> = stats
        .iter()
        .filter(|s| s.setup == setup && s.side == side)
        .map(|s| s.summary.mean)
        .collect();
    mean(&means)
}

/// Left/right bars per setup with the value printed on top.
fn sides_panel(title: &str, y_label: &str, left: Vec<f64>, right: Vec<f64>, decimals: usize) -> Panel {
    let x = positions(SETUPS.len());
    let width = 0.35;
    let labels = |values: &[f64]| -> Vec<String> {
        values.iter().map(|v| format!("{v:.decimals$}")).collect()
    };
    let left_labels = labels(&left);
    let right_labels = labels(&right);
    Panel::new(title)
        .x_label("Configuración de Electrodos")
        .y_label(y_label)
        .categories(SETUPS.iter().map(Setup::name))
        .layer(
            Layer::bars(x.iter().map(|p| p - width / 2.0).collect(), left, width, STEEL_BLUE)
                .alpha(0.8)
                .label("Lado Izquierdo")
                .with_value_labels(left_labels),
        )
        .layer(
            Layer::bars(x.iter().map(|p| p + width / 2.0).collect(), right, width, MAGENTA)
                .alpha(0.8)
                .label("Lado Derecho")
                .with_value_labels(right_labels),
        )
}

/// One bar per curve, coloured and grouped in the legend by setup.
fn per_curve_panel(title: &str, y_label: &str, stats: &[CurveStats], value: impl Fn(&Summary) -> f64) -> Panel {
    let mut panel = Panel::new(title)
        .x_label("Mediciones")
        .y_label(y_label)
        .legend(LegendPosition::UpperRight)
        .categories(stats.iter().map(|s| s.label.clone()));
    for (i, setup) in SETUPS.iter().enumerate() {
        let (centers, heights): (Vec<f64>, Vec<f64>) = stats
            .iter()
            .enumerate()
            .filter(|(_, s)| s.setup == i)
            .map(|(pos, s)| (pos as f64, value(&s.summary)))
            .unzip();
        panel.push(
            Layer::bars(centers, heights, 0.8, SETUP_COLORS[i])
                .alpha(0.7)
                .label(setup.name()),
        );
    }
    panel
}

fn map_panel(setup: &Setup) -> Panel {
    let (left_label, right_label) = setup.electrode_labels();
    let mut panel = Panel::new(format!(
        "Mapeo de Superficies Equipotenciales: Configuración {}",
        setup.name()
    ))
    .x_label("Coordenada X (cm)")
    .y_label("Coordenada Y (cm)")
    .x_range(-10.0, 10.0)
    .y_range(-8.0, 8.0)
    .legend(LegendPosition::UpperRight)
    .colorbar("Potencial (V)", None)
    .layer(
        Layer::shape(setup.left.shape(-6.0), RED)
            .alpha(0.7)
            .label(left_label),
    )
    .layer(
        Layer::shape(setup.right.shape(6.0), BLUE)
            .alpha(0.7)
            .label(right_label),
    );
    for (_, curves) in setup.sides() {
        for curve in curves {
            panel.push(
                Layer::color_scatter(curve.coords.to_vec(), curve.volts.to_vec())
                    .size(7)
                    .alpha(0.8),
            );
            for (at, v) in curve.coords.iter().zip(curve.volts) {
                panel.push(Layer::text(*at, format!("{v:.2}V")).size(8).offset(5, -5));
            }
        }
    }
    panel
}

pub fn run(ctx: &LabContext) -> Result<Report> {
    let mut report = Report::new("equipotential", "ANÁLISIS DE SUPERFICIES EQUIPOTENCIALES");
    let stats = curve_stats();

    let left_v: Vec<f64> = (0..SETUPS.len()).map(|i| side_mean(&stats, i, "Izq")).collect();
    let right_v: Vec<f64> = (0..SETUPS.len()).map(|i| side_mean(&stats, i, "Der")).collect();
    ctx.save(
        &mut report,
        "comparacion_potenciales",
        &Figure::single(
            (14.0, 8.0),
            sides_panel(
                "Comparación de Potenciales por Configuración de Electrodos",
                "Potencial Promedio (V)",
                left_v.clone(),
                right_v.clone(),
                2,
            ),
        ),
    )?;

    ctx.save(
        &mut report,
        "analisis_incertidumbres",
        &Figure::single(
            (16.0, 8.0),
            per_curve_panel(
                "Análisis de Incertidumbres por Configuración",
                "Incertidumbre (V)",
                &stats,
                |s| s.std_error,
            ),
        ),
    )?;

    for setup in &SETUPS {
        ctx.save(&mut report, setup.stem, &Figure::single((15.0, 10.0), map_panel(setup)))?;
    }

    let left_e: Vec<f64> = SETUPS.iter().map(|s| mean(s.left_fields)).collect();
    let right_e: Vec<f64> = SETUPS.iter().map(|s| mean(s.right_fields)).collect();
    let all_left: Vec<f64> = SETUPS.iter().flat_map(|s| s.left_fields.iter().copied()).collect();
    let all_right: Vec<f64> = SETUPS.iter().flat_map(|s| s.right_fields.iter().copied()).collect();
    let hist = StatsCalculator::histogram(&[&all_left, &all_right], HISTOGRAM_BINS);
    let bin = hist.bin_width();
    let centers = hist.centers();
    let mut distribution = Panel::new("Distribución de Campos Eléctricos por Lado")
        .x_label("Campo Eléctrico (V/m)")
        .y_label("Frecuencia");
    for (k, (counts, (label, color))) in hist
        .counts
        .iter()
        .zip([("Izquierdo", STEEL_BLUE), ("Derecho", MAGENTA)])
        .enumerate()
    {
        // Side-by-side within each bin, as a grouped histogram
        let shift = (k as f64 - 0.5) * bin * 0.4;
        distribution.push(
            Layer::bars(
                centers.iter().map(|c| c + shift).collect(),
                counts.iter().map(|c| *c as f64).collect(),
                bin * 0.4,
                color,
            )
            .alpha(0.7)
            .label(label),
        );
    }
    ctx.save(
        &mut report,
        "analisis_campos_electricos",
        &Figure::grid(
            (18.0, 8.0),
            1,
            2,
            vec![
                sides_panel(
                    "Campos Eléctricos por Configuración",
                    "Campo Eléctrico Promedio (V/m)",
                    left_e.clone(),
                    right_e.clone(),
                    1,
                ),
                distribution,
            ],
        ),
    )?;

    let precision = per_curve_panel(
        "Análisis de Precisión: Desviaciones Estándar",
        "Desviación Estándar (V)",
        &stats,
        |s| s.std,
    )
    .layer(
        Layer::hline(PRECISION_LIMIT, RED, LineStyle::Dashed)
            .alpha(0.7)
            .label(format!("Precisión Aceptable ({PRECISION_LIMIT} V)")),
    );
    let groups: Vec<(f64, Vec<f64>)> = (0..SETUPS.len())
        .map(|i| {
            let spread = stats
                .iter()
                .filter(|s| s.setup == i)
                .map(|s| s.summary.std)
                .collect();
            (i as f64, spread)
        })
        .collect();
    let boxes = Panel::new("Distribución de Precisión por Configuración")
        .x_label("Configuración de Electrodos")
        .y_label("Desviación Estándar (V)")
        .categories(SETUPS.iter().map(Setup::name))
        .no_legend()
        .layer(Layer::boxplot(groups, 0.5, palette(0)));
    ctx.save(
        &mut report,
        "analisis_precision",
        &Figure::grid((18.0, 8.0), 1, 2, vec![precision, boxes]),
    )?;

    let mut table = Table::new(["Curva", "n", "Promedio (V)", "Desv. (V)", "Incert. (V)"]);
    for s in &stats {
        table.row([
            s.label.clone(),
            s.summary.count.to_string(),
            format!("{:.3}", s.summary.mean),
            format!("{:.3}", s.summary.std),
            format!("{:.3}", s.summary.std_error),
        ]);
    }
    report.section("ESTADÍSTICAS POR CURVA").table(table);

    let fields = report.section("CAMPOS ELÉCTRICOS PROMEDIO");
    for (i, setup) in SETUPS.iter().enumerate() {
        fields.line(format!(
            "{}: izquierdo {:.2} V/m, derecho {:.2} V/m",
            setup.name(),
            left_e[i],
            right_e[i]
        ));
    }
    for (i, setup) in SETUPS.iter().enumerate() {
        let key = setup.name().to_lowercase().replace('-', "_");
        report.metric(format!("potencial_izq_{key}"), left_v[i]);
        report.metric(format!("potencial_der_{key}"), right_v[i]);
        report.metric(format!("campo_izq_{key}"), left_e[i]);
        report.metric(format!("campo_der_{key}"), right_e[i]);
    }

    let precise = stats.iter().filter(|s| s.summary.std <= PRECISION_LIMIT).count();
    report.section("PRECISIÓN").line(format!(
        "Curvas con desviación ≤ {PRECISION_LIMIT} V: {precise} de {}",
        stats.len()
    ));
    if let Some(worst) = stats
        .iter()
        .max_by(|a, b| a.summary.std.total_cmp(&b.summary.std))
    {
        log::debug!("least precise curve: {} ({})", worst.label, pm(worst.summary.mean, worst.summary.std, 3));
    }

    let files: Vec<String> = report
        .charts
        .iter()
        .map(|path| {
            if path.exists() {
                format!("✓ {} - Generado correctamente", path.display())
            } else {
                format!("✗ {} - No encontrado", path.display())
            }
        })
        .collect();
    let verification = report.section("Verificación de archivos generados");
    for line in files {
        verification.line(line);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arc_statistics_come_from_raw_readings() {
        let stats = curve_stats();
        assert_eq!(stats.len(), 14);
        let first = &stats[0];
        assert_eq!(first.label, "DD-Izq-arco1");
        assert!((first.summary.mean + 0.2).abs() < 1e-9);
        assert!((first.summary.std - 0.029).abs() < 0.001);
        assert!((first.summary.std_error - 0.013).abs() < 0.001);
    }

    #[test]
    fn sides_have_opposite_sign() {
        let stats = curve_stats();
        for i in 0..SETUPS.len() {
            assert!(side_mean(&stats, i, "Izq") < 0.0);
            assert!(side_mean(&stats, i, "Der") > 0.0);
        }
    }

    #[test]
    fn mixed_pair_names_each_electrode() {
        let (left, right) = SETUPS[2].electrode_labels();
        assert_eq!(left, "Electrodo Disco (izq)");
        assert_eq!(right, "Electrodo Barra (der)");
        assert!(matches!(SETUPS[2].right.shape(6.0), Shape::Rect { .. }));
    }

    #[test]
    fn lab_writes_and_verifies_seven_charts() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = LabContext::new(
            super::super::LabId::Equipotential,
            dir.path(),
            crate::charts::StaticChartRenderer::new(30.0, "sans-serif"),
        );
        let report = run(&ctx).unwrap();
        assert_eq!(report.charts.len(), 7);
        let text = report.to_string();
        assert_eq!(text.matches("Generado correctamente").count(), 7);
        let v = report.get("potencial_izq_disco_barra").unwrap();
        assert!((v + 0.76).abs() < 0.01, "{v}");
    }
}
