//! i3: resistivity of constantan and nickel-chrome wires.
//!
//! Phase 1 reads R directly against length; phase 2 derives R from V/I. In both
//! the slope of R against L/A is ρ.

use anyhow::Result;
use plotters::style::RGBColor;

use super::{fit_or_warn, positions, LabContext};
use crate::charts::colormap::{BLUE, GREEN, LIGHT_CORAL, LIGHT_GREEN, MAGENTA, RED, SKY_BLUE};
use crate::charts::{Figure, GridMode, Layer, LineStyle, Panel};
use crate::data::{min_max, MeasurementSet};
use crate::physics::{length_over_area, percent_error, resistances};
use crate::report::{Report, Table};
use crate::stats::LinearFit;

const LENGTHS_CM: [f64; 10] = [5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0, 45.0, 50.0];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Material {
    Constantan,
    NickelChrome,
}

impl Material {
    fn name(self) -> &'static str {
        match self {
            Material::Constantan => "Constantan",
            Material::NickelChrome => "Cromo-Niquel",
        }
    }

    /// Handbook value, Ω·m.
    fn rho(self) -> f64 {
        match self {
            Material::Constantan => 49e-8,
            Material::NickelChrome => 110e-8,
        }
    }
}

/// How the phase 2 current was recorded for a wire.
#[derive(Debug, Clone)]
enum Current {
    PerReading(Vec<Option<f64>>),
    Constant(f64),
    Missing,
}

struct Wire {
    material: Material,
    diameter: f64,
    label: &'static str,
    key: &'static str,
    color: RGBColor,
    direct: [f64; 10],
    voltage: [f64; 10],
    current: Current,
}

impl Wire {
    fn title(&self) -> String {
        format!("{} {}", self.material.name(), self.label)
    }

    fn length_over_area(&self) -> Vec<f64> {
        length_over_area(&LENGTHS_CM, self.diameter)
    }

    fn phase1(&self) -> MeasurementSet {
        MeasurementSet::new(&self.length_over_area(), &self.direct)
    }

    /// `None` when no current was recorded at all.
    fn phase2(&self) -> Option<MeasurementSet> {
        let currents: Vec<Option<f64>> = match &self.current {
            Current::PerReading(values) => values.clone(),
            Current::Constant(i) => vec![Some(*i); self.voltage.len()],
            Current::Missing => return None,
        };
        let r = resistances(&self.voltage, &currents);
        let x: Vec<Option<f64>> = self.length_over_area().into_iter().map(Some).collect();
        Some(MeasurementSet::from_optional(&x, &r))
    }
}

fn wires() -> [Wire; 4] {
    let mut first_two = vec![None; 10];
    first_two[0] = Some(0.027);
    first_two[1] = Some(0.027);
    [
        Wire {
            material: Material::Constantan,
            diameter: 0.4e-3,
            label: "0.4 mm",
            key: "constantan_04mm",
            color: BLUE,
            direct: [0.6, 0.7, 0.9, 1.1, 1.3, 1.4, 1.8, 1.9, 2.1, 2.3],
            voltage: [0.007, 0.020, 0.033, 0.034, 0.040, 0.044, 0.045, 0.043, 0.049, 0.054],
            current: Current::PerReading(first_two),
        },
        Wire {
            material: Material::Constantan,
            diameter: 0.35e-3,
            label: "0.35 mm",
            key: "constantan_035mm",
            color: GREEN,
            direct: [0.6, 0.8, 1.0, 1.3, 1.6, 1.9, 2.1, 2.3, 2.7, 2.9],
            voltage: [0.009, 0.015, 0.023, 0.030, 0.041, 0.046, 0.053, 0.058, 0.064, 0.071],
            current: Current::Missing,
        },
        Wire {
            material: Material::NickelChrome,
            diameter: 0.4e-3,
            label: "0.4 mm",
            key: "cromo_niquel_04mm",
            color: MAGENTA,
            direct: [0.4, 1.1, 1.2, 1.9, 2.2, 2.9, 3.2, 3.7, 3.8, 4.3],
            voltage: [0.020, 0.026, 0.042, 0.052, 0.059, 0.100, 0.108, 0.114, 0.125, 0.134],
            current: Current::Missing,
        },
        Wire {
            material: Material::NickelChrome,
            diameter: 0.35e-3,
            label: "0.35 mm",
            key: "cromo_niquel_035mm",
            color: SKY_BLUE,
            direct: [0.3, 0.9, 1.5, 2.2, 2.6, 3.1, 3.7, 4.3, 4.9, 5.5],
            voltage: [0.015, 0.034, 0.054, 0.069, 0.082, 0.096, 0.115, 0.121, 0.147, 0.154],
            current: Current::Constant(0.025),
        },
    ]
}

/// R against L/A with its fit, drawn from the origin to 110% of the data.
fn rho_panel(title: String, set: &MeasurementSet, fit: &LinearFit, color: RGBColor) -> Panel {
    let hi = set.x_range().map_or(1.0, |(_, hi)| hi) * 1.1;
    Panel::new(title)
        .x_label("L/A [m⁻¹]")
        .y_label("Resistencia R [Ω]")
        .layer(
            Layer::scatter(set.points(), color)
                .size(6)
                .label("Datos experimentales"),
        )
        .layer(
            Layer::line(fit.line(0.0, hi, 100), RED, LineStyle::Solid)
                .width(2)
                .label(format!("Ajuste lineal (R²={:.4})", fit.r_squared)),
        )
}

struct Rho {
    value: f64,
    r_squared: f64,
}

pub fn run(ctx: &LabContext) -> Result<Report> {
    let mut report = Report::new("resistivity", "RESUMEN ESTADISTICO - VALORES DE RESISTIVIDAD");
    let wires = wires();

    report
        .section("VALORES TEÓRICOS")
        .line(format!(
            "Valor teorico Constantan: ρ = {:.2}×10⁻⁸ Ω·m",
            Material::Constantan.rho() * 1e8
        ))
        .line(format!(
            "Valor teorico Cromo-Niquel: ρ = {:.2}×10⁻⁸ Ω·m",
            Material::NickelChrome.rho() * 1e8
        ));

    let mut phase1: Vec<Option<Rho>> = Vec::with_capacity(wires.len());
    let mut phase2: Vec<Option<Rho>> = Vec::with_capacity(wires.len());

    for wire in &wires {
        let set = wire.phase1();
        let fit = fit_or_warn(&mut report, &format!("{} fase 1", wire.title()), set.fit());
        phase1.push(match fit {
            Some(fit) => {
                let title = format!(
                    "{} - Fase 1: Medicion directa\nρ = {:.2}×10⁻⁸ Ω·m",
                    wire.title(),
                    fit.slope * 1e8
                );
                ctx.save(
                    &mut report,
                    &format!("{}_fase1", wire.key),
                    &Figure::single((10.0, 6.0), rho_panel(title, &set, &fit, BLUE)),
                )?;
                Some(Rho {
                    value: fit.slope,
                    r_squared: fit.r_squared,
                })
            }
            None => None,
        });
    }

    for wire in &wires {
        let Some(set) = wire.phase2() else {
            report.warn(format!(
                "No se puede calcular R para {} sin valores de corriente",
                wire.title()
            ));
            phase2.push(None);
            continue;
        };
        let fit = fit_or_warn(&mut report, &format!("{} fase 2", wire.title()), set.fit());
        phase2.push(match fit {
            Some(fit) => {
                let title = format!(
                    "{} - Fase 2: Ley de Ohm\nρ = {:.2}×10⁻⁸ Ω·m",
                    wire.title(),
                    fit.slope * 1e8
                );
                ctx.save(
                    &mut report,
                    &format!("{}_fase2", wire.key),
                    &Figure::single((10.0, 6.0), rho_panel(title, &set, &fit, GREEN)),
                )?;
                Some(Rho {
                    value: fit.slope,
                    r_squared: fit.r_squared,
                })
            }
            None => None,
        });
    }

    // R against plain length, one panel per wire
    let mut panels = Vec::with_capacity(wires.len());
    for wire in &wires {
        let lengths: Vec<f64> = LENGTHS_CM.iter().map(|l| l * 1e-2).collect();
        let set = MeasurementSet::new(&lengths, &wire.direct);
        let mut panel = Panel::new(format!("{} {}", wire.material.name(), wire.label.replace(' ', "")))
            .x_label("Longitud L [m]")
            .y_label("Resistencia R [Ω]")
            .layer(Layer::scatter(set.points(), wire.color).size(5).label("Datos"));
        if let Some(fit) = fit_or_warn(&mut report, &format!("{} R vs L", wire.title()), set.fit()) {
            let hi = min_max(&lengths).map_or(1.0, |(_, hi)| hi) * 1.1;
            panel.push(
                Layer::line(fit.line(0.0, hi, 100), RED, LineStyle::Solid)
                    .width(2)
                    .label(format!("Ajuste (R²={:.4})", fit.r_squared)),
            );
        }
        panels.push(panel);
    }
    ctx.save(&mut report, "R_vs_L", &Figure::grid((14.0, 10.0), 2, 2, panels))?;

    let scaled = |rho: &Option<Rho>| rho.as_ref().map(|r| r.value * 1e8);
    let value_label = |v: Option<f64>| v.map(|v| format!("{v:.1}")).unwrap_or_default();
    let width = 0.25;
    let x = positions(wires.len());
    let f1: Vec<Option<f64>> = phase1.iter().map(scaled).collect();
    let f2: Vec<Option<f64>> = phase2.iter().map(scaled).collect();
    let theory: Vec<f64> = wires.iter().map(|w| w.material.rho() * 1e8).collect();
    let comparison = Panel::new("Comparacion de resistividades obtenidas experimentalmente")
        .x_label("Configuracion")
        .y_label("Resistividad ρ [×10⁻⁸ Ω·m]")
        .grid(GridMode::YOnly)
        .categories(wires.iter().map(Wire::title))
        .layer(
            Layer::bars(
                x.iter().map(|p| p - width).collect(),
                f1.iter().map(|v| v.unwrap_or(0.0)).collect(),
                width,
                SKY_BLUE,
            )
            .alpha(0.8)
            .label("Fase 1 (Directa)")
            .with_value_labels(f1.iter().copied().map(value_label).collect()),
        )
        .layer(
            Layer::bars(
                x.clone(),
                f2.iter().map(|v| v.unwrap_or(0.0)).collect(),
                width,
                LIGHT_GREEN,
            )
            .alpha(0.8)
            .label("Fase 2 (Ohm)")
            .with_value_labels(f2.iter().copied().map(value_label).collect()),
        )
        .layer(
            Layer::bars(x.iter().map(|p| p + width).collect(), theory, width, LIGHT_CORAL)
                .alpha(0.8)
                .label("Teorico"),
        );
    ctx.save(
        &mut report,
        "comparacion_resistividades",
        &Figure::single((12.0, 6.0), comparison),
    )?;

    for (heading, phase, suffix) in [
        ("FASE 1 - Medicion directa", &phase1, "fase1"),
        ("FASE 2 - Ley de Ohm", &phase2, "fase2"),
    ] {
        let mut table = Table::new(["Configuración", "ρ (×10⁻⁸ Ω·m)", "Error (%)", "R²"]);
        for (wire, rho) in wires.iter().zip(phase.iter()) {
            let Some(rho) = rho else { continue };
            let error = percent_error(rho.value, wire.material.rho()).unwrap_or(f64::NAN);
            table.row([
                wire.title(),
                format!("{:.2}", rho.value * 1e8),
                format!("{error:.1}"),
                format!("{:.4}", rho.r_squared),
            ]);
            report.metric(format!("rho_{}_{suffix}", wire.key), rho.value * 1e8);
            report.metric(format!("error_{}_{suffix}", wire.key), error);
        }
        report.section(heading).table(table);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_wires_with_current_have_a_phase_two_set() {
        let wires = wires();
        let usable: Vec<&str> = wires
            .iter()
            .filter(|w| w.phase2().is_some())
            .map(|w| w.key)
            .collect();
        assert_eq!(usable, ["constantan_04mm", "cromo_niquel_035mm"]);
        assert_eq!(wires[0].phase2().unwrap().len(), 2);
        assert_eq!(wires[3].phase2().unwrap().len(), 10);
    }

    #[test]
    fn nickel_chrome_phase_one_is_the_same_order_as_handbook() {
        let wire = &wires()[3];
        let fit = wire.phase1().fit().unwrap();
        let rho = fit.slope * 1e8;
        assert!(rho > 30.0 && rho < 200.0, "{rho}");
        assert!(fit.r_squared > 0.99);
    }

    #[test]
    fn lab_skips_wires_without_current() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = LabContext::new(
            super::super::LabId::Resistivity,
            dir.path(),
            crate::charts::StaticChartRenderer::new(30.0, "sans-serif"),
        );
        let report = run(&ctx).unwrap();
        // 4 phase 1, 2 phase 2, R_vs_L, comparison
        assert_eq!(report.charts.len(), 8);
        assert_eq!(report.warnings.len(), 2);
        assert!(ctx.chart_path("cromo_niquel_035mm_fase2").exists());
        assert!(!ctx.chart_path("constantan_035mm_fase2").exists());
        assert!(report.get("rho_cromo_niquel_035mm_fase2").is_some());
    }
}
