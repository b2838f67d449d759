//! Taller 2: Ohm's law.
//!
//! Phase 1 is a 60 Ω resistor swept in voltage, phase 2 holds 40 V across a
//! resistance decade, phase 3 is an incandescent bulb.

use anyhow::Result;
use plotters::style::RGBColor;

use super::{curve, equation, fit_or_warn, zip_points, LabContext};
use crate::charts::colormap::{BLUE, GREEN, ORANGE, RED};
use crate::charts::{Figure, Layer, LegendPosition, LineStyle, Panel};
use crate::physics::{percent_error, ratios};
use crate::report::{pm, Report, Table};
use crate::stats::{linear_fit, mean, sample_std, Summary};

const NOMINAL_R: f64 = 60.0;
const CONSTANT_V: f64 = 40.0;

const PHASE1_V: [f64; 10] = [7.41, 11.86, 17.84, 21.57, 27.02, 32.15, 40.60, 46.31, 51.02, 55.34];
const PHASE1_I: [f64; 10] = [0.120, 0.190, 0.290, 0.350, 0.440, 0.530, 0.672, 0.761, 0.824, 0.918];

const PHASE2_I: [f64; 10] = [0.660, 0.640, 0.620, 0.610, 0.600, 0.580, 0.560, 0.530, 0.510, 0.500];
const PHASE2_R: [f64; 10] = [60.0, 62.5, 64.0, 65.0, 67.0, 68.0, 70.0, 75.0, 77.5, 80.0];

const PHASE3_V: [f64; 10] = [45.0, 50.0, 55.0, 60.0, 65.0, 75.0, 80.0, 85.0, 90.0, 95.0];
const PHASE3_I: [f64; 10] = [0.55, 0.58, 0.61, 0.67, 0.66, 0.713, 0.74, 0.76, 0.79, 0.80];
const PHASE3_R_MEASURED: [f64; 10] = [81.0, 86.0, 90.0, 89.0, 98.0, 105.0, 108.0, 111.0, 113.0, 118.0];

fn flatten(values: Vec<Option<f64>>) -> Vec<f64> {
    values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect()
}

fn range(values: &[f64]) -> (f64, f64) {
    crate::data::min_max(values).unwrap_or((0.0, 1.0))
}

pub fn run(ctx: &LabContext) -> Result<Report> {
    let mut report = Report::new("ohm", "LABORATORIO LEY DE OHM (TALLER 2)");

    // Phase 1: ohmic resistor
    let r1 = flatten(ratios(&PHASE1_V, &PHASE1_I));
    let r1_stats = Summary::of(&r1);
    let err1: Vec<f64> = r1
        .iter()
        .map(|r| percent_error(*r, NOMINAL_R).unwrap_or(f64::NAN))
        .collect();
    let err1_mean = mean(&err1);
    let fit1 = fit_or_warn(&mut report, "fase 1 V vs I", linear_fit(&PHASE1_I, &PHASE1_V));

    {
        let s = report.section("FASE 1: MATERIAL ÓHMICO");
        s.line(format!("Resistencia nominal: {NOMINAL_R} Ω"));
        s.line(format!(
            "Resistencia promedio experimental: {} Ω",
            pm(r1_stats.mean, r1_stats.std_error, 2)
        ));
        s.line(format!("Desviación estándar: {:.2} Ω", r1_stats.std));
        s.line(format!("Error promedio: {err1_mean:.2}%"));
        if let Some(fit) = &fit1 {
            s.line(format!("Resistencia por regresión lineal: {:.2} Ω", fit.slope));
            s.line(format!("Coeficiente de correlación (R²): {:.4}", fit.r_squared));
        }
        let mut t = Table::new(["V (V)", "I (A)", "R (Ω)", "Error (%)"]);
        for i in 0..PHASE1_V.len() {
            t.row([
                format!("{:.2}", PHASE1_V[i]),
                format!("{:.3}", PHASE1_I[i]),
                format!("{:.3}", r1[i]),
                format!("{:.3}", err1[i]),
            ]);
        }
        s.table(t);
    }
    report.metric("fase1_r_promedio", r1_stats.mean);
    report.metric("fase1_r_incertidumbre", r1_stats.std_error);
    report.metric("fase1_error_promedio", err1_mean);

    // Phase 2: constant voltage
    let i_theory: Vec<f64> = PHASE2_R.iter().map(|r| CONSTANT_V / r).collect();
    let err2: Vec<f64> = PHASE2_I
        .iter()
        .zip(&i_theory)
        .map(|(m, t)| percent_error(*m, *t).unwrap_or(f64::NAN))
        .collect();
    let err2_mean = mean(&err2);
    report
        .section("FASE 2: I vs R (V CONSTANTE)")
        .line(format!("Voltaje constante: {CONSTANT_V} V"))
        .line(format!("Error promedio: {err2_mean:.3}%"));
    report.metric("fase2_error_promedio", err2_mean);

    // Phase 3: incandescent bulb
    let r3 = flatten(ratios(&PHASE3_V, &PHASE3_I));
    let diff3: Vec<f64> = PHASE3_R_MEASURED
        .iter()
        .zip(&r3)
        .map(|(m, c)| (m - c).abs())
        .collect();
    let err3: Vec<f64> = diff3.iter().zip(&r3).map(|(d, c)| d / c * 100.0).collect();
    let err3_mean = mean(&err3);
    let fit3 = fit_or_warn(&mut report, "fase 3 V vs I", linear_fit(&PHASE3_I, &PHASE3_V));

    {
        let s = report.section("FASE 3: MATERIAL NO ÓHMICO (BOMBILLO)");
        s.line(format!(
            "Resistencia promedio medida: {:.1} Ω",
            mean(&PHASE3_R_MEASURED)
        ));
        s.line(format!("Resistencia promedio calculada (V/I): {:.1} Ω", mean(&r3)));
        s.line(format!("Error promedio: {err3_mean:.1}%"));
        if let Some(fit) = &fit3 {
            s.line(format!("Resistencia aparente (pendiente V vs I): {:.1} Ω", fit.slope));
            s.line(format!("Coeficiente de correlación (R²): {:.4}", fit.r_squared));
        }
    }
    report.metric("fase3_r_promedio", mean(&r3));
    report.metric("fase3_error_promedio", err3_mean);

    if let Some(fit) = &fit3 {
        let deviation: Vec<f64> = PHASE3_I
            .iter()
            .zip(&PHASE3_V)
            .map(|(i, v)| (v - fit.predict(*i)).abs())
            .collect();
        let dev_mean = mean(&deviation);
        let dev_max = deviation.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        report
            .section("ANÁLISIS DE NO LINEALIDAD")
            .line(format!("Desviación promedio de la linealidad: {dev_mean:.2} V"))
            .line(format!("Desviación máxima de la linealidad: {dev_max:.2} V"))
            .line(format!(
                "Porcentaje de desviación promedio: {:.1}%",
                dev_mean / mean(&PHASE3_V) * 100.0
            ));
        report.metric("fase3_desviacion_promedio", dev_mean);
    }

    {
        let mut t = Table::new(["V (V)", "I (A)", "R medida (Ω)", "R V/I (Ω)", "Dif. (Ω)", "Error (%)"]);
        for i in 0..PHASE3_V.len() {
            t.row([
                format!("{:.0}", PHASE3_V[i]),
                format!("{:.3}", PHASE3_I[i]),
                format!("{:.0}", PHASE3_R_MEASURED[i]),
                format!("{:.2}", r3[i]),
                format!("{:.2}", diff3[i]),
                format!("{:.1}", err3[i]),
            ]);
        }
        report.section("TABLA DE RESULTADOS FASE 3").table(t);
    }

    // Charts
    let (i1_lo, i1_hi) = range(&PHASE1_I);
    let (i3_lo, i3_hi) = range(&PHASE3_I);
    let (r2_lo, r2_hi) = range(&PHASE2_R);

    let phase1_panel = |title: &str, decimals: usize| {
        let mut p = Panel::new(title)
            .x_label("Corriente (A)")
            .y_label("Voltaje (V)")
            .layer(
                Layer::scatter(zip_points(&PHASE1_I, &PHASE1_V), BLUE)
                    .alpha(0.7)
                    .label("Datos experimentales"),
            );
        if let Some(fit) = &fit1 {
            p.push(
                Layer::line(fit.line(i1_lo, i1_hi, 100), RED, LineStyle::Dashed)
                    .label(format!("Regresión: {}", equation("V", "I", fit, decimals))),
            );
        }
        p
    };
    let phase3_panel = |title: &str| {
        let mut p = Panel::new(title)
            .x_label("Corriente (A)")
            .y_label("Voltaje (V)")
            .layer(
                Layer::scatter(zip_points(&PHASE3_I, &PHASE3_V), RED)
                    .alpha(0.7)
                    .label("Datos experimentales"),
            );
        if let Some(fit) = &fit3 {
            p.push(
                Layer::line(fit.line(i3_lo, i3_hi, 100), BLUE, LineStyle::Dashed)
                    .label(format!("Regresión: {}", equation("V", "I", fit, 1))),
            );
        }
        p
    };
    let phase2_panel = |title: &str, measured: RGBColor| {
        Panel::new(title)
            .x_label("Resistencia (Ω)")
            .y_label("Corriente (A)")
            .legend(LegendPosition::UpperRight)
            .layer(
                Layer::scatter(zip_points(&PHASE2_R, &PHASE2_I), measured)
                    .alpha(0.7)
                    .label("Corriente medida"),
            )
            .layer(
                Layer::scatter(zip_points(&PHASE2_R, &i_theory), RED)
                    .alpha(0.7)
                    .label("Corriente teórica"),
            )
            .layer(
                Layer::line(curve(r2_lo, r2_hi, |r| CONSTANT_V / r), RED, LineStyle::Dashed)
                    .label(format!("Ley de Ohm: I = {CONSTANT_V}/R")),
            )
    };
    let comparison_panel = |title: &str| {
        let mut p = Panel::new(title)
            .x_label("Corriente (A)")
            .y_label("Voltaje (V)")
            .layer(
                Layer::scatter(zip_points(&PHASE1_I, &PHASE1_V), BLUE)
                    .alpha(0.7)
                    .label("Material óhmico"),
            )
            .layer(
                Layer::scatter(zip_points(&PHASE3_I, &PHASE3_V), RED)
                    .alpha(0.7)
                    .label("Material no óhmico"),
            );
        for (fit, color) in [(&fit1, BLUE), (&fit3, RED)] {
            if let Some(fit) = fit {
                p.push(Layer::line(fit.line(0.1, 1.0, 100), color, LineStyle::Solid).alpha(0.7));
            }
        }
        p
    };

    ctx.save(
        &mut report,
        "voltaje_vs_corriente_ohmico",
        &Figure::single(
            (10.0, 6.0),
            phase1_panel(
                "Relación Voltaje vs Corriente - Material Óhmico\n(Resistencia nominal: 60 Ω)",
                2,
            ),
        ),
    )?;

    let points: Vec<f64> = (1..=r1.len()).map(|i| i as f64).collect();
    ctx.save(
        &mut report,
        "resistencia_vs_punto_ohmico",
        &Figure::single(
            (10.0, 6.0),
            Panel::new("Resistencia Experimental vs Punto de Medición\nMaterial Óhmico")
                .x_label("Punto de medición")
                .y_label("Resistencia (Ω)")
                .layer(
                    Layer::scatter(zip_points(&points, &r1), GREEN)
                        .alpha(0.7)
                        .label("Resistencia experimental"),
                )
                .layer(
                    Layer::hline(NOMINAL_R, RED, LineStyle::Dashed)
                        .label(format!("Resistencia nominal ({NOMINAL_R} Ω)")),
                )
                .layer(
                    Layer::hline(r1_stats.mean, BLUE, LineStyle::Solid)
                        .label(format!("Resistencia promedio ({:.2} Ω)", r1_stats.mean)),
                ),
        ),
    )?;

    ctx.save(
        &mut report,
        "corriente_vs_resistencia",
        &Figure::single((10.0, 6.0), phase2_panel("Corriente vs Resistencia - V = 40V", BLUE)),
    )?;

    ctx.save(
        &mut report,
        "voltaje_vs_corriente_no_ohmico",
        &Figure::single((10.0, 6.0), phase3_panel("Voltaje vs Corriente - Material No Óhmico")),
    )?;

    let bulb = Figure::grid(
        (12.0, 8.0),
        2,
        2,
        vec![
            phase3_panel("Voltaje vs Corriente - Material No Óhmico"),
            Panel::new("Resistencia vs Voltaje")
                .x_label("Voltaje (V)")
                .y_label("Resistencia (Ω)")
                .layer(
                    Layer::scatter(zip_points(&PHASE3_V, &PHASE3_R_MEASURED), GREEN)
                        .alpha(0.7)
                        .label("Resistencia medida"),
                )
                .layer(
                    Layer::scatter(zip_points(&PHASE3_V, &r3), BLUE)
                        .alpha(0.7)
                        .label("Resistencia calculada (V/I)"),
                ),
            Panel::new("Resistencia vs Corriente")
                .x_label("Corriente (A)")
                .y_label("Resistencia (Ω)")
                .layer(
                    Layer::scatter(zip_points(&PHASE3_I, &PHASE3_R_MEASURED), GREEN)
                        .alpha(0.7)
                        .label("Resistencia medida"),
                )
                .layer(
                    Layer::scatter(zip_points(&PHASE3_I, &r3), BLUE)
                        .alpha(0.7)
                        .label("Resistencia calculada (V/I)"),
                ),
            Panel::new("Error vs Voltaje")
                .x_label("Voltaje (V)")
                .y_label("Error Porcentual (%)")
                .layer(Layer::scatter(zip_points(&PHASE3_V, &err3), ORANGE).alpha(0.7))
                .layer(
                    Layer::hline(err3_mean, RED, LineStyle::Dashed)
                        .label(format!("Error promedio: {err3_mean:.1}%")),
                ),
        ],
    );
    ctx.save(&mut report, "analisis_material_no_ohmico", &bulb)?;

    ctx.save(
        &mut report,
        "comparacion_ohmico_vs_no_ohmico",
        &Figure::single((12.0, 6.0), comparison_panel("Comparación: Óhmico vs No Óhmico")),
    )?;

    let complete = Figure::grid(
        (15.0, 12.0),
        2,
        2,
        vec![
            phase1_panel("Fase 1: Material Óhmico\n(Resistencia nominal: 60 Ω)", 1),
            phase2_panel("Fase 2: I vs R (V = 40V)", GREEN),
            phase3_panel("Fase 3: Material No Óhmico\n(Bombillo incandescente)"),
            comparison_panel("Comparación: Óhmico vs No Óhmico"),
        ],
    );
    ctx.save(&mut report, "analisis_completo_laboratorio", &complete)?;

    ctx.save(
        &mut report,
        "resistencia_vs_voltaje_comparacion",
        &Figure::single(
            (12.0, 6.0),
            Panel::new(
                "Comportamiento de la Resistencia vs Voltaje\nComparación entre Materiales Óhmicos y No Óhmicos",
            )
            .x_label("Voltaje (V)")
            .y_label("Resistencia (Ω)")
            .layer(
                Layer::line(curve(0.0, 60.0, |_| NOMINAL_R), BLUE, LineStyle::Solid)
                    .width(3)
                    .label(format!("Material óhmico (R = {NOMINAL_R} Ω)")),
            )
            .layer(
                Layer::scatter(zip_points(&PHASE3_V, &r3), RED)
                    .alpha(0.7)
                    .label("Material no óhmico (bombillo)"),
            ),
        ),
    )?;

    let conclusions = report.section("CONCLUSIONES");
    conclusions.line(format!(
        "Fase 1: el material óhmico cumple V = RI con R = {} Ω",
        pm(r1_stats.mean, r1_stats.std_error, 2)
    ));
    conclusions.line(format!(
        "Fase 2: la relación I = V/R se verifica con V = {CONSTANT_V} V"
    ));
    conclusions.line("Fase 3: el bombillo NO cumple la Ley de Ohm (R aumenta con V)");
    conclusions.line(format!(
        "Desviación estándar de R en la fase 3: {:.2} Ω",
        sample_std(&r3)
    ));

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ohmic_slope_is_close_to_nominal() {
        let fit = linear_fit(&PHASE1_I, &PHASE1_V).unwrap();
        assert!((fit.slope - NOMINAL_R).abs() < 2.0);
        assert!(fit.r_squared > 0.999);
    }

    #[test]
    fn bulb_resistance_grows_with_voltage() {
        let r3 = flatten(ratios(&PHASE3_V, &PHASE3_I));
        assert!(r3.last().unwrap() > r3.first().unwrap());
        assert!(mean(&r3) > NOMINAL_R);
    }

    #[test]
    fn lab_writes_all_charts() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = LabContext::new(
            super::super::LabId::Ohm,
            dir.path(),
            crate::charts::StaticChartRenderer::new(30.0, "sans-serif"),
        );
        let report = run(&ctx).unwrap();
        assert_eq!(report.charts.len(), 8);
        for chart in &report.charts {
            assert!(chart.exists(), "{}", chart.display());
        }
        let r = report.get("fase1_r_promedio").unwrap();
        assert!((r - 61.0).abs() < 2.0);
    }
}
