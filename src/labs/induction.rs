//! Proyecto final: electromagnetic induction and Faraday's law.
//!
//! A magnet falls through a coil. Phase 1 changes the drop height (speed) with
//! 200 turns; phase 2 drops from 30 cm through coils of 200, 400 and 600 turns.

use anyhow::Result;

use super::{fit_or_warn, positions, LabContext};
use crate::charts::colormap::{BLACK, BLUE, GREEN, RED};
use crate::charts::{Figure, GridMode, Layer, LineStyle, Marker, Panel};
use crate::data::MeasurementSet;
use crate::physics::{faraday_emf_mv, ratios, wire_area};
use crate::report::{pm, Report, Table};
use crate::stats::{mean, population_std};

const HEIGHT_CM: [f64; 5] = [10.0, 20.0, 30.0, 40.0, 50.0];
const SPEED: [f64; 5] = [1.40, 1.98, 2.43, 2.80, 3.13];
const EMF_SPEED_MV: [f64; 5] = [8.20, 12.30, 15.80, 18.50, 21.20];
/// Estimated from the spread of repeated drops.
const EMF_SPEED_UNC_MV: [f64; 5] = [0.08, 0.10, 0.12, 0.14, 0.16];

const TURNS: [f64; 3] = [200.0, 400.0, 600.0];
const EMF_TURNS_MV: [f64; 3] = [15.83, 31.25, 47.05];
const EMF_TURNS_UNC_MV: [f64; 3] = [0.10, 0.12, 0.13];

/// Magnet field estimate, T.
const FIELD: f64 = 0.2;
/// Coil radius and length, m.
const COIL_RADIUS: f64 = 0.015;
const COIL_LENGTH: f64 = 0.05;
/// Mean magnet speed at 30 cm, m/s.
const MEAN_SPEED: f64 = 2.43;

/// Faraday estimate for each coil: N·B·A over the transit time.
fn theoretical_emf() -> Vec<f64> {
    let dt = COIL_LENGTH / MEAN_SPEED;
    let area = wire_area(2.0 * COIL_RADIUS);
    TURNS
        .iter()
        .map(|n| faraday_emf_mv(*n, FIELD, area, dt).unwrap_or(f64::NAN))
        .collect()
}

pub fn run(ctx: &LabContext) -> Result<Report> {
    let mut report = Report::new("induction", "INDUCCIÓN ELECTROMAGNÉTICA Y LEY DE FARADAY");

    let speed_set = MeasurementSet::new(&SPEED, &EMF_SPEED_MV).with_uncertainty(&EMF_SPEED_UNC_MV);
    let turns_set = MeasurementSet::new(&TURNS, &EMF_TURNS_MV).with_uncertainty(&EMF_TURNS_UNC_MV);

    let fit_speed = fit_or_warn(&mut report, "V vs velocidad", speed_set.fit());
    let fit_turns = fit_or_warn(&mut report, "V vs espiras", turns_set.fit());

    let mut speed_panel = Panel::new("Voltaje Inducido vs Velocidad del Imán\nBobina 1 (N = 200 espiras)")
        .x_label("Velocidad del imán (m/s)")
        .y_label("Voltaje inducido (mV)")
        .layer(
            Layer::scatter(speed_set.points(), BLUE)
                .size(8)
                .alpha(0.7)
                .label("Datos experimentales"),
        );
    if let (Some(fit), Some((lo, hi))) = (&fit_speed, speed_set.x_range()) {
        speed_panel.push(
            Layer::line(fit.line(lo, hi, 100), RED, LineStyle::Dashed)
                .width(2)
                .label(format!(
                    "Regresión lineal: V = {:.2}v + {:.2} (R² = {:.4})",
                    fit.slope, fit.intercept, fit.r_squared
                )),
        );
    }
    ctx.save(
        &mut report,
        "voltaje_vs_velocidad",
        &Figure::single((10.0, 6.0), speed_panel),
    )?;

    let turns_errors = turns_set.uncertainty().unwrap_or(&EMF_TURNS_UNC_MV[..]).to_vec();
    let mut turns_panel = Panel::new("Voltaje Inducido vs Número de Espiras\n(h = 30 cm constante)")
        .x_label("Número de espiras")
        .y_label("Voltaje inducido (mV)")
        .layer(
            Layer::error_bars(turns_set.points(), turns_errors.clone(), GREEN)
                .size(6)
                .alpha(0.7)
                .label("Datos experimentales"),
        );
    if let (Some(fit), Some((lo, hi))) = (&fit_turns, turns_set.x_range()) {
        turns_panel.push(
            Layer::line(fit.line(lo, hi, 100), RED, LineStyle::Dashed)
                .width(2)
                .label(format!(
                    "Regresión lineal: V = {:.4}N + {:.2} (R² = {:.4})",
                    fit.slope, fit.intercept, fit.r_squared
                )),
        );
    }
    ctx.save(
        &mut report,
        "voltaje_vs_espiras",
        &Figure::single((10.0, 6.0), turns_panel),
    )?;

    let theory = theoretical_emf();
    let x = positions(TURNS.len());
    let width = 0.35;
    let turn_labels: Vec<String> = TURNS.iter().map(|n| format!("{n:.0}")).collect();
    ctx.save(
        &mut report,
        "comparacion_teorica_experimental",
        &Figure::single(
            (10.0, 6.0),
            Panel::new("Comparación: Valores Experimentales vs Teóricos\n(Estimación basada en Ley de Faraday)")
                .x_label("Número de espiras")
                .y_label("Voltaje inducido (mV)")
                .grid(GridMode::YOnly)
                .categories(turn_labels.iter().cloned())
                .layer(
                    Layer::bars(
                        x.iter().map(|p| p - width / 2.0).collect(),
                        EMF_TURNS_MV.to_vec(),
                        width,
                        BLUE,
                    )
                    .alpha(0.7)
                    .label("Experimental")
                    .with_errors(turns_errors.clone()),
                )
                .layer(
                    Layer::bars(
                        x.iter().map(|p| p + width / 2.0).collect(),
                        theory.clone(),
                        width,
                        RED,
                    )
                    .alpha(0.7)
                    .label("Teórico (estimado)"),
                ),
        ),
    )?;

    ctx.save(
        &mut report,
        "analisis_incertidumbres",
        &Figure::grid(
            (12.0, 6.0),
            1,
            2,
            vec![
                Panel::new("Voltaje Inducido con Barras de Error\n(Fase 1: Variación de velocidad)")
                    .x_label("Velocidad del imán (m/s)")
                    .y_label("Voltaje inducido (mV)")
                    .layer(
                        Layer::error_bars(speed_set.points(), EMF_SPEED_UNC_MV.to_vec(), BLUE)
                            .size(6)
                            .alpha(0.7)
                            .label("Datos con incertidumbre"),
                    ),
                Panel::new("Voltaje Inducido con Barras de Error\n(Fase 2: Variación de espiras)")
                    .x_label("Número de espiras")
                    .y_label("Voltaje inducido (mV)")
                    .layer(
                        Layer::error_bars(turns_set.points(), turns_errors, GREEN)
                            .marker(Marker::Square)
                            .size(6)
                            .alpha(0.7)
                            .label("Datos con incertidumbre"),
                    ),
            ],
        ),
    )?;

    let per_turn: Vec<f64> = ratios(&EMF_TURNS_MV, &TURNS)
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();
    let per_turn_mean = mean(&per_turn);
    let per_turn_std = population_std(&per_turn);
    let coil_names: Vec<String> = TURNS.iter().map(|n| format!("{n:.0} espiras")).collect();
    ctx.save(
        &mut report,
        "verificacion_proporcionalidad",
        &Figure::single(
            (10.0, 6.0),
            Panel::new("Verificación de Proporcionalidad: V/N Constante\n(Confirma V ∝ N)")
                .x_label("Configuración de bobina")
                .y_label("V/N (mV/espira)")
                .grid(GridMode::YOnly)
                .categories(coil_names.iter().cloned())
                .layer(
                    Layer::bars(positions(TURNS.len()), per_turn.clone(), 0.8, BLUE)
                        .alpha(0.7)
                        .with_colors(vec![BLUE, GREEN, RED]),
                )
                .layer(
                    Layer::hline(per_turn_mean, BLACK, LineStyle::Dashed)
                        .width(2)
                        .label(format!(
                            "Promedio: {} mV/espira",
                            pm(per_turn_mean, per_turn_std, 4)
                        )),
                ),
        ),
    )?;

    let mut drops = Table::new(["h (cm)", "v (m/s)", "V (mV)"]);
    for i in 0..HEIGHT_CM.len() {
        drops.row([
            format!("{:.0}", HEIGHT_CM[i]),
            format!("{:.2}", SPEED[i]),
            pm(EMF_SPEED_MV[i], EMF_SPEED_UNC_MV[i], 2),
        ]);
    }
    let phase1 = report.section("Fase 1 - Voltaje vs Velocidad");
    if let Some(fit) = &fit_speed {
        phase1
            .line(format!("Pendiente: {} mV·s/m", pm(fit.slope, fit.slope_stderr, 2)))
            .line(format!("Coeficiente de determinación R²: {:.4}", fit.r_squared));
    }
    phase1.table(drops);
    if let Some(fit) = &fit_speed {
        report.metric("pendiente_velocidad", fit.slope);
        report.metric("r2_velocidad", fit.r_squared);
    }
    if let Some(fit) = &fit_turns {
        report
            .section("Fase 2 - Voltaje vs Espiras")
            .line(format!("Pendiente: {} mV/espira", pm(fit.slope, fit.slope_stderr, 4)))
            .line(format!("Coeficiente de determinación R²: {:.4}", fit.r_squared));
        report.metric("pendiente_espiras", fit.slope);
        report.metric("r2_espiras", fit.r_squared);
    }

    let mut table = Table::new(["N", "V exp (mV)", "V teórico (mV)", "V/N (mV/espira)"]);
    for i in 0..TURNS.len() {
        table.row([
            format!("{:.0}", TURNS[i]),
            pm(EMF_TURNS_MV[i], EMF_TURNS_UNC_MV[i], 2),
            format!("{:.2}", theory[i]),
            format!("{:.4}", per_turn[i]),
        ]);
    }
    report
        .section("Proporcionalidad V/N")
        .line(format!(
            "Valor promedio: {} mV/espira",
            pm(per_turn_mean, per_turn_std, 4)
        ))
        .table(table);
    report.metric("v_por_espira", per_turn_mean);
    report.metric("v_por_espira_std", per_turn_std);

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emf_grows_linearly_with_turns() {
        let fit = MeasurementSet::new(&TURNS, &EMF_TURNS_MV).fit().unwrap();
        assert!((fit.slope - 0.0781).abs() < 0.001, "{}", fit.slope);
        assert!(fit.r_squared > 0.999);
    }

    #[test]
    fn faraday_estimate_scales_with_turns() {
        let theory = theoretical_emf();
        assert!((theory[1] / theory[0] - 2.0).abs() < 1e-12);
        // 200 · 0.2 · π·0.015² / (0.05/2.43) · 1000
        assert!((theory[0] - 1374.0).abs() < 1.0, "{}", theory[0]);
    }

    #[test]
    fn lab_reports_slopes_and_ratio() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = LabContext::new(
            super::super::LabId::Induction,
            dir.path(),
            crate::charts::StaticChartRenderer::new(30.0, "sans-serif"),
        );
        let report = run(&ctx).unwrap();
        assert_eq!(report.charts.len(), 5);
        let ratio = report.get("v_por_espira").unwrap();
        assert!((ratio - 0.0787).abs() < 0.001, "{ratio}");
    }
}
