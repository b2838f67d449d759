//! i7: step-up and step-down transformers, and power transfer under load.

use anyhow::Result;
use plotters::style::RGBColor;

use super::{positions, zip_points, LabContext};
use crate::charts::colormap::{BLACK, BLUE, GREEN, LIGHT_CORAL, RED, SKY_BLUE};
use crate::charts::{Figure, Layer, LineStyle, Panel};
use crate::physics::{efficiency, ratios};
use crate::report::{Report, Table};
use crate::stats::{argmax, argmin, mean, sample_std};

struct Winding {
    name: &'static str,
    title: &'static str,
    label: &'static str,
    vs: [f64; 5],
    vp: [f64; 5],
    k_theory: f64,
}

impl Winding {
    fn k(&self) -> Vec<f64> {
        ratios(&self.vs, &self.vp)
            .into_iter()
            .map(|k| k.unwrap_or(f64::NAN))
            .collect()
    }
}

const STEP_UP: Winding = Winding {
    name: "Elevador",
    title: "Transformador Elevador\n(Ns=500, Np=250)",
    label: "Elevador (Ns=500, Np=250)",
    vs: [4.786, 12.37, 19.60, 26.18, 39.42],
    vp: [2.578, 6.53, 10.24, 13.62, 20.38],
    k_theory: 2.0,
};

const STEP_DOWN: Winding = Winding {
    name: "Reductor",
    title: "Transformador Reductor\n(Ns=250, Np=500)",
    label: "Reductor (Ns=250, Np=500)",
    vs: [6.69, 10.43, 17.26, 21.96, 28.40],
    vp: [14.00, 21.62, 35.46, 44.86, 57.96],
    k_theory: 0.5,
};

/// Lamp loads on the step-down configuration.
const LOADS: [&str; 5] = [
    "3 Lámparas en serie",
    "2 Lámparas en serie",
    "1 Lámpara",
    "2 Lámparas en paralelo",
    "3 Lámparas en paralelo",
];
const IP: [f64; 5] = [0.117, 0.119, 0.163, 0.239, 0.416];
const PP: [f64; 5] = [7.02, 7.14, 9.78, 14.34, 25.12];
const IS: [f64; 5] = [0.135, 0.140, 0.235, 0.390, 0.796];
const PS: [f64; 5] = [3.94, 4.07, 6.79, 11.08, 21.09];

fn ratio_panel(winding: &Winding, color: RGBColor, x_max: f64, y: (f64, f64)) -> Panel {
    Panel::new(winding.title)
        .x_label("Voltaje primario Vp [V]")
        .y_label("Relación k = Vs/Vp")
        .x_range(0.0, x_max)
        .y_range(y.0, y.1)
        .layer(
            Layer::line(zip_points(&winding.vp, &winding.k()), color, LineStyle::Solid)
                .width(2)
                .with_markers()
                .label("Datos experimentales"),
        )
        .layer(
            Layer::hline(winding.k_theory, RED, LineStyle::Dashed)
                .width(2)
                .label(format!("Teórico k={:.1}", winding.k_theory)),
        )
}

/// A current/power curve with every point tagged by its load.
fn load_panel(
    title: &str,
    x_label: &str,
    y_label: &str,
    current: &[f64],
    power: &[f64],
    color: RGBColor,
) -> Panel {
    let mut panel = Panel::new(title)
        .x_label(x_label)
        .y_label(y_label)
        .no_legend()
        .layer(
            Layer::line(zip_points(current, power), color, LineStyle::Solid)
                .width(2)
                .with_markers(),
        );
    for (i, load) in LOADS.iter().enumerate() {
        panel.push(Layer::text((current[i], power[i]), *load).offset(5, -5));
    }
    panel
}

pub fn run(ctx: &LabContext) -> Result<Report> {
    let mut report = Report::new("transformer", "RESUMEN ESTADÍSTICO DE LOS DATOS");

    ctx.save(
        &mut report,
        "relacion_voltajes",
        &Figure::grid(
            (14.0, 6.0),
            1,
            2,
            vec![
                ratio_panel(&STEP_UP, BLUE, 25.0, (1.8, 2.1)),
                ratio_panel(&STEP_DOWN, GREEN, 65.0, (0.47, 0.50)),
            ],
        ),
    )?;

    let eff: Vec<f64> = PS
        .iter()
        .zip(&PP)
        .map(|(s, p)| efficiency(*s, *p).unwrap_or(f64::NAN))
        .collect();
    let x = positions(LOADS.len());
    let width = 0.35;
    let one_decimal = |values: &[f64], suffix: &str| -> Vec<String> {
        values.iter().map(|v| format!("{v:.1}{suffix}")).collect()
    };
    let power = Panel::new("Potencias del Transformador por Tipo de Carga")
        .x_label("Tipo de carga")
        .y_label("Potencia [W]")
        .categories(LOADS)
        .layer(
            Layer::bars(x.iter().map(|p| p - width / 2.0).collect(), PP.to_vec(), width, SKY_BLUE)
                .alpha(0.8)
                .label("Potencia primario (Pp)")
                .with_value_labels(one_decimal(&PP, "")),
        )
        .layer(
            Layer::bars(x.iter().map(|p| p + width / 2.0).collect(), PS.to_vec(), width, LIGHT_CORAL)
                .alpha(0.8)
                .label("Potencia secundario (Ps)")
                .with_value_labels(one_decimal(&PS, "")),
        );
    let efficiency_panel = Panel::new("Eficiencia del Transformador por Tipo de Carga")
        .x_label("Tipo de carga")
        .y_label("Eficiencia [%]")
        .categories(LOADS)
        .no_legend()
        .layer(
            Layer::bars(x.clone(), eff.clone(), 0.8, GREEN)
                .alpha(0.7)
                .label("Eficiencia")
                .with_value_labels(one_decimal(&eff, "%")),
        );
    ctx.save(
        &mut report,
        "eficiencia_potencia",
        &Figure::grid((12.0, 10.0), 2, 1, vec![power, efficiency_panel]),
    )?;

    let max_val = STEP_UP
        .vs
        .iter()
        .chain(&STEP_DOWN.vp)
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let mut comparison = Panel::new("Comparación de Relaciones de Transformación\nElevador vs Reductor")
        .x_label("Voltaje primario Vp [V]")
        .y_label("Voltaje secundario Vs [V]");
    for (winding, color) in [(&STEP_UP, BLUE), (&STEP_DOWN, GREEN)] {
        comparison.push(
            Layer::scatter(zip_points(&winding.vp, &winding.vs), color)
                .size(7)
                .label(format!("{} (experimental)", winding.name)),
        );
    }
    for (winding, color) in [(&STEP_UP, BLUE), (&STEP_DOWN, GREEN)] {
        let k = winding.k_theory;
        comparison.push(
            Layer::line(super::curve(0.0, 60.0, |vp| vp * k), color, LineStyle::Dashed)
                .width(2)
                .alpha(0.7)
                .label(format!("{} (teórico k={k:.1})", winding.name)),
        );
    }
    comparison.push(
        Layer::line(vec![(0.0, 0.0), (max_val, max_val)], BLACK, LineStyle::Dotted)
            .alpha(0.5)
            .label("Vs = Vp (k=1)"),
    );
    ctx.save(
        &mut report,
        "vs_vp_comparacion",
        &Figure::single((10.0, 8.0), comparison),
    )?;

    ctx.save(
        &mut report,
        "corriente_potencia",
        &Figure::grid(
            (14.0, 6.0),
            1,
            2,
            vec![
                load_panel(
                    "Potencia vs Corriente en Primario",
                    "Corriente primario Ip [A]",
                    "Potencia primario Pp [W]",
                    &IP,
                    &PP,
                    RED,
                ),
                load_panel(
                    "Potencia vs Corriente en Secundario",
                    "Corriente secundario Is [A]",
                    "Potencia secundario Ps [W]",
                    &IS,
                    &PS,
                    BLUE,
                ),
            ],
        ),
    )?;

    for (winding, key) in [(&STEP_UP, "elevador"), (&STEP_DOWN, "reductor")] {
        let k = winding.k();
        let k_mean = mean(&k);
        let error = (k_mean - winding.k_theory).abs() / winding.k_theory * 100.0;
        report
            .section(format!("Transformador {}", winding.name))
            .line(winding.label)
            .line(format!("k promedio: {k_mean:.3}"))
            .line(format!("k teórico: {:.3}", winding.k_theory))
            .line(format!("Error relativo: {error:.1}%"))
            .line(format!("Desviación estándar: {:.4}", sample_std(&k)));
        report.metric(format!("k_{key}"), k_mean);
        report.metric(format!("error_k_{key}"), error);
    }

    let mut table = Table::new(["Carga", "Pp (W)", "Ps (W)", "Pérdidas (W)", "η (%)"]);
    for i in 0..LOADS.len() {
        table.row([
            LOADS[i].to_string(),
            format!("{:.2}", PP[i]),
            format!("{:.2}", PS[i]),
            format!("{:.2}", PP[i] - PS[i]),
            format!("{:.1}", eff[i]),
        ]);
    }
    let eff_mean = mean(&eff);
    let s = report.section("Eficiencia del Transformador");
    s.line(format!("Eficiencia promedio: {eff_mean:.1}%"));
    if let (Some(hi), Some(lo)) = (argmax(&eff), argmin(&eff)) {
        s.line(format!("Eficiencia máxima: {:.1}% ({})", eff[hi], LOADS[hi]));
        s.line(format!("Eficiencia mínima: {:.1}% ({})", eff[lo], LOADS[lo]));
    }
    s.table(table);
    report.metric("eficiencia_promedio", eff_mean);

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_ratios_are_near_nominal() {
        assert!((mean(&STEP_UP.k()) - 2.0).abs() < 0.15);
        assert!((mean(&STEP_DOWN.k()) - 0.5).abs() < 0.03);
    }

    #[test]
    fn efficiency_peaks_with_three_parallel_lamps() {
        let eff: Vec<f64> = PS.iter().zip(&PP).map(|(s, p)| s / p * 100.0).collect();
        assert_eq!(argmax(&eff), Some(4));
        assert_eq!(argmin(&eff), Some(0));
    }

    #[test]
    fn lab_writes_four_charts() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = LabContext::new(
            super::super::LabId::Transformer,
            dir.path(),
            crate::charts::StaticChartRenderer::new(30.0, "sans-serif"),
        );
        let report = run(&ctx).unwrap();
        assert_eq!(report.charts.len(), 4);
        let eff = report.get("eficiencia_promedio").unwrap();
        assert!(eff > 55.0 && eff < 85.0, "{eff}");
    }
}
