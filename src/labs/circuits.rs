//! i4: series, parallel and mixed resistor networks.

use anyhow::Result;

use super::{positions, LabContext};
use crate::charts::colormap::{palette, MIXED_ORANGE, PARALLEL_TEAL, SERIES_BLUE};
use crate::charts::{Figure, GridMode, Layer, Panel};
use crate::physics::{parallel_resistance, ratio, series_resistance};
use crate::report::{Report, Table};
use crate::stats::mean;

const R1: f64 = 46.5;
const R2: f64 = 98.8;
const R3: f64 = 149.5;
const R4: f64 = 326.8;
const R5: f64 = 216.1;

/// Series network: current in mA, voltage in V.
const SERIES: [(&str, f64); 5] = [("R1", R1), ("R2", R2), ("R3", R3), ("R4", R4), ("R5", R5)];
const SERIES_I_MA: [f64; 5] = [389.2, 390.1, 386.9, 390.0, 389.2];
const SERIES_V: [f64; 5] = [0.019, 0.040, 0.088, 0.133, 0.067];

/// Parallel network without R4: current in µA across a common voltage.
const PARALLEL: [(&str, f64); 4] = [("R1", R1), ("R2", R2), ("R3", R3), ("R5", R5)];
const PARALLEL_I_UA: [f64; 4] = [153.7, 85.3, 64.1, 49.2];
const PARALLEL_V: f64 = 0.015;

/// Mixed network, reported on R1, R2, R3 and R5.
const MIXED_I_UA: [f64; 4] = [556.9, 156.2, 156.1, 156.3];
const MIXED_V: [f64; 4] = [0.027, 0.019, 0.059, 0.041];
const MIXED_REPORTED: f64 = 149.3;

const BAR_WIDTH: f64 = 0.35;

/// Two bars per resistor: a measurement beside what Ohm's law predicts.
fn paired_bars(
    title: String,
    y_label: &str,
    names: &[&str],
    measured: (&str, Vec<f64>),
    predicted: (&str, Vec<f64>),
) -> Panel {
    let x = positions(names.len());
    Panel::new(title)
        .y_label(y_label)
        .grid(GridMode::YOnly)
        .categories(names.iter().copied())
        .layer(
            Layer::bars(
                x.iter().map(|p| p - BAR_WIDTH / 2.0).collect(),
                measured.1,
                BAR_WIDTH,
                palette(0),
            )
            .label(measured.0),
        )
        .layer(
            Layer::bars(
                x.iter().map(|p| p + BAR_WIDTH / 2.0).collect(),
                predicted.1,
                BAR_WIDTH,
                palette(1),
            )
            .label(predicted.0),
        )
}

pub fn run(ctx: &LabContext) -> Result<Report> {
    let mut report = Report::new("circuits", "I4 - CIRCUITOS SERIE, PARALELO Y MIXTO");

    // Series: one current through every resistor
    let series_names: Vec<&str> = SERIES.iter().map(|(n, _)| *n).collect();
    let series_r: Vec<f64> = SERIES.iter().map(|(_, r)| *r).collect();
    let i_avg = mean(&SERIES_I_MA) * 1e-3;
    let v_calc: Vec<f64> = series_r.iter().map(|r| i_avg * r).collect();
    ctx.save(
        &mut report,
        "serie_validacion",
        &Figure::single(
            (8.0, 4.5),
            paired_bars(
                format!("Serie: I_prom={:.1} mA", i_avg * 1e3),
                "Voltaje [V]",
                &series_names,
                ("V medido", SERIES_V.to_vec()),
                ("I_prom*R (Ohm)", v_calc.clone()),
            ),
        ),
    )?;
    let req_series = series_resistance(&series_r);

    // Parallel: one voltage across every branch
    let parallel_names: Vec<&str> = PARALLEL.iter().map(|(n, _)| *n).collect();
    let parallel_r: Vec<f64> = PARALLEL.iter().map(|(_, r)| *r).collect();
    let i_calc_ua: Vec<f64> = parallel_r.iter().map(|r| PARALLEL_V / r * 1e6).collect();
    ctx.save(
        &mut report,
        "paralelo_validacion",
        &Figure::single(
            (8.0, 4.5),
            paired_bars(
                format!("Paralelo: V_comun={PARALLEL_V:.3} V"),
                "Corriente [µA]",
                &parallel_names,
                ("I medido", PARALLEL_I_UA.to_vec()),
                ("V/R (Ohm)", i_calc_ua.clone()),
            ),
        ),
    )?;
    let req_parallel = parallel_resistance(&parallel_r);

    // Mixed: implied resistance V/I against the ohmmeter
    let r_implied: Vec<f64> = MIXED_V
        .iter()
        .zip(&MIXED_I_UA)
        .map(|(v, i)| ratio(*v, i * 1e-6).unwrap_or(f64::NAN))
        .collect();
    ctx.save(
        &mut report,
        "mixto_validacion",
        &Figure::single(
            (8.0, 4.5),
            paired_bars(
                "Mixto: consistencia de R por V/I".to_string(),
                "Resistencia [Ω]",
                &parallel_names,
                ("R medida (ohmetro)", parallel_r.clone()),
                ("V/I (Ohm)", r_implied.clone()),
            ),
        ),
    )?;

    let equivalents = [
        ("Serie", req_series),
        ("Paralelo", req_parallel.unwrap_or(0.0)),
        ("Mixto", MIXED_REPORTED),
    ];
    ctx.save(
        &mut report,
        "equivalentes",
        &Figure::single(
            (6.0, 4.5),
            Panel::new("Resistencias equivalentes")
                .y_label("R_eq [Ω]")
                .grid(GridMode::YOnly)
                .categories(equivalents.iter().map(|(n, _)| *n))
                .no_legend()
                .layer(
                    Layer::bars(
                        positions(equivalents.len()),
                        equivalents.iter().map(|(_, r)| *r).collect(),
                        0.8,
                        SERIES_BLUE,
                    )
                    .with_colors(vec![SERIES_BLUE, PARALLEL_TEAL, MIXED_ORANGE]),
                ),
        ),
    )?;

    {
        let s = report.section("SERIE");
        s.line(format!("Corriente promedio: {:.1} mA", i_avg * 1e3));
        let mut t = Table::new(["Resistor", "R (Ω)", "V medido (V)", "I_prom·R (V)"]);
        for i in 0..series_names.len() {
            t.row([
                series_names[i].to_string(),
                format!("{:.1}", series_r[i]),
                format!("{:.3}", SERIES_V[i]),
                format!("{:.3}", v_calc[i]),
            ]);
        }
        s.table(t);
    }
    {
        let s = report.section("PARALELO");
        s.line(format!("Voltaje común: {PARALLEL_V:.3} V"));
        let mut t = Table::new(["Resistor", "R (Ω)", "I medido (µA)", "V/R (µA)"]);
        for i in 0..parallel_names.len() {
            t.row([
                parallel_names[i].to_string(),
                format!("{:.1}", parallel_r[i]),
                format!("{:.1}", PARALLEL_I_UA[i]),
                format!("{:.1}", i_calc_ua[i]),
            ]);
        }
        s.table(t);
    }
    {
        let s = report.section("MIXTO");
        let mut t = Table::new(["Resistor", "R medida (Ω)", "V/I (Ω)"]);
        for i in 0..parallel_names.len() {
            t.row([
                parallel_names[i].to_string(),
                format!("{:.1}", parallel_r[i]),
                format!("{:.1}", r_implied[i]),
            ]);
        }
        s.table(t);
    }

    let s = report.section("RESISTENCIAS EQUIVALENTES");
    s.line(format!("Req serie   (calc) = {req_series:.2} ohm"));
    match req_parallel {
        Some(r) => s.line(format!("Req paralelo(calc) = {r:.2} ohm")),
        None => s.line("Req paralelo(calc) = indefinida"),
    };
    s.line(format!("Req mixto   (repo) = {MIXED_REPORTED:.2} ohm"));

    report.metric("req_serie", req_series);
    if let Some(r) = req_parallel {
        report.metric("req_paralelo", r);
    }
    report.metric("req_mixto", MIXED_REPORTED);

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalent_resistances() {
        let series: Vec<f64> = SERIES.iter().map(|(_, r)| *r).collect();
        assert!((series_resistance(&series) - 837.7).abs() < 1e-9);
        let parallel: Vec<f64> = PARALLEL.iter().map(|(_, r)| *r).collect();
        let req = parallel_resistance(&parallel).unwrap();
        assert!((req - 23.0).abs() < 0.5, "{req}");
    }

    #[test]
    fn lab_reports_equivalents() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = LabContext::new(
            super::super::LabId::Circuits,
            dir.path(),
            crate::charts::StaticChartRenderer::new(40.0, "sans-serif"),
        );
        let report = run(&ctx).unwrap();
        assert_eq!(report.charts.len(), 4);
        assert_eq!(report.get("req_mixto"), Some(149.3));
        assert!(report.to_string().contains("Req serie   (calc) = 837.70 ohm"));
    }
}
