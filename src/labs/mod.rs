//! Labs - one module per workshop, each turning its literal readings into
//! charts and a report.

mod circuits;
mod current_resistance;
mod equipotential;
mod induction;
mod magnetic;
mod ohm;
mod resistivity;
mod transformer;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::charts::{Figure, StaticChartRenderer};
use crate::report::Report;
use crate::stats::{LinearFit, RegressionError};

/// Every lab the tool knows how to reproduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabId {
    Equipotential,
    Ohm,
    CurrentResistance,
    Resistivity,
    Circuits,
    Transformer,
    Magnetic,
    Induction,
}

impl LabId {
    pub const ALL: [LabId; 8] = [
        LabId::Equipotential,
        LabId::Ohm,
        LabId::CurrentResistance,
        LabId::Resistivity,
        LabId::Circuits,
        LabId::Transformer,
        LabId::Magnetic,
        LabId::Induction,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LabId::Equipotential => "equipotential",
            LabId::Ohm => "ohm",
            LabId::CurrentResistance => "current-resistance",
            LabId::Resistivity => "resistivity",
            LabId::Circuits => "circuits",
            LabId::Transformer => "transformer",
            LabId::Magnetic => "magnetic",
            LabId::Induction => "induction",
        }
    }

    /// Directory under the output root; charts go to `<dir>/graficas`.
    pub fn dir(&self) -> &'static str {
        match self {
            LabId::Equipotential => "Taller_1",
            LabId::Ohm => "Taller_2",
            LabId::CurrentResistance => "i2",
            LabId::Resistivity => "i3",
            LabId::Circuits => "i4",
            LabId::Transformer => "i7",
            LabId::Magnetic => "i9",
            LabId::Induction => "proyecto final",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            LabId::Equipotential => "Equipotential lines and electric field between electrodes",
            LabId::Ohm => "Ohm's law: ohmic resistor, I vs R, incandescent bulb",
            LabId::CurrentResistance => "Current vs resistance at constant voltage",
            LabId::Resistivity => "Resistivity of constantan and nickel-chrome wires",
            LabId::Circuits => "Series, parallel and mixed resistor networks",
            LabId::Transformer => "Step-up/step-down transformer ratio and efficiency",
            LabId::Magnetic => "Vacuum permeability from wire, loop and solenoid fields",
            LabId::Induction => "Electromagnetic induction: EMF vs speed and turns",
        }
    }

    /// Chart file stems the lab writes. `{wire}` stands for each resistivity sample.
    pub fn charts(&self) -> &'static [&'static str] {
        match self {
            LabId::Equipotential => &[
                "comparacion_potenciales",
                "analisis_incertidumbres",
                "mapeo_disco_disco",
                "mapeo_barra_barra",
                "mapeo_disco_barra",
                "analisis_campos_electricos",
                "analisis_precision",
            ],
            LabId::Ohm => &[
                "voltaje_vs_corriente_ohmico",
                "resistencia_vs_punto_ohmico",
                "corriente_vs_resistencia",
                "voltaje_vs_corriente_no_ohmico",
                "analisis_material_no_ohmico",
                "comparacion_ohmico_vs_no_ohmico",
                "analisis_completo_laboratorio",
                "resistencia_vs_voltaje_comparacion",
            ],
            LabId::CurrentResistance => &[
                "corriente_vs_resistencia",
                "corriente_vs_inverso_resistencia",
                "error_porcentual_vs_resistencia",
            ],
            LabId::Resistivity => &[
                "{wire}_fase1",
                "{wire}_fase2",
                "R_vs_L",
                "comparacion_resistividades",
            ],
            LabId::Circuits => &[
                "serie_validacion",
                "paralelo_validacion",
                "mixto_validacion",
                "equivalentes",
            ],
            LabId::Transformer => &[
                "relacion_voltajes",
                "eficiencia_potencia",
                "vs_vp_comparacion",
                "corriente_potencia",
            ],
            LabId::Magnetic => &[
                "conductor_rectilineo",
                "espiras_circulares",
                "solenoides",
                "comparacion_mu0",
            ],
            LabId::Induction => &[
                "voltaje_vs_velocidad",
                "voltaje_vs_espiras",
                "comparacion_teorica_experimental",
                "analisis_incertidumbres",
                "verificacion_proporcionalidad",
            ],
        }
    }
}

impl fmt::Display for LabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LabId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('_', "-");
        LabId::ALL
            .into_iter()
            .find(|lab| lab.name() == key || lab.dir().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<&str> = LabId::ALL.iter().map(|l| l.name()).collect();
                format!("unknown lab '{s}', expected one of: {}", names.join(", "))
            })
    }
}

/// Where a lab writes and how it draws.
pub struct LabContext {
    lab: LabId,
    chart_dir: PathBuf,
    renderer: StaticChartRenderer,
}

impl LabContext {
    pub fn new(lab: LabId, output_root: &Path, renderer: StaticChartRenderer) -> Self {
        Self {
            lab,
            chart_dir: output_root.join(lab.dir()).join("graficas"),
            renderer,
        }
    }

    pub fn chart_dir(&self) -> &Path {
        &self.chart_dir
    }

    pub fn chart_path(&self, stem: &str) -> PathBuf {
        self.chart_dir.join(format!("{stem}.png"))
    }

    /// Render `figure` as `<stem>.png` and record it in the report.
    pub fn save(&self, report: &mut Report, stem: &str, figure: &Figure) -> Result<PathBuf> {
        let path = self.chart_path(stem);
        let written = self
            .renderer
            .save(figure, &path)
            .with_context(|| format!("{}: rendering {stem}", self.lab))?;
        report.chart(written.clone());
        Ok(written)
    }
}

/// Run one lab, writing its charts under `output_root`.
pub fn run(lab: LabId, output_root: &Path, renderer: &StaticChartRenderer) -> Result<Report> {
    log::info!("running {} into {}", lab, output_root.join(lab.dir()).display());
    let ctx = LabContext::new(lab, output_root, renderer.clone());
    let report = match lab {
        LabId::Equipotential => equipotential::run(&ctx),
        LabId::Ohm => ohm::run(&ctx),
        LabId::CurrentResistance => current_resistance::run(&ctx),
        LabId::Resistivity => resistivity::run(&ctx),
        LabId::Circuits => circuits::run(&ctx),
        LabId::Transformer => transformer::run(&ctx),
        LabId::Magnetic => magnetic::run(&ctx),
        LabId::Induction => induction::run(&ctx),
    }
    .with_context(|| format!("lab {lab} failed"))?;
    log::info!("{}: {} charts written", lab, report.charts.len());
    Ok(report)
}

/// Fit or record why the fit was skipped.
pub(crate) fn fit_or_warn(
    report: &mut Report,
    what: &str,
    fit: Result<LinearFit, RegressionError>,
) -> Option<LinearFit> {
    match fit {
        Ok(fit) => Some(fit),
        Err(err) => {
            report.warn(format!("{what}: ajuste omitido ({err})"));
            None
        }
    }
}

/// `V = 60.12I + -0.34` style legend text.
pub(crate) fn equation(y: &str, x: &str, fit: &LinearFit, decimals: usize) -> String {
    format!(
        "{y} = {:.decimals$}{x} + {:.decimals$}",
        fit.slope, fit.intercept
    )
}

/// Elementwise `f(x)` sampled on a straight range, for theory curves.
pub(crate) fn curve(x0: f64, x1: f64, f: impl Fn(f64) -> f64) -> Vec<(f64, f64)> {
    crate::stats::linspace(x0, x1, 100)
        .into_iter()
        .map(|x| (x, f(x)))
        .collect()
}

pub(crate) fn zip_points(x: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
    x.iter().copied().zip(y.iter().copied()).collect()
}

/// Positions `0..n` for categorical axes.
pub(crate) fn positions(n: usize) -> Vec<f64> {
    (0..n).map(|i| i as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lab_ids_parse_by_name_and_dir() {
        assert_eq!("ohm".parse::<LabId>().unwrap(), LabId::Ohm);
        assert_eq!("current_resistance".parse::<LabId>().unwrap(), LabId::CurrentResistance);
        assert_eq!("Taller_1".parse::<LabId>().unwrap(), LabId::Equipotential);
        assert_eq!("i9".parse::<LabId>().unwrap(), LabId::Magnetic);
        assert!("optics".parse::<LabId>().unwrap_err().contains("expected one of"));
    }

    #[test]
    fn every_lab_has_unique_dir_and_charts() {
        let mut dirs: Vec<&str> = LabId::ALL.iter().map(|l| l.dir()).collect();
        dirs.sort();
        dirs.dedup();
        assert_eq!(dirs.len(), LabId::ALL.len());
        assert!(LabId::ALL.iter().all(|l| !l.charts().is_empty()));
    }

    #[test]
    fn chart_paths_live_under_graficas() {
        let ctx = LabContext::new(LabId::Ohm, Path::new("out"), StaticChartRenderer::default());
        assert_eq!(
            ctx.chart_path("voltaje_vs_corriente_ohmico"),
            Path::new("out/Taller_2/graficas/voltaje_vs_corriente_ohmico.png")
        );
    }

    #[test]
    fn equation_formats_sign_as_written() {
        let fit = crate::stats::linear_fit(&[0.0, 1.0], &[1.0, 3.0]).unwrap();
        assert_eq!(equation("V", "I", &fit, 2), "V = 2.00I + 1.00");
    }
}
