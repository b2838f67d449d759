//! Console summaries of each lab run.
//!
//! A [`Report`] is built while a lab runs and printed once at the end. The same
//! structure serialises to the optional JSON summary.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

const RULE_WIDTH: usize = 60;

/// Headers plus pre-formatted cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row<S: Into<String>>(&mut self, cells: impl IntoIterator<Item = S>) -> &mut Self {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }

    fn widths(&self) -> Vec<usize> {
        let cols = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0);
        (0..cols)
            .map(|c| {
                std::iter::once(&self.headers)
                    .chain(self.rows.iter())
                    .filter_map(|r| r.get(c))
                    .map(|s| s.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();
        write_row(f, &widths, &self.headers)?;
        let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        writeln!(f, "{}", "-".repeat(total))?;
        for row in &self.rows {
            write_row(f, &widths, row)?;
        }
        Ok(())
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, widths: &[usize], cells: &[String]) -> fmt::Result {
    let mut out = String::new();
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        let pad = " ".repeat(w - cell.chars().count());
        if i > 0 {
            out.push_str("  ");
        }
        // First column reads as a label, the rest as numbers
        if i == 0 {
            out.push_str(cell);
            out.push_str(&pad);
        } else {
            out.push_str(&pad);
            out.push_str(cell);
        }
    }
    writeln!(f, "{}", out.trim_end())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Section {
    pub heading: String,
    pub lines: Vec<String>,
    pub tables: Vec<Table>,
}

impl Section {
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            ..Self::default()
        }
    }

    pub fn line(&mut self, text: impl Into<String>) -> &mut Self {
        self.lines.push(text.into());
        self
    }

    pub fn table(&mut self, table: Table) -> &mut Self {
        self.tables.push(table);
        self
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.heading.is_empty() {
            writeln!(f, "\n--- {} ---", self.heading)?;
        }
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        for table in &self.tables {
            writeln!(f)?;
            write!(f, "{table}")?;
        }
        Ok(())
    }
}

/// Everything one lab run produced: text sections, headline numbers, chart paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub lab: String,
    pub title: String,
    pub sections: Vec<Section>,
    pub metrics: BTreeMap<String, f64>,
    pub charts: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

impl Report {
    pub fn new(lab: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            lab: lab.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Start a new section and return it for filling.
    pub fn section(&mut self, heading: impl Into<String>) -> &mut Section {
        self.sections.push(Section::new(heading));
        let last = self.sections.len() - 1;
        &mut self.sections[last]
    }

    /// Record a headline number; non-finite values are left out of the JSON.
    pub fn metric(&mut self, key: impl Into<String>, value: f64) {
        if value.is_finite() {
            self.metrics.insert(key.into(), value);
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).copied()
    }

    pub fn chart(&mut self, path: PathBuf) {
        self.charts.push(path);
    }

    /// Record a skipped step. Shows up in the report text and the log.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}: {}", self.lab, message);
        self.warnings.push(message);
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(f, "{rule}")?;
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{rule}")?;
        for section in &self.sections {
            write!(f, "{section}")?;
        }
        for warning in &self.warnings {
            writeln!(f, "[WARNING] {warning}")?;
        }
        if !self.charts.is_empty() {
            writeln!(f, "\nGraficas generadas: {}", self.charts.len())?;
            for chart in &self.charts {
                let name = chart
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| chart.display().to_string());
                writeln!(f, "  - {name}")?;
            }
        }
        Ok(())
    }
}

/// Write all reports as one pretty-printed JSON array.
pub fn write_summary(path: &Path, reports: &[Report]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, reports)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

/// `12.3456 ± 0.0123` with a fixed number of decimals.
pub fn pm(value: f64, error: f64, decimals: usize) -> String {
    format!("{value:.decimals$} ± {error:.decimals$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_aligns_columns() {
        let mut t = Table::new(["Punto", "R (Ω)"]);
        t.row(["1", "61.75"]).row(["10", "60.28"]);
        let text = t.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].chars().all(|c| c == '-'));
        assert_eq!(lines[2].chars().count(), lines[3].chars().count());
        assert!(lines[3].starts_with("10"));
    }

    #[test]
    fn report_renders_sections_and_warnings() {
        let mut r = Report::new("resistivity", "RESISTIVIDAD");
        r.section("Fase 1").line("rho = 1.0");
        r.warn("constantan 0.35 mm: sin corriente, se omite");
        r.chart(PathBuf::from("i3/graficas/R_vs_L.png"));
        let text = r.to_string();
        assert!(text.contains("--- Fase 1 ---"));
        assert!(text.contains("[WARNING] constantan"));
        assert!(text.contains("R_vs_L.png"));
    }

    #[test]
    fn metrics_skip_non_finite() {
        let mut r = Report::new("ohm", "OHM");
        r.metric("slope", 60.1);
        r.metric("bad", f64::NAN);
        assert_eq!(r.get("slope"), Some(60.1));
        assert_eq!(r.get("bad"), None);
    }

    #[test]
    fn summary_json_round_trips_as_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resumen.json");
        let mut r = Report::new("circuits", "CIRCUITOS");
        r.metric("req_series", 837.7);
        write_summary(&path, &[r]).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["lab"], "circuits");
        assert_eq!(value[0]["metrics"]["req_series"], 837.7);
    }

    #[test]
    fn pm_formats_uncertainty() {
        assert_eq!(pm(0.6263, 0.0123, 3), "0.626 ± 0.012");
    }
}
