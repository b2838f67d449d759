use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn labcharts() -> Command {
    let mut cmd = Command::cargo_bin("labcharts").unwrap();
    cmd.env_remove("LABCHARTS_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    labcharts()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("extract-pdf"));
}

#[test]
fn list_shows_every_lab() {
    labcharts()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("equipotential"))
        .stdout(predicate::str::contains("proyecto final"))
        .stdout(predicate::str::contains("comparacion_mu0.png"));
}

#[test]
fn missing_pdf_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    labcharts()
        .current_dir(dir.path())
        .args(["extract-pdf", "--input", "missing.pdf", "--output", "out.txt"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ERROR: PDF not found: missing.pdf"));
    assert!(!dir.path().join("out.txt").exists());
}

/// A one-page PDF showing `text` in Helvetica, with a correct xref table.
fn one_page_pdf(text: &str) -> Vec<u8> {
    let content = format!("BT /F1 24 Tf 72 720 Td ({text}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len()),
    ];
    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }
    let xref = pdf.len();
    let mut tail = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        tail.push_str(&format!("{offset:010} 00000 n \n"));
    }
    tail.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
        objects.len() + 1
    ));
    pdf.extend_from_slice(tail.as_bytes());
    pdf
}

#[test]
fn extract_pdf_reports_written_chars() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("F2W07.pdf"), one_page_pdf("Ley de Faraday")).unwrap();
    let assert = labcharts()
        .current_dir(dir.path())
        .args(["extract-pdf", "--input", "F2W07.pdf", "--output", "texto/F2W07.txt"])
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with("Wrote texto/F2W07.txt ("));

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let reported: usize = stdout
        .trim()
        .rsplit_once('(')
        .and_then(|(_, tail)| tail.strip_suffix(" chars)"))
        .unwrap()
        .parse()
        .unwrap();
    let text = fs::read_to_string(dir.path().join("texto/F2W07.txt")).unwrap();
    assert_eq!(text.chars().count(), reported);
    assert!(text.contains("Ley de Faraday"), "{text:?}");
}

#[test]
fn extract_pdf_write_failure_exits_with_three() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("F2W07.pdf"), one_page_pdf("texto")).unwrap();
    fs::write(dir.path().join("blocker"), "file, not a directory").unwrap();
    labcharts()
        .current_dir(dir.path())
        .args(["extract-pdf", "--input", "F2W07.pdf", "--output", "blocker/out.txt"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("ERROR: writing output"));
}

#[test]
fn broken_config_is_not_reported_as_missing_pdf() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("labcharts.json"), "{ not json").unwrap();
    fs::write(dir.path().join("real.pdf"), one_page_pdf("texto")).unwrap();

    // Output path falls back to the config, which cannot be parsed
    labcharts()
        .current_dir(dir.path())
        .args(["extract-pdf", "--input", "real.pdf"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("ERROR: Failed to parse config file"));

    // Both paths given: the config is never read
    labcharts()
        .current_dir(dir.path())
        .args(["extract-pdf", "--input", "real.pdf", "--output", "o.txt"])
        .assert()
        .success();
    assert!(dir.path().join("o.txt").is_file());
}

#[test]
fn unknown_lab_fails() {
    let dir = tempfile::tempdir().unwrap();
    labcharts()
        .current_dir(dir.path())
        .args(["run", "optics"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown lab 'optics'"));
}

#[test]
fn run_writes_charts_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    labcharts()
        .current_dir(dir.path())
        .args(["run", "current-resistance", "--dpi", "40", "--summary-json", "--output-root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] Grafica guardada"))
        .stdout(predicate::str::contains("corriente_vs_inverso_resistencia.png"));
    assert!(dir
        .path()
        .join("i2/graficas/corriente_vs_resistencia.png")
        .is_file());
    assert!(dir.path().join("resumen.json").is_file());
}

#[test]
fn fit_reports_slope_of_a_csv() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("ohm.csv");
    fs::write(&csv, "I,V\n0.01,0.6\n0.02,1.2\n0.03,1.8\n0.04,\n0.05,3.0\n").unwrap();
    let png = dir.path().join("ajuste.png");
    labcharts()
        .current_dir(dir.path())
        .args(["fit", "--x", "I", "--y", "V", "--dpi", "40", "--output"])
        .arg(&png)
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 descartadas"))
        .stdout(predicate::str::contains("Pendiente:  60.000000"));
    assert!(png.is_file());
}

#[test]
fn fit_with_one_row_warns_without_chart() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("short.csv");
    fs::write(&csv, "x,y\n1.0,2.0\n").unwrap();
    labcharts()
        .current_dir(dir.path())
        .args(["fit", "--x", "x", "--y", "y", "--output-root"])
        .arg(dir.path())
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("[WARNING] ajuste omitido"));
    assert!(!dir.path().join("ajuste_y_vs_x.png").exists());
}
