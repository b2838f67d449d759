use labcharts::charts::StaticChartRenderer;
use labcharts::labs::{self, LabId};
use labcharts::report::write_summary;

fn renderer() -> StaticChartRenderer {
    StaticChartRenderer::new(30.0, "sans-serif")
}

#[test]
fn every_lab_writes_its_declared_charts() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = renderer();
    for lab in LabId::ALL {
        let report = labs::run(lab, dir.path(), &renderer).unwrap();
        assert!(!report.charts.is_empty(), "{lab} wrote no charts");
        let graficas = dir.path().join(lab.dir()).join("graficas");
        for chart in &report.charts {
            assert!(chart.starts_with(&graficas), "{}", chart.display());
            let bytes = std::fs::read(chart).unwrap();
            assert_eq!(&bytes[1..4], b"PNG", "{}", chart.display());
        }
        for stem in lab.charts().iter().filter(|s| !s.contains('{')) {
            assert!(
                graficas.join(format!("{stem}.png")).is_file(),
                "{lab}: missing {stem}.png"
            );
        }
    }
}

#[test]
fn reruns_overwrite_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let first = labs::run(LabId::Circuits, dir.path(), &renderer()).unwrap();
    let second = labs::run(LabId::Circuits, dir.path(), &renderer()).unwrap();
    assert_eq!(first.charts, second.charts);
    let count = std::fs::read_dir(dir.path().join("i4").join("graficas"))
        .unwrap()
        .count();
    assert_eq!(count, first.charts.len());
}

#[test]
fn resistivity_skips_wires_without_current() {
    let dir = tempfile::tempdir().unwrap();
    let report = labs::run(LabId::Resistivity, dir.path(), &renderer()).unwrap();
    assert_eq!(report.warnings.len(), 2);
    assert!(report.to_string().contains("[WARNING]"));
    assert!(dir
        .path()
        .join("i3/graficas/constantan_04mm_fase1.png")
        .is_file());
}

#[test]
fn summary_json_lists_every_report() {
    let dir = tempfile::tempdir().unwrap();
    let reports: Vec<_> = [LabId::Transformer, LabId::Magnetic]
        .into_iter()
        .map(|lab| labs::run(lab, dir.path(), &renderer()).unwrap())
        .collect();
    let path = dir.path().join("resumen.json");
    write_summary(&path, &reports).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["lab"], "transformer");
    assert!(entries[1]["metrics"]["mu0_promedio"].as_f64().unwrap() > 0.0);
}
