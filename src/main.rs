//! labcharts - reproduce the physics lab charts and reports from the command line.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;

use labcharts::charts::colormap::RED;
use labcharts::charts::{Figure, Layer, LineStyle, Panel};
use labcharts::config::Config;
use labcharts::data::{DataLoader, DataProcessor, LoaderError};
use labcharts::labs::{self, LabId};
use labcharts::pdf::{extract_pdf_text, resolve_paths};
use labcharts::report::{pm, write_summary, Report};

fn cli() -> Command {
    Command::new("labcharts")
        .version(clap::crate_version!())
        .about("Physics lab measurement analysis & static chart generator")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .global(true)
                .help("JSON config file (defaults to ./labcharts.json when present)")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("output_root")
                .short('o')
                .long("output-root")
                .global(true)
                .help("Directory the lab folders are written under")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("dpi")
                .long("dpi")
                .global(true)
                .help("Chart resolution. Overrides the config file.")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("summary_json")
                .long("summary-json")
                .global(true)
                .help("Also write every report to <output-root>/resumen.json")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("open")
                .long("open")
                .global(true)
                .help("Open the chart folder when done")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .help("Debug logging")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("run")
                .about("Run one lab, or all of them")
                .arg(
                    Arg::new("lab")
                        .help("Lab name (see `labcharts list`) or `all`")
                        .required(true)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                ),
        )
        .subcommand(Command::new("list").about("List the labs and the charts each one writes"))
        .subcommand(
            Command::new("fit")
                .about("Fit two columns of a CSV file and chart the regression")
                .arg(
                    Arg::new("csv")
                        .help("CSV file with a header row")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("x")
                        .long("x")
                        .required(true)
                        .help("Column for the x axis")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("y")
                        .long("y")
                        .required(true)
                        .help("Column for the y axis")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("title")
                        .long("title")
                        .help("Chart title")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .help("PNG to write. Defaults to <output-root>/ajuste_<y>_vs_<x>.png")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("extract-pdf")
                .about("Extract the text of the workshop PDF")
                .arg(
                    Arg::new("input")
                        .long("input")
                        .help("PDF to read. Overrides the config file.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .help("Text file to write. Overrides the config file.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
}

fn main() -> ExitCode {
    let matches = cli().get_matches();

    let default_level = if matches.get_flag("verbose") {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::default()
        .filter_level(LevelFilter::Warn)
        .parse_env(env_logger::Env::default().filter_or("LABCHARTS_LOG", default_level))
        .init();

    match dispatch(&matches) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn dispatch(matches: &ArgMatches) -> Result<ExitCode> {
    // Reports its own exit codes, config failures included
    if let Some(("extract-pdf", sub)) = matches.subcommand() {
        return Ok(extract_pdf(sub));
    }

    let mut config = Config::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    config.apply_matches(matches)?;
    log::debug!("config: {config:?}");

    match matches.subcommand() {
        Some(("run", sub)) => {
            let lab = sub
                .get_one::<String>("lab")
                .ok_or_else(|| anyhow!("missing lab name"))?;
            run_labs(&config, matches, lab)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(("list", _)) => {
            list_labs();
            Ok(ExitCode::SUCCESS)
        }
        Some(("fit", sub)) => {
            fit_csv(&config, sub)?;
            Ok(ExitCode::SUCCESS)
        }
        _ => Err(anyhow!("unknown command")),
    }
}

fn extract_pdf(sub: &ArgMatches) -> ExitCode {
    let paths = resolve_paths(
        sub.get_one::<PathBuf>("input").map(PathBuf::as_path),
        sub.get_one::<PathBuf>("output").map(PathBuf::as_path),
        sub.get_one::<PathBuf>("config").map(PathBuf::as_path),
    );
    let result = paths.and_then(|(input, output)| {
        extract_pdf_text(&input, &output).map(|chars| (output, chars))
    });
    match result {
        Ok((output, chars)) => {
            println!("Wrote {} ({chars} chars)", output.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("ERROR: {err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn run_labs(config: &Config, matches: &ArgMatches, lab: &str) -> Result<()> {
    let selected: Vec<LabId> = if lab.eq_ignore_ascii_case("all") {
        LabId::ALL.to_vec()
    } else {
        vec![LabId::from_str(lab).map_err(|e| anyhow!(e))?]
    };

    let renderer = config.renderer();
    let mut reports: Vec<Report> = Vec::with_capacity(selected.len());
    for lab in &selected {
        let report = labs::run(*lab, &config.output_root, &renderer)?;
        println!("{report}");
        reports.push(report);
    }

    if matches.get_flag("summary_json") {
        let path = config.output_root.join("resumen.json");
        write_summary(&path, &reports)
            .with_context(|| format!("writing summary {}", path.display()))?;
        println!("Resumen JSON: {}", path.display());
    }

    if matches.get_flag("open") {
        let folder = match selected.as_slice() {
            [only] => config.output_root.join(only.dir()).join("graficas"),
            _ => config.output_root.clone(),
        };
        open_folder(&folder);
    }
    Ok(())
}

fn open_folder(folder: &Path) {
    if let Err(err) = open::that(folder) {
        log::warn!("could not open {}: {err}", folder.display());
    }
}

fn list_labs() {
    for lab in LabId::ALL {
        println!("{:<20}{:<16}{}", lab.name(), lab.dir(), lab.description());
        for chart in lab.charts() {
            println!("    {chart}.png");
        }
    }
}

fn fit_csv(config: &Config, matches: &ArgMatches) -> Result<()> {
    let csv = matches
        .get_one::<PathBuf>("csv")
        .ok_or_else(|| anyhow!("missing CSV path"))?;
    let (Some(x_col), Some(y_col)) = (
        matches.get_one::<String>("x"),
        matches.get_one::<String>("y"),
    ) else {
        return Err(anyhow!("both --x and --y are required"));
    };

    let mut loader = DataLoader::new();
    loader.load_csv(csv)?;
    let numeric = loader.get_numeric_columns();
    let df = loader.get_dataframe().ok_or(LoaderError::NoData)?;
    let pairs = DataProcessor::to_measurement_set(df, x_col, y_col)
        .with_context(|| format!("numeric columns in {}: {}", csv.display(), numeric.join(", ")))?;
    println!(
        "{}: {} filas, {} descartadas",
        csv.display(),
        pairs.total_rows,
        pairs.dropped_rows
    );

    let fit = match pairs.set.fit() {
        Ok(fit) => fit,
        Err(err) => {
            log::warn!("no fit for {y_col} vs {x_col}: {err}");
            println!("[WARNING] ajuste omitido: {err}");
            return Ok(());
        }
    };

    let title = matches.get_one::<String>("title").cloned().unwrap_or_else(|| {
        csv.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let mut panel = Panel::new(format!("{y_col} vs {x_col}"))
        .x_label(x_col.as_str())
        .y_label(y_col.as_str())
        .series(pairs.set.points(), "Datos experimentales");
    if let Some((lo, hi)) = pairs.set.x_range() {
        panel.push(
            Layer::line(fit.line(lo, hi, 100), RED, LineStyle::Solid)
                .width(2)
                .label(format!(
                    "y = {:.4}x + {:.4} (R² = {:.4})",
                    fit.slope, fit.intercept, fit.r_squared
                )),
        );
    }

    let output = matches.get_one::<PathBuf>("output").cloned().unwrap_or_else(|| {
        config
            .output_root
            .join(format!("ajuste_{y_col}_vs_{x_col}.png"))
    });
    config
        .renderer()
        .save(&Figure::single((10.0, 6.0), panel).title(title), &output)?;

    println!("Pendiente:  {}", pm(fit.slope, fit.slope_stderr, 6));
    println!("Intercepto: {}", pm(fit.intercept, fit.intercept_stderr, 6));
    println!("R²:         {:.6}", fit.r_squared);
    println!("n:          {}", fit.n);

    if matches.get_flag("open") {
        open_folder(&output);
    }
    Ok(())
}
