//! Plain-text extraction from the workshop PDF.

use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{Config, ConfigError};

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("PDF not found: {0}")]
    NotFound(PathBuf),
    #[error("extracting text from {path}: {message}")]
    Extract { path: PathBuf, message: String },
    #[error("writing output {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Default paths could not be resolved from the config file.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ExtractError {
    /// Process exit status for each failure kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExtractError::NotFound(_) => 1,
            ExtractError::Extract { .. } => 2,
            ExtractError::Write { .. } => 3,
            ExtractError::Config(_) => 4,
        }
    }
}

/// Explicit paths win; the config file is only read when one is missing.
pub fn resolve_paths(
    input: Option<&Path>,
    output: Option<&Path>,
    config_file: Option<&Path>,
) -> Result<(PathBuf, PathBuf), ExtractError> {
    if let (Some(input), Some(output)) = (input, output) {
        return Ok((input.to_path_buf(), output.to_path_buf()));
    }
    let config = Config::load(config_file)?;
    Ok((
        input.map_or(config.pdf_input, Path::to_path_buf),
        output.map_or(config.pdf_output, Path::to_path_buf),
    ))
}

/// Extract all text from `input` into `output` (UTF-8). Returns the number of
/// characters written.
pub fn extract_pdf_text(input: &Path, output: &Path) -> Result<usize, ExtractError> {
    if !input.is_file() {
        return Err(ExtractError::NotFound(input.to_path_buf()));
    }

    // The parser panics on some malformed files
    let extracted = panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text(input)));
    let text = match extracted {
        Ok(Ok(text)) => text,
        Ok(Err(err)) => {
            return Err(ExtractError::Extract {
                path: input.to_path_buf(),
                message: err.to_string(),
            })
        }
        Err(payload) => {
            return Err(ExtractError::Extract {
                path: input.to_path_buf(),
                message: panic_message(payload.as_ref()),
            })
        }
    };
    log::debug!("extracted {} bytes from {}", text.len(), input.display());

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ExtractError::Write {
            path: output.to_path_buf(),
            source,
        })?;
    }
    fs::write(output, &text).map_err(|source| ExtractError::Write {
        path: output.to_path_buf(),
        source,
    })?;

    Ok(text.chars().count())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "parser panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_pdf_exits_with_one() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_pdf_text(&dir.path().join("F2W07.pdf"), &dir.path().join("out.txt"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::NotFound(_)));
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().starts_with("PDF not found: "));
    }

    #[test]
    fn garbage_pdf_exits_with_two() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.pdf");
        fs::write(&input, b"this is not a pdf").unwrap();
        let output = dir.path().join("out.txt");
        let err = extract_pdf_text(&input, &output).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(!output.exists());
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
    fn extracted_text_is_written_as_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("F2W07.pdf");
        fs::write(&input, one_page_pdf("Campo electrico")).unwrap();
        let output = dir.path().join("Taller_3").join("F2W07_extracted.txt");

        let chars = extract_pdf_text(&input, &output).unwrap();
        let text = fs::read_to_string(&output).unwrap();
        assert_eq!(text.chars().count(), chars);
        assert!(text.contains("Campo electrico"), "{text:?}");
    }

    #[test]
    fn unwritable_output_exits_with_three() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("F2W07.pdf");
        fs::write(&input, one_page_pdf("texto")).unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"file, not a directory").unwrap();

        let err = extract_pdf_text(&input, &blocker.join("out.txt")).unwrap_err();
        assert!(matches!(err, ExtractError::Write { .. }));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn explicit_paths_skip_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("labcharts.json");
        fs::write(&config, "{ not json").unwrap();
        let (input, output) = resolve_paths(
            Some(Path::new("a.pdf")),
            Some(Path::new("a.txt")),
            Some(config.as_path()),
        )
        .unwrap();
        assert_eq!(input, PathBuf::from("a.pdf"));
        assert_eq!(output, PathBuf::from("a.txt"));
    }

    #[test]
    fn broken_config_exits_with_four() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("labcharts.json");
        fs::write(&config, "{ not json").unwrap();
        let err = resolve_paths(Some(Path::new("a.pdf")), None, Some(config.as_path())).unwrap_err();
        assert!(matches!(err, ExtractError::Config(ConfigError::Parse { .. })));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn missing_paths_come_from_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("labcharts.json");
        fs::write(&config, r#"{ "pdf_output": "salida.txt" }"#).unwrap();
        let (input, output) =
            resolve_paths(Some(Path::new("a.pdf")), None, Some(config.as_path())).unwrap();
        assert_eq!(input, PathBuf::from("a.pdf"));
        assert_eq!(output, PathBuf::from("salida.txt"));
    }

    #[test]
    fn panic_payloads_become_messages() {
        let boxed: Box<dyn Any + Send> = Box::new("bad xref");
        assert_eq!(panic_message(boxed.as_ref()), "bad xref");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("eof"));
        assert_eq!(panic_message(boxed.as_ref()), "eof");
    }
}
