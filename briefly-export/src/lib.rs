//! Report export to PDF and DOCX.
//!
//! Both formats share one layout: a "Research Report" title followed by the
//! report body split on blank lines, one document paragraph per non-blank
//! segment. No markup in the report is interpreted.

pub mod docx;
pub mod pdf;

use std::path::{Path, PathBuf};

pub const REPORT_TITLE: &str = "Research Report";

pub const PDF_FILE_NAME: &str = "research_report.pdf";
pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const DOCX_FILE_NAME: &str = "research_report.docx";
pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("pdf rendering failed: {0}")]
    Pdf(String),

    #[error("docx rendering failed: {0}")]
    Docx(String),

    #[error("writing {path} failed: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A rendered artifact ready to be saved or offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocument {
    pub file_name: &'static str,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Body paragraphs: segments between blank lines, trimmed, blanks dropped.
///
/// ```
/// use briefly_export::split_paragraphs;
///
/// let parts = split_paragraphs("# Title\n\nFirst line\nsecond line\n\n\n  \n\nLast");
/// assert_eq!(parts, vec!["# Title", "First line\nsecond line", "Last"]);
/// ```
pub fn split_paragraphs(report: &str) -> Vec<String> {
    report
        .replace("\r\n", "\n")
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Renders both artifacts from one report.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportExporter;

impl ReportExporter {
    pub fn export_all(&self, report: &str) -> Result<Vec<ExportedDocument>, ExportError> {
        let paragraphs = split_paragraphs(report);
        let docs = vec![pdf::render(&paragraphs)?, docx::render(&paragraphs)?];
        for d in &docs {
            tracing::debug!(
                file = d.file_name,
                bytes = d.bytes.len(),
                paragraphs = paragraphs.len(),
                "export.rendered"
            );
        }
        Ok(docs)
    }
}

/// Save artifacts under `dir` using their canonical names.
pub fn write_all(docs: &[ExportedDocument], dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    docs.iter()
        .map(|d| {
            let path = dir.join(d.file_name);
            std::fs::write(&path, &d.bytes).map_err(|source| ExportError::Write {
                path: path.clone(),
                source,
            })?;
            tracing::info!(path = %path.display(), bytes = d.bytes.len(), "export.written");
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crlf_reports_split_like_lf() {
        assert_eq!(
            split_paragraphs("one\r\n\r\ntwo"),
            vec!["one".to_string(), "two".to_string()]
        );
    }

    #[test]
    fn whitespace_only_report_has_no_paragraphs() {
        assert!(split_paragraphs(" \n\n\t\n\n").is_empty());
    }

    #[test]
    fn exports_both_formats_in_order() {
        let docs = ReportExporter.export_all("Body.").unwrap();
        let names: Vec<_> = docs.iter().map(|d| (d.file_name, d.mime_type)).collect();
        assert_eq!(
            names,
            vec![(PDF_FILE_NAME, PDF_MIME_TYPE), (DOCX_FILE_NAME, DOCX_MIME_TYPE)]
        );
        assert!(docs[0].bytes.starts_with(b"%PDF"));
        assert!(docs[1].bytes.starts_with(b"PK"));
    }

    #[test]
    fn writes_artifacts_with_canonical_names() {
        let dir = tempfile::tempdir().unwrap();
        let docs = ReportExporter.export_all("Body.").unwrap();
        let paths = write_all(&docs, &dir.path().join("out")).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(dir.path().join("out").join(PDF_FILE_NAME).is_file());
        assert!(dir.path().join("out").join(DOCX_FILE_NAME).is_file());
    }
}
