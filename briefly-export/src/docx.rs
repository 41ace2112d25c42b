use crate::{DOCX_FILE_NAME, DOCX_MIME_TYPE, ExportError, ExportedDocument, REPORT_TITLE};
use docx_rs::{BreakType, Docx, Paragraph, Run, Style, StyleType};
use std::io::Cursor;

pub fn render(paragraphs: &[String]) -> Result<ExportedDocument, ExportError> {
    let title_style = Style::new("Title", StyleType::Paragraph)
        .name("Title")
        .size(52)
        .bold();

    let mut docx = Docx::new().add_style(title_style).add_paragraph(
        Paragraph::new()
            .style("Title")
            .add_run(Run::new().add_text(REPORT_TITLE)),
    );
    for p in paragraphs {
        docx = docx.add_paragraph(Paragraph::new().add_run(text_run(p)));
    }

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| ExportError::Docx(e.to_string()))?;
    Ok(ExportedDocument {
        file_name: DOCX_FILE_NAME,
        mime_type: DOCX_MIME_TYPE,
        bytes: buf.into_inner(),
    })
}

/// Single line breaks inside a paragraph become soft breaks.
fn text_run(text: &str) -> Run {
    let mut run = Run::new();
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line);
    }
    run
}
