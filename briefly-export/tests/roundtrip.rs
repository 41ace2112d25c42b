use briefly_export::{split_paragraphs, ExportedDocument, ReportExporter, REPORT_TITLE};
use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use lopdf::content::Content;
use lopdf::{Document, Object};

const REPORT: &str = "# Climate policy 2024\n\n\
    ## Key findings\n\n\
    Carbon pricing now covers nearly a quarter of global emissions.\nCoverage grew fastest in Asia.\n\n\
    \n\n   \n\n\
    ## Outlook\n\n\
    Expect further tightening of emissions caps through 2030.";

fn export() -> (ExportedDocument, ExportedDocument) {
    let mut docs = ReportExporter.export_all(REPORT).expect("export succeeds");
    let docx = docs.pop().expect("docx");
    let pdf = docs.pop().expect("pdf");
    (pdf, docx)
}

/// Paragraph texts in page order. Text objects sharing a marked-content
/// `MCID` are one paragraph continued across a page break.
fn pdf_paragraphs(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).expect("pdf parses");
    let mut paragraphs: Vec<(i64, String)> = Vec::new();
    for (_, page_id) in doc.get_pages() {
        let raw = doc.get_page_content(page_id).expect("page content");
        let content = Content::decode(&raw).expect("content decodes");
        let mut mcid = None;
        for op in content.operations {
            match op.operator.as_str() {
                "BDC" => {
                    mcid = op
                        .operands
                        .get(1)
                        .and_then(|o| o.as_dict().ok())
                        .and_then(|d| d.get(b"MCID").ok())
                        .and_then(|o| o.as_i64().ok());
                }
                "BT" => {
                    let id = mcid.expect("text object inside marked content");
                    if paragraphs.last().map(|(last, _)| *last) != Some(id) {
                        paragraphs.push((id, String::new()));
                    }
                }
                "Tj" => {
                    if let (Some((_, buf)), Some(Object::String(bytes, _))) =
                        (paragraphs.last_mut(), op.operands.first())
                    {
                        if !buf.is_empty() {
                            buf.push(' ');
                        }
                        buf.push_str(&String::from_utf8_lossy(bytes));
                    }
                }
                "EMC" => mcid = None,
                _ => {}
            }
        }
    }
    paragraphs.into_iter().map(|(_, text)| text).collect()
}

fn docx_paragraph_texts(bytes: &[u8]) -> Vec<String> {
    let docx = docx_rs::read_docx(bytes).expect("docx parses");
    docx.document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(p) => Some(
                p.children
                    .iter()
                    .filter_map(|c| match c {
                        ParagraphChild::Run(run) => Some(run),
                        _ => None,
                    })
                    .flat_map(|run| run.children.iter())
                    .filter_map(|c| match c {
                        RunChild::Text(t) => Some(t.text.clone()),
                        _ => None,
                    })
                    .collect::<String>(),
            ),
            _ => None,
        })
        .collect()
}

#[test]
fn pdf_has_title_then_one_marked_paragraph_per_segment() {
    let (pdf, _) = export();
    let blocks = pdf_paragraphs(&pdf.bytes);
    let expected = split_paragraphs(REPORT);

    assert_eq!(expected.len(), 4);
    assert_eq!(blocks.len(), expected.len() + 1);
    assert_eq!(blocks[0], REPORT_TITLE);
    assert_eq!(blocks[1], "# Climate policy 2024");
    assert_eq!(blocks[4], "Expect further tightening of emissions caps through 2030.");
}

#[test]
fn docx_has_title_then_one_paragraph_per_segment() {
    let (_, docx) = export();
    let texts = docx_paragraph_texts(&docx.bytes);
    let expected = split_paragraphs(REPORT);

    assert_eq!(texts.len(), expected.len() + 1);
    assert_eq!(texts[0], REPORT_TITLE);
    assert_eq!(texts[2], "Carbon pricing now covers nearly a quarter of global emissions.Coverage grew fastest in Asia.");
    assert_eq!(texts[4], expected[3]);
}

#[test]
fn long_reports_span_several_pdf_pages() {
    let paragraph = "Emissions trading ".repeat(40);
    let report = vec![paragraph.trim(); 30].join("\n\n");
    let docs = ReportExporter.export_all(&report).expect("export succeeds");

    let doc = Document::load_mem(&docs[0].bytes).expect("pdf parses");
    assert!(doc.get_pages().len() > 1);
}

#[test]
fn paragraph_longer_than_a_page_stays_one_pdf_paragraph() {
    let report = "Carbon markets expanded considerably across regions. ".repeat(120);
    let segments = split_paragraphs(&report);
    let docs = ReportExporter.export_all(&report).expect("export succeeds");

    let doc = Document::load_mem(&docs[0].bytes).expect("pdf parses");
    assert!(doc.get_pages().len() > 1);

    let paragraphs = pdf_paragraphs(&docs[0].bytes);
    assert_eq!(segments.len(), 1);
    assert_eq!(paragraphs.len(), segments.len() + 1);
    assert_eq!(paragraphs[1], segments[0]);
}
