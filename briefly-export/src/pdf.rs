//! Letter-size PDF with the standard Helvetica fonts.
//!
//! Each paragraph is emitted as a text object (`BT` .. `ET`) inside a
//! marked-content sequence (`BDC` .. `EMC`) carrying the paragraph's `MCID`.
//! A paragraph taller than the remaining page continues on the next page in
//! another text object under the same `MCID`, so readers can rejoin it.

use crate::{ExportError, ExportedDocument, PDF_FILE_NAME, PDF_MIME_TYPE, REPORT_TITLE};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN: i64 = 72;
const TITLE_SIZE: i64 = 24;
const BODY_SIZE: i64 = 11;
const LEADING: i64 = 14;
const PARAGRAPH_GAP: i64 = 12;
/// Average Helvetica glyph is about half an em wide.
const CHARS_PER_LINE: usize = ((PAGE_WIDTH - 2 * MARGIN) * 2 / BODY_SIZE) as usize;

pub fn render(paragraphs: &[String]) -> Result<ExportedDocument, ExportError> {
    let mut layout = Layout::new();
    layout.title(REPORT_TITLE);
    for p in paragraphs {
        layout.paragraph(p);
    }
    let bytes = layout.finish()?;
    Ok(ExportedDocument {
        file_name: PDF_FILE_NAME,
        mime_type: PDF_MIME_TYPE,
        bytes,
    })
}

struct Layout {
    pages: Vec<Vec<Operation>>,
    y: i64,
    next_mcid: i64,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: PAGE_HEIGHT - MARGIN,
            next_mcid: 0,
        }
    }

    fn take_mcid(&mut self) -> i64 {
        let id = self.next_mcid;
        self.next_mcid += 1;
        id
    }

    fn current(&mut self) -> &mut Vec<Operation> {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn title(&mut self, text: &str) {
        self.y -= TITLE_SIZE;
        let y = self.y;
        let mcid = self.take_mcid();
        let ops = self.current();
        ops.push(begin_marked("H1", mcid));
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec!["F2".into(), TITLE_SIZE.into()]));
        ops.push(Operation::new("Td", vec![MARGIN.into(), y.into()]));
        ops.push(Operation::new("Tj", vec![Object::string_literal(encode_text(text))]));
        ops.push(Operation::new("ET", vec![]));
        ops.push(Operation::new("EMC", vec![]));
        self.y -= PARAGRAPH_GAP * 2;
    }

    fn paragraph(&mut self, text: &str) {
        let lines: Vec<String> = text
            .lines()
            .flat_map(|l| wrap(l.trim(), CHARS_PER_LINE))
            .collect();
        let height = LEADING * lines.len() as i64;
        // Start on a new page unless the page is fresh or the paragraph fits.
        if self.y - height < MARGIN && self.y < PAGE_HEIGHT - MARGIN {
            self.new_page();
        }

        let mcid = self.take_mcid();
        let mut remaining = lines.as_slice();
        while !remaining.is_empty() {
            let room = ((self.y - MARGIN) / LEADING).max(1) as usize;
            let (chunk, rest) = remaining.split_at(room.min(remaining.len()));
            self.text_block(mcid, chunk);
            remaining = rest;
            if !remaining.is_empty() {
                self.new_page();
            }
        }
        self.y -= PARAGRAPH_GAP;
    }

    fn text_block(&mut self, mcid: i64, lines: &[String]) {
        let top = self.y - BODY_SIZE;
        let ops = self.current();
        ops.push(begin_marked("P", mcid));
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec!["F1".into(), BODY_SIZE.into()]));
        ops.push(Operation::new("TL", vec![LEADING.into()]));
        ops.push(Operation::new("Td", vec![MARGIN.into(), top.into()]));
        for line in lines {
            ops.push(Operation::new("Tj", vec![Object::string_literal(encode_text(line))]));
            ops.push(Operation::new("T*", vec![]));
        }
        ops.push(Operation::new("ET", vec![]));
        ops.push(Operation::new("EMC", vec![]));
        self.y -= LEADING * lines.len() as i64;
    }

    fn finish(self) -> Result<Vec<u8>, ExportError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular = doc.add_object(font("Helvetica"));
        let bold = doc.add_object(font("Helvetica-Bold"));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => regular, "F2" => bold },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for operations in self.pages {
            let content = Content { operations };
            let encoded = content
                .encode()
                .map_err(|e| ExportError::Pdf(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id: ObjectId = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        Ok(bytes)
    }
}

fn begin_marked(tag: &str, mcid: i64) -> Operation {
    Operation::new(
        "BDC",
        vec![tag.into(), Object::Dictionary(dictionary! { "MCID" => mcid })],
    )
}

fn font(base: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Greedy word wrap; words longer than `width` are split.
fn wrap(line: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    for word in line.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if current_len > 0 {
                out.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(width);
            out.push(word.into_iter().collect());
            word = rest;
        }
        let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
        if needed > width && current_len > 0 {
            out.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }
    if current_len > 0 || out.is_empty() {
        out.push(current);
    }
    out
}

/// Map to single-byte WinAnsi; anything without a close equivalent becomes `?`.
fn encode_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' => out.push(b'\''),
            '\u{201C}' | '\u{201D}' => out.push(b'"'),
            '\u{2013}' | '\u{2014}' => out.push(b'-'),
            '\u{2026}' => out.extend_from_slice(b"..."),
            '\u{2022}' => out.push(b'*'),
            '\t' => out.push(b' '),
            c if (c as u32) < 0x20 => {}
            c if (c as u32) <= 0xFF => out.push(c as u32 as u8),
            _ => out.push(b'?'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_respects_width_and_keeps_words() {
        let lines = wrap("alpha beta gamma delta", 11);
        assert_eq!(lines, vec!["alpha beta", "gamma delta"]);
        assert_eq!(wrap("", 10), vec![String::new()]);
    }

    #[test]
    fn wrap_splits_overlong_words() {
        assert_eq!(wrap("abcdefgh ij", 3), vec!["abc", "def", "gh", "ij"]);
    }

    #[test]
    fn text_is_mapped_to_single_bytes() {
        assert_eq!(encode_text("café – “ok”"), b"caf\xe9 - \"ok\"".to_vec());
        assert_eq!(encode_text("日本"), b"??".to_vec());
    }
}
