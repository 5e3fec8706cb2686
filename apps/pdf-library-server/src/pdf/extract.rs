//! Title and section extraction from uploaded PDFs
//!
//! Text is read straight from each page's content stream so that line
//! positions survive: a vertical gap wider than the line spacing, or a change
//! of font size, starts a new paragraph.

use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::{Document, Encoding, Object, ObjectId};

use super::text::decode_pdf_string;
use super::{PdfError, SectionDraft};

/// Gaps wider than this many font sizes separate paragraphs
const PARAGRAPH_GAP: f32 = 1.6;

/// Font size assumed before any `Tf`
const DEFAULT_FONT_SIZE: f32 = 12.0;

/// Output of [`extract`]
#[derive(Debug, Clone)]
pub struct ExtractedPdf {
    pub page_count: usize,
    /// Title from the document Info dictionary
    pub title: Option<String>,
    /// Paragraphs of every page, in page order
    pub sections: Vec<SectionDraft>,
}

/// Parse `bytes` and collect the Info title and per-page paragraphs.
///
/// Pages whose text cannot be decoded are skipped rather than failing the
/// whole document.
pub fn extract(bytes: &[u8]) -> Result<ExtractedPdf, PdfError> {
    let doc = Document::load_mem(bytes).map_err(|e| PdfError::Parse(e.to_string()))?;
    let pages = doc.get_pages();

    let mut sections = Vec::new();
    for (&number, &page_id) in &pages {
        let lines = match page_lines(&doc, page_id) {
            Ok(lines) => lines,
            Err(e) => {
                tracing::debug!(page = number, error = %e, "Skipping page without extractable text");
                continue;
            }
        };

        for paragraph in group_paragraphs(&lines) {
            sections.push(SectionDraft {
                page: Some(number),
                heading: None,
                content: paragraph,
            });
        }
    }

    Ok(ExtractedPdf {
        page_count: pages.len(),
        title: info_title(&doc),
        sections,
    })
}

/// A run of text shown on one baseline
#[derive(Debug, Clone, PartialEq)]
struct TextLine {
    y: f32,
    size: f32,
    text: String,
}

/// Text state tracked while walking a content stream
struct TextCursor {
    line_y: f32,
    scale: f32,
    leading: f32,
    size: f32,
}

impl TextCursor {
    fn new() -> Self {
        Self {
            line_y: 0.0,
            scale: 1.0,
            leading: 0.0,
            size: DEFAULT_FONT_SIZE,
        }
    }

    fn begin_text(&mut self) {
        self.line_y = 0.0;
        self.scale = 1.0;
    }

    fn next_line(&mut self) {
        self.line_y -= self.leading * self.scale;
    }

    fn effective_size(&self) -> f32 {
        (self.size * self.scale).abs()
    }
}

fn page_lines(doc: &Document, page_id: ObjectId) -> lopdf::Result<Vec<TextLine>> {
    let encodings: BTreeMap<Vec<u8>, Encoding> = doc
        .get_page_fonts(page_id)?
        .into_iter()
        .filter_map(|(name, font)| font.get_font_encoding(doc).ok().map(|e| (name, e)))
        .collect();
    let content = Content::decode(&doc.get_page_content(page_id)?)?;

    let mut lines: Vec<TextLine> = Vec::new();
    let mut cursor = TextCursor::new();
    let mut encoding = None;

    for operation in &content.operations {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            "BT" => cursor.begin_text(),
            "Tf" => {
                encoding = operands
                    .first()
                    .and_then(|name| name.as_name().ok())
                    .and_then(|name| encodings.get(name));
                if let Some(size) = number(operands, 1) {
                    cursor.size = size;
                }
            }
            "TL" => {
                if let Some(leading) = number(operands, 0) {
                    cursor.leading = leading;
                }
            }
            "Td" | "TD" => {
                if let Some(ty) = number(operands, 1) {
                    cursor.line_y += ty * cursor.scale;
                    if operation.operator == "TD" {
                        cursor.leading = -ty;
                    }
                }
            }
            "Tm" => {
                if let (Some(d), Some(f)) = (number(operands, 3), number(operands, 5)) {
                    cursor.scale = if d == 0.0 { 1.0 } else { d.abs() };
                    cursor.line_y = f;
                }
            }
            "T*" => cursor.next_line(),
            "Tj" | "TJ" | "'" | "\"" => {
                if operation.operator != "Tj" && operation.operator != "TJ" {
                    cursor.next_line();
                }
                let Some(encoding) = encoding else {
                    continue;
                };
                let mut text = String::new();
                show_text(&mut text, encoding, operands)?;
                push_text(&mut lines, &cursor, &text);
            }
            _ => {}
        }
    }

    Ok(lines)
}

fn number(operands: &[Object], index: usize) -> Option<f32> {
    operands.get(index).and_then(|o| o.as_float().ok())
}

fn show_text(text: &mut String, encoding: &Encoding, operands: &[Object]) -> lopdf::Result<()> {
    for operand in operands {
        match operand {
            Object::String(bytes, _) => text.push_str(&Document::decode_text(encoding, bytes)?),
            Object::Array(items) => show_text(text, encoding, items)?,
            // Large negative kerning in TJ arrays is a word space
            Object::Integer(_) | Object::Real(_) => {
                if operand.as_float().unwrap_or_default() < -100.0 {
                    text.push(' ');
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn push_text(lines: &mut Vec<TextLine>, cursor: &TextCursor, text: &str) {
    if text.trim().is_empty() {
        return;
    }

    match lines.last_mut() {
        Some(line) if (line.y - cursor.line_y).abs() < 0.5 => line.text.push_str(text),
        _ => lines.push(TextLine {
            y: cursor.line_y,
            size: cursor.effective_size(),
            text: text.to_string(),
        }),
    }
}

/// Join consecutive lines into paragraphs, whitespace collapsed
fn group_paragraphs(lines: &[TextLine]) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut previous: Option<&TextLine> = None;

    for line in lines {
        if let Some(prev) = previous {
            if starts_paragraph(prev, line) {
                flush(&mut current, &mut paragraphs);
            }
        }
        current.push(&line.text);
        previous = Some(line);
    }
    flush(&mut current, &mut paragraphs);

    paragraphs
}

fn starts_paragraph(prev: &TextLine, line: &TextLine) -> bool {
    let gap = prev.y - line.y;
    let size = prev.size.min(line.size).max(1.0);

    (prev.size - line.size).abs() > 0.5 || gap < 0.0 || gap > size * PARAGRAPH_GAP
}

fn flush(lines: &mut Vec<&str>, paragraphs: &mut Vec<String>) {
    let joined = lines
        .iter()
        .flat_map(|line| line.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ");
    lines.clear();

    if !joined.is_empty() {
        paragraphs.push(joined);
    }
}

fn info_title(doc: &Document) -> Option<String> {
    let info = match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok()?,
        Object::Dictionary(dict) => dict,
        _ => return None,
    };

    match info.get(b"Title").ok()? {
        Object::String(bytes, _) => {
            let title = decode_pdf_string(bytes).trim().to_string();
            (!title.is_empty()).then_some(title)
        }
        _ => None,
    }
}
