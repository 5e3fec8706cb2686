//! PDF synthesis from a title and body text

use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use super::text::{split_paragraphs, to_win_ansi, wrap_text};
use super::{PdfError, SectionDraft};

// US Letter, in points
const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN: i64 = 72;

const TITLE_FONT_SIZE: i64 = 18;
const TITLE_LEADING: i64 = 24;
const BODY_FONT_SIZE: i64 = 11;
const BODY_LEADING: i64 = 15;

/// Characters per line that fit the 468pt text column
const TITLE_LINE_CHARS: usize = 48;
const BODY_LINE_CHARS: usize = 85;

const PRODUCER: &str = "pdf-library-server";

/// Output of [`generate`]
#[derive(Debug, Clone)]
pub struct GeneratedPdf {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// One section per body paragraph, headed by the title
    pub sections: Vec<SectionDraft>,
}

#[derive(Debug, Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

#[derive(Debug)]
struct PlacedLine {
    font: Font,
    size: i64,
    y: i64,
    text: String,
}

/// Top-down line placement with page breaks
struct Layout {
    pages: Vec<Vec<PlacedLine>>,
    y: i64,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    /// Place a line and return the 1-based page it landed on
    fn place(&mut self, font: Font, size: i64, leading: i64, text: String) -> u32 {
        if self.y - leading < MARGIN {
            self.pages.push(Vec::new());
            self.y = PAGE_HEIGHT - MARGIN;
        }
        self.y -= leading;

        let y = self.y;
        if let Some(page) = self.pages.last_mut() {
            page.push(PlacedLine { font, size, y, text });
        }
        self.pages.len() as u32
    }

    fn skip(&mut self, leading: i64) {
        self.y -= leading;
    }
}

/// Lay out `title` and `content` and serialize the result as a PDF.
///
/// Paragraphs are separated by blank lines in `content`.
pub fn generate(title: &str, content: &str) -> Result<GeneratedPdf, PdfError> {
    let title = title.trim();
    let paragraphs = split_paragraphs(content);

    let mut layout = Layout::new();
    for line in wrap_text(title, TITLE_LINE_CHARS) {
        layout.place(Font::Bold, TITLE_FONT_SIZE, TITLE_LEADING, line);
    }
    layout.skip(BODY_LEADING);

    let mut sections = Vec::with_capacity(paragraphs.len());
    for (index, paragraph) in paragraphs.into_iter().enumerate() {
        if index > 0 {
            layout.skip(BODY_LEADING);
        }

        let mut first_page = None;
        for line in wrap_text(&paragraph, BODY_LINE_CHARS) {
            let page = layout.place(Font::Regular, BODY_FONT_SIZE, BODY_LEADING, line);
            first_page.get_or_insert(page);
        }

        sections.push(SectionDraft {
            page: first_page,
            heading: Some(title.to_string()),
            content: paragraph,
        });
    }

    let bytes = render(title, &layout.pages, Utc::now())?;

    Ok(GeneratedPdf {
        bytes,
        page_count: layout.pages.len(),
        sections,
    })
}

fn render(
    title: &str,
    pages: &[Vec<PlacedLine>],
    created_at: DateTime<Utc>,
) -> Result<Vec<u8>, PdfError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = add_font(&mut doc, "Helvetica");
    let bold_id = add_font(&mut doc, "Helvetica-Bold");
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            Font::Regular.resource_name() => regular_id,
            Font::Bold.resource_name() => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for lines in pages {
        let encoded = page_content(lines)
            .encode()
            .map_err(|e| PdfError::Generate(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let media_box: Vec<Object> = vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(PAGE_WIDTH),
            Object::Integer(PAGE_HEIGHT),
        ];
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => media_box,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.len() as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(to_win_ansi(title)),
        "Producer" => Object::string_literal(PRODUCER),
        "CreationDate" => Object::string_literal(created_at.format("D:%Y%m%d%H%M%SZ").to_string()),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| PdfError::Generate(e.to_string()))?;
    Ok(bytes)
}

fn add_font(doc: &mut Document, base_font: &str) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    })
}

/// One BT/ET block per line so extractors see line breaks
fn page_content(lines: &[PlacedLine]) -> Content {
    let mut operations = Vec::with_capacity(lines.len() * 5);
    for line in lines {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![line.font.resource_name().into(), Object::Integer(line.size)],
        ));
        operations.push(Operation::new(
            "Td",
            vec![Object::Integer(MARGIN), Object::Integer(line.y)],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(to_win_ansi(&line.text))],
        ));
        operations.push(Operation::new("ET", vec![]));
    }
    Content { operations }
}
