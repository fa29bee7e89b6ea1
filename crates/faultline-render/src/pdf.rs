//! Paginated PDF synthesis for driver letters.
//!
//! Letters are laid out directly in PDF content operators using the base-14
//! Times fonts, so no font files need to ship with the binary. Glyph widths
//! are approximated per character class, which is close enough for greedy
//! word wrapping at letter sizes.
//!
//! Page structure:
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ ORGANISATION                 │  first page only
//! │ address / contact            │
//! │ ──────────────────────────── │
//! │ Date: / To: / Subject:       │
//! │ body ...                     │  flows across pages
//! │ Sincerely, / signature       │
//! │                              │
//! │ ──────────────────────────── │  every page
//! │ footer                       │
//! └──────────────────────────────┘
//! ```

use faultline_core::DriverLetterReport;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use crate::RenderError;
use crate::letterhead::{Letterhead, letter_date, subject_line};
use crate::markup::{Line, Span, parse_letter_body};

const REGULAR_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";

const ORG_SIZE: i64 = 16;
const HEADER_SIZE: i64 = 10;
const META_SIZE: i64 = 11;
const BODY_SIZE: i64 = 12;
const FOOTER_SIZE: i64 = 8;

/// Page dimensions in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    pub width: i64,
    pub height: i64,
    pub margin: i64,
}

impl Default for PageGeometry {
    /// A4 portrait with 50pt margins.
    fn default() -> Self {
        Self {
            width: 595,
            height: 842,
            margin: 50,
        }
    }
}

impl PageGeometry {
    fn text_width(&self) -> f64 {
        (self.width - 2 * self.margin) as f64
    }

    /// Lowest baseline available to flowing content, above the footer.
    fn content_floor(&self) -> i64 {
        self.margin + 3 * FOOTER_SIZE + 12
    }
}

/// Approximate advance width of `text` in points.
pub fn text_width(text: &str, size: i64, bold: bool) -> f64 {
    let em: f64 = text.chars().map(glyph_width).sum();
    let weight = if bold { 1.06 } else { 1.0 };
    em * weight * size as f64 / 1000.0
}

/// Approximate Times glyph width in thousandths of an em.
fn glyph_width(c: char) -> f64 {
    match c {
        ' ' => 250.0,
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '!' | '|' => 278.0,
        'f' | 't' | 'r' | '(' | ')' | '-' | '/' => 333.0,
        'm' | 'w' => 722.0,
        'M' | 'W' => 889.0,
        '0'..='9' => 500.0,
        'a'..='z' => 480.0,
        'A'..='Z' => 680.0,
        _ => 560.0,
    }
}

/// Greedy word wrap of a line of spans to `max_width` points.
///
/// Whitespace inside spans becomes single spaces; text glued across a span
/// boundary (`**bold**,`) stays glued. Words wider than a full line are
/// broken at character boundaries.
pub fn wrap_spans(spans: &[Span], size: i64, max_width: f64) -> Vec<Line> {
    let space = text_width(" ", size, false);
    let mut lines: Vec<Line> = Vec::new();
    let mut line: Line = Vec::new();
    let mut width = 0.0;
    let mut pending_space = false;

    for span in spans {
        for (i, piece) in span.text.split(char::is_whitespace).enumerate() {
            if i > 0 {
                pending_space = true;
            }
            if piece.is_empty() {
                continue;
            }

            for chunk in break_word(piece, size, span.bold, max_width) {
                let w = text_width(&chunk, size, span.bold);
                let mut gap = if pending_space && !line.is_empty() { space } else { 0.0 };
                if !line.is_empty() && width + gap + w > max_width {
                    lines.push(std::mem::take(&mut line));
                    width = 0.0;
                    gap = 0.0;
                }
                let text = if gap > 0.0 { format!(" {chunk}") } else { chunk };
                push_text(&mut line, text, span.bold);
                width += gap + w;
                pending_space = false;
            }
        }
    }

    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

fn break_word(word: &str, size: i64, bold: bool, max_width: f64) -> Vec<String> {
    if text_width(word, size, bold) <= max_width {
        return vec![word.to_string()];
    }
    let mut chunks = Vec::new();
    let mut current = String::new();
    for c in word.chars() {
        current.push(c);
        if text_width(&current, size, bold) > max_width && current.chars().count() > 1 {
            current.pop();
            chunks.push(std::mem::take(&mut current));
            current.push(c);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn push_text(line: &mut Line, text: String, bold: bool) {
    match line.last_mut() {
        Some(last) if last.bold == bold => last.text.push_str(&text),
        _ => line.push(Span { text, bold }),
    }
}

/// Map text to WinAnsiEncoding bytes for the base-14 fonts.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2026}' => 0x85,
            '\u{20AC}' => 0x80,
            c if (c as u32) < 0x80 && !c.is_control() => c as u8,
            c if (0xA0..=0xFF).contains(&(c as u32)) => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

/// Content operators for each page of one letter.
pub struct LetterLayout {
    geometry: PageGeometry,
    pages: Vec<Vec<Operation>>,
    ops: Vec<Operation>,
    y: i64,
    footer: Vec<Line>,
}

impl LetterLayout {
    /// Lay out a full letter.
    pub fn build(
        report: &DriverLetterReport,
        letterhead: &Letterhead,
        geometry: PageGeometry,
    ) -> Self {
        let footer = wrap_spans(
            &[Span::regular(letterhead.footer())],
            FOOTER_SIZE,
            geometry.text_width(),
        );
        let mut layout = Self {
            geometry,
            pages: Vec::new(),
            ops: Vec::new(),
            y: geometry.height - geometry.margin,
            footer,
        };

        layout.paragraph(&[Span::bold(&letterhead.organization)], ORG_SIZE, 20);
        layout.paragraph(&[Span::regular(&letterhead.address)], HEADER_SIZE, 13);
        layout.paragraph(&[Span::regular(&letterhead.contact)], HEADER_SIZE, 13);
        layout.rule(8);

        let date = letter_date(&report.timestamp);
        layout.labelled("Date:", &date);
        layout.labelled("To:", &report.title);
        layout.labelled("Subject:", &subject_line(report));
        layout.gap(10);

        for line in parse_letter_body(&report.content) {
            if line.is_empty() {
                layout.gap(BODY_SIZE);
            } else {
                layout.paragraph(&line, BODY_SIZE, 17);
            }
        }

        layout.gap(24);
        layout.paragraph(&[Span::regular("Sincerely,")], META_SIZE, 15);
        layout.gap(18);
        layout.paragraph(&[Span::bold(letterhead.signature())], META_SIZE, 15);

        layout.finish_page();
        layout
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[Vec<Operation>] {
        &self.pages
    }

    fn labelled(&mut self, label: &str, value: &str) {
        self.paragraph(
            &[Span::bold(label), Span::regular(format!(" {value}"))],
            META_SIZE,
            15,
        );
    }

    fn paragraph(&mut self, spans: &[Span], size: i64, leading: i64) {
        for line in wrap_spans(spans, size, self.geometry.text_width()) {
            if self.y - leading < self.geometry.content_floor() {
                self.finish_page();
            }
            self.y -= leading;
            let (x, y) = (self.geometry.margin, self.y);
            self.text_line(&line, x, y, size);
        }
    }

    fn gap(&mut self, points: i64) {
        self.y -= points;
    }

    fn rule(&mut self, below: i64) {
        self.y -= 6;
        let (x, y) = (self.geometry.margin, self.y);
        let width = self.geometry.width - 2 * self.geometry.margin;
        self.ops.push(Operation::new(
            "re",
            vec![x.into(), y.into(), width.into(), 1i64.into()],
        ));
        self.ops.push(Operation::new("f", vec![]));
        self.y -= below;
    }

    fn text_line(&mut self, line: &[Span], x: i64, y: i64, size: i64) {
        self.ops.push(Operation::new("BT", vec![]));
        self.ops
            .push(Operation::new("Td", vec![x.into(), y.into()]));
        for span in line {
            let font = if span.bold { BOLD_FONT } else { REGULAR_FONT };
            self.ops.push(Operation::new(
                "Tf",
                vec![Object::Name(font.as_bytes().to_vec()), size.into()],
            ));
            self.ops.push(Operation::new(
                "Tj",
                vec![Object::string_literal(encode_win_ansi(&span.text))],
            ));
        }
        self.ops.push(Operation::new("ET", vec![]));
    }

    fn finish_page(&mut self) {
        let margin = self.geometry.margin;
        let width = self.geometry.width - 2 * margin;
        let mut y = margin + (self.footer.len() as i64) * (FOOTER_SIZE + 2);
        self.ops.push(Operation::new(
            "re",
            vec![margin.into(), (y + 6).into(), width.into(), 1i64.into()],
        ));
        self.ops.push(Operation::new("f", vec![]));
        for line in self.footer.clone() {
            self.text_line(&line, margin, y, FOOTER_SIZE);
            y -= FOOTER_SIZE + 2;
        }

        self.pages.push(std::mem::take(&mut self.ops));
        self.y = self.geometry.height - self.geometry.margin;
    }
}

/// Render a letter to PDF bytes.
pub fn render_pdf(
    report: &DriverLetterReport,
    letterhead: &Letterhead,
    geometry: PageGeometry,
) -> Result<Vec<u8>, RenderError> {
    let layout = LetterLayout::build(report, letterhead, geometry);
    write_document(layout, &report.print_title())
}

fn write_document(layout: LetterLayout, title: &str) -> Result<Vec<u8>, RenderError> {
    let geometry = layout.geometry;
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Times-Roman",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Times-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR_FONT => regular_id,
            BOLD_FONT => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(layout.pages.len());
    for operations in layout.pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![
            0i64.into(),
            0i64.into(),
            geometry.width.into(),
            geometry.height.into(),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(encode_win_ansi(title)),
        "Producer" => Object::string_literal("faultline"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}
