//! Plain-text to document rendering.
//!
//! Builds the PDF object tree directly: one Helvetica font shared by every
//! page, one content stream per page, letter-size geometry.

use lopdf::{dictionary, Document, Object, Stream};

use crate::error::ConvertError;

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN: i64 = 50;
const FONT_SIZE: i64 = 12;
const LINE_HEIGHT: i64 = FONT_SIZE + 5;

/// Render text into a paginated PDF. Lines that do not fit on a page flow
/// onto the next one; an empty input still produces a single blank page.
pub fn text_to_pdf(text: &str) -> Result<Vec<u8>, ConvertError> {
    let lines: Vec<&str> = text.lines().collect();
    let lines_per_page = ((PAGE_HEIGHT - 2 * MARGIN) / LINE_HEIGHT).max(1) as usize;

    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    let blank: &[&str] = &[];
    let chunks: Vec<&[&str]> = if lines.is_empty() {
        vec![blank]
    } else {
        lines.chunks(lines_per_page).collect()
    };

    for page_lines in chunks {
        let mut ops = String::new();
        ops.push_str("BT\n");
        ops.push_str(&format!("/F1 {FONT_SIZE} Tf\n"));
        ops.push_str(&format!("{} {} Td\n", MARGIN, PAGE_HEIGHT - MARGIN));
        for line in page_lines {
            ops.push_str(&format!("({}) Tj\n", escape_pdf_text(line)));
            ops.push_str(&format!("0 -{LINE_HEIGHT} Td\n"));
        }
        ops.push_str("ET\n");

        let content_id = doc.add_object(Object::Stream(Stream::new(
            dictionary! {},
            ops.into_bytes(),
        )));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| ConvertError::Internal(format!("failed to serialize PDF: {e}")))?;
    Ok(buffer)
}

/// Escape the characters that delimit a PDF literal string, and flatten
/// anything outside Latin-1 (the standard Helvetica encoding can't carry
/// it) to `?`.
fn escape_pdf_text(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for ch in line.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\t' => out.push_str("    "),
            c if (c as u32) < 256 => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}
