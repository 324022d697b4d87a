//! Document text extraction.

use crate::error::ConvertError;

/// Extract the text of every page of a PDF, prefixed with a short document
/// header. The page markers keep the output readable for multi-page inputs.
pub fn pdf_to_text(original_name: &str, pdf_bytes: &[u8]) -> Result<Vec<u8>, ConvertError> {
    let doc = lopdf::Document::load_mem(pdf_bytes)
        .map_err(|e| ConvertError::invalid(format!("unable to parse PDF: {e}")))?;

    let pages = doc.get_pages();
    let mut out = format!(
        "PDF Document: {}\nPage Count: {}\n\n",
        original_name,
        pages.len()
    );

    for (page_num, _) in pages {
        out.push_str(&format!("--- Page {page_num} ---\n\n"));
        match doc.extract_text(&[page_num]) {
            Ok(text) => {
                out.push_str(text.trim_end());
                out.push('\n');
            }
            // A page with unextractable content (e.g. image-only) should not
            // sink the whole document.
            Err(_) => out.push_str("[no extractable text on this page]\n"),
        }
        out.push('\n');
    }

    Ok(out.into_bytes())
}
