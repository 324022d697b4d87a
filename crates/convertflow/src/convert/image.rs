//! Image re-encoding.

use std::io::Cursor;

use image::ImageFormat;

use crate::error::ConvertError;

/// Decode an uploaded image and re-encode it losslessly as PNG.
///
/// Accepts whatever the `image` build decodes (jpeg/png/gif/bmp/tiff/webp);
/// anything else fails as caller-fixable input.
pub fn reencode_to_png(image_bytes: &[u8]) -> Result<Vec<u8>, ConvertError> {
    let img = image::load_from_memory(image_bytes)
        .map_err(|e| ConvertError::invalid(format!("unable to decode image: {e}")))?;

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .map_err(|e| ConvertError::Internal(format!("PNG encoding failed: {e}")))?;
    Ok(out.into_inner())
}
