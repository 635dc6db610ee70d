//! Byte-accurate preview images.
//!
//! Previews are reconstructed from the packed bytes, never from the
//! pre-pack bitmap, so they show exactly what the display will render.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use bitmap_pipeline::{DISPLAY_HEIGHT, DISPLAY_WIDTH, decode_for_preview};
use tracing::{debug, info};

use crate::gallery::ConvertedImage;

/// Write one preview PNG per converted image into `<art_dir>/previews/`.
pub fn write_previews(art_dir: &Path, converted: &[ConvertedImage]) -> Result<()> {
    let dir = art_dir.join("previews");
    fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    for item in converted {
        let img = decode_for_preview(&item.packed, DISPLAY_WIDTH, DISPLAY_HEIGHT);
        let stem = item
            .source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        let name = format!("image{}_preview_{stem}.png", item.index);
        img.save(dir.join(&name))
            .with_context(|| format!("failed to save preview {name}"))?;
        debug!(%name, "Saved byte-accurate preview");
    }

    info!(count = converted.len(), dir = %dir.display(), "Saved previews");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitmap_pipeline::pack_1bit;
    use image::{GrayImage, Luma};
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn preview_reconstructs_the_packed_bitmap() {
        let dir = tempdir().unwrap();
        let bitmap = GrayImage::from_fn(DISPLAY_WIDTH, DISPLAY_HEIGHT, |x, y| {
            Luma([if (x + y) % 2 == 0 { 255 } else { 0 }])
        });
        let item = ConvertedImage {
            index: 1,
            source: PathBuf::from("image1.png"),
            packed: pack_1bit(&bitmap),
            geometry: bitmap_pipeline::Geometry::full((DISPLAY_WIDTH, DISPLAY_HEIGHT)),
        };

        write_previews(dir.path(), &[item]).unwrap();

        let path = dir.path().join("previews/image1_preview_image1.png");
        let reloaded = image::open(&path).unwrap().to_luma8();
        assert_eq!(reloaded, bitmap);
    }
}
