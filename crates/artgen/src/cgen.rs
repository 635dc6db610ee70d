//! LVGL C source generation for the packed image data.
//!
//! Emits one `image<N>_map[]` byte array and `lv_img_dsc_t` descriptor per
//! image (1-bit indexed format, two-entry palette header), and rewrites the
//! `LV_IMG_DECLARE` block plus `anim_imgs[]` array in the companion widget
//! source.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use bitmap_pipeline::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use chrono::Local;
use tracing::{info, warn};

use crate::gallery::ConvertedImage;

/// Hex bytes emitted per line in the generated arrays.
const HEX_BYTES_PER_LINE: usize = 18;

/// Palette header size prepended by LVGL's 1-bit indexed format.
const PALETTE_BYTES: usize = 8;

/// Format packed bytes as indented C hex rows, no trailing comma at the end.
pub fn format_hex_data(data: &[u8]) -> String {
    let mut lines: Vec<String> = data
        .chunks(HEX_BYTES_PER_LINE)
        .map(|chunk| {
            let hex: Vec<String> = chunk.iter().map(|b| format!("0x{b:02x}")).collect();
            format!("  {}, ", hex.join(", "))
        })
        .collect();
    if let Some(last) = lines.last_mut() {
        *last = format!("{} ", last.trim_end().trim_end_matches(','));
    }
    lines.join("\n")
}

/// C array and descriptor for a single image.
pub fn image_entry(index: usize, data: &[u8]) -> String {
    let hex = format_hex_data(data);
    let data_size = data.len() + PALETTE_BYTES;
    format!(
        r#"
#ifndef LV_ATTRIBUTE_IMG_IMAGE{index}
#define LV_ATTRIBUTE_IMG_IMAGE{index}
#endif

const LV_ATTRIBUTE_MEM_ALIGN LV_ATTRIBUTE_LARGE_CONST LV_ATTRIBUTE_IMG_IMAGE{index} uint8_t image{index}_map[] = {{
#if CONFIG_NICE_VIEW_WIDGET_INVERTED
        0xff, 0xff, 0xff, 0xff, /*Color of index 0*/
        0x00, 0x00, 0x00, 0xff, /*Color of index 1*/
#else
        0x00, 0x00, 0x00, 0xff, /*Color of index 0*/
        0xff, 0xff, 0xff, 0xff, /*Color of index 1*/
#endif

{hex}
}};

const lv_img_dsc_t image{index} = {{
  .header.cf = LV_IMG_CF_INDEXED_1BIT,
  .header.always_zero = 0,
  .header.reserved = 0,
  .header.w = {DISPLAY_WIDTH},
  .header.h = {DISPLAY_HEIGHT},
  .data_size = {data_size},  // +8 for color palette
  .data = image{index}_map,
}};
"#
    )
}

/// Write the complete generated C file.
pub fn write_art_file(path: &Path, converted: &[ConvertedImage]) -> Result<()> {
    let mut content = format!(
        r#"/*
 * Generated by artgen on {} -- do not edit by hand.
 */

#include <lvgl.h>

#ifndef LV_ATTRIBUTE_MEM_ALIGN
#define LV_ATTRIBUTE_MEM_ALIGN
#endif
"#,
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    for item in converted {
        content.push_str(&image_entry(item.index, &item.packed));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    info!(file = %path.display(), images = converted.len(), "Wrote art file");
    Ok(())
}

/// Replace the `LV_IMG_DECLARE` block and `anim_imgs[]` array in the widget
/// source with one entry per surviving gallery index.
///
/// The indices come from the images that actually converted; a mid-batch
/// failure leaves a gap, and declaring a dense range instead would
/// reference `image<N>` symbols the generated art file never defines.
///
/// Returns false (with a warning) when the file or its anchor text is
/// missing; the gallery run still counts as successful.
pub fn update_declarations(path: &Path, indices: &[usize]) -> Result<bool> {
    if !path.exists() {
        warn!(file = %path.display(), "Widget source not found, skipping declaration update");
        return Ok(false);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;

    let Some(start) = content
        .find("LV_IMG_DECLARE(landscape")
        .or_else(|| content.find("LV_IMG_DECLARE(image"))
    else {
        warn!(file = %path.display(), "No LV_IMG_DECLARE block found, skipping");
        return Ok(false);
    };
    let Some(array_start) = content.find("const lv_img_dsc_t *anim_imgs[]") else {
        warn!(file = %path.display(), "No anim_imgs array found, skipping");
        return Ok(false);
    };
    let Some(array_end) = content[array_start..].find("};") else {
        warn!(file = %path.display(), "Unterminated anim_imgs array, skipping");
        return Ok(false);
    };
    let end = array_start + array_end + 2;

    let declarations: Vec<String> = indices
        .iter()
        .map(|i| format!("LV_IMG_DECLARE(image{i});"))
        .collect();
    let mut array_lines = vec!["const lv_img_dsc_t *anim_imgs[] = {".to_string()];
    array_lines.extend(indices.iter().map(|i| format!("    &image{i},")));
    array_lines.push("};".to_string());

    let new_content = format!(
        "{}{}\n\n{}\n{}",
        &content[..start],
        declarations.join("\n"),
        array_lines.join("\n"),
        &content[end..]
    );
    fs::write(path, new_content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(file = %path.display(), images = indices.len(), "Updated image declarations");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn converted(index: usize, packed: Vec<u8>) -> ConvertedImage {
        ConvertedImage {
            index,
            source: PathBuf::from(format!("image{index}.png")),
            geometry: bitmap_pipeline::fit_aspect((100, 50), (DISPLAY_WIDTH, DISPLAY_HEIGHT)),
            packed,
        }
    }

    #[test]
    fn hex_lines_hold_eighteen_bytes() {
        let data: Vec<u8> = (0..40).collect();
        let formatted = format_hex_data(&data);
        let lines: Vec<&str> = formatted.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].matches("0x").count(), 18);
        assert_eq!(lines[1].matches("0x").count(), 18);
        assert_eq!(lines[2].matches("0x").count(), 4);
    }

    #[test]
    fn last_hex_line_has_no_trailing_comma() {
        let formatted = format_hex_data(&[0x01, 0x02]);
        assert_eq!(formatted, "  0x01, 0x02 ");
    }

    #[test]
    fn image_entry_contains_descriptor_fields() {
        let entry = image_entry(3, &[0xff; 1260]);

        assert!(entry.contains("uint8_t image3_map[]"));
        assert!(entry.contains("const lv_img_dsc_t image3 = {"));
        assert!(entry.contains(".header.cf = LV_IMG_CF_INDEXED_1BIT"));
        assert!(entry.contains(".header.w = 68"));
        assert!(entry.contains(".header.h = 140"));
        // 1260 packed bytes + 8 palette bytes
        assert!(entry.contains(".data_size = 1268"));
        assert!(entry.contains("CONFIG_NICE_VIEW_WIDGET_INVERTED"));
    }

    #[test]
    fn art_file_includes_every_image() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("art.c");
        let images = vec![converted(1, vec![0x00; 4]), converted(2, vec![0xff; 4])];

        write_art_file(&path, &images).unwrap();
        let content = fs::read_to_string(&path).unwrap();

        assert!(content.contains("#include <lvgl.h>"));
        assert!(content.contains("image1_map"));
        assert!(content.contains("image2_map"));
    }

    const WIDGET_SOURCE: &str = r#"
#include <lvgl.h>

LV_IMG_DECLARE(landscape1);
LV_IMG_DECLARE(landscape2);

const lv_img_dsc_t *anim_imgs[] = {
    &landscape1,
    &landscape2,
};

void render(void) {}
"#;

    #[test]
    fn declarations_block_is_rewritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("peripheral_status.c");
        fs::write(&path, WIDGET_SOURCE).unwrap();

        assert!(update_declarations(&path, &[1, 2, 3]).unwrap());
        let content = fs::read_to_string(&path).unwrap();

        for i in 1..=3 {
            assert!(content.contains(&format!("LV_IMG_DECLARE(image{i});")));
            assert!(content.contains(&format!("    &image{i},")));
        }
        assert!(!content.contains("landscape1"));
        // Code after the array survives the splice
        assert!(content.contains("void render(void) {}"));
    }

    #[test]
    fn missing_anchor_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("peripheral_status.c");
        fs::write(&path, "#include <lvgl.h>\nvoid render(void) {}\n").unwrap();

        assert!(!update_declarations(&path, &[1, 2]).unwrap());
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "#include <lvgl.h>\nvoid render(void) {}\n");
    }

    #[test]
    fn missing_file_is_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("does_not_exist.c");
        assert!(!update_declarations(&path, &[1, 2]).unwrap());
    }

    #[test]
    fn declarations_follow_surviving_indices() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("peripheral_status.c");
        fs::write(&path, WIDGET_SOURCE).unwrap();

        // Image 2 failed to convert; its declaration must not appear.
        assert!(update_declarations(&path, &[1, 3]).unwrap());
        let content = fs::read_to_string(&path).unwrap();

        assert!(content.contains("LV_IMG_DECLARE(image1);"));
        assert!(content.contains("LV_IMG_DECLARE(image3);"));
        assert!(content.contains("    &image1,"));
        assert!(content.contains("    &image3,"));
        assert!(!content.contains("image2"));
    }
}
