//! Art folder discovery, numbering, and the batch conversion drive.
//!
//! One image failing to decode or convert is logged and skipped; the rest of
//! the batch keeps going.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use bitmap_pipeline::{
    DISPLAY_HEIGHT, DISPLAY_WIDTH, DitherMethod, Geometry, ProcessingConfig, ScalingMethod,
    convert, decode_for_preview,
};
use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::cgen;
use crate::preview;

/// Image extensions the gallery accepts.
const SUPPORTED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

/// Leading number followed by `_` or `-`, as in `12_sunset.png`.
static NUMERIC_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)[_-]").expect("valid regex"));

/// One successfully converted gallery image.
pub struct ConvertedImage {
    /// 1-based position in the gallery.
    pub index: usize,
    pub source: PathBuf,
    pub packed: Vec<u8>,
    pub geometry: Geometry,
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Sort key: numeric-prefixed names first, ordered by the number then the
/// lowercased name; everything else after, alphabetically.
fn sort_key(path: &Path) -> (u8, u64, String) {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    match NUMERIC_PREFIX
        .captures(&name)
        .and_then(|caps| caps[1].parse::<u64>().ok())
    {
        Some(number) => (0, number, name.to_lowercase()),
        None => (1, 0, name.to_lowercase()),
    }
}

/// All supported images in `dir`, in gallery order.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_supported(path))
        .collect();
    files.sort_by_key(|path| sort_key(path));
    Ok(files)
}

/// Rename every gallery image to `image<N>.<ext>` in sorted order.
///
/// Runs in two phases (everything to temporary names, then to final names)
/// so a target name currently held by a different image never collides.
/// Returns the number of files renamed.
pub fn rename_to_sequence(dir: &Path) -> Result<usize> {
    let files = list_images(dir)?;

    let mut moves: Vec<(PathBuf, PathBuf)> = Vec::new();
    for (i, path) in files.iter().enumerate() {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let final_name = format!("image{}.{ext}", i + 1);
        if path.file_name().and_then(|n| n.to_str()) == Some(final_name.as_str()) {
            debug!(name = %final_name, "Already in final format, skipping");
            continue;
        }
        moves.push((path.clone(), path.with_file_name(final_name)));
    }

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::new();
    for (i, (from, to)) in moves.iter().enumerate() {
        let ext = from
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        // The directory may already hold a file with the staging name;
        // renaming onto it would silently destroy it.
        let mut temp = from.with_file_name(format!("artgen_staged_{i}.{ext}"));
        let mut attempt = 0u32;
        while temp.exists() {
            attempt += 1;
            temp = from.with_file_name(format!("artgen_staged_{i}_{attempt}.{ext}"));
        }
        fs::rename(from, &temp)
            .with_context(|| format!("failed to stage rename of {}", from.display()))?;
        staged.push((temp, to.clone()));
    }
    for (temp, to) in &staged {
        fs::rename(temp, to)
            .with_context(|| format!("failed to rename into {}", to.display()))?;
        info!(to = %to.display(), "Renamed");
    }

    Ok(staged.len())
}

/// Decode one source image and run it through the conversion pipeline.
pub fn convert_source(path: &Path, config: &ProcessingConfig) -> Result<(Vec<u8>, Geometry)> {
    let img = image::open(path)
        .with_context(|| format!("failed to decode {}", path.display()))?
        .to_luma8();
    let (packed, geometry) = convert(&img, (DISPLAY_WIDTH, DISPLAY_HEIGHT), config)?;
    Ok((packed, geometry))
}

/// Convert every file, skipping failures.
pub fn convert_all(files: &[PathBuf], config: &ProcessingConfig) -> Vec<ConvertedImage> {
    let mut converted = Vec::new();
    for (i, file) in files.iter().enumerate() {
        let index = i + 1;
        info!(image = %file.display(), index, "Processing");
        match convert_source(file, config) {
            Ok((packed, geometry)) => converted.push(ConvertedImage {
                index,
                source: file.clone(),
                packed,
                geometry,
            }),
            Err(e) => error!(image = %file.display(), "Skipping image: {e:#}"),
        }
    }
    converted
}

/// Full gallery run: rename, convert, write previews, emit the C file, and
/// rewrite the widget declarations.
pub fn generate(
    art_dir: &Path,
    output: &Path,
    widget: &Path,
    previews: bool,
    config: &ProcessingConfig,
) -> Result<()> {
    if !art_dir.exists() {
        fs::create_dir_all(art_dir)
            .with_context(|| format!("failed to create {}", art_dir.display()))?;
        info!(
            dir = %art_dir.display(),
            "Created empty art folder; add images and run again"
        );
        return Ok(());
    }

    let renamed = rename_to_sequence(art_dir)?;
    if renamed > 0 {
        info!(renamed, "Renamed images to the image<N> convention");
    }

    let files = list_images(art_dir)?;
    if files.is_empty() {
        warn!(
            dir = %art_dir.display(),
            formats = ?SUPPORTED_EXTENSIONS,
            "No supported images found"
        );
        return Ok(());
    }

    let converted = convert_all(&files, config);
    if converted.is_empty() {
        bail!("no images were successfully processed");
    }

    if previews {
        preview::write_previews(art_dir, &converted)?;
    }
    cgen::write_art_file(output, &converted)?;
    // Declare only the indices that survived conversion, so the widget
    // never references an image the art file does not define.
    let indices: Vec<usize> = converted.iter().map(|c| c.index).collect();
    cgen::update_declarations(widget, &indices)?;

    info!(
        images = converted.len(),
        width = DISPLAY_WIDTH,
        height = DISPLAY_HEIGHT,
        "Gallery generated"
    );
    Ok(())
}

/// Render the first gallery image with every scaling x dither combination
/// into `<art_dir>/method_comparison/`.
pub fn compare_methods(art_dir: &Path) -> Result<()> {
    let files = list_images(art_dir)?;
    let Some(first) = files.first() else {
        bail!("no images found in {}", art_dir.display());
    };

    let out_dir = art_dir.join("method_comparison");
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let stem = first
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");

    info!(image = %first.display(), "Comparing method combinations");
    for scaling in ScalingMethod::ALL {
        for dither in DitherMethod::ALL {
            let config = ProcessingConfig {
                scaling,
                dither,
                maintain_aspect_ratio: true,
            };
            match convert_source(first, &config) {
                Ok((packed, _)) => {
                    let img = decode_for_preview(&packed, DISPLAY_WIDTH, DISPLAY_HEIGHT);
                    let name = format!("{stem}_{scaling}_{dither}.png");
                    img.save(out_dir.join(&name))
                        .with_context(|| format!("failed to save {name}"))?;
                    info!(%name, "Wrote comparison preview");
                }
                Err(e) => error!(%scaling, %dither, "Combination failed: {e:#}"),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use tempfile::tempdir;

    fn touch_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        // A real 4x4 PNG so decode succeeds where tests need it
        GrayImage::from_pixel(4, 4, Luma([128])).save(&path).unwrap();
        path
    }

    #[test]
    fn sort_key_orders_numeric_prefixes_first() {
        let dir = Path::new("/art");
        let mut names = vec![
            dir.join("zebra.png"),
            dir.join("10_b.png"),
            dir.join("2_a.png"),
            dir.join("apple.gif"),
            dir.join("1-x.jpg"),
        ];
        names.sort_by_key(|p| sort_key(p));

        let sorted: Vec<_> = names
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(sorted, ["1-x.jpg", "2_a.png", "10_b.png", "apple.gif", "zebra.png"]);
    }

    #[test]
    fn list_images_filters_unsupported_extensions() {
        let dir = tempdir().unwrap();
        touch_png(dir.path(), "a.png");
        touch_png(dir.path(), "b.jpeg");
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::write(dir.path().join("raw.tiff"), "x").unwrap();

        let files = list_images(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.png", "b.jpeg"]);
    }

    #[test]
    fn rename_assigns_sequential_names() {
        let dir = tempdir().unwrap();
        touch_png(dir.path(), "zebra.png");
        touch_png(dir.path(), "1_first.jpg");

        let renamed = rename_to_sequence(dir.path()).unwrap();
        assert_eq!(renamed, 2);
        assert!(dir.path().join("image1.jpg").exists());
        assert!(dir.path().join("image2.png").exists());
    }

    #[test]
    fn rename_skips_files_already_in_final_format() {
        let dir = tempdir().unwrap();
        touch_png(dir.path(), "image1.png");
        touch_png(dir.path(), "image2.png");

        let renamed = rename_to_sequence(dir.path()).unwrap();
        assert_eq!(renamed, 0);
    }

    #[test]
    fn rename_resolves_name_collisions() {
        let dir = tempdir().unwrap();
        // "1_b.png" sorts first and must become image1.png, which is
        // currently held by a file that has to move to image2.png.
        let a = dir.path().join("1_b.png");
        GrayImage::from_pixel(2, 2, Luma([10])).save(&a).unwrap();
        let b = dir.path().join("image1.png");
        GrayImage::from_pixel(2, 2, Luma([200])).save(&b).unwrap();

        let renamed = rename_to_sequence(dir.path()).unwrap();
        assert_eq!(renamed, 2);

        let img1 = image::open(dir.path().join("image1.png")).unwrap().to_luma8();
        let img2 = image::open(dir.path().join("image2.png")).unwrap().to_luma8();
        assert_eq!(img1.get_pixel(0, 0).0[0], 10);
        assert_eq!(img2.get_pixel(0, 0).0[0], 200);
    }

    #[test]
    fn rename_leaves_unrelated_staging_named_files_alone() {
        let dir = tempdir().unwrap();
        // A user file that happens to carry the first staging name must
        // survive the rename with its contents intact.
        let occupant = dir.path().join("artgen_staged_0.png");
        GrayImage::from_pixel(2, 2, Luma([50])).save(&occupant).unwrap();
        let first = dir.path().join("1_a.png");
        GrayImage::from_pixel(2, 2, Luma([10])).save(&first).unwrap();

        let renamed = rename_to_sequence(dir.path()).unwrap();
        assert_eq!(renamed, 2);

        let img1 = image::open(dir.path().join("image1.png")).unwrap().to_luma8();
        let img2 = image::open(dir.path().join("image2.png")).unwrap().to_luma8();
        assert_eq!(img1.get_pixel(0, 0).0[0], 10);
        assert_eq!(img2.get_pixel(0, 0).0[0], 50);
    }

    #[test]
    fn convert_all_skips_undecodable_files() {
        let dir = tempdir().unwrap();
        let good = touch_png(dir.path(), "image1.png");
        let bad = dir.path().join("image2.png");
        fs::write(&bad, b"not a png").unwrap();

        let config = ProcessingConfig::default();
        let converted = convert_all(&[good, bad], &config);
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].index, 1);
    }
}
