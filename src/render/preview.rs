use std::path::Path;

use anyhow::Context as _;
use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_hollow_rect_mut},
    rect::Rect as PixelRect,
};

use crate::dataset::{AnnotationLine, DatasetManifest};
use crate::foundation::core::PixelSize;
use crate::foundation::error::MosaicResult;

/// Box colours, cycled by line index.
pub const PALETTE: [Rgb<u8>; 8] = [
    Rgb([0, 255, 0]),
    Rgb([0, 0, 255]),
    Rgb([255, 0, 0]),
    Rgb([0, 255, 255]),
    Rgb([255, 0, 255]),
    Rgb([255, 255, 0]),
    Rgb([128, 0, 128]),
    Rgb([128, 128, 0]),
];

/// Outline width of a preview box, in pixels.
pub const BOX_THICKNESS: u32 = 3;

/// Height of the caption tab filled above each box.
pub const LABEL_TAB_HEIGHT: u32 = 24;

const LABEL_CHAR_WIDTH: u32 = 11;
const LABEL_NAME_CHARS: usize = 10;

/// Outcome of one preview render.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreviewSummary {
    /// Boxes drawn.
    pub drawn: usize,
    /// Label lines that could not be parsed.
    pub skipped: usize,
    /// Caption of every drawn box, in line order.
    pub labels: Vec<String>,
}

/// Caption for a box: `n: name` with the name cut to ten characters when `names` knows
/// the class, `ID:n` otherwise.
pub fn box_label(class_id: u32, names: Option<&DatasetManifest>) -> String {
    match names.and_then(|m| m.names.get(class_id as usize)) {
        Some(name) => {
            let short: String = name.chars().take(LABEL_NAME_CHARS).collect();
            format!("{class_id}: {short}")
        }
        None => format!("ID:{class_id}"),
    }
}

/// Draws every annotation as a `thickness`-px outline, growing inward from the box edge.
pub fn draw_annotations(canvas: &mut RgbImage, lines: &[AnnotationLine], thickness: u32) {
    let size = PixelSize::new(canvas.width(), canvas.height());
    for (idx, line) in lines.iter().enumerate() {
        let color = PALETTE[idx % PALETTE.len()];
        let rect = line.bbox.to_pixel_rect(size);
        let (x0, y0) = (rect.x0.round() as i32, rect.y0.round() as i32);
        let (w, h) = (rect.width().round() as i64, rect.height().round() as i64);
        for inset in 0..i64::from(thickness) {
            let (iw, ih) = (w - 2 * inset, h - 2 * inset);
            if iw <= 0 || ih <= 0 {
                break;
            }
            let r = PixelRect::at(x0 + inset as i32, y0 + inset as i32)
                .of_size(iw as u32, ih as u32);
            draw_hollow_rect_mut(canvas, r, color);
        }
    }
}

/// Fills a caption tab in the box colour directly above each box, sized to its caption.
///
/// Tabs are clipped at the canvas edge.
pub fn draw_label_tabs(
    canvas: &mut RgbImage,
    lines: &[AnnotationLine],
    names: Option<&DatasetManifest>,
) {
    let size = PixelSize::new(canvas.width(), canvas.height());
    for (idx, line) in lines.iter().enumerate() {
        let rect = line.bbox.to_pixel_rect(size);
        let caption = box_label(line.class_id, names);
        let width = caption.chars().count() as u32 * LABEL_CHAR_WIDTH + 5;
        let (x0, y0) = (rect.x0.round() as i32, rect.y0.round() as i32);
        let tab =
            PixelRect::at(x0, y0 - LABEL_TAB_HEIGHT as i32).of_size(width, LABEL_TAB_HEIGHT);
        draw_filled_rect_mut(canvas, tab, PALETTE[idx % PALETTE.len()]);
    }
}

/// Renders the boxes of `label` onto `image` and saves the result to `out`.
///
/// Malformed label lines are skipped. Each box gets an outline and a caption tab; the
/// caption text is logged, using class names from `names` when given.
pub fn annotate_file(
    image: &Path,
    label: &Path,
    out: &Path,
    names: Option<&DatasetManifest>,
) -> MosaicResult<PreviewSummary> {
    let mut canvas = image::open(image)
        .with_context(|| format!("open image '{}'", image.display()))?
        .to_rgb8();
    let text = std::fs::read_to_string(label)
        .with_context(|| format!("read label file '{}'", label.display()))?;

    let mut summary = PreviewSummary::default();
    let mut lines = Vec::new();
    for raw in text.lines().filter(|l| !l.trim().is_empty()) {
        match raw.parse::<AnnotationLine>() {
            Ok(line) => lines.push(line),
            Err(e) => {
                tracing::warn!(label = %label.display(), error = %e, "skipping label line");
                summary.skipped += 1;
            }
        }
    }

    draw_annotations(&mut canvas, &lines, BOX_THICKNESS);
    draw_label_tabs(&mut canvas, &lines, names);
    for line in &lines {
        let caption = box_label(line.class_id, names);
        tracing::info!(class_id = line.class_id, caption = %caption, "box");
        summary.labels.push(caption);
    }
    summary.drawn = lines.len();

    canvas
        .save(out)
        .with_context(|| format!("write preview '{}'", out.display()))?;
    Ok(summary)
}

#[cfg(test)]
#[path = "../../tests/unit/render/preview.rs"]
mod tests;
