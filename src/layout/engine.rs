use std::borrow::Cow;

use image::{DynamicImage, RgbImage};
use rand::Rng;

use crate::assets::CardSprite;
use crate::dataset::{AnnotationLine, BoundingBox, BoxClipping, BoxDerivation, ClassMap};
use crate::foundation::core::{AngleRange, PixelSize, Vec2};
use crate::foundation::error::{MosaicError, MosaicResult};
use crate::layout::mode::{GridSpec, LayoutMode, TransformMode};
use crate::render::{BackgroundMode, BackgroundSynthesizer, overlay};
use crate::transform::{PerspectiveRange, TransformedSprite, rotate2d, rotate3d_sampled};

/// Angle ranges and flip odds used when transforming cards.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlacementRanges {
    /// Planar tilt magnitude for grid and random layouts; the sign is random.
    pub mild_rotation: AngleRange,
    /// Planar angle for the strong-rotation layout.
    pub wide_rotation: AngleRange,
    /// Tilt ranges for grid and random layouts.
    pub mild_perspective: PerspectiveRange,
    /// Tilt ranges for the strong-rotation layout.
    pub wide_perspective: PerspectiveRange,
    /// Chance of a horizontal flip in the strong-rotation layout.
    pub flip_probability: f64,
}

impl Default for PlacementRanges {
    fn default() -> Self {
        Self {
            mild_rotation: AngleRange::new(10.0, 20.0),
            wide_rotation: AngleRange::symmetric(180.0),
            mild_perspective: PerspectiveRange::MILD,
            wide_perspective: PerspectiveRange::WIDE,
            flip_probability: 0.5,
        }
    }
}

impl PlacementRanges {
    /// Rejects malformed ranges and a flip probability outside `[0, 1]`.
    pub fn validate(&self) -> MosaicResult<()> {
        self.mild_rotation.validate_whole("mild_rotation")?;
        self.wide_rotation.validate_whole("wide_rotation")?;
        self.mild_perspective.validate("mild_perspective")?;
        self.wide_perspective.validate("wide_perspective")?;
        if !(0.0..=1.0).contains(&self.flip_probability) {
            return Err(MosaicError::validation(format!(
                "flip_probability must be in [0, 1], got {}",
                self.flip_probability
            )));
        }
        Ok(())
    }
}

/// Input for one generated image.
#[derive(Clone, Debug)]
pub struct LayoutJob<'a> {
    /// Output index; also names the files.
    pub index: u64,
    /// Cards to place, in slot order.
    pub group: Vec<&'a CardSprite>,
    /// Where cards go.
    pub layout_mode: LayoutMode,
    /// What they are placed on.
    pub background_mode: BackgroundMode,
    /// How each card is transformed.
    pub transform_mode: TransformMode,
}

/// Per-layout counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutStats {
    /// Cards composited onto the canvas.
    pub placed: u64,
    /// Annotation lines emitted.
    pub annotated: u64,
    /// Cards composited without a label (no identifier or not in the class map).
    pub unlabeled: u64,
    /// Cards skipped because their perspective was degenerate.
    pub degenerate: u64,
    /// Boxes clamped to the canvas.
    pub clipped: u64,
    /// Boxes omitted at the canvas edge.
    pub dropped: u64,
    /// Background photo was unavailable and white was used.
    pub background_fallback: bool,
}

/// A finished canvas and its labels.
#[derive(Clone, Debug)]
pub struct LayoutOutput {
    /// Rendered RGB image.
    pub canvas: RgbImage,
    /// One line per labelled card.
    pub annotations: Vec<AnnotationLine>,
    /// Counters for the report.
    pub stats: LayoutStats,
}

/// Places card groups onto backdrops and labels them.
pub struct LayoutEngine<'a> {
    grid: GridSpec,
    ranges: PlacementRanges,
    clipping: BoxClipping,
    class_map: &'a ClassMap,
    backgrounds: &'a BackgroundSynthesizer<'a>,
}

impl<'a> LayoutEngine<'a> {
    /// Engine over a validated grid and validated placement ranges.
    pub fn new(
        grid: GridSpec,
        ranges: PlacementRanges,
        clipping: BoxClipping,
        class_map: &'a ClassMap,
        backgrounds: &'a BackgroundSynthesizer<'a>,
    ) -> MosaicResult<Self> {
        grid.validate(backgrounds.size())?;
        ranges.validate()?;
        Ok(Self {
            grid,
            ranges,
            clipping,
            class_map,
            backgrounds,
        })
    }

    /// Size of every produced canvas.
    pub fn canvas_size(&self) -> PixelSize {
        self.backgrounds.size()
    }

    /// Renders one layout.
    ///
    /// Every card is composited. Only cards with a class id are labelled, from the
    /// corners of the same transform that produced their pixels.
    pub fn build_layout<R: Rng + ?Sized>(
        &self,
        job: &LayoutJob<'_>,
        rng: &mut R,
    ) -> MosaicResult<LayoutOutput> {
        let canvas_size = self.canvas_size();
        if job.layout_mode.uses_grid() && job.group.len() > self.grid.capacity() {
            return Err(MosaicError::validation(format!(
                "group of {} cards does not fit a {}x{} grid",
                job.group.len(),
                self.grid.columns,
                self.grid.rows
            )));
        }

        let background = self.backgrounds.make_background(job.background_mode, rng)?;
        let mut canvas = background.canvas;
        let mut stats = LayoutStats {
            background_fallback: background.fell_back,
            ..LayoutStats::default()
        };
        let mut annotations = Vec::with_capacity(job.group.len());

        for (slot, card) in job.group.iter().enumerate() {
            let transformed = match self.transform_card(card, job, rng) {
                Ok(t) => t,
                Err(MosaicError::Geometry(msg)) => {
                    tracing::warn!(job = job.index, card = %card.source.display(), reason = %msg, "skipping degenerate placement");
                    stats.degenerate += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            let (x, y) = self.place(slot, &transformed, job.layout_mode, canvas_size, rng);
            overlay(&mut canvas, &transformed.pixels, x, y);
            stats.placed += 1;

            let Some(class_id) = card.class_id(self.class_map) else {
                tracing::debug!(job = job.index, card = %card.source.display(), "placed without label");
                stats.unlabeled += 1;
                continue;
            };

            let polygon = transformed
                .descriptor
                .project_corners(transformed.source_size)
                .translate(Vec2::new(x as f64, y as f64));
            let bbox = match BoundingBox::from_polygon(&polygon, canvas_size, self.clipping) {
                BoxDerivation::Unchanged(b) => b,
                BoxDerivation::Clipped(b) => {
                    stats.clipped += 1;
                    b
                }
                BoxDerivation::Dropped => {
                    tracing::debug!(job = job.index, class_id, "box dropped at canvas edge");
                    stats.dropped += 1;
                    continue;
                }
            };
            tracing::debug!(job = job.index, class_id, polygon = ?polygon.points(), "annotation");
            annotations.push(AnnotationLine { class_id, bbox });
            stats.annotated += 1;
        }

        Ok(LayoutOutput {
            canvas,
            annotations,
            stats,
        })
    }

    fn transform_card<R: Rng + ?Sized>(
        &self,
        card: &CardSprite,
        job: &LayoutJob<'_>,
        rng: &mut R,
    ) -> MosaicResult<TransformedSprite> {
        let strong = job.layout_mode == LayoutMode::StrongRotation;
        let pixels: Cow<'_, DynamicImage> =
            if strong && rng.gen_bool(self.ranges.flip_probability) {
                Cow::Owned(card.pixels.fliph())
            } else {
                Cow::Borrowed(&card.pixels)
            };

        match (job.transform_mode, strong) {
            (TransformMode::Planar, false) => {
                let angle = self.ranges.mild_rotation.sample_whole_signed(rng);
                rotate2d(&pixels, angle)
            }
            (TransformMode::Planar, true) => {
                let angle = self.ranges.wide_rotation.sample_whole(rng);
                rotate2d(&pixels, angle)
            }
            (TransformMode::Perspective, false) => {
                rotate3d_sampled(&pixels, self.ranges.mild_perspective, rng)
            }
            (TransformMode::Perspective, true) => {
                rotate3d_sampled(&pixels, self.ranges.wide_perspective, rng)
            }
        }
    }

    fn place<R: Rng + ?Sized>(
        &self,
        slot: usize,
        transformed: &TransformedSprite,
        mode: LayoutMode,
        canvas: PixelSize,
        rng: &mut R,
    ) -> (i64, i64) {
        let size = transformed.size();
        let (w, h) = (i64::from(size.width), i64::from(size.height));
        if mode.uses_grid() {
            let cell = self.grid.cell_size(canvas);
            let origin = self.grid.cell_origin(canvas, slot);
            let dx = (i64::from(cell.width) - w).div_euclid(2);
            let dy = (i64::from(cell.height) - h).div_euclid(2);
            (origin.x as i64 + dx, origin.y as i64 + dy)
        } else {
            let max_x = (i64::from(canvas.width) - w).max(0);
            let max_y = (i64::from(canvas.height) - h).max(0);
            (rng.gen_range(0..=max_x), rng.gen_range(0..=max_y))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/engine.rs"]
mod tests;
