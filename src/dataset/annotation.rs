use std::{fmt, str::FromStr};

use crate::foundation::core::{PixelSize, Rect};
use crate::foundation::error::{MosaicError, MosaicResult};
use crate::transform::Polygon4;

/// What to do with boxes whose sprite is not fully on the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxClipping {
    /// Emit the box from the full polygon extent, even past the canvas edges.
    #[default]
    Keep,
    /// Clamp the extent to the canvas; boxes left with no area are dropped.
    Clip,
    /// Drop any box whose polygon leaves the canvas.
    Drop,
}

/// YOLO box: center and size, normalized by the canvas dimensions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Center x over canvas width.
    pub cx: f64,
    /// Center y over canvas height.
    pub cy: f64,
    /// Width over canvas width.
    pub w: f64,
    /// Height over canvas height.
    pub h: f64,
}

/// Result of turning a placed polygon into a box under a [`BoxClipping`] policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoxDerivation {
    /// The polygon extent, as is.
    Unchanged(BoundingBox),
    /// The extent after clamping to the canvas.
    Clipped(BoundingBox),
    /// No box is emitted.
    Dropped,
}

impl BoxDerivation {
    /// The box, unless it was dropped.
    pub fn bbox(self) -> Option<BoundingBox> {
        match self {
            Self::Unchanged(b) | Self::Clipped(b) => Some(b),
            Self::Dropped => None,
        }
    }
}

impl BoundingBox {
    /// Box from pixel-space extent.
    pub fn from_pixel_rect(rect: Rect, canvas: PixelSize) -> Self {
        let (cw, ch) = (canvas.width_f64(), canvas.height_f64());
        Self {
            cx: (rect.x0 + rect.x1) / 2.0 / cw,
            cy: (rect.y0 + rect.y1) / 2.0 / ch,
            w: rect.width() / cw,
            h: rect.height() / ch,
        }
    }

    /// Box around a canvas-space sprite polygon.
    pub fn from_polygon(
        polygon: &Polygon4,
        canvas: PixelSize,
        clipping: BoxClipping,
    ) -> BoxDerivation {
        let extent = polygon.bounds();
        let frame = Rect::new(0.0, 0.0, canvas.width_f64(), canvas.height_f64());
        let inside = extent.x0 >= frame.x0
            && extent.y0 >= frame.y0
            && extent.x1 <= frame.x1
            && extent.y1 <= frame.y1;

        if inside || clipping == BoxClipping::Keep {
            return BoxDerivation::Unchanged(Self::from_pixel_rect(extent, canvas));
        }
        match clipping {
            BoxClipping::Keep | BoxClipping::Drop => BoxDerivation::Dropped,
            BoxClipping::Clip => {
                let clipped = extent.intersect(frame);
                if clipped.width() <= 0.0 || clipped.height() <= 0.0 {
                    BoxDerivation::Dropped
                } else {
                    BoxDerivation::Clipped(Self::from_pixel_rect(clipped, canvas))
                }
            }
        }
    }

    /// Pixel-space corners `(x0, y0, x1, y1)` on a canvas of `canvas` size.
    pub fn to_pixel_rect(self, canvas: PixelSize) -> Rect {
        let (cw, ch) = (canvas.width_f64(), canvas.height_f64());
        let (cx, cy, w, h) = (self.cx * cw, self.cy * ch, self.w * cw, self.h * ch);
        Rect::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
    }
}

/// One `class_id cx cy w h` label line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnnotationLine {
    /// YOLO class id.
    pub class_id: u32,
    /// Normalized box.
    pub bbox: BoundingBox,
}

impl fmt::Display for AnnotationLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.bbox;
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_id, b.cx, b.cy, b.w, b.h
        )
    }
}

impl FromStr for AnnotationLine {
    type Err = MosaicError;

    fn from_str(s: &str) -> MosaicResult<Self> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        let [class_id, cx, cy, w, h] = fields.as_slice() else {
            return Err(MosaicError::validation(format!(
                "label line needs 5 fields, got {}: '{s}'",
                fields.len()
            )));
        };
        let num = |v: &str| -> MosaicResult<f64> {
            v.parse()
                .map_err(|_| MosaicError::validation(format!("bad number '{v}' in '{s}'")))
        };
        Ok(Self {
            class_id: class_id
                .parse()
                .map_err(|_| MosaicError::validation(format!("bad class id in '{s}'")))?,
            bbox: BoundingBox {
                cx: num(cx)?,
                cy: num(cy)?,
                w: num(w)?,
                h: num(h)?,
            },
        })
    }
}

/// Label-file body: one line per annotation, no trailing newline.
pub fn render_label_file(lines: &[AnnotationLine]) -> String {
    lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[path = "../../tests/unit/dataset/annotation.rs"]
mod tests;
