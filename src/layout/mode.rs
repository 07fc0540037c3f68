use crate::foundation::core::{PixelSize, Point};
use crate::foundation::error::{MosaicError, MosaicResult};

/// How cards are positioned on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Grid cells, mild transforms.
    Grid,
    /// Grid cells, random horizontal flip and wide transforms.
    StrongRotation,
    /// Mild transforms at uniformly random positions that keep the card on canvas.
    Random,
}

impl LayoutMode {
    /// Every layout, in CLI index order.
    pub const ALL: [Self; 3] = [Self::Grid, Self::StrongRotation, Self::Random];

    /// Layout for CLI index 1, 2 or 3.
    pub fn from_index(index: u8) -> MosaicResult<Self> {
        match index {
            1 => Ok(Self::Grid),
            2 => Ok(Self::StrongRotation),
            3 => Ok(Self::Random),
            other => Err(MosaicError::validation(format!(
                "layout mode must be 1, 2 or 3, got {other}"
            ))),
        }
    }

    /// CLI index of this layout.
    pub fn index(self) -> u8 {
        match self {
            Self::Grid => 1,
            Self::StrongRotation => 2,
            Self::Random => 3,
        }
    }

    /// Whether cards are placed in grid cells.
    pub fn uses_grid(self) -> bool {
        matches!(self, Self::Grid | Self::StrongRotation)
    }
}

/// Which geometric transform every card of a job goes through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformMode {
    /// In-plane rotation.
    Planar,
    /// Simulated 3D tilt.
    Perspective,
}

impl TransformMode {
    /// Every transform, in CLI index order.
    pub const ALL: [Self; 2] = [Self::Planar, Self::Perspective];

    /// Transform for CLI index 0 or 1.
    pub fn from_index(index: u8) -> MosaicResult<Self> {
        match index {
            0 => Ok(Self::Planar),
            1 => Ok(Self::Perspective),
            other => Err(MosaicError::validation(format!(
                "transform mode must be 0 or 1, got {other}"
            ))),
        }
    }

    /// CLI index of this transform.
    pub fn index(self) -> u8 {
        match self {
            Self::Planar => 0,
            Self::Perspective => 1,
        }
    }
}

/// Equal cells separated by `margin` pixels, filled row by row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GridSpec {
    /// Cells per row.
    pub columns: u32,
    /// Rows of cells.
    pub rows: u32,
    /// Gap around and between cells, in pixels.
    pub margin: u32,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            columns: 4,
            rows: 2,
            margin: 20,
        }
    }
}

impl GridSpec {
    /// Number of cells.
    pub fn capacity(self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Rejects an empty grid or one whose margins leave no room on `canvas`.
    pub fn validate(self, canvas: PixelSize) -> MosaicResult<()> {
        if self.columns == 0 || self.rows == 0 {
            return Err(MosaicError::validation(format!(
                "grid must have at least one cell, got {}x{}",
                self.columns, self.rows
            )));
        }
        let (cw, ch) = self.cell_size_signed(canvas);
        if cw <= 0 || ch <= 0 {
            return Err(MosaicError::validation(format!(
                "grid {}x{} with margin {} leaves no room on a {}x{} canvas",
                self.columns, self.rows, self.margin, canvas.width, canvas.height
            )));
        }
        Ok(())
    }

    fn cell_size_signed(self, canvas: PixelSize) -> (i64, i64) {
        let m = i64::from(self.margin);
        let w = (i64::from(canvas.width) - (i64::from(self.columns) + 1) * m)
            .div_euclid(i64::from(self.columns.max(1)));
        let h = (i64::from(canvas.height) - (i64::from(self.rows) + 1) * m)
            .div_euclid(i64::from(self.rows.max(1)));
        (w, h)
    }

    /// Cell dimensions on `canvas`; zero when the margins eat the whole canvas.
    pub fn cell_size(self, canvas: PixelSize) -> PixelSize {
        let (w, h) = self.cell_size_signed(canvas);
        PixelSize::new(w.max(0) as u32, h.max(0) as u32)
    }

    /// Top-left corner of cell `slot`; slots run left to right, then top to bottom.
    pub fn cell_origin(self, canvas: PixelSize, slot: usize) -> Point {
        let cell = self.cell_size(canvas);
        let columns = self.columns.max(1) as usize;
        let (col, row) = ((slot % columns) as u32, (slot / columns) as u32);
        Point::new(
            f64::from(self.margin + col * (cell.width + self.margin)),
            f64::from(self.margin + row * (cell.height + self.margin)),
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/mode.rs"]
mod tests;
