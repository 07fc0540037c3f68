use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::dataset::BoxClipping;
use crate::foundation::core::PixelSize;
use crate::foundation::error::{MosaicError, MosaicResult};
use crate::layout::{GridSpec, PlacementRanges};
use crate::render::FillerTiling;

/// Where inputs are read from and outputs written to.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct InputPaths {
    /// Training card crops.
    pub cards_dir: PathBuf,
    /// Decoy cards for mosaic backdrops.
    pub fillers_dir: PathBuf,
    /// Photos for local backdrops.
    pub backgrounds_dir: PathBuf,
    /// Downloaded backdrops are kept here.
    pub web_cache_dir: PathBuf,
    /// CSV with `Set #` and `Name` columns.
    pub manifest: PathBuf,
    /// Dataset root; receives `images/`, `labels/` and `data.yaml`.
    pub output_dir: PathBuf,
}

impl Default for InputPaths {
    fn default() -> Self {
        Self {
            cards_dir: PathBuf::from("output/augmented/images"),
            fillers_dir: PathBuf::from("fakeimg_augmented"),
            backgrounds_dir: PathBuf::from("mosaic"),
            web_cache_dir: PathBuf::from("web"),
            manifest: PathBuf::from("cards_info.csv"),
            output_dir: PathBuf::from("output/yolov8"),
        }
    }
}

/// Remote photo source for web backdrops.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WebBackgroundConfig {
    /// Endpoint returning one encoded photo per request.
    pub url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for WebBackgroundConfig {
    fn default() -> Self {
        Self {
            url: "https://picsum.photos/1920/1080".to_string(),
            timeout_secs: 10,
        }
    }
}

impl WebBackgroundConfig {
    /// [`WebBackgroundConfig::timeout_secs`] as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Threading and chunking controls for batch generation.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BatchThreading {
    /// Run jobs on a rayon pool when `true`.
    pub parallel: bool,
    /// Jobs scheduled per parallel chunk; cancellation is observed between chunks too.
    pub chunk_size: usize,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
}

impl Default for BatchThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 64,
            threads: None,
        }
    }
}

/// Everything a batch run needs to know. Missing JSON fields take their defaults.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MosaicConfig {
    /// Output image size.
    pub canvas: PixelSize,
    /// Every card and decoy is resized to this before placement.
    pub sprite: PixelSize,
    /// Cell grid for grid and strong-rotation layouts.
    pub grid: GridSpec,
    /// Cards per generated image.
    pub group_size: usize,
    /// Images per (layout, background, transform) combination in the full sweep.
    pub variations: u32,
    /// Rotation, tilt and flip ranges for placed cards.
    pub placement: PlacementRanges,
    /// Decoy-card tiling for mosaic backdrops.
    pub tiling: FillerTiling,
    /// Input folders, manifest and output root.
    pub paths: InputPaths,
    /// Web backdrop source.
    pub web: WebBackgroundConfig,
    /// Fixed run seed; drawn from entropy when absent.
    pub seed: Option<u64>,
    /// Jobs numbered below this are skipped, so an interrupted run can be resumed.
    pub start_index: u64,
    /// Policy for boxes that leave the canvas.
    pub clipping: BoxClipping,
    /// Sequential or rayon execution.
    pub threading: BatchThreading,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            canvas: PixelSize::new(1920, 1080),
            sprite: PixelSize::new(280, 380),
            grid: GridSpec::default(),
            group_size: 8,
            variations: 50,
            placement: PlacementRanges::default(),
            tiling: FillerTiling::default(),
            paths: InputPaths::default(),
            web: WebBackgroundConfig::default(),
            seed: None,
            start_index: 1,
            clipping: BoxClipping::default(),
            threading: BatchThreading::default(),
        }
    }
}

impl MosaicConfig {
    /// Parses a JSON config; missing fields take their defaults.
    pub fn from_reader<R: std::io::Read>(r: R) -> MosaicResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| MosaicError::validation(format!("parse config JSON: {e}")))
    }

    /// Reads a JSON config file.
    pub fn from_json_path(path: impl AsRef<Path>) -> MosaicResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            MosaicError::validation(format!("open config JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Checks sizes, ranges, grid capacity and threading before a run.
    pub fn validate(&self) -> MosaicResult<()> {
        self.canvas.validate("canvas")?;
        self.sprite.validate("sprite")?;
        self.grid.validate(self.canvas)?;
        if self.group_size == 0 {
            return Err(MosaicError::validation("group_size must be >= 1"));
        }
        if self.group_size > self.grid.capacity() {
            return Err(MosaicError::validation(format!(
                "group_size {} exceeds the {} cells of a {}x{} grid",
                self.group_size,
                self.grid.capacity(),
                self.grid.columns,
                self.grid.rows
            )));
        }
        self.placement.validate()?;
        self.tiling.validate()?;
        if self.start_index == 0 {
            return Err(MosaicError::validation("start_index must be >= 1"));
        }
        if self.threading.threads == Some(0) {
            return Err(MosaicError::validation(
                "threading 'threads' must be >= 1 when set",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/batch/config.rs"]
mod tests;
