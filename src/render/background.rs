use std::{
    path::{Path, PathBuf},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use anyhow::Context as _;
use image::{DynamicImage, Rgb, RgbImage, imageops::FilterType};
use rand::{Rng, seq::SliceRandom};

use crate::assets::{SpritePool, list_image_files};
use crate::foundation::core::{AngleRange, PixelSize};
use crate::foundation::error::{MosaicError, MosaicResult};
use crate::render::composite::overlay;
use crate::transform::rotate2d;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Where the backdrop of a layout comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundMode {
    /// Decoy cards tiled over white.
    Mosaic,
    /// A random photo from a local folder.
    Local,
    /// A random photo fetched over HTTP.
    Web,
}

impl BackgroundMode {
    /// Every mode, in CLI index order.
    pub const ALL: [Self; 3] = [Self::Mosaic, Self::Local, Self::Web];

    /// Mode for CLI index 0, 1 or 2.
    pub fn from_index(index: u8) -> MosaicResult<Self> {
        match index {
            0 => Ok(Self::Mosaic),
            1 => Ok(Self::Local),
            2 => Ok(Self::Web),
            other => Err(MosaicError::validation(format!(
                "background mode must be 0, 1 or 2, got {other}"
            ))),
        }
    }

    /// CLI index of this mode.
    pub fn index(self) -> u8 {
        match self {
            Self::Mosaic => 0,
            Self::Local => 1,
            Self::Web => 2,
        }
    }
}

/// Grid parameters for the decoy-card backdrop.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FillerTiling {
    /// Nominal decoy size; the grid step derives from it.
    pub tile: PixelSize,
    /// Grid step as a fraction of the tile size (0.5 = half-overlapping tiles).
    pub step_fraction: f64,
    /// Tilt magnitude in whole degrees; the sign is random per tile.
    pub rotation: AngleRange,
}

impl Default for FillerTiling {
    fn default() -> Self {
        Self {
            tile: PixelSize::new(280, 380),
            step_fraction: 0.5,
            rotation: AngleRange::new(10.0, 20.0),
        }
    }
}

impl FillerTiling {
    /// Rejects an empty tile, a non-positive step, or a tilt range with no whole degree.
    pub fn validate(&self) -> MosaicResult<()> {
        self.tile.validate("tiling.tile")?;
        if !(self.step_fraction > 0.0 && self.step_fraction.is_finite()) {
            return Err(MosaicError::validation(format!(
                "tiling.step_fraction must be > 0, got {}",
                self.step_fraction
            )));
        }
        self.rotation.validate_whole("tiling.rotation")
    }
}

/// White canvas of `size`.
pub fn solid_white(size: PixelSize) -> RgbImage {
    RgbImage::from_pixel(size.width, size.height, WHITE)
}

/// Tiles decoy cards over a white canvas: one slightly jittered, slightly tilted card
/// per grid point, with the grid extending half a tile past every edge.
pub fn mosaic_background<R: Rng + ?Sized>(
    size: PixelSize,
    fillers: &SpritePool,
    tiling: &FillerTiling,
    rng: &mut R,
) -> MosaicResult<RgbImage> {
    if fillers.is_empty() {
        return Err(MosaicError::validation("filler pool is empty"));
    }
    let mut canvas = solid_white(size);

    let (fw, fh) = (i64::from(tiling.tile.width), i64::from(tiling.tile.height));
    let step_x = ((fw as f64 * tiling.step_fraction) as i64).max(1);
    let step_y = ((fh as f64 * tiling.step_fraction) as i64).max(1);
    let (cw, ch) = (i64::from(size.width), i64::from(size.height));

    let mut x = (-fw).div_euclid(2);
    while x < cw + fw / 2 {
        let mut y = (-fh).div_euclid(2);
        while y < ch + fh / 2 {
            let jitter_x = rng.gen_range((-step_x).div_euclid(4)..=step_x / 4);
            let jitter_y = rng.gen_range((-step_y).div_euclid(4)..=step_y / 4);
            let Some(filler) = fillers.sprites().choose(rng) else {
                break;
            };
            let angle = tiling.rotation.sample_whole_signed(rng);
            let rotated = rotate2d(&filler.pixels, angle)?;
            overlay(&mut canvas, &rotated.pixels, x + jitter_x, y + jitter_y);
            y += step_y;
        }
        x += step_x;
    }
    Ok(canvas)
}

/// Source of encoded background photos.
pub trait PhotoSource: Send + Sync {
    /// Fetches one encoded photo.
    fn fetch(&self) -> MosaicResult<Vec<u8>>;
}

impl<T: PhotoSource + ?Sized> PhotoSource for Box<T> {
    fn fetch(&self) -> MosaicResult<Vec<u8>> {
        (**self).fetch()
    }
}

/// Downloads a photo from a fixed URL with a bounded timeout.
#[derive(Clone, Debug)]
pub struct HttpPhotoSource {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpPhotoSource {
    /// Client for `url`; every request is bounded by `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> MosaicResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

impl PhotoSource for HttpPhotoSource {
    fn fetch(&self) -> MosaicResult<Vec<u8>> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("fetch background '{}'", self.url))?;
        let bytes = resp
            .bytes()
            .with_context(|| format!("read background body '{}'", self.url))?;
        Ok(bytes.to_vec())
    }
}

/// A synthesized backdrop and whether it had to fall back to plain white.
#[derive(Clone, Debug)]
pub struct Background {
    /// Full-size RGB backdrop.
    pub canvas: RgbImage,
    /// `true` when a photo mode fell back to white.
    pub fell_back: bool,
}

impl Background {
    fn rendered(canvas: RgbImage) -> Self {
        Self {
            canvas,
            fell_back: false,
        }
    }

    fn white(size: PixelSize) -> Self {
        Self {
            canvas: solid_white(size),
            fell_back: true,
        }
    }
}

/// Produces full-canvas backdrops for every [`BackgroundMode`].
///
/// Only the decoy mosaic can fail hard (no fillers); photo modes degrade to white.
pub struct BackgroundSynthesizer<'a> {
    size: PixelSize,
    fillers: &'a SpritePool,
    tiling: FillerTiling,
    local_dir: Option<PathBuf>,
    web: Option<Box<dyn PhotoSource + 'a>>,
    web_cache_dir: Option<PathBuf>,
}

impl<'a> BackgroundSynthesizer<'a> {
    /// Synthesizer for `size` canvases with only the decoy mosaic configured.
    pub fn new(size: PixelSize, fillers: &'a SpritePool, tiling: FillerTiling) -> Self {
        Self {
            size,
            fillers,
            tiling,
            local_dir: None,
            web: None,
            web_cache_dir: None,
        }
    }

    /// Folder of photos for [`BackgroundMode::Local`].
    pub fn with_local_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_dir = Some(dir.into());
        self
    }

    /// Photo source for [`BackgroundMode::Web`].
    pub fn with_web_source(mut self, source: impl PhotoSource + 'a) -> Self {
        self.web = Some(Box::new(source));
        self
    }

    /// Directory fetched photos are saved to before use.
    pub fn with_web_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.web_cache_dir = Some(dir.into());
        self
    }

    /// Canvas size.
    pub fn size(&self) -> PixelSize {
        self.size
    }

    /// Backdrop for `mode`; only an empty filler pool in mosaic mode is an error.
    pub fn make_background<R: Rng + ?Sized>(
        &self,
        mode: BackgroundMode,
        rng: &mut R,
    ) -> MosaicResult<Background> {
        match mode {
            BackgroundMode::Mosaic => mosaic_background(self.size, self.fillers, &self.tiling, rng)
                .map(Background::rendered),
            BackgroundMode::Local => Ok(self.local_photo(rng)),
            BackgroundMode::Web => Ok(self.web_photo()),
        }
    }

    fn local_photo<R: Rng + ?Sized>(&self, rng: &mut R) -> Background {
        let Some(dir) = self.local_dir.as_deref() else {
            tracing::warn!("no local background directory configured, using white");
            return Background::white(self.size);
        };
        let files = match list_image_files(dir) {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "background directory unreadable, using white");
                return Background::white(self.size);
            }
        };
        let Some(chosen) = files.choose(rng) else {
            tracing::warn!(dir = %dir.display(), "background directory is empty, using white");
            return Background::white(self.size);
        };
        match image::open(chosen) {
            Ok(img) => Background::rendered(fit_canvas(img, self.size)),
            Err(e) => {
                tracing::warn!(path = %chosen.display(), error = %e, "background photo unreadable, using white");
                Background::white(self.size)
            }
        }
    }

    fn web_photo(&self) -> Background {
        let Some(source) = self.web.as_deref() else {
            tracing::warn!("no web background source configured, using white");
            return Background::white(self.size);
        };
        let bytes = match source.fetch() {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "background fetch failed, using white");
                return Background::white(self.size);
            }
        };
        if let Some(dir) = self.web_cache_dir.as_deref()
            && let Err(e) = cache_photo(dir, &bytes)
        {
            tracing::warn!(dir = %dir.display(), error = %e, "could not cache fetched background");
        }
        match image::load_from_memory(&bytes) {
            Ok(img) => Background::rendered(fit_canvas(img, self.size)),
            Err(e) => {
                tracing::warn!(error = %e, "fetched background is not an image, using white");
                Background::white(self.size)
            }
        }
    }
}

fn fit_canvas(img: DynamicImage, size: PixelSize) -> RgbImage {
    img.resize_exact(size.width, size.height, FilterType::Triangle)
        .to_rgb8()
}

fn cache_photo(dir: &Path, bytes: &[u8]) -> MosaicResult<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create background cache '{}'", dir.display()))?;
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let path = dir.join(format!("background_{stamp}.jpg"));
    std::fs::write(&path, bytes)
        .with_context(|| format!("write cached background '{}'", path.display()))?;
    Ok(path)
}

#[cfg(test)]
#[path = "../../tests/unit/render/background.rs"]
mod tests;
