use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::assets::decode::{list_image_files, load_sprite_file};
use crate::dataset::{CardId, CardIdParserChain, ClassMap};
use crate::foundation::core::PixelSize;
use crate::foundation::error::MosaicResult;

/// A decoded card raster, fixed at the configured sprite size.
///
/// Sprites are shared read-only across layout jobs; transforms always work on copies.
#[derive(Clone, Debug)]
pub struct CardSprite {
    /// RGB8 or RGBA8 pixels.
    pub pixels: DynamicImage,
    /// File the sprite was decoded from.
    pub source: PathBuf,
    /// Identifier parsed from the file name, if any pattern matched.
    pub card_id: Option<CardId>,
}

impl CardSprite {
    /// Wraps already-decoded pixels.
    pub fn new(pixels: DynamicImage, source: PathBuf, card_id: Option<CardId>) -> Self {
        Self {
            pixels,
            source,
            card_id,
        }
    }

    /// Raster dimensions.
    pub fn size(&self) -> PixelSize {
        PixelSize::new(self.pixels.width(), self.pixels.height())
    }

    /// File name of [`CardSprite::source`], empty when it has none.
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// YOLO class for this sprite, if its identifier is in `map`.
    pub fn class_id(&self, map: &ClassMap) -> Option<u32> {
        self.card_id.as_ref().and_then(|id| map.class_id(id))
    }
}

/// All sprites decoded from one directory.
#[derive(Clone, Debug, Default)]
pub struct SpritePool {
    sprites: Vec<CardSprite>,
    skipped: usize,
}

impl SpritePool {
    /// Loads training cards, tagging each with the identifier `parsers` find in its
    /// file name.
    pub fn load_cards(
        dir: &Path,
        size: PixelSize,
        parsers: &CardIdParserChain,
    ) -> MosaicResult<Self> {
        Self::load_with(dir, size, |name| parsers.parse(name))
    }

    /// Loads decoy cards for background tiling; these never carry an identifier.
    pub fn load_fillers(dir: &Path, size: PixelSize) -> MosaicResult<Self> {
        Self::load_with(dir, size, |_| None)
    }

    fn load_with(
        dir: &Path,
        size: PixelSize,
        identify: impl Fn(&str) -> Option<CardId>,
    ) -> MosaicResult<Self> {
        let mut pool = Self::default();
        for path in list_image_files(dir)? {
            match load_sprite_file(&path, size) {
                Ok(pixels) => {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    let card_id = identify(&name);
                    pool.sprites.push(CardSprite::new(pixels, path, card_id));
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable sprite");
                    pool.skipped += 1;
                }
            }
        }
        tracing::info!(
            dir = %dir.display(),
            loaded = pool.sprites.len(),
            skipped = pool.skipped,
            "sprite pool loaded"
        );
        Ok(pool)
    }

    /// Pool over sprites decoded elsewhere.
    pub fn from_sprites(sprites: Vec<CardSprite>) -> Self {
        Self {
            sprites,
            skipped: 0,
        }
    }

    /// All sprites, in file-name order when loaded from a directory.
    pub fn sprites(&self) -> &[CardSprite] {
        &self.sprites
    }

    /// Number of decoded sprites.
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    /// `true` when no sprite could be decoded.
    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Files that were listed but could not be decoded.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
