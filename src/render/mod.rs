//! Raster output: compositing, backdrop synthesis, and annotation previews.

pub(crate) mod backdrop;
pub(crate) mod background;
pub(crate) mod composite;
pub(crate) mod preview;

pub use backdrop::{Backdrop, write_backdrops};
pub use background::{
    Background, BackgroundMode, BackgroundSynthesizer, FillerTiling, HttpPhotoSource,
    PhotoSource, mosaic_background, solid_white,
};
pub use composite::{Layer, overlay};
pub use preview::{
    BOX_THICKNESS, LABEL_TAB_HEIGHT, PALETTE, PreviewSummary, annotate_file, box_label,
    draw_annotations, draw_label_tabs,
};
