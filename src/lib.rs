//! Cardmosaic generates synthetic object-detection datasets from card crops.
//!
//! Each generated image places a small group of cards on a backdrop, each card tilted in
//! the plane or in simulated 3D, and records a YOLO box per identifiable card:
//!
//! - Load the [`ClassMap`] and the card and decoy [`SpritePool`]s
//! - Plan jobs for one mode combination or the full sweep ([`RunMode`])
//! - Run them through a [`BatchDriver`], which renders each [`LayoutJob`] with the
//!   [`LayoutEngine`] and writes `images/`, `labels/` and `data.yaml`
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub mod assets;
pub mod batch;
pub mod dataset;
pub mod layout;
pub mod render;
pub mod transform;

pub use crate::foundation::core::{Affine, AngleRange, PixelSize, Point, Rect, Vec2};
pub use crate::foundation::error::{MosaicError, MosaicResult};

pub use crate::assets::{CardSprite, SpritePool};
pub use crate::batch::{BatchDriver, BatchInputs, BatchReport, CancelToken, MosaicConfig, RunMode};
pub use crate::dataset::{
    AnnotationLine, BoundingBox, BoxClipping, CardId, CardIdParser, CardIdParserChain, ClassMap,
    DatasetManifest,
};
pub use crate::layout::{LayoutEngine, LayoutJob, LayoutMode, TransformMode};
pub use crate::render::{BackgroundMode, BackgroundSynthesizer, overlay};
pub use crate::transform::{TransformDescriptor, TransformedSprite, rotate2d, rotate3d};
