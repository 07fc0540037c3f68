//! Turns a card group into one labelled canvas.

pub(crate) mod engine;
pub(crate) mod mode;

pub use engine::{LayoutEngine, LayoutJob, LayoutOutput, LayoutStats, PlacementRanges};
pub use mode::{GridSpec, LayoutMode, TransformMode};
