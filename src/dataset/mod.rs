//! Labels: card identifiers, the class map, YOLO boxes and the dataset manifest.

pub(crate) mod annotation;
pub(crate) mod card_id;
pub(crate) mod class_map;
pub(crate) mod manifest;

pub use annotation::{AnnotationLine, BoundingBox, BoxClipping, BoxDerivation, render_label_file};
pub use card_id::{CardId, CardIdParser, CardIdParserChain, RegexCardIdParser};
pub use class_map::{ClassMap, UNUSED_CLASS_NAME};
pub use manifest::DatasetManifest;
