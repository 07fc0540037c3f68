//! Card sprite decoding and pools.

pub(crate) mod decode;
pub(crate) mod store;

pub use decode::{decode_sprite, list_image_files, load_sprite_file};
pub use store::{CardSprite, SpritePool};
