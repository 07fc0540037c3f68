/// Convenience result type used across the mosaic generator.
pub type MosaicResult<T> = Result<T, MosaicError>;

/// Top-level error taxonomy used by generator APIs.
///
/// Only configuration-level failures travel through this type. Content gaps met while
/// generating (unreadable sprites, unmapped card ids, failed background fetches) are
/// logged and counted instead.
#[derive(thiserror::Error, Debug)]
pub enum MosaicError {
    /// Invalid user-provided configuration or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing or malformed card manifest.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// Degenerate transform (singular homography, zero-extent projection).
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MosaicError {
    /// Build a [`MosaicError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MosaicError::Manifest`] value.
    pub fn manifest(msg: impl Into<String>) -> Self {
        Self::Manifest(msg.into())
    }

    /// Build a [`MosaicError::Geometry`] value.
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Build a [`MosaicError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
