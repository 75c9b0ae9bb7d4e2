//! Structured error types for the Folio layout engine.
//!
//! Errors are split by who can recover from them. Block renderers return a
//! [`BlockError`]; dispatch turns malformed data, missing assets and raster
//! failures into visible placeholders and keeps walking. A [`LayoutError`] is
//! a renderer-contract bug and always propagates out of [`crate::Engine`].

use thiserror::Error;

/// A layout invariant was violated by the calling renderer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayoutError {
    #[error("region must have a positive width and a non-negative height (got {width} x {height})")]
    InvalidRegion { width: f64, height: f64 },

    #[error("clip rectangle must have a positive area (got {width} x {height})")]
    InvalidClip { width: f64, height: f64 },

    #[error("non-finite geometry passed to {primitive}")]
    NonFinite { primitive: &'static str },

    #[error("region scopes closed out of order (expected depth {expected}, found {found})")]
    UnbalancedRegion { expected: usize, found: usize },
}

/// An image or audio source that could not be turned into something drawable.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset '{src}' was not found")]
    NotFound { src: String },

    #[error("remote asset '{src}' is not fetched during layout")]
    Remote { src: String },

    #[error("failed to read '{src}': {source}")]
    Read {
        src: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode '{src}': {reason}")]
    Decode { src: String, reason: String },
}

/// A chart raster or math expression could not be produced.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RasterError {
    #[error("chart has no data to plot")]
    EmptyData,

    #[error("dataset '{dataset}' has {found} values but there are {expected} labels")]
    SeriesLength {
        dataset: String,
        expected: usize,
        found: usize,
    },

    #[error("chart values must be finite")]
    NonFinite,

    #[error("invalid raster size {width} x {height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("math: {0}")]
    Math(String),
}

/// What a single block renderer can fail with.
#[derive(Debug, Error)]
pub enum BlockError {
    #[error("malformed block: {0}")]
    Malformed(String),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// The unified error type returned by the public Folio API.
#[derive(Debug, Error)]
pub enum FolioError {
    /// JSON input failed to parse as a Folio library.
    #[error("failed to parse library: {source}{}", format_hint(hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// A configured font could not be loaded or parsed.
    #[error("font error: {0}")]
    Font(String),

    /// A renderer broke a layout invariant.
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {hint}")
    }
}

impl From<serde_json::Error> for FolioError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the library schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        FolioError::Parse { source: e, hint }
    }
}

pub type Result<T> = std::result::Result<T, FolioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_carries_hint() {
        let err: FolioError = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.contains("failed to parse library"));
        assert!(msg.contains("trailing commas"));
    }

    #[test]
    fn block_error_wraps_layout() {
        let err: BlockError = LayoutError::InvalidRegion {
            width: 0.0,
            height: 10.0,
        }
        .into();
        assert!(matches!(err, BlockError::Layout(_)));
        assert!(err.to_string().contains("positive width"));
    }
}
