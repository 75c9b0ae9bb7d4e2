//! # Folio
//!
//! A page-native layout engine for documentation trees.
//!
//! A library of categories and documents is walked depth-first and every
//! content block is placed directly onto fixed-size pages. Page breaks are
//! decided while laying out, with the page boundary as a hard constraint:
//! keep-together units move whole to the next page, tables and code listings
//! split between rows, and nothing is sliced after the fact.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON)
//!       ↓
//!   [model]    Library tree: categories, documents, content blocks
//!       ↓
//!   [render]   Tree walker + one renderer per block kind
//!       ↓
//!   [layout]   Canvas: cursor, regions, clips, drawing primitives
//!       ↓
//!   [pdf]      Serialize to PDF bytes
//! ```
//!
//! Text measurement lives in [`text`] and [`font`]; charts and images go
//! through the content-addressed [`raster::RasterCache`] owned by the
//! [`Engine`], so repeated assets are decoded once per engine.

pub mod error;
pub mod font;
pub mod icons;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod raster;
pub mod render;
pub mod style;
pub mod text;

pub use error::{FolioError, Result};

use font::FontSet;
use icons::IconSet;
use layout::LayoutPage;
use model::Library;
use pdf::PdfWriter;
use raster::{CacheStats, RasterCache};
use render::{OutlineEntry, RenderContext};

/// Finished pages of one library, ready for serialization.
#[derive(Debug, Clone)]
pub struct LayoutOutput {
    pub pages: Vec<LayoutPage>,
    pub outline: Vec<OutlineEntry>,
    pub fonts: FontSet,
}

/// Long-lived rendering state: the icon set and the raster cache are shared
/// by every library the engine lays out. Fonts are resolved per library from
/// its layout configuration.
#[derive(Debug, Default)]
pub struct Engine {
    icons: IconSet,
    cache: RasterCache,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lay out every category and document of `library` onto pages.
    pub fn layout(&self, library: &Library) -> Result<LayoutOutput> {
        let config = &library.layout;
        let fonts = FontSet::from_config(&config.fonts, config.asset_root.as_deref())?;
        let mut ctx = RenderContext::new(config, fonts.clone(), &self.icons, &self.cache);
        render::walker::walk(&mut ctx, library)?;
        let (pages, outline) = ctx.finish();
        log::debug!(
            "laid out {} pages with {} outline entries",
            pages.len(),
            outline.len()
        );
        Ok(LayoutOutput {
            pages,
            outline,
            fonts,
        })
    }

    /// Lay out `library` and serialize it to PDF bytes.
    pub fn render(&self, library: &Library) -> Result<Vec<u8>> {
        let output = self.layout(library)?;
        Ok(PdfWriter::new().write(
            &output.pages,
            &output.fonts,
            &output.outline,
            &library.metadata,
        ))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// Parse a library from JSON.
pub fn parse_library(json: &str) -> Result<Library> {
    Ok(serde_json::from_str(json)?)
}

/// Render a library described as JSON to PDF bytes with a fresh engine.
pub fn render_json(json: &str) -> Result<Vec<u8>> {
    let library = parse_library(json)?;
    Engine::new().render(&library)
}
