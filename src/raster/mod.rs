//! # Raster Cache
//!
//! Memoizes decoded images and rasterized charts. Entries are keyed by a
//! SHA-256 over the fields that determine the pixels, never over serialized
//! input text, so two structurally equal charts share an entry regardless of
//! how their JSON was written.
//!
//! The cache is content-keyed and append-only, which is what lets an
//! [`crate::Engine`] share one instance across every library it renders.
//! Failures are not cached.

pub mod chart;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use sha2::{Digest, Sha256};

use crate::error::{AssetError, RasterError};
use crate::image_loader::{AssetResolver, LoadedImage};
use crate::model::ChartBlock;

/// Content hash identifying one raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterKey([u8; 32]);

impl RasterKey {
    /// Key for a chart drawn at a given pixel size.
    pub fn chart(chart: &ChartBlock, width_px: u32, height_px: u32) -> Self {
        let mut h = Sha256::new();
        h.update(b"chart\0");
        h.update(chart.chart_type.name().as_bytes());
        h.update((chart.labels.len() as u64).to_le_bytes());
        for label in &chart.labels {
            update_str(&mut h, label);
        }
        h.update((chart.datasets.len() as u64).to_le_bytes());
        for (i, dataset) in chart.datasets.iter().enumerate() {
            h.update((dataset.values.len() as u64).to_le_bytes());
            for v in &dataset.values {
                h.update(v.to_bits().to_le_bytes());
            }
            h.update(chart::series_color(chart, i).to_rgba8());
        }
        h.update(width_px.to_le_bytes());
        h.update(height_px.to_le_bytes());
        RasterKey(h.finalize().into())
    }

    /// Key for an image source, after resolution against the asset root.
    pub fn image(identity: &str) -> Self {
        let mut h = Sha256::new();
        h.update(b"image\0");
        update_str(&mut h, identity);
        RasterKey(h.finalize().into())
    }
}

/// Length-prefixed so adjacent strings can't run together.
fn update_str(h: &mut Sha256, s: &str) {
    h.update((s.len() as u64).to_le_bytes());
    h.update(s.as_bytes());
}

/// Hit/miss counters, mostly for tests and `--pages-only` output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug, Default)]
pub struct RasterCache {
    entries: RefCell<HashMap<RasterKey, Rc<LoadedImage>>>,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl RasterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The chart's plot raster at `width_px` x `height_px`.
    pub fn chart(
        &self,
        chart: &ChartBlock,
        width_px: u32,
        height_px: u32,
    ) -> Result<Rc<LoadedImage>, RasterError> {
        let key = RasterKey::chart(chart, width_px, height_px);
        self.get_or_insert(key, || chart::rasterize(chart, width_px, height_px))
    }

    /// The decoded image behind `src`.
    pub fn image(&self, resolver: &AssetResolver, src: &str) -> Result<Rc<LoadedImage>, AssetError> {
        let key = RasterKey::image(&resolver.cache_identity(src));
        self.get_or_insert(key, || resolver.load_image(src))
    }

    fn get_or_insert<E>(
        &self,
        key: RasterKey,
        produce: impl FnOnce() -> Result<LoadedImage, E>,
    ) -> Result<Rc<LoadedImage>, E> {
        if let Some(hit) = self.entries.borrow().get(&key) {
            self.hits.set(self.hits.get() + 1);
            log::debug!("raster cache hit");
            return Ok(Rc::clone(hit));
        }
        self.misses.set(self.misses.get() + 1);
        let image = Rc::new(produce()?);
        self.entries.borrow_mut().insert(key, Rc::clone(&image));
        log::debug!(
            "raster cache miss; stored {}x{} raster",
            image.pixel_width,
            image.pixel_height
        );
        Ok(image)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.get(),
            misses: self.misses.get(),
            entries: self.entries.borrow().len(),
        }
    }
}
