//! # Block Rendering
//!
//! [`RenderContext`] is threaded through every renderer. It owns the
//! [`Canvas`] for one output document and borrows the engine-wide icon set
//! and raster cache.
//!
//! [`render_block`] is the dispatch point: an exhaustive match over
//! [`ContentBlock`]. Renderers return a [`BlockError`]; dispatch turns
//! malformed data and asset failures into a visible error box, logs where in
//! the tree it happened, and keeps going. Only a [`LayoutError`] escapes.

mod chart;
mod code;
mod divider;
mod grid;
mod image;
mod list;
mod math;
mod media;
mod message;
mod table;
mod text;
mod title;
pub mod walker;

pub use grid::{grid_columns, grid_shape};
pub use math::typeset as typeset_math;
pub use media::video_id;

use crate::error::{BlockError, LayoutError};
use crate::font::{FontRole, FontSet};
use crate::icons::{IconKey, IconSet};
use crate::image_loader::AssetResolver;
use crate::layout::{Canvas, LayoutPage, Rect, TextStyle};
use crate::model::ContentBlock;
use crate::raster::RasterCache;
use crate::style::{palette, LayoutConfig};
use crate::text::WrappedText;

/// A bookmark recorded by the walker for every category and document.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineEntry {
    pub title: String,
    /// 1 for root categories and standalone documents.
    pub level: u8,
    /// Zero-based page index.
    pub page: usize,
    /// Top-down position of the heading on its page.
    pub y: f64,
}

/// Where a heading landed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub page: usize,
    pub y: f64,
}

pub struct RenderContext<'a> {
    pub canvas: Canvas,
    pub config: &'a LayoutConfig,
    pub icons: &'a IconSet,
    pub cache: &'a RasterCache,
    pub assets: AssetResolver,
    outline: Vec<OutlineEntry>,
    breadcrumb: Vec<String>,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        config: &'a LayoutConfig,
        fonts: FontSet,
        icons: &'a IconSet,
        cache: &'a RasterCache,
    ) -> Self {
        Self {
            canvas: Canvas::new(config.page, fonts),
            config,
            icons,
            cache,
            assets: AssetResolver::new(config.asset_root.clone()),
            outline: Vec::new(),
            breadcrumb: Vec::new(),
        }
    }

    /// Run `f` with the canvas scoped to `rect`.
    pub fn with_region<R>(
        &mut self,
        rect: Rect,
        f: impl FnOnce(&mut Self) -> R,
    ) -> Result<R, LayoutError> {
        let token = self.canvas.enter_region(rect)?;
        let out = f(self);
        self.canvas.leave_region(token)?;
        Ok(out)
    }

    /// Run `f` with drawing restricted to `rect`.
    pub fn with_clip_rect<R>(
        &mut self,
        rect: Rect,
        f: impl FnOnce(&mut Self) -> R,
    ) -> Result<R, LayoutError> {
        let token = self.canvas.enter_clip(rect)?;
        let out = f(self);
        self.canvas.leave_clip(token)?;
        Ok(out)
    }

    /// Wrap `text` for `style` at `width` without drawing.
    pub fn measure(&self, text: &str, style: &TextStyle, width: f64) -> WrappedText {
        style.wrap(text, self.canvas.fonts().get(style.font), width)
    }

    /// Width of a single run of text.
    pub fn text_width(&self, text: &str, style: &TextStyle) -> f64 {
        self.canvas.fonts().get(style.font).measure(text, style.size)
    }

    pub fn body_style(&self) -> TextStyle {
        TextStyle::new(FontRole::Regular, self.config.base_font_size, self.config.line_height)
    }

    pub fn small_style(&self) -> TextStyle {
        TextStyle::new(FontRole::Regular, self.config.small_font_size, 1.35).color(palette::MUTED)
    }

    pub fn caption_style(&self) -> TextStyle {
        TextStyle::new(FontRole::Italic, self.config.small_font_size, 1.35).color(palette::MUTED)
    }

    pub(crate) fn push_crumb(&mut self, title: &str) {
        self.breadcrumb.push(title.to_string());
    }

    pub(crate) fn pop_crumb(&mut self) {
        self.breadcrumb.pop();
    }

    /// Tree position for diagnostics, e.g. `Guides > Install`.
    pub fn breadcrumb(&self) -> String {
        if self.breadcrumb.is_empty() {
            "(root)".to_string()
        } else {
            self.breadcrumb.join(" > ")
        }
    }

    pub(crate) fn record_outline(&mut self, title: &str, level: u8, anchor: Anchor) {
        self.outline.push(OutlineEntry {
            title: title.to_string(),
            level,
            page: anchor.page,
            y: anchor.y,
        });
    }

    pub fn outline(&self) -> &[OutlineEntry] {
        &self.outline
    }

    pub fn finish(self) -> (Vec<LayoutPage>, Vec<OutlineEntry>) {
        (self.canvas.finish(), self.outline)
    }
}

/// Render one block, recovering from everything but layout errors.
pub fn render_block(
    ctx: &mut RenderContext<'_>,
    block: &ContentBlock,
    index: usize,
) -> Result<(), LayoutError> {
    let result = match block {
        ContentBlock::Title(b) => title::render(ctx, b),
        ContentBlock::Text(b) => text::render(ctx, b),
        ContentBlock::List(b) => list::render(ctx, b),
        ContentBlock::Table(b) => table::render(ctx, b),
        ContentBlock::MessageBox(b) => message::render(ctx, b),
        ContentBlock::Divider(b) => divider::render(ctx, b),
        ContentBlock::Image(b) => image::render(ctx, b),
        ContentBlock::ImageCompare(b) => image::render_compare(ctx, b),
        ContentBlock::ImageGrid(b) => grid::render(ctx, b),
        ContentBlock::Code(b) => code::render(ctx, b),
        ContentBlock::Chart(b) => chart::render(ctx, b),
        ContentBlock::Math(b) => math::render(ctx, b),
        ContentBlock::Audio(b) => media::render_audio(ctx, b),
        ContentBlock::Youtube(b) => media::render_youtube(ctx, b),
        ContentBlock::Unknown { kind, reason } => {
            log::warn!(
                "skipping unsupported block '{}' (#{} in {}): {}",
                kind,
                index,
                ctx.breadcrumb(),
                reason
            );
            message::callout(
                ctx,
                IconKey::Warning,
                Some(&format!("Unsupported block: {kind}")),
                reason,
            )
            .map_err(BlockError::from)
        }
    };

    match result {
        Ok(()) => {}
        Err(BlockError::Layout(e)) => return Err(e),
        Err(e) => {
            log::warn!(
                "{} block #{} in {} failed: {}",
                block.kind(),
                index,
                ctx.breadcrumb(),
                e
            );
            let title = format!("Could not render {} block", block.kind());
            message::callout(ctx, IconKey::Error, Some(&title), &e.to_string())?;
        }
    }

    if !matches!(block, ContentBlock::Title(_)) {
        ctx.canvas.move_y(ctx.config.block_spacing);
    }
    Ok(())
}

/// Shorten `text` with an ellipsis until it fits `width` on one line.
pub(crate) fn truncate_to_width(ctx: &RenderContext<'_>, text: &str, style: &TextStyle, width: f64) -> String {
    if ctx.text_width(text, style) <= width {
        return text.to_string();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate: String = chars.iter().collect::<String>() + "...";
        if ctx.text_width(&candidate, style) <= width {
            return candidate;
        }
    }
    String::new()
}
