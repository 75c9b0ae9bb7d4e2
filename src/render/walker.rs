//! Depth-first walk of a [`Library`].
//!
//! Order: each root category renders its title, description and blocks,
//! then its documents in input order, then its child categories
//! recursively, before the next root. Standalone documents follow the last
//! root category. The outline is recorded in the same order, so bookmarks
//! always match pagination.

use super::{render_block, title, RenderContext};
use crate::error::LayoutError;
use crate::font::FontRole;
use crate::layout::{DrawOptions, TextStyle};
use crate::model::{Category, ContentBlock, Document, Library};
use crate::style::palette;

/// Deepest heading level; deeper nesting reuses it.
const MAX_LEVEL: u8 = 6;

pub fn walk(ctx: &mut RenderContext<'_>, library: &Library) -> Result<(), LayoutError> {
    for category in &library.categories {
        walk_category(ctx, category, 1)?;
    }
    for document in &library.documents {
        walk_document(ctx, document, 1)?;
    }
    Ok(())
}

fn level(depth: usize) -> u8 {
    u8::try_from(depth).unwrap_or(MAX_LEVEL).min(MAX_LEVEL)
}

fn walk_category(ctx: &mut RenderContext<'_>, category: &Category, depth: usize) -> Result<(), LayoutError> {
    ctx.push_crumb(&category.title);
    heading(ctx, &category.title, level(depth))?;
    description(ctx, category.description.as_deref())?;
    blocks(ctx, &category.blocks)?;
    for document in &category.documents {
        walk_document(ctx, document, depth + 1)?;
    }
    for child in &category.categories {
        walk_category(ctx, child, depth + 1)?;
    }
    ctx.pop_crumb();
    Ok(())
}

fn walk_document(ctx: &mut RenderContext<'_>, document: &Document, depth: usize) -> Result<(), LayoutError> {
    ctx.push_crumb(&document.title);
    heading(ctx, &document.title, level(depth))?;
    description(ctx, document.description.as_deref())?;
    if !document.tags.is_empty() {
        let style = ctx.small_style().color(palette::ACCENT);
        let tags = document
            .tags
            .iter()
            .map(|t| format!("#{t}"))
            .collect::<Vec<_>>()
            .join(" ");
        ctx.canvas.draw_text(&tags, &style, DrawOptions::flow())?;
        ctx.canvas.move_y(ctx.config.block_spacing / 2.0);
    }
    blocks(ctx, &document.blocks)?;
    ctx.pop_crumb();
    Ok(())
}

fn heading(ctx: &mut RenderContext<'_>, text: &str, level: u8) -> Result<(), LayoutError> {
    let anchor = title::draw_title(ctx, text, level)?;
    ctx.record_outline(text, level, anchor);
    Ok(())
}

fn description(ctx: &mut RenderContext<'_>, text: Option<&str>) -> Result<(), LayoutError> {
    if let Some(text) = text.filter(|t| !t.trim().is_empty()) {
        let style = TextStyle::new(FontRole::Italic, ctx.config.base_font_size, ctx.config.line_height)
            .color(palette::MUTED);
        ctx.canvas.draw_text(text, &style, DrawOptions::flow())?;
        ctx.canvas.move_y(ctx.config.block_spacing / 2.0);
    }
    Ok(())
}

fn blocks(ctx: &mut RenderContext<'_>, blocks: &[ContentBlock]) -> Result<(), LayoutError> {
    for (i, block) in blocks.iter().enumerate() {
        render_block(ctx, block, i)?;
    }
    Ok(())
}
