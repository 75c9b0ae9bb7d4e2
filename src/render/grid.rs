//! Image grids.
//!
//! The column count comes from the number of images, never from input. Each
//! row is one keep-together unit, so a grid may break between rows but never
//! through one. An image that fails to load becomes a placeholder cell; the
//! rest of the grid still renders.

use std::rc::Rc;

use super::image::{caption_height, draw_caption, fit_image};
use super::{message, RenderContext};
use crate::error::{AssetError, BlockError, LayoutError};
use crate::image_loader::LoadedImage;
use crate::layout::{DrawOptions, Rect};
use crate::model::ImageGridBlock;
use crate::style::Align;

/// Columns for a grid of `n` images. Up to nine images stay in three
/// columns so a grid never gets more columns than rows.
pub fn grid_columns(n: usize) -> usize {
    match n {
        0 | 1 => 1,
        2 => 2,
        3..=9 => 3,
        10..=16 => 4,
        _ => ((n as f64).sqrt().ceil() as usize).min(5),
    }
}

/// `(columns, rows)` for `n` images; the last row may be partial.
pub fn grid_shape(n: usize) -> (usize, usize) {
    let cols = grid_columns(n);
    (cols, n.div_ceil(cols))
}

struct Cell {
    image: Result<Rc<LoadedImage>, AssetError>,
    caption: Option<String>,
    height: f64,
}

pub(super) fn render(ctx: &mut RenderContext<'_>, block: &ImageGridBlock) -> Result<(), BlockError> {
    if block.images.is_empty() {
        return Err(BlockError::Malformed("image grid has no images".to_string()));
    }
    let (cols, rows) = grid_shape(block.images.len());
    let gap = ctx.config.grid_gap;
    let content_w = ctx.canvas.content_width();
    let cell_w = (content_w - gap * (cols - 1) as f64) / cols as f64;
    let max_h = ctx.canvas.body_height() / 2.0;
    log::debug!("image grid of {} laid out {cols}x{rows}", block.images.len());

    let cells: Vec<Cell> = block
        .images
        .iter()
        .map(|entry| {
            let image = ctx.cache.image(&ctx.assets, &entry.src);
            let height = match &image {
                Ok(img) => fit_image(img, Some(1.0), cell_w, max_h).1,
                Err(e) => {
                    log::warn!("image grid cell in {} failed: {}", ctx.breadcrumb(), e);
                    (cell_w * 0.75).min(max_h)
                }
            };
            Cell {
                image,
                caption: entry.caption.clone(),
                height,
            }
        })
        .collect();

    for (r, row) in cells.chunks(cols).enumerate() {
        if r > 0 {
            ctx.canvas.move_y(gap);
        }
        draw_row(ctx, row, cell_w, gap)?;
    }
    let caption = block.caption.as_deref();
    let caption_h = caption_height(ctx, caption, content_w);
    if caption_h > 0.0 {
        ctx.canvas.ensure_block(caption_h, true);
        draw_caption(ctx, caption, Align::Center)?;
    }
    Ok(())
}

fn draw_row(ctx: &mut RenderContext<'_>, row: &[Cell], cell_w: f64, gap: f64) -> Result<(), LayoutError> {
    let image_h = row.iter().map(|c| c.height).fold(0.0, f64::max);
    let caption_h = row
        .iter()
        .map(|c| caption_height(ctx, c.caption.as_deref(), cell_w))
        .fold(0.0, f64::max);
    let row_h = image_h + caption_h;

    ctx.canvas.ensure_block(row_h, true);
    let top = ctx.canvas.cursor_y();
    let left = ctx.canvas.active_region().x;
    for (c, cell) in row.iter().enumerate() {
        let area = Rect::new(left + c as f64 * (cell_w + gap), top, cell_w, row_h);
        ctx.with_region(area, |ctx| -> Result<(), LayoutError> {
            match &cell.image {
                Ok(img) => {
                    ctx.canvas.draw_image(
                        img,
                        cell_w.min(cell.height / img.aspect().max(f64::EPSILON)),
                        cell.height,
                        Align::Center,
                        DrawOptions::reserved(),
                    )?;
                }
                Err(_) => {
                    message::placeholder(ctx, 0.0, cell_w, cell.height, "Image unavailable")?;
                    ctx.canvas.move_y(cell.height);
                }
            }
            ctx.canvas.set_cursor_y(top + image_h);
            draw_caption(ctx, cell.caption.as_deref(), Align::Center)
        })??;
    }
    ctx.canvas.set_cursor_y(top + row_h);
    Ok(())
}
