//! Tables.
//!
//! Rows are the unit of pagination: every row is measured, reserved with
//! `ensure_block(row_height, true)` and drawn whole. The header travels with
//! the first body row and, when `repeatHeader` is set, is drawn again at the
//! top of every continuation page.

use super::RenderContext;
use crate::error::{BlockError, LayoutError};
use crate::font::FontRole;
use crate::layout::{BoxStyle, DrawOptions, Placement, Rect, RuleStyle, TextStyle};
use crate::model::{Cell, TableBlock};
use crate::style::{palette, Color};

struct Grid {
    widths: Vec<f64>,
    padding: f64,
    body: TextStyle,
    header: TextStyle,
}

pub(super) fn render(ctx: &mut RenderContext<'_>, block: &TableBlock) -> Result<(), BlockError> {
    let columns = block.column_count();
    if columns == 0 {
        return Err(BlockError::Malformed("table has no columns".to_string()));
    }
    let cfg = ctx.config;
    let padding = cfg.table_cell_padding;
    let body = TextStyle::new(FontRole::Regular, cfg.table_font_size, cfg.table_line_height);
    let min_width = 2.0 * padding + cfg.table_font_size;
    let widths = column_widths(&block.column_widths, columns, ctx.canvas.content_width(), min_width)
        .ok_or_else(|| {
            BlockError::Malformed(format!("{columns} columns do not fit the content width"))
        })?;
    let grid = Grid {
        widths,
        padding,
        body,
        header: TextStyle::new(FontRole::Bold, body.size, body.line_height).color(palette::DARK),
    };

    let header = (!block.headers.is_empty()).then(|| {
        let h = row_height(ctx, &grid, &block.headers, &grid.header);
        (block.headers.as_slice(), h)
    });

    if let Some((cells, h)) = header {
        let first = block
            .rows
            .first()
            .map_or(0.0, |r| row_height(ctx, &grid, r, &grid.body));
        ctx.canvas.ensure_block(h + first, true);
        draw_row(ctx, &grid, cells, &grid.header, Some(palette::HEADER_SURFACE), h)?;
    }

    for (i, row) in block.rows.iter().enumerate() {
        let h = row_height(ctx, &grid, row, &grid.body);
        if h > ctx.canvas.body_height() {
            log::warn!(
                "table row {} in {} is taller than a page ({:.0}pt); it will overflow",
                i + 1,
                ctx.breadcrumb(),
                h
            );
        }
        let placement = ctx.canvas.ensure_block(h, true);
        if placement == Placement::NewPage && block.repeat_header {
            if let Some((cells, hh)) = header {
                draw_row(ctx, &grid, cells, &grid.header, Some(palette::HEADER_SURFACE), hh)?;
                ctx.canvas.ensure_block(h, true);
            }
        }
        let zebra = (i % 2 == 1).then_some(palette::SURFACE);
        draw_row(ctx, &grid, row, &grid.body, zebra, h)?;
    }
    Ok(())
}

/// Resolve column widths from optional relative weights. Returns `None`
/// when even equal columns would be narrower than `min_width`.
fn column_widths(weights: &[f64], columns: usize, total: f64, min_width: f64) -> Option<Vec<f64>> {
    let equal = total / columns as f64;
    if equal < min_width {
        return None;
    }
    let given: Vec<f64> = weights
        .iter()
        .copied()
        .filter(|w| w.is_finite() && *w > 0.0)
        .collect();
    if given.len() != weights.len() || weights.is_empty() {
        return Some(vec![equal; columns]);
    }
    // columns without a weight get the average of the given ones
    let mean = given.iter().sum::<f64>() / given.len() as f64;
    let all: Vec<f64> = (0..columns)
        .map(|i| given.get(i).copied().unwrap_or(mean))
        .collect();
    let sum: f64 = all.iter().sum();
    let widths: Vec<f64> = all.iter().map(|w| w / sum * total).collect();
    if widths.iter().any(|w| *w < min_width) {
        return Some(vec![equal; columns]);
    }
    Some(widths)
}

fn row_height(ctx: &RenderContext<'_>, grid: &Grid, cells: &[Cell], style: &TextStyle) -> f64 {
    let lines = grid
        .widths
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let text = cells.get(i).map_or("", Cell::as_str);
            ctx.measure(text, style, w - 2.0 * grid.padding).line_count()
        })
        .max()
        .unwrap_or(1);
    lines as f64 * style.line_px() + 2.0 * grid.padding
}

fn draw_row(
    ctx: &mut RenderContext<'_>,
    grid: &Grid,
    cells: &[Cell],
    style: &TextStyle,
    fill: Option<Color>,
    height: f64,
) -> Result<(), LayoutError> {
    let top = ctx.canvas.cursor_y();
    let left = ctx.canvas.active_region().x;
    let frame = BoxStyle {
        fill,
        ..BoxStyle::outlined(palette::BORDER, 0.5)
    };
    ctx.canvas
        .draw_box(height, frame, DrawOptions::reserved().no_advance())?;

    let mut x = 0.0;
    for (i, width) in grid.widths.iter().enumerate() {
        if i > 0 {
            ctx.canvas.draw_vline(
                x,
                top,
                top + height,
                RuleStyle {
                    thickness: 0.5,
                    ..RuleStyle::default()
                },
            )?;
        }
        let text = cells.get(i).map_or("", Cell::as_str);
        let cell = Rect::new(
            left + x + grid.padding,
            top + grid.padding,
            width - 2.0 * grid.padding,
            height - 2.0 * grid.padding,
        );
        ctx.with_region(cell, |ctx| {
            ctx.canvas.draw_text(text, style, DrawOptions::reserved())
        })??;
        x += width;
    }
    ctx.canvas.set_cursor_y(top + height);
    Ok(())
}
