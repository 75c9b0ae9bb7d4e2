use super::RenderContext;
use crate::error::{BlockError, LayoutError};
use crate::font::FontRole;
use crate::layout::DrawOptions;
use crate::model::{ListBlock, ListItem};

const BULLETS: [&str; 3] = ["\u{2022}", "-", "\u{00B7}"];

/// Deepest nesting that still indents; deeper levels reuse this indent.
const MAX_INDENT_FRACTION: f64 = 0.5;

pub(super) fn render(ctx: &mut RenderContext<'_>, block: &ListBlock) -> Result<(), BlockError> {
    if block.items.is_empty() {
        return Err(BlockError::Malformed("list has no items".to_string()));
    }
    draw_items(ctx, &block.items, block.ordered, block.start.unwrap_or(1), 0, 0.0)?;
    Ok(())
}

fn marker(ordered: bool, number: u32, depth: usize) -> String {
    if ordered {
        format!("{number}.")
    } else {
        BULLETS[depth % BULLETS.len()].to_string()
    }
}

/// Width of the marker column: the widest marker in this list plus a gap.
fn marker_column(ctx: &RenderContext<'_>, markers: &[String], size: f64) -> f64 {
    let face = ctx.canvas.fonts().get(FontRole::Regular);
    let widest = markers.iter().map(|m| face.measure(m, size)).fold(0.0, f64::max);
    widest + size * 0.6
}

fn draw_items(
    ctx: &mut RenderContext<'_>,
    items: &[ListItem],
    ordered: bool,
    start: u32,
    depth: usize,
    indent: f64,
) -> Result<(), LayoutError> {
    let style = ctx.body_style();
    let markers: Vec<String> = (0..items.len())
        .map(|i| marker(ordered, start.saturating_add(i as u32), depth))
        .collect();
    let indent = indent.min(ctx.canvas.content_width() * MAX_INDENT_FRACTION);
    let column = marker_column(ctx, &markers, style.size);
    let text_x = indent + column;
    let text_w = ctx.canvas.content_width() - text_x;

    for (item, marker) in items.iter().zip(&markers) {
        let wrapped = ctx.measure(&item.text, &style, text_w);
        ctx.canvas
            .ensure_block(wrapped.line_height * wrapped.line_count().min(2) as f64, true);
        let y = ctx.canvas.cursor_y();
        ctx.canvas.draw_text(
            marker,
            &style,
            DrawOptions::at(y).offset(indent).width(column),
        )?;
        // continuation lines hang at the text column
        ctx.canvas.draw_text(
            &item.text,
            &style,
            DrawOptions::flow().offset(text_x).width(text_w),
        )?;
        if !item.children.is_empty() {
            draw_items(ctx, &item.children, ordered, 1, depth + 1, text_x)?;
        }
        ctx.canvas.move_y(style.size * 0.25);
    }
    Ok(())
}
