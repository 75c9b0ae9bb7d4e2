//! Message boxes, plus the two fallback visuals every other renderer leans
//! on: the error callout dispatch draws for a failed block, and the dashed
//! placeholder drawn in space a renderer already reserved.

use super::RenderContext;
use crate::error::{BlockError, LayoutError};
use crate::font::FontRole;
use crate::icons::{Icon, IconKey};
use crate::layout::{BoxStyle, DrawOptions, Rect, RuleStyle, TextStyle};
use crate::model::MessageBlock;
use crate::style::{palette, Align, Color};

const PAD: f64 = 10.0;
const BADGE: f64 = 16.0;
const GAP: f64 = 8.0;

pub(super) fn render(ctx: &mut RenderContext<'_>, block: &MessageBlock) -> Result<(), BlockError> {
    callout(ctx, block.variant.into(), block.title.as_deref(), &block.text)?;
    Ok(())
}

/// A tinted box with an icon badge, an optional bold title and a body.
///
/// A callout taller than the page body can't be kept together, so it is
/// drawn as flowing text between two accent rules instead.
pub(crate) fn callout(
    ctx: &mut RenderContext<'_>,
    key: IconKey,
    title: Option<&str>,
    body: &str,
) -> Result<(), LayoutError> {
    let icon = ctx.icons.get(key);
    let title_style = TextStyle::new(FontRole::Bold, ctx.config.base_font_size, ctx.config.line_height)
        .color(icon.color);
    let body_style = ctx.body_style();
    let inner_w = (ctx.canvas.content_width() - 2.0 * PAD - BADGE - GAP).max(body_style.size);

    let title_h = title.map_or(0.0, |t| ctx.measure(t, &title_style, inner_w).height);
    let body_h = if body.is_empty() {
        0.0
    } else {
        ctx.measure(body, &body_style, inner_w).height
    };
    let spacing = if title.is_some() && !body.is_empty() { 3.0 } else { 0.0 };
    let height = (title_h + spacing + body_h).max(BADGE) + 2.0 * PAD;

    if height > ctx.canvas.body_height() {
        log::debug!("callout of {height:.0}pt exceeds the page body; flowing it");
        return flowing_callout(ctx, icon, title, body, &title_style, &body_style);
    }

    ctx.canvas.ensure_block(height, true);
    let top = ctx.canvas.cursor_y();
    let left = ctx.canvas.active_region().x;
    ctx.canvas.draw_box(
        height,
        BoxStyle::filled(icon.tint).stroke(icon.color, 0.75).radius(4.0),
        DrawOptions::reserved().no_advance(),
    )?;
    draw_badge(ctx, icon, PAD, top + PAD)?;

    let text_area = Rect::new(left + PAD + BADGE + GAP, top + PAD, inner_w, height - 2.0 * PAD);
    ctx.with_region(text_area, |ctx| -> Result<(), LayoutError> {
        if let Some(t) = title {
            ctx.canvas.draw_text(t, &title_style, DrawOptions::reserved())?;
            ctx.canvas.move_y(spacing);
        }
        if !body.is_empty() {
            ctx.canvas.draw_text(body, &body_style, DrawOptions::reserved())?;
        }
        Ok(())
    })??;

    ctx.canvas.set_cursor_y(top + height);
    Ok(())
}

fn flowing_callout(
    ctx: &mut RenderContext<'_>,
    icon: Icon,
    title: Option<&str>,
    body: &str,
    title_style: &TextStyle,
    body_style: &TextStyle,
) -> Result<(), LayoutError> {
    let accent = RuleStyle {
        thickness: 2.0,
        color: icon.color,
        dashed: false,
    };
    ctx.canvas.draw_rule(accent, DrawOptions::flow())?;
    ctx.canvas.move_y(4.0);
    if let Some(t) = title {
        ctx.canvas.draw_text(t, title_style, DrawOptions::flow())?;
    }
    ctx.canvas.draw_text(body, body_style, DrawOptions::flow())?;
    ctx.canvas.move_y(4.0);
    ctx.canvas.draw_rule(accent, DrawOptions::flow())?;
    Ok(())
}

/// A round badge with the icon's glyph, `x` from the region's left edge.
pub(super) fn draw_badge(ctx: &mut RenderContext<'_>, icon: Icon, x: f64, y: f64) -> Result<(), LayoutError> {
    ctx.canvas.draw_box(
        BADGE,
        BoxStyle::filled(icon.color).radius(BADGE / 2.0),
        DrawOptions::at(y).offset(x).width(BADGE),
    )?;
    let glyph = TextStyle::new(FontRole::Bold, 10.0, BADGE / 10.0)
        .color(Color::WHITE)
        .align(Align::Center);
    ctx.canvas
        .draw_text(icon.glyph, &glyph, DrawOptions::at(y).offset(x).width(BADGE))?;
    Ok(())
}

/// A dashed box with a centered note, drawn at the cursor in space the
/// caller already reserved. The cursor does not move.
pub(crate) fn placeholder(
    ctx: &mut RenderContext<'_>,
    x: f64,
    width: f64,
    height: f64,
    label: &str,
) -> Result<(), LayoutError> {
    let top = ctx.canvas.cursor_y();
    ctx.canvas.draw_box(
        height,
        BoxStyle::filled(palette::SURFACE),
        DrawOptions::reserved().offset(x).width(width).no_advance(),
    )?;
    let dash = RuleStyle {
        thickness: 0.75,
        color: palette::MUTED,
        dashed: true,
    };
    ctx.canvas.draw_rule(dash, DrawOptions::at(top).offset(x).width(width))?;
    ctx.canvas
        .draw_rule(dash, DrawOptions::at(top + height - dash.thickness).offset(x).width(width))?;
    ctx.canvas.draw_vline(x, top, top + height, dash)?;
    ctx.canvas.draw_vline(x + width, top, top + height, dash)?;

    let style = ctx.small_style().align(Align::Center);
    let inner = (width - 8.0).max(style.size);
    let text_h = ctx.measure(label, &style, inner).height.min(height);
    ctx.canvas.draw_text(
        label,
        &style,
        DrawOptions::at(top + (height - text_h) / 2.0).offset(x + 4.0).width(inner),
    )?;
    Ok(())
}
