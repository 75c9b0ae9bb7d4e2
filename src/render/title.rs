use super::{Anchor, RenderContext};
use crate::error::{BlockError, LayoutError};
use crate::font::FontRole;
use crate::layout::{DrawOptions, TextStyle};
use crate::model::TitleBlock;
use crate::style::palette;

pub(super) fn render(ctx: &mut RenderContext<'_>, block: &TitleBlock) -> Result<(), BlockError> {
    draw_title(ctx, &block.text, block.level)?;
    Ok(())
}

/// Draw a heading and report where it landed.
///
/// The reservation covers the heading's spacing plus `title_keep_with_next`,
/// so a heading never ends up alone at the bottom of a page.
pub(super) fn draw_title(
    ctx: &mut RenderContext<'_>,
    text: &str,
    level: u8,
) -> Result<Anchor, LayoutError> {
    let cfg = ctx.config;
    let color = if level <= 2 { palette::DARK } else { palette::TEXT };
    let style = TextStyle::new(FontRole::Bold, cfg.title_size(level), cfg.title_line_height).color(color);
    let height = ctx.measure(text, &style, ctx.canvas.content_width()).height;

    ctx.canvas.ensure_block(
        cfg.title_top_spacing + height + cfg.title_bottom_spacing + cfg.title_keep_with_next,
        true,
    );
    ctx.canvas.move_y(cfg.title_top_spacing);
    let anchor = Anchor {
        page: ctx.canvas.page_index(),
        y: ctx.canvas.cursor_y(),
    };
    ctx.canvas.draw_text(text, &style, DrawOptions::reserved())?;
    ctx.canvas.move_y(cfg.title_bottom_spacing);
    Ok(anchor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::Harness;

    #[test]
    fn title_on_empty_page_respects_spacing() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        let top = ctx.canvas.top();
        let anchor = draw_title(&mut ctx, "Setup Guide", 1).unwrap();
        let cfg = &h.config;
        assert_eq!(anchor.y, top + cfg.title_top_spacing);
        let title_height = cfg.title_size(1) * cfg.title_line_height;
        let expected = top + cfg.title_top_spacing + title_height + cfg.title_bottom_spacing;
        assert!((ctx.canvas.cursor_y() - expected).abs() < 1e-9);
        assert_eq!(ctx.canvas.page_count(), 1);
    }

    #[test]
    fn title_near_bottom_moves_to_next_page() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        ctx.canvas.move_y(460.0);
        let anchor = draw_title(&mut ctx, "Late heading", 2).unwrap();
        assert_eq!(anchor.page, 1);
        assert_eq!(anchor.y, ctx.canvas.top() + h.config.title_top_spacing);
    }

    #[test]
    fn deep_levels_clamp_size() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        draw_title(&mut ctx, "Deep", 9).unwrap();
        let size = ctx.canvas.current_ops().iter().find_map(|op| match op {
            crate::layout::PageOp::Text { size, .. } => Some(*size),
            _ => None,
        });
        assert_eq!(size, Some(h.config.title_size(6)));
    }
}
