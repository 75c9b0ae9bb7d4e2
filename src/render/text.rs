use super::RenderContext;
use crate::error::BlockError;
use crate::layout::DrawOptions;
use crate::model::TextBlock;

/// Paragraphs may split across pages line by line, but never leave a single
/// line stranded at the bottom.
pub(super) fn render(ctx: &mut RenderContext<'_>, block: &TextBlock) -> Result<(), BlockError> {
    let style = ctx.body_style();
    let wrapped = ctx.measure(&block.text, &style, ctx.canvas.content_width());
    let lead = wrapped.line_height * wrapped.line_count().min(2) as f64;
    ctx.canvas.ensure_block(lead, true);
    ctx.canvas.draw_text(&block.text, &style, DrawOptions::flow())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::Harness;

    #[test]
    fn long_paragraph_continues_on_next_page() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        let text = "Pagination is decided while drawing. ".repeat(80);
        render(&mut ctx, &TextBlock { text }).unwrap();
        assert!(ctx.canvas.page_count() >= 2);
        let (pages, _) = ctx.finish();
        assert!(pages.iter().all(|p| p.texts().count() > 0));
    }

    #[test]
    fn no_single_line_orphan() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        // leave room for one body line only
        let line = h.config.base_font_size * h.config.line_height;
        ctx.canvas.move_y(500.0 - line * 1.5);
        render(&mut ctx, &TextBlock { text: "first\nsecond\nthird".to_string() }).unwrap();
        let (pages, _) = ctx.finish();
        assert_eq!(pages[0].texts().count(), 0);
        assert_eq!(pages[1].texts().count(), 3);
    }
}
