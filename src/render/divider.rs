use super::RenderContext;
use crate::error::BlockError;
use crate::layout::{DrawOptions, RuleStyle};
use crate::model::DividerBlock;

const GAP: f64 = 4.0;

pub(super) fn render(ctx: &mut RenderContext<'_>, block: &DividerBlock) -> Result<(), BlockError> {
    let style = RuleStyle {
        dashed: block.dashed,
        ..RuleStyle::default()
    };
    ctx.canvas.ensure_block(2.0 * GAP + style.thickness, true);
    ctx.canvas.move_y(GAP);
    ctx.canvas.draw_rule(style, DrawOptions::reserved())?;
    ctx.canvas.move_y(GAP);
    Ok(())
}
