//! Single images and before/after comparisons.
//!
//! Sizing always starts from the source pixels: the aspect ratio is never
//! changed, only the scale. See [`fit_image`].

use std::rc::Rc;

use super::RenderContext;
use crate::error::{BlockError, LayoutError};
use crate::image_loader::LoadedImage;
use crate::layout::{BoxStyle, DrawOptions, Rect, RuleStyle};
use crate::model::{CompareMode, ImageBlock, ImageCompareBlock};
use crate::style::{palette, Align, Color};

const MIN_SCALE: f64 = 0.1;
const CAPTION_GAP: f64 = 4.0;
const HANDLE: f64 = 12.0;

/// Size an image for a frame `max_w` wide.
///
/// `fraction` is the share of `max_w` to use; without one the image keeps
/// its natural size. Either way the scale is clamped to `[0.1, 1.0]` of
/// `max_w`, and a result taller than `max_h` shrinks to fit.
pub(crate) fn fit_image(image: &LoadedImage, fraction: Option<f64>, max_w: f64, max_h: f64) -> (f64, f64) {
    let scale = match fraction.filter(|f| f.is_finite()) {
        Some(f) => f,
        None => image.natural_size().0 / max_w,
    };
    let scale = if scale.is_finite() { scale } else { 1.0 };
    let aspect = image.aspect();
    let mut width = max_w * scale.clamp(MIN_SCALE, 1.0);
    let mut height = width * aspect;
    if height > max_h && max_h > 0.0 && aspect > 0.0 {
        height = max_h;
        width = height / aspect;
    }
    (width, height)
}

/// Height a caption adds below an image, including the gap above it.
pub(super) fn caption_height(ctx: &RenderContext<'_>, caption: Option<&str>, width: f64) -> f64 {
    match caption {
        Some(c) if !c.is_empty() => CAPTION_GAP + ctx.measure(c, &ctx.caption_style(), width).height,
        _ => 0.0,
    }
}

/// Draw a caption at the cursor in space the caller reserved.
pub(super) fn draw_caption(
    ctx: &mut RenderContext<'_>,
    caption: Option<&str>,
    align: Align,
) -> Result<(), LayoutError> {
    if let Some(c) = caption.filter(|c| !c.is_empty()) {
        ctx.canvas.move_y(CAPTION_GAP);
        let style = ctx.caption_style().align(align);
        ctx.canvas.draw_text(c, &style, DrawOptions::reserved())?;
    }
    Ok(())
}

pub(super) fn render(ctx: &mut RenderContext<'_>, block: &ImageBlock) -> Result<(), BlockError> {
    let image = ctx.cache.image(&ctx.assets, &block.src)?;
    let max_w = ctx.canvas.content_width();
    let caption = block.caption.as_deref();
    let caption_h = caption_height(ctx, caption, max_w);
    let max_h = (ctx.canvas.body_height() - caption_h).max(ctx.config.placeholder_height);
    let (w, h) = fit_image(&image, block.width, max_w, max_h);

    ctx.canvas.ensure_block(h + caption_h, true);
    ctx.canvas
        .draw_image(&image, w, h, block.align, DrawOptions::reserved())?;
    draw_caption(ctx, caption, block.align)?;
    Ok(())
}

pub(super) fn render_compare(ctx: &mut RenderContext<'_>, block: &ImageCompareBlock) -> Result<(), BlockError> {
    let before = ctx.cache.image(&ctx.assets, &block.before)?;
    let after = ctx.cache.image(&ctx.assets, &block.after)?;
    match block.mode {
        CompareMode::Slider => slider(ctx, block, &before, &after)?,
        CompareMode::SideBySide => side_by_side(ctx, block, &before, &after)?,
    }
    Ok(())
}

fn labels_height(ctx: &RenderContext<'_>, block: &ImageCompareBlock) -> f64 {
    if block.before_label.is_some() || block.after_label.is_some() {
        CAPTION_GAP + ctx.small_style().line_px()
    } else {
        0.0
    }
}

/// The after image drawn over the before image, visible only right of the
/// split line.
fn slider(
    ctx: &mut RenderContext<'_>,
    block: &ImageCompareBlock,
    before: &Rc<LoadedImage>,
    after: &Rc<LoadedImage>,
) -> Result<(), LayoutError> {
    let position = if block.position.is_finite() {
        block.position.clamp(0.0, 1.0)
    } else {
        0.5
    };
    let max_w = ctx.canvas.content_width();
    let caption = block.caption.as_deref();
    let extra = labels_height(ctx, block) + caption_height(ctx, caption, max_w);
    let max_h = (ctx.canvas.body_height() - extra).max(ctx.config.placeholder_height);
    let (w, h) = fit_image(before, Some(1.0), max_w, max_h);

    ctx.canvas.ensure_block(h + extra, true);
    let top = ctx.canvas.cursor_y();
    let left = ctx.canvas.active_region().x;
    let frame = ctx
        .canvas
        .draw_image(before, w, h, Align::Center, DrawOptions::reserved().no_advance())?;

    let split_x = frame.x + w * position;
    let clip_w = frame.right() - split_x;
    if clip_w > 0.5 {
        let clip = Rect::new(split_x, top, clip_w, h);
        ctx.with_clip_rect(clip, |ctx| {
            ctx.canvas
                .draw_image(after, w, w * after.aspect(), Align::Center, DrawOptions::at(top))
        })??;
    }

    let divider = RuleStyle {
        thickness: 2.0,
        color: Color::WHITE,
        dashed: false,
    };
    ctx.canvas.draw_vline(split_x - left, top, top + h, divider)?;
    ctx.canvas.draw_box(
        HANDLE,
        BoxStyle::filled(Color::WHITE)
            .stroke(palette::BORDER, 0.75)
            .radius(HANDLE / 2.0),
        DrawOptions::at(top + (h - HANDLE) / 2.0)
            .offset(split_x - left - HANDLE / 2.0)
            .width(HANDLE),
    )?;
    ctx.canvas.set_cursor_y(top + h);

    if labels_height(ctx, block) > 0.0 {
        ctx.canvas.move_y(CAPTION_GAP);
        let y = ctx.canvas.cursor_y();
        let style = ctx.small_style();
        let opts = DrawOptions::at(y).offset(frame.x - left).width(w);
        if let Some(label) = &block.before_label {
            ctx.canvas.draw_text(label, &style, opts)?;
        }
        if let Some(label) = &block.after_label {
            ctx.canvas.draw_text(label, &style.align(Align::Right), opts)?;
        }
        ctx.canvas.move_y(style.line_px());
    }
    draw_caption(ctx, caption, Align::Center)
}

fn side_by_side(
    ctx: &mut RenderContext<'_>,
    block: &ImageCompareBlock,
    before: &Rc<LoadedImage>,
    after: &Rc<LoadedImage>,
) -> Result<(), LayoutError> {
    let gap = ctx.config.grid_gap;
    let content_w = ctx.canvas.content_width();
    let half = (content_w - gap) / 2.0;
    let caption = block.caption.as_deref();
    let labels_h = labels_height(ctx, block);
    let extra = labels_h + caption_height(ctx, caption, content_w);
    let max_h = (ctx.canvas.body_height() - extra).max(ctx.config.placeholder_height);
    let sides = [
        (before, block.before_label.as_deref(), fit_image(before, Some(1.0), half, max_h)),
        (after, block.after_label.as_deref(), fit_image(after, Some(1.0), half, max_h)),
    ];
    let row_h = sides.iter().map(|(_, _, (_, h))| *h).fold(0.0, f64::max);

    ctx.canvas.ensure_block(row_h + extra, true);
    let top = ctx.canvas.cursor_y();
    let left = ctx.canvas.active_region().x;
    for (i, (image, label, (w, h))) in sides.into_iter().enumerate() {
        let cell = Rect::new(left + i as f64 * (half + gap), top, half, row_h + labels_h);
        ctx.with_region(cell, |ctx| -> Result<(), LayoutError> {
            ctx.canvas
                .draw_image(image, w, h, Align::Center, DrawOptions::reserved())?;
            if let Some(label) = label {
                ctx.canvas.set_cursor_y(top + row_h + CAPTION_GAP);
                let style = ctx.small_style().align(Align::Center);
                ctx.canvas.draw_text(label, &style, DrawOptions::reserved())?;
            }
            Ok(())
        })??;
    }
    ctx.canvas.set_cursor_y(top + row_h + labels_h);
    draw_caption(ctx, caption, Align::Center)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_loader::ImageData;
    use crate::layout::PageOp;
    use crate::render::tests::{png_uri, Harness};

    fn image(w: u32, h: u32) -> LoadedImage {
        LoadedImage {
            pixel_width: w,
            pixel_height: h,
            data: ImageData::Decoded {
                rgb: vec![0; (w * h * 3) as usize],
                alpha: None,
            },
        }
    }

    #[test]
    fn natural_size_is_capped_at_frame_width() {
        let (w, h) = fit_image(&image(800, 400), None, 300.0, 1000.0);
        assert_eq!((w, h), (300.0, 150.0));
    }

    #[test]
    fn scale_is_clamped_and_aspect_kept() {
        let img = image(200, 100);
        assert_eq!(fit_image(&img, Some(0.01), 300.0, 1000.0), (30.0, 15.0));
        assert_eq!(fit_image(&img, Some(4.0), 300.0, 1000.0), (300.0, 150.0));
        assert_eq!(fit_image(&img, Some(f64::NAN), 300.0, 1000.0), (150.0, 75.0));
    }

    #[test]
    fn tall_images_shrink_to_max_height() {
        let (w, h) = fit_image(&image(100, 1000), Some(1.0), 300.0, 500.0);
        assert_eq!(h, 500.0);
        assert_eq!(w, 50.0);
    }

    #[test]
    fn image_and_caption_move_together() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        ctx.canvas.move_y(400.0);
        let block = ImageBlock {
            src: png_uri(400, 200, 10),
            caption: Some("Figure 1".to_string()),
            width: Some(1.0),
            align: Align::Center,
        };
        render(&mut ctx, &block).unwrap();
        let (pages, _) = ctx.finish();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].images().count(), 1);
        assert!(pages[1].contains_text("Figure 1"));
    }

    fn compare(mode: CompareMode, position: f64) -> ImageCompareBlock {
        ImageCompareBlock {
            before: png_uri(40, 20, 1),
            after: png_uri(40, 20, 2),
            mode,
            position,
            before_label: Some("Before".to_string()),
            after_label: Some("After".to_string()),
            caption: None,
        }
    }

    #[test]
    fn slider_clips_the_after_image() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        render_compare(&mut ctx, &compare(CompareMode::Slider, 0.25)).unwrap();
        let ops = ctx.canvas.current_ops();
        let clip = ops.iter().find_map(|op| match op {
            PageOp::PushClip { x, width, .. } => Some((*x, *width)),
            _ => None,
        });
        // 300pt frame split a quarter of the way in
        assert_eq!(clip, Some((125.0, 225.0)));
        assert_eq!(ops.iter().filter(|op| matches!(op, PageOp::Image { .. })).count(), 2);
        assert!(ops.iter().any(|op| matches!(op, PageOp::PopClip)));
    }

    #[test]
    fn slider_at_far_right_skips_the_overlay() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        render_compare(&mut ctx, &compare(CompareMode::Slider, 1.0)).unwrap();
        let ops = ctx.canvas.current_ops();
        assert!(!ops.iter().any(|op| matches!(op, PageOp::PushClip { .. })));
        assert_eq!(ops.iter().filter(|op| matches!(op, PageOp::Image { .. })).count(), 1);
    }

    #[test]
    fn side_by_side_uses_two_columns() {
        let h = Harness::new();
        let mut ctx = h.ctx();
        render_compare(&mut ctx, &compare(CompareMode::SideBySide, 0.5)).unwrap();
        let xs: Vec<f64> = ctx
            .canvas
            .current_ops()
            .iter()
            .filter_map(|op| match op {
                PageOp::Image { x, width, .. } => Some(*x + width / 2.0),
                _ => None,
            })
            .collect();
        assert_eq!(xs.len(), 2);
        assert!(xs[0] < 200.0 && xs[1] > 200.0);
        let (pages, _) = ctx.finish();
        assert!(pages[0].contains_text("Before"));
        assert!(pages[0].contains_text("After"));
    }
}
