//! Region and clip scopes.
//!
//! Both stacks are strictly LIFO. The token returned when a scope opens must
//! be handed back to close it; closing out of order is a [`LayoutError`].
//! The closure forms (`with_region`, `with_clip_rect`) are what renderers
//! use. The token forms exist for callers that interleave scopes with their
//! own fallible work.

use super::{Canvas, PageOp, Rect};
use crate::error::LayoutError;

/// Proof that a region is open. Consumed by [`Canvas::leave_region`].
#[must_use = "a region must be closed with leave_region"]
#[derive(Debug)]
pub struct RegionToken {
    depth: usize,
    saved_cursor: f64,
}

/// Proof that a clip is open. Consumed by [`Canvas::leave_clip`].
#[must_use = "a clip must be closed with leave_clip"]
#[derive(Debug)]
pub struct ClipToken {
    depth: usize,
}

fn check_finite(rect: &Rect, primitive: &'static str) -> Result<(), LayoutError> {
    if [rect.x, rect.y, rect.width, rect.height]
        .iter()
        .all(|v| v.is_finite())
    {
        Ok(())
    } else {
        Err(LayoutError::NonFinite { primitive })
    }
}

impl Canvas {
    /// Push a sub-frame. The cursor moves to the region's top.
    pub fn enter_region(&mut self, rect: Rect) -> Result<RegionToken, LayoutError> {
        check_finite(&rect, "region")?;
        if rect.width <= 0.0 || rect.height < 0.0 {
            return Err(LayoutError::InvalidRegion {
                width: rect.width,
                height: rect.height,
            });
        }
        let token = RegionToken {
            depth: self.regions.len(),
            saved_cursor: self.cursor_y,
        };
        self.regions.push(rect);
        self.cursor_y = rect.y;
        Ok(token)
    }

    /// Pop the innermost region and restore the caller's cursor.
    pub fn leave_region(&mut self, token: RegionToken) -> Result<(), LayoutError> {
        if self.regions.len() != token.depth + 1 {
            return Err(LayoutError::UnbalancedRegion {
                expected: token.depth + 1,
                found: self.regions.len(),
            });
        }
        self.regions.pop();
        self.cursor_y = token.saved_cursor;
        Ok(())
    }

    /// Run `f` inside `rect`. Regions nest; the caller's cursor comes back
    /// unchanged regardless of what `f` drew.
    pub fn with_region<R>(
        &mut self,
        rect: Rect,
        f: impl FnOnce(&mut Canvas) -> R,
    ) -> Result<R, LayoutError> {
        let token = self.enter_region(rect)?;
        let out = f(self);
        self.leave_region(token)?;
        Ok(out)
    }

    /// Start clipping to `rect` (intersected with any enclosing clip).
    pub fn enter_clip(&mut self, rect: Rect) -> Result<ClipToken, LayoutError> {
        check_finite(&rect, "clip")?;
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return Err(LayoutError::InvalidClip {
                width: rect.width,
                height: rect.height,
            });
        }
        let effective = match self.clips.last() {
            Some(outer) => outer.intersection(&rect),
            None => rect,
        };
        let page_h = self.page_height();
        self.current.ops.push(PageOp::PushClip {
            x: rect.x,
            y: page_h - rect.bottom(),
            width: rect.width,
            height: rect.height,
        });
        let token = ClipToken {
            depth: self.clips.len(),
        };
        self.clips.push(effective);
        Ok(token)
    }

    pub fn leave_clip(&mut self, token: ClipToken) -> Result<(), LayoutError> {
        if self.clips.len() != token.depth + 1 {
            return Err(LayoutError::UnbalancedRegion {
                expected: token.depth + 1,
                found: self.clips.len(),
            });
        }
        self.clips.pop();
        self.current.ops.push(PageOp::PopClip);
        Ok(())
    }

    /// Run `f` with every primitive restricted to `rect`. Primitives entirely
    /// outside the clip are dropped; partially visible ones are cut by the
    /// output's clip path.
    pub fn with_clip_rect<R>(
        &mut self,
        rect: Rect,
        f: impl FnOnce(&mut Canvas) -> R,
    ) -> Result<R, LayoutError> {
        let token = self.enter_clip(rect)?;
        let out = f(self);
        self.leave_clip(token)?;
        Ok(out)
    }

    /// Depth of the region stack. Zero at page root.
    pub fn region_depth(&self) -> usize {
        self.regions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::tests::small_canvas;
    use crate::layout::{BoxStyle, DrawOptions, Placement};

    #[test]
    fn region_moves_cursor_and_restores_it() {
        let mut canvas = small_canvas();
        canvas.move_y(30.0);
        let before = canvas.cursor_y();
        let region = Rect::new(100.0, 200.0, 150.0, 100.0);
        let seen = canvas
            .with_region(region, |c| {
                let start = c.cursor_y();
                c.move_y(40.0);
                (start, c.content_width(), c.cursor_y())
            })
            .unwrap();
        assert_eq!(seen, (200.0, 150.0, 240.0));
        assert_eq!(canvas.cursor_y(), before);
    }

    #[test]
    fn nested_regions_restore_every_level() {
        let mut canvas = small_canvas();
        canvas.move_y(10.0);
        let outer = Rect::new(60.0, 100.0, 200.0, 300.0);
        let inner = Rect::new(80.0, 150.0, 100.0, 50.0);
        canvas
            .with_region(outer, |c| {
                c.move_y(25.0);
                let mid = c.cursor_y();
                c.with_region(inner, |c| {
                    assert_eq!(c.region_depth(), 2);
                    c.move_y(500.0);
                    assert_eq!(c.cursor_y(), 200.0);
                })
                .unwrap();
                assert_eq!(c.cursor_y(), mid);
                assert_eq!(c.region_depth(), 1);
            })
            .unwrap();
        assert_eq!(canvas.cursor_y(), 60.0);
        assert_eq!(canvas.region_depth(), 0);
    }

    fn descend(c: &mut Canvas, level: usize, levels: usize) {
        if level == levels {
            return;
        }
        let step = level as f64;
        let rect = Rect::new(50.0 + 4.0 * step, 60.0 + 20.0 * step, 300.0 - 8.0 * step, 40.0);
        c.with_region(rect, |c| {
            assert_eq!(c.region_depth(), level + 1);
            assert_eq!(c.cursor_y(), rect.y);
            c.move_y(7.0);
            let here = c.cursor_y();
            descend(c, level + 1, levels);
            assert_eq!(c.cursor_y(), here, "cursor lost at depth {}", level + 1);
            assert_eq!(c.region_depth(), level + 1);
        })
        .unwrap();
    }

    #[test]
    fn sixteen_nested_regions_unwind_exactly() {
        let mut canvas = small_canvas();
        canvas.move_y(12.5);
        descend(&mut canvas, 0, 16);
        assert_eq!(canvas.cursor_y(), 62.5);
        assert_eq!(canvas.region_depth(), 0);
    }

    #[test]
    fn regions_never_paginate() {
        let mut canvas = small_canvas();
        let region = Rect::new(50.0, 500.0, 100.0, 40.0);
        canvas
            .with_region(region, |c| {
                assert_eq!(c.ensure_block(1000.0, true), Placement::Fits);
            })
            .unwrap();
        assert_eq!(canvas.page_count(), 1);
    }

    #[test]
    fn zero_or_negative_width_is_rejected() {
        let mut canvas = small_canvas();
        for width in [0.0, -5.0] {
            let err = canvas
                .with_region(Rect::new(0.0, 0.0, width, 10.0), |_| ())
                .unwrap_err();
            assert!(matches!(err, LayoutError::InvalidRegion { .. }));
        }
        let err = canvas
            .with_region(Rect::new(0.0, 0.0, 10.0, -1.0), |_| ())
            .unwrap_err();
        assert!(matches!(err, LayoutError::InvalidRegion { .. }));
        assert_eq!(canvas.region_depth(), 0);
    }

    #[test]
    fn zero_height_region_is_allowed() {
        let mut canvas = small_canvas();
        assert!(canvas
            .with_region(Rect::new(50.0, 50.0, 10.0, 0.0), |_| ())
            .is_ok());
    }

    #[test]
    fn non_finite_region_is_rejected() {
        let mut canvas = small_canvas();
        let err = canvas
            .with_region(Rect::new(f64::NAN, 0.0, 10.0, 10.0), |_| ())
            .unwrap_err();
        assert!(matches!(err, LayoutError::NonFinite { .. }));
    }

    #[test]
    fn out_of_order_close_is_reported() {
        let mut canvas = small_canvas();
        let outer = canvas.enter_region(Rect::new(50.0, 50.0, 100.0, 100.0)).unwrap();
        let inner = canvas.enter_region(Rect::new(60.0, 60.0, 50.0, 50.0)).unwrap();
        let err = canvas.leave_region(outer).unwrap_err();
        assert!(matches!(err, LayoutError::UnbalancedRegion { .. }));
        canvas.leave_region(inner).unwrap();
    }

    #[test]
    fn clip_discards_invisible_ops() {
        let mut canvas = small_canvas();
        let clip = Rect::new(200.0, 50.0, 100.0, 100.0);
        canvas
            .with_clip_rect(clip, |c| {
                // left of the clip: dropped
                c.draw_box(20.0, BoxStyle::filled(crate::style::Color::BLACK), DrawOptions::at(50.0).width(100.0))
                    .unwrap();
                // straddles the clip edge: kept
                c.draw_box(20.0, BoxStyle::filled(crate::style::Color::BLACK), DrawOptions::at(50.0).offset(120.0).width(100.0))
                    .unwrap();
            })
            .unwrap();
        let rects = canvas
            .current_ops()
            .iter()
            .filter(|op| matches!(op, PageOp::Rect { .. }))
            .count();
        assert_eq!(rects, 1);
        assert!(matches!(canvas.current_ops().first(), Some(PageOp::PushClip { .. })));
        assert!(matches!(canvas.current_ops().last(), Some(PageOp::PopClip)));
    }

    #[test]
    fn clip_suppresses_page_breaks() {
        let mut canvas = small_canvas();
        canvas.move_y(490.0);
        canvas
            .with_clip_rect(Rect::new(50.0, 50.0, 300.0, 500.0), |c| {
                assert_eq!(c.ensure_block(100.0, true), Placement::Fits);
            })
            .unwrap();
        assert_eq!(canvas.page_count(), 1);
    }

    #[test]
    fn empty_clip_is_rejected() {
        let mut canvas = small_canvas();
        let err = canvas
            .with_clip_rect(Rect::new(0.0, 0.0, 0.0, 10.0), |_| ())
            .unwrap_err();
        assert!(matches!(err, LayoutError::InvalidClip { .. }));
    }
}
