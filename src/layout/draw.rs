//! Drawing primitives.
//!
//! Every primitive takes a [`DrawOptions`] that says where to draw relative
//! to the active region and whether to claim space through
//! [`Canvas::ensure_block`] first. Positions go in top-down; the emitted
//! [`PageOp`] comes out in page space.

use std::rc::Rc;

use super::{Canvas, PageOp, Placement, Rect};
use crate::error::LayoutError;
use crate::font::{FontFace, FontRole};
use crate::image_loader::LoadedImage;
use crate::style::{palette, Align, Color};
use crate::text::{measure_and_wrap, wrap_preformatted, WrappedText};

/// Font, size and color for a run of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: FontRole,
    pub size: f64,
    /// Multiple of `size`.
    pub line_height: f64,
    pub color: Color,
    pub align: Align,
    /// Break only at newlines and the width limit, keeping every space.
    pub preformatted: bool,
}

impl TextStyle {
    pub fn new(font: FontRole, size: f64, line_height: f64) -> Self {
        Self {
            font,
            size,
            line_height,
            color: palette::TEXT,
            align: Align::Left,
            preformatted: false,
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn preformatted(mut self) -> Self {
        self.preformatted = true;
        self
    }

    /// Wrap `text` for this style at `width`.
    pub fn wrap(&self, text: &str, face: &FontFace, width: f64) -> WrappedText {
        let width = width.max(0.0);
        if self.preformatted {
            wrap_preformatted(text, face, self.size, width, self.line_height)
        } else {
            measure_and_wrap(text, face, self.size, width, self.line_height)
        }
    }

    /// Height of one line in points.
    pub fn line_px(&self) -> f64 {
        self.size * self.line_height
    }
}

/// Where and how a primitive draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawOptions {
    /// Offset from the active region's left edge.
    pub x: f64,
    /// Absolute top-down position. `None` draws at the cursor.
    pub y: Option<f64>,
    /// Defaults to the rest of the region's width after `x`.
    pub width: Option<f64>,
    /// Claim space (and possibly break the page) before drawing. Only
    /// meaningful when drawing at the cursor.
    pub ensure: bool,
    /// Move the cursor past what was drawn.
    pub advance: bool,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self::flow()
    }
}

impl DrawOptions {
    /// Draw at the cursor, claim space, advance.
    pub fn flow() -> Self {
        Self {
            x: 0.0,
            y: None,
            width: None,
            ensure: true,
            advance: true,
        }
    }

    /// Draw at an absolute `y` without touching the cursor.
    pub fn at(y: f64) -> Self {
        Self {
            x: 0.0,
            y: Some(y),
            width: None,
            ensure: false,
            advance: false,
        }
    }

    /// Draw at the cursor in space the caller already reserved.
    pub fn reserved() -> Self {
        Self {
            ensure: false,
            ..Self::flow()
        }
    }

    pub fn offset(mut self, x: f64) -> Self {
        self.x = x;
        self
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn no_advance(mut self) -> Self {
        self.advance = false;
        self
    }

    fn flows(&self) -> bool {
        self.y.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

/// Fill, border and corner radius of a box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoxStyle {
    pub fill: Option<Color>,
    pub stroke: Option<Stroke>,
    pub radius: f64,
}

impl BoxStyle {
    pub fn filled(color: Color) -> Self {
        Self {
            fill: Some(color),
            ..Self::default()
        }
    }

    pub fn outlined(color: Color, width: f64) -> Self {
        Self {
            stroke: Some(Stroke { color, width }),
            ..Self::default()
        }
    }

    pub fn stroke(mut self, color: Color, width: f64) -> Self {
        self.stroke = Some(Stroke { color, width });
        self
    }

    pub fn radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }
}

/// A horizontal rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleStyle {
    pub thickness: f64,
    pub color: Color,
    pub dashed: bool,
}

impl Default for RuleStyle {
    fn default() -> Self {
        Self {
            thickness: 0.75,
            color: palette::BORDER,
            dashed: false,
        }
    }
}

fn finite(values: &[f64], primitive: &'static str) -> Result<(), LayoutError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(LayoutError::NonFinite { primitive })
    }
}

impl Canvas {
    fn resolve_width(&self, opts: &DrawOptions) -> f64 {
        opts.width
            .unwrap_or_else(|| self.active_region().width - opts.x)
    }

    /// Claim `height` at the cursor when the options ask for it and return
    /// the top-down y to draw at.
    fn place(&mut self, height: f64, opts: &DrawOptions) -> f64 {
        match opts.y {
            Some(y) => y,
            None => {
                if opts.ensure {
                    self.ensure_block(height, true);
                }
                self.cursor_y
            }
        }
    }

    /// Wrap and draw `text`. Returns the wrapped lines so callers can reuse
    /// the measurement.
    ///
    /// When flowing with `ensure`, each line claims its own space, so a long
    /// paragraph continues on the next page instead of overflowing.
    pub fn draw_text(
        &mut self,
        text: &str,
        style: &TextStyle,
        opts: DrawOptions,
    ) -> Result<WrappedText, LayoutError> {
        let width = self.resolve_width(&opts);
        finite(&[opts.x, width, style.size, style.line_height], "draw_text")?;
        if let Some(y) = opts.y {
            finite(&[y], "draw_text")?;
        }

        let face = self.fonts.get(style.font);
        let wrapped = style.wrap(text, face, width);
        let line_h = wrapped.line_height;
        let ascent = face.ascent(style.size);
        let descent = face.descent(style.size);
        let baseline = (line_h - (ascent + descent)) / 2.0 + ascent;
        let runs: Vec<(f64, f64)> = wrapped
            .lines
            .iter()
            .map(|line| {
                let w = face.measure(line, style.size);
                let dx = match style.align {
                    Align::Left => 0.0,
                    Align::Center => (width - w) / 2.0,
                    Align::Right => width - w,
                };
                (dx, w)
            })
            .collect();

        let left = self.active_region().x + opts.x;
        let start_page = self.page_index();
        let start_y = self.cursor_y;
        let mut y = opts.y.unwrap_or(self.cursor_y);

        for (line, (dx, w)) in wrapped.lines.iter().zip(runs) {
            if opts.flows() && opts.ensure {
                self.cursor_y = y;
                if self.ensure_block(line_h, true) == Placement::NewPage {
                    y = self.cursor_y;
                }
            }
            if !line.is_empty() {
                let page_h = self.page_height();
                self.emit(
                    PageOp::Text {
                        x: left + dx,
                        y: page_h - (y + baseline),
                        font: style.font,
                        size: style.size,
                        color: style.color,
                        text: line.clone(),
                    },
                    Rect::new(left + dx, y, w, line_h),
                );
            }
            y += line_h;
        }

        if opts.flows() {
            if opts.advance {
                self.set_cursor_y(y);
            } else if self.page_index() == start_page {
                self.cursor_y = start_y;
            }
        }
        Ok(wrapped)
    }

    /// Draw a rectangle `height` points tall. Returns its top-down bounds.
    pub fn draw_box(
        &mut self,
        height: f64,
        style: BoxStyle,
        opts: DrawOptions,
    ) -> Result<Rect, LayoutError> {
        let width = self.resolve_width(&opts);
        finite(&[opts.x, width, height, style.radius], "draw_box")?;
        let y = self.place(height, &opts);
        finite(&[y], "draw_box")?;
        let bounds = Rect::new(self.active_region().x + opts.x, y, width, height);
        let page_h = self.page_height();
        self.emit(
            PageOp::Rect {
                x: bounds.x,
                y: page_h - bounds.bottom(),
                width,
                height,
                fill: style.fill,
                stroke: style.stroke,
                radius: style.radius,
            },
            bounds,
        );
        if opts.flows() && opts.advance {
            self.set_cursor_y(y + height);
        }
        Ok(bounds)
    }

    /// Draw a horizontal rule across the resolved width.
    pub fn draw_rule(&mut self, style: RuleStyle, opts: DrawOptions) -> Result<Rect, LayoutError> {
        let width = self.resolve_width(&opts);
        finite(&[opts.x, width, style.thickness], "draw_rule")?;
        let y = self.place(style.thickness, &opts);
        finite(&[y], "draw_rule")?;
        let x = self.active_region().x + opts.x;
        let mid = self.page_height() - (y + style.thickness / 2.0);
        let bounds = Rect::new(x, y, width, style.thickness);
        self.emit(
            PageOp::Line {
                x1: x,
                y1: mid,
                x2: x + width,
                y2: mid,
                width: style.thickness,
                color: style.color,
                dashed: style.dashed,
            },
            bounds,
        );
        if opts.flows() && opts.advance {
            self.set_cursor_y(y + style.thickness);
        }
        Ok(bounds)
    }

    /// Draw a vertical line from `y1` to `y2` at region offset `x`.
    pub fn draw_vline(&mut self, x: f64, y1: f64, y2: f64, style: RuleStyle) -> Result<(), LayoutError> {
        finite(&[x, y1, y2, style.thickness], "draw_vline")?;
        let abs_x = self.active_region().x + x;
        let page_h = self.page_height();
        self.emit(
            PageOp::Line {
                x1: abs_x,
                y1: page_h - y1,
                x2: abs_x,
                y2: page_h - y2,
                width: style.thickness,
                color: style.color,
                dashed: style.dashed,
            },
            Rect::new(abs_x - style.thickness / 2.0, y1.min(y2), style.thickness, (y2 - y1).abs()),
        );
        Ok(())
    }

    /// Draw an image scaled to `width` x `height`, aligned within the active
    /// region. `opts.x` is added to the aligned position.
    pub fn draw_image(
        &mut self,
        image: &Rc<LoadedImage>,
        width: f64,
        height: f64,
        align: Align,
        opts: DrawOptions,
    ) -> Result<Rect, LayoutError> {
        finite(&[opts.x, width, height], "draw_image")?;
        let region = self.active_region();
        let aligned = match align {
            Align::Left => 0.0,
            Align::Center => (region.width - width) / 2.0,
            Align::Right => region.width - width,
        };
        let y = self.place(height, &opts);
        finite(&[y], "draw_image")?;
        let bounds = Rect::new(region.x + aligned + opts.x, y, width, height);
        let page_h = self.page_height();
        self.emit(
            PageOp::Image {
                x: bounds.x,
                y: page_h - bounds.bottom(),
                width,
                height,
                image: Rc::clone(image),
            },
            bounds,
        );
        if opts.flows() && opts.advance {
            self.set_cursor_y(y + height);
        }
        Ok(bounds)
    }
}
