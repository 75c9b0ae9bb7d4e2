//! # Page-Aware Canvas
//!
//! The canvas is where Folio's pagination lives. It owns the list of
//! finished pages, the page currently being filled, and a vertical cursor.
//! Renderers never touch pages directly: they ask the canvas for room
//! ([`Canvas::ensure_block`]) and then draw through the primitives in
//! [`draw`].
//!
//! ## Coordinates
//!
//! Layout happens top-down: `cursor_y` is the distance from the top edge of
//! the physical page. Page operations are stored in the output's native
//! bottom-up space, so every primitive converts with
//! `page_y = page_height - y` at the moment it emits.
//!
//! ## Regions
//!
//! A region is a rectangular sub-frame pushed for the duration of a closure
//! (see [`region`]). Inside a region the horizontal origin and width change,
//! the cursor starts at the region's top, and the canvas never starts a new
//! page. Only the page root paginates.

pub mod draw;
pub mod page_break;
pub mod region;

use std::rc::Rc;

use crate::font::{FontRole, FontSet};
use crate::image_loader::LoadedImage;
use crate::style::{Color, PageConfig};

pub use draw::{BoxStyle, DrawOptions, RuleStyle, Stroke, TextStyle};
pub use region::{ClipToken, RegionToken};

/// Tolerance when comparing positions against a region's bottom.
const EPSILON: f64 = 1e-6;

/// An axis-aligned rectangle in top-down page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right() && other.x < self.right() && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// The overlapping area; zero-sized when the rectangles are disjoint.
    pub fn intersection(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Rect::new(x, y, (right - x).max(0.0), (bottom - y).max(0.0))
    }
}

/// One drawing operation in bottom-up page space.
#[derive(Debug, Clone)]
pub enum PageOp {
    /// A single line of text; `y` is the baseline.
    Text {
        x: f64,
        y: f64,
        font: FontRole,
        size: f64,
        color: Color,
        text: String,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
        radius: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        width: f64,
        color: Color,
        dashed: bool,
    },
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        image: Rc<LoadedImage>,
    },
    /// A clickable area pointing at `uri`.
    Link {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        uri: String,
    },
    /// Restrict drawing to a rectangle until the matching `PopClip`.
    PushClip {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    PopClip,
}

/// A finished page ready for serialization.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    pub ops: Vec<PageOp>,
}

impl LayoutPage {
    fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    /// Every text run on the page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            PageOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }

    pub fn images(&self) -> impl Iterator<Item = &PageOp> {
        self.ops
            .iter()
            .filter(|op| matches!(op, PageOp::Image { .. }))
    }
}

/// What [`Canvas::ensure_block`] decided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// The unit fits below the cursor (or the canvas is inside a region).
    Fits,
    /// A new page was started; the cursor is at its top.
    NewPage,
    /// The unit doesn't fit but may be split; `available` points remain.
    Split { available: f64 },
}

/// The page/cursor model plus region and clip stacks.
pub struct Canvas {
    config: PageConfig,
    fonts: FontSet,
    finished: Vec<LayoutPage>,
    current: LayoutPage,
    cursor_y: f64,
    regions: Vec<Rect>,
    clips: Vec<Rect>,
}

impl Canvas {
    pub fn new(config: PageConfig, fonts: FontSet) -> Self {
        let (w, h) = config.size.dimensions();
        Self {
            config,
            fonts,
            finished: Vec::new(),
            current: LayoutPage::new(w, h),
            cursor_y: config.margin.top,
            regions: Vec::new(),
            clips: Vec::new(),
        }
    }

    pub fn fonts(&self) -> &FontSet {
        &self.fonts
    }

    pub fn page_width(&self) -> f64 {
        self.current.width
    }

    pub fn page_height(&self) -> f64 {
        self.current.height
    }

    /// Zero-based index of the page being filled.
    pub fn page_index(&self) -> usize {
        self.finished.len()
    }

    pub fn page_count(&self) -> usize {
        self.finished.len() + 1
    }

    /// The page's content box (inside the margins).
    pub fn root_region(&self) -> Rect {
        let m = &self.config.margin;
        Rect::new(
            m.left,
            m.top,
            self.current.width - m.horizontal(),
            self.current.height - m.vertical(),
        )
    }

    /// The innermost region, or the content box at page root.
    pub fn active_region(&self) -> Rect {
        self.regions
            .last()
            .copied()
            .unwrap_or_else(|| self.root_region())
    }

    pub fn top(&self) -> f64 {
        self.active_region().y
    }

    pub fn bottom(&self) -> f64 {
        self.active_region().bottom()
    }

    /// Width available to renderers in the active region.
    pub fn content_width(&self) -> f64 {
        self.active_region().width
    }

    /// Height of the page body between the top and bottom margins.
    pub fn body_height(&self) -> f64 {
        self.root_region().height
    }

    pub fn cursor_y(&self) -> f64 {
        self.cursor_y
    }

    /// Move the cursor to `y`, clamped to the active region.
    pub fn set_cursor_y(&mut self, y: f64) {
        self.cursor_y = y.clamp(self.top(), self.bottom());
    }

    /// Advance the cursor without drawing, clamped to the active region.
    pub fn move_y(&mut self, delta: f64) {
        self.set_cursor_y(self.cursor_y + delta);
    }

    /// Room left between the cursor and the bottom of the active region.
    pub fn remaining(&self) -> f64 {
        (self.bottom() - self.cursor_y).max(0.0)
    }

    /// True when no region or clip is active, i.e. page breaks are allowed.
    pub fn at_page_root(&self) -> bool {
        self.regions.is_empty() && self.clips.is_empty()
    }

    /// True when nothing has been placed below the top of the active region.
    pub fn at_top(&self) -> bool {
        self.cursor_y <= self.top() + EPSILON
    }

    /// Make sure `height` points fit below the cursor.
    ///
    /// At page root, a unit that doesn't fit either starts a new page
    /// (`keep_together`) or reports how much room is left so the caller can
    /// split it. Inside a region this never paginates: sizing the region is
    /// the issuing renderer's job.
    ///
    /// Splitting callers hand `available` to [`page_break::chunk_ranges`];
    /// paragraphs and lists instead reserve one line at a time.
    pub fn ensure_block(&mut self, height: f64, keep_together: bool) -> Placement {
        if !self.at_page_root() {
            return Placement::Fits;
        }
        if self.cursor_y + height <= self.bottom() + EPSILON {
            return Placement::Fits;
        }
        if !keep_together && self.remaining() > EPSILON {
            return Placement::Split {
                available: self.remaining(),
            };
        }
        if self.at_top() {
            // A fresh page can't do better; placing it here avoids a blank page.
            log::debug!(
                "unit of {:.1}pt exceeds the page body ({:.1}pt); overflowing page {}",
                height,
                self.body_height(),
                self.page_index() + 1
            );
            return Placement::Fits;
        }
        self.start_page();
        Placement::NewPage
    }

    /// Break before the next unit. Does nothing inside a region or when the
    /// cursor is already at the top of a page.
    pub fn break_page(&mut self) -> bool {
        if !self.at_page_root() || self.at_top() {
            return false;
        }
        self.start_page();
        true
    }

    fn start_page(&mut self) {
        let (w, h) = self.config.size.dimensions();
        let done = std::mem::replace(&mut self.current, LayoutPage::new(w, h));
        self.finished.push(done);
        self.cursor_y = self.config.margin.top;
        log::debug!("starting page {}", self.page_count());
    }

    /// Append an op to the current page unless the active clip hides it.
    pub(crate) fn emit(&mut self, op: PageOp, bounds: Rect) {
        if let Some(clip) = self.clips.last() {
            if !clip.intersects(&bounds) {
                return;
            }
        }
        self.current.ops.push(op);
    }

    /// Record a link area (top-down rectangle) on the current page.
    pub fn add_link(&mut self, area: Rect, uri: &str) {
        let page_h = self.page_height();
        self.current.ops.push(PageOp::Link {
            x: area.x,
            y: page_h - area.bottom(),
            width: area.width,
            height: area.height,
            uri: uri.to_string(),
        });
    }

    /// Ops drawn so far on the current page.
    pub fn current_ops(&self) -> &[PageOp] {
        &self.current.ops
    }

    /// Close the last page and hand back the page list.
    pub fn finish(mut self) -> Vec<LayoutPage> {
        self.finished.push(self.current);
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Edges, PageSize};

    pub(crate) fn small_canvas() -> Canvas {
        let config = PageConfig {
            size: PageSize::Custom {
                width: 400.0,
                height: 600.0,
            },
            margin: Edges::uniform(50.0),
        };
        Canvas::new(config, FontSet::default())
    }

    #[test]
    fn starts_at_top_of_first_page() {
        let canvas = small_canvas();
        assert_eq!(canvas.page_count(), 1);
        assert_eq!(canvas.cursor_y(), 50.0);
        assert_eq!(canvas.body_height(), 500.0);
        assert_eq!(canvas.content_width(), 300.0);
    }

    #[test]
    fn ensure_block_that_fits_keeps_page_count() {
        let mut canvas = small_canvas();
        canvas.move_y(200.0);
        for h in [0.0, 100.0, 300.0] {
            assert_eq!(canvas.ensure_block(h, true), Placement::Fits);
            assert_eq!(canvas.page_count(), 1);
        }
    }

    #[test]
    fn ensure_block_overflow_adds_exactly_one_page() {
        let mut canvas = small_canvas();
        canvas.move_y(450.0);
        assert_eq!(canvas.ensure_block(60.0, true), Placement::NewPage);
        assert_eq!(canvas.page_count(), 2);
        assert_eq!(canvas.cursor_y(), canvas.top());
    }

    #[test]
    fn split_reports_remaining_room() {
        let mut canvas = small_canvas();
        canvas.move_y(400.0);
        assert_eq!(
            canvas.ensure_block(250.0, false),
            Placement::Split { available: 100.0 }
        );
        assert_eq!(canvas.page_count(), 1);
    }

    #[test]
    fn split_with_no_room_breaks() {
        let mut canvas = small_canvas();
        canvas.move_y(500.0);
        assert_eq!(canvas.remaining(), 0.0);
        assert_eq!(canvas.ensure_block(10.0, false), Placement::NewPage);
    }

    #[test]
    fn oversized_unit_on_fresh_page_does_not_emit_blank_page() {
        let mut canvas = small_canvas();
        assert_eq!(canvas.ensure_block(900.0, true), Placement::Fits);
        assert_eq!(canvas.page_count(), 1);
    }

    #[test]
    fn break_page_skips_empty_page() {
        let mut canvas = small_canvas();
        assert!(!canvas.break_page());
        canvas.move_y(1.0);
        assert!(canvas.break_page());
        assert_eq!(canvas.page_count(), 2);
    }

    #[test]
    fn move_y_is_clamped_to_region() {
        let mut canvas = small_canvas();
        canvas.move_y(10_000.0);
        assert_eq!(canvas.cursor_y(), 550.0);
        canvas.move_y(-10_000.0);
        assert_eq!(canvas.cursor_y(), 50.0);
    }

    #[test]
    fn cursor_is_settable_for_column_alignment() {
        let mut canvas = small_canvas();
        canvas.move_y(40.0);
        let saved = canvas.cursor_y();
        canvas.move_y(120.0);
        canvas.set_cursor_y(saved);
        assert_eq!(canvas.cursor_y(), 90.0);
    }

    #[test]
    fn finish_returns_all_pages() {
        let mut canvas = small_canvas();
        canvas.move_y(480.0);
        canvas.ensure_block(40.0, true);
        canvas.move_y(480.0);
        canvas.ensure_block(40.0, true);
        let pages = canvas.finish();
        assert_eq!(pages.len(), 3);
        assert!(pages.iter().all(|p| p.width == 400.0 && p.height == 600.0));
    }

    #[test]
    fn rect_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert!(a.intersects(&b));
        assert_eq!(a.intersection(&b), Rect::new(5.0, 5.0, 5.0, 5.0));
        let c = Rect::new(20.0, 0.0, 5.0, 5.0);
        assert!(!a.intersects(&c));
        assert_eq!(a.intersection(&c).width, 0.0);
    }
}
