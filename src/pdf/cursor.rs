use crate::metrics::TextFont;

use super::{DrawOp, Page, PageGeometry};

/// Vertical write position plus the pages laid out so far.
///
/// `y` is the distance from the top edge of the current page in millimetres.
/// It only moves down within a page and is reset to the top margin when a
/// new page starts.
pub struct PageCursor {
    geometry: PageGeometry,
    y: f32,
    pages: Vec<Page>,
}

impl PageCursor {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            y: geometry.margin,
            pages: vec![Page::default()],
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Start a new page when a block of `required` height would cross the
    /// bottom margin. Returns whether a page break happened.
    pub fn ensure_space(&mut self, required: f32) -> bool {
        if self.y + required > self.geometry.bottom_limit() {
            self.new_page();
            true
        } else {
            false
        }
    }

    pub fn advance(&mut self, delta: f32) {
        debug_assert!(delta >= 0.0, "cursor moved up by {delta}");
        self.y += delta;
    }

    pub fn new_page(&mut self) {
        log::debug!(
            "Page break at y={:.1} → page {}",
            self.y,
            self.pages.len() + 1
        );
        self.pages.push(Page::default());
        self.y = self.geometry.margin;
    }

    fn current_page(&mut self) -> &mut Page {
        // `pages` starts with one page and never shrinks
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Place text with its baseline at `y` on the current page. Empty text
    /// produces no draw op.
    pub fn text(&mut self, x: f32, y: f32, text: &str, font: TextFont) {
        if text.is_empty() {
            return;
        }
        self.current_page().ops.push(DrawOp::Text {
            x,
            y,
            text: text.to_string(),
            font,
        });
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.current_page().ops.push(DrawOp::Line { x1, y1, x2, y2 });
    }

    /// Place an image box whose top edge is at `y`.
    pub fn image(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.current_page().ops.push(DrawOp::Image {
            x,
            y,
            width,
            height,
        });
    }

    pub fn finish(self) -> Vec<Page> {
        self.pages
    }
}
