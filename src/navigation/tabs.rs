//! Sliding window over a strip of week tabs

use std::ops::Range;

/// Fixed-width window of visible tabs.
///
/// The start always stays within `0..=total - width` (or 0 when everything
/// fits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabWindow {
    start: usize,
    width: usize,
}

impl TabWindow {
    /// A window showing `width` tabs (at least one).
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            start: 0,
            width: width.max(1),
        }
    }

    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    const fn max_start(&self, total: usize) -> usize {
        total.saturating_sub(self.width)
    }

    /// Pull the start back into range for `total` tabs.
    pub fn clamp(&mut self, total: usize) {
        self.start = self.start.min(self.max_start(total));
    }

    pub fn reset(&mut self) {
        self.start = 0;
    }

    /// Indices currently visible.
    #[must_use]
    pub fn visible(&self, total: usize) -> Range<usize> {
        let start = self.start.min(self.max_start(total));
        start..(start + self.width).min(total)
    }

    /// Slide just far enough that `index` is visible: it becomes the first
    /// tab when it was left of the window, the last when it was right of it.
    pub fn reveal(&mut self, index: usize, total: usize) {
        if index >= total {
            return;
        }
        if index < self.start {
            self.start = index;
        } else if index >= self.start + self.width {
            self.start = index + 1 - self.width;
        }
        self.clamp(total);
    }

    /// Move the window by `delta` tabs, staying in range.
    pub fn slide(&mut self, delta: isize, total: usize) {
        self.start = self.start.saturating_add_signed(delta).min(self.max_start(total));
    }

    #[must_use]
    pub const fn can_slide_back(&self) -> bool {
        self.start > 0
    }

    #[must_use]
    pub const fn can_slide_forward(&self, total: usize) -> bool {
        self.start < self.max_start(total)
    }
}

impl Default for TabWindow {
    fn default() -> Self {
        Self::new(6)
    }
}
