//! Sidebar sizing, in terminal columns.

/// Width below which a resize closes the sidebar.
pub const MIN_WIDTH: u16 = 16;

/// Widest the sidebar may grow.
pub const MAX_WIDTH: u16 = 48;

/// Initial width.
pub const DEFAULT_WIDTH: u16 = 28;

/// Terminals narrower than this hide the sidebar entirely.
pub const NARROW_WIDTH: u16 = 80;

/// Columns moved per keyboard resize step.
pub const RESIZE_STEP: u16 = 2;

/// Width and visibility of the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidebarLayout {
    width: u16,
    open: bool,
}

impl Default for SidebarLayout {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            open: true,
        }
    }
}

impl SidebarLayout {
    /// Current width. Kept while closed so reopening restores it.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Whether the user has the sidebar open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Apply a resize to `width` columns.
    pub fn resize_to(&mut self, width: u16) {
        if width < MIN_WIDTH {
            self.open = false;
        } else if width > MAX_WIDTH {
            self.width = MAX_WIDTH;
        } else {
            self.width = width;
            self.open = true;
        }
    }

    /// Grow by one step, reopening a closed sidebar at its last width.
    pub fn widen(&mut self) {
        if self.open {
            self.resize_to(self.width.saturating_add(RESIZE_STEP));
        } else {
            self.resize_to(self.width.max(MIN_WIDTH));
        }
    }

    /// Shrink by one step; going below the minimum closes the sidebar.
    pub fn shrink(&mut self) {
        if self.open {
            self.resize_to(self.width.saturating_sub(RESIZE_STEP));
        }
    }

    /// Open or close.
    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    /// Columns the sidebar occupies in a terminal `term_width` wide.
    pub fn visible_width(&self, term_width: u16) -> u16 {
        if self.open && term_width >= NARROW_WIDTH {
            self.width
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_within_bounds_opens() {
        let mut layout = SidebarLayout::default();
        layout.toggle();
        assert!(!layout.is_open());

        layout.resize_to(30);
        assert!(layout.is_open());
        assert_eq!(layout.width(), 30);
    }

    #[test]
    fn test_resize_below_min_closes_and_keeps_width() {
        let mut layout = SidebarLayout::default();
        layout.resize_to(MIN_WIDTH - 1);
        assert!(!layout.is_open());
        assert_eq!(layout.width(), DEFAULT_WIDTH);
    }

    #[test]
    fn test_resize_above_max_clamps() {
        let mut layout = SidebarLayout::default();
        layout.resize_to(200);
        assert_eq!(layout.width(), MAX_WIDTH);
        assert!(layout.is_open());
    }

    #[test]
    fn test_keyboard_steps() {
        let mut layout = SidebarLayout::default();
        layout.widen();
        assert_eq!(layout.width(), DEFAULT_WIDTH + RESIZE_STEP);

        layout.resize_to(MIN_WIDTH);
        layout.shrink();
        assert!(!layout.is_open());
        assert_eq!(layout.width(), MIN_WIDTH);

        // Shrinking a closed sidebar does nothing; widening reopens it.
        layout.shrink();
        assert!(!layout.is_open());
        layout.widen();
        assert!(layout.is_open());
        assert_eq!(layout.width(), MIN_WIDTH);
    }

    #[test]
    fn test_narrow_terminal_hides_sidebar() {
        let layout = SidebarLayout::default();
        assert_eq!(layout.visible_width(NARROW_WIDTH - 1), 0);
        assert_eq!(layout.visible_width(NARROW_WIDTH), DEFAULT_WIDTH);

        let mut closed = layout;
        closed.toggle();
        assert_eq!(closed.visible_width(200), 0);
    }
}
