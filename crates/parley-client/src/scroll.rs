//! Auto-scroll policy of the chat window.
//!
//! The tracker remembers whether the viewport sat at the bottom before the
//! latest content change. If it did, the view follows new content; if not,
//! a jump-to-bottom button is offered instead.

use parley_shared::constants::{JUMP_BUTTON_MARGIN_PX, JUMP_BUTTON_MIN_OFFSET_PX, NEAR_BOTTOM_PX};

/// Geometry of the scrollable message area, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMetrics {
    pub scroll_height: f64,
    pub scroll_top: f64,
    pub client_height: f64,
}

impl ViewportMetrics {
    pub fn distance_from_bottom(&self) -> f64 {
        self.scroll_height - self.scroll_top - self.client_height
    }

    pub fn near_bottom(&self) -> bool {
        self.distance_from_bottom() < NEAR_BOTTOM_PX
    }
}

/// What the view should do after a content change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAction {
    Follow,
    ShowJumpButton,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollTracker {
    at_bottom: bool,
    show_jump_button: bool,
    follow_requests: u64,
}

impl Default for ScrollTracker {
    fn default() -> Self {
        Self {
            at_bottom: true,
            show_jump_button: false,
            follow_requests: 0,
        }
    }
}

impl ScrollTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The user scrolled or the viewport was resized.
    pub fn on_scroll(&mut self, metrics: ViewportMetrics) {
        self.at_bottom = metrics.near_bottom();
        self.show_jump_button = !self.at_bottom;
    }

    /// A message arrived or a reveal tick grew the last message.
    pub fn content_changed(&mut self) -> ScrollAction {
        if self.at_bottom {
            self.follow_requests += 1;
            ScrollAction::Follow
        } else {
            self.show_jump_button = true;
            ScrollAction::ShowJumpButton
        }
    }

    /// The jump-to-bottom button was pressed.
    pub fn jump(&mut self) {
        self.at_bottom = true;
        self.show_jump_button = false;
        self.follow_requests += 1;
    }

    pub fn show_jump_button(&self) -> bool {
        self.show_jump_button
    }

    /// Bumped each time the view should scroll to the bottom.
    pub fn follow_requests(&self) -> u64 {
        self.follow_requests
    }
}

/// Bottom offset of the jump button: the gap between the bottom of the
/// chat area and the top of the input, plus a margin, never below 8px.
pub fn jump_button_offset(chat_bottom: f64, input_top: f64) -> f64 {
    (chat_bottom - input_top + JUMP_BUTTON_MARGIN_PX)
        .round()
        .max(JUMP_BUTTON_MIN_OFFSET_PX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(scroll_top: f64) -> ViewportMetrics {
        ViewportMetrics {
            scroll_height: 1000.0,
            scroll_top,
            client_height: 400.0,
        }
    }

    #[test]
    fn test_near_bottom_threshold() {
        assert!(metrics(600.0).near_bottom());
        assert!(metrics(551.0).near_bottom());
        assert!(!metrics(550.0).near_bottom());
        assert!(!metrics(0.0).near_bottom());
    }

    #[test]
    fn test_follows_while_at_bottom() {
        let mut tracker = ScrollTracker::new();
        assert_eq!(tracker.content_changed(), ScrollAction::Follow);
        assert_eq!(tracker.follow_requests(), 1);
        assert!(!tracker.show_jump_button());
    }

    #[test]
    fn test_scrolled_up_shows_jump_button() {
        let mut tracker = ScrollTracker::new();
        tracker.on_scroll(metrics(100.0));
        assert!(tracker.show_jump_button());

        assert_eq!(tracker.content_changed(), ScrollAction::ShowJumpButton);
        assert_eq!(tracker.follow_requests(), 0);

        tracker.jump();
        assert!(!tracker.show_jump_button());
        assert_eq!(tracker.follow_requests(), 1);
        assert_eq!(tracker.content_changed(), ScrollAction::Follow);
    }

    #[test]
    fn test_scrolling_back_down_hides_button() {
        let mut tracker = ScrollTracker::new();
        tracker.on_scroll(metrics(100.0));
        tracker.on_scroll(metrics(590.0));
        assert!(!tracker.show_jump_button());
    }

    #[test]
    fn test_jump_button_offset() {
        assert_eq!(jump_button_offset(800.0, 700.0), 112.0);
        assert_eq!(jump_button_offset(700.4, 700.0), 12.0);
        assert_eq!(jump_button_offset(600.0, 700.0), 8.0);
    }
}
