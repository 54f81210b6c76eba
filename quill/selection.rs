//! Selection tracking: from raw selection-changed notifications to the
//! published selection text and the floating-toolbar anchor.
//!
//! Notifications land in a single pending slot (latest wins), so a burst of
//! rapid selection changes costs one anchor recomputation. The slot is
//! resolved on the shell's tick, after the host has finished layout, never
//! synchronously inside the notification.

use crate::{
  anchor::{
    AnchorPoint,
    SelectionGeometry,
    toolbar_anchor,
  },
  document::{
    DocumentSurface,
    SelectionRange,
  },
};

/// Fixed overlay dimensions used for anchoring the toolbar.
const TOOLBAR_WIDTH: f32 = 200.0;
const TOOLBAR_HEIGHT: f32 = 36.0;

#[derive(Debug, Default)]
pub struct SelectionTracker {
  pending:        Option<SelectionRange>,
  selection_text: String,
  overlay:        Option<AnchorPoint>,
}

impl SelectionTracker {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record a selection-changed notification. Coalesces: only the latest
  /// unresolved notification survives.
  pub fn selection_changed(&mut self, range: SelectionRange) {
    self.pending = Some(range);
  }

  pub fn has_pending(&self) -> bool {
    self.pending.is_some()
  }

  /// Resolve the pending notification against the current document and
  /// layout. Returns true if there was anything to resolve.
  pub fn resolve(
    &mut self,
    surface: &dyn DocumentSurface,
    geometry: &dyn SelectionGeometry,
  ) -> bool {
    let Some(range) = self.pending.take() else {
      return false;
    };

    if range.is_collapsed() {
      self.selection_text.clear();
      self.overlay = None;
      return true;
    }

    let text = surface.text_in(range);
    if text.is_empty() {
      self.selection_text.clear();
      self.overlay = None;
      return true;
    }

    self.selection_text = text;
    // No obtainable geometry degrades to a hidden overlay.
    self.overlay = geometry
      .selection_rect(range)
      .map(|rect| toolbar_anchor(rect, TOOLBAR_WIDTH, TOOLBAR_HEIGHT, geometry.viewport()));
    true
  }

  /// The published selection text; empty whenever the selection is
  /// collapsed.
  pub fn selection_text(&self) -> &str {
    &self.selection_text
  }

  /// Anchor for the toolbar overlay, or `None` while hidden.
  pub fn overlay_anchor(&self) -> Option<AnchorPoint> {
    self.overlay
  }

  pub fn is_overlay_visible(&self) -> bool {
    self.overlay.is_some()
  }

  /// Hide the overlay without touching the published text. Called when the
  /// debounced focus-loss grace window elapses.
  pub fn hide_overlay(&mut self) {
    self.overlay = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    anchor::{
      GridGeometry,
      Rect,
      Viewport,
    },
    document::PlainTextSurface,
  };

  const VIEWPORT: Viewport = Viewport {
    width:  800.0,
    height: 600.0,
  };

  fn geometry(text: &str) -> GridGeometry {
    GridGeometry::new(text, 10.0, 20.0, VIEWPORT)
  }

  /// Host environment with no live selection object.
  struct NoGeometry;

  impl SelectionGeometry for NoGeometry {
    fn viewport(&self) -> Viewport {
      VIEWPORT
    }

    fn selection_rect(&self, _range: SelectionRange) -> Option<Rect> {
      None
    }

    fn caret_rect(&self, _at: usize) -> Option<Rect> {
      None
    }
  }

  #[test]
  fn non_collapsed_selection_publishes_text_and_anchor() {
    let surface = PlainTextSurface::new("the quick brown fox");
    let mut tracker = SelectionTracker::new();
    tracker.selection_changed(SelectionRange::new(4, 9));
    assert!(tracker.resolve(&surface, &geometry("the quick brown fox")));
    assert_eq!(tracker.selection_text(), "quick");
    assert!(tracker.is_overlay_visible());
  }

  #[test]
  fn collapsed_selection_publishes_empty_text_and_hides() {
    let surface = PlainTextSurface::new("the quick brown fox");
    let mut tracker = SelectionTracker::new();
    tracker.selection_changed(SelectionRange::new(4, 9));
    tracker.resolve(&surface, &geometry("the quick brown fox"));

    tracker.selection_changed(SelectionRange::collapsed(4));
    tracker.resolve(&surface, &geometry("the quick brown fox"));
    assert_eq!(tracker.selection_text(), "");
    assert!(!tracker.is_overlay_visible());
  }

  #[test]
  fn notifications_coalesce_to_the_latest() {
    let surface = PlainTextSurface::new("the quick brown fox");
    let mut tracker = SelectionTracker::new();
    tracker.selection_changed(SelectionRange::new(0, 3));
    tracker.selection_changed(SelectionRange::new(4, 9));
    tracker.selection_changed(SelectionRange::new(10, 15));
    tracker.resolve(&surface, &geometry("the quick brown fox"));
    assert_eq!(tracker.selection_text(), "brown");
    // The slot is drained; nothing further to resolve.
    assert!(!tracker.resolve(&surface, &geometry("the quick brown fox")));
  }

  #[test]
  fn missing_geometry_degrades_to_hidden_overlay() {
    let surface = PlainTextSurface::new("the quick brown fox");
    let mut tracker = SelectionTracker::new();
    tracker.selection_changed(SelectionRange::new(4, 9));
    tracker.resolve(&surface, &NoGeometry);
    // Text is still published, only the overlay is unavailable.
    assert_eq!(tracker.selection_text(), "quick");
    assert!(!tracker.is_overlay_visible());
  }

  #[test]
  fn anchor_is_above_and_centered_on_the_selection() {
    let surface = PlainTextSurface::new("the quick brown fox");
    let mut tracker = SelectionTracker::new();
    tracker.selection_changed(SelectionRange::new(4, 9));
    tracker.resolve(&surface, &geometry("the quick brown fox"));
    let anchor = tracker.overlay_anchor().unwrap();
    // Selection starts at x=40, spans 50px; toolbar is 200 wide.
    assert_eq!(anchor.left, 0.0);
    // Row 0 has no room above, so the anchor flips below the line.
    assert_eq!(anchor.top, 24.0);
  }
}
