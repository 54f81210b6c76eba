//! Screen-space anchor calculation for the floating overlays.
//!
//! Anchors are derived from the selection's bounding geometry at the moment
//! of computation and are stale as soon as the viewport scrolls or the
//! document reflows; callers recompute per selection event and never cache.

use crate::document::SelectionRange;

/// Gap between the reference rect and the overlay.
const OVERLAY_MARGIN: f32 = 4.0;

/// Screen coordinate used to place a floating overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPoint {
  pub top:  f32,
  pub left: f32,
}

/// Bounding box in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
  pub x:      f32,
  pub y:      f32,
  pub width:  f32,
  pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
  pub width:  f32,
  pub height: f32,
}

/// Layout information the host environment exposes for anchoring. Queried
/// only after the host has finished laying out the new selection; a `None`
/// means no live geometry is obtainable and the overlay stays hidden.
pub trait SelectionGeometry {
  fn viewport(&self) -> Viewport;
  fn selection_rect(&self, range: SelectionRange) -> Option<Rect>;
  fn caret_rect(&self, at: usize) -> Option<Rect>;
}

/// Anchor for the contextual toolbar: above the selection, horizontally
/// centered on it, clamped to the viewport. Falls below the selection when
/// there is no room above.
pub fn toolbar_anchor(
  selection: Rect,
  overlay_width: f32,
  overlay_height: f32,
  viewport: Viewport,
) -> AnchorPoint {
  let mut top = selection.y - overlay_height - OVERLAY_MARGIN;
  if top < 0.0 {
    top = selection.y + selection.height + OVERLAY_MARGIN;
  }
  let top = top.max(0.0).min((viewport.height - overlay_height).max(0.0));

  let left = selection.x + selection.width / 2.0 - overlay_width / 2.0;
  let left = left.max(0.0).min((viewport.width - overlay_width).max(0.0));

  AnchorPoint { top, left }
}

/// Anchor for the command menu: below the caret at its left edge, flipped
/// above when the space below is too tight.
pub fn caret_anchor(
  caret: Rect,
  menu_width: f32,
  menu_height: f32,
  viewport: Viewport,
) -> AnchorPoint {
  let below = caret.y + caret.height + OVERLAY_MARGIN;
  let top = if below + menu_height <= viewport.height {
    below
  } else {
    (caret.y - menu_height - OVERLAY_MARGIN).max(0.0)
  };

  let left = caret.x.max(0.0).min((viewport.width - menu_width).max(0.0));

  AnchorPoint { top, left }
}

/// Monospace layout used by tests and the proof-of-life client: every cell
/// is `cell_width` x `cell_height`, lines break only at newlines.
pub struct GridGeometry {
  lines:       Vec<usize>,
  len_chars:   usize,
  cell_width:  f32,
  cell_height: f32,
  viewport:    Viewport,
}

impl GridGeometry {
  pub fn new(text: &str, cell_width: f32, cell_height: f32, viewport: Viewport) -> Self {
    // Line lengths without their newline terminators.
    let mut lines = Vec::new();
    let mut current = 0usize;
    let mut len_chars = 0usize;
    for c in text.chars() {
      len_chars += 1;
      if c == '\n' {
        lines.push(current);
        current = 0;
      } else {
        current += 1;
      }
    }
    lines.push(current);
    Self {
      lines,
      len_chars,
      cell_width,
      cell_height,
      viewport,
    }
  }

  /// (row, col) of a char offset.
  fn position(&self, at: usize) -> Option<(usize, usize)> {
    if at > self.len_chars {
      return None;
    }
    let mut remaining = at;
    for (row, len) in self.lines.iter().enumerate() {
      if remaining <= *len {
        return Some((row, remaining));
      }
      // Account for the newline terminating this line.
      remaining -= len + 1;
    }
    None
  }

  fn cell_rect(&self, row: usize, col: usize) -> Rect {
    Rect {
      x:      col as f32 * self.cell_width,
      y:      row as f32 * self.cell_height,
      width:  self.cell_width,
      height: self.cell_height,
    }
  }
}

impl SelectionGeometry for GridGeometry {
  fn viewport(&self) -> Viewport {
    self.viewport
  }

  fn selection_rect(&self, range: SelectionRange) -> Option<Rect> {
    let (start_row, start_col) = self.position(range.from())?;
    let (end_row, end_col) = self.position(range.to())?;
    if start_row == end_row {
      return Some(Rect {
        x:      start_col as f32 * self.cell_width,
        y:      start_row as f32 * self.cell_height,
        width:  (end_col - start_col) as f32 * self.cell_width,
        height: self.cell_height,
      });
    }
    // Multi-line selection: the bounding box spans the full viewport width.
    Some(Rect {
      x:      0.0,
      y:      start_row as f32 * self.cell_height,
      width:  self.viewport.width,
      height: (end_row - start_row + 1) as f32 * self.cell_height,
    })
  }

  fn caret_rect(&self, at: usize) -> Option<Rect> {
    let (row, col) = self.position(at)?;
    Some(self.cell_rect(row, col))
  }
}
