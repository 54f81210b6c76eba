//! The document-surface contract and a plain-text reference implementation.
//!
//! The assistant never owns the rich document: it consumes a narrow surface
//! (selection, span reads, replace/insert, one structural-edit capability)
//! and leaves the block/mark grammar to the engine behind it.
//! [`PlainTextSurface`] implements the contract over a rope with
//! markdown-flavored block transforms, which is all the tests and the
//! proof-of-life client need.

use ropey::Rope;
use unicode_segmentation::UnicodeSegmentation;

/// A span in the document's flat char coordinate space. Collapsed (anchor ==
/// head) means a caret with no selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
  pub anchor: usize,
  pub head:   usize,
}

impl SelectionRange {
  pub fn new(anchor: usize, head: usize) -> Self {
    Self { anchor, head }
  }

  /// A caret at `at`.
  pub fn collapsed(at: usize) -> Self {
    Self {
      anchor: at,
      head:   at,
    }
  }

  pub fn is_collapsed(&self) -> bool {
    self.anchor == self.head
  }

  /// Lower bound regardless of selection direction.
  pub fn from(&self) -> usize {
    self.anchor.min(self.head)
  }

  /// Upper bound regardless of selection direction.
  pub fn to(&self) -> usize {
    self.anchor.max(self.head)
  }

  pub fn len(&self) -> usize {
    self.to() - self.from()
  }

  pub fn is_empty(&self) -> bool {
    self.is_collapsed()
  }
}

/// Structural block types the palette can ask the engine for. The grammar
/// behind them stays external.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
  Paragraph,
  Heading(u8),
  BulletList,
  OrderedList,
  Blockquote,
  CodeBlock,
  Divider,
}

/// Capabilities the assistant consumes from the document engine.
///
/// Selection mutations are reported through [`take_selection_changes`]; the
/// shell drains them on its tick, in emission order.
///
/// [`take_selection_changes`]: DocumentSurface::take_selection_changes
pub trait DocumentSurface {
  fn selection(&self) -> SelectionRange;
  fn set_selection(&mut self, range: SelectionRange);
  fn len_chars(&self) -> usize;
  /// Full document snapshot (used for geometry layout and autosave).
  fn text(&self) -> String;
  /// Exact character span; word and line boundaries are not respected.
  fn text_in(&self, range: SelectionRange) -> String;
  fn replace(&mut self, range: SelectionRange, text: &str);
  fn insert_at_caret(&mut self, text: &str);
  /// The one structural-edit capability: transform the block containing
  /// `at`.
  fn apply_block(&mut self, kind: BlockKind, at: usize);
  /// Selection-changed notifications since the last drain, oldest first.
  fn take_selection_changes(&mut self) -> Vec<SelectionRange>;

  fn delete(&mut self, range: SelectionRange) {
    self.replace(range, "");
  }
}

/// Rope-backed surface with markdown-flavored block transforms.
pub struct PlainTextSurface {
  rope:      Rope,
  selection: SelectionRange,
  changes:   Vec<SelectionRange>,
}

impl PlainTextSurface {
  pub fn new(text: &str) -> Self {
    Self {
      rope:      Rope::from_str(text),
      selection: SelectionRange::collapsed(0),
      changes:   Vec::new(),
    }
  }

  /// Replace the document wholesale. The selection is cleared to a caret,
  /// per the surface invariant.
  pub fn set_text(&mut self, text: &str) {
    self.rope = Rope::from_str(text);
    self.update_selection(SelectionRange::collapsed(0));
  }

  pub fn chars(&self) -> usize {
    self.rope.len_chars()
  }

  pub fn words(&self) -> usize {
    self.text().unicode_words().count()
  }

  fn clamp(&self, range: SelectionRange) -> SelectionRange {
    let max = self.rope.len_chars();
    SelectionRange::new(range.anchor.min(max), range.head.min(max))
  }

  fn update_selection(&mut self, range: SelectionRange) {
    let range = self.clamp(range);
    self.selection = range;
    self.changes.push(range);
  }

  /// Char index of the start of the line containing `at`.
  fn line_start(&self, at: usize) -> usize {
    let line = self.rope.char_to_line(at.min(self.rope.len_chars()));
    self.rope.line_to_char(line)
  }

  fn line_text(&self, at: usize) -> String {
    let line = self.rope.char_to_line(at.min(self.rope.len_chars()));
    self.rope.line(line).to_string()
  }

  /// Chars of an existing markdown block prefix on `line`, so transforms
  /// replace rather than stack.
  fn block_prefix_len(line: &str) -> usize {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if hashes > 0 && line[hashes..].starts_with(' ') {
      return hashes + 1;
    }
    for prefix in ["- ", "1. ", "> "] {
      if line.starts_with(prefix) {
        return prefix.chars().count();
      }
    }
    0
  }
}

impl DocumentSurface for PlainTextSurface {
  fn selection(&self) -> SelectionRange {
    self.selection
  }

  fn set_selection(&mut self, range: SelectionRange) {
    self.update_selection(range);
  }

  fn len_chars(&self) -> usize {
    self.rope.len_chars()
  }

  fn text(&self) -> String {
    self.rope.to_string()
  }

  fn text_in(&self, range: SelectionRange) -> String {
    let range = self.clamp(range);
    self.rope.slice(range.from()..range.to()).to_string()
  }

  fn replace(&mut self, range: SelectionRange, text: &str) {
    let range = self.clamp(range);
    self.rope.remove(range.from()..range.to());
    self.rope.insert(range.from(), text);
    self.update_selection(SelectionRange::collapsed(
      range.from() + text.chars().count(),
    ));
  }

  fn insert_at_caret(&mut self, text: &str) {
    let caret = self.clamp(self.selection).head;
    self.rope.insert(caret, text);
    self.update_selection(SelectionRange::collapsed(caret + text.chars().count()));
  }

  fn apply_block(&mut self, kind: BlockKind, at: usize) {
    let start = self.line_start(at);
    if kind == BlockKind::Divider {
      // A rule above the current line; the line itself is untouched.
      self.rope.insert(start, "---\n");
      self.update_selection(SelectionRange::collapsed(start + 4));
      return;
    }

    let line = self.line_text(at);
    let stripped = Self::block_prefix_len(line.trim_end_matches('\n'));
    if stripped > 0 {
      self.rope.remove(start..start + stripped);
    }

    let prefix: String = match kind {
      BlockKind::Paragraph => String::new(),
      BlockKind::Heading(level) => {
        let level = level.clamp(1, 6) as usize;
        format!("{} ", "#".repeat(level))
      },
      BlockKind::BulletList => "- ".into(),
      BlockKind::OrderedList => "1. ".into(),
      BlockKind::Blockquote => "> ".into(),
      BlockKind::CodeBlock => {
        // Fence the line rather than prefixing it.
        let line_end = start + line.trim_end_matches('\n').chars().count() - stripped;
        self.rope.insert(line_end, "\n```");
        self.rope.insert(start, "```\n");
        self.update_selection(SelectionRange::collapsed(start + 4));
        return;
      },
      BlockKind::Divider => unreachable!("handled above"),
    };
    self.rope.insert(start, &prefix);
    self.update_selection(SelectionRange::collapsed(start + prefix.chars().count()));
  }

  fn take_selection_changes(&mut self) -> Vec<SelectionRange> {
    std::mem::take(&mut self.changes)
  }
}
