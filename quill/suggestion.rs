//! The slash-triggered command palette state machine.
//!
//! Closed until the trigger character is typed at the caret; then the query
//! accumulates with every keystroke, the item list is filtered live, and
//! Up/Down wrap circularly over the filtered set. Committing deletes the
//! trigger range before the chosen command runs, so the typed palette text
//! never survives into the document. A query that matches nothing keeps the
//! menu open showing an empty state.

use crate::{
  commands::{
    BUILTIN_COMMANDS,
    CommandDescriptor,
    CommandRun,
  },
  document::{
    DocumentSurface,
    SelectionRange,
  },
};

/// Rows visible without scrolling; the selected row is kept in view.
const MAX_VISIBLE_ITEMS: usize = 8;

/// Outcome of committing the selected entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Committed {
  /// The command mutated the document.
  Applied,
  /// The AI-edit entry was chosen: the trigger range is gone and the
  /// pipeline should open at the caret with no pre-selected text.
  OpenAiEdit,
}

#[derive(Debug, Default)]
enum State {
  #[default]
  Closed,
  Open {
    trigger_at: usize,
    query:      String,
    selected:   usize,
    scroll:     usize,
  },
}

pub struct SuggestionEngine {
  commands:     &'static [CommandDescriptor],
  trigger_char: char,
  state:        State,
}

impl SuggestionEngine {
  pub fn new(trigger_char: char) -> Self {
    Self::with_commands(BUILTIN_COMMANDS, trigger_char)
  }

  pub fn with_commands(commands: &'static [CommandDescriptor], trigger_char: char) -> Self {
    Self {
      commands,
      trigger_char,
      state: State::Closed,
    }
  }

  pub fn is_open(&self) -> bool {
    matches!(self.state, State::Open { .. })
  }

  pub fn query(&self) -> Option<&str> {
    match &self.state {
      State::Open { query, .. } => Some(query),
      State::Closed => None,
    }
  }

  pub fn selected_index(&self) -> Option<usize> {
    match &self.state {
      State::Open { selected, .. } => Some(*selected),
      State::Closed => None,
    }
  }

  pub fn scroll(&self) -> usize {
    match &self.state {
      State::Open { scroll, .. } => *scroll,
      State::Closed => 0,
    }
  }

  /// The span from the trigger character through the current caret, deleted
  /// on commit.
  pub fn trigger_range(&self) -> Option<SelectionRange> {
    match &self.state {
      State::Open {
        trigger_at, query, ..
      } => Some(SelectionRange::new(
        *trigger_at,
        trigger_at + 1 + query.chars().count(),
      )),
      State::Closed => None,
    }
  }

  /// Caret position the menu anchors to; shifts as the query grows.
  pub fn caret(&self) -> Option<usize> {
    self.trigger_range().map(|range| range.to())
  }

  /// Indices into the command table matching the current query, in table
  /// order.
  pub fn filtered(&self) -> Vec<usize> {
    let query = self.query().unwrap_or("");
    self
      .commands
      .iter()
      .enumerate()
      .filter(|(_, command)| command.matches(query))
      .map(|(index, _)| index)
      .collect()
  }

  pub fn command(&self, index: usize) -> Option<&'static CommandDescriptor> {
    self.commands.get(index)
  }

  /// Feed a typed character. Returns true if the palette consumed it into
  /// its state (the caller still inserts it into the document).
  pub fn observe_char(&mut self, c: char, caret: usize) -> bool {
    match &mut self.state {
      State::Closed => {
        if c == self.trigger_char {
          self.state = State::Open {
            trigger_at: caret,
            query:      String::new(),
            selected:   0,
            scroll:     0,
          };
          return true;
        }
        false
      },
      State::Open {
        query,
        selected,
        scroll,
        ..
      } => {
        query.push(c);
        // The filtered set changed shape; restart the cursor.
        *selected = 0;
        *scroll = 0;
        true
      },
    }
  }

  /// Feed a backspace. Deleting past the trigger character closes the menu.
  pub fn observe_backspace(&mut self) -> bool {
    match &mut self.state {
      State::Closed => false,
      State::Open {
        query,
        selected,
        scroll,
        ..
      } => {
        if query.pop().is_none() {
          self.state = State::Closed;
        } else {
          *selected = 0;
          *scroll = 0;
        }
        true
      },
    }
  }

  pub fn move_down(&mut self) {
    let count = self.filtered().len();
    if let State::Open {
      selected, scroll, ..
    } = &mut self.state
    {
      if count == 0 {
        return;
      }
      *selected = (*selected + 1) % count;
      Self::scroll_into_view(selected, scroll);
    }
  }

  pub fn move_up(&mut self) {
    let count = self.filtered().len();
    if let State::Open {
      selected, scroll, ..
    } = &mut self.state
    {
      if count == 0 {
        return;
      }
      *selected = (*selected + count - 1) % count;
      Self::scroll_into_view(selected, scroll);
    }
  }

  fn scroll_into_view(selected: &usize, scroll: &mut usize) {
    if *selected < *scroll {
      *scroll = *selected;
    } else if *selected >= *scroll + MAX_VISIBLE_ITEMS {
      *scroll = *selected + 1 - MAX_VISIBLE_ITEMS;
    }
  }

  /// Close without committing, discarding query and selection.
  pub fn escape(&mut self) {
    self.state = State::Closed;
  }

  /// Commit the selected entry against the document. With an empty filtered
  /// set this is a no-op and the menu stays open.
  pub fn commit(&mut self, surface: &mut dyn DocumentSurface) -> Option<Committed> {
    let filtered = self.filtered();
    let (selected, trigger_range) = match &self.state {
      State::Open { selected, .. } => (*selected, self.trigger_range()?),
      State::Closed => return None,
    };
    let command = filtered
      .get(selected.min(filtered.len().saturating_sub(1)))
      .and_then(|&index| self.commands.get(index))?;

    let outcome = match command.run {
      CommandRun::Apply(apply) => {
        apply(surface, trigger_range);
        Committed::Applied
      },
      CommandRun::AiEdit => {
        surface.delete(trigger_range);
        Committed::OpenAiEdit
      },
    };
    self.state = State::Closed;
    Some(outcome)
  }
}
