//! The static command table behind the slash palette.
//!
//! Descriptors are value objects registered once at startup; the palette
//! filters and dispatches them but never mutates the table. Every apply
//! function deletes the trigger range (slash plus typed query) before its
//! own mutation so the palette text never leaks into the document.

use crate::document::{
  BlockKind,
  DocumentSurface,
  SelectionRange,
};

pub type ApplyFn = fn(&mut dyn DocumentSurface, SelectionRange);

/// What committing a command does.
#[derive(Clone, Copy)]
pub enum CommandRun {
  /// Mutate the document directly.
  Apply(ApplyFn),
  /// Delete the trigger range and signal the AI edit pipeline to open at
  /// the caret.
  AiEdit,
}

pub struct CommandDescriptor {
  pub title:       &'static str,
  pub description: &'static str,
  pub icon:        &'static str,
  pub run:         CommandRun,
}

impl CommandDescriptor {
  /// Case-insensitive substring match over title and description. An empty
  /// query matches everything.
  pub fn matches(&self, query: &str) -> bool {
    if query.is_empty() {
      return true;
    }
    let query = query.to_lowercase();
    self.title.to_lowercase().contains(&query) || self.description.to_lowercase().contains(&query)
  }
}

fn block_command(surface: &mut dyn DocumentSurface, trigger: SelectionRange, kind: BlockKind) {
  let at = trigger.from();
  surface.delete(trigger);
  surface.apply_block(kind, at);
}

fn heading_1(surface: &mut dyn DocumentSurface, trigger: SelectionRange) {
  block_command(surface, trigger, BlockKind::Heading(1));
}

fn heading_2(surface: &mut dyn DocumentSurface, trigger: SelectionRange) {
  block_command(surface, trigger, BlockKind::Heading(2));
}

fn heading_3(surface: &mut dyn DocumentSurface, trigger: SelectionRange) {
  block_command(surface, trigger, BlockKind::Heading(3));
}

fn bullet_list(surface: &mut dyn DocumentSurface, trigger: SelectionRange) {
  block_command(surface, trigger, BlockKind::BulletList);
}

fn ordered_list(surface: &mut dyn DocumentSurface, trigger: SelectionRange) {
  block_command(surface, trigger, BlockKind::OrderedList);
}

fn blockquote(surface: &mut dyn DocumentSurface, trigger: SelectionRange) {
  block_command(surface, trigger, BlockKind::Blockquote);
}

fn code_block(surface: &mut dyn DocumentSurface, trigger: SelectionRange) {
  block_command(surface, trigger, BlockKind::CodeBlock);
}

fn divider(surface: &mut dyn DocumentSurface, trigger: SelectionRange) {
  block_command(surface, trigger, BlockKind::Divider);
}

/// The palette's command set, in presentation order.
pub const BUILTIN_COMMANDS: &[CommandDescriptor] = &[
  CommandDescriptor {
    title:       "Heading 1",
    description: "Large section heading",
    icon:        "H1",
    run:         CommandRun::Apply(heading_1),
  },
  CommandDescriptor {
    title:       "Heading 2",
    description: "Medium section heading",
    icon:        "H2",
    run:         CommandRun::Apply(heading_2),
  },
  CommandDescriptor {
    title:       "Heading 3",
    description: "Small section heading",
    icon:        "H3",
    run:         CommandRun::Apply(heading_3),
  },
  CommandDescriptor {
    title:       "Bullet list",
    description: "Create an unordered list",
    icon:        "•",
    run:         CommandRun::Apply(bullet_list),
  },
  CommandDescriptor {
    title:       "Numbered list",
    description: "Create an ordered list",
    icon:        "1.",
    run:         CommandRun::Apply(ordered_list),
  },
  CommandDescriptor {
    title:       "Quote",
    description: "Insert a block quote",
    icon:        "\"",
    run:         CommandRun::Apply(blockquote),
  },
  CommandDescriptor {
    title:       "Code block",
    description: "Insert a code block",
    icon:        "</>",
    run:         CommandRun::Apply(code_block),
  },
  CommandDescriptor {
    title:       "Divider",
    description: "Insert a horizontal rule",
    icon:        "—",
    run:         CommandRun::Apply(divider),
  },
  CommandDescriptor {
    title:       "AI edit",
    description: "Edit text with AI",
    icon:        "✨",
    run:         CommandRun::AiEdit,
  },
];
