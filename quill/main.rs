//! Proof-of-life client for the quill authoring assistant.
//!
//! A minimal line-driven session that exercises the full stack against a
//! plain-text document: selection tracking and toolbar anchoring, the slash
//! palette, and AI edit sessions against the configured providers.

use std::{
  path::{
    Path,
    PathBuf,
  },
  sync::Arc,
  time::Duration,
};

use anyhow::Context;
use clap::Parser;
use quill::{
  AssistantConfig,
  AssistantShell,
  DocumentSurface,
  PlainTextSurface,
  SelectionRange,
  anchor::{
    GridGeometry,
    Viewport,
  },
  handlers::SaveSink,
};
use quill_ai::{
  HttpTransport,
  QUICK_INSTRUCTIONS,
  SessionState,
};
use tokio::io::{
  AsyncBufReadExt,
  BufReader,
};

mod cli;

use cli::Cli;

const CELL_WIDTH: f32 = 8.0;
const CELL_HEIGHT: f32 = 16.0;
const VIEWPORT: Viewport = Viewport {
  width:  800.0,
  height: 600.0,
};

const SAMPLE_TEXT: &str = "Quill keeps notes close at hand.\nSelect text to see the toolbar, \
                           or type / for commands.\n";

fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();
  setup_logging(cli.verbosity, cli.log_file.as_deref())?;

  let runtime = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("failed to build tokio runtime")?;
  runtime.block_on(run(cli))
}

fn setup_logging(verbosity: u8, log_file: Option<&Path>) -> anyhow::Result<()> {
  let level = match verbosity {
    0 => log::LevelFilter::Warn,
    1 => log::LevelFilter::Info,
    2 => log::LevelFilter::Debug,
    _ => log::LevelFilter::Trace,
  };
  let dispatch = fern::Dispatch::new()
    .format(|out, message, record| {
      out.finish(format_args!(
        "{} {:<5} [{}] {}",
        chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
        record.level(),
        record.target(),
        message
      ))
    })
    .level(level);
  match log_file {
    Some(path) => dispatch
      .chain(fern::log_file(path).context("failed to open log file")?)
      .apply()?,
    None => dispatch.chain(std::io::stderr()).apply()?,
  }
  Ok(())
}

/// Demo persistence boundary: write the file back if we have one, otherwise
/// just log the save.
struct FileSink {
  path: Option<PathBuf>,
}

impl SaveSink for FileSink {
  fn save(&self, document_id: &str, content: &str) {
    match &self.path {
      Some(path) => {
        if let Err(err) = std::fs::write(path, content) {
          log::error!("autosave of {document_id} failed: {err}");
        }
      },
      None => log::info!("autosave of {document_id}: {} chars", content.chars().count()),
    }
  }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
  let config = AssistantConfig::load_or_default(cli.config.as_deref());
  let text = match &cli.file {
    Some(path) => std::fs::read_to_string(path)
      .with_context(|| format!("failed to read {}", path.display()))?,
    None => SAMPLE_TEXT.to_string(),
  };
  let document_id = cli
    .file
    .as_deref()
    .and_then(Path::file_stem)
    .map(|stem| stem.to_string_lossy().into_owned())
    .unwrap_or_else(|| "scratch".to_string());

  let sink = Arc::new(FileSink {
    path: cli.file.clone(),
  });
  let mut shell = AssistantShell::new(
    PlainTextSurface::new(&text),
    document_id,
    config,
    sink,
    Arc::new(HttpTransport::new()),
  )?;

  println!("quill proof-of-life client; :help for commands");
  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  loop {
    tick(&mut shell);
    let Some(line) = lines.next_line().await? else {
      break;
    };
    let line = line.trim();
    let (command, rest) = match line.split_once(' ') {
      Some((command, rest)) => (command, rest.trim()),
      None => (line, ""),
    };
    match command {
      "" => {},
      ":quit" | ":q" => break,
      ":help" => print_help(),
      ":show" => {
        tick(&mut shell);
        print_state(&shell);
      },
      ":select" => {
        let mut parts = rest.split_whitespace();
        match (
          parts.next().and_then(|s| s.parse().ok()),
          parts.next().and_then(|s| s.parse().ok()),
        ) {
          (Some(anchor), Some(head)) => {
            shell
              .surface_mut()
              .set_selection(SelectionRange::new(anchor, head));
          },
          _ => println!("usage: :select <anchor> <head>"),
        }
      },
      ":type" => {
        for c in rest.chars() {
          shell.type_char(c);
        }
      },
      ":backspace" => shell.backspace(),
      ":up" => shell.key_up(),
      ":down" => shell.key_down(),
      ":enter" => {
        shell.enter();
      },
      ":esc" => shell.escape(),
      ":blur" => shell.focus_lost(),
      ":ai" => shell.open_ai_edit(),
      ":instr" => shell.set_instruction(rest),
      ":quick" => {
        match rest.parse::<usize>() {
          Ok(index) if shell.quick_instruction(index) => {},
          _ => println!("usage: :quick <0..{}>", QUICK_INSTRUCTIONS.len() - 1),
        }
      },
      ":submit" => submit_and_wait(&mut shell).await,
      ":apply" => {
        if shell.apply_result() {
          println!("applied");
        } else {
          println!("no usable result to apply");
        }
      },
      ":cancel" => shell.close_session(),
      ":providers" => print_providers(&shell),
      ":enable" => {
        let mut parts = rest.split_whitespace();
        match (parts.next(), parts.next()) {
          (Some(id), Some(key)) => {
            let key = key.to_string();
            if let Err(err) = shell.registry_mut().update(id, |p| {
              p.enabled = true;
              p.api_key = key;
            }) {
              println!("{err}");
            }
          },
          _ => println!("usage: :enable <id> <api-key>"),
        }
      },
      ":default" => {
        if let Err(err) = shell.registry_mut().set_default(Some(rest.to_string())) {
          println!("{err}");
        }
      },
      other => println!("unknown command {other:?}; :help for commands"),
    }
  }
  Ok(())
}

fn tick(shell: &mut AssistantShell<PlainTextSurface>) {
  let geometry = GridGeometry::new(&shell.surface().text(), CELL_WIDTH, CELL_HEIGHT, VIEWPORT);
  shell.tick(&geometry);
}

async fn submit_and_wait(shell: &mut AssistantShell<PlainTextSurface>) {
  match shell.submit() {
    Ok(true) => {},
    Ok(false) => {
      println!("nothing to submit");
      return;
    },
    Err(err) => {
      println!("{err}");
      return;
    },
  }
  println!("waiting for the backend...");
  // Poll the shell while the request is in flight; closing would also be
  // possible from a richer client.
  for _ in 0..600 {
    tokio::time::sleep(Duration::from_millis(100)).await;
    tick(shell);
    let done = shell
      .session()
      .is_none_or(|session| !session.is_submitting());
    if done {
      break;
    }
  }
  match shell.session().map(|session| session.state()) {
    Some(SessionState::Result(result)) if result.is_empty() => println!("no output"),
    Some(SessionState::Result(result)) => println!("result:\n{}", result.edited_text),
    Some(SessionState::Failed(message)) => println!("failed: {message}"),
    Some(_) => println!("still waiting; :show to check again"),
    None => println!("session was closed"),
  }
}

fn print_providers(shell: &AssistantShell<PlainTextSurface>) {
  let registry = shell.registry();
  for provider in registry.providers() {
    let default = if registry.default_provider() == Some(provider.id.as_str()) {
      " (default)"
    } else {
      ""
    };
    let state = if provider.is_eligible() {
      "ready"
    } else if provider.enabled {
      "enabled, no key"
    } else {
      "disabled"
    };
    println!("  {:<10} {:<24} {state}{default}", provider.id, provider.model);
  }
  match registry.resolve_active() {
    Some(provider) => println!("active: {}", provider.id),
    None => println!("active: none (enable a provider and set a key)"),
  }
}

fn print_help() {
  println!(
    "  :show                print document and assistant state\n  :select <a> <h>      \
     set the selection\n  :type <text>         type characters (a leading / opens the \
     palette)\n  :backspace :up :down :enter :esc :blur\n  :ai                  open an AI edit \
     session for the selection\n  :instr <text>        set the instruction\n  :quick <n>       \
     use a quick instruction\n  :submit :apply :cancel\n  :providers :enable <id> <key> \
     :default <id>\n  :quit"
  );
}

fn print_state(shell: &AssistantShell<PlainTextSurface>) {
  println!("--- document ---");
  println!("{}", shell.surface().text());
  let status = shell.status();
  println!("--- {} chars, {} words ---", status.chars, status.words);

  let tracker = shell.tracker();
  if let Some(anchor) = tracker.overlay_anchor() {
    println!(
      "toolbar at ({:.0},{:.0}) for {:?}",
      anchor.left,
      anchor.top,
      tracker.selection_text()
    );
  }

  let suggestion = shell.suggestion();
  if suggestion.is_open() {
    if let Some(anchor) = shell.menu_anchor() {
      println!("palette at ({:.0},{:.0}):", anchor.left, anchor.top);
    }
    let selected = suggestion.selected_index().unwrap_or(0);
    for (row, index) in suggestion.filtered().into_iter().enumerate() {
      if let Some(command) = suggestion.command(index) {
        let marker = if row == selected { ">" } else { " " };
        println!("{marker} {:<3} {:<14} {}", command.icon, command.title, command.description);
      }
    }
  }

  if let Some(session) = shell.session() {
    println!("ai session: {:?}", session.state());
    if let Some(selected) = session.selected_text() {
      println!("  selection: {selected:?}");
    }
    println!("  instruction: {:?}", session.instruction);
    println!("  quick: {}", QUICK_INSTRUCTIONS.join(" | "));
  }
}
