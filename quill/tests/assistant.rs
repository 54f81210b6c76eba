//! End-to-end tests driving the assistant shell against a plain-text
//! surface, a monospace grid layout, and a scripted transport.

use std::{
  sync::{
    Arc,
    Mutex,
    atomic::{
      AtomicUsize,
      Ordering,
    },
  },
  time::Duration,
};

use async_trait::async_trait;
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
  ProviderConfig,
  RequestError,
  SessionState,
  Transport,
  ValidationError,
  WireRequest,
};
use serde_json::{
  Value,
  json,
};
use tokio::sync::Notify;

const VIEWPORT: Viewport = Viewport {
  width:  800.0,
  height: 600.0,
};

struct ScriptedTransport {
  calls:    AtomicUsize,
  requests: Mutex<Vec<WireRequest>>,
  gate:     Option<Arc<Notify>>,
  response: Value,
}

impl ScriptedTransport {
  fn replying(response: Value) -> Arc<Self> {
    Arc::new(Self {
      calls: AtomicUsize::new(0),
      requests: Mutex::new(Vec::new()),
      gate: None,
      response,
    })
  }

  fn gated(response: Value, gate: Arc<Notify>) -> Arc<Self> {
    Arc::new(Self {
      calls: AtomicUsize::new(0),
      requests: Mutex::new(Vec::new()),
      gate: Some(gate),
      response,
    })
  }

  fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl Transport for ScriptedTransport {
  async fn post_json(&self, request: &WireRequest) -> Result<Value, RequestError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.requests.lock().unwrap().push(request.clone());
    if let Some(gate) = &self.gate {
      gate.notified().await;
    }
    Ok(self.response.clone())
  }
}

#[derive(Default)]
struct RecordingSink {
  saves: Mutex<Vec<String>>,
}

impl SaveSink for RecordingSink {
  fn save(&self, _document_id: &str, content: &str) {
    self.saves.lock().unwrap().push(content.to_string());
  }
}

fn chat_reply(text: &str) -> Value {
  json!({ "choices": [ { "message": { "content": text } } ] })
}

fn enabled_provider(id: &str, base_url: &str) -> ProviderConfig {
  ProviderConfig {
    id: id.into(),
    name: id.into(),
    api_key: format!("sk-{id}"),
    base_url: base_url.into(),
    model: "test-model".into(),
    enabled: true,
    ..ProviderConfig::openai_preset()
  }
}

fn config_with_provider() -> AssistantConfig {
  AssistantConfig {
    providers: vec![enabled_provider("primary", "https://primary.invalid/v1")],
    ..AssistantConfig::default()
  }
}

fn shell(
  text: &str,
  config: AssistantConfig,
  transport: Arc<ScriptedTransport>,
  sink: Arc<RecordingSink>,
) -> AssistantShell<PlainTextSurface> {
  AssistantShell::new(PlainTextSurface::new(text), "doc-1", config, sink, transport)
    .expect("configured providers are valid")
}

fn tick(shell: &mut AssistantShell<PlainTextSurface>) {
  let geometry = GridGeometry::new(&shell.surface().text(), 8.0, 16.0, VIEWPORT);
  shell.tick(&geometry);
}

/// Let spawned submission tasks run, then drain their completions.
async fn settle(shell: &mut AssistantShell<PlainTextSurface>) {
  for _ in 0..4 {
    tokio::task::yield_now().await;
  }
  tick(shell);
}

#[tokio::test]
async fn scenario_a_selection_edit_replaces_the_original_range() {
  let transport = ScriptedTransport::replying(chat_reply("The cat sat"));
  let mut shell = shell(
    "teh cat sat",
    config_with_provider(),
    transport.clone(),
    Arc::new(RecordingSink::default()),
  );

  shell.surface_mut().set_selection(SelectionRange::new(0, 11));
  tick(&mut shell);
  assert!(shell.tracker().is_overlay_visible());

  shell.open_ai_edit();
  assert_eq!(shell.session().unwrap().selected_text(), Some("teh cat sat"));

  shell.set_instruction("fix grammar");
  assert!(shell.submit().unwrap());
  settle(&mut shell).await;

  assert!(shell.apply_result());
  assert_eq!(shell.surface().text(), "The cat sat");
  assert!(shell.session().is_none());
  assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn scenario_b_no_eligible_provider_never_reaches_the_network() {
  let transport = ScriptedTransport::replying(chat_reply("unused"));
  // Default config: both presets disabled with empty keys.
  let mut shell = shell(
    "some text",
    AssistantConfig::default(),
    transport.clone(),
    Arc::new(RecordingSink::default()),
  );

  shell.open_ai_edit();
  shell.set_instruction("fix grammar");
  assert_eq!(shell.submit(), Err(ValidationError::NoActiveProvider));
  assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn scenario_c_default_provider_wins_over_registration_order() {
  let transport = ScriptedTransport::replying(chat_reply("ok"));
  let config = AssistantConfig {
    providers:        vec![
      enabled_provider("first", "https://first.invalid/v1"),
      enabled_provider("preferred", "https://preferred.invalid/v1"),
    ],
    default_provider: Some("preferred".into()),
    ..AssistantConfig::default()
  };
  let mut shell = shell(
    "some text",
    config,
    transport.clone(),
    Arc::new(RecordingSink::default()),
  );

  assert_eq!(
    shell.registry().resolve_active().map(|p| p.id.as_str()),
    Some("preferred")
  );

  shell.open_ai_edit();
  shell.set_instruction("summarize");
  shell.submit().unwrap();
  settle(&mut shell).await;

  let requests = transport.requests.lock().unwrap();
  assert_eq!(requests.len(), 1);
  assert!(requests[0].url.starts_with("https://preferred.invalid/v1"));
}

#[tokio::test]
async fn scenario_d_slash_command_applies_heading_and_removes_trigger() {
  let transport = ScriptedTransport::replying(chat_reply("unused"));
  let mut shell = shell(
    "",
    config_with_provider(),
    transport,
    Arc::new(RecordingSink::default()),
  );

  shell.type_char('/');
  tick(&mut shell);
  assert!(shell.suggestion().is_open());
  assert!(shell.menu_anchor().is_some());

  for c in "head".chars() {
    shell.type_char(c);
  }
  assert_eq!(shell.surface().text(), "/head");
  assert_eq!(shell.suggestion().filtered().len(), 3);

  shell.enter();
  assert!(!shell.suggestion().is_open());
  assert!(!shell.surface().text().contains("/head"));
  assert_eq!(shell.surface().text(), "# ");
}

#[tokio::test]
async fn empty_instruction_is_rejected_before_the_network() {
  let transport = ScriptedTransport::replying(chat_reply("unused"));
  let mut shell = shell(
    "text",
    config_with_provider(),
    transport.clone(),
    Arc::new(RecordingSink::default()),
  );

  shell.open_ai_edit();
  shell.set_instruction("   ");
  assert_eq!(shell.submit(), Err(ValidationError::EmptyInstruction));
  assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn repeated_submits_keep_a_single_call_outstanding() {
  let gate = Arc::new(Notify::new());
  let transport = ScriptedTransport::gated(chat_reply("done"), gate.clone());
  let mut shell = shell(
    "text",
    config_with_provider(),
    transport.clone(),
    Arc::new(RecordingSink::default()),
  );

  shell.open_ai_edit();
  shell.set_instruction("expand");
  assert!(shell.submit().unwrap());
  tokio::task::yield_now().await;
  for _ in 0..3 {
    assert!(!shell.submit().unwrap());
  }
  assert_eq!(transport.calls(), 1);

  gate.notify_one();
  settle(&mut shell).await;
  assert!(matches!(
    shell.session().unwrap().state(),
    SessionState::Result(_)
  ));
}

#[tokio::test]
async fn closing_the_session_discards_a_late_completion() {
  let gate = Arc::new(Notify::new());
  let transport = ScriptedTransport::gated(chat_reply("late edit"), gate.clone());
  let mut shell = shell(
    "original text",
    config_with_provider(),
    transport.clone(),
    Arc::new(RecordingSink::default()),
  );

  shell.surface_mut().set_selection(SelectionRange::new(0, 8));
  tick(&mut shell);
  shell.open_ai_edit();
  shell.set_instruction("rewrite");
  shell.submit().unwrap();
  tokio::task::yield_now().await;
  assert_eq!(transport.calls(), 1);

  shell.close_session();
  gate.notify_one();
  settle(&mut shell).await;

  assert!(shell.session().is_none());
  assert!(!shell.apply_result());
  assert_eq!(shell.surface().text(), "original text");
}

#[tokio::test]
async fn caret_session_inserts_instead_of_replacing() {
  let transport = ScriptedTransport::replying(chat_reply("Hello there. "));
  let mut shell = shell(
    "world",
    config_with_provider(),
    transport,
    Arc::new(RecordingSink::default()),
  );

  shell.surface_mut().set_selection(SelectionRange::collapsed(0));
  shell.open_ai_edit();
  assert_eq!(shell.session().unwrap().selected_text(), None);
  shell.set_instruction("write a greeting");
  shell.submit().unwrap();
  settle(&mut shell).await;

  assert!(shell.apply_result());
  assert_eq!(shell.surface().text(), "Hello there. world");
}

#[tokio::test(start_paused = true)]
async fn focus_loss_hides_the_toolbar_after_the_grace_window() {
  let transport = ScriptedTransport::replying(chat_reply("unused"));
  let mut shell = shell(
    "the quick brown fox",
    config_with_provider(),
    transport,
    Arc::new(RecordingSink::default()),
  );

  shell.surface_mut().set_selection(SelectionRange::new(4, 9));
  tick(&mut shell);
  assert!(shell.tracker().is_overlay_visible());

  shell.focus_lost();
  tokio::task::yield_now().await;
  tokio::time::advance(Duration::from_millis(250)).await;
  tokio::task::yield_now().await;
  tick(&mut shell);
  assert!(!shell.tracker().is_overlay_visible());
}

#[tokio::test(start_paused = true)]
async fn reselecting_within_the_grace_window_keeps_the_toolbar() {
  let transport = ScriptedTransport::replying(chat_reply("unused"));
  let mut shell = shell(
    "the quick brown fox",
    config_with_provider(),
    transport,
    Arc::new(RecordingSink::default()),
  );

  shell.surface_mut().set_selection(SelectionRange::new(4, 9));
  tick(&mut shell);
  shell.focus_lost();
  tokio::task::yield_now().await;
  tokio::time::advance(Duration::from_millis(100)).await;

  // The selection is active again before the grace window elapses; the
  // resolve on this tick cancels the pending hide.
  shell.surface_mut().set_selection(SelectionRange::new(4, 15));
  tick(&mut shell);
  tokio::task::yield_now().await;
  tokio::time::advance(Duration::from_millis(400)).await;
  tokio::task::yield_now().await;
  tick(&mut shell);
  assert!(shell.tracker().is_overlay_visible());
}

#[tokio::test(start_paused = true)]
async fn edits_autosave_once_after_the_debounce() {
  let transport = ScriptedTransport::replying(chat_reply("unused"));
  let sink = Arc::new(RecordingSink::default());
  let mut shell = shell("", config_with_provider(), transport, sink.clone());

  for c in "abc".chars() {
    shell.type_char(c);
    tokio::time::advance(Duration::from_millis(100)).await;
  }
  assert!(sink.saves.lock().unwrap().is_empty());

  tokio::time::advance(Duration::from_millis(1100)).await;
  tokio::task::yield_now().await;
  let saves = sink.saves.lock().unwrap();
  assert_eq!(saves.as_slice(), &["abc".to_string()]);
}

#[tokio::test]
async fn rapid_selection_changes_coalesce_to_the_latest_anchor() {
  let transport = ScriptedTransport::replying(chat_reply("unused"));
  let mut shell = shell(
    "the quick brown fox",
    config_with_provider(),
    transport,
    Arc::new(RecordingSink::default()),
  );

  shell.surface_mut().set_selection(SelectionRange::new(0, 3));
  shell.surface_mut().set_selection(SelectionRange::new(4, 9));
  shell.surface_mut().set_selection(SelectionRange::new(10, 15));
  tick(&mut shell);
  assert_eq!(shell.tracker().selection_text(), "brown");
}

#[tokio::test]
async fn escape_closes_the_palette_before_the_session() {
  let transport = ScriptedTransport::replying(chat_reply("unused"));
  let mut shell = shell(
    "",
    config_with_provider(),
    transport,
    Arc::new(RecordingSink::default()),
  );

  shell.open_ai_edit();
  shell.type_char('/');
  assert!(shell.suggestion().is_open());

  shell.escape();
  assert!(!shell.suggestion().is_open());
  assert!(shell.session().is_some());

  shell.escape();
  assert!(shell.session().is_none());
}

#[tokio::test]
async fn ai_palette_entry_opens_a_caret_session() {
  let transport = ScriptedTransport::replying(chat_reply("generated"));
  let mut shell = shell(
    "",
    config_with_provider(),
    transport,
    Arc::new(RecordingSink::default()),
  );

  for c in "/ai".chars() {
    shell.type_char(c);
  }
  shell.enter();
  assert_eq!(shell.surface().text(), "");
  let session = shell.session().expect("palette should open a session");
  assert_eq!(session.selected_text(), None);
}
