//! Interactive terminal loop.
//!
//! One task owns the [`ChatState`] and the [`SpeechCoordinator`] and reacts
//! to three sources: input lines, speech completion events, and finished
//! sends. Network calls for sends run on spawned tasks and come back as
//! [`SendCompletion`]s, so playback can be stopped while a reply is pending.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use quatuor_chat::{ChatError, ChatState, ConversationOrchestrator, HttpTransport, SendCompletion};
use quatuor_core::{ChatMode, SessionId, SessionSummary, UiLanguage};
use quatuor_speech::{SpeechCoordinator, SpeechEvent, SpeechOutcome};

use crate::render::{format_message, format_sessions};

const HELP: &str = "\
Type a message to send it. Commands:
  /mode <compare|chatgpt|gemini|deepseek|claude>   choose who answers
  /new                      start a new conversation
  /sessions                 list saved conversations
  /load <n|id>              open a saved conversation
  /rename <n|id> <name>     rename a conversation
  /delete <n|id>            delete a conversation
  /attach <path>            use a file as context
  /detach                   stop using the attached file
  /speech                   turn voice playback on or off
  /stop                     stop speaking
  /listen                   dictate a message
  /lang <en|fr|de>          change language
  /login <user> <password>  sign in
  /quit                     exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Send(String),
    Mode(String),
    New,
    Sessions,
    Load(String),
    Rename(String, String),
    Delete(String),
    Attach(PathBuf),
    Detach,
    Speech,
    Stop,
    Listen,
    Lang(String),
    Login(String, String),
    Help,
    Quit,
    Unknown(String),
}

/// Parse one input line. `None` for blank lines.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(Command::Send(line.to_string()));
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };
    let command = match (name, args) {
        ("mode", a) if !a.is_empty() => Command::Mode(a.to_string()),
        ("new", _) => Command::New,
        ("sessions", _) => Command::Sessions,
        ("load", a) if !a.is_empty() => Command::Load(a.to_string()),
        ("delete", a) if !a.is_empty() => Command::Delete(a.to_string()),
        ("rename", a) => match a.split_once(char::is_whitespace) {
            Some((target, name)) => Command::Rename(target.to_string(), name.trim().to_string()),
            None => Command::Unknown(line.to_string()),
        },
        ("attach", a) if !a.is_empty() => Command::Attach(PathBuf::from(a)),
        ("detach", _) => Command::Detach,
        ("speech", _) => Command::Speech,
        ("stop", _) => Command::Stop,
        ("listen", _) => Command::Listen,
        ("lang", a) if !a.is_empty() => Command::Lang(a.to_string()),
        ("login", a) => match a.split_once(char::is_whitespace) {
            Some((user, password)) => Command::Login(user.to_string(), password.trim().to_string()),
            None => Command::Unknown(line.to_string()),
        },
        ("help", _) | ("?", _) => Command::Help,
        ("quit", _) | ("exit", _) | ("q", _) => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    };
    Some(command)
}

/// A session reference typed by the user: a 1-based index into the last
/// listed sessions, or a raw identifier.
pub fn resolve_session_ref(sessions: &[SessionSummary], reference: &str) -> SessionId {
    reference
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| sessions.get(i))
        .map(|s| s.session_id.clone())
        .unwrap_or_else(|| SessionId::new(reference))
}

pub struct Repl {
    orchestrator: ConversationOrchestrator,
    transport: Arc<HttpTransport>,
    state: ChatState,
    speech: SpeechCoordinator,
}

impl Repl {
    pub fn new(
        orchestrator: ConversationOrchestrator,
        transport: Arc<HttpTransport>,
        state: ChatState,
        speech: SpeechCoordinator,
    ) -> Self {
        Self {
            orchestrator,
            transport,
            state,
            speech,
        }
    }

    pub async fn run(
        mut self,
        mut speech_events: mpsc::UnboundedReceiver<SpeechEvent>,
    ) -> std::io::Result<()> {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<SendCompletion>();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!(
            "{} | mode: {} | /help for commands",
            self.state.session_name, self.state.mode
        );
        if let Err(e) = self.orchestrator.refresh_sessions(&mut self.state).await {
            tracing::debug!(error = %e, "Session list unavailable at startup");
        }

        loop {
            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => {
                        let Some(command) = parse_command(&line) else { continue };
                        if command == Command::Quit {
                            break;
                        }
                        self.handle(command, &done_tx).await;
                    }
                    None => break,
                },
                Some(event) = speech_events.recv() => {
                    if let Some(outcome) = self.speech.handle_event(event) {
                        self.show_speech_outcome(outcome);
                    }
                }
                Some(completion) = done_rx.recv() => {
                    let before = self.state.timeline.len();
                    let result = self
                        .orchestrator
                        .complete_send(&mut self.state, &mut self.speech, completion);
                    if let Err(ChatError::Transport(e)) = &result {
                        tracing::debug!(error = %e, "Send ended with an error");
                    }
                    self.print_from(before);
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        self.speech.stop_speaking();
        Ok(())
    }

    async fn handle(&mut self, command: Command, done_tx: &mpsc::UnboundedSender<SendCompletion>) {
        let before = self.state.timeline.len();
        match command {
            Command::Send(text) => self.send(&text, done_tx),
            Command::Mode(raw) => match raw.parse::<ChatMode>() {
                Ok(mode) => {
                    self.orchestrator.set_mode(&mut self.state, mode);
                    println!("Mode: {mode}");
                }
                Err(e) => println!("{e}"),
            },
            Command::New => {
                self.orchestrator.new_session(&mut self.state);
                println!("{}", self.state.session_name);
            }
            Command::Sessions => {
                let _ = self.orchestrator.refresh_sessions(&mut self.state).await;
                if !self.state.session_panel_open {
                    self.orchestrator.toggle_session_panel(&mut self.state);
                }
                println!(
                    "{}",
                    format_sessions(&self.state.sessions, self.state.session_id.as_str())
                );
            }
            Command::Load(reference) => {
                let id = resolve_session_ref(&self.state.sessions, &reference);
                if self
                    .orchestrator
                    .load_session(&mut self.state, &id)
                    .await
                    .is_ok()
                {
                    println!("== {} ==", self.state.session_name);
                    self.print_from(0);
                    return;
                }
            }
            Command::Rename(reference, name) => {
                let id = resolve_session_ref(&self.state.sessions, &reference);
                match self.orchestrator.rename_session(&mut self.state, &id, &name).await {
                    Ok(()) => println!("Renamed to {name}"),
                    Err(ChatError::EmptyName) => println!("The new name cannot be empty."),
                    Err(_) => {}
                }
            }
            Command::Delete(reference) => {
                let id = resolve_session_ref(&self.state.sessions, &reference);
                if self
                    .orchestrator
                    .delete_session(&mut self.state, &id)
                    .await
                    .is_ok()
                {
                    println!("Deleted. Current: {}", self.state.session_name);
                }
            }
            Command::Attach(path) => {
                if let Ok(file) = self.orchestrator.attach_file(&mut self.state, &path).await {
                    println!("Using {} as context", file.filename);
                }
            }
            Command::Detach => match self.orchestrator.clear_file(&mut self.state) {
                Some(file) => println!("Stopped using {}", file.filename),
                None => println!("No file attached."),
            },
            Command::Speech => {
                let enabled = self.speech.toggle_enabled();
                println!("Voice playback {}", if enabled { "on" } else { "off" });
            }
            Command::Stop => self.speech.stop_speaking(),
            Command::Listen => match self.speech.start_listening().await {
                Ok(()) => println!("Listening..."),
                Err(e) => println!("{e}"),
            },
            Command::Lang(code) => {
                let language = UiLanguage::from_code(&code);
                self.orchestrator.set_language(&mut self.state, language);
                self.speech.set_language(language.code());
                println!("Language: {language}");
            }
            Command::Login(user, password) => match self.transport.login(&user, &password).await {
                Ok(_) => {
                    println!("Signed in as {user}");
                    let _ = self.orchestrator.refresh_sessions(&mut self.state).await;
                }
                Err(e) => println!("Sign-in failed: {e}"),
            },
            Command::Help => println!("{HELP}"),
            Command::Unknown(line) => println!("Unknown command: {line} (try /help)"),
            Command::Quit => {}
        }
        self.print_from(before);
    }

    fn send(&mut self, text: &str, done_tx: &mpsc::UnboundedSender<SendCompletion>) {
        let mode = self.state.mode;
        match self.orchestrator.begin_send(&mut self.state, text, mode) {
            Ok(request) => {
                let orchestrator = self.orchestrator.clone();
                let done_tx = done_tx.clone();
                tokio::spawn(async move {
                    let completion = orchestrator.dispatch(request).await;
                    if done_tx.send(completion).is_err() {
                        tracing::debug!("Reply arrived after shutdown");
                    }
                });
            }
            Err(ChatError::Busy) => println!("Still waiting for the previous reply."),
            Err(_) => {}
        }
    }

    fn show_speech_outcome(&self, outcome: SpeechOutcome) {
        match outcome {
            SpeechOutcome::Transcript(text) => {
                println!("(heard) {text}");
            }
            SpeechOutcome::CaptureFailed(e) => println!("{e}"),
        }
    }

    fn print_from(&self, start: usize) {
        for message in self.state.timeline.iter().skip(start) {
            println!("{}", format_message(message));
        }
    }
}
