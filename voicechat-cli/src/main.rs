use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voicechat_core::text::EMPTY_CHAT_HINT;
use voicechat_core::types::ChatMessage;
use voicechat_engine::traits::ChatObserver;
use voicechat_engine::{ChatOrchestrator, InputOutcome, ToggleOutcome, UiFlags};
use voicechat_runtime::{ConfigStore, build_orchestrator};

const ENV_CONFIG: &str = "VOICECHAT_CONFIG";
#[cfg(not(feature = "mic"))]
const ENV_CLIP: &str = "VOICECHAT_CLIP";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Say(String),
    Send,
    Record,
    Reset,
    Connect,
    Status,
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }
    if !line.starts_with('/') {
        return Some(Command::Say(line.to_string()));
    }
    Some(match line.trim() {
        "/send" => Command::Send,
        "/record" | "/r" => Command::Record,
        "/reset" => Command::Reset,
        "/connect" => Command::Connect,
        "/status" => Command::Status,
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    })
}

struct TerminalObserver;

impl ChatObserver for TerminalObserver {
    fn alert(&self, title: &str, message: &str) {
        eprintln!("[{title}] {message}");
    }

    fn message_appended(&self, message: &ChatMessage) {
        println!("{}> {}", message.role.as_str(), message.content);
    }

    fn transcript_cleared(&self) {
        println!("-- new chat --\n{EMPTY_CHAT_HINT}");
    }

    fn input_changed(&self, text: &str) {
        if !text.is_empty() {
            println!("[input] {text}");
        }
    }

    fn flags_changed(&self, flags: UiFlags) {
        log::debug!("flags: {flags:?}");
    }
}

fn config_path() -> PathBuf {
    std::env::var_os(ENV_CONFIG)
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("voicechat")
                .join("config.json")
        })
}

#[cfg(feature = "mic")]
type Recorder = voicechat_audio::MicRecorder;
#[cfg(not(feature = "mic"))]
type Recorder = voicechat_audio::ClipRecorder;

#[cfg(feature = "mic")]
fn make_recorder() -> Arc<Recorder> {
    log::info!("voice input: default microphone");
    Arc::new(voicechat_audio::MicRecorder::new())
}

#[cfg(not(feature = "mic"))]
fn make_recorder() -> Arc<Recorder> {
    let clip = std::env::var_os(ENV_CLIP)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("clip.m4a"));
    let recorder = voicechat_audio::ClipRecorder::new(clip);
    log::info!("voice input: replaying {}", recorder.clip().display());
    Arc::new(recorder)
}

// The session drops the listener on every successful stop.
#[cfg(feature = "mic")]
fn arm_level_meter(recorder: &Recorder) {
    recorder.set_level_listener(|chunk| {
        let peak = chunk.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        log::trace!("input level {peak:.3}");
    });
}

#[cfg(not(feature = "mic"))]
fn arm_level_meter(_recorder: &Recorder) {}

fn print_help() {
    println!(
        "commands:
  <text>    type and send a message
  /send     send the current input
  /record   start or stop voice input
  /reset    start a new chat
  /connect  open the chat socket
  /status   show state
  /quit"
    );
}

fn print_status(chat: &ChatOrchestrator) {
    let snap = chat.snapshot();
    let conn = chat.connection();
    println!(
        "messages={} loading={} recording={} receiving={} socket={:?} queued={} generation={}",
        snap.messages.len(),
        snap.flags.is_loading,
        snap.flags.is_recording,
        snap.flags.is_receiving,
        conn.link_status(),
        conn.pending_len(),
        snap.generation,
    );
    if !snap.input_text.is_empty() {
        println!("input: {}", snap.input_text);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let store = ConfigStore::at_path(config_path());
    log::debug!("config file: {}", store.path().display());
    let cfg = store.load_or_create()?.with_env_overrides();
    let recorder = make_recorder();
    let chat = build_orchestrator(&cfg, recorder.clone(), Arc::new(TerminalObserver))?;

    println!("{EMPTY_CHAT_HINT}");
    println!("(type a message, or /help)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(cmd) = parse_command(&line) else {
            continue;
        };
        match cmd {
            Command::Say(text) => match chat.set_input_text(&format!("{text}\n"))? {
                InputOutcome::Submitted => {}
                InputOutcome::Updated => println!(
                    "(input capped at {} characters; /send to send it)",
                    cfg.input_max_chars
                ),
                InputOutcome::Rejected => println!("(busy, wait for the reply)"),
            },
            Command::Send => {
                if !chat.submit()? {
                    println!("(nothing sent)");
                }
            }
            Command::Record => {
                if !chat.snapshot().flags.is_recording {
                    arm_level_meter(&recorder);
                }
                match chat.toggle_recording().await {
                    ToggleOutcome::Started => println!("(recording, /record again to stop)"),
                    ToggleOutcome::Stopped => println!("(transcribing)"),
                    ToggleOutcome::Failed => println!("(could not start recording)"),
                    ToggleOutcome::Ignored => println!("(busy)"),
                }
            }
            Command::Reset => chat.reset_chat(),
            Command::Connect => chat.connect(),
            Command::Status => print_status(&chat),
            Command::Help => print_help(),
            Command::Quit => break,
            Command::Unknown(c) => println!("unknown command: {c} (try /help)"),
        }
    }

    // Closes the socket.
    chat.reset_chat();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(
            parse_command("hello there\n"),
            Some(Command::Say("hello there".into()))
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(parse_command("   \r\n"), None);
    }

    #[test]
    fn slash_commands() {
        assert_eq!(parse_command("/record"), Some(Command::Record));
        assert_eq!(parse_command("/r"), Some(Command::Record));
        assert_eq!(parse_command(" /reset "), Some(Command::Say(" /reset ".into())));
        assert_eq!(parse_command("/reset "), Some(Command::Reset));
        assert_eq!(parse_command("/exit"), Some(Command::Quit));
        assert_eq!(parse_command("/nope"), Some(Command::Unknown("/nope".into())));
    }
}
