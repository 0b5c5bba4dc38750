//! `chathub chat`: interactive session.
//!
//! Lines starting with a UI action (`/model`, `/upload`, `/export`, ...)
//! are handled here and never reach the conversation. Everything else,
//! including `/image`, `/read` and `/help`, is a turn for the engine.

use std::io::Write;
use std::path::{Path, PathBuf};

use chathub_agent::{ChatEngine, TurnEvent, TurnOutcome};
use chathub_config::AppConfig;
use chathub_core::export::ExportFormat;
use chathub_core::model::ModelTier;
use chathub_core::session::SessionState;
use chathub_core::upload::Upload;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

/// A REPL-only action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    Model(ModelTier),
    Upload(PathBuf),
    Detach,
    Export { format: ExportFormat, path: PathBuf },
    Memory,
    Clear,
    Quit,
}

/// Parse a UI action. `None` means the line is a turn for the engine.
pub fn parse_action(line: &str) -> Option<Result<UiAction, String>> {
    let line = line.trim();
    let (head, rest) = line
        .split_once(char::is_whitespace)
        .map(|(h, r)| (h, r.trim()))
        .unwrap_or((line, ""));

    let action = match head {
        "/model" => rest.parse().map(UiAction::Model),
        "/upload" if rest.is_empty() => Err("usage: /upload <path>".into()),
        "/upload" => Ok(UiAction::Upload(PathBuf::from(rest))),
        "/detach" => Ok(UiAction::Detach),
        "/export" => parse_export(rest),
        "/memory" => Ok(UiAction::Memory),
        "/clear" => Ok(UiAction::Clear),
        "/quit" | "/exit" | "exit" | "quit" => Ok(UiAction::Quit),
        _ => return None,
    };
    Some(action)
}

fn parse_export(args: &str) -> Result<UiAction, String> {
    let mut parts = args.split_whitespace();
    let format: ExportFormat = parts
        .next()
        .ok_or("usage: /export <txt|md|json> [path]")?
        .parse()?;
    let path = parts
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("chathub-export.{}", format.extension())));
    Ok(UiAction::Export { format, path })
}

/// Apply a UI action to the session. Returns the status line to show.
pub fn apply_action(
    session: &mut SessionState,
    config: &AppConfig,
    action: UiAction,
) -> Result<String, String> {
    match action {
        UiAction::Model(tier) => {
            session.model = tier;
            Ok(format!("Model set to {tier} ({})", config.model_id(tier)))
        }
        UiAction::Upload(path) => {
            let upload = Upload::from_path(&path).map_err(|e| e.to_string())?;
            let name = upload.name.clone();
            session.attach(upload);
            Ok(format!("Attached {name}"))
        }
        UiAction::Detach => Ok(match session.detach() {
            Some(upload) => format!("Detached {}", upload.name),
            None => "No file attached".into(),
        }),
        UiAction::Export { format, path } => {
            let content = session
                .conversation
                .export(format)
                .map_err(|e| e.to_string())?;
            std::fs::write(&path, content)
                .map_err(|e| format!("Could not write {}: {e}", path.display()))?;
            Ok(format!("Exported to {}", path.display()))
        }
        UiAction::Memory => Ok(if session.memory.is_empty() {
            "No memory yet".into()
        } else {
            format!("Memory: {}", session.memory)
        }),
        UiAction::Clear => {
            session.conversation.clear();
            Ok("Conversation cleared".into())
        }
        UiAction::Quit => Ok(String::new()),
    }
}

/// Prints only the newly streamed suffix of each partial reply.
#[derive(Default)]
struct ReplyPrinter {
    printed: usize,
}

impl ReplyPrinter {
    fn on_event(&mut self, event: TurnEvent) {
        match event {
            TurnEvent::Started { intent } => debug!(%intent, "Turn started"),
            TurnEvent::Partial { text } => {
                if self.printed == 0 {
                    print!("  Assistant > ");
                }
                print!("{}", &text[self.printed..]);
                self.printed = text.len();
                let _ = std::io::stdout().flush();
            }
        }
    }
}

/// Run one engine turn and print its outcome.
///
/// A failed turn is returned to the caller, which decides whether the
/// session carries on.
pub async fn run_turn(
    engine: &ChatEngine,
    session: &mut SessionState,
    line: &str,
    image_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut printer = ReplyPrinter::default();
    let result = engine
        .handle(session, line, |event| printer.on_event(event))
        .await;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            if printer.printed > 0 {
                println!();
            }
            return Err(e.into());
        }
    };

    match outcome {
        TurnOutcome::Reply(_) => println!("\n"),
        TurnOutcome::Image(bytes) => {
            let path = super::save_image(image_dir, &bytes)
                .map_err(|e| format!("Could not save image: {e}"))?;
            println!("  [Image saved to {}]\n", path.display());
        }
        TurnOutcome::Summary(text) | TurnOutcome::Help(text) => {
            for line in text.lines() {
                println!("  Assistant > {line}");
            }
            println!();
        }
    }
    Ok(())
}

/// Read non-empty stdin lines on a background task.
fn spawn_stdin_reader() -> mpsc::Receiver<std::io::Result<String>> {
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        let mut lines = BufReader::new(io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    if tx.send(Ok(line)).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break, // EOF (Ctrl+D)
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    break;
                }
            }
        }
    });

    rx
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

pub async fn run(
    model: Option<ModelTier>,
    upload: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_session_config(model)?;
    let engine = ChatEngine::from_config(&config);
    let mut session = SessionState::new(config.default_model);
    let image_dir = std::env::current_dir()?;

    if let Some(path) = upload {
        session.attach(Upload::from_path(&path)?);
    }

    println!();
    println!("  Chat Hub");
    println!();
    println!("  Provider:  {}", config.provider);
    println!(
        "  Model:     {} ({})",
        session.model,
        config.model_id(session.model)
    );
    if let Some(upload) = &session.upload {
        println!("  File:      {}", upload.name);
    }
    println!();
    println!("  Type /help for commands. UI: /model <tier>, /upload <path>, /detach,");
    println!("  /export <txt|md|json> [path], /memory, /clear, /quit");
    println!();

    let mut rx = spawn_stdin_reader();
    prompt()?;

    while let Some(line) = rx.recv().await {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("  [Input Error] {e}");
                break;
            }
        };

        match parse_action(&line) {
            Some(Ok(UiAction::Quit)) => break,
            Some(Ok(action)) => match apply_action(&mut session, &config, action) {
                Ok(status) => println!("  [{status}]\n"),
                Err(e) => eprintln!("  [Error] {e}\n"),
            },
            Some(Err(e)) => eprintln!("  [Error] {e}\n"),
            None => {
                if let Err(e) = run_turn(&engine, &mut session, &line, &image_dir).await {
                    eprintln!("  [Error] {e}\n");
                }
            }
        }

        prompt()?;
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}
