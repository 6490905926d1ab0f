use anyhow::Result;
use colored::Colorize;
use numrush::prelude::*;
use numrush::{ENGINE_NAME, VERSION as LIB_VERSION};
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow;
use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod render;

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A custom helper struct for rustyline that enables syntax highlighting.
#[derive(Completer, Helper, Hinter, Validator)]
struct MyHighlighter;

impl Highlighter for MyHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if let Some((command, rest)) = line.split_once(' ') {
            let colored_command = command.yellow().bold();
            let colored_rest = rest.yellow();
            Cow::Owned(format!("{} {}", colored_command, colored_rest))
        } else {
            Cow::Owned(line.yellow().bold().to_string())
        }
    }
    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    const LOGO_TEXT: &str = include_str!("../logo.log");
    println!("{}", LOGO_TEXT.cyan());

    let version_string = format!(
        "          Shell   v{:<8} Library   v{:<8}",
        SHELL_VERSION, LIB_VERSION
    );
    let rule = "-".repeat(64);

    println!("{}", rule.dimmed());
    println!("{}", version_string);
    println!("{}", rule.dimmed());
}

/// Spawns the event listeners. Game events are only echoed, together with a
/// fresh board, while `watching` is set.
fn spawn_event_listeners(engine: &NumrushEngine, watching: Arc<AtomicBool>) {
    let mut system_rx = engine.subscribe_system_events();
    tokio::spawn(async move {
        while let Ok(event) = system_rx.recv().await {
            println!("{}", format!("<-- [SYSTEM] {:?}", event).dimmed());
        }
    });

    let mut game_rx = engine.subscribe_game_events();
    let snapshots = engine.clone();
    tokio::spawn(async move {
        while let Ok(event) = game_rx.recv().await {
            if !watching.load(Ordering::Relaxed) {
                continue;
            }
            match &event {
                GameEvent::SessionStarted {
                    session,
                    point_count,
                    started_at,
                } => println!(
                    "<-- [GAME] session {} started with {} points at {}",
                    session,
                    point_count,
                    started_at.with_timezone(&chrono::Local).format("%H:%M:%S")
                ),
                other => println!("<-- [GAME] {:?}", other),
            }
            println!("{}", render::screen(&snapshots.snapshot()));
        }
    });
}

fn print_outcome(outcome: ClickOutcome) {
    match outcome {
        ClickOutcome::Ignored => println!("--> No game in progress. Type 'play' first."),
        ClickOutcome::Hit {
            value,
            expected_next,
        } => println!(
            "--> {} hit. Next is {}.",
            value.to_string().green().bold(),
            expected_next
        ),
        ClickOutcome::Completed { value } => {
            println!("--> {} hit. That was the last one!", value.to_string().green().bold())
        }
        ClickOutcome::Miss { value, expected } => println!(
            "--> {} is not {}. {}",
            value.to_string().red().bold(),
            expected,
            "GAME OVER".red().bold()
        ),
    }
}

fn print_help() {
    println!("Available commands:");
    println!("  points <N>            - Sets how many targets the next game uses.");
    println!("  play                  - Starts a game.");
    println!("  restart               - Throws the current game away and starts over.");
    println!("  click <N>             - Clicks the target numbered N.");
    println!("  auto on|off|toggle    - Controls autoplay.");
    println!("  show                  - Draws the current board.");
    println!("  json                  - Prints the current snapshot as JSON.");
    println!("  watch on|off          - Redraws the board on every game event.");
    println!("  exit                  - Quits the shell.");
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let config_path = env::args().nth(1).map(PathBuf::from);
    let config = NumrushConfig::load(config_path.as_deref())?;
    let engine = NumrushEngine::start(config)?;
    info!("{} started", ENGINE_NAME);

    let watching = Arc::new(AtomicBool::new(false));
    spawn_event_listeners(&engine, watching.clone());

    let mut rl = Editor::new()?;
    rl.set_helper(Some(MyHighlighter));

    println!("{} is running. Type 'help' for commands or 'exit' to quit.", ENGINE_NAME.cyan());
    println!("{}", render::header(&engine.snapshot()));

    loop {
        let prompt = format!("{}", ">> ".cyan().bold());
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(_) => {
                println!("Exiting numshell...");
                break;
            }
        };
        rl.add_history_entry(line.as_str())?;
        let args = line.split_whitespace().collect::<Vec<_>>();
        let Some(command) = args.first() else {
            continue;
        };

        match *command {
            "points" => match args.get(1).map(|s| s.parse::<u32>()) {
                Some(Ok(n)) => match engine.configure(n).await {
                    Ok(()) => println!("--> Next game uses {} points.", n),
                    Err(e) => println!("Error: {}", e),
                },
                Some(Err(_)) => println!("Error: '{}' is not a valid number.", args[1]),
                None => println!("Usage: points <N>"),
            },
            "play" | "restart" => match engine.start_game().await {
                Ok(session) => {
                    println!("--> Session {} started.", session);
                    println!("{}", render::screen(&engine.snapshot()));
                }
                Err(e) => println!("Error: {}", e),
            },
            "click" => match args.get(1).map(|s| s.parse::<u32>()) {
                Some(Ok(n)) => print_outcome(engine.click(n).await?),
                Some(Err(_)) => println!("Error: '{}' is not a valid number.", args[1]),
                None => println!("Usage: click <N>"),
            },
            "auto" => {
                let enabled = match args.get(1) {
                    Some(&"on") => {
                        engine.set_autoplay_enabled(true).await?;
                        true
                    }
                    Some(&"off") => {
                        engine.set_autoplay_enabled(false).await?;
                        false
                    }
                    Some(&"toggle") => engine.toggle_autoplay().await?,
                    _ => {
                        println!("Usage: auto on|off|toggle");
                        continue;
                    }
                };
                println!("--> Autoplay {}.", if enabled { "on" } else { "off" });
            }
            "show" => println!("{}", render::screen(&engine.snapshot())),
            "json" => println!("{}", serde_json::to_string_pretty(&engine.snapshot())?),
            "watch" => match args.get(1) {
                Some(&"on") => {
                    watching.store(true, Ordering::Relaxed);
                    println!("--> Watching game events.");
                }
                Some(&"off") => {
                    watching.store(false, Ordering::Relaxed);
                    println!("--> Stopped watching game events.");
                }
                _ => println!("Usage: watch on|off"),
            },
            "help" => print_help(),
            "exit" => break,
            _ => println!("Unknown command: '{}'. Type 'help'.", line.trim()),
        }
    }

    engine.shutdown().await;
    Ok(())
}
