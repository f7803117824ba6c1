//! Terminal demo: talk a character through a scenario.
//!
//! ```text
//! moodloop-demo [config.toml]
//!
//! /start <scenario>   start a scenario (bedtime, clean_room, ...)
//! /promise <text>     make a promise
//! /break <text>       break a promise
//! /abort  /reset      end or reset the conversation
//! /save  /stats       save the character, show its numbers
//! /quit
//! anything else       say it to the character
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use moodloop_core::ScenarioId;
use moodloop_core::engine::TurnStatus;
use moodloop_host::{HostConfig, HostEvent, Session, spawn_ticker, telemetry};
use moodloop_voice::{LogBackend, VoiceDispatcher, VoiceQueue};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => HostConfig::from_file(Path::new(&path)).with_context(|| format!("loading {path}"))?,
        None => HostConfig::default(),
    };
    telemetry::init_tracing(&config.core.general);

    let voice = VoiceQueue::from_config(&config.core.voice);
    let dispatcher = VoiceDispatcher::spawn(voice.clone(), LogBackend);
    let session = Arc::new(Session::builder(config).voice(voice).build()?);
    let ticker = spawn_ticker(Arc::clone(&session));

    let name = session.with_character(|c| c.name.clone());
    println!("You are talking to {name}. Try /start bedtime.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        match command {
            "" => continue,
            "/quit" => break,
            "/start" => match session.start(ScenarioId::parse_lossy(rest)) {
                Ok(opening) => println!("[{}] {name}: {}", opening.emotion, opening.line),
                Err(e) => println!("({e})"),
            },
            "/promise" => {
                session.make_promise(rest);
                println!("({name} will remember that.)");
            }
            "/break" => {
                session.break_promise(rest);
                println!("({name} looks hurt.)");
            }
            "/abort" => {
                session.abort();
            }
            "/reset" => session.reset(),
            "/save" => match session.save() {
                Ok(true) => println!("(saved)"),
                Ok(false) => println!("(no save_path configured)"),
                Err(e) => println!("(save failed: {e})"),
            },
            "/stats" => println!("{:?}", session.stats()),
            _ => match session.submit_text(line) {
                Ok(outcome) => {
                    println!("[{} / {}] {name}: {}", outcome.response, outcome.emotion, outcome.line);
                    if let Some(recalled) = &outcome.recalled {
                        println!("  (remembers: {})", recalled.memory.content);
                    }
                    if let TurnStatus::Ended(reason) = outcome.status {
                        println!("  (conversation over: {reason:?})");
                    }
                }
                Err(e) => println!("({e})"),
            },
        }

        for event in session.drain_events() {
            if let HostEvent::Reaction { animation, .. } = event {
                println!("  *{animation}*");
            }
        }
    }

    let ticks = ticker.stop().await;
    let spoken = dispatcher.shutdown().await?;
    tracing::info!(ticks, spoken = spoken.spoken, "demo finished");
    if let Err(e) = session.save() {
        tracing::warn!(error = %e, "final save failed");
    }
    Ok(())
}
