// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `huddle` — interactive terminal chat client.
//!
//! Joins a room (generating a code when none is given), then proxies lines
//! between stdin and the room: typed lines are sent, received broadcasts are
//! printed. `/leave` or EOF leaves the room.

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;

use huddle::code::generate_room_code;
use huddle::log::LogEntry;
use huddle::session::{SessionEvent, WsConnector, WsSession};

/// CLI arguments for the huddle chat client.
#[derive(Debug, Parser)]
#[command(name = "huddle", about = "Terminal client for huddle chat rooms.")]
struct Args {
    /// Server WebSocket URL.
    #[arg(long, default_value = "ws://127.0.0.1:8080/ws", env = "HUDDLE_URL")]
    url: String,

    /// Display name.
    #[arg(long, env = "HUDDLE_NAME")]
    name: String,

    /// Room code to join. A fresh code is generated when omitted.
    #[arg(long, env = "HUDDLE_ROOM")]
    room: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = run(args).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let room = args.room.unwrap_or_else(generate_room_code);

    let mut session = WsSession::new(WsConnector, &args.url);
    session.submit(&args.name, &room).await?;

    println!("joined room {} as {} — /leave to exit", session.room(), session.name());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) if line.trim() == "/leave" => break,
                    Some(line) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match session.send(&line) {
                            Ok(entry) => print_entry(&entry),
                            Err(e) => eprintln!("! {e}"),
                        }
                    }
                    None => break, // stdin closed
                }
            }
            event = session.recv() => {
                match event {
                    Some(SessionEvent::Message(entry)) => print_entry(&entry),
                    Some(SessionEvent::ConnectionClosed { reason }) => {
                        match reason {
                            Some(reason) => eprintln!("! connection lost: {reason}"),
                            None => eprintln!("! connection closed"),
                        }
                        return Ok(());
                    }
                    None => return Ok(()),
                }
            }
        }
    }

    session.leave();
    Ok(())
}

fn print_entry(entry: &LogEntry) {
    if entry.event.is_some() {
        // Presence broadcasts carry their own human-readable text.
        println!("* {}", entry.text);
    } else {
        println!("[{} → {}] {}", entry.display_sender(), entry.receiver, entry.text);
    }
}
