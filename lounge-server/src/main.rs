use std::sync::Arc;

use lounge_server::{BookingApp, Config, MemoryTransport, RedbStore, setup_environment};
use shared::transport::Update;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Local console mode: each stdin line is `<user_id> <message>`; a message
/// starting with `@` is treated as a selection token (e.g. `999 @confirm:1`).
/// A production deployment replaces this loop with a chat-platform adapter
/// feeding the same update channel.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, logging)
    setup_environment()?;

    tracing::info!("🫖 Lounge booking server starting...");

    // 2. Configuration
    let config = Config::from_env();
    std::fs::create_dir_all(&config.work_dir)?;

    // 3. Durable store
    let store = Arc::new(RedbStore::open(config.db_path())?);

    // 4. Transport + app
    let transport = Arc::new(MemoryTransport::new());
    let app = Arc::new(BookingApp::new(store, transport.clone(), config));

    // Print outbound messages as they happen.
    let mut outbound = transport.subscribe();
    tokio::spawn(async move {
        while let Ok(message) = outbound.recv().await {
            println!("→ [{}] {}", message.chat_id, message.text);
            for choice in &message.choices {
                println!("    [{}] {}", choice.token, choice.label);
            }
        }
    });

    let (tx, rx) = tokio::sync::mpsc::channel::<Update>(64);
    let runner = tokio::spawn(Arc::clone(&app).run(rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some((user, message)) = line.trim().split_once(' ') else {
            eprintln!("usage: <user_id> <message>");
            continue;
        };
        let Ok(user_id) = user.parse::<i64>() else {
            eprintln!("bad user id: {user}");
            continue;
        };
        let update = match message.strip_prefix('@') {
            Some(token) => Update::selection(user_id, user_id, token),
            None => Update::text(user_id, user_id, message),
        };
        if tx.send(update).await.is_err() {
            break;
        }
    }

    drop(tx);
    runner.await?;
    Ok(())
}
