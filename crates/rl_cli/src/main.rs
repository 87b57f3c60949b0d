use clap::Parser;
use rl_core::Result;
use rl_web::{AppState, ChatLog};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Personal reading-log server", long_about = None)]
struct Cli {
    #[arg(
        long,
        default_value = "sqlite",
        help = "Storage backend to use. Available backends: sqlite (default), memory"
    )]
    storage: String,
    /// Database file for the sqlite backend.
    #[arg(long, default_value = "readlog.db")]
    db_path: PathBuf,
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:3000")]
    listen: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let storage = rl_storage::create_storage(&cli.storage, &cli.db_path).await?;
    info!("💾 Storage initialized successfully (using {})", cli.storage);

    let state = AppState {
        storage,
        chat: ChatLog::new(),
    };

    // Seed the demo chat so a fresh process has something to stream.
    state
        .chat
        .post("Alice".to_string(), "Hello, how are you?".to_string())
        .await;
    state
        .chat
        .post("Bob".to_string(), "I'm fine, thank you!".to_string())
        .await;

    let app = rl_web::create_app(state).await;
    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    info!("📚 Reading log listening on {}", cli.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
