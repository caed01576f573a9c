use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use focusmode_core::{Config, Database, MemoryStore, SessionStore};
use focusmode_server::AppState;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Args)]
pub struct ServeArgs {
    /// Listen address (defaults to `server.bind` from the config)
    #[arg(long)]
    pub bind: Option<String>,
    /// Shorthand for --bind 127.0.0.1:<PORT>
    #[arg(long, conflicts_with = "bind")]
    pub port: Option<u16>,
    /// SQLite file to store sessions in
    #[arg(long, conflicts_with = "memory")]
    pub db: Option<PathBuf>,
    /// Keep sessions in memory only
    #[arg(long)]
    pub memory: bool,
}

fn open_store(args: &ServeArgs) -> Result<Arc<dyn SessionStore>, Box<dyn std::error::Error>> {
    if args.memory {
        info!("using in-memory session store");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let db = match &args.db {
        Some(path) => Database::open_at(path)?,
        None => Database::open()?,
    };
    Ok(Arc::new(db))
}

pub async fn run(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let bind = match (&args.bind, args.port) {
        (Some(bind), _) => bind.clone(),
        (None, Some(port)) => format!("127.0.0.1:{port}"),
        (None, None) => config.server.bind.clone(),
    };

    let store = open_store(&args)?;
    let listener = TcpListener::bind(&bind).await?;
    eprintln!("focusmode listening on http://{}", listener.local_addr()?);

    focusmode_server::serve(
        listener,
        AppState::new(store),
        focusmode_server::shutdown_signal(),
    )
    .await?;
    Ok(())
}
