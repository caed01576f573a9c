use std::sync::Arc;

use clap::{Args, Subcommand};
use focusmode_core::{
    Config, Database, Event, HttpLifecycle, SessionLifecycle, SessionService, SessionType,
    SharedSettings, TimerDriver, TimerEngine, TimerState,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{info, warn};

const STATE_KEY: &str = "timer_state";

#[derive(Args, Clone, Default)]
pub struct LifecycleArgs {
    /// API server base URL (defaults to `server.api_url` from the config)
    #[arg(long)]
    pub api_url: Option<String>,
    /// Record sessions in the local database instead of the API server
    #[arg(long, conflicts_with = "api_url")]
    pub local: bool,
}

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the timer interactively, reading commands from stdin
    Run(LifecycleArgs),
    /// Print the saved timer state as JSON
    Status,
    /// Rewind the current session
    Reset(LifecycleArgs),
    /// Move on to the next session type
    Skip(LifecycleArgs),
}

/// A line typed into `timer run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Toggle,
    Reset,
    Skip,
    Select(SessionType),
    Status,
    Reload,
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let input = match line.trim().to_ascii_lowercase().as_str() {
        "" => return None,
        "p" | "t" | "toggle" | "start" | "pause" => Input::Toggle,
        "r" | "reset" => Input::Reset,
        "s" | "skip" => Input::Skip,
        "f" | "focus" => Input::Select(SessionType::Focus),
        "short" | "short_break" => Input::Select(SessionType::ShortBreak),
        "long" | "long_break" => Input::Select(SessionType::LongBreak),
        "?" | "status" => Input::Status,
        "reload" => Input::Reload,
        "q" | "quit" | "exit" => Input::Quit,
        _ => return None,
    };
    Some(input)
}

fn load_state(db: &Database) -> Option<TimerState> {
    let json = db.kv_get(STATE_KEY).ok()??;
    match serde_json::from_str(&json) {
        Ok(state) => Some(state),
        Err(e) => {
            warn!(error = %e, "ignoring unreadable saved timer state");
            None
        }
    }
}

fn save_state(db: &Database, state: &TimerState) -> Result<(), Box<dyn std::error::Error>> {
    db.kv_set(STATE_KEY, &serde_json::to_string(state)?)?;
    Ok(())
}

fn lifecycle(
    config: &Config,
    args: &LifecycleArgs,
    db: &Arc<Database>,
) -> Result<Arc<dyn SessionLifecycle>, Box<dyn std::error::Error>> {
    if args.local {
        return Ok(Arc::new(SessionService::new(db.clone())));
    }
    let base = super::api_base(config, args.api_url.as_deref())?;
    info!(api = %base, "recording sessions through the API server");
    Ok(Arc::new(HttpLifecycle::new(base)))
}

fn build_engine(
    config: &Config,
    settings: Arc<SharedSettings>,
    lifecycle: Arc<dyn SessionLifecycle>,
    db: &Database,
) -> TimerEngine {
    match load_state(db) {
        Some(state) => TimerEngine::restore(state, config.user_id.clone(), settings, lifecycle),
        None => TimerEngine::new(config.user_id.clone(), settings, lifecycle),
    }
}

fn print_event(event: &Event) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

pub async fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Arc::new(Database::open()?);
    let settings = Arc::new(SharedSettings::new(config.timer_settings()));

    match action {
        TimerAction::Status => {
            let state =
                load_state(&db).unwrap_or_else(|| TimerState::initial(&config.timer_settings()));
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        TimerAction::Reset(args) => {
            let lifecycle = lifecycle(&config, &args, &db)?;
            let mut engine = build_engine(&config, settings, lifecycle, &db);
            let event = engine.reset().await;
            save_state(&db, engine.state())?;
            print_event(&event)?;
        }
        TimerAction::Skip(args) => {
            let lifecycle = lifecycle(&config, &args, &db)?;
            let mut engine = build_engine(&config, settings, lifecycle, &db);
            let event = engine.skip().await;
            save_state(&db, engine.state())?;
            print_event(&event)?;
        }
        TimerAction::Run(args) => {
            let lifecycle = lifecycle(&config, &args, &db)?;
            let engine = build_engine(&config, settings.clone(), lifecycle, &db);
            run_interactive(TimerDriver::new(engine), &db, &settings).await?;
        }
    }
    Ok(())
}

async fn run_interactive(
    driver: TimerDriver,
    db: &Database,
    settings: &SharedSettings,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut events = driver.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprintln!("commands: p(ause/start) r(eset) s(kip) focus short long status reload q(uit)");
    print_event(&driver.snapshot().await)?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_input(&line) {
                    Some(Input::Toggle) => { driver.toggle().await; }
                    Some(Input::Reset) => { driver.reset().await; }
                    Some(Input::Skip) => { driver.skip().await; }
                    Some(Input::Select(t)) => { driver.select_session_type(t).await; }
                    Some(Input::Status) => print_event(&driver.snapshot().await)?,
                    Some(Input::Reload) => match Config::load() {
                        Ok(config) => {
                            settings.replace(config.timer_settings());
                            eprintln!("settings reloaded");
                        }
                        Err(e) => eprintln!("error: {e}"),
                    },
                    Some(Input::Quit) => break,
                    None => eprintln!("unknown command: {}", line.trim()),
                }
            }
            event = events.recv() => match event {
                Ok(event) => print_event(&event)?,
                Err(RecvError::Lagged(n)) => warn!(skipped = n, "event output fell behind"),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let state = driver.shutdown().await;
    loop {
        match events.try_recv() {
            Ok(event) => print_event(&event)?,
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    save_state(db, &state)?;
    Ok(())
}
