use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use portal_core::model::{MaterialId, MaterialKind, Session};
use portal_core::sequence::{MoveDirection, MoveOutcome};
use services::dashboard::{Dashboard, MaterialTile};
use services::{Clock, OpenOutcome, PlaybackConfig, PortalServices, VideoPlayback};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { name: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidMaterialId { raw: String },
    InvalidProgress { raw: String },
    InvalidDirection { raw: String },
    InvalidWatch { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { name } => write!(f, "missing <{name}>"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidMaterialId { raw } => write!(f, "invalid material id: {raw:?}"),
            ArgsError::InvalidProgress { raw } => write!(f, "invalid progress value: {raw}"),
            ArgsError::InvalidDirection { raw } => {
                write!(f, "invalid direction: {raw} (expected up or down)")
            }
            ArgsError::InvalidWatch { raw } => write!(f, "invalid --watch value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Dashboard { json: bool },
    Open { id: MaterialId, watch: Option<u64> },
    Progress { id: MaterialId, value: f64 },
    Move { id: MaterialId, direction: MoveDirection },
}

struct Args {
    db_url: String,
    progress_path: PathBuf,
    session_path: PathBuf,
    command: Command,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [dashboard] [--json]         [options]");
    eprintln!("  cargo run -p app -- open <id> [--watch <secs>]   [options]");
    eprintln!("  cargo run -p app -- progress <id> <percent>      [options]");
    eprintln!("  cargo run -p app -- move <id> up|down            [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         Catalog database (default: sqlite://portal.sqlite3)");
    eprintln!("  --progress <path>         Progress file (default: progress.json)");
    eprintln!("  --session <path>          Session file (default: session.json)");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  PORTAL_DB_URL, PORTAL_PROGRESS_PATH, PORTAL_SESSION_PATH, RUST_LOG");
}

impl Args {
    fn parse(argv: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("PORTAL_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://portal.sqlite3".into(), normalize_sqlite_url);
        let mut progress_path = std::env::var("PORTAL_PROGRESS_PATH")
            .map_or_else(|_| PathBuf::from("progress.json"), PathBuf::from);
        let mut session_path = std::env::var("PORTAL_SESSION_PATH")
            .map_or_else(|_| PathBuf::from("session.json"), PathBuf::from);
        let mut json = false;
        let mut watch = None;
        let mut positional = Vec::new();

        let mut args = argv.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--progress" => {
                    progress_path = PathBuf::from(require_value(&mut args, "--progress")?);
                }
                "--session" => {
                    session_path = PathBuf::from(require_value(&mut args, "--session")?);
                }
                "--json" => json = true,
                "--watch" => {
                    let value = require_value(&mut args, "--watch")?;
                    let secs: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidWatch { raw: value.clone() })?;
                    watch = Some(secs);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        let command = parse_command(positional, json, watch)?;
        Ok(Self {
            db_url,
            progress_path,
            session_path,
            command,
        })
    }
}

fn parse_command(
    positional: Vec<String>,
    json: bool,
    watch: Option<u64>,
) -> Result<Command, ArgsError> {
    let mut rest = positional.into_iter();
    let Some(name) = rest.next() else {
        return Ok(Command::Dashboard { json });
    };

    let command = match name.as_str() {
        "dashboard" => Command::Dashboard { json },
        "open" => Command::Open {
            id: material_id(rest.next())?,
            watch,
        },
        "progress" => {
            let id = material_id(rest.next())?;
            let raw = rest
                .next()
                .ok_or(ArgsError::MissingArgument { name: "percent" })?;
            let value: f64 = raw
                .parse()
                .map_err(|_| ArgsError::InvalidProgress { raw: raw.clone() })?;
            Command::Progress { id, value }
        }
        "move" => {
            let id = material_id(rest.next())?;
            let raw = rest
                .next()
                .ok_or(ArgsError::MissingArgument { name: "direction" })?;
            let direction = match raw.as_str() {
                "up" => MoveDirection::Up,
                "down" => MoveDirection::Down,
                _ => return Err(ArgsError::InvalidDirection { raw }),
            };
            Command::Move { id, direction }
        }
        _ => return Err(ArgsError::UnknownCommand(name)),
    };

    match rest.next() {
        Some(extra) => Err(ArgsError::UnknownArg(extra)),
        None => Ok(command),
    }
}

fn material_id(raw: Option<String>) -> Result<MaterialId, ArgsError> {
    let raw = raw.ok_or(ArgsError::MissingArgument { name: "id" })?;
    MaterialId::new(raw.as_str()).map_err(|_| ArgsError::InvalidMaterialId { raw })
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn load_session(path: &Path) -> Result<Session, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read session {}: {e}", path.display()))?;
    let session = serde_json::from_str(&raw)
        .map_err(|e| format!("invalid session {}: {e}", path.display()))?;
    Ok(session)
}

fn section_title(kind: MaterialKind) -> &'static str {
    match kind {
        MaterialKind::PastPaper => "Past Papers",
        MaterialKind::Video => "Videos",
        MaterialKind::Document => "Documents",
        MaterialKind::Quiz => "Quizzes",
    }
}

fn print_tile(tile: &MaterialTile) {
    let mark = if tile.progress.is_complete() { "x" } else { " " };
    let lock = tile
        .access
        .reason()
        .map(|reason| format!("  locked: {reason}"))
        .unwrap_or_default();
    println!(
        "    [{mark}] {:<10} {:<40} {:>5}{lock}",
        tile.id.as_str(),
        tile.title,
        tile.progress.to_string()
    );
}

fn print_dashboard(dashboard: &Dashboard) {
    if dashboard.trial_expired {
        println!("Your trial has ended.");
        println!("{}", services::lock_message(portal_core::LockReason::TrialExpired));
        println!();
    }
    for section in &dashboard.sections {
        println!("== {} ==", section_title(section.kind));
        if section.is_empty() {
            println!("  (none)");
        }
        for group in &section.groups {
            println!("  {} / {}", group.subject, group.topic);
            for tile in &group.tiles {
                print_tile(tile);
            }
        }
        println!();
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&args.db_url)?;
    let portal =
        PortalServices::new_sqlite(&args.db_url, args.progress_path.clone(), Clock::system())
            .await?;
    info!(db = %args.db_url, progress = %args.progress_path.display(), "portal opened");

    match args.command {
        Command::Dashboard { json } => {
            let session = load_session(&args.session_path)?;
            let dashboard = portal.dashboard().dashboard_for(&session).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&dashboard)?);
            } else {
                print_dashboard(&dashboard);
            }
        }
        Command::Open { id, watch } => {
            let session = load_session(&args.session_path)?;
            match portal.dashboard().open_material(&session, &id).await? {
                OpenOutcome::Locked { message, .. } => println!("{message}"),
                OpenOutcome::NotYetAvailable { kind } => {
                    println!("This {kind} is not available yet.");
                }
                OpenOutcome::OpenExternal { url } => println!("Open {url}"),
                OpenOutcome::OpenPlayer {
                    embed_url,
                    download_url,
                } => {
                    println!("Player: {embed_url}");
                    println!("Download: {download_url}");
                    if let Some(secs) = watch {
                        let playback = VideoPlayback::start(
                            portal.progress().observe(id.clone()),
                            PlaybackConfig::default(),
                        );
                        tokio::time::sleep(Duration::from_secs(secs)).await;
                        let watched = playback.progress();
                        let stored = playback.close();
                        println!("Watched to {watched}, recorded {stored}.");
                    }
                }
            }
        }
        Command::Progress { id, value } => {
            let stored = portal.progress().set_progress(&id, value);
            println!("{id}: {stored}");
        }
        Command::Move { id, direction } => {
            match portal.catalog().move_material(&id, direction).await? {
                MoveOutcome::Moved => println!("Moved {id} {direction:?}."),
                MoveOutcome::AtBoundary => {
                    println!("{id} is already at the edge of its subject.");
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "app=info,services=info,storage=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
