use std::fmt;
use std::path::PathBuf;

use storage::json::read_catalog;
use storage::repository::{StorageError, Storage};

// `mode=rwc` lets the first seed create the database file.
const DEFAULT_DB_URL: &str = "sqlite://portal.sqlite3?mode=rwc";

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    catalog: PathBuf,
    replace: bool,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    MissingCatalog,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::MissingCatalog => write!(f, "--catalog is required"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("PORTAL_DB_URL").unwrap_or_else(|_| DEFAULT_DB_URL.into());
        let mut catalog = std::env::var("PORTAL_CATALOG_PATH").ok().map(PathBuf::from);
        let mut replace = false;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--catalog" => {
                    catalog = Some(PathBuf::from(require_value(&mut args, "--catalog")?));
                }
                "--replace" => replace = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            catalog: catalog.ok_or(ArgsError::MissingCatalog)?,
            replace,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- --catalog <materials.json> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: {DEFAULT_DB_URL})");
    eprintln!("  --catalog <path>          Catalog file: {{ \"materials\": [...] }}");
    eprintln!("  --replace                 Overwrite materials that already exist");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  PORTAL_DB_URL, PORTAL_CATALOG_PATH");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let materials = read_catalog(&args.catalog)?;
    let storage = Storage::sqlite(&args.db_url).await?;

    let mut inserted = 0_usize;
    let mut updated = 0_usize;
    let mut skipped = 0_usize;
    for material in &materials {
        match storage.materials.insert_material(material).await {
            Ok(()) => inserted += 1,
            Err(StorageError::Conflict(_)) if args.replace => {
                storage.materials.update_material(material).await?;
                updated += 1;
            }
            Err(StorageError::Conflict(_)) => skipped += 1,
            Err(err) => return Err(err.into()),
        }
    }

    println!(
        "Seeded {} from {}: {inserted} inserted, {updated} updated, {skipped} skipped",
        args.db_url,
        args.catalog.display()
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
