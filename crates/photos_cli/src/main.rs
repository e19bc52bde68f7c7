//! Read-only inspector for a photo library snapshot.
//!
//! # Responsibility
//! - Load the snapshot the same way the application does at startup.
//! - Print a per-user summary, or the whole tree as JSON.

use clap::Parser;
use log::error;
use photos_core::{AppConfig, LibraryService, UserManager};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "photos", version, about = "Inspect a photo library snapshot")]
struct Args {
    /// Snapshot file; defaults to PHOTOS_DATA_FILE or data/users.dat.
    #[arg(long, value_name = "PATH")]
    data: Option<PathBuf>,

    /// Dump the loaded tree as pretty-printed JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let mut config = AppConfig::from_env();
    if let Some(path) = args.data {
        config = config.with_snapshot_path(path);
    }
    if let Err(err) = config.init_logging() {
        eprintln!("logging disabled: {err}");
    }

    let service = LibraryService::open(&config);
    if args.json {
        return match serde_json::to_string_pretty(service.manager()) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                error!("event=cli_dump module=cli status=error error={err}");
                eprintln!("failed to encode snapshot: {err}");
                ExitCode::FAILURE
            }
        };
    }

    println!("photos_core version={}", photos_core::core_version());
    println!("snapshot {}", config.snapshot_path.display());
    print_summary(service.manager());
    ExitCode::SUCCESS
}

fn print_summary(manager: &UserManager) {
    for user in manager.users() {
        println!(
            "{} albums={} photos={}",
            user.username(),
            user.albums().len(),
            user.photos().len()
        );
        for album in user.albums() {
            let range = album.formatted_date_range(user.photos());
            if range.is_empty() {
                println!("  {} photos={}", album.name(), album.len());
            } else {
                println!("  {} photos={} dates={range}", album.name(), album.len());
            }
        }
    }
}
