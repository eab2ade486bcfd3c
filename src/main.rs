//! secdownload server.
//!
//! ```text
//!   Client ──▶ http server ──▶ validator ──▶ outcome handlers ──▶ file stream
//!                                  │                   │
//!                                  ▼                   ▼
//!                           SettingsHandle ◀── config watcher / admin API
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser)]
#[command(name = "secdownload")]
#[command(about = "Serve files behind signed, time-limited links", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "secdownload.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match secdownload::lifecycle::start(&cli.config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("secdownload: {e}");
            ExitCode::FAILURE
        }
    }
}
