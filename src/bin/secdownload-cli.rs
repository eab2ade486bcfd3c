use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use url::Url;

use secdownload::config::{load_config, AppConfig, DigestAlgorithm, SettingsHandle};
use secdownload::token::{sign_link, unix_now};
use secdownload::{ValidationOutcome, Validator};

#[derive(Parser)]
#[command(name = "secdownload-cli")]
#[command(about = "Issue, check and manage signed download links", long_about = None)]
struct Cli {
    /// Server configuration file (secret, prefix, digest).
    #[arg(short, long, default_value = "secdownload.toml")]
    config: PathBuf,

    /// Admin API base URL.
    #[arg(short, long, default_value = "http://127.0.0.1:8081")]
    url: String,

    /// Admin API key.
    #[arg(short, long, env = "SECDOWNLOAD_ADMIN_KEY", default_value = "")]
    key: String,

    /// Override the digest from the config file (md5, sha256).
    #[arg(long)]
    digest: Option<DigestAlgorithm>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue a signed link for a file under the document root
    Sign {
        #[arg(short, long)]
        file: String,
        /// Timestamp embedded in the link (defaults to now)
        #[arg(long)]
        expires_at: Option<u64>,
        /// Prepend scheme and host, e.g. https://files.example.com
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Run the validator against a request target
    Verify {
        target: String,
        /// Clock used for the expiry check (defaults to now)
        #[arg(long)]
        now: Option<u64>,
    },
    /// Show the live settings of a running server
    Status,
    /// Merge a JSON patch into the live settings of a running server
    Settings {
        /// e.g. '{"timeout": 600}'
        patch: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sign {
            file,
            expires_at,
            base_url,
        } => {
            let config = local_config(&cli.config, cli.digest)?;
            let link = sign_link(&config.download, &file, expires_at.unwrap_or_else(unix_now))?;
            match base_url {
                Some(base) => println!("{}", join_base(&base, &link.path)?),
                None => println!("{}", link.path),
            }
        }
        Commands::Verify { target, now } => {
            let config = local_config(&cli.config, cli.digest)?;
            return verify(config, &target, now.unwrap_or_else(unix_now)).await;
        }
        Commands::Status => {
            let client = reqwest::Client::new();
            let res = client
                .get(format!("{}/admin/status", cli.url))
                .headers(auth_headers(&cli.key)?)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Settings { patch } => {
            serde_json::from_str::<Value>(&patch)?;
            let mut headers = auth_headers(&cli.key)?;
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            let client = reqwest::Client::new();
            let res = client
                .patch(format!("{}/admin/settings", cli.url))
                .headers(headers)
                .body(patch)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Load the config file and apply the command-line digest override.
fn local_config(path: &Path, digest: Option<DigestAlgorithm>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = load_config(path)?;
    if let Some(digest) = digest {
        config.download.digest = digest;
    }
    Ok(config)
}

async fn verify(config: AppConfig, target: &str, now: u64) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let validator = Validator::new(SettingsHandle::new(config.download));

    match validator.validate_at(target, now).await {
        ValidationOutcome::Serve(serve) => {
            println!("serve {}", serve.resolved.display());
            Ok(ExitCode::SUCCESS)
        }
        rejected => {
            if let (Some(kind), Some(reason)) = (rejected.reject_kind(), rejected.reason()) {
                println!("{kind} ({reason})");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Append a link path to a base URL, keeping any path the base already has.
fn join_base(base: &str, path: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    let joined = format!("{}{}", url.path().trim_end_matches('/'), path);
    url.set_path(&joined);
    Ok(url)
}

fn auth_headers(key: &str) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {key}"))?);
    Ok(headers)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
