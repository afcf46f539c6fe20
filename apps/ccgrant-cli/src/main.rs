mod assertion;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use ccgrant::{BearerAuthLayer, HttpClientBuilderExt};
use ccgrant_http::{HttpClient, HttpClientBuilder};
use clap::{Parser, Subcommand};
use http::StatusCode;
use time::format_description::well_known::Rfc3339;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

use crate::settings::{Overrides, Settings};

/// ccgrant - OAuth2 client credentials from the command line
#[derive(Parser)]
#[command(name = "ccgrant")]
#[command(about = "Obtain OAuth2 client credentials tokens and call protected APIs")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Token endpoint URL (overrides config)
    #[arg(long)]
    token_endpoint: Option<Url>,

    /// Client identifier (overrides config)
    #[arg(long)]
    client_id: Option<String>,

    /// Requested scope, repeatable (overrides config)
    #[arg(long = "scope")]
    scopes: Vec<String>,

    /// Allow plain-HTTP endpoints (local testing only)
    #[arg(long)]
    allow_insecure_http: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a token and print a summary as JSON
    Token {
        /// Include the access token in the output
        #[arg(long)]
        reveal: bool,
    },
    /// GET a URL with the token attached and print the response body
    Get {
        /// Protected resource URL
        url: Url,
    },
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(path) = cli.config.as_deref() {
        if !path.is_file() {
            bail!("config file does not exist: {}", path.display());
        }
    }

    let overrides = Overrides {
        token_endpoint: cli.token_endpoint,
        client_id: cli.client_id,
        scopes: cli.scopes,
        allow_insecure_http: cli.allow_insecure_http,
    };
    let settings = Settings::load(cli.config.as_deref(), &overrides)?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupted, cancelling");
                cancel.cancel();
            }
        }
    });

    match cli.command {
        Commands::Token { reveal } => fetch_token(settings, reveal, &cancel).await,
        Commands::Get { url } => get(settings, &url, &cancel).await,
        Commands::Check => check(settings),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ccgrant={level},ccgrant_http={level}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn fetch_token(settings: Settings, reveal: bool, cancel: &CancellationToken) -> Result<()> {
    let config = settings.into_config()?;
    let token = config.token(cancel).await.context("token request failed")?;

    let expires_at = token
        .expiry()
        .map(|at| at.format(&Rfc3339))
        .transpose()
        .context("failed to format expiry")?;

    let mut summary = serde_json::json!({
        "token_type": token.auth_scheme(),
        "expires_at": expires_at,
        "extra": token.extras(),
    });
    if reveal {
        summary["access_token"] = token.access_token().into();
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn get(settings: Settings, url: &Url, cancel: &CancellationToken) -> Result<()> {
    let api_config = settings.api_client_config();
    let tokens = settings.into_config()?.token_source()?;
    let client = HttpClientBuilder::with_config(api_config)
        .with_token_layer(BearerAuthLayer::new(tokens).with_cancellation(cancel.clone()))
        .build()
        .context("failed to build HTTP client")?;

    let (status, body) = fetch(&client, url, cancel).await?;
    println!("{body}");

    if !status.is_success() {
        bail!("server returned {status}");
    }
    Ok(())
}

/// GET `url` and return the status with the body, whatever the status.
async fn fetch(
    client: &HttpClient,
    url: &Url,
    cancel: &CancellationToken,
) -> Result<(StatusCode, String)> {
    let (status, body) = tokio::select! {
        biased;
        () = cancel.cancelled() => bail!("interrupted"),
        res = async {
            let resp = client.get(url.as_str()).send().await.context("request failed")?;
            let status = resp.status();
            let body = resp.bytes().await.context("failed to read response body")?;
            Ok::<_, anyhow::Error>((status, body))
        } => res?,
    };
    tracing::info!(%status, %url, "response received");
    Ok((status, String::from_utf8_lossy(&body).into_owned()))
}

fn check(settings: Settings) -> Result<()> {
    tracing::info!("Checking configuration...");
    let config = settings.into_config()?;

    println!("Configuration is valid");
    if let Some(endpoint) = &config.token_endpoint {
        println!("token_endpoint: {endpoint}");
    }
    println!("client_id: {}", config.client_id);
    println!(
        "credential: {}",
        if config.credential.is_assertion() {
            "assertion"
        } else {
            "secret"
        }
    );
    if !config.scopes.is_empty() {
        println!("scopes: {}", config.scopes.join(" "));
    }
    Ok(())
}
