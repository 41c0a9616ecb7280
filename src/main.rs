//! Command-line front end: send one request to a remote end and print the
//! response.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use remote_transport::config::load_config;
use remote_transport::observability::logging::{init_logging, DEFAULT_FILTER};
use remote_transport::{HttpClient, Request, TransportConfig};

#[derive(Parser)]
#[command(name = "remote-transport")]
#[command(about = "Send a single HTTP/1.1 request to a remote end", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Forward proxy, e.g. http://proxy.internal:3128
    #[arg(long)]
    proxy: Option<String>,

    /// Accept any TLS certificate
    #[arg(long)]
    insecure: bool,

    /// Maximum redirects to follow (0 fails on the first redirect)
    #[arg(long)]
    max_redirects: Option<u32>,

    /// Extra request header, "Name: value" (repeatable)
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Request body
    #[arg(short, long)]
    data: Option<String>,

    /// HTTP method
    method: String,

    /// Absolute URL, or a path resolved against the configured base URL
    target: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging(DEFAULT_FILTER);

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Request failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => TransportConfig::default(),
    };
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if cli.insecure {
        config.tls.accept_invalid_certs = true;
    }
    if let Some(max) = cli.max_redirects {
        config.redirects.max = max;
    }

    tracing::debug!(
        base_url = %config.base_url,
        proxy = ?config.proxy,
        max_redirects = config.redirects.max,
        "Configuration loaded"
    );

    let client = HttpClient::new(config)?;

    let mut request = Request::new(&cli.method, cli.target);
    for raw in &cli.headers {
        let (name, value) = raw
            .split_once(':')
            .ok_or_else(|| format!("header must be \"Name: value\", got {raw:?}"))?;
        request.headers.add(name.trim(), value.trim());
    }
    if let Some(data) = cli.data {
        request.body = data.into_bytes();
    }

    let response = client.send(request).await?;

    println!("{} {} {}", response.version, response.status, response.reason);
    for (name, value) in response.headers.iter() {
        println!("{name}: {value}");
    }
    println!();
    println!("{}", response.text());

    Ok(ExitCode::SUCCESS)
}
