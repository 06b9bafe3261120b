use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::sync::Arc;
use std::time::Duration;

use mcp_directory::cache::{CatalogCache, SystemClock};
use mcp_directory::catalog::CatalogService;
use mcp_directory::fetcher::{DEFAULT_SOURCE, fetcher_for};
use mcp_directory::server;

#[derive(Parser, Debug)]
#[command(version, about = "MCP server directory")]
struct Cli {
    /// Type of server to run
    #[arg(short, long, value_enum, default_value_t = ServerType::Sse)]
    server_type: ServerType,

    /// Address for the SSE server
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    address: String,

    /// URL or local path of the markdown catalog
    #[arg(long, env = "MCP_DIRECTORY_SOURCE", default_value = DEFAULT_SOURCE)]
    source: String,

    /// Seconds a parsed catalog stays fresh
    #[arg(long, env = "MCP_DIRECTORY_TTL_SECS", default_value_t = 3600)]
    ttl_secs: u64,

    /// Run a single operation (list, getDetails, searchByFeature, getRandom,
    /// refresh), print its JSON result and exit
    #[arg(long)]
    call: Option<String>,

    /// JSON arguments for --call
    #[arg(long, default_value = "{}", requires = "call")]
    args: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ServerType {
    /// Start an SSE server
    Sse,
    /// Start a stdio server
    Stdio,
}

impl Cli {
    fn build_service(&self) -> Arc<CatalogService> {
        let cache = CatalogCache::with_clock(
            fetcher_for(&self.source),
            self.source.clone(),
            Arc::new(SystemClock),
            Duration::from_secs(self.ttl_secs),
        );
        Arc::new(CatalogService::new(cache))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let service = cli.build_service();

    if let Some(operation) = &cli.call {
        server::init_stderr_tracing();
        let args: serde_json::Value =
            serde_json::from_str(&cli.args).context("--args is not valid JSON")?;
        let result = service.dispatch(operation, args).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    match cli.server_type {
        ServerType::Sse => {
            server::init_sse_tracing();
            server::start_sse_server(&cli.address, service).await?;
        }
        ServerType::Stdio => {
            server::init_stderr_tracing();
            server::start_stdio_server(service).await?;
        }
    }

    Ok(())
}
