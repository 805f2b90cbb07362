use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use myshows_mcp::api::{MockTracker, MyShowsClient};
use myshows_mcp::config::{load_settings, Credentials};
use myshows_mcp::mcp::{McpServer, ToolRegistry};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// MyShows MCP - expose a myshows.me account as MCP tools
#[derive(Parser, Debug)]
#[command(name = "myshows-mcp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MCP server for managing a myshows.me account", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the MCP server (default: stdio transport)
    Serve {
        /// Use the stdio transport (default)
        #[arg(long)]
        stdio: bool,

        /// Use the HTTP/SSE transport instead of stdio
        #[arg(long)]
        http: bool,

        /// Port for the HTTP transport
        #[arg(long, default_value_t = 8765)]
        port: u16,

        /// Host for the HTTP transport
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// List the available tools and exit (no credentials required)
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity. Logs go to stderr so the stdio
    // transport on stdout stays clean.
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("myshows_mcp={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Some(Commands::Tools) => {
            // Listing the catalog needs no session; bind it to a mock.
            let registry = ToolRegistry::new(Arc::new(MockTracker::new()));
            let mut tools = registry.all();
            tools.sort_by(|a, b| a.name.cmp(&b.name));
            for tool in tools {
                println!("{} - {}", tool.name, tool.description);
            }
            Ok(())
        }

        Some(Commands::Serve {
            stdio,
            http,
            port,
            host,
        }) => {
            let server = start_server().await?;

            // Use HTTP mode if --http is given, otherwise stdio.
            let use_http = http && !stdio;
            if use_http {
                let addr = format!("{}:{}", host, port);
                let (bound_addr, handle) = server
                    .run_http(&addr)
                    .await
                    .context("failed to start HTTP transport")?;
                tracing::info!("MCP server listening on {}", bound_addr);
                handle
                    .await
                    .map_err(|e| anyhow::anyhow!("server task failed: {}", e))?;
            } else {
                server.run().await.context("stdio transport failed")?;
            }
            Ok(())
        }

        None => {
            let server = start_server().await?;
            server.run().await.context("stdio transport failed")?;
            Ok(())
        }
    }
}

/// Load configuration, authenticate once and build the server.
///
/// Any failure here is fatal: the process exits non-zero before serving a
/// single tool call.
async fn start_server() -> Result<McpServer> {
    let credentials = Credentials::from_env()
        .context("configuration error: set MYSHOWS_LOGIN and MYSHOWS_PASSWORD")?;
    let settings = load_settings().context("configuration error")?;

    let client = MyShowsClient::connect(&credentials, &settings)
        .await
        .context("could not authenticate with myshows.me")?;

    Ok(McpServer::new(Arc::new(client)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_stdio_serve() {
        let cli = Cli::try_parse_from(["myshows-mcp"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_cli_serve_http_flags() {
        let cli = Cli::try_parse_from([
            "myshows-mcp",
            "serve",
            "--http",
            "--port",
            "9000",
            "--host",
            "0.0.0.0",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Serve {
                http, port, host, ..
            }) => {
                assert!(http);
                assert_eq!(port, 9000);
                assert_eq!(host, "0.0.0.0");
            }
            other => panic!("expected serve command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_tools_command() {
        let cli = Cli::try_parse_from(["myshows-mcp", "-vv", "tools"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Tools)));
        assert_eq!(cli.verbose, 2);
    }
}
