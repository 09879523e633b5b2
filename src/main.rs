//! Collaborative text box relay server
//!
//! Run with: textbox-relay [BIND_ADDR]
//!
//! Without BIND_ADDR the server binds to 0.0.0.0:$PORT when the PORT
//! environment variable is set, otherwise to 0.0.0.0:3000.
//!
//! Clients connect with a WebSocket and send:
//!
//! ```text
//! {"type":"join","boxId":"my-box"}
//! {"type":"textUpdate","text":"full new contents"}
//! ```

use std::net::SocketAddr;

use textbox_relay::server::config::{addr_from_port, parse_bind_addr};
use textbox_relay::{RegistryConfig, RelayServer, ServerConfig};

fn print_usage() {
    eprintln!("Usage: textbox-relay [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:$PORT or 0.0.0.0:3000)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PORT         Port to listen on when BIND_ADDR is not given");
    eprintln!("  RUST_LOG     Log filter (default: textbox_relay=info)");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  textbox-relay                     # binds to 0.0.0.0:3000");
    eprintln!("  textbox-relay localhost           # binds to 127.0.0.1:3000");
    eprintln!("  textbox-relay 127.0.0.1:8080      # binds to 127.0.0.1:8080");
}

fn resolve_bind_addr(arg: Option<&String>) -> Result<SocketAddr, String> {
    if let Some(arg) = arg {
        return parse_bind_addr(arg);
    }

    match std::env::var("PORT") {
        Ok(port) => addr_from_port(&port),
        Err(_) => Ok(ServerConfig::default().bind_addr),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let bind_addr = match resolve_bind_addr(args.get(1)) {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    // Initialize logging
    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => tracing_subscriber::EnvFilter::new("textbox_relay=info"),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let server = RelayServer::with_registry_config(
        ServerConfig::with_addr(bind_addr),
        RegistryConfig::default(),
    );

    let registry_config = server.router().config();
    tracing::info!(
        addr = %server.bind_addr(),
        retention_days = registry_config.retention.as_secs() / 86_400,
        max_text_len = registry_config.max_text_len,
        "Starting relay"
    );

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!("Shut down");

    Ok(())
}
