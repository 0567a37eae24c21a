//! MJPEG streaming server demo wired to the mock frame source
//!
//! Run with: cargo run --example mjpeg_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example mjpeg_server                    # binds to 0.0.0.0:8080
//!   cargo run --example mjpeg_server localhost          # binds to 127.0.0.1:8080
//!   cargo run --example mjpeg_server 127.0.0.1:8081     # binds to 127.0.0.1:8081
//!
//! Then open the printed stream link in a browser. The mock source produces
//! synthetic frames, so the "video" is noise, but every pipeline mechanism
//! is the real one: double-buffered capture, guarded publish, round-robin
//! fan-out, idle/running power states.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mjpeg_rs::{MockSource, ServerConfig, StreamServer};

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:8080
/// - "127.0.0.1" -> 127.0.0.1:8080
/// - "127.0.0.1:8081" -> 127.0.0.1:8081
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 8080;

    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: mjpeg_server [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:8080)");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let bind_addr = match args.get(1) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => "0.0.0.0:8080".parse().unwrap(),
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mjpeg_rs=debug".parse()?)
                .add_directive("mjpeg_server=debug".parse()?),
        )
        .init();

    let config = ServerConfig::default().bind(bind_addr).frame_rate(30);

    // Synthetic frames of a few alternating sizes
    let source = MockSource::new(vec![24_000, 31_000, 27_500]);

    let server = Arc::new(StreamServer::bind(config, source).await?);

    println!("Starting MJPEG server on {}", server.local_addr());
    println!();
    println!("Browser Stream Link: http://{}/", server.local_addr());
    println!("Browser Single Picture Link: http://{}/jpg", server.local_addr());
    println!();

    // Periodic stats line
    let stats_server = Arc::clone(&server);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(5));
        loop {
            ticker.tick().await;
            let stats = stats_server.stats().await;
            tracing::info!(
                produced = stats.frames_produced,
                served = stats.frames_served,
                stills = stats.stills_served,
                queued = stats.queued_clients,
                producer = ?stats.producer_state,
                distributor = ?stats.distributor_state,
                "Server stats"
            );
        }
    });

    server.run_until(async {
        let _ = tokio::signal::ctrl_c().await;
        println!("\nShutting down...");
    })
    .await?;

    Ok(())
}
