//! Mirage CLI: a headless loopback demo.
//!
//! Starts an in-process [`mirage_host`] session (a synthetic encoder feeds
//! it placeholder frames) on a loopback socket, then connects a
//! [`mirage_app::Runtime`] against it. Type `c` + Enter to connect, `s` to
//! start a stream, `x` to stop it, Tab to cycle streams, Esc to quit.
//! Progress is logged via `tracing`, not rendered to a terminal — the
//! protocol description treats UI as an external, out-of-scope
//! collaborator.

use clap::Parser;
use mirage_app::Runtime;
use mirage_cli::{CliDriver, NullDecoder};
use mirage_client::ClientIdentity;
use mirage_core::{Environment, SystemEnvironment};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Mirage headless loopback demo.
#[derive(Debug, Parser)]
#[command(name = "mirage-cli", about = "Mirage protocol loopback demo")]
struct Args {
    /// Log level filter, passed straight to `tracing_subscriber::EnvFilter`.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(tracing_subscriber::fmt::layer()).with(filter).init();

    let env = SystemEnvironment;
    let mut device_id = [0u8; 16];
    env.random_bytes(&mut device_id);
    let mut host_id = [0u8; 16];
    env.random_bytes(&mut host_id);

    let control_addr = mirage_cli::run_demo_host(host_id).await?;
    tracing::info!(%control_addr, "demo host listening");

    let identity = ClientIdentity {
        device_id,
        device_name: "mirage-cli".into(),
        device_type: "linux".into(),
    };

    let driver = CliDriver::new(device_id);
    let runtime = Runtime::new(driver, identity, NullDecoder::default, control_addr.to_string());

    runtime.run().await?;
    Ok(())
}
