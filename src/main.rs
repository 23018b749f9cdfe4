use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chamberscope::config::DashboardConfig;
use chamberscope::{channel_commands, channel_telemetry, run_dashboard, Attachments, Precision};

/// Live dashboard for a thermal chamber controller.
#[derive(Parser, Debug)]
#[command(name = "chamberscope", version, about)]
struct Args {
    /// WebSocket endpoint of the controller.
    #[arg(long)]
    url: Option<String>,

    /// Run against the built-in simulated chamber instead of a controller.
    #[arg(long)]
    demo: bool,

    /// Configuration file (defaults to ~/.chamberscope/config.yaml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Candle bucket width in seconds.
    #[arg(long)]
    bucket_secs: Option<u64>,

    /// Number of candles kept in the window.
    #[arg(long)]
    candle_cap: Option<usize>,

    /// Decimals on the primary axis (0-3).
    #[arg(long)]
    precision: Option<u8>,

    /// Write the effective configuration to the default path and exit.
    #[arg(long)]
    save_config: bool,
}

fn load_config(args: &Args) -> DashboardConfig {
    let loaded = match &args.config {
        Some(path) => DashboardConfig::load_from(path),
        None => DashboardConfig::load_from_default_path(),
    };
    let mut cfg = loaded.unwrap_or_else(|e| {
        warn!(error = %e, "could not load configuration; using defaults");
        DashboardConfig::default()
    });
    if let Some(url) = &args.url {
        cfg.url = url.clone();
    }
    if let Some(secs) = args.bucket_secs {
        cfg.candles.bucket_secs = secs;
    }
    if let Some(cap) = args.candle_cap {
        cfg.candles.cap = cap;
    }
    if let Some(p) = args.precision {
        cfg.precision = Precision::new(p);
    }
    cfg
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cfg = load_config(&args);

    if args.save_config {
        cfg.save_to_default_path()?;
        info!("configuration saved");
        return Ok(());
    }

    let (telemetry, rx) = channel_telemetry();
    let (commands, outbound) = channel_commands();

    if args.demo {
        #[cfg(feature = "demo")]
        {
            let interval = std::time::Duration::from_millis(cfg.demo_interval_ms.max(10));
            let sim = chamberscope::demo::spawn_simulator(telemetry, outbound, interval)?;
            run_ui(&cfg, rx, commands)?;
            sim.join();
            return Ok(());
        }
        #[cfg(not(feature = "demo"))]
        {
            return Err("built without the `demo` feature".into());
        }
    }

    info!(url = %cfg.url, "connecting to controller");
    let transport = chamberscope::transport::spawn_websocket(cfg.url.clone(), telemetry, outbound)?;
    run_ui(&cfg, rx, commands)?;
    transport.join();
    Ok(())
}

fn run_ui(
    cfg: &DashboardConfig,
    rx: std::sync::mpsc::Receiver<chamberscope::TelemetryEvent>,
    commands: chamberscope::CommandSink,
) -> Result<(), Box<dyn std::error::Error>> {
    let attachments = Attachments {
        commands: Some(commands),
        ..Attachments::default()
    };
    run_dashboard(cfg, rx, attachments)?;
    Ok(())
}
