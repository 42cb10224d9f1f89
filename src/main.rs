//! ringcast demo binary
//!
//! Runs a recording session against the simulated capture backend and prints
//! every session event as a JSON line. Ctrl+C stops the session cleanly and
//! the stop report carries the ordered segment list.

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

use ringcast::capture::SimulatedCapturePort;
use ringcast::config::Config;
use ringcast::logging;
use ringcast::session::create_session;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let _log_guard = logging::init_logging()?;
    info!("ringcast starting...");

    let config = Config::load()?;
    info!("Configuration loaded from {:?}", config.config_path()?);

    let runtime = Arc::new(tokio::runtime::Runtime::new()?);

    let port = SimulatedCapturePort::new(config.simulation.bytes_per_sec);
    let (handle, mut engine) = create_session(port);

    let engine_task = runtime.spawn(async move { engine.run().await });

    // Ctrl+C requests a stop; the engine unbinds the listener after the
    // terminal event, which ends the print loop below.
    let ctrl_c_handle = handle.clone();
    let ctrl_c_runtime = runtime.clone();
    ctrlc::set_handler(move || {
        info!("Ctrl+C received, stopping session...");
        let handle = ctrl_c_handle.clone();
        ctrl_c_runtime.spawn(async move {
            handle.stop().await;
        });
    })?;

    let session_config = config.session_config();
    runtime.block_on(async {
        let mut events = handle.start(session_config).await;
        while let Some(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => error!("Failed to encode event: {}", e),
            }
        }

        handle.shutdown().await;
        let _ = engine_task.await;
    });

    info!("Shutdown complete");
    Ok(())
}

fn print_help() {
    println!("ringcast - continuous recording with segment rotation and a storage budget");
    println!();
    println!("USAGE:");
    println!("    ringcast [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help    Print this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("    RUST_LOG             Set log level (e.g., debug, info, warn)");
    println!("    RINGCAST_LOG_PATH    Override the log directory");
    println!();
    println!("Recording parameters live in the TOML config file; the path is");
    println!("logged at startup and created with defaults on first run.");
}
