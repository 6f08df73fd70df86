//! Live feed demonstration.
//!
//! Demonstrates:
//! - Backend selection from the build profile and environment
//! - Frame, status and error subscriptions
//! - Polling frames and caching the latest one
//! - Capture requests with their immediate outcome
//!
//! Usage:
//!   cargo run --example live_feed
//!   cargo run --example live_feed -- --address http://192.168.0.115:3000
//!   cargo run --example live_feed -- --no-wait --debug

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{interval, sleep};
use tracing_subscriber::EnvFilter;

use camera_socket::{
    BackendConfig, BuildProfile, CameraSocket, CaptureOutcome, Frame, Platform, Result,
    SocketOptions,
};

// ============================================================================
// Constants
// ============================================================================

const POLL_INTERVAL: Duration = Duration::from_millis(500);
const NO_WAIT_RUNTIME: Duration = Duration::from_secs(5);

// ============================================================================
// Args
// ============================================================================

#[derive(Debug, Clone)]
struct Args {
    debug: bool,
    no_wait: bool,
    address: Option<String>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let address = args
            .iter()
            .position(|a| a == "--address")
            .and_then(|i| args.get(i + 1))
            .cloned();

        Self {
            debug: args.iter().any(|a| a == "--debug"),
            no_wait: args.iter().any(|a| a == "--no-wait"),
            address,
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "camera_socket=debug"
    } else {
        "camera_socket=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let address = match args.address {
        Some(address) => address,
        None => {
            let backend = BackendConfig::from_env(BuildProfile::current(), Platform::Device);
            println!("[Backend] {} ({})", backend.url, backend.description);
            backend.url
        }
    };

    let socket = CameraSocket::new(SocketOptions::new())?;
    let latest: Arc<Mutex<Option<Frame>>> = Arc::new(Mutex::new(None));

    socket.on_connected(|connected| println!("[Socket] connected = {connected}"));

    let cache = Arc::clone(&latest);
    socket.on_frame(move |frame| {
        let bytes = frame.decode_image().map(|b| b.len()).unwrap_or(0);
        println!(
            "[Frame] ts={} format={:?} bytes={bytes}",
            frame.timestamp(),
            frame.image_format()
        );
        *cache.lock() = Some(frame.clone());
    });

    socket.on_status(|status| println!("[Status] {status}"));
    socket.on_error(|error| println!("[Error] {error}"));

    socket.connect(address);

    let mut ticker = interval(POLL_INTERVAL);
    let deadline = sleep(if args.no_wait {
        NO_WAIT_RUNTIME
    } else {
        Duration::MAX
    });
    tokio::pin!(deadline);

    let mut captured = false;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                socket.request_frame();

                if !captured && socket.is_connected() {
                    socket.capture(|outcome| match outcome {
                        CaptureOutcome::Pending { message } => println!("[Capture] {message}"),
                        CaptureOutcome::Failed { error } => println!("[Capture] failed: {error}"),
                    });
                    captured = true;
                }
            }
            () = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    if let Some(frame) = latest.lock().as_ref() {
        println!("[Done] last frame at {}", frame.timestamp());
    }

    socket.disconnect();
    socket.dispose();
    Ok(())
}
