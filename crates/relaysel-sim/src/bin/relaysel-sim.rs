//! Relay selection harness CLI
//!
//! Resets the module, settles each alpha in turn and prints the code.
//!
//! Usage:
//!   relaysel-sim [--json] [alpha...]
//!
//! With no alphas the observed fixed points 20, 120, 220 are used.

use relaysel_sim::{Error, Harness, HarnessConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_usage() {
    eprintln!("relaysel-sim - Settle the relay selection core for a list of inputs");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  relaysel-sim [--json] [alpha...]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --json     Dump the event timeline as JSON after the run");
    eprintln!("  -h, --help Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  RELAYSEL_RESET_CYCLES     Reset pulse length (default: 10)");
    eprintln!("  RELAYSEL_SETTLE_BUDGET    Cycles to wait per input (default: settle bound)");
    eprintln!("  RELAYSEL_CLOCK_PERIOD_US  Clock period (default: 10)");
    eprintln!("  RELAYSEL_RECORD_CYCLES    Record per-cycle pins (default: true)");
    eprintln!("  RUST_LOG                  Log filter (default: relaysel=info)");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relaysel=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut json = false;
    let mut alphas = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            value => {
                let alpha: u8 = value
                    .parse()
                    .map_err(|e| Error::Config(format!("alpha {:?}: {}", value, e)))?;
                alphas.push(alpha);
            }
        }
    }
    if alphas.is_empty() {
        alphas = vec![20, 120, 220];
    }

    let config = HarnessConfig::from_env()?;
    let mut harness = Harness::new(config)?;
    tracing::info!(budget = harness.budget(), "starting run");

    harness.reset();
    for alpha in alphas {
        let relay = harness.settle(alpha)?;
        let out = harness.outputs();
        println!(
            "ui_in={:3} -> {} ({:02b})  uo_out={:#04x} uio_out={:#04x} uio_oe={:#04x}",
            alpha,
            relay,
            relay.code(),
            out.uo_out,
            out.uio_out,
            out.uio_oe
        );
    }

    println!();
    println!("cycles:  {}", harness.cycle());
    println!("elapsed: {} us", harness.elapsed_us());
    println!("digest:  {}", harness.trace().digest());

    if json {
        println!("{}", harness.trace().to_json()?);
    }

    Ok(())
}
