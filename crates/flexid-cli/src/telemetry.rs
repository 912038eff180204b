//! Log output for the CLI.
//!
//! IDs go to stdout; everything logged through `tracing` goes to stderr so
//! the two can be piped separately. The filter defaults to `info` and can be
//! overridden with `RUST_LOG`, e.g. `RUST_LOG=flexid=trace` to see the
//! generators' own events.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339()),
        )
        .try_init()?;
    Ok(())
}
